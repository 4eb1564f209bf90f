//! Compile-time scope hierarchy (`Frame`, one per block) and the parallel
//! run-time symbol table (`MemInfo` per declared name), mirroring the
//! original's `Env`/`Symbol_Table`/`Mem_Info` split between compile-time
//! name resolution and run-time storage layout.

use crate::ast::NodeId;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemKind {
    Stack,
    Heap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemInfo {
    pub ty: String,
    pub mem_kind: MemKind,
    pub offset: i32,
    pub width: i32,
}

struct Frame {
    parent: Option<FrameId>,
    name: String,
    bindings: HashMap<String, NodeId>,
    offset_stack: i32,
    offset_heap: i32,
    info: HashMap<String, MemInfo>,
}

/// Owns every frame ever opened during a compile (frames are never freed
/// individually; the whole arena drops at the end of the compile, same as
/// the original never deletes an `Env` once it's linked into the chain).
pub struct ScopeTree {
    frames: Vec<Frame>,
    current: FrameId,
    next_name: usize,
}

impl ScopeTree {
    /// Creates the root frame (`Env1`, matching the original's first
    /// `++count_`) and makes it current.
    pub fn new() -> ScopeTree {
        let mut tree = ScopeTree {
            frames: Vec::new(),
            current: FrameId(0),
            next_name: 1,
        };
        tree.push_frame(None);
        tree
    }

    fn push_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        let id = FrameId(self.frames.len());
        let name = format!("Env{}", self.next_name);
        self.next_name += 1;
        self.frames.push(Frame {
            parent,
            name,
            bindings: HashMap::new(),
            offset_stack: 0,
            offset_heap: 0,
            info: HashMap::new(),
        });
        id
    }

    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    pub fn current(&self) -> FrameId {
        self.current
    }

    pub fn frame_name(&self, frame: FrameId) -> &str {
        &self.frames[frame.0].name
    }

    pub fn parent_of(&self, frame: FrameId) -> Option<FrameId> {
        self.frames[frame.0].parent
    }

    /// Opens a child frame of the current one and makes it current.
    pub fn open_scope(&mut self) -> FrameId {
        let parent = self.current;
        let id = self.push_frame(Some(parent));
        self.current = id;
        id
    }

    /// Returns to the parent of the current frame. Panics if called on the
    /// root, which never happens in a well-formed compile (every
    /// `open_scope` is balanced by one `close_scope` before the root
    /// teardown).
    pub fn close_scope(&mut self) {
        self.current = self.frames[self.current.0]
            .parent
            .expect("close_scope called on the root frame");
    }

    /// Declares `name` in the current frame's compile-time bindings and
    /// run-time storage, returning `false` if `name` already exists in this
    /// frame (a shadowing declaration is still a distinct frame elsewhere,
    /// so this only rejects same-frame redeclaration).
    pub fn declare(&mut self, name: &str, decl: NodeId, ty: &str, mem_kind: MemKind, width: i32) -> bool {
        self.declare_in(self.current, name, decl, ty, mem_kind, width)
    }

    pub fn declare_in(
        &mut self,
        frame: FrameId,
        name: &str,
        decl: NodeId,
        ty: &str,
        mem_kind: MemKind,
        width: i32,
    ) -> bool {
        let f = &mut self.frames[frame.0];
        if f.bindings.contains_key(name) {
            return false;
        }
        let offset = match mem_kind {
            MemKind::Stack => {
                let o = f.offset_stack;
                f.offset_stack += width;
                o
            }
            MemKind::Heap => {
                let o = f.offset_heap;
                f.offset_heap += width;
                o
            }
        };
        f.bindings.insert(name.to_owned(), decl);
        f.info.insert(
            name.to_owned(),
            MemInfo {
                ty: ty.to_owned(),
                mem_kind,
                offset,
                width,
            },
        );
        true
    }

    /// Walks from `frame` up to (but not including) the root looking for
    /// `name`, the same traversal as `findNameInHierarchy`. Returns the
    /// declaring node and the frame that owns the binding.
    pub fn lookup(&self, frame: FrameId, name: &str) -> Option<(NodeId, FrameId)> {
        let mut cur = Some(frame);
        while let Some(id) = cur {
            let f = &self.frames[id.0];
            if let Some(&decl) = f.bindings.get(name) {
                return Some((decl, id));
            }
            cur = f.parent;
        }
        None
    }

    /// Same walk as `lookup`, but returns the run-time storage record
    /// instead of the declaring node.
    pub fn lookup_mem_info(&self, frame: FrameId, name: &str) -> Option<&MemInfo> {
        let mut cur = Some(frame);
        while let Some(id) = cur {
            let f = &self.frames[id.0];
            if let Some(info) = f.info.get(name) {
                return Some(info);
            }
            cur = f.parent;
        }
        None
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = FrameId> {
        (0..self.frames.len()).map(FrameId)
    }

    pub fn frame_entries(&self, frame: FrameId) -> impl Iterator<Item = (&str, &MemInfo)> {
        let f = &self.frames[frame.0];
        f.info.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for ScopeTree {
    fn default() -> ScopeTree {
        ScopeTree::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::NodeId;

    fn nid(n: usize) -> NodeId {
        NodeId::from_raw(n)
    }

    #[test]
    fn root_is_named_env1() {
        let tree = ScopeTree::new();
        assert_eq!(tree.frame_name(tree.root()), "Env1");
    }

    #[test]
    fn open_close_restores_parent() {
        let mut tree = ScopeTree::new();
        let root = tree.current();
        let child = tree.open_scope();
        assert_eq!(tree.parent_of(child), Some(root));
        tree.close_scope();
        assert_eq!(tree.current(), root);
    }

    #[test]
    fn redeclaration_in_same_frame_is_rejected() {
        let mut tree = ScopeTree::new();
        assert!(tree.declare("x", nid(1), "int", MemKind::Stack, 4));
        assert!(!tree.declare("x", nid(2), "int", MemKind::Stack, 4));
    }

    #[test]
    fn shadowing_in_child_frame_is_allowed_and_found_first() {
        let mut tree = ScopeTree::new();
        tree.declare("x", nid(1), "int", MemKind::Stack, 4);
        let child = tree.open_scope();
        tree.declare("x", nid(2), "double", MemKind::Stack, 8);
        assert_eq!(tree.lookup(child, "x"), Some((nid(2), child)));
    }

    #[test]
    fn lookup_walks_up_to_parent() {
        let mut tree = ScopeTree::new();
        let root = tree.current();
        tree.declare("y", nid(7), "int", MemKind::Stack, 4);
        let child = tree.open_scope();
        assert_eq!(tree.lookup(child, "y"), Some((nid(7), root)));
    }

    #[test]
    fn stack_offsets_increase_by_width() {
        let mut tree = ScopeTree::new();
        tree.declare("a", nid(1), "int", MemKind::Stack, 4);
        tree.declare("b", nid(2), "double", MemKind::Stack, 8);
        let root = tree.root();
        assert_eq!(tree.lookup_mem_info(root, "a").unwrap().offset, 0);
        assert_eq!(tree.lookup_mem_info(root, "b").unwrap().offset, 4);
    }
}

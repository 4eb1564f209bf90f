//! Arena-owned AST. The original keeps a hand-written inheritance
//! hierarchy with reference-counted pointers so that nodes (chiefly
//! identifier expressions) can be shared by more than one parent; here the
//! arena owns every node by index and the inheritance hierarchy collapses
//! into one tagged `NodeKind`. The refcount field survives as plain data so
//! the shared-child teardown discipline the original relies on stays
//! checkable (`teardown_order`), even though the arena itself doesn't need
//! it to free memory.

use crate::scope::FrameId;
use crate::token::TokenKind;
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn from_raw(n: usize) -> NodeId {
        NodeId(n as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Id {
        name: String,
        initialized: Cell<bool>,
        warned: Cell<bool>,
        /// One-shot override consumed by `Ast::addr_of`: increment
        /// desugaring sets this to the temporary holding the pre-increment
        /// value, mirroring the original's `tmp_Addr_` swap in `Addr()`.
        override_addr: std::cell::RefCell<Option<String>>,
    },
    ArrayId {
        base_decl: NodeId,
        dims: Vec<NodeId>,
        all_literal_bounds: bool,
    },
    PreIncrId {
        base: NodeId,
        delta: i64,
    },
    PostIncrId {
        base: NodeId,
        delta: i64,
    },
    PreIncrArrayId {
        base: NodeId,
        delta: i64,
    },
    PostIncrArrayId {
        base: NodeId,
        delta: i64,
    },
    IntLit(i64),
    FltLit(f64),
    StrLit(String),
    Tmp,
    Nop,
    Arith {
        op: TokenKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryArith {
        op: TokenKind,
        operand: NodeId,
    },
    Rel {
        op: TokenKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    Or {
        lhs: NodeId,
        rhs: NodeId,
    },
    And {
        lhs: NodeId,
        rhs: NodeId,
    },
    Not {
        operand: NodeId,
    },
    Coerced {
        from: &'static str,
        to: &'static str,
        expr: NodeId,
    },
    Assign {
        target: NodeId,
        value: Option<NodeId>,
        combine_op: Option<TokenKind>,
    },
    VarDecl {
        name: String,
        ty: &'static str,
        width: i32,
    },
    ArrayVarDecl {
        name: String,
        ty: &'static str,
        dims: Vec<NodeId>,
        elem_width: i32,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        is_else_if: bool,
    },
    Else {
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    Break,
    Cont,
    Block {
        stmts: Vec<NodeId>,
    },
    Eob,
}

pub struct Node {
    pub kind: NodeKind,
    pub line: u32,
    pub col: u32,
    pub frame: FrameId,
    pub addr: String,
    refcount: Cell<u32>,
}

impl Node {
    /// Direct children, in the same left-to-right order the original's
    /// `accept` visits `lChild_` then `rChild_`.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Id { .. }
            | NodeKind::IntLit(_)
            | NodeKind::FltLit(_)
            | NodeKind::StrLit(_)
            | NodeKind::Tmp
            | NodeKind::Nop
            | NodeKind::Break
            | NodeKind::Cont
            | NodeKind::Eob
            | NodeKind::VarDecl { .. } => vec![],
            NodeKind::ArrayId { base_decl, dims, .. } => {
                let mut v = vec![*base_decl];
                v.extend(dims.iter().copied());
                v
            }
            NodeKind::PreIncrId { base, .. }
            | NodeKind::PostIncrId { base, .. }
            | NodeKind::PreIncrArrayId { base, .. }
            | NodeKind::PostIncrArrayId { base, .. } => vec![*base],
            NodeKind::Arith { lhs, rhs, .. } | NodeKind::Rel { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Or { lhs, rhs } | NodeKind::And { lhs, rhs } => vec![*lhs, *rhs],
            NodeKind::UnaryArith { operand, .. } | NodeKind::Not { operand } => vec![*operand],
            NodeKind::Coerced { expr, .. } => vec![*expr],
            NodeKind::Assign { target, value, .. } => {
                let mut v = vec![*target];
                if let Some(value) = value {
                    v.push(*value);
                }
                v
            }
            NodeKind::ArrayVarDecl { dims, .. } => dims.clone(),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let mut v = vec![*cond, *then_branch];
                if let Some(e) = else_branch {
                    v.push(*e);
                }
                v
            }
            NodeKind::Else { body } => vec![*body],
            NodeKind::For { init, cond, step, body } => {
                let mut v = vec![];
                if let Some(n) = init {
                    v.push(*n);
                }
                if let Some(n) = cond {
                    v.push(*n);
                }
                if let Some(n) = step {
                    v.push(*n);
                }
                v.push(*body);
                v
            }
            NodeKind::Block { stmts } => stmts.clone(),
        }
    }
}

/// One-line trace matching the original's per-constructor `option_Debug`
/// output (`"\tcreated a Block_AST\n"`, `"\tcreated an Id = " << addr_`,
/// ...): names the node kind and whatever field identifies it best.
fn describe_creation(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Id { name, .. } => format!("an Id, name = {}", name),
        NodeKind::ArrayId { dims, .. } => format!("an ArrayId, {} dimension(s)", dims.len()),
        NodeKind::PreIncrId { delta, .. } => format!("a PreIncrId, delta = {}", delta),
        NodeKind::PostIncrId { delta, .. } => format!("a PostIncrId, delta = {}", delta),
        NodeKind::PreIncrArrayId { delta, .. } => format!("a PreIncrArrayId, delta = {}", delta),
        NodeKind::PostIncrArrayId { delta, .. } => format!("a PostIncrArrayId, delta = {}", delta),
        NodeKind::IntLit(v) => format!("an IntLit, value = {}", v),
        NodeKind::FltLit(v) => format!("a FltLit, value = {}", v),
        NodeKind::StrLit(s) => format!("a StrLit, value = \"{}\"", s),
        NodeKind::Tmp => "a Tmp".to_owned(),
        NodeKind::Nop => "a Nop".to_owned(),
        NodeKind::Arith { op, .. } => format!("an Arith, op = {}", op),
        NodeKind::UnaryArith { op, .. } => format!("a UnaryArith, op = {}", op),
        NodeKind::Rel { op, .. } => format!("a Rel, op = {}", op),
        NodeKind::Or { .. } => "an Or".to_owned(),
        NodeKind::And { .. } => "an And".to_owned(),
        NodeKind::Not { .. } => "a Not".to_owned(),
        NodeKind::Coerced { from, to, .. } => format!("a Coerced, from {} to {}", from, to),
        NodeKind::Assign { combine_op, .. } => match combine_op {
            Some(op) => format!("an Assign, combine_op = {}", op),
            None => "an Assign".to_owned(),
        },
        NodeKind::VarDecl { name, ty, .. } => format!("a VarDecl, name = {}, type = {}", name, ty),
        NodeKind::ArrayVarDecl { name, ty, dims, .. } => format!(
            "an ArrayVarDecl, name = {}, type = {}, {} dimension(s)",
            name,
            ty,
            dims.len()
        ),
        NodeKind::If { is_else_if, .. } => {
            format!("an If, is_else_if = {}", is_else_if)
        }
        NodeKind::Else { .. } => "an Else".to_owned(),
        NodeKind::For { .. } => "a For".to_owned(),
        NodeKind::Break => "a Break".to_owned(),
        NodeKind::Cont => "a Cont".to_owned(),
        NodeKind::Block { stmts } => format!("a Block, {} statement(s)", stmts.len()),
        NodeKind::Eob => "an Eob".to_owned(),
    }
}

/// Owns every AST node produced by a single compile. Nodes are never
/// individually freed; the original's per-node refcount survives only as
/// data so the shared-child discipline in `teardown_order` stays testable.
pub struct Ast {
    nodes: Vec<Node>,
    /// Mirrors the original's `option_Debug`: when set, every constructor
    /// prints one line naming the node kind and its key fields, the same
    /// `"\tcreated ..."` tracing scattered through every `*_AST` ctor.
    debug: bool,
}

impl Ast {
    pub fn new() -> Ast {
        Ast {
            nodes: Vec::new(),
            debug: false,
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn push(&mut self, kind: NodeKind, line: u32, col: u32, frame: FrameId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if self.debug {
            println!("\tcreated {}", describe_creation(&kind));
        }
        self.nodes.push(Node {
            kind,
            line,
            col,
            frame,
            addr: String::new(),
            refcount: Cell::new(0),
        });
        for child in self.nodes[id.index()].children() {
            self.adopt(child);
        }
        id
    }

    /// Increments a child's refcount. Called once per incoming parent
    /// edge, matching `setParent` + `RefCountPlus` in the original ctor.
    pub fn adopt(&self, child: NodeId) {
        let node = &self.nodes[child.index()];
        node.refcount.set(node.refcount.get() + 1);
    }

    pub fn refcount(&self, id: NodeId) -> u32 {
        self.nodes[id.index()].refcount.get()
    }

    pub fn set_addr(&mut self, id: NodeId, addr: impl Into<String>) {
        self.nodes[id.index()].addr = addr.into();
    }

    pub fn addr(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].addr
    }

    pub fn make_id(&mut self, name: &str, line: u32, col: u32, frame: FrameId) -> NodeId {
        let id = self.push(
            NodeKind::Id {
                name: name.to_owned(),
                initialized: Cell::new(false),
                warned: Cell::new(false),
                override_addr: std::cell::RefCell::new(None),
            },
            line,
            col,
            frame,
        );
        self.set_addr(id, name);
        id
    }

    /// Sets the one-shot temporary-address override on an `Id` node, used
    /// by post-increment desugaring so the enclosing expression reads the
    /// pre-increment value.
    pub fn set_tmp_addr(&self, id: NodeId, addr: impl Into<String>) {
        if let NodeKind::Id { override_addr, .. } = &self.nodes[id.index()].kind {
            *override_addr.borrow_mut() = Some(addr.into());
        }
    }

    /// Reads an `Id` node's address, consuming (and clearing) any
    /// temporary-address override exactly once, the way the original's
    /// `IdExpr_AST::Addr()` does.
    pub fn addr_of(&self, id: NodeId) -> String {
        if let NodeKind::Id { override_addr, .. } = &self.nodes[id.index()].kind {
            if let Some(addr) = override_addr.borrow_mut().take() {
                return addr;
            }
        }
        self.nodes[id.index()].addr.clone()
    }

    pub fn make_int_lit(&mut self, value: i64, line: u32, col: u32, frame: FrameId) -> NodeId {
        let id = self.push(NodeKind::IntLit(value), line, col, frame);
        self.set_addr(id, value.to_string());
        id
    }

    pub fn make_flt_lit(&mut self, value: f64, line: u32, col: u32, frame: FrameId) -> NodeId {
        let id = self.push(NodeKind::FltLit(value), line, col, frame);
        self.set_addr(id, value.to_string());
        id
    }

    pub fn make_str_lit(&mut self, value: &str, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::StrLit(value.to_owned()), line, col, frame)
    }

    pub fn make_tmp(&mut self, name: &str, line: u32, col: u32, frame: FrameId) -> NodeId {
        let id = self.push(NodeKind::Tmp, line, col, frame);
        self.set_addr(id, name);
        id
    }

    pub fn make_nop(&mut self, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Nop, line, col, frame)
    }

    pub fn make_arith(&mut self, op: TokenKind, lhs: NodeId, rhs: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Arith { op, lhs, rhs }, line, col, frame)
    }

    pub fn make_unary_arith(&mut self, op: TokenKind, operand: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::UnaryArith { op, operand }, line, col, frame)
    }

    pub fn make_rel(&mut self, op: TokenKind, lhs: NodeId, rhs: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Rel { op, lhs, rhs }, line, col, frame)
    }

    pub fn make_or(&mut self, lhs: NodeId, rhs: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Or { lhs, rhs }, line, col, frame)
    }

    pub fn make_and(&mut self, lhs: NodeId, rhs: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::And { lhs, rhs }, line, col, frame)
    }

    pub fn make_not(&mut self, operand: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Not { operand }, line, col, frame)
    }

    pub fn make_coerced(&mut self, from: &'static str, to: &'static str, expr: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Coerced { from, to, expr }, line, col, frame)
    }

    pub fn make_assign(
        &mut self,
        target: NodeId,
        value: Option<NodeId>,
        combine_op: Option<TokenKind>,
        line: u32,
        col: u32,
        frame: FrameId,
    ) -> NodeId {
        self.push(
            NodeKind::Assign {
                target,
                value,
                combine_op,
            },
            line,
            col,
            frame,
        )
    }

    pub fn make_var_decl(&mut self, name: &str, ty: &'static str, width: i32, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(
            NodeKind::VarDecl {
                name: name.to_owned(),
                ty,
                width,
            },
            line,
            col,
            frame,
        )
    }

    pub fn make_array_var_decl(
        &mut self,
        name: &str,
        ty: &'static str,
        dims: Vec<NodeId>,
        elem_width: i32,
        line: u32,
        col: u32,
        frame: FrameId,
    ) -> NodeId {
        self.push(
            NodeKind::ArrayVarDecl {
                name: name.to_owned(),
                ty,
                dims,
                elem_width,
            },
            line,
            col,
            frame,
        )
    }

    pub fn make_array_id(
        &mut self,
        base_decl: NodeId,
        dims: Vec<NodeId>,
        all_literal_bounds: bool,
        line: u32,
        col: u32,
        frame: FrameId,
    ) -> NodeId {
        self.push(
            NodeKind::ArrayId {
                base_decl,
                dims,
                all_literal_bounds,
            },
            line,
            col,
            frame,
        )
    }

    pub fn make_pre_incr_id(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::PreIncrId { base, delta }, line, col, frame)
    }

    pub fn make_post_incr_id(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::PostIncrId { base, delta }, line, col, frame)
    }

    pub fn make_pre_incr_array_id(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::PreIncrArrayId { base, delta }, line, col, frame)
    }

    pub fn make_post_incr_array_id(&mut self, base: NodeId, delta: i64, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::PostIncrArrayId { base, delta }, line, col, frame)
    }

    pub fn make_if(
        &mut self,
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        is_else_if: bool,
        line: u32,
        col: u32,
        frame: FrameId,
    ) -> NodeId {
        self.push(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
                is_else_if,
            },
            line,
            col,
            frame,
        )
    }

    pub fn make_for(
        &mut self,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
        line: u32,
        col: u32,
        frame: FrameId,
    ) -> NodeId {
        self.push(NodeKind::For { init, cond, step, body }, line, col, frame)
    }

    pub fn make_break(&mut self, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Break, line, col, frame)
    }

    pub fn make_cont(&mut self, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Cont, line, col, frame)
    }

    pub fn make_block(&mut self, stmts: Vec<NodeId>, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Block { stmts }, line, col, frame)
    }

    pub fn make_eob(&mut self, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Eob, line, col, frame)
    }

    pub fn make_else(&mut self, body: NodeId, line: u32, col: u32, frame: FrameId) -> NodeId {
        self.push(NodeKind::Else { body }, line, col, frame)
    }

    /// Simulates the original's post-order, refcount-gated teardown: a node
    /// is released only once every parent edge that adopted it has been
    /// walked. `refcount(id)` is exactly the number of parent nodes that
    /// adopted `id` (zero for a node with none), matching the ownership
    /// invariant in spec.md; `root` itself has no parent in the tree but is
    /// still held by one external reference (whoever called this function),
    /// so its own count is treated as at least one. Returns the release
    /// order; panics (via `debug_assert!`) if anything would be released
    /// twice.
    pub fn teardown_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut remaining: HashMap<NodeId, u32> = HashMap::new();
        let mut order = Vec::new();
        let mut stack = vec![root];
        let mut visit_order = Vec::new();
        while let Some(id) = stack.pop() {
            visit_order.push(id);
            let children = self.get(id).children();
            for c in children.into_iter().rev() {
                stack.push(c);
            }
        }
        for id in visit_order.into_iter().rev() {
            let count = remaining.entry(id).or_insert_with(|| self.refcount(id).max(1));
            debug_assert!(*count > 0, "node released after its refcount reached zero");
            *count -= 1;
            if *count == 0 {
                order.push(id);
            }
        }
        order
    }
}

impl Default for Ast {
    fn default() -> Ast {
        Ast::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scope::FrameId;

    const F: FrameId = FrameId(0);

    #[test]
    fn fresh_node_with_no_parent_has_refcount_zero() {
        let mut ast = Ast::new();
        let id = ast.make_int_lit(3, 1, 1, F);
        assert_eq!(ast.refcount(id), 0);
    }

    #[test]
    fn adopting_a_child_bumps_its_refcount() {
        let mut ast = Ast::new();
        let a = ast.make_id("a", 1, 1, F);
        let lit = ast.make_int_lit(1, 1, 1, F);
        // `a = a + 1` shares the `a` node between the assignment target
        // and the arithmetic operand.
        let arith = ast.make_arith(TokenKind::Plus, a, lit, 1, 1, F);
        let assign = ast.make_assign(a, Some(arith), None, 1, 1, F);
        assert_eq!(ast.refcount(a), 2); // arith operand (1) + assign target (1)
        let order = ast.teardown_order(assign);
        let mut seen = std::collections::HashSet::new();
        for id in &order {
            assert!(seen.insert(*id), "node released twice");
        }
        assert!(order.contains(&a));
    }

    #[test]
    fn children_of_block_are_its_statements() {
        let mut ast = Ast::new();
        let s1 = ast.make_nop(1, 1, F);
        let s2 = ast.make_break(2, 1, F);
        let block = ast.make_block(vec![s1, s2], 1, 1, F);
        assert_eq!(ast.get(block).children(), vec![s1, s2]);
    }

    #[test]
    fn enabling_debug_tracing_does_not_change_node_construction() {
        let mut ast = Ast::new();
        ast.set_debug(true);
        let id = ast.make_id("a", 1, 1, F);
        assert_eq!(ast.refcount(id), 0);
    }

    #[test]
    fn describe_creation_names_the_kind_and_key_fields() {
        assert_eq!(describe_creation(&NodeKind::IntLit(7)), "an IntLit, value = 7");
        assert_eq!(
            describe_creation(&NodeKind::Id {
                name: "a".to_owned(),
                initialized: Cell::new(false),
                warned: Cell::new(false),
                override_addr: std::cell::RefCell::new(None),
            }),
            "an Id, name = a"
        );
    }
}

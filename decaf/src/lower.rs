//! The lowering visitor: walks the AST bottom-up for expressions and
//! top-down for control flow, emitting the linear SSA IR. All of the
//! visitor's "process-wide" state from the original (`count_tmp`,
//! `count_lab`, `if_next`/`if_done`, `label_break`/`label_cont`) lives on
//! `CompileCtx` instead of module statics.

use std::collections::{HashMap, HashSet};

use matches::debug_assert_matches;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{Diagnostics, Warning};
use crate::ir::{IrEntry, IrProgram, L_E_EXIT, L_NEG_BOUND, L_UPPER_BOUND};
use crate::scope::{FrameId, ScopeTree};
use crate::tables::wider_type;
use crate::token::TokenKind;

/// Lowers a fully-parsed program to its IR. `root` must be the `Block` node
/// returned by `Parser::parse_program`.
pub fn lower_program(ast: &Ast, root: NodeId, scope: &ScopeTree, diag: &mut Diagnostics) -> IrProgram {
    let mut ctx = CompileCtx::new(ast, scope, diag);
    ctx.visit_stmt(root);
    ctx.emit_rt_error_section();
    ctx.ir
}

fn static_ty(ty: &str) -> &'static str {
    match ty {
        "double" => "double",
        "bool" => "bool",
        "string" => "string",
        _ => "int",
    }
}

fn is_numeric(ty: &str) -> bool {
    ty == "int" || ty == "double"
}

struct CompileCtx<'a> {
    ast: &'a Ast,
    scope: &'a ScopeTree,
    diag: &'a mut Diagnostics,
    ir: IrProgram,
    count_tmp: u32,
    count_lab: u32,
    if_next: Option<String>,
    if_done: Option<String>,
    label_break: Option<String>,
    label_cont: Option<String>,
    /// Labels waiting to be attached to the next entry emitted, regardless
    /// of which construct produced them (if-chain join labels, loop
    /// head/exit labels). `emit` drains this on every call.
    pending_labels: Vec<String>,
    /// Post-increment/decrement bumps queued by a `x++`/`a[i]++` read,
    /// flushed once the enclosing expression has emitted its own entry.
    deferred: Vec<(String, i64, FrameId)>,
    /// Names of runtime-sized arrays declared in each frame, flushed with a
    /// cleanup marker when that frame's `Eob` is reached.
    dynamic_arrays: HashMap<FrameId, Vec<String>>,
    /// `(frame-that-owns-the-binding, name)` pairs that have been assigned
    /// at least once. Tracked here rather than purely on the `Id` node's own
    /// `initialized` flag, since every occurrence of a name is a distinct
    /// `Id` node (`Parser::parse_primary` makes a fresh one each time); the
    /// flag on the node alone can't tell "this read follows an earlier
    /// write" since the earlier write lives on a different node instance.
    initialized: HashSet<(FrameId, String)>,
}

impl<'a> CompileCtx<'a> {
    fn new(ast: &'a Ast, scope: &'a ScopeTree, diag: &'a mut Diagnostics) -> CompileCtx<'a> {
        CompileCtx {
            ast,
            scope,
            diag,
            ir: IrProgram::new(),
            count_tmp: 0,
            count_lab: 0,
            if_next: None,
            if_done: None,
            label_break: None,
            label_cont: None,
            pending_labels: Vec::new(),
            deferred: Vec::new(),
            dynamic_arrays: HashMap::new(),
            initialized: HashSet::new(),
        }
    }

    fn make_tmp(&mut self) -> String {
        self.count_tmp += 1;
        format!("t{}", self.count_tmp)
    }

    fn make_label(&mut self) -> String {
        self.count_lab += 1;
        format!("L{}", self.count_lab)
    }

    fn add_pending_label(&mut self, label: String) {
        self.pending_labels.push(label);
    }

    fn emit(&mut self, op: TokenKind, target: &str, lhs: &str, rhs: &str, frame: FrameId) -> usize {
        let frame_name = self.scope.frame_name(frame).to_owned();
        self.emit_raw(op, target, lhs, rhs, &frame_name)
    }

    fn emit_raw(&mut self, op: TokenKind, target: &str, lhs: &str, rhs: &str, frame: &str) -> usize {
        let labels = std::mem::take(&mut self.pending_labels);
        self.ir.push(IrEntry::new(op, target, lhs, rhs, frame).with_labels(labels))
    }

    /// Flushes any post-increment/decrement bumps queued while lowering the
    /// expression that just finished emitting.
    fn drain_deferred(&mut self) {
        let pending = std::mem::take(&mut self.deferred);
        for (name, delta, frame) in pending {
            let delta = delta.to_string();
            self.emit(TokenKind::Plus, &name, &name, &delta, frame);
        }
    }

    // --- statements ---

    fn visit_stmt(&mut self, id: NodeId) {
        let node = self.ast.get(id);
        let frame = node.frame;
        match &node.kind {
            NodeKind::Block { stmts } => {
                let stmts = stmts.clone();
                self.visit_stmts(&stmts);
            }
            NodeKind::Eob => self.visit_eob(id),
            NodeKind::VarDecl { name, ty, .. } => {
                let (name, ty) = (name.clone(), *ty);
                self.emit(TokenKind::Dec, &name, ty, "", frame);
            }
            NodeKind::ArrayVarDecl { .. } => self.visit_array_var_decl(id),
            NodeKind::If { .. } => self.visit_if(id),
            NodeKind::Else { body } => self.visit_stmt(*body),
            NodeKind::For { .. } => self.visit_for(id),
            NodeKind::Break => {
                if let Some(label) = self.label_break.clone() {
                    self.emit(TokenKind::Goto, &label, "", "", frame);
                }
            }
            NodeKind::Cont => {
                if let Some(label) = self.label_cont.clone() {
                    self.emit(TokenKind::Goto, &label, "", "", frame);
                }
            }
            NodeKind::Nop => {
                self.emit(TokenKind::Nop, "", "", "", frame);
            }
            _ => {
                // A bare expression statement (assignment, increment, or a
                // pointless expression kept solely for its side effects).
                self.visit_expr(id);
                self.drain_deferred();
            }
        }
    }

    fn visit_stmts(&mut self, stmts: &[NodeId]) {
        for &s in stmts {
            self.visit_stmt(s);
        }
    }

    /// The synthetic end-of-block marker: flushes any label still waiting
    /// for a home (nothing follows in this block to carry it) and emits the
    /// stack/heap cleanup marker for any runtime-sized array declared here.
    fn visit_eob(&mut self, id: NodeId) {
        let frame = self.ast.get(id).frame;
        if !self.pending_labels.is_empty() {
            self.emit(TokenKind::Nop, "", "", "", frame);
        }
        if let Some(names) = self.dynamic_arrays.remove(&frame) {
            for name in names {
                self.emit(TokenKind::Nop, &name, "free", "", frame);
            }
        }
    }

    fn visit_array_var_decl(&mut self, id: NodeId) {
        let frame = self.ast.get(id).frame;
        debug_assert_matches!(&self.ast.get(id).kind, NodeKind::ArrayVarDecl { .. });
        let (name, ty, dims) = match &self.ast.get(id).kind {
            NodeKind::ArrayVarDecl { name, ty, dims, .. } => (name.clone(), *ty, dims.clone()),
            _ => unreachable!(),
        };
        self.emit(TokenKind::Dec, &name, ty, "", frame);

        let mut any_dynamic = false;
        for d in dims {
            if matches!(self.ast.get(d).kind, NodeKind::IntLit(_)) {
                continue;
            }
            any_dynamic = true;
            let addr = self.visit_expr(d);
            self.drain_deferred();
            let t = self.make_tmp();
            self.emit(TokenKind::Less, &t, &addr, "0", frame);
            self.ir.ensure_rt_errors();
            self.emit(TokenKind::IfTrue, &t, "goto", L_NEG_BOUND, frame);
        }
        if any_dynamic {
            self.dynamic_arrays.entry(frame).or_default().push(name);
        }
    }

    /// The core if/else-if/else label-threading state machine. `if_next` is the
    /// branch-false target of the current test; `if_done` is the join
    /// label after the whole if/else-if/else chain. Both are saved and
    /// cleared while visiting the then-branch so a nested if doesn't reuse
    /// the enclosing chain's labels, then restored.
    fn visit_if(&mut self, id: NodeId) {
        let frame = self.ast.get(id).frame;
        debug_assert_matches!(&self.ast.get(id).kind, NodeKind::If { .. });
        let (cond, then_branch, else_branch, is_else_if) = match &self.ast.get(id).kind {
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
                is_else_if,
            } => (*cond, *then_branch, *else_branch, *is_else_if),
            _ => unreachable!(),
        };
        let has_else = else_branch.is_some();

        if !is_else_if {
            self.if_next = Some(self.make_label());
            self.if_done = if has_else { Some(self.make_label()) } else { None };
        } else {
            self.if_next = Some(self.make_label());
        }

        let cond_addr = self.visit_expr(cond);
        self.drain_deferred();
        let if_next = self.if_next.clone().expect("if_next set above");
        self.emit(TokenKind::IfFalse, &cond_addr, "goto", &if_next, frame);

        let saved = (self.if_next.take(), self.if_done.take());
        self.visit_stmt(then_branch);
        self.if_next = saved.0;
        self.if_done = saved.1;

        if let Some(done) = self.if_done.clone() {
            self.emit(TokenKind::Goto, &done, "", "", frame);
        }

        let if_next = self.if_next.take().expect("if_next present");
        self.add_pending_label(if_next);

        if let Some(else_id) = else_branch {
            self.visit_stmt(else_id);
        }

        if !is_else_if {
            if let Some(done) = self.if_done.take() {
                self.add_pending_label(done);
            }
        }
    }

    /// `For(init, cond, step; body)`; `While` is represented as the same
    /// node with `init = step = None`.
    fn visit_for(&mut self, id: NodeId) {
        let frame = self.ast.get(id).frame;
        debug_assert_matches!(&self.ast.get(id).kind, NodeKind::For { .. });
        let (init, cond, step, body) = match &self.ast.get(id).kind {
            NodeKind::For { init, cond, step, body } => (*init, *cond, *step, *body),
            _ => unreachable!(),
        };

        if let Some(init) = init {
            self.visit_expr(init);
            self.drain_deferred();
        }

        let head = self.make_label();
        self.add_pending_label(head.clone());

        let saved_brk = self.label_break.take();
        let saved_cont = self.label_cont.take();
        let exit = self.make_label();
        let step_label = self.make_label();
        self.label_break = Some(exit.clone());
        self.label_cont = Some(step_label.clone());

        if let Some(cond) = cond {
            let t = self.visit_expr(cond);
            self.drain_deferred();
            self.emit(TokenKind::IfFalse, &t, "goto", &exit, frame);
        }

        self.visit_stmt(body);

        self.add_pending_label(step_label);
        if let Some(step) = step {
            self.visit_expr(step);
            self.drain_deferred();
        } else if !self.pending_labels.is_empty() {
            self.emit(TokenKind::Nop, "", "", "", frame);
        }

        self.emit(TokenKind::Goto, &head, "", "", frame);

        self.label_break = saved_brk;
        self.label_cont = saved_cont;
        self.add_pending_label(exit);
    }

    // --- expressions ---

    fn warn_if_uninitialized(&mut self, id: NodeId, name: &str, frame: FrameId, line: u32, col: u32) {
        let owner = self.scope.lookup(frame, name).map(|(_, owner)| owner);
        let already_init = owner.map_or(true, |owner| self.initialized.contains(&(owner, name.to_owned())));
        if already_init {
            return;
        }
        if let NodeKind::Id { warned, .. } = &self.ast.get(id).kind {
            if warned.get() {
                return;
            }
            warned.set(true);
        }
        self.diag.warn(Warning::UseBeforeInit {
            name: name.to_owned(),
            line,
            col,
        });
    }

    fn mark_initialized(&mut self, target: NodeId) {
        if let NodeKind::Id { name, initialized, .. } = &self.ast.get(target).kind {
            initialized.set(true);
            let frame = self.ast.get(target).frame;
            if let Some((_, owner)) = self.scope.lookup(frame, name) {
                self.initialized.insert((owner, name.clone()));
            }
        }
    }

    /// Best-effort static type of an expression, used only to decide
    /// whether an assignment needs an explicit `cast` entry. Falls back
    /// to `"int"` for shapes that don't carry
    /// enough information to know better (e.g. a string literal being
    /// assigned into something numeric would already be a type error the
    /// parser should have reported).
    fn expr_type(&self, id: NodeId) -> &'static str {
        match &self.ast.get(id).kind {
            NodeKind::IntLit(_) => "int",
            NodeKind::FltLit(_) => "double",
            NodeKind::StrLit(_) => "string",
            NodeKind::Id { name, .. } => {
                let frame = self.ast.get(id).frame;
                match self.scope.lookup_mem_info(frame, name) {
                    Some(info) => static_ty(&info.ty),
                    None => "int",
                }
            }
            NodeKind::ArrayId { base_decl, .. } => match &self.ast.get(*base_decl).kind {
                NodeKind::ArrayVarDecl { ty, .. } | NodeKind::VarDecl { ty, .. } => *ty,
                _ => "int",
            },
            NodeKind::Arith { lhs, rhs, .. } => wider_type(self.expr_type(*lhs), self.expr_type(*rhs)).unwrap_or("int"),
            NodeKind::UnaryArith { operand, .. } => self.expr_type(*operand),
            NodeKind::Coerced { to, .. } => *to,
            NodeKind::PreIncrId { base, .. } | NodeKind::PostIncrId { base, .. } => self.expr_type(*base),
            NodeKind::PreIncrArrayId { base, .. } | NodeKind::PostIncrArrayId { base, .. } => self.expr_type(*base),
            NodeKind::Rel { .. } | NodeKind::Or { .. } | NodeKind::And { .. } | NodeKind::Not { .. } => "bool",
            _ => "int",
        }
    }

    /// Lowers an expression bottom-up, returning its address operand.
    fn visit_expr(&mut self, id: NodeId) -> String {
        let node = self.ast.get(id);
        let frame = node.frame;
        let line = node.line;
        let col = node.col;
        match &node.kind {
            NodeKind::IntLit(v) => v.to_string(),
            NodeKind::FltLit(v) => v.to_string(),
            NodeKind::StrLit(s) => format!("\"{}\"", s),
            NodeKind::Tmp => self.ast.addr(id).to_owned(),
            NodeKind::Id { name, .. } => {
                let name = name.clone();
                self.warn_if_uninitialized(id, &name, frame, line, col);
                self.ast.addr_of(id)
            }
            NodeKind::ArrayId { .. } => self.visit_array_id(id),
            NodeKind::Arith { op, lhs, rhs } => {
                let op = *op;
                let (lhs, rhs) = (*lhs, *rhs);
                let l = self.visit_expr(lhs);
                let r = self.visit_expr(rhs);
                let t = self.make_tmp();
                self.emit(op, &t, &l, &r, frame);
                self.drain_deferred();
                t
            }
            NodeKind::UnaryArith { op, operand } => {
                let op = *op;
                let operand = *operand;
                let o = self.visit_expr(operand);
                let t = self.make_tmp();
                self.emit(op, &t, "0", &o, frame);
                self.drain_deferred();
                t
            }
            NodeKind::Rel { op, lhs, rhs } => {
                let op = *op;
                let (lhs, rhs) = (*lhs, *rhs);
                let l = self.visit_expr(lhs);
                let r = self.visit_expr(rhs);
                let t = self.make_tmp();
                self.emit(op, &t, &l, &r, frame);
                self.drain_deferred();
                t
            }
            NodeKind::Or { lhs, rhs } => {
                let (lhs, rhs) = (*lhs, *rhs);
                let l = self.visit_expr(lhs);
                let r = self.visit_expr(rhs);
                let t = self.make_tmp();
                self.emit(TokenKind::OrOr, &t, &l, &r, frame);
                self.drain_deferred();
                t
            }
            NodeKind::And { lhs, rhs } => {
                let (lhs, rhs) = (*lhs, *rhs);
                let l = self.visit_expr(lhs);
                let r = self.visit_expr(rhs);
                let t = self.make_tmp();
                self.emit(TokenKind::AndAnd, &t, &l, &r, frame);
                self.drain_deferred();
                t
            }
            NodeKind::Not { operand } => {
                let operand = *operand;
                let o = self.visit_expr(operand);
                let t = self.make_tmp();
                self.emit(TokenKind::Bang, &t, &o, "", frame);
                self.drain_deferred();
                t
            }
            NodeKind::Coerced { to, expr, .. } => {
                let to = *to;
                let expr = *expr;
                let e = self.visit_expr(expr);
                let t = self.make_tmp();
                self.emit(TokenKind::Cast, &t, &e, to, frame);
                self.drain_deferred();
                t
            }
            NodeKind::Assign { target, value, combine_op } => self.visit_assign(*target, *value, *combine_op, frame),
            NodeKind::PreIncrId { base, delta } => {
                let (base, delta) = (*base, *delta);
                let name = self.ast.addr(base).to_owned();
                self.warn_if_uninitialized(base, &name, frame, line, col);
                self.mark_initialized(base);
                let delta_s = delta.to_string();
                self.emit(TokenKind::Plus, &name, &name, &delta_s, frame);
                name
            }
            NodeKind::PostIncrId { base, delta } => {
                let (base, delta) = (*base, *delta);
                let name = self.ast.addr(base).to_owned();
                self.warn_if_uninitialized(base, &name, frame, line, col);
                let t = self.make_tmp();
                self.emit(TokenKind::Assign, &t, &name, "", frame);
                self.ast.set_tmp_addr(base, t.clone());
                self.mark_initialized(base);
                self.deferred.push((name, delta, frame));
                t
            }
            NodeKind::PreIncrArrayId { base, delta } => {
                let (base, delta) = (*base, *delta);
                let addr = self.visit_array_id(base);
                let delta_s = delta.to_string();
                self.emit(TokenKind::Plus, &addr, &addr, &delta_s, frame);
                addr
            }
            NodeKind::PostIncrArrayId { base, delta } => {
                let (base, delta) = (*base, *delta);
                let addr = self.visit_array_id(base);
                let t = self.make_tmp();
                self.emit(TokenKind::Assign, &t, &addr, "", frame);
                self.deferred.push((addr, delta, frame));
                t
            }
            _ => unreachable!("not an expression node"),
        }
    }

    fn visit_assign(&mut self, target: NodeId, value: Option<NodeId>, combine_op: Option<TokenKind>, frame: FrameId) -> String {
        let value = match value {
            Some(v) => v,
            None => return self.target_addr(target),
        };
        let val_addr = self.visit_expr(value);
        let val_ty = self.expr_type(value);
        let tgt_ty = self.expr_type(target);
        let coerced_addr = if val_ty != tgt_ty && is_numeric(val_ty) && is_numeric(tgt_ty) {
            let t = self.make_tmp();
            self.emit(TokenKind::Cast, &t, &val_addr, tgt_ty, frame);
            t
        } else {
            val_addr
        };
        self.drain_deferred();

        let tgt_addr = self.target_addr(target);
        let final_addr = if let Some(op) = combine_op {
            let combined = self.make_tmp();
            self.emit(op, &combined, &tgt_addr, &coerced_addr, frame);
            combined
        } else {
            coerced_addr
        };

        self.emit(TokenKind::Assign, &tgt_addr, &final_addr, "", frame);
        if matches!(self.ast.get(target).kind, NodeKind::Id { .. }) {
            self.mark_initialized(target);
        }
        tgt_addr
    }

    /// The assignment target's address: a plain name for an `Id`, or the
    /// materialized `name[index]` form for an `ArrayId`.
    fn target_addr(&mut self, target: NodeId) -> String {
        if matches!(self.ast.get(target).kind, NodeKind::ArrayId { .. }) {
            self.visit_array_id(target)
        } else {
            self.ast.addr(target).to_owned()
        }
    }

    /// Lowers a subscript access: resolves each dimension, emits a
    /// negative/upper-bound run-time check for every non-literal subscript,
    /// and returns the symbolic `name[offset]` address.
    fn visit_array_id(&mut self, id: NodeId) -> String {
        let frame = self.ast.get(id).frame;
        debug_assert_matches!(&self.ast.get(id).kind, NodeKind::ArrayId { .. });
        let (base_decl, dims, all_literal) = match &self.ast.get(id).kind {
            NodeKind::ArrayId {
                base_decl,
                dims,
                all_literal_bounds,
                ..
            } => (*base_decl, dims.clone(), *all_literal_bounds),
            _ => unreachable!(),
        };
        let base_name = match &self.ast.get(base_decl).kind {
            NodeKind::ArrayVarDecl { name, .. } => name.clone(),
            NodeKind::VarDecl { name, .. } => name.clone(),
            NodeKind::Id { name, .. } => name.clone(),
            _ => self.ast.addr(base_decl).to_owned(),
        };
        let decl_dims: Vec<NodeId> = match &self.ast.get(base_decl).kind {
            NodeKind::ArrayVarDecl { dims, .. } => dims.clone(),
            _ => Vec::new(),
        };

        let mut offset: Option<String> = None;
        for (i, &dim) in dims.iter().enumerate() {
            let idx_addr = self.visit_expr(dim);
            self.drain_deferred();

            if !all_literal && !matches!(self.ast.get(dim).kind, NodeKind::IntLit(_)) {
                let neg = self.make_tmp();
                self.emit(TokenKind::Less, &neg, &idx_addr, "0", frame);
                self.ir.ensure_rt_errors();
                self.emit(TokenKind::IfTrue, &neg, "goto", L_NEG_BOUND, frame);

                if let Some(&bound_dim) = decl_dims.get(i) {
                    let bound_addr = self.ast.addr(bound_dim).to_owned();
                    let hi = self.make_tmp();
                    self.emit(TokenKind::GreaterEqual, &hi, &idx_addr, &bound_addr, frame);
                    self.emit(TokenKind::IfTrue, &hi, "goto", L_UPPER_BOUND, frame);
                }
            }

            offset = Some(match offset {
                None => idx_addr,
                Some(acc) => {
                    let scaled = if let Some(&bound_dim) = decl_dims.get(i) {
                        let bound_addr = self.ast.addr(bound_dim).to_owned();
                        let t = self.make_tmp();
                        self.emit(TokenKind::Star, &t, &acc, &bound_addr, frame);
                        t
                    } else {
                        acc
                    };
                    let t = self.make_tmp();
                    self.emit(TokenKind::Plus, &t, &scaled, &idx_addr, frame);
                    t
                }
            });
        }

        format!("{}[{}]", base_name, offset.unwrap_or_default())
    }

    /// Appends the shared run-time-error section: one `pushl` per reachable
    /// error kind, falling through to the shared
    /// `L_eExit` trailer that calls the printer and exits.
    fn emit_rt_error_section(&mut self) {
        if !self.ir.has_rt_errors() {
            return;
        }
        let errors = self.ir.rt_errors.clone();
        for e in &errors {
            self.pending_labels.push(e.label.to_owned());
            let operand = format!("${}", e.data_name);
            self.emit_raw(TokenKind::PushL, &operand, "", "", "");
        }
        self.pending_labels.push(L_E_EXIT.to_owned());
        self.emit_raw(TokenKind::Call, "printf", "", "", "");
        self.emit_raw(TokenKind::Syscall, "exit", "", "", "");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::scope::ScopeTree;

    fn lower_src(src: &str) -> (IrProgram, Diagnostics) {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new(src).tokenize(&mut diag);
        let mut ast = Ast::new();
        let mut scope = ScopeTree::new();
        let root = {
            let mut parser = Parser::new(tokens, &mut ast, &mut scope, &mut diag);
            parser.parse_program()
        };
        let ir = lower_program(&ast, root, &scope, &mut diag);
        (ir, diag)
    }

    fn sig(e: &IrEntry) -> (TokenKind, &str, &str, &str) {
        (e.op, e.target.as_str(), e.lhs.as_str(), e.rhs.as_str())
    }

    #[test]
    fn declaration_and_addition() {
        let (ir, _) = lower_src("int a; a = 3 + 4;");
        let sigs: Vec<_> = ir.entries.iter().map(sig).collect();
        assert_eq!(
            sigs,
            vec![
                (TokenKind::Dec, "a", "int", ""),
                (TokenKind::Plus, "t1", "3", "4"),
                (TokenKind::Assign, "a", "t1", ""),
            ]
        );
    }

    #[test]
    fn if_else_threads_labels() {
        let (ir, _) = lower_src("int a; if (a < 5) a = 0; else a = 1;");
        let sigs: Vec<_> = ir.entries.iter().map(sig).collect();
        assert_eq!(
            sigs,
            vec![
                (TokenKind::Dec, "a", "int", ""),
                (TokenKind::Less, "t1", "a", "5"),
                (TokenKind::IfFalse, "t1", "goto", "L1"),
                (TokenKind::Assign, "a", "0", ""),
                (TokenKind::Goto, "L2", "", ""),
                (TokenKind::Assign, "a", "1", ""),
                (TokenKind::Nop, "", "", ""),
            ]
        );
        assert_eq!(ir.entries[5].labels, vec!["L1".to_string()]);
        assert_eq!(ir.entries[6].labels, vec!["L2".to_string()]);
    }

    #[test]
    fn for_loop_wires_head_step_and_exit() {
        let (ir, _) = lower_src("int i; for (i=0; i<3; i=i+1) { }");
        let sigs: Vec<_> = ir.entries.iter().map(sig).collect();
        assert_eq!(
            sigs,
            vec![
                (TokenKind::Dec, "i", "int", ""),
                (TokenKind::Assign, "i", "0", ""),
                (TokenKind::Less, "t1", "i", "3"),
                (TokenKind::IfFalse, "t1", "goto", "L2"),
                (TokenKind::Plus, "t2", "i", "1"),
                (TokenKind::Assign, "i", "t2", ""),
                (TokenKind::Goto, "L1", "", ""),
                (TokenKind::Nop, "", "", ""),
            ]
        );
        assert_eq!(ir.entries[2].labels, vec!["L1".to_string()]);
        assert_eq!(ir.entries[4].labels, vec!["L3".to_string()]);
        assert_eq!(ir.entries[7].labels, vec!["L2".to_string()]);
    }

    #[test]
    fn coercion_casts_a_double_literal_into_an_int_variable() {
        let (ir, _) = lower_src("int x; x = 2.5;");
        let sigs: Vec<_> = ir.entries.iter().map(sig).collect();
        assert_eq!(
            sigs,
            vec![
                (TokenKind::Dec, "x", "int", ""),
                (TokenKind::Cast, "t1", "2.5", "int"),
                (TokenKind::Assign, "x", "t1", ""),
            ]
        );
    }

    #[test]
    fn pre_and_post_increment_bumps_interleave_with_the_enclosing_expression() {
        let (ir, _) = lower_src("int a; a = ++a + a++;");
        let sigs: Vec<_> = ir.entries.iter().map(sig).collect();
        assert_eq!(
            sigs,
            vec![
                (TokenKind::Dec, "a", "int", ""),
                (TokenKind::Plus, "a", "a", "1"),
                (TokenKind::Assign, "t1", "a", ""),
                (TokenKind::Plus, "t2", "a", "t1"),
                (TokenKind::Plus, "a", "a", "1"),
                (TokenKind::Assign, "a", "t2", ""),
            ]
        );
    }

    #[test]
    fn break_and_continue_are_silently_dropped_outside_a_loop() {
        let (ir, _) = lower_src("break; continue;");
        assert!(ir.entries.is_empty());
    }

    #[test]
    fn dynamic_array_bound_access_reaches_both_error_labels() {
        let (ir, _) = lower_src("int n; int a[n]; int i; a[i] = 1;");
        assert!(ir.has_rt_errors());
        let ops: Vec<_> = ir.entries.iter().map(|e| e.op).collect();
        assert!(ops.iter().filter(|&&op| op == TokenKind::IfTrue).count() >= 3);
        let last_four: Vec<_> = ir.entries[ir.entries.len() - 4..].iter().map(sig).collect();
        assert_eq!(
            last_four,
            vec![
                (TokenKind::PushL, "$E_neg", "", ""),
                (TokenKind::PushL, "$E_upper", "", ""),
                (TokenKind::Call, "printf", "", ""),
                (TokenKind::Syscall, "exit", "", ""),
            ]
        );
        assert_eq!(ir.entries.last().unwrap().op, TokenKind::Syscall);
    }

    #[test]
    fn use_before_init_warns_once_per_declaration_not_once_per_node() {
        let (_, diag) = lower_src("int a; int b; b = a; b = a;");
        assert_eq!(diag.warning_count(), 2);
    }

    #[test]
    fn shadowing_a_parent_scope_binding_warns() {
        let (_, diag) = lower_src("int a; { int a; }");
        assert_eq!(diag.warning_count(), 1);
    }
}

//! Lexes, parses, and lowers a small Decaf-like language to a linear
//! SSA-style IR, optionally running a NOP-removal pass before printing it.
//!
//! The pipeline is `preprocess -> lex -> parse (AST, with scope side
//! effects) -> lower (IR) -> [nop removal] -> print`, each stage its own
//! module. [`compile`] drives the whole thing for the CLI front end in
//! `main.rs`.

pub mod ast;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod nop;
pub mod preprocess;
pub mod print;
pub mod scope;
pub mod tables;
pub mod token;

pub mod parser;

use ast::Ast;
use error::Diagnostics;
use ir::IrProgram;
use scope::ScopeTree;

pub struct CompileOptions {
    pub debug: bool,
    pub remove_nops: bool,
}

pub struct CompileResult {
    pub ast: Ast,
    pub scope: ScopeTree,
    pub diag: Diagnostics,
    pub ir: IrProgram,
    pub ir_after_nop: Option<IrProgram>,
}

/// Runs the whole pipeline over already-preprocessed source text. The CLI
/// owns reading/writing the `.pre` file; this function only ever sees
/// comment-free text.
pub fn compile(src: &str, opts: &CompileOptions) -> CompileResult {
    let mut diag = Diagnostics::new();
    let tokens = lexer::Lexer::new(src).tokenize(&mut diag);

    let mut ast = Ast::new();
    ast.set_debug(opts.debug);
    let mut scope = ScopeTree::new();
    let root = {
        let mut parser = parser::Parser::new(tokens, &mut ast, &mut scope, &mut diag);
        parser.parse_program()
    };

    let ir = lower::lower_program(&ast, root, &scope, &mut diag);
    let ir_after_nop = if opts.remove_nops {
        Some(IrProgram {
            entries: nop::remove_nops(&ir.entries),
            data: ir.data.clone(),
            rt_errors: ir.rt_errors.clone(),
        })
    } else {
        None
    };

    CompileResult {
        ast,
        scope,
        diag,
        ir,
        ir_after_nop,
    }
}

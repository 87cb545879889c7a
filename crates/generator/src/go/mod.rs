//! Structured Go emission
//!
//! [`GoDecl`] and friends describe declarations; [`CodeWriter`] renders them
//! with gofmt-style tab indentation.

mod ast;
mod code_writer;

pub use ast::{
    go_quote, Expr, Field, Func, GoDecl, Interface, InterfaceMethod, Param, Signature, Stmt,
    Struct,
};
pub use code_writer::{CodeWriter, IndentGuard};

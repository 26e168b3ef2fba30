//! graphjit-par - Parser for single-variable math expressions.
//!
//! Turns the flat token stream produced by `graphjit-lex` into an AST
//! rooted in an [`Arena`]. The grammar recognizes one free variable
//! (`x`), the constants `e` and `pi`, the sixteen single-argument
//! `math.h` functions in [`expr::FUNCTION_NAMES`], and the five
//! arithmetic operators `+ - * / ^` with implicit multiplication
//! (`5pi` reads as `5*pi`).

mod arena;
mod ast;
mod expr;

pub use arena::{Arena, ArenaGuard, ArenaMark};
pub use ast::{debug_dump_tree, BinaryOp, Node, UnaryOp};
pub use expr::{Parser, FUNCTION_NAMES};

//! The query language: lexing, parsing, compilation and evaluation.
//!
//! A query string is parsed into a [`ast::QueryNode`] tree, compiled
//! against a flushed [`crate::index::IndexReader`] into a
//! [`plan::QueryPlan`], and evaluated chunk by chunk by
//! [`eval::ChunkContext`].

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod plan;

pub use ast::{QueryNode, WildcardKind};
pub use parser::QueryParser;
pub use plan::{QueryCompiler, QueryPlan};

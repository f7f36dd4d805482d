//! Reference source frontend
//!
//! The engine itself is frontend-agnostic: it consumes anything implementing
//! [`SourceParser`] and [`SourcePrinter`]. This module ships the built-in
//! frontend for `.rcs` files, a small imperative language with classes,
//! functions, and expression statements, which is enough to exercise every
//! engine path end to end.

mod lexer;
mod parser;
mod printer;

pub use lexer::{lex, Token, TokenKind};
pub use parser::ScriptParser;
pub use printer::ScriptPrinter;

use crate::tree::SyntaxTree;
use crate::Result;

/// `parse(text) -> Tree | ParseError`
pub trait SourceParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<SyntaxTree>;
}

/// `print(Tree) -> text`
pub trait SourcePrinter: Send + Sync {
    fn print(&self, tree: &SyntaxTree) -> Result<String>;
}

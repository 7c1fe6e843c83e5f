//! Command language: one line of text → global setting or track method chain.

pub mod ast;
pub mod error;
pub mod parser;

pub use ast::*;
pub use error::{ErrorKind, ParseError};
pub use parser::parse;

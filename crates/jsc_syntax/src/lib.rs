//! Token kinds and the typed AST/symbol/scope data model shared by every
//! front-end crate. This crate owns *definitions only* — no parsing logic
//! lives here; `jsc_parser` owns the rules that build these types.

pub mod ast;
pub mod kind;
pub mod scope;
pub mod symbol;
pub mod token;

pub use jsc_rowan::{Idx, TextRange, TextSize};
pub use kind::SyntaxKind;
pub use token::{Token, TokenKind};

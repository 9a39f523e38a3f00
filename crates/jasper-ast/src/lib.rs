//! Jasper typed syntax tree and type representation.
//!
//! This crate defines the input surface of the class lowering engine: the
//! typed tree the front end hands over after parsing and type resolution,
//! plus the interned type system the engine reasons with.

pub mod ast;
pub mod span;
pub mod types;

pub use span::Span;
pub use types::{Type, TypeContext, TypeId};

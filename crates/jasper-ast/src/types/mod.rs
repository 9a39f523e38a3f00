//! Jasper type system: interned types and the type context.

mod context;
mod ty;

pub use context::TypeContext;
pub use ty::{ClassType, FunctionType, PrimitiveType, Type, TypeId};

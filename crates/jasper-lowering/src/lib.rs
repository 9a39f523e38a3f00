//! Jasper class lowering engine.
//!
//! Lowers class declarations of a single-inheritance object language onto
//! plain procedural output: a data record per class (inherited fields
//! first), a dispatch-table record of function-pointer slots, mangled
//! symbols for every method and constructor, delegating constructor chains,
//! and generated super-call trampolines that patch the dispatch table around
//! an ancestor invocation.
//!
//! The front end (lexer, parser, type resolution) and the back end
//! (statement/expression printers, multi-file orchestration) are external
//! collaborators; this crate consumes a typed syntax tree from `jasper-ast`
//! and produces the structural output model in [`lower::output`].

pub mod classes;
pub mod diagnostic;
pub mod error;
pub mod lower;
pub mod scope;

pub use classes::{analyze_module, Class, ClassRegistry};
pub use error::{LowerError, LowerResult, LowerWarning};
pub use lower::output::{LoweredClass, LoweredModule};
pub use lower::Lowerer;
pub use scope::{ClassScopeRegistry, ScopeTracker};

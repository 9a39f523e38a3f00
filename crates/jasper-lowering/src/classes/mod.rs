//! Class models and the analysis pass that builds them.

mod analyze;
mod model;
mod registry;

pub use analyze::{
    analyze_class, analyze_function_body, analyze_module, describe_candidate, select_overload,
    OverloadPick,
};
pub use model::{Class, Constructor, Field, Method, ResolvedDelegation};
pub use registry::ClassRegistry;

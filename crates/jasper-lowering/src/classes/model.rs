//! Structural representation of analyzed classes.
//!
//! A [`Class`] is built once when its declaration is analyzed and is
//! immutable afterward; the lowering passes only read it.

use jasper_ast::ast::{Block, DelegationKind, Expression, Param, Visibility};
use jasper_ast::types::TypeId;
use jasper_ast::Span;

/// A declared field, in declaration order.
#[derive(Debug, Clone)]
pub struct Field {
    pub visibility: Visibility,
    pub name: String,
    pub ty: TypeId,
    pub span: Span,
}

/// An analyzed method.
///
/// `owner` is `None` for free functions. For virtual-slot entries the owner
/// is the class whose implementation currently fills the slot, which a
/// subclass override updates in place.
#[derive(Debug, Clone)]
pub struct Method {
    pub owner: Option<String>,
    pub visibility: Visibility,
    pub is_virtual: bool,
    pub name: String,
    pub ret: TypeId,
    pub params: Vec<Param>,
    pub body: Option<Block>,
    /// Index of the originating declaration node within its class, used to
    /// re-locate the body in later passes.
    pub decl_index: Option<usize>,
    pub span: Span,
}

impl Method {
    pub fn param_types(&self) -> Vec<TypeId> {
        self.params.iter().map(|p| p.ty).collect()
    }

    /// Method equality: owner, name, return type, and parameter types all
    /// match. This is the basis for override detection and overload
    /// distinction.
    pub fn signature_matches(&self, other: &Method) -> bool {
        self.owner == other.owner
            && self.name == other.name
            && self.ret == other.ret
            && self.param_types() == other.param_types()
    }
}

/// A resolved `this(...)`/`super(...)` delegation: the prior constructor it
/// targets and the argument expressions handed to it.
#[derive(Debug, Clone)]
pub struct ResolvedDelegation {
    pub kind: DelegationKind,
    pub target_class: String,
    pub target_params: Vec<TypeId>,
    pub args: Vec<Expression>,
    pub span: Span,
}

/// An analyzed constructor. Its emitted symbol is derived from the owner and
/// parameter-type mangle; constructors carry no user-chosen name.
#[derive(Debug, Clone)]
pub struct Constructor {
    pub owner: String,
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub delegation: Option<ResolvedDelegation>,
    pub body: Block,
    /// Index of the originating declaration node within its class.
    pub decl_index: usize,
    pub span: Span,
}

impl Constructor {
    pub fn param_types(&self) -> Vec<TypeId> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

/// An analyzed class.
#[derive(Debug, Clone)]
pub struct Class {
    /// Fully qualified (namespaced) name.
    pub name: String,
    /// Immediate parent, if any. The parent chain forms the lineage.
    pub parent: Option<String>,
    /// Interned class type.
    pub ty: TypeId,
    /// Own fields, declaration order preserved.
    pub fields: Vec<Field>,
    /// Concrete (non-virtual) methods.
    pub methods: Vec<Method>,
    /// Virtual slot list: inherited slots first in first-introduction order,
    /// own additions appended, overridden slots replaced in place.
    pub virtuals: Vec<Method>,
    pub ctors: Vec<Constructor>,
    pub span: Span,
}

impl Class {
    /// Virtual slots this class itself implements (own introductions and
    /// overrides of inherited slots).
    pub fn own_virtuals(&self) -> impl Iterator<Item = &Method> {
        self.virtuals
            .iter()
            .filter(|m| m.owner.as_deref() == Some(self.name.as_str()))
    }

    pub fn has_virtuals(&self) -> bool {
        !self.virtuals.is_empty()
    }
}

//! Printer-facing output model.
//!
//! Structural lowering produces these records; the external statement and
//! expression printer renders them to text verbatim. Bodies are carried as
//! syntax subtrees (original or synthesized) and skipped during
//! serialization; everything else — record shapes, slot order, symbols — is
//! serializable so tooling can snapshot the structural encoding. Emitted
//! symbols are a stable textual ABI: they must not change between
//! non-semantic-affecting recompiles.

use jasper_ast::ast::Block;
use jasper_ast::types::TypeId;
use jasper_ast::Span;
use serde::Serialize;

/// One field of an emitted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeId,
}

/// A plain record declaration (data record or dispatch-table record).
///
/// `tag` is `None` for an anonymous record. Anonymous records are legal only
/// at top level; the printer never nests one inside another anonymous record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDecl {
    pub name: String,
    pub tag: Option<String>,
    pub fields: Vec<RecordField>,
}

/// What kind of procedure a lowered function declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    Method,
    Virtual,
    Constructor,
    Trampoline,
    Free,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParam {
    pub name: String,
    pub ty: TypeId,
}

/// One emitted procedure: a concrete method, a virtual implementation, a
/// constructor, a super-call trampoline, or a free function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// Mangled symbol, unique within the run.
    pub symbol: String,
    pub kind: FunctionKind,
    /// Owning class; `None` for free functions.
    pub owner: Option<String>,
    pub ret: TypeId,
    pub params: Vec<FunctionParam>,
    /// Body subtree for the printer; not part of the structural snapshot.
    #[serde(skip)]
    pub body: Option<Block>,
    pub span: Span,
}

/// One function-pointer slot of a dispatch table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSlot {
    /// Slot (method) name within the table record.
    pub name: String,
    /// Function type of the slot's pointee. The first parameter is always
    /// the opaque receiver pointer, so the table shape is stable across the
    /// lineage.
    pub ty: TypeId,
    /// Mangled symbol of the implementation currently filling the slot.
    pub target: String,
    /// Implementing class.
    pub owner: String,
}

/// A class's dispatch table: the record declaration plus slot metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchTable {
    pub record: RecordDecl,
    pub slots: Vec<DispatchSlot>,
}

/// Everything lowered for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoweredClass {
    pub name: String,
    pub data_record: RecordDecl,
    /// Absent for virtual-free hierarchies.
    pub dispatch: Option<DispatchTable>,
    pub functions: Vec<FunctionDecl>,
}

/// A lowered compilation unit, classes in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct LoweredModule {
    pub classes: Vec<LoweredClass>,
    pub functions: Vec<FunctionDecl>,
}

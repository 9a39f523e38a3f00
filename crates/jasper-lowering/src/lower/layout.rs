//! Structural lowering of classes into plain records.
//!
//! A class lowers to two records: a data record holding the lineage's fields
//! (root ancestor first, each class's declaration order preserved) and a
//! dispatch-table record holding one function-pointer slot per distinct
//! virtual method name, ordered by first introduction walking the lineage
//! root-first. Overrides replace a slot's target in place; the slot set and
//! order never change below the class that introduced them.

use jasper_ast::types::{TypeContext, TypeId};

use crate::classes::{Class, ClassRegistry, Method};
use crate::error::{LowerError, LowerResult};

use super::mangle::{flat_name, output_name, Mangler};
use super::output::{DispatchSlot, DispatchTable, RecordDecl, RecordField};

/// Name of the instance-held dispatch-table pointer, injected as the first
/// root field of every data record whose lineage has virtual methods.
pub const TABLE_POINTER_FIELD: &str = "__vt";

/// Compose a class's virtual slot list from its parent's slots and its own
/// virtual declarations.
///
/// Inherited slots come first, in first-introduction order. Redeclaring an
/// inherited slot with an identical parameter-type signature replaces the
/// slot in place (same index, new implementation); a different signature at
/// the same name is a redeclaration error — virtual methods cannot be
/// overloaded by signature at one name.
pub fn compose_virtuals(parent: &[Method], own: Vec<Method>) -> LowerResult<Vec<Method>> {
    let mut slots: Vec<Method> = parent.to_vec();
    for method in own {
        match slots.iter().position(|slot| slot.name == method.name) {
            Some(index) => {
                let slot = &slots[index];
                if slot.param_types() != method.param_types() || slot.ret != method.ret {
                    return Err(LowerError::Redeclare {
                        name: method.name.clone(),
                        original: Some(slot.span),
                        span: method.span,
                    });
                }
                slots[index] = method;
            }
            None => slots.push(method),
        }
    }
    Ok(slots)
}

/// Build the data record: lineage fields root-first, the table pointer first
/// of all when the lineage has any virtual method.
pub fn data_record(
    class: &Class,
    registry: &ClassRegistry,
    types: &mut TypeContext,
) -> LowerResult<RecordDecl> {
    let mut fields = Vec::new();
    if class.has_virtuals() {
        fields.push(RecordField {
            name: TABLE_POINTER_FIELD.to_string(),
            ty: TypeContext::VOID_PTR,
        });
    }
    for ancestor in registry.lineage(&class.name) {
        for field in &ancestor.fields {
            fields.push(RecordField {
                name: output_name(&field.name),
                ty: storage_type(types, field.ty),
            });
        }
    }
    let name = flat_name(&class.name);
    Ok(RecordDecl {
        name: name.clone(),
        tag: Some(name),
        fields,
    })
}

/// Object references embed as pointers in the lowered record.
fn storage_type(types: &mut TypeContext, ty: TypeId) -> TypeId {
    if types.is_class(ty) {
        types.pointer_to(ty)
    } else {
        ty
    }
}

/// Build the dispatch-table record for a class, or `None` when the lineage
/// declares no virtual methods.
///
/// Every slot's pointee is a function type whose first parameter is the
/// opaque receiver pointer, so the table shape is identical for every class
/// sharing the slot. Callers must generate super trampolines before emitting
/// the returned record: trampoline declarations occupy emitted symbol space.
pub fn dispatch_table(
    class: &Class,
    types: &mut TypeContext,
    mangler: &mut Mangler,
) -> LowerResult<Option<DispatchTable>> {
    if !class.has_virtuals() {
        return Ok(None);
    }
    let mut slots = Vec::with_capacity(class.virtuals.len());
    let mut fields = Vec::with_capacity(class.virtuals.len());
    for method in &class.virtuals {
        let owner = method
            .owner
            .clone()
            .ok_or_else(|| LowerError::ClassNotDefined {
                name: method.name.clone(),
                span: method.span,
            })?;
        let mut slot_params = vec![TypeContext::VOID_PTR];
        slot_params.extend(method.param_types());
        let slot_ty = types.function_type(slot_params, method.ret);
        let target = mangler.method_symbol(types, Some(&owner), &method.name, &method.param_types());
        fields.push(RecordField {
            name: output_name(&method.name),
            ty: types.pointer_to(slot_ty),
        });
        slots.push(DispatchSlot {
            name: output_name(&method.name),
            ty: slot_ty,
            target,
            owner,
        });
    }
    let name = format!("{}_vt", flat_name(&class.name));
    Ok(Some(DispatchTable {
        record: RecordDecl {
            name: name.clone(),
            tag: Some(name),
            fields,
        },
        slots,
    }))
}

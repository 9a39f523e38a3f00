//! Super-call trampolines.
//!
//! `super.method(...)` must run the parent's implementation while every
//! virtual self-call inside that implementation still dispatches on the
//! instance's actual runtime type. A direct call to the parent's mangled
//! symbol would break the latter, so each overriding virtual method gets a
//! companion procedure that patches the instance's dispatch slot to the
//! next-more-ancestral implementation, calls through the table, and puts the
//! slot back: save, patch, call, restore, return. The table is bit-identical
//! before and after the call.
//!
//! Runtime contract: the patch window is not synchronized. Concurrent
//! virtual calls on the same instance while a super-call is in flight
//! observe a transiently incorrect slot; generated code assumes
//! single-threaded access to any instance executing a super-call.

use jasper_ast::ast::{
    Block, CallExpr, Expression, FieldAccess, Identifier, ReturnStmt, Statement, VarDeclStmt,
};
use jasper_ast::types::TypeContext;
use jasper_ast::Span;

use crate::classes::{Class, ClassRegistry, Method};
use crate::error::LowerResult;

use super::ctor::{assign_stmt, receiver_rebind, RECEIVER_PARAM};
use super::layout::TABLE_POINTER_FIELD;
use super::mangle::{output_name, Mangler};
use super::output::{FunctionDecl, FunctionKind, FunctionParam};

/// Prefix of the undecorated name given to generated super-call methods.
pub const SUPER_PREFIX: &str = "super_";

/// Generate the companion super-call procedure for every slot this class
/// overrides — every own virtual whose parent carries an implementation one
/// level up. Must run before record emission, because trampoline
/// declarations occupy emitted symbol space.
pub fn generate_trampolines(
    class: &Class,
    registry: &ClassRegistry,
    types: &mut TypeContext,
    mangler: &mut Mangler,
) -> LowerResult<Vec<FunctionDecl>> {
    let Some(parent_name) = class.parent.as_deref() else {
        return Ok(Vec::new());
    };
    let parent = registry.expect(parent_name, class.span)?;
    let mut decls = Vec::new();
    for method in class.own_virtuals() {
        if let Some(ancestor) = parent.virtuals.iter().find(|slot| slot.name == method.name) {
            decls.push(build_trampoline(class, method, ancestor, types, mangler));
        }
    }
    Ok(decls)
}

fn build_trampoline(
    class: &Class,
    method: &Method,
    ancestor: &Method,
    types: &mut TypeContext,
    mangler: &mut Mangler,
) -> FunctionDecl {
    let span = Span::synthesized();
    let owner_ptr = types.pointer_to(class.ty);
    let mut slot_params = vec![TypeContext::VOID_PTR];
    slot_params.extend(method.param_types());
    let slot_fn = types.function_type(slot_params, method.ret);
    let slot_ptr_ty = types.pointer_to(slot_fn);

    let ancestor_owner = ancestor.owner.as_deref().unwrap_or(&class.name);
    let ancestor_symbol =
        mangler.method_symbol(types, Some(ancestor_owner), &ancestor.name, &ancestor.param_types());

    // this->__vt-><slot>
    let slot_access = || {
        Expression::Field(FieldAccess {
            object: Box::new(Expression::Field(FieldAccess {
                object: Box::new(Expression::This {
                    ty: owner_ptr,
                    span,
                }),
                field: TABLE_POINTER_FIELD.to_string(),
                ty: TypeContext::VOID_PTR,
                span,
            })),
            field: output_name(&method.name),
            ty: slot_ptr_ty,
            span,
        })
    };

    let returns_value = !types.get(method.ret).is_void();
    let mut statements = Vec::with_capacity(6);

    statements.push(receiver_rebind(owner_ptr, span));
    // save the live slot
    statements.push(Statement::VarDecl(VarDeclStmt {
        name: "old".to_string(),
        ty: slot_ptr_ty,
        init: Some(slot_access()),
        span,
    }));
    // patch in the ancestor implementation
    statements.push(assign_stmt(
        slot_access(),
        Expression::Ident(Identifier::new(ancestor_symbol, slot_ptr_ty, span)),
        slot_ptr_ty,
        span,
    ));
    // call through the dispatch table, never the symbol directly
    let mut args = Vec::with_capacity(method.params.len() + 1);
    args.push(Expression::This {
        ty: owner_ptr,
        span,
    });
    args.extend(
        method
            .params
            .iter()
            .map(|p| Expression::Ident(Identifier::new(p.name.clone(), p.ty, span))),
    );
    let call = Expression::Call(CallExpr {
        callee: Box::new(slot_access()),
        args,
        ty: method.ret,
        span,
    });
    if returns_value {
        statements.push(Statement::VarDecl(VarDeclStmt {
            name: "result".to_string(),
            ty: method.ret,
            init: Some(call),
            span,
        }));
    } else {
        statements.push(Statement::Expr(call));
    }
    // restore before returning
    statements.push(assign_stmt(
        slot_access(),
        Expression::Ident(Identifier::new("old", slot_ptr_ty, span)),
        slot_ptr_ty,
        span,
    ));
    statements.push(Statement::Return(ReturnStmt {
        value: returns_value
            .then(|| Expression::Ident(Identifier::new("result", method.ret, span))),
        span,
    }));

    let symbol = mangler.method_symbol(
        types,
        Some(&class.name),
        &format!("{SUPER_PREFIX}{}", method.name),
        &method.param_types(),
    );
    let mut params = Vec::with_capacity(method.params.len() + 1);
    params.push(FunctionParam {
        name: RECEIVER_PARAM.to_string(),
        ty: TypeContext::VOID_PTR,
    });
    params.extend(method.params.iter().map(|p| FunctionParam {
        name: p.name.clone(),
        ty: p.ty,
    }));

    FunctionDecl {
        symbol,
        kind: FunctionKind::Trampoline,
        owner: Some(class.name.clone()),
        ret: method.ret,
        params,
        body: Some(Block::new(statements, span)),
        span,
    }
}

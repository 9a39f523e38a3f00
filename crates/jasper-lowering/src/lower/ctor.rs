//! Constructor chain compilation.
//!
//! A constructor lowers to a free procedure that receives the instance as an
//! opaque first parameter, rebinds it as a typed `this`, runs the delegated
//! prior constructor (if any) before the user body, and unconditionally
//! returns the receiver after the body regardless of user control flow.

use jasper_ast::ast::{
    AssignExpr, Block, CallExpr, CastExpr, Expression, Identifier, ReturnStmt, Statement,
    VarDeclStmt,
};
use jasper_ast::types::{TypeContext, TypeId};
use jasper_ast::Span;

use crate::classes::{Class, Constructor};
use crate::error::LowerResult;

use super::mangle::Mangler;
use super::output::{FunctionDecl, FunctionKind, FunctionParam};

/// Name of the opaque receiver parameter in emitted procedures.
pub const RECEIVER_PARAM: &str = "self";

/// Lower one constructor of `class` into an emitted procedure.
pub fn lower_constructor(
    class: &Class,
    ctor: &Constructor,
    types: &mut TypeContext,
    mangler: &mut Mangler,
) -> LowerResult<FunctionDecl> {
    let span = Span::synthesized();
    let owner_ptr = types.pointer_to(class.ty);
    let mut statements = Vec::with_capacity(ctor.body.statements.len() + 3);

    // Owner* this = (Owner*)self;
    statements.push(receiver_rebind(owner_ptr, span));

    if let Some(delegation) = &ctor.delegation {
        let symbol = mangler.ctor_symbol(types, &delegation.target_class, &delegation.target_params);
        let target_ret = types
            .lookup_named_type(&delegation.target_class)
            .map(|ty| types.pointer_to(ty))
            .unwrap_or(TypeContext::VOID_PTR);
        let mut callee_params = vec![TypeContext::VOID_PTR];
        callee_params.extend(delegation.target_params.iter().copied());
        let callee_fn = types.function_type(callee_params, target_ret);
        let callee_ty = types.pointer_to(callee_fn);

        let mut args = Vec::with_capacity(delegation.args.len() + 1);
        args.push(this_ref(owner_ptr, span));
        args.extend(delegation.args.iter().cloned());
        statements.push(Statement::Expr(Expression::Call(CallExpr {
            callee: Box::new(Expression::Ident(Identifier::new(symbol, callee_ty, span))),
            args,
            ty: target_ret,
            span,
        })));
    }

    statements.extend(ctor.body.statements.iter().cloned());

    // Every constructor implicitly returns the receiver, whatever the user
    // body did.
    statements.push(Statement::Return(ReturnStmt {
        value: Some(this_ref(owner_ptr, span)),
        span,
    }));

    let symbol = mangler.ctor_symbol(types, &class.name, &ctor.param_types());
    let mut params = Vec::with_capacity(ctor.params.len() + 1);
    params.push(FunctionParam {
        name: RECEIVER_PARAM.to_string(),
        ty: TypeContext::VOID_PTR,
    });
    params.extend(ctor.params.iter().map(|p| FunctionParam {
        name: p.name.clone(),
        ty: p.ty,
    }));

    Ok(FunctionDecl {
        symbol,
        kind: FunctionKind::Constructor,
        owner: Some(class.name.clone()),
        ret: owner_ptr,
        params,
        body: Some(Block::new(statements, ctor.body.span)),
        span: ctor.span,
    })
}

/// `Owner* this = (Owner*)self;`
pub(super) fn receiver_rebind(owner_ptr: TypeId, span: Span) -> Statement {
    Statement::VarDecl(VarDeclStmt {
        name: "this".to_string(),
        ty: owner_ptr,
        init: Some(Expression::Cast(CastExpr {
            expr: Box::new(Expression::Ident(Identifier::new(
                RECEIVER_PARAM,
                TypeContext::VOID_PTR,
                span,
            ))),
            ty: owner_ptr,
            span,
        })),
        span,
    })
}

pub(super) fn this_ref(owner_ptr: TypeId, span: Span) -> Expression {
    Expression::Ident(Identifier::new("this", owner_ptr, span))
}

/// `target = value;` as a statement.
pub(super) fn assign_stmt(target: Expression, value: Expression, ty: TypeId, span: Span) -> Statement {
    Statement::Expr(Expression::Assign(AssignExpr {
        target: Box::new(target),
        value: Box::new(value),
        ty,
        span,
    }))
}

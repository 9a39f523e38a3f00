//! Class and member analysis
//!
//! Builds [`Class`] models from declarations. The visibility scope tracker is
//! consulted for every member declaration and for every reference inside
//! method and constructor bodies, so all Redeclare/UnknownIdentifier/
//! AmbiguousMember conditions surface here, before structural lowering runs.

use jasper_ast::ast::{
    Block, CallExpr, ClassDecl, DelegationKind, Expression, FreeFunctionDecl, Module, Param,
    Statement,
};
use jasper_ast::types::{Type, TypeContext, TypeId};
use jasper_ast::Span;

use crate::error::{LowerError, LowerResult};
use crate::lower::layout::compose_virtuals;
use crate::scope::{MethodCandidate, ScopeTracker};

use super::model::{Class, Constructor, Field, Method, ResolvedDelegation};
use super::registry::ClassRegistry;

/// Analyze one compilation unit: free-function signatures first (so bodies
/// can call across declaration order), then classes in declaration order,
/// then free-function bodies.
pub fn analyze_module(
    module: &Module,
    types: &mut TypeContext,
    classes: &mut ClassRegistry,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<()> {
    for func in &module.functions {
        let params = func.params.iter().map(|p| p.ty).collect();
        let fn_ty = types.function_type(params, func.ret);
        scopes.declare_function(&func.name, fn_ty, func.span)?;
    }
    for decl in &module.classes {
        analyze_class(decl, types, classes, scopes)?;
    }
    for func in &module.functions {
        analyze_function_body(func, types, scopes)?;
    }
    Ok(())
}

/// Analyze a class declaration and register the resulting model.
///
/// A class in which any member fails produces no model and no output; the
/// error unwinds to the caller.
pub fn analyze_class(
    decl: &ClassDecl,
    types: &mut TypeContext,
    classes: &mut ClassRegistry,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<()> {
    if let Some(existing) = classes.get(&decl.name) {
        return Err(LowerError::Redeclare {
            name: decl.name.clone(),
            original: Some(existing.span),
            span: decl.span,
        });
    }
    let (parent_ty, parent_virtuals, parent_ctor_params) = match decl.parent.as_deref() {
        Some(parent_name) => {
            let parent = classes.expect(parent_name, decl.span)?;
            (
                Some(parent.ty),
                parent.virtuals.clone(),
                parent
                    .ctors
                    .iter()
                    .map(|c| c.param_types())
                    .collect::<Vec<_>>(),
            )
        }
        None => (None, Vec::new(), Vec::new()),
    };
    let class_ty = types.class_type(decl.name.clone(), parent_ty);

    scopes
        .registry_mut()
        .register_class(&decl.name, decl.parent.as_deref(), decl.span)?;
    scopes.open_class_scope(&decl.name, decl.span)?;
    let result = analyze_members(
        decl,
        class_ty,
        parent_ty,
        &parent_virtuals,
        &parent_ctor_params,
        types,
        scopes,
    );
    scopes.close_scope();

    classes.insert(result?)
}

#[allow(clippy::too_many_arguments)]
fn analyze_members(
    decl: &ClassDecl,
    class_ty: TypeId,
    parent_ty: Option<TypeId>,
    parent_virtuals: &[Method],
    parent_ctor_params: &[Vec<TypeId>],
    types: &mut TypeContext,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<Class> {
    // Fields, declaration order preserved.
    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        scopes.declare_field(&decl.name, field.visibility, &field.name, field.ty, field.span)?;
        fields.push(Field {
            visibility: field.visibility,
            name: field.name.clone(),
            ty: field.ty,
            span: field.span,
        });
    }

    // Methods, split into concrete and virtual.
    let mut methods = Vec::new();
    let mut own_virtuals = Vec::new();
    for (index, method) in decl.methods.iter().enumerate() {
        let param_types: Vec<TypeId> = method.params.iter().map(|p| p.ty).collect();
        scopes.declare_method(
            &decl.name,
            method.visibility,
            &method.name,
            param_types,
            method.ret,
            method.is_virtual,
            method.span,
        )?;
        let model = Method {
            owner: Some(decl.name.clone()),
            visibility: method.visibility,
            is_virtual: method.is_virtual,
            name: method.name.clone(),
            ret: method.ret,
            params: method.params.clone(),
            body: method.body.clone(),
            decl_index: Some(index),
            span: method.span,
        };
        if method.is_virtual {
            own_virtuals.push(model);
        } else {
            methods.push(model);
        }
    }
    let virtuals = compose_virtuals(parent_virtuals, own_virtuals)?;

    // Constructor shells first, so `this(...)` can delegate forward.
    let mut ctors = Vec::with_capacity(decl.ctors.len());
    for (index, ctor) in decl.ctors.iter().enumerate() {
        if let Some(span) = valued_return_span(&ctor.body) {
            return Err(LowerError::IllegalReturnInConstructor {
                class: decl.name.clone(),
                span,
            });
        }
        ctors.push(Constructor {
            owner: decl.name.clone(),
            visibility: ctor.visibility,
            params: ctor.params.clone(),
            delegation: None,
            body: ctor.body.clone(),
            decl_index: index,
            span: ctor.span,
        });
    }
    let own_ctor_params: Vec<Vec<TypeId>> = ctors.iter().map(|c| c.param_types()).collect();
    for (index, ctor) in decl.ctors.iter().enumerate() {
        if let Some(delegation) = &ctor.delegation {
            let resolved = resolve_delegation(
                decl,
                index,
                delegation.kind,
                &delegation.args,
                delegation.span,
                &own_ctor_params,
                parent_ctor_params,
                types,
            )?;
            ctors[index].delegation = Some(resolved);
        }
    }

    // Body analysis, after every member of the class is declared.
    let this_ty = types.pointer_to(class_ty);
    let super_ty = parent_ty.map(|p| types.pointer_to(p));
    for method in decl.methods.iter() {
        if let Some(body) = &method.body {
            scopes.open_scope();
            let result = analyze_body_scope(
                &decl.name,
                decl.parent.as_deref(),
                this_ty,
                super_ty,
                &method.params,
                None,
                body,
                types,
                scopes,
            );
            scopes.close_scope();
            result?;
        }
    }
    for ctor in decl.ctors.iter() {
        scopes.open_scope();
        let result = analyze_body_scope(
            &decl.name,
            decl.parent.as_deref(),
            this_ty,
            super_ty,
            &ctor.params,
            ctor.delegation.as_ref().map(|d| d.args.as_slice()),
            &ctor.body,
            types,
            scopes,
        );
        scopes.close_scope();
        result?;
    }

    Ok(Class {
        name: decl.name.clone(),
        parent: decl.parent.clone(),
        ty: class_ty,
        fields,
        methods,
        virtuals,
        ctors,
        span: decl.span,
    })
}

#[allow(clippy::too_many_arguments)]
fn resolve_delegation(
    decl: &ClassDecl,
    ctor_index: usize,
    kind: DelegationKind,
    args: &[Expression],
    span: Span,
    own_ctor_params: &[Vec<TypeId>],
    parent_ctor_params: &[Vec<TypeId>],
    types: &TypeContext,
) -> LowerResult<ResolvedDelegation> {
    let (target_class, candidates): (String, Vec<Vec<TypeId>>) = match kind {
        DelegationKind::This => (
            decl.name.clone(),
            own_ctor_params
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != ctor_index)
                .map(|(_, params)| params.clone())
                .collect(),
        ),
        DelegationKind::Super => (
            decl.parent.clone().unwrap_or_else(|| decl.name.clone()),
            parent_ctor_params.to_vec(),
        ),
    };
    let arg_types: Vec<TypeId> = args.iter().map(|a| a.ty()).collect();

    if let Some(exact) = candidates.iter().find(|params| **params == arg_types) {
        return Ok(ResolvedDelegation {
            kind,
            target_class,
            target_params: exact.clone(),
            args: args.to_vec(),
            span,
        });
    }
    let compatible: Vec<&Vec<TypeId>> = candidates
        .iter()
        .filter(|params| {
            params.len() == arg_types.len()
                && arg_types
                    .iter()
                    .zip(params.iter())
                    .all(|(&arg, &param)| types.is_assignable(arg, param))
        })
        .collect();
    match compatible.as_slice() {
        [] => Err(LowerError::NoConstructor {
            class: target_class,
            params: arg_types.iter().map(|&t| types.display(t)).collect(),
            span,
        }),
        [unique] => Ok(ResolvedDelegation {
            kind,
            target_class,
            target_params: (*unique).clone(),
            args: args.to_vec(),
            span,
        }),
        several => Err(LowerError::AmbiguousMember {
            name: format!("{target_class} constructor"),
            candidates: several
                .iter()
                .map(|params| describe_params(types, params))
                .collect(),
            span,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze_body_scope(
    class: &str,
    parent: Option<&str>,
    this_ty: TypeId,
    super_ty: Option<TypeId>,
    params: &[Param],
    delegation_args: Option<&[Expression]>,
    body: &Block,
    types: &TypeContext,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<()> {
    scopes.declare_receiver("this", class, this_ty, Span::synthesized())?;
    if let (Some(super_ty), Some(parent)) = (super_ty, parent) {
        scopes.declare_receiver("super", parent, super_ty, Span::synthesized())?;
    }
    for param in params {
        scopes.declare_variable(&param.name, param.ty, param.span)?;
    }
    let mut analyzer = BodyAnalyzer { types, scopes };
    if let Some(args) = delegation_args {
        for arg in args {
            analyzer.expr(arg)?;
        }
    }
    analyzer.block(body)
}

/// Analyze a free function's body against the tracker.
pub fn analyze_function_body(
    func: &FreeFunctionDecl,
    types: &TypeContext,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<()> {
    scopes.open_scope();
    let result = function_body_scope(func, types, scopes);
    scopes.close_scope();
    result
}

fn function_body_scope(
    func: &FreeFunctionDecl,
    types: &TypeContext,
    scopes: &mut ScopeTracker<'_>,
) -> LowerResult<()> {
    for param in &func.params {
        scopes.declare_variable(&param.name, param.ty, param.span)?;
    }
    BodyAnalyzer { types, scopes }.block(&func.body)
}

/// Scan a constructor body for an explicit valued `return`.
fn valued_return_span(block: &Block) -> Option<Span> {
    block.statements.iter().find_map(|stmt| match stmt {
        Statement::Return(ret) if ret.value.is_some() => Some(ret.span),
        Statement::Block(inner) => valued_return_span(inner),
        Statement::If(branch) => valued_return_span(&branch.then_branch)
            .or_else(|| branch.else_branch.as_ref().and_then(valued_return_span)),
        Statement::While(repeat) => valued_return_span(&repeat.body),
        _ => None,
    })
}

// ============================================================================
// Overload selection
// ============================================================================

/// Outcome of compatibility-based overload selection.
#[derive(Debug)]
pub enum OverloadPick<'m> {
    /// No candidate accepts the argument types.
    None,
    /// Exactly one candidate accepts them (or one matches exactly).
    Unique(&'m MethodCandidate),
    /// Several candidates accept them; the caller raises AmbiguousMember.
    Ambiguous(Vec<&'m MethodCandidate>),
}

/// Select among visible overloads: an exact parameter-type match wins
/// outright; otherwise assignability (`is`) compatibility is used, and more
/// than one compatible candidate is ambiguous.
pub fn select_overload<'m>(
    types: &TypeContext,
    candidates: &'m [MethodCandidate],
    args: &[TypeId],
) -> OverloadPick<'m> {
    if let Some(exact) = candidates.iter().find(|c| c.params == args) {
        return OverloadPick::Unique(exact);
    }
    let compatible: Vec<&MethodCandidate> = candidates
        .iter()
        .filter(|c| {
            c.params.len() == args.len()
                && args
                    .iter()
                    .zip(c.params.iter())
                    .all(|(&arg, &param)| types.is_assignable(arg, param))
        })
        .collect();
    match compatible.len() {
        0 => OverloadPick::None,
        1 => OverloadPick::Unique(compatible[0]),
        _ => OverloadPick::Ambiguous(compatible),
    }
}

/// Human-readable candidate signature for diagnostics.
pub fn describe_candidate(types: &TypeContext, candidate: &MethodCandidate) -> String {
    format!(
        "{}.{}",
        candidate.owner,
        describe_params(types, &candidate.params)
    )
}

fn describe_params(types: &TypeContext, params: &[TypeId]) -> String {
    let rendered: Vec<String> = params.iter().map(|&t| types.display(t)).collect();
    format!("({})", rendered.join(", "))
}

// ============================================================================
// Body walker
// ============================================================================

struct BodyAnalyzer<'a, 'r, 't> {
    types: &'t TypeContext,
    scopes: &'a mut ScopeTracker<'r>,
}

impl BodyAnalyzer<'_, '_, '_> {
    fn block(&mut self, block: &Block) -> LowerResult<()> {
        self.scopes.open_scope();
        let result = block.statements.iter().try_for_each(|s| self.stmt(s));
        self.scopes.close_scope();
        result
    }

    fn stmt(&mut self, stmt: &Statement) -> LowerResult<()> {
        match stmt {
            Statement::Expr(expr) => self.expr(expr),
            Statement::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.expr(init)?;
                }
                self.scopes.declare_variable(&decl.name, decl.ty, decl.span)
            }
            Statement::Return(ret) => match &ret.value {
                Some(value) => self.expr(value),
                None => Ok(()),
            },
            Statement::Block(inner) => self.block(inner),
            Statement::If(branch) => {
                self.expr(&branch.condition)?;
                self.block(&branch.then_branch)?;
                match &branch.else_branch {
                    Some(else_branch) => self.block(else_branch),
                    None => Ok(()),
                }
            }
            Statement::While(repeat) => {
                self.expr(&repeat.condition)?;
                self.block(&repeat.body)
            }
            Statement::Empty(_) => Ok(()),
        }
    }

    fn expr(&mut self, expr: &Expression) -> LowerResult<()> {
        match expr {
            Expression::IntLiteral { .. }
            | Expression::FloatLiteral { .. }
            | Expression::StrLiteral { .. }
            | Expression::BoolLiteral { .. }
            | Expression::This { .. } => Ok(()),
            Expression::Ident(id) => self
                .scopes
                .resolve_variable(&id.name, id.span)
                .map(|_| ()),
            Expression::Field(access) => {
                self.expr(&access.object)?;
                if let Some(class) = self.class_of(access.object.ty()) {
                    if self.scopes.resolve_field(&class, &access.field).is_none() {
                        return Err(LowerError::UnknownIdentifier {
                            name: access.field.clone(),
                            span: access.span,
                        });
                    }
                }
                Ok(())
            }
            Expression::Call(call) => self.call(call),
            Expression::Binary(binary) => {
                self.expr(&binary.left)?;
                self.expr(&binary.right)
            }
            Expression::Unary(unary) => self.expr(&unary.operand),
            Expression::Assign(assign) => {
                self.expr(&assign.target)?;
                self.expr(&assign.value)
            }
            Expression::Cast(cast) => self.expr(&cast.expr),
        }
    }

    fn call(&mut self, call: &CallExpr) -> LowerResult<()> {
        for arg in &call.args {
            self.expr(arg)?;
        }
        let arg_types: Vec<TypeId> = call.args.iter().map(|a| a.ty()).collect();
        match call.callee.as_ref() {
            Expression::Field(access) => {
                self.expr(&access.object)?;
                let Some(class) = self.class_of(access.object.ty()) else {
                    return Ok(());
                };
                let candidates = self.scopes.resolve_method(&class, &access.field);
                match select_overload(self.types, &candidates, &arg_types) {
                    OverloadPick::Unique(_) => Ok(()),
                    OverloadPick::Ambiguous(list) => Err(LowerError::AmbiguousMember {
                        name: access.field.clone(),
                        candidates: list
                            .iter()
                            .map(|c| describe_candidate(self.types, c))
                            .collect(),
                        span: call.span,
                    }),
                    OverloadPick::None => {
                        // A field holding a function pointer is a legal callee.
                        if self.scopes.resolve_field(&class, &access.field).is_some() {
                            Ok(())
                        } else {
                            Err(LowerError::UnknownIdentifier {
                                name: access.field.clone(),
                                span: access.span,
                            })
                        }
                    }
                }
            }
            Expression::Ident(id) => self
                .scopes
                .resolve_variable(&id.name, id.span)
                .map(|_| ()),
            other => self.expr(other),
        }
    }

    fn class_of(&self, ty: TypeId) -> Option<String> {
        match self.types.get(ty) {
            Type::Class(class) => Some(class.name.clone()),
            Type::Pointer(inner) => match self.types.get(*inner) {
                Type::Class(class) => Some(class.name.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

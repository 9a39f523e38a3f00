//! Structural lowering driver.
//!
//! Runs once per class after analysis: super trampolines first (they occupy
//! emitted symbol space), then the data and dispatch records, then one
//! declaration per concrete method, own virtual implementation, constructor,
//! and trampoline. A class in which anything fails produces no output at
//! all; the error unwinds to the multi-file orchestrator, which owns
//! retry/skip decisions.

pub mod ctor;
pub mod layout;
pub mod mangle;
pub mod output;
pub mod trampoline;

use jasper_ast::ast::{FreeFunctionDecl, Module};
use jasper_ast::types::TypeContext;
use jasper_ast::Span;

use crate::classes::{ClassRegistry, Method};
use crate::error::LowerResult;

use ctor::{lower_constructor, RECEIVER_PARAM};
use layout::{data_record, dispatch_table};
use mangle::Mangler;
use output::{FunctionDecl, FunctionKind, FunctionParam, LoweredClass, LoweredModule};
use trampoline::generate_trampolines;

/// The class lowering driver. Single-pass and single-threaded: one class is
/// fully lowered before the next begins, because trampoline and constructor
/// generation must observe a fully populated class model and stable slot
/// ordering.
pub struct Lowerer<'a> {
    types: &'a mut TypeContext,
    registry: &'a ClassRegistry,
    mangler: Mangler,
}

impl<'a> Lowerer<'a> {
    pub fn new(types: &'a mut TypeContext, registry: &'a ClassRegistry) -> Self {
        Self {
            types,
            registry,
            mangler: Mangler::new(),
        }
    }

    /// Lower every analyzed class in declaration order, then the module's
    /// free functions.
    pub fn lower_module(&mut self, module: &Module) -> LowerResult<LoweredModule> {
        let mut lowered = LoweredModule::default();
        let names: Vec<String> = self.registry.iter().map(|c| c.name.clone()).collect();
        for name in &names {
            lowered.classes.push(self.lower_class(name)?);
        }
        for func in &module.functions {
            lowered.functions.push(self.lower_free_function(func));
        }
        Ok(lowered)
    }

    /// Lower one class into its records and procedures.
    pub fn lower_class(&mut self, name: &str) -> LowerResult<LoweredClass> {
        let registry = self.registry;
        let class = registry.expect(name, Span::synthesized())?;

        // Trampolines come first: their symbols must exist before the table
        // text is emitted.
        let trampolines =
            generate_trampolines(class, registry, self.types, &mut self.mangler)?;
        let dispatch = dispatch_table(class, self.types, &mut self.mangler)?;
        let data_record = data_record(class, registry, self.types)?;

        let mut functions = Vec::new();
        for method in &class.methods {
            functions.push(self.lower_method(method, FunctionKind::Method));
        }
        for method in class.own_virtuals() {
            functions.push(self.lower_method(method, FunctionKind::Virtual));
        }
        for ctor in &class.ctors {
            functions.push(lower_constructor(class, ctor, self.types, &mut self.mangler)?);
        }
        functions.extend(trampolines);

        Ok(LoweredClass {
            name: class.name.clone(),
            data_record,
            dispatch,
            functions,
        })
    }

    fn lower_method(&mut self, method: &Method, kind: FunctionKind) -> FunctionDecl {
        let symbol = self.mangler.method_symbol(
            self.types,
            method.owner.as_deref(),
            &method.name,
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
            kind,
            owner: method.owner.clone(),
            ret: method.ret,
            params,
            body: method.body.clone(),
            span: method.span,
        }
    }

    /// Lower a free function. No receiver parameter is added; the symbol is
    /// still mangled so overloads never collide.
    pub fn lower_free_function(&mut self, func: &FreeFunctionDecl) -> FunctionDecl {
        let param_types: Vec<_> = func.params.iter().map(|p| p.ty).collect();
        let symbol = self
            .mangler
            .method_symbol(self.types, None, &func.name, &param_types);
        FunctionDecl {
            symbol,
            kind: FunctionKind::Free,
            owner: None,
            ret: func.ret,
            params: func
                .params
                .iter()
                .map(|p| FunctionParam {
                    name: p.name.clone(),
                    ty: p.ty,
                })
                .collect(),
            body: Some(func.body.clone()),
            span: func.span,
        }
    }

    /// The class registry this lowerer reads from.
    pub fn registry(&self) -> &ClassRegistry {
        self.registry
    }
}

/// Re-exported for callers that only need the class-level entry points.
pub use self::layout::compose_virtuals;
pub use self::mangle::{flat_name, output_name, param_mangle};

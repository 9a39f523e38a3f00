use jasper_ast::ast::*;
use jasper_ast::types::{TypeContext, TypeId};
use jasper_ast::Span;
use jasper_lowering::classes::{analyze_module, ClassRegistry};
use jasper_lowering::error::LowerError;
use jasper_lowering::lower::output::{FunctionKind, LoweredClass, LoweredModule};
use jasper_lowering::lower::Lowerer;
use jasper_lowering::scope::{ClassScopeRegistry, ScopeTracker};

// ============================================================================
// Helpers
// ============================================================================

fn sp() -> Span {
    Span::synthesized()
}

fn param(name: &str, ty: TypeId) -> Param {
    Param::new(name, ty, sp())
}

fn field(visibility: Visibility, name: &str, ty: TypeId) -> FieldDecl {
    FieldDecl {
        visibility,
        name: name.to_string(),
        ty,
        span: sp(),
    }
}

fn method(
    visibility: Visibility,
    is_virtual: bool,
    name: &str,
    ret: TypeId,
    params: Vec<Param>,
    body: Option<Block>,
) -> MethodDecl {
    MethodDecl {
        visibility,
        is_virtual,
        name: name.to_string(),
        ret,
        params,
        body,
        span: sp(),
    }
}

fn ctor(params: Vec<Param>, delegation: Option<Delegation>, body: Block) -> CtorDecl {
    CtorDecl {
        visibility: Visibility::Public,
        params,
        delegation,
        body,
        span: sp(),
    }
}

fn class(
    name: &str,
    parent: Option<&str>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    ctors: Vec<CtorDecl>,
) -> ClassDecl {
    ClassDecl {
        name: name.to_string(),
        parent: parent.map(str::to_string),
        fields,
        methods,
        ctors,
        span: sp(),
    }
}

fn return_str(value: &str) -> Block {
    Block::new(
        vec![Statement::Return(ReturnStmt {
            value: Some(Expression::StrLiteral {
                value: value.to_string(),
                ty: TypeContext::STR,
                span: sp(),
            }),
            span: sp(),
        })],
        sp(),
    )
}

fn analyze(types: &mut TypeContext, module: &Module) -> Result<ClassRegistry, LowerError> {
    let mut classes = ClassRegistry::new();
    let mut cache = ClassScopeRegistry::new();
    let mut scopes = ScopeTracker::new(&mut cache);
    analyze_module(module, types, &mut classes, &mut scopes)?;
    Ok(classes)
}

fn analyze_and_lower(types: &mut TypeContext, module: &Module) -> LoweredModule {
    let classes = analyze(types, module).unwrap();
    let mut lowerer = Lowerer::new(types, &classes);
    lowerer.lower_module(module).unwrap()
}

/// `class Animal { internal int x; public virtual string speak() }` and
/// `class Dog : Animal { public int y; public virtual string speak() }`,
/// each with a constructor; Dog's delegates `super()`.
fn animal_dog_module() -> Module {
    let animal = class(
        "Animal",
        None,
        vec![field(Visibility::Internal, "x", TypeContext::INT)],
        vec![method(
            Visibility::Public,
            true,
            "speak",
            TypeContext::STR,
            vec![],
            Some(return_str("...")),
        )],
        vec![ctor(vec![], None, Block::empty(sp()))],
    );
    let dog = class(
        "Dog",
        Some("Animal"),
        vec![field(Visibility::Public, "y", TypeContext::INT)],
        vec![method(
            Visibility::Public,
            true,
            "speak",
            TypeContext::STR,
            vec![],
            Some(return_str(" Woof")),
        )],
        vec![ctor(
            vec![param("age", TypeContext::INT)],
            Some(Delegation {
                kind: DelegationKind::Super,
                args: vec![],
                span: sp(),
            }),
            Block::new(
                vec![Statement::VarDecl(VarDeclStmt {
                    name: "tmp".to_string(),
                    ty: TypeContext::INT,
                    init: Some(Expression::IntLiteral {
                        value: 1,
                        ty: TypeContext::INT,
                        span: sp(),
                    }),
                    span: sp(),
                })],
                sp(),
            ),
        )],
    );
    Module {
        classes: vec![animal, dog],
        functions: vec![],
    }
}

fn lowered_class<'m>(module: &'m LoweredModule, name: &str) -> &'m LoweredClass {
    module
        .classes
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("class {name} not lowered"))
}

// ============================================================================
// Data Record Tests
// ============================================================================

#[test]
fn test_data_record_concatenates_lineage_root_first() {
    let mut types = TypeContext::new();
    let lowered = analyze_and_lower(&mut types, &animal_dog_module());

    let animal = lowered_class(&lowered, "Animal");
    let names: Vec<&str> = animal
        .data_record
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["__vt", "x"]);

    let dog = lowered_class(&lowered, "Dog");
    let names: Vec<&str> = dog
        .data_record
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["__vt", "x", "y"]);
}

#[test]
fn test_virtual_free_hierarchy_has_no_table_pointer() {
    let mut types = TypeContext::new();
    let module = Module {
        classes: vec![class(
            "Point",
            None,
            vec![
                field(Visibility::Public, "x", TypeContext::FLOAT),
                field(Visibility::Public, "y", TypeContext::FLOAT),
            ],
            vec![],
            vec![],
        )],
        functions: vec![],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    let point = lowered_class(&lowered, "Point");
    assert!(point.dispatch.is_none());
    let names: Vec<&str> = point
        .data_record
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["x", "y"]);
}

// ============================================================================
// Dispatch Table Tests
// ============================================================================

#[test]
fn test_override_replaces_slot_in_place() {
    let mut types = TypeContext::new();
    let lowered = analyze_and_lower(&mut types, &animal_dog_module());

    let animal = lowered_class(&lowered, "Animal");
    let animal_slots = &animal.dispatch.as_ref().unwrap().slots;
    assert_eq!(animal_slots.len(), 1);
    assert_eq!(animal_slots[0].name, "speak");
    assert_eq!(animal_slots[0].owner, "Animal");

    let dog = lowered_class(&lowered, "Dog");
    let dog_slots = &dog.dispatch.as_ref().unwrap().slots;
    assert_eq!(dog_slots.len(), 1, "override must not add a slot");
    assert_eq!(dog_slots[0].name, "speak");
    assert_eq!(dog_slots[0].owner, "Dog");
    assert_ne!(dog_slots[0].target, animal_slots[0].target);
}

#[test]
fn test_slot_order_is_first_introduction_root_first() {
    let mut types = TypeContext::new();
    let base = class(
        "Base",
        None,
        vec![],
        vec![
            method(Visibility::Public, true, "first", TypeContext::VOID, vec![], None),
            method(Visibility::Public, true, "second", TypeContext::VOID, vec![], None),
        ],
        vec![],
    );
    let derived = class(
        "Derived",
        Some("Base"),
        vec![],
        vec![
            // Overrides second, introduces third: slot order must stay
            // [first, second, third].
            method(Visibility::Public, true, "second", TypeContext::VOID, vec![], None),
            method(Visibility::Public, true, "third", TypeContext::VOID, vec![], None),
        ],
        vec![],
    );
    let module = Module {
        classes: vec![base, derived],
        functions: vec![],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    let derived = lowered_class(&lowered, "Derived");
    let slots = &derived.dispatch.as_ref().unwrap().slots;
    let names: Vec<&str> = slots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["first", "second", "third"]);
    let owners: Vec<&str> = slots.iter().map(|s| s.owner.as_str()).collect();
    assert_eq!(owners, ["Base", "Derived", "Derived"]);
}

#[test]
fn test_virtual_redeclare_with_new_signature_is_error() {
    let mut types = TypeContext::new();
    let base = class(
        "Base",
        None,
        vec![],
        vec![method(Visibility::Public, true, "speak", TypeContext::STR, vec![], None)],
        vec![],
    );
    let derived = class(
        "Derived",
        Some("Base"),
        vec![],
        vec![method(
            Visibility::Public,
            true,
            "speak",
            TypeContext::STR,
            vec![param("loudness", TypeContext::INT)],
            None,
        )],
        vec![],
    );
    let module = Module {
        classes: vec![base, derived],
        functions: vec![],
    };
    let err = analyze(&mut types, &module).unwrap_err();
    assert!(matches!(err, LowerError::Redeclare { ref name, .. } if name == "speak"));
}

// ============================================================================
// Constructor Chain Tests
// ============================================================================

#[test]
fn test_constructor_chain_closure() {
    let mut types = TypeContext::new();
    let lowered = analyze_and_lower(&mut types, &animal_dog_module());
    let dog = lowered_class(&lowered, "Dog");

    let ctor = dog
        .functions
        .iter()
        .find(|f| f.kind == FunctionKind::Constructor)
        .unwrap();
    assert!(ctor.symbol.starts_with("construct_Dog"));
    assert!(ctor.symbol.ends_with('_'));
    assert_eq!(ctor.params[0].name, "self");
    assert_eq!(ctor.params[0].ty, TypeContext::VOID_PTR);

    let body = ctor.body.as_ref().unwrap();
    assert_eq!(body.statements.len(), 4);

    // Entry: the receiver is rebound as `this` before anything else.
    assert!(matches!(
        &body.statements[0],
        Statement::VarDecl(decl) if decl.name == "this"
    ));
    // Exactly one delegated call, strictly before the user body.
    match &body.statements[1] {
        Statement::Expr(Expression::Call(call)) => match call.callee.as_ref() {
            Expression::Ident(id) => assert!(id.name.starts_with("construct_Animal")),
            other => panic!("expected symbol callee, got {other:?}"),
        },
        other => panic!("expected delegated call, got {other:?}"),
    }
    // User body next.
    assert!(matches!(
        &body.statements[2],
        Statement::VarDecl(decl) if decl.name == "tmp"
    ));
    // Exit: exactly one receiver return, strictly after the body.
    match &body.statements[3] {
        Statement::Return(ret) => match ret.value.as_ref().unwrap() {
            Expression::Ident(id) => assert_eq!(id.name, "this"),
            other => panic!("expected receiver return, got {other:?}"),
        },
        other => panic!("expected return, got {other:?}"),
    }
    let delegated_calls = body
        .statements
        .iter()
        .filter(|s| matches!(s, Statement::Expr(Expression::Call(_))))
        .count();
    assert_eq!(delegated_calls, 1);
}

#[test]
fn test_delegation_to_missing_constructor() {
    let mut types = TypeContext::new();
    let int_lit = |v: i64| Expression::IntLiteral {
        value: v,
        ty: TypeContext::INT,
        span: sp(),
    };
    // `this(1, 2)` but no two-argument constructor exists.
    let c = class(
        "Dog",
        None,
        vec![],
        vec![],
        vec![ctor(
            vec![],
            Some(Delegation {
                kind: DelegationKind::This,
                args: vec![int_lit(1), int_lit(2)],
                span: sp(),
            }),
            Block::empty(sp()),
        )],
    );
    let module = Module {
        classes: vec![c],
        functions: vec![],
    };
    let err = analyze(&mut types, &module).unwrap_err();
    match err {
        LowerError::NoConstructor { class, params, .. } => {
            assert_eq!(class, "Dog");
            assert_eq!(params, ["int", "int"]);
        }
        other => panic!("expected NoConstructor, got {other:?}"),
    }
}

#[test]
fn test_valued_return_in_constructor_is_error() {
    let mut types = TypeContext::new();
    let c = class(
        "Dog",
        None,
        vec![],
        vec![],
        vec![ctor(
            vec![],
            None,
            Block::new(
                vec![Statement::Return(ReturnStmt {
                    value: Some(Expression::IntLiteral {
                        value: 0,
                        ty: TypeContext::INT,
                        span: sp(),
                    }),
                    span: sp(),
                })],
                sp(),
            ),
        )],
    );
    let module = Module {
        classes: vec![c],
        functions: vec![],
    };
    let err = analyze(&mut types, &module).unwrap_err();
    assert!(matches!(
        err,
        LowerError::IllegalReturnInConstructor { ref class, .. } if class == "Dog"
    ));
}

// ============================================================================
// Super-Trampoline Tests
// ============================================================================

#[test]
fn test_trampoline_patches_ancestor_symbol_and_restores() {
    let mut types = TypeContext::new();
    let lowered = analyze_and_lower(&mut types, &animal_dog_module());

    let animal = lowered_class(&lowered, "Animal");
    let animal_speak = animal.dispatch.as_ref().unwrap().slots[0].target.clone();
    let dog = lowered_class(&lowered, "Dog");

    // Animal overrides nothing: no trampoline.
    assert!(!animal
        .functions
        .iter()
        .any(|f| f.kind == FunctionKind::Trampoline));

    let trampoline = dog
        .functions
        .iter()
        .find(|f| f.kind == FunctionKind::Trampoline)
        .expect("Dog.speak override must generate a trampoline");
    assert_eq!(trampoline.owner.as_deref(), Some("Dog"));
    assert_eq!(trampoline.ret, TypeContext::STR);

    let body = trampoline.body.as_ref().unwrap();
    // save → patch → call → restore → return, with the receiver rebind glue
    // up front and the non-void result captured before the restore.
    assert_eq!(body.statements.len(), 6);

    assert!(matches!(
        &body.statements[0],
        Statement::VarDecl(decl) if decl.name == "this"
    ));

    // Save: `old` reads the live slot through the instance's table pointer.
    let saved_slot = match &body.statements[1] {
        Statement::VarDecl(decl) => {
            assert_eq!(decl.name, "old");
            decl.init.clone().unwrap()
        }
        other => panic!("expected slot save, got {other:?}"),
    };
    assert!(matches!(&saved_slot, Expression::Field(_)));

    // Patch: the slot is overwritten with the ancestor implementation's
    // mangled symbol, not with the trampoline's own.
    match &body.statements[2] {
        Statement::Expr(Expression::Assign(assign)) => {
            assert_eq!(*assign.target, saved_slot);
            match assign.value.as_ref() {
                Expression::Ident(id) => assert_eq!(id.name, animal_speak),
                other => panic!("expected ancestor symbol, got {other:?}"),
            }
        }
        other => panic!("expected slot patch, got {other:?}"),
    }

    // Call: through the dispatch table, never the symbol directly.
    match &body.statements[3] {
        Statement::VarDecl(decl) => {
            assert_eq!(decl.name, "result");
            match decl.init.as_ref().unwrap() {
                Expression::Call(call) => {
                    assert_eq!(call.callee.as_ref(), &saved_slot);
                    assert!(matches!(call.args[0], Expression::This { .. }));
                }
                other => panic!("expected indirect call, got {other:?}"),
            }
        }
        other => panic!("expected result capture, got {other:?}"),
    }

    // Restore: the same slot is written back from `old`, so the table is
    // structurally identical before and after the call.
    match &body.statements[4] {
        Statement::Expr(Expression::Assign(assign)) => {
            assert_eq!(*assign.target, saved_slot);
            match assign.value.as_ref() {
                Expression::Ident(id) => assert_eq!(id.name, "old"),
                other => panic!("expected restore from old, got {other:?}"),
            }
        }
        other => panic!("expected slot restore, got {other:?}"),
    }

    // Return: the captured result, after the restore.
    match &body.statements[5] {
        Statement::Return(ret) => match ret.value.as_ref().unwrap() {
            Expression::Ident(id) => assert_eq!(id.name, "result"),
            other => panic!("expected result return, got {other:?}"),
        },
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn test_void_trampoline_has_no_result_capture() {
    let mut types = TypeContext::new();
    let base = class(
        "Base",
        None,
        vec![],
        vec![method(Visibility::Public, true, "tick", TypeContext::VOID, vec![], None)],
        vec![],
    );
    let derived = class(
        "Derived",
        Some("Base"),
        vec![],
        vec![method(Visibility::Public, true, "tick", TypeContext::VOID, vec![], None)],
        vec![],
    );
    let module = Module {
        classes: vec![base, derived],
        functions: vec![],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    let derived = lowered_class(&lowered, "Derived");
    let trampoline = derived
        .functions
        .iter()
        .find(|f| f.kind == FunctionKind::Trampoline)
        .unwrap();
    let body = trampoline.body.as_ref().unwrap();
    // rebind, save, patch, call, restore, bare return.
    assert_eq!(body.statements.len(), 6);
    assert!(matches!(&body.statements[3], Statement::Expr(Expression::Call(_))));
    match &body.statements[5] {
        Statement::Return(ret) => assert!(ret.value.is_none()),
        other => panic!("expected bare return, got {other:?}"),
    }
}

#[test]
fn test_trampoline_only_for_overridden_slots() {
    let mut types = TypeContext::new();
    let base = class(
        "Base",
        None,
        vec![],
        vec![method(Visibility::Public, true, "speak", TypeContext::STR, vec![], None)],
        vec![],
    );
    // Derived introduces a new virtual but overrides nothing.
    let derived = class(
        "Derived",
        Some("Base"),
        vec![],
        vec![method(Visibility::Public, true, "fetch", TypeContext::VOID, vec![], None)],
        vec![],
    );
    let module = Module {
        classes: vec![base, derived],
        functions: vec![],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    let derived = lowered_class(&lowered, "Derived");
    assert!(!derived
        .functions
        .iter()
        .any(|f| f.kind == FunctionKind::Trampoline));
}

// ============================================================================
// Mangling and ABI Stability Tests
// ============================================================================

#[test]
fn test_symbols_stable_across_runs() {
    let mut first_types = TypeContext::new();
    let first = analyze_and_lower(&mut first_types, &animal_dog_module());
    let mut second_types = TypeContext::new();
    let second = analyze_and_lower(&mut second_types, &animal_dog_module());

    let symbols = |module: &LoweredModule| -> Vec<String> {
        module
            .classes
            .iter()
            .flat_map(|c| c.functions.iter().map(|f| f.symbol.clone()))
            .collect()
    };
    assert_eq!(symbols(&first), symbols(&second));
}

#[test]
fn test_overloads_get_distinct_symbols() {
    let mut types = TypeContext::new();
    let c = class(
        "Feeder",
        None,
        vec![],
        vec![
            method(
                Visibility::Public,
                false,
                "feed",
                TypeContext::VOID,
                vec![param("amount", TypeContext::INT)],
                None,
            ),
            method(
                Visibility::Public,
                false,
                "feed",
                TypeContext::VOID,
                vec![param("amount", TypeContext::FLOAT)],
                None,
            ),
        ],
        vec![],
    );
    let module = Module {
        classes: vec![c],
        functions: vec![],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    let feeder = lowered_class(&lowered, "Feeder");
    let symbols: Vec<&str> = feeder
        .functions
        .iter()
        .filter(|f| f.kind == FunctionKind::Method)
        .map(|f| f.symbol.as_str())
        .collect();
    assert_eq!(symbols.len(), 2);
    assert_ne!(symbols[0], symbols[1]);
}

#[test]
fn test_structural_snapshot_serializes() {
    let mut types = TypeContext::new();
    let lowered = analyze_and_lower(&mut types, &animal_dog_module());
    let dog = lowered_class(&lowered, "Dog");
    let snapshot = serde_json::to_value(dog).unwrap();
    assert_eq!(snapshot["data_record"]["fields"][0]["name"], "__vt");
    assert_eq!(snapshot["dispatch"]["slots"][0]["name"], "speak");
    // Bodies are subtrees for the printer, not part of the snapshot.
    assert!(snapshot["functions"][0].get("body").is_none());
}

// ============================================================================
// Member Resolution Tests
// ============================================================================

#[test]
fn test_ambiguous_call_lists_candidates() {
    let mut types = TypeContext::new();
    let animal_ty = types.class_type("Animal", None);
    let dog_ty = types.class_type("Dog", Some(animal_ty));
    let pug_ty = types.class_type("Pug", Some(dog_ty));
    let feeder_ty = types.class_type("Feeder", None);
    let feeder_ptr = types.pointer_to(feeder_ty);

    let go_body = Block::new(
        vec![Statement::Expr(Expression::Call(CallExpr {
            callee: Box::new(Expression::Field(FieldAccess {
                object: Box::new(Expression::This {
                    ty: feeder_ptr,
                    span: sp(),
                }),
                field: "feed".to_string(),
                ty: TypeContext::VOID,
                span: sp(),
            })),
            args: vec![Expression::Ident(Identifier::new("p", pug_ty, sp()))],
            ty: TypeContext::VOID,
            span: sp(),
        }))],
        sp(),
    );
    let module = Module {
        classes: vec![
            class("Animal", None, vec![], vec![], vec![]),
            class("Dog", Some("Animal"), vec![], vec![], vec![]),
            class("Pug", Some("Dog"), vec![], vec![], vec![]),
            class(
                "Feeder",
                None,
                vec![],
                vec![
                    method(
                        Visibility::Public,
                        false,
                        "feed",
                        TypeContext::VOID,
                        vec![param("a", animal_ty)],
                        None,
                    ),
                    method(
                        Visibility::Public,
                        false,
                        "feed",
                        TypeContext::VOID,
                        vec![param("d", dog_ty)],
                        None,
                    ),
                    method(
                        Visibility::Public,
                        false,
                        "go",
                        TypeContext::VOID,
                        vec![param("p", pug_ty)],
                        Some(go_body),
                    ),
                ],
                vec![],
            ),
        ],
        functions: vec![],
    };
    let err = analyze(&mut types, &module).unwrap_err();
    match err {
        LowerError::AmbiguousMember { name, candidates, .. } => {
            assert_eq!(name, "feed");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected AmbiguousMember, got {other:?}"),
    }
}

#[test]
fn test_private_field_invisible_from_subclass_body() {
    let mut types = TypeContext::new();
    let a_ty = types.class_type("A", None);
    let b_ty = types.class_type("B", Some(a_ty));
    let b_ptr = types.pointer_to(b_ty);

    let peek_body = Block::new(
        vec![Statement::Expr(Expression::Field(FieldAccess {
            object: Box::new(Expression::This { ty: b_ptr, span: sp() }),
            field: "secret".to_string(),
            ty: TypeContext::INT,
            span: sp(),
        }))],
        sp(),
    );
    let module = Module {
        classes: vec![
            class(
                "A",
                None,
                vec![field(Visibility::Private, "secret", TypeContext::INT)],
                vec![],
                vec![],
            ),
            class(
                "B",
                Some("A"),
                vec![],
                vec![method(
                    Visibility::Public,
                    false,
                    "peek",
                    TypeContext::VOID,
                    vec![],
                    Some(peek_body),
                )],
                vec![],
            ),
        ],
        functions: vec![],
    };
    let err = analyze(&mut types, &module).unwrap_err();
    assert!(matches!(
        err,
        LowerError::UnknownIdentifier { ref name, .. } if name == "secret"
    ));
}

#[test]
fn test_internal_field_visible_from_subclass_body() {
    let mut types = TypeContext::new();
    let a_ty = types.class_type("A", None);
    let b_ty = types.class_type("B", Some(a_ty));
    let b_ptr = types.pointer_to(b_ty);

    let peek_body = Block::new(
        vec![Statement::Expr(Expression::Field(FieldAccess {
            object: Box::new(Expression::This { ty: b_ptr, span: sp() }),
            field: "age".to_string(),
            ty: TypeContext::INT,
            span: sp(),
        }))],
        sp(),
    );
    let module = Module {
        classes: vec![
            class(
                "A",
                None,
                vec![field(Visibility::Internal, "age", TypeContext::INT)],
                vec![],
                vec![],
            ),
            class(
                "B",
                Some("A"),
                vec![],
                vec![method(
                    Visibility::Public,
                    false,
                    "peek",
                    TypeContext::VOID,
                    vec![],
                    Some(peek_body),
                )],
                vec![],
            ),
        ],
        functions: vec![],
    };
    assert!(analyze(&mut types, &module).is_ok());
}

// ============================================================================
// Free Function Tests
// ============================================================================

#[test]
fn test_free_function_lowering_has_no_receiver() {
    let mut types = TypeContext::new();
    let module = Module {
        classes: vec![],
        functions: vec![FreeFunctionDecl {
            name: "main".to_string(),
            ret: TypeContext::INT,
            params: vec![],
            body: Block::new(
                vec![Statement::Return(ReturnStmt {
                    value: Some(Expression::IntLiteral {
                        value: 0,
                        ty: TypeContext::INT,
                        span: sp(),
                    }),
                    span: sp(),
                })],
                sp(),
            ),
            span: sp(),
        }],
    };
    let lowered = analyze_and_lower(&mut types, &module);
    assert_eq!(lowered.functions.len(), 1);
    let main = &lowered.functions[0];
    assert_eq!(main.kind, FunctionKind::Free);
    assert!(main.params.is_empty());
    assert!(main.symbol.starts_with("main"));
}

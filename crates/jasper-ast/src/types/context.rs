//! Type context for managing and interning types.

use super::ty::{ClassType, FunctionType, PrimitiveType, Type, TypeId};
use rustc_hash::FxHashMap;

/// Type context that manages all types in a compilation run.
///
/// Uses type interning so that identical types share one `TypeId`, which
/// makes type equality a handle comparison and keeps the lowered output
/// compact.
#[derive(Debug, Clone)]
pub struct TypeContext {
    /// Storage for all types, indexed by TypeId.
    types: Vec<Type>,

    /// Reverse mapping from Type to TypeId for interning.
    type_to_id: FxHashMap<Type, TypeId>,

    /// Named type definitions (class types, keyed by qualified name).
    named_types: FxHashMap<String, TypeId>,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Well-known TypeIds for pre-interned types. Order matches `new()`.
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const FLOAT: TypeId = TypeId(3);
    pub const STR: TypeId = TypeId(4);
    /// The opaque receiver pointer (`void*`) every dispatch slot takes first.
    pub const VOID_PTR: TypeId = TypeId(5);

    pub fn new() -> Self {
        let mut ctx = TypeContext {
            types: Vec::new(),
            type_to_id: FxHashMap::default(),
            named_types: FxHashMap::default(),
        };

        // Pre-intern common primitive types at the well-known ids above.
        ctx.intern(Type::Primitive(PrimitiveType::Void));
        ctx.intern(Type::Primitive(PrimitiveType::Bool));
        ctx.intern(Type::Primitive(PrimitiveType::Int));
        ctx.intern(Type::Primitive(PrimitiveType::Float));
        ctx.intern(Type::Primitive(PrimitiveType::Str));
        ctx.intern(Type::Pointer(Self::VOID));

        ctx
    }

    /// Intern a type, returning its TypeId.
    ///
    /// If the type already exists, returns the existing TypeId. Otherwise
    /// allocates a new TypeId and stores the type.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }

        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.type_to_id.insert(ty, id);
        id
    }

    /// Look up the type behind a TypeId.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Intern a pointer to `pointee`.
    pub fn pointer_to(&mut self, pointee: TypeId) -> TypeId {
        self.intern(Type::Pointer(pointee))
    }

    /// Intern a function type.
    pub fn function_type(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(Type::Function(FunctionType { params, ret }))
    }

    /// Intern a class type and register it under its qualified name.
    pub fn class_type(&mut self, name: impl Into<String>, parent: Option<TypeId>) -> TypeId {
        let name = name.into();
        let id = self.intern(Type::Class(ClassType {
            name: name.clone(),
            parent,
        }));
        self.named_types.insert(name, id);
        id
    }

    /// Resolve a registered named type.
    pub fn lookup_named_type(&self, name: &str) -> Option<TypeId> {
        self.named_types.get(name).copied()
    }

    /// Immediate parent of a class type, if `id` is a class with one.
    pub fn class_parent(&self, id: TypeId) -> Option<TypeId> {
        self.get(id).as_class().and_then(|class| class.parent)
    }

    /// True if `id` names a class type.
    pub fn is_class(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Class(_))
    }

    /// Assignability check (the language's `is` relation).
    ///
    /// `from` is assignable to `to` when the types are identical, when `from`
    /// is a class anywhere below `to` in its lineage, or when pointers agree
    /// up to the opaque receiver pointer.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        match (self.get(from), self.get(to)) {
            (Type::Class(_), Type::Class(_)) => {
                let mut cursor = self.class_parent(from);
                while let Some(ancestor) = cursor {
                    if ancestor == to {
                        return true;
                    }
                    cursor = self.class_parent(ancestor);
                }
                false
            }
            // Any pointer coerces to the opaque receiver pointer.
            (Type::Pointer(_), Type::Pointer(inner)) if *inner == Self::VOID => true,
            (Type::Pointer(a), Type::Pointer(b)) => self.is_assignable(*a, *b),
            _ => false,
        }
    }

    /// Textual form of a type, used in diagnostics and as the raw input to
    /// the name mangler's normalization.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Primitive(prim) => prim.display().to_string(),
            Type::Pointer(inner) => format!("{}*", self.display(*inner)),
            Type::Array(elem) => format!("{}[]", self.display(*elem)),
            Type::Function(func) => {
                let params: Vec<String> =
                    func.params.iter().map(|&p| self.display(p)).collect();
                format!("{}({})", self.display(func.ret), params.join(","))
            }
            Type::Class(class) => class.name.clone(),
        }
    }
}

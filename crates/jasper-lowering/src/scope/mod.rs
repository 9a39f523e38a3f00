//! Visibility scope tracker
//!
//! A stack of nested symbol frames recording lexical variables, free
//! functions, and per-class member partitions, with correct shadowing and
//! inheritance-aware fallback.
//!
//! Redeclaration checking uses scope-generation counters: every binding is
//! stamped with the generation current at its declaration, and opening a
//! scope bumps the generation. A binding collides only with a declaration of
//! the same generation; older bindings are shadowable. This replaces a
//! mutable new/old status tag with an immutable stamp.
//!
//! Per-class member partitions — (public, internal, private) × (field,
//! method) — live in a [`ClassScopeRegistry`] owned by the caller and passed
//! by reference into the tracker, so independent compilation runs can own and
//! reset their own cache. A class's partitions are built once, seeded from
//! its parent's public and internal partitions, and reused on every re-entry
//! of the class scope; the registry is append-only for the life of a run.

use jasper_ast::ast::Visibility;
use jasper_ast::types::TypeId;
use jasper_ast::Span;
use rustc_hash::FxHashMap;

use crate::error::{LowerError, LowerResult, LowerWarning};

/// Scope generation stamp.
pub type Generation = u32;

/// A lexical variable binding.
#[derive(Debug, Clone)]
pub struct VarBinding {
    pub ty: TypeId,
    /// Generation at declaration. Equal to the owning frame's generation
    /// until a nested scope opens.
    pub generation: Generation,
    /// Owning class for receiver aliases (`this`, `super`). Such scratch
    /// bindings are discarded once their class scope is no longer open.
    pub owner: Option<String>,
    pub span: Span,
}

/// A free-function binding. Resolution falls back to these when no variable
/// matches.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    /// Interned function type
    pub ty: TypeId,
    pub generation: Generation,
    pub span: Span,
}

/// A field entry in a class member partition.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// Declaring class
    pub owner: String,
    pub ty: TypeId,
    pub generation: Generation,
    pub span: Span,
}

/// One overload of a method entry in a class member partition.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    /// Implementing class (updated in place when a subclass overrides)
    pub owner: String,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub is_virtual: bool,
    pub generation: Generation,
    pub span: Span,
}

/// A successful field resolution.
#[derive(Debug, Clone)]
pub struct FieldHit {
    pub ty: TypeId,
    pub owner: String,
    pub visibility: Visibility,
}

/// A method candidate returned from resolution. The tracker returns every
/// visible overload; the caller performs compatibility-based selection and
/// raises ambiguity errors.
#[derive(Debug, Clone)]
pub struct MethodCandidate {
    pub owner: String,
    pub visibility: Visibility,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub is_virtual: bool,
    pub span: Span,
}

/// One visibility level's worth of member maps.
#[derive(Debug, Clone, Default)]
struct MemberPartition {
    fields: FxHashMap<String, FieldBinding>,
    methods: FxHashMap<String, Vec<MethodBinding>>,
}

/// The six cached member partitions of one class.
#[derive(Debug, Clone, Default)]
pub struct ClassScopes {
    public: MemberPartition,
    internal: MemberPartition,
    private: MemberPartition,
}

impl ClassScopes {
    fn partition(&self, visibility: Visibility) -> &MemberPartition {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Internal => &self.internal,
            Visibility::Private => &self.private,
        }
    }

    fn partition_mut(&mut self, visibility: Visibility) -> &mut MemberPartition {
        match visibility {
            Visibility::Public => &mut self.public,
            Visibility::Internal => &mut self.internal,
            Visibility::Private => &mut self.private,
        }
    }
}

const VISIBILITY_ORDER: [Visibility; 3] =
    [Visibility::Public, Visibility::Internal, Visibility::Private];

/// Caller-owned cache of per-class scope partitions.
///
/// Append-only within one compilation run: a class's partitions must be
/// populated before any subclass scope is opened, and are never invalidated
/// (classes are not hot-reloaded).
#[derive(Debug, Default)]
pub struct ClassScopeRegistry {
    scopes: FxHashMap<String, ClassScopes>,
    parents: FxHashMap<String, Option<String>>,
}

impl ClassScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, seeding its partitions from the immediate parent's
    /// public and internal partitions (the private partition is not
    /// inherited). Registering an already-known class is a no-op.
    pub fn register_class(
        &mut self,
        name: &str,
        parent: Option<&str>,
        span: Span,
    ) -> LowerResult<()> {
        if self.scopes.contains_key(name) {
            return Ok(());
        }
        let scopes = match parent {
            Some(parent_name) => {
                let parent_scopes =
                    self.scopes
                        .get(parent_name)
                        .ok_or_else(|| LowerError::ClassNotDefined {
                            name: parent_name.to_string(),
                            span,
                        })?;
                ClassScopes {
                    public: parent_scopes.public.clone(),
                    internal: parent_scopes.internal.clone(),
                    private: MemberPartition::default(),
                }
            }
            None => ClassScopes::default(),
        };
        self.scopes.insert(name.to_string(), scopes);
        self.parents
            .insert(name.to_string(), parent.map(str::to_string));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.parents.get(name).and_then(|p| p.as_deref())
    }

    /// True when `ancestor` is `class` itself or appears anywhere up its
    /// parent chain.
    pub fn in_lineage(&self, class: &str, ancestor: &str) -> bool {
        let mut cursor = Some(class);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// Distance from the lineage root; used to rank most-derived matches.
    fn depth(&self, class: &str) -> usize {
        let mut depth = 0;
        let mut cursor = self.parent_of(class);
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.parent_of(current);
        }
        depth
    }

    fn scopes(&self, name: &str) -> Option<&ClassScopes> {
        self.scopes.get(name)
    }

    fn scopes_mut(&mut self, name: &str) -> Option<&mut ClassScopes> {
        self.scopes.get_mut(name)
    }
}

/// One frame of the scope stack.
#[derive(Debug)]
struct Frame {
    generation: Generation,
    /// The class this frame is scoped to, for class frames.
    class: Option<String>,
    variables: FxHashMap<String, VarBinding>,
    functions: FxHashMap<String, FunctionBinding>,
}

impl Frame {
    fn new(generation: Generation, class: Option<String>) -> Self {
        Self {
            generation,
            class,
            variables: FxHashMap::default(),
            functions: FxHashMap::default(),
        }
    }
}

/// The visibility scope tracker.
///
/// Consulted while class models are built and while method bodies are
/// analyzed. Single-threaded by design: one class is fully analyzed before
/// the next begins.
pub struct ScopeTracker<'r> {
    registry: &'r mut ClassScopeRegistry,
    frames: Vec<Frame>,
    generation: Generation,
    warnings: Vec<LowerWarning>,
}

impl<'r> ScopeTracker<'r> {
    pub fn new(registry: &'r mut ClassScopeRegistry) -> Self {
        Self {
            registry,
            frames: vec![Frame::new(0, None)],
            generation: 0,
            warnings: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ClassScopeRegistry {
        self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClassScopeRegistry {
        self.registry
    }

    /// Current scope generation. Bumped on every scope open; bindings from
    /// earlier generations are shadowable (demotion).
    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    /// Drain warnings collected so far.
    pub fn take_warnings(&mut self) -> Vec<LowerWarning> {
        std::mem::take(&mut self.warnings)
    }

    // ── Scope entry and exit ────────────────────────────────────────────

    /// Push a plain nested frame. Demotes all existing bindings: the
    /// generation bump makes every earlier declaration shadowable.
    pub fn open_scope(&mut self) {
        self.generation += 1;
        self.frames.push(Frame::new(self.generation, None));
    }

    /// Push a frame scoped to `class`, layered on the current frame. The
    /// class's member partitions must already be registered.
    pub fn open_class_scope(&mut self, class: &str, span: Span) -> LowerResult<()> {
        if !self.registry.contains(class) {
            return Err(LowerError::ClassNotDefined {
                name: class.to_string(),
                span,
            });
        }
        self.generation += 1;
        self.frames
            .push(Frame::new(self.generation, Some(class.to_string())));
        Ok(())
    }

    /// Pop the top frame, then discard receiver/field scratch bindings whose
    /// owning class is no longer reachable from any remaining class frame.
    pub fn close_scope(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        self.frames.pop();

        let open_classes: Vec<String> = self
            .frames
            .iter()
            .filter_map(|f| f.class.clone())
            .collect();
        let registry: &ClassScopeRegistry = self.registry;
        for frame in &mut self.frames {
            frame.variables.retain(|_, binding| match &binding.owner {
                Some(owner) => open_classes
                    .iter()
                    .any(|open| registry.in_lineage(open, owner)),
                None => true,
            });
        }
    }

    /// True while a frame scoped to exactly `class` is open.
    pub fn class_scope_open(&self, class: &str) -> bool {
        self.frames
            .iter()
            .any(|f| f.class.as_deref() == Some(class))
    }

    /// True while some open class frame has `class` in its lineage, i.e. the
    /// current context is the class itself or one of its subclasses.
    fn lineage_scope_open(&self, class: &str) -> bool {
        self.frames.iter().any(|f| {
            f.class
                .as_deref()
                .is_some_and(|open| self.registry.in_lineage(open, class))
        })
    }

    // ── Declarations ────────────────────────────────────────────────────

    /// Declare a lexical variable in the current frame. Collides only with a
    /// binding of the current generation; older bindings are shadowed (with a
    /// warning).
    pub fn declare_variable(&mut self, name: &str, ty: TypeId, span: Span) -> LowerResult<()> {
        self.declare_binding(name, ty, None, span)
    }

    /// Declare a receiver alias (`this`, `super`) owned by `class`. The
    /// binding is garbage-collected once the class scope closes.
    pub fn declare_receiver(
        &mut self,
        name: &str,
        class: &str,
        ty: TypeId,
        span: Span,
    ) -> LowerResult<()> {
        self.declare_binding(name, ty, Some(class.to_string()), span)
    }

    fn declare_binding(
        &mut self,
        name: &str,
        ty: TypeId,
        owner: Option<String>,
        span: Span,
    ) -> LowerResult<()> {
        let shadowed = self.lookup_variable(name).map(|b| b.span);
        let generation = self.generation;
        let frame = self.frames.last_mut().expect("scope stack never empty");
        if let Some(existing) = frame.variables.get(name) {
            if existing.generation == frame.generation {
                return Err(LowerError::Redeclare {
                    name: name.to_string(),
                    original: Some(existing.span),
                    span,
                });
            }
        }
        if owner.is_none() {
            if let Some(original) = shadowed {
                self.warnings.push(LowerWarning::ShadowedVariable {
                    name: name.to_string(),
                    original,
                    shadow: span,
                });
            }
        }
        let frame = self.frames.last_mut().expect("scope stack never empty");
        frame.variables.insert(
            name.to_string(),
            VarBinding {
                ty,
                generation,
                owner,
                span,
            },
        );
        Ok(())
    }

    /// Declare a free function at the root frame.
    pub fn declare_function(&mut self, name: &str, ty: TypeId, span: Span) -> LowerResult<()> {
        let root = &mut self.frames[0];
        if let Some(existing) = root.functions.get(name) {
            return Err(LowerError::Redeclare {
                name: name.to_string(),
                original: Some(existing.span),
                span,
            });
        }
        root.functions.insert(
            name.to_string(),
            FunctionBinding {
                ty,
                generation: root.generation,
                span,
            },
        );
        Ok(())
    }

    /// Declare a field of `class`. Fails with Redeclare when the name is
    /// already visible for that class at the current generation, whichever
    /// partition holds it.
    pub fn declare_field(
        &mut self,
        class: &str,
        visibility: Visibility,
        name: &str,
        ty: TypeId,
        span: Span,
    ) -> LowerResult<()> {
        if let Some((binding, _)) = self.field_visible(class, name) {
            if binding.generation == self.generation {
                return Err(LowerError::Redeclare {
                    name: name.to_string(),
                    original: Some(binding.span),
                    span,
                });
            }
        }
        let generation = self.generation;
        let scopes = self
            .registry
            .scopes_mut(class)
            .ok_or_else(|| LowerError::ClassNotDefined {
                name: class.to_string(),
                span,
            })?;
        scopes.partition_mut(visibility).fields.insert(
            name.to_string(),
            FieldBinding {
                owner: class.to_string(),
                ty,
                generation,
                span,
            },
        );
        Ok(())
    }

    /// Declare a method of `class`. Overloads with distinct parameter types
    /// coexist; an identical signature collides only at the same generation
    /// (a subclass overriding a seeded ancestor entry replaces it in place).
    pub fn declare_method(
        &mut self,
        class: &str,
        visibility: Visibility,
        name: &str,
        params: Vec<TypeId>,
        ret: TypeId,
        is_virtual: bool,
        span: Span,
    ) -> LowerResult<()> {
        if let Some((binding, _)) = self.method_visible(class, name, &params) {
            if binding.generation == self.generation {
                return Err(LowerError::Redeclare {
                    name: name.to_string(),
                    original: Some(binding.span),
                    span,
                });
            }
        }
        let generation = self.generation;
        let scopes = self
            .registry
            .scopes_mut(class)
            .ok_or_else(|| LowerError::ClassNotDefined {
                name: class.to_string(),
                span,
            })?;
        let binding = MethodBinding {
            owner: class.to_string(),
            params,
            ret,
            is_virtual,
            generation,
            span,
        };
        let overloads = scopes
            .partition_mut(visibility)
            .methods
            .entry(name.to_string())
            .or_default();
        match overloads.iter_mut().find(|m| m.params == binding.params) {
            Some(existing) => *existing = binding,
            None => overloads.push(binding),
        }
        Ok(())
    }

    // ── Resolution ──────────────────────────────────────────────────────

    fn lookup_variable(&self, name: &str) -> Option<&VarBinding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(name))
    }

    /// Resolve an identifier, searching frames innermost to outermost, then
    /// falling back to free functions.
    pub fn resolve_variable(&self, name: &str, span: Span) -> LowerResult<TypeId> {
        if let Some(binding) = self.lookup_variable(name) {
            return Ok(binding.ty);
        }
        if let Some(function) = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.functions.get(name))
        {
            return Ok(function.ty);
        }
        Err(LowerError::UnknownIdentifier {
            name: name.to_string(),
            span,
        })
    }

    /// Raw partition lookup used by redeclaration checks: public first, then
    /// internal (members of class-typed queries only, which every registered
    /// class is), then private. No context filtering.
    fn field_visible(&self, class: &str, name: &str) -> Option<(&FieldBinding, Visibility)> {
        let scopes = self.registry.scopes(class)?;
        VISIBILITY_ORDER.iter().find_map(|&vis| {
            scopes
                .partition(vis)
                .fields
                .get(name)
                .map(|binding| (binding, vis))
        })
    }

    fn method_visible(
        &self,
        class: &str,
        name: &str,
        params: &[TypeId],
    ) -> Option<(&MethodBinding, Visibility)> {
        let scopes = self.registry.scopes(class)?;
        VISIBILITY_ORDER.iter().find_map(|&vis| {
            scopes
                .partition(vis)
                .methods
                .get(name)
                .and_then(|overloads| overloads.iter().find(|m| m.params == params))
                .map(|binding| (binding, vis))
        })
    }

    fn visibility_allows(&self, visibility: Visibility, owner: &str) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Internal => self.lineage_scope_open(owner),
            Visibility::Private => self.class_scope_open(owner),
        }
    }

    /// Resolve a field of `class`, most-derived declaration first, checking
    /// public, then internal, then private at each lineage level. Internal
    /// hits require the declaring class or a subclass to have an open scope;
    /// private hits require the declaring class's own scope to be open.
    /// Absent or invisible fields return `None`; the caller decides the error
    /// kind.
    pub fn resolve_field(&self, class: &str, name: &str) -> Option<FieldHit> {
        let scopes = self.registry.scopes(class)?;
        let mut best: Option<(usize, usize, FieldHit)> = None;
        for (order, &vis) in VISIBILITY_ORDER.iter().enumerate() {
            if let Some(binding) = scopes.partition(vis).fields.get(name) {
                if !self.visibility_allows(vis, &binding.owner) {
                    continue;
                }
                let depth = self.registry.depth(&binding.owner);
                let candidate = (
                    depth,
                    order,
                    FieldHit {
                        ty: binding.ty,
                        owner: binding.owner.clone(),
                        visibility: vis,
                    },
                );
                // Deeper owner wins; at equal depth the earlier partition wins.
                best = match best {
                    Some(current)
                        if (current.0, std::cmp::Reverse(current.1))
                            >= (candidate.0, std::cmp::Reverse(candidate.1)) =>
                    {
                        Some(current)
                    }
                    _ => Some(candidate),
                };
            }
        }
        best.map(|(_, _, hit)| hit)
    }

    /// Resolve the visible method overloads of `name` on `class`, ordered
    /// most-derived owner first (so an override nearer the query class wins),
    /// public before internal before private at equal depth. The tracker does
    /// not detect overload ambiguity; the caller selects by type
    /// compatibility and raises AmbiguousMember itself.
    pub fn resolve_method(&self, class: &str, name: &str) -> Vec<MethodCandidate> {
        let Some(scopes) = self.registry.scopes(class) else {
            return Vec::new();
        };
        let mut candidates: Vec<(usize, usize, MethodCandidate)> = Vec::new();
        for (order, &vis) in VISIBILITY_ORDER.iter().enumerate() {
            if let Some(overloads) = scopes.partition(vis).methods.get(name) {
                for binding in overloads {
                    if !self.visibility_allows(vis, &binding.owner) {
                        continue;
                    }
                    candidates.push((
                        self.registry.depth(&binding.owner),
                        order,
                        MethodCandidate {
                            owner: binding.owner.clone(),
                            visibility: vis,
                            params: binding.params.clone(),
                            ret: binding.ret,
                            is_virtual: binding.is_virtual,
                            span: binding.span,
                        },
                    ));
                }
            }
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates.into_iter().map(|(_, _, c)| c).collect()
    }
}

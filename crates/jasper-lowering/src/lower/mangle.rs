//! Deterministic symbol name mangling
//!
//! Every emitted method and constructor gets a process-stable flat symbol so
//! overloads and same-named members of different classes never collide in the
//! procedural output. The symbol is the undecorated name followed by a 64-bit
//! combined hash of the parameter mangle, the owning class, and the name.
//! Constructors, which carry no user-chosen name, use the owner-specific
//! `construct_<owner><hash>_` form instead.
//!
//! Hashing alone cannot rule out collisions, so a per-run symbol table
//! disambiguates a true collision between distinct signatures with a
//! deterministic numeric suffix. Declaration order is fixed within a run,
//! which keeps the suffixes process-stable.

use std::hash::Hasher;

use jasper_ast::types::{TypeContext, TypeId};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

/// C keywords and runtime names that emitted record and field names must
/// avoid colliding with.
static RESERVED_OUTPUT_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
        "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
        "typedef", "union", "unsigned", "void", "volatile", "while", "this",
    ]
    .into_iter()
    .collect()
});

/// Flatten a namespaced identifier for use inside a symbol.
pub fn flat_name(name: &str) -> String {
    name.replace("::", "_").replace('.', "_")
}

/// Guard an emitted field or record component name against C keywords.
pub fn output_name(name: &str) -> String {
    if RESERVED_OUTPUT_NAMES.contains(name) {
        format!("f_{name}")
    } else {
        name.to_string()
    }
}

fn fx_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(text.as_bytes());
    hasher.finish()
}

/// Normalized textual encoding of one type: whitespace stripped, `(` becomes
/// `L`, `[` becomes `R`, closers dropped, `*` becomes `p`.
fn normalize(display: &str) -> String {
    let mut out = String::with_capacity(display.len());
    for ch in display.chars() {
        match ch {
            c if c.is_whitespace() => {}
            '(' => out.push('L'),
            ')' => {}
            '[' => out.push('R'),
            ']' => {}
            '*' => out.push('p'),
            c => out.push(c),
        }
    }
    out
}

/// Parameter mangle: the implicit untyped receiver pointer first, then each
/// parameter type's normalized encoding in declaration order.
pub fn param_mangle(types: &TypeContext, params: &[TypeId]) -> String {
    let mut out = normalize(&types.display(TypeContext::VOID_PTR));
    for &param in params {
        out.push_str(&normalize(&types.display(param)));
    }
    out
}

/// Per-run symbol allocator.
#[derive(Debug, Default)]
pub struct Mangler {
    /// symbol → signature key that claimed it
    claimed: FxHashMap<String, String>,
}

impl Mangler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mangled symbol for a method or free function.
    pub fn method_symbol(
        &mut self,
        types: &TypeContext,
        owner: Option<&str>,
        name: &str,
        params: &[TypeId],
    ) -> String {
        let mut hash = fx_hash(&param_mangle(types, params));
        if let Some(owner) = owner {
            hash = hash.wrapping_add(fx_hash(owner));
        }
        hash = hash.wrapping_add(fx_hash(name));
        self.claim(format!("{name}{hash}"), signature_key(owner, name, params))
    }

    /// Mangled symbol for a constructor of `owner`.
    pub fn ctor_symbol(&mut self, types: &TypeContext, owner: &str, params: &[TypeId]) -> String {
        let hash = fx_hash(&param_mangle(types, params));
        self.claim(
            format!("construct_{}{}_", flat_name(owner), hash),
            signature_key(Some(owner), "<init>", params),
        )
    }

    /// Claim `base` for `key`. The same signature always receives the same
    /// symbol; a distinct signature hashing onto a taken symbol walks to the
    /// first free `_N` suffix.
    fn claim(&mut self, base: String, key: String) -> String {
        match self.claimed.get(&base) {
            None => {
                self.claimed.insert(base.clone(), key);
                base
            }
            Some(existing) if *existing == key => base,
            Some(_) => {
                let mut n = 2usize;
                loop {
                    let candidate = format!("{base}_{n}");
                    match self.claimed.get(&candidate) {
                        None => {
                            self.claimed.insert(candidate.clone(), key);
                            return candidate;
                        }
                        Some(existing) if *existing == key => return candidate,
                        Some(_) => n += 1,
                    }
                }
            }
        }
    }
}

fn signature_key(owner: Option<&str>, name: &str, params: &[TypeId]) -> String {
    let param_ids: Vec<String> = params.iter().map(|p| p.as_u32().to_string()).collect();
    format!("{}::{}::{}", owner.unwrap_or(""), name, param_ids.join(","))
}

//! Registry of analyzed classes.

use rustc_hash::FxHashMap;

use jasper_ast::Span;

use super::model::Class;
use crate::error::{LowerError, LowerResult};

/// Insertion-ordered registry of analyzed classes. One class is fully
/// analyzed and registered before the next begins, so the order is the
/// declaration order of the compilation run.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, Class>,
    order: Vec<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    /// Register an analyzed class. A duplicate name is a redeclaration.
    pub fn insert(&mut self, class: Class) -> LowerResult<()> {
        if let Some(existing) = self.classes.get(&class.name) {
            return Err(LowerError::Redeclare {
                name: class.name.clone(),
                original: Some(existing.span),
                span: class.span,
            });
        }
        self.order.push(class.name.clone());
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// The lineage of `name`: the class and all its ancestors, root first.
    pub fn lineage(&self, name: &str) -> Vec<&Class> {
        let mut chain = Vec::new();
        let mut cursor = self.get(name);
        while let Some(class) = cursor {
            chain.push(class);
            cursor = class.parent.as_deref().and_then(|p| self.get(p));
        }
        chain.reverse();
        chain
    }

    /// Classes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up a class that must exist; absence is an internal-consistency
    /// fault surfaced as ClassNotDefined.
    pub fn expect(&self, name: &str, span: Span) -> LowerResult<&Class> {
        self.get(name).ok_or_else(|| LowerError::ClassNotDefined {
            name: name.to_string(),
            span,
        })
    }
}

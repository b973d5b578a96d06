use std::collections::{HashMap, HashSet};

use super::traits::Transform;
use crate::core::finding::COGNITIVE_COMPLEXITY;

pub enum Route<'a> {
    Transform(&'a dyn Transform),
    /// Known category that only the fallback may handle.
    FallbackOnly,
    Unregistered,
}

pub struct TransformRegistry {
    transforms: HashMap<&'static str, Box<dyn Transform>>,
    fallback_only: HashSet<&'static str>,
}

impl TransformRegistry {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self {
            transforms: transforms.into_iter().map(|t| (t.category(), t)).collect(),
            fallback_only: HashSet::new(),
        }
    }

    pub fn with_fallback_only(mut self, category: &'static str) -> Self {
        self.fallback_only.insert(category);
        self
    }

    /// Drops the transforms for `categories`; their findings go to the
    /// fallback instead.
    pub fn disable(&mut self, categories: &[String]) {
        self.transforms.retain(|category, _| !categories.iter().any(|c| c == category));
    }

    pub fn route(&self, category: &str) -> Route<'_> {
        if let Some(transform) = self.transforms.get(category) {
            Route::Transform(transform.as_ref())
        } else if self.fallback_only.contains(category) {
            Route::FallbackOnly
        } else {
            Route::Unregistered
        }
    }

    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<_> = self.transforms.keys().copied().collect();
        categories.sort_unstable();
        categories
    }
}

pub fn default_registry() -> TransformRegistry {
    let transforms: Vec<Box<dyn Transform>> = vec![
        Box::new(super::unused_import::RemoveUnusedImport),
        Box::new(super::unused_variable::RemoveUnusedVariable),
        Box::new(super::boolean_comparison::NormalizeBooleanComparison),
        Box::new(super::commented_code::StripCommentedCode),
        Box::new(super::private_constructor::InsertPrivateConstructor),
        Box::new(super::collection_empty::UseIsEmpty),
    ];
    TransformRegistry::new(transforms).with_fallback_only(COGNITIVE_COMPLEXITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::{BOOLEAN_LITERAL_COMPARISON, UNUSED_IMPORT};

    #[test]
    fn test_registry_routes_by_category() {
        let registry = default_registry();
        assert!(matches!(registry.route(UNUSED_IMPORT), Route::Transform(t) if t.name() == "remove-unused-import"));
        assert!(matches!(registry.route(COGNITIVE_COMPLEXITY), Route::FallbackOnly));
        assert!(matches!(registry.route("java:S9999"), Route::Unregistered));
        assert_eq!(registry.categories().len(), 6);
    }

    #[test]
    fn test_disabled_categories_are_unregistered() {
        let mut registry = default_registry();
        registry.disable(&[BOOLEAN_LITERAL_COMPARISON.to_string()]);
        assert!(matches!(registry.route(BOOLEAN_LITERAL_COMPARISON), Route::Unregistered));
    }
}

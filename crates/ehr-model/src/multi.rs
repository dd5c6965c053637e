//! Container for multi-modality data.

use std::collections::BTreeMap;

use crate::table::AnnotatedTable;

/// Several annotated tables keyed by modality name.
#[derive(Debug, Clone, Default)]
pub struct MultiTable {
    pub modalities: BTreeMap<String, AnnotatedTable>,
}

impl MultiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modality(mut self, name: impl Into<String>, table: AnnotatedTable) -> Self {
        self.modalities.insert(name.into(), table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AnnotatedTable> {
        self.modalities.get(name)
    }
}

/// A per-modality setting with a fallback for unlisted modalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalitySettings<T> {
    pub per_modality: BTreeMap<String, T>,
    pub default: Option<T>,
}

impl<T> ModalitySettings<T> {
    /// Same value for every modality.
    pub fn uniform(value: T) -> Self {
        Self {
            per_modality: BTreeMap::new(),
            default: Some(value),
        }
    }

    pub fn with(mut self, modality: impl Into<String>, value: T) -> Self {
        self.per_modality.insert(modality.into(), value);
        self
    }

    /// Looks the modality up by name, then falls back to the default.
    pub fn resolve(&self, modality: &str) -> Option<&T> {
        self.per_modality.get(modality).or(self.default.as_ref())
    }
}

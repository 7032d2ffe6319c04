//! Name-based cross references between tags.
//!
//! Results never hold pointers to the tags that produced them. They carry a
//! [`ScopedName`] which is resolved lazily through the [`NameRegistry`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::LabelError;
use crate::model::{AnnotationId, TagId};

const SCOPE_SEPARATOR: char = '#';

/// A tag name, optionally scoped to one annotation (`name#annotationId`).
///
/// The scope keeps names from different annotations apart while several are
/// live at once; it is stripped again on export.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopedName {
    name: String,
    scope: Option<AnnotationId>,
}

impl ScopedName {
    pub fn new(name: impl Into<String>, scope: Option<&AnnotationId>) -> Self {
        Self {
            name: name.into(),
            scope: scope.cloned(),
        }
    }

    /// Parses `name#scope`; a name without a separator is unscoped.
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once(SCOPE_SEPARATOR) {
            Some((name, scope)) if !name.is_empty() && !scope.is_empty() => Self {
                name: name.to_string(),
                scope: Some(AnnotationId::new(scope)),
            },
            _ => Self {
                name: raw.to_string(),
                scope: None,
            },
        }
    }

    /// The configuration name, as exported.
    pub fn base(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&AnnotationId> {
        self.scope.as_ref()
    }

    /// The same name bound to a different annotation.
    pub fn rescoped(&self, scope: &AnnotationId) -> Self {
        Self::new(self.name.clone(), Some(scope))
    }

    /// The internal lookup key (`name#scope` or `name`).
    pub fn key(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}{}{}", self.name, SCOPE_SEPARATOR, scope),
            None => self.name.clone(),
        }
    }
}

impl fmt::Debug for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopedName({})", self.key())
    }
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// The `names` / `toNames` maps of a tag tree.
///
/// `names` maps every tag name (plus per-annotation scoped aliases) to its
/// tag; `to_names` maps an object name to the controls bound to it.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    names: BTreeMap<String, TagId>,
    to_names: BTreeMap<String, Vec<TagId>>,
    bases: Vec<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a configuration name. Names are unique per document.
    pub fn register(&mut self, name: &str, tag: TagId) -> Result<(), LabelError> {
        if self.names.contains_key(name) {
            return Err(LabelError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.names.insert(name.to_string(), tag);
        self.bases.push(name.to_string());
        Ok(())
    }

    /// Records that `control` is bound to the object named `to_name`.
    pub fn bind(&mut self, to_name: &str, control: TagId) {
        let bound = self.to_names.entry(to_name.to_string()).or_default();
        if !bound.contains(&control) {
            bound.push(control);
        }
    }

    /// Adds `name#scope` aliases for every configuration name.
    pub fn add_scope(&mut self, scope: &AnnotationId) {
        for base in &self.bases {
            if let Some(tag) = self.names.get(base).copied() {
                let key = ScopedName::new(base.clone(), Some(scope)).key();
                self.names.insert(key, tag);
            }
        }
    }

    /// Removes the aliases added by [`NameRegistry::add_scope`].
    pub fn drop_scope(&mut self, scope: &AnnotationId) {
        for base in &self.bases {
            let key = ScopedName::new(base.clone(), Some(scope)).key();
            self.names.remove(&key);
        }
    }

    /// Resolves a name: the scoped alias first, then the bare name.
    pub fn resolve(&self, name: &ScopedName) -> Option<TagId> {
        self.names
            .get(&name.key())
            .or_else(|| self.names.get(name.base()))
            .copied()
    }

    pub fn get(&self, name: &str) -> Option<TagId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Controls bound to the object named `to_name`.
    pub fn controls_for(&self, to_name: &str) -> &[TagId] {
        self.to_names.get(to_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Configuration names in registration order (no scoped aliases).
    pub fn base_names(&self) -> &[String] {
        &self.bases
    }

    /// The full `names` map, scoped aliases included.
    pub fn names(&self) -> &BTreeMap<String, TagId> {
        &self.names
    }

    pub fn to_names(&self) -> &BTreeMap<String, Vec<TagId>> {
        &self.to_names
    }
}

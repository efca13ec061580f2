use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// SDL scalar name → Go type.
///
/// # Examples
///
/// ```
/// use restgen_emit::ScalarMap;
///
/// let scalars = ScalarMap::default();
/// assert_eq!(scalars.go_type("Int", true, false), "int");
/// assert_eq!(scalars.go_type("String", false, false), "*string");
/// assert_eq!(scalars.go_type("ID", true, true), "[]string");
/// assert_eq!(scalars.go_type("Contact", true, false), "Contact");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalarMap(BTreeMap<String, String>);

impl Default for ScalarMap {
    fn default() -> Self {
        Self(
            [
                ("ID", "string"),
                ("String", "string"),
                ("Int", "int"),
                ("Float", "float64"),
                ("Boolean", "bool"),
                ("Time", "time.Time"),
            ]
            .into_iter()
            .map(|(sdl, go)| (sdl.to_string(), go.to_string()))
            .collect(),
        )
    }
}

impl ScalarMap {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, sdl: impl Into<String>, go: impl Into<String>) {
        self.0.insert(sdl.into(), go.into());
    }

    /// Adds every mapping from `other`, overriding existing ones.
    pub fn extend(&mut self, other: ScalarMap) {
        self.0.extend(other.0);
    }

    pub fn get(&self, sdl: &str) -> Option<&str> {
        self.0.get(sdl).map(String::as_str)
    }

    pub fn is_scalar(&self, sdl: &str) -> bool {
        self.0.contains_key(sdl)
    }

    /// Go type for an SDL type name.
    ///
    /// Unmapped names pass through. Lists become slices; a nullable
    /// non-list becomes a pointer.
    pub fn go_type(&self, sdl: &str, required: bool, is_list: bool) -> String {
        let base = self.get(sdl).unwrap_or(sdl);
        if is_list {
            format!("[]{base}")
        } else if !required {
            format!("*{base}")
        } else {
            base.to_string()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

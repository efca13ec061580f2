//! SDL type references.
//!
//! A type reference is the text after the colon in a field or argument
//! declaration, or the return type of a call. Two markers compose:
//!
//! - a trailing `!` makes the value required (non-nullable);
//! - surrounding `[` … `]` makes it a list.
//!
//! The element-level `!` inside a list (`[Contact!]`) is accepted but not
//! tracked separately: the IR carries exactly two flags, and the canonical
//! rendering derives element nullability from the outer flag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed type reference such as `ID!`, `geo.Location`, or `[Contact!]!`.
///
/// # Examples
///
/// ```
/// use restgen_core::TypeRef;
///
/// let ty = TypeRef::parse("[Contact!]!");
/// assert_eq!(ty.name, "Contact");
/// assert!(ty.required);
/// assert!(ty.is_list);
/// assert_eq!(ty.to_string(), "[Contact!]!");
///
/// let nullable = TypeRef::parse("geo.Location");
/// assert_eq!(nullable.namespace(), Some("geo"));
/// assert_eq!(nullable.local_name(), "Location");
/// assert!(!nullable.required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Type name, plain (`Contact`) or namespaced (`geo.Location`).
    pub name: String,
    /// Non-nullable (`!` on the outermost level).
    pub required: bool,
    /// Bracket-delimited list type.
    pub is_list: bool,
}

impl TypeRef {
    /// Builds a type reference from its parts.
    pub fn new(name: impl Into<String>, required: bool, is_list: bool) -> Self {
        Self {
            name: name.into(),
            required,
            is_list,
        }
    }

    /// Parses the textual form of a type reference.
    ///
    /// Surrounding whitespace is ignored. Parsing never fails: text that does
    /// not carry the markers is taken as a plain nullable name.
    pub fn parse(text: &str) -> Self {
        let mut rest = text.trim();

        let required = match rest.strip_suffix('!') {
            Some(stripped) => {
                rest = stripped.trim_end();
                true
            }
            None => false,
        };

        let is_list = match rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            Some(inner) => {
                rest = inner.trim();
                true
            }
            None => false,
        };

        if let Some(stripped) = rest.strip_suffix('!') {
            rest = stripped.trim_end();
        }

        Self::new(rest, required, is_list)
    }

    /// Returns the namespace of a `namespace.Name` reference.
    pub fn namespace(&self) -> Option<&str> {
        self.name.split_once('.').map(|(ns, _)| ns)
    }

    /// Returns the type name without its namespace qualifier.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once('.')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// True when the reference names a type from an included file.
    pub fn is_namespaced(&self) -> bool {
        self.namespace().is_some()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_list, self.required) {
            (true, true) => write!(f, "[{}!]!", self.name),
            (true, false) => write!(f, "[{}]", self.name),
            (false, true) => write!(f, "{}!", self.name),
            (false, false) => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_nullability_combinations_round_trip() {
        for text in ["Contact!", "Contact", "[Contact!]!", "[Contact]"] {
            let parsed = TypeRef::parse(text);
            assert_eq!(parsed.to_string(), text, "round trip of {text}");
        }
    }

    #[test]
    fn test_flags_for_each_combination() {
        assert_eq!(TypeRef::parse("ID!"), TypeRef::new("ID", true, false));
        assert_eq!(TypeRef::parse("ID"), TypeRef::new("ID", false, false));
        assert_eq!(TypeRef::parse("[ID!]!"), TypeRef::new("ID", true, true));
        assert_eq!(TypeRef::parse("[ID]"), TypeRef::new("ID", false, true));
    }

    #[test]
    fn test_mixed_element_nullability_normalizes() {
        let required_list = TypeRef::parse("[Tag]!");
        assert!(required_list.required && required_list.is_list);
        assert_eq!(required_list.to_string(), "[Tag!]!");

        let nullable_list = TypeRef::parse("[Tag!]");
        assert!(!nullable_list.required && nullable_list.is_list);
        assert_eq!(nullable_list.name, "Tag");
    }

    #[test]
    fn test_namespaced_reference() {
        let ty = TypeRef::parse(" [geo.Location!]! ");
        assert_eq!(ty.name, "geo.Location");
        assert_eq!(ty.namespace(), Some("geo"));
        assert_eq!(ty.local_name(), "Location");
        assert!(ty.is_namespaced());

        let local = TypeRef::parse("Contact");
        assert_eq!(local.namespace(), None);
        assert_eq!(local.local_name(), "Contact");
    }
}

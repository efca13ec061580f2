//! Call validation.
//!
//! Validates the routing invariants of a [`Call`] at compile time, so that a
//! schema that cannot be routed never reaches code emission:
//!
//! - every `{param}` in the path has a same-named argument;
//! - body verbs (POST/PUT/PATCH) have at most one argument outside the path.
//!
//! # Examples
//!
//! ```
//! use restgen_core::*;
//!
//! let call = Call {
//!     name: "foo".into(),
//!     method: HttpMethod::Post,
//!     path: "/".into(),
//!     args: vec![
//!         Arg::new("a", TypeRef::parse("String")),
//!         Arg::new("b", TypeRef::parse("String")),
//!     ],
//!     return_type: TypeRef::parse("Foo"),
//! };
//! assert!(matches!(
//!     call.validate(),
//!     Err(ValidationError::MultipleBodyArgs { .. })
//! ));
//! ```

use thiserror::Error;

use crate::Call;

/// Routing errors found in a call declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A body verb has more than one argument that is not a path parameter.
    #[error(
        "{call}: body methods (POST/PUT/PATCH) can have at most one non-path argument as body, found: {}",
        .args.join(", ")
    )]
    MultipleBodyArgs { call: String, args: Vec<String> },
    /// A `{param}` path segment has no argument of the same name.
    #[error("{call}: path parameter {{{param}}} has no matching argument")]
    UnmatchedPathParam { call: String, param: String },
}

impl ValidationError {
    /// Name of the offending call.
    pub fn call(&self) -> &str {
        match self {
            Self::MultipleBodyArgs { call, .. } | Self::UnmatchedPathParam { call, .. } => call,
        }
    }
}

impl Call {
    /// Checks the routing invariants of this call.
    ///
    /// Body-argument count is checked before path parameters; the first
    /// violation found is returned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let params = self.path_params();

        if self.method.has_body() {
            let non_path: Vec<String> = self
                .args
                .iter()
                .filter(|arg| !params.contains(&arg.name.as_str()))
                .map(|arg| arg.name.clone())
                .collect();
            if non_path.len() > 1 {
                return Err(ValidationError::MultipleBodyArgs {
                    call: self.name.clone(),
                    args: non_path,
                });
            }
        }

        if let Some(param) = params.iter().find(|param| !self.has_arg(param)) {
            return Err(ValidationError::UnmatchedPathParam {
                call: self.name.clone(),
                param: (*param).to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arg, HttpMethod, TypeRef};

    fn call(name: &str, method: HttpMethod, path: &str, args: &[(&str, &str)]) -> Call {
        Call {
            name: name.to_string(),
            method,
            path: path.to_string(),
            args: args
                .iter()
                .map(|(n, t)| Arg::new(*n, TypeRef::parse(t)))
                .collect(),
            return_type: TypeRef::parse("Contact!"),
        }
    }

    #[test]
    fn test_put_with_path_and_body_is_valid() {
        let c = call(
            "updateContact",
            HttpMethod::Put,
            "/{id}",
            &[("id", "ID!"), ("input", "UpdateContactInput!")],
        );
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_post_with_two_body_args_fails() {
        let c = call(
            "foo",
            HttpMethod::Post,
            "/",
            &[("a", "String"), ("b", "String")],
        );
        let err = c.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MultipleBodyArgs {
                call: "foo".to_string(),
                args: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(err.call(), "foo");
        assert!(err.to_string().contains("found: a, b"));
    }

    #[test]
    fn test_get_with_many_query_args_is_valid() {
        let c = call(
            "search",
            HttpMethod::Get,
            "/",
            &[("q", "String"), ("limit", "Int"), ("offset", "Int")],
        );
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_unmatched_path_param() {
        let c = call("getContact", HttpMethod::Get, "/{contactId}", &[("id", "ID!")]);
        let err = c.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "getContact: path parameter {contactId} has no matching argument"
        );
    }

    #[test]
    fn test_body_verb_without_args_is_valid() {
        let c = call("ping", HttpMethod::Post, "/ping", &[]);
        assert!(c.validate().is_ok());
    }
}

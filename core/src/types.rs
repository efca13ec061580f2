//! Schema IR type definitions.
//!
//! One [`Schema`] value is produced per SDL source file. The types are
//! designed for serialization with [`serde`] so the IR can be dumped as JSON
//! or YAML and inspected outside the generator.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TypeRef;

/// HTTP verb attached to a call with `@get`, `@post`, and friends.
///
/// # Examples
///
/// ```
/// use restgen_core::HttpMethod;
///
/// let method = HttpMethod::from_verb("put").unwrap();
/// assert_eq!(method.to_string(), "PUT");
/// assert!(method.has_body());
/// assert!(!HttpMethod::Get.has_body());
/// assert!(HttpMethod::from_verb("options").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Parses a verb case-insensitively.
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Upper-case verb (`"POST"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// True for verbs whose payload travels in the request body
    /// (POST, PUT, PATCH). GET and DELETE route arguments to the query.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call argument (`id: ID!`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Arg {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A field of a `type` or `input` block (`items: [Contact!]!`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A single endpoint declared in a `Calls` block.
///
/// # Examples
///
/// ```
/// use restgen_core::{Arg, Call, HttpMethod, TypeRef};
///
/// let call = Call {
///     name: "updateContact".into(),
///     method: HttpMethod::Put,
///     path: "/{id}".into(),
///     args: vec![
///         Arg::new("id", TypeRef::parse("ID!")),
///         Arg::new("input", TypeRef::parse("UpdateContactInput!")),
///     ],
///     return_type: TypeRef::parse("Contact!"),
/// };
///
/// assert_eq!(call.path_params(), vec!["id"]);
/// assert_eq!(call.body_arg().map(|a| a.name.as_str()), Some("input"));
/// assert!(call.query_args().is_empty());
/// assert_eq!(call.handler_name(), "UpdateContact");
/// assert!(call.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub method: HttpMethod,
    /// Route path relative to the schema base, e.g. `/{id}/items/{itemId}`.
    pub path: String,
    pub args: Vec<Arg>,
    pub return_type: TypeRef,
}

impl Call {
    /// Exported handler name: the call name with its first letter upper-cased.
    pub fn handler_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Path parameter names in the order their `{...}` segments appear.
    pub fn path_params(&self) -> Vec<&str> {
        let mut params = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let param = after[..close].trim();
            if !param.is_empty() {
                params.push(param);
            }
            rest = &after[close + 1..];
        }
        params
    }

    fn path_param_set(&self) -> HashSet<&str> {
        self.path_params().into_iter().collect()
    }

    /// True when the return type is non-nullable.
    pub fn return_required(&self) -> bool {
        self.return_type.required
    }

    /// True when the return type is a list.
    pub fn return_is_list(&self) -> bool {
        self.return_type.is_list
    }

    /// The argument decoded from the request body.
    ///
    /// Only body verbs have one: the first argument that is not a path
    /// parameter. [`Call::validate`] guarantees there is at most one.
    pub fn body_arg(&self) -> Option<&Arg> {
        if !self.method.has_body() {
            return None;
        }
        let params = self.path_param_set();
        self.args.iter().find(|arg| !params.contains(arg.name.as_str()))
    }

    /// Arguments decoded from the query string (GET/DELETE only).
    pub fn query_args(&self) -> Vec<&Arg> {
        if self.method.has_body() {
            return Vec::new();
        }
        let params = self.path_param_set();
        self.args
            .iter()
            .filter(|arg| !params.contains(arg.name.as_str()))
            .collect()
    }

    /// Arguments bound to path parameters, in declaration order.
    pub fn path_args(&self) -> Vec<&Arg> {
        let params = self.path_param_set();
        self.args
            .iter()
            .filter(|arg| params.contains(arg.name.as_str()))
            .collect()
    }

    /// Returns `true` if an argument with the given name exists.
    pub fn has_arg(&self, name: &str) -> bool {
        self.args.iter().any(|arg| arg.name == name)
    }
}

/// An output type (`type Contact { ... }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<Field>,
}

/// An input type (`input CreateContactInput { ... }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDef {
    pub name: String,
    pub fields: Vec<Field>,
}

/// An enumeration (`enum Status { ACTIVE ARCHIVED }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

/// A resolved `# @include("...")` directive.
///
/// The included schema is compiled once per process and shared by every
/// schema that includes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Include {
    /// Path exactly as written in the directive.
    pub path: String,
    /// Namespace derived from the file name (`geo-models.sdl` → `geo_models`).
    pub namespace: String,
    /// Target package of the included schema, if it declares one.
    pub models: Option<String>,
    /// The compiled included schema.
    pub schema: Arc<Schema>,
}

/// Intermediate representation of one SDL file.
///
/// # Examples
///
/// ```
/// use restgen_core::{Schema, TypeDef};
///
/// let mut schema = Schema::default();
/// schema.base = Some("/v1/contacts".into());
/// schema.types.push(TypeDef { name: "Contact".into(), fields: Vec::new() });
///
/// assert!(schema.find_type("Contact").is_some());
/// assert!(schema.package_for_namespace("geo").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Base name of the source file (`contacts.sdl`); `None` for in-memory sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Route prefix from `# @base("...")`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Target package from `# @models("...")`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<String>,
    #[serde(default)]
    pub includes: Vec<Include>,
    #[serde(default)]
    pub calls: Vec<Call>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

impl Schema {
    /// Finds a call by its SDL name.
    pub fn find_call(&self, name: &str) -> Option<&Call> {
        self.calls.iter().find(|c| c.name == name)
    }

    /// Finds an output type by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Finds an input type by name.
    pub fn find_input(&self, name: &str) -> Option<&InputDef> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Finds an enum by name.
    pub fn find_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Finds the include that introduced a namespace.
    pub fn include_for_namespace(&self, namespace: &str) -> Option<&Include> {
        self.includes.iter().find(|inc| inc.namespace == namespace)
    }

    /// Target package that a `namespace.Name` reference resolves to.
    pub fn package_for_namespace(&self, namespace: &str) -> Option<&str> {
        self.include_for_namespace(namespace)
            .and_then(|inc| inc.models.as_deref())
    }

    /// File stem of the source file (`contacts` for `contacts.sdl`).
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        Some(name.split('.').next().unwrap_or(name)).filter(|s| !s.is_empty())
    }
}

//! Core IR types for restgen schemas.
//!
//! This crate defines the intermediate representation produced by the SDL
//! compiler and consumed by code emission:
//!
//! - [`Schema`]: one compiled SDL file: directives, includes, calls, and
//!   type declarations.
//! - [`Call`]: an endpoint with its verb, route, arguments, and return type.
//! - [`TypeRef`]: a type reference with its required/list markers.
//! - [`Include`]: a resolved include with its namespace and shared schema.
//!
//! Validation ([`Call::validate`]) enforces the routing invariants of each
//! call. The [`contract`] module holds the fixed text shared by the emitter
//! and the regeneration merge engine.
//!
//! # Example
//!
//! ```
//! use restgen_core::*;
//!
//! let call = Call {
//!     name: "listContacts".into(),
//!     method: HttpMethod::Get,
//!     path: "/".into(),
//!     args: vec![Arg::new("filter", TypeRef::parse("ContactFilter"))],
//!     return_type: TypeRef::parse("[Contact!]!"),
//! };
//!
//! assert!(call.return_is_list());
//! assert!(call.return_required());
//! assert_eq!(call.return_type.name, "Contact");
//! assert_eq!(call.query_args().len(), 1);
//! assert!(call.validate().is_ok());
//! ```

pub mod contract;
mod type_ref;
mod types;
mod validate;

pub use type_ref::TypeRef;
pub use types::*;
pub use validate::ValidationError;

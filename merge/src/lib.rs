//! Regeneration merge engine for restgen output.
//!
//! Generated Go handler files are split by a marker line: everything above
//! it is regenerated on every run, everything below holds handler
//! implementations that users fill in. [`Merger`] combines a freshly
//! generated file with the previous output so that regeneration:
//!
//! - keeps every handler body the user has changed ([`StubClassifier`]
//!   decides what "changed" means);
//! - adds stubs for new calls and archives handlers whose calls were removed;
//! - keeps dependency fields and middleware customizations above the marker;
//! - changes nothing when nothing was edited.
//!
//! # Example
//!
//! ```
//! use restgen_core::contract::{MARKER, REMOVED_MARKER};
//! use restgen_merge::Merger;
//!
//! let generated = format!(
//!     "package routes\n\n{MARKER}\n\nfunc (h *PingHandler) Ping(w http.ResponseWriter, r *http.Request) {{\n\tshared.WriteResponse(w, http.StatusNotImplemented, nil)\n}}\n\n{REMOVED_MARKER}\n"
//! );
//! let edited = generated.replace(
//!     "shared.WriteResponse(w, http.StatusNotImplemented, nil)",
//!     "w.Write([]byte(\"pong\"))",
//! );
//!
//! let merger = Merger::new();
//! let result = merger.merge(&generated, Some(&edited));
//! assert_eq!(result.content, edited);
//! assert_eq!(result.preserved, vec!["Ping"]);
//!
//! // Unedited output merges to itself.
//! assert_eq!(merger.merge(&generated, Some(&generated)).content, generated);
//! ```

mod error;
mod reconcile;
mod regions;
mod stub;

pub use error::{MergeError, Result};
pub use reconcile::{MergeResult, Merger};
pub use regions::{
    ArchivedMethod, MethodBlock, NamedBlock, extract_archive, extract_methods, find_override,
    find_record_type, split_archive, split_at_marker, stray_declarations,
};
pub use stub::{GoStubClassifier, StubClassifier};

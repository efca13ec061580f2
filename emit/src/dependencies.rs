/// Emits `dependencies.go`, the hand-maintained companion of the routes files.
///
/// The file is written once and never regenerated.
///
/// # Examples
///
/// ```
/// use restgen_emit::DependenciesEmitter;
///
/// let go = DependenciesEmitter::new("routes").emit();
/// assert!(go.starts_with("package routes\n\n// This file is NOT regenerated."));
/// ```
#[derive(Debug, Clone)]
pub struct DependenciesEmitter {
    package: String,
}

impl DependenciesEmitter {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    pub fn emit(&self) -> String {
        format!("package {}\n\n{GUIDE}", self.package)
    }
}

const GUIDE: &str = "\
// This file is NOT regenerated. Add your With* param functions and helpers here.
//
// Handler structs are in their respective *_routes.go files - add your
// dependency fields there (they will be preserved during regeneration).
//
// Example struct fields (add to the relevant *_routes.go):
//
//   type ContactsHandler struct {
//       db     *sql.DB
//       logger *slog.Logger
//   }
//
// Example param functions:
//
// func WithDB(db *sql.DB) ContactsParam {
//     return func(h *ContactsHandler) {
//         h.db = db
//     }
// }
//
// func WithLogger(logger *slog.Logger) ContactsParam {
//     return func(h *ContactsHandler) {
//         h.logger = logger
//     }
// }
";

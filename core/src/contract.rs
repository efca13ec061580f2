//! Fixed text shared between the route emitter and the merge engine.
//!
//! Every previously generated file carries these strings. The merge engine
//! locates regions, archive entries, stubs, and default templates by them, so
//! changing any value here breaks regeneration of existing output.

/// Separates regenerated scaffolding (above) from handler implementations (below).
pub const MARKER: &str = "// --- RESTGEN MARKER (do not edit above) ---";

/// Introduces the archive of handlers whose calls were removed from the schema.
pub const REMOVED_MARKER: &str = "// --- REMOVED HANDLERS ---";

/// Trailing text of an archive entry's first line (`// <Name> was removed from schema`).
pub const ARCHIVE_REMOVED_SUFFIX: &str = "was removed from schema";

/// Second line of an archive entry.
pub const ARCHIVE_PRESERVED_LINE: &str = "// Preserved implementation:";

/// Opens the commented-out body of an archive entry.
pub const ARCHIVE_BODY_OPEN: &str = "/*";

/// Closes the commented-out body of an archive entry; always on its own line.
pub const ARCHIVE_BODY_CLOSE: &str = "*/";

/// Status selector that marks the generated placeholder response.
pub const NOT_IMPLEMENTED_STATUS: &str = "StatusNotImplemented";

/// Function names that write the placeholder response.
pub const RESPONSE_WRITERS: &[&str] = &["WriteResponse", "writeResponse"];

/// Constructor of the query decoder in generated stubs.
pub const DECODER_CONSTRUCTOR: &str = "NewDecoder";

/// Decoder option calls emitted after the constructor.
pub const DECODER_OPTIONS: &[&str] = &["IgnoreUnknownKeys"];

/// Method invoked by the generated decode-and-bail `if` statements.
pub const DECODE_CALL: &str = "Decode";

/// Body of the handler struct when no dependency fields were added.
pub const DEPENDENCIES_PLACEHOLDER: &str = "// add dependencies here";

/// Name of the general middleware hook.
pub const APPLY_MIDDLEWARE_FN: &str = "applyMiddleware";

/// Name of the per-route middleware map.
pub const ROUTE_MIDDLEWARE_FN: &str = "RouteMiddleware";

/// Default body of the general middleware hook, one level of indentation removed.
pub const APPLY_MIDDLEWARE_DEFAULT_BODY: &str = "\
// Example:
// r.Use(middleware.RequestID)
// r.Use(middleware.Logger)
//
// Per-route middleware can be applied in Routes() using r.With(...)";

/// Default body of the per-route middleware map, one level of indentation removed.
pub const ROUTE_MIDDLEWARE_DEFAULT_BODY: &str = "\
return map[string][]func(http.Handler) http.Handler{
\t// \"POST /\": {rateLimiter},
\t// \"GET /{id}\": {cacheMiddleware},
}";

/// Renders one archive entry, including its two leading newlines.
///
/// The body is escaped with [`escape_archive_body`] so it cannot end the
/// surrounding block comment.
///
/// # Examples
///
/// ```
/// use restgen_core::contract::archive_entry;
///
/// let entry = archive_entry("DeleteContact", "func (h *ContactsHandler) DeleteContact() {}");
/// assert_eq!(
///     entry,
///     "\n\n// DeleteContact was removed from schema\n// Preserved implementation:\n/*\nfunc (h *ContactsHandler) DeleteContact() {}\n*/"
/// );
/// ```
pub fn archive_entry(name: &str, body: &str) -> String {
    format!(
        "\n\n// {name} {ARCHIVE_REMOVED_SUFFIX}\n{ARCHIVE_PRESERVED_LINE}\n{ARCHIVE_BODY_OPEN}\n{}\n{ARCHIVE_BODY_CLOSE}",
        escape_archive_body(body)
    )
}

/// Makes `body` safe to place inside a `/* */` comment.
///
/// A `*` followed by any number of backslashes and then `/` gains one more
/// backslash, so `*/` becomes `*\/` and an existing `*\/` becomes `*\\/`. The result never
/// contains `*/`, and [`unescape_archive_body`] restores the input exactly.
///
/// # Examples
///
/// ```
/// use restgen_core::contract::{escape_archive_body, unescape_archive_body};
///
/// let body = "/* keep */ x := `*\\/`";
/// let escaped = escape_archive_body(body);
/// assert!(!escaped.contains("*/"));
/// assert_eq!(unescape_archive_body(&escaped), body);
/// ```
pub fn escape_archive_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut copied = 0;
    let mut at = 0;
    while let Some(star) = body[at..].find('*').map(|offset| at + offset) {
        match comment_closer_end(body, star) {
            Some(end) => {
                out.push_str(&body[copied..=star]);
                out.push('\\');
                copied = star + 1;
                at = end;
            }
            None => at = star + 1,
        }
    }
    out.push_str(&body[copied..]);
    out
}

/// Reverses [`escape_archive_body`].
pub fn unescape_archive_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut copied = 0;
    let mut at = 0;
    while let Some(star) = body[at..].find('*').map(|offset| at + offset) {
        match comment_closer_end(body, star) {
            Some(end) if body.as_bytes()[star + 1] == b'\\' => {
                out.push_str(&body[copied..=star]);
                copied = star + 2;
                at = end;
            }
            _ => at = star + 1,
        }
    }
    out.push_str(&body[copied..]);
    out
}

/// For a `*` at `star` followed by zero or more backslashes and a `/`,
/// returns the offset just past the `/`.
fn comment_closer_end(text: &str, star: usize) -> Option<usize> {
    let rest = &text.as_bytes()[star + 1..];
    let slashes = rest.iter().take_while(|&&byte| byte == b'\\').count();
    (rest.get(slashes) == Some(&b'/')).then_some(star + 1 + slashes + 1)
}

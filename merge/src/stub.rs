//! Generated-stub detection.
//!
//! A handler whose body is still the generated placeholder can be replaced
//! on regeneration; anything else must be kept. [`GoStubClassifier`] decides
//! by syntax-tree shape rather than text, so formatting and comment changes
//! made by the generator or by `gofmt` do not turn a stub into "user code".
//!
//! The accepted shape is zero or more decode statements followed by exactly
//! one call that writes the not-implemented response:
//!
//! ```go
//! func (h *ContactsHandler) CreateContact(w http.ResponseWriter, r *http.Request) {
//!     var input models.CreateContactInput
//!     if err := json.NewDecoder(r.Body).Decode(&input); err != nil {
//!         shared.WriteResponse(w, http.StatusBadRequest, &shared.ApiResponse[models.Contact]{Message: err.Error()})
//!         return
//!     }
//!     shared.WriteResponse(w, http.StatusNotImplemented, &shared.ApiResponse[models.Contact]{Message: "CreateContact not implemented"})
//! }
//! ```

use restgen_core::contract::{
    DECODE_CALL, DECODER_CONSTRUCTOR, DECODER_OPTIONS, NOT_IMPLEMENTED_STATUS, RESPONSE_WRITERS,
};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

/// Decides whether a method is still the unmodified generated placeholder.
pub trait StubClassifier {
    /// `method` is the full method source, signature included.
    ///
    /// Must return `false` whenever the answer is uncertain.
    fn is_generated_stub(&self, method: &str) -> bool;
}

/// Stub classifier for Go handlers, backed by tree-sitter-go.
///
/// # Examples
///
/// ```
/// use restgen_merge::{GoStubClassifier, StubClassifier};
///
/// let stub = r#"func (h *ContactsHandler) GetContact(w http.ResponseWriter, r *http.Request) {
///     // TODO: implement GetContact
///     shared.WriteResponse(w, http.StatusNotImplemented, nil)
/// }"#;
/// assert!(GoStubClassifier.is_generated_stub(stub));
///
/// let real = stub.replace("// TODO: implement GetContact", "h.audit(r)");
/// assert!(!GoStubClassifier.is_generated_stub(&real));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GoStubClassifier;

impl StubClassifier for GoStubClassifier {
    fn is_generated_stub(&self, method: &str) -> bool {
        if !method.contains(NOT_IMPLEMENTED_STATUS) {
            return false;
        }

        let source = format!("package stub\n{method}");
        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&tree_sitter_go::LANGUAGE.into()) {
            warn!(error = %err, "Go grammar unavailable; keeping existing implementation");
            return false;
        }
        let Some(tree) = parser.parse(&source, None) else {
            return false;
        };

        let root = tree.root_node();
        if root.has_error() {
            debug!("Method does not parse; keeping existing implementation");
            return false;
        }

        let Some(body) = named_children(root)
            .into_iter()
            .find(|node| matches!(node.kind(), "method_declaration" | "function_declaration"))
            .and_then(|decl| decl.child_by_field_name("body"))
        else {
            return false;
        };

        let src = source.as_bytes();
        let statements = statements(body);
        let Some((last, leading)) = statements.split_last() else {
            return false;
        };
        is_not_implemented_response(*last, src)
            && leading.iter().all(|stmt| is_decode_statement(*stmt, src))
    }
}

/// Named children, comments excluded.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Statements of a block, looking through the grammar's `statement_list`.
fn statements(block: Node<'_>) -> Vec<Node<'_>> {
    let children = named_children(block);
    match children.as_slice() {
        [list] if list.kind() == "statement_list" => named_children(*list),
        _ => children,
    }
}

fn text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or_default()
}

/// `x.field` → `field`
fn selector_field<'s>(node: Node<'_>, src: &'s [u8]) -> Option<&'s str> {
    if node.kind() != "selector_expression" {
        return None;
    }
    node.child_by_field_name("field").map(|field| text(field, src))
}

/// True for `<anything>.<name>(...)` where `name` is one of `names`.
fn calls_selector(node: Node<'_>, names: &[&str], src: &[u8]) -> bool {
    node.kind() == "call_expression"
        && node
            .child_by_field_name("function")
            .and_then(|function| selector_field(function, src))
            .is_some_and(|field| names.contains(&field))
}

/// True if `node` or any descendant calls `<anything>.<name>(...)`.
fn contains_call(node: Node<'_>, name: &str, src: &[u8]) -> bool {
    if calls_selector(node, &[name], src) {
        return true;
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| contains_call(child, name, src));
    found
}

fn expression_call(stmt: Node<'_>) -> Option<Node<'_>> {
    if stmt.kind() != "expression_statement" {
        return None;
    }
    named_children(stmt)
        .into_iter()
        .find(|child| child.kind() == "call_expression")
}

/// `shared.WriteResponse(w, http.StatusNotImplemented, ...)`
fn is_not_implemented_response(stmt: Node<'_>, src: &[u8]) -> bool {
    let Some(call) = expression_call(stmt) else {
        return false;
    };
    let writer = call.child_by_field_name("function").and_then(|function| {
        match function.kind() {
            "identifier" => Some(text(function, src)),
            _ => selector_field(function, src),
        }
    });
    if !writer.is_some_and(|name| RESPONSE_WRITERS.contains(&name)) {
        return false;
    }

    call.child_by_field_name("arguments")
        .map(named_children)
        .and_then(|args| args.get(1).copied())
        .and_then(|status| selector_field(status, src))
        .is_some_and(|field| field == NOT_IMPLEMENTED_STATUS)
}

fn is_decode_statement(stmt: Node<'_>, src: &[u8]) -> bool {
    match stmt.kind() {
        // var input models.CreateContactInput
        "var_declaration" => true,
        // decoder := schema.NewDecoder()
        "short_var_declaration" | "assignment_statement" => {
            stmt.child_by_field_name("right").is_some_and(|right| {
                let values = if right.kind() == "expression_list" {
                    named_children(right)
                } else {
                    vec![right]
                };
                values
                    .into_iter()
                    .any(|value| calls_selector(value, &[DECODER_CONSTRUCTOR], src))
            })
        }
        // decoder.IgnoreUnknownKeys(true)
        "expression_statement" => {
            expression_call(stmt).is_some_and(|call| calls_selector(call, DECODER_OPTIONS, src))
        }
        // if err := decoder.Decode(&x, r.URL.Query()); err != nil { ...; return }
        "if_statement" => {
            let decodes = stmt
                .child_by_field_name("initializer")
                .is_some_and(|init| contains_call(init, DECODE_CALL, src));
            let returns = stmt
                .child_by_field_name("consequence")
                .map(statements)
                .and_then(|body| body.last().copied())
                .is_some_and(|last| last.kind() == "return_statement");
            decodes && returns
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_stub(method: &str) -> bool {
        GoStubClassifier.is_generated_stub(method)
    }

    const PLAIN_STUB: &str = r#"func (h *ContactsHandler) GetContact(w http.ResponseWriter, r *http.Request) {
	// Path parameters:
	// id := chi.URLParam(r, "id")

	// TODO: implement GetContact
	shared.WriteResponse(w, http.StatusNotImplemented, &shared.ApiResponse[models.Contact]{
		Message: "GetContact not implemented",
	})
}"#;

    const BODY_STUB: &str = r#"func (h *ContactsHandler) CreateContact(w http.ResponseWriter, r *http.Request) {
	var input models.CreateContactInput
	if err := json.NewDecoder(r.Body).Decode(&input); err != nil {
		shared.WriteResponse(w, http.StatusBadRequest, &shared.ApiResponse[models.Contact]{
			Message: err.Error(),
		})
		return
	}

	// TODO: implement CreateContact
	shared.WriteResponse(w, http.StatusNotImplemented, &shared.ApiResponse[models.Contact]{
		Message: "CreateContact not implemented",
	})
}"#;

    const QUERY_STUB: &str = r#"func (h *ContactsHandler) ListContacts(w http.ResponseWriter, r *http.Request) {
	// Query parameters:
	var filter models.ContactFilter
	decoder := schema.NewDecoder()
	decoder.IgnoreUnknownKeys(true)
	if err := decoder.Decode(&filter, r.URL.Query()); err != nil {
		shared.WriteResponse(w, http.StatusBadRequest, &shared.ApiResponse[[]models.Contact]{
			Message: err.Error(),
		})
		return
	}

	// TODO: implement ListContacts
	shared.WriteResponse(w, http.StatusNotImplemented, &shared.ApiResponse[[]models.Contact]{
		Message: "ListContacts not implemented",
	})
}"#;

    #[test]
    fn test_generated_shapes_are_stubs() {
        assert!(is_stub(PLAIN_STUB));
        assert!(is_stub(BODY_STUB));
        assert!(is_stub(QUERY_STUB));
    }

    #[test]
    fn test_reformatted_stub_is_still_a_stub() {
        let reformatted = PLAIN_STUB
            .replace("\t// Path parameters:\n", "")
            .replace("\n\t\tMessage", " Message")
            .replace(",\n\t})", "})");
        assert!(is_stub(&reformatted));
    }

    #[test]
    fn test_unexported_writer_is_accepted() {
        let method = PLAIN_STUB.replace("shared.WriteResponse", "writeResponse");
        assert!(is_stub(&method));
    }

    #[test]
    fn test_real_implementation_is_not_a_stub() {
        let method = BODY_STUB.replace(
            "\t// TODO: implement CreateContact\n",
            "\tcontact, err := h.store.Create(r.Context(), input)\n\t_ = contact\n\t_ = err\n",
        );
        assert!(!is_stub(&method));
    }

    #[test]
    fn test_missing_not_implemented_status_is_not_a_stub() {
        let method = PLAIN_STUB.replace("http.StatusNotImplemented", "http.StatusOK");
        assert!(!is_stub(&method));
    }

    #[test]
    fn test_status_not_implemented_elsewhere_is_not_a_stub() {
        let method = r#"func (h *ContactsHandler) GetContact(w http.ResponseWriter, r *http.Request) {
	contact := h.store.Get(chi.URLParam(r, "id"))
	shared.WriteResponse(w, http.StatusOK, contact)
	_ = http.StatusNotImplemented
}"#;
        assert!(!is_stub(method));
    }

    #[test]
    fn test_if_without_return_is_not_a_stub() {
        let method = BODY_STUB.replace("\t\treturn\n", "");
        assert!(!is_stub(&method));
    }

    #[test]
    fn test_unparseable_body_is_not_a_stub() {
        let method = PLAIN_STUB.replace("shared.WriteResponse(w,", "shared.WriteResponse(w,,");
        assert!(!is_stub(&method));
    }

    #[test]
    fn test_empty_body_is_not_a_stub() {
        let method = "func (h *XHandler) Ping(w http.ResponseWriter, r *http.Request) {\n\t// http.StatusNotImplemented\n}";
        assert!(!is_stub(method));
    }
}

//! Go routes file emission.
//!
//! The emitted file is the template the merge engine reconciles against, so
//! the marker, archive marker, stub shape, and override bodies all come from
//! [`restgen_core::contract`].

use std::fmt::{self, Write};

use heck::ToUpperCamelCase;
use restgen_core::contract::{
    APPLY_MIDDLEWARE_DEFAULT_BODY, APPLY_MIDDLEWARE_FN, DEPENDENCIES_PLACEHOLDER, MARKER,
    REMOVED_MARKER, ROUTE_MIDDLEWARE_DEFAULT_BODY, ROUTE_MIDDLEWARE_FN,
};
use restgen_core::{Arg, Call, HttpMethod, Schema, TypeRef};
use tracing::debug;

use crate::EmitOptions;

const HEADER: &str = "// Code generated by restgen. DO NOT EDIT ABOVE THE MARKER.";
const MODELS_ALIAS: &str = "models";
const SHARED_PACKAGE: &str = "github.com/borderlesshq/restgen/shared";
const CHI_PACKAGE: &str = "github.com/go-chi/chi/v5";
const FORM_DECODER_PACKAGE: &str = "github.com/gorilla/schema";

/// Emits the `<stem>_routes.go` file for one schema.
///
/// # Examples
///
/// ```
/// use restgen_core::contract::{MARKER, REMOVED_MARKER};
/// use restgen_emit::{EmitOptions, RoutesEmitter};
///
/// let schema = restgen_compiler::compile_str(
///     "# @base(\"/v1/ping\")\ntype Calls {\n  ping(): String! @get(\"/\")\n}\n",
/// )
/// .unwrap();
///
/// let go = RoutesEmitter::new(EmitOptions::default()).emit(&schema);
/// assert!(go.starts_with("// Code generated by restgen."));
/// assert!(go.contains("type PingHandler struct {"));
/// assert!(go.contains("\tr.Get(\"/\", h.Ping)\n"));
/// assert!(go.contains(MARKER));
/// assert!(go.ends_with(&format!("{REMOVED_MARKER}\n")));
/// ```
#[derive(Debug, Clone)]
pub struct RoutesEmitter {
    options: EmitOptions,
}

impl RoutesEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Renders the routes file.
    pub fn emit(&self, schema: &Schema) -> String {
        let handler = handler_name(schema);
        debug!(handler = %handler, calls = schema.calls.len(), "Emitting routes");

        let file = RoutesFile {
            options: &self.options,
            schema,
            handler,
        };
        let mut out = String::new();
        // Writes into a String are infallible.
        let _ = file.write(&mut out);
        out
    }
}

/// `contacts.sdl` → `Contacts`, `business_locations.sdl` → `BusinessLocations`;
/// falls back to the last base path segment, then to `Handler`.
pub fn handler_name(schema: &Schema) -> String {
    let from_stem = schema.file_stem().map(|stem| stem.to_upper_camel_case());
    let from_base = || {
        schema
            .base
            .as_deref()
            .and_then(|base| base.trim_matches('/').rsplit('/').next())
            .map(|segment| segment.to_upper_camel_case())
    };
    from_stem
        .filter(|name| !name.is_empty())
        .or_else(|| from_base().filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "Handler".to_string())
}

/// chi router method: `POST` → `Post`.
fn chi_method(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "Get",
        HttpMethod::Post => "Post",
        HttpMethod::Put => "Put",
        HttpMethod::Patch => "Patch",
        HttpMethod::Delete => "Delete",
    }
}

fn banner(out: &mut String, title: &str) -> fmt::Result {
    let rule = "=".repeat(76);
    writeln!(out, "// {rule}")?;
    writeln!(out, "// {title}")?;
    writeln!(out, "// {rule}")
}

fn indented(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("\t{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct RoutesFile<'a> {
    options: &'a EmitOptions,
    schema: &'a Schema,
    handler: String,
}

impl RoutesFile<'_> {
    fn models_package(&self) -> Option<&str> {
        self.schema.models.as_deref().or(self.options.models.as_deref())
    }

    fn is_complex(&self, ty: &TypeRef) -> bool {
        ty.is_namespaced() || !self.options.scalars.is_scalar(&ty.name)
    }

    /// Element type without list or pointer decoration.
    fn resolve(&self, ty: &TypeRef) -> String {
        if ty.is_namespaced() {
            return ty.name.clone();
        }
        match self.options.scalars.get(&ty.name) {
            Some(go) => go.to_string(),
            None => format!("{MODELS_ALIAS}.{}", ty.name),
        }
    }

    fn return_type(&self, call: &Call) -> String {
        let ty = &call.return_type;
        if !self.is_complex(ty) {
            return self
                .options
                .scalars
                .go_type(&ty.name, call.return_required(), call.return_is_list());
        }
        let base = self.resolve(ty);
        if call.return_is_list() {
            format!("[]{base}")
        } else if !call.return_required() {
            format!("*{base}")
        } else {
            base
        }
    }

    fn imports(&self) -> Vec<(Option<&str>, &str)> {
        let calls = &self.schema.calls;
        let mut imports = Vec::new();
        if calls.iter().any(|call| call.body_arg().is_some()) {
            imports.push((None, "encoding/json"));
        }
        imports.push((None, "net/http"));
        imports.push((None, CHI_PACKAGE));
        imports.push((None, SHARED_PACKAGE));
        if let Some(models) = self.models_package() {
            imports.push((Some(MODELS_ALIAS), models));
        }
        for include in &self.schema.includes {
            if let Some(package) = include.models.as_deref() {
                imports.push((Some(include.namespace.as_str()), package));
            }
        }
        let needs_form_decoder = calls
            .iter()
            .flat_map(|call| call.query_args())
            .any(|arg| self.is_complex(&arg.ty));
        if needs_form_decoder {
            imports.push((None, FORM_DECODER_PACKAGE));
        }
        imports
    }

    fn write(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "{HEADER}")?;
        writeln!(out)?;
        writeln!(out, "package {}", self.options.package)?;
        writeln!(out)?;
        writeln!(out, "import (")?;
        for (alias, path) in self.imports() {
            match alias {
                Some(alias) => writeln!(out, "\t{alias} \"{path}\"")?,
                None => writeln!(out, "\t\"{path}\"")?,
            }
        }
        writeln!(out, ")")?;
        writeln!(out)?;

        self.write_handler(out)?;
        writeln!(out)?;
        self.write_routes(out)?;
        writeln!(out)?;
        self.write_middleware(out)?;
        writeln!(out)?;
        writeln!(out, "{MARKER}")?;
        writeln!(out)?;
        banner(out, "HANDLER IMPLEMENTATIONS")?;
        for call in &self.schema.calls {
            self.write_stub(out, call)?;
        }
        write!(out, "\n\n{REMOVED_MARKER}\n")
    }

    fn write_handler(&self, out: &mut String) -> fmt::Result {
        let h = &self.handler;
        banner(out, "HANDLER")?;
        writeln!(out)?;
        writeln!(out, "type {h}Handler struct {{")?;
        writeln!(out, "\t{DEPENDENCIES_PLACEHOLDER}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "type {h}Param func(*{h}Handler)")?;
        writeln!(out)?;
        writeln!(out, "func New{h}Handler(params ...{h}Param) *{h}Handler {{")?;
        writeln!(out, "\th := &{h}Handler{{}}")?;
        writeln!(out, "\tfor _, param := range params {{")?;
        writeln!(out, "\t\tparam(h)")?;
        writeln!(out, "\t}}")?;
        writeln!(out, "\tshared.AssertDependencies(*h, \"New{h}Handler\")")?;
        writeln!(out, "\treturn h")?;
        writeln!(out, "}}")
    }

    fn write_routes(&self, out: &mut String) -> fmt::Result {
        let h = &self.handler;
        banner(out, "ROUTES")?;
        writeln!(out)?;
        writeln!(out, "func (h *{h}Handler) BasePath() string {{")?;
        writeln!(out, "\treturn \"{}\"", self.schema.base.as_deref().unwrap_or_default())?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "func (h *{h}Handler) Routes() chi.Router {{")?;
        writeln!(out, "\tr := chi.NewRouter()")?;
        writeln!(out, "\th.{APPLY_MIDDLEWARE_FN}(r)")?;
        for call in &self.schema.calls {
            writeln!(
                out,
                "\tr.{}(\"{}\", h.{})",
                chi_method(call.method),
                call.path,
                call.handler_name()
            )?;
        }
        writeln!(out)?;
        writeln!(out, "\treturn r")?;
        writeln!(out, "}}")
    }

    fn write_middleware(&self, out: &mut String) -> fmt::Result {
        let h = &self.handler;
        banner(out, "MIDDLEWARE (add your middleware here)")?;
        writeln!(out)?;
        writeln!(out, "func (h *{h}Handler) {APPLY_MIDDLEWARE_FN}(r chi.Router) {{")?;
        writeln!(out, "{}", indented(APPLY_MIDDLEWARE_DEFAULT_BODY))?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "// {ROUTE_MIDDLEWARE_FN} returns middleware for specific routes.")?;
        writeln!(
            out,
            "// This is for documentation/introspection; apply via r.With() in Routes()."
        )?;
        writeln!(
            out,
            "func (h *{h}Handler) {ROUTE_MIDDLEWARE_FN}() map[string][]func(http.Handler) http.Handler {{"
        )?;
        writeln!(out, "{}", indented(ROUTE_MIDDLEWARE_DEFAULT_BODY))?;
        writeln!(out, "}}")
    }

    fn write_stub(&self, out: &mut String, call: &Call) -> fmt::Result {
        let name = call.handler_name();
        let ret = self.return_type(call);

        write!(out, "\n\n")?;
        writeln!(
            out,
            "func (h *{}Handler) {name}(w http.ResponseWriter, r *http.Request) {{",
            self.handler
        )?;

        let params = call.path_params();
        if !params.is_empty() {
            writeln!(out, "\t// Path parameters:")?;
            for param in params {
                writeln!(out, "\t// {param} := chi.URLParam(r, \"{param}\")")?;
            }
        }

        if let Some(arg) = call.body_arg() {
            writeln!(out, "\tvar {} {}", arg.name, self.resolve(&arg.ty))?;
            writeln!(
                out,
                "\tif err := json.NewDecoder(r.Body).Decode(&{}); err != nil {{",
                arg.name
            )?;
            write_bad_request(out, &ret)?;
        }

        let query = call.query_args();
        if !query.is_empty() {
            writeln!(out, "\t// Query parameters:")?;
            let mut decoder_declared = false;
            for arg in query {
                if self.is_complex(&arg.ty) {
                    self.write_query_decode(out, arg, &ret, &mut decoder_declared)?;
                } else {
                    writeln!(out, "\t// {0} := r.URL.Query().Get(\"{0}\")", arg.name)?;
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "\t// TODO: implement {name}")?;
        writeln!(
            out,
            "\tshared.WriteResponse(w, http.StatusNotImplemented, &shared.ApiResponse[{ret}]{{"
        )?;
        writeln!(out, "\t\tMessage: \"{name} not implemented\",")?;
        writeln!(out, "\t}})")?;
        write!(out, "}}")
    }

    fn write_query_decode(
        &self,
        out: &mut String,
        arg: &Arg,
        ret: &str,
        decoder_declared: &mut bool,
    ) -> fmt::Result {
        writeln!(out, "\tvar {} {}", arg.name, self.resolve(&arg.ty))?;
        if !*decoder_declared {
            writeln!(out, "\tdecoder := schema.NewDecoder()")?;
            writeln!(out, "\tdecoder.IgnoreUnknownKeys(true)")?;
            *decoder_declared = true;
        }
        writeln!(
            out,
            "\tif err := decoder.Decode(&{}, r.URL.Query()); err != nil {{",
            arg.name
        )?;
        write_bad_request(out, ret)
    }
}

fn write_bad_request(out: &mut String, ret: &str) -> fmt::Result {
    writeln!(
        out,
        "\t\tshared.WriteResponse(w, http.StatusBadRequest, &shared.ApiResponse[{ret}]{{"
    )?;
    writeln!(out, "\t\t\tMessage: err.Error(),")?;
    writeln!(out, "\t\t}})")?;
    writeln!(out, "\t\treturn")?;
    writeln!(out, "\t}}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use restgen_core::Include;

    use super::*;

    fn call(name: &str, method: HttpMethod, path: &str, args: &[(&str, &str)], ret: &str) -> Call {
        Call {
            name: name.to_string(),
            method,
            path: path.to_string(),
            args: args
                .iter()
                .map(|(name, ty)| Arg::new(*name, TypeRef::parse(ty)))
                .collect(),
            return_type: TypeRef::parse(ret),
        }
    }

    fn contacts() -> Schema {
        Schema {
            file_name: Some("contacts.sdl".to_string()),
            base: Some("/v1/contacts".to_string()),
            models: Some("github.com/acme/api/models".to_string()),
            calls: vec![
                call(
                    "createContact",
                    HttpMethod::Post,
                    "/",
                    &[("input", "CreateContactInput!")],
                    "Contact",
                ),
                call("getContact", HttpMethod::Get, "/{id}", &[("id", "ID!")], "Contact!"),
                call(
                    "listContacts",
                    HttpMethod::Get,
                    "/",
                    &[("filter", "ContactFilter"), ("limit", "Int")],
                    "[Contact!]!",
                ),
            ],
            ..Default::default()
        }
    }

    fn emit(schema: &Schema) -> String {
        RoutesEmitter::new(EmitOptions::default()).emit(schema)
    }

    #[test]
    fn test_handler_name_sources() {
        let mut schema = Schema {
            file_name: Some("business_locations.sdl".to_string()),
            base: Some("/v1/places/".to_string()),
            ..Default::default()
        };
        assert_eq!(handler_name(&schema), "BusinessLocations");

        schema.file_name = None;
        assert_eq!(handler_name(&schema), "Places");

        schema.base = None;
        assert_eq!(handler_name(&schema), "Handler");

        schema.file_name = Some("my-handler.sdl".to_string());
        assert_eq!(handler_name(&schema), "MyHandler");
    }

    #[test]
    fn test_imports_follow_call_shapes() {
        let go = emit(&contacts());
        assert!(go.contains(
            "import (\n\t\"encoding/json\"\n\t\"net/http\"\n\t\"github.com/go-chi/chi/v5\"\n\t\"github.com/borderlesshq/restgen/shared\"\n\tmodels \"github.com/acme/api/models\"\n\t\"github.com/gorilla/schema\"\n)"
        ));

        let mut plain = contacts();
        plain.calls.retain(|c| c.name == "getContact");
        plain.models = None;
        let go = emit(&plain);
        assert!(!go.contains("encoding/json"));
        assert!(!go.contains("gorilla/schema"));
        assert!(!go.contains("models \""));
    }

    #[test]
    fn test_include_with_package_gets_alias() {
        let mut schema = contacts();
        schema.includes.push(Include {
            path: "shared/geo.sdl".to_string(),
            namespace: "geo".to_string(),
            models: Some("github.com/acme/api/geo".to_string()),
            schema: Arc::new(Schema::default()),
        });
        schema.includes.push(Include {
            path: "bare.sdl".to_string(),
            namespace: "bare".to_string(),
            models: None,
            schema: Arc::new(Schema::default()),
        });
        schema.calls.push(call(
            "locate",
            HttpMethod::Get,
            "/{id}/location",
            &[("id", "ID!")],
            "geo.Location!",
        ));

        let go = emit(&schema);
        assert!(go.contains("\tgeo \"github.com/acme/api/geo\"\n"));
        assert!(!go.contains("bare \""));
        assert!(go.contains("&shared.ApiResponse[geo.Location]{"));
    }

    #[test]
    fn test_routes_registered_in_declaration_order() {
        let go = emit(&contacts());
        assert!(go.contains(
            "\th.applyMiddleware(r)\n\tr.Post(\"/\", h.CreateContact)\n\tr.Get(\"/{id}\", h.GetContact)\n\tr.Get(\"/\", h.ListContacts)\n\n\treturn r\n}"
        ));
        assert!(go.contains("\treturn \"/v1/contacts\"\n"));
    }

    #[test]
    fn test_return_type_decoration() {
        let go = emit(&contacts());
        assert!(go.contains("ApiResponse[*models.Contact]{\n\t\tMessage: \"CreateContact not implemented\""));
        assert!(go.contains("ApiResponse[models.Contact]{\n\t\tMessage: \"GetContact not implemented\""));
        assert!(go.contains("ApiResponse[[]models.Contact]{\n\t\tMessage: \"ListContacts not implemented\""));
    }

    #[test]
    fn test_scalar_return_types_use_scalar_map() {
        let schema = Schema {
            file_name: Some("stats.sdl".to_string()),
            calls: vec![
                call("count", HttpMethod::Get, "/count", &[], "Int!"),
                call("label", HttpMethod::Get, "/label", &[], "String"),
                call("scores", HttpMethod::Get, "/scores", &[], "[Float!]!"),
            ],
            ..Default::default()
        };
        let go = emit(&schema);
        assert!(go.contains("ApiResponse[int]{\n\t\tMessage: \"Count not implemented\""));
        assert!(go.contains("ApiResponse[*string]{\n\t\tMessage: \"Label not implemented\""));
        assert!(go.contains("ApiResponse[[]float64]{\n\t\tMessage: \"Scores not implemented\""));
    }

    #[test]
    fn test_stub_bodies() {
        let go = emit(&contacts());
        assert!(go.contains("\t// Path parameters:\n\t// id := chi.URLParam(r, \"id\")\n"));
        assert!(go.contains(
            "\tvar input models.CreateContactInput\n\tif err := json.NewDecoder(r.Body).Decode(&input); err != nil {\n"
        ));
        assert!(go.contains(
            "\t// Query parameters:\n\tvar filter models.ContactFilter\n\tdecoder := schema.NewDecoder()\n\tdecoder.IgnoreUnknownKeys(true)\n\tif err := decoder.Decode(&filter, r.URL.Query()); err != nil {\n"
        ));
        assert!(go.contains("\t// limit := r.URL.Query().Get(\"limit\")\n"));
    }

    #[test]
    fn test_decoder_declared_once_per_handler() {
        let mut schema = contacts();
        schema.calls = vec![call(
            "search",
            HttpMethod::Get,
            "/search",
            &[("filter", "ContactFilter"), ("page", "PageInput")],
            "[Contact]",
        )];
        let go = emit(&schema);
        assert_eq!(go.matches("decoder := schema.NewDecoder()").count(), 1);
        assert!(go.contains("decoder.Decode(&page, r.URL.Query())"));
    }

    #[test]
    fn test_middleware_defaults_and_regions() {
        let go = emit(&contacts());
        assert!(go.contains(
            "func (h *ContactsHandler) applyMiddleware(r chi.Router) {\n\t// Example:\n"
        ));
        assert!(go.contains("\treturn map[string][]func(http.Handler) http.Handler{\n\t\t// \"POST /\": {rateLimiter},\n"));

        let marker = go.find(MARKER).unwrap();
        let removed = go.find(REMOVED_MARKER).unwrap();
        let first_stub = go.find("func (h *ContactsHandler) CreateContact(").unwrap();
        assert!(marker < first_stub && first_stub < removed);
        assert!(go.ends_with("}\n\n// --- REMOVED HANDLERS ---\n"));
    }

    #[test]
    fn test_user_scalars_and_default_models_package() {
        let mut options = EmitOptions::default();
        options.models = Some("github.com/acme/fallback".to_string());
        options.scalars.insert("Decimal", "decimal.Decimal");

        let schema = Schema {
            file_name: Some("prices.sdl".to_string()),
            calls: vec![call("total", HttpMethod::Get, "/total", &[], "Decimal!")],
            ..Default::default()
        };
        let go = RoutesEmitter::new(options).emit(&schema);
        assert!(go.contains("\tmodels \"github.com/acme/fallback\"\n"));
        assert!(go.contains("ApiResponse[decimal.Decimal]"));
    }
}

//! Comment-carried directives: `# @base("...")`, `# @models("...")`, and
//! `# @include("...")`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{CompileError, Result};

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#\s*@(base|models|include)\s*\(\s*"([^"]+)"\s*\)"#)
        .expect("static regex must compile")
});

/// One directive value with the line it was declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub value: String,
    pub line: usize,
}

/// All directives of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub base: Option<Directive>,
    pub models: Option<Directive>,
    pub includes: Vec<Directive>,
}

/// Scans every line of `source` for directives.
///
/// Directives may appear anywhere in the file and in any order. `@include`
/// may repeat; a second `@base` or `@models` is an error.
///
/// # Examples
///
/// ```
/// use restgen_compiler::syntax::scan_directives;
///
/// let found = scan_directives("# @base(\"/v1\")\n# @include(\"geo.sdl\")\n").unwrap();
/// assert_eq!(found.base.unwrap().value, "/v1");
/// assert_eq!(found.includes[0].value, "geo.sdl");
/// assert_eq!(found.includes[0].line, 2);
/// ```
pub fn scan_directives(source: &str) -> Result<Directives> {
    let mut directives = Directives::default();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        for caps in DIRECTIVE_RE.captures_iter(line) {
            let directive = Directive {
                value: caps[2].to_string(),
                line: line_no,
            };
            match &caps[1] {
                "base" => set_once(&mut directives.base, "base", directive)?,
                "models" => set_once(&mut directives.models, "models", directive)?,
                _ => directives.includes.push(directive),
            }
        }
    }

    debug!(
        base = ?directives.base.as_ref().map(|d| &d.value),
        models = ?directives.models.as_ref().map(|d| &d.value),
        includes = directives.includes.len(),
        "Scanned directives"
    );

    Ok(directives)
}

fn set_once(slot: &mut Option<Directive>, name: &'static str, directive: Directive) -> Result<()> {
    if let Some(first) = slot {
        return Err(CompileError::DuplicateDirective {
            directive: name,
            line: directive.line,
            first_line: first.line,
        });
    }
    *slot = Some(directive);
    Ok(())
}

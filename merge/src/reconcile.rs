//! Merge reconciliation.
//!
//! The freshly generated file is the template: its text is kept as is except
//! where prior content has to survive. Substitutions are made by name, never
//! by position:
//!
//! - handler methods whose prior body is not a generated stub;
//! - archived methods that came back to the schema with a real body;
//! - the handler record type, when fields were added to it;
//! - the two middleware override functions, when they differ from their
//!   default bodies.
//!
//! Prior methods that are no longer generated move to the archive; archived
//! stubs are dropped once their call is generated again. Other code below the
//! marker is not carried over. Because
//! the generated text is spliced rather than rebuilt, merging an unedited file
//! against itself returns it byte for byte.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;

use restgen_core::contract::{
    APPLY_MIDDLEWARE_DEFAULT_BODY, APPLY_MIDDLEWARE_FN, DEPENDENCIES_PLACEHOLDER, MARKER,
    REMOVED_MARKER, ROUTE_MIDDLEWARE_DEFAULT_BODY, ROUTE_MIDDLEWARE_FN, archive_entry,
};
use tracing::{debug, info, warn};

use crate::error::{MergeError, Result};
use crate::regions::{
    ArchivedMethod, MethodBlock, extract_archive, extract_methods, find_override,
    find_record_type, split_archive, split_at_marker, stray_declarations,
};
use crate::stub::{GoStubClassifier, StubClassifier};

/// Outcome of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub content: String,
    /// Methods whose prior implementation was kept.
    pub preserved: Vec<String>,
    /// Methods moved to the archive by this merge.
    pub removed: Vec<String>,
    /// Archived methods restored as live implementations.
    pub reinstated: Vec<String>,
    /// Non-handler declarations below the marker that were dropped.
    pub discarded: Vec<String>,
}

impl MergeResult {
    fn passthrough(generated: &str) -> Self {
        Self {
            content: generated.to_string(),
            ..Default::default()
        }
    }
}

/// Merges generated handler files with their previous output.
///
/// # Examples
///
/// ```
/// use restgen_merge::Merger;
///
/// let merger = Merger::new();
/// let fresh = merger.merge("package routes\n", None);
/// assert_eq!(fresh.content, "package routes\n");
/// assert!(fresh.preserved.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Merger<C: StubClassifier = GoStubClassifier> {
    classifier: C,
}

impl Merger {
    pub fn new() -> Self {
        Self::with_classifier(GoStubClassifier)
    }
}

impl<C: StubClassifier> Merger<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    /// Merges `generated` with the file at `path`.
    ///
    /// A missing file is not an error: the generated text is returned as is.
    pub fn merge_file(&self, generated: &str, path: impl AsRef<Path>) -> Result<MergeResult> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(prior) => Ok(self.merge(generated, Some(&prior))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No existing output; writing generated file");
                Ok(MergeResult::passthrough(generated))
            }
            Err(source) => Err(MergeError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Merges `generated` with the prior contents of the same output, if any.
    pub fn merge(&self, generated: &str, prior: Option<&str>) -> MergeResult {
        match prior {
            Some(prior) => self.reconcile(generated, prior),
            None => MergeResult::passthrough(generated),
        }
    }

    fn reconcile(&self, generated: &str, prior: &str) -> MergeResult {
        let (gen_above, Some(gen_below)) = split_at_marker(generated) else {
            warn!("Generated output has no marker; nothing to merge");
            return MergeResult::passthrough(generated);
        };
        // Output is always written with LF line endings.
        let prior = prior.replace("\r\n", "\n");
        let (prior_above, prior_below) = split_at_marker(&prior);
        let prior_below = prior_below.unwrap_or_else(|| {
            warn!("Existing output has no marker; only scaffolding customizations are kept");
            ""
        });

        let mut result = MergeResult::default();
        let above = merge_scaffolding(gen_above, prior_above);
        let below = self.merge_implementations(gen_below, prior_below, &mut result);
        result.content = format!("{above}{MARKER}{below}");

        info!(
            preserved = result.preserved.len(),
            removed = result.removed.len(),
            reinstated = result.reinstated.len(),
            "Merged with existing output"
        );
        result
    }

    fn merge_implementations(
        &self,
        gen_below: &str,
        prior_below: &str,
        result: &mut MergeResult,
    ) -> String {
        let (gen_live, gen_archive) = split_archive(gen_below);
        let generated = extract_methods(gen_live);
        let prior = extract_methods(prior_below);
        let archive = extract_archive(prior_below);
        let generated_names: HashSet<&str> = generated.iter().map(|m| m.name.as_str()).collect();

        result.discarded = stray_declarations(prior_below, &prior);
        if !result.discarded.is_empty() {
            warn!(
                declarations = %result.discarded.join(", "),
                "Dropping non-handler code below the marker; move it to a separate file"
            );
        }

        let mut live = String::with_capacity(gen_live.len());
        let mut cursor = 0;
        for method in &generated {
            live.push_str(&gen_live[cursor..method.span.start]);
            live.push_str(self.choose_body(method, &prior, &archive, result));
            cursor = method.span.end;
        }
        live.push_str(&gen_live[cursor..]);

        let removed: Vec<&MethodBlock> = prior
            .iter()
            .filter(|m| !generated_names.contains(m.name.as_str()))
            .collect();
        result.removed = removed.iter().map(|m| m.name.clone()).collect();
        for name in &result.removed {
            debug!(method = %name, "Archiving method removed from schema");
        }

        let mut entries = String::new();
        for entry in &archive {
            if result.reinstated.contains(&entry.name) || result.removed.contains(&entry.name) {
                continue;
            }
            // A live stub supersedes an archived one.
            if generated_names.contains(entry.name.as_str())
                && self.classifier.is_generated_stub(&entry.body)
            {
                continue;
            }
            entries.push_str(&archive_entry(&entry.name, &entry.body));
        }
        for method in removed {
            entries.push_str(&archive_entry(&method.name, &method.text));
        }

        match gen_archive {
            Some(tail) => {
                let rest = &tail[REMOVED_MARKER.len()..];
                format!("{live}{REMOVED_MARKER}{entries}{rest}")
            }
            None if entries.is_empty() => live,
            None => format!("{live}\n\n{REMOVED_MARKER}{entries}\n"),
        }
    }

    fn choose_body<'a>(
        &self,
        method: &'a MethodBlock,
        prior: &'a [MethodBlock],
        archive: &'a [ArchivedMethod],
        result: &mut MergeResult,
    ) -> &'a str {
        if let Some(existing) = prior.iter().find(|m| m.name == method.name) {
            if self.classifier.is_generated_stub(&existing.text) {
                return &method.text;
            }
            debug!(method = %method.name, "Keeping existing implementation");
            result.preserved.push(method.name.clone());
            return &existing.text;
        }

        match archive.iter().find(|a| a.name == method.name) {
            Some(entry) if !self.classifier.is_generated_stub(&entry.body) => {
                debug!(method = %method.name, "Reinstating archived implementation");
                result.reinstated.push(method.name.clone());
                &entry.body
            }
            _ => &method.text,
        }
    }
}

/// Carries the record type and override functions forward from `prior`.
fn merge_scaffolding(generated: &str, prior: &str) -> String {
    let mut replacements: Vec<(Range<usize>, &str)> = Vec::new();

    if let (Some(old), Some(new)) = (find_record_type(prior), find_record_type(generated)) {
        let fields = old.body_text(prior);
        let normalized = normalize(fields);
        if !normalized.is_empty() && normalized != DEPENDENCIES_PLACEHOLDER {
            debug!(record = %old.name, "Keeping handler dependency fields");
            replacements.push((new.body, fields));
        }
    }

    for (name, default) in [
        (APPLY_MIDDLEWARE_FN, APPLY_MIDDLEWARE_DEFAULT_BODY),
        (ROUTE_MIDDLEWARE_FN, ROUTE_MIDDLEWARE_DEFAULT_BODY),
    ] {
        if let (Some(old), Some(new)) = (find_override(prior, name), find_override(generated, name)) {
            let body = old.body_text(prior);
            if normalize(body) != normalize(default) {
                debug!(function = name, "Keeping customized override");
                replacements.push((new.body, body));
            }
        }
    }

    replacements.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut merged = generated.to_string();
    for (range, text) in replacements {
        merged.replace_range(range, text);
    }
    merged
}

/// Trims every line and drops blank ones.
fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats every method containing `STUB` as generated.
    struct MarkerClassifier;

    impl StubClassifier for MarkerClassifier {
        fn is_generated_stub(&self, method: &str) -> bool {
            method.contains("STUB")
        }
    }

    fn file(record: &str, methods: &[&str]) -> String {
        let mut text = format!(
            "package routes\n\ntype XHandler struct {{\n{record}\n}}\n\n{MARKER}\n\n// ===\n"
        );
        for method in methods {
            text.push_str("\n\n");
            text.push_str(method);
        }
        text.push_str(&format!("\n\n{REMOVED_MARKER}\n"));
        text
    }

    fn method(name: &str, body: &str) -> String {
        format!("func (h *XHandler) {name}(w http.ResponseWriter, r *http.Request) {{\n\t{body}\n}}")
    }

    #[test]
    fn test_custom_classifier_decides() {
        let merger = Merger::with_classifier(MarkerClassifier);
        let generated = file(
            "\t// add dependencies here",
            &[&method("A", "STUB"), &method("B", "STUB")],
        );
        let prior = file(
            "\t// add dependencies here",
            &[&method("A", "real()"), &method("B", "STUB old")],
        );

        let result = merger.merge(&generated, Some(&prior));
        assert!(result.content.contains("real()"));
        assert!(!result.content.contains("STUB old"));
        assert_eq!(result.preserved, vec!["A"]);
    }

    #[test]
    fn test_normalize_ignores_indentation_and_blank_lines() {
        assert_eq!(normalize("\n\t// a\n\n    // b  \n"), "// a\n// b");
        let indented = format!("\n\t{}\n", APPLY_MIDDLEWARE_DEFAULT_BODY.replace('\n', "\n\t"));
        assert_eq!(normalize(&indented), normalize(APPLY_MIDDLEWARE_DEFAULT_BODY));
    }

    #[test]
    fn test_record_type_fields_carried_forward() {
        let merger = Merger::with_classifier(MarkerClassifier);
        let generated = file("\t// add dependencies here", &[]);
        let prior = file("\tstore Store\n\tlog *slog.Logger", &[]);
        let result = merger.merge(&generated, Some(&prior));
        assert!(
            result
                .content
                .contains("type XHandler struct {\n\tstore Store\n\tlog *slog.Logger\n}")
        );
    }

    #[test]
    fn test_placeholder_record_type_is_regenerated() {
        let merger = Merger::with_classifier(MarkerClassifier);
        let generated = file("\t// add dependencies here", &[]);
        let prior = file("    // add dependencies here   ", &[]);
        assert_eq!(merger.merge(&generated, Some(&prior)).content, generated);
    }

    #[test]
    fn test_generated_without_marker_passes_through() {
        let merger = Merger::with_classifier(MarkerClassifier);
        let result = merger.merge("package routes\n", Some("anything"));
        assert_eq!(result.content, "package routes\n");
    }
}

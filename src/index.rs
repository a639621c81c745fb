use std::collections::HashMap;
use std::sync::Arc;

use crate::completions::{collate, CompletionEntry, RenderContext, RenderedCompletion};

/// A letter-bucketed collection of completion entries. One index exists per
/// lexical context (root, receiver, type); entries shared across indices are
/// reference-counted and read-only.
#[derive(Debug, Default)]
pub struct CompletionIndex {
    /// Lowercase first letter -> entries, in registration order.
    buckets: HashMap<char, Vec<Arc<CompletionEntry>>>,
    /// Every registered entry, for unfiltered enumeration.
    all: Vec<Arc<CompletionEntry>>,
}

fn bucket_letter(name: &str) -> Option<char> {
    let first = name.chars().next()?;
    Some(first.to_lowercase().next().unwrap_or(first))
}

impl CompletionIndex {
    pub fn new() -> CompletionIndex {
        CompletionIndex::default()
    }

    /// Register an entry under the first letter of each of its aliases. An
    /// alias whose letter an earlier alias of the same entry already claimed
    /// is skipped, so an entry appears at most once per bucket.
    pub fn register(&mut self, entry: Arc<CompletionEntry>) {
        for (i, name) in entry.names.iter().enumerate() {
            let Some(letter) = bucket_letter(name) else {
                continue;
            };
            if entry.names[..i]
                .iter()
                .any(|earlier| bucket_letter(earlier) == Some(letter))
            {
                continue;
            }
            self.buckets.entry(letter).or_default().push(entry.clone());
        }
        self.all.push(entry);
    }

    /// All matching completions for a non-empty prefix, ascending by
    /// collation of the rendered insertion text. The empty prefix yields
    /// nothing; offering the whole index is `enumerate_all`'s job.
    pub fn lookup(&self, prefix: &str, context: RenderContext) -> Vec<RenderedCompletion> {
        let Some(letter) = bucket_letter(prefix) else {
            return Vec::new();
        };
        let Some(bucket) = self.buckets.get(&letter) else {
            return Vec::new();
        };
        let mut results: Vec<RenderedCompletion> = bucket
            .iter()
            .filter_map(|entry| entry.match_against(prefix, context))
            .collect();
        // Buckets keep registration order, an artifact of vocabulary load
        // order, so the result has to be sorted for display.
        results.sort_by(|a, b| collate(a.insert.as_str(), b.insert.as_str()));
        results
    }

    /// Render every entry under its canonical name, stamping the host's
    /// replacement span when one is supplied.
    pub fn enumerate_all(&self, replacement_prefix: Option<&str>) -> Vec<RenderedCompletion> {
        self.all
            .iter()
            .map(|entry| {
                let mut rendered = entry.render_canonical(RenderContext::Full);
                rendered.replacement_prefix = replacement_prefix.map(str::to_string);
                rendered
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::{EntryKind, Insertion};
    use crate::vocabulary::{BuildDiagnostic, VocabularyDoc};

    fn entries(functions_json: &str) -> Vec<Arc<CompletionEntry>> {
        let doc = VocabularyDoc::parse(&format!(
            r#"{{"wiki": "w/", "functions": {functions_json}}}"#
        ))
        .unwrap();
        let mut diagnostics: Vec<BuildDiagnostic> = Vec::new();
        doc.functions
            .iter()
            .map(|def| {
                Arc::new(
                    CompletionEntry::from_definition(
                        def,
                        EntryKind::Function,
                        "w/",
                        &mut diagnostics,
                    )
                    .unwrap(),
                )
            })
            .collect()
    }

    fn index_of(functions_json: &str) -> CompletionIndex {
        let mut index = CompletionIndex::new();
        for entry in entries(functions_json) {
            index.register(entry);
        }
        index
    }

    #[test]
    fn aliases_with_distinct_letters_get_their_own_buckets() {
        let index = index_of(
            r#"[{"text": ["Sharpen", "Unsharpen"], "description": "d"}]"#,
        );
        assert_eq!(index.lookup("sha", RenderContext::Full).len(), 1);
        assert_eq!(index.lookup("uns", RenderContext::Full).len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn aliases_sharing_a_letter_share_one_bucket_slot() {
        let index = index_of(
            r#"[{"text": ["Greyscale", "Grayscale"], "description": "d"}]"#,
        );
        // "g" matches both aliases; the entry must still surface only once.
        let results = index.lookup("g", RenderContext::Full);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Greyscale");
    }

    #[test]
    fn empty_prefix_yields_nothing() {
        let index = index_of(r#"[{"text": "Blur", "description": "d"}]"#);
        assert!(index.lookup("", RenderContext::Full).is_empty());
    }

    #[test]
    fn unknown_bucket_yields_nothing() {
        let index = index_of(r#"[{"text": "Blur", "description": "d"}]"#);
        assert!(index.lookup("z", RenderContext::Full).is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive_on_the_bucket_letter() {
        let index = index_of(r#"[{"text": "Blur", "description": "d"}]"#);
        assert_eq!(index.lookup("BL", RenderContext::Full).len(), 1);
    }

    #[test]
    fn results_sorted_by_collated_insertion_text() {
        let index = index_of(
            r#"[{"text": "blankclip", "description": "d"},
                {"text": "Blur", "description": "d", "signature": "clip c, float amount"},
                {"text": "BilinearResize", "description": "d"}]"#,
        );
        let results = index.lookup("b", RenderContext::Full);
        let texts: Vec<&str> = results.iter().map(|r| r.insert.as_str()).collect();
        assert_eq!(
            texts,
            ["BilinearResize", "blankclip", "Blur(${1:c}, ${2:amount})"]
        );
    }

    #[test]
    fn lookup_is_idempotent() {
        let index = index_of(
            r#"[{"text": "Blur", "description": "d"},
                {"text": "BlankClip", "description": "d"}]"#,
        );
        let first = index.lookup("bl", RenderContext::Full);
        let second = index.lookup("bl", RenderContext::Full);
        assert_eq!(first, second);
    }

    #[test]
    fn enumerate_all_yields_each_canonical_name_once() {
        let index = index_of(
            r#"[{"text": ["Greyscale", "Grayscale"], "description": "d"},
                {"text": "Blur", "description": "d"}]"#,
        );
        let results = index.enumerate_all(None);
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Greyscale", "Blur"]);
    }

    #[test]
    fn enumerate_all_stamps_replacement_prefix() {
        let index = index_of(r#"[{"text": "Blur", "description": "d"}]"#);
        let results = index.enumerate_all(Some("( "));
        assert_eq!(results[0].replacement_prefix.as_deref(), Some("( "));
        assert_eq!(results[0].insert, Insertion::Text("Blur".to_string()));

        let results = index.enumerate_all(None);
        assert!(results[0].replacement_prefix.is_none());
    }
}

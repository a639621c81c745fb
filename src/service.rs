use std::sync::{Arc, LazyLock};

use log::warn;

use crate::completions::{CompletionEntry, EntryKind, RenderContext, RenderedCompletion};
use crate::context::{self, Context};
use crate::index::CompletionIndex;
use crate::vocabulary::{BuildDiagnostic, Definition, VocabularyDoc};

/// The three context-scoped indices, built once from a vocabulary document
/// and read-only afterwards.
pub struct CompletionService {
    /// Functions and variables usable as free identifiers.
    root: CompletionIndex,
    /// Receiver-taking functions, offered after a dot.
    receiver: CompletionIndex,
    /// Type names, offered in function-parameter position.
    types: CompletionIndex,
}

impl CompletionService {
    /// Build the indices. Degraded or skipped definitions are reported as
    /// diagnostics, never as errors: a broken definition must not take the
    /// rest of the vocabulary down with it.
    pub fn build(doc: &VocabularyDoc) -> (CompletionService, Vec<BuildDiagnostic>) {
        let mut diagnostics = Vec::new();
        let mut root = CompletionIndex::new();
        let mut receiver = CompletionIndex::new();
        let mut types = CompletionIndex::new();

        for def in &doc.functions {
            if let Some(entry) =
                build_entry(def, EntryKind::Function, &doc.wiki, &mut diagnostics)
            {
                if entry.takes_receiver() {
                    receiver.register(entry.clone());
                }
                root.register(entry);
            }
        }
        for def in &doc.variables {
            if let Some(entry) =
                build_entry(def, EntryKind::Variable, &doc.wiki, &mut diagnostics)
            {
                root.register(entry);
            }
        }
        for def in &doc.types {
            if let Some(entry) = build_entry(def, EntryKind::Type, &doc.wiki, &mut diagnostics) {
                types.register(entry);
            }
        }

        let service = CompletionService {
            root,
            receiver,
            types,
        };
        (service, diagnostics)
    }

    /// Classify the cursor context and run the corresponding index
    /// operation. `None` is the no-result sentinel: either the context is
    /// deliberately inert or the lookup matched nothing. A host may treat
    /// that differently from an empty list, so the two are kept distinct.
    pub fn get_completions(
        &self,
        line_prefix: &str,
        typed_prefix: &str,
    ) -> Option<Vec<RenderedCompletion>> {
        let results = match context::classify(line_prefix, typed_prefix) {
            Context::EnumerateTypes { replacement } => {
                self.types.enumerate_all(Some(&replacement))
            }
            Context::LookupTypes(prefix) => self.types.lookup(&prefix, RenderContext::Full),
            Context::LookupReceiverFunctions(prefix) => {
                self.receiver.lookup(&prefix, RenderContext::Receiver)
            }
            Context::LookupRoot(prefix) => self.root.lookup(&prefix, RenderContext::Full),
            Context::NoCompletion => return None,
        };
        if results.is_empty() {
            None
        } else {
            Some(results)
        }
    }

    pub fn root_index(&self) -> &CompletionIndex {
        &self.root
    }

    pub fn receiver_index(&self) -> &CompletionIndex {
        &self.receiver
    }

    pub fn type_index(&self) -> &CompletionIndex {
        &self.types
    }
}

fn build_entry(
    def: &Definition,
    kind: EntryKind,
    wiki_base: &str,
    diagnostics: &mut Vec<BuildDiagnostic>,
) -> Option<Arc<CompletionEntry>> {
    match CompletionEntry::from_definition(def, kind, wiki_base, diagnostics) {
        Ok(entry) => Some(Arc::new(entry)),
        Err(e) => {
            diagnostics.push(BuildDiagnostic::error("<unnamed>", e));
            None
        }
    }
}

static SERVICE: LazyLock<CompletionService> = LazyLock::new(|| {
    let doc = VocabularyDoc::parse(include_str!("completions.json"))
        .expect("failed to parse completions.json");
    let (service, diagnostics) = CompletionService::build(&doc);
    for diagnostic in &diagnostics {
        warn!("vocabulary: {diagnostic}");
    }
    service
});

/// The service built from the embedded vocabulary, shared by all requests.
pub fn global() -> &'static CompletionService {
    &SERVICE
}

use std::cmp::Ordering;

use crate::signature::Signature;
use crate::vocabulary::{
    BuildDiagnostic, Definition, InvalidDefinition, NameList, SignatureSource, WikiLink,
};

/// Case-insensitive, accent-sensitive comparison: characters are equal only
/// if they differ in case alone, never in diacritics.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// True iff `candidate`'s leading substring of `prefix`'s length collates
/// equal to `prefix`.
pub fn prefix_matches(prefix: &str, candidate: &str) -> bool {
    let mut rest = candidate.chars();
    for p in prefix.chars() {
        match rest.next() {
            Some(c) => {
                if !c.to_lowercase().eq(p.to_lowercase()) {
                    return false;
                }
            }
            None => return false,
        }
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Function,
    Variable,
    Type,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Function => "function",
            EntryKind::Variable => "variable",
            EntryKind::Type => "type",
        }
    }
}

/// Which placeholder template to apply when rendering a signature-bearing
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    /// All arguments.
    Full,
    /// The entry is being offered after a receiver value; the receiver
    /// argument is stripped from the template.
    Receiver,
}

/// What the host should insert for one suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Text(String),
    Snippet(String),
}

impl Insertion {
    pub fn as_str(&self) -> &str {
        match self {
            Insertion::Text(s) | Insertion::Snippet(s) => s,
        }
    }

    pub fn is_snippet(&self) -> bool {
        matches!(self, Insertion::Snippet(_))
    }
}

/// One suggestion as returned to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCompletion {
    /// The alias that matched (canonical name for unfiltered enumeration).
    pub name: String,
    pub insert: Insertion,
    pub kind: EntryKind,
    pub description: String,
    pub more_info_url: Option<String>,
    pub returns: Option<String>,
    /// Span the editor should replace, stamped only by unfiltered
    /// enumeration.
    pub replacement_prefix: Option<String>,
}

/// One vocabulary item. Built once at startup and immutable afterwards; an
/// entry registered into several indices is shared read-only.
#[derive(Debug)]
pub struct CompletionEntry {
    /// At least one name; the first is canonical.
    pub names: Vec<String>,
    pub kind: EntryKind,
    pub description: String,
    pub more_info_url: Option<String>,
    pub returns: Option<String>,
    pub signature: Option<Signature>,
    /// The description was generated rather than authored. Load-time
    /// diagnostics only, never ranking.
    pub abbreviated: bool,
}

impl CompletionEntry {
    /// Build an entry from one vocabulary definition. A malformed signature
    /// downgrades the entry to a plain-text insertion and records a
    /// diagnostic; a record without `text` fails.
    pub fn from_definition(
        def: &Definition,
        kind: EntryKind,
        wiki_base: &str,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Result<CompletionEntry, InvalidDefinition> {
        let record = match def {
            Definition::Name(name) => {
                diagnostics.push(BuildDiagnostic::warning(name, "missing description"));
                return Ok(CompletionEntry {
                    names: vec![name.clone()],
                    kind,
                    description: generated_description(kind, name),
                    more_info_url: Some(format!("{wiki_base}{name}")),
                    returns: None,
                    signature: None,
                    abbreviated: true,
                });
            }
            Definition::Record(record) => record,
        };

        let names = match &record.text {
            Some(NameList::One(name)) => vec![name.clone()],
            Some(NameList::Many(names)) if !names.is_empty() => names.clone(),
            _ => return Err(InvalidDefinition),
        };
        let canonical = &names[0];

        let (description, abbreviated) = match &record.description {
            Some(description) => (description.clone(), false),
            None => {
                diagnostics.push(BuildDiagnostic::warning(canonical, "missing description"));
                (generated_description(kind, canonical), true)
            }
        };

        // An explicit descriptionMoreURL wins over any wiki derivation.
        let more_info_url = match &record.description_more_url {
            Some(url) => Some(url.clone()),
            None => match &record.wiki {
                Some(WikiLink::Flag(false)) => None,
                Some(WikiLink::Flag(true)) | None => Some(format!("{wiki_base}{canonical}")),
                Some(WikiLink::Page(page)) => Some(format!("{wiki_base}{page}")),
            },
        };

        let signature = match record.signature.as_ref().and_then(SignatureSource::first) {
            Some(raw) => match Signature::parse(raw) {
                Ok(signature) => Some(signature),
                Err(e) => {
                    diagnostics.push(BuildDiagnostic::warning(canonical, e));
                    None
                }
            },
            None => None,
        };

        Ok(CompletionEntry {
            names,
            kind,
            description,
            more_info_url,
            returns: record.returns.clone(),
            signature,
            abbreviated,
        })
    }

    pub fn canonical_name(&self) -> &str {
        &self.names[0]
    }

    pub fn takes_receiver(&self) -> bool {
        self.signature.as_ref().is_some_and(|s| s.takes_receiver)
    }

    /// Render the first alias that matches `prefix`, or nothing. Later
    /// aliases that also match are suppressed.
    pub fn match_against(&self, prefix: &str, context: RenderContext) -> Option<RenderedCompletion> {
        let name = self.names.iter().find(|name| prefix_matches(prefix, name))?;
        Some(self.render(name, context))
    }

    /// Render under the canonical name, for unfiltered enumeration.
    pub fn render_canonical(&self, context: RenderContext) -> RenderedCompletion {
        self.render(self.canonical_name(), context)
    }

    fn render(&self, name: &str, context: RenderContext) -> RenderedCompletion {
        let insert = match &self.signature {
            Some(signature) => {
                let template = match context {
                    RenderContext::Receiver => signature
                        .receiver_snippet()
                        .unwrap_or_else(|| signature.snippet()),
                    RenderContext::Full => signature.snippet(),
                };
                Insertion::Snippet(format!("{name}{template}"))
            }
            None => Insertion::Text(name.to_string()),
        };
        RenderedCompletion {
            name: name.to_string(),
            insert,
            kind: self.kind,
            description: self.description.clone(),
            more_info_url: self.more_info_url.clone(),
            returns: self.returns.clone(),
            replacement_prefix: None,
        }
    }
}

fn generated_description(kind: EntryKind, name: &str) -> String {
    format!("AviSynth built-in {} {}", kind.label(), name)
}

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// A structured definition record with no `text` field cannot be completed
/// and is skipped at build time.
#[derive(Debug, Error)]
#[error("definition record has no \"text\" field")]
pub struct InvalidDefinition;

/// The vocabulary document: four top-level collections plus the wiki base
/// URL used to derive documentation links.
#[derive(Debug, Deserialize)]
pub struct VocabularyDoc {
    pub wiki: String,
    #[serde(default)]
    pub functions: Vec<Definition>,
    #[serde(default)]
    pub variables: Vec<Definition>,
    #[serde(default)]
    pub types: Vec<Definition>,
}

impl VocabularyDoc {
    pub fn parse(json: &str) -> serde_json::Result<VocabularyDoc> {
        serde_json::from_str(json)
    }
}

/// One vocabulary definition: either a bare name or a structured record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Name(String),
    Record(DefinitionRecord),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DefinitionRecord {
    pub text: Option<NameList>,
    pub description: Option<String>,
    pub signature: Option<SignatureSource>,
    pub returns: Option<String>,
    pub wiki: Option<WikiLink>,
    #[serde(rename = "descriptionMoreURL")]
    pub description_more_url: Option<String>,
}

/// `text` is either a single name or a list of aliases, first canonical.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

/// `signature` is either a single string or a list of alternatives.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignatureSource {
    One(String),
    Alternatives(Vec<String>),
}

impl SignatureSource {
    /// Only the first alternative is modeled; later alternatives are
    /// discarded. This is an accepted limitation of the data model.
    pub fn first(&self) -> Option<&str> {
        match self {
            SignatureSource::One(s) => Some(s),
            SignatureSource::Alternatives(list) => list.first().map(String::as_str),
        }
    }
}

/// `wiki` is `true`/absent (derive from the canonical name), a string
/// (derive from that page name), or `false` (legitimately no wiki entry).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WikiLink {
    Flag(bool),
    Page(String),
}

/// A diagnostic raised while building the completion indices. These are
/// logged (or printed by `check`), never surfaced at query time.
#[derive(Debug)]
pub struct BuildDiagnostic {
    pub entry: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The definition loaded, but degraded (signature dropped, generated
    /// description).
    Warning,
    /// The definition was skipped entirely.
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl BuildDiagnostic {
    pub fn warning(entry: &str, message: impl fmt::Display) -> BuildDiagnostic {
        BuildDiagnostic {
            entry: entry.to_string(),
            severity: Severity::Warning,
            message: message.to_string(),
        }
    }

    pub fn error(entry: &str, message: impl fmt::Display) -> BuildDiagnostic {
        BuildDiagnostic {
            entry: entry.to_string(),
            severity: Severity::Error,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.entry,
            self.severity.as_str(),
            self.message
        )
    }
}

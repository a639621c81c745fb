use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Reserved type name of the implicit receiver value a function can be
/// invoked on with a dot-call.
pub const RECEIVER_TYPE: &str = "clip";

#[derive(Debug, Error)]
#[error("could not parse field {field:?}")]
pub struct MalformedArgument {
    pub field: String,
}

/// One field of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub arg_type: String,
}

// A field is an optional `[` (optional-argument notation), a `type name`
// pair or a bare `name`, an optional `=default`, an optional `...` varargs
// marker, and an optional `]`. Everything but the type/name token is
// recognized only to be stripped.
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?\s*(\w+(?:\s+\w+)?)(?:\s*=.*)?(?:\s*\.{3})?\s*\]?$").unwrap()
});

static TYPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+)\s+(\w+)$").unwrap());

impl Argument {
    pub fn parse(field: &str) -> Result<Argument, MalformedArgument> {
        let token = FIELD
            .captures(field)
            .and_then(|c| c.get(1))
            .ok_or_else(|| MalformedArgument {
                field: field.to_string(),
            })?
            .as_str();

        if let Some(c) = TYPED.captures(token) {
            Ok(Argument {
                arg_type: c[1].to_string(),
                name: c[2].to_string(),
            })
        } else {
            // Type and name are one and the same
            Ok(Argument {
                arg_type: token.to_string(),
                name: token.to_string(),
            })
        }
    }

    fn snippet_field(&self, index: usize) -> String {
        format!("${{{}:{}}}", index, self.name)
    }
}

/// A parsed function signature with its snippet templates precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub args: Vec<Argument>,
    pub takes_receiver: bool,
    snippet: String,
    receiver_snippet: Option<String>,
}

impl Signature {
    /// Parse a comma-separated signature string. An all-whitespace string is
    /// a zero-argument signature.
    pub fn parse(raw: &str) -> Result<Signature, MalformedArgument> {
        let args = if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(',')
                .map(|field| Argument::parse(field.trim()))
                .collect::<Result<Vec<_>, _>>()?
        };

        let takes_receiver = args
            .first()
            .is_some_and(|arg| arg.arg_type == RECEIVER_TYPE);

        let snippet = build_snippet(&args);
        // The receiver template drops the first argument and renumbers the
        // rest from 1 so placeholder indices line up after insertion.
        let receiver_snippet = takes_receiver.then(|| build_snippet(&args[1..]));

        Ok(Signature {
            args,
            takes_receiver,
            snippet,
            receiver_snippet,
        })
    }

    /// Positional placeholder template covering all arguments.
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Placeholder template with the receiver argument omitted. `None`
    /// unless the signature takes a receiver.
    pub fn receiver_snippet(&self) -> Option<&str> {
        self.receiver_snippet.as_deref()
    }
}

fn build_snippet(args: &[Argument]) -> String {
    let fields: Vec<String> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| arg.snippet_field(i + 1))
        .collect();
    format!("({})", fields.join(", "))
}

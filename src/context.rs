use std::sync::LazyLock;

use regex::Regex;

/// What a completion request should do, decided from the text before the
/// cursor. Carried prefixes are owned so the service can hand them straight
/// to an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Offer every type name, stamped with the span to replace.
    EnumerateTypes { replacement: String },
    /// Look up type names by prefix (inside a parameter list).
    LookupTypes(String),
    /// Look up receiver-taking functions by prefix (after a dot).
    LookupReceiverFunctions(String),
    /// Look up free identifiers by prefix.
    LookupRoot(String),
    /// Deliberately offer nothing.
    NoCompletion,
}

// A function signature position: an optional `function` introducer, an
// identifier, then an open parenthesis or comma, possibly already followed
// by parameter fields.
static SIGNATURE_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:function\s+)?\w+\s*[(,]").unwrap());

// A declaration head whose parenthesis has not reached the line prefix yet;
// it is still being typed, as the fragment.
static DECL_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:function\s+)?\w+\s*$").unwrap());

// A typed fragment that is nothing but the opening of a parameter field:
// `(` or `, `, with surrounding whitespace.
static OPEN_FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\(|,\s)\s*$").unwrap());

static AFTER_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[(,]\s*$").unwrap());

static AFTER_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s*$").unwrap());

static LONE_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.\s*$").unwrap());

/// Classify the cursor's lexical context. `line_prefix` is the line text
/// before the typed fragment; `typed_prefix` is the fragment itself.
/// Evaluation order encodes precedence and never fails: an unrecognized
/// shape falls through to a root lookup.
pub fn classify(line_prefix: &str, typed_prefix: &str) -> Context {
    let open_field_typed = OPEN_FIELD.is_match(typed_prefix);
    if SIGNATURE_POSITION.is_match(line_prefix)
        || (DECL_HEAD.is_match(line_prefix) && open_field_typed)
    {
        if typed_prefix.is_empty() || open_field_typed {
            return Context::EnumerateTypes {
                replacement: typed_prefix.to_string(),
            };
        }
        if AFTER_SEPARATOR.is_match(line_prefix) {
            return Context::LookupTypes(typed_prefix.to_string());
        }
        // The user is typing a parameter name, which is not completable.
        return Context::NoCompletion;
    }

    if AFTER_DOT.is_match(line_prefix) {
        return Context::LookupReceiverFunctions(typed_prefix.to_string());
    }

    if LONE_DOT.is_match(typed_prefix) {
        // After a dot with nothing typed yet. Reserved for a "most likely
        // receiver function" heuristic; inert for now.
        return Context::NoCompletion;
    }

    Context::LookupRoot(typed_prefix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_paren_enumerates_types() {
        assert_eq!(
            classify("Subtitle(", ""),
            Context::EnumerateTypes {
                replacement: String::new()
            }
        );
    }

    #[test]
    fn after_comma_enumerates_types() {
        assert_eq!(
            classify("Subtitle(c, ", ""),
            Context::EnumerateTypes {
                replacement: String::new()
            }
        );
    }

    #[test]
    fn open_field_fragment_enumerates_types() {
        assert_eq!(
            classify("function foo", "("),
            Context::EnumerateTypes {
                replacement: "(".to_string()
            }
        );
        assert_eq!(
            classify("function foo(int x", ", "),
            Context::EnumerateTypes {
                replacement: ", ".to_string()
            }
        );
    }

    #[test]
    fn typed_prefix_in_parameter_list_looks_up_types() {
        assert_eq!(
            classify("Subtitle(", "cl"),
            Context::LookupTypes("cl".to_string())
        );
        assert_eq!(
            classify("function foo(int x, ", "fl"),
            Context::LookupTypes("fl".to_string())
        );
    }

    #[test]
    fn parameter_name_position_is_inert() {
        assert_eq!(classify("function foo(int x", "y"), Context::NoCompletion);
    }

    #[test]
    fn after_receiver_dot() {
        assert_eq!(
            classify("x = clip.", ""),
            Context::LookupReceiverFunctions(String::new())
        );
        assert_eq!(
            classify("x = clip. ", "Tri"),
            Context::LookupReceiverFunctions("Tri".to_string())
        );
    }

    #[test]
    fn lone_dot_is_inert() {
        assert_eq!(classify("", "."), Context::NoCompletion);
    }

    #[test]
    fn default_is_root_lookup() {
        assert_eq!(
            classify("x = ", "Blu"),
            Context::LookupRoot("Blu".to_string())
        );
    }

    #[test]
    fn unrecognized_shape_falls_through_to_root() {
        assert_eq!(
            classify(")(][ = ??", "x"),
            Context::LookupRoot("x".to_string())
        );
        assert_eq!(classify("", ""), Context::LookupRoot(String::new()));
    }

    #[test]
    fn assignment_call_is_not_signature_position() {
        // Only a leading identifier-plus-paren counts; a call on the right
        // of an assignment does not.
        assert_eq!(
            classify("x = Subtitle(", "cl"),
            Context::LookupRoot("cl".to_string())
        );
    }
}

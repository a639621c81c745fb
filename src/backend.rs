use dashmap::DashMap;
use log::debug;
use ropey::Rope;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::completions::{EntryKind, Insertion, RenderedCompletion};
use crate::service;

pub struct DocumentState {
    pub rope: Rope,
}

pub struct Backend {
    pub client: Client,
    pub document_map: DashMap<String, DocumentState>,
}

struct TextDocumentItem {
    uri: Url,
    text: String,
}

impl Backend {
    fn on_change(&self, params: TextDocumentItem) {
        self.document_map.insert(
            params.uri.to_string(),
            DocumentState {
                rope: Rope::from_str(&params.text),
            },
        );
    }
}

/// The line text up to the cursor column.
fn line_up_to(rope: &Rope, position: Position) -> Option<String> {
    let line = rope.get_line(position.line as usize)?;
    let col = (position.character as usize).min(line.len_chars());
    Some(line.slice(..col).to_string())
}

/// Split the text before the cursor into the line prefix and the typed
/// identifier fragment.
fn split_prefix(line: &str) -> (&str, &str) {
    let split = line
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    line.split_at(split)
}

/// True when the cursor sits inside a `#` comment. A `#` inside a string
/// literal does not open a comment.
fn in_comment(line_prefix: &str) -> bool {
    let mut in_string = false;
    for c in line_prefix.chars() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return true,
            _ => {}
        }
    }
    false
}

fn completion_kind(kind: EntryKind) -> CompletionItemKind {
    match kind {
        EntryKind::Function => CompletionItemKind::FUNCTION,
        EntryKind::Variable => CompletionItemKind::VARIABLE,
        EntryKind::Type => CompletionItemKind::CLASS,
    }
}

fn to_items(rendered: Vec<RenderedCompletion>) -> Vec<CompletionItem> {
    rendered
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let mut md_parts = vec![r.description.clone()];
            if let Some(url) = &r.more_info_url {
                md_parts.push(format!("[More info]({url})"));
            }
            let documentation = Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: md_parts.join("\n\n"),
            }));

            let insert_text_format = if r.insert.is_snippet() {
                InsertTextFormat::SNIPPET
            } else {
                InsertTextFormat::PLAIN_TEXT
            };

            CompletionItem {
                label: r.name,
                kind: Some(completion_kind(r.kind)),
                detail: r.returns,
                documentation,
                insert_text: Some(match r.insert {
                    Insertion::Text(s) | Insertion::Snippet(s) => s,
                }),
                insert_text_format: Some(insert_text_format),
                // The service already collated the results; keep its order.
                sort_text: Some(format!("{i:04}")),
                ..Default::default()
            }
        })
        .collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "avs-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        "(".to_string(),
                        ",".to_string(),
                    ]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        debug!("initialized!");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_change(TextDocumentItem {
            uri: params.text_document.uri,
            text: params.text_document.text,
        });
        debug!("file opened!");
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.on_change(TextDocumentItem {
            uri: params.text_document.uri,
            text: params.content_changes[0].text.clone(),
        });
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.document_map.remove(&params.text_document.uri.to_string());
        debug!("file closed!");
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;
        debug!("completion requested for {uri} at {position:?}");

        let line = match self
            .document_map
            .get(&uri)
            .and_then(|doc| line_up_to(&doc.rope, position))
        {
            Some(line) => line,
            None => return Ok(None),
        };

        let (line_prefix, typed_prefix) = split_prefix(&line);
        if in_comment(line_prefix) {
            return Ok(None);
        }

        let results = service::global().get_completions(line_prefix, typed_prefix);
        Ok(results.map(|rendered| CompletionResponse::Array(to_items(rendered))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prefix_basic() {
        assert_eq!(split_prefix("x = Blu"), ("x = ", "Blu"));
        assert_eq!(split_prefix("Blu"), ("", "Blu"));
        assert_eq!(split_prefix("x = clip."), ("x = clip.", ""));
        assert_eq!(split_prefix(""), ("", ""));
    }

    #[test]
    fn split_prefix_keeps_underscores_and_digits() {
        assert_eq!(split_prefix("a = ConvertToYV12"), ("a = ", "ConvertToYV12"));
        assert_eq!(split_prefix("a = my_clip"), ("a = ", "my_clip"));
    }

    #[test]
    fn in_comment_detection() {
        assert!(in_comment("# a comment "));
        assert!(in_comment("x = 1 # trailing"));
        assert!(!in_comment("x = \"#not a comment\" + "));
        assert!(!in_comment("x = "));
    }

    #[test]
    fn line_up_to_clamps_column() {
        let rope = Rope::from_str("Blur(last)\n");
        let line = line_up_to(
            &rope,
            Position {
                line: 0,
                character: 4,
            },
        )
        .unwrap();
        assert_eq!(line, "Blur");
        let clamped = line_up_to(
            &rope,
            Position {
                line: 0,
                character: 999,
            },
        )
        .unwrap();
        assert_eq!(clamped, "Blur(last)\n");
    }

    #[test]
    fn line_up_to_missing_line() {
        let rope = Rope::from_str("Blur(last)\n");
        assert!(line_up_to(
            &rope,
            Position {
                line: 99,
                character: 0,
            },
        )
        .is_none());
    }

    #[test]
    fn to_items_snippet_mapping() {
        let results = service::global().get_completions("", "Blu").unwrap();
        let items = to_items(results);
        let blur = items.iter().find(|i| i.label == "Blur").unwrap();
        assert_eq!(blur.kind, Some(CompletionItemKind::FUNCTION));
        assert_eq!(blur.insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert!(blur.insert_text.as_ref().unwrap().starts_with("Blur("));
        assert!(blur.documentation.is_some());
    }

    #[test]
    fn to_items_preserves_order() {
        let results = service::global().get_completions("", "b").unwrap();
        let items = to_items(results);
        let mut sort_keys: Vec<String> =
            items.iter().filter_map(|i| i.sort_text.clone()).collect();
        let original = sort_keys.clone();
        sort_keys.sort();
        assert_eq!(sort_keys, original);
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::service::CompletionService;
use crate::vocabulary::{BuildDiagnostic, Severity, VocabularyDoc};

/// Validate one vocabulary document and return its build diagnostics.
pub fn check_file(path: &Path) -> Result<Vec<BuildDiagnostic>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = VocabularyDoc::parse(&json)
        .with_context(|| format!("{} is not a valid vocabulary document", path.display()))?;
    let (_, diagnostics) = CompletionService::build(&doc);
    Ok(diagnostics)
}

/// Escape a value for CSV output. Wraps in quotes if the value contains
/// commas, quotes, or newlines. Doubles any existing quotes.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Format diagnostics as CSV with a header row.
pub fn format_csv(file: &str, diagnostics: &[BuildDiagnostic]) -> String {
    let mut out = String::from("file,entry,severity,message\n");
    for d in diagnostics {
        out.push_str(&csv_escape(file));
        out.push(',');
        out.push_str(&csv_escape(&d.entry));
        out.push(',');
        out.push_str(d.severity.as_str());
        out.push(',');
        out.push_str(&csv_escape(&d.message));
        out.push('\n');
    }
    out
}

/// Entry point for the CLI `check` subcommand. Returns exit code: 0 when
/// every definition loaded (possibly degraded), 1 when any was skipped,
/// 2 on usage or document-level failure.
pub fn run_check(args: &[String]) -> i32 {
    if args.is_empty() {
        eprintln!("Usage: avs-lsp check <vocabulary.json>...");
        return 2;
    }

    let mut skipped_any = false;
    let mut first = true;
    for arg in args {
        let path = PathBuf::from(arg);
        let diagnostics = match check_file(&path) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("{e:#}");
                return 2;
            }
        };
        let csv = format_csv(arg, &diagnostics);
        if first {
            print!("{csv}");
            first = false;
        } else {
            // Skip the repeated header for subsequent files.
            for line in csv.lines().skip(1) {
                println!("{line}");
            }
        }
        skipped_any |= diagnostics.iter().any(|d| d.severity == Severity::Error);
    }

    if skipped_any {
        1
    } else {
        0
    }
}

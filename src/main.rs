mod backend;
mod check;
mod completions;
mod context;
mod index;
mod service;
mod signature;
mod vocabulary;

use backend::Backend;
use dashmap::DashMap;
use tower_lsp::{LspService, Server};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("check") => {
            let code = check::run_check(&args[2..]);
            std::process::exit(code);
        }
        Some("--help" | "-h") => {
            print_usage();
        }
        Some("--version" | "-V") => {
            println!("avs-lsp {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            run_lsp();
        }
    }
}

fn print_usage() {
    println!("avs-lsp {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage:");
    println!("  avs-lsp                          Start LSP server (stdin/stdout)");
    println!("  avs-lsp check <vocabulary.json>  Validate a vocabulary document, output CSV");
    println!("  avs-lsp --help                   Show this help");
    println!("  avs-lsp --version                Show version");
}

#[tokio::main]
async fn run_lsp() {
    env_logger::init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(|client| Backend {
        client,
        document_map: DashMap::new(),
    })
    .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}

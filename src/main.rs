use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use serde_json::Value;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use query_predicate::{CompileContext, Compiler, Error, Node, Schema};

/// Compile a parsed filter query (JSON AST) into a predicate, and optionally
/// run it over a JSON array of records.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Query AST as JSON file, or `-` for stdin
    ast: PathBuf,
    /// Schema catalog (JSON)
    #[arg(long)]
    schema: PathBuf,
    /// Root entity type the selectors start from
    #[arg(long)]
    root: String,
    /// JSON array of records to filter with the compiled predicate (optional)
    #[arg(long)]
    records: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

// Exit codes: 2 when the query is at fault, 1 for everything else.
const EXIT_QUERY: i32 = 2;
const EXIT_FAILURE: i32 = 1;

fn exit_code(e: &Error) -> i32 {
    if e.is_client_error() {
        EXIT_QUERY
    } else {
        EXIT_FAILURE
    }
}

/// Read `path`, or `stdin` when the path is `-`.
fn read_input(path: &Path, mut stdin: impl Read) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn fail(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    exit(code);
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cannot install log subscriber: {e}");
    }

    // Load schema and query.
    let schema = match std::fs::read_to_string(&args.schema) {
        Ok(doc) => Schema::from_json(&doc).unwrap_or_else(|e| fail(EXIT_FAILURE, e)),
        Err(e) => fail(EXIT_FAILURE, format!("cannot read schema {}: {e}", args.schema.display())),
    };
    if !schema.has_entity(&args.root) {
        fail(EXIT_FAILURE, format!("unknown root entity '{}'", args.root));
    }
    let node: Node = match read_input(&args.ast, std::io::stdin()) {
        Ok(doc) => serde_json::from_str(&doc).unwrap_or_else(|e| fail(EXIT_QUERY, format!("invalid query AST: {e}"))),
        Err(e) => fail(EXIT_FAILURE, format!("cannot read query AST: {e}")),
    };

    // Compile.
    let compiler = Compiler::new(schema);
    let ctx = CompileContext::new(args.root.as_str());
    let predicate = match compiler.compile(&ctx, &node) {
        Ok(p) => p,
        Err(e) => fail(exit_code(&e), e),
    };
    info!(root = %args.root, "query compiled");

    // Output either the predicate or the matching records.
    let out = match args.records {
        None => serde_json::to_value(&predicate).unwrap_or_else(|e| fail(EXIT_FAILURE, e)),
        Some(path) => {
            let records: Vec<Value> = match read_input(&path, std::io::stdin()) {
                Ok(doc) => serde_json::from_str(&doc).unwrap_or_else(|e| fail(EXIT_FAILURE, format!("invalid records: {e}"))),
                Err(e) => fail(EXIT_FAILURE, format!("cannot read records {}: {e}", path.display())),
            };
            let total = records.len();
            let matched: Vec<Value> = records.into_iter().filter(|r| predicate.matches(r)).collect();
            info!(total, matched = matched.len(), "records filtered");
            Value::Array(matched)
        }
    };
    match serde_json::to_string_pretty(&out) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(EXIT_FAILURE, e),
    }
}

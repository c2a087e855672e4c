//! Retouch CLI - Batch Image Enhancement
//!
//! Runs single filters and pipelines on files, or drives an interactive
//! upload/preview/confirm/export session over stdin.

use anyhow::{Context, Result};
use log::{debug, warn};
use retouch::prelude::*;
use retouch::session::parse_pipeline_body;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

fn main() {
    let mut args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "retouch".to_string());

    let config = match take_config(&mut args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();

    if args.len() < 2 {
        print_usage(&program);
        return;
    }

    let result = match args[1].as_str() {
        "filters" | "list" => {
            list_filters(&args[2..].join(" "));
            Ok(())
        }
        "info" if args.len() >= 3 => filter_info(&args[2..].join(" ")),
        "apply" if args.len() >= 5 => apply_filter(&args[2], &args[3], &args[4..]),
        "pipeline" if args.len() >= 5 => apply_pipeline(&args[2], &args[3], &args[4]),
        "session" => run_session(config),
        "help" | "--help" | "-h" => {
            print_usage(&program);
            Ok(())
        }
        other => {
            eprintln!("Unknown or incomplete command: {}", other);
            print_usage(&program);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("🎨 Retouch - Batch Image Enhancement v{}", retouch::VERSION);
    println!();
    println!("Usage: {} [--config <file>] <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  filters [query]                      List filters, or those matching a query");
    println!("  info <filter>                        Show a filter's parameters");
    println!("  apply <in> <out> <filter> [k=v...]   Run one filter on a file");
    println!("  pipeline <in> <out> <steps.json>     Run a pipeline on a file");
    println!("  session                              Interactive session on stdin");
    println!("  help                                 Show this help message");
    println!();
    println!("Session commands (one per line, each answered with a JSON line):");
    println!("  upload <files|dirs...>   current   preview <filter> [k=v...]");
    println!("  pipeline <json>   confirm   next   prev   export   records   quit");
}

/// Remove `--config <file>` from the arguments and load it.
fn take_config(args: &mut Vec<String>) -> Result<Config> {
    match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .cloned()
                .context("--config needs a file path")?;
            args.drain(i..=i + 1);
            Config::load(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Split `Median Blur ksize=5` into a filter spec. Words with `=` are
/// parameters; the rest form the filter name.
fn parse_filter_words(words: &[&str]) -> FilterSpec {
    let mut name: Vec<&str> = Vec::new();
    let mut spec = FilterSpec::new("");
    for &word in words {
        match word.split_once('=') {
            Some((key, value)) => spec = spec.with_param(key, value),
            None => name.push(word),
        }
    }
    spec.name = if name.is_empty() { "None".to_string() } else { name.join(" ") };
    spec
}

fn list_filters(query: &str) {
    let registry = FilterRegistry::with_builtins();
    if !query.is_empty() {
        let found = registry.search(query);
        println!("Filters matching '{}' ({} found):", query, found.len());
        for name in found {
            if let Some(metadata) = registry.get_metadata(name) {
                println!("  • {} [{}] - {}", metadata.name, metadata.category, metadata.description);
            }
        }
        return;
    }

    println!("Available filters ({} total):", registry.len());
    println!();

    for (category, filters) in registry.grouped_by_category() {
        println!("  📁 {}", category);
        for metadata in filters {
            println!("      • {} - {}", metadata.name, metadata.description);
        }
        println!();
    }
}

fn filter_info(name: &str) -> Result<()> {
    let registry = FilterRegistry::with_builtins();
    let metadata = registry
        .get_metadata(name)
        .with_context(|| format!("Filter not found: {} (use 'filters' to list them)", name))?;

    println!("Filter: {}", metadata.name);
    println!("Category: {}", metadata.category);
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    if metadata.fixed_parameters {
        println!("Parameters: fixed (caller values are ignored)");
    } else if !metadata.parameters.is_empty() {
        println!("Parameters:");
        for param in &metadata.parameters {
            let range = param
                .range
                .map(|(min, max)| format!(" in {}..={}", min, max))
                .unwrap_or_default();
            let odd = if param.odd { ", odd" } else { "" };
            println!("  • {} [{}{}{}] = {}", param.name, param.kind, range, odd, param.default_value);
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
    }
    Ok(())
}

fn run_chain(input: &str, output: &str, chain: &ComposedTransform) -> Result<()> {
    let image = image::open(input).with_context(|| format!("Failed to load {}", input))?;
    let result = chain.run(&image);
    result
        .save(output)
        .with_context(|| format!("Failed to save {}", output))?;
    println!("🎉 Image saved to: {}", output);
    Ok(())
}

fn apply_filter(input: &str, output: &str, words: &[String]) -> Result<()> {
    let registry = FilterRegistry::with_builtins();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let spec = parse_filter_words(&words);
    if !registry.contains(&spec.name) {
        warn!("Unknown filter '{}', output will equal input", spec.name);
    }
    println!("⚙️  {} -> {} ({})", input, output, spec.name);
    run_chain(input, output, &PipelineComposer::new(&registry).single(&spec))
}

fn apply_pipeline(input: &str, output: &str, steps_file: &str) -> Result<()> {
    let body = std::fs::read_to_string(steps_file)
        .with_context(|| format!("Failed to read {}", steps_file))?;
    let pipeline = parse_pipeline_body(&body)?;
    let registry = FilterRegistry::with_builtins();
    println!("⚙️  {} -> {} ({} steps)", input, output, pipeline.len());
    run_chain(input, output, &PipelineComposer::new(&registry).compose(&pipeline))
}

// ============================================================================
// Interactive session
// ============================================================================

fn collect_payloads(paths: &[&str]) -> Vec<UploadPayload> {
    let mut files: Vec<PathBuf> = Vec::new();
    for path in paths.iter().map(Path::new) {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.to_path_buf());
        }
    }

    files
        .iter()
        .filter_map(|path| match UploadPayload::from_path(path) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn handle_line(coordinator: &SessionCoordinator, session: SessionId, line: &str) -> Option<ApiResponse> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let words: Vec<&str> = rest.split_whitespace().collect();
    debug!("Session command: {}", command);

    let response = match command {
        "" => return None,
        "upload" => {
            let payloads = collect_payloads(&words);
            ApiResponse::from_result(coordinator.upload(session, &payloads), "Files uploaded successfully.")
        }
        "current" => ApiResponse::from_result(coordinator.current_image(session), "Current image."),
        "preview" => ApiResponse::from_result(
            coordinator.preview_single(session, &parse_filter_words(&words)),
            "Preview generated.",
        ),
        "pipeline" => ApiResponse::from_result(
            coordinator.preview_pipeline_json(session, rest),
            "Pipeline preview generated.",
        ),
        "confirm" => ApiResponse::from_result(coordinator.confirm(session), "Image confirmed."),
        "next" => ApiResponse::from_result(coordinator.next(session), "Moved to next image."),
        "prev" => ApiResponse::from_result(coordinator.prev(session), "Moved to previous image."),
        "export" => ApiResponse::from_result(coordinator.export(session), "Images exported."),
        "records" => ApiResponse::from_result(coordinator.records(session), "Session records."),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Commands: upload current preview pipeline confirm next prev export records quit");
            return None;
        }
    };
    Some(response)
}

fn run_session(config: Config) -> Result<()> {
    let store = FsImageStore::new(config).context("Failed to prepare image directories")?;
    println!(
        "📂 uploads: {}  exports: {}",
        store.upload_dir().display(),
        store.output_dir().display()
    );
    let coordinator = SessionCoordinator::with_builtins(Arc::new(store));
    let session = coordinator.open_session();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        if let Some(response) = handle_line(&coordinator, session, &line) {
            writeln!(stdout, "{}", response.to_json())?;
            stdout.flush()?;
        }
    }

    coordinator.close_session(session);
    Ok(())
}

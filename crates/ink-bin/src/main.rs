//! Inkstone entrypoint: style analysis over a file or a stored snapshot.

use anyhow::{Context, Result};
use clap::Parser;
use core_edit::newline::normalize_newlines;
use core_ranges::PastedRangeSet;
use core_rules::{Match, annotate, rules};
use core_session::{JsonFileStore, Session, SnapshotStore};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Once;
use std::time::Instant;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "inkstone", version, about = "Prose style analysis")]
struct Args {
    /// Text file to analyze (stdin when omitted).
    pub path: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `inkstone.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Stored session snapshot (JSON `{text, pasted_ranges}`); analyzes its
    /// text and marks findings inside pasted spans.
    #[arg(long = "snapshot", conflicts_with = "path")]
    pub snapshot: Option<PathBuf>,
    /// Emit findings as JSON instead of the text report.
    #[arg(long = "json")]
    pub json: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", "inkstone.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; drop the guard so the writer
        // shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Resolve the text to analyze and any paste provenance that travels with it.
fn load_input(args: &Args, config: core_config::Config) -> Result<(String, PastedRangeSet, String)> {
    if let Some(snap_path) = &args.snapshot {
        let store = JsonFileStore::new(snap_path.clone());
        let snapshot = store
            .load()
            .with_context(|| format!("reading snapshot {}", snap_path.display()))?
            .with_context(|| format!("snapshot {} is empty", snap_path.display()))?;
        let session = Session::from_snapshot(config, snapshot, Instant::now());
        let name = snap_path.display().to_string();
        debug!(target: "io", file = %name, text_len = session.text().len(), "snapshot_loaded");
        return Ok((
            session.text().to_string(),
            session.pasted_spans().clone(),
            name,
        ));
    }

    let (raw, name) = match &args.path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            (content, path.display().to_string())
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            (buf, "<stdin>".to_string())
        }
    };
    let norm = normalize_newlines(&raw);
    debug!(target: "io", file = %name, size_bytes = norm.text.len(), mixed = norm.mixed, "file_read_ok");
    Ok((norm.text, PastedRangeSet::new(), name))
}

/// 1-based line and column (bytes from line start) of an offset.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let prefix = &text.as_bytes()[..offset.min(text.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, offset - line_start + 1)
}

fn in_pasted(pasted: &PastedRangeSet, m: &Match<'_>) -> bool {
    pasted
        .iter()
        .any(|r| m.start < r.end && m.end > r.start)
}

fn print_report(text: &str, findings: &[Match<'_>], pasted: &PastedRangeSet, name: &str) {
    println!(
        "inkstone: {} finding{} in {}",
        findings.len(),
        if findings.len() == 1 { "" } else { "s" },
        name
    );
    for m in findings {
        let (line, col) = line_col(text, m.start);
        let excerpt: String = text[m.start..m.end].chars().take(40).collect();
        let pasted_mark = if in_pasted(pasted, m) { "  [pasted]" } else { "" };
        println!(
            "  {line}:{col}\t{}\t{}\t{:?}{pasted_mark}",
            m.rule.id, m.rule.label, excerpt
        );
    }
}

fn print_json(text: &str, findings: &[Match<'_>], pasted: &PastedRangeSet) -> Result<()> {
    let entries: Vec<serde_json::Value> = findings
        .iter()
        .map(|m| {
            let (line, col) = line_col(text, m.start);
            serde_json::json!({
                "start": m.start,
                "end": m.end,
                "line": line,
                "col": col,
                "rule": m.rule.id,
                "label": m.rule.label,
                "style": m.rule.style.class_name(),
                "pasted": in_pasted(pasted, m),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();

    let config = core_config::load_from(args.config.clone())?;
    let (text, pasted, name) = load_input(&args, config)?;
    let findings = annotate(&text, rules());
    info!(
        target: "runtime",
        file = %name,
        text_len = text.len(),
        findings = findings.len(),
        pasted_spans = pasted.len(),
        "analysis_complete"
    );

    if args.json {
        print_json(&text, &findings, &pasted)?;
    } else {
        print_report(&text, &findings, &pasted, &name);
    }
    Ok(())
}

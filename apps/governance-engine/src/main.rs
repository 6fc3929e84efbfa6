//! Governance Engine Binary
//!
//! Runs the Thesis governance engine.
//!
//! # Usage
//!
//! ```bash
//! governance-engine run                 # load config, run the monitor
//! governance-engine pool                # build and print the pool
//! governance-engine gate --alpha-path src/alpha [--constraints config/constraints.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `GOVERNANCE_CONFIG_DIR`: config directory (default: `config`)
//! - `RUST_LOG`: log level (default: `info`)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast;

use governance_engine::gate;
use governance_engine::telemetry::init_telemetry;
use governance_engine::GovernanceEngine;

fn config_dir() -> PathBuf {
    std::env::var("GOVERNANCE_CONFIG_DIR")
        .map_or_else(|_| PathBuf::from("config"), PathBuf::from)
}

fn main() -> ExitCode {
    init_telemetry();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map_or("run", String::as_str);

    let result = match command {
        "run" => run_engine(),
        "pool" => print_pool(),
        "gate" => return run_gate(&args[1..]),
        other => Err(anyhow::anyhow!(
            "unknown command '{other}' (expected run, pool, or gate)"
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Fatal");
            ExitCode::FAILURE
        }
    }
}

/// Load the engine and run the falsifier monitor until ctrl-c.
fn run_engine() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(async {
        let dir = config_dir();
        let engine = GovernanceEngine::from_config_dir(&dir)
            .with_context(|| format!("failed to load config from {}", dir.display()))?;

        let pool = engine.build_pool().context("initial pool build failed")?;
        tracing::info!(version = %pool.version, members = pool.len(), "Initial pool ready");

        let (shutdown_tx, _) = broadcast::channel(1);
        let monitor_handle = engine.spawn_monitor(shutdown_tx.subscribe());

        signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
        let _ = monitor_handle.await;
        Ok(())
    })
}

/// Build the pool once and print it as JSON.
fn print_pool() -> anyhow::Result<()> {
    let dir = config_dir();
    let engine = GovernanceEngine::from_config_dir(&dir)
        .with_context(|| format!("failed to load config from {}", dir.display()))?;
    let pool = engine.build_pool().context("pool build failed")?;
    let rendered = serde_json::to_string_pretty(pool.as_ref()).context("serialize pool")?;
    println!("{rendered}");
    Ok(())
}

/// Run the isolation gate checks. Exit code 1 on any violation.
fn run_gate(args: &[String]) -> ExitCode {
    let mut alpha_paths: Vec<PathBuf> = Vec::new();
    let mut constraints_files: Vec<PathBuf> = Vec::new();
    let mut forbidden: Vec<String> = gate::DEFAULT_FORBIDDEN_MODULES
        .iter()
        .map(|s| (*s).to_string())
        .collect();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--alpha-path" => match iter.next() {
                Some(value) => alpha_paths.push(PathBuf::from(value)),
                None => return usage_error("--alpha-path requires a value"),
            },
            "--constraints" => match iter.next() {
                Some(value) => constraints_files.push(PathBuf::from(value)),
                None => return usage_error("--constraints requires a value"),
            },
            "--forbid" => match iter.next() {
                Some(value) => forbidden.push(value.clone()),
                None => return usage_error("--forbid requires a value"),
            },
            other => return usage_error(&format!("unknown gate option '{other}'")),
        }
    }

    if alpha_paths.is_empty() && constraints_files.is_empty() {
        return usage_error("gate needs at least one --alpha-path or --constraints");
    }

    let mut report = gate::GateReport::default();
    for path in &alpha_paths {
        match gate::scan_tree(path, &forbidden) {
            Ok(partial) => report.merge(partial),
            Err(e) => {
                eprintln!("gate error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    for file in &constraints_files {
        match gate::validate_constraints_file(file) {
            Ok(partial) => report.merge(partial),
            Err(e) => {
                eprintln!("gate error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if report.passed() {
        println!("isolation gate: PASS");
        ExitCode::SUCCESS
    } else {
        eprintln!("isolation gate: FAIL ({} violations)", report.violations.len());
        for violation in &report.violations {
            eprintln!("  {violation}");
        }
        ExitCode::FAILURE
    }
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("usage: governance-engine gate [--alpha-path DIR]... [--constraints FILE]... [--forbid NAME]...");
    eprintln!("error: {message}");
    ExitCode::FAILURE
}

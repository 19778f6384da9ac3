use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use ubl_host::{Host, HostConfig, Response, SIGNATURES};
use ubl_store::{DurableStateStore, WriteOp};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Invoke(args) => cmd_invoke(&config, cli.format, args),
        Command::Functions => cmd_functions(cli.format),
        Command::History(args) => cmd_history(&config, cli.format, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HostConfig> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if let Some(state) = &cli.state {
        config.state_dir = Some(state.clone());
    }
    Ok(config)
}

fn cmd_invoke(config: &HostConfig, format: OutputFormat, args: InvokeArgs) -> anyhow::Result<ExitCode> {
    let host = Host::open(config).context("cannot open state store")?;
    let response = host.invoke(&args.function, args.args.as_slice());
    match format {
        OutputFormat::Json => println!("{}", response.to_json()),
        OutputFormat::Text => print_response(&args.function, &response)?,
    }
    Ok(if response.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_response(function: &str, response: &Response) -> anyhow::Result<()> {
    match &response.error {
        None => {
            println!("{} {}  {}", "✓".green().bold(), function.bold(), response.invocation.to_string().dimmed());
            let payload = response.payload();
            if !payload.is_null() {
                println!("{}", serde_json::to_string_pretty(payload)?);
            }
        }
        Some(err) => {
            let code = serde_json::to_value(err.code)?;
            println!(
                "{} {}  {}",
                "✗".red().bold(),
                function.bold(),
                response.invocation.to_string().dimmed()
            );
            println!("  {}: {}", code.as_str().unwrap_or_default().red(), err.message);
        }
    }
    Ok(())
}

fn cmd_functions(format: OutputFormat) -> anyhow::Result<ExitCode> {
    match format {
        OutputFormat::Json => {
            let list: Vec<_> = SIGNATURES
                .iter()
                .map(|s| json!({ "name": s.name, "aliases": s.aliases, "params": s.params, "writes": s.writes }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Text => {
            for sig in SIGNATURES {
                let mode = if sig.writes { "write".yellow() } else { "read".cyan() };
                print!("{:<26} {:<5}  ({})", sig.name.bold(), mode, sig.params.join(", "));
                if !sig.aliases.is_empty() {
                    print!("  {} {}", "alias".dimmed(), sig.aliases.join(", "));
                }
                println!();
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_history(config: &HostConfig, format: OutputFormat, args: HistoryArgs) -> anyhow::Result<ExitCode> {
    let dir = config
        .state_dir
        .as_deref()
        .context("history needs a state directory (--state or state_dir)")?;
    let records = DurableStateStore::read_history(dir)
        .with_context(|| format!("cannot read commit log in {}", dir.display()))?;
    let shown = &records[records.len().saturating_sub(args.limit)..];

    match format {
        OutputFormat::Json => {
            let list: Vec<_> = shown
                .iter()
                .map(|r| {
                    json!({
                        "height": r.height,
                        "invocation": r.invocation,
                        "committed_at": r.committed_at,
                        "writes": r.writes.iter().map(|w| match w {
                            WriteOp::Put { key, .. } => json!({ "op": "put", "key": key }),
                            WriteOp::Delete { key } => json!({ "op": "delete", "key": key }),
                        }).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        OutputFormat::Text => {
            if shown.is_empty() {
                println!("No commits.");
            }
            for record in shown.iter().rev() {
                println!(
                    "{}  {}  {}",
                    format!("#{}", record.height).yellow().bold(),
                    record.invocation.to_string().dimmed(),
                    record.committed_at.to_rfc3339()
                );
                for write in &record.writes {
                    match write {
                        WriteOp::Put { key, .. } => println!("  {} {}", "put".green(), key),
                        WriteOp::Delete { key } => println!("  {} {}", "del".red(), key),
                    }
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

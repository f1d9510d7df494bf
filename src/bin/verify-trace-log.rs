use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgGroup, Command};
use std::path::Path;
use tracing::{error, info};

use governance_evidence::audit::{verify_entries, ChainVerification, TraceLog};
use governance_evidence::database::OperationalStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("verify-trace-log")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify the hash chain of a governance trace log or audit table")
        .arg(
            Arg::new("log-path")
                .short('l')
                .long("log-path")
                .value_name("PATH")
                .help("Path to a JSONL trace log"),
        )
        .arg(
            Arg::new("database-url")
                .short('d')
                .long("database-url")
                .value_name("URL")
                .help("SQLite URL whose audit_events table should be verified"),
        )
        .group(
            ArgGroup::new("source")
                .args(["log-path", "database-url"])
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Suppress output except errors"),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let quiet = matches.get_flag("quiet");

    // Set log level based on flags
    let level = if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let verification = match (
        matches.get_one::<String>("log-path"),
        matches.get_one::<String>("database-url"),
    ) {
        (Some(log_path), _) => verify_trace_file(log_path, verbose).await,
        (None, Some(database_url)) => verify_audit_table(database_url, verbose).await,
        (None, None) => Err(anyhow!("Either --log-path or --database-url is required")),
    };

    let verification = match verification {
        Ok(verification) => verification,
        Err(e) => {
            error!("Verification failed: {}", e);
            std::process::exit(1);
        }
    };

    if !quiet {
        println!("{}", verification.summary());
        if !verification.last_hash.is_empty() {
            println!("  Head hash: {}", verification.last_hash);
        }
    }

    if !verification.valid {
        for violation in &verification.errors {
            eprintln!("  ✗ {}", violation);
        }
        std::process::exit(1);
    }

    if !quiet {
        println!("✓ Hash chain verification completed successfully");
    }

    Ok(())
}

async fn verify_trace_file(log_path: &str, verbose: bool) -> Result<ChainVerification> {
    info!("Verifying trace log: {}", log_path);

    let path = Path::new(log_path);
    if !path.exists() {
        return Err(anyhow!("Trace log file not found: {}", log_path));
    }

    let log = TraceLog::try_load(path).await?;
    if verbose {
        println!(
            "Loaded {} trace lines ({} malformed)",
            log.lines.len(),
            log.malformed_count()
        );
    }

    Ok(verify_entries(&log.lines))
}

async fn verify_audit_table(database_url: &str, verbose: bool) -> Result<ChainVerification> {
    info!("Verifying audit table: {}", database_url);

    let store = OperationalStore::connect(database_url, "").await;
    if !store.is_connected() {
        return Err(anyhow!("Could not open database: {}", database_url));
    }

    let mut events = store.try_list_audit_events().await?;
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    if verbose {
        println!("Loaded {} audit events", events.len());
        let escalations = events.iter().filter(|e| e.is_escalation()).count();
        println!("  Escalations: {}", escalations);
    }

    Ok(verify_entries(&events))
}

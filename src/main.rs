//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geoip2_vars` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Printing resolved variables
//!
//! All lookup and refresh functionality is implemented in the library crate.

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use geoip2_vars::initialization::init_logger_with;
use geoip2_vars::{
    init_geoip, shutdown_gracefully, GeoIpService, HttpFetcher, Opt, OutputFormat,
    RefreshManager, VariableSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting MAXMIND_LICENSE_KEY in .env without exporting it manually
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = opt.to_config();
    let service = init_geoip(&config)
        .await
        .context("Failed to initialize geoip databases")?;
    for metadata in service.metadata() {
        log::info!(
            "Serving {} ({}, {}, {})",
            metadata.edition,
            metadata.family,
            metadata.database_type,
            metadata.version
        );
    }

    let fetcher = HttpFetcher::new(&config).context("Failed to set up database downloads")?;
    let manager = RefreshManager::new(config.clone(), Arc::clone(&service), Arc::new(fetcher));

    let refresh = if opt.watch {
        Some(manager.spawn(CancellationToken::new()))
    } else {
        if config.has_credentials() {
            // One-shot mode: update before answering so the output reflects fresh data
            match manager.refresh_once().await {
                Ok(report) => {
                    for (edition, reason) in &report.failed {
                        log::warn!("Keeping existing {} database: {}", edition, reason);
                    }
                }
                Err(e) => log::warn!("Skipping geoip refresh: {}", e),
            }
        }
        None
    };

    if opt.ips.is_empty() {
        resolve_stdin(&service, opt.output).await?;
    } else {
        for ip in &opt.ips {
            print_variables(&service, Some(*ip), opt.output)?;
        }
    }

    if opt.watch {
        log::info!("Watching for database updates, press Ctrl-C to stop");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
    }

    shutdown_gracefully(refresh, service).await;
    Ok(())
}

/// Resolves one address per stdin line until EOF.
async fn resolve_stdin(service: &GeoIpService, output: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.parse::<IpAddr>() {
            Ok(ip) => print_variables(service, Some(ip), output)?,
            Err(e) => log::warn!("Skipping {:?}: {}", trimmed, e),
        }
    }
    Ok(())
}

fn print_variables(service: &GeoIpService, ip: Option<IpAddr>, output: OutputFormat) -> Result<()> {
    let mut sink = VariableSink::new();
    service.resolve(ip, &mut sink);
    match output {
        OutputFormat::Json => {
            let rendered = serde_json::to_string(&sink).context("Failed to serialize variables")?;
            println!("{}", rendered);
        }
        OutputFormat::Plain => {
            for (key, value) in sink.iter() {
                println!("{} = {}", key, value);
            }
            println!();
        }
    }
    Ok(())
}

// Copyright 2025 Memsynth (https://github.com/memsynth)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Memsynth CLI
//!
//! Command-line interface for synthesizing session memory records.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memsynth_core::{PipelineConfig, SessionPayload};
use memsynth_memory::{FixedSpecFolder, SessionCollector};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "memsynth")]
#[command(about = "Memsynth - session memory synthesis", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root used for path normalization and related docs
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a session record from a JSON payload
    Synthesize {
        /// Payload file, or "-" for stdin. Omit for a simulated record.
        payload: Option<PathBuf>,

        /// Spec folder to use when the payload names none
        #[arg(long)]
        spec_folder: Option<String>,

        /// Write the record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective pipeline configuration
    Config,
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = &cli.project_root {
        config = config.with_project_root(root);
    }
    Ok(config)
}

fn read_payload_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload from {}", path.display()))
    }
}

/// Decode the payload; a malformed payload degrades to the simulated record.
fn parse_payload(text: &str) -> Option<SessionPayload> {
    match SessionPayload::from_json(text) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(error = %e, "payload could not be decoded, using simulated record");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Synthesize {
            payload,
            spec_folder,
            output,
            pretty,
        } => {
            let payload = match payload {
                Some(path) => parse_payload(&read_payload_text(path)?),
                None => None,
            };

            let mut collector = SessionCollector::new(config);
            if let Some(folder) = spec_folder {
                collector = collector.with_resolver(Arc::new(FixedSpecFolder(folder.clone())));
            }
            let record = collector.collect(payload.as_ref()).await;

            let json = record.to_json();
            let rendered = if *pretty {
                serde_json::to_string_pretty(&json)?
            } else {
                serde_json::to_string(&json)?
            };

            match output {
                Some(path) => {
                    std::fs::write(path, rendered)
                        .with_context(|| format!("Failed to write record to {}", path.display()))?;
                    info!(path = %path.display(), title = %record.title, "wrote session record");
                }
                None => println!("{}", rendered),
            }
        }
    }

    Ok(())
}

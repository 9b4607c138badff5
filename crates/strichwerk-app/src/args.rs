// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface for `strichwerk`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "strichwerk", version, about = "Render barcode batches and print them", long_about = None)]
pub struct Cli {
    /// Directory holding config.json and the print spool
    #[arg(long, env = "STRICHWERK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a barcode batch into a container file
    Render(RenderArgs),
    /// Print an existing container file
    Print(PrintArgs),
    /// Fetch a dashboard envelope and show its data
    Dashboard(DashboardArgs),
    /// Show or initialise the configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Value to encode
    #[arg(long, conflicts_with = "markup")]
    pub barcode: Option<String>,

    /// Output format requested from the fragment endpoint
    #[arg(long)]
    pub format: Option<String>,

    /// Number of copies; read leniently ("3.7" renders 3)
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: Option<String>,

    /// Read data-barcode/data-format/data-quantity from a host markup file
    #[arg(long)]
    pub markup: Option<PathBuf>,

    /// Container file to write (defaults to batch.html in the data dir)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the batch once it has rendered
    #[arg(long)]
    pub print: bool,

    /// Fragment endpoint override
    #[arg(long, env = "STRICHWERK_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(flatten)]
    pub print_opts: PrintOptions,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Container file produced by `strichwerk render`
    #[arg(long)]
    pub container: PathBuf,

    #[command(flatten)]
    pub print_opts: PrintOptions,
}

/// Per-invocation overrides for the print gate.
#[derive(Args, Debug, Default, Clone)]
pub struct PrintOptions {
    /// Stop waiting for images after this many milliseconds
    #[arg(long)]
    pub settle_timeout_ms: Option<u64>,

    /// Spool directory override
    #[arg(long)]
    pub spool_dir: Option<PathBuf>,

    /// Base URL for relative image sources
    #[arg(long)]
    pub image_base: Option<String>,
}

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Endpoint path relative to the dashboard base, e.g. api/kpi
    pub path: String,

    /// Dashboard base URL override
    #[arg(long, env = "STRICHWERK_DASHBOARD")]
    pub base: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config.json
        #[arg(long)]
        force: bool,
    },
}

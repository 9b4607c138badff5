// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command handlers.  Each one wires the library crates together for a
// single invocation and returns a value; `run` decides how to show it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use strichwerk_core::config::{self, CONFIG_FILE};
use strichwerk_core::error::{Result, StrichwerkError};
use strichwerk_core::types::RenderAttributes;
use strichwerk_core::AppConfig;
use strichwerk_fetch::{DashboardClient, Envelope, HttpFragmentSource, ImageFetcher};
use strichwerk_print::{
    HttpResourceLoader, PrintCommand, PrintGate, PrintReport, PrintSurface, SpoolPrinter,
    SystemPrintCommand, contains_batch,
};
use strichwerk_render::{FileHost, RenderController, RenderOutcome};

use crate::args::{
    Cli, Commands, ConfigAction, DashboardArgs, PrintArgs, PrintOptions, RenderArgs,
};

/// Container file written by `render` when `--out` is not given.
pub const DEFAULT_CONTAINER_FILE: &str = "batch.html";

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    data_dir: PathBuf,
    config: AppConfig,
}

impl Context {
    pub fn new(data_dir: PathBuf, config: AppConfig) -> Self {
        Self { data_dir, config }
    }

    /// Load `config.json` from `data_dir`, or from the platform data
    /// directory when none is given.
    pub fn load(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.unwrap_or_else(config::data_dir);
        let config = AppConfig::load_or_default(&data_dir);
        Self::new(data_dir, config)
    }

    /// Build a print gate from config plus per-invocation overrides.
    /// Relative image sources resolve against `image_base`.
    fn print_gate(&self, opts: &PrintOptions, image_base: &str) -> Result<PrintGate> {
        let base = opts.image_base.as_deref().unwrap_or(image_base);
        let loader = HttpResourceLoader::new(Some(base), self.config.fetch_timeout())?;

        let command: Arc<dyn PrintCommand> = match &self.config.print_command {
            Some(argv) => Arc::new(SystemPrintCommand::from_argv(argv)?),
            None => {
                let dir = opts
                    .spool_dir
                    .clone()
                    .unwrap_or_else(|| self.config.spool_dir(&self.data_dir));
                Arc::new(SpoolPrinter::new(dir))
            }
        };

        let settle_timeout = opts
            .settle_timeout_ms
            .map(Duration::from_millis)
            .or_else(|| self.config.settle_timeout());
        Ok(PrintGate::new(Arc::new(loader), command).with_settle_timeout(settle_timeout))
    }
}

/// Result of `strichwerk render`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub outcome: RenderOutcome,
    pub out: PathBuf,
    pub printed: Option<PrintReport>,
}

/// Dispatch a parsed command line and report its result on stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.data_dir);

    match cli.command {
        Commands::Render(args) => {
            ctx.config.validate()?;
            let summary = render(&ctx, args).await?;
            if let RenderOutcome::Committed { slots, failed, .. } = summary.outcome {
                println!(
                    "{}: {slots} barcode(s), {failed} unavailable",
                    summary.out.display()
                );
            }
            if let Some(report) = summary.printed {
                print_report(&report);
            }
        }
        Commands::Print(args) => {
            ctx.config.validate()?;
            let report = print(&ctx, args).await?;
            print_report(&report);
        }
        Commands::Dashboard(args) => {
            let data = dashboard(&ctx, args).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Config(args) => {
            println!("{}", config_command(&ctx, args.action)?);
        }
    }
    Ok(())
}

fn print_report(report: &PrintReport) {
    println!(
        "printed {} ({} image(s): {} loaded, {} failed{})",
        report.surface_id,
        report.images,
        report.loaded,
        report.failed,
        if report.timed_out { ", timed out" } else { "" }
    );
}

/// Render one batch into a file host, then print it when asked to.
#[instrument(skip(ctx, args), fields(print = args.print))]
pub async fn render(ctx: &Context, args: RenderArgs) -> Result<RenderSummary> {
    let mut attrs = match &args.markup {
        Some(path) => RenderAttributes::from_markup(&std::fs::read_to_string(path)?)?,
        None => RenderAttributes {
            barcode: args.barcode.clone(),
            ..Default::default()
        },
    };
    if args.format.is_some() {
        attrs.format = args.format.clone();
    }
    if args.quantity.is_some() {
        attrs.quantity = args.quantity.clone();
    }

    let endpoint = args
        .endpoint
        .as_deref()
        .unwrap_or(&ctx.config.fragment_endpoint);
    let source = HttpFragmentSource::new(endpoint, ctx.config.fetch_timeout())?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| ctx.data_dir.join(DEFAULT_CONTAINER_FILE));
    let host = Arc::new(FileHost::new(&out));
    let controller = RenderController::new(
        ImageFetcher::new(Arc::new(source)),
        host.clone(),
        ctx.config.render_defaults(),
    );

    let outcome = controller.render_attributes(&attrs).await?;

    let printed = match outcome {
        RenderOutcome::Committed { .. } if args.print => {
            let gate = ctx.print_gate(&args.print_opts, endpoint)?;
            Some(gate.print_host(host.as_ref()).await?)
        }
        _ => None,
    };

    Ok(RenderSummary {
        outcome,
        out,
        printed,
    })
}

/// Print a container file written by an earlier render.
#[instrument(skip(ctx, args), fields(container = %args.container.display()))]
pub async fn print(ctx: &Context, args: PrintArgs) -> Result<PrintReport> {
    let container = std::fs::read_to_string(&args.container)?;
    // A host showing an input-error notice has no batch to print.
    if !contains_batch(&container)? {
        return Err(StrichwerkError::NothingToPrint);
    }
    let gate = ctx.print_gate(&args.print_opts, &ctx.config.fragment_endpoint)?;
    gate.print(PrintSurface::open(&container)?).await
}

/// Fetch `path` from the dashboard and unwrap its envelope.
#[instrument(skip(ctx, args), fields(path = %args.path))]
pub async fn dashboard(ctx: &Context, args: DashboardArgs) -> Result<serde_json::Value> {
    let base = args
        .base
        .as_deref()
        .or(ctx.config.dashboard_base.as_deref())
        .ok_or_else(|| StrichwerkError::Config("no dashboard base url configured".into()))?;
    let client = DashboardClient::new(base, ctx.config.fetch_timeout())?;
    let envelope: Envelope<serde_json::Value> = client.get_envelope(&args.path).await?;
    Ok(envelope.into_result()?.unwrap_or(serde_json::Value::Null))
}

pub fn config_command(ctx: &Context, action: ConfigAction) -> Result<String> {
    match action {
        ConfigAction::Show => Ok(serde_json::to_string_pretty(&ctx.config)?),
        ConfigAction::Init { force } => {
            let path = ctx.data_dir.join(CONFIG_FILE);
            if path.exists() && !force {
                return Err(StrichwerkError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            let written = AppConfig::default().persist(&ctx.data_dir)?;
            info!(path = %written.display(), "default config written");
            Ok(format!("wrote {}", written.display()))
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use speedwatch_client::{
    filter_blacklist, ApiError, DashboardClient, EmailConfig, UploadSession,
};
use speedwatch_core::{JobStatus, SelectionOrigin};
use speedwatch_logging::{watch_debug, watch_info};
use tokio::runtime::Handle;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILENAME};
use crate::media::load_source_file;
use crate::report::{render_analytics, render_blacklist, render_presets, render_upload_success};

#[derive(Parser, Debug)]
#[command(name = "speedwatch")]
#[command(about = "Upload traffic videos and manage the speed detection backend")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config file. If omitted, uses ./speedwatch.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend origin, e.g. http://localhost:5000.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a video and wait for the processed result.
    Upload {
        file: PathBuf,
        /// Media type to send instead of guessing from the extension.
        #[arg(long)]
        media_type: Option<String>,
    },
    /// Show traffic statistics.
    Stats {
        /// Print the legacy payload as JSON instead of the normalised summary.
        #[arg(long)]
        raw: bool,
    },
    /// Inspect or edit the plate blacklist.
    Blacklist {
        #[command(subcommand)]
        action: BlacklistCommand,
    },
    /// Set the over-speed threshold in km/h.
    Threshold {
        #[arg(required_unless_present = "presets", allow_negative_numbers = true)]
        kmh: Option<f64>,
        /// List the common presets instead.
        #[arg(long, conflicts_with = "kmh")]
        presets: bool,
    },
    /// Configure alert email delivery.
    EmailConfig {
        #[arg(long)]
        sender: String,
        #[arg(long, env = "SPEEDWATCH_SENDER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        receiver: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlacklistCommand {
    List {
        /// Only show entries whose plate or reason contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        plate: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    Remove {
        plate: String,
    },
}

/// Runs one command. Logging is set up before any error is returned, so the
/// caller can report failures through the logger alone.
pub fn dispatch(args: Args) -> Result<()> {
    let (cfg, load_error) = effective_config(&args);
    init_logging(&cfg);
    if let Some(err) = load_error {
        return Err(err);
    }
    watch_debug!("effective config: {:?}", cfg);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(run(&cfg, args.cmd))
}

/// File config with command-line overrides applied. A config file that
/// cannot be loaded is returned as an error next to the defaults (plus
/// overrides), which are still good enough to set up logging.
pub fn effective_config(args: &Args) -> (AppConfig, Option<anyhow::Error>) {
    let cfg_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let (mut cfg, load_error) = match AppConfig::load(&cfg_path) {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    apply_overrides(&mut cfg, args);
    (cfg, load_error)
}

pub fn apply_overrides(cfg: &mut AppConfig, args: &Args) {
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(level) = &args.log_level {
        cfg.log_level = level.clone();
    }
    if let Some(log_file) = &args.log_file {
        cfg.log_file = Some(log_file.clone());
    }
}

fn init_logging(cfg: &AppConfig) {
    let log_file = cfg.log_file.as_deref().unwrap_or(Path::new(""));
    speedwatch_logging::initialize(cfg.log_destination(), cfg.level_filter(), log_file);
}

async fn run(cfg: &AppConfig, cmd: Command) -> Result<()> {
    let client = DashboardClient::new(&cfg.client_settings())
        .with_context(|| format!("connect to {}", cfg.base_url))?;

    match cmd {
        Command::Upload { file, media_type } => upload(client, &file, media_type.as_deref()).await,
        Command::Stats { raw } => stats(&client, raw).await,
        Command::Blacklist { action } => blacklist(&client, action).await,
        Command::Threshold { kmh, .. } => match kmh {
            Some(kmh) => {
                client
                    .set_threshold(kmh)
                    .await
                    .map_err(|err| user_error(err, "Failed to update speed threshold"))?;
                println!("Speed threshold set to {kmh} km/h");
                Ok(())
            }
            None => {
                print!("{}", render_presets());
                Ok(())
            }
        },
        Command::EmailConfig {
            sender,
            password,
            receiver,
        } => {
            let config = EmailConfig {
                sender_email: sender,
                sender_password: password,
                receiver_email: receiver,
            };
            client
                .set_email_config(&config)
                .await
                .map_err(|err| user_error(err, "Failed to update email configuration"))?;
            println!("Email alerts will be sent to {}", config.receiver_email.trim());
            Ok(())
        }
    }
}

async fn upload(client: DashboardClient, path: &Path, media_type: Option<&str>) -> Result<()> {
    let file = load_source_file(path, media_type)?;
    let mut session = UploadSession::new(client, Handle::current());
    session
        .select_file(file, SelectionOrigin::Picker)
        .map_err(|err| anyhow!("{err}"))?;

    watch_info!("processing {}; this can take a while", path.display());
    match session.submit_and_wait().await {
        JobStatus::Completed => {
            let result_url = session.result_url();
            print!("{}", render_upload_success(&session.view(), result_url.as_ref()));
            Ok(())
        }
        JobStatus::Failed => {
            let message = session.view().error_message.unwrap_or_default();
            bail!("{message}")
        }
        other => bail!("upload ended in unexpected state {other:?}"),
    }
}

async fn stats(client: &DashboardClient, raw: bool) -> Result<()> {
    if raw {
        let stats = client
            .fetch_legacy_stats()
            .await
            .map_err(|err| user_error(err, "Failed to load statistics"))?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    let snapshot = client
        .fetch_analytics()
        .await
        .map_err(|err| user_error(err, "Failed to load statistics"))?;
    print!("{}", render_analytics(&snapshot));
    Ok(())
}

async fn blacklist(client: &DashboardClient, action: BlacklistCommand) -> Result<()> {
    match action {
        BlacklistCommand::List { search } => {
            let entries = client
                .fetch_blacklist()
                .await
                .map_err(|err| user_error(err, "Failed to load blacklist"))?;
            let shown = filter_blacklist(&entries, search.as_deref().unwrap_or(""));
            print!("{}", render_blacklist(&shown, entries.len()));
        }
        BlacklistCommand::Add { plate, reason } => {
            client
                .add_entry(&plate, &reason)
                .await
                .map_err(|err| user_error(err, "Failed to add to blacklist"))?;
            println!("Added {} to blacklist", plate.trim());
        }
        BlacklistCommand::Remove { plate } => {
            client
                .remove_entry(&plate)
                .await
                .map_err(|err| user_error(err, "Failed to remove from blacklist"))?;
            println!("Removed {} from blacklist", plate.trim());
        }
    }
    Ok(())
}

/// Collapses a client error into the one line shown to the operator.
fn user_error(err: ApiError, fallback: &str) -> anyhow::Error {
    watch_debug!("{fallback}: {err:?}");
    anyhow!(err.user_message(fallback))
}

//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use guidevault_core::EnrichmentPipeline;
use guidevault_extractor::{ExtractionProgress, run_extraction};
use guidevault_providers::{
    HttpAgentDirectory, HttpCampaignDirectory, HttpSessionProvider, HttpTemplateProvider,
};
use guidevault_shared::{AppConfig, GuideSubmission, init_config, load_config};
use guidevault_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// GuideVault — enrich and store guide answers.
#[derive(Parser)]
#[command(
    name = "guidevault",
    version,
    about = "Enrich completed guide submissions and maintain the question lookup table.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich one guide submission event and store the answer record.
    Enrich {
        /// Path to the invocation event JSON ("-" reads stdin).
        #[arg(long)]
        event: String,

        /// Echo the full enriched record instead of a minimal status map.
        #[arg(long)]
        respond: bool,
    },

    /// Extract question name/label pairs from guide templates.
    Extract {
        /// Template id(s) to process (can be repeated). Defaults to all.
        #[arg(long = "template")]
        templates: Vec<String>,
    },

    /// Delete answer records whose retention window has elapsed.
    Purge,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "guidevault=info",
        1 => "guidevault=debug",
        _ => "guidevault=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Enrich { event, respond } => cmd_enrich(&event, respond).await,
        Command::Extract { templates } => cmd_extract(templates).await,
        Command::Purge => cmd_purge().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_enrich(event: &str, respond: bool) -> Result<()> {
    let config = load_config()?;

    let raw = read_event(event)?;
    let parsed: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| eyre!("event is not valid JSON: {e}"))?;
    let mut submission = GuideSubmission::from_flow_event(&parsed)?;
    if respond {
        // The flag mirrors the guideAction discriminator carried in the event
        submission.action = Some("respond".to_string());
    }

    info!(
        session_id = %submission.session_id,
        answers = submission.answers.len(),
        "enriching submission"
    );

    let sessions = HttpSessionProvider::new(
        &config.providers.session_api_url,
        config.providers.timeout_secs,
    )?;
    let agents = HttpAgentDirectory::new(
        &config.providers.session_api_url,
        config.providers.timeout_secs,
    )?;
    let campaigns = HttpCampaignDirectory::new(
        &config.providers.campaign_api_url,
        config.providers.timeout_secs,
    )?;
    let storage = Storage::open(&config.stores).await?;

    let pipeline = EnrichmentPipeline {
        sessions: &sessions,
        agents: &agents,
        campaigns: &campaigns,
        storage: &storage,
        config: &config,
    };

    let response = pipeline.handle_submission(&submission).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.get("status").map(String::as_str) == Some("error") {
        return Err(eyre!(
            "enrichment failed: {}",
            response
                .get("error")
                .map(String::as_str)
                .unwrap_or("unknown error")
        ));
    }
    Ok(())
}

/// Read the event payload from a file or stdin.
fn read_event(event: &str) -> Result<String> {
    if event == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| eyre!("failed to read event from stdin: {e}"))?;
        Ok(buf)
    } else {
        let path = PathBuf::from(event);
        std::fs::read_to_string(&path)
            .map_err(|e| eyre!("failed to read event file '{}': {e}", path.display()))
    }
}

async fn cmd_extract(templates: Vec<String>) -> Result<()> {
    let config = load_config()?;
    let provider = HttpTemplateProvider::new(
        &config.providers.template_api_url,
        config.providers.timeout_secs,
    )?;
    let storage = Storage::open(&config.stores).await?;

    let template_ids = (!templates.is_empty()).then_some(templates);
    let reporter = CliProgress::new();

    let summary = run_extraction(&provider, &storage, &config, template_ids, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Extraction complete!");
    println!("  Questions written:   {}", summary.questions_written);
    println!("  Templates processed: {}", summary.templates_processed);
    println!("  Templates skipped:   {}", summary.templates_skipped);
    println!();

    Ok(())
}

async fn cmd_purge() -> Result<()> {
    let config = load_config()?;
    let storage = Storage::open(&config.stores).await?;

    let now = chrono::Utc::now().timestamp();
    let deleted = storage.purge_expired(now).await?;

    info!(deleted, "purged expired answer records");
    println!("Purged {deleted} expired record(s).");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Extraction progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ExtractionProgress for CliProgress {
    fn template_done(&self, template_id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Templates [{current}/{total}] {template_id}"));
    }
}

//! CLI command definitions, routing, and tracing setup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use sitegen_core::{ProgressReporter, ProvisionOptions, ProvisionOutcome, Provisioner};
use sitegen_remote::{CachedToken, StaticToken, TokenProvider};
use sitegen_shared::{
    Action, AppConfig, PageDescriptor, PageStatus, ProvisionStep, SiteRequest, SitegenError,
    StatusEvent, init_config, load_config, normalize_site_name,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sitegen: create, preview and publish sites from a starter template.
#[derive(Parser)]
#[command(
    name = "sitegen",
    version,
    about = "Provision a new site from a starter template and publish it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Access token. Overrides the token file and the `[auth] token_env`
    /// variable, which are otherwise tried in that order.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Maximum concurrent preview/publish requests.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

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
    /// Create a new site: copy, template, configure, preview, publish.
    Create {
        /// Site name. Normalized to a lowercase slug.
        #[arg(short, long)]
        name: String,

        /// Site description, substituted into the template.
        #[arg(short, long)]
        description: String,

        /// Code repository owner (defaults to config).
        #[arg(long)]
        github_owner: Option<String>,

        /// Code repository name (defaults to config).
        #[arg(long)]
        github_repo: Option<String>,

        /// Code repository URL (defaults to config).
        #[arg(long)]
        github_url: Option<String>,

        /// Skip the steps before this one (template, configure, preview, publish).
        #[arg(long)]
        resume_from: Option<ProvisionStep>,
    },

    /// List the pages of an existing site.
    Pages {
        /// Site name.
        site: String,
    },

    /// Preview every page of an existing site.
    Preview {
        /// Site name.
        site: String,
    },

    /// Publish every page of an existing site.
    Publish {
        /// Site name.
        site: String,
    },

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
        0 => "sitegen=info",
        1 => "sitegen=debug",
        _ => "sitegen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        token: cli.token,
        concurrency: cli.concurrency,
    };

    match cli.command {
        Command::Create {
            name,
            description,
            github_owner,
            github_repo,
            github_url,
            resume_from,
        } => {
            let form = CreateArgs {
                name,
                description,
                github_owner,
                github_repo,
                github_url,
                resume_from,
            };
            cmd_create(&overrides, form).await
        }
        Command::Pages { site } => cmd_pages(&overrides, &site).await,
        Command::Preview { site } => cmd_action(&overrides, &site, Action::Preview).await,
        Command::Publish { site } => cmd_action(&overrides, &site, Action::Publish).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Global flags that take precedence over the config file.
struct Overrides {
    token: Option<String>,
    concurrency: Option<usize>,
}

struct CreateArgs {
    name: String,
    description: String,
    github_owner: Option<String>,
    github_repo: Option<String>,
    github_url: Option<String>,
    resume_from: Option<ProvisionStep>,
}

/// Load config and build a provisioner with the CLI overrides applied.
fn provisioner(overrides: &Overrides) -> Result<(AppConfig, Provisioner)> {
    let config = load_config()?;

    let tokens: Arc<dyn TokenProvider> = match &overrides.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(CachedToken::from_config(&config.auth)),
    };

    let mut provisioner = Provisioner::from_config(&config, tokens)?;
    if let Some(n) = overrides.concurrency {
        provisioner = provisioner.with_concurrency(n);
    }
    Ok((config, provisioner))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_create(overrides: &Overrides, args: CreateArgs) -> Result<()> {
    let (config, provisioner) = provisioner(overrides)?;

    let request = SiteRequest::new(
        &args.name,
        &args.description,
        args.github_owner.as_deref(),
        args.github_repo.as_deref(),
        args.github_url.as_deref(),
        &config,
    )?;

    let options = args
        .resume_from
        .map(ProvisionOptions::resume_from)
        .unwrap_or_default();

    info!(
        site = %request.site_name,
        org = %provisioner.org(),
        resume_from = %options.resume_from,
        "creating site"
    );

    let reporter = CliProgress::new();
    let result = provisioner.provision(&request, options, &reporter).await;
    reporter.finish();

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            if let SitegenError::Step { step, .. } = &e {
                if step.is_retry_safe() {
                    eprintln!();
                    eprintln!("  The {step} step can be retried with: --resume-from {step}");
                }
            }
            Err(e.into())
        }
    }
}

fn print_outcome(outcome: &ProvisionOutcome) {
    println!();
    println!("  Site created successfully!");
    println!("  Site:        {}", outcome.site.site_name);
    println!("  Pages:       {}", outcome.pages.len());
    if !outcome.skipped.is_empty() {
        let skipped: Vec<String> = outcome.skipped.iter().map(ToString::to_string).collect();
        println!("  Skipped:     {}", skipped.join(", "));
    }
    println!();
    println!("  Edit nav:    {}", outcome.links.edit_nav);
    println!("  Edit footer: {}", outcome.links.edit_footer);
    println!("  Content:     {}", outcome.links.view_content);
    println!("  Visit site:  {}", outcome.links.visit_site);
    println!();
    println!(
        "  Site created in {:.1}s.",
        outcome.elapsed.as_secs_f64()
    );
    println!();
}

async fn cmd_pages(overrides: &Overrides, site: &str) -> Result<()> {
    let (_, provisioner) = provisioner(overrides)?;
    let site = normalize_site_name(site);

    info!(site = %site, "listing pages");
    let pages = provisioner.list_pages(&site).await?;

    if pages.is_empty() {
        println!("No pages found under {}.", provisioner.site_root(&site));
        return Ok(());
    }

    println!();
    for page in &pages {
        println!("  {:<32} {}", page.name, page.path);
    }
    println!();
    println!("  {} pages", pages.len());
    println!();
    Ok(())
}

async fn cmd_action(overrides: &Overrides, site: &str, action: Action) -> Result<()> {
    let (_, provisioner) = provisioner(overrides)?;
    let site = normalize_site_name(site);

    let reporter = CliProgress::new();
    reporter.status(&StatusEvent::message(format!("Listing pages of {site}.")));
    let pages = match provisioner.list_pages(&site).await {
        Ok(pages) => pages,
        Err(e) => {
            reporter.finish();
            return Err(e.into());
        }
    };

    let result = provisioner
        .run_action(&site, &pages, action, &reporter)
        .await;
    reporter.finish();

    let settled = result?;
    print_pages(action, &settled);
    Ok(())
}

fn print_pages(action: Action, pages: &[PageDescriptor]) {
    println!();
    for page in pages {
        println!("  {:<10} {}", page.status.to_string(), page.name);
    }
    println!();
    println!("  {} {} pages.", action_past_tense(action), pages.len());
    println!();
}

fn action_past_tense(action: Action) -> &'static str {
    match action {
        Action::Preview => "Previewed",
        Action::Publish => "Published",
    }
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

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    label: Mutex<String>,
    settled: AtomicUsize,
    total: AtomicUsize,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{elapsed}] {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            label: Mutex::new(String::new()),
            settled: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn status(&self, event: &StatusEvent) {
        if let (Some(action), Some(pages)) = (event.action, &event.pages) {
            *self.label.lock().unwrap_or_else(PoisonError::into_inner) =
                action.label().to_string();
            self.total.store(pages.len(), Ordering::SeqCst);
            self.settled.store(0, Ordering::SeqCst);
        }
        self.spinner.set_message(event.message.clone());
    }

    fn page_status(&self, page: &str, status: PageStatus) {
        if status == PageStatus::Error {
            self.spinner.println(format!("  ✗ {page}"));
        }
        if !status.is_terminal() {
            return;
        }

        let settled = self.settled.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        let label = self.label.lock().unwrap_or_else(PoisonError::into_inner).clone();
        self.spinner
            .set_message(format!("{label} [{settled}/{total}] {page}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_with_resume() {
        let cli = Cli::try_parse_from([
            "sitegen",
            "create",
            "--name",
            "My Site",
            "--description",
            "d",
            "--resume-from",
            "template",
            "--concurrency",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.concurrency, Some(4));
        match cli.command {
            Command::Create {
                name, resume_from, ..
            } => {
                assert_eq!(name, "My Site");
                assert_eq!(resume_from, Some(ProvisionStep::Template));
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn token_flag_is_not_read_from_the_environment() {
        use clap::CommandFactory;

        let command = Cli::command();
        let token = command
            .get_arguments()
            .find(|arg| arg.get_id() == "token")
            .unwrap();
        assert!(token.get_env().is_none());

        let cli = Cli::try_parse_from(["sitegen", "pages", "my-site"]).unwrap();
        assert!(cli.token.is_none());
    }

    #[test]
    fn rejects_unknown_step() {
        let parsed = Cli::try_parse_from([
            "sitegen",
            "create",
            "-n",
            "x",
            "-d",
            "y",
            "--resume-from",
            "rollback",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn action_subcommands_take_a_site() {
        let cli = Cli::try_parse_from(["sitegen", "-v", "publish", "my-site"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Command::Publish { site } if site == "my-site"));
    }
}

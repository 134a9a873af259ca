use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::{Cli, Commands};
use gitnova::classifier::{DifficultyClassifier, HuggingFaceModel};
use gitnova::config::{Config, Secrets, StoreBackend, SupabaseCredentials};
use gitnova::github::GitHubClient;
use gitnova::judge::Judge;
use gitnova::llm::{FallbackPolicy, GroqClient};
use gitnova::pipeline::{Catalog, Engine, JanitorReport, Listing, RunReport, ScanReport, Services, SweepStatus};
use gitnova::store::{IssueStore, SqliteStore, SupabaseStore};
use gitnova::text::preview;

fn setup_logging(verbose: bool, level: Option<&str>) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    let mut builder = env_logger::Builder::from_env(env);

    if verbose {
        builder.target(env_logger::Target::Stderr).init();
        info!("Logging initialized, writing to stderr");
        return Ok(());
    }

    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gitnova")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("gitnova.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Construct every service from config and environment secrets.
///
/// Fails before any network activity when a required secret is missing.
fn build_engine(config: &Config) -> Result<Engine> {
    let secrets = Secrets::from_env(config.store.backend)?;
    info!("Secrets resolved: {:?}", secrets);

    let source = GitHubClient::new(config.github.client_config(), secrets.github_token.clone())
        .context("Failed to create GitHub client")?;
    if !source.is_authenticated() {
        println!("{}", "No GITHUB_TOKEN set, using anonymous rate limits".yellow());
    }

    let model = HuggingFaceModel::new(config.classifier.model_config(), secrets.hf_token.clone())
        .context("Failed to create classifier model")?;
    let classifier =
        DifficultyClassifier::new(Arc::new(model)).with_max_input_chars(config.classifier.max_input_chars);

    let llm = GroqClient::with_api_key(secrets.groq_api_key.clone(), config.judge.client_config())
        .context("Failed to create judge client")?;
    let judge = Judge::new(Arc::new(llm))
        .with_policy(FallbackPolicy::new(config.judge.models.clone()))
        .with_pacing(config.judge.pacing())
        .with_max_body_chars(config.judge.max_body_chars)
        .with_temperature(config.judge.temperature)
        .with_timeout(config.judge.timeout());

    let store = build_store(config, secrets.supabase.as_ref())?;

    let services = Services {
        source: Arc::new(source),
        classifier,
        judge,
        store,
    };
    Ok(Engine::new(
        services,
        &config.pipeline,
        config.categories.clone(),
        config.dry_run,
    ))
}

fn build_store(config: &Config, supabase: Option<&SupabaseCredentials>) -> Result<Arc<dyn IssueStore>> {
    let store: Arc<dyn IssueStore> = match config.store.backend {
        StoreBackend::Supabase => {
            let creds = supabase.ok_or_else(|| eyre!("Supabase credentials not resolved"))?;
            Arc::new(
                SupabaseStore::new(config.store.supabase_config(&creds.url), creds.key.clone())
                    .context("Failed to create Supabase store")?,
            )
        }
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::open(&config.store.sqlite_path)
                .with_context(|| format!("Failed to open {}", config.store.sqlite_path.display()))?,
        ),
    };
    Ok(store)
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Categories => {
            print_categories(config);
            Ok(())
        }
        Commands::Run => handle_run_command(config).await,
        Commands::Sweep => handle_sweep_command(config).await,
        Commands::Scan { category } => handle_scan_command(category.as_deref(), config).await,
        Commands::Published { category, limit } => handle_published_command(category.as_deref(), limit, config).await,
    }
}

fn print_mode(config: &Config) {
    if config.dry_run {
        println!("{} {}", "Mode:".bold(), "DRY RUN (no store writes)".yellow());
    } else {
        println!("{} {}", "Mode:".bold(), "PRODUCTION".green());
    }
}

async fn handle_run_command(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    println!("{}", "Starting GitNova engine".cyan().bold());
    print_mode(config);
    println!(
        "Judge limited to the top {} candidates per category",
        config.pipeline.judge_batch_limit
    );

    let report = engine.run().await;
    print_run_report(&report);
    Ok(())
}

async fn handle_sweep_command(config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    print_mode(config);
    let report = engine.sweep().await.context("Janitor sweep failed")?;
    print_janitor_report(&report);
    Ok(())
}

async fn handle_scan_command(category: Option<&str>, config: &Config) -> Result<()> {
    let engine = build_engine(config)?;
    let reports = engine.scan(category).await?;
    for report in &reports {
        print_scan_report(report);
    }
    Ok(())
}

async fn handle_published_command(category: Option<&str>, limit: Option<usize>, config: &Config) -> Result<()> {
    // The read side needs only the store credentials
    let creds = SupabaseCredentials::from_env(config.store.backend)?;
    let store = build_store(config, creds.as_ref())?;

    // Stored names are the configured ones; match them case-insensitively
    let category = category.map(|name| config.category(name).map_or(name, |c| c.name.as_str()));

    let listing = Catalog::new(store)
        .browse(category, limit)
        .await
        .context("Failed to list published issues")?;
    print_listing(&listing);
    Ok(())
}

fn print_categories(config: &Config) {
    for category in &config.categories {
        println!("{} ({} repos)", category.name.cyan().bold(), category.repos.len());
        for repo in &category.repos {
            println!("  {}", repo);
        }
    }
}

fn print_janitor_report(report: &JanitorReport) {
    match &report.status {
        SweepStatus::SkippedDryRun => println!("{}", "Janitor skipped (dry run)".yellow()),
        SweepStatus::Failed(reason) => println!("{} {}", "Janitor error:".red(), reason),
        SweepStatus::Completed => println!(
            "{} removed {} closed, kept {} open, {} unreachable",
            "Janitor:".green(),
            report.removed,
            report.kept,
            report.unreachable + report.unresolvable
        ),
    }
}

fn print_scan_report(report: &ScanReport) {
    println!(
        "{} {} scanned, {} failed, {} rate limited, {} candidates",
        format!("{}:", report.category).cyan().bold(),
        report.hunt.repos_scanned,
        report.hunt.repos_failed,
        report.hunt.repos_rate_limited,
        report.hunt.candidates
    );
    for candidate in &report.selected {
        println!(
            "  {:.2} [{}] {} - {}",
            candidate.score(),
            candidate.analysis.difficulty,
            candidate.repo,
            preview(&candidate.issue.title, 60)
        );
    }
}

fn print_listing(listing: &Listing) {
    let heading = listing.category.as_deref().unwrap_or("All categories");
    println!("{}", heading.cyan().bold());
    if listing.fell_back {
        println!(
            "{}",
            "No published issues in this category, showing issues from any category".yellow()
        );
    }
    if listing.records.is_empty() {
        println!("  No published issues");
    }
    for record in &listing.records {
        println!(
            "  {:.2} [{}] {} - {}",
            record.ai_score,
            record.difficulty,
            record.repo_name,
            preview(&record.title, 60)
        );
        println!("       {}", record.url.dimmed());
    }
}

fn print_run_report(report: &RunReport) {
    print_janitor_report(&report.janitor);

    for category in &report.categories {
        let rate_limited = if category.hunt.repos_rate_limited > 0 {
            format!(", {} rate limited", category.hunt.repos_rate_limited)
                .yellow()
                .to_string()
        } else {
            String::new()
        };
        println!(
            "{} {} candidates, {} judged{}",
            format!("{}:", category.category).cyan().bold(),
            category.hunt.candidates,
            category.selected,
            rate_limited
        );
    }

    let totals = report.totals();
    let written = if report.dry_run {
        format!("{} would publish", totals.would_publish)
    } else {
        format!("{} published", totals.published)
    };
    println!(
        "{} {}, {} rejected, {} exhausted, {} malformed, {} store failures",
        "Summary:".green().bold(),
        written.green(),
        totals.rejected,
        totals.exhausted,
        totals.malformed,
        totals.store_failed
    );
    println!(
        "{} {} tokens ({} prompt, {} completion)",
        "Judge usage:".bold(),
        report.judge_usage.total(),
        report.judge_usage.prompt_tokens,
        report.judge_usage.completion_tokens
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Secrets may come from a .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if cli.dry_run {
        config.dry_run = true;
    }

    setup_logging(cli.is_verbose(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

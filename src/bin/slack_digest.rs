// src/bin/slack_digest.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::Path;

use slack_digest::config::{self, DigestConfig};
use slack_digest::credentials::{
    Credentials, EnvSource, GEMINI_KEY_VAR, OPENAI_KEY_VAR, SLACK_TOKEN_VAR,
};
use slack_digest::digest::{self, DigestRequest};
use slack_digest::filter::{self, ChannelFilter};
use slack_digest::lister::{self, Listing};
use slack_digest::ratelimit::{ApiContext, ThreadSleeper};
use slack_digest::report;
use slack_digest::slack::SlackClient;
use slack_digest::summarize::{Provider, SummaryService};
use slack_digest::thread::{self, UserDirectory};

#[derive(Parser)]
#[command(name = "slack-digest", about = "Summarize recent Slack threads")]
struct Cli {
    /// Debug-level logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default digest.toml in the current directory
    Init,
    /// List the channels you are a member of
    Channels {
        /// Comma-separated keywords matched against name, topic and purpose
        #[arg(long)]
        filter: Option<String>,
        /// Match keywords case-sensitively
        #[arg(long)]
        case_sensitive: bool,
        /// Mark channels with messages since this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// With --since, hide channels without recent messages
        #[arg(long, requires = "since")]
        active_only: bool,
        /// Max conversations.list requests
        #[arg(long)]
        max_pages: Option<u32>,
        /// Print channels as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize threads started since a date
    Digest {
        /// First day to include (YYYY-MM-DD, midnight in the configured offset)
        #[arg(long)]
        since: NaiveDate,
        /// Channel to summarize (repeatable; default: all matching channels)
        #[arg(long = "channel")]
        channels: Vec<String>,
        /// Comma-separated keywords matched against name, topic and purpose
        #[arg(long)]
        filter: Option<String>,
        /// Match keywords case-sensitively
        #[arg(long)]
        case_sensitive: bool,
        /// Threads summarized per channel (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_threads: Option<u32>,
        /// Summarization provider
        #[arg(long, value_enum)]
        provider: Option<Provider>,
    },
    /// Summarize a single thread from its permalink
    Thread {
        /// e.g. https://acme.slack.com/archives/C123/p1610000000000100
        link: String,
        /// Summarization provider
        #[arg(long, value_enum)]
        provider: Option<Provider>,
    },
    /// Show configuration and which credentials are set
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    slack_digest::logging::init(cli.verbose);

    match cli.command {
        Commands::Init => cmd_init(),
        Commands::Channels {
            filter,
            case_sensitive,
            since,
            active_only,
            max_pages,
            json,
        } => cmd_channels(
            filter.as_deref(),
            case_sensitive,
            since,
            active_only,
            max_pages,
            json,
        ),
        Commands::Digest {
            since,
            channels,
            filter,
            case_sensitive,
            max_threads,
            provider,
        } => cmd_digest(
            since,
            &channels,
            filter.as_deref(),
            case_sensitive,
            max_threads,
            provider,
        ),
        Commands::Thread { link, provider } => cmd_thread(&link, provider),
        Commands::Status => cmd_status(),
    }
}

fn load_project_config(dir: &Path) -> Result<DigestConfig> {
    Ok(config::load_config(&config::config_path(dir))?.unwrap_or_default())
}

fn load_credentials(dir: &Path) -> Result<Credentials> {
    let env = EnvSource::load(dir)?;
    Credentials::load(&env)
}

fn load_channels(ctx: &ApiContext<'_>, config: &DigestConfig) -> Listing {
    let listing = lister::list_member_channels(ctx, &config.list_options());
    if let Some(err) = &listing.error {
        eprintln!("Warning: {err}");
    }
    listing
}

fn cmd_init() -> Result<()> {
    let dir = slack_digest::work_dir()?;
    if config::write_default_config(&dir)? {
        println!("Wrote digest.toml");
    } else {
        println!("digest.toml already exists, leaving it unchanged");
    }
    Ok(())
}

fn cmd_channels(
    filter_input: Option<&str>,
    case_sensitive: bool,
    since: Option<NaiveDate>,
    active_only: bool,
    max_pages: Option<u32>,
    json: bool,
) -> Result<()> {
    let dir = slack_digest::work_dir()?;
    let mut config = load_project_config(&dir)?;
    if let Some(max_pages) = max_pages {
        config.max_pages = max_pages;
    }
    let credentials = load_credentials(&dir)?;

    let client = SlackClient::new(&credentials.slack_token);
    let ctx = ApiContext::new(&client, &ThreadSleeper, config.retry_policy());

    let listing = load_channels(&ctx, &config);
    let filter = ChannelFilter::parse(filter_input.unwrap_or(""), case_sensitive);
    let mut channels = filter.apply(listing.channels);

    let active = match since {
        Some(date) => {
            let oldest = thread::since_timestamp(date, config.utc_offset()?);
            Some(digest::active_channel_ids(&ctx, &channels, &oldest))
        }
        None => None,
    };
    if active_only {
        if let Some(ids) = &active {
            channels.retain(|ch| ids.contains(&ch.id));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&channels)?);
    } else {
        print!("{}", report::render_channels(&channels, active.as_ref()));
    }
    Ok(())
}

fn cmd_digest(
    since: NaiveDate,
    names: &[String],
    filter_input: Option<&str>,
    case_sensitive: bool,
    max_threads: Option<u32>,
    provider: Option<Provider>,
) -> Result<()> {
    let dir = slack_digest::work_dir()?;
    let mut config = load_project_config(&dir)?;
    if let Some(max_threads) = max_threads {
        config.max_threads = max_threads as usize;
    }
    if let Some(provider) = provider {
        config.provider = provider;
    }
    let utc_offset = config.utc_offset()?;
    let credentials = load_credentials(&dir)?;

    let client = SlackClient::new(&credentials.slack_token);
    let ctx = ApiContext::new(&client, &ThreadSleeper, config.retry_policy());
    let summaries = SummaryService::from_config(&config, &credentials);
    if !summaries.is_available() {
        eprintln!(
            "Warning: {} is not set; summaries will be replaced by a notice",
            summaries.provider().key_var()
        );
    }

    let workspace = digest::resolve_workspace(&ctx, config.workspace.as_deref());
    let listing = load_channels(&ctx, &config);
    let filter = ChannelFilter::parse(filter_input.unwrap_or(""), case_sensitive);
    let candidates = filter.apply(listing.channels);

    let (selected, unknown) = if names.is_empty() {
        (candidates, Vec::new())
    } else {
        filter::select_by_name(&candidates, names)
    };

    if selected.is_empty() {
        println!("No channels to summarize. Try a different --filter or --channel.");
        return Ok(());
    }

    let request = DigestRequest {
        since: thread::since_timestamp(since, utc_offset),
        max_threads: config.max_threads,
        workspace,
        utc_offset,
        language: config.summary_language.clone(),
    };
    println!(
        "Summarizing {} channel(s) since {since} with {}...\n",
        selected.len(),
        summaries.provider()
    );
    let mut digest = digest::build_digest(&ctx, &summaries, &selected, &request);
    digest.unknown_channels = unknown;

    print!("{}", report::render_digest(&digest));
    Ok(())
}

fn cmd_thread(link: &str, provider: Option<Provider>) -> Result<()> {
    let (channel_id, thread_ts) = thread::parse_thread_link(link)
        .with_context(|| format!("Not a Slack thread link: {link}"))?;

    let dir = slack_digest::work_dir()?;
    let mut config = load_project_config(&dir)?;
    if let Some(provider) = provider {
        config.provider = provider;
    }
    let credentials = load_credentials(&dir)?;

    let client = SlackClient::new(&credentials.slack_token);
    let ctx = ApiContext::new(&client, &ThreadSleeper, config.retry_policy());
    let summaries = SummaryService::from_config(&config, &credentials);
    let workspace = digest::resolve_workspace(&ctx, config.workspace.as_deref());

    let mut users = UserDirectory::new();
    let (summary, count) = digest::summarize_thread(
        &ctx,
        &mut users,
        &summaries,
        &channel_id,
        &thread_ts,
        config.summary_language.as_deref(),
    )
    .context("Failed to fetch thread")?;

    println!("{summary}");
    println!();
    println!(
        "{} · {count} messages",
        thread::format_ts(&thread_ts, config.utc_offset()?)
    );
    println!(
        "{}",
        thread::thread_permalink(&workspace, &channel_id, &thread_ts)
    );
    Ok(())
}

fn cmd_status() -> Result<()> {
    let dir = slack_digest::work_dir()?;
    let path = config::config_path(&dir);
    let config = match config::load_config(&path)? {
        Some(config) => {
            println!("Config: {}", path.display());
            config
        }
        None => {
            println!("Config: defaults (no digest.toml; run 'slack-digest init')");
            DigestConfig::default()
        }
    };

    let model = match config.provider {
        Provider::OpenAi => &config.openai_model,
        Provider::Gemini => &config.gemini_model,
    };
    println!("Provider: {} ({model})", config.provider);
    println!(
        "Workspace: {}",
        config
            .workspace
            .as_deref()
            .unwrap_or("(from auth.test)")
    );
    println!("UTC offset: {:+}h", config.utc_offset_hours);
    println!(
        "Listing: up to {} pages of {}, {}ms apart",
        config.max_pages, config.page_size, config.page_delay_ms
    );
    println!("Threads per channel: {}", config.max_threads);
    let retry = config.retry_policy();
    println!(
        "Rate-limit retries: {}",
        match (retry.max_retries, retry.max_total_wait) {
            (None, None) => "unbounded".to_string(),
            (retries, wait) => format!(
                "max {} retries, max {} waited",
                retries.map_or("-".to_string(), |r| r.to_string()),
                wait.map_or("-".to_string(), |w| format!("{}s", w.as_secs()))
            ),
        }
    );

    let env = EnvSource::load(&dir)?;
    for var in [SLACK_TOKEN_VAR, OPENAI_KEY_VAR, GEMINI_KEY_VAR] {
        let state = if env.get(var).is_some() { "set" } else { "missing" };
        println!("{var}: {state}");
    }
    Ok(())
}

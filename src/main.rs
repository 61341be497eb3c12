use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use jiratime::client::JiraClient;
use jiratime::commands;
use jiratime::config::{self, Config, Overrides};
use jiratime::db::Database;
use jiratime::worklog::WorkLogStore;

#[derive(Parser)]
#[command(name = "jiratime")]
#[command(about = "Time work on Jira issues and log it from the terminal")]
#[command(version)]
struct Cli {
    /// Jira site URL, e.g. https://your-domain.atlassian.net
    #[arg(long, global = true, env = "JIRA_BASE_URL")]
    base_url: Option<String>,

    /// Jira API token
    #[arg(long, global = true, env = "JIRA_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Account email; enables Basic auth instead of a Bearer token
    #[arg(long, global = true, env = "JIRA_EMAIL")]
    email: Option<String>,

    /// Settings file to read instead of ~/.jirarc
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local work log file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a ~/.jirarc template and create the data directory
    Init {
        /// Overwrite an existing ~/.jirarc
        #[arg(short, long)]
        force: bool,
    },

    /// List issues recently assigned to you
    Recent {
        /// Maximum number of issues
        #[arg(short = 'n', long, default_value_t = commands::recent::DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Select the issue to track
    Select {
        /// Issue key, e.g. PROJ-123
        key: String,
    },

    /// Start the timer
    Start {
        /// Issue key (default: selected issue)
        key: Option<String>,
    },

    /// Stop the timer
    Stop,

    /// Discard the timer and any manual duration
    Reset,

    /// Show the selected issue and timer
    Status,

    /// Enter the time spent by hand, e.g. "1h 30m"
    Duration {
        /// Duration text; empty clears it
        text: String,
    },

    /// Submit the tracked time as a worklog
    Log {
        /// Log this duration instead of the timer's
        #[arg(short, long)]
        duration: Option<String>,
        /// Worklog comment
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Run the timer in the foreground until interrupted
    Track {
        /// Issue key (default: selected issue)
        key: Option<String>,
    },

    /// Show work logged on a day
    Today {
        /// Day to show as YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// List status transitions with their direction
    Transitions {
        /// Issue key (default: selected issue)
        key: Option<String>,
    },

    /// Move an issue through a transition
    Move {
        /// Transition id or name
        transition: String,
        /// Issue key (default: selected issue)
        key: Option<String>,
    },

    /// Open an issue in the browser
    Open {
        /// Issue key (default: selected issue)
        key: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = env::var("JIRATIME_LOG_JSON")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn get_db(config: &Config) -> Result<Database> {
    fs::create_dir_all(&config.data_dir).context("Failed to create data directory")?;
    Database::open(&config.session_db_path()).context("Failed to open session database")
}

fn get_client(config: &Config) -> Result<JiraClient> {
    let settings = config.remote()?;
    JiraClient::new(&settings).context("Failed to build HTTP client")
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let home = config::home_dir()?;
    let overrides = Overrides {
        base_url: cli.base_url,
        api_token: cli.token,
        email: cli.email,
        log_file: cli.log_file,
    };
    // Everything but `init` needs a readable ~/.jirarc
    let rc_path = cli.config;
    let load_config = || Config::load(rc_path.as_deref(), &home, overrides.clone());

    match cli.command {
        Commands::Init { force } => commands::init::run(&home, force),

        Commands::Recent { limit } => {
            let client = get_client(&load_config()?)?;
            commands::recent::run(&client, limit)
        }

        Commands::Select { key } => {
            let config = load_config()?;
            let db = get_db(&config)?;
            let client = get_client(&config)?;
            commands::select::run(&db, &client, &key)
        }

        Commands::Start { key } => {
            let db = get_db(&load_config()?)?;
            commands::timer::start(&db, key.as_deref())
        }

        Commands::Stop => {
            let db = get_db(&load_config()?)?;
            commands::timer::stop(&db)
        }

        Commands::Reset => {
            let db = get_db(&load_config()?)?;
            commands::timer::reset(&db)
        }

        Commands::Status => {
            let db = get_db(&load_config()?)?;
            commands::timer::status(&db)
        }

        Commands::Duration { text } => {
            let db = get_db(&load_config()?)?;
            commands::timer::duration(&db, &text)
        }

        Commands::Log { duration, comment } => {
            let config = load_config()?;
            let db = get_db(&config)?;
            let client = get_client(&config)?;
            let store = WorkLogStore::new(config.log_file.clone());
            commands::log::run(
                &db,
                &client,
                &store,
                duration.as_deref(),
                comment.as_deref(),
            )
        }

        Commands::Track { key } => {
            let db = get_db(&load_config()?)?;
            let stop = Arc::new(AtomicBool::new(false));
            signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))
                .context("Failed to register SIGINT handler")?;
            signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))
                .context("Failed to register SIGTERM handler")?;
            commands::track::run_until(&db, key.as_deref(), stop, commands::track::TICK)
        }

        Commands::Today { date } => {
            let store = WorkLogStore::new(load_config()?.log_file);
            commands::today::run(&store, date)
        }

        Commands::Transitions { key } => {
            let config = load_config()?;
            let db = get_db(&config)?;
            let client = get_client(&config)?;
            commands::transition::list(&db, &client, key.as_deref())
        }

        Commands::Move { transition, key } => {
            let config = load_config()?;
            let db = get_db(&config)?;
            let client = get_client(&config)?;
            commands::transition::move_to(&db, &client, &transition, key.as_deref())
        }

        Commands::Open { key } => {
            let config = load_config()?;
            let db = get_db(&config)?;
            commands::open::run(&db, &config, key.as_deref())
        }
    }
}

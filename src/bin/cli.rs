//! Portal client CLI
//!
//! Local entry point for poking at the portal: one-shot fetches of the
//! domain pages, the directory crawl, and cache maintenance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lectio_client::{
    cache::Refresh,
    client::PortalClient,
    config::Config,
    connectivity::AlwaysOnline,
    error::{AppError, Result},
    models::OutgoingMessage,
    session::{Credentials, MemoryCredentialStore},
    storage::LocalKvStore,
};

/// Unofficial Lectio portal client
#[derive(Parser, Debug)]
#[command(name = "lectio", version, about = "Unofficial Lectio portal client")]
struct Cli {
    /// Path to the storage directory containing config.toml and cache
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration file
    Validate,

    /// Verify that the configured credentials can sign in
    Login,

    /// Fetch one week's schedule
    Schedule {
        /// ISO week number (default: current week)
        #[arg(long)]
        week: Option<u32>,

        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,

        /// Portal term id to activate before fetching
        #[arg(long)]
        term: Option<String>,
    },

    /// Fetch the absence report
    Absence,

    /// Fetch the grade sheet
    Grades,

    /// Fetch message threads, or one thread by id
    Messages {
        /// Thread id to open
        #[arg(long)]
        thread: Option<String>,
    },

    /// Send a message
    Send {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        body: String,

        /// Recipient id, repeatable
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
    },

    /// Run the people directory crawl
    Crawl {
        /// Re-crawl even if the directory is fresh
        #[arg(long)]
        force: bool,
    },

    /// Show the people directory, optionally filtered by name
    Directory {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
    },

    /// Delete expired cache entries
    Sweep {
        /// Ignore the sweep throttle
        #[arg(long)]
        force: bool,
    },

    /// Show cache and directory status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Credentials come from the environment so they never land in shell
/// history or the config file.
fn credentials() -> Result<Credentials> {
    let username = std::env::var("LECTIO_USERNAME")
        .map_err(|_| AppError::config("LECTIO_USERNAME is not set"))?;
    let password = std::env::var("LECTIO_PASSWORD")
        .map_err(|_| AppError::config("LECTIO_PASSWORD is not set"))?;
    Ok(Credentials { username, password })
}

async fn signed_in_client(config: Config, storage_dir: &Path) -> Result<PortalClient> {
    let store = LocalKvStore::open(storage_dir.join("cache")).await?;
    let client = PortalClient::new(config, Arc::new(store), Arc::new(AlwaysOnline::new()))?;

    let creds = credentials()?;
    let username = creds.username.clone();
    if !client
        .login_stored(&MemoryCredentialStore::with(creds))
        .await?
    {
        return Err(AppError::auth("the portal rejected the credentials"));
    }
    log::info!("signed in as {username}");
    Ok(client)
}

/// Print the freshest value a fetch delivered.
fn show<T: serde::Serialize>(refresh: Refresh<T>) {
    match refresh {
        Refresh::Stale(_) => log::debug!("stale copy available, refreshing"),
        Refresh::Fresh(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("could not render result: {err}"),
        },
        Refresh::Offline(Some(value)) => {
            log::warn!("offline, showing cached copy");
            if let Ok(json) = serde_json::to_string_pretty(&value) {
                println!("{json}");
            }
        }
        Refresh::Offline(None) => log::error!("offline and nothing cached"),
        Refresh::RateLimited => log::error!("the portal is rate limiting this client, try later"),
        Refresh::Failed => log::error!("refresh failed and nothing cached"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    match cli.command {
        Command::Validate => {
            config.validate()?;
            log::info!("configuration is valid");
        }

        Command::Login => {
            signed_in_client(config, &cli.storage_dir).await?;
            log::info!("login ok");
        }

        Command::Schedule { week, year, term } => {
            use chrono::Datelike;
            let today = chrono::Utc::now().iso_week();
            let week = week.unwrap_or_else(|| today.week());
            let year = year.unwrap_or_else(|| today.year());

            let client = signed_in_client(config, &cli.storage_dir).await?;
            if let Some(term_id) = term {
                client.select_term(&term_id).await?;
            }
            client.schedule(week, year, show).await?;
        }

        Command::Absence => {
            let client = signed_in_client(config, &cli.storage_dir).await?;
            client.absence(show).await?;
        }

        Command::Grades => {
            let client = signed_in_client(config, &cli.storage_dir).await?;
            client.grades(show).await?;
        }

        Command::Messages { thread } => {
            let client = signed_in_client(config, &cli.storage_dir).await?;
            match thread {
                Some(id) => client.message_thread(&id, show).await?,
                None => client.message_threads(show).await?,
            }
        }

        Command::Send {
            subject,
            body,
            recipients,
        } => {
            let client = signed_in_client(config, &cli.storage_dir).await?;
            let message = OutgoingMessage {
                subject,
                body,
                recipients,
                attachments: Vec::new(),
            };
            client.send_message(&message).await?;
            log::info!("message sent");
        }

        Command::Crawl { force } => {
            let client = signed_in_client(config, &cli.storage_dir).await?;
            let crawler = client.directory_crawler();
            let outcome = crawler.start(force).await?;
            log::info!("crawl finished: {outcome:?}");
        }

        Command::Directory { search } => {
            let store = LocalKvStore::open(cli.storage_dir.join("cache")).await?;
            let client = PortalClient::new(config, Arc::new(store), Arc::new(AlwaysOnline::new()))?;
            let directory = client.directory_crawler().get_directory().await?;

            match search {
                Some(query) => {
                    for person in directory.search(&query) {
                        println!("{}\t{}", person.id, person.name);
                    }
                }
                None => {
                    log::info!("{} people known", directory.len());
                    for person in directory.people.values() {
                        println!("{}\t{}", person.id, person.name);
                    }
                }
            }
        }

        Command::Sweep { force } => {
            let store = LocalKvStore::open(cli.storage_dir.join("cache")).await?;
            let client = PortalClient::new(config, Arc::new(store), Arc::new(AlwaysOnline::new()))?;
            let removed = client.cache().sweep(force).await?;
            log::info!("sweep removed {removed} entr(ies)");
        }

        Command::Info => {
            let store = LocalKvStore::open(cli.storage_dir.join("cache")).await?;
            let client = PortalClient::new(config, Arc::new(store), Arc::new(AlwaysOnline::new()))?;

            let entries = client.cache().entries().await?;
            println!("cache entries: {}", entries.len());
            for key in entries {
                println!("  {key}");
            }

            let directory = client.directory_crawler().get_directory().await?;
            match directory.completed_at {
                Some(at) => println!("directory: {} people, completed {at}", directory.len()),
                None if !directory.is_empty() => {
                    println!("directory: {} people (partial crawl)", directory.len())
                }
                None => println!("directory: not crawled yet"),
            }
        }
    }

    Ok(())
}

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nsid_browser::{AppConfig, BrowserSession, DailyView, DetailView, FeedRange, FilePreferenceStore, PreferenceStore};
use nsid_tree::{DateRange, TreeNode};
use nsid_types::RecordLocator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Browse the collections indexed from the atproto network
#[derive(Parser)]
#[clap(name = "nsid", version = "0.1.0", about = "NSID collection browser")]
struct Cli {
    /// Set the log level (info, debug, trace); overrides the config file
    #[clap(short, long)]
    log_level: Option<String>,

    /// Path to the TOML configuration file
    #[clap(short, long, default_value = "nsid.toml")]
    config: PathBuf,

    /// Commands
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the collection tree
    Tree {
        /// Case-insensitive substring of the collection name
        #[clap(short, long)]
        search: Option<String>,

        /// Earliest first-indexed date (YYYY-MM-DD)
        #[clap(long, default_value = "")]
        first_from: String,

        /// Latest first-indexed date (YYYY-MM-DD)
        #[clap(long, default_value = "")]
        first_to: String,

        /// Earliest last-indexed date (YYYY-MM-DD)
        #[clap(long, default_value = "")]
        last_from: String,

        /// Latest last-indexed date (YYYY-MM-DD)
        #[clap(long, default_value = "")]
        last_to: String,

        /// Only show branches leading to a published schema
        #[clap(long)]
        schema_only: bool,

        /// Collapse single-child folder chains
        #[clap(long)]
        compress: bool,

        /// Print the tree as JSON
        #[clap(long)]
        json: bool,
    },

    /// Resolve and print the published schema of an NSID
    Schema {
        /// Collection NSID, e.g. uk.skyblur.post
        nsid: String,
    },

    /// Fetch a record by at:// URI
    Record {
        /// at://<did>/<collection>/<rkey>
        uri: String,
    },

    /// Fetch the most recently indexed record of a collection
    Latest {
        /// Collection NSID
        collection: String,
    },

    /// Print indexer totals for one collection
    Stats {
        /// Collection NSID
        collection: String,
    },

    /// Print dashboard totals
    Summary,

    /// List custom feed generator servers by number of feeds
    Feeds {
        /// Month to report (YYYY-MM); every month when omitted
        #[clap(long, default_value = "all")]
        month: String,
    },

    /// Print daily new and active counts, oldest day first
    Activity {
        #[clap(value_enum)]
        kind: ActivityKind,

        /// 7 for a week, anything larger for 30 days
        #[clap(long, default_value_t = 7)]
        days: u32,
    },

    /// Show or change the persisted filter preferences
    Prefs {
        /// Hide transaction-keyed and placeholder collections
        #[clap(long)]
        except_transaction: Option<bool>,

        /// Hide roots under unknown top-level labels
        #[clap(long)]
        except_invalid_tlds: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivityKind {
    Collections,
    Users,
}

impl ActivityKind {
    fn views(self) -> (DailyView, DailyView) {
        match self {
            ActivityKind::Collections => (DailyView::NewCollections, DailyView::ActiveCollections),
            ActivityKind::Users => (DailyView::NewDids, DailyView::ActiveDids),
        }
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow!("Invalid log filter {}: {}", log_level, e))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to set global default subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_create(&cli.config)?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level)?;
    debug!("Using configuration {}", cli.config.display());

    let store = Arc::new(FilePreferenceStore::new(&config.preferences_dir));

    match cli.command {
        Commands::Tree {
            search,
            first_from,
            first_to,
            last_from,
            last_to,
            schema_only,
            compress,
            json,
        } => {
            let first_indexed = DateRange::parse(&first_from, &first_to)?;
            let last_indexed = DateRange::parse(&last_from, &last_to)?;

            let session = BrowserSession::new(&config, store)?;
            session.reload().await?;
            let tree = session
                .update_filters(|filters| {
                    filters.search = search;
                    filters.first_indexed = first_indexed;
                    filters.last_indexed = last_indexed;
                    filters.only_with_schema = schema_only;
                    filters.layout.compress |= compress;
                })
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_tree(&tree, 0);
            }
        }
        Commands::Schema { nsid } => {
            let session = BrowserSession::new(&config, store)?;
            let view = session.open_schema(&nsid).await?;
            print_detail(&view)?;
        }
        Commands::Record { uri } => {
            let locator = RecordLocator::parse(&uri)?;
            let session = BrowserSession::new(&config, store)?;
            let view = session.open_record(&locator).await?;
            print_detail(&view)?;
        }
        Commands::Latest { collection } => {
            let session = BrowserSession::new(&config, store)?;
            let view = session.open_latest_record(&collection).await?;
            print_detail(&view)?;
        }
        Commands::Stats { collection } => {
            let session = BrowserSession::new(&config, store)?;
            let stats = session
                .data_api()
                .collection_stats(&collection)
                .await?
                .ok_or_else(|| anyhow!("No statistics for {}", collection))?;

            println!("Events:        {}", stats.total_count);
            println!("Unique DIDs:   {}", stats.unique_did);
            println!("Unique rkeys:  {}", stats.unique_rkey);
            println!("First record:  {}", stats.min_createdat.as_deref().unwrap_or("-"));
            println!("Latest record: {}", stats.max_createdat.as_deref().unwrap_or("-"));
        }
        Commands::Summary => {
            let session = BrowserSession::new(&config, store)?;
            session.reload().await?;
            let summary = session.dashboard().await?;

            println!("Collections:   {}", summary.total_collections);
            println!("New (< {}h):   {}", config.tree.new_window_hours, summary.new_collections);
            println!("Namespaces:    {}", summary.namespace_count);
            println!("Total events:  {}", summary.total_events);
            if let Some(dids) = summary.unique_did_count {
                println!("Unique DIDs:   {}", dids);
            }
            if let (Some(name), Some(since)) = (&summary.earliest_collection, summary.indexed_since) {
                println!("Indexed since: {} ({})", since.format("%Y-%m-%d"), name);
            }
            if let (Some(until), Some(lag)) = (summary.indexed_until, summary.indexer_lag_minutes) {
                println!("Indexed until: {} ({} min behind)", until.format("%Y-%m-%d %H:%M"), lag);
            }
        }
        Commands::Feeds { month } => {
            let range = FeedRange::parse(&month)?;
            let session = BrowserSession::new(&config, store)?;
            let servers = session.feed_servers(range).await?;

            println!("{:<40} {:>8} {:>8}", "server", "feeds", "owners");
            for server in &servers {
                println!(
                    "{:<40} {:>8} {:>8}",
                    server.server_did, server.unique_creator_rkey, server.unique_creator_did
                );
            }
        }
        Commands::Activity { kind, days } => {
            let session = BrowserSession::new(&config, store)?;
            let (new_view, active_view) = kind.views();
            let (new, active) = tokio::try_join!(
                session.daily_activity(new_view, days),
                session.daily_activity(active_view, days),
            )?;

            println!("new:    {:?}", new);
            println!("active: {:?}", active);
        }
        Commands::Prefs {
            except_transaction,
            except_invalid_tlds,
        } => {
            let mut preferences = store.load()?;
            if except_transaction.is_some() || except_invalid_tlds.is_some() {
                if let Some(value) = except_transaction {
                    preferences.except_collection_with_transaction = value;
                }
                if let Some(value) = except_invalid_tlds {
                    preferences.except_invalid_tlds = value;
                }
                store.save(&preferences)?;
                info!("Saved preferences to {}", store.path().display());
            }

            println!("except collection with transaction: {}", preferences.except_collection_with_transaction);
            println!("except invalid TLDs:                {}", preferences.except_invalid_tlds);
        }
    }

    Ok(())
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        let name = if depth == 0 { node.path.as_str() } else { node.label() };
        let mut line = format!("{}{} {}", "  ".repeat(depth), node.id, name);
        if node.has_schema {
            line.push_str(" [schema]");
        }
        if node.is_new {
            line.push_str(" [new]");
        }
        println!("{}", line);
        print_tree(node.children(), depth + 1);
    }
}

fn print_detail(view: &DetailView) -> Result<()> {
    match view {
        DetailView::Schema(schema) => {
            println!("Authority: {}", schema.authority);
            println!("Endpoint:  {}", schema.endpoint);
            println!("{}", serde_json::to_string_pretty(&schema.schema)?);
        }
        DetailView::Record(record) => {
            println!("Record:   {}", record.locator);
            println!("Endpoint: {}", record.endpoint);
            println!("{}", serde_json::to_string_pretty(&record.value)?);
        }
        DetailView::Failed { subject, message } => {
            return Err(anyhow!("{}: {}", subject, message));
        }
    }
    Ok(())
}

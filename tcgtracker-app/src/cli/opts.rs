use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "tcgtracker", version, about = "Trading card catalogue browser and collection tracker")]
pub struct Cli {
    /// Local storage backend
    #[arg(long, value_enum, default_value_t = StoreKind::Json, env = "TCGTRACKER_STORE")]
    pub store: StoreKind,

    /// Store file (JSON document or SQLite DB; defaults to app data dir)
    #[arg(long, env = "TCGTRACKER_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Collection owner; remote documents live under this namespace
    #[arg(long, env = "TCGTRACKER_USER", default_value = "local")]
    pub user: String,

    /// TCGdex API base
    #[arg(long, env = "TCGTRACKER_CATALOGUE_URL", default_value = tcgtracker_http::tcgdex::DEFAULT_BASE_URL)]
    pub catalogue_url: String,

    /// Catalogue language code
    #[arg(long, env = "TCGTRACKER_LANGUAGE", default_value = tcgtracker_http::tcgdex::DEFAULT_LANGUAGE)]
    pub language: String,

    /// Remote collection store base; without it the mirror is kept in memory for this run only
    #[arg(long, env = "TCGTRACKER_COLLECTION_URL")]
    pub collection_url: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Catalogue card lookups
    #[command(subcommand)]
    Card(CardCmd),
    /// Catalogue sets
    #[command(subcommand)]
    Set(SetCmd),
    /// Catalogue series
    #[command(subcommand)]
    Series(SeriesCmd),
    /// Owned cards
    #[command(subcommand)]
    Collection(CollectionCmd),
    /// Export the collection
    #[command(subcommand)]
    Export(ExportCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Show { id: String },
    Search { query: String },
    /// Drop the cached copy so the next lookup refetches it
    Forget { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum SetCmd {
    List,
    Show { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum SeriesCmd {
    List,
    Show { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CollectionCmd {
    /// Add one or more catalogue cards (several ids are added as one batch)
    Add {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    List {
        #[arg(long)]
        favourites: bool,
        #[arg(long)]
        set: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    Fav { card_id: String },
    Rm { card_id: String },
    Stats,
    /// Push the local collection to the remote store
    Sync,
    /// Print the collection every time it changes (Ctrl-C to stop)
    Watch,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

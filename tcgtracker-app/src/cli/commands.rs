use crate::cli::opts::*;

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tcgtracker_core::{
    filters::{filter_by_set, filter_owned_by_name},
    CardRepository, CatalogueCardDetail, CollectionStore, LocalStore, MemoryCollectionStore,
    OwnedCard,
};
use tcgtracker_http::{RestCollectionStore, TcgdexClient};
use tcgtracker_json::paths::default_sqlite_file;
use tcgtracker_json::JsonStore;
use tcgtracker_sqlite::SqliteStore;

pub async fn run_cli(args: Cli) -> Result<()> {
    let repo = build_repository(&args).await?;
    match args.cmd.clone() {
        Command::Card(cmd) => card_cmd(&repo, cmd).await,
        Command::Set(cmd) => set_cmd(&repo, cmd).await,
        Command::Series(cmd) => series_cmd(&repo, cmd).await,
        Command::Collection(cmd) => collection_cmd(&repo, cmd).await,
        Command::Export(cmd) => export_cmd(&repo, cmd).await,
    }
}

pub async fn open_store(store: &StoreKind, db_path: Option<PathBuf>) -> Result<Arc<dyn LocalStore>> {
    match store {
        StoreKind::Json => {
            let s = match db_path {
                Some(p) => {
                    let backups = p.parent().unwrap_or_else(|| Path::new(".")).join("backups");
                    JsonStore::open_with(p, backups, 10).await?
                }
                None => JsonStore::open_default().await?,
            };
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(default_sqlite_file);
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let s = SqliteStore::open_file(&p).await?;
            Ok(Arc::new(s))
        }
    }
}

pub async fn build_repository(args: &Cli) -> Result<CardRepository> {
    let local = open_store(&args.store, args.db_path.clone()).await?;
    let catalogue = Arc::new(TcgdexClient::new(&args.catalogue_url, &args.language)?);
    let remote: Arc<dyn CollectionStore> = match &args.collection_url {
        Some(url) => Arc::new(RestCollectionStore::new(url)?),
        None => {
            log::warn!("no collection url configured; remote mirror is in-memory for this run");
            Arc::new(MemoryCollectionStore::default())
        }
    };
    Ok(CardRepository::new(catalogue, local, remote, args.user.clone()))
}

async fn card_cmd(repo: &CardRepository, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Show { id } => {
            let card = repo.load_catalogue_card_detail(&id).await?;
            print_detail(&card);
        }
        CardCmd::Search { query } => {
            let cards = repo.search_catalogues_by_name(&query).await?;
            if cards.is_empty() {
                println!("no matches");
            }
            for c in cards {
                println!("{}\t{}\t{}\t{}", c.id, c.name, c.set_name, c.rarity);
            }
        }
        CardCmd::Forget { id } => {
            if repo.invalidate_catalogue_card(&id).await? {
                println!("ok");
            } else {
                println!("not cached");
            }
        }
    }
    Ok(())
}

async fn set_cmd(repo: &CardRepository, cmd: SetCmd) -> Result<()> {
    match cmd {
        SetCmd::List => {
            for s in repo.fetch_all_sets().await? {
                let count = s.card_count.map(|c| c.total.to_string()).unwrap_or_else(|| "-".into());
                println!("{}\t{}\tcards={}", s.id, s.name, count);
            }
        }
        SetCmd::Show { id } => {
            let set = repo.load_catalogue_set(&id).await?;
            println!("{} ({})", set.name, set.id);
            println!("series:   {}", set.series_id);
            println!("released: {}", set.release_date);
            println!("cards:    {} ({} official)", set.card_count.total, set.card_count.official);
            for c in set.cards {
                println!("  {}\t{}", c.id, c.name);
            }
        }
    }
    Ok(())
}

async fn series_cmd(repo: &CardRepository, cmd: SeriesCmd) -> Result<()> {
    match cmd {
        SeriesCmd::List => {
            for s in repo.fetch_all_series().await? {
                println!("{}\t{}", s.id, s.name);
            }
        }
        SeriesCmd::Show { id } => {
            let series = repo.load_catalogue_series(&id).await?;
            println!("{} ({})", series.name, series.id);
            for s in series.sets {
                println!("  {}\t{}", s.id, s.name);
            }
        }
    }
    Ok(())
}

async fn collection_cmd(repo: &CardRepository, cmd: CollectionCmd) -> Result<()> {
    match cmd {
        CollectionCmd::Add { ids } => {
            let added = if ids.len() == 1 {
                vec![repo.add_card_to_collection(&ids[0]).await?]
            } else {
                repo.add_cards_to_collection(&ids).await?
            };
            for c in added {
                println!("{}\t{}", c.local_id, c.card_id);
            }
        }
        CollectionCmd::List { favourites, set, name } => {
            let mut cards = if favourites {
                repo.list_favourite_cards().await?
            } else {
                repo.list_owned_cards().await?
            };
            if let Some(set) = set {
                cards = filter_by_set(&cards, &set);
            }
            if let Some(name) = name {
                cards = filter_owned_by_name(&cards, &name);
            }
            print_owned(&cards);
        }
        CollectionCmd::Fav { card_id } => {
            let card = resolve_owned(repo, &card_id).await?;
            let updated = repo.toggle_favourite(&card).await?;
            println!("{}\tfavourite={}", updated.card_id, updated.favourite);
        }
        CollectionCmd::Rm { card_id } => {
            let card = resolve_owned(repo, &card_id).await?;
            repo.delete_owned_card(&card).await?;
            println!("ok");
        }
        CollectionCmd::Stats => {
            let stats = repo.collection_stats().await?;
            println!("owned:      {}", stats.totals.total);
            println!("favourites: {}", stats.totals.favourites);
            if let Some((set, n)) = stats.largest_set() {
                println!("largest:    {} ({})", set, n);
            }
            for (set, t) in &stats.per_set {
                println!("  {}\t{}\tfav={}", set, t.total, t.favourites);
            }
        }
        CollectionCmd::Sync => {
            let report = repo.reconcile_collection().await?;
            println!("pushed {}, removed {}", report.pushed, report.removed);
        }
        CollectionCmd::Watch => {
            let mut stream = repo.get_owned_cards_stream();
            loop {
                tokio::select! {
                    next = stream.next() => match next {
                        Some(cards) => {
                            println!("--- {} owned ---", cards.len());
                            print_owned(&cards);
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

async fn export_cmd(repo: &CardRepository, cmd: ExportCmd) -> Result<()> {
    let cards = repo.list_owned_cards().await?;
    let path = match cmd {
        ExportCmd::Json { path } => {
            write_json_export(repo.user_id(), &cards, &path)?;
            path
        }
        ExportCmd::Csv { path } => {
            write_csv_export(&cards, &path)?;
            path
        }
    };
    println!("wrote {}", path.display());
    Ok(())
}

// ===== Helpers =====

#[derive(serde::Serialize, serde::Deserialize)]
struct ExportBundle {
    version: u32,
    user: String,
    cards: Vec<OwnedCard>,
}

fn write_json_export(user: &str, cards: &[OwnedCard], path: &Path) -> Result<()> {
    let bundle = ExportBundle {
        version: 1,
        user: user.to_string(),
        cards: cards.to_vec(),
    };
    let s = serde_json::to_string_pretty(&bundle)?;
    std::fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn write_csv_export(cards: &[OwnedCard], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["local_id", "card_id", "set", "name", "image_url", "favourite"])?;
    for c in cards {
        wtr.write_record([
            c.local_id.to_string(),
            c.card_id.clone(),
            c.set_id().to_string(),
            c.name.clone(),
            c.image_url.clone().unwrap_or_default(),
            if c.favourite { "1".to_string() } else { "0".to_string() },
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

async fn resolve_owned(repo: &CardRepository, card_id: &str) -> Result<OwnedCard> {
    repo.get_owned_card(card_id)
        .await?
        .ok_or_else(|| anyhow!("card not in collection: {}", card_id))
}

fn print_detail(c: &CatalogueCardDetail) {
    println!("{} ({})", c.name, c.id);
    println!("set:      {} [{}]", c.set_name, c.set_id);
    println!("rarity:   {}", c.rarity);
    println!("category: {}", c.category);
    if !c.types.is_empty() {
        println!("types:    {}", c.types.join(", "));
    }
    if !c.description.is_empty() {
        println!("{}", c.description);
    }
    if !c.image_url.is_empty() {
        println!("image:    {}", c.image_url);
    }
}

fn print_owned(cards: &[OwnedCard]) {
    for c in cards {
        let star = if c.favourite { "*" } else { " " };
        println!("{}\t{}{}\t{}", c.local_id, star, c.card_id, c.name);
    }
}

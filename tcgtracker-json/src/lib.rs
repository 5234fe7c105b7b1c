use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tcgtracker_core::{
    repo::LocalStore, CatalogueCardDetail, CatalogueSeries, CatalogueSet, CoreError, LocalId,
    OwnedCard, OwnedCardsFeed, OwnedCardsStream, OwnedTable,
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    catalogue_cards: Vec<CatalogueCardDetail>,
    catalogue_sets: Vec<CatalogueSet>,
    catalogue_series: Vec<CatalogueSeries>,
    owned: OwnedTable,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: HashMap<String, CatalogueCardDetail>,
    sets: HashMap<String, CatalogueSet>,
    series: HashMap<String, CatalogueSeries>,
    owned: OwnedTable,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            cards: HashMap::new(),
            sets: HashMap::new(),
            series: HashMap::new(),
            owned: OwnedTable::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut catalogue_cards: Vec<CatalogueCardDetail> = self.cards.values().cloned().collect();
        catalogue_cards.sort_by(|a, b| a.id.cmp(&b.id));
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            catalogue_cards,
            catalogue_sets: self.sets.values().cloned().collect(),
            catalogue_series: self.series.values().cloned().collect(),
            owned: self.owned.clone(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            cards: img.catalogue_cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
            sets: img.catalogue_sets.into_iter().map(|s| (s.id.clone(), s)).collect(),
            series: img.catalogue_series.into_iter().map(|s| (s.id.clone(), s)).collect(),
            owned: img.owned,
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // held from cloning the state until the file write lands
    write_lock: Mutex<()>,
    feed: OwnedCardsFeed,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path, &backups_dir).await?;
        log::info!(
            "opened json store at {} ({} owned cards)",
            path.display(),
            state.owned.len()
        );
        let feed = OwnedCardsFeed::new(state.owned.snapshot());
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
            feed,
        })
    }

    // A failed write leaves the live state untouched.
    async fn commit<R, F>(&self, publish: bool, change: F) -> Result<R, CoreError>
    where
        F: FnOnce(&mut State) -> Result<R, CoreError> + Send,
        R: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut next = self.state.read().clone();
        let out = change(&mut next)?;
        next.updated_at = Utc::now();

        let image = next.to_image();
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &image))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|_| CoreError::Storage("io"))?;

        let owned = publish.then(|| next.owned.snapshot());
        *self.state.write() = next;
        if let Some(snapshot) = owned {
            self.feed.publish(snapshot);
        }
        Ok(out)
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("corrupt store file")))?;
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        let img = st.to_image();
        write_with_backup(path, backups_dir, usize::MAX, &img).map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("tcgtracker-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // timestamped names sort chronologically
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl LocalStore for JsonStore {
    async fn get_catalogue_card(&self, id: &str) -> Result<Option<CatalogueCardDetail>, CoreError> {
        Ok(self.state.read().cards.get(id).cloned())
    }

    async fn put_catalogue_card(&self, card: &CatalogueCardDetail) -> Result<(), CoreError> {
        self.commit(false, |s| {
            s.cards.insert(card.id.clone(), card.clone());
            Ok(())
        })
        .await
    }

    async fn delete_catalogue_card(&self, id: &str) -> Result<bool, CoreError> {
        if !self.state.read().cards.contains_key(id) {
            return Ok(false);
        }
        self.commit(false, |s| Ok(s.cards.remove(id).is_some())).await
    }

    async fn list_catalogue_cards(&self) -> Result<Vec<CatalogueCardDetail>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<CatalogueCardDetail> = s.cards.values().cloned().collect();
        v.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(v)
    }

    async fn get_catalogue_set(&self, id: &str) -> Result<Option<CatalogueSet>, CoreError> {
        Ok(self.state.read().sets.get(id).cloned())
    }

    async fn put_catalogue_set(&self, set: &CatalogueSet) -> Result<(), CoreError> {
        self.commit(false, |s| {
            s.sets.insert(set.id.clone(), set.clone());
            Ok(())
        })
        .await
    }

    async fn get_catalogue_series(&self, id: &str) -> Result<Option<CatalogueSeries>, CoreError> {
        Ok(self.state.read().series.get(id).cloned())
    }

    async fn put_catalogue_series(&self, series: &CatalogueSeries) -> Result<(), CoreError> {
        self.commit(false, |s| {
            s.series.insert(series.id.clone(), series.clone());
            Ok(())
        })
        .await
    }

    async fn get_owned_card(&self, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        Ok(self.state.read().owned.get_by_card_id(card_id).cloned())
    }

    async fn list_owned_cards(&self) -> Result<Vec<OwnedCard>, CoreError> {
        Ok(self.state.read().owned.snapshot())
    }

    async fn upsert_owned_card(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        self.commit(true, |s| s.owned.upsert(card)).await
    }

    async fn upsert_owned_cards(&self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError> {
        self.commit(true, |s| s.owned.upsert_all(cards)).await
    }

    async fn delete_owned_card(&self, local_id: LocalId) -> Result<(), CoreError> {
        if self.state.read().owned.get(local_id).is_none() {
            return Ok(());
        }
        self.commit(true, |s| {
            s.owned.delete(local_id);
            Ok(())
        })
        .await
    }

    fn watch_owned_cards(&self) -> OwnedCardsStream {
        self.feed.subscribe()
    }
}

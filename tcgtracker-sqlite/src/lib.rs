use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;
use tokio::sync::Mutex;
use tcgtracker_core::{
    repo::LocalStore, CardCount, CatalogueCardDetail, CatalogueSeries, CatalogueSet, CoreError,
    LocalId, OwnedCard, OwnedCardsFeed, OwnedCardsStream,
};

pub struct SqliteStore {
    pool: SqlitePool,
    feed: OwnedCardsFeed,
    publish_lock: Mutex<()>,
}

impl SqliteStore {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        log::info!("opened sqlite store at {}", path.as_ref().display());
        Self::with_pool(pool).await
    }

    pub async fn open_memory() -> Result<Self, CoreError> {
        // Every connection to `sqlite::memory:` is its own database, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, CoreError> {
        let store = Self {
            pool,
            feed: OwnedCardsFeed::default(),
            publish_lock: Mutex::new(()),
        };
        store.ensure_schema().await?;
        store.feed.publish(store.select_owned().await?);
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS catalogue_cards (
          id           TEXT PRIMARY KEY,
          name         TEXT NOT NULL,
          rarity       TEXT NOT NULL,
          category     TEXT NOT NULL,
          types        TEXT NOT NULL,
          set_id       TEXT NOT NULL,
          set_name     TEXT NOT NULL,
          set_logo     TEXT NOT NULL,
          description  TEXT NOT NULL,
          image_url    TEXT NOT NULL,
          favourite    INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS catalogue_sets (
          id             TEXT PRIMARY KEY,
          name           TEXT NOT NULL,
          series_id      TEXT NOT NULL,
          logo           TEXT NOT NULL,
          release_date   TEXT NOT NULL,
          card_total     INTEGER NOT NULL DEFAULT 0,
          card_official  INTEGER NOT NULL DEFAULT 0,
          cards          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS catalogue_series (
          id     TEXT PRIMARY KEY,
          name   TEXT NOT NULL,
          logo   TEXT NOT NULL,
          sets   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS owned_cards (
          local_id   INTEGER PRIMARY KEY AUTOINCREMENT,
          card_id    TEXT NOT NULL UNIQUE,
          name       TEXT NOT NULL,
          image_url  TEXT,
          favourite  INTEGER NOT NULL DEFAULT 0,
          owned      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_catalogue_sets_series ON catalogue_sets (series_id);
        "#;

        // Execute statements one by one for compatibility.
        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }

    async fn select_owned(&self) -> Result<Vec<OwnedCard>, CoreError> {
        let rows = sqlx::query(
            "SELECT local_id,card_id,name,image_url,favourite,owned FROM owned_cards ORDER BY local_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list owned cards"))?;
        Ok(rows.into_iter().map(row_into_owned).collect())
    }

    // one select-and-publish at a time
    async fn publish_owned(&self) {
        let _guard = self.publish_lock.lock().await;
        match self.select_owned().await {
            Ok(snapshot) => self.feed.publish(snapshot),
            Err(e) => log::warn!("owned cards feed not refreshed: {}", e),
        }
    }
}

const UPSERT_OWNED: &str = r#"
    INSERT INTO owned_cards (card_id, name, image_url, favourite, owned)
    VALUES (?,?,?,?,?)
    ON CONFLICT(card_id) DO UPDATE SET
      name=excluded.name, image_url=excluded.image_url,
      favourite=excluded.favourite, owned=excluded.owned
    RETURNING local_id
"#;

#[async_trait::async_trait]
impl LocalStore for SqliteStore {
    // ===== Catalogue cards =====
    async fn get_catalogue_card(&self, id: &str) -> Result<Option<CatalogueCardDetail>, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,name,rarity,category,types,set_id,set_name,set_logo,description,image_url,favourite
               FROM catalogue_cards WHERE id=?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("read catalogue card"))?;
        row.map(row_into_detail).transpose()
    }

    async fn put_catalogue_card(&self, card: &CatalogueCardDetail) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO catalogue_cards (
              id, name, rarity, category, types, set_id, set_name, set_logo,
              description, image_url, favourite
            )
            VALUES (?,?,?,?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(&card.id)
        .bind(&card.name)
        .bind(&card.rarity)
        .bind(&card.category)
        .bind(to_json(&card.types)?)
        .bind(&card.set_id)
        .bind(&card.set_name)
        .bind(&card.set_logo)
        .bind(&card.description)
        .bind(&card.image_url)
        .bind(bool_to_i(card.favourite))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert catalogue card"))?;
        Ok(())
    }

    async fn delete_catalogue_card(&self, id: &str) -> Result<bool, CoreError> {
        let res = sqlx::query("DELETE FROM catalogue_cards WHERE id=?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("del catalogue card"))?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_catalogue_cards(&self) -> Result<Vec<CatalogueCardDetail>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,name,rarity,category,types,set_id,set_name,set_logo,description,image_url,favourite
               FROM catalogue_cards ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list catalogue cards"))?;
        rows.into_iter().map(row_into_detail).collect()
    }

    // ===== Sets / series =====
    async fn get_catalogue_set(&self, id: &str) -> Result<Option<CatalogueSet>, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,name,series_id,logo,release_date,card_total,card_official,cards
               FROM catalogue_sets WHERE id=?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("read catalogue set"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(CatalogueSet {
            id: row.get::<String, _>("id"),
            name: row.get::<String, _>("name"),
            series_id: row.get::<String, _>("series_id"),
            logo: row.get::<String, _>("logo"),
            release_date: row.get::<String, _>("release_date"),
            card_count: CardCount {
                total: row.get::<i64, _>("card_total") as u32,
                official: row.get::<i64, _>("card_official") as u32,
            },
            cards: from_json(&row.get::<String, _>("cards"))?,
        }))
    }

    async fn put_catalogue_set(&self, set: &CatalogueSet) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO catalogue_sets
               (id,name,series_id,logo,release_date,card_total,card_official,cards)
               VALUES (?,?,?,?,?,?,?,?)"#,
        )
        .bind(&set.id)
        .bind(&set.name)
        .bind(&set.series_id)
        .bind(&set.logo)
        .bind(&set.release_date)
        .bind(set.card_count.total as i64)
        .bind(set.card_count.official as i64)
        .bind(to_json(&set.cards)?)
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert catalogue set"))?;
        Ok(())
    }

    async fn get_catalogue_series(&self, id: &str) -> Result<Option<CatalogueSeries>, CoreError> {
        let row = sqlx::query("SELECT id,name,logo,sets FROM catalogue_series WHERE id=?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read catalogue series"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(CatalogueSeries {
            id: row.get::<String, _>("id"),
            name: row.get::<String, _>("name"),
            logo: row.get::<String, _>("logo"),
            sets: from_json(&row.get::<String, _>("sets"))?,
        }))
    }

    async fn put_catalogue_series(&self, series: &CatalogueSeries) -> Result<(), CoreError> {
        sqlx::query("INSERT OR REPLACE INTO catalogue_series (id,name,logo,sets) VALUES (?,?,?,?)")
            .bind(&series.id)
            .bind(&series.name)
            .bind(&series.logo)
            .bind(to_json(&series.sets)?)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("insert catalogue series"))?;
        Ok(())
    }

    // ===== Owned cards =====
    async fn get_owned_card(&self, card_id: &str) -> Result<Option<OwnedCard>, CoreError> {
        let row = sqlx::query(
            "SELECT local_id,card_id,name,image_url,favourite,owned FROM owned_cards WHERE card_id=? LIMIT 1",
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("read owned card"))?;
        Ok(row.map(row_into_owned))
    }

    async fn list_owned_cards(&self) -> Result<Vec<OwnedCard>, CoreError> {
        self.select_owned().await
    }

    async fn upsert_owned_card(&self, card: &OwnedCard) -> Result<OwnedCard, CoreError> {
        card.validate()?;
        let row = sqlx::query(UPSERT_OWNED)
            .bind(&card.card_id)
            .bind(&card.name)
            .bind(card.image_url.clone())
            .bind(bool_to_i(card.favourite))
            .bind(bool_to_i(card.owned))
            .fetch_one(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("upsert owned card"))?;
        let stored = OwnedCard {
            local_id: row.get::<i64, _>("local_id"),
            ..card.clone()
        };
        self.publish_owned().await;
        Ok(stored)
    }

    async fn upsert_owned_cards(&self, cards: &[OwnedCard]) -> Result<Vec<OwnedCard>, CoreError> {
        for card in cards {
            card.validate()?;
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let mut stored = Vec::with_capacity(cards.len());
        for card in cards {
            let row = sqlx::query(UPSERT_OWNED)
                .bind(&card.card_id)
                .bind(&card.name)
                .bind(card.image_url.clone())
                .bind(bool_to_i(card.favourite))
                .bind(bool_to_i(card.owned))
                .fetch_one(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("upsert owned card"))?;
            stored.push(OwnedCard {
                local_id: row.get::<i64, _>("local_id"),
                ..card.clone()
            });
        }

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;
        self.publish_owned().await;
        Ok(stored)
    }

    async fn delete_owned_card(&self, local_id: LocalId) -> Result<(), CoreError> {
        let res = sqlx::query("DELETE FROM owned_cards WHERE local_id=?")
            .bind(local_id)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("del owned card"))?;
        if res.rows_affected() > 0 {
            self.publish_owned().await;
        }
        Ok(())
    }

    fn watch_owned_cards(&self) -> OwnedCardsStream {
        self.feed.subscribe()
    }
}

// ===== Helpers =====
fn bool_to_i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string(value).map_err(|_| CoreError::Invalid("json column"))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, CoreError> {
    serde_json::from_str(s).map_err(|_| CoreError::Invalid("json column"))
}

fn row_into_detail(row: sqlx::sqlite::SqliteRow) -> Result<CatalogueCardDetail, CoreError> {
    Ok(CatalogueCardDetail {
        id: row.get::<String, _>("id"),
        name: row.get::<String, _>("name"),
        rarity: row.get::<String, _>("rarity"),
        category: row.get::<String, _>("category"),
        types: from_json(&row.get::<String, _>("types"))?,
        set_id: row.get::<String, _>("set_id"),
        set_name: row.get::<String, _>("set_name"),
        set_logo: row.get::<String, _>("set_logo"),
        description: row.get::<String, _>("description"),
        image_url: row.get::<String, _>("image_url"),
        favourite: row.get::<i64, _>("favourite") != 0,
    })
}

fn row_into_owned(row: sqlx::sqlite::SqliteRow) -> OwnedCard {
    OwnedCard {
        local_id: row.get::<i64, _>("local_id"),
        card_id: row.get::<String, _>("card_id"),
        name: row.get::<String, _>("name"),
        image_url: row.get::<Option<String>, _>("image_url"),
        favourite: row.get::<i64, _>("favourite") != 0,
        owned: row.get::<i64, _>("owned") != 0,
    }
}

//! SQLite record store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use agroclaw_core::traits::RecordStore;
use agroclaw_core::types::{CategoryRecord, NewsRecord, TipRecord};
use agroclaw_core::{AgroClawError, Result};

fn store_err(e: impl std::fmt::Display) -> AgroClawError {
    AgroClawError::Store(e.to_string())
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        tracing::info!("🗄️ Opened store at {}", path.display());
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT
            );
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                content TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                image_url TEXT,
                published_at TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE TABLE IF NOT EXISTS tips (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                difficulty TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(store_err)
    }

    fn news_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NewsRecord> {
        Ok(NewsRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            summary: row.get(2)?,
            content: row.get(3)?,
            category_id: row.get(4)?,
            image_url: row.get(5)?,
            published_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn tip_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TipRecord> {
        Ok(TipRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            difficulty: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn all_news(&self, limit: Option<usize>, category_id: Option<i64>) -> Result<Vec<NewsRecord>> {
        let conn = self.lock()?;
        let mut sql = String::from(
            "SELECT id, title, summary, content, category_id, image_url, published_at, created_at
             FROM news",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(cat) = category_id {
            sql.push_str(" WHERE category_id = ?1");
            params.push(Box::new(cat));
        }
        sql.push_str(" ORDER BY COALESCE(published_at, created_at) DESC, id DESC");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
                Self::news_from_row,
            )
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn get_news(&self, id: i64) -> Result<Option<NewsRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, summary, content, category_id, image_url, published_at, created_at
             FROM news WHERE id = ?1",
            [id],
            Self::news_from_row,
        )
        .optional()
        .map_err(store_err)
    }

    fn add_news(
        &self,
        title: &str,
        summary: &str,
        content: &str,
        category_id: i64,
        image_url: Option<&str>,
        published_at: Option<&str>,
    ) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO news (title, summary, content, category_id, image_url, published_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                title,
                summary,
                content,
                category_id,
                image_url,
                published_at,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn update_news(
        &self,
        id: i64,
        title: Option<&str>,
        summary: Option<&str>,
        content: Option<&str>,
        category_id: Option<i64>,
        image_url: Option<&str>,
        published_at: Option<&str>,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE news SET
                    title = COALESCE(?2, title),
                    summary = COALESCE(?3, summary),
                    content = COALESCE(?4, content),
                    category_id = COALESCE(?5, category_id),
                    image_url = COALESCE(?6, image_url),
                    published_at = COALESCE(?7, published_at)
                 WHERE id = ?1",
                rusqlite::params![id, title, summary, content, category_id, image_url, published_at],
            )
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn delete_news(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM news WHERE id = ?1", [id])
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn all_tips(&self, limit: Option<usize>, difficulty: Option<&str>) -> Result<Vec<TipRecord>> {
        let conn = self.lock()?;
        let mut sql = String::from(
            "SELECT id, title, content, difficulty, created_at FROM tips",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(d) = difficulty {
            sql.push_str(" WHERE difficulty = ?1");
            params.push(Box::new(d.to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
                Self::tip_from_row,
            )
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn get_tip(&self, id: i64) -> Result<Option<TipRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, content, difficulty, created_at FROM tips WHERE id = ?1",
            [id],
            Self::tip_from_row,
        )
        .optional()
        .map_err(store_err)
    }

    fn add_tip(&self, title: &str, content: &str, difficulty: Option<&str>) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tips (title, content, difficulty, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![title, content, difficulty, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn update_tip(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE tips SET
                    title = COALESCE(?2, title),
                    content = COALESCE(?3, content),
                    difficulty = COALESCE(?4, difficulty)
                 WHERE id = ?1",
                rusqlite::params![id, title, content, difficulty],
            )
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn delete_tip(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM tips WHERE id = ?1", [id])
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn all_categories(&self) -> Result<Vec<CategoryRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, description FROM categories ORDER BY name")
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_err)
    }

    fn get_category(&self, id: i64) -> Result<Option<CategoryRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, description FROM categories WHERE id = ?1",
            [id],
            |row| {
                Ok(CategoryRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(store_err)
    }

    fn add_category(&self, name: &str, description: Option<&str>) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO categories (name, description) VALUES (?1, ?2)",
            rusqlite::params![name, description],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_category() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let cat = store.add_category("Sulama", Some("Sulama teknikleri")).unwrap();
        (store, cat)
    }

    #[test]
    fn test_news_crud() {
        let (store, cat) = store_with_category();

        let id = store
            .add_news("Kuraklık uyarısı", "Yaz kurak", "Detaylı içerik", cat, None, Some("2026-08-01 10:00:00"))
            .unwrap();

        let news = store.get_news(id).unwrap().unwrap();
        assert_eq!(news.title, "Kuraklık uyarısı");
        assert_eq!(news.category_id, cat);
        assert_eq!(news.published_at.as_deref(), Some("2026-08-01 10:00:00"));

        assert!(store.update_news(id, Some("Güncel başlık"), None, None, None, None, None).unwrap());
        let news = store.get_news(id).unwrap().unwrap();
        assert_eq!(news.title, "Güncel başlık");
        // Untouched fields survive a partial update.
        assert_eq!(news.summary, "Yaz kurak");

        assert!(store.delete_news(id).unwrap());
        assert!(store.get_news(id).unwrap().is_none());
        assert!(!store.delete_news(id).unwrap());
    }

    #[test]
    fn test_news_filters() {
        let (store, cat1) = store_with_category();
        let cat2 = store.add_category("Gübreleme", None).unwrap();

        store.add_news("a", "s", "c", cat1, None, Some("2026-01-01")).unwrap();
        store.add_news("b", "s", "c", cat2, None, Some("2026-01-02")).unwrap();
        store.add_news("c", "s", "c", cat2, None, Some("2026-01-03")).unwrap();

        assert_eq!(store.all_news(None, None).unwrap().len(), 3);
        assert_eq!(store.all_news(None, Some(cat2)).unwrap().len(), 2);
        let limited = store.all_news(Some(1), None).unwrap();
        assert_eq!(limited.len(), 1);
        // Newest first.
        assert_eq!(limited[0].title, "c");
    }

    #[test]
    fn test_tips_crud_and_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id1 = store.add_tip("Sabah sulama", "Erken sula", Some("Kolay")).unwrap();
        store.add_tip("Budama", "Kışın buda", Some("Zor")).unwrap();
        store.add_tip("Malçlama", "Toprağı ört", None).unwrap();

        assert_eq!(store.all_tips(None, None).unwrap().len(), 3);
        let easy = store.all_tips(None, Some("Kolay")).unwrap();
        assert_eq!(easy.len(), 1);
        assert_eq!(easy[0].id, id1);

        assert!(store.update_tip(id1, None, None, Some("Orta")).unwrap());
        assert_eq!(
            store.get_tip(id1).unwrap().unwrap().difficulty.as_deref(),
            Some("Orta")
        );

        assert!(store.delete_tip(id1).unwrap());
        assert!(store.get_tip(id1).unwrap().is_none());
    }

    #[test]
    fn test_categories() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_category("Hastalıklar", None).unwrap();
        store.add_category("Bakım", Some("Genel bakım")).unwrap();

        let cats = store.all_categories().unwrap();
        assert_eq!(cats.len(), 2);
        // Alphabetical.
        assert_eq!(cats[0].name, "Bakım");

        let cat = store.get_category(id).unwrap().unwrap();
        assert_eq!(cat.name, "Hastalıklar");
        assert!(store.get_category(999).unwrap().is_none());

        // Names are unique.
        assert!(store.add_category("Bakım", None).is_err());
    }

    #[test]
    fn test_update_missing_row_reports_false() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.update_tip(42, Some("x"), None, None).unwrap());
    }
}

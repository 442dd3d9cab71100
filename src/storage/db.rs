//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::models::{Cafe, NewCafe};

const CAFE_COLUMNS: &str = "id, name, map_url, img_url, location, seats, \
     has_toilet, has_wifi, has_sockets, can_take_calls, coffee_price";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = std::path::Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("Failed to connect to SQLite database at: {}", database_path)
            })?;

        Self::from_pool(pool).await
    }

    /// Wraps an already-connected pool. Used directly by tests with an
    /// in-memory database.
    pub(crate) async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_schema(&pool)
            .await
            .context("Failed to create database schema")?;

        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cafe (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                map_url TEXT NOT NULL,
                img_url TEXT NOT NULL,
                location TEXT NOT NULL,
                seats TEXT NOT NULL,
                has_toilet BOOLEAN NOT NULL,
                has_wifi BOOLEAN NOT NULL,
                has_sockets BOOLEAN NOT NULL,
                can_take_calls BOOLEAN NOT NULL,
                coffee_price TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn list_cafes(&self) -> sqlx::Result<Vec<Cafe>> {
        sqlx::query_as(&format!("SELECT {CAFE_COLUMNS} FROM cafe ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    /// First row whose location matches exactly, in insertion order.
    pub async fn find_by_location(&self, location: &str) -> sqlx::Result<Option<Cafe>> {
        sqlx::query_as(&format!(
            "SELECT {CAFE_COLUMNS} FROM cafe WHERE location = ?1 ORDER BY id LIMIT 1"
        ))
        .bind(location)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_cafe(&self, cafe: &NewCafe) -> sqlx::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO cafe (name, map_url, img_url, location, seats,
                              has_toilet, has_wifi, has_sockets, can_take_calls,
                              coffee_price)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&cafe.name)
        .bind(&cafe.map_url)
        .bind(&cafe.img_url)
        .bind(&cafe.location)
        .bind(&cafe.seats)
        .bind(cafe.has_toilet)
        .bind(cafe.has_wifi)
        .bind(cafe.has_sockets)
        .bind(cafe.can_take_calls)
        .bind(&cafe.coffee_price)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns false when no row has that id.
    pub async fn update_coffee_price(&self, id: i64, new_price: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE cafe SET coffee_price = ?1 WHERE id = ?2")
            .bind(new_price)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no row has that id.
    pub async fn delete_cafe(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM cafe WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        Database::from_pool(pool).await.expect("schema")
    }

    fn sample(name: &str, location: &str) -> NewCafe {
        NewCafe {
            name: name.to_string(),
            map_url: "https://maps.example.com/1".to_string(),
            img_url: "https://img.example.com/1.jpg".to_string(),
            location: location.to_string(),
            seats: "10-20".to_string(),
            has_toilet: true,
            has_wifi: true,
            has_sockets: false,
            can_take_calls: false,
            coffee_price: Some("£2.50".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_then_list_round_trips_all_fields() {
        let db = test_db().await;

        let id = db.insert_cafe(&sample("Blue Bottle", "Soho")).await.unwrap();
        let cafes = db.list_cafes().await.unwrap();

        assert_eq!(cafes.len(), 1);
        let cafe = &cafes[0];
        assert_eq!(cafe.id, id);
        assert_eq!(cafe.name, "Blue Bottle");
        assert_eq!(cafe.location, "Soho");
        assert_eq!(cafe.seats, "10-20");
        assert!(cafe.has_toilet);
        assert!(cafe.has_wifi);
        assert!(!cafe.has_sockets);
        assert!(!cafe.can_take_calls);
        assert_eq!(cafe.coffee_price.as_deref(), Some("£2.50"));
    }

    #[tokio::test]
    async fn duplicate_name_is_a_unique_violation() {
        let db = test_db().await;

        db.insert_cafe(&sample("Monmouth", "Borough")).await.unwrap();
        let err = db
            .insert_cafe(&sample("Monmouth", "Covent Garden"))
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_by_location_returns_first_inserted_match() {
        let db = test_db().await;

        let first = db.insert_cafe(&sample("Kaffeine", "Fitzrovia")).await.unwrap();
        db.insert_cafe(&sample("Attendant", "Fitzrovia")).await.unwrap();

        let found = db.find_by_location("Fitzrovia").await.unwrap().unwrap();
        assert_eq!(found.id, first);

        assert!(db.find_by_location("fitzrovia").await.unwrap().is_none());
        assert!(db.find_by_location("Peckham").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_coffee_price_overwrites_existing_row() {
        let db = test_db().await;

        let id = db.insert_cafe(&sample("Workshop", "Clerkenwell")).await.unwrap();

        assert!(db.update_coffee_price(id, "£3.10").await.unwrap());
        let cafes = db.list_cafes().await.unwrap();
        assert_eq!(cafes[0].coffee_price.as_deref(), Some("£3.10"));

        assert!(!db.update_coffee_price(id + 1, "£9.99").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_row_and_reports_misses() {
        let db = test_db().await;

        let id = db.insert_cafe(&sample("Prufrock", "Holborn")).await.unwrap();

        assert!(db.delete_cafe(id).await.unwrap());
        assert!(db.list_cafes().await.unwrap().is_empty());
        assert!(!db.delete_cafe(id).await.unwrap());
    }

    #[tokio::test]
    async fn nullable_coffee_price_round_trips() {
        let db = test_db().await;

        let mut cafe = sample("Ozone", "Shoreditch");
        cafe.coffee_price = None;
        db.insert_cafe(&cafe).await.unwrap();

        let cafes = db.list_cafes().await.unwrap();
        assert_eq!(cafes[0].coffee_price, None);
    }
}

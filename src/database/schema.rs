// file: src/database/schema.rs
// description: SQLite schema management for the novel table
// reference: https://docs.rs/sqlx

use crate::database::client::NovelDbClient;
use crate::error::Result;
use tracing::{info, warn};

/// Every column of the novel table, in storage order.
pub const NOVEL_COLUMNS: [&str; 16] = [
    "id",
    "platform",
    "title",
    "info",
    "author",
    "location",
    "thumbnail",
    "tags",
    "chapter",
    "views",
    "newstatus",
    "finishstatus",
    "agegrade",
    "registdate",
    "updatedate",
    "crawltime",
];

pub fn column_list() -> String {
    NOVEL_COLUMNS.join(", ")
}

pub struct SchemaManager<'a> {
    client: &'a NovelDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a NovelDbClient) -> Self {
        Self { client }
    }

    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing SQLite schema");

        sqlx::query(&Self::create_table_sql(self.client.table_name()))
            .execute(self.client.pool())
            .await?;

        info!("Table '{}' ready", self.client.table_name());
        Ok(())
    }

    pub async fn verify_schema(&self) -> Result<bool> {
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            warn!("Table '{}' does not exist", table_name);
            return Ok(false);
        }

        info!("Table '{}' exists", table_name);
        Ok(true)
    }

    pub fn create_table_sql(table_name: &str) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table_name} (
                id INTEGER PRIMARY KEY,
                platform TEXT,
                title TEXT,
                info TEXT,
                author TEXT,
                location TEXT,
                thumbnail TEXT,
                tags TEXT,
                chapter INTEGER NOT NULL DEFAULT 0,
                views INTEGER NOT NULL DEFAULT 0,
                newstatus BOOLEAN NOT NULL DEFAULT 0,
                finishstatus BOOLEAN NOT NULL DEFAULT 0,
                agegrade BOOLEAN NOT NULL DEFAULT 0,
                registdate DATETIME,
                updatedate DATETIME,
                crawltime DATETIME
            )
            "#
        )
    }

    pub async fn drop_all_tables(&self) -> Result<()> {
        let table_name = self.client.table_name();
        warn!("Dropping table {}", table_name);

        sqlx::query(&format!("DROP TABLE IF EXISTS {table_name}"))
            .execute(self.client.pool())
            .await?;

        info!("Dropped table: {}", table_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use tempfile::TempDir;

    #[test]
    fn test_create_sql_names_every_column() {
        let sql = SchemaManager::create_table_sql("novel");
        for column in NOVEL_COLUMNS {
            assert!(sql.contains(column), "missing column {column}");
        }
    }

    #[tokio::test]
    async fn test_initialize_verify_drop() {
        let dir = TempDir::new().unwrap();
        let client = NovelDbClient::new(DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("schema.db").display()),
            table_name: "novel".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();
        let manager = SchemaManager::new(&client);

        assert!(!manager.verify_schema().await.unwrap());
        manager.initialize().await.unwrap();
        manager.initialize().await.unwrap();
        assert!(manager.verify_schema().await.unwrap());
        manager.drop_all_tables().await.unwrap();
        assert!(!manager.verify_schema().await.unwrap());
    }
}

// file: src/database/loader.rs
// description: loads the current novel table into an id-keyed baseline
// reference: https://docs.rs/sqlx

use crate::database::client::NovelDbClient;
use crate::database::schema::column_list;
use crate::error::Result;
use crate::models::NovelRecord;
use std::collections::HashMap;
use tracing::{debug, info};

/// Existing rows keyed by id, read once at the start of a run.
pub type Baseline = HashMap<i64, NovelRecord>;

pub struct BaselineLoader<'a> {
    client: &'a NovelDbClient,
}

impl<'a> BaselineLoader<'a> {
    pub fn new(client: &'a NovelDbClient) -> Self {
        Self { client }
    }

    pub async fn load(&self) -> Result<Baseline> {
        let table_name = self.client.table_name();
        debug!("Loading baseline from {}", table_name);

        let sql = format!("SELECT {} FROM {}", column_list(), table_name);
        let rows = sqlx::query_as::<_, NovelRecord>(&sql)
            .fetch_all(self.client.pool())
            .await?;

        let baseline: Baseline = rows.into_iter().map(|row| (row.id, row)).collect();

        info!("Loaded {} existing records from {}", baseline.len(), table_name);
        Ok(baseline)
    }
}

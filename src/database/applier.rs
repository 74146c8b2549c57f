// file: src/database/applier.rs
// description: chunked, all-or-nothing insert and update of reconciled rows
// reference: https://docs.rs/sqlx

use crate::database::client::NovelDbClient;
use crate::database::schema::{NOVEL_COLUMNS, column_list};
use crate::error::{PipelineError, Result};
use crate::models::NovelRecord;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub inserted: u64,
    pub updated: u64,
    pub insert_chunks: usize,
    pub update_chunks: usize,
}

/// Writes one run's inserts and full-row updates inside a single transaction.
///
/// Updates are staged chunk by chunk in a connection-local temp table and
/// merged with `UPDATE ... FROM`, so each chunk costs two statements no matter
/// how many rows it carries. Any failure rolls back every chunk of the run.
pub struct ChangeApplier<'a> {
    client: &'a NovelDbClient,
    chunk_size: usize,
}

impl<'a> ChangeApplier<'a> {
    pub fn new(client: &'a NovelDbClient, chunk_size: usize) -> Self {
        Self {
            client,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn apply(
        &self,
        inserts: &[NovelRecord],
        updates: &[NovelRecord],
    ) -> Result<ApplyStats> {
        if inserts.is_empty() && updates.is_empty() {
            info!("Nothing to apply");
            return Ok(ApplyStats::default());
        }

        let mut tx = self
            .client
            .pool()
            .begin()
            .await
            .map_err(|source| PipelineError::ApplyFailed {
                stage: "begin",
                chunk: 0,
                source,
            })?;

        match self.apply_in(&mut tx, inserts, updates).await {
            Ok(stats) => {
                tx.commit()
                    .await
                    .map_err(|source| PipelineError::ApplyFailed {
                        stage: "commit",
                        chunk: 0,
                        source,
                    })?;
                info!(
                    "Committed {} inserts and {} updates",
                    stats.inserted, stats.updated
                );
                Ok(stats)
            }
            Err(err) => {
                warn!("Apply failed, rolling back run: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn apply_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        inserts: &[NovelRecord],
        updates: &[NovelRecord],
    ) -> Result<ApplyStats> {
        let table_name = self.client.table_name();
        let mut stats = ApplyStats::default();

        for (index, chunk) in inserts.chunks(self.chunk_size).enumerate() {
            let chunk_no = index + 1;
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO {} ({}) ",
                table_name,
                column_list()
            ));
            push_rows(&mut builder, chunk);

            let result = builder
                .build()
                .execute(&mut **tx)
                .await
                .map_err(|source| PipelineError::ApplyFailed {
                    stage: "insert",
                    chunk: chunk_no,
                    source,
                })?;

            stats.inserted += result.rows_affected();
            stats.insert_chunks += 1;
            debug!("Insert chunk {} wrote {} rows", chunk_no, result.rows_affected());
        }

        if updates.is_empty() {
            return Ok(stats);
        }

        let staging = format!("{table_name}_staging");
        let stage_err = |stage: &'static str, chunk: usize| {
            move |source: sqlx::Error| PipelineError::ApplyFailed {
                stage,
                chunk,
                source,
            }
        };

        sqlx::query(&format!("DROP TABLE IF EXISTS temp.{staging}"))
            .execute(&mut **tx)
            .await
            .map_err(stage_err("stage", 0))?;
        sqlx::query(&format!(
            "CREATE TEMP TABLE {staging} AS SELECT {} FROM {table_name} WHERE 0",
            column_list()
        ))
        .execute(&mut **tx)
        .await
        .map_err(stage_err("stage", 0))?;

        let merge_sql = merge_sql(table_name, &staging);

        for (index, chunk) in updates.chunks(self.chunk_size).enumerate() {
            let chunk_no = index + 1;

            sqlx::query(&format!("DELETE FROM temp.{staging}"))
                .execute(&mut **tx)
                .await
                .map_err(stage_err("stage", chunk_no))?;

            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO temp.{} ({}) ",
                staging,
                column_list()
            ));
            push_rows(&mut builder, chunk);
            builder
                .build()
                .execute(&mut **tx)
                .await
                .map_err(stage_err("stage", chunk_no))?;

            let result = sqlx::query(&merge_sql)
                .execute(&mut **tx)
                .await
                .map_err(stage_err("update", chunk_no))?;

            if result.rows_affected() != chunk.len() as u64 {
                warn!(
                    "Update chunk {} matched {} of {} rows",
                    chunk_no,
                    result.rows_affected(),
                    chunk.len()
                );
            }

            stats.updated += result.rows_affected();
            stats.update_chunks += 1;
            debug!("Update chunk {} wrote {} rows", chunk_no, result.rows_affected());
        }

        sqlx::query(&format!("DROP TABLE temp.{staging}"))
            .execute(&mut **tx)
            .await
            .map_err(stage_err("stage", 0))?;

        Ok(stats)
    }
}

fn merge_sql(table_name: &str, staging: &str) -> String {
    let assignments = NOVEL_COLUMNS
        .iter()
        .filter(|column| **column != "id")
        .map(|column| format!("{column} = s.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE {table_name} SET {assignments} FROM temp.{staging} AS s WHERE {table_name}.id = s.id"
    )
}

fn push_rows(builder: &mut QueryBuilder<'_, Sqlite>, rows: &[NovelRecord]) {
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id)
            .push_bind(row.platform.clone())
            .push_bind(row.title.clone())
            .push_bind(row.info.clone())
            .push_bind(row.author.clone())
            .push_bind(row.location.clone())
            .push_bind(row.thumbnail.clone())
            .push_bind(row.tags.clone())
            .push_bind(row.chapter)
            .push_bind(row.views)
            .push_bind(row.newstatus)
            .push_bind(row.finishstatus)
            .push_bind(row.agegrade)
            .push_bind(row.registdate)
            .push_bind(row.updatedate)
            .push_bind(row.crawltime);
    });
}

//! Repository over source, derived and access records.
//!
//! All writes go through here. Each public write runs in a single
//! transaction, and bulk writes are split into batches sized by
//! [`calc_batch_size`] so that no statement exceeds the backend's
//! bound-parameter limit. A failing batch rolls back the whole call.

use crate::batch::calc_batch_size;
use crate::error::{ErrorKind, Result};
use crate::models::{
    AccessRecord, AccessRow, DerivedRecord, DerivedRow, SourceField, SourceRecord, SourceRow,
};
use crate::query::{DerivedQuery, SourceQuery};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use kodak_manip::ImageFormat;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;
use uuid::Uuid;

const SOURCE_INSERT: &str = "INSERT INTO sources (id, created, name, source, format, deleted, checksum) ";

/// Persistence facade for the catalog.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    parameter_limit: Option<usize>,
}
impl Repository {
    /// Create a repository over `pool`. `parameter_limit` is the maximum
    /// number of bound parameters the backend accepts per statement, if
    /// known.
    pub fn new(pool: SqlitePool, parameter_limit: Option<usize>) -> Self {
        Self { pool, parameter_limit }
    }

    fn batch_size(&self, fields: usize, records: usize) -> Result<usize> {
        match calc_batch_size(self.parameter_limit, fields, records) {
            0 => exn::bail!(ErrorKind::ParameterLimit(self.parameter_limit.unwrap_or_default())),
            size => Ok(size),
        }
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Insert a single source record.
    pub async fn create_source(&self, record: &SourceRecord) -> Result<()> {
        let row = SourceRow::try_from(record)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_source.sql"))
            .bind(row.id)
            .bind(row.created)
            .bind(row.name)
            .bind(row.source)
            .bind(row.format)
            .bind(row.deleted)
            .bind(row.checksum)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert many source records in one transaction, batched to fit the
    /// parameter limit. Returns the number of records inserted.
    #[instrument(skip_all, fields(records = records.len(), batch_size))]
    pub async fn create_sources(&self, records: &[SourceRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows = records.iter().map(SourceRow::try_from).collect::<Result<Vec<_>>>()?;
        let batch_size = self.batch_size(SourceRow::FIELDS, rows.len())?;
        tracing::Span::current().record("batch_size", batch_size);

        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut inserted = 0;
        for chunk in rows.chunks(batch_size) {
            let mut builder = QueryBuilder::<Sqlite>::new(SOURCE_INSERT);
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.id.clone())
                    .push_bind(row.created)
                    .push_bind(row.name.clone())
                    .push_bind(row.source.clone())
                    .push_bind(row.format.clone())
                    .push_bind(row.deleted)
                    .push_bind(row.checksum.clone());
            });
            let result = builder.build().execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(inserted, "Created source records");
        Ok(inserted)
    }

    /// Rewrite only `fields` of each record, matched by id, in one
    /// transaction. Returns the number of rows updated.
    #[instrument(skip_all, fields(records = records.len(), fields = ?fields, batch_size))]
    pub async fn update_sources(&self, records: &[SourceRecord], fields: &[SourceField]) -> Result<usize> {
        if records.is_empty() || fields.is_empty() {
            return Ok(0);
        }
        let rows = records.iter().map(SourceRow::try_from).collect::<Result<Vec<_>>>()?;
        // Every field binds an id and a value per record; the id list binds
        // one more, which is the reserve calc_batch_size keeps.
        let batch_size = self.batch_size(fields.len() * 2, rows.len())?;
        tracing::Span::current().record("batch_size", batch_size);

        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut updated = 0;
        for chunk in rows.chunks(batch_size) {
            let mut builder = QueryBuilder::<Sqlite>::new("UPDATE sources SET ");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                builder.push(field.column()).push(" = CASE id");
                for row in chunk {
                    builder.push(" WHEN ").push_bind(row.id.clone()).push(" THEN ");
                    match field {
                        SourceField::Name => builder.push_bind(row.name.clone()),
                        SourceField::Source => builder.push_bind(row.source.clone()),
                        SourceField::Format => builder.push_bind(row.format.clone()),
                        SourceField::Deleted => builder.push_bind(row.deleted),
                        SourceField::Checksum => builder.push_bind(row.checksum.clone()),
                    };
                }
                builder.push(" END");
            }
            builder.push(" WHERE id IN (");
            let mut ids = builder.separated(", ");
            for row in chunk {
                ids.push_bind(row.id.clone());
            }
            ids.push_unseparated(")");
            let result = builder.build().execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
            updated += result.rows_affected() as usize;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(updated, "Updated source records");
        Ok(updated)
    }

    /// Stream source records matching `query`, newest first.
    pub fn sources<'a>(&'a self, query: &SourceQuery) -> BoxStream<'a, Result<SourceRecord>> {
        let builder = query.build();
        Box::pin(stream! {
            let mut builder = match builder {
                Ok(builder) => builder,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let mut rows = builder.build_query_as::<SourceRow>().fetch(&self.pool);
            while let Some(row) = rows.next().await {
                yield row.or_raise(|| ErrorKind::Database).and_then(SourceRecord::try_from);
            }
        })
    }

    /// Collect [`sources()`](Self::sources) into a [`Vec`].
    pub async fn fetch_sources(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>> {
        self.sources(query).try_collect().await
    }

    // =========================================================================
    // Derived
    // =========================================================================

    /// Insert a single derived record.
    pub async fn create_derived(&self, record: &DerivedRecord) -> Result<()> {
        let row = DerivedRow::try_from(record)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_derived.sql"))
            .bind(row.id)
            .bind(row.created)
            .bind(row.parent)
            .bind(row.name)
            .bind(row.file)
            .bind(row.format)
            .bind(row.checksum)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert `record` unless a derived record for the same parent, name
    /// and format already exists.
    ///
    /// Returns the stored record and whether it was created by this call.
    /// When another writer got there first, their (latest) record is
    /// returned instead of an error.
    #[instrument(skip_all, fields(parent = %record.parent, name = %record.name, format = %record.format))]
    pub async fn get_or_create_derived(&self, record: DerivedRecord) -> Result<(DerivedRecord, bool)> {
        let row = DerivedRow::try_from(&record)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        // A single conditional insert takes the write lock before looking,
        // so the check and the insert can't be split by another writer.
        let result = sqlx::query(include_str!("../queries/insert_derived_if_absent.sql"))
            .bind(row.id.as_str())
            .bind(row.created)
            .bind(row.parent.as_str())
            .bind(row.name.as_str())
            .bind(row.file.as_str())
            .bind(row.format.as_str())
            .bind(row.checksum.as_str())
            .bind(row.parent.as_str())
            .bind(row.name.as_str())
            .bind(row.format.as_str())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 1 {
            tx.commit().await.or_raise(|| ErrorKind::Database)?;
            tracing::debug!(id = %record.meta.id, "Created derived record");
            return Ok((record, true));
        }
        let existing: DerivedRow = sqlx::query_as(include_str!("../queries/latest_derived.sql"))
            .bind(row.parent.as_str())
            .bind(row.name.as_str())
            .bind(row.format.as_str())
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(id = %existing.id, "Derived record already existed");
        Ok((DerivedRecord::try_from(existing)?, false))
    }

    /// Latest derived record for a parent, manip name and format.
    pub async fn latest_derived(&self, parent: Uuid, name: &str, format: ImageFormat) -> Result<Option<DerivedRecord>> {
        let row: Option<DerivedRow> = sqlx::query_as(include_str!("../queries/latest_derived.sql"))
            .bind(parent.to_string())
            .bind(name)
            .bind(format.as_name())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(DerivedRecord::try_from).transpose()
    }

    /// Stream derived records matching `query`, newest first.
    pub fn derived<'a>(&'a self, query: &DerivedQuery) -> BoxStream<'a, Result<DerivedRecord>> {
        let builder = query.build();
        Box::pin(stream! {
            let mut builder = match builder {
                Ok(builder) => builder,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let mut rows = builder.build_query_as::<DerivedRow>().fetch(&self.pool);
            while let Some(row) = rows.next().await {
                yield row.or_raise(|| ErrorKind::Database).and_then(DerivedRecord::try_from);
            }
        })
    }

    /// Collect [`derived()`](Self::derived) into a [`Vec`].
    pub async fn fetch_derived(&self, query: &DerivedQuery) -> Result<Vec<DerivedRecord>> {
        self.derived(query).try_collect().await
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub async fn create_access(&self, record: &AccessRecord) -> Result<()> {
        let row = AccessRow::from(record);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_access.sql"))
            .bind(row.id)
            .bind(row.created)
            .bind(row.password)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn get_access(&self, id: Uuid) -> Result<Option<AccessRecord>> {
        let row: Option<AccessRow> = sqlx::query_as(include_str!("../queries/get_access.sql"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(AccessRecord::try_from).transpose()
    }
}

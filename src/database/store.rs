use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::filter::{Filters, Metadata};

/// SQLSTATE class for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The conditional update matched no row: the record changed (or was
    /// deleted) since the caller read it.
    #[error("edit conflict")]
    EditConflict,

    /// A unique constraint rejected the write. Kept distinct from
    /// [`StoreError::EditConflict`]: the two warrant different
    /// client-facing messages.
    #[error("duplicate value violates unique constraint {0}")]
    Duplicate(String),

    #[error("query timed out")]
    Timeout,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(db.constraint().unwrap_or("unknown").to_string());
        }
    }
    StoreError::Sqlx(err)
}

/// Generic versioned record store: one implementation of the CRUD and
/// compare-and-swap contract, parameterized by the row shape and sort
/// safelist of each resource.
pub struct Store<T> {
    pool: PgPool,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Store<T> {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn query_timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a store future under the configured timeout. A timed-out call is
    /// abandoned from the caller's perspective even if the engine-side
    /// operation is still unwinding.
    pub(crate) async fn run<F, R>(&self, fut: F) -> Result<R, StoreError>
    where
        F: Future<Output = Result<R, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(StoreError::Timeout),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<T, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            T::COLUMNS.join(", "),
            T::TABLE
        );
        let row = self
            .run(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool))
            .await?;
        row.ok_or(StoreError::NotFound)
    }

    /// Insert the record, absorbing the server-assigned identifier,
    /// creation timestamp and initial version (1) from the same statement.
    pub async fn insert(&self, entity: &mut T) -> Result<(), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(T::TABLE)
            .push(" (")
            .push(T::INSERT_COLUMNS.join(", "))
            .push(") VALUES (");
        entity.push_insert_values(&mut qb);
        qb.push(") RETURNING id, created_at, version");

        let row = self.run(qb.build().fetch_one(&self.pool)).await?;
        entity.absorb_insert(&row)?;
        Ok(())
    }

    /// Compare-and-swap update: the identifier match and the version match
    /// are expressed in a single conditional statement, so the version test
    /// and increment are atomic and concurrent writers cannot lose updates.
    /// Zero rows matched means another writer committed first; the caller
    /// observes [`StoreError::EditConflict`] and may re-read and retry —
    /// the store never retries on its own.
    pub async fn update(&self, entity: &mut T) -> Result<(), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(T::TABLE).push(" SET ");
        entity.push_update_assignments(&mut qb);
        qb.push(", updated_at = now(), version = version + 1 WHERE id = ");
        qb.push_bind(entity.id());
        qb.push(" AND version = ");
        qb.push_bind(entity.version());
        qb.push(" RETURNING updated_at, version");

        match self.run(qb.build().fetch_optional(&self.pool)).await? {
            Some(row) => {
                entity.absorb_update(&row)?;
                Ok(())
            }
            None => Err(StoreError::EditConflict),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if id.is_nil() {
            return Err(StoreError::NotFound);
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = self
            .run(sqlx::query(&sql).bind(id).execute(&self.pool))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Fetch one page of records together with the total count. The count
    /// comes from a window aggregate alongside the page rows, so the
    /// reported total and the returned page are drawn from one consistent
    /// snapshot of the query rather than two round trips that could race
    /// against concurrent writes.
    pub async fn list(
        &self,
        filter: &T::ListFilter,
        filters: &Filters,
    ) -> Result<(Vec<T>, Metadata), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT count(*) OVER() AS total_records, {} FROM {} WHERE true",
            T::COLUMNS.join(", "),
            T::TABLE
        ));
        T::push_list_predicates(filter, &mut qb);
        qb.push(format!(
            " ORDER BY {} {}, id ASC",
            filters.sort_column(),
            filters.sort_direction()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(filters.limit());
        qb.push(" OFFSET ");
        qb.push_bind(filters.offset());

        let rows = self.run(qb.build().fetch_all(&self.pool)).await?;

        let mut total_records: i64 = 0;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row.try_get("total_records")?;
            records.push(T::from_row(row)?);
        }

        let metadata = Metadata::calculate(total_records, filters.page, filters.page_size);
        Ok((records, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::officer::Officer;

    fn sample_officer() -> Officer {
        Officer {
            id: Uuid::new_v4(),
            regulation_number: Some("12345".to_string()),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            sex: "male".to_string(),
            rank_code: "CONSTABLE".to_string(),
            region_id: None,
            formation_id: None,
            posting_id: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
            archived_at: None,
            version: 3,
        }
    }

    #[test]
    fn update_sql_is_a_single_conditional_statement() {
        // The version test and increment must live in one statement so the
        // lost-update race is closed by the storage engine, not by locks.
        let officer = sample_officer();
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(Officer::TABLE).push(" SET ");
        officer.push_update_assignments(&mut qb);
        qb.push(", updated_at = now(), version = version + 1 WHERE id = ");
        qb.push_bind(officer.id());
        qb.push(" AND version = ");
        qb.push_bind(officer.version());
        qb.push(" RETURNING updated_at, version");

        let sql = qb.sql();
        assert!(sql.contains("version = version + 1"));
        assert!(sql.contains("AND version = "));
        assert!(sql.contains("RETURNING updated_at, version"));
        assert!(sql.starts_with("UPDATE officers SET "));
    }

    #[test]
    fn insert_sql_returns_server_assigned_columns() {
        let officer = sample_officer();
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(Officer::TABLE)
            .push(" (")
            .push(Officer::INSERT_COLUMNS.join(", "))
            .push(") VALUES (");
        officer.push_insert_values(&mut qb);
        qb.push(") RETURNING id, created_at, version");

        let sql = qb.sql();
        assert!(sql.contains("INSERT INTO officers (regulation_number, first_name"));
        assert!(sql.ends_with("RETURNING id, created_at, version"));
    }

    #[test]
    fn classify_passes_unrecognized_errors_through() {
        // Only unique violations are reinterpreted here; everything else
        // stays an opaque engine error.
        let err = classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Sqlx(_)));
    }
}

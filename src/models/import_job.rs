use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::{permitted, Validator};

pub const STATUS_PENDING: &str = "pending";

/// A bulk-import request. Jobs are created pending and advanced by the
/// importer; the HTTP surface only creates and reads them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ImportJob {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl ImportJob {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.kind.is_empty(), "kind", "must be provided");
        v.check(
            permitted(&self.kind, &["officers", "attendance", "courses"]),
            "kind",
            "must be one of officers, attendance, or courses",
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportJobListFilter {
    pub kind: String,
    pub status: String,
}

impl Entity for ImportJob {
    const TABLE: &'static str = "import_jobs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "kind",
        "status",
        "error_message",
        "created_by_user_id",
        "created_at",
        "finished_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &["kind", "status", "created_by_user_id"];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "kind",
        "status",
        "created_at",
        "-id",
        "-kind",
        "-status",
        "-created_at",
    ];

    type ListFilter = ImportJobListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.kind.clone());
        values.push_bind(self.status.clone());
        values.push_bind(self.created_by_user_id);
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("status = ");
        sets.push_bind_unseparated(self.status.clone());
        sets.push("error_message = ");
        sets.push_bind_unseparated(self.error_message.clone());
        sets.push("finished_at = ");
        sets.push_bind_unseparated(self.finished_at);
    }

    fn push_list_predicates(filter: &ImportJobListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (kind = ");
        qb.push_bind(filter.kind.clone());
        qb.push(" OR ");
        qb.push_bind(filter.kind.clone());
        qb.push(" = '')");

        qb.push(" AND (status = ");
        qb.push_bind(filter.status.clone());
        qb.push(" OR ");
        qb.push_bind(filter.status.clone());
        qb.push(" = '')");
    }

    fn absorb_insert(&mut self, row: &PgRow) -> Result<(), sqlx::Error> {
        self.id = row.try_get("id")?;
        self.created_at = row.try_get("created_at")?;
        self.version = row.try_get("version")?;
        Ok(())
    }

    fn absorb_update(&mut self, row: &PgRow) -> Result<(), sqlx::Error> {
        self.updated_at = row.try_get("updated_at")?;
        self.version = row.try_get("version")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_safelisted() {
        let job = ImportJob {
            id: Uuid::nil(),
            kind: "payroll".to_string(),
            status: STATUS_PENDING.to_string(),
            error_message: None,
            created_by_user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            finished_at: None,
            updated_at: None,
            version: 0,
        };

        let mut v = Validator::new();
        job.validate(&mut v);
        assert!(!v.is_valid());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::Validator;

/// Assignment of a facilitator to a session.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionFacilitator {
    pub id: Uuid,
    pub session_id: Uuid,
    pub facilitator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl SessionFacilitator {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.session_id.is_nil(), "session_id", "must be provided");
        v.check(
            !self.facilitator_id.is_nil(),
            "facilitator_id",
            "must be provided",
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionFacilitatorListFilter {
    pub session_id: Option<Uuid>,
    pub facilitator_id: Option<Uuid>,
}

impl Entity for SessionFacilitator {
    const TABLE: &'static str = "session_facilitators";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "session_id",
        "facilitator_id",
        "role",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &["session_id", "facilitator_id", "role"];
    const SORT_SAFELIST: &'static [&'static str] = &["id", "created_at", "-id", "-created_at"];

    type ListFilter = SessionFacilitatorListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.session_id);
        values.push_bind(self.facilitator_id);
        values.push_bind(self.role.clone());
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("role = ");
        sets.push_bind_unseparated(self.role.clone());
    }

    fn push_list_predicates(
        filter: &SessionFacilitatorListFilter,
        qb: &mut QueryBuilder<'_, Postgres>,
    ) {
        qb.push(" AND (session_id = ");
        qb.push_bind(filter.session_id.unwrap_or_else(Uuid::nil));
        qb.push(" OR ");
        qb.push_bind(filter.session_id.is_none());
        qb.push(")");

        qb.push(" AND (facilitator_id = ");
        qb.push_bind(filter.facilitator_id.unwrap_or_else(Uuid::nil));
        qb.push(" OR ");
        qb.push_bind(filter.facilitator_id.is_none());
        qb.push(")");
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

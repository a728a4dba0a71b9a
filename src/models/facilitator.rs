use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::Validator;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Facilitator {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Facilitator {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.first_name.is_empty(), "first_name", "must be provided");
        v.check(!self.last_name.is_empty(), "last_name", "must be provided");
    }
}

#[derive(Debug, Clone, Default)]
pub struct FacilitatorListFilter {
    pub last_name: String,
}

impl Entity for Facilitator {
    const TABLE: &'static str = "facilitators";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "notes",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &["first_name", "last_name", "notes"];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "-id",
        "-first_name",
        "-last_name",
    ];

    type ListFilter = FacilitatorListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.first_name.clone());
        values.push_bind(self.last_name.clone());
        values.push_bind(self.notes.clone());
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("first_name = ");
        sets.push_bind_unseparated(self.first_name.clone());
        sets.push("last_name = ");
        sets.push_bind_unseparated(self.last_name.clone());
        sets.push("notes = ");
        sets.push_bind_unseparated(self.notes.clone());
    }

    fn push_list_predicates(filter: &FacilitatorListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (to_tsvector('simple', last_name) @@ plainto_tsquery('simple', ");
        qb.push_bind(filter.last_name.clone());
        qb.push(") OR ");
        qb.push_bind(filter.last_name.clone());
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

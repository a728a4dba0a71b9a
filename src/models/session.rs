use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::Validator;

/// A scheduled delivery of a course.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub course_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Session {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.course_id.is_nil(), "course_id", "must be provided");
        v.check(!self.location.is_empty(), "location", "must be provided");
        v.check(self.end_at > self.start_at, "end_at", "must be after start_at");
    }
}

/// Narrow session lists to one course; a nil id matches all sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionListFilter {
    pub course_id: Option<Uuid>,
}

impl Entity for Session {
    const TABLE: &'static str = "sessions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "course_id",
        "start_at",
        "end_at",
        "location",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["course_id", "start_at", "end_at", "location"];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "start_at",
        "end_at",
        "created_at",
        "-id",
        "-start_at",
        "-end_at",
        "-created_at",
    ];

    type ListFilter = SessionListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.course_id);
        values.push_bind(self.start_at);
        values.push_bind(self.end_at);
        values.push_bind(self.location.clone());
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("course_id = ");
        sets.push_bind_unseparated(self.course_id);
        sets.push("start_at = ");
        sets.push_bind_unseparated(self.start_at);
        sets.push("end_at = ");
        sets.push_bind_unseparated(self.end_at);
        sets.push("location = ");
        sets.push_bind_unseparated(self.location.clone());
    }

    fn push_list_predicates(filter: &SessionListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (course_id = ");
        qb.push_bind(filter.course_id.unwrap_or_else(Uuid::nil));
        qb.push(" OR ");
        qb.push_bind(filter.course_id.is_none());
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn end_must_follow_start() {
        let start = Utc::now();
        let session = Session {
            id: Uuid::nil(),
            course_id: Uuid::new_v4(),
            start_at: start,
            end_at: start - Duration::hours(1),
            location: "Academy Hall B".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        };

        let mut v = Validator::new();
        session.validate(&mut v);
        assert!(!v.is_valid());
    }
}

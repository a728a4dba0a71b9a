use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::{permitted, Validator};

/// An officer's attendance record for one session.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub officer_id: Uuid,
    pub session_id: Uuid,
    pub status: String,
    pub credited_hours: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Attendance {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.officer_id.is_nil(), "officer_id", "must be provided");
        v.check(!self.session_id.is_nil(), "session_id", "must be provided");
        v.check(
            permitted(&self.status, &["attended", "absent", "excused"]),
            "status",
            "must be one of attended, absent, or excused",
        );
        v.check(
            self.credited_hours >= 0.0,
            "credited_hours",
            "must be zero or greater",
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceListFilter {
    pub officer_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub status: String,
}

impl Entity for Attendance {
    const TABLE: &'static str = "attendance";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "officer_id",
        "session_id",
        "status",
        "credited_hours",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["officer_id", "session_id", "status", "credited_hours"];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "status",
        "credited_hours",
        "created_at",
        "-id",
        "-status",
        "-credited_hours",
        "-created_at",
    ];

    type ListFilter = AttendanceListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.officer_id);
        values.push_bind(self.session_id);
        values.push_bind(self.status.clone());
        values.push_bind(self.credited_hours);
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("status = ");
        sets.push_bind_unseparated(self.status.clone());
        sets.push("credited_hours = ");
        sets.push_bind_unseparated(self.credited_hours);
    }

    fn push_list_predicates(filter: &AttendanceListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (officer_id = ");
        qb.push_bind(filter.officer_id.unwrap_or_else(Uuid::nil));
        qb.push(" OR ");
        qb.push_bind(filter.officer_id.is_none());
        qb.push(")");

        qb.push(" AND (session_id = ");
        qb.push_bind(filter.session_id.unwrap_or_else(Uuid::nil));
        qb.push(" OR ");
        qb.push_bind(filter.session_id.is_none());
        qb.push(")");

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
    fn status_outside_safelist_rejected() {
        let record = Attendance {
            id: Uuid::nil(),
            officer_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            status: "late".to_string(),
            credited_hours: 2.0,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        };

        let mut v = Validator::new();
        record.validate(&mut v);
        assert!(!v.is_valid());
    }
}

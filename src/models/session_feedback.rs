use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::Validator;

/// An officer's rating of a facilitator for one session.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionFeedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub officer_id: Uuid,
    pub facilitator_id: Uuid,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl SessionFeedback {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.session_id.is_nil(), "session_id", "must be provided");
        v.check(!self.officer_id.is_nil(), "officer_id", "must be provided");
        v.check(
            !self.facilitator_id.is_nil(),
            "facilitator_id",
            "must be provided",
        );
        v.check(
            (1.0..=5.0).contains(&self.rating),
            "rating",
            "must be between 1 and 5",
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionFeedbackListFilter {
    pub session_id: Option<Uuid>,
    pub facilitator_id: Option<Uuid>,
}

impl Entity for SessionFeedback {
    const TABLE: &'static str = "session_feedback";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "session_id",
        "officer_id",
        "facilitator_id",
        "rating",
        "comments",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "session_id",
        "officer_id",
        "facilitator_id",
        "rating",
        "comments",
    ];
    const SORT_SAFELIST: &'static [&'static str] =
        &["id", "rating", "created_at", "-id", "-rating", "-created_at"];

    type ListFilter = SessionFeedbackListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.session_id);
        values.push_bind(self.officer_id);
        values.push_bind(self.facilitator_id);
        values.push_bind(self.rating);
        values.push_bind(self.comments.clone());
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("rating = ");
        sets.push_bind_unseparated(self.rating);
        sets.push("comments = ");
        sets.push_bind_unseparated(self.comments.clone());
    }

    fn push_list_predicates(
        filter: &SessionFeedbackListFilter,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        let mut feedback = SessionFeedback {
            id: Uuid::nil(),
            session_id: Uuid::new_v4(),
            officer_id: Uuid::new_v4(),
            facilitator_id: Uuid::new_v4(),
            rating: 5.5,
            comments: None,
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        };

        let mut v = Validator::new();
        feedback.validate(&mut v);
        assert!(!v.is_valid());

        feedback.rating = 4.5;
        let mut v = Validator::new();
        feedback.validate(&mut v);
        assert!(v.is_valid());
    }
}

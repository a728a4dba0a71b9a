use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::{permitted, Validator};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub default_credit_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_by_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Course {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.title.is_empty(), "title", "must be provided");
        v.check(self.title.len() <= 255, "title", "must not exceed 255 bytes");
        v.check(!self.category.is_empty(), "category", "must be provided");
        v.check(
            permitted(&self.category, &["mandatory", "elective", "instructor"]),
            "category",
            "invalid category type",
        );
        v.check(
            self.default_credit_hours > 0.0,
            "default_credit_hours",
            "must be greater than zero",
        );
    }
}

/// Title search plus exact category match; empty values match all records.
#[derive(Debug, Clone, Default)]
pub struct CourseListFilter {
    pub title: String,
    pub category: String,
}

impl Entity for Course {
    const TABLE: &'static str = "courses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "category",
        "default_credit_hours",
        "description",
        "created_by_user_id",
        "created_at",
        "updated_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "title",
        "category",
        "default_credit_hours",
        "description",
        "created_by_user_id",
    ];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "title",
        "category",
        "default_credit_hours",
        "created_at",
        "-id",
        "-title",
        "-category",
        "-default_credit_hours",
        "-created_at",
    ];

    type ListFilter = CourseListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.title.clone());
        values.push_bind(self.category.clone());
        values.push_bind(self.default_credit_hours);
        values.push_bind(self.description.clone());
        values.push_bind(self.created_by_user_id);
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("title = ");
        sets.push_bind_unseparated(self.title.clone());
        sets.push("category = ");
        sets.push_bind_unseparated(self.category.clone());
        sets.push("default_credit_hours = ");
        sets.push_bind_unseparated(self.default_credit_hours);
        sets.push("description = ");
        sets.push_bind_unseparated(self.description.clone());
    }

    fn push_list_predicates(filter: &CourseListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (to_tsvector('simple', title) @@ plainto_tsquery('simple', ");
        qb.push_bind(filter.title.clone());
        qb.push(") OR ");
        qb.push_bind(filter.title.clone());
        qb.push(" = '')");

        qb.push(" AND (category = ");
        qb.push_bind(filter.category.clone());
        qb.push(" OR ");
        qb.push_bind(filter.category.clone());
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
    fn category_safelist_enforced() {
        let course = Course {
            id: Uuid::nil(),
            title: "Firearms Safety".to_string(),
            category: "optional".to_string(),
            default_credit_hours: 8.0,
            description: None,
            created_by_user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: None,
            version: 0,
        };

        let mut v = Validator::new();
        course.validate(&mut v);
        assert!(!v.is_valid());
    }
}

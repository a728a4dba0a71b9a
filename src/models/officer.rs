use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::validation::{permitted, Validator};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Officer {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulation_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub rank_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub version: i32,
}

impl Officer {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.first_name.is_empty(), "first_name", "must be provided");
        v.check(
            self.first_name.len() <= 100,
            "first_name",
            "must not exceed 100 bytes",
        );
        v.check(!self.last_name.is_empty(), "last_name", "must be provided");
        v.check(
            self.last_name.len() <= 100,
            "last_name",
            "must not exceed 100 bytes",
        );
        v.check(!self.sex.is_empty(), "sex", "must be provided");
        v.check(
            permitted(&self.sex, &["male", "female", "unknown"]),
            "sex",
            "must be male, female, or unknown",
        );
        v.check(!self.rank_code.is_empty(), "rank_code", "must be provided");
    }
}

/// Search parameters for officer list queries. Empty strings match all
/// records, mirroring the SQL predicates below.
#[derive(Debug, Clone, Default)]
pub struct OfficerListFilter {
    pub first_name: String,
    pub last_name: String,
    pub rank_code: String,
}

impl Entity for Officer {
    const TABLE: &'static str = "officers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "regulation_number",
        "first_name",
        "last_name",
        "sex",
        "rank_code",
        "region_id",
        "formation_id",
        "posting_id",
        "created_at",
        "updated_at",
        "archived_at",
        "version",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "regulation_number",
        "first_name",
        "last_name",
        "sex",
        "rank_code",
        "region_id",
        "formation_id",
        "posting_id",
    ];
    const SORT_SAFELIST: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "rank_code",
        "created_at",
        "-id",
        "-first_name",
        "-last_name",
        "-rank_code",
        "-created_at",
    ];

    type ListFilter = OfficerListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.regulation_number.clone());
        values.push_bind(self.first_name.clone());
        values.push_bind(self.last_name.clone());
        values.push_bind(self.sex.clone());
        values.push_bind(self.rank_code.clone());
        values.push_bind(self.region_id);
        values.push_bind(self.formation_id);
        values.push_bind(self.posting_id);
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("regulation_number = ");
        sets.push_bind_unseparated(self.regulation_number.clone());
        sets.push("first_name = ");
        sets.push_bind_unseparated(self.first_name.clone());
        sets.push("last_name = ");
        sets.push_bind_unseparated(self.last_name.clone());
        sets.push("sex = ");
        sets.push_bind_unseparated(self.sex.clone());
        sets.push("rank_code = ");
        sets.push_bind_unseparated(self.rank_code.clone());
        sets.push("region_id = ");
        sets.push_bind_unseparated(self.region_id);
        sets.push("formation_id = ");
        sets.push_bind_unseparated(self.formation_id);
        sets.push("posting_id = ");
        sets.push_bind_unseparated(self.posting_id);
    }

    fn push_list_predicates(filter: &OfficerListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        // Simple-dictionary full-text match on names; empty search values
        // match everything.
        qb.push(" AND (to_tsvector('simple', first_name) @@ plainto_tsquery('simple', ");
        qb.push_bind(filter.first_name.clone());
        qb.push(") OR ");
        qb.push_bind(filter.first_name.clone());
        qb.push(" = '')");

        qb.push(" AND (to_tsvector('simple', last_name) @@ plainto_tsquery('simple', ");
        qb.push_bind(filter.last_name.clone());
        qb.push(") OR ");
        qb.push_bind(filter.last_name.clone());
        qb.push(" = '')");

        qb.push(" AND (LOWER(rank_code) = LOWER(");
        qb.push_bind(filter.rank_code.clone());
        qb.push(") OR ");
        qb.push_bind(filter.rank_code.clone());
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

    fn valid_officer() -> Officer {
        Officer {
            id: Uuid::nil(),
            regulation_number: Some("12345".to_string()),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            sex: "male".to_string(),
            rank_code: "CONSTABLE".to_string(),
            region_id: None,
            formation_id: None,
            posting_id: None,
            created_at: Utc::now(),
            updated_at: None,
            archived_at: None,
            version: 0,
        }
    }

    #[test]
    fn valid_officer_passes() {
        let mut v = Validator::new();
        valid_officer().validate(&mut v);
        assert!(v.is_valid());
    }

    #[test]
    fn invalid_sex_and_missing_names_collected_together() {
        let mut officer = valid_officer();
        officer.first_name = String::new();
        officer.sex = "other".to_string();

        let mut v = Validator::new();
        officer.validate(&mut v);
        let err = v.into_result().unwrap_err();
        match err {
            crate::error::ApiError::ValidationFailed(errors) => {
                assert!(errors.contains_key("first_name"));
                assert!(errors.contains_key("sex"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn safelist_covers_descending_variants() {
        assert!(Officer::SORT_SAFELIST.contains(&"-last_name"));
        assert!(!Officer::SORT_SAFELIST.contains(&"password_hash"));
    }
}

use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::database::store::{Store, StoreError};
use crate::models::token::{digest, TokenScope};
use crate::validation::{validate_email, Validator};

/// Unique constraint on users.email; violations surface as a
/// duplicate-email outcome rather than a generic conflict.
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub activated: bool,
    #[serde(skip_serializing)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a not-yet-persisted user; identifier, timestamps and version
    /// are assigned by the store on insert.
    pub fn new(email: String, role: String) -> Self {
        Self {
            id: Uuid::nil(),
            email,
            password_hash: String::new(),
            role,
            activated: false,
            version: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Hash and store the password. The plaintext is dropped here; only the
    /// salted one-way hash is ever kept on the record.
    pub fn set_password(&mut self, plaintext: &str, cost: u32) -> Result<(), bcrypt::BcryptError> {
        self.password_hash = bcrypt::hash(plaintext, cost)?;
        Ok(())
    }

    /// Compare a submitted plaintext against the stored hash using the
    /// deliberately-slow bcrypt comparison. A mismatch is a normal `false`,
    /// not an error.
    pub fn password_matches(&self, plaintext: &str) -> Result<bool, bcrypt::BcryptError> {
        bcrypt::verify(plaintext, &self.password_hash)
    }

    pub fn validate(&self, v: &mut Validator) {
        validate_email(v, &self.email);
        v.check(!self.role.is_empty(), "role", "must be provided");

        // A missing hash at this point is a logic error in our code, not a
        // client problem.
        assert!(
            !self.password_hash.is_empty(),
            "missing password hash for user"
        );
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "password_hash",
        "role",
        "activated",
        "version",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] =
        &["email", "password_hash", "role", "activated"];
    const SORT_SAFELIST: &'static [&'static str] =
        &["id", "email", "created_at", "-id", "-email", "-created_at"];

    type ListFilter = UserListFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut values = qb.separated(", ");
        values.push_bind(self.email.clone());
        values.push_bind(self.password_hash.clone());
        values.push_bind(self.role.clone());
        values.push_bind(self.activated);
    }

    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut sets = qb.separated(", ");
        sets.push("email = ");
        sets.push_bind_unseparated(self.email.clone());
        sets.push("password_hash = ");
        sets.push_bind_unseparated(self.password_hash.clone());
        sets.push("role = ");
        sets.push_bind_unseparated(self.role.clone());
        sets.push("activated = ");
        sets.push_bind_unseparated(self.activated);
    }

    fn push_list_predicates(filter: &UserListFilter, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND (email = ");
        qb.push_bind(filter.email.clone());
        qb.push(" OR ");
        qb.push_bind(filter.email.clone());
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

#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub email: String,
}

/// Identity store: the generic versioned store plus the lookups that do not
/// fit the generic shape (by email, by credential token).
#[derive(Clone)]
pub struct UserStore {
    records: Store<User>,
}

impl UserStore {
    pub fn new(pool: PgPool, timeout: StdDuration) -> Self {
        Self {
            records: Store::new(pool, timeout),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<User, StoreError> {
        self.records.get(id).await
    }

    pub async fn insert(&self, user: &mut User) -> Result<(), StoreError> {
        self.records.insert(user).await
    }

    pub async fn update(&self, user: &mut User) -> Result<(), StoreError> {
        self.records.update(user).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.records.delete(id).await
    }

    pub async fn list(
        &self,
        filter: &UserListFilter,
        filters: &crate::filter::Filters,
    ) -> Result<(Vec<User>, crate::filter::Metadata), StoreError> {
        self.records.list(filter, filters).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1",
            User::COLUMNS.join(", ")
        );
        let row = self
            .records
            .run(
                sqlx::query_as::<_, User>(&sql)
                    .bind(email.to_string())
                    .fetch_optional(self.records.pool()),
            )
            .await?;
        row.ok_or(StoreError::NotFound)
    }

    /// Resolve a token plaintext to its owning user, requiring the digest,
    /// the scope and an unexpired row to all match in one query. Unknown,
    /// wrong-scope and expired tokens are indistinguishable in the result:
    /// all surface as [`StoreError::NotFound`].
    pub async fn get_for_token(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<User, StoreError> {
        let hash = digest(plaintext);
        let columns: Vec<String> = User::COLUMNS
            .iter()
            .map(|c| format!("users.{c}"))
            .collect();
        let sql = format!(
            "SELECT {} FROM users \
             INNER JOIN tokens ON users.id = tokens.user_id \
             WHERE tokens.hash = $1 AND tokens.scope = $2 AND tokens.expiry > $3",
            columns.join(", ")
        );

        let row = self
            .records
            .run(
                sqlx::query_as::<_, User>(&sql)
                    .bind(hash)
                    .bind(scope.as_str())
                    .bind(Utc::now())
                    .fetch_optional(self.records.pool()),
            )
            .await?;
        row.ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt at the production cost is deliberately slow; a single
    // round trip keeps the suite tolerable.
    #[test]
    fn password_round_trip() {
        let mut user = User::new("officer@example.com".to_string(), "staff".to_string());
        user.set_password("fishsticks-123", 4).unwrap();

        assert!(user.password_matches("fishsticks-123").unwrap());
        assert!(!user.password_matches("wrong-password").unwrap());
        assert_ne!(user.password_hash, "fishsticks-123");
    }

    #[test]
    fn serialized_user_never_carries_hash_or_version() {
        let mut user = User::new("officer@example.com".to_string(), "staff".to_string());
        user.set_password("fishsticks-123", 4).unwrap();

        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("version"));
        assert!(object.contains_key("email"));
    }

    #[test]
    fn validate_collects_field_errors() {
        let mut user = User::new("not-an-email".to_string(), String::new());
        user.set_password("fishsticks-123", 4).unwrap();

        let mut v = Validator::new();
        user.validate(&mut v);
        let err = v.into_result().unwrap_err();
        match err {
            crate::error::ApiError::ValidationFailed(errors) => {
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("role"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "missing password hash")]
    fn validate_panics_without_hash() {
        let user = User::new("officer@example.com".to_string(), "staff".to_string());
        let mut v = Validator::new();
        user.validate(&mut v);
    }
}

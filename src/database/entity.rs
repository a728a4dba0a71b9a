use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

/// A versioned record that the generic [`Store`](super::store::Store) can
/// persist. Implementations contribute their table name, column lists,
/// value binding, and list predicates; the store owns the SQL shape —
/// in particular the compare-and-swap version check on update.
///
/// Every entity row carries `id`, `created_at`, `updated_at` and `version`
/// alongside its business columns.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin {
    /// Table backing this entity.
    const TABLE: &'static str;

    /// Columns fetched by `get` and `list`, in declaration order.
    const COLUMNS: &'static [&'static str];

    /// Business columns written on insert, in the order
    /// [`push_insert_values`](Entity::push_insert_values) binds them.
    const INSERT_COLUMNS: &'static [&'static str];

    /// Sort keys a client may request for this entity, including the
    /// descending `-` variants.
    const SORT_SAFELIST: &'static [&'static str];

    /// Resource-specific search parameters for list queries.
    type ListFilter: Send + Sync;

    fn id(&self) -> Uuid;

    fn version(&self) -> i32;

    /// Bind the insert values, comma separated, in `INSERT_COLUMNS` order.
    fn push_insert_values(&self, qb: &mut QueryBuilder<'_, Postgres>);

    /// Push the `SET` assignments for the mutable business columns.
    /// Version and timestamp bookkeeping is appended by the store.
    fn push_update_assignments(&self, qb: &mut QueryBuilder<'_, Postgres>);

    /// Push `AND ...` predicates narrowing a list query. Called after a
    /// `WHERE true` seed, so every predicate starts with ` AND `.
    fn push_list_predicates(filter: &Self::ListFilter, qb: &mut QueryBuilder<'_, Postgres>);

    /// Absorb the server-assigned columns returned by the insert.
    fn absorb_insert(&mut self, row: &PgRow) -> Result<(), sqlx::Error>;

    /// Absorb the refreshed version and timestamp returned by an update.
    fn absorb_update(&mut self, row: &PgRow) -> Result<(), sqlx::Error>;
}

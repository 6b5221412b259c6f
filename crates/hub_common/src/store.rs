//! Collaborator seams: the hosted data store, authentication and blob storage.
//!
//! The core only needs rows back as plain JSON records matching the table
//! shapes in `hub_shared::model`, and writes that either succeed or report a
//! descriptive failure. Transport details live behind these traits.

use async_trait::async_trait;
use hub_shared::model::{procedures, AppRole};
use hub_shared::HubError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use tracing::{debug, warn};

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Neq(column.to_string(), value.into())
    }

    /// Missing columns compare as null
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, value) => row.get(col).unwrap_or(&Value::Null) == value,
            Filter::Neq(col, value) => row.get(col).unwrap_or(&Value::Null) != value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: &str) -> Self {
        Self { table: table.to_string(), filters: Vec::new(), order: None, limit: None }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::neq(column, value));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order { column: column.to_string(), ascending });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// Column ordering as the hosted store sorts: nulls last ascending, first descending
pub fn compare_column(a: &Value, b: &Value, column: &str, ascending: bool) -> Ordering {
    let left = a.get(column).unwrap_or(&Value::Null);
    let right = b.get(column).unwrap_or(&Value::Null);
    let ord = match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    };
    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

// ============================================================================
// Data store
// ============================================================================

/// Generic query/insert/update/delete/call-procedure interface of the hosted store
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, HubError>;

    /// Returns the rows as stored (with generated ids and timestamps)
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, HubError>;

    /// Merges `patch` into every matching row; returns how many matched
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize, HubError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, HubError>;

    async fn call(&self, procedure: &str, args: Value) -> Result<Value, HubError>;
}

/// Select and decode rows
pub async fn fetch<T, S>(store: &S, query: &Query) -> Result<Vec<T>, HubError>
where
    T: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let rows = store.select(query).await?;
    debug!(table = %query.table, rows = rows.len(), "fetched");
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| HubError::store(&query.table, format!("malformed row: {}", e)))
        })
        .collect()
}

/// Select the first matching row, if any
pub async fn fetch_one<T, S>(store: &S, query: Query) -> Result<Option<T>, HubError>
where
    T: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let mut rows = fetch(store, &query.limit(1)).await?;
    Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
}

/// Insert one record and decode what the store returns
pub async fn insert_one<T, R, S>(store: &S, table: &str, record: &T) -> Result<R, HubError>
where
    T: Serialize + Sync,
    R: DeserializeOwned,
    S: DataStore + ?Sized,
{
    let row = serde_json::to_value(record)?;
    let mut inserted = store.insert(table, vec![row]).await?;
    let stored = inserted
        .pop()
        .ok_or_else(|| HubError::store(table, "insert returned no row"))?;
    serde_json::from_value(stored).map_err(|e| HubError::store(table, format!("malformed row: {}", e)))
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<SessionUser>, HubError>;

    async fn sign_out(&self) -> Result<(), HubError>;
}

pub async fn require_user<A: AuthProvider + ?Sized>(auth: &A) -> Result<SessionUser, HubError> {
    auth.current_user().await?.ok_or(HubError::NotAuthenticated)
}

/// Roles of a user via the `get_user_roles` procedure; unknown role names are skipped
pub async fn user_roles<S: DataStore + ?Sized>(store: &S, user_id: &str) -> Result<Vec<AppRole>, HubError> {
    let value = store.call(procedures::USER_ROLES, json!({ "_user_id": user_id })).await?;
    let names: Vec<String> = match value {
        Value::Null => Vec::new(),
        other => serde_json::from_value(other)
            .map_err(|e| HubError::procedure(procedures::USER_ROLES, e.to_string()))?,
    };

    let mut roles: Vec<AppRole> = names
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!("skipping role for {}: {}", user_id, e);
                None
            }
        })
        .collect();
    roles.sort();
    roles.dedup();
    Ok(roles)
}

// ============================================================================
// Blob storage
// ============================================================================

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<(), HubError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, HubError>;

    /// Missing paths are not an error
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), HubError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_treat_missing_as_null() {
        let row = json!({"id": "1", "status": "pending"});
        assert!(Filter::eq("status", "pending").matches(&row));
        assert!(Filter::eq("deleted_at", Value::Null).matches(&row));
        assert!(Filter::neq("status", "cancelled").matches(&row));
        assert!(!Filter::neq("status", "pending").matches(&row));
    }

    #[test]
    fn test_nulls_sort_last_ascending() {
        let a = json!({"week_number": null});
        let b = json!({"week_number": 3});
        assert_eq!(compare_column(&a, &b, "week_number", true), Ordering::Greater);
        assert_eq!(compare_column(&a, &b, "week_number", false), Ordering::Less);
    }

    #[test]
    fn test_query_builder() {
        let q = Query::from("rewards").eq("active", true).order("points_cost", true).limit(5);
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.limit, Some(5));
        assert!(q.matches(&json!({"active": true})));
        assert!(!q.matches(&json!({"active": false})));
    }
}

//! In-process data store and static session.
//!
//! Tables are kept as JSON rows behind a `Mutex`. The built-in procedures
//! mirror the hosted ones the services call. A snapshot can be loaded from and
//! saved to a JSON file, which is how `hubctl` persists between runs.

use crate::store::{compare_column, AuthProvider, DataStore, Filter, Query, SessionUser};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use hub_shared::model::{procedures, tables, AppRole, UserRoleRow};
use hub_shared::quarter::{week_of_quarter, Quarter, DEFAULT_QUESTIONS};
use hub_shared::HubError;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

type Tables = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<String>>,
    week_override: Mutex<Option<Value>>,
    clock: Mutex<Option<NaiveDateTime>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot object of `{table: [rows]}`
    pub fn from_snapshot(snapshot: Value) -> Result<Self, HubError> {
        let tables: Tables = match snapshot {
            Value::Null => Tables::new(),
            other => serde_json::from_value(other)?,
        };
        Ok(Self { tables: Mutex::new(tables), ..Self::default() })
    }

    /// Missing file gives an empty store
    pub fn load(path: &Path) -> Result<Self, HubError> {
        if !path.exists() {
            debug!("no snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let store = Self::from_snapshot(serde_json::from_str(&contents)?)?;
        debug!("loaded snapshot from {}", path.display());
        Ok(store)
    }

    pub fn snapshot(&self) -> Value {
        let tables = lock(&self.tables);
        json!(&*tables)
    }

    /// Writes a temporary file and renames it into place
    pub fn save(&self, path: &Path) -> Result<(), HubError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(&self.snapshot())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)?;
        info!("saved snapshot to {}", path.display());
        Ok(())
    }

    /// Insert rows as-is, bypassing id and timestamp generation
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        lock(&self.tables).entry(table.to_string()).or_default().extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Make every operation on a table or procedure fail until cleared
    pub fn fail_on(&self, name: &str) {
        lock(&self.failing).insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// Raw value returned by `get_current_quarter_week`
    pub fn set_remote_week(&self, value: Value) {
        *lock(&self.week_override) = Some(value);
    }

    /// Fixed local time for the week procedure
    pub fn set_clock(&self, now: NaiveDateTime) {
        *lock(&self.clock) = Some(now);
    }

    fn check(&self, name: &str) -> Result<(), HubError> {
        if lock(&self.failing).contains(name) {
            return Err(HubError::store(name, "injected failure"));
        }
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        let fixed = *lock(&self.clock);
        fixed.unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    fn current_week(&self) -> Value {
        if let Some(value) = lock(&self.week_override).clone() {
            return value;
        }
        json!(week_of_quarter(self.now()))
    }

    fn initialize_questions(&self, args: &Value) -> Result<Value, HubError> {
        let name = procedures::INITIALIZE_KPI_QUESTIONS;
        let company = args
            .get("_company_id")
            .and_then(Value::as_str)
            .ok_or_else(|| HubError::procedure(name, "missing _company_id"))?;
        let label = args
            .get("_quarter")
            .and_then(Value::as_str)
            .ok_or_else(|| HubError::procedure(name, "missing _quarter"))?;
        let year = args
            .get("_year")
            .and_then(Value::as_i64)
            .ok_or_else(|| HubError::procedure(name, "missing _year"))? as i32;
        let quarter: Quarter = format!("{} {}", label, year)
            .parse()
            .map_err(|e: String| HubError::procedure(name, e))?;

        let mut tables = lock(&self.tables);
        let rows = tables.entry(tables::KPI_QUESTIONS.to_string()).or_default();
        let exists = rows.iter().any(|row| {
            row.get("company_id").and_then(Value::as_str) == Some(company)
                && row.get("quarter").and_then(Value::as_str) == Some(label)
                && row.get("year").and_then(Value::as_i64) == Some(year as i64)
        });
        if exists {
            debug!("{} {} already initialized for {}", label, year, company);
            return Ok(json!(0));
        }

        let now = Utc::now();
        for (i, (text, kind)) in DEFAULT_QUESTIONS.iter().enumerate() {
            rows.push(json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "question_text": text,
                "week_number": i + 1,
                "quarter": quarter.label(),
                "year": quarter.year(),
                "question_type": kind,
                "active": true,
                "company_id": company,
                "created_by": Value::Null,
                "created_at": now,
            }));
        }
        info!("initialized {} default questions for {} {}", DEFAULT_QUESTIONS.len(), quarter, company);
        Ok(json!(DEFAULT_QUESTIONS.len()))
    }

    fn roles_of(&self, args: &Value) -> Result<Value, HubError> {
        let user = args
            .get("_user_id")
            .and_then(Value::as_str)
            .ok_or_else(|| HubError::procedure(procedures::USER_ROLES, "missing _user_id"))?;
        let tables = lock(&self.tables);
        let roles: Vec<Value> = tables
            .get(tables::USER_ROLES)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get("user_id").and_then(Value::as_str) == Some(user))
                    .filter_map(|row| row.get("role").cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Value::Array(roles))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn stamp(row: Value, now: DateTime<Utc>) -> Result<Value, HubError> {
    let mut object: Map<String, Value> = match row {
        Value::Object(map) => map,
        other => return Err(HubError::Validation(format!("row must be an object, got {}", other))),
    };
    if object.get("id").map_or(true, Value::is_null) {
        object.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
    }
    if object.get("created_at").map_or(true, Value::is_null) {
        object.insert("created_at".to_string(), json!(now));
    }
    Ok(Value::Object(object))
}

fn merge(row: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(fields)) = (row, patch) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, HubError> {
        self.check(&query.table)?;
        let tables = lock(&self.tables);
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| compare_column(a, b, &order.column, order.ascending));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, HubError> {
        self.check(table)?;
        let now = Utc::now();
        let stamped = rows.into_iter().map(|row| stamp(row, now)).collect::<Result<Vec<_>, _>>()?;
        lock(&self.tables).entry(table.to_string()).or_default().extend(stamped.iter().cloned());
        debug!(table, rows = stamped.len(), "inserted");
        Ok(stamped)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize, HubError> {
        self.check(table)?;
        let mut tables = lock(&self.tables);
        let mut matched = 0;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filters.iter().all(|f| f.matches(row))) {
                merge(row, &patch);
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, HubError> {
        self.check(table)?;
        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(before - rows.len())
    }

    async fn call(&self, procedure: &str, args: Value) -> Result<Value, HubError> {
        if lock(&self.failing).contains(procedure) {
            return Err(HubError::procedure(procedure, "injected failure"));
        }
        match procedure {
            procedures::CURRENT_QUARTER_WEEK => Ok(self.current_week()),
            procedures::INITIALIZE_KPI_QUESTIONS => self.initialize_questions(&args),
            procedures::USER_ROLES => self.roles_of(&args),
            other => Err(HubError::procedure(other, "unknown procedure")),
        }
    }
}

// ============================================================================
// Static session
// ============================================================================

/// Session fixed at construction; `sign_out` clears it
#[derive(Debug, Default)]
pub struct StaticAuth {
    user: Mutex<Option<SessionUser>>,
}

impl StaticAuth {
    pub fn signed_in(id: &str) -> Self {
        Self { user: Mutex::new(Some(SessionUser { id: id.to_string(), email: None })) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<Option<SessionUser>, HubError> {
        Ok(lock(&self.user).clone())
    }

    async fn sign_out(&self) -> Result<(), HubError> {
        if let Some(user) = lock(&self.user).take() {
            info!("signed out {}", user.id);
        }
        Ok(())
    }
}

/// Grant a role by inserting into `user_roles`
pub fn grant_role(store: &MemoryStore, user_id: &str, role: AppRole) {
    let row = UserRoleRow { user_id: user_id.to_string(), role };
    store.seed(tables::USER_ROLES, vec![json!(row)]);
}

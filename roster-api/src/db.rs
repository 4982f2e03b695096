//! PostgreSQL Store Module
//!
//! Connection pooling with deadpool-postgres and [`PgStore`], the
//! PostgreSQL implementation of the directory, schedule and ledger
//! contracts. A [`SwapCommit`] runs in one transaction: the swap row and
//! every touched shift row are locked with `FOR UPDATE` before the guards
//! are checked, and the partial unique index `swap_requests_active_pair`
//! backs the one-active-request-per-pair rule under concurrent inserts.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use ::async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use roster_core::{
    exchange_content, Agent, AgentId, AuditAction, AuditEntry, AuditEntryId, DateRange,
    EntityType, EnumParseError, Role, RosterError, RosterResult, ServiceType, ShiftId,
    ShiftRecord, StorageError, SwapEffect, SwapId, SwapRequest, SwapStatus, DEFAULT_LINE,
};
use roster_storage::{
    CommitOutcome, Directory, RecordGuard, ScheduleStore, SwapCommit, SwapLedger, SwapQuery,
    ACTIVE_PAIR_CONSTRAINT,
};
use tokio_postgres::{error::SqlState, types::FromSql, NoTls, Row, Transaction};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Idempotent DDL for every table the store uses.
pub const SCHEMA: &str = include_str!("../sql/schema.sql");

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait, connect and recycle timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "roster".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Reads `ROSTER_DB_HOST`, `ROSTER_DB_PORT`, `ROSTER_DB_NAME`,
    /// `ROSTER_DB_USER`, `ROSTER_DB_PASSWORD`, `ROSTER_DB_POOL_SIZE` and
    /// `ROSTER_DB_TIMEOUT` (seconds).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("ROSTER_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("ROSTER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("ROSTER_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("ROSTER_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("ROSTER_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("ROSTER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("ROSTER_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        pool_config.timeouts.create = Some(self.timeout);
        pool_config.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const AGENT_COLUMNS: &str = "agent_id, username, first_name, last_name, role, employee_number, \
     is_active, is_active_in_scheduling, created_at";

const SHIFT_COLUMNS: &str =
    "shift_id, agent_id, date, service_type, line, note, created_at, updated_at";

const SWAP_COLUMNS: &str = "swap_id, requester_id, recipient_id, requester_shift_id, \
     recipient_shift_id, status, message, recipient_comment, supervisor_comment, supervisor_id, \
     created_at, updated_at, responded_at, decided_at, cancelled_at";

const AUDIT_COLUMNS: &str = "entry_id, swap_id, action, label, actor_id, comment, created_at";

fn backend(context: &str, err: impl fmt::Display) -> RosterError {
    tracing::error!(context, error = %err, "PostgreSQL store failure");
    StorageError::Backend {
        reason: format!("{}: {}", context, err),
    }
    .into()
}

/// Map a driver error, keeping unique violations distinguishable.
fn db_error(err: tokio_postgres::Error) -> RosterError {
    if let Some(db) = err.as_db_error() {
        if db.code() == &SqlState::UNIQUE_VIOLATION {
            return StorageError::UniqueViolation {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
                reason: db.message().to_string(),
            }
            .into();
        }
    }
    backend("query", err)
}

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> RosterResult<T> {
    row.try_get(name).map_err(|e| backend("decode", e))
}

fn decode<T>(raw: &str, parse: fn(&str) -> Result<T, EnumParseError>) -> RosterResult<T> {
    parse(raw).map_err(|e| backend("decode", e))
}

fn agent_from_row(row: &Row) -> RosterResult<Agent> {
    Ok(Agent {
        agent_id: AgentId::new(col(row, "agent_id")?),
        username: col(row, "username")?,
        first_name: col(row, "first_name")?,
        last_name: col(row, "last_name")?,
        role: decode(col(row, "role")?, Role::from_db_str)?,
        employee_number: col(row, "employee_number")?,
        is_active: col(row, "is_active")?,
        is_active_in_scheduling: col(row, "is_active_in_scheduling")?,
        created_at: col(row, "created_at")?,
    })
}

fn swap_from_row(row: &Row) -> RosterResult<SwapRequest> {
    Ok(SwapRequest {
        swap_id: SwapId::new(col(row, "swap_id")?),
        requester_id: AgentId::new(col(row, "requester_id")?),
        recipient_id: AgentId::new(col(row, "recipient_id")?),
        requester_shift_id: ShiftId::new(col(row, "requester_shift_id")?),
        recipient_shift_id: ShiftId::new(col(row, "recipient_shift_id")?),
        status: decode(col(row, "status")?, SwapStatus::from_db_str)?,
        message: col(row, "message")?,
        recipient_comment: col(row, "recipient_comment")?,
        supervisor_comment: col(row, "supervisor_comment")?,
        supervisor_id: col::<Option<Uuid>>(row, "supervisor_id")?.map(AgentId::new),
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        responded_at: col(row, "responded_at")?,
        decided_at: col(row, "decided_at")?,
        cancelled_at: col(row, "cancelled_at")?,
    })
}

fn audit_from_row(row: &Row) -> RosterResult<AuditEntry> {
    Ok(AuditEntry {
        entry_id: AuditEntryId::new(col(row, "entry_id")?),
        swap_id: SwapId::new(col(row, "swap_id")?),
        action: decode(col(row, "action")?, AuditAction::from_db_str)?,
        label: col(row, "label")?,
        actor_id: AgentId::new(col(row, "actor_id")?),
        comment: col(row, "comment")?,
        created_at: col(row, "created_at")?,
    })
}

// ============================================================================
// STORE
// ============================================================================

/// PostgreSQL-backed [`roster_storage::RosterStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    default_line: String,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            default_line: DEFAULT_LINE.to_string(),
        }
    }

    /// Post label reported for rows stored without one.
    pub fn with_default_line(mut self, line: impl Into<String>) -> Self {
        self.default_line = line.into();
        self
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create missing tables and indexes.
    pub async fn apply_schema(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    /// Add or replace a directory account.
    pub async fn insert_agent(&self, agent: &Agent) -> RosterResult<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO agents (agent_id, username, first_name, last_name, role, \
             employee_number, is_active, is_active_in_scheduling, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (agent_id) DO UPDATE SET username = EXCLUDED.username, \
             first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name, \
             role = EXCLUDED.role, employee_number = EXCLUDED.employee_number, \
             is_active = EXCLUDED.is_active, \
             is_active_in_scheduling = EXCLUDED.is_active_in_scheduling",
            &[
                &agent.agent_id.as_uuid(),
                &agent.username,
                &agent.first_name,
                &agent.last_name,
                &agent.role.as_db_str(),
                &agent.employee_number,
                &agent.is_active,
                &agent.is_active_in_scheduling,
                &agent.created_at,
            ],
        )
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn conn(&self) -> RosterResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| backend("acquire connection", e))
    }

    fn shift_from_row(&self, row: &Row) -> RosterResult<ShiftRecord> {
        let service_type = decode(col(row, "service_type")?, ServiceType::from_db_str)?;
        let line: Option<String> = col(row, "line")?;
        let mut record = ShiftRecord::new(AgentId::new(col(row, "agent_id")?), col(row, "date")?, service_type)
            .with_id(ShiftId::new(col(row, "shift_id")?))
            .with_line(line.unwrap_or_else(|| self.default_line.clone()));
        record.note = col(row, "note")?;
        record.created_at = col(row, "created_at")?;
        record.updated_at = col(row, "updated_at")?;
        Ok(record)
    }
}

async fn write_shift_content(tx: &Transaction<'_>, shift: &ShiftRecord) -> RosterResult<()> {
    tx.execute(
        "UPDATE shift_records SET service_type = $2, start_time = $3, end_time = $4, \
         line = $5, note = $6, updated_at = $7 WHERE shift_id = $1",
        &[
            &shift.shift_id.as_uuid(),
            &shift.service_type().as_db_str(),
            &shift.start_time(),
            &shift.end_time(),
            &shift.line,
            &shift.note,
            &shift.updated_at,
        ],
    )
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn insert_swap(tx: &Transaction<'_>, record: &SwapRequest) -> RosterResult<()> {
    let supervisor_id = record.supervisor_id.map(|id| id.as_uuid());
    tx.execute(
        &format!(
            "INSERT INTO swap_requests ({SWAP_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ),
        &[
            &record.swap_id.as_uuid(),
            &record.requester_id.as_uuid(),
            &record.recipient_id.as_uuid(),
            &record.requester_shift_id.as_uuid(),
            &record.recipient_shift_id.as_uuid(),
            &record.status.as_db_str(),
            &record.message,
            &record.recipient_comment,
            &record.supervisor_comment,
            &supervisor_id,
            &record.created_at,
            &record.updated_at,
            &record.responded_at,
            &record.decided_at,
            &record.cancelled_at,
        ],
    )
    .await
    .map_err(db_error)?;
    Ok(())
}

async fn update_swap(tx: &Transaction<'_>, record: &SwapRequest) -> RosterResult<()> {
    let supervisor_id = record.supervisor_id.map(|id| id.as_uuid());
    let updated = tx
        .execute(
            "UPDATE swap_requests SET status = $2, recipient_comment = $3, \
             supervisor_comment = $4, supervisor_id = $5, updated_at = $6, responded_at = $7, \
             decided_at = $8, cancelled_at = $9 WHERE swap_id = $1",
            &[
                &record.swap_id.as_uuid(),
                &record.status.as_db_str(),
                &record.recipient_comment,
                &record.supervisor_comment,
                &supervisor_id,
                &record.updated_at,
                &record.responded_at,
                &record.decided_at,
                &record.cancelled_at,
            ],
        )
        .await
        .map_err(db_error)?;
    if updated != 1 {
        return Err(StorageError::UpdateFailed {
            entity_type: EntityType::SwapRequest,
            id: record.swap_id.as_uuid(),
            reason: format!("{} rows updated", updated),
        }
        .into());
    }
    Ok(())
}

async fn insert_audit(tx: &Transaction<'_>, entry: &AuditEntry) -> RosterResult<()> {
    tx.execute(
        &format!("INSERT INTO swap_audit_entries ({AUDIT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"),
        &[
            &entry.entry_id.as_uuid(),
            &entry.swap_id.as_uuid(),
            &entry.action.as_db_str(),
            &entry.label,
            &entry.actor_id.as_uuid(),
            &entry.comment,
            &entry.created_at,
        ],
    )
    .await
    .map_err(db_error)?;
    Ok(())
}

// ============================================================================
// CONTRACT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl Directory for PgStore {
    async fn get_agent(&self, id: AgentId) -> RosterResult<Option<Agent>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE agent_id = $1"),
                &[&id.as_uuid()],
            )
            .await
            .map_err(db_error)?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn list_active_agents(&self, role: Option<Role>) -> RosterResult<Vec<Agent>> {
        let conn = self.conn().await?;
        let role = role.map(|role| role.as_db_str());
        let rows = conn
            .query(
                &format!(
                    "SELECT {AGENT_COLUMNS} FROM agents \
                     WHERE is_active AND ($1::text IS NULL OR role = $1) \
                     ORDER BY last_name, first_name, username"
                ),
                &[&role],
            )
            .await
            .map_err(db_error)?;
        rows.iter().map(agent_from_row).collect()
    }
}

#[async_trait]
impl ScheduleStore for PgStore {
    async fn shift_get(
        &self,
        agent_id: AgentId,
        date: NaiveDate,
    ) -> RosterResult<Option<ShiftRecord>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {SHIFT_COLUMNS} FROM shift_records WHERE agent_id = $1 AND date = $2"),
                &[&agent_id.as_uuid(), &date],
            )
            .await
            .map_err(db_error)?;
        row.map(|row| self.shift_from_row(&row)).transpose()
    }

    async fn shift_get_by_id(&self, id: ShiftId) -> RosterResult<Option<ShiftRecord>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {SHIFT_COLUMNS} FROM shift_records WHERE shift_id = $1"),
                &[&id.as_uuid()],
            )
            .await
            .map_err(db_error)?;
        row.map(|row| self.shift_from_row(&row)).transpose()
    }

    async fn shift_save(&self, record: &ShiftRecord) -> RosterResult<ShiftRecord> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_error)?;
        let now = Utc::now();

        let existing = tx
            .query_opt(
                "SELECT shift_id FROM shift_records WHERE agent_id = $1 AND date = $2 FOR UPDATE",
                &[&record.agent_id.as_uuid(), &record.date],
            )
            .await
            .map_err(db_error)?;

        let row = match existing {
            Some(row) => {
                let existing_id: Uuid = col(&row, "shift_id")?;
                if existing_id != record.shift_id.as_uuid() {
                    // The natural key wins; the supplied id no longer names a record.
                    tx.execute(
                        "DELETE FROM shift_records WHERE shift_id = $1",
                        &[&record.shift_id.as_uuid()],
                    )
                    .await
                    .map_err(db_error)?;
                }
                tx.query_one(
                    &format!(
                        "UPDATE shift_records SET service_type = $2, start_time = $3, \
                         end_time = $4, line = $5, note = $6, updated_at = $7 \
                         WHERE shift_id = $1 RETURNING {SHIFT_COLUMNS}"
                    ),
                    &[
                        &existing_id,
                        &record.service_type().as_db_str(),
                        &record.start_time(),
                        &record.end_time(),
                        &record.line,
                        &record.note,
                        &now,
                    ],
                )
                .await
                .map_err(db_error)?
            }
            None => tx
                .query_one(
                    &format!(
                        "INSERT INTO shift_records ({SHIFT_COLUMNS}, start_time, end_time) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                         ON CONFLICT (shift_id) DO UPDATE SET agent_id = EXCLUDED.agent_id, \
                         date = EXCLUDED.date, service_type = EXCLUDED.service_type, \
                         start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time, \
                         line = EXCLUDED.line, note = EXCLUDED.note, \
                         updated_at = EXCLUDED.updated_at \
                         RETURNING {SHIFT_COLUMNS}"
                    ),
                    &[
                        &record.shift_id.as_uuid(),
                        &record.agent_id.as_uuid(),
                        &record.date,
                        &record.service_type().as_db_str(),
                        &record.line,
                        &record.note,
                        &record.created_at,
                        &now,
                        &record.start_time(),
                        &record.end_time(),
                    ],
                )
                .await
                .map_err(db_error)?,
        };

        let stored = self.shift_from_row(&row)?;
        tx.commit().await.map_err(db_error)?;
        Ok(stored)
    }

    async fn shift_list_by_agent(
        &self,
        agent_id: AgentId,
        range: DateRange,
    ) -> RosterResult<Vec<ShiftRecord>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {SHIFT_COLUMNS} FROM shift_records WHERE agent_id = $1 \
                     AND ($2::date IS NULL OR date >= $2) AND ($3::date IS NULL OR date <= $3) \
                     ORDER BY date"
                ),
                &[&agent_id.as_uuid(), &range.from, &range.to],
            )
            .await
            .map_err(db_error)?;
        rows.iter().map(|row| self.shift_from_row(row)).collect()
    }
}

#[async_trait]
impl SwapLedger for PgStore {
    async fn swap_get(&self, id: SwapId) -> RosterResult<Option<SwapRequest>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {SWAP_COLUMNS} FROM swap_requests WHERE swap_id = $1"),
                &[&id.as_uuid()],
            )
            .await
            .map_err(db_error)?;
        row.as_ref().map(swap_from_row).transpose()
    }

    async fn swap_list(&self, query: SwapQuery) -> RosterResult<Vec<SwapRequest>> {
        let conn = self.conn().await?;
        let involving = query.involving.map(|id| id.as_uuid());
        let status = query.status.map(|status| status.as_db_str());
        let rows = conn
            .query(
                &format!(
                    "SELECT {SWAP_COLUMNS} FROM swap_requests \
                     WHERE ($1::uuid IS NULL OR requester_id = $1 OR recipient_id = $1) \
                     AND ($2::text IS NULL OR status = $2) \
                     AND ($3::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date >= $3) \
                     AND ($4::date IS NULL OR (created_at AT TIME ZONE 'UTC')::date <= $4) \
                     ORDER BY created_at DESC, swap_id DESC"
                ),
                &[&involving, &status, &query.created.from, &query.created.to],
            )
            .await
            .map_err(db_error)?;
        rows.iter().map(swap_from_row).collect()
    }

    async fn audit_list(&self, swap_id: SwapId) -> RosterResult<Vec<AuditEntry>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {AUDIT_COLUMNS} FROM swap_audit_entries WHERE swap_id = $1 \
                     ORDER BY created_at DESC, entry_id DESC"
                ),
                &[&swap_id.as_uuid()],
            )
            .await
            .map_err(db_error)?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn commit(&self, commit: SwapCommit) -> RosterResult<CommitOutcome> {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_error)?;
        let record = &commit.record;

        match commit.guard {
            RecordGuard::New => {
                let pair = record.shift_pair();
                let active = tx
                    .query_opt(
                        "SELECT swap_id, status FROM swap_requests \
                         WHERE LEAST(requester_shift_id, recipient_shift_id) = $1 \
                         AND GREATEST(requester_shift_id, recipient_shift_id) = $2 \
                         AND status IN ('pending', 'agent_accepted') LIMIT 1",
                        &[&pair.low().as_uuid(), &pair.high().as_uuid()],
                    )
                    .await
                    .map_err(db_error)?;
                if let Some(row) = active {
                    let existing: Uuid = col(&row, "swap_id")?;
                    let status: String = col(&row, "status")?;
                    return Err(StorageError::UniqueViolation {
                        constraint: ACTIVE_PAIR_CONSTRAINT.to_string(),
                        reason: format!("request {} is still {}", existing, status),
                    }
                    .into());
                }
            }
            RecordGuard::Status(expected) => {
                let row = tx
                    .query_opt(
                        "SELECT status FROM swap_requests WHERE swap_id = $1 FOR UPDATE",
                        &[&record.swap_id.as_uuid()],
                    )
                    .await
                    .map_err(db_error)?
                    .ok_or(StorageError::NotFound {
                        entity_type: EntityType::SwapRequest,
                        id: record.swap_id.as_uuid(),
                    })?;
                let actual = decode(col(&row, "status")?, SwapStatus::from_db_str)?;
                if actual != expected {
                    return Err(StorageError::StatusConflict {
                        swap_id: record.swap_id,
                        expected,
                        actual,
                    }
                    .into());
                }
            }
        }

        // Lock every shift the commit reads or writes, in id order.
        let mut shift_ids: Vec<Uuid> = commit
            .ownership
            .iter()
            .map(|guard| guard.shift_id.as_uuid())
            .chain(commit.effects.iter().flat_map(|effect| match effect {
                SwapEffect::ExchangeShifts(exchange) => vec![
                    exchange.requester_shift_id.as_uuid(),
                    exchange.recipient_shift_id.as_uuid(),
                ],
                SwapEffect::AppendAudit(_) => Vec::new(),
            }))
            .collect();
        shift_ids.sort();
        shift_ids.dedup();

        let rows = tx
            .query(
                &format!(
                    "SELECT {SHIFT_COLUMNS} FROM shift_records WHERE shift_id = ANY($1) \
                     ORDER BY shift_id FOR UPDATE"
                ),
                &[&shift_ids],
            )
            .await
            .map_err(db_error)?;
        let mut locked = HashMap::with_capacity(rows.len());
        for row in &rows {
            let shift = self.shift_from_row(row)?;
            locked.insert(shift.shift_id, shift);
        }
        let lookup = |id: ShiftId| -> RosterResult<ShiftRecord> {
            locked.get(&id).cloned().ok_or_else(|| {
                StorageError::NotFound {
                    entity_type: EntityType::ShiftRecord,
                    id: id.as_uuid(),
                }
                .into()
            })
        };

        for guard in &commit.ownership {
            let shift = lookup(guard.shift_id)?;
            if shift.agent_id != guard.owner {
                return Err(StorageError::OwnershipChanged {
                    shift_id: guard.shift_id,
                    expected: guard.owner,
                    actual: shift.agent_id,
                }
                .into());
            }
        }

        let now = record.updated_at;
        let mut rewritten = Vec::new();
        let mut audit = Vec::new();
        for effect in &commit.effects {
            match effect {
                SwapEffect::ExchangeShifts(exchange) => {
                    let mut requester_shift = lookup(exchange.requester_shift_id)?;
                    let mut recipient_shift = lookup(exchange.recipient_shift_id)?;
                    exchange_content(&mut requester_shift, &mut recipient_shift, now);
                    rewritten.push(requester_shift);
                    rewritten.push(recipient_shift);
                }
                SwapEffect::AppendAudit(entry) => audit.push(entry),
            }
        }

        for shift in &rewritten {
            write_shift_content(&tx, shift).await?;
        }
        match commit.guard {
            RecordGuard::New => insert_swap(&tx, record).await?,
            RecordGuard::Status(_) => update_swap(&tx, record).await?,
        }
        for entry in audit {
            insert_audit(&tx, entry).await?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(CommitOutcome {
            record: commit.record.clone(),
            shifts: rewritten,
        })
    }

    async fn ping(&self) -> RosterResult<()> {
        let conn = self.conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(db_error)?;
        Ok(())
    }
}

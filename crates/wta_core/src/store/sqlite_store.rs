//! SQLite-backed report store.
//!
//! # Responsibility
//! - Persist delivery reports into the per-entity report table.
//! - Resolve destination endpoints from the shared `destinations` table.
//!
//! # Invariants
//! - Table and column names come only from `ReportTable` constants.
//! - Terminal transitions are conditional on `state = 'pending'`.

use crate::db::{find_destination, open_db};
use crate::model::endpoint::{DestinationId, Endpoint};
use crate::model::entity::{
    ENTITY_AUTO, ENTITY_COMPANIES, ENTITY_TRASH_CATS, ENTITY_TRASH_TYPES, ENTITY_USERS,
};
use crate::model::report::{
    DeliveryReport, FailureDetail, RemoteId, ReportId, ReportState, SourceRecordId,
};
use crate::store::report_store::{ReportStore, StorageParams, StoreError, StoreResult};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Report table addressed by one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportTable {
    pub table: &'static str,
    /// Column holding the source record id.
    pub source_column: &'static str,
}

impl ReportTable {
    pub const TRASH_CATS: Self = Self::new("trash_cats_send_reports", "trash_cat");
    pub const TRASH_TYPES: Self = Self::new("trash_types_send_reports", "trash_type");
    pub const COMPANIES: Self = Self::new("companies_send_reports", "company");
    pub const AUTO: Self = Self::new("auto_send_reports", "auto");
    pub const OPERATORS: Self = Self::new("operators_send_reports", "operator");

    pub const fn new(table: &'static str, source_column: &'static str) -> Self {
        Self {
            table,
            source_column,
        }
    }

    /// Table used by a built-in entity type.
    pub fn for_entity_type(entity_type: &str) -> Option<Self> {
        match entity_type {
            ENTITY_TRASH_CATS => Some(Self::TRASH_CATS),
            ENTITY_TRASH_TYPES => Some(Self::TRASH_TYPES),
            ENTITY_COMPANIES => Some(Self::COMPANIES),
            ENTITY_AUTO => Some(Self::AUTO),
            ENTITY_USERS => Some(Self::OPERATORS),
            _ => None,
        }
    }
}

/// Filter and pagination for report listings.
#[derive(Debug, Clone, Default)]
pub struct ReportListQuery {
    pub state: Option<ReportState>,
    pub source_record_id: Option<SourceRecordId>,
    pub limit: Option<u32>,
}

/// Report store over one report table of a SQLite database.
pub struct SqliteReportStore {
    conn: Connection,
    table: ReportTable,
}

impl SqliteReportStore {
    pub fn new(conn: Connection, table: ReportTable) -> Self {
        Self { conn, table }
    }

    /// Opens the database named by `params` and binds it to `table`.
    pub fn open(params: &StorageParams, table: ReportTable) -> StoreResult<Self> {
        let conn = open_db(&params.database_path)?;
        Ok(Self::new(conn, table))
    }

    pub fn table(&self) -> ReportTable {
        self.table
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Lists reports newest first.
    pub fn list_reports(&self, query: &ReportListQuery) -> StoreResult<Vec<DeliveryReport>> {
        let mut sql = format!("{} WHERE 1 = 1", self.select_sql());
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(state) = query.state {
            sql.push_str(" AND state = ?");
            bind_values.push(Value::Text(state.as_str().to_string()));
        }
        if let Some(source_record_id) = query.source_record_id {
            sql.push_str(&format!(" AND {} = ?", self.table.source_column));
            bind_values.push(Value::Integer(source_record_id));
        }

        sql.push_str(" ORDER BY id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(self.parse_report_row(row)?);
        }
        Ok(reports)
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id, attempt_uuid, {column} AS source_record_id, state, remote_id,
                    failure_detail, sent_at, resolved_at
             FROM {table}",
            column = self.table.source_column,
            table = self.table.table,
        )
    }

    fn report_state(&self, report_id: ReportId) -> StoreResult<Option<ReportState>> {
        let value: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT state FROM {} WHERE id = ?1;", self.table.table),
                [report_id],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| parse_state(self.table, &text))
            .transpose()
    }

    fn resolve(
        &self,
        report_id: ReportId,
        target: ReportState,
        remote_id: Option<RemoteId>,
        failure_detail: Option<String>,
    ) -> StoreResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {}
                 SET
                    state = ?1,
                    remote_id = ?2,
                    failure_detail = ?3,
                    resolved_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4 AND state = 'pending';",
                self.table.table
            ),
            params![target.as_str(), remote_id, failure_detail, report_id],
        )?;

        if changed == 1 {
            info!(
                "event=report_resolve module=store status=ok table={} report_id={report_id} state={}",
                self.table.table,
                target.as_str()
            );
            return Ok(());
        }

        match self.report_state(report_id)? {
            None => Err(StoreError::ReportNotFound(report_id)),
            Some(state) => {
                warn!(
                    "event=report_resolve module=store status=error table={} report_id={report_id} error_code=invalid_report_state current={} requested={}",
                    self.table.table,
                    state.as_str(),
                    target.as_str()
                );
                Err(StoreError::InvalidReportState { report_id, state })
            }
        }
    }

    fn parse_report_row(&self, row: &Row<'_>) -> StoreResult<DeliveryReport> {
        let table = self.table.table;

        let uuid_text: String = row.get("attempt_uuid")?;
        let attempt_id = Uuid::parse_str(&uuid_text).map_err(|_| {
            StoreError::InvalidData(format!(
                "invalid uuid value `{uuid_text}` in {table}.attempt_uuid"
            ))
        })?;

        let state_text: String = row.get("state")?;
        let state = parse_state(self.table, &state_text)?;

        let failure_detail = match row.get::<_, Option<String>>("failure_detail")? {
            Some(text) => Some(serde_json::from_str::<FailureDetail>(&text).map_err(|err| {
                StoreError::InvalidData(format!("invalid json in {table}.failure_detail: {err}"))
            })?),
            None => None,
        };

        Ok(DeliveryReport {
            report_id: row.get("id")?,
            attempt_id,
            source_record_id: row.get("source_record_id")?,
            state,
            remote_id: row.get("remote_id")?,
            failure_detail,
            sent_at: row.get("sent_at")?,
            resolved_at: row.get("resolved_at")?,
        })
    }
}

impl ReportStore for SqliteReportStore {
    fn fetch_destination_endpoint(&self, destination_id: DestinationId) -> StoreResult<Endpoint> {
        find_destination(&self.conn, destination_id)?
            .ok_or(StoreError::EndpointNotFound(destination_id))
    }

    fn record_send_attempt(&self, source_record_id: SourceRecordId) -> StoreResult<ReportId> {
        let attempt_id = Uuid::new_v4();
        self.conn.execute(
            &format!(
                "INSERT INTO {} (attempt_uuid, {}, state) VALUES (?1, ?2, 'pending');",
                self.table.table, self.table.source_column
            ),
            params![attempt_id.to_string(), source_record_id],
        )?;

        let report_id = self.conn.last_insert_rowid();
        info!(
            "event=report_create module=store status=ok table={} report_id={report_id} source_record_id={source_record_id} attempt_id={attempt_id}",
            self.table.table
        );
        Ok(report_id)
    }

    fn mark_confirmed(&self, report_id: ReportId, remote_id: RemoteId) -> StoreResult<()> {
        self.resolve(report_id, ReportState::Confirmed, Some(remote_id), None)
    }

    fn mark_failed(&self, report_id: ReportId, detail: &FailureDetail) -> StoreResult<()> {
        let encoded = serde_json::to_string(detail).map_err(|err| {
            StoreError::InvalidData(format!("failure detail is not serializable: {err}"))
        })?;
        self.resolve(report_id, ReportState::Failed, None, Some(encoded))
    }

    fn get_report(&self, report_id: ReportId) -> StoreResult<Option<DeliveryReport>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([report_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_report_row(row)?));
        }
        Ok(None)
    }
}

fn parse_state(table: ReportTable, value: &str) -> StoreResult<ReportState> {
    ReportState::parse(value).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid report state `{value}` in {}.state",
            table.table
        ))
    })
}

use serde_json::json;
use std::collections::HashSet;
use wta_core::db::{open_db, open_db_in_memory, upsert_destination};
use wta_core::{
    Endpoint, ReportListQuery, ReportState, ReportStore, ReportTable, SqliteReportStore,
    StorageParams, StoreError,
};

fn memory_store(table: ReportTable) -> SqliteReportStore {
    SqliteReportStore::new(open_db_in_memory().unwrap(), table)
}

#[test]
fn record_send_attempt_creates_pending_report() {
    let store = memory_store(ReportTable::AUTO);

    let report_id = store.record_send_attempt(7).unwrap();
    let report = store.get_report(report_id).unwrap().unwrap();

    assert_eq!(report.report_id, report_id);
    assert_eq!(report.source_record_id, 7);
    assert_eq!(report.state, ReportState::Pending);
    assert_eq!(report.remote_id, None);
    assert_eq!(report.failure_detail, None);
    assert_eq!(report.resolved_at, None);
    assert!(!report.attempt_id.is_nil());
}

#[test]
fn mark_confirmed_stores_remote_id() {
    let store = memory_store(ReportTable::TRASH_CATS);
    let report_id = store.record_send_attempt(3).unwrap();

    store.mark_confirmed(report_id, 42).unwrap();

    let report = store.get_report(report_id).unwrap().unwrap();
    assert_eq!(report.state, ReportState::Confirmed);
    assert_eq!(report.remote_id, Some(42));
    assert!(report.resolved_at.is_some());
}

#[test]
fn mark_failed_stores_detail_verbatim() {
    let store = memory_store(ReportTable::OPERATORS);
    let report_id = store.record_send_attempt(3).unwrap();
    let detail = json!({"code": "DUP", "msg": "exists", "rows": [[1, null]]});

    store.mark_failed(report_id, &detail).unwrap();

    let report = store.get_report(report_id).unwrap().unwrap();
    assert_eq!(report.state, ReportState::Failed);
    assert_eq!(report.failure_detail, Some(detail));
    assert_eq!(report.remote_id, None);
}

#[test]
fn terminal_transition_happens_at_most_once() {
    let store = memory_store(ReportTable::COMPANIES);
    let report_id = store.record_send_attempt(1).unwrap();
    store.mark_failed(report_id, &json!("timeout")).unwrap();

    let confirm_err = store.mark_confirmed(report_id, 5).unwrap_err();
    assert!(matches!(
        confirm_err,
        StoreError::InvalidReportState {
            state: ReportState::Failed,
            ..
        }
    ));
    let fail_err = store.mark_failed(report_id, &json!("again")).unwrap_err();
    assert!(matches!(fail_err, StoreError::InvalidReportState { .. }));

    let report = store.get_report(report_id).unwrap().unwrap();
    assert_eq!(report.failure_detail, Some(json!("timeout")));
}

#[test]
fn repeated_attempts_for_same_record_get_distinct_reports() {
    let store = memory_store(ReportTable::TRASH_TYPES);

    let ids: Vec<_> = (0..3)
        .map(|_| store.record_send_attempt(11).unwrap())
        .collect();
    let attempt_ids: HashSet<_> = ids
        .iter()
        .map(|id| store.get_report(*id).unwrap().unwrap().attempt_id)
        .collect();

    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
    assert_eq!(attempt_ids.len(), 3);
}

#[test]
fn tables_do_not_share_reports() {
    let conn_path = tempfile::tempdir().unwrap();
    let path = conn_path.path().join("reports.db");
    let auto = SqliteReportStore::new(open_db(&path).unwrap(), ReportTable::AUTO);
    let companies = SqliteReportStore::new(open_db(&path).unwrap(), ReportTable::COMPANIES);

    let report_id = auto.record_send_attempt(5).unwrap();

    assert!(auto.get_report(report_id).unwrap().is_some());
    assert!(companies.get_report(report_id).unwrap().is_none());
}

#[test]
fn list_reports_filters_by_state_and_source() {
    let store = memory_store(ReportTable::AUTO);
    let confirmed = store.record_send_attempt(1).unwrap();
    store.mark_confirmed(confirmed, 10).unwrap();
    let pending_a = store.record_send_attempt(2).unwrap();
    let pending_b = store.record_send_attempt(3).unwrap();

    let pending = store
        .list_reports(&ReportListQuery {
            state: Some(ReportState::Pending),
            ..ReportListQuery::default()
        })
        .unwrap();
    let pending_ids: Vec<_> = pending.iter().map(|report| report.report_id).collect();
    assert_eq!(pending_ids, vec![pending_b, pending_a]);

    let by_source = store
        .list_reports(&ReportListQuery {
            source_record_id: Some(1),
            ..ReportListQuery::default()
        })
        .unwrap();
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].report_id, confirmed);

    let limited = store
        .list_reports(&ReportListQuery {
            limit: Some(1),
            ..ReportListQuery::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[test]
fn endpoint_lookup_reads_destinations_table() {
    let store = memory_store(ReportTable::AUTO);
    upsert_destination(store.connection(), 9, &Endpoint::new("10.0.0.1", 9000)).unwrap();

    assert_eq!(
        store.fetch_destination_endpoint(9).unwrap(),
        Endpoint::new("10.0.0.1", 9000)
    );
    assert!(matches!(
        store.fetch_destination_endpoint(10).unwrap_err(),
        StoreError::EndpointNotFound(10)
    ));
}

#[test]
fn open_binds_store_to_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.db");
    let params = StorageParams::new(&path, 9);

    let store = SqliteReportStore::open(&params, ReportTable::TRASH_CATS).unwrap();
    let report_id = store.record_send_attempt(4).unwrap();
    drop(store);

    let reopened = SqliteReportStore::open(&params, ReportTable::TRASH_CATS).unwrap();
    assert_eq!(reopened.table(), ReportTable::TRASH_CATS);
    assert_eq!(
        reopened.get_report(report_id).unwrap().unwrap().source_record_id,
        4
    );
}

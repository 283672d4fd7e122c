use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wta_core::db::{open_db, upsert_destination};
use wta_core::{
    DeliveryError, DeliveryOrchestrator, DispatchRegistry, Endpoint, ReportListQuery, ReportState,
    ReportStore, ReportTable, SendError, SqliteReportStore, StorageParams, TransportOptions,
    TrashCategory, Vehicle,
};

/// Destination stub answering one request per connection with the next
/// scripted reply, then hanging up.
fn spawn_destination(replies: Vec<String>) -> (u16, JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let mut requests: Vec<Value> = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            requests.push(serde_json::from_str(line.trim_end()).unwrap());
            writer.write_all(reply.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();
        }
        requests
    });
    (port, handle)
}

fn prepare_database(path: &Path, destination_id: i64, port: u16) {
    let conn = open_db(path).unwrap();
    upsert_destination(&conn, destination_id, &Endpoint::new("127.0.0.1", port)).unwrap();
}

fn fast_options() -> TransportOptions {
    TransportOptions {
        connect_timeout: Duration::from_secs(1),
        io_timeout: Duration::from_secs(5),
    }
}

fn vehicle() -> Vehicle {
    Vehicle {
        car_number: "A123BC".to_string(),
        model: "KAMAZ".to_string(),
        rfid: Some("FF00AA".to_string()),
        id_type: "rfid".to_string(),
        rg_weight: Some(9_500),
    }
}

#[test]
fn vehicle_delivery_confirms_and_rejection_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wta.db");
    let (port, destination) = spawn_destination(vec![
        r#"{"info": {"status": "success", "info": [[501, "A123BC"]]}}"#.to_string(),
        r#"{"info": {"status": "fail", "info": {"code": "DUP", "msg": "exists"}}}"#.to_string(),
    ]);
    prepare_database(&db_path, 9, port);

    let registry = DispatchRegistry::with_builtin(fast_options());
    let storage = StorageParams::new(&db_path, 9);
    let mut orchestrator = DeliveryOrchestrator::connect(&registry, "auto", &storage).unwrap();

    let confirmed = orchestrator.deliver(7, &vehicle()).unwrap();
    let rejected = orchestrator.deliver(8, &vehicle()).unwrap();

    assert!(confirmed.success);
    assert_eq!(confirmed.remote_id, Some(501));
    assert!(!rejected.success);
    assert_eq!(
        rejected.detail,
        Some(json!({"code": "DUP", "msg": "exists"}))
    );

    let requests = destination.join().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["method"], json!("add_auto"));
    assert_eq!(requests[0]["params"]["wserver_id"], json!(7));
    assert_eq!(requests[1]["params"]["wserver_id"], json!(8));

    let store = SqliteReportStore::new(open_db(&db_path).unwrap(), ReportTable::AUTO);
    let reports = store.list_reports(&ReportListQuery::default()).unwrap();
    assert_eq!(reports.len(), 2);
    let first = reports
        .iter()
        .find(|report| report.report_id == confirmed.report_id)
        .unwrap();
    assert_eq!(first.state, ReportState::Confirmed);
    assert_eq!(first.remote_id, Some(501));
    let second = reports
        .iter()
        .find(|report| report.report_id == rejected.report_id)
        .unwrap();
    assert_eq!(second.state, ReportState::Failed);
}

#[test]
fn unreachable_destination_is_recorded_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wta.db");
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    prepare_database(&db_path, 3, port);

    let registry = DispatchRegistry::with_builtin(fast_options());
    let mut orchestrator =
        DeliveryOrchestrator::connect(&registry, "trash_cats", &StorageParams::new(&db_path, 3))
            .unwrap();
    let outcome = orchestrator
        .deliver(
            12,
            &TrashCategory {
                name: "metal".to_string(),
            },
        )
        .unwrap();

    assert!(!outcome.success);
    let detail = outcome.detail.unwrap();
    assert_eq!(detail["code"], json!("transport_error"));

    let report = orchestrator
        .report_store()
        .get_report(outcome.report_id)
        .unwrap()
        .unwrap();
    assert_eq!(report.state, ReportState::Failed);
}

#[test]
fn payload_of_another_entity_type_is_rejected_without_report() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wta.db");
    prepare_database(&db_path, 1, 9);

    let registry = DispatchRegistry::with_builtin(fast_options());
    let mut orchestrator =
        DeliveryOrchestrator::connect(&registry, "companies", &StorageParams::new(&db_path, 1))
            .unwrap();
    let err = orchestrator.deliver(1, &vehicle()).unwrap_err();

    assert!(matches!(
        err,
        DeliveryError::Send(SendError::PayloadMismatch { .. })
    ));
    let store = SqliteReportStore::new(open_db(&db_path).unwrap(), ReportTable::COMPANIES);
    assert!(store
        .list_reports(&ReportListQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn unknown_destination_fails_session() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("wta.db");

    let registry = DispatchRegistry::with_builtin(fast_options());
    let err = DeliveryOrchestrator::connect(&registry, "users", &StorageParams::new(&db_path, 77))
        .unwrap_err();

    assert!(err.to_string().contains("destination 77"));
}

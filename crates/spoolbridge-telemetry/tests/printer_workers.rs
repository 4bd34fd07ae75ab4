//! Integration tests for printer workers
//!
//! Reports enter through the router or straight into a worker and must end
//! up as catalog writes against an InMemoryCatalog.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use spoolbridge_catalog::{AnyCatalog, CatalogWrite, ExternalFilament, InMemoryCatalog};
use spoolbridge_core::{AmsUnitId, TagField, UnitSnapshot};
use spoolbridge_engine::{PrinterReconciler, ReconcileContext, TrayAction, UnitOutcome};
use spoolbridge_telemetry::{
    PrinterConfig, PrinterHandle, PrinterInfo, PrinterManager, PrinterStatus, PrinterWorker,
    ReportRouter, TelemetryError, TelemetryEvent, decode_report, report_topic,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const P1: &str = "01S00C000000001";
const P2: &str = "01P00A000000002";
const UUID_A: &str = "A1B2C3D4E5F60718293A4B5C6D7E8F90";
const UUID_B: &str = "B1B2C3D4E5F60718293A4B5C6D7E8F90";
const UUID_C: &str = "C1B2C3D4E5F60718293A4B5C6D7E8F90";
const UUID_D: &str = "D1B2C3D4E5F60718293A4B5C6D7E8F90";
const UUID_E: &str = "E1B2C3D4E5F60718293A4B5C6D7E8F90";

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new().with_external([ExternalFilament {
        id: "bambulab_pla_basic_orange_1750_1000".to_string(),
        manufacturer: "Bambu Lab".to_string(),
        name: "PLA Basic Orange".to_string(),
        material: "PLA".to_string(),
        density: 1.26,
        diameter: 1.75,
        color_hex: Some("FF6A13".to_string()),
        ..Default::default()
    }])
}

fn printer(id: &str) -> PrinterConfig {
    PrinterConfig {
        id: id.to_string(),
        ip: "192.168.1.50".to_string(),
        access_code: "12345678".to_string(),
    }
}

fn feeder_report(uuid: &str, remain: i64) -> Vec<u8> {
    json!({
        "print": {
            "command": "push_status",
            "ams": {
                "ams": [{
                    "id": "0",
                    "temp": "24.5",
                    "humidity": "4",
                    "tray": [
                        {
                            "id": "0",
                            "remain": remain,
                            "tray_uuid": uuid,
                            "tray_color": "FF6A13FF",
                            "tray_sub_brands": "PLA Basic",
                            "tray_weight": "1000",
                            "tray_type": "PLA"
                        },
                        {"id": "1"}
                    ]
                }]
            }
        }
    })
    .to_string()
    .into_bytes()
}

fn marker() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

fn start(catalog: &InMemoryCatalog, printers: &[&str]) -> PrinterHandle {
    let any = Arc::new(AnyCatalog::from(catalog.clone()));
    let context = Arc::new(ReconcileContext::new(any, TagField::default(), Some(1)));
    let mut manager = PrinterManager::new(context);
    for id in printers {
        manager.register(printer(id)).unwrap();
    }
    manager.start()
}

/// Queue a marker event behind everything already routed and wait for it.
async fn drain(router: &ReportRouter, handle: &PrinterHandle, printer_id: &str) {
    router
        .send(printer_id, TelemetryEvent::Activity { received_at: marker() })
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if handle.printer(printer_id).unwrap().last_message == Some(marker()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker did not drain its queue");
}

#[tokio::test]
async fn test_routed_report_reaches_catalog() {
    let catalog = catalog();
    let handle = start(&catalog, &[P1]);
    let router = handle.router();

    router.send(P1, TelemetryEvent::Connected).await.unwrap();
    router
        .route(&report_topic(P1), &feeder_report(UUID_A, 50))
        .await
        .unwrap();
    drain(&router, &handle, P1).await;

    let writes = catalog.writes();
    assert_eq!(writes.len(), 2);
    assert!(matches!(writes[0], CatalogWrite::CreateFilament(_)));
    assert!(matches!(writes[1], CatalogWrite::CreateSpool(_)));

    let info = handle.printer(P1).unwrap();
    assert_eq!(info.status, PrinterStatus::Connected);
    assert_eq!(info.ams_unit_count, Some(1));
    assert_eq!(info.active_tray_count, Some(1));
    assert!(info.last_ams_message.is_some());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_repeated_report_writes_once() {
    let catalog = catalog();
    let handle = start(&catalog, &[P1]);
    let router = handle.router();

    let report = feeder_report(UUID_A, 50);
    router.route(&report_topic(P1), &report).await.unwrap();
    router.route(&report_topic(P1), &report).await.unwrap();
    drain(&router, &handle, P1).await;

    assert_eq!(catalog.writes().len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_status_only_report_updates_activity() {
    let catalog = catalog();
    let handle = start(&catalog, &[P1]);
    let router = handle.router();

    router
        .route(&report_topic(P1), br#"{"print":{"mc_percent":12}}"#)
        .await
        .unwrap();
    drain(&router, &handle, P1).await;

    let info = handle.printer(P1).unwrap();
    assert!(info.last_ams_message.is_none());
    assert!(info.ams_unit_count.is_none());
    assert_eq!(catalog.request_count(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_printers_listed_in_registration_order() {
    let catalog = catalog();
    let handle = start(&catalog, &[P2, P1]);
    let router = handle.router();

    router
        .route(&report_topic(P1), &feeder_report(UUID_A, 50))
        .await
        .unwrap();
    router
        .route(&report_topic(P2), &feeder_report(UUID_B, 20))
        .await
        .unwrap();
    drain(&router, &handle, P1).await;
    drain(&router, &handle, P2).await;

    let ids: Vec<String> = handle.printers().into_iter().map(|p| p.printer_id).collect();
    assert_eq!(ids, vec![P2.to_string(), P1.to_string()]);

    let spools = catalog.spools();
    assert_eq!(spools.len(), 2);
    // The second pass reuses the filament created by the first
    assert_eq!(catalog.filaments().len(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_routing_after_shutdown_fails() {
    let catalog = catalog();
    let handle = start(&catalog, &[P1]);
    let router = handle.router();

    handle.shutdown().await;

    let result = router.route(&report_topic(P1), &feeder_report(UUID_A, 50)).await;
    assert!(matches!(result, Err(TelemetryError::WorkerStopped(id)) if id == P1));
    assert!(catalog.writes().is_empty());
}

#[tokio::test]
async fn test_drain_processes_every_queued_report() {
    let catalog = catalog();
    let handle = start(&catalog, &[P1]);
    let router = handle.router();

    let uuids = [UUID_A, UUID_B, UUID_C, UUID_D, UUID_E];
    for (i, uuid) in uuids.iter().enumerate() {
        router
            .route(&report_topic(P1), &feeder_report(uuid, 90 - i as i64 * 10))
            .await
            .unwrap();
    }
    drop(router);

    let printers = tokio::time::timeout(Duration::from_secs(5), handle.drain())
        .await
        .expect("workers did not finish their queues");

    assert_eq!(catalog.spools().len(), uuids.len());
    assert_eq!(catalog.filaments().len(), 1);
    assert_eq!(printers.len(), 1);
    assert_eq!(printers[0].active_tray_count, Some(1));
}

fn worker(
    catalog: &InMemoryCatalog,
) -> (
    PrinterWorker<InMemoryCatalog>,
    mpsc::Sender<TelemetryEvent>,
    Arc<RwLock<PrinterInfo>>,
    CancellationToken,
) {
    let context = Arc::new(ReconcileContext::new(
        Arc::new(catalog.clone()),
        TagField::default(),
        None,
    ));
    let (tx, rx) = mpsc::channel(8);
    let info = Arc::new(RwLock::new(PrinterInfo::new(&printer(P1))));
    let cancel = CancellationToken::new();
    let worker = PrinterWorker::new(
        PrinterReconciler::new(P1, context),
        rx,
        Arc::clone(&info),
        cancel.clone(),
    );
    (worker, tx, info, cancel)
}

#[tokio::test]
async fn test_worker_handles_report() {
    let catalog = catalog();
    let (mut worker, _tx, info, _cancel) = worker(&catalog);

    let units: Vec<UnitSnapshot> = decode_report(&feeder_report(UUID_A, 50)).unwrap();
    let results = worker
        .handle(TelemetryEvent::Report {
            received_at: marker(),
            units,
        })
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].unit, AmsUnitId::A);
    let UnitOutcome::Processed(trays) = results[0].result.as_ref().unwrap() else {
        panic!("unit was not processed");
    };
    assert_eq!(trays[0].tray, "A0");
    assert!(matches!(
        trays[0].action,
        TrayAction::CreatedFilamentAndSpool { .. }
    ));

    let info = info.read().unwrap();
    assert_eq!(info.last_ams_message, Some(marker()));
    assert_eq!(info.active_tray_count, Some(1));
}

#[tokio::test]
async fn test_worker_tracks_connection_state() {
    let catalog = catalog();
    let (mut worker, _tx, info, _cancel) = worker(&catalog);

    assert!(worker.handle(TelemetryEvent::Connected).await.is_empty());
    assert_eq!(info.read().unwrap().status, PrinterStatus::Connected);

    worker.handle(TelemetryEvent::Disconnected).await;
    assert_eq!(info.read().unwrap().status, PrinterStatus::Disconnected);
}

#[tokio::test]
async fn test_worker_exits_when_queue_closes() {
    let catalog = catalog();
    let (worker, tx, info, _cancel) = worker(&catalog);

    tx.send(TelemetryEvent::Connected).await.unwrap();
    tx.send(TelemetryEvent::Activity {
        received_at: marker(),
    })
    .await
    .unwrap();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), worker.run())
        .await
        .unwrap();

    let info = info.read().unwrap();
    assert_eq!(info.last_message, Some(marker()));
    assert_eq!(info.status, PrinterStatus::Disconnected);
}

#[tokio::test]
async fn test_cancelled_worker_skips_queued_events() {
    let catalog = catalog();
    let (worker, tx, _info, cancel) = worker(&catalog);

    let units = decode_report(&feeder_report(UUID_A, 50)).unwrap();
    tx.send(TelemetryEvent::Report {
        received_at: marker(),
        units,
    })
    .await
    .unwrap();
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), worker.run())
        .await
        .unwrap();

    assert!(catalog.writes().is_empty());
}

//! Periodic service lifecycle: immediate first pass, no overlapping
//! passes, clean stop.

mod common;

use chromo_core::{scanner::FsEntries, service::ReconcileService, store::CaseStore};
use std::path::Path;
use std::time::Duration;

type Service = ReconcileService<CaseStore, FsEntries>;

fn service(dir: &Path, interval: Duration) -> Service {
    ReconcileService::new(common::reconciler(common::seeded_store(1), dir), interval)
}

fn case_count(service: &Service) -> i64 {
    let reconciler = service.reconciler();
    let guard = reconciler.lock().unwrap();
    guard.repository().case_count().unwrap()
}

async fn wait_for_cases(service: &Service, expected: i64, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if case_count(service) == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn first_pass_runs_on_start() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(dir.path(), &["L2104050001.001.MMI", "G2104050002.001.MMI"]);
    let service = service(dir.path(), Duration::from_secs(3600));

    let handle = service.start();
    assert!(
        wait_for_cases(&service, 2, Duration::from_secs(5)).await,
        "start did not run an immediate pass"
    );
    assert!(handle.is_running());
    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn later_ticks_pick_up_new_files() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(dir.path(), &["L2104050001.001.MMI"]);
    let service = service(dir.path(), Duration::from_millis(50));

    let handle = service.start();
    assert!(wait_for_cases(&service, 1, Duration::from_secs(5)).await);

    common::touch(dir.path(), &["L2104050002.001.MMI"]);
    assert!(
        wait_for_cases(&service, 2, Duration::from_secs(5)).await,
        "a later tick should ingest the new file"
    );
    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_passes_do_not_double_insert() {
    let dir = tempfile::tempdir().unwrap();
    let names: Vec<String> = (0..30).map(|n| format!("L210405{n:04}.001.MMI")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    common::touch(dir.path(), &refs);
    let service = service(dir.path(), Duration::from_secs(3600));

    let handle = service.start();
    let (a, b, c) = tokio::join!(service.run_now(), service.run_now(), service.run_now());
    let on_demand = a.unwrap().inserted.len() + b.unwrap().inserted.len() + c.unwrap().inserted.len();
    assert!(on_demand <= 30);
    handle.stop().await;

    assert_eq!(case_count(&service), 30);
    let reconciler = service.reconciler();
    let guard = reconciler.lock().unwrap();
    assert_eq!(guard.repository().analysis_count().unwrap(), 60);
    assert_eq!(guard.repository().count_record_count().unwrap(), 30);
}

#[tokio::test]
async fn run_now_without_timer() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(dir.path(), &["L2104050001.001.MMI"]);
    let service = service(dir.path(), Duration::from_secs(3600));

    let report = service.run_now().await.unwrap();
    assert_eq!(report.inserted, ["L2104050001"]);
    let again = service.run_now().await.unwrap();
    assert!(again.inserted.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stopped_service_runs_no_more_passes() {
    let dir = tempfile::tempdir().unwrap();
    common::touch(dir.path(), &["L2104050001.001.MMI"]);
    let service = service(dir.path(), Duration::from_millis(50));

    let handle = service.start();
    assert!(wait_for_cases(&service, 1, Duration::from_secs(5)).await);
    handle.stop().await;

    common::touch(dir.path(), &["L2104050002.001.MMI"]);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(case_count(&service), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreadable_source_keeps_the_loop_alive() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("mount");
    let service = service(&source, Duration::from_millis(50));

    let handle = service.start();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(handle.is_running());
    assert_eq!(case_count(&service), 0);

    common::touch(&source, &["L2104050001.001.MMI"]);
    assert!(wait_for_cases(&service, 1, Duration::from_secs(5)).await);
    handle.stop().await;
}

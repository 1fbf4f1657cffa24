//! chromo-scanner: discovers new karyotype cases and assigns reviewers.
//!
//! Usage:
//!   chromo-scanner --config chromo.json
//!   chromo-scanner --config chromo.json --roster roster.json --once
//!   chromo-scanner --db cases.db --src /media/msd --once

use anyhow::Result;
use chromo_core::{
    clock::{Clock, SystemClock},
    config::ChromoConfig,
    reconcile::Reconciler,
    scanner::FsEntries,
    service::ReconcileService,
    store::{CaseStore, Roster},
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let once = args.iter().any(|a| a == "--once");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => ChromoConfig::load(path)?,
        None => ChromoConfig::default(),
    };
    if let Some(db) = flag_value(&args, "--db") {
        config.database_path = db.to_string();
    }
    if let Some(src) = flag_value(&args, "--src") {
        config.src_path = src.into();
    }
    config.validate()?;

    println!("chromo-scanner");
    println!("  db:        {}", config.database_path);
    println!("  src:       {}", config.src_path.display());
    println!("  marker:    {}", config.src_ext);
    println!("  interval:  {}s", config.scan_interval_secs);
    println!();

    let store = CaseStore::open(&config.database_path)?;
    store.migrate()?;

    if let Some(path) = flag_value(&args, "--roster") {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let roster: Roster = serde_json::from_str(&content)?;
        let now = SystemClock::with_offset_hours(config.utc_offset_hours).now();
        store.import_roster(&roster, now)?;
        log::info!(
            "imported roster: {} users, {} groups, {} divisions",
            roster.users.len(),
            roster.groups.len(),
            roster.divisions.len()
        );
    }

    let mut reconciler = Reconciler::from_config(store, FsEntries, &config);

    if once {
        let report = reconciler.run_pass()?;
        println!("=== PASS SUMMARY ===");
        println!("  scanned:    {}", report.scanned_path);
        println!("  discovered: {}", report.discovered);
        println!("  new:        {}", report.new_cases);
        println!("  inserted:   {}", report.inserted.len());
        for failure in &report.failures {
            println!("  skipped:    {} ({})", failure.case_id, failure.error);
        }
        println!("  total:      {}", reconciler.repository().case_count()?);
        return Ok(());
    }

    let service = ReconcileService::new(reconciler, config.scan_interval());
    let handle = service.start();
    tokio::signal::ctrl_c().await?;
    log::info!("Ctrl-C received, stopping");
    handle.stop().await;
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

//! Yielder sampling binary
//!
//! Builds the yielder an input configuration selects, pulls records from
//! it and reports per-source counts.

use riffle_core::metrics::gather_system_metrics;
use riffle_core::{plan_yielder, InputConfig, YielderRuntime};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration from a JSON file or the environment
    let config = match std::env::var("RIFFLE_CONFIG") {
        Ok(path) => InputConfig::from_json_file(&PathBuf::from(path))?,
        Err(_) => InputConfig::from_env()?,
    };
    let num_records: u64 = std::env::var("RIFFLE_NUM_RECORDS")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or(1000);

    let plan = plan_yielder(&config)?;
    let strategy = plan.kind();
    let yielder = plan.build(&YielderRuntime::shared()?)?;
    info!(%strategy, pattern = %config.file_pattern, "Sampling yielder");

    let start = Instant::now();
    let mut per_source: BTreeMap<usize, u64> = BTreeMap::new();
    let mut bytes = 0u64;

    for _ in 0..num_records {
        let record = match yielder.yield_record() {
            Ok(record) => record,
            Err(e) => {
                error!("Yield failed: {}", e);
                yielder.close();
                return Err(e.into());
            }
        };
        *per_source.entry(record.source_id).or_default() += 1;
        bytes += record.size() as u64;
    }

    let elapsed = start.elapsed();
    for (source_id, records) in &per_source {
        info!(source_id, records, "Records per source");
    }
    info!(
        records = num_records,
        bytes,
        epoch = yielder.current_epoch(),
        ?elapsed,
        "Sampling complete"
    );

    yielder.close();
    println!("{}", gather_system_metrics());
    Ok(())
}

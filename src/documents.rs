//! `pidx documents`: list what the query side would load.

use anyhow::Result;
use passage_index_core::registry::{IndexRegistry, LoadReport};

use crate::config::Config;
use crate::store;

pub fn list_documents(config: &Config) -> Result<()> {
    let (registry, report) = store::load_registry(&config.paths)?;
    print_documents(&registry, &report);
    Ok(())
}

fn print_documents(registry: &IndexRegistry, report: &LoadReport) {
    println!("{:<24} {:<32} {:>7} {:>5}", "KEY", "FILE", "CHUNKS", "DIMS");
    for entry in registry.iter() {
        println!(
            "{:<24} {:<32} {:>7} {:>5}",
            entry.key,
            entry.file_name,
            entry.chunks.len(),
            entry.index.dims()
        );
    }

    if !report.failed.is_empty() {
        println!();
        println!("failed to load: {}", report.failed.len());
        for failure in &report.failed {
            println!("  {}: {}", failure.key, failure.reason);
        }
    }
}

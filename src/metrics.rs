use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec};

use crate::error::StorageError;

lazy_static::lazy_static! {
    pub static ref STORE_OPS: IntCounterVec = register_int_counter_vec!(
        "podsync_storage_ops_total",
        "Total number of metadata store operations",
        &["op", "outcome"]
    ).unwrap();

    pub static ref KEYS_ISSUED: IntCounter = register_int_counter!(
        "podsync_keys_issued_total",
        "Total number of short keys issued"
    ).unwrap();

    pub static ref LEGACY_RECORDS: IntCounter = register_int_counter!(
        "podsync_legacy_records_total",
        "Loads that filled quality and page size defaults"
    ).unwrap();
}

pub fn outcome<T>(result: &Result<T, StorageError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(StorageError::Validation(_)) => "invalid",
        Err(StorageError::NotFound(_)) => "not_found",
        Err(StorageError::Decode(_)) => "corrupt",
        Err(_) => "error",
    }
}

pub fn record_op<T>(op: &str, result: &Result<T, StorageError>) {
    STORE_OPS.with_label_values(&[op, outcome(result)]).inc();
}

/// Prometheus text exposition of everything registered in this process.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

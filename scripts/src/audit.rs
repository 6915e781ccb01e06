//! The audit sink upgrade records are emitted to.
//!
//! External indexers subscribe here; the durable history append lives in the
//! deployments file and commits with the upgrade itself, so sinks are pure
//! observers.

use tracing::info;
use upgrade_common::types::UpgradeRecord;

/// An observer of committed upgrades
pub trait AuditSink: Send + Sync {
    /// Called once per committed upgrade, after its receipt is confirmed
    fn record(&self, record: &UpgradeRecord);
}

/// The default sink: emits each record as a structured tracing event
#[derive(Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, record: &UpgradeRecord) {
        info!(
            proxy = %record.proxy,
            from = %record.from_implementation,
            to = %record.to_implementation,
            tx_hash = %record.tx_hash,
            block_number = record.block_number,
            timestamp = record.timestamp,
            initiator = %record.initiator,
            "implementation upgraded"
        );
    }
}

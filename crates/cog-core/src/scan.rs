//! Full scans: let the policy prepare the handle, then drain an iterator

use crate::handle::CogHandle;
use crate::iter::CogIter;
use crate::policy::RewritePolicy;
use crate::record::Record;
use std::time::{Duration, Instant};

/// Outcome of a timed scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Records produced
    pub records: usize,
    /// Wall time, including the policy's rewrites
    pub elapsed: Duration,
}

impl ScanReport {
    /// Mean time per record, `None` for an empty scan
    #[must_use]
    pub fn per_record(&self) -> Option<Duration> {
        let records = u32::try_from(self.records).ok()?;
        (records > 0).then(|| self.elapsed / records)
    }
}

/// Run the policy hook and open an iterator on the (possibly rewritten)
/// handle
pub fn prepare(handle: &CogHandle, policy: &dyn RewritePolicy) -> CogIter {
    policy.before_iterator(handle);
    handle.iter()
}

/// Scan, calling `visit` with the 1-based row number and each record
pub fn scan_with<F>(handle: &CogHandle, policy: &dyn RewritePolicy, mut visit: F) -> ScanReport
where
    F: FnMut(usize, &Record),
{
    let start = Instant::now();
    let mut records = 0;
    for record in prepare(handle, policy) {
        records += 1;
        visit(records, &record);
    }
    let report = ScanReport {
        records,
        elapsed: start.elapsed(),
    };
    tracing::debug!(
        records,
        elapsed_us = u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
        policy = policy.name(),
        "scan"
    );
    report
}

/// Timed scan that discards the records
pub fn scan(handle: &CogHandle, policy: &dyn RewritePolicy) -> ScanReport {
    scan_with(handle, policy, |_, _| {})
}

//! Per-cluster output and error aggregation.
//!
//! Every cluster gets an append-only [`OutputBuffer`] that writers can hold on
//! to outside the tool's lock, plus a persistent accumulator the buffers are
//! flushed into when output is read. Flushing is cumulative: reading output
//! mid-sequence never loses bytes appended afterwards.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Appendable output stream for one cluster
///
/// Clones share the same pending bytes. Each call appends atomically, so
/// concurrent writers never interleave within a line.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    pending: Arc<Mutex<Vec<u8>>>,
}

impl OutputBuffer {
    /// Append `line` followed by a newline
    pub fn append_line(&self, line: &str) {
        let mut pending = self.pending.lock();
        pending.extend_from_slice(line.as_bytes());
        pending.push(b'\n');
    }

    fn drain(&self) -> Vec<u8> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl io::Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output buffers, flushed output and recorded errors, keyed by cluster identity
#[derive(Default)]
pub(crate) struct OutputAggregator {
    buffers: HashMap<String, OutputBuffer>,
    contents: HashMap<String, Vec<u8>>,
    errors: HashMap<String, Arc<anyhow::Error>>,
}

impl OutputAggregator {
    /// The cluster's buffer, created on first use
    pub(crate) fn buffer_for(&mut self, cluster: &str) -> OutputBuffer {
        self.buffers.entry(cluster.to_string()).or_default().clone()
    }

    /// Everything written for the cluster so far
    pub(crate) fn output_for(&mut self, cluster: &str) -> String {
        self.flush();
        self.contents
            .get(cluster)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    fn flush(&mut self) {
        for (cluster, buffer) in &self.buffers {
            let drained = buffer.drain();
            if !drained.is_empty() {
                self.contents.entry(cluster.clone()).or_default().extend(drained);
            }
        }
    }

    /// Record the cluster's error; a later one replaces it, nothing clears it
    pub(crate) fn record_error(&mut self, cluster: &str, err: anyhow::Error) {
        if let Some(previous) = self.errors.insert(cluster.to_string(), Arc::new(err)) {
            debug!("Cluster {} error replaced, previous: {}", cluster, previous);
        }
    }

    pub(crate) fn error_for(&self, cluster: &str) -> Option<Arc<anyhow::Error>> {
        self.errors.get(cluster).cloned()
    }
}

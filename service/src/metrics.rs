//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Server-wide counters mirrored into a non-blocking snapshot.
//!
//! Recording goes through the `metrics` crate facade (`counter!`/`gauge!`),
//! so whichever exporter the launcher installs (Prometheus, statsd, or none)
//! sees the same numbers this snapshot reports. `ServerMetrics` itself keeps
//! a private copy in atomics purely so a caller can read current values
//! without depending on a specific recorder being installed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time read of a server's accumulated counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sessions_started: u64,
    pub sessions_ended: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub protocol_errors: u64,
    pub handler_errors: u64,
    pub timeout_errors: u64,
    pub overcapacity_errors: u64,
}

/// Accumulates the counters a server's lifetime produces.
///
/// Each `record_*` call both updates the local atomic (for
/// [`ServerMetrics::snapshot`]) and emits the matching `metrics` macro call,
/// so dashboards built against the `metrics` facade and code reading this
/// struct directly stay consistent with each other.
#[derive(Default)]
pub struct ServerMetrics {
    sessions_started: AtomicU64,
    sessions_ended: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    protocol_errors: AtomicU64,
    handler_errors: AtomicU64,
    timeout_errors: AtomicU64,
    overcapacity_errors: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sessions_started").increment(1);
    }

    pub fn record_session_ended(&self, duration: Duration) {
        self.sessions_ended.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sessions_ended").increment(1);
        metrics::histogram!("session_duration_seconds").record(duration.as_secs_f64());
    }

    pub fn record_bytes_received(&self, count: u64) {
        self.bytes_received.fetch_add(count, Ordering::Relaxed);
        metrics::counter!("bytes_received").increment(count);
    }

    pub fn record_bytes_sent(&self, count: u64) {
        self.bytes_sent.fetch_add(count, Ordering::Relaxed);
        metrics::counter!("bytes_sent").increment(count);
    }

    pub fn record_error(&self, metric_name: &'static str) {
        metrics::counter!(metric_name).increment(1);
        match metric_name {
            "protocol_errors" => self.protocol_errors.fetch_add(1, Ordering::Relaxed),
            "handler_errors" => self.handler_errors.fetch_add(1, Ordering::Relaxed),
            "timeout_errors" => self.timeout_errors.fetch_add(1, Ordering::Relaxed),
            "overcapacity_errors" => self.overcapacity_errors.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_ended: self.sessions_ended.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            timeout_errors: self.timeout_errors.load(Ordering::Relaxed),
            overcapacity_errors: self.overcapacity_errors.load(Ordering::Relaxed),
        }
    }
}

/// Helper only used by tests in this module; production code always goes
/// through [`Instant::elapsed`] at the call site.
#[cfg(test)]
fn one_millisecond() -> Duration {
    Duration::from_millis(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = ServerMetrics::new();
        metrics.record_session_started();
        metrics.record_session_started();
        metrics.record_bytes_received(100);
        metrics.record_error("protocol_errors");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_started, 2);
        assert_eq!(snapshot.bytes_received, 100);
        assert_eq!(snapshot.protocol_errors, 1);
        assert_eq!(snapshot.handler_errors, 0);
    }

    #[test]
    fn session_ended_records_duration_without_panicking() {
        let metrics = ServerMetrics::new();
        metrics.record_session_ended(one_millisecond());
        assert_eq!(metrics.snapshot().sessions_ended, 1);
    }

    #[test]
    fn unknown_error_name_is_ignored_locally() {
        let metrics = ServerMetrics::new();
        metrics.record_error("something_else");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.protocol_errors, 0);
        assert_eq!(snapshot.handler_errors, 0);
    }
}

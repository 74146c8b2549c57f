// file: src/utils/telemetry.rs
// description: health checks and operation timing for runs and the verify command
// reference: health probes and phase timing logged through tracing

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn icon(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "✓",
            HealthStatus::Degraded => "⚠",
            HealthStatus::Unhealthy => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    fn healthy(component: &str, response_time: Duration) -> Self {
        Self::with_status(component, HealthStatus::Healthy, None, response_time)
    }

    fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self::with_status(component, HealthStatus::Degraded, Some(message), response_time)
    }

    fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self::with_status(component, HealthStatus::Unhealthy, Some(message), response_time)
    }

    fn with_status(
        component: &str,
        status: HealthStatus,
        message: Option<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            message,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    /// Times `check`: `Ok(true)` is healthy, `Ok(false)` degraded with
    /// `degraded_message`, an error unhealthy.
    pub async fn probe<F>(component: &str, degraded_message: &str, check: F) -> Self
    where
        F: Future<Output = Result<bool>>,
    {
        let start = Instant::now();
        let outcome = check.await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(true) => Self::healthy(component, elapsed),
            Ok(false) => Self::degraded(component, degraded_message.to_string(), elapsed),
            Err(e) => Self::unhealthy(component, e.to_string(), elapsed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub checked_at: DateTime<Utc>,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            overall_status,
            checks,
            checked_at: Utc::now(),
            version,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == HealthStatus::Healthy
    }

    pub fn format(&self) -> String {
        let mut output = format!(
            "{} System Health: {:?}\nVersion: {}\nChecked: {}\n\n",
            self.overall_status.icon(),
            self.overall_status,
            self.version,
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for check in &self.checks {
            output.push_str(&format!(
                "{} {} ({:?}) - {}ms",
                check.status.icon(),
                check.component,
                check.status,
                check.response_time_ms
            ));

            if let Some(ref msg) = check.message {
                output.push_str(&format!("\n  {}", msg));
            }

            output.push('\n');
        }

        output
    }
}

/// Times one phase of a run (crawl, diff, apply, ...) and logs its
/// throughput when finished.
pub struct PhaseTimer {
    phase: &'static str,
    started: Instant,
}

impl PhaseTimer {
    pub fn start(phase: &'static str) -> Self {
        debug!("{} started", phase);
        Self {
            phase,
            started: Instant::now(),
        }
    }

    pub fn mark(&self, label: &str) {
        debug!(
            "{}: {} after {:.2}s",
            self.phase,
            label,
            self.started.elapsed().as_secs_f64()
        );
    }

    pub fn warn_if_over(&self, budget: Duration) {
        let elapsed = self.started.elapsed();
        if elapsed > budget {
            warn!(
                "{} has run {:.1}s, over its {:.0}s budget",
                self.phase,
                elapsed.as_secs_f64(),
                budget.as_secs_f64()
            );
        }
    }

    /// Logs the phase's metrics for `items` processed and returns them.
    pub fn finish(self, items: usize) -> PhaseMetrics {
        let metrics = PhaseMetrics::new(self.phase, items, self.started.elapsed());
        info!("{}", metrics);
        metrics
    }
}

#[derive(Debug, Clone)]
pub struct PhaseMetrics {
    pub phase: &'static str,
    pub items: usize,
    pub duration: Duration,
    pub items_per_second: f64,
}

impl PhaseMetrics {
    pub fn new(phase: &'static str, items: usize, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        let items_per_second = if secs > 0.0 { items as f64 / secs } else { 0.0 };

        Self {
            phase,
            items,
            duration,
            items_per_second,
        }
    }
}

impl fmt::Display for PhaseMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} finished: {} items in {:.2}s ({:.1}/s)",
            self.phase,
            self.items,
            self.duration.as_secs_f64(),
            self.items_per_second
        )
    }
}

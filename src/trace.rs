//! Forward/backward timing trace
//!
//! A process-wide span recorder for the per-episode pipeline. Disabled by
//! default; `centinela train --trace` turns it on and prints the report after
//! the run.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Pipeline stages that can be timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceStep {
    /// Recurrent encoder over all time steps
    Encode,
    /// Tied projection and vocabulary softmax
    Output,
    /// Pointer-sentinel scoring and mixing
    Sentinel,
    /// Masked sequence NLL
    Loss,
    /// Reverse pass over the recorded graph
    Backward,
    /// Gradient clipping and parameter update
    Optimizer,
    /// Dense matrix product kernel
    Matmul,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single timing measurement.
#[derive(Debug, Clone)]
pub struct TraceMeasurement {
    pub step: TraceStep,
    pub duration: Duration,
    pub metadata: String,
}

/// Thread-safe tracer for collecting timing measurements.
pub struct Tracer {
    measurements: Mutex<Vec<TraceMeasurement>>,
    active_spans: Mutex<HashMap<TraceStep, Instant>>,
    enabled: Mutex<bool>,
}

impl Tracer {
    /// Create a new, disabled tracer.
    pub fn new() -> Self {
        Self {
            measurements: Mutex::new(Vec::new()),
            active_spans: Mutex::new(HashMap::new()),
            enabled: Mutex::new(false),
        }
    }

    pub fn enable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn disable(&self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a timing span.
    pub fn start(&self, step: TraceStep) {
        if !self.is_enabled() {
            return;
        }
        let mut spans = self.active_spans.lock().unwrap_or_else(PoisonError::into_inner);
        spans.insert(step, Instant::now());
    }

    /// End a timing span and record the measurement. Ends without a matching
    /// start are ignored.
    pub fn end(&self, step: TraceStep, metadata: impl Into<String>) {
        if !self.is_enabled() {
            return;
        }
        let mut spans = self.active_spans.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(start) = spans.remove(&step) {
            let duration = start.elapsed();
            let mut measurements = self.measurements.lock().unwrap_or_else(PoisonError::into_inner);
            measurements.push(TraceMeasurement { step, duration, metadata: metadata.into() });
        }
    }

    /// Run a closure within a measured span.
    #[inline]
    pub fn span<F, R>(&self, step: TraceStep, metadata: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.is_enabled() {
            return f();
        }
        self.start(step);
        let result = f();
        self.end(step, metadata);
        result
    }

    /// Number of recorded measurements for a step.
    pub fn count(&self, step: TraceStep) -> usize {
        self.measurements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| m.step == step)
            .count()
    }

    pub fn clear(&self) {
        self.measurements.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.active_spans.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Per-step time breakdown, slowest first, followed by the share of time
    /// spent in the recurrence versus the output head.
    pub fn report(&self) -> String {
        let measurements = self.measurements.lock().unwrap_or_else(PoisonError::into_inner);
        if measurements.is_empty() {
            return "No measurements recorded. Enable tracing with TRACER.enable()".to_string();
        }

        let mut totals: HashMap<TraceStep, Duration> = HashMap::new();
        let mut counts: HashMap<TraceStep, usize> = HashMap::new();
        let mut total_time = Duration::ZERO;

        for m in measurements.iter() {
            *totals.entry(m.step).or_default() += m.duration;
            *counts.entry(m.step).or_default() += 1;
            total_time += m.duration;
        }

        let mut output = String::from("\n=== centinela trace report ===\n");
        output.push_str(&format!("Total Measured Time: {total_time:.2?}\n"));
        output.push_str(&format!(
            "{:<10} | {:<8} | {:<15} | {:<8}\n",
            "Step", "Count", "Duration", "% Time"
        ));
        output.push_str("-----------+----------+-----------------+---------\n");

        let mut sorted_steps: Vec<_> = totals.keys().collect();
        sorted_steps.sort_by(|a, b| totals[b].cmp(&totals[a]));

        for step in sorted_steps {
            let duration = totals[step];
            let percentage = if total_time.as_nanos() > 0 {
                (duration.as_secs_f64() / total_time.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            output.push_str(&format!(
                "{:<10} | {:<8} | {:<15.2?} | {:>7.2}%\n",
                step.to_string(),
                counts[step],
                duration,
                percentage
            ));
        }

        let encode = totals.get(&TraceStep::Encode).copied().unwrap_or_default();
        let head = totals.get(&TraceStep::Output).copied().unwrap_or_default()
            + totals.get(&TraceStep::Sentinel).copied().unwrap_or_default();
        if (encode + head).as_nanos() > 0 {
            let recurrent_pct = encode.as_secs_f64() / (encode + head).as_secs_f64() * 100.0;
            output.push_str(&format!(
                "\nRecurrence: {encode:.2?} ({recurrent_pct:.1}%), head: {head:.2?}\n"
            ));
        }

        output
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global tracer instance.
pub static TRACER: LazyLock<Tracer> = LazyLock::new(Tracer::new);

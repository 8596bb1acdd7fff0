//! Wall-clock time spent in each named span.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Aggregate for one span name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTiming {
    /// Closed spans seen.
    pub count: u64,
    /// Sum of their lifetimes, from creation to close.
    pub total: Duration,
}

impl StageTiming {
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

/// Shared handle to the timings recorded by a [`SpanTimingLayer`].
#[derive(Debug, Clone, Default)]
pub struct SpanTimings {
    stages: Arc<Mutex<BTreeMap<String, StageTiming>>>,
}

impl SpanTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer feeding this handle.
    pub fn layer(&self) -> SpanTimingLayer {
        SpanTimingLayer { timings: self.clone() }
    }

    fn record(&self, name: &str, elapsed: Duration) {
        if let Ok(mut stages) = self.stages.lock() {
            let stage = stages.entry(name.to_string()).or_default();
            stage.count += 1;
            stage.total += elapsed;
        }
    }

    /// Timings by span name, alphabetical.
    pub fn snapshot(&self) -> BTreeMap<String, StageTiming> {
        self.stages.lock().map(|stages| stages.clone()).unwrap_or_default()
    }

    /// Plain-text table, slowest stage first.
    pub fn render(&self) -> String {
        let mut stages: Vec<(String, StageTiming)> = self.snapshot().into_iter().collect();
        stages.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        let mut out = format!("{:<32} {:>6} {:>12} {:>12}\n", "stage", "count", "total", "mean");
        for (name, timing) in stages {
            out.push_str(&format!(
                "{:<32} {:>6} {:>12} {:>12}\n",
                name,
                timing.count,
                format!("{:.2?}", timing.total),
                format!("{:.2?}", timing.mean()),
            ));
        }
        out
    }
}

struct SpanStart(Instant);

/// `tracing` layer that measures each span from creation to close.
pub struct SpanTimingLayer {
    timings: SpanTimings,
}

impl<S> Layer<S> for SpanTimingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanStart(Instant::now()));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        let elapsed = span.extensions().get::<SpanStart>().map(|start| start.0.elapsed());
        if let Some(elapsed) = elapsed {
            self.timings.record(span.metadata().name(), elapsed);
        }
    }
}

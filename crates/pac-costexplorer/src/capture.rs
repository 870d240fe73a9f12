//! In-memory tracing capture for unit tests

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::span::{Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Debug, Default)]
struct Captured {
    events: Vec<(Level, String)>,
    /// (span name, field, value) in record order
    span_fields: Vec<(String, String, String)>,
}

/// Handle onto everything a [`Capture::subscriber`] has seen
#[derive(Clone, Default)]
pub(crate) struct Capture {
    inner: Arc<Mutex<Captured>>,
}

impl Capture {
    /// Subscriber feeding this capture
    pub(crate) fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry().with(CaptureLayer {
            inner: self.inner.clone(),
        })
    }

    /// Messages of the events logged at exactly `level`
    pub(crate) fn events_at(&self, level: Level) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Last value recorded into `field` of the span named `span`
    pub(crate) fn span_field(&self, span: &str, field: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .span_fields
            .iter()
            .rev()
            .find(|(s, f, _)| s == span && f == field)
            .map(|(_, _, value)| value.clone())
    }
}

struct CaptureLayer {
    inner: Arc<Mutex<Captured>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldsVisitor::default();
        event.record(&mut visitor);
        let message = visitor
            .fields
            .into_iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();
        self.inner
            .lock()
            .unwrap()
            .events
            .push((*event.metadata().level(), message));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldsVisitor::default();
        values.record(&mut visitor);
        let mut inner = self.inner.lock().unwrap();
        for (field, value) in visitor.fields {
            inner
                .span_fields
                .push((span.name().to_string(), field, value));
        }
    }
}

#[derive(Default)]
struct FieldsVisitor {
    fields: Vec<(String, String)>,
}

impl Visit for FieldsVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }
}

use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, Key, KeyName, Label, Level, Metadata, Recorder, SharedString, Unit,
};
use metrics_exporter_prometheus::PrometheusRecorder;

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// Name, label names and constant labels shared by every series of an instrument.
#[derive(Debug, Clone)]
struct Family<const N: usize> {
    name: &'static str,
    label_names: [&'static str; N],
    const_labels: Vec<Label>,
}

impl<const N: usize> Family<N> {
    fn key(&self, values: [&str; N]) -> Key {
        let labels: Vec<Label> = self
            .const_labels
            .iter()
            .cloned()
            .chain(
                self.label_names
                    .iter()
                    .zip(values)
                    .map(|(name, value)| Label::new(*name, value.to_owned())),
            )
            .collect();
        Key::from_parts(self.name, labels)
    }
}

/// Counter with a fixed set of label names.
pub struct CounterVec<const N: usize> {
    family: Family<N>,
    recorder: Arc<PrometheusRecorder>,
}

impl<const N: usize> CounterVec<N> {
    pub fn new(
        recorder: Arc<PrometheusRecorder>,
        name: &'static str,
        help: &'static str,
        label_names: [&'static str; N],
    ) -> Self {
        recorder.describe_counter(KeyName::from(name), None, SharedString::from(help));
        Self {
            family: Family {
                name,
                label_names,
                const_labels: Vec::new(),
            },
            recorder,
        }
    }

    /// Attach a label whose value is identical on every series.
    pub fn with_const_label(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.family
            .const_labels
            .push(Label::new(name, value.into()));
        self
    }

    pub fn with_label_values(&self, values: [&str; N]) -> Counter {
        self.recorder
            .register_counter(&self.family.key(values), &metadata())
    }
}

/// Histogram with a fixed set of label names, observed in seconds.
pub struct HistogramVec<const N: usize> {
    family: Family<N>,
    recorder: Arc<PrometheusRecorder>,
}

impl<const N: usize> HistogramVec<N> {
    pub fn new(
        recorder: Arc<PrometheusRecorder>,
        name: &'static str,
        help: &'static str,
        label_names: [&'static str; N],
    ) -> Self {
        recorder.describe_histogram(
            KeyName::from(name),
            Some(Unit::Seconds),
            SharedString::from(help),
        );
        Self {
            family: Family {
                name,
                label_names,
                const_labels: Vec::new(),
            },
            recorder,
        }
    }

    pub fn with_label_values(&self, values: [&str; N]) -> Histogram {
        self.recorder
            .register_histogram(&self.family.key(values), &metadata())
    }
}

/// Gauge with a fixed set of label names.
pub struct GaugeVec<const N: usize> {
    family: Family<N>,
    recorder: Arc<PrometheusRecorder>,
}

impl<const N: usize> GaugeVec<N> {
    pub fn new(
        recorder: Arc<PrometheusRecorder>,
        name: &'static str,
        help: &'static str,
        label_names: [&'static str; N],
    ) -> Self {
        recorder.describe_gauge(KeyName::from(name), None, SharedString::from(help));
        Self {
            family: Family {
                name,
                label_names,
                const_labels: Vec::new(),
            },
            recorder,
        }
    }

    pub fn with_label_values(&self, values: [&str; N]) -> Gauge {
        self.recorder
            .register_gauge(&self.family.key(values), &metadata())
    }
}

/// Register (or look up) a counter series for a name resolved at runtime.
pub(crate) fn register_counter(
    recorder: &PrometheusRecorder,
    name: &str,
    labels: Vec<Label>,
) -> Counter {
    let key = Key::from_parts(name.to_owned(), labels);
    recorder.register_counter(&key, &metadata())
}

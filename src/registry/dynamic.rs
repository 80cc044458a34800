use std::collections::HashMap;
use std::sync::Arc;

use metrics::{KeyName, Label, Recorder, SharedString};

use super::MetricsRegistry;
use super::http::is_reserved;
use super::vec::register_counter;
use crate::error::MetricsError;

impl MetricsRegistry {
    /// Increment the counter `name` by one, creating it on first use.
    ///
    /// The first call for a name fixes its label keys. Later calls must pass
    /// exactly the same keys, in any order.
    pub fn inc_counter(
        &self,
        name: &str,
        labels: &HashMap<String, String>,
    ) -> Result<(), MetricsError> {
        self.add_counter(name, labels, 1)
    }

    /// Same as [`inc_counter`](Self::inc_counter) with an arbitrary increment.
    pub fn add_counter(
        &self,
        name: &str,
        labels: &HashMap<String, String>,
        value: u64,
    ) -> Result<(), MetricsError> {
        if name.is_empty() {
            return Err(MetricsError::InvalidArgument("counter name is empty"));
        }
        if labels.is_empty() {
            return Err(MetricsError::InvalidArgument("counter labels are empty"));
        }
        if is_reserved(name) {
            return Err(MetricsError::ReservedName(name.to_owned()));
        }

        let keys = self.label_keys(name, labels);
        let projected = project(&keys, labels).ok_or_else(|| MetricsError::LabelMismatch {
            name: name.to_owned(),
            expected: keys.to_vec(),
        })?;

        register_counter(&self.inner.recorder, name, projected).increment(value);
        Ok(())
    }

    /// Label keys fixed for a dynamic counter, if it has been created.
    pub fn dynamic_label_keys(&self, name: &str) -> Option<Vec<String>> {
        self.inner.dynamic.get(name).map(|keys| keys.to_vec())
    }

    fn label_keys(&self, name: &str, labels: &HashMap<String, String>) -> Arc<[String]> {
        if let Some(keys) = self.inner.dynamic.get(name) {
            return Arc::clone(&keys);
        }

        // The entry holds the shard write lock, so only one caller creates a name.
        let entry = self.inner.dynamic.entry(name.to_owned()).or_insert_with(|| {
            let mut keys: Vec<String> = labels.keys().cloned().collect();
            keys.sort_unstable();

            self.inner.recorder.describe_counter(
                KeyName::from(name.to_owned()),
                None,
                SharedString::from(name.to_owned()),
            );
            tracing::debug!(name, keys = ?keys, "dynamic counter created");

            keys.into()
        });
        Arc::clone(&entry)
    }
}

/// Values of `labels` in the order of `keys`, or `None` unless the key sets match.
fn project(keys: &[String], labels: &HashMap<String, String>) -> Option<Vec<Label>> {
    if keys.len() != labels.len() {
        return None;
    }
    keys.iter()
        .map(|key| {
            labels
                .get(key)
                .map(|value| Label::new(key.clone(), value.clone()))
        })
        .collect()
}

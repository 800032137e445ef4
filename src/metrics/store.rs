use super::{CircularBuffer, MetricKind, Sample};
use std::collections::HashMap;

/// Stores recent samples for every registered metric stream.
///
/// The set of kinds is fixed when the store is built; appends for any other
/// kind are dropped.
#[derive(Debug, Clone)]
pub struct MetricStore {
    series: HashMap<MetricKind, CircularBuffer<Sample>>,
    /// Maximum number of data points kept per series
    history_len: usize,
}

impl MetricStore {
    pub fn new(kinds: impl IntoIterator<Item = MetricKind>, history_len: usize) -> Self {
        Self {
            series: kinds
                .into_iter()
                .map(|kind| (kind, CircularBuffer::new(history_len)))
                .collect(),
            history_len,
        }
    }

    /// Registers every [`MetricKind`].
    pub fn with_all_kinds(history_len: usize) -> Self {
        Self::new(MetricKind::ALL, history_len)
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn is_registered(&self, kind: MetricKind) -> bool {
        self.series.contains_key(&kind)
    }

    pub fn append(&mut self, kind: MetricKind, sample: Sample) {
        if let Some(buffer) = self.series.get_mut(&kind) {
            buffer.push(sample);
        }
    }

    /// Chronological view of a series as `(older, newer)` slices. Both are
    /// empty when nothing was recorded yet or the kind is unregistered.
    pub fn series(&self, kind: MetricKind) -> (&[Sample], &[Sample]) {
        self.series
            .get(&kind)
            .map(|buffer| buffer.as_slices())
            .unwrap_or((&[][..], &[][..]))
    }

    pub fn iter(&self, kind: MetricKind) -> impl Iterator<Item = &Sample> {
        let (older, newer) = self.series(kind);
        older.iter().chain(newer)
    }

    pub fn to_vec(&self, kind: MetricKind) -> Vec<Sample> {
        self.iter(kind).copied().collect()
    }

    pub fn len(&self, kind: MetricKind) -> usize {
        self.series.get(&kind).map_or(0, CircularBuffer::len)
    }

    pub fn last(&self, kind: MetricKind) -> Option<Sample> {
        self.series.get(&kind).and_then(|buffer| buffer.last().copied())
    }

    /// Largest value currently held for `kind`.
    pub fn peak(&self, kind: MetricKind) -> Option<f64> {
        self.iter(kind).map(|sample| sample.value).reduce(f64::max)
    }

    pub fn kinds(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.series.keys().copied()
    }
}

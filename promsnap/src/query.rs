#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::collections::{BTreeMap, HashSet};

use crate::parser::{MetricFamily, MetricSample};

/// Group key for samples that do not carry the label at all.
pub const UNLABELED: &str = "_unknown_";

/// Samples whose labels carry every `(key, value)` pair in `filter`.
/// A missing key excludes the sample.
pub fn filter_samples_by_labels<'f, 'a>(
    family: &'f MetricFamily<'a>,
    filter: &[(&str, &str)],
) -> Vec<&'f MetricSample<'a>> {
    family
        .samples
        .iter()
        .filter(|sample| {
            filter
                .iter()
                .all(|&(key, value)| sample.labels.get(key).map(|v| v.as_ref()) == Some(value))
        })
        .collect()
}

/// Buckets the family's samples by their value of the label `key`; samples
/// missing the label land under [`UNLABELED`].
pub fn group_samples_by_label<'f, 'a>(
    family: &'f MetricFamily<'a>,
    key: &str,
) -> BTreeMap<String, Vec<&'f MetricSample<'a>>> {
    let mut groups: BTreeMap<String, Vec<&MetricSample>> = BTreeMap::new();

    for sample in &family.samples {
        let value = sample.labels.get(key).map_or(UNLABELED, |v| v.as_ref());
        groups.entry(value.to_string()).or_default().push(sample);
    }

    groups
}

/// Sums sample values, optionally restricted to samples whose original name
/// ends with `suffix`.  Non-finite values contribute nothing.
pub fn sum_metric_values(family: &MetricFamily<'_>, suffix: Option<&str>) -> f64 {
    family
        .samples
        .iter()
        .filter(|sample| suffix.map_or(true, |suffix| sample.name.ends_with(suffix)))
        .map(|sample| {
            if sample.value.is_finite() {
                sample.value
            } else {
                0.
            }
        })
        .sum()
}

/// Value of the bare, label-free sample named exactly like the family, or
/// `0` when no such sample exists.
pub fn gauge_value(family: &MetricFamily<'_>) -> f64 {
    family
        .samples
        .iter()
        .find(|sample| sample.name == family.name && sample.labels.is_empty())
        .map_or(0., |sample| sample.value)
}

/// Distinct non-empty values of the label `key` across the family's samples.
pub fn unique_label_values<'f>(family: &'f MetricFamily<'_>, key: &str) -> HashSet<&'f str> {
    family
        .samples
        .iter()
        .filter_map(|sample| sample.labels.get(key))
        .map(|value| value.as_ref())
        .filter(|value| !value.is_empty())
        .collect()
}

#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_derive::Serialize;

use crate::lexer::MetricKind;
use crate::parser::MetricFamily;
use crate::SnapError;

/// One cumulative bucket: `count` includes every observation at or below
/// the `le` boundary.
#[derive(Clone, Debug, Serialize)]
pub struct HistogramBucket<'a> {
    /// Literal boundary text, a finite decimal or `"+Inf"`.
    pub le: Cow<'a, str>,
    pub count: f64,
}

impl HistogramBucket<'_> {
    /// Numeric upper boundary; `"+Inf"` sorts above every finite bucket, as
    /// does a boundary we cannot read at all.
    fn bound(&self) -> f64 {
        match self.le.as_ref() {
            "+Inf" => f64::INFINITY,
            le => le.parse().unwrap_or(f64::INFINITY),
        }
    }
}

/// A histogram family's bucket/sum/count triplet for one label set, with
/// the percentiles derived from it.  Never stored on the family itself.
#[derive(Debug, Serialize)]
pub struct HistogramMetric<'a> {
    /// The group's label set, boundary label excluded.
    pub labels: BTreeMap<&'a str, Cow<'a, str>>,
    /// Ascending by boundary.
    pub buckets: Vec<HistogramBucket<'a>>,
    pub sum: f64,
    pub count: f64,
    pub p50: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

/// Splits a histogram family into per-label-set groups and derives
/// p50/p90/p95/p99 for every group that observed anything.
///
/// Handing over a family not declared `histogram` is a caller error.
#[tracing::instrument(skip(family), fields(family = family.name))]
pub fn analyze<'a>(family: &MetricFamily<'a>) -> Result<Vec<HistogramMetric<'a>>, SnapError> {
    if family.kind != MetricKind::Histogram {
        return Err(SnapError::NotAHistogram {
            family: family.name.to_string(),
            kind: family.kind,
        });
    }

    let mut groups: BTreeMap<BTreeMap<&str, Cow<str>>, HistogramMetric> = BTreeMap::new();

    for sample in &family.samples {
        let mut labels = sample.labels.clone();
        labels.remove("le");

        let group = groups
            .entry(labels.clone())
            .or_insert_with(|| HistogramMetric {
                labels,
                buckets: vec![],
                sum: 0.,
                count: 0.,
                p50: None,
                p90: None,
                p95: None,
                p99: None,
            });

        if sample.name.ends_with("_bucket") {
            // A bucket sample without a boundary label has no place on the
            // cumulative axis; it is dropped rather than guessed at.
            if let Some(le) = sample.labels.get("le") {
                group.buckets.push(HistogramBucket {
                    le: le.clone(),
                    count: sample.value,
                });
            }
        } else if sample.name.ends_with("_sum") {
            group.sum = sample.value;
        } else if sample.name.ends_with("_count") {
            group.count = sample.value;
        }
    }

    let mut metrics: Vec<HistogramMetric> = groups.into_values().collect();

    for metric in &mut metrics {
        metric
            .buckets
            .sort_by(|a, b| a.bound().total_cmp(&b.bound()));

        if metric.count > 0. && !metric.buckets.is_empty() {
            metric.p50 = percentile(&metric.buckets, metric.count, 50.);
            metric.p90 = percentile(&metric.buckets, metric.count, 90.);
            metric.p95 = percentile(&metric.buckets, metric.count, 95.);
            metric.p99 = percentile(&metric.buckets, metric.count, 99.);
        }
    }

    Ok(metrics)
}

/// Estimates the `p`th percentile from cumulative buckets, sorted ascending,
/// by linear interpolation between the boundaries bracketing the target.
fn percentile(buckets: &[HistogramBucket], count: f64, p: f64) -> Option<f64> {
    let target = count * p / 100.;

    let mut prev_count = 0.;
    let mut prev_bound = 0.;
    for bucket in buckets {
        let bound = bucket.bound();
        if bucket.count >= target {
            // No mass between the two boundaries; the current one is exact.
            if bucket.count == prev_count {
                return Some(bound);
            }

            let fraction = (target - prev_count) / (bucket.count - prev_count);
            return Some(prev_bound + fraction * (bound - prev_bound));
        }
        prev_count = bucket.count;
        prev_bound = bound;
    }

    // The cumulative counts never reach the target (malformed input); report
    // the largest finite boundary we saw, if there is one.
    buckets
        .iter()
        .rev()
        .map(HistogramBucket::bound)
        .find(|bound| bound.is_finite())
}

use std::fmt;

use serde_derive::Serialize;

/// Warning/critical cut-offs for one metric category.
///
/// `inverse` flips the comparison direction for metrics where *lower*
/// values are worse, such as an active-worker count.
#[derive(Clone, Debug, Serialize)]
pub struct MetricThreshold {
    pub warning: f64,
    pub critical: f64,
    /// Display unit, passed through to presentation code untouched.
    pub unit: String,
    pub inverse: bool,
}

/// Three-valued classification of a scalar against a [`MetricThreshold`].
/// Ordered from best to worst, so `max` folds to the worst level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// The worst of the given levels; `Healthy` when there are none.
    pub fn worst(levels: impl IntoIterator<Item = HealthLevel>) -> HealthLevel {
        levels.into_iter().max().unwrap_or(HealthLevel::Healthy)
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `value` against `threshold`.  Boundary values resolve toward
/// the worse level.
pub fn health_level(value: f64, threshold: &MetricThreshold) -> HealthLevel {
    if threshold.inverse {
        if value <= threshold.critical {
            HealthLevel::Critical
        } else if value <= threshold.warning {
            HealthLevel::Warning
        } else {
            HealthLevel::Healthy
        }
    } else if value >= threshold.critical {
        HealthLevel::Critical
    } else if value >= threshold.warning {
        HealthLevel::Warning
    } else {
        HealthLevel::Healthy
    }
}

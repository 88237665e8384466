//! `promsnap` turns an exposition-format text blob into a typed, queryable
//! snapshot of metric families, with histogram percentiles, aggregation
//! queries, health classification, and display formatting layered on top.
//!
//! Parsing is maximally tolerant: a malformed line becomes a diagnostic on
//! the snapshot, never a reason to abort.

#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use chrono::Utc;

/// Classifies single lines of an exposition document
pub mod lexer;

/// Folds classified lines into a [`ParsedMetrics`](crate::parser::ParsedMetrics) snapshot.
pub mod parser;

/// Derives per-label-set percentiles from histogram families.
pub mod histogram;

/// Stateless aggregation queries over a parsed snapshot.
pub mod query;

/// Threshold tables and the three-level health classification.
pub mod health;

/// Human-facing number/byte/duration/time formatting.
pub mod format;

#[cfg(test)]
mod test;

/// Indicates that a caller broke a contract.  Parsing itself never fails.
#[derive(thiserror::Error, Debug)]
pub enum SnapError {
    #[error("family «{family}» is declared {kind}, not histogram")]
    NotAHistogram {
        family: String,
        kind: lexer::MetricKind,
    },
}

/// Parses an exposition document into a snapshot stamped with the current
/// time.  See [`parser::parse_at`] to supply the timestamp yourself.
pub fn parse(data: &str) -> parser::ParsedMetrics<'_> {
    parser::parse_at(data, Utc::now())
}

#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_derive::Serialize;

use crate::lexer::{self, LineToken, MetricKind};

// Sample-name suffixes that fold into a composite family's base name.
// `_total` is deliberately absent: counters are declared by their HELP/TYPE
// lines under the full `_total` name, so stripping it would split every
// counter into a phantom second family.
const COMPOSITE_SUFFIXES: &[&str] = &["_bucket", "_sum", "_count"];

// How much of an unrecognized line survives into its diagnostic.
const DIAGNOSTIC_LEN: usize = 100;

lazy_static! {
    // Pattern used to check for escape characters
    static ref UNESCAPE_RE: Regex = Regex::new(r#"(\\[n"\\])"#).unwrap();
}

/// One sample line.  The original, non-stripped name is preserved so
/// downstream grouping can tell bucket/sum/count roles apart.
#[derive(Clone, Debug, Serialize)]
pub struct MetricSample<'a> {
    pub name: &'a str,
    pub labels: BTreeMap<&'a str, Cow<'a, str>>,
    #[serde(serialize_with = "crate::lexer::serialize_value")]
    pub value: f64,
    pub timestamp: Option<i64>,
}

/// A MetricFamily is a collection of related (and similarly named) samples,
/// keyed by their shared base name.
///
/// The family is created lazily by the first HELP/TYPE/sample line that
/// references the base name; `help` and `kind` start at their defaults and a
/// later descriptor line may overwrite them, samples already collected or not.
#[derive(Debug, Serialize)]
pub struct MetricFamily<'a> {
    pub name: &'a str,
    pub help: Cow<'a, str>,
    pub kind: MetricKind,
    pub samples: Vec<MetricSample<'a>>,
}

/// The result of one parse call.  Rebuilt from scratch every time; nothing
/// survives between calls.
#[derive(Debug, Serialize)]
pub struct ParsedMetrics<'a> {
    pub families: HashMap<&'a str, MetricFamily<'a>>,
    /// Snapshot creation time, RFC 3339 with millisecond precision.
    pub timestamp: String,
    /// One truncated diagnostic per unrecognized line, in text order.
    pub parse_errors: Vec<String>,
}

#[derive(Default)]
struct Accumulator<'a> {
    families: HashMap<&'a str, MetricFamily<'a>>,
    parse_errors: Vec<String>,
}

impl<'a> Accumulator<'a> {
    fn family(&mut self, name: &'a str) -> &mut MetricFamily<'a> {
        self.families.entry(name).or_insert_with(|| MetricFamily {
            name,
            help: Cow::Borrowed(""),
            kind: MetricKind::Unknown,
            samples: vec![],
        })
    }

    fn help(&mut self, name: &'a str, help: &'a str) {
        self.family(name).help = unescape_string(help);
    }

    fn kind(&mut self, name: &'a str, kind: MetricKind) {
        self.family(name).kind = kind;
    }

    fn sample(&mut self, token: lexer::SampleToken<'a>) {
        let labels = token
            .labels
            .into_iter()
            .map(|label| {
                let value = label.value.map_or(Cow::Borrowed(""), unescape_string);
                (label.name, value)
            })
            .collect();

        let sample = MetricSample {
            name: token.name,
            labels,
            value: token.value,
            timestamp: token.timestamp,
        };

        self.family(base_name(token.name)).samples.push(sample);
    }

    fn unknown(&mut self, line: &str) {
        let truncated: String = line.chars().take(DIAGNOSTIC_LEN).collect();
        debug!(line = truncated.as_str(), "unrecognized line");
        self.parse_errors
            .push(format!("unrecognized line: «{}»", truncated));
    }
}

/// Strips a recognized composite suffix off a sample name.
///
/// Known ambiguity: a metric whose own declared name ends in one of these
/// suffixes (say, a gauge literally called `my_count`) is misfiled under the
/// stripped base name.  The text format cannot distinguish the two cases.
pub fn base_name(name: &str) -> &str {
    for suffix in COMPOSITE_SUFFIXES {
        if let Some(base) = name.strip_suffix(suffix) {
            if !base.is_empty() {
                return base;
            }
        }
    }

    name
}

/// Folds an exposition document into a [`ParsedMetrics`] snapshot stamped
/// with the supplied time.  Malformed lines are recorded, never fatal.
#[tracing::instrument(skip_all)]
pub fn parse_at(data: &str, timestamp: DateTime<Utc>) -> ParsedMetrics<'_> {
    let accumulated = lexer::exposition(data).fold(Accumulator::default(), |mut acc, token| {
        match token {
            LineToken::Help { name, help } => acc.help(name, help),
            LineToken::Type { name, kind } => acc.kind(name, kind),
            LineToken::Sample(sample) => acc.sample(sample),
            LineToken::Empty => {}
            LineToken::Unknown(line) => acc.unknown(line),
        }
        acc
    });

    ParsedMetrics {
        families: accumulated.families,
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        parse_errors: accumulated.parse_errors,
    }
}

fn unescape_string(input: &str) -> Cow<'_, str> {
    UNESCAPE_RE.replace_all(input, |caps: &Captures| {
        match caps.get(0).unwrap().as_str() {
            r"\n" => "\n".to_string(),
            r#"\""# => r#"""#.to_string(),
            r"\\" => r"\".to_string(),
            c => c.to_string(),
        }
    })
}

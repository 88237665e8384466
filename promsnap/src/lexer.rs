#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::space1,
    combinator::{eof, map, opt, rest},
    multi::separated_list0,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use serde::Serializer;
use serde_derive::Serialize;

mod types;
use types::*;

/// One `name="value"` pair inside a sample's brace group.  An empty quoted
/// value comes back as `None`; unescaping happens downstream.
#[derive(Clone, Debug, Serialize)]
pub struct Label<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

/// The extracted fields of a sample line, still borrowed from the input.
#[derive(Clone, Debug, Serialize)]
pub struct SampleToken<'a> {
    pub name: &'a str,
    pub labels: Vec<Label<'a>>,
    #[serde(serialize_with = "crate::lexer::serialize_value")]
    pub value: f64,
    pub timestamp: Option<i64>,
}

/// Classification of a single line of exposition text.
#[derive(Clone, Debug, Serialize)]
pub enum LineToken<'a> {
    Help { name: &'a str, help: &'a str },
    Type { name: &'a str, kind: MetricKind },
    Sample(SampleToken<'a>),
    Empty,
    Unknown(&'a str),
}

/// Declared type of a [`MetricFamily`](crate::parser::MetricFamily).
/// The default is `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Counters measure discrete, monotonically increasing events.
    Counter,
    /// Gauges are current measurements, such as bytes of memory in use.
    Gauge,
    /// Histograms measure distributions via cumulative buckets.
    Histogram,
    /// Summaries carry precomputed quantiles; passed through, not interpreted.
    Summary,
    /// Everything else, including `untyped` and type words we do not know.
    Unknown,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MetricKind {
    /// A TYPE line is never rejected over its type word; anything we do not
    /// recognize widens to `Unknown`.
    fn from(s: &str) -> Self {
        match s {
            "counter" => Self::Counter,
            "gauge" => Self::Gauge,
            "histogram" => Self::Histogram,
            "summary" => Self::Summary,
            _ => Self::Unknown,
        }
    }
}

impl FromStr for MetricKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl<'a> Label<'a> {
    /// ```abnf
    /// label = label-name "=" DQUOTE escaped-string DQUOTE
    /// ```
    fn nom(input: &'a str) -> IResult<&str, Self> {
        map(
            tuple((
                label_name1,
                tag("="),
                delimited(tag(r#"""#), opt(escaped_string1), tag(r#"""#)),
            )),
            |(name, _, value)| Self { name, value },
        )(input)
    }
}

impl<'a> SampleToken<'a> {
    /// ```abnf
    /// sample = metricname [labels] SP number [SP timestamp]
    /// labels = "{" [label *("," label)] "}"
    /// ```
    fn nom(input: &'a str) -> IResult<&str, Self> {
        let (input, name) = metric_name1(input)?;
        let (input, labels) = map(
            opt(delimited(
                tag("{"),
                separated_list0(tag(","), Label::nom),
                tag("}"),
            )),
            Option::unwrap_or_default,
        )(input)?;
        let (input, value) = preceded(space1, floatlike)(input)?;
        let (input, timestamp) = opt(preceded(space1, nom::character::complete::i64))(input)?;
        let (input, _) = eof(input)?;

        Ok((
            input,
            Self {
                name,
                labels,
                value,
                timestamp,
            },
        ))
    }
}

/// ```abnf
/// help-line = "HELP" SP metricname [SP *CHAR]
/// ```
fn help_line(input: &str) -> IResult<&str, LineToken> {
    map(
        terminated(
            tuple((
                tag("HELP"),
                space1,
                metric_name1,
                opt(preceded(space1, rest)),
            )),
            eof,
        ),
        |(_, _, name, help)| LineToken::Help {
            name,
            help: help.unwrap_or(""),
        },
    )(input)
}

/// ```abnf
/// type-line = "TYPE" SP metricname SP type-word
/// ```
fn type_line(input: &str) -> IResult<&str, LineToken> {
    map(
        terminated(
            tuple((
                tag("TYPE"),
                space1,
                metric_name1,
                space1,
                take_while1(|c: char| !c.is_whitespace()),
            )),
            eof,
        ),
        |(_, _, name, _, word)| LineToken::Type {
            name,
            kind: MetricKind::from(word),
        },
    )(input)
}

fn comment(input: &str) -> IResult<&str, LineToken> {
    preceded(tuple((tag("#"), space1)), alt((help_line, type_line)))(input)
}

/// Classifies one line of text.  Total: blank lines and `##` comments are
/// `Empty`, and anything that matches no recognized form is `Unknown`; the
/// caller decides whether that deserves a diagnostic.
#[tracing::instrument]
pub fn line(input: &str) -> LineToken<'_> {
    let line = input.trim();
    if line.is_empty() || line.starts_with("##") {
        return LineToken::Empty;
    }

    match alt((comment, map(SampleToken::nom, LineToken::Sample)))(line) {
        Ok((_, token)) => token,
        Err(e) => {
            trace!(line, %e);
            LineToken::Unknown(line)
        }
    }
}

/// Tokenizes a whole document, one [`LineToken`] per line.
pub fn exposition(input: &str) -> impl Iterator<Item = LineToken<'_>> {
    input.lines().map(line)
}

/// Non-finite sample values survive a round trip through JSON as the
/// literals the text format itself uses.
pub(crate) fn serialize_value<S>(value: &f64, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        s.serialize_str("NaN")
    } else if value.is_infinite() && value.is_sign_positive() {
        s.serialize_str("+Inf")
    } else if value.is_infinite() {
        s.serialize_str("-Inf")
    } else {
        s.serialize_f64(*value)
    }
}

#[allow(unused)]
use tracing::{debug, error, info, span, trace, warn, Instrument, Level};

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, tag_no_case, take_while},
    character::complete::{one_of, satisfy},
    combinator::{opt, peek, value},
    sequence::preceded,
    IResult,
};

/// ```abnf
/// ; Any unicode character, except newline, double quote, and backslash
/// normal-char = %x00-09 / %x0B-21 / %x23-5B / %x5D-D7FF / %xE000-10FFFF
/// ```
fn is_normal_char(c: char) -> bool {
    let codepoint = c as u32;
    !(codepoint == 0x0A
        || codepoint == 0x22
        || codepoint == 0x5C
        || (codepoint > 0xD7FF && codepoint < 0xE000))
}

/// Recognize a single "normal char"
pub(super) fn normal_char(input: &str) -> IResult<&str, char> {
    satisfy(is_normal_char)(input)
}

/// Recognize a sequence of one or more "normal char"
pub(super) fn normal_char1(input: &str) -> IResult<&str, &str> {
    nom::InputTakeAtPosition::split_at_position1_complete(
        &input,
        |item| !is_normal_char(item),
        nom::error::ErrorKind::AlphaNumeric,
    )
}

/// ```abnf
/// escaped-string = *escaped-char
///
/// escaped-char = normal-char
/// escaped-char =/ BS ("n" / DQUOTE / BS)
/// escaped-char =/ BS normal-char
/// ```
pub(super) fn escaped_string1(input: &str) -> IResult<&str, &str> {
    escaped(normal_char1, '\\', alt((one_of(r#""\"#), normal_char)))(input)
}

/// ```abnf
/// metricname = metricname-initial-char 0*metricname-char
///
/// metricname-char = metricname-initial-char / DIGIT
/// metricname-initial-char = ALPHA / "_" / ":"
/// ```
pub(super) fn metric_name1(input: &str) -> IResult<&str, &str> {
    peek(satisfy(|c| c.is_alphabetic() || c == '_' || c == ':'))(input)?;

    take_while(|item: char| item.is_alphanumeric() || item == '_' || item == ':')(input)
}

/// ```abnf
/// label-name = label-name-initial-char *label-name-char
///
/// label-name-char = label-name-initial-char / DIGIT
/// label-name-initial-char = ALPHA / "_"
/// ```
pub(super) fn label_name1(input: &str) -> IResult<&str, &str> {
    peek(satisfy(|c| c.is_alphabetic() || c == '_'))(input)?;

    take_while(|item: char| item.is_alphanumeric() || item == '_')(input)
}

/// Decodes a sample value: the `+Inf`/`Inf`/`-Inf`/`NaN` literals first,
/// then decimal and scientific notation.
pub(super) fn floatlike(input: &str) -> IResult<&str, f64> {
    alt((
        value(f64::NAN, tag_no_case("NaN")),
        value(f64::NEG_INFINITY, preceded(tag("-"), tag_no_case("Inf"))),
        value(f64::INFINITY, preceded(opt(tag("+")), tag_no_case("Inf"))),
        nom::number::complete::double,
    ))(input)
}

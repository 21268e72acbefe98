//! Pressure stall information (`memory.pressure`, `io.pressure`, `/proc/pressure/*`).
//!
//! Three on-disk shapes are accepted and told apart by their content:
//!
//! Upstream format (v4.20+):
//!
//! ```text
//! some avg10=0.22 avg60=0.17 avg300=1.11 total=58761459
//! full avg10=0.22 avg60=0.16 avg300=1.08 total=58464525
//! ```
//!
//! Labeled experimental format, with an `aggr` header:
//!
//! ```text
//! aggr 316016073
//! some 0.00 0.03 0.05
//! full 0.00 0.03 0.05
//! ```
//!
//! Bare experimental format: the last three lines hold the 10s, 60s and 300s averages,
//! anything before them is debug output. It has a single severity, so a `full` request is
//! answered with the same values as `some`.

use std::io::BufRead;

use super::StatParseError;

/// Which stall severity to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureType {
    /// At least one task stalled.
    Some,
    /// All non-idle tasks stalled.
    Full,
}

impl PressureType {
    fn label(self) -> &'static str {
        match self {
            PressureType::Some => "some",
            PressureType::Full => "full",
        }
    }
}

/// Stall ratios averaged over 10, 60 and 300 seconds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct PressureMetric {
    pub sec_10: f32,
    pub sec_60: f32,
    pub sec_300: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PsiFormat {
    Upstream,
    Labeled,
    Bare,
}

fn detect_format(lines: &[(usize, &str)]) -> PsiFormat {
    let labeled = lines.iter().find(|(_, line)| {
        matches!(line.split_whitespace().next(), Some("some" | "full"))
    });
    match labeled {
        Some((_, line)) if line.contains('=') => PsiFormat::Upstream,
        Some(_) => PsiFormat::Labeled,
        None => PsiFormat::Bare,
    }
}

/// Parses one average. `NaN` and infinities parse as floats but are not valid ratios.
fn parse_float(key: &str, value: &str, lineno: usize) -> Result<f32, StatParseError> {
    let parsed = value
        .parse::<f32>()
        .map_err(|source| StatParseError::InvalidFloat {
            key: key.to_string(),
            value: value.to_string(),
            line: lineno,
            source,
        })?;
    if !parsed.is_finite() {
        return Err(StatParseError::NonFiniteFloat {
            key: key.to_string(),
            value: value.to_string(),
            line: lineno,
        });
    }
    Ok(parsed)
}

/// Parses a pressure file and returns the averages for `pressure_type`.
///
/// # Errors
///
/// - [`StatParseError::InvalidFloat`] if an average is not a number.
/// - [`StatParseError::NonFiniteFloat`] if an average is `NaN` or infinite.
/// - [`StatParseError::MissingField`] if the requested line or an average is missing.
/// - [`StatParseError::InvalidFormat`] for an empty file or a line of the wrong shape.
pub fn parse_pressure<R: BufRead>(
    buf: &mut R,
    pressure_type: PressureType,
) -> Result<PressureMetric, StatParseError> {
    let mut content = String::new();
    buf.read_to_string(&mut content)?;
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(StatParseError::invalid_format(1, ""));
    }

    match detect_format(&lines) {
        PsiFormat::Upstream => parse_upstream(&lines, pressure_type),
        PsiFormat::Labeled => parse_labeled(&lines, pressure_type),
        PsiFormat::Bare => {
            if pressure_type == PressureType::Full {
                log::trace!("bare experimental pressure format has no `full` line, using `some`");
            }
            parse_bare(&lines)
        }
    }
}

fn find_line<'a>(
    lines: &[(usize, &'a str)],
    pressure_type: PressureType,
) -> Result<(usize, std::str::SplitWhitespace<'a>), StatParseError> {
    let label = pressure_type.label();
    lines
        .iter()
        .find_map(|&(lineno, line)| {
            let mut tokens = line.split_whitespace();
            (tokens.next() == Some(label)).then_some((lineno, tokens))
        })
        .ok_or(StatParseError::MissingField { field: label })
}

fn parse_upstream(
    lines: &[(usize, &str)],
    pressure_type: PressureType,
) -> Result<PressureMetric, StatParseError> {
    let (lineno, tokens) = find_line(lines, pressure_type)?;
    let (mut sec_10, mut sec_60, mut sec_300) = (None, None, None);

    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return Err(StatParseError::invalid_format(lineno, lines_content(lines, lineno)));
        };
        match key {
            "avg10" => sec_10 = Some(parse_float(key, value, lineno)?),
            "avg60" => sec_60 = Some(parse_float(key, value, lineno)?),
            "avg300" => sec_300 = Some(parse_float(key, value, lineno)?),
            _ => {}
        }
    }

    Ok(PressureMetric {
        sec_10: sec_10.ok_or(StatParseError::MissingField { field: "avg10" })?,
        sec_60: sec_60.ok_or(StatParseError::MissingField { field: "avg60" })?,
        sec_300: sec_300.ok_or(StatParseError::MissingField { field: "avg300" })?,
    })
}

fn lines_content<'a>(lines: &[(usize, &'a str)], lineno: usize) -> &'a str {
    lines
        .iter()
        .find(|(n, _)| *n == lineno)
        .map(|(_, line)| *line)
        .unwrap_or_default()
}

fn parse_labeled(
    lines: &[(usize, &str)],
    pressure_type: PressureType,
) -> Result<PressureMetric, StatParseError> {
    let (lineno, tokens) = find_line(lines, pressure_type)?;
    let values: Vec<&str> = tokens.collect();
    let [sec_10, sec_60, sec_300] = values.as_slice() else {
        return Err(StatParseError::invalid_format(lineno, lines_content(lines, lineno)));
    };

    Ok(PressureMetric {
        sec_10: parse_float("avg10", sec_10, lineno)?,
        sec_60: parse_float("avg60", sec_60, lineno)?,
        sec_300: parse_float("avg300", sec_300, lineno)?,
    })
}

fn parse_bare(lines: &[(usize, &str)]) -> Result<PressureMetric, StatParseError> {
    let start = lines.len().saturating_sub(3);
    for (lineno, line) in &lines[..start] {
        log::trace!("skipping pressure debug line {lineno}: {line}");
    }

    match &lines[start..] {
        [(l10, v10), (l60, v60), (l300, v300)] => Ok(PressureMetric {
            sec_10: parse_float("avg10", v10, *l10)?,
            sec_60: parse_float("avg60", v60, *l60)?,
            sec_300: parse_float("avg300", v300, *l300)?,
        }),
        [.., (lineno, line)] => Err(StatParseError::invalid_format(*lineno, line)),
        [] => Err(StatParseError::invalid_format(1, "")),
    }
}

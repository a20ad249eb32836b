//! Prometheus exposition format parser.
//!
//! Parses the line-oriented text format that instrumented applications expose:
//! each line is a comment starting with `#`, blank, or
//! `<name>[{<labels>}] <value>`. The parser preserves input order and does not
//! deduplicate repeated metric names; selection policy belongs to the caller.

use crate::error::{Error, Result};

/// A single parsed sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Metric name as it appeared in the text
    pub name: String,
    /// Label pairs in source order, empty when the line carried no label set
    pub labels: Vec<(String, String)>,
    /// Sample value
    pub value: f64,
}

/// Parse an exposition-format text blob into samples.
///
/// Comment and blank lines are skipped. Any other line that does not match
/// `name[{labels}] value` fails the whole parse with [`Error::Parse`].
pub fn parse_text(text: &str) -> Result<Vec<RawSample>> {
    let mut samples = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        samples.push(parse_sample_line(line, idx + 1)?);
    }

    Ok(samples)
}

fn parse_sample_line(line: &str, line_no: usize) -> Result<RawSample> {
    let (name_part, rest) = split_name(line, line_no)?;

    if !is_valid_metric_name(name_part) {
        return Err(Error::Parse(format!(
            "line {line_no}: invalid metric name '{name_part}'"
        )));
    }

    let (labels, value_part) = if rest.starts_with('{') {
        let close = find_labels_end(rest).ok_or_else(|| {
            Error::Parse(format!("line {line_no}: unterminated label set"))
        })?;
        let labels = parse_labels(&rest[1..close], line_no)?;
        (labels, rest[close + 1..].trim())
    } else {
        (Vec::new(), rest.trim())
    };

    let value: f64 = value_part.parse().map_err(|_| {
        Error::Parse(format!(
            "line {line_no}: invalid sample value '{value_part}'"
        ))
    })?;

    Ok(RawSample {
        name: name_part.to_string(),
        labels,
        value,
    })
}

/// Split a sample line into the metric name and the remainder
/// (label set and/or value segment).
fn split_name(line: &str, line_no: usize) -> Result<(&str, &str)> {
    let end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .ok_or_else(|| {
            Error::Parse(format!("line {line_no}: missing sample value"))
        })?;
    Ok((&line[..end], line[end..].trim_start()))
}

/// Locate the `}` closing a label set, ignoring braces inside quoted label
/// values and honoring backslash escapes.
fn find_labels_end(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Parse the inside of a `{...}` label set: `key="value"` pairs separated by
/// commas, with `\\`, `\"` and `\n` escapes in values.
fn parse_labels(body: &str, line_no: usize) -> Result<Vec<(String, String)>> {
    let mut labels = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        // Skip separators and surrounding whitespace.
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' {
                break;
            }
            key.push(c);
            chars.next();
        }
        let key = key.trim().to_string();
        if key.is_empty() || chars.next() != Some('=') {
            return Err(Error::Parse(format!(
                "line {line_no}: malformed label pair"
            )));
        }
        if chars.next() != Some('"') {
            return Err(Error::Parse(format!(
                "line {line_no}: label value must be quoted"
            )));
        }

        let mut value = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => match chars.next() {
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('n') => value.push('\n'),
                    _ => {
                        return Err(Error::Parse(format!(
                            "line {line_no}: invalid escape in label value"
                        )))
                    }
                },
                c => value.push(c),
            }
        }
        if !closed {
            return Err(Error::Parse(format!(
                "line {line_no}: unterminated label value"
            )));
        }

        labels.push((key, value));
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_samples() {
        let text = "process_cpu_usage 42.5\nprocess_resident_memory_bytes 1048576\n";
        let samples = parse_text(text).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "process_cpu_usage");
        assert_eq!(samples[0].value, 42.5);
        assert!(samples[0].labels.is_empty());
        assert_eq!(samples[1].value, 1048576.0);
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let text = "# HELP process_cpu_usage CPU usage\n\n# TYPE process_cpu_usage gauge\nprocess_cpu_usage 10\n";
        let samples = parse_text(text).unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 10.0);
    }

    #[test]
    fn test_labeled_sample() {
        let samples =
            parse_text(r#"http_requests_total{method="GET",status="200"} 1027"#).unwrap();

        assert_eq!(samples[0].name, "http_requests_total");
        assert_eq!(
            samples[0].labels,
            vec![
                ("method".to_string(), "GET".to_string()),
                ("status".to_string(), "200".to_string()),
            ]
        );
        assert_eq!(samples[0].value, 1027.0);
    }

    #[test]
    fn test_escaped_label_value() {
        let samples = parse_text(r#"m{path="C:\\temp\"x\""} 1"#).unwrap();
        assert_eq!(samples[0].labels[0].1, "C:\\temp\"x\"");
    }

    #[test]
    fn test_brace_inside_label_value() {
        let samples = parse_text(r#"m{a="}"} 1"#).unwrap();
        assert_eq!(samples[0].labels, vec![("a".to_string(), "}".to_string())]);
        assert_eq!(samples[0].value, 1.0);
    }

    #[test]
    fn test_escaped_quote_then_brace_in_label_value() {
        let samples = parse_text(r#"m{p="\"}x"} 2"#).unwrap();
        assert_eq!(samples[0].labels[0].1, "\"}x");
        assert_eq!(samples[0].value, 2.0);
    }

    #[test]
    fn test_malformed_line_fails() {
        let err = parse_text("foo bar baz qux").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let err = parse_text("process_cpu_usage high").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_bare_name_fails() {
        let err = parse_text("process_cpu_usage").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unterminated_labels_fail() {
        let err = parse_text(r#"m{a="1" 5"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_duplicates_preserved_in_order() {
        let samples = parse_text("m 1\nm 2\nm 3\n").unwrap();
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_special_float_values() {
        let samples = parse_text("up 1\nrss +Inf\nskew NaN\n").unwrap();
        assert!(samples[1].value.is_infinite());
        assert!(samples[2].value.is_nan());
    }
}

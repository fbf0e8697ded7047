use regex::Regex;
use serde::Serialize;

use crate::config::ParseMode;
use crate::error::ExtractError;

/// Pattern for numeric tokens: digits, optionally a decimal point and more
/// digits. "42." is a valid (float) token.
const NUMBER_PATTERN: &str = r"[0-9]+\.?[0-9]*";

/// A number read from OCR text. Float iff the token contains a decimal point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Converts a matched token. Integer tokens too large for i64 yield None.
    pub fn from_token(token: &str) -> Option<Number> {
        if token.contains('.') {
            token.parse::<f64>().ok().map(Number::Float)
        } else {
            token.parse::<i64>().ok().map(Number::Integer)
        }
    }
}

/// Structured reading of one OCR text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphRecord {
    pub title: Option<String>,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub rows: Vec<Vec<Number>>,
}

impl GraphRecord {
    /// Combines records into one: the first title and labels seen win, rows
    /// are concatenated in order.
    pub fn merge(records: impl IntoIterator<Item = GraphRecord>) -> GraphRecord {
        let mut merged = GraphRecord::default();
        for record in records {
            merged.title = merged.title.or(record.title);
            merged.x_axis = merged.x_axis.or(record.x_axis);
            merged.y_axis = merged.y_axis.or(record.y_axis);
            merged.rows.extend(record.rows);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.x_axis.is_none() && self.y_axis.is_none() && self.rows.is_empty()
    }
}

/// Classifies lines of OCR text into title, axis labels and numeric rows.
///
/// Never fails on input: lines that fit no rule are dropped.
#[derive(Clone, Debug)]
pub struct StructureParser {
    mode: ParseMode,
    number_regex: Regex,
}

impl StructureParser {
    pub fn new(mode: ParseMode) -> Result<Self, ExtractError> {
        Ok(Self {
            mode,
            number_regex: Regex::new(NUMBER_PATTERN)?,
        })
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// All numeric tokens in `line`, in order of appearance.
    pub fn extract_numbers(&self, line: &str) -> Vec<Number> {
        self.number_regex
            .find_iter(line)
            .filter_map(|m| Number::from_token(m.as_str()))
            .collect()
    }

    pub fn parse(&self, text: &str) -> GraphRecord {
        let lines = text.split('\n').map(str::trim).filter(|l| !l.is_empty());
        let record = match self.mode {
            ParseMode::Labeled => self.parse_labeled(lines),
            ParseMode::DataOnly => self.parse_data_only(lines),
        };

        crate::log(&format!(
            "Parsed {} row(s) (title: {}, x: {}, y: {})",
            record.rows.len(),
            record.title.as_deref().unwrap_or("-"),
            record.x_axis.as_deref().unwrap_or("-"),
            record.y_axis.as_deref().unwrap_or("-")
        ));
        record
    }

    /// First line is the title. Text-only lines after it fill the x then y
    /// label, in that order; later text-only lines are dropped. Anything else
    /// with numbers becomes a row.
    fn parse_labeled<'a>(&self, lines: impl Iterator<Item = &'a str>) -> GraphRecord {
        let mut record = GraphRecord::default();

        for line in lines {
            if record.title.is_none() {
                record.title = Some(line.to_string());
                continue;
            }

            if is_label(line) {
                if record.x_axis.is_none() {
                    record.x_axis = Some(line.to_string());
                } else if record.y_axis.is_none() {
                    record.y_axis = Some(line.to_string());
                }
                continue;
            }

            let values = self.extract_numbers(line);
            if !values.is_empty() {
                record.rows.push(values);
            }
        }

        record
    }

    fn parse_data_only<'a>(&self, lines: impl Iterator<Item = &'a str>) -> GraphRecord {
        let rows = lines
            .map(|line| self.extract_numbers(line))
            .filter(|values| !values.is_empty())
            .collect();
        GraphRecord {
            rows,
            ..GraphRecord::default()
        }
    }
}

/// A label line has at least one ASCII letter and no digits.
fn is_label(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_alphabetic()) && !line.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::extract::Number::{Float, Integer};

    fn parser(mode: ParseMode) -> StructureParser {
        StructureParser::new(mode).unwrap()
    }

    #[test]
    fn test_number_types() {
        let p = parser(ParseMode::DataOnly);
        assert_eq!(p.extract_numbers("42"), vec![Integer(42)]);
        assert_eq!(p.extract_numbers("42.0"), vec![Float(42.0)]);
        assert_eq!(p.extract_numbers("42."), vec![Float(42.0)]);
    }

    #[test]
    fn test_number_tokens_in_noise() {
        let p = parser(ParseMode::DataOnly);
        assert_eq!(
            p.extract_numbers("Q1: 12.5%, Q2 -7 (3.)x"),
            vec![Integer(1), Float(12.5), Integer(2), Integer(7), Float(3.0)]
        );
        // A second point starts a new token: "1.2.3" -> "1.2", "3"
        assert_eq!(p.extract_numbers("1.2.3"), vec![Float(1.2), Integer(3)]);
        assert_eq!(p.extract_numbers(".5"), vec![Integer(5)]);
        assert!(p.extract_numbers("no digits here").is_empty());
    }

    #[test]
    fn test_oversized_integer_dropped() {
        let p = parser(ParseMode::DataOnly);
        assert_eq!(
            p.extract_numbers("99999999999999999999 7"),
            vec![Integer(7)]
        );
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let p = parser(ParseMode::DataOnly);
        for line in ["1 2 3", "a1.5b2.", "", "x 10.25 y 3"] {
            assert_eq!(p.extract_numbers(line), p.extract_numbers(line));
        }
    }

    #[test]
    fn test_labeled_title_and_axes() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("Sales Chart\nMonths\nRevenue\n1 2 3\n4 5 6");

        assert_eq!(record.title.as_deref(), Some("Sales Chart"));
        assert_eq!(record.x_axis.as_deref(), Some("Months"));
        assert_eq!(record.y_axis.as_deref(), Some("Revenue"));
        assert_eq!(
            record.rows,
            vec![
                vec![Integer(1), Integer(2), Integer(3)],
                vec![Integer(4), Integer(5), Integer(6)]
            ]
        );
    }

    #[test]
    fn test_labeled_title_is_unconditional() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("2021 results 10 20\nYear\n5 6");

        assert_eq!(record.title.as_deref(), Some("2021 results 10 20"));
        assert_eq!(record.x_axis.as_deref(), Some("Year"));
        assert_eq!(record.rows, vec![vec![Integer(5), Integer(6)]]);
    }

    #[test]
    fn test_labeled_caps_at_two_labels() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("Title\nMonths\nRevenue\nLegend\n1 2");

        assert_eq!(record.x_axis.as_deref(), Some("Months"));
        assert_eq!(record.y_axis.as_deref(), Some("Revenue"));
        assert_eq!(record.rows, vec![vec![Integer(1), Integer(2)]]);
    }

    #[test]
    fn test_labeled_mixed_lines_become_rows() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("Title\nJan 10\nFeb 12.5\n---\n");

        assert!(record.x_axis.is_none());
        assert_eq!(
            record.rows,
            vec![vec![Integer(10)], vec![Float(12.5)]]
        );
    }

    #[test]
    fn test_blank_lines_do_not_reset_state() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("\n  \nSales Chart\n\n   \nMonths\n\t\nRevenue\n\n1 2 3\n\x0c");

        assert_eq!(record.title.as_deref(), Some("Sales Chart"));
        assert_eq!(record.x_axis.as_deref(), Some("Months"));
        assert_eq!(record.y_axis.as_deref(), Some("Revenue"));
        assert_eq!(record.rows.len(), 1);
    }

    #[test]
    fn test_lines_are_trimmed() {
        let p = parser(ParseMode::Labeled);
        let record = p.parse("  Sales Chart \r\n Months\r\n");
        assert_eq!(record.title.as_deref(), Some("Sales Chart"));
        assert_eq!(record.x_axis.as_deref(), Some("Months"));
    }

    #[test]
    fn test_data_only_mode() {
        let p = parser(ParseMode::DataOnly);
        let record = p.parse("foo\n1.5 2.5\nbar\n3 4");

        assert_eq!(record.title, None);
        assert_eq!(record.x_axis, None);
        assert_eq!(record.y_axis, None);
        assert_eq!(
            record.rows,
            vec![vec![Float(1.5), Float(2.5)], vec![Integer(3), Integer(4)]]
        );
    }

    #[test]
    fn test_empty_text() {
        for mode in [ParseMode::Labeled, ParseMode::DataOnly] {
            assert!(parser(mode).parse("").is_empty());
            assert!(parser(mode).parse("\n \n").is_empty());
        }
    }

    #[test]
    fn test_merge_records() {
        let first = GraphRecord {
            title: None,
            x_axis: Some("Months".to_string()),
            y_axis: None,
            rows: vec![vec![Integer(1)]],
        };
        let second = GraphRecord {
            title: Some("Sales".to_string()),
            x_axis: Some("Weeks".to_string()),
            y_axis: Some("Revenue".to_string()),
            rows: vec![vec![Float(2.5)]],
        };

        let merged = GraphRecord::merge([first, second]);
        assert_eq!(merged.title.as_deref(), Some("Sales"));
        assert_eq!(merged.x_axis.as_deref(), Some("Months"));
        assert_eq!(merged.y_axis.as_deref(), Some("Revenue"));
        assert_eq!(merged.rows, vec![vec![Integer(1)], vec![Float(2.5)]]);
    }

    #[test]
    fn test_number_serialization() {
        let record = GraphRecord {
            rows: vec![vec![Integer(3), Float(4.0), Float(1.25)]],
            ..GraphRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"title":null,"x_axis":null,"y_axis":null,"rows":[[3,4.0,1.25]]}"#
        );
    }
}

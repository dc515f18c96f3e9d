//! Date-time patterns written in the `yyyy-MM-dd HH:mm:ss` letter style,
//! translated once into chrono format strings.

use std::fmt::{Display, Write};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::errors::GenerationError;

pub const ISO_PATTERN: &str = "yyyy-MM-dd'T'HH:mm:ss.SSS'Z'";
pub const DATE_DASH_PATTERN: &str = "yyyy-MM-dd";
pub const DATETIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";

/// A compiled date-time pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimePattern {
    source: String,
    format: String,
}

impl DateTimePattern {
    pub fn compile(source: &str) -> Result<Self, GenerationError> {
        let format = translate(source)?;
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(GenerationError::InvalidPattern(source.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            format,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The chrono format string this pattern translates to.
    pub fn chrono_format(&self) -> &str {
        &self.format
    }

    pub fn render<Tz>(&self, value: &DateTime<Tz>) -> Result<String, GenerationError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        write!(out, "{}", value.format(&self.format))
            .map_err(|_| GenerationError::InvalidPattern(self.source.clone()))?;
        Ok(out)
    }

    /// Parse `text` as a date-time, or as a date at midnight when the pattern
    /// carries no time fields.
    pub fn parse(&self, text: &str) -> Result<NaiveDateTime, GenerationError> {
        NaiveDateTime::parse_from_str(text, &self.format)
            .or_else(|_| {
                NaiveDate::parse_from_str(text, &self.format)
                    .map(|date| date.and_time(NaiveTime::default()))
            })
            .map_err(|err| {
                GenerationError::InvalidArgument {
                    function: "date".to_string(),
                    message: format!("'{text}' does not match '{}': {err}", self.source),
                }
            })
    }
}

fn translate(source: &str) -> Result<String, GenerationError> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() * 2);
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '\'' {
            if chars.get(idx + 1) == Some(&'\'') {
                out.push('\'');
                idx += 2;
                continue;
            }
            idx += 1;
            let mut closed = false;
            while idx < chars.len() {
                if chars[idx] == '\'' {
                    if chars.get(idx + 1) == Some(&'\'') {
                        out.push('\'');
                        idx += 2;
                        continue;
                    }
                    closed = true;
                    idx += 1;
                    break;
                }
                push_literal(&mut out, chars[idx]);
                idx += 1;
            }
            if !closed {
                return Err(GenerationError::InvalidPattern(source.to_string()));
            }
            continue;
        }

        if ch.is_ascii_alphabetic() {
            let run = chars[idx..].iter().take_while(|&&next| next == ch).count();
            out.push_str(field(ch, run).ok_or_else(|| {
                GenerationError::InvalidPattern(source.to_string())
            })?);
            idx += run;
            continue;
        }

        push_literal(&mut out, ch);
        idx += 1;
    }

    Ok(out)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}

fn field(letter: char, run: usize) -> Option<&'static str> {
    let format = match (letter, run) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z' | 'x' | 'X', 1 | 2) => "%z",
        ('Z', _) => "%z",
        ('x' | 'X', _) => "%:z",
        ('z', _) => "%Z",
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_iso_pattern() {
        let pattern = DateTimePattern::compile(ISO_PATTERN).expect("compile");
        assert_eq!(pattern.chrono_format(), "%Y-%m-%dT%H:%M:%S.%3fZ");
    }

    #[test]
    fn translates_quotes_and_percent() {
        let pattern = DateTimePattern::compile("dd 'o''clock' 100%").expect("compile");
        assert_eq!(pattern.chrono_format(), "%d o'clock 100%%");
    }

    #[test]
    fn rejects_unknown_letters() {
        assert!(DateTimePattern::compile("yyyy-QQ").is_err());
        assert!(DateTimePattern::compile("yyyy 'open").is_err());
    }

    #[test]
    fn parses_date_only_at_midnight() {
        let pattern = DateTimePattern::compile(DATE_DASH_PATTERN).expect("compile");
        let parsed = pattern.parse("2018-02-28").expect("parse");
        assert_eq!(parsed.to_string(), "2018-02-28 00:00:00");
    }
}

use std::fmt::Display;
use std::str::FromStr;

use crate::errors::GenerationError;
use crate::expression::Expression;

/// Remove one layer of matching single or double quotes around `value`.
pub fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

pub fn is_quoted(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
}

/// Parse a numeric argument, reporting the function name on failure.
pub fn parse_number<T>(function: &str, raw: &str) -> Result<T, GenerationError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = strip_quotes(raw);
    value.parse::<T>().map_err(|err| {
        GenerationError::argument(function, format!("invalid number '{value}': {err}"))
    })
}

/// Optional numeric argument at `index`; empty arguments count as absent.
pub fn optional_number<T>(expr: &Expression<'_>, index: usize) -> Result<Option<T>, GenerationError>
where
    T: FromStr,
    T::Err: Display,
{
    match expr.arg(index) {
        Some(raw) if !strip_quotes(raw).is_empty() => parse_number(expr.name, raw).map(Some),
        _ => Ok(None),
    }
}

/// Required text argument at `index`, quotes stripped.
pub fn required_text<'a>(
    expr: &Expression<'a>,
    index: usize,
    what: &str,
) -> Result<&'a str, GenerationError> {
    expr.arg(index)
        .map(strip_quotes)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GenerationError::argument(expr.name, format!("missing {what} argument")))
}

pub fn optional_text<'a>(expr: &Expression<'a>, index: usize) -> Option<&'a str> {
    expr.arg(index)
        .map(strip_quotes)
        .filter(|value| !value.is_empty())
}

/// Parse a `now`, `now+N` or `now-N` offset into its signed amount.
pub fn parse_now_offset(function: &str, offset: &str) -> Result<Option<i64>, GenerationError> {
    let offset = strip_quotes(offset);
    let Some(rest) = offset.strip_prefix("now") else {
        return Ok(None);
    };
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Some(0));
    }
    let (sign, digits) = if let Some(digits) = rest.strip_prefix('-') {
        (-1, digits)
    } else if let Some(digits) = rest.strip_prefix('+') {
        (1, digits)
    } else {
        return Err(GenerationError::argument(
            function,
            format!("invalid offset '{offset}'"),
        ));
    };
    let amount: i64 = parse_number(function, digits.trim())?;
    Ok(Some(sign * amount))
}

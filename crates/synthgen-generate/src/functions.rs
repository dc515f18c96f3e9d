//! Builtin functions of the template expression language.
//!
//! A string leaf containing `(` is parsed into an [`Expression`] and
//! dispatched by name through [`FUNCTIONS`]. Handler errors never escape:
//! the leaf degrades to its literal text and the fallback is counted.

use chrono::Utc;
use chrono_tz::Tz;
use rand::RngCore;
use serde_json::Value;
use tracing::{debug, warn};

use crate::args::{
    is_quoted, optional_number, optional_text, parse_now_offset, required_text, strip_quotes,
};
use crate::calendar::{TimeUnit, random_date_time};
use crate::errors::GenerationError;
use crate::expression::Expression;
use crate::model::GenerationReport;
use crate::pattern::{DATE_DASH_PATTERN, DATETIME_PATTERN, DateTimePattern, ISO_PATTERN};
use crate::random;
use crate::state::GeneratorState;
use crate::template::Template;
use crate::value::GeneratedValue;
use crate::walker;

/// Everything a handler may touch while evaluating one leaf.
pub struct EvalContext<'a> {
    pub state: &'a GeneratorState,
    pub rng: &'a mut dyn RngCore,
    pub nested_array_size: usize,
    pub report: &'a mut GenerationReport,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        state: &'a GeneratorState,
        rng: &'a mut dyn RngCore,
        nested_array_size: usize,
        report: &'a mut GenerationReport,
    ) -> Self {
        Self {
            state,
            rng,
            nested_array_size,
            report,
        }
    }
}

type Handler = fn(&Expression<'_>, &mut EvalContext<'_>) -> Result<GeneratedValue, GenerationError>;

/// Function name to handler. Names are matched exactly.
pub const FUNCTIONS: &[(&str, Handler)] = &[
    ("random", random_choice),
    ("json", inline_json),
    ("int", int_value),
    ("long", long_value),
    ("double", double_value),
    ("datetime_seq", datetime_seq),
    ("datetime", datetime_offset),
    ("datetime:simple", datetime_simple),
    ("date", date_value),
    ("alpha", alpha),
    ("alphanumeric", alphanumeric),
    ("qs", quoted_string),
    ("cat", concat),
    ("seq", sequence),
    ("upper", upper),
    ("lower", lower),
    ("uuid", uuid_value),
    ("bool", bool_value),
];

/// Bare words evaluated with default arguments.
const KEYWORDS: &[(&str, Handler)] = &[
    ("int", int_value),
    ("long", long_value),
    ("double", double_value),
    ("datetime", iso_date_time),
    ("date", date_value),
    ("alpha", alpha),
    ("alphanumeric", alphanumeric),
    ("uuid", uuid_value),
    ("seq", sequence),
    ("bool", bool_value),
];

pub fn lookup(name: &str) -> Option<Handler> {
    FUNCTIONS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, handler)| *handler)
}

fn lookup_keyword(name: &str) -> Option<Handler> {
    KEYWORDS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, handler)| *handler)
}

/// Evaluate one primitive template leaf.
///
/// Booleans, numbers and nulls are returned unchanged; strings go through
/// the expression language.
pub fn evaluate(leaf: &Value, ctx: &mut EvalContext<'_>) -> GeneratedValue {
    match leaf {
        Value::Null => GeneratedValue::Null,
        Value::Bool(value) => GeneratedValue::Bool(*value),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                i32::try_from(value)
                    .map(GeneratedValue::Int)
                    .unwrap_or(GeneratedValue::Long(value))
            } else if let Some(value) = number.as_u64() {
                GeneratedValue::UnsignedLong(value)
            } else if let Some(value) = number.as_f64() {
                GeneratedValue::Double(value)
            } else {
                GeneratedValue::Unsupported(format!("number {number}"))
            }
        }
        Value::String(text) => evaluate_text(text, ctx),
        Value::Array(_) | Value::Object(_) => {
            GeneratedValue::Unsupported("composite value in leaf position".to_string())
        }
    }
}

/// Evaluate a leaf string (or a nested argument) as an expression.
pub fn evaluate_text(text: &str, ctx: &mut EvalContext<'_>) -> GeneratedValue {
    if text.contains('(') {
        let Some(expr) = Expression::parse(text) else {
            return literal(text);
        };
        let Some(handler) = lookup(expr.name) else {
            return literal(text);
        };
        return invoke(handler, &expr, text, ctx);
    }

    let word = strip_quotes(text);
    match lookup_keyword(word) {
        Some(handler) => invoke(handler, &Expression::bare(word), text, ctx),
        None => literal(text),
    }
}

fn invoke(
    handler: Handler,
    expr: &Expression<'_>,
    text: &str,
    ctx: &mut EvalContext<'_>,
) -> GeneratedValue {
    ctx.report.record_function_usage(expr.name);
    match handler(expr, ctx) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                function = expr.name,
                expression = text,
                error = %err,
                "expression evaluation failed, emitting literal"
            );
            ctx.report.record_fallback();
            literal(text)
        }
    }
}

fn literal(text: &str) -> GeneratedValue {
    GeneratedValue::Text(strip_quotes(text).to_string())
}

fn random_choice(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let choices: Vec<GeneratedValue> = expr.raw_args.iter().map(|raw| parse_choice(raw)).collect();
    random::choose(ctx.rng, &choices)
        .cloned()
        .ok_or_else(|| GenerationError::argument(expr.name, "needs at least one choice"))
}

/// Quoted text stays text; otherwise booleans, doubles (with a `.`) and
/// longs are recognized, and anything unparsable is kept as text.
fn parse_choice(raw: &str) -> GeneratedValue {
    let raw = raw.trim();
    if is_quoted(raw) {
        return GeneratedValue::Text(strip_quotes(raw).to_string());
    }
    if raw.eq_ignore_ascii_case("true") {
        return GeneratedValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return GeneratedValue::Bool(false);
    }
    let parsed = if raw.contains('.') {
        raw.parse::<f64>().ok().map(GeneratedValue::Double)
    } else {
        raw.parse::<i64>().ok().map(GeneratedValue::Long)
    };
    parsed.unwrap_or_else(|| GeneratedValue::Text(strip_quotes(raw).to_string()))
}

fn inline_json(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let body = expr
        .arg(0)
        .ok_or_else(|| GenerationError::argument(expr.name, "missing inline template"))?;
    let template = Template::parse(body).or_else(|_| Template::parse(&body.replace('\\', "")))?;
    if !template.root().is_object() {
        return Err(GenerationError::argument(
            expr.name,
            "inline template must be an object",
        ));
    }
    let count = optional_number::<u64>(expr, 1)?.unwrap_or(1);
    let nested = optional_number::<usize>(expr, 2)?.unwrap_or(ctx.nested_array_size);

    let outer = ctx.nested_array_size;
    ctx.nested_array_size = nested;
    let events = walker::generate_events(template.root(), count, ctx);
    ctx.nested_array_size = outer;

    events
        .into_iter()
        .next()
        .map(GeneratedValue::Text)
        .ok_or_else(|| GenerationError::argument(expr.name, "count must be > 0"))
}

fn int_value(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let (min, max) = match expr.arg_count() {
        1 => (optional_number(expr, 0)?.unwrap_or(0), i32::MAX),
        2 => (
            optional_number(expr, 0)?.unwrap_or(0),
            optional_number(expr, 1)?.unwrap_or(i32::MAX),
        ),
        _ => (0, i32::MAX),
    };
    random::random_int(ctx.rng, min, max).map(GeneratedValue::Int)
}

fn long_value(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let (min, max) = match expr.arg_count() {
        1 => (optional_number(expr, 0)?.unwrap_or(0), i64::MAX),
        2 => (
            optional_number(expr, 0)?.unwrap_or(0),
            optional_number(expr, 1)?.unwrap_or(i64::MAX),
        ),
        _ => (0, i64::MAX),
    };
    random::random_long(ctx.rng, min, max).map(GeneratedValue::Long)
}

fn double_value(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let (min, max) = match expr.arg_count() {
        1 => (optional_number(expr, 0)?.unwrap_or(0.0), f64::MAX),
        2 => (
            optional_number(expr, 0)?.unwrap_or(0.0),
            optional_number(expr, 1)?.unwrap_or(f64::MAX),
        ),
        _ => (0.0, f64::MAX),
    };
    let value = random::random_double(ctx.rng, min, max)?;
    if value.is_finite() {
        Ok(GeneratedValue::Double(value))
    } else {
        Ok(GeneratedValue::Unsupported(format!(
            "double range [{min}, {max}) overflows"
        )))
    }
}

fn parse_zone(raw: &str) -> Result<Tz, GenerationError> {
    raw.parse::<Tz>()
        .map_err(|_| GenerationError::UnknownTimeZone(raw.to_string()))
}

fn parse_unit(expr: &Expression<'_>, index: usize) -> Result<TimeUnit, GenerationError> {
    optional_text(expr, index).map_or(Ok(TimeUnit::Second), str::parse)
}

/// `datetime_seq(startSpec, endSpec, pattern, zone, unit)`
fn datetime_seq(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let start_spec = required_text(expr, 0, "start")?;
    let pattern = DateTimePattern::compile(required_text(expr, 2, "pattern")?)?;
    let zone = parse_zone(required_text(expr, 3, "zone")?)?;
    let unit = parse_unit(expr, 4)?;
    let now = Utc::now().with_timezone(&zone);

    let rederived = match parse_now_offset(expr.name, start_spec)? {
        Some(0) => None,
        Some(offset) => Some(unit.shift(now, offset).ok_or_else(|| {
            GenerationError::argument(expr.name, format!("offset '{start_spec}' out of range"))
        })?),
        None => {
            let naive = pattern.parse(start_spec)?;
            Some(
                naive
                    .and_local_timezone(zone)
                    .earliest()
                    .ok_or_else(|| {
                        GenerationError::argument(
                            expr.name,
                            format!("'{start_spec}' does not exist in {zone}"),
                        )
                    })?,
            )
        }
    };

    let value = ctx.state.cursor().advance(now, rederived, unit, 1)?;
    debug!(function = expr.name, value = %value, "cursor advanced");
    pattern.render(&value).map(GeneratedValue::Text)
}

/// `datetime(offsetSpec, pattern, zone, unit)`
fn datetime_offset(
    expr: &Expression<'_>,
    _ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let raw_offset = required_text(expr, 0, "offset")?;
    let pattern = DateTimePattern::compile(required_text(expr, 1, "pattern")?)?;
    let zone = parse_zone(required_text(expr, 2, "zone")?)?;
    let unit = parse_unit(expr, 3)?;
    let now = Utc::now().with_timezone(&zone);

    let offset = parse_now_offset(expr.name, raw_offset)?.unwrap_or(0);
    let value = unit.shift(now, offset).ok_or_else(|| {
        GenerationError::argument(expr.name, format!("offset '{raw_offset}' out of range"))
    })?;
    pattern.render(&value).map(GeneratedValue::Text)
}

fn sample_with(
    pattern: &str,
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let pattern = DateTimePattern::compile(pattern)?;
    let bounds: Vec<&str> = expr.raw_args.iter().map(|raw| strip_quotes(raw)).collect();
    random_date_time(ctx.rng, &pattern, &bounds).map(GeneratedValue::Text)
}

fn datetime_simple(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    sample_with(DATETIME_PATTERN, expr, ctx)
}

fn date_value(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    sample_with(DATE_DASH_PATTERN, expr, ctx)
}

fn iso_date_time(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    sample_with(ISO_PATTERN, expr, ctx)
}

fn alpha(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let len = optional_number(expr, 0)?.unwrap_or(random::DEFAULT_TEXT_LEN);
    Ok(GeneratedValue::Text(random::random_alpha(ctx.rng, len)))
}

fn alphanumeric(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let len = optional_number(expr, 0)?.unwrap_or(random::DEFAULT_TEXT_LEN);
    Ok(GeneratedValue::Text(random::random_alphanumeric(ctx.rng, len)))
}

fn quoted_string(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let inner = evaluate_text(expr.inner, ctx);
    Ok(GeneratedValue::Text(format!("\"{inner}\"")))
}

fn concat(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let mut out = String::new();
    for part in &expr.raw_args {
        match *part {
            "SPACE" => out.push(' '),
            "COMMA" => out.push_str(", "),
            part => out.push_str(&evaluate_text(part, ctx).to_string()),
        }
    }
    Ok(GeneratedValue::Text(out))
}

fn sequence(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let seed = optional_number::<i64>(expr, 0)?;
    Ok(GeneratedValue::Long(ctx.state.sequence().next(seed)))
}

fn upper(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let inner = evaluate_text(expr.inner, ctx);
    Ok(GeneratedValue::Text(inner.to_string().to_uppercase()))
}

fn lower(
    expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    let inner = evaluate_text(expr.inner, ctx);
    Ok(GeneratedValue::Text(inner.to_string().to_lowercase()))
}

fn uuid_value(
    _expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    Ok(GeneratedValue::Text(random::random_uuid(ctx.rng)))
}

fn bool_value(
    _expr: &Expression<'_>,
    ctx: &mut EvalContext<'_>,
) -> Result<GeneratedValue, GenerationError> {
    Ok(GeneratedValue::Bool(random::random_bool(ctx.rng)))
}

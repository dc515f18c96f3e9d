use serde_json::Value;

use crate::errors::GenerationError;

/// Header line for the given columns.
pub fn header_line(keys: &[String], delimiter: u8) -> Result<String, GenerationError> {
    write_line(keys.iter().map(String::as_str), delimiter)
}

/// One data line with fields in `keys` order.
///
/// Missing keys and nulls become empty fields, nested values are written as
/// compact JSON, and text is written without JSON quoting.
pub fn row_line(record: &Value, keys: &[String], delimiter: u8) -> Result<String, GenerationError> {
    let fields: Vec<String> = keys
        .iter()
        .map(|key| record.get(key).map(field_text).unwrap_or_default())
        .collect();
    write_line(fields.iter().map(String::as_str), delimiter)
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn write_line<'a>(
    fields: impl Iterator<Item = &'a str>,
    delimiter: u8,
) -> Result<String, GenerationError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.flush()?;
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    let line = String::from_utf8_lossy(&bytes);
    Ok(line.strip_suffix('\n').unwrap_or(&line).to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn quotes_fields_containing_delimiter() {
        let keys = vec!["name".to_string(), "tags".to_string(), "missing".to_string()];
        let record = json!({"name": "Smith, J", "tags": ["a", "b"], "missing": null});
        let line = row_line(&record, &keys, b',').expect("row");
        assert_eq!(line, r#""Smith, J","[""a"",""b""]","#);
    }

    #[test]
    fn honours_custom_delimiter() {
        let keys = vec!["a".to_string(), "b".to_string()];
        assert_eq!(header_line(&keys, b'|').expect("header"), "a|b");
        let record = json!({"a": 1, "b": true});
        assert_eq!(row_line(&record, &keys, b'|').expect("row"), "1|true");
    }
}

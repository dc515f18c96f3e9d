use serde_json::Value;

/// Compact single-line JSON for one record.
pub fn to_line(record: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

use bson::Bson;
use std::fs::File;
use std::io::{self, Write};

use super::options::ImportOptions;

/// Opens the error sidecar when one is configured and errors are skipped.
pub fn open_sidecar(opts: &ImportOptions) -> io::Result<Option<File>> {
    match &opts.error_sidecar {
        Some(p) if opts.skip_errors => File::create(p).map(Some),
        _ => Ok(None),
    }
}

/// Appends one `{"line":..,"error":..,"record":..}` object to the sidecar.
pub fn record_error(
    sidecar: Option<&mut File>,
    line: u64,
    error: &str,
    record: Option<&str>,
) -> io::Result<()> {
    if let Some(f) = sidecar {
        let entry = serde_json::json!({ "line": line, "error": error, "record": record });
        writeln!(f, "{entry}")?;
    }
    Ok(())
}

/// Converts one CSV field. With inference, integers become `Int64`, other
/// numbers `Double`, `true`/`false` booleans, and the empty field `Null`.
pub fn field_to_bson(field: &str, infer: bool) -> Bson {
    if !infer {
        return Bson::String(field.to_string());
    }
    if field.is_empty() {
        return Bson::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Bson::Int64(i);
    }
    if let Ok(f) = field.parse::<f64>()
        && f.is_finite()
    {
        return Bson::Double(f);
    }
    match field.to_lowercase().as_str() {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(field.to_string()),
    }
}

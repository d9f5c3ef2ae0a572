use crate::errors::DbError;
use crate::import::ImportFormat;

/// Width of the rule printed between the queries of a run.
pub const SEPARATOR_WIDTH: usize = 100;

#[must_use]
pub fn separator() -> String {
    format!("\n{}\n", "-".repeat(SEPARATOR_WIDTH))
}

/// `None` means detect from the file.
///
/// # Errors
/// `InvalidArgument` for an unknown format name.
pub fn parse_import_format(s: Option<&str>) -> Result<ImportFormat, DbError> {
    s.map_or(Ok(ImportFormat::Auto), |f| f.parse().map_err(DbError::InvalidArgument))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_format_parsing() {
        assert_eq!(parse_import_format(Some("CSV")).unwrap(), ImportFormat::Csv);
        assert_eq!(parse_import_format(Some("ndjson")).unwrap(), ImportFormat::Ndjson);
        assert_eq!(parse_import_format(Some("jsonl")).unwrap(), ImportFormat::Ndjson);
        assert_eq!(parse_import_format(None).unwrap(), ImportFormat::Auto);
        assert!(matches!(parse_import_format(Some("bson")), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn separator_is_a_padded_rule() {
        let s = separator();
        assert_eq!(s.trim().len(), SEPARATOR_WIDTH);
        assert!(s.starts_with('\n') && s.ends_with('\n'));
    }
}

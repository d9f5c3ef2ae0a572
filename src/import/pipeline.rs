use bson::Document as BsonDocument;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::csv::read_csv;
use super::detect::detect_format;
use super::ndjson::read_ndjson;
use super::options::{ImportFormat, ImportOptions, ImportReport};
use crate::errors::DbError;
use crate::store::CollectionHandle;

/// Imports a file into `collection`, creating it if needed.
///
/// # Errors
/// I/O errors on read failures, parse errors when `skip_errors` is off, and
/// backend errors from the inserts.
pub async fn import_file<H, P>(
    collection: &H,
    path: P,
    opts: &ImportOptions,
) -> Result<ImportReport, DbError>
where
    H: CollectionHandle,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    log::info!("import: path={}, collection={}", path.display(), collection.name());
    let mut reader = BufReader::new(File::open(path)?);
    let format = match opts.format {
        ImportFormat::Auto => detect_format(&mut reader, path)?,
        other => other,
    };
    import_from_reader(collection, reader, format, opts).await
}

/// Imports from an arbitrary reader. `Auto` is treated as NDJSON here since
/// there is no file name to go by.
///
/// # Errors
/// See [`import_file`].
pub async fn import_from_reader<H, R>(
    collection: &H,
    reader: R,
    format: ImportFormat,
    opts: &ImportOptions,
) -> Result<ImportReport, DbError>
where
    H: CollectionHandle,
    R: Read,
{
    let mut report = ImportReport::default();
    let docs = match format {
        ImportFormat::Csv => read_csv(reader, opts, &mut report)?,
        ImportFormat::Ndjson | ImportFormat::Auto => read_ndjson(reader, opts, &mut report)?,
    };
    insert_batches(collection, docs, opts, &mut report).await?;
    log::info!(
        "import into '{}' finished: inserted={} skipped={} batches={}",
        collection.name(),
        report.inserted,
        report.skipped,
        report.batches
    );
    Ok(report)
}

async fn insert_batches<H: CollectionHandle>(
    collection: &H,
    docs: Vec<BsonDocument>,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> Result<(), DbError> {
    let size = opts.batch_size.max(1);
    let mut docs = docs.into_iter().peekable();
    while docs.peek().is_some() {
        let batch: Vec<BsonDocument> = docs.by_ref().take(size).collect();
        let before = report.inserted;
        report.inserted += collection.insert_many(batch).await?;
        report.batches += 1;
        if let Some(n) = opts.progress_every
            && n > 0
            && report.inserted / n > before / n
        {
            log::info!("imported {} records", report.inserted);
        }
    }
    Ok(())
}

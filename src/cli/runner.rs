use std::io::Write;

use crate::config::AppConfig;
use crate::driver::Driver;
use crate::errors::DbError;
use crate::import::{CsvOptions, ImportOptions, import_file};
use crate::store::Connector;

use super::command::Command;
use super::util::{parse_import_format, separator};

/// Connects `driver` and executes `cmd`, writing human-readable output to
/// `out`. Errors that end the run are returned unlogged; the caller reports
/// them once.
///
/// # Errors
/// A failed connection, an empty listings collection, a failed import, or a
/// refused/failed drop.
pub async fn run<C: Connector, W: Write>(
    driver: &mut Driver<C>,
    cfg: &AppConfig,
    cmd: Command,
    out: &mut W,
) -> Result<(), DbError> {
    driver.connect().await?;
    match cmd {
        Command::Run => run_queries(driver, cfg, out).await,
        Command::Import { collection, file, format, infer_types } => {
            let opts = ImportOptions {
                format: parse_import_format(format.as_deref())?,
                csv: CsvOptions { type_infer: infer_types, ..CsvOptions::default() },
                ..ImportOptions::default()
            };
            let handle = driver.collection_handle(&collection)?;
            let report = import_file(&handle, &file, &opts).await?;
            writeln!(
                out,
                "Imported {} records into '{collection}' ({} skipped)",
                report.inserted, report.skipped
            )?;
            Ok(())
        }
        Command::DropAll { confirmed } => {
            if !confirmed {
                return Err(DbError::InvalidArgument(
                    "drop-all removes every collection; pass --yes to confirm".into(),
                ));
            }
            for name in driver.drop_all().await? {
                writeln!(out, "Dropped collection '{name}'")?;
            }
            Ok(())
        }
        Command::ListCollections => {
            let mut names = driver.collection_names().await?;
            names.sort();
            for name in names {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }
    }
}

/// The default run: sanity count, scan queries, count queries, then the
/// reviews collection. A missing collection skips its queries; a failing
/// query is logged and the run moves on.
async fn run_queries<C: Connector, W: Write>(
    driver: &mut Driver<C>,
    cfg: &AppConfig,
    out: &mut W,
) -> Result<(), DbError> {
    let listings = cfg.listings_collection.as_str();
    if driver.select_collection(listings).await? {
        let total = driver.count_all().await?;
        if total == 0 {
            return Err(DbError::EmptyCollection(listings.to_string()));
        }
        log::info!("There are {total} total listings");

        for input in &cfg.queries.scan {
            write!(out, "{}", separator())?;
            log::debug!(
                "Querying with price_limit={} and min_nights_limit={}",
                input.price_limit,
                input.min_nights_limit
            );
            match driver.run_scan_query(input.price_limit, input.min_nights_limit, &mut *out).await {
                Ok(n) => log::info!("Returned {n} records!"),
                Err(e) => log::error!("scan query failed: {e}"),
            }
        }

        let bedrooms = cfg.queries.bedroom_limit;
        let strategies = [cfg.queries.zipcode_criteria(), cfg.queries.city_criteria()];
        for criteria in strategies.into_iter().flatten() {
            write!(out, "{}", separator())?;
            match driver.run_count_query(bedrooms, &criteria).await {
                Ok(n) => writeln!(
                    out,
                    "There are {n} listings {} with more than {bedrooms} bedrooms",
                    criteria.describe()
                )?,
                Err(e) => log::error!("count query failed: {e}"),
            }
        }
    } else {
        log::warn!("collection '{listings}' not found; skipping listings queries");
    }

    let reviews = cfg.reviews_collection.as_str();
    if driver.select_collection(reviews).await? {
        let n = driver.count_all().await?;
        log::info!("collection '{reviews}' holds {n} reviews");
    } else {
        log::warn!("collection '{reviews}' not found; skipping reviews queries");
    }

    writeln!(out, "Program ended")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCluster;
    use crate::test_support::{capture_logs, memory_config, seeded_listings, take_logs};

    fn app_config() -> AppConfig {
        AppConfig { connection: memory_config(), ..AppConfig::default() }
    }

    async fn run_to_string(cluster: MemoryCluster, cmd: Command) -> (Result<(), DbError>, String) {
        let cfg = app_config();
        let mut driver = Driver::new(cfg.connection.clone(), cluster);
        let mut out = Vec::new();
        let res = run(&mut driver, &cfg, cmd, &mut out).await;
        (res, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn default_run_prints_scans_and_counts() {
        let (res, out) = run_to_string(seeded_listings(), Command::Run).await;
        res.unwrap();
        assert!(out.contains("Here are all of the 1-night stays that cost at most $20:"));
        assert!(out.contains("Book out at listing #2 "));
        assert!(out.contains("Book out at listing #1 "));
        assert!(out.contains("There are 3 listings in zipcodes 97201-97210 with more than 2 bedrooms"));
        assert!(out.contains("There are 3 listings in the city of Portland with more than 2 bedrooms"));
        assert!(out.trim_end().ends_with("Program ended"));
    }

    #[tokio::test]
    async fn empty_listings_is_fatal() {
        capture_logs();
        let cluster = MemoryCluster::new();
        cluster.create_collection("airbnb", "listings");
        let (res, out) = run_to_string(cluster, Command::Run).await;
        assert!(matches!(res, Err(DbError::EmptyCollection(ref c)) if c == "listings"));
        assert!(res.unwrap_err().to_string().contains("no documents"));
        assert!(!out.contains("Program ended"));
        assert!(take_logs().iter().all(|(l, _)| *l != log::Level::Error));
    }

    #[tokio::test]
    async fn missing_listings_skips_queries() {
        let (res, out) = run_to_string(MemoryCluster::new(), Command::Run).await;
        res.unwrap();
        assert!(!out.contains("Here are all"));
        assert!(out.contains("Program ended"));
    }

    #[tokio::test]
    async fn bad_uri_fails_before_any_output() {
        capture_logs();
        let cfg = AppConfig::default();
        let mut driver = Driver::new(cfg.connection.clone(), MemoryCluster::new());
        let mut out = Vec::new();
        let res = run(&mut driver, &cfg, Command::Run, &mut out).await;
        assert!(matches!(res, Err(DbError::Configuration(_))));
        assert!(out.is_empty());
        let errors: Vec<_> = take_logs().into_iter().filter(|(l, _)| *l == log::Level::Error).collect();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[tokio::test]
    async fn failed_import_is_returned_unlogged() {
        capture_logs();
        let tmp = tempfile::tempdir().unwrap();
        let cmd = Command::Import {
            collection: "reviews".into(),
            file: tmp.path().join("absent.ndjson"),
            format: Some("ndjson".into()),
            infer_types: false,
        };
        let (res, out) = run_to_string(MemoryCluster::new(), cmd).await;
        assert!(res.is_err());
        assert!(out.is_empty());
        assert!(take_logs().iter().all(|(l, _)| *l != log::Level::Error));
    }

    #[tokio::test]
    async fn drop_all_requires_confirmation() {
        let cluster = seeded_listings();
        let (res, _) = run_to_string(cluster.clone(), Command::DropAll { confirmed: false }).await;
        assert!(matches!(res, Err(DbError::InvalidArgument(_))));
        assert_eq!(cluster.len("airbnb", "listings"), Some(3));

        let (res, out) = run_to_string(cluster.clone(), Command::DropAll { confirmed: true }).await;
        res.unwrap();
        assert_eq!(out, "Dropped collection 'listings'\n");
        assert_eq!(cluster.len("airbnb", "listings"), None);
    }

    #[tokio::test]
    async fn list_collections_is_sorted() {
        let cluster = seeded_listings();
        cluster.create_collection("airbnb", "calendar");
        let (res, out) = run_to_string(cluster, Command::ListCollections).await;
        res.unwrap();
        assert_eq!(out, "calendar\nlistings\n");
    }

    #[tokio::test]
    async fn import_command_loads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("reviews.csv");
        std::fs::write(&file, "listing_id,comments\n2,great\n3,fine\n").unwrap();
        let cluster = MemoryCluster::new();
        let cmd = Command::Import {
            collection: "reviews".into(),
            file,
            format: None,
            infer_types: true,
        };
        let (res, out) = run_to_string(cluster.clone(), cmd).await;
        res.unwrap();
        assert_eq!(out, "Imported 2 records into 'reviews' (0 skipped)\n");
        assert_eq!(cluster.len("airbnb", "reviews"), Some(2));
    }
}

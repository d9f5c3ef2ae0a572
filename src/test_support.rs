#![cfg(test)]

// Fixtures shared by the unit tests.
use bson::{Document as BsonDocument, doc};
use std::cell::RefCell;
use std::sync::Once;

use crate::config::ConnectionConfig;
use crate::store::MemoryCluster;

pub fn memory_config() -> ConnectionConfig {
    ConnectionConfig {
        connection_string: "memory://test".to_string(),
        database_name: "airbnb".to_string(),
    }
}

pub fn listing(id: i64, price: f64, nights: i32) -> BsonDocument {
    doc! {
        "id": id,
        "price": price,
        "minimum_nights_avg_ntm": nights,
        "neighbourhood_cleansed": "Pearl",
        "smart_location": "Portland, OR",
        "accommodates": 2,
        "bedrooms": 3,
        "zipcode": 97209,
        "city": "Portland",
    }
}

/// A cluster whose `airbnb.listings` holds three listings priced 90, 20
/// and 50, with average minimum stays 7, 1 and 1.
pub fn seeded_listings() -> MemoryCluster {
    let cluster = MemoryCluster::new();
    cluster.seed("airbnb", "listings", [listing(1, 90.0, 7), listing(2, 20.0, 1), listing(3, 50.0, 1)]);
    cluster
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Routes `log` records emitted on the current thread into a buffer read
/// back by [`take_logs`]. Clears anything captured earlier on this thread.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        if log::set_logger(&CAPTURE).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
}

pub fn take_logs() -> Vec<(log::Level, String)> {
    CAPTURED.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

use std::path::PathBuf;

/// What one invocation of the program does.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Count the listings, run the scan and count queries, then look for reviews.
    #[default]
    Run,
    Import {
        collection: String,
        file: PathBuf,
        format: Option<String>,
        infer_types: bool,
    },
    /// Drop every collection of the configured database. Refused unless
    /// `confirmed` is set.
    DropAll {
        confirmed: bool,
    },
    ListCollections,
}

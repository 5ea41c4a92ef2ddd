pub mod loaders;
pub mod record;
pub mod report;
pub mod roster;
pub mod source;

pub use loaders::{load_sources, JsonRosterFile, RosterProvider};
pub use record::{Record, DEFAULT_COLOR, NO_PROJECT_URL, UNKNOWN_ASSIGNMENT};
pub use report::{ExtractionReport, SourceReport, SourceStatus};
pub use roster::{ColorScheme, Reviewer, Roster};
pub use source::{Source, SourceKey};

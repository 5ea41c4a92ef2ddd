pub mod roster_loader;
pub mod sources_loader;

pub use roster_loader::{JsonRosterFile, RosterProvider};
pub use sources_loader::{load_sources, parse_sources};

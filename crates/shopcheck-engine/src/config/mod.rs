pub mod loader;
pub mod schema;

pub use loader::{CONFIG_ENV, ConfigError, ConfigLoader, candidate_paths, validate};
pub use schema::SuiteConfig;

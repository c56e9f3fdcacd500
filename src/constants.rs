//! Constants used throughout the crate
//!
//! This module centralizes separators, tokens, file names and default values
//! so the query builders and the configuration layer agree on them.

// Path and include syntax
pub const PATH_SEPARATOR: char = '.';
pub const INCLUDE_SEPARATOR: char = ',';

// Sort direction tokens
pub const DIRECTION_ASC: &str = "asc";
pub const DIRECTION_DESC: &str = "desc";

// Alias prefix for tables joined by an ordering path
pub const ORDER_JOIN_ALIAS_PREFIX: &str = "ob_";

// Configuration and log files
pub const APP_DIR_NAME: &str = "query-repository";
pub const LOCAL_CONFIG_FILE: &str = "query-repository.toml";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "query-repository.log";
pub const CONFIG_GENERATED: &str = "Configuration file generated";

// Defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// Maximum number of keys bound into one include query
pub const INCLUDE_BATCH_SIZE: usize = 500;

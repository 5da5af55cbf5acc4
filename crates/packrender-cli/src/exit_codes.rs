//! Process exit codes, one per failing pipeline stage

/// Success - operation completed without errors
pub const SUCCESS: u8 = 0;

/// General error - unspecified failure
pub const ERROR: u8 = 1;

/// Values rejected by the pack schema
pub const SCHEMA_ERROR: u8 = 2;

/// Template rendering failed
pub const TEMPLATE_ERROR: u8 = 3;

/// Working path does not hold a loadable pack
pub const LOAD_ERROR: u8 = 4;

/// Source could not be fetched
pub const FETCH_ERROR: u8 = 5;

/// Rendered output is not a valid Kubernetes object
pub const DECODE_ERROR: u8 = 6;

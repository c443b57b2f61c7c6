//! Constants used throughout the bridge-core crate.
//!
//! This module contains all path, filename, and versioning constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Directory name for conversion records storage.
pub const CONVERSIONS_DIR_NAME: &str = "conversions";

/// Default directory for conversion data storage when no explicit directory is configured.
pub const DEFAULT_CONVERSION_DATA_DIR: &str = "conversion_data";

/// Filename for the conversion request record inside its sharded directory.
pub const REQUEST_FILENAME: &str = "request.json";

/// Filename for the generated FHIR resource record inside its sharded directory.
pub const RESOURCE_FILENAME: &str = "resource.json";

/// Tag identifying the mapping ruleset that produced a conversion result.
pub const MAPPING_VERSION: &str = "v1";

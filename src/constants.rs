//! Application constants for the weather collector
//!
//! Service endpoints, stored query identifiers, collection windows and
//! default paths used throughout the collector.

// =============================================================================
// FMI Open Data WFS Service
// =============================================================================

/// Default WFS endpoint of the FMI open data service
pub const DEFAULT_SERVICE_URL: &str = "https://opendata.fmi.fi/wfs/fin";

/// Fixed WFS request parameters sent with every query
pub const WFS_SERVICE: &str = "WFS";
pub const WFS_VERSION: &str = "2.0.0";
pub const WFS_REQUEST: &str = "GetFeature";

/// Stored query returning measured values as simple features
pub const OBSERVATION_STORED_QUERY: &str = "fmi::observations::weather::simple";

/// Stored query returning point forecasts as simple features
pub const FORECAST_STORED_QUERY: &str =
    "fmi::forecast::edited::weather::scandinavia::point::simple";

// =============================================================================
// Collection Windows
// =============================================================================

/// Observations are fetched for this many hours before the run time and
/// forecasts for this many hours after it (one week each way)
pub const COLLECTION_WINDOW_HOURS: i64 = 168;

// =============================================================================
// Database Tables
// =============================================================================

pub const OBSERVATIONS_TABLE: &str = "observations";
pub const FORECASTS_TABLE: &str = "forecasts";

// =============================================================================
// Configuration
// =============================================================================

/// System-wide configuration file location
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wcollect/config.json";

/// Directory name under the user config dir used as a fallback location
pub const CONFIG_DIR_NAME: &str = "wcollect";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Scheme prepended to ClickHouse addresses given as bare host:port
pub const DEFAULT_CLICKHOUSE_SCHEME: &str = "http://";

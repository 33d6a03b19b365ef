//! Stored query request construction.

use crate::constants::{WFS_REQUEST, WFS_SERVICE, WFS_VERSION};
use crate::error::{CollectorError, Result};
use crate::models::{TimeWindow, WeatherRow};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;

/// A `GetFeature` request for one stored query at one place
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuery {
    pub storedquery_id: String,
    pub parameters: String,
    pub place: String,
    pub window: TimeWindow,
}

impl StoredQuery {
    pub fn new(
        storedquery_id: impl Into<String>,
        parameters: impl Into<String>,
        place: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            storedquery_id: storedquery_id.into(),
            parameters: parameters.into(),
            place: place.into(),
            window,
        }
    }

    /// Query for the stored query and parameter table of row kind `R`
    pub fn for_rows<R: WeatherRow>(place: &str, window: TimeWindow) -> Self {
        Self::new(R::STORED_QUERY, R::parameter_list(), place, window)
    }

    /// Query string pairs in the order they are sent
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("service", WFS_SERVICE.to_string()),
            ("version", WFS_VERSION.to_string()),
            ("request", WFS_REQUEST.to_string()),
            ("storedquery_id", self.storedquery_id.clone()),
            ("parameters", self.parameters.clone()),
            ("place", self.place.clone()),
            ("starttime", format_time(self.window.start)),
            ("endtime", format_time(self.window.end)),
        ]
    }

    /// Full request URL against the service endpoint
    pub fn url(&self, base_url: &str) -> Result<Url> {
        Url::parse_with_params(base_url, self.pairs()).map_err(|e| {
            CollectorError::configuration(format!("Invalid service URL '{}': {}", base_url, e))
        })
    }
}

/// RFC3339 in UTC with whole seconds, e.g. `2024-05-01T12:00:00Z`
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

//! Core data structures for weather collection.
//!
//! Defines the raw members decoded from the WFS response, the typed rows
//! loaded into ClickHouse, and the static parameter-to-column mapping tables
//! that connect the two.

use crate::constants::{
    FORECAST_STORED_QUERY, FORECASTS_TABLE, OBSERVATION_STORED_QUERY, OBSERVATIONS_TABLE,
};
use chrono::{DateTime, Duration, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// One `(time, parameter, value)` triple from a feature collection
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub time: DateTime<Utc>,
    pub name: String,
    pub value: String,
}

impl Member {
    pub fn new(time: DateTime<Utc>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Half-open `[start, end)` query window in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending at `now`, used for observations
    pub fn trailing(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: now - Duration::hours(hours),
            end: now,
        }
    }

    /// Window starting at `now`, used for forecasts
    pub fn leading(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: now,
            end: now + Duration::hours(hours),
        }
    }
}

/// Kind of row, which decides the target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Observation,
    Forecast,
}

impl RowKind {
    pub fn table(&self) -> &'static str {
        match self {
            RowKind::Observation => OBSERVATIONS_TABLE,
            RowKind::Forecast => FORECASTS_TABLE,
        }
    }
}

/// ClickHouse column types used by measured fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Float32,
    Int32,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Float32 => "Float32",
            ColumnType::Int32 => "Int32",
        }
    }
}

/// One entry of a parameter mapping table: the WFS parameter name, the
/// column it lands in, and the setter applying a coerced value to a row.
pub struct ParameterMapping<R> {
    pub parameter: &'static str,
    pub column: &'static str,
    pub column_type: ColumnType,
    pub apply: fn(&mut R, f32),
}

/// A fixed-schema row built from WFS members and loaded into one table.
pub trait WeatherRow: Row + Serialize + Send + Sync + Sized + 'static {
    const KIND: RowKind;
    const STORED_QUERY: &'static str;

    /// Build an empty row; the header fields are fixed from here on
    fn new(
        location: &str,
        observation_time: DateTime<Utc>,
        creation_time: DateTime<Utc>,
    ) -> Self;

    /// Parameter table in request order
    fn mappings() -> &'static [ParameterMapping<Self>];

    /// Look up the mapping for a WFS parameter name
    fn mapping(parameter: &str) -> Option<&'static ParameterMapping<Self>> {
        Self::mappings().iter().find(|m| m.parameter == parameter)
    }

    /// Comma-separated `parameters` query value
    fn parameter_list() -> String {
        Self::mappings()
            .iter()
            .map(|m| m.parameter)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Measured weather at a station near `location`
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObservationRow {
    pub location: String,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub observation_time: DateTime<Utc>,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub creation_time: DateTime<Utc>,

    /// Pressure (msl), hPa
    pub pressure: f32,
    /// Precipitation amount (1h), mm
    pub precipitation_amount: f32,
    /// Precipitation intensity, mm/h
    pub precipitation_intensity: f32,
    /// Relative humidity, %
    pub relative_humidity: f32,
    /// Snow depth, cm
    pub snow_depth: f32,
    /// Air temperature, degC
    pub air_temperature: f32,
    /// Dew-point temperature, degC
    pub dewpoint: f32,
    /// Horizontal visibility, m
    pub visibility: f32,
    /// Wind direction (10 min avg), deg
    pub wind_direction: f32,
    /// Gust speed (10 min avg), m/s
    pub gust_speed: f32,
    /// Wind speed (10 min avg), m/s
    pub wind_speed: f32,
    pub smart_symbol: i32,
}

const OBSERVATION_PARAMETERS: &[ParameterMapping<ObservationRow>] = &[
    ParameterMapping {
        parameter: "p_sea",
        column: "Pressure",
        column_type: ColumnType::Float32,
        apply: |row, v| row.pressure = v,
    },
    ParameterMapping {
        parameter: "r_1h",
        column: "PrecipitationAmount",
        column_type: ColumnType::Float32,
        apply: |row, v| row.precipitation_amount = v,
    },
    ParameterMapping {
        parameter: "rh",
        column: "RelativeHumidity",
        column_type: ColumnType::Float32,
        apply: |row, v| row.relative_humidity = v,
    },
    ParameterMapping {
        parameter: "ri_10min",
        column: "PrecipitationIntensity",
        column_type: ColumnType::Float32,
        apply: |row, v| row.precipitation_intensity = v,
    },
    // Zero never overwrites a positive depth
    ParameterMapping {
        parameter: "snow_aws",
        column: "SnowDepth",
        column_type: ColumnType::Float32,
        apply: |row, v| {
            if v > 0.0 {
                row.snow_depth = v;
            }
        },
    },
    ParameterMapping {
        parameter: "t2m",
        column: "AirTemperature",
        column_type: ColumnType::Float32,
        apply: |row, v| row.air_temperature = v,
    },
    ParameterMapping {
        parameter: "td",
        column: "Dewpoint",
        column_type: ColumnType::Float32,
        apply: |row, v| row.dewpoint = v,
    },
    ParameterMapping {
        parameter: "vis",
        column: "Visibility",
        column_type: ColumnType::Float32,
        apply: |row, v| row.visibility = v,
    },
    ParameterMapping {
        parameter: "wd_10min",
        column: "WindDirection",
        column_type: ColumnType::Float32,
        apply: |row, v| row.wind_direction = v,
    },
    ParameterMapping {
        parameter: "wg_10min",
        column: "GustSpeed",
        column_type: ColumnType::Float32,
        apply: |row, v| row.gust_speed = v,
    },
    ParameterMapping {
        parameter: "ws_10min",
        column: "WindSpeed",
        column_type: ColumnType::Float32,
        apply: |row, v| row.wind_speed = v,
    },
    ParameterMapping {
        parameter: "SmartSymbol",
        column: "SmartSymbol",
        column_type: ColumnType::Int32,
        apply: |row, v| row.smart_symbol = v as i32,
    },
];

impl WeatherRow for ObservationRow {
    const KIND: RowKind = RowKind::Observation;
    const STORED_QUERY: &'static str = OBSERVATION_STORED_QUERY;

    fn new(
        location: &str,
        observation_time: DateTime<Utc>,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.to_string(),
            observation_time,
            creation_time,
            pressure: 0.0,
            precipitation_amount: 0.0,
            precipitation_intensity: 0.0,
            relative_humidity: 0.0,
            snow_depth: 0.0,
            air_temperature: 0.0,
            dewpoint: 0.0,
            visibility: 0.0,
            wind_direction: 0.0,
            gust_speed: 0.0,
            wind_speed: 0.0,
            smart_symbol: 0,
        }
    }

    fn mappings() -> &'static [ParameterMapping<Self>] {
        OBSERVATION_PARAMETERS
    }
}

/// Predicted weather for a future time at `location`
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForecastRow {
    pub location: String,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub observation_time: DateTime<Utc>,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub creation_time: DateTime<Utc>,

    pub pressure: f32,
    pub precipitation_amount: f32,
    pub relative_humidity: f32,
    pub air_temperature: f32,
    pub dewpoint: f32,
    pub wind_direction: f32,
    /// Hourly maximum gust, m/s
    pub gust_speed: f32,
    pub wind_speed: f32,
    pub smart_symbol: i32,
}

const FORECAST_PARAMETERS: &[ParameterMapping<ForecastRow>] = &[
    ParameterMapping {
        parameter: "Pressure",
        column: "Pressure",
        column_type: ColumnType::Float32,
        apply: |row, v| row.pressure = v,
    },
    ParameterMapping {
        parameter: "Precipitation1h",
        column: "PrecipitationAmount",
        column_type: ColumnType::Float32,
        apply: |row, v| row.precipitation_amount = v,
    },
    ParameterMapping {
        parameter: "Humidity",
        column: "RelativeHumidity",
        column_type: ColumnType::Float32,
        apply: |row, v| row.relative_humidity = v,
    },
    ParameterMapping {
        parameter: "Temperature",
        column: "AirTemperature",
        column_type: ColumnType::Float32,
        apply: |row, v| row.air_temperature = v,
    },
    ParameterMapping {
        parameter: "DewPoint",
        column: "Dewpoint",
        column_type: ColumnType::Float32,
        apply: |row, v| row.dewpoint = v,
    },
    ParameterMapping {
        parameter: "WindDirection",
        column: "WindDirection",
        column_type: ColumnType::Float32,
        apply: |row, v| row.wind_direction = v,
    },
    ParameterMapping {
        parameter: "HourlyMaximumGust",
        column: "GustSpeed",
        column_type: ColumnType::Float32,
        apply: |row, v| row.gust_speed = v,
    },
    ParameterMapping {
        parameter: "WindSpeedMS",
        column: "WindSpeed",
        column_type: ColumnType::Float32,
        apply: |row, v| row.wind_speed = v,
    },
    ParameterMapping {
        parameter: "SmartSymbol",
        column: "SmartSymbol",
        column_type: ColumnType::Int32,
        apply: |row, v| row.smart_symbol = v as i32,
    },
];

impl WeatherRow for ForecastRow {
    const KIND: RowKind = RowKind::Forecast;
    const STORED_QUERY: &'static str = FORECAST_STORED_QUERY;

    fn new(
        location: &str,
        observation_time: DateTime<Utc>,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.to_string(),
            observation_time,
            creation_time,
            pressure: 0.0,
            precipitation_amount: 0.0,
            relative_humidity: 0.0,
            air_temperature: 0.0,
            dewpoint: 0.0,
            wind_direction: 0.0,
            gust_speed: 0.0,
            wind_speed: 0.0,
            smart_symbol: 0,
        }
    }

    fn mappings() -> &'static [ParameterMapping<Self>] {
        FORECAST_PARAMETERS
    }
}

//! Fake weather feed shared by the collector tests

use crate::error::{CollectorError, Result};
use crate::models::{Member, RowKind, TimeWindow, WeatherRow};
use crate::normalize::normalize_at;
use crate::wfs::WeatherFeed;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use std::cell::RefCell;

/// One recorded fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    pub kind: RowKind,
    pub location: String,
    pub window: TimeWindow,
}

/// Feed returning canned members per row kind for every location
#[derive(Default)]
pub struct FakeFeed {
    pub observations: Vec<Member>,
    pub forecasts: Vec<Member>,
    /// Fail the fetch of this kind at this location with a service error
    pub fail_on: Option<(RowKind, &'static str)>,
    pub fetches: RefCell<Vec<Fetch>>,
}

impl FakeFeed {
    pub fn new() -> Self {
        Self {
            observations: vec![
                Member::new(hour(10), "t2m", "11.5"),
                Member::new(hour(10), "rh", "70"),
                Member::new(hour(11), "t2m", "12.0"),
            ],
            forecasts: vec![
                Member::new(hour(13), "Temperature", "13.0"),
                Member::new(hour(14), "Temperature", "13.5"),
                Member::new(hour(15), "Temperature", "12.5"),
            ],
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, kind: RowKind, location: &'static str) -> Self {
        self.fail_on = Some((kind, location));
        self
    }

    pub fn fetched_locations(&self) -> Vec<String> {
        self.fetches
            .borrow()
            .iter()
            .map(|f| f.location.clone())
            .collect()
    }
}

impl WeatherFeed for FakeFeed {
    async fn fetch<R: WeatherRow>(&self, location: &str, window: TimeWindow) -> Result<Vec<R>> {
        self.fetches.borrow_mut().push(Fetch {
            kind: R::KIND,
            location: location.to_string(),
            window,
        });

        if matches!(self.fail_on, Some((kind, place)) if kind == R::KIND && place == location) {
            return Err(CollectorError::Service {
                status: StatusCode::BAD_REQUEST,
                message: "No locations found for the place".to_string(),
            });
        }

        let members = match R::KIND {
            RowKind::Observation => &self.observations,
            RowKind::Forecast => &self.forecasts,
        };
        Ok(normalize_at(members, location, now()))
    }
}

pub fn hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 8, hour, 0, 0).unwrap()
}

/// Anchor time used for every run in these tests
pub fn now() -> DateTime<Utc> {
    hour(12)
}

pub fn locations(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

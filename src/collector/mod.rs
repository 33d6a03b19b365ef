//! Collection run orchestration.
//!
//! For every configured location, in order: fetch observations for the
//! trailing window and load them, then fetch forecasts for the leading
//! window and load them. The first failure ends the run; the error carries
//! the stage and location it happened in.

#[cfg(test)]
pub mod tests;

use crate::constants::COLLECTION_WINDOW_HOURS;
use crate::error::{Result, Stage};
use crate::loader::{BatchSink, load};
use crate::models::{ForecastRow, ObservationRow, TimeWindow, WeatherRow};
use crate::wfs::WeatherFeed;

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use std::time::{Duration, Instant};
use tracing::info;

/// Totals of a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub locations: usize,
    pub observation_rows: usize,
    pub forecast_rows: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.observation_rows + self.forecast_rows
    }
}

/// Drives a weather feed into a batch sink, one location at a time
pub struct Collector<'a, F, S> {
    feed: &'a F,
    sink: &'a S,
    database: String,
    progress: ProgressBar,
}

impl<'a, F, S> Collector<'a, F, S>
where
    F: WeatherFeed,
    S: BatchSink,
{
    /// `database` only names the target in error messages
    pub fn new(feed: &'a F, sink: &'a S, database: impl Into<String>) -> Self {
        Self {
            feed,
            sink,
            database: database.into(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-location progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Collect every location, anchoring both windows at `now`
    pub async fn run(&self, locations: &[String], now: DateTime<Utc>) -> Result<RunSummary> {
        let start_time = Instant::now();
        let observation_window = TimeWindow::trailing(now, COLLECTION_WINDOW_HOURS);
        let forecast_window = TimeWindow::leading(now, COLLECTION_WINDOW_HOURS);

        self.progress.set_length(locations.len() as u64);

        let mut summary = RunSummary::default();
        for location in locations {
            self.progress.set_message(location.clone());

            let (observations, forecasts) = match self
                .collect_location(location, observation_window, forecast_window)
                .await
            {
                Ok(counts) => counts,
                Err(e) => {
                    self.progress
                        .abandon_with_message(format!("Failed at {}", location));
                    return Err(e);
                }
            };

            info!(
                "{}: {} observations, {} forecasts",
                location, observations, forecasts
            );

            summary.locations += 1;
            summary.observation_rows += observations;
            summary.forecast_rows += forecasts;
            self.progress.inc(1);
        }

        self.progress.finish_with_message("Collection complete");
        summary.elapsed = start_time.elapsed();
        Ok(summary)
    }

    async fn collect_location(
        &self,
        location: &str,
        observation_window: TimeWindow,
        forecast_window: TimeWindow,
    ) -> Result<(usize, usize)> {
        let observations = self
            .collect::<ObservationRow>(location, observation_window)
            .await?;
        let forecasts = self.collect::<ForecastRow>(location, forecast_window).await?;
        Ok((observations, forecasts))
    }

    /// Fetch and load one row kind for one location
    async fn collect<R: WeatherRow>(&self, location: &str, window: TimeWindow) -> Result<usize> {
        let rows: Vec<R> = self
            .feed
            .fetch(location, window)
            .await
            .map_err(|e| e.at(Stage::Fetch(R::KIND), location))?;

        load(self.sink, &rows).await.map_err(|e| {
            e.at(
                Stage::Load {
                    kind: R::KIND,
                    database: self.database.clone(),
                },
                location,
            )
        })
    }
}

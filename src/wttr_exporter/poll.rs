// wttr_exporter - Prometheus metrics exporter for wttr.in
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::client::{FetchError, WttrClient};
use crate::extract::{self, ExtractionError, ObservationRecord};
use crate::journal::Journal;
use crate::metrics::WeatherMetrics;
use chrono::Local;
use std::error;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;

/// Why a poll cycle produced no published observation.
///
/// Both kinds take the same path afterwards (journal line, backoff sleep); they
/// are kept distinct so log output can tell a flaky network from an upstream
/// format change.
#[derive(Debug)]
pub enum CycleError {
    Fetch(FetchError),
    Extraction(ExtractionError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {}", e),
            Self::Extraction(e) => write!(f, "extraction failed: {}", e),
        }
    }
}

impl error::Error for CycleError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Extraction(e) => Some(e),
        }
    }
}

impl From<FetchError> for CycleError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<ExtractionError> for CycleError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

/// Drives the fetch-extract-publish cycle forever.
///
/// One cycle fully completes, sleep included, before the next begins; there are
/// never overlapping fetches. A successful cycle is followed by the refresh
/// interval, a failed one by the shorter backoff interval. No single bad cycle
/// ever ends the loop, only the shutdown signal does.
pub struct Poller {
    client: WttrClient,
    location: String,
    metrics: WeatherMetrics,
    journal: Journal,
    refresh: Duration,
    backoff: Duration,
}

impl Poller {
    pub fn new(
        client: WttrClient,
        location: String,
        metrics: WeatherMetrics,
        journal: Journal,
        refresh: Duration,
        backoff: Duration,
    ) -> Self {
        Poller {
            client,
            location,
            metrics,
            journal,
            refresh,
            backoff,
        }
    }

    /// Run cycles until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(message = "weather polling started", location = %self.location);

        loop {
            let delay = self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        tracing::info!("weather polling stopped");
    }

    /// Run a single cycle, record the outcome, and return the delay before the next one.
    async fn run_once(&mut self) -> Duration {
        let started = Local::now();

        match self.cycle().await {
            Ok(record) => {
                tracing::info!(
                    message = "fetched current conditions",
                    location = %self.location,
                    observed_at = %record.observed_at,
                );
                if let Err(e) = self.journal.success(&started, &record.observed_at) {
                    tracing::warn!(message = "unable to append to journal", error = %e);
                }
                self.refresh
            }
            Err(e) => {
                tracing::error!(
                    message = "failed to fetch current conditions",
                    location = %self.location,
                    error = %e,
                );
                if let Err(e) = self.journal.failure(&started) {
                    tracing::warn!(message = "unable to append to journal", error = %e);
                }
                self.backoff
            }
        }
    }

    async fn cycle(&mut self) -> Result<ObservationRecord, CycleError> {
        let doc = self.client.current(&self.location).await?;
        let record = extract::observation(&doc)?;
        self.metrics.observe(&record);
        Ok(record)
    }
}

#[cfg(test)]
mod test {
    use super::Poller;
    use crate::client::WttrClient;
    use crate::journal::Journal;
    use crate::metrics::WeatherMetrics;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REFRESH: Duration = Duration::from_secs(3600);
    const BACKOFF: Duration = Duration::from_secs(600);

    fn sample_body() -> serde_json::Value {
        serde_json::json!({
            "current_condition": [{
                "FeelsLikeC": "20",
                "cloudcover": "10",
                "humidity": "50",
                "precipMM": "0.0",
                "pressure": "1012",
                "temp_C": "22",
                "uvIndex": "4",
                "visibility": "10",
                "winddirDegree": "180",
                "windspeedKmph": "15",
                "localObsDateTime": "2024-01-01 12:00 PM"
            }]
        })
    }

    fn new_poller(base_url: &str, dir: &TempDir) -> (Poller, Registry, PathBuf) {
        let mut registry = Registry::default();
        let metrics = WeatherMetrics::new(&mut registry);
        let journal_path = dir.path().join("log");
        let journal = Journal::open(&journal_path).unwrap();
        let client = WttrClient::new(reqwest::Client::new(), base_url);
        let poller = Poller::new(client, "Berlin".to_owned(), metrics, journal, REFRESH, BACKOFF);

        (poller, registry, journal_path)
    }

    fn encoded(registry: &Registry) -> String {
        let mut buf = String::new();
        encode(&mut buf, registry).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_run_once_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Berlin"))
            .and(query_param("format", "j1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (mut poller, registry, journal_path) = new_poller(&server.uri(), &dir);

        let delay = poller.run_once().await;

        assert_eq!(REFRESH, delay);
        let out = encoded(&registry);
        assert!(out.contains("temperature_c 22.0"), "got: {}", out);

        let journal = fs::read_to_string(journal_path).unwrap();
        assert!(
            journal.ends_with("Last measurement has been taken at: 2024-01-01 12:00 PM\n"),
            "got: {}",
            journal,
        );
    }

    #[tokio::test]
    async fn test_run_once_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (mut poller, registry, journal_path) = new_poller(&server.uri(), &dir);

        let delay = poller.run_once().await;

        assert_eq!(BACKOFF, delay);
        let out = encoded(&registry);
        assert!(out.contains("temperature_c 0.0"), "got: {}", out);

        let journal = fs::read_to_string(journal_path).unwrap();
        assert!(journal.ends_with("Request failed\n"), "got: {}", journal);
    }

    #[tokio::test]
    async fn test_run_once_extraction_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"current_condition": []})),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (mut poller, _registry, journal_path) = new_poller(&server.uri(), &dir);

        let delay = poller.run_once().await;

        assert_eq!(BACKOFF, delay);
        let journal = fs::read_to_string(journal_path).unwrap();
        assert!(journal.ends_with("Request failed\n"), "got: {}", journal);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_stale_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let (mut poller, registry, journal_path) = new_poller(&server.uri(), &dir);

        assert_eq!(REFRESH, poller.run_once().await);
        assert_eq!(BACKOFF, poller.run_once().await);

        // Gauges keep the values of the last success
        let out = encoded(&registry);
        assert!(out.contains("temperature_c 22.0"), "got: {}", out);
        assert!(out.contains("atmospheric_humidity 50.0"), "got: {}", out);

        let journal = fs::read_to_string(journal_path).unwrap();
        let lines: Vec<&str> = journal.lines().collect();
        assert_eq!(2, lines.len());
        assert!(lines[0].ends_with("Last measurement has been taken at: 2024-01-01 12:00 PM"));
        assert!(lines[1].ends_with("Request failed"));
    }
}

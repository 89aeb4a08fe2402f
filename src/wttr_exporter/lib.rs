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

//! Prometheus metrics exporter for wttr.in
//!
//! ## Features
//!
//! `wttr_exporter` fetches current weather conditions for a single location from
//! [wttr.in] on a fixed interval and emits them as Prometheus gauges. When a poll
//! fails, whatever the reason, the exporter retries after a shorter backoff
//! interval and keeps serving the last successfully fetched values in the
//! meantime. The following metrics are emitted. All of them read `0` until the
//! first successful poll.
//!
//! * `temperature_feels_like_c` - Apparent temperature, in degrees celsius.
//! * `cloud_cover` - Cloud coverage, 0 is a clear sky.
//! * `atmospheric_humidity` - Relative humidity (0-100).
//! * `precipitation_mm` - Precipitation, in millimeters.
//! * `pressure_pa` - Atmospheric pressure.
//! * `temperature_c` - Temperature, in degrees celsius.
//! * `uv_index` - UV index.
//! * `atmospheric_visibility` - Atmospheric visibility.
//! * `winddirection_degree` - Wind direction, in degrees (0-360).
//! * `windspeed_kmph` - Wind speed, in km/h.
//!
//! Besides the metrics, every poll appends one line to an append-only journal
//! file (`log` in the working directory by default) and to standard output:
//! either the observation time reported by wttr.in or a note that the request
//! failed. The journal is never rotated.
//!
//! [wttr.in]: https://github.com/chubin/wttr.in
//!
//! ## Build
//!
//! `wttr_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/wttr_exporter.git && cd wttr_exporter
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! Pick a location the way you would on wttr.in itself: a city name, an airport
//! code, or anything else the `/:location` endpoint accepts.
//!
//! ```text
//! ./wttr_exporter --location Berlin
//! ```
//!
//! Successful polls repeat hourly, failed ones retry after ten minutes; both
//! intervals can be changed with `--refresh-secs` and `--backoff-secs`.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `9200` at `/metrics`. Once
//! `wttr_exporter` is running, configure scrapes of it by your Prometheus
//! server. Add the host running `wttr_exporter` as a target under the
//! Prometheus `scrape_configs` section as described by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     15s
//!   evaluation_interval: 15s
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: wttr_exporter
//!   static_configs:
//!   - targets: ['example:9200']
//! ```
//!

pub mod client;
pub mod extract;
pub mod http;
pub mod journal;
pub mod metrics;
pub mod poll;

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

use crate::extract::ObservationRecord;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

/// Holder for the gauges published from each `ObservationRecord`.
///
/// All gauges are created and registered upon call to `WeatherMetrics::new()`.
/// Values are only ever overwritten, never cleared: after a failed poll the
/// previous values stay visible to scrapers until the next success. Until the
/// first successful poll every gauge reads 0.
#[derive(Debug)]
pub struct WeatherMetrics {
    temperature_feels_like: Gauge<f64, AtomicU64>,
    cloud_cover: Gauge<f64, AtomicU64>,
    humidity: Gauge<f64, AtomicU64>,
    precipitation: Gauge<f64, AtomicU64>,
    pressure: Gauge<f64, AtomicU64>,
    temperature: Gauge<f64, AtomicU64>,
    uv_index: Gauge<f64, AtomicU64>,
    visibility: Gauge<f64, AtomicU64>,
    wind_direction: Gauge<f64, AtomicU64>,
    wind_speed: Gauge<f64, AtomicU64>,
}

impl WeatherMetrics {
    /// Create a new `WeatherMetrics` and register each gauge with the provided `Registry`.
    pub fn new(registry: &mut Registry) -> Self {
        let temperature_feels_like = Gauge::<f64, AtomicU64>::default();
        registry.register(
            "temperature_feels_like_c",
            "Apparent temperature in celsius",
            temperature_feels_like.clone(),
        );

        let cloud_cover = Gauge::<f64, AtomicU64>::default();
        registry.register("cloud_cover", "Cloud coverage, 0 is a clear sky", cloud_cover.clone());

        let humidity = Gauge::<f64, AtomicU64>::default();
        registry.register("atmospheric_humidity", "Relative humidity (0-100)", humidity.clone());

        let precipitation = Gauge::<f64, AtomicU64>::default();
        registry.register("precipitation_mm", "Precipitation in millimeters", precipitation.clone());

        let pressure = Gauge::<f64, AtomicU64>::default();
        registry.register("pressure_pa", "Atmospheric pressure", pressure.clone());

        let temperature = Gauge::<f64, AtomicU64>::default();
        registry.register("temperature_c", "Temperature in celsius", temperature.clone());

        let uv_index = Gauge::<f64, AtomicU64>::default();
        registry.register("uv_index", "UV index", uv_index.clone());

        let visibility = Gauge::<f64, AtomicU64>::default();
        registry.register("atmospheric_visibility", "Atmospheric visibility", visibility.clone());

        let wind_direction = Gauge::<f64, AtomicU64>::default();
        registry.register("winddirection_degree", "Wind direction in degrees", wind_direction.clone());

        let wind_speed = Gauge::<f64, AtomicU64>::default();
        registry.register("windspeed_kmph", "Wind speed in km/h", wind_speed.clone());

        Self {
            temperature_feels_like,
            cloud_cover,
            humidity,
            precipitation,
            pressure,
            temperature,
            uv_index,
            visibility,
            wind_direction,
            wind_speed,
        }
    }

    /// Overwrite every gauge with the values from the provided record.
    pub fn observe(&self, record: &ObservationRecord) {
        self.temperature_feels_like.set(record.feels_like_c);
        self.cloud_cover.set(record.cloud_cover);
        self.humidity.set(record.humidity);
        self.precipitation.set(record.precipitation_mm);
        self.pressure.set(record.pressure);
        self.temperature.set(record.temperature_c);
        self.uv_index.set(record.uv_index);
        self.visibility.set(record.visibility);
        self.wind_direction.set(record.wind_direction_degrees);
        self.wind_speed.set(record.wind_speed_kmph);
    }
}

#[cfg(test)]
mod test {
    use super::WeatherMetrics;
    use crate::extract::ObservationRecord;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;

    fn sample_record() -> ObservationRecord {
        ObservationRecord {
            feels_like_c: 20.0,
            cloud_cover: 10.0,
            humidity: 50.0,
            precipitation_mm: 0.0,
            pressure: 1012.0,
            temperature_c: 22.0,
            uv_index: 4.0,
            visibility: 10.0,
            wind_direction_degrees: 180.0,
            wind_speed_kmph: 15.0,
            observed_at: "2024-01-01 12:00 PM".to_owned(),
        }
    }

    fn encoded(registry: &Registry) -> String {
        let mut buf = String::new();
        encode(&mut buf, registry).unwrap();
        buf
    }

    #[test]
    fn test_unset_gauges_read_zero() {
        let mut registry = Registry::default();
        let _metrics = WeatherMetrics::new(&mut registry);

        let out = encoded(&registry);
        assert!(out.contains("temperature_c 0.0"), "got: {}", out);
        assert!(out.contains("windspeed_kmph 0.0"), "got: {}", out);
    }

    #[test]
    fn test_observe_readback() {
        let mut registry = Registry::default();
        let metrics = WeatherMetrics::new(&mut registry);

        metrics.observe(&sample_record());

        let out = encoded(&registry);
        assert!(out.contains("temperature_feels_like_c 20.0"), "got: {}", out);
        assert!(out.contains("cloud_cover 10.0"), "got: {}", out);
        assert!(out.contains("atmospheric_humidity 50.0"), "got: {}", out);
        assert!(out.contains("precipitation_mm 0.0"), "got: {}", out);
        assert!(out.contains("pressure_pa 1012.0"), "got: {}", out);
        assert!(out.contains("temperature_c 22.0"), "got: {}", out);
        assert!(out.contains("uv_index 4.0"), "got: {}", out);
        assert!(out.contains("atmospheric_visibility 10.0"), "got: {}", out);
        assert!(out.contains("winddirection_degree 180.0"), "got: {}", out);
        assert!(out.contains("windspeed_kmph 15.0"), "got: {}", out);
    }

    #[test]
    fn test_observe_overwrites_previous_values() {
        let mut registry = Registry::default();
        let metrics = WeatherMetrics::new(&mut registry);

        metrics.observe(&sample_record());
        let mut updated = sample_record();
        updated.temperature_c = -3.5;
        metrics.observe(&updated);

        let out = encoded(&registry);
        assert!(out.contains("temperature_c -3.5"), "got: {}", out);
        assert!(!out.contains("temperature_c 22.0"), "got: {}", out);
    }
}

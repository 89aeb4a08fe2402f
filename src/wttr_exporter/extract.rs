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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error;
use std::fmt;

const KEY_CURRENT_CONDITION: &str = "current_condition";

const FIELD_FEELS_LIKE_C: &str = "FeelsLikeC";
const FIELD_CLOUD_COVER: &str = "cloudcover";
const FIELD_HUMIDITY: &str = "humidity";
const FIELD_PRECIPITATION_MM: &str = "precipMM";
const FIELD_PRESSURE: &str = "pressure";
const FIELD_TEMPERATURE_C: &str = "temp_C";
const FIELD_UV_INDEX: &str = "uvIndex";
const FIELD_VISIBILITY: &str = "visibility";
const FIELD_WIND_DIR_DEGREE: &str = "winddirDegree";
const FIELD_WIND_SPEED_KMPH: &str = "windspeedKmph";
const FIELD_OBSERVED_AT: &str = "localObsDateTime";

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    MissingConditions,
    MissingField(&'static str),
    MalformedField(&'static str, String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingConditions => write!(f, "missing or empty {} entry", KEY_CURRENT_CONDITION),
            Self::MissingField(name) => write!(f, "missing field {}", name),
            Self::MalformedField(name, raw) => write!(f, "malformed field {}: {}", name, raw),
        }
    }
}

impl error::Error for ExtractionError {}

/// A single validated snapshot of current conditions for a location.
///
/// Either every field extracted cleanly or no record exists at all. `observed_at`
/// is the source's self-reported local observation time, passed through verbatim
/// for logging; it is never published as a metric.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub feels_like_c: f64,
    pub cloud_cover: f64,
    pub humidity: f64,
    pub precipitation_mm: f64,
    pub pressure: f64,
    pub temperature_c: f64,
    pub uv_index: f64,
    pub visibility: f64,
    pub wind_direction_degrees: f64,
    pub wind_speed_kmph: f64,
    pub observed_at: String,
}

/// Extract an `ObservationRecord` from a raw wttr.in JSON document.
///
/// The document is expected to carry a non-empty `current_condition` list whose
/// first element holds the eleven fields of interest. wttr.in encodes numbers as
/// JSON strings ("22"); plain JSON numbers are accepted too. Any missing or
/// unparseable field fails the extraction as a whole.
pub fn observation(doc: &Value) -> Result<ObservationRecord, ExtractionError> {
    let conditions = doc
        .get(KEY_CURRENT_CONDITION)
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .ok_or(ExtractionError::MissingConditions)?;

    Ok(ObservationRecord {
        feels_like_c: numeric_field(conditions, FIELD_FEELS_LIKE_C)?,
        cloud_cover: numeric_field(conditions, FIELD_CLOUD_COVER)?,
        humidity: numeric_field(conditions, FIELD_HUMIDITY)?,
        precipitation_mm: numeric_field(conditions, FIELD_PRECIPITATION_MM)?,
        pressure: numeric_field(conditions, FIELD_PRESSURE)?,
        temperature_c: numeric_field(conditions, FIELD_TEMPERATURE_C)?,
        uv_index: numeric_field(conditions, FIELD_UV_INDEX)?,
        visibility: numeric_field(conditions, FIELD_VISIBILITY)?,
        wind_direction_degrees: numeric_field(conditions, FIELD_WIND_DIR_DEGREE)?,
        wind_speed_kmph: numeric_field(conditions, FIELD_WIND_SPEED_KMPH)?,
        observed_at: string_field(conditions, FIELD_OBSERVED_AT)?,
    })
}

fn numeric_field(conditions: &Value, name: &'static str) -> Result<f64, ExtractionError> {
    let raw = conditions.get(name).ok_or(ExtractionError::MissingField(name))?;
    match raw {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ExtractionError::MalformedField(name, s.clone())),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExtractionError::MalformedField(name, raw.to_string())),
        _ => Err(ExtractionError::MalformedField(name, raw.to_string())),
    }
}

fn string_field(conditions: &Value, name: &'static str) -> Result<String, ExtractionError> {
    let raw = conditions.get(name).ok_or(ExtractionError::MissingField(name))?;
    raw.as_str()
        .map(String::from)
        .ok_or_else(|| ExtractionError::MalformedField(name, raw.to_string()))
}

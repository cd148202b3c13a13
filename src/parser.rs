//! JSON payload normalization for the air-quality service.
//!
//! The service returns the same quantity under different names depending on
//! the endpoint (`pm25`, `pm2_5`, `value`; `temperature`, `tp`; ...) and
//! numbers either as JSON numbers or as strings (history rows come from a
//! CSV file). Everything is coalesced here into [`Reading`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::PayloadError;
use crate::reading::{Measurement, Reading};
use crate::services::air_quality_api::{Pollution24h, ServiceInfo};

/// The quantity a bare `value` key stands for in a series point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Pm25,
    Temperature,
}

const PM25_KEYS: &[&str] = &["pm25", "pm2_5"];
const PM10_KEYS: &[&str] = &["pm10"];
const TEMPERATURE_KEYS: &[&str] = &["temperature", "tp"];
const HUMIDITY_KEYS: &[&str] = &["humidity", "hu"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "ts"];

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Returns the value of the first key in `keys` that is present and not null.
fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Coerces a JSON number or numeric string into a finite measurement.
pub fn coerce_number(value: Option<&Value>) -> Measurement {
    match value {
        Some(Value::Number(n)) => n.as_f64().map(Measurement::new).unwrap_or_default(),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Measurement::new)
            .unwrap_or_default(),
        _ => Measurement::INVALID,
    }
}

/// Parses an ISO-8601 timestamp; a missing offset is read as UTC. Numbers
/// are read as Unix seconds.
pub fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                        .ok()
                        .map(|naive| naive.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalizes one reading-like object.
pub fn parse_reading(value: &Value, kind: ValueKind) -> Result<Reading, PayloadError> {
    let obj = value
        .as_object()
        .ok_or_else(|| PayloadError::NotAnObject(kind_of(value)))?;

    let bare = obj.get("value").filter(|v| !v.is_null());

    let pm25 = match (first_present(obj, PM25_KEYS), kind) {
        (Some(v), _) => Some(v),
        (None, ValueKind::Pm25) => bare,
        (None, ValueKind::Temperature) => None,
    };
    let temperature = match (first_present(obj, TEMPERATURE_KEYS), kind) {
        (Some(v), _) => Some(v),
        (None, ValueKind::Temperature) => bare,
        (None, ValueKind::Pm25) => None,
    };

    Ok(Reading {
        timestamp: parse_timestamp(first_present(obj, TIMESTAMP_KEYS)),
        city: non_empty_string(obj.get("city")),
        state: non_empty_string(obj.get("state")),
        pm25: coerce_number(pm25),
        pm10: coerce_number(first_present(obj, PM10_KEYS)),
        temperature: coerce_number(temperature),
        humidity: coerce_number(first_present(obj, HUMIDITY_KEYS)),
    })
}

/// Parses the `data` array of a history-style body.
pub fn parse_readings(body: &Value, kind: ValueKind) -> Result<Vec<Reading>, PayloadError> {
    let obj = body
        .as_object()
        .ok_or_else(|| PayloadError::NotAnObject(kind_of(body)))?;
    let data = obj
        .get("data")
        .and_then(Value::as_array)
        .ok_or(PayloadError::MissingArray("data"))?;

    data.iter().map(|row| parse_reading(row, kind)).collect()
}

/// Parses a catalog list: either plain strings or single-key objects such
/// as `{"country": "Brazil"}`.
pub fn parse_name_list(body: &Value, key: &str) -> Result<Vec<String>, PayloadError> {
    let items = body
        .as_array()
        .ok_or_else(|| PayloadError::NotANameList(kind_of(body)))?;

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Object(obj) => obj
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(PayloadError::NotANameList("an object without a name")),
            other => Err(PayloadError::NotANameList(kind_of(other))),
        })
        .collect()
}

pub fn parse_service_info(body: &Value) -> Result<ServiceInfo, PayloadError> {
    let obj = body
        .as_object()
        .ok_or_else(|| PayloadError::NotAnObject(kind_of(body)))?;

    Ok(ServiceInfo {
        message: non_empty_string(obj.get("message")),
        version: non_empty_string(obj.get("version")),
        raw: body.clone(),
    })
}

/// Parses the `/cities/{city}/pollution/24h` body. `fallback_city` is used
/// when the service omits the resolved name.
pub fn parse_pollution(body: &Value, fallback_city: &str) -> Result<Pollution24h, PayloadError> {
    let data = parse_readings(body, ValueKind::Pm25)?;

    Ok(Pollution24h {
        city: non_empty_string(body.get("city")).unwrap_or_else(|| fallback_city.to_string()),
        country: non_empty_string(body.get("country")),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_coerce_number_variants() {
        assert_eq!(coerce_number(Some(&json!(20))).value(), Some(20.0));
        assert_eq!(coerce_number(Some(&json!("20"))).value(), Some(20.0));
        assert_eq!(coerce_number(Some(&json!(" 18.5 "))).value(), Some(18.5));
        assert!(!coerce_number(Some(&json!("bad"))).is_valid());
        assert!(!coerce_number(Some(&json!(""))).is_valid());
        assert!(!coerce_number(Some(&json!("NaN"))).is_valid());
        assert!(!coerce_number(Some(&json!("inf"))).is_valid());
        assert!(!coerce_number(Some(&Value::Null)).is_valid());
        assert!(!coerce_number(None).is_valid());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(
            parse_timestamp(Some(&json!("2025-03-01T12:00:00Z"))),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(Some(&json!("2025-03-01T09:00:00-03:00"))),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(Some(&json!("2025-03-01T12:00:00.000"))),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(Some(&json!(expected.timestamp()))),
            Some(expected)
        );
        assert_eq!(parse_timestamp(Some(&json!("yesterday"))), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn test_parse_reading_prefers_specific_names() {
        let row = json!({
            "timestamp": "2025-03-01T12:00:00Z",
            "value": 99,
            "pm25": 12.5,
            "pm2_5": 50,
            "tp": 30,
            "temperature": "21.5",
            "hu": 70
        });
        let reading = parse_reading(&row, ValueKind::Pm25).unwrap();

        assert_eq!(reading.pm25.value(), Some(12.5));
        assert_eq!(reading.temperature.value(), Some(21.5));
        assert_eq!(reading.humidity.value(), Some(70.0));
        assert!(!reading.pm10.is_valid());
    }

    #[test]
    fn test_parse_reading_bare_value() {
        let row = json!({"timestamp": "2025-03-01T12:00:00Z", "value": 33});

        let as_pm = parse_reading(&row, ValueKind::Pm25).unwrap();
        assert_eq!(as_pm.pm25.value(), Some(33.0));
        assert!(!as_pm.temperature.is_valid());

        let as_temp = parse_reading(&row, ValueKind::Temperature).unwrap();
        assert_eq!(as_temp.temperature.value(), Some(33.0));
        assert!(!as_temp.pm25.is_valid());
    }

    #[test]
    fn test_parse_reading_null_falls_through_to_next_name() {
        let row = json!({"pm25": null, "pm2_5": 8.0});
        let reading = parse_reading(&row, ValueKind::Pm25).unwrap();
        assert_eq!(reading.pm25.value(), Some(8.0));
    }

    #[test]
    fn test_parse_reading_csv_row() {
        let row = json!({
            "timestamp": "2025-03-01T12:00:00.000Z",
            "city": "Curitiba",
            "state": "Parana",
            "country": "Brazil",
            "pm25": "",
            "temperature": "17",
            "humidity": "82",
            "aqi": ""
        });
        let reading = parse_reading(&row, ValueKind::Pm25).unwrap();

        assert_eq!(reading.city.as_deref(), Some("Curitiba"));
        assert_eq!(reading.state.as_deref(), Some("Parana"));
        assert!(!reading.pm25.is_valid());
        assert_eq!(reading.temperature.value(), Some(17.0));
    }

    #[test]
    fn test_parse_reading_rejects_non_object() {
        assert!(matches!(
            parse_reading(&json!([1, 2]), ValueKind::Pm25),
            Err(PayloadError::NotAnObject("an array"))
        ));
    }

    #[test]
    fn test_parse_readings_requires_data() {
        assert!(matches!(
            parse_readings(&json!({"city": "Curitiba"}), ValueKind::Pm25),
            Err(PayloadError::MissingArray("data"))
        ));
        assert!(matches!(
            parse_readings(&json!({"data": {"pm25": 1}}), ValueKind::Pm25),
            Err(PayloadError::MissingArray("data"))
        ));

        let rows = parse_readings(&json!({"data": [{"pm25": 1}, {"pm25": "2"}]}), ValueKind::Pm25)
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_parse_name_list_shapes() {
        assert_eq!(
            parse_name_list(&json!(["Brazil", "Chile"]), "country").unwrap(),
            vec!["Brazil", "Chile"]
        );
        assert_eq!(
            parse_name_list(&json!([{"state": "Parana"}, {"state": "Bahia"}]), "state").unwrap(),
            vec!["Parana", "Bahia"]
        );
        assert!(parse_name_list(&json!({"data": []}), "city").is_err());
        assert!(parse_name_list(&json!([{"name": "x"}]), "city").is_err());
    }

    #[test]
    fn test_parse_pollution_uses_service_city() {
        let body = json!({
            "city": "Curitiba",
            "country": "BR",
            "data": [{"timestamp": "2025-03-01T12:00:00+00:00", "pm25": 4.1, "pm10": 7.9}]
        });
        let pollution = parse_pollution(&body, "curitiba").unwrap();

        assert_eq!(pollution.city, "Curitiba");
        assert_eq!(pollution.country.as_deref(), Some("BR"));
        assert_eq!(pollution.data[0].pm10.value(), Some(7.9));
    }
}

//! Forgiving deserializers for numeric and timestamp fields.
//!
//! Inputs and imported snapshots arrive from browsers and spreadsheets, so a
//! missing, `null`, textual or non-finite number collapses to zero instead of
//! rejecting the whole payload. Unreadable dates and enum tags fall back the
//! same way, with a warning.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|number| number.is_finite())
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value).unwrap_or(0.0))
}

pub(crate) fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn coerce_count(value: &Value) -> f64 {
    let number = coerce_number(value).unwrap_or(0.0);
    if number <= 0.0 {
        0.0
    } else {
        number.min(f64::from(u32::MAX)).floor()
    }
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value) as u32)
}

/// Period offsets and lengths.
pub(crate) fn index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value) as usize)
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp; blank or unreadable text is `None`.
pub(crate) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Null => return Ok(None),
        Value::String(raw) if raw.trim().is_empty() => return Ok(None),
        Value::String(raw) => raw.trim(),
        other => {
            warn!(value = %other, "ignoring non-text date");
            return Ok(None);
        }
    };

    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|stamp| stamp.date_naive())
    });
    if parsed.is_none() {
        warn!(value = raw, "ignoring unreadable date");
    }
    Ok(parsed)
}

/// Unknown tags resolve to `T::default()`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match T::deserialize(&value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!(value = %value, %err, "unrecognised value; using default");
            Ok(T::default())
        }
    }
}

pub(crate) fn series<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .iter()
            .map(|item| coerce_number(item).unwrap_or(0.0))
            .collect(),
        _ => Vec::new(),
    })
}

/// RFC 3339 timestamps; anything unreadable is stamped with the current time.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|stamp| stamp.with_timezone(&Utc));
    Ok(parsed.unwrap_or_else(Utc::now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Loose {
        #[serde(default, deserialize_with = "number")]
        amount: f64,
        #[serde(default, deserialize_with = "optional_number")]
        rate: Option<f64>,
        #[serde(default, deserialize_with = "count")]
        months: u32,
        #[serde(default, deserialize_with = "series")]
        trace: Vec<f64>,
    }

    #[test]
    fn missing_and_null_fields_collapse_to_defaults() {
        let loose: Loose = serde_json::from_str(r#"{"amount": null}"#).expect("payload parses");
        assert_eq!(loose.amount, 0.0);
        assert_eq!(loose.rate, None);
        assert_eq!(loose.months, 0);
        assert!(loose.trace.is_empty());
    }

    #[test]
    fn textual_numbers_are_parsed() {
        let loose: Loose = serde_json::from_str(
            r#"{"amount": "1250.5", "rate": "8", "months": 24.9, "trace": [1, "2", null, "x"]}"#,
        )
        .expect("payload parses");
        assert_eq!(loose.amount, 1250.5);
        assert_eq!(loose.rate, Some(8.0));
        assert_eq!(loose.months, 24);
        assert_eq!(loose.trace, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[derive(Debug, Deserialize)]
    struct Dated {
        #[serde(default, deserialize_with = "optional_date")]
        on: Option<NaiveDate>,
        #[serde(default, deserialize_with = "index")]
        offset: usize,
        #[serde(default, deserialize_with = "or_default")]
        mode: Mode,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    enum Mode {
        #[default]
        Even,
        Phased,
    }

    #[test]
    fn dates_accept_plain_and_rfc3339_text() {
        let dated: Dated = serde_json::from_str(r#"{"on": "2026-12-01"}"#).expect("parses");
        assert_eq!(dated.on, NaiveDate::from_ymd_opt(2026, 12, 1));

        let dated: Dated =
            serde_json::from_str(r#"{"on": "2026-12-01T10:00:00Z"}"#).expect("parses");
        assert_eq!(dated.on, NaiveDate::from_ymd_opt(2026, 12, 1));
    }

    #[test]
    fn unreadable_dates_become_none() {
        let documents = [
            r#"{"on": ""}"#,
            r#"{"on": "2025-13-40"}"#,
            r#"{"on": "soon"}"#,
            r#"{"on": 7}"#,
            r#"{"on": null}"#,
        ];
        for document in documents {
            let dated: Dated = serde_json::from_str(document).expect("parses");
            assert_eq!(dated.on, None, "{document}");
        }
    }

    #[test]
    fn offsets_and_tags_degrade_to_defaults() {
        let dated: Dated =
            serde_json::from_str(r#"{"offset": "3", "mode": "phased"}"#).expect("parses");
        assert_eq!(dated.offset, 3);
        assert_eq!(dated.mode, Mode::Phased);

        let dated: Dated =
            serde_json::from_str(r#"{"offset": -2, "mode": "staggered"}"#).expect("parses");
        assert_eq!(dated.offset, 0);
        assert_eq!(dated.mode, Mode::Even);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let loose: Loose = serde_json::from_str(r#"{"months": -3}"#).expect("payload parses");
        assert_eq!(loose.months, 0);
    }

    #[derive(Debug, Deserialize)]
    struct Stamped {
        #[serde(deserialize_with = "timestamp")]
        at: DateTime<Utc>,
    }

    #[test]
    fn timestamps_parse_rfc3339_and_fall_back_to_now() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"at": "2025-04-01T09:30:00+03:00"}"#).expect("parses");
        assert_eq!(stamped.at.to_rfc3339(), "2025-04-01T06:30:00+00:00");

        let before = Utc::now();
        let stamped: Stamped = serde_json::from_str(r#"{"at": 17}"#).expect("parses");
        assert!(stamped.at >= before);
    }
}

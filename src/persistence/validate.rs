//! Field-by-field validation of persisted timer records

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::state::{Timer, TimerId};

/// Decode a slot payload, dropping records that fail validation.
///
/// Anything other than a JSON array decodes to an empty list.
pub fn decode_timers(raw: &str) -> Vec<Timer> {
    let Ok(Value::Array(records)) = serde_json::from_str::<Value>(raw) else {
        tracing::warn!("Stored timers are not a JSON array, starting empty");
        return Vec::new();
    };
    let total = records.len();
    let timers: Vec<Timer> = records.iter().filter_map(validate_record).collect();
    if timers.len() != total {
        tracing::debug!("Dropped {} malformed timer records", total - timers.len());
    }
    timers
}

/// Validate one record and normalize it to the timer invariants
pub fn validate_record(value: &Value) -> Option<Timer> {
    let record = value.as_object()?;

    let id = TimerId::parse(record.get("id")?.as_str()?)?;
    let duration = whole_seconds(record.get("duration")?)?;
    let remaining = whole_seconds(record.get("remaining")?)?;
    let created_at = timestamp(record.get("createdAt")?)?;
    let running = match record.get("running") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return None,
    };

    let ends_at = record.get("endsAt").and_then(timestamp);
    // A running record needs a target end time and something left to count
    let running = running && ends_at.is_some() && remaining > 0;

    Some(Timer {
        id,
        recipe_id: recipe_id(record),
        step_index: record
            .get("stepIndex")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        label: record.get("label").and_then(Value::as_str).map(str::to_string),
        duration,
        remaining,
        running,
        created_at,
        ends_at: if running { ends_at } else { None },
    })
}

/// Numbers or numeric strings, floored and clamped to >= 0
fn whole_seconds(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(if n > 0.0 { n.floor() as u64 } else { 0 })
}

/// RFC 3339, plus the signed extended years chrono writes past 9999
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str()?.parse::<DateTime<Utc>>().ok()
}

/// Recipe ids are opaque; numeric ids are kept as their decimal string
fn recipe_id(record: &Map<String, Value>) -> Option<String> {
    match record.get("recipeId")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "t1",
            "recipeId": "r9",
            "stepIndex": 3,
            "label": "Simmer",
            "duration": 300,
            "remaining": 120,
            "running": true,
            "createdAt": "2024-05-01T12:00:00Z",
            "endsAt": "2024-05-01T12:05:00Z"
        })
    }

    #[test]
    fn accepts_a_complete_record() {
        let timer = validate_record(&valid()).unwrap();
        assert_eq!(timer.id.as_str(), "t1");
        assert_eq!(timer.recipe_id.as_deref(), Some("r9"));
        assert_eq!(timer.step_index, Some(3));
        assert_eq!(timer.remaining, 120);
        assert!(timer.running);
        assert!(timer.ends_at.is_some());
    }

    #[test]
    fn coerces_numeric_strings_and_fractions() {
        let mut record = valid();
        record["duration"] = json!("90.9");
        record["remaining"] = json!(-3);
        record["recipeId"] = json!(17);
        let timer = validate_record(&record).unwrap();
        assert_eq!(timer.duration, 90);
        assert_eq!(timer.remaining, 0);
        assert_eq!(timer.recipe_id.as_deref(), Some("17"));
        // Zero remaining always loads stopped
        assert!(!timer.running);
        assert!(timer.ends_at.is_none());
    }

    #[test]
    fn rejects_malformed_required_fields() {
        for (field, bad) in [
            ("id", json!("")),
            ("id", json!(5)),
            ("duration", json!("soon")),
            ("remaining", json!(null)),
            ("createdAt", json!("yesterday")),
            ("running", json!("yes")),
        ] {
            let mut record = valid();
            record[field] = bad;
            assert!(validate_record(&record).is_none(), "{field} should be rejected");
        }
        assert!(validate_record(&json!("not an object")).is_none());
    }

    #[test]
    fn running_without_ends_at_loads_paused() {
        let mut record = valid();
        record["endsAt"] = json!(null);
        let timer = validate_record(&record).unwrap();
        assert!(!timer.running);
        assert_eq!(timer.remaining, 120);
    }

    #[test]
    fn paused_record_drops_stale_ends_at() {
        let mut record = valid();
        record["running"] = json!(false);
        let timer = validate_record(&record).unwrap();
        assert!(timer.ends_at.is_none());
    }

    #[test]
    fn decode_skips_bad_records_and_non_arrays() {
        let payload = json!([valid(), {"id": "broken"}]).to_string();
        assert_eq!(decode_timers(&payload).len(), 1);
        assert!(decode_timers("{\"timers\": []}").is_empty());
        assert!(decode_timers("not json").is_empty());
    }

    #[test]
    fn far_future_end_time_survives_a_round_trip() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();
        let mut timer = Timer::new(1_000_000_000_000, Default::default(), None, now);
        timer.running = true;
        timer.ends_at = Some(Utc.with_ymd_and_hms(33714, 12, 9, 19, 46, 40).unwrap());

        let restored = validate_record(&serde_json::to_value(&timer).unwrap()).unwrap();
        assert!(restored.running);
        assert_eq!(restored.ends_at, timer.ends_at);
    }
}

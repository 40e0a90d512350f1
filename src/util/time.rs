use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson;

/// Rounds up to the next whole millisecond, the precision scores are persisted at.
/// A stamp taken at `t` therefore never reads back as earlier than `t`.
pub fn ceil_to_millis(date_time: DateTime<Utc>) -> DateTime<Utc> {
    let mut millis = date_time.timestamp_millis();
    if date_time.timestamp_subsec_nanos() % 1_000_000 != 0 {
        millis += 1;
    }
    Utc.timestamp_millis_opt(millis).single().unwrap_or(date_time)
}

pub fn to_bson_datetime(date_time: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(date_time.timestamp_millis())
}

pub fn from_bson_datetime(date_time: bson::DateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(date_time.timestamp_millis()).single()
}

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ChartError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Parses `YYYY-MM-DD` + `HH:MM` as wall-clock time in `tz` and returns the UTC instant.
///
/// Ambiguous local times (clocks falling back) resolve to the earlier
/// instant. Local times skipped by a forward transition are read with the
/// offset that was in force just before the gap.
pub fn local_to_utc(date: &str, time: &str, tz: Tz) -> Result<DateTime<Utc>, ChartError> {
    let naive = parse_naive(date, time)?;
    Ok(match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => local.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let before_gap = naive - Duration::hours(24);
            let offset = match tz.offset_from_local_datetime(&before_gap) {
                LocalResult::Single(offset) | LocalResult::Ambiguous(offset, _) => offset.fix(),
                LocalResult::None => tz.offset_from_utc_datetime(&naive).fix(),
            };
            let utc = naive - Duration::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    })
}

pub fn parse_naive(date: &str, time: &str) -> Result<NaiveDateTime, ChartError> {
    let text = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&text, &format!("{} {}", DATE_FORMAT, TIME_FORMAT)).map_err(
        |_| ChartError::InvalidDateTime {
            date: date.to_string(),
            time: time.to_string(),
        },
    )
}

/// Parses an IANA timezone identifier.
pub fn parse_timezone(id: &str) -> Option<Tz> {
    id.parse::<Tz>().ok()
}

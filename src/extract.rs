//! Best-effort recovery of birth data from casual text.
//!
//! Date and time are found by ordered lists of matchers. The first fragment
//! found by the highest-priority matcher decides: if it does not normalize,
//! there is no result. Whatever text is left over names the place.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::time::{DATE_FORMAT, TIME_FORMAT};

/// Normalized birth data: `YYYY-MM-DD`, 24-hour `HH:MM`, free-text place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthData {
    pub date: String,
    pub time: String,
    pub place: String,
}

/// A matcher's hit: the exact text it consumed and the value it parsed.
#[derive(Debug, Clone, PartialEq)]
struct Found<T> {
    text: String,
    value: T,
}

struct Matcher<T> {
    regex: Regex,
    parse: fn(&Captures) -> Option<T>,
}

impl<T> Matcher<T> {
    fn new(pattern: &str, parse: fn(&Captures) -> Option<T>) -> Self {
        Matcher {
            regex: Regex::new(pattern).expect("matcher pattern must compile"),
            parse,
        }
    }
}

/// First hit of the highest-priority matcher whose pattern occurs in `text`.
/// A hit that fails to parse ends the search; later fragments are not tried.
fn first_match<T>(matchers: &[Matcher<T>], text: &str) -> Option<Found<T>> {
    let (matcher, caps) = matchers
        .iter()
        .find_map(|matcher| matcher.regex.captures(text).map(|caps| (matcher, caps)))?;
    Some(Found {
        text: caps.get(0)?.as_str().to_string(),
        value: (matcher.parse)(&caps)?,
    })
}

// ---------------------------
// ## Dates
// ---------------------------

static DATE_MATCHERS: Lazy<Vec<Matcher<NaiveDate>>> = Lazy::new(|| {
    vec![
        // 1992-10-28
        Matcher::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b", |c| {
            ymd(&c[1], &c[2], &c[3])
        }),
        // 10/28/1992
        Matcher::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b", |c| {
            ymd(&c[3], &c[1], &c[2])
        }),
        // 10-28-1992
        Matcher::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b", |c| {
            ymd(&c[3], &c[1], &c[2])
        }),
        // October 28, 1992 / oct. 28th 1992
        Matcher::new(
            r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
            |c| {
                let month = month_number(&c[1])?;
                ymd(&c[3], &month.to_string(), &c[2])
            },
        ),
    ]
});

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

// ---------------------------
// ## Times
// ---------------------------

static TIME_MATCHERS: Lazy<Vec<Matcher<NaiveTime>>> = Lazy::new(|| {
    vec![
        // 22:30, 10:30 PM, 7:05am
        Matcher::new(r"(?i)\b(\d{1,2}):(\d{2})\b(?:\s*([ap])\.?m\b\.?)?", |c| {
            clock(&c[1], &c[2], c.get(3).map(|m| m.as_str()))
        }),
        // 7 pm, 11AM
        Matcher::new(r"(?i)\b(\d{1,2})\s*([ap])\.?m\b\.?", |c| {
            clock(&c[1], "0", Some(&c[2]))
        }),
    ]
});

fn clock(hour: &str, minute: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let hour = match meridiem.map(|m| m.to_ascii_lowercase()) {
        None => hour,
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(m) if m == "p" => hour % 12 + 12,
        Some(_) => hour % 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

// ---------------------------
// ## Place
// ---------------------------

/// Comma-separated words at the end of the text: "Lexington, KY", "Los Angeles, CA, USA".
static TRAILING_PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{L}+(?:[ .'-]+\p{L}+)*(?:,\s*\p{L}+(?:[ .'-]+\p{L}+)*)+)[\s,.;:!?-]*$")
        .expect("place pattern must compile")
});

/// Words that introduce a place in a sentence ("born in Tokyo, Japan").
///
/// "near" is not one of them: "near Austin, TX" names a different place than
/// "Austin, TX", so it stays part of the place text.
const CONNECTIVES: [&str; 5] = ["born", "in", "at", "on", "from"];

fn is_connective(word: &str) -> bool {
    CONNECTIVES.contains(&word.to_lowercase().as_str())
}

fn place_from(remainder: &str) -> Option<String> {
    let collapsed = remainder.split_whitespace().collect::<Vec<_>>().join(" ");
    let candidate = match TRAILING_PLACE.captures(&collapsed) {
        Some(caps) => caps[1].to_string(),
        None => collapsed
            .trim_matches(|c: char| c.is_whitespace() || " ,;-:".contains(c))
            .to_string(),
    };

    let mut words: Vec<&str> = candidate.split_whitespace().collect();
    while words.last().is_some_and(|w| is_connective(w)) {
        words.pop();
    }
    // keep what follows the last connective before the first comma, provided
    // a real word follows it
    let boundary = words
        .iter()
        .position(|w| w.contains(','))
        .unwrap_or(words.len());
    let start = (0..boundary)
        .rev()
        .find(|&i| is_connective(words[i]) && words[i + 1..].iter().any(|w| !is_connective(w)))
        .map_or(0, |i| i + 1);
    let place = words[start..].join(" ");

    let place = if place.chars().count() >= 2 { place } else { candidate };
    (place.chars().count() >= 2).then_some(place)
}

/// Pulls a date, a time and a place out of `text`.
///
/// Returns `None` unless all three are present and valid; a missing date or
/// time never produces a partial result.
pub fn extract_birth_data(text: &str) -> Option<BirthData> {
    let date = first_match(&DATE_MATCHERS, text)?;
    let remainder = text.replacen(&date.text, "", 1);
    let time = first_match(&TIME_MATCHERS, &remainder)?;
    let remainder = remainder.replacen(&time.text, "", 1);
    let place = place_from(&remainder)?;

    Some(BirthData {
        date: date.value.format(DATE_FORMAT).to_string(),
        time: time.value.format(TIME_FORMAT).to_string(),
        place,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<(String, String, String)> {
        extract_birth_data(text).map(|b| (b.date, b.time, b.place))
    }

    fn triple(date: &str, time: &str, place: &str) -> Option<(String, String, String)> {
        Some((date.into(), time.into(), place.into()))
    }

    #[test]
    fn test_iso_date_with_24_hour_time() {
        assert_eq!(
            extract("1992-10-28, 22:30, Lexington, KY"),
            triple("1992-10-28", "22:30", "Lexington, KY")
        );
    }

    #[test]
    fn test_no_birth_data() {
        assert_eq!(extract("hello there"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn test_missing_date_or_time_gives_nothing() {
        assert_eq!(extract("1992-10-28 in Lexington, KY"), None);
        assert_eq!(extract("born at 10:30 PM in Paris, France"), None);
    }

    #[test]
    fn test_month_name_dates_are_normalized() {
        assert_eq!(
            extract("October 28, 1992, 10:30 PM, Paris, France"),
            triple("1992-10-28", "22:30", "Paris, France")
        );
        assert_eq!(
            extract("I was born on march 5th 1988 at 7am in Tokyo, Japan"),
            triple("1988-03-05", "07:00", "Tokyo, Japan")
        );
    }

    #[test]
    fn test_us_style_dates() {
        assert_eq!(
            extract("3/15/1990 2:30 pm Austin, TX"),
            triple("1990-03-15", "14:30", "Austin, TX")
        );
        assert_eq!(
            extract("03-15-1990 12:05 AM Los Angeles, CA, USA"),
            triple("1990-03-15", "00:05", "Los Angeles, CA, USA")
        );
    }

    #[test]
    fn test_meridiem_edges() {
        assert_eq!(extract("2000-01-01 12 pm London").unwrap().1, "12:00");
        assert_eq!(extract("2000-01-01 12:45 a.m. London").unwrap().1, "00:45");
        assert_eq!(extract("2000-01-01 13:00 pm London"), None);
    }

    #[test]
    fn test_invalid_fragments_are_rejected() {
        assert_eq!(extract("1990-02-30 10:00 Austin, TX"), None);
        assert_eq!(extract("1990-03-15 24:10 Austin, TX"), None);
        assert_eq!(extract("1990-03-15 10:75 Austin, TX"), None);
    }

    #[test]
    fn test_place_fallback_and_minimum_length() {
        assert_eq!(
            extract("1990-03-15 14:30 Berlin"),
            triple("1990-03-15", "14:30", "Berlin")
        );
        assert_eq!(extract("1990-03-15 14:30 X"), None);
        assert_eq!(extract("1990-03-15 14:30"), None);
    }

    #[test]
    fn test_place_between_date_and_time() {
        assert_eq!(
            extract("born 1990-03-15 in Berlin at 14:30"),
            triple("1990-03-15", "14:30", "Berlin")
        );
        assert_eq!(
            extract("born on 1990-03-15 in Tokyo, Japan at 7 am"),
            triple("1990-03-15", "07:00", "Tokyo, Japan")
        );
    }

    #[test]
    fn test_only_connectives_left_keeps_remainder() {
        assert_eq!(
            extract("1990-03-15 14:30 in"),
            triple("1990-03-15", "14:30", "in")
        );
    }

    #[test]
    fn test_first_fragment_decides() {
        // an invalid first time is not replaced by a later valid one
        assert_eq!(extract("1990-03-15 25:00 or 3 pm Austin, TX"), None);
        assert_eq!(extract("1990-02-30 or 1990-03-01 14:00 Austin, TX"), None);
        // nor by a lower-priority date shape
        assert_eq!(extract("1990-13-01 or 3/1/1990 14:00 Austin, TX"), None);
    }

    #[test]
    fn test_accented_place_names() {
        assert_eq!(
            extract("1990-03-15 14:30 Zürich, Switzerland"),
            triple("1990-03-15", "14:30", "Zürich, Switzerland")
        );
        assert_eq!(
            extract("born 1990-03-15 at 14:30 in Kraków, Poland").unwrap().2,
            "Kraków, Poland"
        );
        assert_eq!(
            extract("1990-03-15 14:30 São Paulo, Brazil").unwrap().2,
            "São Paulo, Brazil"
        );
    }

    #[test]
    fn test_near_stays_in_place() {
        assert_eq!(
            extract("1990-03-15 14:30 near Austin, TX").unwrap().2,
            "near Austin, TX"
        );
    }
}

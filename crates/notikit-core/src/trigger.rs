//! Notification triggers and fire-time computation.
//!
//! A trigger describes when a queued request should fire. Time-interval
//! triggers fire a fixed delay after scheduling; calendar triggers fire at
//! the next instant whose date components match the requested ones,
//! unspecified components acting as wildcards. All computation is in UTC.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, Time};

use crate::error::{NotificationError, Result};

/// Minimum interval for a repeating time-interval trigger, in seconds.
const MIN_REPEAT_INTERVAL: f64 = 60.0;

/// Bound on the forward search for a calendar match. Component sets that
/// never occur (e.g. February 30th) give up after this horizon.
const CALENDAR_SEARCH_DAYS: i64 = 4 * 366;

/// Partial date used for calendar triggers. `None` components match any
/// value. Weekday numbering is 1 = Sunday through 7 = Saturday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second: Option<u8>,
}

impl DateComponents {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn at_time(hour: u8, minute: u8) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            second: Some(0),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NotificationError::invalid(
                "calendar trigger needs at least one date component",
            ));
        }
        let in_range = self.month.is_none_or(|m| (1..=12).contains(&m))
            && self.day.is_none_or(|d| (1..=31).contains(&d))
            && self.weekday.is_none_or(|w| (1..=7).contains(&w))
            && self.hour.is_none_or(|h| h < 24)
            && self.minute.is_none_or(|m| m < 60)
            && self.second.is_none_or(|s| s < 60);
        if !in_range {
            return Err(NotificationError::invalid("date component out of range"));
        }
        Ok(())
    }

    fn matches_date(&self, date: Date) -> bool {
        self.year.is_none_or(|y| date.year() == y)
            && self.month.is_none_or(|m| date.month() as u8 == m)
            && self.day.is_none_or(|d| date.day() == d)
            && self
                .weekday
                .is_none_or(|w| date.weekday().number_days_from_sunday() + 1 == w)
    }

    /// Smallest time of day satisfying the hour/minute/second components and
    /// strictly later than `after` (when given).
    fn first_time(&self, after: Option<Time>) -> Option<Time> {
        let hours: Vec<u8> = match self.hour {
            Some(h) => vec![h],
            None => (0..24).collect(),
        };
        let minutes: Vec<u8> = match self.minute {
            Some(m) => vec![m],
            None => (0..60).collect(),
        };
        let seconds: Vec<u8> = match self.second {
            Some(s) => vec![s],
            None => (0..60).collect(),
        };

        for &h in &hours {
            for &m in &minutes {
                for &s in &seconds {
                    let candidate = Time::from_hms(h, m, s).ok()?;
                    if after.is_none_or(|a| candidate > a) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    /// Next UTC instant strictly after `after` matching these components.
    pub fn next_match(&self, after: OffsetDateTime) -> Option<OffsetDateTime> {
        let after = after.to_offset(time::UtcOffset::UTC);
        let mut date = after.date();

        for day in 0..CALENDAR_SEARCH_DAYS {
            if self.matches_date(date) {
                let floor = if day == 0 { Some(after.time()) } else { None };
                if let Some(tod) = self.first_time(floor) {
                    return Some(OffsetDateTime::new_utc(date, tod));
                }
            }
            date = date.next_day()?;
        }
        None
    }
}

/// When a queued notification request should fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationTrigger {
    /// Fire after a fixed delay, optionally repeating with the same period.
    #[serde(rename_all = "camelCase")]
    TimeInterval { time_interval: f64, repeats: bool },

    /// Fire at the next date matching the components, optionally repeating
    /// at every subsequent match.
    #[serde(rename_all = "camelCase")]
    Calendar {
        date_components: DateComponents,
        repeats: bool,
    },

    /// Delivered by a remote push; never fires locally.
    Push,
}

impl NotificationTrigger {
    pub fn time_interval(seconds: f64, repeats: bool) -> Self {
        Self::TimeInterval {
            time_interval: seconds,
            repeats,
        }
    }

    pub fn calendar(date_components: DateComponents, repeats: bool) -> Self {
        Self::Calendar {
            date_components,
            repeats,
        }
    }

    pub fn repeats(&self) -> bool {
        match self {
            Self::TimeInterval { repeats, .. } | Self::Calendar { repeats, .. } => *repeats,
            Self::Push => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::TimeInterval {
                time_interval,
                repeats,
            } => {
                if *time_interval <= 0.0 || !time_interval.is_finite() {
                    return Err(NotificationError::invalid(
                        "time interval must be positive and finite",
                    ));
                }
                if *repeats && *time_interval < MIN_REPEAT_INTERVAL {
                    return Err(NotificationError::invalid(format!(
                        "repeating interval must be at least {MIN_REPEAT_INTERVAL} seconds"
                    )));
                }
                Ok(())
            }
            Self::Calendar {
                date_components, ..
            } => date_components.validate(),
            Self::Push => Ok(()),
        }
    }

    /// Next fire time strictly after `after`, or `None` when the trigger
    /// never fires locally.
    pub fn next_fire_after(&self, after: OffsetDateTime) -> Option<OffsetDateTime> {
        match self {
            Self::TimeInterval { time_interval, .. } => {
                Some(after + Duration::seconds_f64(*time_interval))
            }
            Self::Calendar {
                date_components, ..
            } => date_components.next_match(after),
            Self::Push => None,
        }
    }
}

/// Convenience for building a specific calendar date.
pub fn date_components_for(year: i32, month: Month, day: u8, hour: u8, minute: u8) -> DateComponents {
    DateComponents {
        year: Some(year),
        month: Some(month as u8),
        day: Some(day),
        hour: Some(hour),
        minute: Some(minute),
        second: Some(0),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_time_interval_next_fire() {
        let trigger = NotificationTrigger::time_interval(90.0, false);
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(
            trigger.next_fire_after(now),
            Some(datetime!(2026-03-01 12:01:30 UTC))
        );
    }

    #[test]
    fn test_time_interval_validation() {
        assert!(NotificationTrigger::time_interval(0.0, false).validate().is_err());
        assert!(NotificationTrigger::time_interval(-5.0, false).validate().is_err());
        assert!(NotificationTrigger::time_interval(30.0, true).validate().is_err());
        assert!(NotificationTrigger::time_interval(30.0, false).validate().is_ok());
        assert!(NotificationTrigger::time_interval(60.0, true).validate().is_ok());
    }

    #[test]
    fn test_calendar_same_day_match() {
        let components = DateComponents::at_time(15, 30);
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2026-03-01 15:30:00 UTC))
        );
    }

    #[test]
    fn test_calendar_rolls_to_next_day() {
        let components = DateComponents::at_time(9, 0);
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2026-03-02 09:00:00 UTC))
        );
    }

    #[test]
    fn test_calendar_exact_instant_is_excluded() {
        // The next match is strictly after `after`.
        let components = DateComponents::at_time(9, 0);
        let now = datetime!(2026-03-01 09:00:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2026-03-02 09:00:00 UTC))
        );
    }

    #[test]
    fn test_calendar_weekday_match() {
        // 2026-03-01 is a Sunday; weekday 2 = Monday.
        let components = DateComponents {
            weekday: Some(2),
            hour: Some(8),
            minute: Some(0),
            second: Some(0),
            ..Default::default()
        };
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2026-03-02 08:00:00 UTC))
        );
    }

    #[test]
    fn test_calendar_minute_only_repeats_hourly() {
        let components = DateComponents {
            minute: Some(15),
            second: Some(0),
            ..Default::default()
        };
        let now = datetime!(2026-03-01 12:20:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2026-03-01 13:15:00 UTC))
        );
    }

    #[test]
    fn test_calendar_impossible_components() {
        let components = DateComponents {
            month: Some(2),
            day: Some(30),
            ..Default::default()
        };
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(components.next_match(now), None);
    }

    #[test]
    fn test_calendar_leap_day() {
        let components = DateComponents {
            month: Some(2),
            day: Some(29),
            hour: Some(0),
            minute: Some(0),
            second: Some(0),
            ..Default::default()
        };
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(
            components.next_match(now),
            Some(datetime!(2028-02-29 00:00:00 UTC))
        );
    }

    #[test]
    fn test_calendar_validation() {
        assert!(
            NotificationTrigger::calendar(DateComponents::default(), false)
                .validate()
                .is_err()
        );
        let bad = DateComponents {
            month: Some(13),
            ..Default::default()
        };
        assert!(NotificationTrigger::calendar(bad, false).validate().is_err());
        assert!(
            NotificationTrigger::calendar(DateComponents::at_time(9, 0), true)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_push_never_fires_locally() {
        let now = datetime!(2026-03-01 12:00:00 UTC);
        assert_eq!(NotificationTrigger::Push.next_fire_after(now), None);
        assert!(!NotificationTrigger::Push.repeats());
    }

    #[test]
    fn test_trigger_serde_tagged() {
        let trigger = NotificationTrigger::time_interval(120.0, true);
        let json = serde_json::to_value(&trigger).unwrap();
        assert_eq!(json["type"], "timeInterval");
        assert_eq!(json["timeInterval"], 120.0);
        let back: NotificationTrigger = serde_json::from_value(json).unwrap();
        assert_eq!(back, trigger);
    }
}

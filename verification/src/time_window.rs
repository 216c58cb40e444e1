//! Temporal gate evaluated in the quest's timezone.
//!
//! Rules, first match wins:
//! 1. a date override for today,
//! 2. the day-of-week set,
//! 3. the daily start/end range,
//! 4. no restriction.

use crate::VerificationError;
use chrono::{Datelike, NaiveTime};
use chrono_tz::Tz;
use quest_types::{TimeWindowConfig, Timestamp};
use serde::{Deserialize, Serialize};

/// Which rule decided the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRule {
    DateOverride,
    DayOfWeek,
    DailyRange,
    Unrestricted,
}

/// Outcome of the time layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowCheck {
    pub passed: bool,
    /// Time of day at evaluation, `"HH:MM"` in the configured timezone.
    pub current_time: String,
    /// `"HH:MM - HH:MM"`, when a window applies.
    pub allowed_window: Option<String>,
    pub rule: TimeRule,
    pub message: String,
}

/// Stateless time-window verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeWindowVerifier;

impl TimeWindowVerifier {
    /// Evaluate `config` at `at`. Errors only on invalid configuration.
    pub fn verify(
        &self,
        config: &TimeWindowConfig,
        at: Timestamp,
    ) -> Result<TimeWindowCheck, VerificationError> {
        let tz = parse_timezone(&config.timezone)?;
        let local = at.to_datetime().with_timezone(&tz);
        let today = local.date_naive();
        let now = local.format("%H:%M").to_string();

        if !config.enabled {
            return Ok(unrestricted(now));
        }

        let overrides: Vec<(String, String)> = config
            .date_overrides
            .iter()
            .filter(|o| o.date == today)
            .map(|o| -> Result<(String, String), VerificationError> {
                Ok((normalize_hhmm(&o.start_time)?, normalize_hhmm(&o.end_time)?))
            })
            .collect::<Result<_, _>>()?;

        if !overrides.is_empty() {
            let passed = overrides.iter().any(|(s, e)| within(&now, s, e));
            let window = overrides
                .iter()
                .map(|(s, e)| format_window(s, e))
                .collect::<Vec<_>>()
                .join(", ");
            let message = if passed {
                format!("Within special hours for {today}: {window}")
            } else {
                format!("Outside special hours for {today}: {window} (now {now})")
            };
            return Ok(TimeWindowCheck {
                passed,
                current_time: now,
                allowed_window: Some(window),
                rule: TimeRule::DateOverride,
                message,
            });
        }

        let daily = daily_range(config)?;

        // An empty set restricts nothing, same as an absent one.
        if let Some(days) = config.days_of_week.as_ref().filter(|d| !d.is_empty()) {
            if let Some(bad) = days.iter().find(|d| **d > 6) {
                return Err(VerificationError::InvalidDayOfWeek(*bad));
            }
            let weekday = local.weekday().num_days_from_sunday() as u8;
            if !days.contains(&weekday) {
                return Ok(TimeWindowCheck {
                    passed: false,
                    current_time: now,
                    allowed_window: daily.as_ref().map(|(s, e)| format_window(s, e)),
                    rule: TimeRule::DayOfWeek,
                    message: format!("not available today ({})", local.weekday()),
                });
            }
            if daily.is_none() {
                return Ok(TimeWindowCheck {
                    passed: true,
                    current_time: now,
                    allowed_window: None,
                    rule: TimeRule::DayOfWeek,
                    message: format!("available today ({})", local.weekday()),
                });
            }
        }

        let Some((start, end)) = daily else {
            return Ok(unrestricted(now));
        };

        let passed = within(&now, &start, &end);
        let window = format_window(&start, &end);
        let message = if passed {
            format!("Within allowed window {window}")
        } else {
            format!("Outside allowed window {window} (now {now} {})", config.timezone)
        };
        Ok(TimeWindowCheck {
            passed,
            current_time: now,
            allowed_window: Some(window),
            rule: TimeRule::DailyRange,
            message,
        })
    }
}

fn unrestricted(now: String) -> TimeWindowCheck {
    TimeWindowCheck {
        passed: true,
        current_time: now,
        allowed_window: None,
        rule: TimeRule::Unrestricted,
        message: "no time restriction".to_string(),
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, VerificationError> {
    name.parse::<Tz>()
        .map_err(|_| VerificationError::UnknownTimezone(name.to_string()))
}

/// Validate an `"HH:MM"` string and return its zero-padded form.
pub fn normalize_hhmm(value: &str) -> Result<String, VerificationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| VerificationError::InvalidTimeOfDay(value.to_string()))
}

/// The daily range, if either end is configured. A missing end is open.
fn daily_range(config: &TimeWindowConfig) -> Result<Option<(String, String)>, VerificationError> {
    match (&config.start_time, &config.end_time) {
        (None, None) => Ok(None),
        (start, end) => {
            let start = start.as_deref().map(normalize_hhmm).transpose()?;
            let end = end.as_deref().map(normalize_hhmm).transpose()?;
            Ok(Some((
                start.unwrap_or_else(|| "00:00".to_string()),
                end.unwrap_or_else(|| "23:59".to_string()),
            )))
        }
    }
}

/// Inclusive at both ends; `start > end` wraps past midnight.
fn within(now: &str, start: &str, end: &str) -> bool {
    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

fn format_window(start: &str, end: &str) -> String {
    format!("{start} - {end}")
}

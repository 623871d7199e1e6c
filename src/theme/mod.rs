//! Time-of-day theme phases
//!
//! The dashboard background follows the local wall clock in the configured
//! timezone. Phase boundaries: dawn 05:00, day 08:00, dusk 17:00, night
//! 20:00.

use crate::error::{AppError, Result};
use chrono::{NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Theme phase of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Dawn,
    Day,
    Dusk,
    Night,
}

const DAWN_START_HOUR: u32 = 5;
const DAY_START_HOUR: u32 = 8;
const DUSK_START_HOUR: u32 = 17;
const NIGHT_START_HOUR: u32 = 20;

/// Phase for a local wall-clock time
pub fn phase_at(time: NaiveTime) -> DayPhase {
    match time.hour() {
        h if h < DAWN_START_HOUR => DayPhase::Night,
        h if h < DAY_START_HOUR => DayPhase::Dawn,
        h if h < DUSK_START_HOUR => DayPhase::Day,
        h if h < NIGHT_START_HOUR => DayPhase::Dusk,
        _ => DayPhase::Night,
    }
}

/// Seconds until the next phase boundary after `time`
pub fn seconds_until_transition(time: NaiveTime) -> u32 {
    let boundaries = [
        DAWN_START_HOUR,
        DAY_START_HOUR,
        DUSK_START_HOUR,
        NIGHT_START_HOUR,
    ];

    let now_secs = time.num_seconds_from_midnight();
    boundaries
        .iter()
        .map(|h| h * 3600)
        .find(|&b| b > now_secs)
        .map(|b| b - now_secs)
        // Past 20:00 the next boundary is tomorrow's dawn
        .unwrap_or(24 * 3600 - now_secs + DAWN_START_HOUR * 3600)
}

/// Current phase in the given timezone
pub fn current_phase(tz: Tz) -> DayPhase {
    phase_at(Utc::now().with_timezone(&tz).time())
}

/// Current phase for an IANA timezone name, as stored in settings
pub fn current_phase_in(timezone: &str) -> Result<DayPhase> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| AppError::Config(format!("Unknown timezone '{}'", timezone)))?;
    Ok(current_phase(tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(phase_at(at(4, 59)), DayPhase::Night);
        assert_eq!(phase_at(at(5, 0)), DayPhase::Dawn);
        assert_eq!(phase_at(at(7, 59)), DayPhase::Dawn);
        assert_eq!(phase_at(at(8, 0)), DayPhase::Day);
        assert_eq!(phase_at(at(16, 59)), DayPhase::Day);
        assert_eq!(phase_at(at(17, 0)), DayPhase::Dusk);
        assert_eq!(phase_at(at(19, 59)), DayPhase::Dusk);
        assert_eq!(phase_at(at(20, 0)), DayPhase::Night);
        assert_eq!(phase_at(at(0, 0)), DayPhase::Night);
    }

    #[test]
    fn test_seconds_until_transition() {
        assert_eq!(seconds_until_transition(at(7, 0)), 3600);
        assert_eq!(seconds_until_transition(at(16, 30)), 1800);
        // 21:00 -> tomorrow 05:00
        assert_eq!(seconds_until_transition(at(21, 0)), 8 * 3600);
    }

    #[test]
    fn test_unknown_timezone_is_config_error() {
        assert!(current_phase_in("Asia/Vientiane").is_ok());
        assert!(matches!(
            current_phase_in("Mars/Olympus_Mons").unwrap_err(),
            AppError::Config(_)
        ));
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DayPhase::Dusk).unwrap(),
            "\"dusk\""
        );
    }
}

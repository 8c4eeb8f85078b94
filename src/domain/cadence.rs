//! Recurrence cadence for periodic buys.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

pub const ALL_CADENCES: [Cadence; 5] = [
    Cadence::Weekly,
    Cadence::Monthly,
    Cadence::Quarterly,
    Cadence::SemiAnnual,
    Cadence::Annual,
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown cadence '{0}' (expected weekly, monthly, quarterly, semi-annual or annual)")]
pub struct ParseCadenceError(pub String);

impl Cadence {
    /// Approximate period length, used only to size capital per order.
    pub fn period_days(self) -> i64 {
        match self {
            Cadence::Weekly => 7,
            Cadence::Monthly => 30,
            Cadence::Quarterly => 90,
            Cadence::SemiAnnual => 180,
            Cadence::Annual => 365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
            Cadence::Quarterly => "quarterly",
            Cadence::SemiAnnual => "semi-annual",
            Cadence::Annual => "annual",
        }
    }

    /// The cadence date after `from`.
    ///
    /// Month-based steps clamp to the last day of the target month. Each step
    /// measures from the previous date, so a clamped day carries forward
    /// (Jan 31 → Feb 29 → Mar 29). Returns `None` past chrono's
    /// representable range.
    pub fn advance(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::Weekly => from.checked_add_days(Days::new(7)),
            Cadence::Monthly => from.checked_add_months(Months::new(1)),
            Cadence::Quarterly => from.checked_add_months(Months::new(3)),
            Cadence::SemiAnnual => from.checked_add_months(Months::new(6)),
            Cadence::Annual => from.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = ParseCadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            "quarterly" => Ok(Cadence::Quarterly),
            "semi-annual" | "semiannual" | "semi_annual" => Ok(Cadence::SemiAnnual),
            "annual" | "yearly" => Ok(Cadence::Annual),
            _ => Err(ParseCadenceError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_round_trips_display() {
        for cadence in ALL_CADENCES {
            assert_eq!(cadence.to_string().parse::<Cadence>().unwrap(), cadence);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Monthly".parse::<Cadence>().unwrap(), Cadence::Monthly);
        assert_eq!(" SEMI-ANNUAL ".parse::<Cadence>().unwrap(), Cadence::SemiAnnual);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "fortnightly".parse::<Cadence>().unwrap_err();
        assert_eq!(err, ParseCadenceError("fortnightly".into()));
    }

    #[test]
    fn period_days_table() {
        let days: Vec<i64> = ALL_CADENCES.iter().map(|c| c.period_days()).collect();
        assert_eq!(days, vec![7, 30, 90, 180, 365]);
    }

    #[test]
    fn monthly_clamps_and_carries_clamped_day() {
        let feb = Cadence::Monthly.advance(d(2024, 1, 31)).unwrap();
        assert_eq!(feb, d(2024, 2, 29));
        let mar = Cadence::Monthly.advance(feb).unwrap();
        assert_eq!(mar, d(2024, 3, 29));
        assert_eq!(Cadence::Monthly.advance(mar), Some(d(2024, 4, 29)));
    }

    #[test]
    fn annual_from_leap_day() {
        assert_eq!(Cadence::Annual.advance(d(2024, 2, 29)), Some(d(2025, 2, 28)));
    }

    #[test]
    fn quarterly_and_semi_annual_steps() {
        let anchor = d(2023, 8, 31);
        assert_eq!(Cadence::Quarterly.advance(anchor), Some(d(2023, 11, 30)));
        assert_eq!(Cadence::SemiAnnual.advance(anchor), Some(d(2024, 2, 29)));
    }

    #[test]
    fn advance_past_max_date_is_none() {
        assert_eq!(Cadence::Monthly.advance(NaiveDate::MAX), None);
    }

    #[test]
    fn weekly_steps_seven_days() {
        assert_eq!(Cadence::Weekly.advance(d(2024, 12, 30)), Some(d(2025, 1, 6)));
    }
}

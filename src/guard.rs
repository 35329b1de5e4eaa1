//! Future-date guard
//!
//! Rejects queries that ask about calendar years after the current one
//! before any external call is made.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Years from 2020 through 2999 between ASCII word boundaries, so a year
    /// directly followed by CJK text still matches
    static ref YEAR_PATTERN: Regex =
        Regex::new(r"(?-u:\b)(20[2-9][0-9]|2[1-9][0-9]{2})(?-u:\b)")
            .expect("year pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Passed,
    Rejected { reason: String, current_year: i32 },
}

impl GuardOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, GuardOutcome::Passed)
    }
}

/// Stateless guard; the current year is read at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FutureDateGuard;

impl FutureDateGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, query: &str) -> GuardOutcome {
        self.validate_at(query, chrono::Utc::now().year())
    }

    pub fn validate_at(&self, query: &str, current_year: i32) -> GuardOutcome {
        let future_year = mentioned_years(query).find(|year| *year > current_year);

        match future_year {
            Some(_) => GuardOutcome::Rejected {
                reason: format!(
                    "I cannot predict the future. Please ask for a year up to {}.",
                    current_year
                ),
                current_year,
            },
            None => GuardOutcome::Passed,
        }
    }
}

/// Every candidate year mentioned in the text, in order of appearance
pub fn mentioned_years(query: &str) -> impl Iterator<Item = i32> + '_ {
    YEAR_PATTERN
        .find_iter(query)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_past_and_current_years_pass() {
        let guard = FutureDateGuard::new();
        let cases = vec![
            "iPhone sales in India 2023",
            "Compare Apple vs Samsung revenue in Asia 2024",
            "EV vehicle growth in Germany between 2021 and 2025",
        ];

        for c in cases {
            assert_eq!(guard.validate_at(c, 2025), GuardOutcome::Passed, "{}", c);
        }
    }

    #[test]
    fn test_future_year_rejected_with_current_year() {
        let guard = FutureDateGuard::new();

        match guard.validate_at("EV sales in 2030", 2025) {
            GuardOutcome::Rejected { reason, current_year } => {
                assert_eq!(current_year, 2025);
                assert!(reason.contains("2025"));
            }
            GuardOutcome::Passed => panic!("2030 should be rejected"),
        }
    }

    #[test]
    fn test_any_future_match_rejects() {
        let guard = FutureDateGuard::new();
        let outcome = guard.validate_at("growth between 2022 and 2031", 2025);
        assert!(!outcome.is_passed());

        let outcome = guard.validate_at("sales forecast for 2150", 2025);
        assert!(!outcome.is_passed());
    }

    #[test]
    fn test_edge_cases() {
        let guard = FutureDateGuard::new();

        // No year at all
        assert!(guard.validate_at("top phone brands by revenue", 2025).is_passed());
        // Embedded in a longer number
        assert!(guard.validate_at("order id 120305 shipped", 2025).is_passed());
        assert!(guard.validate_at("sku 20301", 2025).is_passed());
        // Below the matched range
        assert!(guard.validate_at("sales in 1999 and 2019", 2025).is_passed());
        // Quarter notation keeps the word boundary
        assert!(!guard.validate_at("Q1-2026 revenue", 2025).is_passed());
        // Non-ASCII text right after the year
        assert!(!guard.validate_at("2030年のEV販売台数", 2025).is_passed());
        assert!(guard.validate_at("2023年のEV販売台数", 2025).is_passed());
    }

    #[test]
    fn test_mentioned_years() {
        let years: Vec<i32> = mentioned_years("from 2021 to 2024, not 12024").collect();
        assert_eq!(years, vec![2021, 2024]);
    }

    #[test]
    fn test_live_clock() {
        let guard = FutureDateGuard::new();
        let next_year = chrono::Utc::now().year() + 1;
        let query = format!("sales in {}", next_year);
        assert!(!guard.validate(&query).is_passed());
    }
}

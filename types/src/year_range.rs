use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An inclusive span of seasons, e.g. one backfill chunk or one audit era.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("start year {start} is after end year {end}")]
    Inverted { start: i32, end: i32 },

    #[error("step must be at least one year")]
    ZeroStep,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn season_count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

impl Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Splits `[start, end]` into contiguous ranges of at most `step` years,
/// newest first. The last range is clipped at `start`.
pub fn plan_ranges(start: i32, end: i32, step: u32) -> Result<Vec<YearRange>, RangeError> {
    YearRange::new(start, end)?;
    if step == 0 {
        return Err(RangeError::ZeroStep);
    }
    let step = step as i32;
    let mut ranges = Vec::new();
    let mut current = end;
    while current >= start {
        let range_start = (current - step + 1).max(start);
        ranges.push(YearRange {
            start: range_start,
            end: current,
        });
        current -= step;
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_ranges_descends_and_clips() {
        let ranges = plan_ranges(2020, 2024, 2).unwrap();
        assert_eq!(
            ranges,
            vec![
                YearRange::new(2023, 2024).unwrap(),
                YearRange::new(2021, 2022).unwrap(),
                YearRange::single(2020),
            ]
        );
    }

    #[test]
    fn test_plan_ranges_single_year() {
        let ranges = plan_ranges(2024, 2024, 5).unwrap();
        assert_eq!(ranges, vec![YearRange::single(2024)]);
    }

    #[test]
    fn test_plan_ranges_exact_multiple() {
        let ranges = plan_ranges(1876, 1915, 20).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], YearRange::new(1896, 1915).unwrap());
        assert_eq!(ranges[1], YearRange::new(1876, 1895).unwrap());
    }

    #[test]
    fn test_plan_ranges_rejects_bad_input() {
        assert_eq!(
            plan_ranges(2024, 2020, 2),
            Err(RangeError::Inverted {
                start: 2024,
                end: 2020
            })
        );
        assert_eq!(plan_ranges(2020, 2024, 0), Err(RangeError::ZeroStep));
    }

    #[test]
    fn test_year_range_display_and_contains() {
        let range = YearRange::new(2000, 2019).unwrap();
        assert_eq!(range.to_string(), "2000-2019");
        assert!(range.contains(2000));
        assert!(range.contains(2019));
        assert!(!range.contains(2020));
        assert_eq!(range.season_count(), 20);
    }
}

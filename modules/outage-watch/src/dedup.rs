use std::collections::HashMap;

use chrono::NaiveDate;

/// Last calendar date each trigger hour fired. In-memory only, so a restart
/// re-arms every hour.
#[derive(Debug, Default, Clone)]
pub struct DedupState {
    last_fired: HashMap<u32, NaiveDate>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// An hour is due unless it already fired on `date`.
    pub fn is_due(&self, hour: u32, date: NaiveDate) -> bool {
        self.last_fired.get(&hour) != Some(&date)
    }

    pub fn mark_fired(&mut self, hour: u32, date: NaiveDate) {
        self.last_fired.insert(hour, date);
    }

    pub fn last_fired(&self, hour: u32) -> Option<NaiveDate> {
        self.last_fired.get(&hour).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn every_hour_starts_due() {
        let state = DedupState::new();
        assert!(state.is_due(7, day(1)));
        assert_eq!(state.last_fired(7), None);
    }

    #[test]
    fn fired_hour_is_not_due_same_day() {
        let mut state = DedupState::new();
        state.mark_fired(7, day(1));
        assert!(!state.is_due(7, day(1)));
        assert!(state.is_due(19, day(1)));
    }

    #[test]
    fn next_date_rearms() {
        let mut state = DedupState::new();
        state.mark_fired(7, day(1));
        assert!(state.is_due(7, day(2)));
        state.mark_fired(7, day(2));
        assert_eq!(state.last_fired(7), Some(day(2)));
    }
}

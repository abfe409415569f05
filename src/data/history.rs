//! Per-driver standing histories

use std::collections::BTreeMap;

use crate::{DriverNumber, StandingRecord};

/// One driver's standings, sorted by round
#[derive(Debug, Clone, Default)]
pub struct DriverHistory {
    records: Vec<StandingRecord>,
}

impl DriverHistory {
    /// Build a history from unordered records of a single driver
    pub fn new(mut records: Vec<StandingRecord>) -> Self {
        records.sort_by_key(|r| r.round);
        DriverHistory { records }
    }

    /// Select and sort one driver's records out of a mixed stream
    pub fn for_driver(records: &[StandingRecord], driver: DriverNumber) -> Self {
        Self::new(
            records
                .iter()
                .filter(|r| r.driver_number == driver)
                .cloned()
                .collect(),
        )
    }

    /// Group a mixed stream by driver, ordered by driver number
    pub fn group(records: &[StandingRecord]) -> BTreeMap<DriverNumber, DriverHistory> {
        let mut grouped: BTreeMap<DriverNumber, Vec<StandingRecord>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.driver_number)
                .or_default()
                .push(record.clone());
        }
        grouped
            .into_iter()
            .map(|(driver, records)| (driver, DriverHistory::new(records)))
            .collect()
    }

    pub fn records(&self) -> &[StandingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent standing
    pub fn latest(&self) -> Option<&StandingRecord> {
        self.records.last()
    }

    /// Records strictly before index `i`
    pub fn before(&self, i: usize) -> &[StandingRecord] {
        &self.records[..i.min(self.records.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(driver: u32, round: u32) -> StandingRecord {
        StandingRecord {
            season: "2025".to_string(),
            round,
            driver_number: DriverNumber(driver),
            position: 1,
            points: 0.0,
            wins: 0,
        }
    }

    #[test]
    fn test_sorted_by_round() {
        let history = DriverHistory::new(vec![make_record(1, 3), make_record(1, 1), make_record(1, 2)]);
        let rounds: Vec<u32> = history.records().iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![1, 2, 3]);
        assert_eq!(history.latest().map(|r| r.round), Some(3));
    }

    #[test]
    fn test_group_by_driver() {
        let records = vec![
            make_record(44, 2),
            make_record(1, 1),
            make_record(44, 1),
            make_record(16, 1),
        ];
        let grouped = DriverHistory::group(&records);
        let drivers: Vec<u32> = grouped.keys().map(|d| d.0).collect();
        assert_eq!(drivers, vec![1, 16, 44]);
        assert_eq!(grouped[&DriverNumber(44)].len(), 2);
        assert_eq!(grouped[&DriverNumber(44)].records()[0].round, 1);
    }

    #[test]
    fn test_gaps_are_not_filled() {
        let history = DriverHistory::new(vec![make_record(1, 1), make_record(1, 4)]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_for_unknown_driver_is_empty() {
        let history = DriverHistory::for_driver(&[make_record(1, 1)], DriverNumber(99));
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}

//! Tariff reference data: yearly GHS tables and the merged wide schedule.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// One cleaned line of a yearly tariff table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffEntry {
    /// Procedure-group code
    pub ghm_code: String,
    /// Official GHS label
    pub label: String,
    /// Public-sector tariff, EUR; `None` when unparsable
    pub public: Option<f64>,
    /// Private-sector tariff, EUR; `None` when unparsable
    pub private: Option<f64>,
}

/// A (public, private) tariff pair for one code and year.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TariffPair {
    pub public: Option<f64>,
    pub private: Option<f64>,
}

/// One campaign year of tariff entries, as loaded from its extract.
#[derive(Debug, Clone)]
pub struct YearTariffTable {
    pub year: u16,
    pub entries: Vec<TariffEntry>,
}

impl YearTariffTable {
    /// Drop duplicate codes, keeping the first occurrence.
    ///
    /// Deterministic given identical input ordering, and idempotent.
    #[must_use]
    pub fn deduplicate(mut self) -> Self {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        self.entries
            .retain(|entry| seen.insert(entry.ghm_code.clone()));
        self
    }
}

/// Per-code slot of the merged schedule.
#[derive(Debug, Clone, Default)]
pub struct ScheduleEntry {
    /// Shared descriptive label, taken from the most recent year carrying
    /// this code
    pub label: String,
    /// Year-qualified tariff pairs
    pub by_year: FxHashMap<u16, TariffPair>,
}

/// The wide tariff reference: every known code, all campaign years.
#[derive(Debug, Clone, Default)]
pub struct TariffSchedule {
    /// Campaign years, ascending
    pub years: Vec<u16>,
    by_code: FxHashMap<String, ScheduleEntry>,
}

impl TariffSchedule {
    /// Outer-join yearly tables into one wide schedule keyed by code.
    ///
    /// Each table is deduplicated first (first occurrence wins). The label
    /// for a code comes from the most recent year that lists it.
    #[must_use]
    pub fn merge(tables: Vec<YearTariffTable>) -> Self {
        let mut years: Vec<u16> = tables.iter().map(|t| t.year).collect();
        years.sort_unstable();
        years.dedup();

        let mut by_code: FxHashMap<String, ScheduleEntry> = FxHashMap::default();
        // Most recent year first so its label lands before older ones.
        let mut tables = tables;
        tables.sort_by(|a, b| b.year.cmp(&a.year));

        for table in tables {
            let year = table.year;
            for entry in table.deduplicate().entries {
                let slot = by_code.entry(entry.ghm_code).or_default();
                if slot.label.is_empty() {
                    slot.label = entry.label;
                }
                slot.by_year.entry(year).or_insert(TariffPair {
                    public: entry.public,
                    private: entry.private,
                });
            }
        }

        Self { years, by_code }
    }

    /// Number of distinct codes in the schedule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// The tariff pair for a code in exactly the given year.
    ///
    /// `None` when the code is unknown or the code carries no entry for
    /// that year - the caller propagates this as a null tariff, not zero.
    #[must_use]
    pub fn lookup(&self, ghm_code: &str, year: u16) -> Option<TariffPair> {
        self.by_code
            .get(ghm_code)
            .and_then(|slot| slot.by_year.get(&year))
            .copied()
    }

    /// The shared label for a code, if known in any year.
    #[must_use]
    pub fn label_of(&self, ghm_code: &str) -> Option<&str> {
        self.by_code.get(ghm_code).map(|s| s.label.as_str())
    }

    /// Iterate over `(code, slot)` pairs in an unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScheduleEntry)> {
        self.by_code.iter().map(|(code, slot)| (code.as_str(), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, label: &str, public: Option<f64>, private: Option<f64>) -> TariffEntry {
        TariffEntry {
            ghm_code: code.to_string(),
            label: label.to_string(),
            public,
            private,
        }
    }

    #[test]
    fn test_deduplicate_first_wins() {
        let table = YearTariffTable {
            year: 2023,
            entries: vec![
                entry("01C031", "first", Some(100.0), None),
                entry("01C031", "second", Some(200.0), None),
                entry("02C051", "other", Some(300.0), None),
            ],
        };
        let deduped = table.deduplicate();
        assert_eq!(deduped.entries.len(), 2);
        assert_eq!(deduped.entries[0].label, "first");
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let table = YearTariffTable {
            year: 2023,
            entries: vec![
                entry("A", "a", Some(1.0), None),
                entry("A", "b", Some(2.0), None),
                entry("B", "c", None, Some(3.0)),
            ],
        };
        let once = table.deduplicate();
        let again = once.clone().deduplicate();
        assert_eq!(once.entries, again.entries);
    }

    #[test]
    fn test_merge_outer_joins_years() {
        let schedule = TariffSchedule::merge(vec![
            YearTariffTable {
                year: 2022,
                entries: vec![entry("A", "a22", Some(900.0), Some(1400.0))],
            },
            YearTariffTable {
                year: 2023,
                entries: vec![
                    entry("A", "a23", Some(1000.0), Some(1500.0)),
                    entry("B", "b23", Some(50.0), None),
                ],
            },
        ]);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.years, vec![2022, 2023]);
        assert_eq!(
            schedule.lookup("A", 2022),
            Some(TariffPair {
                public: Some(900.0),
                private: Some(1400.0)
            })
        );
        // Code B exists only in 2023: the 2022 lookup is None, not zero.
        assert_eq!(schedule.lookup("B", 2022), None);
        assert_eq!(schedule.lookup("B", 2023).unwrap().public, Some(50.0));
    }

    #[test]
    fn test_merge_label_from_most_recent_year() {
        let schedule = TariffSchedule::merge(vec![
            YearTariffTable {
                year: 2022,
                entries: vec![entry("A", "old label", Some(1.0), None)],
            },
            YearTariffTable {
                year: 2024,
                entries: vec![entry("A", "new label", Some(2.0), None)],
            },
        ]);
        assert_eq!(schedule.label_of("A"), Some("new label"));
    }

    #[test]
    fn test_lookup_unknown_code() {
        let schedule = TariffSchedule::merge(vec![]);
        assert_eq!(schedule.lookup("ZZ", 2023), None);
        assert!(schedule.is_empty());
    }
}

//! Tariff attachment and revenue estimation over the fact table.
//!
//! Each row picks the tariff pair of its own activity year from the
//! merged schedule; estimated revenue is patient count x tariff, public
//! and private computed independently. A missing tariff stays `None` and
//! the revenue stays `None` with it - a code absent from every campaign
//! year is an expected gap, counted and surfaced, never an error.

use serde::Serialize;

use crate::models::FactRow;
use crate::models::tariff::{TariffPair, TariffSchedule};

/// Match and revenue totals of one tariff pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TariffMatchStats {
    pub total_rows: usize,
    /// Rows with a public tariff for their year
    pub with_public_tariff: usize,
    /// Rows with a private tariff for their year
    pub with_private_tariff: usize,
    /// Rows whose code is absent from every campaign year
    pub code_unknown: usize,
    /// Sum of estimated public revenue over matched rows, EUR
    pub public_revenue_total: f64,
    /// Sum of estimated private revenue over matched rows, EUR
    pub private_revenue_total: f64,
}

impl TariffMatchStats {
    /// Share of rows with a public tariff, in percent.
    #[must_use]
    pub fn public_match_pct(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.with_public_tariff as f64 / self.total_rows as f64 * 100.0
    }
}

/// The tariff pair applicable to one row. Pure.
///
/// Exactly the pair of the row's own year: a 2023 row never borrows the
/// 2022 or 2024 columns.
#[must_use]
pub fn select_tariff(schedule: &TariffSchedule, ghm_code: &str, year: u16) -> Option<TariffPair> {
    schedule.lookup(ghm_code, year)
}

/// Estimated revenue for one sector. Pure.
///
/// `None` tariff yields `None` revenue - null is not zero.
#[must_use]
pub fn estimated_revenue(patient_count: u32, tariff: Option<f64>) -> Option<f64> {
    tariff.map(|t| f64::from(patient_count) * t)
}

/// Attach tariffs and estimated revenue to every fact row in place.
pub fn apply_tariffs(rows: &mut [FactRow], schedule: &TariffSchedule) -> TariffMatchStats {
    let mut stats = TariffMatchStats {
        total_rows: rows.len(),
        ..TariffMatchStats::default()
    };

    for row in rows.iter_mut() {
        if schedule.label_of(&row.ghm_code).is_none() {
            stats.code_unknown += 1;
        }
        let pair = select_tariff(schedule, &row.ghm_code, row.year).unwrap_or_default();

        row.public_tariff = pair.public;
        row.private_tariff = pair.private;
        row.public_revenue = estimated_revenue(row.patient_count, pair.public);
        row.private_revenue = estimated_revenue(row.patient_count, pair.private);

        if let Some(revenue) = row.public_revenue {
            stats.with_public_tariff += 1;
            stats.public_revenue_total += revenue;
        }
        if let Some(revenue) = row.private_revenue {
            stats.with_private_tariff += 1;
            stats.private_revenue_total += revenue;
        }
    }

    log::info!(
        "Tariff matching: {} public ({:.1}%), {} private, {} unknown codes of {} rows",
        stats.with_public_tariff,
        stats.public_match_pct(),
        stats.with_private_tariff,
        stats.code_unknown,
        stats.total_rows
    );
    log::info!(
        "Estimated revenue: public {:.0} EUR, private {:.0} EUR",
        stats.public_revenue_total,
        stats.private_revenue_total
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tariff::{TariffEntry, YearTariffTable};

    fn schedule_fixture() -> TariffSchedule {
        let entry = |code: &str, public, private| TariffEntry {
            ghm_code: code.to_string(),
            label: format!("libelle {code}"),
            public,
            private,
        };
        TariffSchedule::merge(vec![
            YearTariffTable {
                year: 2022,
                entries: vec![entry("GHM01", Some(900.0), Some(1300.0))],
            },
            YearTariffTable {
                year: 2023,
                entries: vec![
                    entry("GHM01", Some(1000.0), Some(1500.0)),
                    entry("GHM02", None, Some(250.0)),
                ],
            },
        ])
    }

    #[test]
    fn test_year_selection_is_exact() {
        let schedule = schedule_fixture();
        let pair = select_tariff(&schedule, "GHM01", 2023).unwrap();
        assert_eq!(pair.public, Some(1000.0));
        let pair = select_tariff(&schedule, "GHM01", 2022).unwrap();
        assert_eq!(pair.public, Some(900.0));
        // 2024 has no table at all: no borrowing from adjacent years.
        assert_eq!(select_tariff(&schedule, "GHM01", 2024), None);
    }

    #[test]
    fn test_revenue_is_count_times_tariff() {
        assert_eq!(estimated_revenue(10, Some(1000.0)), Some(10_000.0));
        let revenue = estimated_revenue(7, Some(5332.90)).unwrap();
        assert!((revenue - 7.0 * 5332.90).abs() < 1e-6);
    }

    #[test]
    fn test_null_tariff_propagates_to_revenue() {
        assert_eq!(estimated_revenue(10, None), None);
    }

    #[test]
    fn test_apply_tariffs_end_to_end() {
        let schedule = schedule_fixture();
        let mut rows = vec![
            FactRow::new("A", 2023, "GHM01", "a", 10),
            FactRow::new("A", 2023, "GHM02", "b", 4),
            FactRow::new("A", 2023, "ZZZZ", "c", 2),
        ];
        let stats = apply_tariffs(&mut rows, &schedule);

        assert_eq!(rows[0].public_revenue, Some(10_000.0));
        assert_eq!(rows[0].private_revenue, Some(15_000.0));
        // Null public tariff: null revenue, private side independent.
        assert_eq!(rows[1].public_tariff, None);
        assert_eq!(rows[1].public_revenue, None);
        assert_eq!(rows[1].private_revenue, Some(1000.0));
        // Unknown code: all-null financials, row still present.
        assert_eq!(rows[2].public_tariff, None);
        assert_eq!(rows[2].private_revenue, None);
        assert_eq!(rows.len(), 3);

        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.with_public_tariff, 1);
        assert_eq!(stats.with_private_tariff, 2);
        assert_eq!(stats.code_unknown, 1);
        assert!((stats.public_revenue_total - 10_000.0).abs() < 1e-6);
        assert!((stats.private_revenue_total - 16_000.0).abs() < 1e-6);
    }
}

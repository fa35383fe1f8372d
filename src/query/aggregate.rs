//! On-demand aggregations over a filtered row set.
//!
//! Nothing here goes beyond grouping, patient-count-weighted averaging
//! and sorting. Measures missing on a row simply do not contribute to the
//! weighted mean of that measure.

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::FactRow;

/// Headline figures for the current selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyFigures {
    /// Total patient count
    pub total_patients: u64,
    /// Number of distinct GHM codes
    pub distinct_ghm: usize,
    /// Patient-weighted mean length-of-stay, days
    pub mean_stay: Option<f64>,
    /// Patient-weighted mean age, years
    pub mean_age: Option<f64>,
    /// Patient-weighted death rate, %
    pub death_rate: Option<f64>,
}

/// One label with its summed volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolume {
    pub label: String,
    pub patients: u64,
}

/// One year of the evolution series.
#[derive(Debug, Clone, PartialEq)]
pub struct YearPoint {
    pub year: u16,
    pub patients: u64,
    pub mean_stay: Option<f64>,
    pub mean_age: Option<f64>,
    pub death_rate: Option<f64>,
}

/// Volume change of one label between the first and last selected year.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVariation {
    pub label: String,
    pub start_patients: u64,
    pub end_patients: u64,
    /// Absolute change, end minus start
    pub delta: i64,
    /// Relative change in percent of the start volume
    pub delta_pct: f64,
}

/// Patient-count-weighted mean of one measure.
///
/// Rows whose measure is `None` are excluded from both numerator and
/// denominator; all-`None` yields `None`.
fn weighted_mean<'a>(
    rows: impl Iterator<Item = &'a FactRow>,
    measure: impl Fn(&FactRow) -> Option<f64>,
) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for row in rows {
        if let Some(value) = measure(row) {
            let weight = f64::from(row.patient_count);
            weighted_sum += value * weight;
            weight_total += weight;
        }
    }
    (weight_total > 0.0).then(|| weighted_sum / weight_total)
}

/// Compute the headline figures of a selection.
pub fn key_figures<'a>(rows: impl Iterator<Item = &'a FactRow> + Clone) -> KeyFigures {
    let total_patients = rows.clone().map(|r| u64::from(r.patient_count)).sum();
    let distinct_ghm = rows
        .clone()
        .map(|r| r.ghm_code.as_str())
        .collect::<FxHashSet<_>>()
        .len();
    KeyFigures {
        total_patients,
        distinct_ghm,
        mean_stay: weighted_mean(rows.clone(), |r| r.mean_stay),
        mean_age: weighted_mean(rows.clone(), |r| r.mean_age),
        death_rate: weighted_mean(rows, |r| r.death_rate),
    }
}

/// Top-N labels by summed patient count, descending; ties break on label
/// so the ranking is deterministic.
pub fn top_labels<'a>(rows: impl Iterator<Item = &'a FactRow>, n: usize) -> Vec<LabelVolume> {
    let mut by_label: FxHashMap<&str, u64> = FxHashMap::default();
    for row in rows {
        *by_label.entry(row.label.as_str()).or_insert(0) += u64::from(row.patient_count);
    }
    by_label
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(label, patients)| LabelVolume {
            label: label.to_string(),
            patients,
        })
        .collect()
}

/// Per-year totals and weighted means, ascending by year.
pub fn evolution_by_year<'a>(rows: impl Iterator<Item = &'a FactRow>) -> Vec<YearPoint> {
    let mut by_year: FxHashMap<u16, Vec<&FactRow>> = FxHashMap::default();
    for row in rows {
        by_year.entry(row.year).or_default().push(row);
    }
    by_year
        .into_iter()
        .sorted_by_key(|(year, _)| *year)
        .map(|(year, year_rows)| YearPoint {
            year,
            patients: year_rows.iter().map(|r| u64::from(r.patient_count)).sum(),
            mean_stay: weighted_mean(year_rows.iter().copied(), |r| r.mean_stay),
            mean_age: weighted_mean(year_rows.iter().copied(), |r| r.mean_age),
            death_rate: weighted_mean(year_rows.iter().copied(), |r| r.death_rate),
        })
        .collect()
}

/// Volume variations per label between the earliest and latest year of
/// the selection, strongest increases first.
///
/// Labels must appear in both boundary years; labels starting below
/// `min_start_patients` are excluded as noise.
pub fn label_variations<'a>(
    rows: impl Iterator<Item = &'a FactRow> + Clone,
    min_start_patients: u64,
) -> Vec<LabelVariation> {
    let years: FxHashSet<u16> = rows.clone().map(|r| r.year).collect();
    let (Some(&first), Some(&last)) = (years.iter().min(), years.iter().max()) else {
        return Vec::new();
    };
    if first == last {
        return Vec::new();
    }

    let totals_for = |year: u16| {
        let mut by_label: FxHashMap<String, u64> = FxHashMap::default();
        for row in rows.clone().filter(|r| r.year == year) {
            *by_label.entry(row.label.clone()).or_insert(0) += u64::from(row.patient_count);
        }
        by_label
    };
    let start_totals = totals_for(first);
    let end_totals = totals_for(last);

    start_totals
        .into_iter()
        .filter(|(_, start)| *start >= min_start_patients)
        .filter_map(|(label, start)| {
            let end = *end_totals.get(&label)?;
            let delta = end as i64 - start as i64;
            Some(LabelVariation {
                label,
                start_patients: start,
                end_patients: end,
                delta,
                delta_pct: delta as f64 / start as f64 * 100.0,
            })
        })
        .sorted_by(|a, b| b.delta.cmp(&a.delta).then_with(|| a.label.cmp(&b.label)))
        .collect()
}

/// Top-N values of a categorical attribute by volume, unspecified
/// categories excluded.
pub fn classification_breakdown<'a>(
    rows: impl Iterator<Item = &'a FactRow>,
    attribute: impl Fn(&FactRow) -> Option<&str>,
    n: usize,
) -> Vec<LabelVolume> {
    let mut by_value: FxHashMap<String, u64> = FxHashMap::default();
    for row in rows {
        if let Some(value) = attribute(row) {
            *by_value.entry(value.to_string()).or_insert(0) += u64::from(row.patient_count);
        }
    }
    by_value
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(n)
        .map(|(label, patients)| LabelVolume { label, patients })
        .collect()
}

//! Weighted random split of an integer total that always sums exactly.
//!
//! Shares start from `total * weight` with a random variation, then the
//! difference to the target is spread over a set of sheets and whatever
//! rounding leaves behind is forced onto a single sink sheet.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ProcessError, Result};
use crate::random::RandomSource;

/// Peak hours that absorb the difference in the 24-hour profile
pub const PEAK_HOURS: [&str; 4] = ["7-8AM", "8-9AM", "5-6PM", "6-7PM"];

/// Which sheets the step-3 difference is spread over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdjustTarget {
    #[default]
    AllSheets,
    /// `peak_hours` that exist, or every sheet if none do
    PeakHours,
}

/// Which sheet takes the final residual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResidualSink {
    #[default]
    FirstSheet,
    /// First sheet holding the maximum share
    LargestSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionStrategy {
    /// Half-width of the hourly variation factor `[1 - v, 1 + v]`
    pub variation: f64,
    /// Half-width of the per-row variation factor
    pub row_variation: f64,
    /// Floor applied to every initial hourly share
    pub minimum_per_sheet: u64,
    /// Weight for sheets missing from the weight table
    pub default_weight: f64,
    pub adjust: AdjustTarget,
    pub peak_hours: Vec<String>,
    pub residual: ResidualSink,
}

impl Default for DistributionStrategy {
    fn default() -> Self {
        Self::sixteen_hour()
    }
}

impl DistributionStrategy {
    /// 16-hour counts: every hour gets at least one unit
    pub fn sixteen_hour() -> Self {
        DistributionStrategy {
            variation: 0.2,
            row_variation: 0.3,
            minimum_per_sheet: 1,
            default_weight: 0.0625,
            adjust: AdjustTarget::AllSheets,
            peak_hours: Vec::new(),
            residual: ResidualSink::FirstSheet,
        }
    }

    /// 24-hour counts: quiet hours may be empty, peaks soak up the difference
    pub fn twenty_four_hour() -> Self {
        DistributionStrategy {
            variation: 0.25,
            row_variation: 0.3,
            minimum_per_sheet: 0,
            default_weight: 0.042,
            adjust: AdjustTarget::PeakHours,
            peak_hours: PEAK_HOURS.iter().map(|s| s.to_string()).collect(),
            residual: ResidualSink::LargestSheet,
        }
    }
}

/// Integer share per sheet, in sheet order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    shares: Vec<(String, u64)>,
}

impl Allocation {
    pub fn get(&self, sheet: &str) -> Option<u64> {
        self.shares
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, value)| *value)
    }

    pub fn total(&self) -> u64 {
        self.shares.iter().map(|(_, value)| value).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.shares.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Split `total` across `sheets` so the shares sum to exactly `total`
pub fn redistribute(
    total: u64,
    sheets: &[String],
    weights: &HashMap<String, f64>,
    strategy: &DistributionStrategy,
    rng: &mut dyn RandomSource,
) -> Result<Allocation> {
    if sheets.is_empty() {
        return Err(ProcessError::EmptySheetSet(total));
    }

    let target = total as i64;
    let minimum = strategy.minimum_per_sheet as i64;

    let mut values: Vec<i64> = sheets
        .iter()
        .map(|sheet| {
            let weight = weights.get(sheet).copied().unwrap_or(strategy.default_weight);
            let base = total as f64 * weight;
            let variation = rng.uniform(-strategy.variation, strategy.variation);
            ((base * (1.0 + variation)) as i64).max(minimum)
        })
        .collect();

    let allocated: i64 = values.iter().sum();
    let difference = target - allocated;
    debug!(total, allocated, difference, "initial hourly allocation");

    if difference != 0 {
        let targets = adjustment_targets(sheets, strategy);
        let count = targets.len() as i64;
        let per_sheet = difference.div_euclid(count);
        let remainder = difference.rem_euclid(count);

        for (position, &index) in targets.iter().enumerate() {
            let adjustment = per_sheet + i64::from((position as i64) < remainder);
            values[index] = (values[index] + adjustment).max(0);
        }
    }

    let residual = target - values.iter().sum::<i64>();
    if residual != 0 {
        let sink = match strategy.residual {
            ResidualSink::FirstSheet => 0,
            ResidualSink::LargestSheet => largest_index(&values),
        };
        debug!(residual, sheet = %sheets[sink], "forcing residual");
        settle_residual(&mut values, sink, residual);
    }

    Ok(Allocation {
        shares: sheets
            .iter()
            .cloned()
            .zip(values.into_iter().map(|v| v as u64))
            .collect(),
    })
}

/// Indices of the sheets that absorb the difference
fn adjustment_targets(sheets: &[String], strategy: &DistributionStrategy) -> Vec<usize> {
    if strategy.adjust == AdjustTarget::PeakHours {
        let peaks: Vec<usize> = strategy
            .peak_hours
            .iter()
            .filter_map(|peak| sheets.iter().position(|s| s == peak))
            .collect();
        if !peaks.is_empty() {
            return peaks;
        }
    }
    (0..sheets.len()).collect()
}

/// Index of the first maximum
fn largest_index(values: &[i64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Add `residual` to `values[sink]`. A negative result is clamped to zero and
/// the deficit taken from the largest remaining shares instead.
fn settle_residual(values: &mut [i64], sink: usize, residual: i64) {
    values[sink] += residual;
    if values[sink] >= 0 {
        return;
    }

    let mut deficit = -values[sink];
    values[sink] = 0;
    while deficit > 0 {
        let index = largest_index(values);
        if values[index] <= 0 {
            break;
        }
        let taken = deficit.min(values[index]);
        values[index] -= taken;
        deficit -= taken;
    }
}

/// Split one hourly share across the rows of a direction.
///
/// Every row but the last gets roughly an even share; the last row takes
/// whatever remains so the split is exact.
pub fn split_across_rows(
    amount: u64,
    rows: &[u32],
    row_variation: f64,
    rng: &mut dyn RandomSource,
) -> Vec<(u32, u64)> {
    if rows.is_empty() {
        return Vec::new();
    }
    if amount == 0 {
        return rows.iter().map(|&row| (row, 0)).collect();
    }

    let base_per_row = amount as f64 / rows.len() as f64;
    let mut remaining = amount;
    let last = rows.len() - 1;

    rows.iter()
        .enumerate()
        .map(|(index, &row)| {
            let value = if index == last {
                remaining
            } else {
                let variation = rng.uniform(-row_variation, row_variation);
                let share = (base_per_row * (1.0 + variation)).max(0.0) as u64;
                share.min(remaining)
            };
            remaining -= value;
            (row, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedRandom, SequenceRandom, SystemRandom};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_even_split_remainder_goes_first() {
        let strategy = DistributionStrategy {
            default_weight: 0.33,
            ..DistributionStrategy::sixteen_hour()
        };
        let allocation = redistribute(
            100,
            &names(&["A", "B", "C"]),
            &HashMap::new(),
            &strategy,
            &mut FixedRandom::midpoint(),
        )
        .unwrap();

        assert_eq!(allocation.get("A"), Some(34));
        assert_eq!(allocation.get("B"), Some(33));
        assert_eq!(allocation.get("C"), Some(33));
        assert_eq!(allocation.total(), 100);
    }

    #[test]
    fn test_minimum_floor_then_shrink_to_small_total() {
        // 16 sheets at a floor of 1 overshoot a total of 2
        let sheets: Vec<String> = (0..16).map(|i| format!("S{}", i)).collect();
        let allocation = redistribute(
            2,
            &sheets,
            &HashMap::new(),
            &DistributionStrategy::sixteen_hour(),
            &mut FixedRandom::midpoint(),
        )
        .unwrap();

        assert_eq!(allocation.total(), 2);
        assert_eq!(allocation.get("S0"), Some(1));
        assert_eq!(allocation.get("S1"), Some(1));
        assert_eq!(allocation.get("S2"), Some(0));
    }

    #[test]
    fn test_peak_hours_absorb_difference() {
        let sheets = names(&["6-7AM", "7-8AM", "8-9AM", "9-10AM"]);
        let mut weights = HashMap::new();
        for sheet in &sheets {
            weights.insert(sheet.clone(), 0.2);
        }
        let allocation = redistribute(
            100,
            &sheets,
            &weights,
            &DistributionStrategy::twenty_four_hour(),
            &mut FixedRandom::midpoint(),
        )
        .unwrap();

        // 4 x 20 = 80, the missing 20 lands on the two peak sheets present
        assert_eq!(allocation.get("6-7AM"), Some(20));
        assert_eq!(allocation.get("7-8AM"), Some(30));
        assert_eq!(allocation.get("8-9AM"), Some(30));
        assert_eq!(allocation.get("9-10AM"), Some(20));
    }

    #[test]
    fn test_peak_hours_fall_back_to_all_sheets() {
        let allocation = redistribute(
            10,
            &names(&["A", "B"]),
            &HashMap::new(),
            &DistributionStrategy::twenty_four_hour(),
            &mut FixedRandom::midpoint(),
        )
        .unwrap();

        assert_eq!(allocation.total(), 10);
        assert_eq!(allocation.get("A"), Some(5));
        assert_eq!(allocation.get("B"), Some(5));
    }

    #[test]
    fn test_residual_never_goes_negative() {
        let mut values = vec![1, 5, 3];
        settle_residual(&mut values, 0, -4);
        assert_eq!(values.iter().sum::<i64>(), 5);
        assert!(values.iter().all(|v| *v >= 0));
        assert_eq!(values[0], 0);
    }

    #[test]
    fn test_largest_index_prefers_first() {
        assert_eq!(largest_index(&[3, 7, 7, 1]), 1);
        assert_eq!(largest_index(&[0]), 0);
    }

    #[test]
    fn test_empty_sheet_set_is_rejected() {
        let err = redistribute(
            5,
            &[],
            &HashMap::new(),
            &DistributionStrategy::sixteen_hour(),
            &mut FixedRandom::midpoint(),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::EmptySheetSet(5)));
    }

    #[test]
    fn test_zero_total() {
        let sheets = names(&["A", "B", "C", "D"]);
        for strategy in [
            DistributionStrategy::sixteen_hour(),
            DistributionStrategy::twenty_four_hour(),
        ] {
            let allocation = redistribute(
                0,
                &sheets,
                &HashMap::new(),
                &strategy,
                &mut SystemRandom::seeded(1),
            )
            .unwrap();
            assert_eq!(allocation.total(), 0);
        }
    }

    #[test]
    fn test_split_across_rows_last_row_takes_remainder() {
        let split = split_across_rows(10, &[4, 9, 12], 0.3, &mut FixedRandom::midpoint());
        assert_eq!(split, vec![(4, 3), (9, 3), (12, 4)]);
    }

    #[test]
    fn test_split_clamps_to_remaining() {
        // Maximum variation on a tiny amount: the first row takes everything
        let mut rng = SequenceRandom::new(vec![1.0]);
        let split = split_across_rows(1, &[1, 2], 0.3, &mut rng);
        assert_eq!(split.iter().map(|(_, v)| v).sum::<u64>(), 1);
    }

    #[test]
    fn test_split_zero_amount() {
        let split = split_across_rows(0, &[3, 5], 0.3, &mut FixedRandom::midpoint());
        assert_eq!(split, vec![(3, 0), (5, 0)]);
    }
}

use super::scoring::round_to;
use serde::Serialize;

/// Decimal places kept on consolidated yearly values.
pub const CONSOLIDATION_PRECISION: i32 = 4;

/// Reducer turning one year's periodic series into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Consolidation {
    /// Arithmetic mean of the non-null entries.
    Mean,
    /// Most recent non-null entry (snapshot-style measures).
    LastValue,
    /// Earliest non-null entry (single-entry annual flags).
    FirstValue,
}

impl Consolidation {
    pub fn consolidate(self, values: &[Option<f64>]) -> Option<f64> {
        let mut present = values.iter().flatten().copied().filter(|v| v.is_finite());

        let consolidated = match self {
            Consolidation::Mean => {
                let (sum, count) = present.fold((0.0, 0usize), |(sum, count), value| {
                    (sum + value, count + 1)
                });
                if count == 0 {
                    return None;
                }
                sum / count as f64
            }
            Consolidation::LastValue => present.last()?,
            Consolidation::FirstValue => present.next()?,
        };

        Some(round_to(consolidated, CONSOLIDATION_PRECISION))
    }
}

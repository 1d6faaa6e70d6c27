//! Scoring shapes mapping a consolidated yearly value to a normalized score.
//!
//! Every shape is plain data evaluated by [`ScoringShape::score`]. A `None` result means
//! "cannot score yet" (missing value or missing size parameter) and is distinct from a
//! legitimate score of `0.0`.

use super::domain::OperatorSize;
use serde::Serialize;
use std::collections::BTreeMap;

/// Decimal places kept on indicator scores.
pub const SCORE_PRECISION: i32 = 3;

/// Free-form numeric parameter bag for one operator size (e.g. `target`, `worse`).
pub type ParameterSet = BTreeMap<&'static str, f64>;

pub type ParametersBySize = BTreeMap<OperatorSize, ParameterSet>;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Linear score between a worse bound (0) and a target bound (1).
pub fn interpolate(value: f64, worse: f64, target: f64, better_is_lower: bool) -> f64 {
    let score = if better_is_lower {
        if value <= target {
            return 1.0;
        }
        if value >= worse {
            return 0.0;
        }
        1.0 - (value - target) / (worse - target)
    } else {
        if value >= target {
            return 1.0;
        }
        if value <= worse {
            return 0.0;
        }
        (value - worse) / (target - worse)
    };
    round_to(score, SCORE_PRECISION)
}

/// One rung of a step table: values at or above `lower_bound` earn `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBand {
    pub lower_bound: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ScoringShape {
    /// Fixed target/worse bounds with linear interpolation between them.
    ThresholdInterpolate {
        target: f64,
        worse: f64,
        better_is_lower: bool,
    },
    /// Interpolation reading `target`/`worse` from the operator size's parameters.
    SizeParametrized { better_is_lower: bool },
    /// Bands ordered by descending lower bound; below the last band scores 0.
    PiecewiseStep { bands: Vec<StepBand> },
    /// Higher-is-better interpolation from zero whose ceiling drops when the auxiliary
    /// value does not stay under `aux_ceiling`.
    DualGated {
        target: f64,
        aux_ceiling: f64,
        ungated_full_score: f64,
        ungated_factor: f64,
    },
    /// 50/50 average of a mean-adjustment factor (against a size parameter) and a
    /// dispersion factor carried in the auxiliary value.
    CompositeAverage {
        reference_parameter: &'static str,
        dispersion_target: f64,
        dispersion_worse: f64,
    },
    /// Higher-is-better interpolation plus a bonus driven by the auxiliary value.
    AuxBonus {
        target: f64,
        worse: f64,
        full_bonus_above: f64,
        full_bonus: f64,
        partial_bonus_from: f64,
        partial_bonus: f64,
    },
    /// `1` when the operator participated (`value == 1`), otherwise `0`.
    Flag,
    /// `1` when the value does not exceed `ceiling`, otherwise `0`.
    CeilingFlag { ceiling: f64 },
    /// The value itself, clamped to `[0, 1]`.
    Passthrough,
}

impl ScoringShape {
    pub fn score(
        &self,
        value: Option<f64>,
        aux: Option<f64>,
        operator_size: Option<OperatorSize>,
        parameters: Option<&ParametersBySize>,
    ) -> Option<f64> {
        let value = value.filter(|value| value.is_finite())?;
        let aux = aux.filter(|aux| aux.is_finite());

        match self {
            ScoringShape::ThresholdInterpolate {
                target,
                worse,
                better_is_lower,
            } => Some(interpolate(value, *worse, *target, *better_is_lower)),
            ScoringShape::SizeParametrized { better_is_lower } => {
                let target = size_parameter(parameters, operator_size, "target")?;
                let worse = size_parameter(parameters, operator_size, "worse")?;
                Some(interpolate(value, worse, target, *better_is_lower))
            }
            ScoringShape::PiecewiseStep { bands } => Some(
                bands
                    .iter()
                    .find(|band| value >= band.lower_bound)
                    .map(|band| band.score)
                    .unwrap_or(0.0),
            ),
            ScoringShape::DualGated {
                target,
                aux_ceiling,
                ungated_full_score,
                ungated_factor,
            } => {
                let gate_met = aux.map(|aux| aux < *aux_ceiling).unwrap_or(false);
                let score = if value >= *target {
                    if gate_met {
                        1.0
                    } else {
                        *ungated_full_score
                    }
                } else if value > 0.0 {
                    let partial = interpolate(value, 0.0, *target, false);
                    if gate_met {
                        partial
                    } else {
                        partial * ungated_factor
                    }
                } else {
                    0.0
                };
                Some(round_to(score, SCORE_PRECISION))
            }
            ScoringShape::CompositeAverage {
                reference_parameter,
                dispersion_target,
                dispersion_worse,
            } => {
                let dispersion = aux?;
                let reference = size_parameter(parameters, operator_size, reference_parameter)
                    .filter(|reference| *reference != 0.0)?;

                let adjustment = if value <= reference {
                    1.0
                } else if value < 2.0 * reference {
                    1.0 - (value - reference) / reference
                } else {
                    0.0
                };

                let spread = if dispersion <= *dispersion_target {
                    1.0
                } else if dispersion <= *dispersion_worse {
                    1.0 - (dispersion - dispersion_target) / (dispersion_worse - dispersion_target)
                } else {
                    0.0
                };

                Some(round_to(
                    0.5 * adjustment.max(0.0) + 0.5 * spread.max(0.0),
                    SCORE_PRECISION,
                ))
            }
            ScoringShape::AuxBonus {
                target,
                worse,
                full_bonus_above,
                full_bonus,
                partial_bonus_from,
                partial_bonus,
            } => {
                let base = interpolate(value, *worse, *target, false);
                let bonus = match aux {
                    Some(aux) if aux > *full_bonus_above => *full_bonus,
                    Some(aux) if aux >= *partial_bonus_from => *partial_bonus,
                    _ => 0.0,
                };
                Some(round_to((base + bonus).min(1.0), SCORE_PRECISION))
            }
            ScoringShape::Flag => Some(if value == 1.0 { 1.0 } else { 0.0 }),
            ScoringShape::CeilingFlag { ceiling } => {
                Some(if value <= *ceiling { 1.0 } else { 0.0 })
            }
            ScoringShape::Passthrough => Some(round_to(value.clamp(0.0, 1.0), SCORE_PRECISION)),
        }
    }

    /// Bounds for shapes that interpolate between a target and a worse value.
    pub fn interpolation_bounds(
        &self,
        operator_size: Option<OperatorSize>,
        parameters: Option<&ParametersBySize>,
    ) -> Option<(f64, f64, bool)> {
        match self {
            ScoringShape::ThresholdInterpolate {
                target,
                worse,
                better_is_lower,
            } => Some((*target, *worse, *better_is_lower)),
            ScoringShape::SizeParametrized { better_is_lower } => Some((
                size_parameter(parameters, operator_size, "target")?,
                size_parameter(parameters, operator_size, "worse")?,
                *better_is_lower,
            )),
            _ => None,
        }
    }
}

fn size_parameter(
    parameters: Option<&ParametersBySize>,
    operator_size: Option<OperatorSize>,
    name: &str,
) -> Option<f64> {
    parameters?.get(&operator_size?)?.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_params(target: f64, worse: f64) -> ParametersBySize {
        OperatorSize::ordered()
            .into_iter()
            .map(|size| (size, ParameterSet::from([("target", target), ("worse", worse)])))
            .collect()
    }

    #[test]
    fn interpolation_clamps_beyond_bounds() {
        assert_eq!(interpolate(40.0, 80.0, 45.0, true), 1.0);
        assert_eq!(interpolate(95.0, 80.0, 45.0, true), 0.0);
        assert_eq!(interpolate(62.5, 80.0, 45.0, true), 0.5);
        assert_eq!(interpolate(4.5, 2.0, 7.0, false), 0.5);
        assert_eq!(interpolate(1.0, 2.0, 7.0, false), 0.0);
    }

    #[test]
    fn interpolation_rounds_to_three_places() {
        assert_eq!(interpolate(3.0, 2.0, 5.0, false), 0.333);
        assert_eq!(interpolate(4.0, 2.0, 5.0, false), 0.667);
    }

    #[test]
    fn size_parametrized_returns_none_without_parameters() {
        let shape = ScoringShape::SizeParametrized {
            better_is_lower: true,
        };
        assert_eq!(shape.score(Some(3.0), None, Some(OperatorSize::Medio), None), None);
        assert_eq!(
            shape.score(Some(3.0), None, None, Some(&size_params(2.0, 30.0))),
            None
        );

        let incomplete: ParametersBySize =
            BTreeMap::from([(OperatorSize::Medio, ParameterSet::from([("target", 2.0)]))]);
        assert_eq!(
            shape.score(Some(3.0), None, Some(OperatorSize::Medio), Some(&incomplete)),
            None
        );
    }

    #[test]
    fn size_parametrized_reads_bounds_for_size() {
        let shape = ScoringShape::SizeParametrized {
            better_is_lower: true,
        };
        let params = size_params(2.0, 30.0);
        assert_eq!(
            shape.score(Some(16.0), None, Some(OperatorSize::Grande), Some(&params)),
            Some(0.5)
        );
    }

    #[test]
    fn dual_gate_caps_score_when_aux_fails() {
        let shape = ScoringShape::DualGated {
            target: 0.062,
            aux_ceiling: 0.0011513,
            ungated_full_score: 0.9,
            ungated_factor: 0.8,
        };
        assert_eq!(shape.score(Some(0.07), Some(0.001), None, None), Some(1.0));
        assert_eq!(shape.score(Some(0.07), Some(0.002), None, None), Some(0.9));
        assert_eq!(shape.score(Some(0.07), None, None, None), Some(0.9));
        assert_eq!(shape.score(Some(0.031), Some(0.001), None, None), Some(0.5));
        assert_eq!(shape.score(Some(0.031), Some(0.5), None, None), Some(0.4));
        assert_eq!(shape.score(Some(0.0), Some(0.001), None, None), Some(0.0));
    }

    #[test]
    fn composite_average_needs_dispersion_and_reference() {
        let shape = ScoringShape::CompositeAverage {
            reference_parameter: "indiceReferenciaRPC",
            dispersion_target: 0.15,
            dispersion_worse: 1.0,
        };
        let params: ParametersBySize = OperatorSize::ordered()
            .into_iter()
            .map(|size| (size, ParameterSet::from([("indiceReferenciaRPC", 0.08)])))
            .collect();
        let size = Some(OperatorSize::Pequeno);

        assert_eq!(shape.score(Some(0.05), None, size, Some(&params)), None);
        assert_eq!(shape.score(Some(0.05), Some(0.1), size, None), None);
        assert_eq!(shape.score(Some(0.05), Some(0.1), size, Some(&params)), Some(1.0));
        // adjustment 0.5, dispersion 0.5
        assert_eq!(
            shape.score(Some(0.12), Some(0.575), size, Some(&params)),
            Some(0.5)
        );
        assert_eq!(shape.score(Some(0.2), Some(2.0), size, Some(&params)), Some(0.0));
    }

    #[test]
    fn aux_bonus_adds_and_caps() {
        let shape = ScoringShape::AuxBonus {
            target: 99.0,
            worse: 65.0,
            full_bonus_above: 95.0,
            full_bonus: 0.10,
            partial_bonus_from: 85.0,
            partial_bonus: 0.05,
        };
        assert_eq!(shape.score(Some(82.0), None, None, None), Some(0.5));
        assert_eq!(shape.score(Some(82.0), Some(90.0), None, None), Some(0.55));
        assert_eq!(shape.score(Some(82.0), Some(96.0), None, None), Some(0.6));
        assert_eq!(shape.score(Some(99.5), Some(96.0), None, None), Some(1.0));
        assert_eq!(shape.score(Some(50.0), Some(96.0), None, None), Some(0.1));
    }

    #[test]
    fn flags_and_passthrough() {
        assert_eq!(ScoringShape::Flag.score(Some(1.0), None, None, None), Some(1.0));
        assert_eq!(ScoringShape::Flag.score(Some(0.0), None, None, None), Some(0.0));
        assert_eq!(ScoringShape::Flag.score(Some(2.0), None, None, None), Some(0.0));

        let ceiling = ScoringShape::CeilingFlag { ceiling: 0.30 };
        assert_eq!(ceiling.score(Some(0.30), None, None, None), Some(1.0));
        assert_eq!(ceiling.score(Some(0.31), None, None, None), Some(0.0));

        let passthrough = ScoringShape::Passthrough;
        assert_eq!(passthrough.score(Some(0.4567), None, None, None), Some(0.457));
        assert_eq!(passthrough.score(Some(90.0), None, None, None), Some(1.0));
    }

    #[test]
    fn non_finite_values_do_not_score() {
        assert_eq!(ScoringShape::Flag.score(Some(f64::NAN), None, None, None), None);
        assert_eq!(
            ScoringShape::Passthrough.score(Some(f64::INFINITY), None, None, None),
            None
        );
    }
}

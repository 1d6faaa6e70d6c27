//! Weighted roll-up of indicator scores into dimension scores and the overall index.

use super::domain::{ContributionMode, ScoringContext};
use super::model::IdssTree;
use super::pipeline;
use super::scoring::round_to;

/// Decimal places kept on dimension and overall scores.
pub const AGGREGATE_PRECISION: i32 = 4;

/// One scored child entering a roll-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub score: f64,
    pub weight: f64,
    pub mode: ContributionMode,
}

/// Weighted average of regular scores plus additive bonuses, capped at 1.
///
/// `None` only when no child contributes a score.
pub fn dimension_score<I>(contributions: I) -> Option<f64>
where
    I: IntoIterator<Item = Contribution>,
{
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut bonus = 0.0;
    let mut contributors = 0usize;

    for contribution in contributions {
        if !contribution.score.is_finite() {
            continue;
        }
        contributors += 1;
        match contribution.mode {
            ContributionMode::Weighted => {
                weighted_sum += contribution.score * contribution.weight;
                weight_total += contribution.weight;
            }
            ContributionMode::Bonus => bonus += contribution.score * contribution.weight,
        }
    }

    if contributors == 0 {
        return None;
    }

    let base = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };
    Some(round_to((base + bonus).min(1.0), AGGREGATE_PRECISION))
}

/// Weight-normalized average over the dimensions that have a score.
pub fn overall_score<I>(dimensions: I) -> Option<f64>
where
    I: IntoIterator<Item = (Option<f64>, f64)>,
{
    let (sum, weight) = dimensions
        .into_iter()
        .filter_map(|(score, weight)| score.filter(|score| score.is_finite()).map(|s| (s, weight)))
        .fold((0.0, 0.0), |(sum, total), (score, weight)| {
            (sum + score * weight, total + weight)
        });

    (weight > 0.0).then(|| round_to(sum / weight, AGGREGATE_PRECISION))
}

/// Recomputes every indicator for the context year, then both aggregate levels.
///
/// Narratives on a dimension or on the index are dropped when its score moves.
pub fn recalculate(tree: &mut IdssTree, context: ScoringContext) {
    rescore(tree, context, true);
}

/// First scoring pass over a freshly loaded tree. Dimension and index narratives read
/// with the document are kept, since there is no earlier score for them to outlive.
pub fn score_loaded(tree: &mut IdssTree, context: ScoringContext) {
    rescore(tree, context, false);
}

fn rescore(tree: &mut IdssTree, context: ScoringContext, invalidate: bool) {
    let mut indicators_changed = 0usize;

    for dimension in &mut tree.dimensions {
        for indicator in &mut dimension.indicators {
            if pipeline::recompute(indicator, context) {
                indicators_changed += 1;
            }
        }

        let score = dimension_score(dimension.indicators.iter().filter_map(|indicator| {
            let nota = indicator.result(context.reference_year)?.nota_final?;
            Some(Contribution {
                score: nota,
                weight: indicator.definition.weight_in_dimension,
                mode: indicator.definition.contribution,
            })
        }));

        if invalidate && score != dimension.nota_final_calculada {
            dimension.narrative.clear();
        }
        dimension.nota_final_calculada = score;
    }

    let overall = overall_score(
        tree.dimensions
            .iter()
            .map(|dimension| (dimension.nota_final_calculada, dimension.weight_in_idss)),
    );
    if invalidate && overall != tree.nota_final_calculada {
        tree.narrative.clear();
    }
    tree.nota_final_calculada = overall;
    if invalidate && indicators_changed > 0 {
        tree.overall_indicators_narrative.clear();
    }

    tracing::debug!(
        year = context.reference_year,
        operator_size = %context.operator_size,
        indicators_changed,
        overall = ?tree.nota_final_calculada,
        "recalculated index"
    );
}

/// Value-in, value-out form of [`recalculate`].
pub fn aggregate(mut tree: IdssTree, context: ScoringContext) -> IdssTree {
    recalculate(&mut tree, context);
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idss::catalog::IndicatorCatalog;
    use crate::idss::domain::{DimensionId, OperatorSize};

    fn weighted(score: f64, weight: f64) -> Contribution {
        Contribution {
            score,
            weight,
            mode: ContributionMode::Weighted,
        }
    }

    fn bonus(score: f64, weight: f64) -> Contribution {
        Contribution {
            score,
            weight,
            mode: ContributionMode::Bonus,
        }
    }

    #[test]
    fn two_indicator_weighted_average() {
        assert_eq!(
            dimension_score([weighted(0.8, 2.0), weighted(0.4, 3.0)]),
            Some(0.56)
        );
    }

    #[test]
    fn no_contributors_is_none_not_zero() {
        assert_eq!(dimension_score(Vec::new()), None);
        assert_eq!(overall_score(vec![(None, 0.3), (None, 0.1)]), None);
    }

    #[test]
    fn all_ones_give_full_base() {
        assert_eq!(
            dimension_score([weighted(1.0, 3.0), weighted(1.0, 2.0), weighted(1.0, 1.0)]),
            Some(1.0)
        );
    }

    #[test]
    fn bonus_adds_on_top_and_caps_at_one() {
        assert_eq!(
            dimension_score([weighted(0.5, 1.0), bonus(1.0, 0.25)]),
            Some(0.75)
        );
        assert_eq!(dimension_score([weighted(0.95, 1.0), bonus(1.0, 0.2)]), Some(1.0));
        assert_eq!(dimension_score([bonus(1.0, 0.1)]), Some(0.1));
    }

    #[test]
    fn overall_divides_by_realized_weight() {
        assert_eq!(overall_score(vec![(Some(0.8), 0.3), (None, 0.3)]), Some(0.8));
        assert_eq!(
            overall_score(vec![(Some(1.0), 0.3), (Some(0.5), 0.1)]),
            Some(0.875)
        );
    }

    #[test]
    fn recalculate_scores_tree_and_clears_moved_narratives() {
        let catalog = IndicatorCatalog::standard();
        let context = ScoringContext {
            reference_year: 2024,
            operator_size: OperatorSize::Grande,
        };
        let mut tree = aggregate(IdssTree::from_catalog(catalog), context);
        assert_eq!(tree.nota_final_calculada, None);
        assert!(tree
            .dimensions
            .iter()
            .all(|dimension| dimension.nota_final_calculada.is_none()));

        tree.narrative.store(Ok("old".to_string()));
        let icr = tree.indicator_mut("3.1").expect("ICR present");
        icr.ensure_result(2024).periodic_data[0].value = Some(3.6);
        recalculate(&mut tree, context);

        let idsm = tree.dimension(DimensionId::Idsm).expect("IDSM present");
        assert_eq!(idsm.nota_final_calculada, Some(1.0));
        assert_eq!(tree.nota_final_calculada, Some(1.0));
        assert!(tree.narrative.is_empty());
    }

    #[test]
    fn first_pass_over_loaded_tree_keeps_narratives() {
        let context = ScoringContext {
            reference_year: 2024,
            operator_size: OperatorSize::Grande,
        };
        let mut tree = IdssTree::from_catalog(IndicatorCatalog::standard());
        tree.indicator_mut("3.1")
            .expect("ICR present")
            .ensure_result(2024)
            .periodic_data[0]
            .value = Some(3.6);
        tree.narrative.store(Ok("saved overall".to_string()));
        tree.overall_indicators_narrative.store(Ok("saved indicators".to_string()));
        tree.dimension_mut(DimensionId::Idsm)
            .expect("IDSM present")
            .narrative
            .store(Ok("saved idsm".to_string()));

        score_loaded(&mut tree, context);

        let idsm = tree.dimension(DimensionId::Idsm).expect("IDSM present");
        assert_eq!(idsm.nota_final_calculada, Some(1.0));
        assert_eq!(idsm.narrative.analysis.as_deref(), Some("saved idsm"));
        assert_eq!(tree.nota_final_calculada, Some(1.0));
        assert_eq!(tree.narrative.analysis.as_deref(), Some("saved overall"));
        assert_eq!(
            tree.overall_indicators_narrative.analysis.as_deref(),
            Some("saved indicators")
        );
    }
}

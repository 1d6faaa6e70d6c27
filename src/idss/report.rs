use super::archive::HistoricalIdssScore;
use super::domain::{ContributionMode, DimensionId, OperatorSize, ResultSource, ScoringContext};
use super::model::{Dimension, IdssTree, Indicator};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorReportEntry {
    pub id: &'static str,
    pub simple_name: &'static str,
    pub contribution: ContributionMode,
    pub weight: f64,
    pub consolidated_value: Option<f64>,
    pub consolidated_aux_value: Option<f64>,
    pub nota_final: Option<f64>,
    /// `nota_final * weight`, the amount fed into the dimension sums.
    pub weighted_points: Option<f64>,
    pub source: Option<ResultSource>,
}

impl IndicatorReportEntry {
    fn from_indicator(indicator: &Indicator, year: i32) -> Self {
        let definition = indicator.definition;
        let result = indicator.result(year);
        let nota_final = result.and_then(|result| result.nota_final);
        Self {
            id: definition.id,
            simple_name: definition.simple_name,
            contribution: definition.contribution,
            weight: definition.weight_in_dimension,
            consolidated_value: result.and_then(|result| result.consolidated_value),
            consolidated_aux_value: result.and_then(|result| result.consolidated_aux_value),
            nota_final,
            weighted_points: nota_final.map(|nota| nota * definition.weight_in_dimension),
            source: result.map(|result| result.source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionReportEntry {
    pub id: DimensionId,
    pub label: &'static str,
    pub weight_in_idss: f64,
    pub nota_final: Option<f64>,
    pub scored_indicators: usize,
    pub indicators: Vec<IndicatorReportEntry>,
}

impl DimensionReportEntry {
    fn from_dimension(dimension: &Dimension, year: i32) -> Self {
        let indicators: Vec<IndicatorReportEntry> = dimension
            .indicators
            .iter()
            .map(|indicator| IndicatorReportEntry::from_indicator(indicator, year))
            .collect();
        Self {
            id: dimension.id,
            label: dimension.name,
            weight_in_idss: dimension.weight_in_idss,
            nota_final: dimension.nota_final_calculada,
            scored_indicators: indicators
                .iter()
                .filter(|entry| entry.nota_final.is_some())
                .count(),
            indicators,
        }
    }
}

/// Flat summary of a scored tree for one reference year and operator size.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdssReport {
    pub reference_year: i32,
    pub operator_size: OperatorSize,
    pub operator_size_label: &'static str,
    pub nota_final: Option<f64>,
    pub dimensions: Vec<DimensionReportEntry>,
    pub historical_scores: Vec<HistoricalIdssScore>,
}

impl IdssReport {
    pub fn from_tree(tree: &IdssTree, context: ScoringContext) -> Self {
        Self {
            reference_year: context.reference_year,
            operator_size: context.operator_size,
            operator_size_label: context.operator_size.label(),
            nota_final: tree.nota_final_calculada,
            dimensions: tree
                .dimensions
                .iter()
                .map(|dimension| DimensionReportEntry::from_dimension(dimension, context.reference_year))
                .collect(),
            historical_scores: tree.historical_idss_scores.clone(),
        }
    }

    /// Plain-text rendering used by the command line.
    pub fn render_text(&self, include_indicators: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "IDSS {} ({}): {}",
            self.reference_year,
            self.operator_size_label,
            format_score(self.nota_final)
        );

        for dimension in &self.dimensions {
            let _ = writeln!(
                out,
                "- {} {} (weight {:.2}): {} [{}/{} scored]",
                dimension.id,
                dimension.label,
                dimension.weight_in_idss,
                format_score(dimension.nota_final),
                dimension.scored_indicators,
                dimension.indicators.len()
            );
            if include_indicators {
                for indicator in &dimension.indicators {
                    let bonus = match indicator.contribution {
                        ContributionMode::Bonus => " (bonus)",
                        ContributionMode::Weighted => "",
                    };
                    let _ = writeln!(
                        out,
                        "    {} {}{}: value {}, score {}",
                        indicator.id,
                        indicator.simple_name,
                        bonus,
                        format_score(indicator.consolidated_value),
                        format_score(indicator.nota_final)
                    );
                }
            }
        }

        if !self.historical_scores.is_empty() {
            let _ = writeln!(out, "\nHistorical IDSS");
            for score in &self.historical_scores {
                let _ = writeln!(
                    out,
                    "- program {} (base {}): {} [{}]",
                    score.program_year,
                    score.base_year,
                    format_score(score.score),
                    score.source
                );
            }
        }
        out
    }
}

fn format_score(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.4}"))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idss::aggregation::aggregate;
    use crate::idss::catalog::IndicatorCatalog;

    #[test]
    fn report_lists_every_dimension_and_scored_count() {
        let context = ScoringContext {
            reference_year: 2024,
            operator_size: OperatorSize::Grande,
        };
        let mut tree = IdssTree::from_catalog(IndicatorCatalog::standard());
        tree.indicator_mut("4.3")
            .expect("TISS present")
            .ensure_result(2024)
            .periodic_data[0]
            .value = Some(0.65);
        let tree = aggregate(tree, context);

        let report = IdssReport::from_tree(&tree, context);
        assert_eq!(report.dimensions.len(), 4);
        let idgr = &report.dimensions[3];
        assert_eq!(idgr.id, DimensionId::Idgr);
        assert_eq!(idgr.scored_indicators, 1);
        let tiss = idgr
            .indicators
            .iter()
            .find(|entry| entry.id == "4.3")
            .expect("TISS listed");
        assert_eq!(tiss.nota_final, Some(0.5));
        assert_eq!(tiss.weighted_points, Some(1.0));

        let text = report.render_text(true);
        assert!(text.starts_with("IDSS 2024 (Grande Porte): 0.5000"));
        assert!(text.contains("4.3 Completude TISS/DIOPS: value 0.6500, score 0.5000"));
        assert!(text.contains("1.1 Parto Cesáreo: value n/a, score n/a"));
    }
}

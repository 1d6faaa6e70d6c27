//! Request payloads for the external narrative-analysis service.
//!
//! The core assembles the numeric facts for one node, hands them to an
//! [`AnalysisProvider`], and stores whatever text or error comes back on that node.

use super::archive::HistoricalIdssScore;
use super::domain::{
    DimensionId, IndicatorAnalysisKind, OperatorSize, ScoringContext, TargetDirection,
};
use super::model::{Dimension, IdssTree, Indicator};
use super::scoring::ParameterSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    IndicatorLastPeriod,
    IndicatorYearlyConsolidated,
    IndicatorYearlyComparison,
    Dimension,
    Idss,
    OverallIndicators,
}

/// The node an analysis is about; its tag doubles as the analysis type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisTarget {
    #[serde(rename_all = "camelCase")]
    IndicatorLastPeriod { indicator_id: String },
    #[serde(rename_all = "camelCase")]
    IndicatorYearlyConsolidated { indicator_id: String },
    #[serde(rename_all = "camelCase")]
    IndicatorYearlyComparison { indicator_id: String },
    #[serde(rename_all = "camelCase")]
    Dimension { dimension_id: DimensionId },
    Idss,
    OverallIndicators,
}

impl AnalysisTarget {
    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            Self::IndicatorLastPeriod { .. } => AnalysisType::IndicatorLastPeriod,
            Self::IndicatorYearlyConsolidated { .. } => AnalysisType::IndicatorYearlyConsolidated,
            Self::IndicatorYearlyComparison { .. } => AnalysisType::IndicatorYearlyComparison,
            Self::Dimension { .. } => AnalysisType::Dimension,
            Self::Idss => AnalysisType::Idss,
            Self::OverallIndicators => AnalysisType::OverallIndicators,
        }
    }

    /// Indicator id and narrative slot for indicator-level targets.
    pub fn indicator_slot(&self) -> Option<(&str, IndicatorAnalysisKind)> {
        match self {
            Self::IndicatorLastPeriod { indicator_id } => {
                Some((indicator_id.as_str(), IndicatorAnalysisKind::LastPeriod))
            }
            Self::IndicatorYearlyConsolidated { indicator_id } => {
                Some((indicator_id.as_str(), IndicatorAnalysisKind::YearlyConsolidated))
            }
            Self::IndicatorYearlyComparison { indicator_id } => {
                Some((indicator_id.as_str(), IndicatorAnalysisKind::YearlyComparison))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorFacts {
    pub indicator_id: &'static str,
    pub indicator_name: &'static str,
    pub simple_name: &'static str,
    pub description: &'static str,
    pub target_description: &'static str,
    pub responsible_sector: &'static str,
    pub target_direction: TargetDirection,
    pub is_rate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_for_porte: Option<ParameterSet>,
    pub current_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_year_value: Option<f64>,
    pub nota_final: Option<f64>,
    pub active_reference_year: i32,
}

impl IndicatorFacts {
    fn base(indicator: &Indicator, context: ScoringContext) -> Self {
        let definition = indicator.definition;
        let result = indicator.result(context.reference_year);
        Self {
            indicator_id: definition.id,
            indicator_name: definition.name,
            simple_name: definition.simple_name,
            description: definition.description,
            target_description: definition.target_description,
            responsible_sector: definition.responsible_sector,
            target_direction: definition.target_direction,
            is_rate: definition.is_rate,
            parameters_for_porte: definition.parameters_for(context.operator_size).cloned(),
            current_value: result.and_then(|result| result.consolidated_value),
            current_period_label: None,
            previous_year_value: None,
            nota_final: result.and_then(|result| result.nota_final),
            active_reference_year: context.reference_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionFacts {
    pub id: DimensionId,
    pub name: &'static str,
    #[serde(rename = "weightInIDSS")]
    pub weight_in_idss: f64,
    pub nota_final_calculada: Option<f64>,
    pub indicators: Vec<IndicatorFacts>,
}

impl DimensionFacts {
    fn from_dimension(dimension: &Dimension, context: ScoringContext) -> Self {
        Self {
            id: dimension.id,
            name: dimension.name,
            weight_in_idss: dimension.weight_in_idss,
            nota_final_calculada: dimension.nota_final_calculada,
            indicators: dimension
                .indicators
                .iter()
                .map(|indicator| IndicatorFacts::base(indicator, context))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdssFacts {
    pub nota_final_calculada: Option<f64>,
    pub dimensions: Vec<DimensionFacts>,
    pub historical_idss_scores: Vec<HistoricalIdssScore>,
}

/// Everything the external service receives for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    pub operator_size: OperatorSize,
    pub active_reference_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator_data: Option<IndicatorFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_data: Option<DimensionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idss_data: Option<IdssFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_indicators_data: Option<Vec<IndicatorFacts>>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("indicator '{0}' is not part of the catalog")]
    UnknownIndicator(String),
    #[error("dimension {0} is not part of the index")]
    UnknownDimension(DimensionId),
    #[error("no results for {year} to analyze")]
    MissingYear { year: i32 },
    #[error("no period has a value filled in for the current year")]
    NoFilledPeriod,
    #[error("the yearly consolidated value is null; analysis cannot be generated")]
    NullConsolidatedValue,
    #[error("analysis service failed: {0}")]
    Provider(String),
}

/// Seam to the external text generator.
pub trait AnalysisProvider {
    fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

/// Assembles the payload for `target` from the tree as scored for `context`.
///
/// Indicator analyses fail early when their inputs are missing; those failures are
/// meant to be stored on the node like any provider error.
pub fn build_request(
    tree: &IdssTree,
    target: &AnalysisTarget,
    context: ScoringContext,
) -> Result<AnalysisRequest, AnalysisError> {
    let mut request = AnalysisRequest {
        analysis_type: target.analysis_type(),
        operator_size: context.operator_size,
        active_reference_year: context.reference_year,
        indicator_data: None,
        dimension_data: None,
        idss_data: None,
        overall_indicators_data: None,
    };

    match target {
        AnalysisTarget::IndicatorLastPeriod { indicator_id } => {
            let indicator = find_indicator(tree, indicator_id)?;
            let result = indicator
                .result(context.reference_year)
                .ok_or(AnalysisError::MissingYear {
                    year: context.reference_year,
                })?;
            let (label, value) = result
                .last_filled_period()
                .ok_or(AnalysisError::NoFilledPeriod)?;
            request.indicator_data = Some(IndicatorFacts {
                current_value: Some(value),
                current_period_label: Some(label.to_string()),
                nota_final: None,
                ..IndicatorFacts::base(indicator, context)
            });
        }
        AnalysisTarget::IndicatorYearlyConsolidated { indicator_id } => {
            let indicator = find_indicator(tree, indicator_id)?;
            let facts = consolidated_facts(indicator, context)?;
            request.indicator_data = Some(facts);
        }
        AnalysisTarget::IndicatorYearlyComparison { indicator_id } => {
            let indicator = find_indicator(tree, indicator_id)?;
            let facts = consolidated_facts(indicator, context)?;
            let previous_year_value = indicator
                .result(context.reference_year - 1)
                .and_then(|result| result.consolidated_value);
            request.indicator_data = Some(IndicatorFacts {
                previous_year_value,
                nota_final: None,
                ..facts
            });
        }
        AnalysisTarget::Dimension { dimension_id } => {
            let dimension = tree
                .dimension(*dimension_id)
                .ok_or(AnalysisError::UnknownDimension(*dimension_id))?;
            request.dimension_data = Some(DimensionFacts::from_dimension(dimension, context));
        }
        AnalysisTarget::Idss => {
            request.idss_data = Some(IdssFacts {
                nota_final_calculada: tree.nota_final_calculada,
                dimensions: tree
                    .dimensions
                    .iter()
                    .map(|dimension| DimensionFacts::from_dimension(dimension, context))
                    .collect(),
                historical_idss_scores: tree.historical_idss_scores.clone(),
            });
        }
        AnalysisTarget::OverallIndicators => {
            request.overall_indicators_data = Some(
                tree.indicators()
                    .map(|indicator| IndicatorFacts::base(indicator, context))
                    .collect(),
            );
        }
    }

    Ok(request)
}

/// Builds the request and asks the provider, folding every failure into an error string.
pub fn run<P>(
    provider: &P,
    tree: &IdssTree,
    target: &AnalysisTarget,
    context: ScoringContext,
) -> Result<String, String>
where
    P: AnalysisProvider + ?Sized,
{
    build_request(tree, target, context)
        .and_then(|request| provider.analyze(&request))
        .map_err(|err| {
            tracing::warn!(analysis = ?target.analysis_type(), error = %err, "analysis failed");
            err.to_string()
        })
}

fn find_indicator<'a>(tree: &'a IdssTree, id: &str) -> Result<&'a Indicator, AnalysisError> {
    tree.indicator(id)
        .ok_or_else(|| AnalysisError::UnknownIndicator(id.to_string()))
}

fn consolidated_facts(
    indicator: &Indicator,
    context: ScoringContext,
) -> Result<IndicatorFacts, AnalysisError> {
    let result = indicator
        .result(context.reference_year)
        .ok_or(AnalysisError::MissingYear {
            year: context.reference_year,
        })?;
    if result.consolidated_value.is_none() {
        return Err(AnalysisError::NullConsolidatedValue);
    }
    Ok(IndicatorFacts::base(indicator, context))
}

//! Single owner of the reconciled tree, driven by explicit actions.
//!
//! Every action yields a new state value with the whole tree recalculated, so
//! readers never see periodic data out of step with its derived scores.

use super::aggregation::{recalculate, score_loaded};
use super::analysis::{self, AnalysisError, AnalysisProvider, AnalysisRequest, AnalysisTarget};
use super::archive::{ArchiveError, HistoricalAction, HistoricalDataArchive};
use super::catalog::IndicatorCatalog;
use super::domain::{
    DimensionId, NarrativeSlot, OperatorSize, Periodicity, ResultSource, ScoringContext, SeriesField,
};
use super::model::IdssTree;
use super::pipeline::{matches_periodicity, rebuild_periodic_data};
use super::reconciliation::{
    available_years, merge_historical, merge_operational, OperationalDocument,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdssAction {
    SetReferenceYear {
        year: i32,
    },
    #[serde(rename_all = "camelCase")]
    SetOperatorSize {
        operator_size: OperatorSize,
    },
    /// Edits one period of the reference year.
    #[serde(rename_all = "camelCase")]
    SetPeriodicValue {
        indicator_id: String,
        period_index: usize,
        field: SeriesField,
        value: Option<f64>,
    },
    /// Switches an indicator's cadence for the reference year onward.
    #[serde(rename_all = "camelCase")]
    SetPeriodicity {
        indicator_id: String,
        periodicity: Periodicity,
    },
    SetAnalysisResult {
        target: AnalysisTarget,
        #[serde(default)]
        analysis: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    CloseAnalysis {
        target: AnalysisTarget,
    },
    /// Replaces the archive and merges it into the tree.
    MergeHistorical {
        archive: HistoricalDataArchive,
    },
    EditArchive {
        action: HistoricalAction,
    },
    Recalculate,
}

impl IdssAction {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SetReferenceYear { .. } => "set_reference_year",
            Self::SetOperatorSize { .. } => "set_operator_size",
            Self::SetPeriodicValue { .. } => "set_periodic_value",
            Self::SetPeriodicity { .. } => "set_periodicity",
            Self::SetAnalysisResult { .. } => "set_analysis_result",
            Self::CloseAnalysis { .. } => "close_analysis",
            Self::MergeHistorical { .. } => "merge_historical",
            Self::EditArchive { .. } => "edit_archive",
            Self::Recalculate => "recalculate",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("indicator '{0}' is not part of the catalog")]
    UnknownIndicator(String),
    #[error("dimension {0} is not part of the index")]
    UnknownDimension(DimensionId),
    #[error("indicator '{indicator_id}' does not support {periodicity:?} periodicity")]
    UnsupportedPeriodicity {
        indicator_id: String,
        periodicity: Periodicity,
    },
    #[error("indicator '{0}' does not track an auxiliary value")]
    AuxValueNotTracked(String),
    #[error("period index {index} is out of range for indicator '{indicator_id}' in {year}")]
    PeriodOutOfRange {
        indicator_id: String,
        year: i32,
        index: usize,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdssState {
    pub context: ScoringContext,
    pub available_years: Vec<i32>,
    pub tree: IdssTree,
    #[serde(skip)]
    pub archive: HistoricalDataArchive,
}

impl IdssState {
    /// Builds the scored tree from both documents.
    pub fn reconcile(
        operational: &OperationalDocument,
        archive: HistoricalDataArchive,
        context: ScoringContext,
        current_year: i32,
    ) -> Self {
        let catalog = IndicatorCatalog::standard();
        let archive = archive.normalized();
        let mut tree = merge_operational(catalog, operational);
        merge_historical(&mut tree, &archive);

        let mut state = Self {
            context,
            available_years: available_years(current_year, operational, &archive),
            tree,
            archive,
        };
        state.track_year(context.reference_year);
        score_loaded(&mut state.tree, state.context);
        tracing::info!(
            years = state.available_years.len(),
            reference_year = context.reference_year,
            overall = ?state.tree.nota_final_calculada,
            "reconciled operational and historical data"
        );
        state
    }

    /// Applies one action to a copy of the state. On error the current state stays valid.
    pub fn reduce(&self, action: IdssAction) -> Result<Self, StateError> {
        tracing::debug!(action = action.label(), "applying action");
        let mut next = self.clone();
        next.apply(action)?;
        recalculate(&mut next.tree, next.context);
        Ok(next)
    }

    pub fn analysis_request(&self, target: &AnalysisTarget) -> Result<AnalysisRequest, AnalysisError> {
        analysis::build_request(&self.tree, target, self.context)
    }

    /// Runs an analysis through `provider` and stores the text or error on its node.
    pub fn run_analysis<P>(&self, provider: &P, target: AnalysisTarget) -> Result<Self, StateError>
    where
        P: AnalysisProvider + ?Sized,
    {
        let outcome = analysis::run(provider, &self.tree, &target, self.context);
        let (analysis, error) = match outcome {
            Ok(text) => (Some(text), None),
            Err(message) => (None, Some(message)),
        };
        self.reduce(IdssAction::SetAnalysisResult {
            target,
            analysis,
            error,
        })
    }

    fn apply(&mut self, action: IdssAction) -> Result<(), StateError> {
        let year = self.context.reference_year;
        match action {
            IdssAction::SetReferenceYear { year } => {
                self.context.reference_year = year;
                self.track_year(year);
            }
            IdssAction::SetOperatorSize { operator_size } => {
                self.context.operator_size = operator_size;
            }
            IdssAction::SetPeriodicValue {
                indicator_id,
                period_index,
                field,
                value,
            } => {
                let indicator = self
                    .tree
                    .indicator_mut(&indicator_id)
                    .ok_or_else(|| StateError::UnknownIndicator(indicator_id.clone()))?;
                if field == SeriesField::AuxValue && !indicator.definition.requires_aux_value {
                    return Err(StateError::AuxValueNotTracked(indicator_id));
                }

                let periodicity = indicator.periodicity_for(year);
                let result = indicator.ensure_result(year);
                if !matches_periodicity(&result.periodic_data, periodicity) {
                    result.periodic_data = rebuild_periodic_data(&result.periodic_data, periodicity);
                    result.periodicity_used = Some(periodicity);
                }
                let entry = result.periodic_data.get_mut(period_index).ok_or_else(|| {
                    StateError::PeriodOutOfRange {
                        indicator_id: indicator_id.clone(),
                        year,
                        index: period_index,
                    }
                })?;
                entry.set(field, value);
                result.source = ResultSource::Operational;
            }
            IdssAction::SetPeriodicity {
                indicator_id,
                periodicity,
            } => {
                let indicator = self
                    .tree
                    .indicator_mut(&indicator_id)
                    .ok_or_else(|| StateError::UnknownIndicator(indicator_id.clone()))?;
                if !indicator.definition.supports(periodicity) {
                    return Err(StateError::UnsupportedPeriodicity {
                        indicator_id,
                        periodicity,
                    });
                }

                indicator.current_periodicity = periodicity;
                let result = indicator.ensure_result(year);
                result.periodicity_used = Some(periodicity);
                result.periodic_data = rebuild_periodic_data(&result.periodic_data, periodicity);
            }
            IdssAction::SetAnalysisResult {
                target,
                analysis,
                error,
            } => {
                let slot = self.narrative_slot(&target)?;
                match (analysis, error) {
                    (_, Some(message)) => slot.store(Err(message)),
                    (Some(text), None) => slot.store(Ok(text)),
                    (None, None) => slot.clear(),
                }
            }
            IdssAction::CloseAnalysis { target } => self.narrative_slot(&target)?.clear(),
            IdssAction::MergeHistorical { archive } => {
                self.archive = archive.normalized();
                self.absorb_archive();
            }
            IdssAction::EditArchive { action } => {
                self.archive = self
                    .archive
                    .clone()
                    .apply(action, IndicatorCatalog::standard())?;
                self.absorb_archive();
            }
            IdssAction::Recalculate => {}
        }
        Ok(())
    }

    fn narrative_slot(&mut self, target: &AnalysisTarget) -> Result<&mut NarrativeSlot, StateError> {
        let year = self.context.reference_year;
        if let Some((indicator_id, kind)) = target.indicator_slot() {
            let indicator = self
                .tree
                .indicator_mut(indicator_id)
                .ok_or_else(|| StateError::UnknownIndicator(indicator_id.to_string()))?;
            return Ok(indicator.ensure_result(year).narratives.slot_mut(kind));
        }

        Ok(match target {
            AnalysisTarget::Dimension { dimension_id } => {
                let dimension = self
                    .tree
                    .dimension_mut(*dimension_id)
                    .ok_or(StateError::UnknownDimension(*dimension_id))?;
                &mut dimension.narrative
            }
            AnalysisTarget::OverallIndicators => &mut self.tree.overall_indicators_narrative,
            _ => &mut self.tree.narrative,
        })
    }

    fn absorb_archive(&mut self) {
        merge_historical(&mut self.tree, &self.archive);
        let years: Vec<i32> = self.archive.years().collect();
        for year in years {
            self.track_year(year);
        }
    }

    fn track_year(&mut self, year: i32) {
        if !self.available_years.contains(&year) {
            self.available_years.push(year);
            self.available_years.sort_unstable_by(|a, b| b.cmp(a));
        }
    }
}

//! Merging of the operational document and the historical archive into the tree.

use super::archive::HistoricalDataArchive;
use super::catalog::IndicatorCatalog;
use super::domain::{
    IndicatorNarratives, IndicatorResult, NarrativeSlot, PeriodicEntry, Periodicity,
    ResultSource,
};
use super::model::IdssTree;
use super::pipeline::rebuild_periodic_data;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Years before and after the current one always offered for selection.
pub const YEARS_BEFORE_CURRENT: i32 = 3;
pub const YEARS_AFTER_CURRENT: i32 = 2;

/// Live, user-edited results. Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalDocument {
    #[serde(default)]
    pub dimensions: Vec<OperationalDimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_indicator_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_indicator_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationalDimension {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub indicators: Vec<OperationalIndicator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalIndicator {
    pub id: String,
    #[serde(default)]
    pub current_periodicity: Option<Periodicity>,
    #[serde(default)]
    pub results: Vec<OperationalResult>,
}

/// A yearly result as stored in the operational document, narratives flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalResult {
    pub year: i32,
    #[serde(default)]
    pub periodic_data: Vec<PeriodicEntry>,
    #[serde(default)]
    pub periodicity_used: Option<Periodicity>,
    #[serde(default)]
    pub consolidated_value: Option<f64>,
    #[serde(default)]
    pub consolidated_aux_value: Option<f64>,
    #[serde(default)]
    pub nota_final: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_last_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_last_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_yearly_consolidated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_yearly_consolidated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_yearly_comparison: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_yearly_comparison: Option<String>,
}

impl OperationalResult {
    fn narratives(&self) -> IndicatorNarratives {
        IndicatorNarratives {
            last_period: slot(&self.analysis_last_period, &self.error_last_period),
            yearly_consolidated: slot(
                &self.analysis_yearly_consolidated,
                &self.error_yearly_consolidated,
            ),
            yearly_comparison: slot(
                &self.analysis_yearly_comparison,
                &self.error_yearly_comparison,
            ),
        }
    }

    fn from_result(result: &IndicatorResult) -> Self {
        let narratives = &result.narratives;
        Self {
            year: result.year,
            periodic_data: result.periodic_data.clone(),
            periodicity_used: result.periodicity_used,
            consolidated_value: result.consolidated_value,
            consolidated_aux_value: result.consolidated_aux_value,
            nota_final: result.nota_final,
            analysis_last_period: narratives.last_period.analysis.clone(),
            error_last_period: narratives.last_period.error.clone(),
            analysis_yearly_consolidated: narratives.yearly_consolidated.analysis.clone(),
            error_yearly_consolidated: narratives.yearly_consolidated.error.clone(),
            analysis_yearly_comparison: narratives.yearly_comparison.analysis.clone(),
            error_yearly_comparison: narratives.yearly_comparison.error.clone(),
        }
    }
}

fn slot(analysis: &Option<String>, error: &Option<String>) -> NarrativeSlot {
    NarrativeSlot {
        analysis: analysis.clone(),
        error: error.clone(),
    }
}

impl OperationalDocument {
    /// Every year carried by any indicator in the document.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.dimensions
            .iter()
            .flat_map(|dimension| dimension.indicators.iter())
            .flat_map(|indicator| indicator.results.iter().map(|result| result.year))
    }

    /// Operational view of a tree, suitable for writing back out.
    pub fn from_tree(tree: &IdssTree) -> Self {
        let dimensions = tree
            .dimensions
            .iter()
            .map(|dimension| OperationalDimension {
                id: dimension.id.code().to_string(),
                indicators: dimension
                    .indicators
                    .iter()
                    .map(|indicator| OperationalIndicator {
                        id: indicator.id().to_string(),
                        current_periodicity: Some(indicator.current_periodicity),
                        results: indicator
                            .results
                            .iter()
                            .filter(|result| result.source == ResultSource::Operational)
                            .map(OperationalResult::from_result)
                            .collect(),
                    })
                    .collect(),
                analysis: dimension.narrative.analysis.clone(),
                error: dimension.narrative.error.clone(),
            })
            .collect();

        Self {
            dimensions,
            analysis: tree.narrative.analysis.clone(),
            error: tree.narrative.error.clone(),
            overall_indicator_analysis: tree.overall_indicators_narrative.analysis.clone(),
            overall_indicator_error: tree.overall_indicators_narrative.error.clone(),
        }
    }
}

/// Overlays the operational document onto a fresh catalog-shaped tree.
///
/// Only the active periodicity and the yearly results come from the document; every
/// other indicator field stays as the catalog defines it. Unknown ids are skipped.
pub fn merge_operational(catalog: &'static IndicatorCatalog, document: &OperationalDocument) -> IdssTree {
    let mut tree = IdssTree::from_catalog(catalog);

    for incoming_dimension in &document.dimensions {
        if let Some(dimension) = tree
            .dimensions
            .iter_mut()
            .find(|dimension| dimension.id.code() == incoming_dimension.id)
        {
            dimension.narrative = slot(&incoming_dimension.analysis, &incoming_dimension.error);
        }

        for incoming in &incoming_dimension.indicators {
            let Some(indicator) = tree.indicator_mut(&incoming.id) else {
                tracing::warn!(indicator_id = %incoming.id, "ignoring indicator missing from catalog");
                continue;
            };

            if let Some(periodicity) = incoming.current_periodicity {
                if indicator.definition.supports(periodicity) {
                    indicator.current_periodicity = periodicity;
                } else {
                    tracing::warn!(
                        indicator_id = %incoming.id,
                        ?periodicity,
                        "ignoring unsupported periodicity"
                    );
                }
            }

            for result in &incoming.results {
                let periodicity = result
                    .periodicity_used
                    .filter(|periodicity| indicator.definition.supports(*periodicity))
                    .unwrap_or(indicator.current_periodicity);

                indicator.insert_result(IndicatorResult {
                    periodic_data: rebuild_periodic_data(&result.periodic_data, periodicity),
                    consolidated_value: result.consolidated_value,
                    consolidated_aux_value: result.consolidated_aux_value,
                    nota_final: result.nota_final,
                    narratives: result.narratives(),
                    ..IndicatorResult::empty(result.year, periodicity)
                });
            }
        }
    }

    tree.narrative = slot(&document.analysis, &document.error);
    tree.overall_indicators_narrative = slot(
        &document.overall_indicator_analysis,
        &document.overall_indicator_error,
    );
    tree
}

/// Fills archived numbers into the tree without overriding operational input.
///
/// A numeric field takes the archived value only while it is null or was itself filled
/// from the archive, so operational numbers always win and archived ones follow the
/// archive on later merges. A result with no periodic input that holds archived numbers
/// is archive-backed. Archive years missing from the tree are appended without
/// fabricating periodic data. Merging the same archive twice is the same as merging it
/// once.
pub fn merge_historical(tree: &mut IdssTree, archive: &HistoricalDataArchive) {
    for record in &archive.indicator_historical_data {
        let Some(indicator) = tree.indicator_mut(&record.id) else {
            tracing::warn!(indicator_id = %record.id, "ignoring archived indicator missing from catalog");
            continue;
        };

        for entry in &record.results {
            if indicator.result(entry.year).is_none() {
                indicator.insert_result(IndicatorResult {
                    periodic_data: entry.periodic_data.clone().unwrap_or_default(),
                    periodicity_used: entry.periodicity_used,
                    source: ResultSource::Archive,
                    ..IndicatorResult::empty(entry.year, indicator.current_periodicity)
                });
            }
            let Some(result) = indicator.result_mut(entry.year) else {
                continue;
            };

            let marks = &mut result.archived_fields;
            absorb(
                &mut result.consolidated_value,
                &mut marks.consolidated_value,
                entry.consolidated_value,
            );
            absorb(
                &mut result.consolidated_aux_value,
                &mut marks.consolidated_aux_value,
                entry.consolidated_aux_value,
            );
            absorb(&mut result.nota_final, &mut marks.nota_final, entry.nota_final);

            // archived periodic input is recomputable like operational input
            if result.has_periodic_values() {
                result.source = ResultSource::Operational;
            } else if !result.archived_fields.is_empty() {
                result.source = ResultSource::Archive;
            }
        }
    }

    tree.historical_idss_scores = archive.idss_historical_scores.clone();
    tree.historical_idss_scores
        .sort_by(|a, b| b.base_year.cmp(&a.base_year));
}

fn absorb(field: &mut Option<f64>, archived: &mut bool, value: Option<f64>) {
    if *archived {
        *field = value;
        *archived = value.is_some();
    } else if field.is_none() && value.is_some() {
        *field = value;
        *archived = true;
    }
}

/// Years offered for selection: a window around `current_year` plus every year either
/// document mentions, most recent first.
pub fn available_years(
    current_year: i32,
    operational: &OperationalDocument,
    archive: &HistoricalDataArchive,
) -> Vec<i32> {
    let window = (current_year - YEARS_BEFORE_CURRENT)..=(current_year + YEARS_AFTER_CURRENT);
    let years: BTreeSet<i32> = window
        .chain(operational.years())
        .chain(archive.years())
        .collect();
    years.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idss::archive::{HistoricalIndicatorRecord, HistoricalIndicatorYearlyEntry};

    fn document(raw: &str) -> OperationalDocument {
        serde_json::from_str(raw).expect("operational document parses")
    }

    fn archive_with(id: &str, entry: HistoricalIndicatorYearlyEntry) -> HistoricalDataArchive {
        HistoricalDataArchive {
            indicator_historical_data: vec![HistoricalIndicatorRecord {
                id: id.to_string(),
                results: vec![entry],
            }],
            ..HistoricalDataArchive::default()
        }
    }

    #[test]
    fn overlay_keeps_catalog_fields_and_reshapes_periods() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDQS", "indicators": [{
                "id": "1.1", "name": "renamed", "weightInDimension": 99,
                "currentPeriodicity": "Semestral",
                "results": [{"year": 2024, "periodicData": [
                    {"periodLabel": "Semestre 2", "value": 50.0},
                    {"periodLabel": "Jan", "value": 10.0}
                ], "analysisLastPeriod": "ok"}]
            }]}]}"#,
        );
        let tree = merge_operational(IndicatorCatalog::standard(), &doc);
        let indicator = tree.indicator("1.1").expect("indicator present");

        assert_eq!(indicator.definition.weight_in_dimension, 3.0);
        assert_ne!(indicator.definition.name, "renamed");
        assert_eq!(indicator.current_periodicity, Periodicity::Semestral);

        let result = indicator.result(2024).expect("result merged");
        let labels: Vec<&str> = result
            .periodic_data
            .iter()
            .map(|entry| entry.period_label.as_str())
            .collect();
        assert_eq!(labels, ["Semestre 1", "Semestre 2"]);
        assert_eq!(result.periodic_data[1].value, Some(50.0));
        assert_eq!(result.narratives.last_period.analysis.as_deref(), Some("ok"));
    }

    #[test]
    fn unknown_indicators_and_periodicities_are_ignored() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDSM", "indicators": [
                {"id": "9.9", "results": [{"year": 2024}]},
                {"id": "3.4", "currentPeriodicity": "Mensal"}
            ]}]}"#,
        );
        let tree = merge_operational(IndicatorCatalog::standard(), &doc);
        assert!(tree.indicator("9.9").is_none());
        assert_eq!(
            tree.indicator("3.4").map(|indicator| indicator.current_periodicity),
            Some(Periodicity::Anual)
        );
    }

    #[test]
    fn archive_year_is_appended_without_periodic_data() {
        let mut tree = merge_operational(IndicatorCatalog::standard(), &OperationalDocument::default());
        let archive = archive_with(
            "1.2",
            HistoricalIndicatorYearlyEntry {
                nota_final: Some(0.64),
                consolidated_value: Some(5.2),
                ..HistoricalIndicatorYearlyEntry::empty(2022)
            },
        );
        merge_historical(&mut tree, &archive);

        let result = tree
            .indicator("1.2")
            .and_then(|indicator| indicator.result(2022))
            .expect("archive year appended");
        assert_eq!(result.nota_final, Some(0.64));
        assert_eq!(result.consolidated_value, Some(5.2));
        assert!(result.periodic_data.is_empty());
        assert_eq!(result.source, ResultSource::Archive);
    }

    #[test]
    fn operational_values_win_over_archive() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDQS", "indicators": [{"id": "1.2", "results": [
                {"year": 2023, "periodicData": [{"periodLabel": "Anual", "value": 6.0}],
                 "consolidatedValue": 6.0, "notaFinal": null}
            ]}]}]}"#,
        );
        let mut tree = merge_operational(IndicatorCatalog::standard(), &doc);
        let archive = archive_with(
            "1.2",
            HistoricalIndicatorYearlyEntry {
                nota_final: Some(0.1),
                consolidated_value: Some(2.5),
                ..HistoricalIndicatorYearlyEntry::empty(2023)
            },
        );
        merge_historical(&mut tree, &archive);

        let result = tree
            .indicator("1.2")
            .and_then(|indicator| indicator.result(2023))
            .expect("result present");
        assert_eq!(result.consolidated_value, Some(6.0));
        assert_eq!(result.nota_final, Some(0.1));
        assert_eq!(result.source, ResultSource::Operational);
    }

    #[test]
    fn merging_archive_twice_changes_nothing() {
        let mut once = merge_operational(IndicatorCatalog::standard(), &OperationalDocument::default());
        let archive = archive_with(
            "3.1",
            HistoricalIndicatorYearlyEntry {
                nota_final: Some(0.95),
                consolidated_value: Some(1.5),
                ..HistoricalIndicatorYearlyEntry::empty(2021)
            },
        );
        merge_historical(&mut once, &archive);
        let mut twice = once.clone();
        merge_historical(&mut twice, &archive);
        assert_eq!(once, twice);
    }

    #[test]
    fn partially_filled_result_keeps_operational_score_across_merges() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDQS", "indicators": [{"id": "1.2", "results": [
                {"year": 2022, "periodicData": [], "notaFinal": 0.5}
            ]}]}]}"#,
        );
        let archive = archive_with(
            "1.2",
            HistoricalIndicatorYearlyEntry {
                nota_final: Some(0.9),
                consolidated_value: Some(3.0),
                ..HistoricalIndicatorYearlyEntry::empty(2022)
            },
        );

        let mut once = merge_operational(IndicatorCatalog::standard(), &doc);
        merge_historical(&mut once, &archive);
        let mut twice = once.clone();
        merge_historical(&mut twice, &archive);
        assert_eq!(once, twice);

        let result = twice
            .indicator("1.2")
            .and_then(|indicator| indicator.result(2022))
            .expect("result present");
        assert_eq!(result.nota_final, Some(0.5));
        assert_eq!(result.consolidated_value, Some(3.0));
        assert_eq!(result.source, ResultSource::Archive);
        assert!(result.archived_fields.consolidated_value);
        assert!(!result.archived_fields.nota_final);
    }

    #[test]
    fn archived_fields_follow_edited_archive() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDQS", "indicators": [{"id": "1.2", "results": [
                {"year": 2022, "periodicData": [], "notaFinal": 0.5}
            ]}]}]}"#,
        );
        let mut tree = merge_operational(IndicatorCatalog::standard(), &doc);
        merge_historical(
            &mut tree,
            &archive_with(
                "1.2",
                HistoricalIndicatorYearlyEntry {
                    nota_final: Some(0.9),
                    consolidated_value: Some(3.0),
                    ..HistoricalIndicatorYearlyEntry::empty(2022)
                },
            ),
        );
        merge_historical(
            &mut tree,
            &archive_with(
                "1.2",
                HistoricalIndicatorYearlyEntry {
                    nota_final: Some(0.2),
                    ..HistoricalIndicatorYearlyEntry::empty(2022)
                },
            ),
        );

        let result = tree
            .indicator("1.2")
            .and_then(|indicator| indicator.result(2022))
            .expect("result present");
        assert_eq!(result.nota_final, Some(0.5));
        assert_eq!(result.consolidated_value, None);
        assert!(result.archived_fields.is_empty());
    }

    #[test]
    fn available_years_union_window_and_documents() {
        let doc = document(
            r#"{"dimensions": [{"id": "IDQS", "indicators": [{"id": "1.1", "results": [{"year": 2015}]}]}]}"#,
        );
        let archive = archive_with("1.1", HistoricalIndicatorYearlyEntry::empty(2018));
        let years = available_years(2025, &doc, &archive);
        assert_eq!(years, [2027, 2026, 2025, 2024, 2023, 2022, 2018, 2015]);
    }
}

//! Historical archive document and its edit reducer.
//!
//! The archive holds fixed prior-year reference values, kept apart from the live
//! operational data. It serializes back to the same shape it was read from.

use super::catalog::IndicatorCatalog;
use super::domain::{DimensionId, PeriodicEntry, Periodicity, SeriesField};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Source recorded on overall scores typed in by hand.
pub const MANUAL_ENTRY_SOURCE: &str = "Operadora (Input)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalIdssScore {
    pub program_year: i32,
    pub base_year: i32,
    pub score: Option<f64>,
    pub source: String,
}

impl HistoricalIdssScore {
    /// Programs are published the year after the base year they measure.
    pub fn manual(base_year: i32, score: Option<f64>) -> Self {
        Self {
            program_year: base_year + 1,
            base_year,
            score,
            source: MANUAL_ENTRY_SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDimensionYearlyScores {
    pub year: i32,
    #[serde(default, deserialize_with = "known_dimension_scores")]
    pub dimension_scores: BTreeMap<DimensionId, Option<f64>>,
}

/// Drops score columns for dimensions the index does not have.
fn known_dimension_scores<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<DimensionId, Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, score)| {
            match DimensionId::ordered().into_iter().find(|id| id.code() == key) {
                Some(id) => Some((id, score)),
                None => {
                    tracing::warn!(dimension_id = %key, "ignoring archived dimension missing from index");
                    None
                }
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalIndicatorYearlyEntry {
    pub year: i32,
    pub nota_final: Option<f64>,
    pub consolidated_value: Option<f64>,
    pub consolidated_aux_value: Option<f64>,
    pub periodicity_used: Option<Periodicity>,
    pub periodic_data: Option<Vec<PeriodicEntry>>,
}

impl HistoricalIndicatorYearlyEntry {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            nota_final: None,
            consolidated_value: None,
            consolidated_aux_value: None,
            periodicity_used: None,
            periodic_data: None,
        }
    }

    pub fn field(&self, field: ArchiveField) -> Option<f64> {
        match field {
            ArchiveField::NotaFinal => self.nota_final,
            ArchiveField::ConsolidatedValue => self.consolidated_value,
            ArchiveField::ConsolidatedAuxValue => self.consolidated_aux_value,
        }
    }

    fn set_field(&mut self, field: ArchiveField, value: Option<f64>) {
        match field {
            ArchiveField::NotaFinal => self.nota_final = value,
            ArchiveField::ConsolidatedValue => self.consolidated_value = value,
            ArchiveField::ConsolidatedAuxValue => self.consolidated_aux_value = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalIndicatorRecord {
    pub id: String,
    #[serde(default)]
    pub results: Vec<HistoricalIndicatorYearlyEntry>,
}

impl HistoricalIndicatorRecord {
    pub fn entry(&self, year: i32) -> Option<&HistoricalIndicatorYearlyEntry> {
        self.results.iter().find(|entry| entry.year == year)
    }

    fn entry_mut_or_insert(&mut self, year: i32) -> &mut HistoricalIndicatorYearlyEntry {
        let index = match self.results.iter().position(|entry| entry.year == year) {
            Some(index) => index,
            None => {
                self.results.push(HistoricalIndicatorYearlyEntry::empty(year));
                self.results.sort_by(|a, b| b.year.cmp(&a.year));
                self.results
                    .iter()
                    .position(|entry| entry.year == year)
                    .unwrap_or_default()
            }
        };
        &mut self.results[index]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataArchive {
    #[serde(default)]
    pub idss_historical_scores: Vec<HistoricalIdssScore>,
    #[serde(default)]
    pub dimension_historical_data: Vec<HistoricalDimensionYearlyScores>,
    #[serde(default)]
    pub indicator_historical_data: Vec<HistoricalIndicatorRecord>,
}

/// Numeric archive fields editable directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArchiveField {
    NotaFinal,
    ConsolidatedValue,
    ConsolidatedAuxValue,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoricalAction {
    Replace {
        archive: HistoricalDataArchive,
    },
    SetIdssScore {
        year: i32,
        score: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    SetDimensionScore {
        year: i32,
        dimension_id: DimensionId,
        score: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    SetIndicatorField {
        year: i32,
        indicator_id: String,
        field: ArchiveField,
        value: Option<f64>,
    },
    /// Resets the year's periodic data to null entries for the new cadence (or none).
    #[serde(rename_all = "camelCase")]
    SetIndicatorPeriodicity {
        year: i32,
        indicator_id: String,
        periodicity: Option<Periodicity>,
    },
    #[serde(rename_all = "camelCase")]
    SetPeriodicValue {
        year: i32,
        indicator_id: String,
        period_index: usize,
        field: SeriesField,
        value: Option<f64>,
    },
    /// Adds empty rows for the year to every catalog indicator and both score tables.
    EnsureYear {
        year: i32,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ArchiveError {
    #[error("indicator '{0}' is not part of the catalog")]
    UnknownIndicator(String),
    #[error("indicator '{indicator_id}' has no archived periodic data for {year}")]
    NoPeriodicData { indicator_id: String, year: i32 },
    #[error("period index {index} is out of range for indicator '{indicator_id}' in {year}")]
    PeriodOutOfRange {
        indicator_id: String,
        year: i32,
        index: usize,
    },
}

impl HistoricalDataArchive {
    pub fn indicator(&self, id: &str) -> Option<&HistoricalIndicatorRecord> {
        self.indicator_historical_data
            .iter()
            .find(|record| record.id == id)
    }

    pub fn idss_score(&self, base_year: i32) -> Option<&HistoricalIdssScore> {
        self.idss_historical_scores
            .iter()
            .find(|score| score.base_year == base_year)
    }

    pub fn dimension_scores(&self, year: i32) -> Option<&HistoricalDimensionYearlyScores> {
        self.dimension_historical_data
            .iter()
            .find(|row| row.year == year)
    }

    /// Every year mentioned anywhere in the archive.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        let indicator_years = self
            .indicator_historical_data
            .iter()
            .flat_map(|record| record.results.iter().map(|entry| entry.year));
        let dimension_years = self.dimension_historical_data.iter().map(|row| row.year);
        let idss_years = self
            .idss_historical_scores
            .iter()
            .map(|score| score.base_year);
        indicator_years.chain(dimension_years).chain(idss_years)
    }

    /// Applies one edit, returning the new archive. The input is left untouched on error.
    pub fn apply(
        mut self,
        action: HistoricalAction,
        catalog: &IndicatorCatalog,
    ) -> Result<Self, ArchiveError> {
        match action {
            HistoricalAction::Replace { archive } => return Ok(archive.normalized()),
            HistoricalAction::SetIdssScore { year, score } => {
                match self
                    .idss_historical_scores
                    .iter_mut()
                    .find(|entry| entry.base_year == year)
                {
                    Some(entry) => entry.score = score,
                    None => self
                        .idss_historical_scores
                        .push(HistoricalIdssScore::manual(year, score)),
                }
            }
            HistoricalAction::SetDimensionScore {
                year,
                dimension_id,
                score,
            } => {
                self.dimension_row_mut(year)
                    .dimension_scores
                    .insert(dimension_id, score);
            }
            HistoricalAction::SetIndicatorField {
                year,
                indicator_id,
                field,
                value,
            } => {
                self.record_mut(&indicator_id, catalog)?
                    .entry_mut_or_insert(year)
                    .set_field(field, value);
            }
            HistoricalAction::SetIndicatorPeriodicity {
                year,
                indicator_id,
                periodicity,
            } => {
                let entry = self
                    .record_mut(&indicator_id, catalog)?
                    .entry_mut_or_insert(year);
                entry.periodicity_used = periodicity;
                entry.periodic_data = periodicity.map(Periodicity::empty_entries);
            }
            HistoricalAction::SetPeriodicValue {
                year,
                indicator_id,
                period_index,
                field,
                value,
            } => {
                let entry = self
                    .record_mut(&indicator_id, catalog)?
                    .entry_mut_or_insert(year);
                let periodic_data =
                    entry
                        .periodic_data
                        .as_mut()
                        .ok_or_else(|| ArchiveError::NoPeriodicData {
                            indicator_id: indicator_id.clone(),
                            year,
                        })?;
                let slot = periodic_data.get_mut(period_index).ok_or_else(|| {
                    ArchiveError::PeriodOutOfRange {
                        indicator_id: indicator_id.clone(),
                        year,
                        index: period_index,
                    }
                })?;
                slot.set(field, value);
            }
            HistoricalAction::EnsureYear { year } => {
                for definition in catalog.indicators() {
                    self.record_mut(definition.id, catalog)?
                        .entry_mut_or_insert(year);
                }
                self.dimension_row_mut(year);
                if self.idss_score(year).is_none() {
                    self.idss_historical_scores
                        .push(HistoricalIdssScore::manual(year, None));
                }
            }
        }

        Ok(self.normalized())
    }

    /// Sorts every table by year, most recent first.
    pub fn normalized(mut self) -> Self {
        self.idss_historical_scores
            .sort_by(|a, b| b.base_year.cmp(&a.base_year));
        self.dimension_historical_data
            .sort_by(|a, b| b.year.cmp(&a.year));
        for record in &mut self.indicator_historical_data {
            record.results.sort_by(|a, b| b.year.cmp(&a.year));
        }
        self
    }

    fn dimension_row_mut(&mut self, year: i32) -> &mut HistoricalDimensionYearlyScores {
        let index = match self
            .dimension_historical_data
            .iter()
            .position(|row| row.year == year)
        {
            Some(index) => index,
            None => {
                self.dimension_historical_data
                    .push(HistoricalDimensionYearlyScores {
                        year,
                        dimension_scores: BTreeMap::new(),
                    });
                self.dimension_historical_data.len() - 1
            }
        };
        &mut self.dimension_historical_data[index]
    }

    fn record_mut(
        &mut self,
        indicator_id: &str,
        catalog: &IndicatorCatalog,
    ) -> Result<&mut HistoricalIndicatorRecord, ArchiveError> {
        if catalog.indicator(indicator_id).is_none() {
            return Err(ArchiveError::UnknownIndicator(indicator_id.to_string()));
        }

        let index = match self
            .indicator_historical_data
            .iter()
            .position(|record| record.id == indicator_id)
        {
            Some(index) => index,
            None => {
                self.indicator_historical_data
                    .push(HistoricalIndicatorRecord {
                        id: indicator_id.to_string(),
                        results: Vec::new(),
                    });
                self.indicator_historical_data.len() - 1
            }
        };
        Ok(&mut self.indicator_historical_data[index])
    }
}

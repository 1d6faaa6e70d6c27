use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator size category used to select size-dependent scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperatorSize {
    #[serde(rename = "Pequeno Porte")]
    Pequeno,
    #[serde(rename = "Médio Porte")]
    Medio,
    #[serde(rename = "Grande Porte")]
    Grande,
}

impl OperatorSize {
    pub const fn ordered() -> [Self; 3] {
        [Self::Pequeno, Self::Medio, Self::Grande]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pequeno => "Pequeno Porte",
            Self::Medio => "Médio Porte",
            Self::Grande => "Grande Porte",
        }
    }
}

impl fmt::Display for OperatorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator size '{0}' (expected pequeno, medio or grande)")]
pub struct UnknownOperatorSize(pub String);

impl FromStr for OperatorSize {
    type Err = UnknownOperatorSize;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace('é', "e")
            .replace(" porte", "");
        match normalized.as_str() {
            "pequeno" | "small" => Ok(Self::Pequeno),
            "medio" | "medium" => Ok(Self::Medio),
            "grande" | "large" => Ok(Self::Grande),
            _ => Err(UnknownOperatorSize(raw.to_string())),
        }
    }
}

/// Reporting cadence for an indicator's raw measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    Anual,
    Semestral,
    Quadrimestral,
    Trimestral,
    Bimestral,
    Mensal,
}

impl Periodicity {
    pub const fn period_labels(self) -> &'static [&'static str] {
        match self {
            Self::Anual => &["Anual"],
            Self::Semestral => &["Semestre 1", "Semestre 2"],
            Self::Quadrimestral => &["Quad. 1", "Quad. 2", "Quad. 3"],
            Self::Trimestral => &["Trim. 1", "Trim. 2", "Trim. 3", "Trim. 4"],
            Self::Bimestral => &["Bim. 1", "Bim. 2", "Bim. 3", "Bim. 4", "Bim. 5", "Bim. 6"],
            Self::Mensal => &[
                "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
            ],
        }
    }

    /// Null-valued entries for every period of this cadence.
    pub fn empty_entries(self) -> Vec<PeriodicEntry> {
        self.period_labels()
            .iter()
            .map(|label| PeriodicEntry::empty(label))
            .collect()
    }
}

/// The four top-level IDSS dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DimensionId {
    #[serde(rename = "IDQS")]
    Idqs,
    #[serde(rename = "IDGA")]
    Idga,
    #[serde(rename = "IDSM")]
    Idsm,
    #[serde(rename = "IDGR")]
    Idgr,
}

impl DimensionId {
    pub const fn ordered() -> [Self; 4] {
        [Self::Idqs, Self::Idga, Self::Idsm, Self::Idgr]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Idqs => "IDQS",
            Self::Idga => "IDGA",
            Self::Idsm => "IDSM",
            Self::Idgr => "IDGR",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idqs => "Qualidade em Atenção à Saúde",
            Self::Idga => "Garantia de Acesso",
            Self::Idsm => "Sustentabilidade no Mercado",
            Self::Idgr => "Gestão de Processos e Regulação",
        }
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Informational importance tier from the regulator's technical sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDirection {
    Up,
    Down,
    None,
}

/// How an indicator's score enters its dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionMode {
    /// Participates in the weighted average.
    Weighted,
    /// Adds `score * weight` on top of the weighted average.
    Bonus,
}

/// Which numeric series of a periodic entry an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesField {
    Value,
    AuxValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicEntry {
    pub period_label: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub aux_value: Option<f64>,
}

impl PeriodicEntry {
    pub fn empty(label: &str) -> Self {
        Self {
            period_label: label.to_string(),
            value: None,
            aux_value: None,
        }
    }

    pub fn get(&self, field: SeriesField) -> Option<f64> {
        match field {
            SeriesField::Value => self.value,
            SeriesField::AuxValue => self.aux_value,
        }
    }

    pub fn set(&mut self, field: SeriesField, value: Option<f64>) {
        match field {
            SeriesField::Value => self.value = value,
            SeriesField::AuxValue => self.aux_value = value,
        }
    }
}

/// Narrative text (or failure) produced by the external analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NarrativeSlot {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_none() && self.error.is_none()
    }

    pub fn clear(&mut self) {
        self.analysis = None;
        self.error = None;
    }

    pub fn store(&mut self, outcome: Result<String, String>) {
        match outcome {
            Ok(text) => {
                self.analysis = Some(text);
                self.error = None;
            }
            Err(message) => {
                self.analysis = None;
                self.error = Some(message);
            }
        }
    }
}

/// Indicator-level analysis kinds, each with its own narrative slot per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorAnalysisKind {
    LastPeriod,
    YearlyConsolidated,
    YearlyComparison,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorNarratives {
    #[serde(default, skip_serializing_if = "NarrativeSlot::is_empty")]
    pub last_period: NarrativeSlot,
    #[serde(default, skip_serializing_if = "NarrativeSlot::is_empty")]
    pub yearly_consolidated: NarrativeSlot,
    #[serde(default, skip_serializing_if = "NarrativeSlot::is_empty")]
    pub yearly_comparison: NarrativeSlot,
}

impl IndicatorNarratives {
    pub fn is_empty(&self) -> bool {
        self.last_period.is_empty()
            && self.yearly_consolidated.is_empty()
            && self.yearly_comparison.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_period.clear();
        self.yearly_consolidated.clear();
        self.yearly_comparison.clear();
    }

    pub fn slot_mut(&mut self, kind: IndicatorAnalysisKind) -> &mut NarrativeSlot {
        match kind {
            IndicatorAnalysisKind::LastPeriod => &mut self.last_period,
            IndicatorAnalysisKind::YearlyConsolidated => &mut self.yearly_consolidated,
            IndicatorAnalysisKind::YearlyComparison => &mut self.yearly_comparison,
        }
    }
}

/// Where a yearly result's numbers came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    #[default]
    Operational,
    /// Numbers supplied by the historical archive with no periodic input behind them.
    Archive,
}

/// Which numeric fields of a result currently hold archived values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedFields {
    #[serde(default)]
    pub consolidated_value: bool,
    #[serde(default)]
    pub consolidated_aux_value: bool,
    #[serde(default)]
    pub nota_final: bool,
}

impl ArchivedFields {
    pub fn is_empty(&self) -> bool {
        !(self.consolidated_value || self.consolidated_aux_value || self.nota_final)
    }
}

/// One indicator's data and derived values for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorResult {
    pub year: i32,
    pub periodic_data: Vec<PeriodicEntry>,
    #[serde(default)]
    pub periodicity_used: Option<Periodicity>,
    pub consolidated_value: Option<f64>,
    pub consolidated_aux_value: Option<f64>,
    pub nota_final: Option<f64>,
    #[serde(default)]
    pub source: ResultSource,
    #[serde(default, skip_serializing_if = "ArchivedFields::is_empty")]
    pub archived_fields: ArchivedFields,
    #[serde(default, skip_serializing_if = "IndicatorNarratives::is_empty")]
    pub narratives: IndicatorNarratives,
}

impl IndicatorResult {
    /// All-null result shaped for the given cadence.
    pub fn empty(year: i32, periodicity: Periodicity) -> Self {
        Self {
            year,
            periodic_data: periodicity.empty_entries(),
            periodicity_used: Some(periodicity),
            consolidated_value: None,
            consolidated_aux_value: None,
            nota_final: None,
            source: ResultSource::Operational,
            archived_fields: ArchivedFields::default(),
            narratives: IndicatorNarratives::default(),
        }
    }

    pub fn has_periodic_values(&self) -> bool {
        self.periodic_data
            .iter()
            .any(|entry| entry.value.is_some() || entry.aux_value.is_some())
    }

    pub fn series(&self, field: SeriesField) -> Vec<Option<f64>> {
        self.periodic_data
            .iter()
            .map(|entry| entry.get(field))
            .collect()
    }

    /// Last period holding a primary value, as `(label, value)`.
    pub fn last_filled_period(&self) -> Option<(&str, f64)> {
        self.periodic_data
            .iter()
            .rev()
            .find_map(|entry| entry.value.map(|value| (entry.period_label.as_str(), value)))
    }
}

/// Selection that drives every recompute: which year, which parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringContext {
    pub reference_year: i32,
    pub operator_size: OperatorSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_size_parses_loose_spellings() {
        assert_eq!("Médio Porte".parse::<OperatorSize>(), Ok(OperatorSize::Medio));
        assert_eq!(" GRANDE ".parse::<OperatorSize>(), Ok(OperatorSize::Grande));
        assert_eq!("pequeno".parse::<OperatorSize>(), Ok(OperatorSize::Pequeno));
        assert!("gigante".parse::<OperatorSize>().is_err());
    }

    #[test]
    fn period_labels_follow_cadence() {
        assert_eq!(Periodicity::Anual.period_labels().len(), 1);
        assert_eq!(Periodicity::Quadrimestral.period_labels().len(), 3);
        assert_eq!(Periodicity::Bimestral.period_labels().len(), 6);
        assert_eq!(Periodicity::Mensal.period_labels()[11], "Dez");
    }

    #[test]
    fn operator_size_round_trips_through_wire_labels() {
        let json = serde_json::to_string(&OperatorSize::Medio).expect("serializes");
        assert_eq!(json, "\"Médio Porte\"");
        let parsed: OperatorSize = serde_json::from_str(&json).expect("parses");
        assert_eq!(parsed, OperatorSize::Medio);
    }

    #[test]
    fn narrative_slot_keeps_text_and_error_exclusive() {
        let mut slot = NarrativeSlot::default();
        slot.store(Err("service down".to_string()));
        assert_eq!(slot.error.as_deref(), Some("service down"));
        slot.store(Ok("fine".to_string()));
        assert_eq!(slot.analysis.as_deref(), Some("fine"));
        assert!(slot.error.is_none());
    }
}

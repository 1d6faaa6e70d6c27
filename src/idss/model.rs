use super::archive::HistoricalIdssScore;
use super::catalog::{IndicatorCatalog, IndicatorDefinition};
use super::domain::{DimensionId, IndicatorResult, NarrativeSlot, Periodicity};
use serde::Serialize;

/// A catalog indicator together with its yearly results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    #[serde(flatten)]
    pub definition: &'static IndicatorDefinition,
    pub current_periodicity: Periodicity,
    /// One record per year, most recent first.
    pub results: Vec<IndicatorResult>,
}

impl Indicator {
    pub fn new(definition: &'static IndicatorDefinition) -> Self {
        Self {
            definition,
            current_periodicity: definition.default_periodicity,
            results: Vec::new(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    pub fn result(&self, year: i32) -> Option<&IndicatorResult> {
        self.results.iter().find(|result| result.year == year)
    }

    pub fn result_mut(&mut self, year: i32) -> Option<&mut IndicatorResult> {
        self.results.iter_mut().find(|result| result.year == year)
    }

    /// Cadence in force for a year: the one recorded on its result, else the current one.
    pub fn periodicity_for(&self, year: i32) -> Periodicity {
        self.result(year)
            .and_then(|result| result.periodicity_used)
            .unwrap_or(self.current_periodicity)
    }

    /// Returns the year's result, creating an all-null one on first reference.
    pub fn ensure_result(&mut self, year: i32) -> &mut IndicatorResult {
        if self.result(year).is_none() {
            self.insert_result(IndicatorResult::empty(year, self.current_periodicity));
        }
        let index = self
            .results
            .iter()
            .position(|result| result.year == year)
            .unwrap_or_default();
        &mut self.results[index]
    }

    /// Inserts or replaces the result for its year, keeping years in descending order.
    pub fn insert_result(&mut self, result: IndicatorResult) {
        match self.result_mut(result.year) {
            Some(existing) => *existing = result,
            None => {
                self.results.push(result);
                self.results.sort_by(|a, b| b.year.cmp(&a.year));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub id: DimensionId,
    pub name: &'static str,
    #[serde(rename = "weightInIDSS")]
    pub weight_in_idss: f64,
    pub indicators: Vec<Indicator>,
    pub nota_final_calculada: Option<f64>,
    #[serde(skip_serializing_if = "NarrativeSlot::is_empty")]
    pub narrative: NarrativeSlot,
}

impl Dimension {
    pub fn indicator(&self, id: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|indicator| indicator.id() == id)
    }
}

/// The whole index: dimensions, derived overall score and historical scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdssTree {
    pub dimensions: Vec<Dimension>,
    pub nota_final_calculada: Option<f64>,
    #[serde(skip_serializing_if = "NarrativeSlot::is_empty")]
    pub narrative: NarrativeSlot,
    #[serde(skip_serializing_if = "NarrativeSlot::is_empty")]
    pub overall_indicators_narrative: NarrativeSlot,
    pub historical_idss_scores: Vec<HistoricalIdssScore>,
}

impl IdssTree {
    /// Catalog-shaped tree: every indicator present, no results, nothing scored.
    pub fn from_catalog(catalog: &'static IndicatorCatalog) -> Self {
        let dimensions = catalog
            .dimensions()
            .iter()
            .map(|dimension| Dimension {
                id: dimension.id,
                name: dimension.name,
                weight_in_idss: dimension.weight_in_idss,
                indicators: catalog
                    .indicators_for(dimension.id)
                    .into_iter()
                    .map(Indicator::new)
                    .collect(),
                nota_final_calculada: None,
                narrative: NarrativeSlot::default(),
            })
            .collect();

        Self {
            dimensions,
            nota_final_calculada: None,
            narrative: NarrativeSlot::default(),
            overall_indicators_narrative: NarrativeSlot::default(),
            historical_idss_scores: Vec::new(),
        }
    }

    pub fn dimension(&self, id: DimensionId) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.id == id)
    }

    pub fn dimension_mut(&mut self, id: DimensionId) -> Option<&mut Dimension> {
        self.dimensions.iter_mut().find(|dimension| dimension.id == id)
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.dimensions
            .iter()
            .flat_map(|dimension| dimension.indicators.iter())
    }

    pub fn indicator(&self, id: &str) -> Option<&Indicator> {
        self.indicators().find(|indicator| indicator.id() == id)
    }

    pub fn indicator_mut(&mut self, id: &str) -> Option<&mut Indicator> {
        self.dimensions
            .iter_mut()
            .flat_map(|dimension| dimension.indicators.iter_mut())
            .find(|indicator| indicator.id() == id)
    }

    /// Every year any indicator holds a result for.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.indicators()
            .flat_map(|indicator| indicator.results.iter().map(|result| result.year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_tree_mirrors_dimension_layout() {
        let tree = IdssTree::from_catalog(IndicatorCatalog::standard());
        assert_eq!(tree.dimensions.len(), 4);
        assert_eq!(tree.indicators().count(), 28);
        let idsm = tree.dimension(DimensionId::Idsm).expect("IDSM present");
        assert!(idsm.indicator("3.1").is_some());
        assert!(tree.indicators().all(|indicator| indicator.results.is_empty()));
    }

    #[test]
    fn ensure_result_creates_once_and_keeps_descending_order() {
        let mut tree = IdssTree::from_catalog(IndicatorCatalog::standard());
        let indicator = tree.indicator_mut("3.3").expect("IGR present");
        indicator.ensure_result(2022);
        indicator.ensure_result(2024);
        indicator.ensure_result(2023).nota_final = Some(0.4);
        indicator.ensure_result(2023);

        let years: Vec<i32> = indicator.results.iter().map(|result| result.year).collect();
        assert_eq!(years, [2024, 2023, 2022]);
        assert_eq!(indicator.result(2023).and_then(|r| r.nota_final), Some(0.4));
        assert_eq!(
            indicator.result(2024).map(|r| r.periodic_data.len()),
            Some(12),
            "IGR defaults to monthly entries"
        );
    }

    #[test]
    fn tree_serializes_catalog_fields_inline() {
        let tree = IdssTree::from_catalog(IndicatorCatalog::standard());
        let json = serde_json::to_value(&tree).expect("tree serializes");
        let first = &json["dimensions"][0]["indicators"][0];
        assert_eq!(first["id"], "1.1");
        assert_eq!(first["currentPeriodicity"], "Anual");
        assert_eq!(json["dimensions"][0]["weightInIDSS"], 0.3);
    }
}

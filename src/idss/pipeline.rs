//! Per-indicator recompute: reshape, consolidate, score, invalidate stale narratives.

use super::catalog::IndicatorDefinition;
use super::domain::{
    ArchivedFields, IndicatorResult, OperatorSize, PeriodicEntry, Periodicity, ResultSource,
    ScoringContext, SeriesField,
};
use super::model::Indicator;

/// True when the entries carry exactly the cadence's labels, in order.
pub fn matches_periodicity(entries: &[PeriodicEntry], periodicity: Periodicity) -> bool {
    let labels = periodicity.period_labels();
    entries.len() == labels.len()
        && entries
            .iter()
            .zip(labels)
            .all(|(entry, label)| entry.period_label == *label)
}

/// Reshapes entries to the cadence's labels, carrying values over by label.
pub fn rebuild_periodic_data(entries: &[PeriodicEntry], periodicity: Periodicity) -> Vec<PeriodicEntry> {
    periodicity
        .period_labels()
        .iter()
        .map(|label| {
            entries
                .iter()
                .find(|entry| entry.period_label == *label)
                .map(|entry| PeriodicEntry {
                    period_label: entry.period_label.clone(),
                    value: entry.value,
                    aux_value: entry.aux_value,
                })
                .unwrap_or_else(|| PeriodicEntry::empty(label))
        })
        .collect()
}

/// Recomputes one yearly result in place. Returns whether anything derived changed.
///
/// Archive-backed results without periodic input keep their archived numbers.
pub fn recompute_result(
    definition: &IndicatorDefinition,
    result: &mut IndicatorResult,
    periodicity: Periodicity,
    operator_size: OperatorSize,
) -> bool {
    if result.source == ResultSource::Archive && !result.has_periodic_values() {
        return false;
    }

    let mut changed = false;
    if !matches_periodicity(&result.periodic_data, periodicity) {
        result.periodic_data = rebuild_periodic_data(&result.periodic_data, periodicity);
        changed = true;
    }
    result.periodicity_used = Some(periodicity);

    let consolidated_value = definition
        .consolidation
        .consolidate(&result.series(SeriesField::Value));
    let consolidated_aux_value = if definition.requires_aux_value {
        definition
            .consolidation
            .consolidate(&result.series(SeriesField::AuxValue))
    } else {
        None
    };
    let nota_final = definition.score(consolidated_value, consolidated_aux_value, operator_size);

    changed |= result.consolidated_value != consolidated_value
        || result.consolidated_aux_value != consolidated_aux_value
        || result.nota_final != nota_final;

    result.consolidated_value = consolidated_value;
    result.consolidated_aux_value = consolidated_aux_value;
    result.nota_final = nota_final;
    result.archived_fields = ArchivedFields::default();

    if changed {
        result.narratives.clear();
    }
    changed
}

/// Runs the recompute for the context's reference year, creating the result if needed.
pub fn recompute(indicator: &mut Indicator, context: ScoringContext) -> bool {
    let definition = indicator.definition;
    let periodicity = indicator.periodicity_for(context.reference_year);
    let result = indicator.ensure_result(context.reference_year);
    recompute_result(definition, result, periodicity, context.operator_size)
}

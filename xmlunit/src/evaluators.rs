//! Difference evaluators decide how much a raw outcome matters.

use std::rc::Rc;

use crate::comparison::{Comparison, ComparisonResult, ComparisonType, ComparisonValue};

/// Maps the raw outcome of a comparison to its final severity.
pub trait DifferenceEvaluator {
    fn evaluate(&self, comparison: &Comparison, outcome: ComparisonResult) -> ComparisonResult;
}

impl<F> DifferenceEvaluator for F
where
    F: Fn(&Comparison, ComparisonResult) -> ComparisonResult,
{
    fn evaluate(&self, comparison: &Comparison, outcome: ComparisonResult) -> ComparisonResult {
        self(comparison, outcome)
    }
}

/// Downgrades differences that rarely matter to [`ComparisonResult::Similar`].
///
/// Text vs CDATA node types, doctype presence and system id, schema
/// locations, namespace prefixes, defaulted attributes and child order are
/// similar. Everything else passes through.
pub fn default(comparison: &Comparison, outcome: ComparisonResult) -> ComparisonResult {
    if outcome != ComparisonResult::Different {
        return outcome;
    }
    let similar = match comparison.comparison_type {
        ComparisonType::NodeType => is_text_kind(&comparison.control.value)
            && is_text_kind(&comparison.test.value),
        ComparisonType::HasDoctypeDeclaration
        | ComparisonType::DoctypeSystemId
        | ComparisonType::SchemaLocation
        | ComparisonType::NoNamespaceSchemaLocation
        | ComparisonType::NamespacePrefix
        | ComparisonType::AttrValueExplicitlySpecified
        | ComparisonType::ChildNodelistSequence => true,
        _ => false,
    };
    if similar {
        ComparisonResult::Similar
    } else {
        outcome
    }
}

fn is_text_kind(value: &Option<ComparisonValue>) -> bool {
    matches!(value, Some(ComparisonValue::NodeType(t)) if t.is_text())
}

/// Wraps `inner` so that every remaining difference becomes critical, which
/// stops the engine from descending any further.
pub fn stop_when_different<E>(inner: E) -> impl DifferenceEvaluator
where
    E: DifferenceEvaluator,
{
    move |comparison: &Comparison, outcome: ComparisonResult| {
        match inner.evaluate(comparison, outcome) {
            ComparisonResult::Different => ComparisonResult::Critical,
            other => other,
        }
    }
}

/// Runs `evaluators` in order and returns the first result that differs from
/// the raw outcome, or the raw outcome if none of them changes it.
pub fn first(evaluators: Vec<Rc<dyn DifferenceEvaluator>>) -> impl DifferenceEvaluator {
    move |comparison: &Comparison, outcome: ComparisonResult| {
        evaluators
            .iter()
            .map(|e| e.evaluate(comparison, outcome))
            .find(|result| *result != outcome)
            .unwrap_or(outcome)
    }
}

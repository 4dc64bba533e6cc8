//! Per-document transfer: read each mapped source cell, optionally transform
//! it, and write it into the working copy of the template.
//!
//! No mapping failure aborts the document. A failed read leaves the
//! destination untouched, a failed formula falls back to the untransformed
//! value, and a failed write moves on to the next mapping.

use serde::Serialize;
use tracing::{debug, warn};

use super::formula::{Formula, FormulaError};
use super::mapping::MappingSpec;
use crate::error::TransferError;
use crate::types::{CellRef, CellValue, CellWriter, Sheet};

/// What happened to the transform step of one mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformOutcome {
    /// Plain copy
    NotRequested,
    /// Formula applied; `original` is the source value before transforming
    Applied { original: CellValue },
    /// Formula failed; the original value was written instead
    FellBack { reason: String },
}

/// Result of one mapping within one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MappingOutcome {
    Written {
        value: CellValue,
        transform: TransformOutcome,
    },
    /// Source cell unreadable; destination left untouched
    ReadFailed { reason: String },
    WriteFailed {
        value: CellValue,
        transform: TransformOutcome,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingReport {
    pub from: CellRef,
    pub to: CellRef,
    pub outcome: MappingOutcome,
}

impl MappingReport {
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, MappingOutcome::Written { .. })
    }
}

/// A mapping with its formula compiled once for the whole batch
#[derive(Debug, Clone)]
struct CompiledMapping {
    spec: MappingSpec,
    transform: Option<Result<Formula, FormulaError>>,
}

/// Applies an ordered mapping list to (source, template copy) pairs
#[derive(Debug, Clone)]
pub struct TransferEngine {
    mappings: Vec<CompiledMapping>,
}

impl TransferEngine {
    pub fn new(mappings: &[MappingSpec]) -> Self {
        let mappings = mappings
            .iter()
            .map(|spec| CompiledMapping {
                transform: spec.transform().map(Formula::compile),
                spec: spec.clone(),
            })
            .collect();
        Self { mappings }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Run every mapping in order against `template`, mutating it in place
    pub fn transfer<W: CellWriter>(&self, source: &Sheet, template: &mut W) -> Vec<MappingReport> {
        self.mappings
            .iter()
            .map(|mapping| self.apply(mapping, source, template))
            .collect()
    }

    fn apply<W: CellWriter>(
        &self,
        mapping: &CompiledMapping,
        source: &Sheet,
        template: &mut W,
    ) -> MappingReport {
        let from = mapping.spec.from();
        let to = mapping.spec.to();
        let report = |outcome| MappingReport { from, to, outcome };

        let original = match source.get(from) {
            Ok(value) => value,
            Err(e) => {
                warn!("{}; leaving {} untouched", e, to);
                return report(MappingOutcome::ReadFailed {
                    reason: e.to_string(),
                });
            }
        };
        debug!("Read {} = {:?}", from, original);

        let (value, transform) = match &mapping.transform {
            None => (original, TransformOutcome::NotRequested),
            Some(compiled) => {
                let result = compiled
                    .as_ref()
                    .map_err(Clone::clone)
                    .and_then(|formula| formula.eval(original.clone()));
                match result {
                    Ok(transformed) => {
                        let transformed = CellValue::from(transformed);
                        debug!(
                            "Transformed {:?} -> {:?} with '{}'",
                            original,
                            transformed,
                            mapping.spec.formula()
                        );
                        (transformed, TransformOutcome::Applied { original })
                    }
                    Err(cause) => {
                        let err = TransferError::Formula {
                            formula: mapping.spec.formula().to_string(),
                            source: cause,
                        };
                        warn!("{}; writing original value to {}", err, to);
                        (
                            original,
                            TransformOutcome::FellBack {
                                reason: err.to_string(),
                            },
                        )
                    }
                }
            }
        };

        match template.write_cell(to, value.clone()) {
            Ok(()) => {
                debug!("Wrote {:?} to {}", value, to);
                report(MappingOutcome::Written { value, transform })
            }
            Err(e) => {
                warn!("{}", e);
                report(MappingOutcome::WriteFailed {
                    value,
                    transform,
                    reason: e.to_string(),
                })
            }
        }
    }
}

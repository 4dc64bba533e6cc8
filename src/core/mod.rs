//! Transfer engine: mappings, formulas, per-document transfer and batching

pub mod batch;
pub mod column;
pub mod formula;
pub mod mapping;
pub mod transfer;

pub use batch::{prepare_output_dir, BatchOrchestrator, BatchReport, DocumentReport};
pub use formula::{Formula, FormulaError, FormulaPreview};
pub use mapping::{build_mappings, MappingSpec, RawMapping};
pub use transfer::{MappingOutcome, MappingReport, TransferEngine, TransformOutcome};

pub mod aggregation;
pub mod analysis;
pub mod archive;
pub mod catalog;
pub mod consolidation;
pub mod domain;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod reconciliation;
pub mod report;
pub mod scoring;
pub mod state;

pub use analysis::{AnalysisProvider, AnalysisRequest, AnalysisTarget};
pub use archive::{HistoricalAction, HistoricalDataArchive};
pub use catalog::IndicatorCatalog;
pub use domain::{OperatorSize, Periodicity, ScoringContext};
pub use loader::{load_documents, save_archive, DocumentPaths, LoadError};
pub use model::IdssTree;
pub use reconciliation::OperationalDocument;
pub use report::IdssReport;
pub use state::{IdssAction, IdssState, StateError};

use idss_sim::config::current_year;
use idss_sim::error::AppError;
use idss_sim::idss::{
    load_documents, save_archive, DocumentPaths, HistoricalDataArchive, IdssAction, IdssState,
    ScoringContext,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared handle to the one live state plus the file its archive persists to.
#[derive(Clone)]
pub(crate) struct IdssStore {
    state: Arc<Mutex<IdssState>>,
    archive_path: Arc<PathBuf>,
}

impl IdssStore {
    pub(crate) fn new(state: IdssState, archive_path: PathBuf) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            archive_path: Arc::new(archive_path),
        }
    }

    pub(crate) async fn snapshot(&self) -> IdssState {
        self.state.lock().await.clone()
    }

    pub(crate) async fn archive(&self) -> HistoricalDataArchive {
        self.state.lock().await.archive.clone()
    }

    /// Reduces `action` against the live state. Archive-changing actions are
    /// written to disk before the new state is published.
    pub(crate) async fn dispatch(&self, action: IdssAction) -> Result<IdssState, AppError> {
        let persists = matches!(
            action,
            IdssAction::MergeHistorical { .. } | IdssAction::EditArchive { .. }
        );
        let label = action.label();

        let mut guard = self.state.lock().await;
        let next = guard.reduce(action)?;
        if persists {
            save_archive(&self.archive_path, &next.archive).await?;
        }
        *guard = next.clone();

        tracing::info!(
            action = label,
            reference_year = next.context.reference_year,
            overall = ?next.tree.nota_final_calculada,
            "state updated"
        );
        Ok(next)
    }
}

pub(crate) async fn load_state(
    paths: &DocumentPaths,
    context: ScoringContext,
) -> Result<IdssState, AppError> {
    let documents = load_documents(paths).await?;
    Ok(IdssState::reconcile(
        &documents.operational,
        documents.archive,
        context,
        current_year(),
    ))
}

use clap::Args;
use degree_planner::config::PlannerConfig;
use degree_planner::error::AppError;
use degree_planner::planning::{
    CatalogImportError, CatalogImporter, DegreePlannerService, InMemoryCatalog,
    InMemoryPrerequisiteStore, LoadedCatalog, MajorKey,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type PlannerService = DegreePlannerService<InMemoryCatalog, InMemoryPrerequisiteStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) records: Arc<InMemoryCatalog>,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CatalogArgs {
    /// JSON catalog of courses, majors and students (overrides PLANNER_CATALOG_PATH)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// CSV transcript export (student_id,course_id,semester,status) applied after the catalog
    #[arg(long)]
    pub(crate) transcript: Option<PathBuf>,
}

/// Collaborators seeded from the catalog and transcript, ready to back a planner service.
pub(crate) struct PlannerBackend {
    pub(crate) records: Arc<InMemoryCatalog>,
    pub(crate) prerequisites: Arc<InMemoryPrerequisiteStore>,
}

impl PlannerBackend {
    pub(crate) fn load(args: &CatalogArgs, planner: &PlannerConfig) -> Result<Self, AppError> {
        let catalog_path = args.catalog.clone().or_else(|| planner.catalog_path.clone());

        let loaded = match &catalog_path {
            Some(path) => {
                let loaded = CatalogImporter::from_path(path, planner.max_prerequisite_depth)?;
                let summary = loaded
                    .records
                    .summary()
                    .map_err(CatalogImportError::from)?;
                info!(
                    path = %path.display(),
                    courses = summary.courses,
                    majors = summary.majors,
                    students = summary.students,
                    "catalog loaded"
                );
                loaded
            }
            None => {
                info!("no catalog configured; starting with an empty catalog");
                LoadedCatalog::default()
            }
        };

        if let Some(path) = &args.transcript {
            let rows = loaded.import_transcript_path(path)?;
            info!(path = %path.display(), rows, "transcript applied");
        }

        Ok(Self {
            records: Arc::new(loaded.records),
            prerequisites: Arc::new(loaded.prerequisites),
        })
    }

    pub(crate) fn service(&self, planner: &PlannerConfig) -> PlannerService {
        DegreePlannerService::new(self.records.clone(), self.prerequisites.clone(), planner)
    }
}

/// Accepts `CODE_DESIGNATION` or `CODE/DESIGNATION`, e.g. `CS_BS`.
pub(crate) fn parse_major_key(raw: &str) -> Result<MajorKey, String> {
    let trimmed = raw.trim();
    let (code, designation) = trimmed
        .rsplit_once('_')
        .or_else(|| trimmed.rsplit_once('/'))
        .ok_or_else(|| format!("expected CODE_DESIGNATION, got '{raw}'"))?;

    if code.is_empty() || designation.is_empty() {
        return Err(format!("expected CODE_DESIGNATION, got '{raw}'"));
    }
    Ok(MajorKey::new(code, designation))
}

//! Snapshot loader feeding the analytics engine.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use buildtrack_shared::{AppError, AppResult};

use buildtrack_core::analytics::{AnalyticsSnapshot, DateRange, ProjectData, SnapshotProvider};
use buildtrack_core::model::{ExtensionRequest, Phase, PhaseChange, Project};

use crate::codec;
use crate::paths;

use super::project::{load_expenses, load_phases};
use super::StoreContext;

/// Loads analytics snapshots from the document store.
///
/// All of a project's expenses are loaded regardless of the requested
/// range: the burn-rate series looks at a trailing wall-clock window that
/// may fall outside it. Per-project sub-collections load concurrently.
pub struct SnapshotLoader {
    ctx: Arc<StoreContext>,
}

impl SnapshotLoader {
    /// Creates the loader.
    #[must_use]
    pub const fn new(ctx: Arc<StoreContext>) -> Self {
        Self { ctx }
    }

    async fn load_projects(&self) -> AppResult<Vec<Project>> {
        let collection = paths::projects(&self.ctx.customer_id);
        let mut projects = Vec::new();
        for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
            let path = format!("{collection}/{}", doc.id);
            projects.push(codec::decode_project(&doc.id, &doc.fields, &path)?);
        }
        Ok(projects)
    }

    async fn load_requests(
        &self,
        project: &Project,
        phase: &Phase,
    ) -> AppResult<Vec<ExtensionRequest>> {
        let collection = paths::requests(&self.ctx.customer_id, &project.id, &phase.id);
        let mut requests = Vec::new();
        for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
            let path = format!("{collection}/{}", doc.id);
            requests.push(codec::decode_request(&doc.id, &doc.fields, &path)?);
        }
        Ok(requests)
    }

    async fn load_changes(&self, project: &Project, phase: &Phase) -> AppResult<Vec<PhaseChange>> {
        let collection = paths::changes(&self.ctx.customer_id, &project.id, &phase.id);
        let mut changes = Vec::new();
        for doc in self.ctx.store.list(&collection).await.map_err(AppError::from)? {
            let path = format!("{collection}/{}", doc.id);
            changes.push(codec::decode_change(&doc.id, &doc.fields, &path)?);
        }
        Ok(changes)
    }

    async fn load_project_data(&self, project: Project) -> AppResult<(Project, ProjectData)> {
        let (phases, expenses) = futures::try_join!(
            load_phases(&self.ctx, &project.id),
            load_expenses(&self.ctx, &project.id),
        )?;
        let (per_phase_requests, per_phase_changes) = futures::try_join!(
            try_join_all(phases.iter().map(|phase| self.load_requests(&project, phase))),
            try_join_all(phases.iter().map(|phase| self.load_changes(&project, phase))),
        )?;
        let extensions = per_phase_requests.into_iter().flatten().collect();
        let changes = per_phase_changes.into_iter().flatten().collect();
        Ok((
            project,
            ProjectData {
                phases,
                expenses,
                extensions,
                changes,
            },
        ))
    }
}

#[async_trait]
impl SnapshotProvider for SnapshotLoader {
    async fn load(&self, range: DateRange) -> AppResult<AnalyticsSnapshot> {
        let projects = self.load_projects().await?;
        let loaded = try_join_all(
            projects
                .into_iter()
                .map(|project| self.load_project_data(project)),
        )
        .await?;
        Ok(AnalyticsSnapshot {
            range,
            projects: loaded,
        })
    }
}

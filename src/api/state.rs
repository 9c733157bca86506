use crate::api::error::{ApiError, ApiResult};
use crate::assessment::ImpactAnalyst;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// `None` when no API key is configured.
    pub analyst: Option<Arc<ImpactAnalyst>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, analyst: Option<ImpactAnalyst>) -> Self {
        Self {
            db,
            analyst: analyst.map(Arc::new),
        }
    }

    pub fn analyst(&self) -> ApiResult<&ImpactAnalyst> {
        self.analyst
            .as_deref()
            .ok_or_else(|| ApiError::Upstream(anyhow::anyhow!("no API key configured")))
    }
}

use crate::config::AppConfig;
use crate::jobs::{DatabricksJobs, JobLauncher};
use crate::warehouse::{DatabricksWarehouse, Warehouse};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub warehouse: Arc<dyn Warehouse>,
    pub jobs: Arc<dyn JobLauncher>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let warehouse = Arc::new(DatabricksWarehouse::new(&config.warehouse)?) as Arc<dyn Warehouse>;
        let jobs = Arc::new(DatabricksJobs::new(&config.jobs)?) as Arc<dyn JobLauncher>;

        Ok(Self::from_parts(config, warehouse, jobs))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        warehouse: Arc<dyn Warehouse>,
        jobs: Arc<dyn JobLauncher>,
    ) -> Self {
        Self {
            config,
            warehouse,
            jobs,
        }
    }

    /// Fully qualified user table.
    pub fn users_table(&self) -> String {
        self.config.warehouse.table("user")
    }

    /// Fully qualified generated-questions table.
    pub fn questions_table(&self) -> String {
        self.config.warehouse.table("generated_questions")
    }
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    jobs::{
        dto::{JobFilterRequest, JobRequest},
        filter::JobQuery,
        repo::JobStore,
        repo_types::{JobApplication, Page, PageRequest},
    },
};

const JOB_NOT_FOUND: &str = "Job not found for this user.";

/// Owner-scoped job application operations.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn create_job(
        &self,
        owner: &AuthUser,
        request: JobRequest,
    ) -> Result<JobApplication, AppError> {
        let draft = request.into_draft()?;
        let job = self.store.insert(owner.id, &draft).await?;
        info!(user_id = owner.id, job_id = job.id, "job application created");
        Ok(job)
    }

    pub async fn list_jobs(
        &self,
        owner: &AuthUser,
        page: PageRequest,
    ) -> Result<Page<JobApplication>, AppError> {
        Ok(self.store.find_by_owner(owner.id, page).await?)
    }

    pub async fn get_job(&self, owner: &AuthUser, id: i64) -> Result<JobApplication, AppError> {
        self.store
            .find_by_id_and_owner(id, owner.id)
            .await?
            .ok_or_else(|| AppError::NotFound(JOB_NOT_FOUND.into()))
    }

    pub async fn update_job(
        &self,
        owner: &AuthUser,
        id: i64,
        request: JobRequest,
    ) -> Result<JobApplication, AppError> {
        let draft = request.into_draft()?;
        let Some(job) = self.store.update(id, owner.id, &draft).await? else {
            warn!(user_id = owner.id, job_id = id, "update of job not owned by caller");
            return Err(AppError::NotFound(JOB_NOT_FOUND.into()));
        };
        info!(user_id = owner.id, job_id = id, "job application updated");
        Ok(job)
    }

    pub async fn delete_job(&self, owner: &AuthUser, id: i64) -> Result<(), AppError> {
        if !self.store.delete(id, owner.id).await? {
            warn!(user_id = owner.id, job_id = id, "delete of job not owned by caller");
            return Err(AppError::NotFound(JOB_NOT_FOUND.into()));
        }
        info!(user_id = owner.id, job_id = id, "job application deleted");
        Ok(())
    }

    /// Sparse filter over the caller's records. The owner predicate is always
    /// applied, whatever the filter says.
    pub async fn filter_jobs(
        &self,
        owner: &AuthUser,
        filter: &JobFilterRequest,
        page: PageRequest,
    ) -> Result<Page<JobApplication>, AppError> {
        let query = JobQuery::from_filter(&owner.email, filter, page)?;
        Ok(self.store.search(&query).await?)
    }
}

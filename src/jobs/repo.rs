use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::PgStore,
    error::StoreError,
    jobs::{
        filter::JobQuery,
        repo_types::{JobApplication, JobDraft, JobRow, Page, PageRequest},
    },
};

const JOB_COLUMNS: &str = "j.id, j.user_id, j.position, j.company, j.job_board_used, \
     j.application_link, j.status, j.date_applied, j.interview_date, j.created_at";

/// Job applications. Every call is keyed by owner, so a record belonging
/// to someone else is indistinguishable from a missing one.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, owner_id: i64, job: &JobDraft) -> Result<JobApplication, StoreError>;

    async fn find_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<JobApplication>, StoreError>;

    async fn find_by_id_and_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<JobApplication>, StoreError>;

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        job: &JobDraft,
    ) -> Result<Option<JobApplication>, StoreError>;

    /// Returns false when no owned record had that id.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, StoreError>;

    async fn search(&self, query: &JobQuery) -> Result<Page<JobApplication>, StoreError>;
}

fn into_jobs(rows: Vec<JobRow>) -> Result<Vec<JobApplication>, StoreError> {
    rows.into_iter()
        .map(|r| {
            JobApplication::try_from(r)
                .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))
        })
        .collect()
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert(&self, owner_id: i64, job: &JobDraft) -> Result<JobApplication, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            INSERT INTO job_applications AS j
                (user_id, position, company, job_board_used, application_link, status,
                 date_applied, interview_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&job.position)
        .bind(&job.company)
        .bind(&job.job_board_used)
        .bind(&job.application_link)
        .bind(job.status.as_str())
        .bind(job.date_applied)
        .bind(job.interview_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_jobs(vec![row])?.remove(0))
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<JobApplication>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_applications WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM job_applications j
            WHERE j.user_id = $1
            ORDER BY j.id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(Page::new(into_jobs(rows)?, page, total as u64))
    }

    async fn find_by_id_and_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<JobApplication>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_applications j WHERE j.id = $1 AND j.user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(into_jobs(row.into_iter().collect())?.pop())
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        job: &JobDraft,
    ) -> Result<Option<JobApplication>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            UPDATE job_applications AS j
            SET position = $3, company = $4, job_board_used = $5, application_link = $6,
                status = $7, date_applied = $8, interview_date = $9
            WHERE j.id = $1 AND j.user_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&job.position)
        .bind(&job.company)
        .bind(&job.job_board_used)
        .bind(&job.application_link)
        .bind(job.status.as_str())
        .bind(job.date_applied)
        .bind(job.interview_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(into_jobs(row.into_iter().collect())?.pop())
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn search(&self, query: &JobQuery) -> Result<Page<JobApplication>, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM job_applications j JOIN users u ON u.id = j.user_id",
        );
        query.push_predicate(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {JOB_COLUMNS} FROM job_applications j JOIN users u ON u.id = j.user_id"
        ));
        query.push_predicate(&mut select);
        query.push_order_and_page(&mut select);
        let rows = select.build_query_as::<JobRow>().fetch_all(&self.pool).await?;

        Ok(Page::new(into_jobs(rows)?, query.page, total as u64))
    }
}

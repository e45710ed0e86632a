use serde::Deserialize;
use time::Date;

use crate::{
    error::AppError,
    jobs::repo_types::{iso_date, JobDraft, JobStatus, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};

/// Body of `POST /jobs` and `PUT /jobs/:id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    pub job_board_used: Option<String>,
    pub application_link: Option<String>,
    pub status: JobStatus,
    #[serde(default, with = "iso_date", alias = "applicationDate")]
    pub date_applied: Option<Date>,
    #[serde(default, with = "iso_date")]
    pub interview_date: Option<Date>,
}

impl JobRequest {
    pub fn into_draft(self) -> Result<JobDraft, AppError> {
        let mut errors = Vec::new();
        if self.position.trim().is_empty() {
            errors.push("position: Position is required");
        }
        if self.company.trim().is_empty() {
            errors.push("company: Company is required");
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(JobDraft {
            position: self.position.trim().to_string(),
            company: self.company.trim().to_string(),
            job_board_used: blank_to_none(self.job_board_used),
            application_link: blank_to_none(self.application_link),
            status: self.status,
            date_applied: self.date_applied,
            interview_date: self.interview_date,
        })
    }
}

/// Body of `POST /jobs/filter`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilterRequest {
    pub status: Option<String>,
    pub company: Option<String>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

/// `?page=&size=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    pub fn to_request(&self) -> Result<PageRequest, AppError> {
        let page = self.page.unwrap_or(0);
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        if page < 0 || page > u32::MAX as i64 {
            return Err(AppError::Validation("page: must not be negative".into()));
        }
        if size < 1 || size > MAX_PAGE_SIZE as i64 {
            return Err(AppError::Validation(format!(
                "size: must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(PageRequest {
            page: page as u32,
            size: size as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn job_request_accepts_camel_case_and_legacy_date_name() {
        let req: JobRequest = serde_json::from_value(serde_json::json!({
            "position": "Backend Engineer",
            "company": "Acme",
            "jobBoardUsed": "LinkedIn",
            "status": "PENDING",
            "applicationDate": "2024-02-01",
            "interviewDate": null
        }))
        .unwrap();
        let draft = req.into_draft().unwrap();
        assert_eq!(draft.date_applied, Some(date!(2024-02-01)));
        assert_eq!(draft.interview_date, None);
        assert_eq!(draft.job_board_used.as_deref(), Some("LinkedIn"));
    }

    #[test]
    fn job_request_requires_position_and_company() {
        let req: JobRequest =
            serde_json::from_value(serde_json::json!({ "status": "OFFER" })).unwrap();
        let err = req.into_draft().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("position"));
        assert!(msg.contains("company"));
    }

    #[test]
    fn unknown_status_fails_deserialization() {
        let parsed = serde_json::from_value::<JobRequest>(serde_json::json!({
            "position": "x", "company": "y", "status": "GHOSTED"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn page_params_default_and_bounds() {
        assert_eq!(PageParams::default().to_request().unwrap(), PageRequest::default());
        assert!(PageParams { page: Some(-1), size: None }.to_request().is_err());
        assert!(PageParams { page: None, size: Some(0) }.to_request().is_err());
        assert!(PageParams { page: None, size: Some(101) }.to_request().is_err());
        assert_eq!(
            PageParams { page: Some(2), size: Some(25) }.to_request().unwrap(),
            PageRequest { page: 2, size: 25 }
        );
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Where an application stands. Stored as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Interview => "INTERVIEW",
            JobStatus::Offer => "OFFER",
            JobStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "INTERVIEW" => Ok(JobStatus::Interview),
            "OFFER" => Ok(JobStatus::Offer),
            "REJECTED" => Ok(JobStatus::Rejected),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

/// `YYYY-MM-DD` (de)serialization for optional calendar dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{macros::format_description, Date};

    pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => {
                let text = d
                    .format(format_description!("[year]-[month]-[day]"))
                    .map_err(serde::ser::Error::custom)?;
                s.serialize_str(&text)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => Date::parse(text, format_description!("[year]-[month]-[day]"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Row as stored; `status` is converted on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub user_id: i64,
    pub position: String,
    pub company: String,
    pub job_board_used: Option<String>,
    pub application_link: Option<String>,
    pub status: String,
    pub date_applied: Option<Date>,
    pub interview_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

/// A job application owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub position: String,
    pub company: String,
    pub job_board_used: Option<String>,
    pub application_link: Option<String>,
    pub status: JobStatus,
    #[serde(with = "iso_date")]
    pub date_applied: Option<Date>,
    #[serde(with = "iso_date")]
    pub interview_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<JobRow> for JobApplication {
    type Error = String;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            position: r.position,
            company: r.company,
            job_board_used: r.job_board_used,
            application_link: r.application_link,
            status: r.status.parse()?,
            date_applied: r.date_applied,
            interview_date: r.interview_date,
            created_at: r.created_at,
        })
    }
}

/// The caller-editable fields of a job application.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub position: String,
    pub company: String,
    pub job_board_used: Option<String>,
    pub application_link: Option<String>,
    pub status: JobStatus,
    pub date_applied: Option<Date>,
    pub interview_date: Option<Date>,
}

/// Zero-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    pub fn limit(&self) -> u64 {
        self.size as u64
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }
}

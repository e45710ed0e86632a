//! Owner-scoped search over job applications.
//!
//! A [`JobQuery`] is built from a sparse [`JobFilterRequest`] and rendered
//! into SQL (`push_predicate` / `push_order_and_page`). Tests also evaluate
//! it in process (`matches` / `compare`); both renderings must agree.

use sqlx::{Postgres, QueryBuilder};

use crate::{
    error::AppError,
    jobs::{
        dto::JobFilterRequest,
        repo_types::{JobStatus, PageRequest},
    },
};

/// Columns a caller may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    DateApplied,
    InterviewDate,
    Company,
    Position,
    Status,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dateapplied" | "applieddate" | "date_applied" => Some(SortField::DateApplied),
            "interviewdate" | "interview_date" => Some(SortField::InterviewDate),
            "company" => Some(SortField::Company),
            "position" => Some(SortField::Position),
            "status" => Some(SortField::Status),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortField::DateApplied => "j.date_applied",
            SortField::InterviewDate => "j.interview_date",
            SortField::Company => "j.company",
            SortField::Position => "j.position",
            SortField::Status => "j.status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::DateApplied,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub owner_email: String,
    pub status: Option<JobStatus>,
    /// Lower-cased needle for a substring match on company.
    pub company: Option<String>,
    pub sort: Sort,
    pub page: PageRequest,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl JobQuery {
    pub fn for_owner(owner_email: &str, page: PageRequest) -> Self {
        Self {
            owner_email: owner_email.to_string(),
            status: None,
            company: None,
            sort: Sort::default(),
            page,
        }
    }

    /// Blank filter fields are ignored. The sort override applies only when
    /// both field and direction are given.
    pub fn from_filter(
        owner_email: &str,
        filter: &JobFilterRequest,
        page: PageRequest,
    ) -> Result<Self, AppError> {
        let mut query = Self::for_owner(owner_email, page);

        if let Some(status) = non_blank(&filter.status) {
            query.status = Some(
                status
                    .parse()
                    .map_err(|_| AppError::Validation(format!("status: unknown value '{status}'")))?,
            );
        }

        query.company = non_blank(&filter.company).map(str::to_lowercase);

        if let (Some(field), Some(direction)) = (non_blank(&filter.sort_by), non_blank(&filter.direction)) {
            let field = SortField::parse(field)
                .ok_or_else(|| AppError::Validation(format!("sortBy: unsupported field '{field}'")))?;
            let direction = SortDirection::parse(direction).ok_or_else(|| {
                AppError::Validation(format!("direction: expected 'asc' or 'desc', got '{direction}'"))
            })?;
            query.sort = Sort { field, direction };
        }

        Ok(query)
    }

    /// Appends the WHERE clause. Expects `j` = job_applications, `u` = users.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE u.email = ").push_bind(self.owner_email.clone());
        if let Some(status) = self.status {
            qb.push(" AND j.status = ").push_bind(status.as_str());
        }
        if let Some(company) = &self.company {
            qb.push(" AND LOWER(j.company) LIKE ")
                .push_bind(format!("%{}%", escape_like(company)));
        }
    }

    pub fn push_order_and_page(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let direction = self.sort.direction.sql();
        qb.push(" ORDER BY ")
            .push(self.sort.field.column())
            .push(" ")
            .push(direction)
            .push(" NULLS LAST, j.id ")
            .push(direction);
        qb.push(" LIMIT ")
            .push_bind(self.page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(self.page.offset() as i64);
    }
}

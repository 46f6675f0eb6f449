//! Integration job queue (`GET /integrations/jobs`).

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_items};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Job {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub requested_by: Option<String>,
    pub last_error: Option<String>,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub attempts: String,
    pub created_at: String,
    pub error: Option<String>,
}

impl JobRow {
    pub fn is_failed(&self) -> bool {
        self.status.eq_ignore_ascii_case("failed")
    }
}

pub fn request(limit: u32) -> ApiRequest {
    endpoints::jobs(limit)
}

pub fn decode(value: Value) -> serde_json::Result<Vec<Job>> {
    decode_items(value)
}

pub fn project(jobs: &[Job], _ctx: &ProjectionContext<'_>) -> Vec<JobRow> {
    jobs.iter()
        .map(|job| JobRow {
            id: job.id.clone(),
            job_type: job.job_type.clone(),
            status: job.status.clone(),
            attempts: format!("{}/{}", job.attempt_count, job.max_attempts),
            created_at: job.created_at.clone(),
            error: job.last_error.clone().filter(|e| !e.is_empty()),
        })
        .collect()
}

//! Entity picker (`GET /pickers/cis`), used to find ids for selection and
//! relationship forms. Not part of the refresh cascade.

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_items};
use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PickerEntry {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub name: String,
    pub ci_type: String,
    pub status: String,
}

pub fn request(search: &str, limit: u32) -> ApiRequest {
    endpoints::picker(search, limit)
}

pub fn decode(value: Value) -> serde_json::Result<Vec<PickerEntry>> {
    decode_items(value)
}

/// `id  name (type, status)` lines, the selected entry marked.
pub fn project(entries: &[PickerEntry], ctx: &ProjectionContext<'_>) -> Vec<(bool, String)> {
    entries
        .iter()
        .map(|e| {
            (
                ctx.selected == Some(e.id.as_str()),
                format!("{}  {} ({}, {})", e.id, e.name, e.ci_type, e.status),
            )
        })
        .collect()
}

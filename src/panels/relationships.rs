//! Relationships touching the selected CI (`GET /relationships?ci_id=`).

use serde::Deserialize;
use serde_json::Value;

use super::{ProjectionContext, decode_items};
use crate::api::{ApiRequest, endpoints};
use crate::state::scope::{Control, RowAffordance};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelationshipRecord {
    #[serde(deserialize_with = "super::id_string::deserialize")]
    pub id: String,
    pub source_ci_id: String,
    pub target_ci_id: String,
    pub relation_type: String,
    pub source: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRow {
    pub id: String,
    pub from: String,
    pub relation_type: String,
    pub to: String,
    pub source: String,
    pub affordance: RowAffordance,
}

pub fn request(ci_id: &str, limit: u32) -> ApiRequest {
    endpoints::relationships_for(ci_id, limit)
}

pub fn decode(value: Value) -> serde_json::Result<Vec<RelationshipRecord>> {
    decode_items(value)
}

pub fn project(records: &[RelationshipRecord], ctx: &ProjectionContext<'_>) -> Vec<RelationshipRow> {
    records
        .iter()
        .map(|r| RelationshipRow {
            id: r.id.clone(),
            from: ctx.names.label(&r.source_ci_id),
            relation_type: r.relation_type.clone(),
            to: ctx.names.label(&r.target_ci_id),
            source: r.source.clone(),
            affordance: RowAffordance::for_row(ctx.scope, Control::DeleteRelationship, "delete"),
        })
        .collect()
}

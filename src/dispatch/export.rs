//! Audit and NetBox exports, saved to a local file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::api::{ApiRequest, endpoints};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Newline-delimited audit records.
    Audit,
    /// One JSON document in NetBox import shape.
    Netbox,
}

impl ExportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Audit => "audit export",
            Self::Netbox => "netbox export",
        }
    }

    pub fn request(self, limit: u32) -> ApiRequest {
        match self {
            Self::Audit => endpoints::audit_export(limit),
            Self::Netbox => endpoints::netbox_export(limit),
        }
    }

    /// `cmdb-audit-20261018T093000Z.jsonl` style name in the working directory.
    pub fn default_path(self, now: DateTime<Utc>) -> PathBuf {
        let stamp = now.format("%Y%m%dT%H%M%SZ");
        match self {
            Self::Audit => PathBuf::from(format!("cmdb-audit-{stamp}.jsonl")),
            Self::Netbox => PathBuf::from(format!("cmdb-netbox-{stamp}.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn default_paths_carry_a_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        assert_eq!(
            ExportKind::Audit.default_path(now),
            PathBuf::from("cmdb-audit-20261018T093000Z.jsonl")
        );
        assert_eq!(
            ExportKind::Netbox.default_path(now),
            PathBuf::from("cmdb-netbox-20261018T093000Z.json")
        );
    }

    #[test]
    fn requests_pass_the_limit() {
        assert_eq!(ExportKind::Audit.request(5).target(), "/audit/export?limit=5");
        assert_eq!(
            ExportKind::Netbox.request(5).target(),
            "/integrations/netbox/export?limit=5"
        );
    }
}

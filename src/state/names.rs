//! Best-effort id → display label cache.
//!
//! Filled from any response that carries CI records. Presentation only:
//! a miss falls back to the raw id.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    names: HashMap<String, String>,
}

impl NameIndex {
    pub fn insert(&mut self, id: &str, name: &str) {
        if id.is_empty() || name.trim().is_empty() {
            return;
        }
        self.names.insert(id.to_string(), name.trim().to_string());
    }

    /// Absorb any `{id, name}` objects in `records`; other shapes are skipped.
    pub fn absorb(&mut self, records: &[Value]) {
        for record in records {
            let id = match record.get("id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if let Some(name) = record.get("name").and_then(Value::as_str) {
                self.insert(&id, name);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Name when known, raw id otherwise.
    pub fn label(&self, id: &str) -> String {
        self.get(id).unwrap_or(id).to_string()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

//! CI list filter and pagination state.
//!
//! Invariants: `limit > 0`; `offset` returns to 0 whenever a filter is
//! applied (unless the caller suppresses it) and is kept across pure page
//! steps. Background refreshes never touch this state.

use serde::{Deserialize, Serialize};

/// Page size restored by [`QueryState::reset`].
pub const DEFAULT_LIMIT: u32 = 20;

/// Current filter and paging parameters of the CI list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    /// Free-text search, sent as `q`.
    pub text: String,
    pub source: String,
    pub status: String,
    pub owner: String,
    pub environment: String,
    /// CI class, sent as `ciClass`.
    pub ci_class: String,
    limit: u32,
    offset: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            text: String::new(),
            source: String::new(),
            status: String::new(),
            owner: String::new(),
            environment: String::new(),
            ci_class: String::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Values of the filter form, copied wholesale into [`QueryState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterFields {
    pub text: String,
    pub source: String,
    pub status: String,
    pub owner: String,
    pub environment: String,
    pub ci_class: String,
    /// New page size; `None` or `Some(0)` keeps the current one.
    pub limit: Option<u32>,
}

impl QueryState {
    pub fn limit(&self) -> u32 {
        self.limit.max(1)
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Copy form values in. Resets the offset unless `reset_offset` is false.
    pub fn apply_filters(&mut self, fields: &FilterFields, reset_offset: bool) {
        self.text = fields.text.trim().to_string();
        self.source = fields.source.trim().to_string();
        self.status = fields.status.trim().to_string();
        self.owner = fields.owner.trim().to_string();
        self.environment = fields.environment.trim().to_string();
        self.ci_class = fields.ci_class.trim().to_string();
        if let Some(limit) = fields.limit
            && limit > 0
        {
            self.limit = limit;
        }
        if reset_offset {
            self.offset = 0;
        }
    }

    /// Restore the documented defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one page. Upper bound is the server's `total`, enforced by
    /// the caller through [`PageWindow::has_next`].
    pub fn next_page(&mut self) {
        self.offset = self.offset.saturating_add(self.limit());
    }

    /// Go back one page. Returns `false` (and changes nothing) at offset 0.
    pub fn prev_page(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.limit());
        true
    }

    /// Current filters as form values, for pre-filling a new edit.
    pub fn fields(&self) -> FilterFields {
        FilterFields {
            text: self.text.clone(),
            source: self.source.clone(),
            status: self.status.clone(),
            owner: self.owner.clone(),
            environment: self.environment.clone(),
            ci_class: self.ci_class.clone(),
            limit: Some(self.limit()),
        }
    }

    /// Repair values read from disk so the invariants hold.
    pub fn normalized(mut self) -> Self {
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Page window
// ---------------------------------------------------------------------------

/// Paging facts of the latest list response. `total` is the server's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u32,
    pub count: u32,
    pub total: u64,
}

impl PageWindow {
    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.offset) + u64::from(self.count) < self.total
    }

    /// `X–Y of total`, recomputed from the latest response every time.
    pub fn label(&self) -> String {
        if self.count == 0 {
            return format!("0 of {}", self.total);
        }
        format!(
            "{}–{} of {}",
            u64::from(self.offset) + 1,
            u64::from(self.offset) + u64::from(self.count),
            self.total
        )
    }
}

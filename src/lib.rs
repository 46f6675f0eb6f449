//! cmdbdash: terminal operator dashboard for a CMDB service.

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod journal;
pub mod panels;
pub mod render;
pub mod session;
pub mod state;
pub mod utils;

pub mod catalog;
pub mod config;
pub mod console_log;
pub mod document_source;
pub mod error;
pub mod event_cache;
pub mod http_client;
pub mod loader;
pub mod session;
pub mod sheet_url;
pub mod state;
pub mod team;
pub mod xlsx_events;

pub mod config;
pub mod http;
pub mod types;

pub const DATA_FILE_ORGANIZATIONS: &str = "organizations.db";

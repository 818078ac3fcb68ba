pub mod error;
pub mod metadata;
pub mod organizations;
pub mod sqlite;
pub mod test_util;

pub use error::Result;

pub use crate::metadata::MetadataProvider;

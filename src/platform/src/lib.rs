pub mod error;
pub mod http;
pub mod organizations;
pub mod tree;

use std::sync::Arc;

pub use error::PlatformError;
pub use error::Result;
use metadata::MetadataProvider;

use crate::organizations::Organizations;

pub struct PlatformProvider {
    pub organizations: Arc<Organizations>,
}

impl PlatformProvider {
    pub fn new(md: Arc<MetadataProvider>) -> Self {
        Self {
            organizations: Arc::new(Organizations::new(md)),
        }
    }
}

use std::env::temp_dir;
use std::sync::Arc;

use uuid::Uuid;

use crate::sqlite;
use crate::MetadataProvider;
use crate::Result;

/// Metadata provider backed by a fresh sqlite file in the temp directory.
pub async fn init_db() -> Result<Arc<MetadataProvider>> {
    let mut path = temp_dir();
    path.push(format!("{}.db", Uuid::new_v4()));

    let pool = sqlite::new(path, 4).await?;

    Ok(Arc::new(MetadataProvider::new(pool)))
}

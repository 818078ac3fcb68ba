//! Depth rules of the organization tree.
//!
//! A tree has at most five levels: roots sit at level 0 and the deepest node
//! at [`MAX_LEVEL`].

use std::collections::BTreeSet;

use metadata::organizations::Organizations;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::TreeError;
use crate::Result;

pub const MAX_LEVEL: i64 = 4;

/// Level a new node gets under `parent_id`. The parent must be live and must
/// not already sit at [`MAX_LEVEL`].
pub async fn resolve_creation_level(
    orgs: &Organizations,
    conn: &mut SqliteConnection,
    parent_id: Option<i64>,
) -> Result<i64> {
    let Some(parent_id) = parent_id else {
        return Ok(0);
    };

    let parent = orgs.get_by_id_(conn, parent_id).await?;
    if parent.level >= MAX_LEVEL {
        return Err(TreeError::DepthExceeded.into());
    }

    Ok(parent.level + 1)
}

/// Ids of `root_id` and all of its live descendants.
///
/// Expands breadth-first one level per round. A root can have descendants at
/// most `MAX_LEVEL` levels below it, so `MAX_LEVEL` rounds reach every one.
pub async fn compute_cascade_set(
    orgs: &Organizations,
    conn: &mut SqliteConnection,
    root_id: i64,
) -> Result<BTreeSet<i64>> {
    let mut visited = BTreeSet::from([root_id]);
    let mut frontier = BTreeSet::from([root_id]);

    for round in 0..MAX_LEVEL {
        // an empty frontier short-circuits inside the gateway
        let children = orgs.get_by_parent_ids_(conn, &frontier).await?;
        frontier = children
            .into_iter()
            .map(|org| org.id)
            .filter(|id| visited.insert(*id))
            .collect();
        debug!(root_id, round, found = frontier.len(), "cascade round");
    }

    Ok(visited)
}

use std::collections::BTreeSet;
use std::sync::Arc;

use common::types::OptionalProperty;
use metadata::error::MetadataError;
use metadata::MetadataProvider;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::error::TreeError;
use crate::tree::compute_cascade_set;
use crate::tree::resolve_creation_level;
use crate::Result;

/// Organization use cases. Every mutation runs in a single storage
/// transaction, so a failure at any step leaves the tree untouched.
pub struct Organizations {
    md: Arc<MetadataProvider>,
}

impl Organizations {
    pub fn new(md: Arc<MetadataProvider>) -> Self {
        Self { md }
    }

    pub async fn create(&self, req: CreateOrganizationRequest) -> Result<OrganizationNode> {
        req.validate()?;

        let orgs = &self.md.organizations;
        let mut tx = self.md.begin_write().await?;
        let level = resolve_creation_level(orgs, &mut tx, req.parent_id).await?;
        let org = orgs
            .create_(&mut tx, metadata::organizations::CreateOrganizationRequest {
                name: req.name,
                parent_id: req.parent_id,
                level,
            })
            .await?;
        tx.commit().await.map_err(MetadataError::from)?;

        info!(id = org.id, parent_id = ?org.parent_id, level, "organization created");

        Ok(OrganizationNode {
            id: org.id,
            name: org.name,
            parent_id: org.parent_id,
            children: None,
        })
    }

    /// The node with its direct children only.
    pub async fn get_by_id(&self, id: i64) -> Result<OrganizationNode> {
        let orgs = &self.md.organizations;
        let mut conn = self.md.begin().await?;
        let org = orgs.get_by_id_(&mut conn, id).await?;
        let children = orgs
            .get_by_parent_ids_(&mut conn, &BTreeSet::from([org.id]))
            .await?
            .into_iter()
            .map(|child| OrganizationNode {
                id: child.id,
                name: child.name,
                parent_id: child.parent_id,
                children: None,
            })
            .collect();
        conn.commit().await.map_err(MetadataError::from)?;

        Ok(OrganizationNode {
            id: org.id,
            name: org.name,
            parent_id: org.parent_id,
            children: Some(children),
        })
    }

    pub async fn update(&self, id: i64, req: UpdateOrganizationRequest) -> Result<Organization> {
        req.validate()?;

        let orgs = &self.md.organizations;
        let mut tx = self.md.begin_write().await?;
        let current = orgs.get_by_id_(&mut tx, id).await?;
        if let OptionalProperty::Some(parent_id) = req.parent_id {
            if parent_id != current.parent_id {
                return Err(TreeError::ReparentingNotSupported.into());
            }
        }

        let org = orgs
            .update_(&mut tx, id, metadata::organizations::UpdateOrganizationRequest {
                name: req.name,
                parent_id: current.parent_id,
            })
            .await?;
        tx.commit().await.map_err(MetadataError::from)?;

        info!(id, "organization updated");

        Ok(org.into())
    }

    /// Soft-deletes the node and its whole subtree. Deleting a missing or
    /// already deleted node succeeds without changes.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let orgs = &self.md.organizations;
        let mut tx = self.md.begin_write().await?;
        let ids = compute_cascade_set(orgs, &mut tx, id).await?;
        let deleted = orgs.soft_delete_(&mut tx, &ids).await?;
        tx.commit().await.map_err(MetadataError::from)?;

        info!(id, deleted, "organization deleted");

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Organization>> {
        Ok(self
            .md
            .organizations
            .list()
            .await?
            .into_iter()
            .map(Organization::from)
            .collect())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

impl From<metadata::organizations::Organization> for Organization {
    fn from(value: metadata::organizations::Organization) -> Self {
        Organization {
            id: value.id,
            name: value.name,
            parent_id: value.parent_id,
        }
    }
}

/// Organization as returned by create and read. `children` is `None` unless
/// the node was read directly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrganizationNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub children: Option<Vec<OrganizationNode>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "OptionalProperty::is_none")]
    pub parent_id: OptionalProperty<Option<i64>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EmptyResponse {}

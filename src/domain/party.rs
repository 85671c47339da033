use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    #[serde(rename = "super_admin")]
    SuperAdmin,
    #[serde(rename = "admin_cabang")]
    BranchAdmin,
    #[serde(rename = "user")]
    User,
}

/// The authenticated caller of a workflow.
///
/// Produced by the identity collaborator (token verification happens there,
/// not here) and threaded explicitly into every service call. Branch admins
/// carry the branch they administer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub branch_id: Option<Uuid>,
}

impl Principal {
    pub fn super_admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::SuperAdmin,
            branch_id: None,
        }
    }

    pub fn branch_admin(user_id: Uuid, branch_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::BranchAdmin,
            branch_id: Some(branch_id),
        }
    }

    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::User,
            branch_id: None,
        }
    }

    /// True when the principal may act on behalf of the given branch.
    pub fn covers_branch(&self, branch_id: Uuid) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::BranchAdmin => self.branch_id == Some(branch_id),
            Role::User => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Branch {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub branch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            branch_id: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

//! Team members that tasks can be assigned to.

use crate::api::ApiClient;
use serde::{Deserialize, Serialize};
use taskboard_core::{AssignedUser, GatewayError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

impl Member {
    /// The member as embedded in a task record.
    pub fn as_assignee(&self) -> AssignedUser {
        AssignedUser {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemberError {
    #[error("Member name is required")]
    MissingName,
    #[error("Member phone is required")]
    MissingPhone,
    #[error("Member designation is required")]
    MissingDesignation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewMember {
    pub name: String,
    pub phone: String,
    pub designation: String,
}

impl NewMember {
    pub fn validate(&self) -> Result<(), MemberError> {
        if self.name.trim().is_empty() {
            return Err(MemberError::MissingName);
        }
        if self.phone.trim().is_empty() {
            return Err(MemberError::MissingPhone);
        }
        if self.designation.trim().is_empty() {
            return Err(MemberError::MissingDesignation);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddMemberResponse {
    pub message: String,
    #[serde(default, rename = "userId")]
    pub user_id: Option<u64>,
}

impl ApiClient {
    #[tracing::instrument(skip(self))]
    pub async fn members(&self) -> Result<Vec<Member>, GatewayError> {
        let url = self.endpoint(&["user", "getAll"])?;
        self.send(self.http().get(url)).await
    }

    /// Registers a member. Incomplete input is rejected before anything is sent.
    #[tracing::instrument(skip(self, member), fields(name = %member.name))]
    pub async fn add_member(&self, member: &NewMember) -> Result<AddMemberResponse, GatewayError> {
        member
            .validate()
            .map_err(|e| GatewayError::Validation(e.to_string()))?;
        let url = self.endpoint(&["user", "add"])?;
        let response: AddMemberResponse = self.send(self.http().post(url).json(member)).await?;
        tracing::info!("Added member: {}", response.message);
        Ok(response)
    }
}

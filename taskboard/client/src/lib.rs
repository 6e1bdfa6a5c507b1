//! HTTP client for the task backend.
//!
//! [`ApiClient`] implements [`taskboard_core::RemoteGateway`] for the task
//! endpoints and additionally covers team members and administrator sessions.
pub mod api;
pub mod auth;
pub mod config;
mod tasks;
pub mod users;

pub use api::{ApiClient, ClientError, normalize_error};
pub use auth::{
    AdminUser, Credentials, MemoryTokenStore, Role, SignupRequest, SignupResponse, TokenStore,
};
pub use config::ClientConfig;
pub use users::{AddMemberResponse, Member, MemberError, NewMember};

use taskboard_core::{Dashboard, SyncEngine};

/// Builds a dashboard backed by the configured API. Nothing is fetched until
/// the engine is loaded.
pub fn connect(config: &ClientConfig) -> Result<Dashboard<ApiClient>, ClientError> {
    let client = ApiClient::new(config)?;
    let engine = SyncEngine::new(client, config.engine_config());
    Ok(Dashboard::new(engine))
}

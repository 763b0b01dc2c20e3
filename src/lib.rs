/*
 * SoftOne gateway client - async Rust client for the SoftOne ERP
 * s1services HTTP gateway
 */

// Internal modules
mod client;
mod config;
mod error;
mod models;
mod params;
mod response;
mod session;


// Re-export public types and interfaces
pub use client::SoftoneClient;
pub use config::SoftoneConfig;
pub use error::{SoftoneError, SoftoneResult};
pub use models::TenantContext;
pub use response::{GatewayResponse, GATEWAY_CONTENT_TYPE};
pub use session::SessionApi;

// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        GatewayResponse, SoftoneClient, SoftoneConfig, SoftoneError, SoftoneResult, TenantContext,
    };
}

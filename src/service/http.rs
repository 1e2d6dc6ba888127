use anyhow::Context;
use rquest::Client;
use rquest_util::Emulation;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    Standard,
    HeavyEmulation,
}

/// Factory for creating an HTTP client based on the desired level of stealth/performance.
pub fn create_client(client_type: ClientType) -> Result<Client> {
    let builder = Client::builder().timeout(Duration::from_secs(30));

    let client = match client_type {
        ClientType::HeavyEmulation => {
            // Use rquest_util for heavy browser impersonation; job boards and
            // Google both fingerprint plain clients
            builder
                .emulation(Emulation::Firefox136)
                .build()
                .context("Failed to build heavy impersonated rquest client")?
        }
        ClientType::Standard => builder
            .build()
            .context("Failed to build standard rquest client")?,
    };

    Ok(client)
}

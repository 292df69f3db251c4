use crate::domain::ports::Resolver;
use crate::utils::error::{BootError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;

/// System resolver via `tokio::net::lookup_host` (getaddrinfo, both families).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| BootError::ResolveError {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(BootError::ResolveError {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            });
        }
        Ok(addrs)
    }
}

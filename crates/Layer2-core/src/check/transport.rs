//! Privilege-check transport
//!
//! The trait is the seam between the check client and whatever answers
//! `_has_privileges`; the HTTP implementation talks to the security
//! service directly.

use super::types::{HasPrivilegesRequest, HasPrivilegesResponse, RequestContext};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tessera_foundation::{CheckPrivilegesConfig, Error as FoundationError};
use tracing::debug;

const HAS_PRIVILEGES_PATH: &str = "/_security/user/_has_privileges";

/// Sends a privilege-check request on behalf of the caller
#[async_trait]
pub trait PrivilegeCheckTransport: Send + Sync {
    async fn has_privileges(
        &self,
        context: &RequestContext,
        request: &HasPrivilegesRequest,
    ) -> Result<HasPrivilegesResponse, TransportError>;
}

/// `_has_privileges` over HTTP
pub struct HttpPrivilegeCheckTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPrivilegeCheckTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &CheckPrivilegesConfig) -> Result<Self, FoundationError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            FoundationError::Config("checkPrivileges.baseUrl is not configured".to_string())
        })?;
        Ok(Self::new(base_url, Duration::from_millis(config.timeout_ms)))
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, HAS_PRIVILEGES_PATH)
    }
}

#[async_trait]
impl PrivilegeCheckTransport for HttpPrivilegeCheckTransport {
    async fn has_privileges(
        &self,
        context: &RequestContext,
        request: &HasPrivilegesRequest,
    ) -> Result<HasPrivilegesResponse, TransportError> {
        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, "Sending privilege check");

        let mut builder = self
            .client
            .post(&endpoint)
            .timeout(self.timeout)
            .header("content-type", "application/json")
            .json(request);

        if let Some(authorization) = &context.authorization {
            builder = builder.header("authorization", authorization);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status, &body));
        }

        response
            .json::<HasPrivilegesResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let transport =
            HttpPrivilegeCheckTransport::new("http://localhost:9200/", Duration::from_secs(1));
        assert_eq!(
            transport.endpoint(),
            "http://localhost:9200/_security/user/_has_privileges"
        );
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = CheckPrivilegesConfig::default();
        assert!(HttpPrivilegeCheckTransport::from_config(&config).is_err());

        let config = CheckPrivilegesConfig {
            base_url: Some("http://es:9200".to_string()),
            timeout_ms: 500,
        };
        let transport = HttpPrivilegeCheckTransport::from_config(&config).unwrap();
        assert_eq!(transport.timeout, Duration::from_millis(500));
    }
}

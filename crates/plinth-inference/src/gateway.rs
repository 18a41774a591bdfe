//! AI gateway routing.

use serde::{Deserialize, Serialize};

use crate::provider::{EndpointConfig, Provider};

/// Configuration for routing provider calls through an AI gateway.
///
/// Gateway routing replaces the endpoint base URL and injects routing
/// headers; the provider's own key still rides along for the gateway to
/// forward. Local inference bindings are never gateway-routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway base URL including the version path.
    pub base_url: String,
    /// Gateway API key.
    pub api_key: String,
}

impl GatewayConfig {
    /// Creates a gateway configuration.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Applies gateway routing to an endpoint.
    ///
    /// Returns the endpoint unchanged for local providers.
    pub fn apply(&self, endpoint: EndpointConfig) -> EndpointConfig {
        if endpoint.provider.is_local() {
            return endpoint;
        }

        let provider = endpoint.provider;
        EndpointConfig {
            provider,
            base_url: self.base_url.clone(),
            api_key: endpoint.api_key,
            headers: {
                let mut headers = endpoint.headers;
                headers.push(("x-gateway-api-key".to_string(), self.api_key.clone()));
                headers.push((
                    "x-gateway-provider".to_string(),
                    provider.as_str().to_string(),
                ));
                headers
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_hosted_providers() {
        let gateway = GatewayConfig::new("https://gateway.example.com/v1", "gw-key");
        let endpoint = EndpointConfig::new(Provider::OpenAi, Some("sk-abc".into()));

        let routed = gateway.apply(endpoint);
        assert_eq!(routed.base_url, "https://gateway.example.com/v1");
        assert_eq!(routed.api_key.as_deref(), Some("sk-abc"));
        assert!(
            routed
                .headers
                .iter()
                .any(|(name, value)| name == "x-gateway-provider" && value == "openai")
        );
    }

    #[test]
    fn never_routes_local() {
        let gateway = GatewayConfig::new("https://gateway.example.com/v1", "gw-key");
        let endpoint =
            EndpointConfig::new(Provider::Local, None).with_base_url("http://localhost:11434/v1");

        let routed = gateway.apply(endpoint);
        assert_eq!(routed.base_url, "http://localhost:11434/v1");
        assert!(routed.headers.is_empty());
    }
}

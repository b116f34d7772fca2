//! Bearer-token seam
//!
//! The catalog crate never runs an OAuth flow itself. Hosts own the browser
//! and callback plumbing and hand tokens over through this trait; release
//! listing simply asks for the current token before each call.

use crate::error::Result;
use async_trait::async_trait;

/// Source of bearer tokens for authenticated catalog calls
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current bearer token, or `None` when the host has no credentials.
    ///
    /// Implementations refresh expired tokens before returning them.
    async fn bearer_token(&self) -> Result<Option<String>>;
}

/// Fixed-token provider for tests and embedded use
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider with no credentials at all.
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("abc123");
        assert_eq!(provider.bearer_token().await.unwrap().as_deref(), Some("abc123"));

        let anonymous = StaticTokenProvider::anonymous();
        assert_eq!(anonymous.bearer_token().await.unwrap(), None);
    }
}

use async_trait::async_trait;

use super::Credentials;
use crate::status::StatusOr;

/// Credentials for public resources and local emulators: no `Authorization`
/// header is sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousCredentials;

impl AnonymousCredentials {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Credentials for AnonymousCredentials {
    async fn authorization_header(&self) -> StatusOr<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_header_is_empty() {
        let credentials = AnonymousCredentials::new();
        assert_eq!(credentials.authorization_header().await.unwrap(), "");
    }
}

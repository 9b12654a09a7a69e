use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Raw GET access to the legacy host.
///
/// `path` is either relative to the configured base address (`api/mods`,
/// `/web/img/mod-default.png`) or an absolute URL, as file links are.
#[async_trait]
pub trait LegacyTransport: Send + Sync {
    async fn get(&self, path: &str) -> anyhow::Result<Bytes>;
}

pub struct HttpLegacyTransport {
    client: Client,
    base: Url,
}

impl HttpLegacyTransport {
    pub fn new(base_address: &str, timeout: Duration) -> anyhow::Result<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_address.ends_with('/') {
            base_address.to_string()
        } else {
            format!("{}/", base_address)
        };
        let base = Url::parse(&normalized)
            .with_context(|| format!("Invalid legacy base address: {}", base_address))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl LegacyTransport for HttpLegacyTransport {
    async fn get(&self, path: &str) -> anyhow::Result<Bytes> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("Invalid legacy path: {}", path))?;

        debug!(%url, "legacy GET");
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_and_absolute_paths() {
        let transport =
            HttpLegacyTransport::new("https://mods.example/legacy", Duration::from_secs(5)).unwrap();

        assert_eq!(
            transport.base().join("api/mod/12").unwrap().as_str(),
            "https://mods.example/legacy/api/mod/12"
        );
        assert_eq!(
            transport.base().join("/web/img/mod-default.png").unwrap().as_str(),
            "https://mods.example/web/img/mod-default.png"
        );
        assert_eq!(
            transport.base().join("https://cdn.example/f.zip").unwrap().as_str(),
            "https://cdn.example/f.zip"
        );
    }

    #[test]
    fn rejects_garbage_base() {
        assert!(HttpLegacyTransport::new("not a url", Duration::from_secs(5)).is_err());
    }
}

//! Retrieval of XML documents from the gateway's web service.
//!
//! The state query only builds a URL; fetching it is delegated to an
//! [`XmlLoader`] so that callers can swap the transport (a preconfigured
//! `reqwest` client, a proxy, a recorded fixture in tests).

use crate::errors::{Result, RobokassaError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Fetches the body of an XML resource.
#[async_trait]
pub trait XmlLoader: Send + Sync {
    /// Retrieves `url` and returns the raw document.
    ///
    /// Parsing is left to the caller so that malformed documents surface as
    /// [`RobokassaError::XmlParse`] regardless of the transport.
    async fn load(&self, url: &Url) -> Result<String>;
}

/// [`XmlLoader`] performing a plain HTTP GET with `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpXmlLoader {
    client: Client,
}

impl HttpXmlLoader {
    /// Creates a loader with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader on top of a custom client (timeouts, proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl XmlLoader for HttpXmlLoader {
    async fn load(&self, url: &Url) -> Result<String> {
        debug!(host = url.host_str().unwrap_or_default(), path = url.path(), "fetching XML document");

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/xml, application/xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RobokassaError::UnexpectedStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

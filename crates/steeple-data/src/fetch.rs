use std::future::Future;

use crate::{
    Result,
    model::{Affiliation, Church, County},
};

/// Where the three collections come from.
///
/// The loader calls all three concurrently; implementations must not assume
/// any ordering between them.
pub trait CollectionSource: Send + Sync {
    fn fetch_churches(&self) -> impl Future<Output = Result<Vec<Church>>> + Send;

    fn fetch_counties(&self) -> impl Future<Output = Result<Vec<County>>> + Send;

    fn fetch_affiliations(&self) -> impl Future<Output = Result<Vec<Affiliation>>> + Send;
}

#[cfg(feature = "download_data")]
pub use http::{HttpSource, HttpSourceConfig};

#[cfg(feature = "download_data")]
mod http {
    use reqwest::Client;
    use serde::{Deserialize, de::DeserializeOwned};
    use tracing::{info, instrument};

    use super::CollectionSource;
    use crate::{
        Result,
        model::{Affiliation, Church, CollectionKind, County},
    };

    /// Endpoints of the directory's read API.
    #[derive(Debug, Clone)]
    pub struct HttpSourceConfig {
        pub base_url: String,
        pub churches_path: String,
        pub counties_path: String,
        pub affiliations_path: String,
        /// Page size requested from each endpoint; large enough to cover the directory.
        pub page_size: usize,
    }

    impl HttpSourceConfig {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
                churches_path: "/api/churches".to_string(),
                counties_path: "/api/counties".to_string(),
                affiliations_path: "/api/affiliations".to_string(),
                page_size: 1000,
            }
        }

        pub fn url_for(&self, kind: CollectionKind) -> String {
            let path = match kind {
                CollectionKind::Churches => &self.churches_path,
                CollectionKind::Counties => &self.counties_path,
                CollectionKind::Affiliations => &self.affiliations_path,
            };
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    /// Collection endpoints answer either a bare array or a paged `{ "docs": [...] }` envelope.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListResponse<T> {
        Bare(Vec<T>),
        Paged { docs: Vec<T> },
    }

    impl<T> ListResponse<T> {
        fn into_items(self) -> Vec<T> {
            match self {
                Self::Bare(items) | Self::Paged { docs: items } => items,
            }
        }
    }

    /// Fetches collections over HTTP with a shared `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        client: Client,
        config: HttpSourceConfig,
    }

    impl HttpSource {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self::with_config(HttpSourceConfig::new(base_url))
        }

        pub fn with_config(config: HttpSourceConfig) -> Self {
            Self {
                client: Client::new(),
                config,
            }
        }

        pub fn with_client(client: Client, config: HttpSourceConfig) -> Self {
            Self { client, config }
        }

        pub fn config(&self) -> &HttpSourceConfig {
            &self.config
        }

        #[instrument(name = "Fetch collection", skip(self), fields(collection = %kind), level = "debug")]
        async fn get_list<T: DeserializeOwned>(&self, kind: CollectionKind) -> Result<Vec<T>> {
            let url = self.config.url_for(kind);
            info!(url = %url, "Starting fetch");
            let response = self
                .client
                .get(&url)
                .query(&[("limit", self.config.page_size)])
                .send()
                .await?
                .error_for_status()?;

            let items = response.json::<ListResponse<T>>().await?.into_items();
            info!(url = %url, count = items.len(), "Fetch complete");
            Ok(items)
        }
    }

    impl CollectionSource for HttpSource {
        async fn fetch_churches(&self) -> Result<Vec<Church>> {
            self.get_list(CollectionKind::Churches).await
        }

        async fn fetch_counties(&self) -> Result<Vec<County>> {
            self.get_list(CollectionKind::Counties).await
        }

        async fn fetch_affiliations(&self) -> Result<Vec<Affiliation>> {
            self.get_list(CollectionKind::Affiliations).await
        }
    }

}

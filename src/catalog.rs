//! Remote catalog client.
//!
//! [`CatalogClient`] is what the store and widgets talk to. [`HttpCatalog`]
//! implements it on top of any [`Transport`] that can GET an endpoint with
//! query parameters and hand back the body text; the browser build uses
//! `fetch`, native builds can use `reqwest` (feature `native`).

use async_trait::async_trait;
use tracing::debug;

use crate::error::CatalogError;
use crate::parse;
use crate::types::{CocktailDetail, CocktailSummary};

pub const SEARCH_ENDPOINT: &str = "search.php";
pub const FILTER_ENDPOINT: &str = "filter.php";
pub const LOOKUP_ENDPOINT: &str = "lookup.php";
pub const LIST_ENDPOINT: &str = "list.php";

#[async_trait(?Send)]
pub trait CatalogClient {
    /// Name search; summaries carry no thumbnail
    async fn search_by_name(&self, name: &str) -> Result<Vec<CocktailSummary>, CatalogError>;

    async fn filter_by_ingredient(
        &self,
        ingredient: &str,
    ) -> Result<Vec<CocktailSummary>, CatalogError>;

    async fn lookup_by_id(&self, id: &str) -> Result<Vec<CocktailSummary>, CatalogError>;

    /// First full record for `id`, `None` when the catalog has none
    async fn fetch_detail(&self, id: &str) -> Result<Option<CocktailDetail>, CatalogError>;

    async fn list_ingredients(&self) -> Result<Vec<String>, CatalogError>;
}

/// GET `endpoint` (relative to a base URL) with `query` pairs, returning the body
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, CatalogError>;
}

pub struct HttpCatalog<T> {
    transport: T,
}

impl<T: Transport> HttpCatalog<T> {
    pub fn new(transport: T) -> Self {
        HttpCatalog { transport }
    }

    async fn fetch(&self, endpoint: &str, key: &str, value: &str) -> Result<String, CatalogError> {
        debug!(endpoint, key, value, "Querying catalog");
        self.transport.get(endpoint, &[(key, value)]).await
    }
}

#[async_trait(?Send)]
impl<T: Transport> CatalogClient for HttpCatalog<T> {
    async fn search_by_name(&self, name: &str) -> Result<Vec<CocktailSummary>, CatalogError> {
        let body = self.fetch(SEARCH_ENDPOINT, "s", name).await?;
        parse::summaries(&body, false)
    }

    async fn filter_by_ingredient(
        &self,
        ingredient: &str,
    ) -> Result<Vec<CocktailSummary>, CatalogError> {
        let body = self.fetch(FILTER_ENDPOINT, "i", ingredient).await?;
        parse::summaries(&body, true)
    }

    async fn lookup_by_id(&self, id: &str) -> Result<Vec<CocktailSummary>, CatalogError> {
        let body = self.fetch(LOOKUP_ENDPOINT, "i", id).await?;
        parse::summaries(&body, true)
    }

    async fn fetch_detail(&self, id: &str) -> Result<Option<CocktailDetail>, CatalogError> {
        let body = self.fetch(LOOKUP_ENDPOINT, "i", id).await?;
        parse::first_detail(&body)
    }

    async fn list_ingredients(&self) -> Result<Vec<String>, CatalogError> {
        let body = self.fetch(LIST_ENDPOINT, "i", "list").await?;
        parse::ingredient_names(&body)
    }
}

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

#[cfg(feature = "native")]
mod native {
    use async_trait::async_trait;

    use super::Transport;
    use crate::error::CatalogError;

    /// `reqwest`-backed transport for native hosts
    pub struct ReqwestTransport {
        client: reqwest::Client,
        base_url: String,
    }

    impl ReqwestTransport {
        pub fn new(base_url: impl Into<String>) -> Self {
            ReqwestTransport {
                client: reqwest::Client::new(),
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for ReqwestTransport {
        async fn get(
            &self,
            endpoint: &str,
            query: &[(&str, &str)],
        ) -> Result<String, CatalogError> {
            let response = self
                .client
                .get(format!("{}/{}", self.base_url, endpoint))
                .query(query)
                .send()
                .await
                .map_err(|e| CatalogError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::Status(status.as_u16()));
            }

            response
                .text()
                .await
                .map_err(|e| CatalogError::Transport(e.to_string()))
        }
    }
}

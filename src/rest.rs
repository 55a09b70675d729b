use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::feed::Feed;
use crate::source::{decode_one, decode_page, Catalog, ListSource, Record};
use crate::types::{Page, PageRequest, Product};

/// HTTP client for the fake-store REST API
pub struct StoreApi {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for StoreApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StoreApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, feed: Feed, request: PageRequest) -> String {
        format!(
            "{}{}?page={}&{}={}",
            self.base_url,
            feed.endpoint(),
            request.page,
            feed.size_param(),
            request.per_page
        )
    }

    fn product_url(&self, id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            Feed::Favourites.endpoint(),
            urlencoding::encode(id)
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl<T: Record> ListSource<T> for StoreApi {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page<T>> {
        let url = self.page_url(T::FEED, request);
        let body = self.get_json(&url).await?;
        let page = decode_page(body)?;
        debug!(
            feed = %T::FEED,
            page = request.page,
            count = page.items.len(),
            "page decoded"
        );
        Ok(page)
    }
}

#[async_trait]
impl Catalog for StoreApi {
    async fn get_product(&self, id: &str) -> Result<Product> {
        let body = self.get_json(&self.product_url(id)).await?;
        decode_one(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> StoreApi {
        StoreApi::new("https://store.example/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn page_url_uses_feed_size_param() {
        let api = api();
        assert_eq!(
            api.page_url(Feed::Cart, PageRequest::first(10)),
            "https://store.example/api/cart?page=1&perPage=10"
        );
        assert_eq!(
            api.page_url(Feed::Promotions, PageRequest::first(20).next()),
            "https://store.example/api/coupons?page=2&limit=20"
        );
    }

    #[test]
    fn product_url_appends_id() {
        assert_eq!(
            api().product_url("42"),
            "https://store.example/api/products/42"
        );
    }

    #[test]
    fn product_url_escapes_id() {
        assert_eq!(
            api().product_url("../cart?x=1 2"),
            "https://store.example/api/products/..%2Fcart%3Fx%3D1%202"
        );
    }

    #[test]
    fn request_errors_map_to_transport() {
        let err = Client::new().get("not a url").build().unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Transport(_)));
    }
}

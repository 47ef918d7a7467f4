//! Offset pagination over the QuickBooks query endpoint.

use serde_json::Value;
use tracing::warn;
use vendo_core::Result;

use crate::client::QbClient;
use crate::QUICKBOOKS_TARGET;

/// An explicit, restartable sequence of result pages for one query entity.
///
/// QuickBooks pages with `STARTPOSITION`/`MAXRESULTS` offsets. The sequence
/// ends when a page comes back shorter than the page size, or when the
/// `max_pages` safety cap is reached; the cap guards against runaway loops
/// on servers that keep returning full pages. Create a fresh pager to walk
/// the sequence again.
pub struct QbPager {
    client: QbClient,
    entity: String,
    start_position: u64,
    pages_fetched: u32,
    done: bool,
}

impl QbPager {
    pub(crate) fn new(client: QbClient, entity: String) -> Self {
        Self {
            client,
            entity,
            start_position: 1,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }

        let page_size = self.client.config().page_size();
        let max_pages = self.client.config().max_pages();

        if self.pages_fetched >= max_pages {
            warn!(
                target: QUICKBOOKS_TARGET,
                entity = %self.entity,
                max_pages,
                "Page cap reached, truncating result set"
            );
            self.done = true;
            return Ok(None);
        }

        let items = self
            .client
            .query_page(&self.entity, self.start_position, page_size)
            .await?;

        self.pages_fetched += 1;
        self.start_position += items.len() as u64;

        if (items.len() as u64) < u64::from(page_size) {
            self.done = true;
        }

        if items.is_empty() && self.pages_fetched > 1 {
            // A trailing empty page adds nothing; end the sequence quietly.
            return Ok(None);
        }

        Ok(Some(items))
    }

    /// Drain every remaining page into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::QbConfig;

    fn items(n: usize, offset: usize) -> Vec<Value> {
        (0..n)
            .map(|i| serde_json::json!({"Id": (offset + i).to_string()}))
            .collect()
    }

    fn page_body(entity: &str, items: Vec<Value>) -> Value {
        serde_json::json!({"QueryResponse": {entity: items}})
    }

    fn test_client(server: &MockServer, page_size: u32, max_pages: u32) -> QbClient {
        let config = QbConfig::new()
            .with_client_id("id")
            .with_client_secret("secret")
            .with_access_token("at")
            .with_refresh_token("rt")
            .with_realm_id("42")
            .with_page_size(page_size)
            .with_max_pages(max_pages)
            .with_api_base(Url::parse(&server.uri()).unwrap());
        QbClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_short_page_ends_the_sequence() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/company/42/query"))
            .and(query_param(
                "query",
                "SELECT * FROM Customer STARTPOSITION 1 MAXRESULTS 2",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body("Customer", items(2, 0))),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v3/company/42/query"))
            .and(query_param(
                "query",
                "SELECT * FROM Customer STARTPOSITION 3 MAXRESULTS 2",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body("Customer", items(1, 2))),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, 2, 10);
        let all = client.query("Customer").collect_all().await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all[2]["Id"], "2");
    }

    #[tokio::test]
    async fn test_page_cap_bounds_an_endless_server() {
        let server = MockServer::start().await;

        // Every request returns a full page; only the cap can stop us.
        Mock::given(method("GET"))
            .and(path("/v3/company/42/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body("Invoice", items(2, 0))),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server, 2, 3);
        let all = client.query("Invoice").collect_all().await.unwrap();

        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_default_cap_is_ten_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/company/42/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body("Payment", items(1, 0))),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, 1, QbConfig::new().max_pages());
        let all = client.query("Payment").collect_all().await.unwrap();

        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_pager_is_restartable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/company/42/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(page_body("Item", items(1, 0))),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, 2, 10);

        let first = client.query("Item").collect_all().await.unwrap();
        let second = client.query("Item").collect_all().await.unwrap();
        assert_eq!(first, second);
    }
}

//! Cursor pagination over Shopify Admin API list endpoints.

use serde_json::Value;
use tracing::warn;
use url::Url;
use vendo_core::Result;

use crate::client::ShopClient;
use crate::SHOPIFY_TARGET;

/// An explicit, restartable sequence of result pages for one list
/// endpoint.
///
/// Shopify paginates with opaque cursors delivered in the `Link` response
/// header. The sequence ends when a response carries no `rel="next"`
/// cursor; the `max_pages` safety cap bounds servers (and mocks) that keep
/// handing out cursors indefinitely. Create a fresh pager to walk the
/// sequence again.
pub struct ShopPager {
    client: ShopClient,
    path: String,
    key: String,
    cursor: Option<String>,
    pages_fetched: u32,
    done: bool,
}

impl ShopPager {
    pub(crate) fn new(client: ShopClient, path: String, key: String) -> Self {
        Self {
            client,
            path,
            key,
            cursor: None,
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
                target: SHOPIFY_TARGET,
                path = %self.path,
                max_pages,
                "Page cap reached, truncating result set"
            );
            self.done = true;
            return Ok(None);
        }

        let mut query = vec![("limit", page_size.to_string())];
        if let Some(cursor) = &self.cursor {
            query.push(("page_info", cursor.clone()));
        }

        let (payload, next_cursor) = self.client.list_page(&self.path, &query).await?;

        let items = payload
            .get(&self.key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        self.pages_fetched += 1;

        match next_cursor {
            Some(cursor) => self.cursor = Some(cursor),
            None => self.done = true,
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

/// Extract the `rel="next"` cursor from a `Link` response header.
///
/// The header looks like:
///
/// ```text
/// <https://x.myshopify.com/admin/api/2024-01/products.json?page_info=abc&limit=50>; rel="next"
/// ```
///
/// possibly alongside a `rel="previous"` entry separated by a comma.
pub(crate) fn next_page_info(header: &str) -> Option<String> {
    for part in header.split(',') {
        let part = part.trim();
        if !part.contains(r#"rel="next""#) {
            continue;
        }

        let start = part.find('<')? + 1;
        let end = part.find('>')?;
        let url = Url::parse(&part[start..end]).ok()?;

        return url
            .query_pairs()
            .find(|(k, _)| k == "page_info")
            .map(|(_, v)| v.into_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::ShopConfig;

    fn link_next(server_uri: &str, cursor: &str) -> String {
        format!(
            r#"<{server_uri}/admin/api/2024-01/products.json?limit=2&page_info={cursor}>; rel="next""#
        )
    }

    fn products(ids: &[i64]) -> Value {
        serde_json::json!({
            "products": ids.iter().map(|id| serde_json::json!({"id": id})).collect::<Vec<_>>()
        })
    }

    fn test_client(server: &MockServer, page_size: u32, max_pages: u32) -> ShopClient {
        let config = ShopConfig::new()
            .with_shop_domain("demo.myshopify.com")
            .with_api_key("key")
            .with_api_secret("secret")
            .with_access_token("shpat_token")
            .with_page_size(page_size)
            .with_max_pages(max_pages)
            .with_base_url(Url::parse(&server.uri()).unwrap());
        ShopClient::new(config).unwrap()
    }

    #[test]
    fn test_next_page_info_parses_the_next_cursor() {
        let header = concat!(
            r#"<https://demo.myshopify.com/admin/api/2024-01/products.json?page_info=prev123&limit=50>; rel="previous", "#,
            r#"<https://demo.myshopify.com/admin/api/2024-01/products.json?page_info=next456&limit=50>; rel="next""#
        );

        assert_eq!(next_page_info(header).as_deref(), Some("next456"));
    }

    #[test]
    fn test_next_page_info_without_next_rel() {
        let header = r#"<https://demo.myshopify.com/admin/api/2024-01/products.json?page_info=prev123>; rel="previous""#;
        assert_eq!(next_page_info(header), None);

        assert_eq!(next_page_info(""), None);
        assert_eq!(next_page_info("not a link header"), None);
    }

    #[tokio::test]
    async fn test_pager_follows_link_cursors() {
        let server = MockServer::start().await;

        // Cursor-bearing request first so the generic mock cannot shadow it.
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/products.json"))
            .and(query_param("page_info", "cursor-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products(&[3])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/products.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(products(&[1, 2]))
                    .insert_header("Link", link_next(&server.uri(), "cursor-2").as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, 2, 10);
        let all = client.fetch_products().await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all[2]["id"], 3);
    }

    #[tokio::test]
    async fn test_missing_cursor_ends_the_sequence() {
        let server = MockServer::start().await;

        // A full page with no Link header is the last page.
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/products.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(products(&[1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, 2, 10);
        let all = client.fetch_products().await.unwrap();

        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_page_cap_bounds_an_endless_cursor_chain() {
        let server = MockServer::start().await;

        // The server always hands out another cursor; only the cap stops us.
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/products.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(products(&[7]))
                    .insert_header("Link", link_next(&server.uri(), "again").as_str()),
            )
            .expect(4)
            .mount(&server)
            .await;

        let client = test_client(&server, 1, 4);
        let all = client.fetch_products().await.unwrap();

        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_default_cap_is_ten_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/api/2024-01/customers.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"customers": [{"id": 1}]}))
                    .insert_header(
                        "Link",
                        format!(
                            r#"<{}/admin/api/2024-01/customers.json?page_info=more>; rel="next""#,
                            server.uri()
                        )
                        .as_str(),
                    ),
            )
            .mount(&server)
            .await;

        let client = test_client(&server, 1, ShopConfig::new().max_pages());
        let all = client.fetch_customers().await.unwrap();

        assert_eq!(all.len(), 10);
    }
}

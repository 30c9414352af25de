//! HTTP catalog client for the shop backend.
//!
//! The backend serves `GET <endpoint>` with an envelope of the form
//! `{ "success": true, "data": [ ...products ] }` and accepts new products
//! with `POST <endpoint>`. The raw list is cached for five minutes with
//! `moka`; filters are applied to the cached list.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shunny_core::{NewProduct, Product, ProductId};
use tracing::{debug, info, instrument};
use url::Url;

use super::{CatalogError, CatalogProvider, ProductFilter};

/// Response envelope returned by the backend.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

/// Decode a backend response body, returning its `data` if any.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>, CatalogError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if envelope.success == Some(false) {
        return Err(CatalogError::Backend(
            envelope
                .message
                .unwrap_or_else(|| "request failed".to_string()),
        ));
    }
    Ok(envelope.data)
}

/// Reject products the backend form would not accept.
fn validate(product: &NewProduct) -> Result<(), CatalogError> {
    if product.title.trim().is_empty() {
        return Err(CatalogError::Invalid("title is required".to_string()));
    }
    if !(0.0..=5.0).contains(&product.rating) {
        return Err(CatalogError::Invalid(format!(
            "rating must be between 0 and 5, got {}",
            product.rating
        )));
    }
    Ok(())
}

/// Read a response body, failing on a non-success status.
async fn success_body(response: reqwest::Response) -> Result<String, CatalogError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Catalog backend returned non-success status"
        );
        return Err(CatalogError::Status {
            status: status.as_u16(),
        });
    }
    Ok(body)
}

/// Catalog backed by the shop's HTTP API.
///
/// Cheaply cloneable; clones share the HTTP client and the cache.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<String, Arc<Vec<Product>>>,
}

impl HttpCatalog {
    /// Create a client for the products endpoint at `endpoint`.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(HttpCatalogInner {
                client: reqwest::Client::new(),
                endpoint,
                cache,
            }),
        }
    }

    /// The products endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Add a product to the backend and drop the cached list.
    ///
    /// Returns the product as stored by the backend.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for an empty title or a rating outside
    /// 0 to 5, and other `CatalogError` variants if the request fails.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, CatalogError> {
        validate(product)?;

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header("Accept", "application/json")
            .json(product)
            .send()
            .await?;
        let body = success_body(response).await?;

        self.inner.cache.invalidate(&self.cache_key()).await;

        let created = parse_envelope::<Product>(&body)?.ok_or_else(|| {
            CatalogError::Backend("response did not include the created product".to_string())
        })?;
        info!(product_id = %created.id, "Created product");
        Ok(created)
    }

    fn cache_key(&self) -> String {
        self.inner.endpoint.to_string()
    }

    /// Fetch the full product list, from cache when fresh.
    ///
    /// Concurrent misses share a single backend request.
    async fn fetch_all(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        self.inner
            .cache
            .try_get_with(self.cache_key(), self.fetch_uncached())
            .await
            .map_err(|err| Arc::try_unwrap(err).unwrap_or_else(CatalogError::Shared))
    }

    #[instrument(skip(self), fields(endpoint = %self.inner.endpoint))]
    async fn fetch_uncached(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        let response = self
            .inner
            .client
            .get(self.inner.endpoint.clone())
            .header("Accept", "application/json")
            .send()
            .await?;
        let body = success_body(response).await?;

        let products = parse_envelope::<Vec<Product>>(&body)?.unwrap_or_default();
        debug!(count = products.len(), "Fetched catalog");
        Ok(Arc::new(products))
    }
}

impl std::fmt::Debug for HttpCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalog")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogProvider for HttpCatalog {
    async fn fetch_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        let products = self.fetch_all().await?;
        Ok(filter.apply(&products))
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.fetch_all()
            .await?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    
    use shunny_core::Amount;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Request line and body of every request served.
    type Requests = Arc<Mutex<Vec<(String, String)>>>;

    /// Read one HTTP request, returning its request line and body.
    async fn read_request(socket: &mut TcpStream) -> (String, String) {
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break raw.len();
            }
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let body = String::from_utf8_lossy(&raw[header_end..]).to_string();
        (request_line, body)
    }

    /// Serve `responses` in order (the last one repeats), recording each request.
    async fn serve_sequence(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (Url, Requests) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            let mut served = 0;
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request);
                let (status, body) = responses[served.min(responses.len() - 1)];
                served += 1;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let url = Url::parse(&format!("http://{addr}/api/products")).unwrap();
        (url, requests)
    }

    /// Serve `status` and `body` to every connection.
    async fn serve(status: &'static str, body: &'static str) -> (Url, Requests) {
        serve_sequence(vec![(status, body)]).await
    }

    fn hits(requests: &Requests) -> usize {
        requests.lock().unwrap().len()
    }

    const BODY: &str = r#"{"success": true, "data": [
        {"id": 1, "title": "Backpack", "price": 109.95, "category": "bags", "image": "a.jpg"},
        {"id": 2, "title": "T-Shirt", "price": 22.3, "category": "clothing"}
    ]}"#;

    const BODY_AFTER_CREATE: &str = r#"{"success": true, "data": [
        {"id": 1, "title": "Backpack", "price": 109.95, "category": "bags", "image": "a.jpg"},
        {"id": 2, "title": "T-Shirt", "price": 22.3, "category": "clothing"},
        {"id": 3, "title": "Headphones", "price": 199.5, "category": "electronics"}
    ]}"#;

    const CREATED: &str = r#"{"success": true, "data":
        {"id": 3, "title": "Headphones", "price": 199.5, "category": "electronics",
         "image": "https://img.example/h.jpg", "rating": {"rate": 4.5, "count": 0}}
    }"#;

    fn headphones() -> NewProduct {
        NewProduct {
            title: "Headphones".to_string(),
            price: "199.5".parse().unwrap(),
            description: "Wireless".to_string(),
            category: NewProduct::DEFAULT_CATEGORY.to_string(),
            image: "https://img.example/h.jpg".to_string(),
            rating: NewProduct::DEFAULT_RATING,
        }
    }

    #[test]
    fn test_parse_envelope_missing_data_is_none() {
        let data = parse_envelope::<Vec<Product>>(r#"{"success": true}"#).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_parse_envelope_reports_backend_failure() {
        let err = parse_envelope::<Vec<Product>>(r#"{"success": false, "message": "db down"}"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Backend(ref m) if m == "db down"));
    }

    #[tokio::test]
    async fn test_fetch_products_and_cache() {
        let (url, requests) = serve("200 OK", BODY).await;
        let catalog = HttpCatalog::new(url);

        let all = catalog.fetch_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let shirt = catalog.fetch_product(ProductId::new(2)).await.unwrap();
        assert_eq!(shirt.title, "T-Shirt");
        assert_eq!(hits(&requests), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_request() {
        let (url, requests) = serve("200 OK", BODY).await;
        let catalog = HttpCatalog::new(url);
        let filter = ProductFilter::default();

        let (a, b, c) = tokio::join!(
            catalog.fetch_products(&filter),
            catalog.fetch_products(&filter),
            catalog.fetch_product(ProductId::new(1)),
        );

        assert_eq!(a.unwrap().len(), 2);
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(c.unwrap().title, "Backpack");
        assert_eq!(hits(&requests), 1);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _) = serve("503 Service Unavailable", "{}").await;
        let catalog = HttpCatalog::new(url);

        let err = catalog.fetch_products(&ProductFilter::default()).await.unwrap_err();
        assert!(matches!(err.inner(), CatalogError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_create_product_posts_and_invalidates_cache() {
        let (url, requests) = serve_sequence(vec![
            ("200 OK", BODY),
            ("201 Created", CREATED),
            ("200 OK", BODY_AFTER_CREATE),
        ])
        .await;
        let catalog = HttpCatalog::new(url);

        assert_eq!(catalog.fetch_products(&ProductFilter::default()).await.unwrap().len(), 2);

        let created = catalog.create_product(&headphones()).await.unwrap();
        assert_eq!(created.id, ProductId::new(3));
        assert_eq!(created.price, "199.5".parse::<Amount>().unwrap());

        let all = catalog.fetch_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].0.starts_with("POST /api/products"));
        let sent: serde_json::Value = serde_json::from_str(&requests[1].1).unwrap();
        assert_eq!(sent["title"], "Headphones");
        assert_eq!(sent["price"], 199.5);
        assert_eq!(sent["rating"], 4.5);
        assert!(requests[2].0.starts_with("GET /api/products"));
    }

    #[tokio::test]
    async fn test_create_product_rejected_by_backend() {
        let (url, _) = serve("400 Bad Request", r#"{"success": false}"#).await;
        let catalog = HttpCatalog::new(url);

        let err = catalog.create_product(&headphones()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 400 }));
    }

    #[tokio::test]
    async fn test_create_product_validates_before_sending() {
        let (url, requests) = serve("201 Created", CREATED).await;
        let catalog = HttpCatalog::new(url);

        let mut untitled = headphones();
        untitled.title = "  ".to_string();
        assert!(matches!(
            catalog.create_product(&untitled).await,
            Err(CatalogError::Invalid(_))
        ));

        let mut overrated = headphones();
        overrated.rating = 7.0;
        assert!(matches!(
            catalog.create_product(&overrated).await,
            Err(CatalogError::Invalid(_))
        ));
        assert_eq!(hits(&requests), 0);
    }
}

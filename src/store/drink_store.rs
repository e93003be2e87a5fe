use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::{DrinkCache, Generation};
use crate::auth::{AuthProvider, DRINKS_DETAIL_PERMISSION};
use crate::error::StoreError;
use crate::models::{Drink, DrinkId, Envelope};
use crate::transport::{HttpRequest, HttpTransport};

/// Client-side access to the drinks API plus a cache of everything it has
/// seen.
///
/// Cloning is cheap and every clone shares the same cache. The cache is only
/// written by response handling, one response at a time, and only after the
/// server reported success.
#[derive(Clone)]
pub struct DrinkStore {
    inner: Arc<Inner>,
}

struct Inner {
    base_url: String,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn HttpTransport>,
    cache: RwLock<DrinkCache>,
    in_flight: Mutex<InFlight>,
}

/// Generations handed out so far and the ones whose response hasn't been
/// applied yet.
#[derive(Default)]
struct InFlight {
    last: Generation,
    active: BTreeSet<Generation>,
}

/// A request's claim on its generation. Dropping it marks the request as
/// finished.
struct Ticket<'a> {
    generation: Generation,
    in_flight: &'a Mutex<InFlight>,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).active.remove(&self.generation);
    }
}

fn lock(in_flight: &Mutex<InFlight>) -> MutexGuard<'_, InFlight> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DrinkStore {
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Creating drink store for '{}'", base_url);
        Self {
            inner: Arc::new(Inner {
                base_url,
                auth,
                transport,
                cache: RwLock::new(DrinkCache::new()),
                in_flight: Mutex::new(InFlight::default()),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Load the drink listing into the cache.
    ///
    /// Sessions holding `get:drinks-detail` get the detailed listing with
    /// full recipes; everyone else gets the basic one.
    pub async fn fetch_all(&self) -> Result<Vec<Drink>, StoreError> {
        let path = if self.inner.auth.has_permission(DRINKS_DETAIL_PERMISSION).await {
            "/drinks-detail"
        } else {
            "/drinks"
        };

        let request = HttpRequest::new(Method::GET, self.url(path), self.build_auth_headers().await?);
        let (ticket, envelope) = self.execute(request).await?;

        let applied = self
            .commit(ticket, |cache, generation| {
                cache.upsert(generation, envelope.drinks.iter().cloned())
            })
            .await;
        debug!(
            event_name = "store.fetch_all.applied",
            event_domain = "store",
            path,
            received = envelope.drinks.len(),
            applied,
            "drink listing merged into cache"
        );
        Ok(envelope.drinks)
    }

    /// Create an unsaved drink or update a persisted one.
    ///
    /// Only `title` and `recipe` are sent. The drinks the server returns are
    /// merged into the cache, which is how a newly created drink picks up
    /// its id.
    pub async fn save(&self, drink: &Drink) -> Result<Vec<Drink>, StoreError> {
        let body = serde_json::to_vec(&drink.payload()).map_err(StoreError::Encode)?;
        let headers = self.build_auth_headers().await?;
        let request = match drink.id {
            DrinkId::Persisted(id) => {
                HttpRequest::new(Method::PATCH, self.url(&format!("/drinks/{}", id)), headers)
            }
            DrinkId::Unsaved => HttpRequest::new(Method::POST, self.url("/drinks"), headers),
        }
        .with_body(body);

        let (ticket, envelope) = self.execute(request).await?;

        let applied = self
            .commit(ticket, |cache, generation| {
                cache.upsert(generation, envelope.drinks.iter().cloned())
            })
            .await;
        info!(
            event_name = "store.save.applied",
            event_domain = "store",
            drink_id = %drink.id,
            title = drink.title.as_str(),
            applied,
            "drink saved"
        );
        Ok(envelope.drinks)
    }

    /// Delete a persisted drink and drop it from the cache.
    pub async fn remove(&self, drink: &Drink) -> Result<(), StoreError> {
        let id = drink.id.persisted().ok_or(StoreError::NotPersisted)?;

        let request = HttpRequest::new(
            Method::DELETE,
            self.url(&format!("/drinks/{}", id)),
            self.build_auth_headers().await?,
        );
        let (ticket, _) = self.execute(request).await?;

        let applied = self
            .commit(ticket, |cache, generation| cache.remove(generation, id))
            .await;
        info!(
            event_name = "store.remove.applied",
            event_domain = "store",
            drink_id = id,
            applied,
            "drink deleted"
        );
        Ok(())
    }

    /// Run [`fetch_all`](Self::fetch_all) on the runtime and return at once.
    pub fn spawn_fetch_all(&self) -> JoinHandle<Result<Vec<Drink>, StoreError>> {
        let store = self.clone();
        tokio::spawn(async move { store.fetch_all().await })
    }

    pub fn spawn_save(&self, drink: Drink) -> JoinHandle<Result<Vec<Drink>, StoreError>> {
        let store = self.clone();
        tokio::spawn(async move { store.save(&drink).await })
    }

    pub fn spawn_remove(&self, drink: Drink) -> JoinHandle<Result<(), StoreError>> {
        let store = self.clone();
        tokio::spawn(async move { store.remove(&drink).await })
    }

    pub async fn get(&self, id: u64) -> Option<Drink> {
        self.inner.cache.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.inner.cache.read().await.contains(id)
    }

    /// Snapshot of the cache, ordered by id.
    pub async fn drinks(&self) -> BTreeMap<u64, Drink> {
        self.inner.cache.read().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.inner.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.cache.read().await.is_empty()
    }

    /// Headers for one request. The token is looked up every time since the
    /// auth provider may have rotated it.
    pub async fn build_auth_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        match self.inner.auth.current_token().await {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => debug!("No auth token available, sending request without Authorization"),
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    fn issue(&self) -> Ticket<'_> {
        let mut in_flight = lock(&self.inner.in_flight);
        in_flight.last += 1;
        let generation = in_flight.last;
        in_flight.active.insert(generation);
        Ticket {
            generation,
            in_flight: &self.inner.in_flight,
        }
    }

    /// Apply a response to the cache, retire its ticket, then drop the
    /// tombstones that no remaining request can be blocked by.
    async fn commit<T>(
        &self,
        ticket: Ticket<'_>,
        apply: impl FnOnce(&mut DrinkCache, Generation) -> T,
    ) -> T {
        let mut cache = self.inner.cache.write().await;
        let result = apply(&mut cache, ticket.generation);
        drop(ticket);

        let oldest = lock(&self.inner.in_flight).active.first().copied();
        let pruned = cache.prune_tombstones(oldest);
        if pruned > 0 {
            debug!(pruned, oldest_in_flight = ?oldest, "pruned cache tombstones");
        }
        result
    }

    /// Send a request and unwrap the response envelope. The generation is
    /// taken when the request goes out, not when the answer comes back, and
    /// stays in flight until the returned ticket is dropped.
    async fn execute(&self, request: HttpRequest) -> Result<(Ticket<'_>, Envelope), StoreError> {
        let method = request.method.clone();
        let url = request.url.clone();
        let ticket = self.issue();
        let generation = ticket.generation;

        let response = self.inner.transport.send(request).await.map_err(|err| {
            warn!(
                event_name = "store.request.failed",
                event_domain = "store",
                method = %method,
                url = url.as_str(),
                %err,
                "request did not complete"
            );
            StoreError::from(err)
        })?;

        if !response.status.is_success() {
            let message = match serde_json::from_slice::<Envelope>(&response.body) {
                Ok(envelope) => envelope.failure_message(),
                Err(_) if response.body.is_empty() => response
                    .status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
                Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
            };
            warn!(
                event_name = "store.request.status",
                event_domain = "store",
                method = %method,
                url = url.as_str(),
                status = response.status.as_u16(),
                message = message.as_str(),
                "server returned an error status"
            );
            return Err(StoreError::Status {
                status: response.status,
                message,
            });
        }

        let envelope: Envelope = serde_json::from_slice(&response.body).map_err(|err| {
            warn!(method = %method, url = url.as_str(), %err, "undecodable response body");
            StoreError::Decode(err)
        })?;

        if !envelope.success {
            let message = envelope.failure_message();
            warn!(
                event_name = "store.request.rejected",
                event_domain = "store",
                method = %method,
                url = url.as_str(),
                message = message.as_str(),
                "server reported failure"
            );
            return Err(StoreError::Rejected { message });
        }

        debug!(method = %method, url = url.as_str(), generation, "request succeeded");
        Ok((ticket, envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuthProvider;
    use crate::error::TransportError;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use http::StatusCode;

    /// Answers every request with the same response.
    struct FixedTransport(StatusCode, &'static str);

    #[async_trait]
    impl HttpTransport for FixedTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(self.0, self.1.as_bytes()))
        }
    }

    fn store(status: StatusCode, body: &'static str, token: Option<&str>) -> DrinkStore {
        let auth = match token {
            Some(token) => StaticAuthProvider::with_token(token, Vec::<String>::new()),
            None => StaticAuthProvider::new(&Default::default()),
        };
        DrinkStore::new(
            "http://api.test/",
            Arc::new(auth),
            Arc::new(FixedTransport(status, body)),
        )
    }

    #[tokio::test]
    async fn test_auth_headers_carry_token_and_content_type() {
        let store = store(StatusCode::OK, "{}", Some("abc"));
        let headers = store.build_auth_headers().await.unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_auth_headers_without_token() {
        let store = store(StatusCode::OK, "{}", None);
        let headers = store.build_auth_headers().await.unwrap();

        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_token_with_newline_is_rejected() {
        let store = store(StatusCode::OK, "{}", Some("abc\ndef"));
        let result = store.build_auth_headers().await;
        assert!(matches!(result, Err(StoreError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let store = store(StatusCode::OK, "{}", None);
        assert_eq!(store.base_url(), "http://api.test");
    }

    #[tokio::test]
    async fn test_error_status_uses_envelope_message() {
        let store = store(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"success": false, "error": 422, "message": "unprocessable"}"#,
            Some("abc"),
        );
        match store.fetch_all().await {
            Err(StoreError::Status { status, message }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "unprocessable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_error_status_with_empty_body() {
        let store = store(StatusCode::UNAUTHORIZED, "", None);
        match store.fetch_all().await {
            Err(StoreError::Status { message, .. }) => assert_eq!(message, "Unauthorized"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let store = store(StatusCode::OK, "<html>oops</html>", Some("abc"));
        assert!(matches!(store.fetch_all().await, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_remove_with_nothing_in_flight_leaves_no_tombstone() {
        let store = store(StatusCode::OK, r#"{"success": true, "delete": 5}"#, Some("abc"));
        let drink = Drink {
            id: DrinkId::Persisted(5),
            title: "Old".to_string(),
            recipe: vec![],
        };
        store.inner.cache.write().await.upsert(0, vec![drink.clone()]);

        store.remove(&drink).await.unwrap();

        assert!(!store.contains(5).await);
        assert_eq!(store.inner.cache.read().await.tombstones(), 0);
        assert!(lock(&store.inner.in_flight).active.is_empty());
    }

    #[tokio::test]
    async fn test_failed_request_leaves_nothing_in_flight() {
        let store = store(StatusCode::INTERNAL_SERVER_ERROR, "", Some("abc"));
        assert!(store.fetch_all().await.is_err());
        assert!(lock(&store.inner.in_flight).active.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unsaved_sends_nothing() {
        let store = store(StatusCode::OK, r#"{"success": true}"#, Some("abc"));
        let result = store.remove(&Drink::unsaved("New", vec![])).await;
        assert!(matches!(result, Err(StoreError::NotPersisted)));
    }
}

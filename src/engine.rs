use crate::config::Config;
use crate::error::{FetchError, PageLookup, Result};
use crate::page::FetchedPage;
use crate::tools::cache::{ExecutionTracker, FetchCache, FetchHistory};
use crate::tools::fetch::{self, ReqwestTransport, Transport, TransportRequest};
use crate::tools::url::UrlBuilder;
use crate::types::{CacheKey, DeviceProfile, FetchRequest, HttpMethod};
use std::sync::Arc;
use tracing::{debug, info};

/// Hooks a test runner calls around each test.
pub trait TestLifecycle {
    fn before_test(&self, identity: &str);
    fn after_test(&self, identity: &str);
}

/// Fetch-and-cache engine. One instance per test run.
///
/// Owns the page cache, the set of test identities that already fetched,
/// and each identity's fetch history. Safe to share across threads.
pub struct FetchEngine {
    config: Config,
    urls: UrlBuilder,
    transport: Arc<dyn Transport>,
    cache: FetchCache<Arc<FetchedPage>>,
    tracker: ExecutionTracker,
    history: FetchHistory<Arc<FetchedPage>>,
}

impl FetchEngine {
    /// Engine backed by a `reqwest` transport built from `config`.
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)
            .map_err(|e| FetchError::Config(format!("could not build transport: {e}")))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            urls: UrlBuilder::from_config(&config),
            config,
            transport,
            cache: FetchCache::new(),
            tracker: ExecutionTracker::new(),
            history: FetchHistory::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical URL `request` is fetched from and cached under.
    pub fn canonical_url(&self, request: &FetchRequest) -> Result<String> {
        self.urls.build(
            request.url(),
            request.protocol(),
            self.prefix_for(request),
            request.port().unwrap_or(""),
        )
    }

    /// Fetch a page, reusing a cached one when the dedup rule allows it.
    ///
    /// The first fetch of a test identity may take a page cached by another
    /// identity, and on a miss stores its own result for later identities.
    /// Every later fetch of the same identity goes to the network and is
    /// never stored, including one running concurrently with the first.
    pub fn fetch(&self, request: &FetchRequest) -> Result<Arc<FetchedPage>> {
        let url = self.canonical_url(request)?;
        let key = CacheKey::new(url.clone(), request.device());
        let identity = request.test_identity();
        let first_fetch = self.tracker.claim(identity);

        let result = if self.config.cache_duplicates && first_fetch {
            self.cache
                .get_or_try_insert_with(&key, || self.fetch_fresh(&url, request).map(Arc::new))
                .map(|lookup| {
                    if lookup.is_hit() && self.config.cache_log_duplicates {
                        info!(
                            "duplicate call for fetched page: {key}, taking page from cache while running test: {identity}"
                        );
                    }
                    lookup.into_inner()
                })
        } else {
            self.fetch_fresh(&url, request).map(Arc::new)
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                if first_fetch {
                    self.tracker.release(identity);
                }
                return Err(e);
            }
        };
        if !first_fetch {
            // a concurrent first fetch may have failed and released the claim
            self.tracker.claim(identity);
        }
        self.history.record(identity, Arc::clone(&page));
        Ok(page)
    }

    /// Fetch with config defaults as a desktop client, outside any test identity.
    pub fn call(
        &self,
        url: &str,
        method: HttpMethod,
        form: Vec<(String, String)>,
    ) -> Result<Arc<FetchedPage>> {
        let request = FetchRequest::new(url).with_method(method).with_form(form);
        info!("trying to call {}", self.canonical_url(&request)?);
        self.fetch(&request)
    }

    /// Handle that threads `identity` through fetches and lookups.
    pub fn session(&self, identity: impl Into<String>) -> TestSession<'_> {
        TestSession {
            engine: self,
            identity: identity.into(),
        }
    }

    /// Pages fetched by `identity`, oldest first.
    pub fn pages(&self, identity: &str) -> Vec<Arc<FetchedPage>> {
        self.history.pages(identity)
    }

    pub fn latest(&self, identity: &str) -> Result<Arc<FetchedPage>> {
        self.history
            .last(identity)
            .ok_or(FetchError::PageNotFound(PageLookup::Latest))
    }

    pub fn page_at(&self, identity: &str, index: usize) -> Result<Arc<FetchedPage>> {
        self.history
            .nth(identity, index)
            .ok_or(FetchError::PageNotFound(PageLookup::Index(index)))
    }

    pub fn page_by_url(&self, identity: &str, snippet: &str) -> Result<Arc<FetchedPage>> {
        self.history
            .find(identity, |p| p.matches_url(snippet))
            .ok_or_else(|| FetchError::PageNotFound(PageLookup::UrlSnippet(snippet.to_string())))
    }

    pub fn page_by_url_and_device(
        &self,
        identity: &str,
        snippet: &str,
        device: DeviceProfile,
    ) -> Result<Arc<FetchedPage>> {
        self.history
            .find(identity, |p| p.matches_url(snippet) && p.device() == device)
            .ok_or_else(|| {
                FetchError::PageNotFound(PageLookup::UrlSnippetAndDevice(
                    snippet.to_string(),
                    device,
                ))
            })
    }

    pub fn page_by_device(&self, identity: &str, device: DeviceProfile) -> Result<Arc<FetchedPage>> {
        self.history
            .find(identity, |p| p.device() == device)
            .ok_or(FetchError::PageNotFound(PageLookup::Device(device)))
    }

    /// Number of pages held in the cache.
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    pub fn has_fetched(&self, identity: &str) -> bool {
        self.tracker.has_seen(identity)
    }

    fn prefix_for<'a>(&'a self, request: &'a FetchRequest) -> &'a str {
        request.prefix().unwrap_or(&self.config.url_prefix)
    }

    fn fetch_fresh(&self, url: &str, request: &FetchRequest) -> Result<FetchedPage> {
        let device = request.device();
        let transport_request = TransportRequest {
            url: url.to_string(),
            method: request.method(),
            form: request.form().to_vec(),
            device,
            user_agent: self.config.user_agent(device).to_string(),
            referrer: Some(
                request
                    .referrer()
                    .unwrap_or(&self.config.referrer)
                    .to_string(),
            ),
            cookies: request.cookies().clone(),
            timeout: request.timeout().unwrap_or_else(|| self.config.timeout()),
        };
        let retries = request
            .retries_on_timeout()
            .unwrap_or(self.config.timeout_max_retry_count);

        let response = fetch::fetch(self.transport.as_ref(), &transport_request, retries)?;
        Ok(FetchedPage::new(
            url,
            self.prefix_for(request),
            device,
            request.test_identity(),
            response,
        ))
    }
}

impl TestLifecycle for FetchEngine {
    fn before_test(&self, identity: &str) {
        debug!(identity, "test starting");
        self.history.clear(identity);
    }

    fn after_test(&self, identity: &str) {
        debug!(
            identity,
            pages = self.history.pages(identity).len(),
            "test finished"
        );
        self.history.clear(identity);
    }
}

/// A test's view of the engine: every fetch and lookup uses its identity.
pub struct TestSession<'a> {
    engine: &'a FetchEngine,
    identity: String,
}

impl<'a> TestSession<'a> {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn fetch(&self, request: FetchRequest) -> Result<Arc<FetchedPage>> {
        self.engine
            .fetch(&request.with_test_identity(self.identity.clone()))
    }

    /// Most recently fetched page.
    pub fn get(&self) -> Result<Arc<FetchedPage>> {
        self.engine.latest(&self.identity)
    }

    pub fn get_at(&self, index: usize) -> Result<Arc<FetchedPage>> {
        self.engine.page_at(&self.identity, index)
    }

    pub fn get_by_url(&self, snippet: &str) -> Result<Arc<FetchedPage>> {
        self.engine.page_by_url(&self.identity, snippet)
    }

    pub fn get_by_url_and_device(
        &self,
        snippet: &str,
        device: DeviceProfile,
    ) -> Result<Arc<FetchedPage>> {
        self.engine
            .page_by_url_and_device(&self.identity, snippet, device)
    }

    pub fn get_by_device(&self, device: DeviceProfile) -> Result<Arc<FetchedPage>> {
        self.engine.page_by_device(&self.identity, device)
    }

    pub fn pages(&self) -> Vec<Arc<FetchedPage>> {
        self.engine.pages(&self.identity)
    }
}

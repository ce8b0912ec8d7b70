//! Tests

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::engine::{FetchEngine, TestLifecycle};
    use crate::error::FetchError;
    use crate::testing::{FlakyTransport, StaticTransport};
    use crate::types::{CookieSet, DeviceProfile, FetchRequest, HttpMethod, Protocol};
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    fn engine_with(config: Config) -> (FetchEngine, Arc<StaticTransport>) {
        let transport = Arc::new(StaticTransport::new());
        let engine = FetchEngine::with_transport(config, transport.clone());
        (engine, transport)
    }

    fn engine() -> (FetchEngine, Arc<StaticTransport>) {
        engine_with(Config::default())
    }

    fn request(url: &str, identity: &str) -> FetchRequest {
        FetchRequest::new(url).with_test_identity(identity)
    }

    #[test]
    fn first_fetch_of_new_identity_reuses_cached_page() {
        let (engine, transport) = engine();
        let a = engine.fetch(&request("example.org", "T1")).unwrap();
        let b = engine.fetch(&request("example.org", "T2")).unwrap();

        assert_eq!(transport.calls(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.test_identity(), "T1");
        assert_eq!(engine.cached_pages(), 1);
    }

    #[test]
    fn devices_never_share_an_entry() {
        let (engine, transport) = engine();
        let desktop = engine
            .fetch(&request("example.org", "T1").with_device(DeviceProfile::Desktop))
            .unwrap();
        let mobile = engine
            .fetch(&request("example.org", "T2").with_device(DeviceProfile::Mobile))
            .unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(engine.cached_pages(), 2);
        assert!(!Arc::ptr_eq(&desktop, &mobile));
        assert_eq!(desktop.element_count("h1").unwrap(), 1);
        assert_eq!(mobile.element_count("h1").unwrap(), 1);
        assert!(mobile.is_mobile());

        let agents: Vec<String> = transport.requests().into_iter().map(|r| r.user_agent).collect();
        let config = Config::default();
        assert_eq!(agents[0], config.desktop_user_agent);
        assert_eq!(agents[1], config.mobile_user_agent);
    }

    #[test]
    fn only_first_fetch_of_an_identity_is_cached() {
        let (engine, transport) = engine();
        engine.fetch(&request("example.org/a", "T1")).unwrap();
        engine.fetch(&request("example.org/b", "T1")).unwrap();
        assert_eq!(engine.cached_pages(), 1);

        engine.fetch(&request("example.org/b", "T3")).unwrap();
        assert_eq!(transport.calls(), 3);
        assert_eq!(engine.cached_pages(), 2);
    }

    #[test]
    fn repeat_fetch_under_same_identity_goes_to_network() {
        let (engine, transport) = engine();
        let first = engine.fetch(&request("example.org", "T1")).unwrap();
        let second = engine.fetch(&request("example.org", "T1")).unwrap();

        assert_eq!(transport.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.header("x-call"), Some("1"));
        assert_eq!(second.header("x-call"), Some("2"));

        let third = engine.fetch(&request("example.org", "T2")).unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn seen_identity_skips_cache_even_when_entry_exists() {
        let (engine, transport) = engine();
        engine.fetch(&request("example.org/a", "T1")).unwrap();
        engine.fetch(&request("example.org/b", "T2")).unwrap();
        engine.fetch(&request("example.org/a", "T2")).unwrap();
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn disabled_cache_always_fetches() {
        let (engine, transport) = engine_with(Config::default().with_cache_duplicates(false));
        let a = engine.fetch(&request("example.org", "T1")).unwrap();
        let b = engine.fetch(&request("example.org", "T2")).unwrap();

        assert_eq!(transport.calls(), 2);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cached_pages(), 0);
        assert!(engine.has_fetched("T1"));
    }

    #[test]
    fn concurrent_first_fetches_share_one_network_call() {
        let transport = Arc::new(StaticTransport::new().with_delay(Duration::from_millis(30)));
        let engine = FetchEngine::with_transport(Config::default(), transport.clone());
        let barrier = Barrier::new(8);

        let pages: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let engine = &engine;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        engine.fetch(&request("example.org", &format!("T{i}"))).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(transport.calls(), 1);
        assert!(pages.iter().all(|p| Arc::ptr_eq(p, &pages[0])));
    }

    #[test]
    fn concurrent_fetches_of_one_identity_seed_cache_once() {
        let transport = Arc::new(StaticTransport::new().with_delay(Duration::from_millis(30)));
        let engine = FetchEngine::with_transport(Config::default(), transport.clone());
        let barrier = Barrier::new(2);

        std::thread::scope(|scope| {
            for i in 0..2 {
                let engine = &engine;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.fetch(&request(&format!("x.org/{i}"), "T1")).unwrap();
                });
            }
        });

        assert_eq!(transport.calls(), 2);
        assert_eq!(engine.cached_pages(), 1);
        assert_eq!(engine.pages("T1").len(), 2);
        assert!(engine.has_fetched("T1"));
    }

    #[test]
    fn failed_first_fetch_keeps_identity_first() {
        // default config allows 3 attempts per fetch
        let transport = Arc::new(FlakyTransport::new(3));
        let engine = FetchEngine::with_transport(Config::default(), transport.clone());
        let first = request("example.org", "T1");

        assert!(engine.fetch(&first).is_err());
        assert!(!engine.has_fetched("T1"));
        engine.fetch(&first).unwrap();
        assert!(engine.has_fetched("T1"));
        assert_eq!(engine.cached_pages(), 1);
    }

    #[test]
    fn unrelated_urls_fetch_in_parallel() {
        let transport = Arc::new(StaticTransport::new().with_delay(Duration::from_millis(200)));
        let engine = FetchEngine::with_transport(Config::default(), transport.clone());
        let started = std::time::Instant::now();

        std::thread::scope(|scope| {
            for i in 0..4 {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .fetch(&request(&format!("example.org/{i}"), &format!("T{i}")))
                        .unwrap();
                });
            }
        });

        assert_eq!(transport.calls(), 4);
        assert!(started.elapsed() < Duration::from_millis(700));
    }

    #[test]
    fn exhausted_timeouts_leave_no_trace() {
        let transport = Arc::new(FlakyTransport::always());
        let engine = FetchEngine::with_transport(Config::default(), transport.clone());
        let err = engine
            .fetch(&request("example.org", "T1").with_retries_on_timeout(2))
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(transport.calls(), 3);
        assert!(!engine.has_fetched("T1"));
        assert_eq!(engine.cached_pages(), 0);
        assert!(engine.pages("T1").is_empty());
    }

    #[test]
    fn retries_default_to_config() {
        let transport = Arc::new(FlakyTransport::always());
        let mut config = Config::default();
        config.timeout_max_retry_count = 4;
        let engine = FetchEngine::with_transport(config, transport.clone());
        engine.fetch(&request("example.org", "T1")).unwrap_err();
        assert_eq!(transport.calls(), 5);
    }

    #[test]
    fn malformed_url_fails_before_network() {
        let (engine, transport) = engine();
        let err = engine.fetch(&request("exa mple.org", "T1")).unwrap_err();
        assert!(matches!(err, FetchError::MalformedUrl { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn session_lookups_follow_fetch_order() {
        let (engine, _transport) = engine();
        let session = engine.session("FetchedPageTest.lookups");
        session.fetch(FetchRequest::new("github.com/someone")).unwrap();
        session.fetch(FetchRequest::new("www.google.de")).unwrap();
        session
            .fetch(FetchRequest::new("www.google.de").with_device(DeviceProfile::Mobile))
            .unwrap();

        assert_eq!(session.get_at(0).unwrap().url(), "http://github.com/someone");
        assert_eq!(session.get_at(1).unwrap().url(), "http://www.google.de");
        assert_eq!(session.get_by_url("google").unwrap().device(), DeviceProfile::Desktop);
        assert_eq!(
            session
                .get_by_url_and_device("google", DeviceProfile::Mobile)
                .unwrap()
                .device(),
            DeviceProfile::Mobile
        );
        assert!(session.get_by_device(DeviceProfile::Mobile).unwrap().is_mobile());
        assert!(session.get().unwrap().is_mobile());
        assert_eq!(session.pages().len(), 3);
    }

    #[test]
    fn lookup_misses_name_the_key() {
        let (engine, _transport) = engine();
        let session = engine.session("T1");
        session.fetch(FetchRequest::new("www.google.de")).unwrap();

        let err = session.get_by_url("unknown").unwrap_err();
        assert_eq!(err.to_string(), "could not find fetched page with url-snippet \"unknown\"");

        let err = session.get_at(1).unwrap_err();
        assert_eq!(err.to_string(), "could not find fetched page with index \"1\"");

        let err = session
            .get_by_url_and_device("wrong-url", DeviceProfile::Desktop)
            .unwrap_err();
        assert!(matches!(err, FetchError::PageNotFound(_)));
        assert!(engine.session("T2").get().is_err());
    }

    #[test]
    fn request_options_reach_transport() {
        let (engine, transport) = engine();
        let session = engine.session("T1");
        let page = session
            .fetch(
                FetchRequest::new("wikipedia.org")
                    .with_protocol(Protocol::Https)
                    .with_prefix("en")
                    .with_device(DeviceProfile::Mobile)
                    .with_referrer("my.custom.referrer")
                    .with_timeout(Duration::from_millis(1500))
                    .with_cookies(CookieSet::empty().with("page-content-tester", "wtf-666")),
            )
            .unwrap();

        assert_eq!(page.url(), "https://en.wikipedia.org");
        assert_eq!(page.url_prefix(), "en");

        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "https://en.wikipedia.org");
        assert_eq!(sent.referrer.as_deref(), Some("my.custom.referrer"));
        assert_eq!(sent.timeout, Duration::from_millis(1500));
        assert_eq!(sent.cookies.header_value().as_deref(), Some("page-content-tester=wtf-666"));
        assert_eq!(sent.user_agent, Config::default().mobile_user_agent);
    }

    #[test]
    fn unset_options_fall_back_to_config() {
        let mut config = Config::default().with_port("8080");
        config.referrer = "http://referrer.local".into();
        config.url_prefix = "www".into();
        let (engine, transport) = engine_with(config);
        let page = engine.fetch(&request("example.org/x", "T1")).unwrap();

        assert_eq!(page.url(), "http://www.example.org:8080/x");
        let sent = &transport.requests()[0];
        assert_eq!(sent.referrer.as_deref(), Some("http://referrer.local"));
        assert_eq!(sent.timeout, Config::default().timeout());
    }

    #[test]
    fn call_uses_desktop_defaults() {
        let (engine, transport) = engine();
        let form = vec![("q".to_string(), "rust".to_string())];
        let page = engine.call("example.org/post", HttpMethod::Post, form.clone()).unwrap();

        assert_eq!(page.device(), DeviceProfile::Desktop);
        let sent = &transport.requests()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.form, form);
    }

    #[test]
    fn lifecycle_hooks_reset_history_not_tracker() {
        let (engine, transport) = engine();
        engine.before_test("T1");
        engine.fetch(&request("example.org", "T1")).unwrap();
        assert_eq!(engine.pages("T1").len(), 1);
        engine.after_test("T1");
        assert!(engine.pages("T1").is_empty());

        // a rerun of T1 is not a first fetch any more
        engine.before_test("T1");
        engine.fetch(&request("example.org", "T1")).unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(engine.pages("T1").len(), 1);
    }
}

//! Waterfall, fan-out and pipeline tests driven by stub strategies.
//!
//! Stub fetchers answer from a fixed table keyed by target, so each test
//! controls exactly which strategy succeeds, comes back empty, or fails.
//! Persistence goes through `MemoryStore`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;
use vidit_core::{Item, MemoryStore, Source, SourceKind, Store};
use vidit_fetch::{
    collect_ranked, dedup_stored, fetch_all, fetch_source, rescore_stored, run_pass, FetchError,
    Fetcher, Fetchers, PipelineConfig,
};
use vidit_rank::RankingConfig;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

enum Reply {
    Items(Vec<(&'static str, &'static str, i64)>),
    Fail,
}

/// A strategy that answers from a table keyed by target and records calls.
struct StubFetcher {
    kind: SourceKind,
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Respond to `target` with `(title, url, hours_old)` items.
    fn items(mut self, target: &str, items: Vec<(&'static str, &'static str, i64)>) -> Self {
        self.replies.insert(target.to_string(), Reply::Items(items));
        self
    }

    fn fail(mut self, target: &str) -> Self {
        self.replies.insert(target.to_string(), Reply::Fail);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError> {
        self.calls.lock().unwrap().push(target.to_string());
        match self.replies.get(target) {
            Some(Reply::Items(items)) => Ok(items
                .iter()
                .map(|(title, url, hours_old)| {
                    Item::candidate(
                        source,
                        self.kind,
                        title,
                        url,
                        now() - Duration::hours(*hours_old),
                    )
                })
                .collect()),
            Some(Reply::Fail) => Err(FetchError::Api("stub failure".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

struct Stubs {
    feed: Arc<StubFetcher>,
    search: Arc<StubFetcher>,
    sitemap: Arc<StubFetcher>,
}

impl Stubs {
    fn new(feed: StubFetcher, search: StubFetcher, sitemap: StubFetcher) -> Self {
        Self {
            feed: Arc::new(feed),
            search: Arc::new(search),
            sitemap: Arc::new(sitemap),
        }
    }

    fn fetchers(&self) -> Fetchers {
        Fetchers::new(
            self.feed.clone(),
            self.search.clone(),
            self.sitemap.clone(),
        )
    }
}

fn stubs() -> (StubFetcher, StubFetcher, StubFetcher) {
    (
        StubFetcher::new(SourceKind::Feed),
        StubFetcher::new(SourceKind::SearchApi),
        StubFetcher::new(SourceKind::Sitemap),
    )
}

fn config() -> PipelineConfig {
    PipelineConfig {
        ranking: RankingConfig::default(),
        max_concurrent_sources: 4,
    }
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_feed_falls_through_search_to_guessed_sitemap() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed,
        search,
        sitemap.items(
            "https://diario.test/sitemap_news.xml",
            vec![("Sismo de magnitud 6 sacude el norte", "https://diario.test/sismo", 1)],
        ),
    );
    let source = Source::new(1, "Diario", "https://www.diario.test/rss", SourceKind::Feed);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert_eq!(stubs.feed.calls(), ["https://www.diario.test/rss"]);
    assert_eq!(stubs.search.calls(), ["diario.test"]);
    assert_eq!(stubs.sitemap.calls(), ["https://diario.test/sitemap_news.xml"]);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].source_kind, SourceKind::Sitemap);

    let update = result.update.expect("successful waterfall must produce an update");
    assert_eq!(update.source_id, 1);
    assert_eq!(update.kind, Some(SourceKind::Sitemap));
    assert_eq!(
        update.endpoint.as_deref(),
        Some("https://diario.test/sitemap_news.xml"),
        "reclassified source must point at the target its new strategy used"
    );
}

#[tokio::test]
async fn failing_search_falls_through_like_an_empty_one() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.fail("https://diario.test/rss"),
        search
            .fail("diario.test")
            .items("otro.test", vec![("No debe usarse", "https://otro.test/x", 1)]),
        sitemap.items(
            "https://diario.test/sitemap_news.xml",
            vec![("Paro de transporte en Santiago", "https://diario.test/paro", 2)],
        ),
    );
    let source = Source::new(1, "Diario", "https://diario.test/rss", SourceKind::Unset);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert!(result.succeeded());
    assert_eq!(result.items[0].url, "https://diario.test/paro");
}

#[tokio::test]
async fn successful_feed_stops_waterfall_without_reclassifying() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.items(
            "https://diario.test/rss",
            vec![("Gobierno anuncia bono invierno", "https://diario.test/bono", 3)],
        ),
        search,
        sitemap,
    );
    let source = Source::new(1, "Diario", "https://diario.test/rss", SourceKind::Feed);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert!(stubs.search.calls().is_empty());
    assert!(stubs.sitemap.calls().is_empty());
    let update = result.update.expect("feed succeeded");
    assert_eq!(update.kind, None, "kind is unchanged when the declared strategy wins");
    assert_eq!(update.endpoint, None);
}

#[tokio::test]
async fn unset_source_is_classified_as_feed_on_success() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.items(
            "https://diario.test/rss",
            vec![("Lluvias en la zona central", "https://diario.test/lluvia", 1)],
        ),
        search,
        sitemap,
    );
    let source = Source::new(1, "Diario", "https://diario.test/rss", SourceKind::Unset);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    let update = result.update.expect("feed succeeded");
    assert_eq!(update.kind, Some(SourceKind::Feed));
    assert_eq!(update.endpoint, None, "feed target is the recorded endpoint");
}

#[tokio::test]
async fn explicit_search_source_never_falls_back() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(feed, search.fail("diario.test"), sitemap);
    let source = Source::new(1, "Diario", "diario.test", SourceKind::SearchApi);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert!(!result.succeeded());
    assert!(result.items.is_empty());
    assert_eq!(stubs.search.calls(), ["diario.test"]);
    assert!(stubs.feed.calls().is_empty());
    assert!(stubs.sitemap.calls().is_empty());
}

#[tokio::test]
async fn explicit_sitemap_source_never_falls_back() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(feed, search, sitemap);
    let source = Source::new(
        1,
        "Diario",
        "https://diario.test/news.xml",
        SourceKind::Sitemap,
    );

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert!(!result.succeeded());
    assert_eq!(stubs.sitemap.calls(), ["https://diario.test/news.xml"]);
    assert!(stubs.feed.calls().is_empty());
    assert!(stubs.search.calls().is_empty());
}

#[tokio::test]
async fn exhausted_waterfall_skips_source() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed,
        search,
        sitemap.fail("https://diario.test/sitemap_news.xml"),
    );
    let source = Source::new(1, "Diario", "https://diario.test/rss", SourceKind::Feed);

    let result = fetch_source(&stubs.fetchers(), &source).await;

    assert!(!result.succeeded());
    assert!(result.items.is_empty());
    assert_eq!(stubs.feed.calls().len(), 1);
    assert_eq!(stubs.search.calls().len(), 1);
    assert_eq!(stubs.sitemap.calls().len(), 1);
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fan_out_merges_duplicate_urls_across_sources() {
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.items(
            "https://a.test/rss",
            vec![
                ("Cuenta pública presidencial", "https://shared.test/cuenta", 5),
                ("Alza del dólar", "https://a.test/dolar", 1),
            ],
        )
        .items(
            "https://b.test/rss",
            vec![("Cuenta pública: los anuncios", "https://shared.test/cuenta", 2)],
        )
        .fail("https://c.test/rss"),
        search,
        sitemap,
    );
    let sources = vec![
        Source::new(1, "A", "https://a.test/rss", SourceKind::Feed),
        Source::new(2, "B", "https://b.test/rss", SourceKind::Feed),
        Source::new(3, "C", "https://c.test/rss", SourceKind::Feed),
    ];

    let fan_out = fetch_all(&stubs.fetchers(), &sources, 2).await;

    assert_eq!(fan_out.sources, 3);
    assert_eq!(fan_out.failed, 1);
    assert_eq!(fan_out.fetched, 3);
    assert_eq!(fan_out.items.len(), 2);
    assert_eq!(fan_out.updates.len(), 2);

    let shared = fan_out
        .items
        .iter()
        .find(|i| i.url == "https://shared.test/cuenta")
        .expect("shared url survives");
    assert_eq!(shared.source_id, 2, "later publication wins the URL");
}

/// Feed strategy whose `slow` target only finishes once `total` fetches have
/// started, so it completes only if other sources can start around it.
struct GatedFeed {
    slow: &'static str,
    total: usize,
    started: AtomicUsize,
    notify: Notify,
}

#[async_trait]
impl Fetcher for GatedFeed {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self, source: &Source, target: &str) -> Result<Vec<Item>, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_waiters();
        if target == self.slow {
            loop {
                let notified = self.notify.notified();
                if self.started.load(Ordering::SeqCst) >= self.total {
                    break;
                }
                notified.await;
            }
        }
        let url = format!("{target}/item");
        Ok(vec![Item::candidate(
            source,
            SourceKind::Feed,
            &format!("Titular {}", source.name),
            &url,
            now(),
        )])
    }
}

#[tokio::test]
async fn slow_source_does_not_hold_back_the_rest() {
    let gated = Arc::new(GatedFeed {
        slow: "https://slow.test/rss",
        total: 4,
        started: AtomicUsize::new(0),
        notify: Notify::new(),
    });
    let (_, search, sitemap) = stubs();
    let fetchers = Fetchers::new(gated.clone(), Arc::new(search), Arc::new(sitemap));
    let sources = vec![
        Source::new(1, "Lento", "https://slow.test/rss", SourceKind::Feed),
        Source::new(2, "Uno", "https://one.test/rss", SourceKind::Feed),
        Source::new(3, "Dos", "https://two.test/rss", SourceKind::Feed),
        Source::new(4, "Tres", "https://three.test/rss", SourceKind::Feed),
    ];

    let fan_out = tokio::time::timeout(StdDuration::from_secs(5), fetch_all(&fetchers, &sources, 2))
        .await
        .expect("later sources must start while the first is still running");

    assert_eq!(fan_out.failed, 0);
    let urls: Vec<&str> = fan_out.items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://slow.test/rss/item",
            "https://one.test/rss/item",
            "https://two.test/rss/item",
            "https://three.test/rss/item",
        ],
        "results are merged in source order"
    );
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn three_source_store() -> MemoryStore {
    let mut deleted = Source::new(9, "Deleted", "https://gone.test/rss", SourceKind::Feed);
    deleted.deleted = true;
    MemoryStore::with_sources(vec![
        Source::new(1, "A", "https://a.test/rss", SourceKind::Feed),
        Source::new(2, "B", "https://b.test/rss", SourceKind::Unset),
        Source::new(3, "C", "c.test", SourceKind::SearchApi),
        deleted,
    ])
}

fn three_source_stubs() -> Stubs {
    let (feed, search, sitemap) = stubs();
    Stubs::new(
        feed.items(
            "https://a.test/rss",
            vec![
                ("Terremoto de magnitud 7 sacude Chile central", "https://a.test/terremoto", 1),
                ("Nuevo ministro de Hacienda asume", "https://a.test/ministro", 4),
            ],
        )
        .items(
            "https://gone.test/rss",
            vec![("Nunca debe aparecer", "https://gone.test/x", 0)],
        ),
        search
            .items(
                "b.test",
                vec![("Terremoto de magnitud 7 sacude Chile", "https://b.test/terremoto", 2)],
            )
            .fail("c.test"),
        sitemap,
    )
}

#[tokio::test]
async fn run_pass_ranks_dedups_and_persists() {
    let store = three_source_store();
    let stubs = three_source_stubs();

    let report = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .expect("pass should succeed");

    assert_eq!(report.sources, 3, "deleted source is not fetched");
    assert_eq!(report.sources_failed, 1);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.unique, 3);
    assert_eq!(report.kept, 2, "the two earthquake stories collapse into one");
    assert_eq!(report.written, 2);

    let stored = store.list_items().await.unwrap();
    let urls: Vec<&str> = stored.iter().map(|i| i.url.as_str()).collect();
    assert!(urls.contains(&"https://a.test/terremoto"));
    assert!(urls.contains(&"https://a.test/ministro"));
    assert!(!urls.contains(&"https://gone.test/x"));
    assert!(stored.iter().all(|i| i.score > 0.0 && (i.score - 1.0).abs() > 1e-9));

    let sources = store.sources().unwrap();
    let b = sources.iter().find(|s| s.id == 2).unwrap();
    assert_eq!(b.kind, SourceKind::SearchApi, "fallback success reclassifies");
    assert_eq!(b.endpoint, "b.test");
    assert!(b.last_fetched_at.is_some());
    let c = sources.iter().find(|s| s.id == 3).unwrap();
    assert_eq!(c.kind, SourceKind::SearchApi);
    assert!(c.last_fetched_at.is_none(), "failed source is not stamped");
}

#[tokio::test]
async fn run_pass_is_idempotent_over_unchanged_upstream() {
    let store = three_source_store();
    let stubs = three_source_stubs();

    let first_report = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();
    let first = store.list_items().await.unwrap();

    let second_report = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();
    let second = store.list_items().await.unwrap();

    assert_eq!(first_report, second_report);
    assert_eq!(first, second);
}

#[tokio::test]
async fn run_pass_with_every_source_failing_writes_nothing() {
    let store = MemoryStore::with_sources(vec![
        Source::new(1, "A", "a.test", SourceKind::SearchApi),
        Source::new(2, "B", "https://b.test/map.xml", SourceKind::Sitemap),
    ]);
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed,
        search.fail("a.test"),
        sitemap.fail("https://b.test/map.xml"),
    );

    let report = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .expect("total failure is not an error");

    assert_eq!(report.sources_failed, 2);
    assert_eq!(report.written, 0);
    assert!(store.list_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn collect_ranked_writes_nothing() {
    let store = three_source_store();
    let stubs = three_source_stubs();

    let batch = collect_ranked(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();

    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.updates.len(), 2);
    assert!(batch.items[0].score >= batch.items[1].score);
    assert!(store.list_items().await.unwrap().is_empty());
    let sources = store.sources().unwrap();
    assert!(sources.iter().all(|s| s.last_fetched_at.is_none()));
}

#[tokio::test]
async fn identical_titles_keep_only_the_best_scored() {
    let store = MemoryStore::with_sources(vec![Source::new(
        1,
        "A",
        "https://a.test/rss",
        SourceKind::Feed,
    )]);
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.items(
            "https://a.test/rss",
            vec![
                ("Alerta de tsunami en la costa", "https://a.test/1", 6),
                ("Alerta de tsunami en la costa", "https://a.test/2", 1),
                ("Alerta de tsunami en la costa", "https://a.test/3", 3),
            ],
        ),
        search,
        sitemap,
    );

    let report = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();

    assert_eq!(report.kept, 1);
    let stored = store.list_items().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].url, "https://a.test/2", "freshest copy scores highest");
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn stored_item(title: &str, url: &str, hours_old: i64, score: f64) -> Item {
    let source = Source::new(1, "A", "https://a.test/rss", SourceKind::Feed);
    Item {
        score,
        ..Item::candidate(
            &source,
            SourceKind::Feed,
            title,
            url,
            now() - Duration::hours(hours_old),
        )
    }
}

#[tokio::test]
async fn rescore_stored_rewrites_scores_without_removing_items() {
    let store = MemoryStore::default();
    store
        .upsert_items(&[
            stored_item("Paro portuario en Valparaíso", "https://a.test/1", 2, 1.0),
            stored_item("Paro portuario en Valparaíso continúa", "https://a.test/2", 1, 1.0),
        ])
        .await
        .unwrap();

    let written = rescore_stored(&store, &config(), now()).await.unwrap();

    assert_eq!(written, 2);
    let stored = store.list_items().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|i| (i.score - 1.0).abs() > 1e-9));
}

#[tokio::test]
async fn dedup_stored_deletes_lower_scored_duplicates() {
    let store = MemoryStore::default();
    store
        .upsert_items(&[
            stored_item("Paro portuario en Valparaíso", "https://a.test/low", 5, 0.2),
            stored_item("Paro portuario en Valparaíso", "https://a.test/high", 1, 0.9),
            stored_item("Elecciones municipales en octubre", "https://a.test/other", 1, 0.5),
        ])
        .await
        .unwrap();

    let report = dedup_stored(&store, &config()).await.unwrap();

    assert_eq!(report.examined, 3);
    assert_eq!(report.deleted, 1);
    let urls: Vec<String> = store
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.url)
        .collect();
    assert_eq!(urls, ["https://a.test/high", "https://a.test/other"]);
}

// ---------------------------------------------------------------------------
// Reclassification across passes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn source_reclassified_to_search_keeps_fetching_on_later_passes() {
    let store = MemoryStore::with_sources(vec![Source::new(
        1,
        "B",
        "https://www.b.test/rss",
        SourceKind::Unset,
    )]);
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed,
        search.items(
            "b.test",
            vec![("Cámara despacha ley de presupuesto", "https://b.test/presupuesto", 2)],
        ),
        sitemap,
    );

    let first = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();
    assert_eq!(first.kept, 1);

    let source = store.sources().unwrap().remove(0);
    assert_eq!(source.kind, SourceKind::SearchApi);
    assert_eq!(source.endpoint, "b.test");

    let second = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();
    assert_eq!(second.sources_failed, 0);
    assert_eq!(second.kept, 1);
    assert_eq!(stubs.search.calls(), ["b.test", "b.test"]);
    assert_eq!(stubs.feed.calls().len(), 1, "explicit kind skips the feed");
}

#[tokio::test]
async fn source_reclassified_to_sitemap_keeps_fetching_on_later_passes() {
    let store = MemoryStore::with_sources(vec![Source::new(
        1,
        "C",
        "https://c.test/rss",
        SourceKind::Feed,
    )]);
    let (feed, search, sitemap) = stubs();
    let stubs = Stubs::new(
        feed.fail("https://c.test/rss"),
        search,
        sitemap.items(
            "https://c.test/sitemap_news.xml",
            vec![("Incendio forestal en la región del Biobío", "https://c.test/incendio", 1)],
        ),
    );

    run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();

    let source = store.sources().unwrap().remove(0);
    assert_eq!(source.kind, SourceKind::Sitemap);
    assert_eq!(source.endpoint, "https://c.test/sitemap_news.xml");

    let second = run_pass(&store, &stubs.fetchers(), &config(), now())
        .await
        .unwrap();
    assert_eq!(second.sources_failed, 0);
    assert_eq!(second.written, 1);
    assert_eq!(
        stubs.sitemap.calls(),
        [
            "https://c.test/sitemap_news.xml",
            "https://c.test/sitemap_news.xml"
        ]
    );
    assert_eq!(stubs.feed.calls().len(), 1);
    assert_eq!(stubs.search.calls().len(), 1);
}

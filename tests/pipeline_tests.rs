//! End-to-end coverage of the consolidation pipeline against a real sqlite
//! store: dedup conservation, cache behavior, and terminal status handling.

use fetcharr::cache::SearchCache;
use fetcharr::db::Store;
use fetcharr::fingerprint::fingerprint;
use fetcharr::models::{
    DeduplicationOptions, RawResult, RequestStatus, ResultKind, SearchRequest,
};
use fetcharr::processor::ResultsProcessor;

async fn temp_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("fetcharr-pipeline-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store")
}

fn raw(url: &str, title: &str, provider: &str, rank: u32) -> RawResult {
    RawResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: format!("snippet for {title}"),
        provider: provider.to_string(),
        rank,
        kind: ResultKind::Page,
    }
}

#[tokio::test]
async fn test_every_raw_result_is_accounted_for() {
    let store = temp_store().await;
    let cache = SearchCache::new(store.clone(), 3600);
    let processor = ResultsProcessor::new(store.clone(), cache);

    let request = SearchRequest::new("rust web framework");
    store.create_request(&request).await.unwrap();

    let raws = vec![
        raw("https://actix.rs/", "Actix Web", "searxng", 0),
        raw("https://actix.rs", "Actix Web", "brave", 0),
        raw("https://rocket.rs/", "Rocket", "searxng", 1),
        raw("https://rocket.rs/?utm_source=news", "Rocket", "brave", 1),
        raw("https://github.com/tokio-rs/axum", "Axum", "brave", 2),
    ];
    let total = raws.len();

    let outcome = processor.process(raws, &request).await.unwrap();

    // Conservation: unique + duplicates matches the input count exactly.
    let all = store.get_all_results(request.id).await.unwrap();
    assert_eq!(all.len(), total);
    assert_eq!(
        outcome.unique_results.len() + outcome.duplicates_removed as usize,
        total
    );
    assert_eq!(outcome.unique_results.len(), 3);

    // Every duplicate points at a surviving unique, never at another
    // duplicate.
    let unique_ids: Vec<_> = outcome.unique_results.iter().map(|r| r.id).collect();
    for row in all.iter().filter(|r| r.duplicate_of.is_some()) {
        assert!(unique_ids.contains(&row.duplicate_of.unwrap()));
    }

    let relationships = store.get_duplicate_relationships(request.id).await.unwrap();
    assert_eq!(relationships.len(), 2);
}

#[tokio::test]
async fn test_request_status_reaches_completed_with_unique_count() {
    let store = temp_store().await;
    let cache = SearchCache::new(store.clone(), 3600);
    let processor = ResultsProcessor::new(store.clone(), cache);

    let request = SearchRequest::new("diabetes treatment");
    assert_eq!(request.status, RequestStatus::Pending);
    store.create_request(&request).await.unwrap();

    let raws = vec![
        raw(
            "https://www.mayoclinic.org/diseases/diabetes/treatment",
            "Diabetes treatment - Mayo Clinic",
            "searxng",
            0,
        ),
        raw(
            "https://mayoclinic.org/diseases/diabetes/treatment/",
            "Diabetes Treatment | Mayo Clinic",
            "brave",
            0,
        ),
        raw(
            "https://www.niddk.nih.gov/health/diabetes",
            "Managing Diabetes - NIDDK",
            "brave",
            1,
        ),
    ];

    let outcome = processor.process(raws, &request).await.unwrap();
    assert_eq!(outcome.unique_results.len(), 2);

    let stored = store.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Completed);
    // result_count is the unique count, not the raw count.
    assert_eq!(stored.result_count, Some(2));
}

#[tokio::test]
async fn test_cache_round_trip_and_invalidation() {
    let store = temp_store().await;
    let cache = SearchCache::new(store.clone(), 3600);
    let processor = ResultsProcessor::new(store.clone(), cache.clone());

    let first = SearchRequest::new("solar panels");
    store.create_request(&first).await.unwrap();
    let outcome = processor
        .process(
            vec![
                raw("https://energy.gov/solar", "Solar basics", "searxng", 0),
                raw("https://energy.gov/solar", "Solar basics", "brave", 0),
            ],
            &first,
        )
        .await
        .unwrap();
    assert!(!outcome.cache_hit);

    // Identical query on a fresh request hits the cache.
    let second = SearchRequest::new("solar panels");
    store.create_request(&second).await.unwrap();
    let outcome = processor.process(Vec::new(), &second).await.unwrap();
    assert!(outcome.cache_hit);
    assert_eq!(outcome.unique_results.len(), 1);
    assert_eq!(outcome.duplicates_removed, 1);

    // Targeted invalidation removes the entry from both tiers.
    let fp = fingerprint(&first.query, &first.filters, &first.providers);
    assert!(cache.invalidate(&fp).await.unwrap());
    assert!(cache.get(&fp).await.unwrap().is_none());

    let reprocessed = SearchRequest::new("solar panels");
    store.create_request(&reprocessed).await.unwrap();
    let outcome = processor
        .process(
            vec![raw("https://energy.gov/solar", "Solar basics", "searxng", 0)],
            &reprocessed,
        )
        .await
        .unwrap();
    assert!(!outcome.cache_hit);

    // After cleanup with a zero max age nothing survives, so the next
    // identical request does the full run again.
    let removed = cache.cleanup(0).await.unwrap();
    assert!(removed >= 1);

    let third = SearchRequest::new("solar panels");
    store.create_request(&third).await.unwrap();
    let outcome = processor
        .process(
            vec![raw("https://energy.gov/solar", "Solar basics", "searxng", 0)],
            &third,
        )
        .await
        .unwrap();
    assert!(!outcome.cache_hit);
}

#[tokio::test]
async fn test_cache_entry_expires_after_ttl() {
    let store = temp_store().await;
    let cache = SearchCache::new(store.clone(), 1);
    let processor = ResultsProcessor::new(store.clone(), cache.clone());

    let request = SearchRequest::new("short lived");
    store.create_request(&request).await.unwrap();
    processor
        .process(
            vec![raw("https://example.org/", "Example", "searxng", 0)],
            &request,
        )
        .await
        .unwrap();

    let fp = fingerprint(&request.query, &request.filters, &request.providers);
    assert!(cache.get(&fp).await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(1300)).await;

    // Lazy expiry on read: the entry written with ttl=1s is absent from
    // both tiers once its lifetime has elapsed, with no sweep in between.
    assert!(cache.get(&fp).await.unwrap().is_none());

    let followup = SearchRequest::new("short lived");
    store.create_request(&followup).await.unwrap();
    let outcome = processor
        .process(
            vec![raw("https://example.org/", "Example", "searxng", 0)],
            &followup,
        )
        .await
        .unwrap();
    assert!(!outcome.cache_hit);
}

#[tokio::test]
async fn test_cache_survives_process_restart() {
    let db_path =
        std::env::temp_dir().join(format!("fetcharr-pipeline-{}.db", uuid::Uuid::new_v4()));
    let db_url = format!("sqlite:{}", db_path.display());

    {
        let store = Store::new(&db_url).await.unwrap();
        let cache = SearchCache::new(store.clone(), 3600);
        let processor = ResultsProcessor::new(store.clone(), cache);

        let request = SearchRequest::new("persistent query");
        store.create_request(&request).await.unwrap();
        processor
            .process(
                vec![raw("https://example.org/", "Example", "searxng", 0)],
                &request,
            )
            .await
            .unwrap();
    }

    // Fresh store and cache over the same file stand in for a restart; the
    // memory tier is empty but the durable tier answers.
    let store = Store::new(&db_url).await.unwrap();
    let cache = SearchCache::new(store.clone(), 3600);
    let processor = ResultsProcessor::new(store.clone(), cache);

    let request = SearchRequest::new("persistent query");
    store.create_request(&request).await.unwrap();
    let outcome = processor.process(Vec::new(), &request).await.unwrap();
    assert!(outcome.cache_hit);
    assert_eq!(outcome.unique_results.len(), 1);
}

#[tokio::test]
async fn test_strict_url_matching_keeps_variants_apart() {
    let store = temp_store().await;
    let cache = SearchCache::new(store.clone(), 3600);
    let processor = ResultsProcessor::new(store.clone(), cache);

    let mut request = SearchRequest::new("release notes");
    request.dedup = DeduplicationOptions {
        strict_url_matching: true,
        ..DeduplicationOptions::default()
    };
    store.create_request(&request).await.unwrap();

    // Same page modulo tracking params and titles far enough apart that the
    // similarity pass cannot bridge them.
    let raws = vec![
        raw(
            "https://blog.example/v2?utm_source=mail",
            "Version 2.0 release notes",
            "searxng",
            0,
        ),
        raw(
            "https://blog.example/v2",
            "What changed in the new update",
            "brave",
            0,
        ),
    ];

    let outcome = processor.process(raws, &request).await.unwrap();
    assert_eq!(outcome.unique_results.len(), 2);
    assert_eq!(outcome.duplicates_removed, 0);
}

#[tokio::test]
async fn test_validation_rejects_out_of_range_max_results() {
    let mut request = SearchRequest::new("anything");
    request.max_results = 101;
    assert!(request.validate().is_err());

    request.max_results = 100;
    assert!(request.validate().is_ok());

    request.max_results = 0;
    assert!(request.validate().is_err());
}

use super::*;
use crate::constants::DEFAULT_EMBEDDING_DIM;
use crate::provider::{ProviderError, ScriptedProvider};
use crate::storage::{CacheError, CacheOutcome};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing_test::traced_test;

const HOLA_KEY: &str = "b58e4a60c963f8b3c43d83cc9245020ce71d8311fa2f48cfd36deed6f472a71b";

fn test_config(dir: &TempDir, backend: &str) -> Config {
    let mut config = Config::default();
    config.cache = CacheConfig::default()
        .with_data_dir(dir.path())
        .with_backend(backend);
    config.retry = config.retry.without_jitter();
    config
}

fn create_test_cache(
    backend: &str,
    provider: ScriptedProvider,
) -> (EmbeddingCache<Arc<ScriptedProvider>>, Arc<ScriptedProvider>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let provider = Arc::new(provider);
    let cache = EmbeddingCache::new(Arc::clone(&provider), &test_config(&dir, backend));
    (cache, provider, dir)
}

#[tokio::test]
#[traced_test]
async fn test_hola_saved_then_loaded() {
    let (cache, provider, dir) =
        create_test_cache("json", ScriptedProvider::new(DEFAULT_EMBEDDING_DIM));
    let request = EmbeddingRequest::single("hola");
    let expected_path = dir.path().join(format!("{HOLA_KEY}.json"));

    let first = cache.lookup(&request).await.unwrap();
    assert_eq!(first.outcome, CacheOutcome::Saved);
    assert_eq!(first.path, expected_path);
    assert_eq!(first.embeddings.as_one().map(<[f32]>::len), Some(1536));
    assert!(expected_path.is_file());
    assert!(logs_contain("saved"));

    let second = cache.lookup(&request).await.unwrap();
    assert_eq!(second.outcome, CacheOutcome::Loaded);
    assert_eq!(second.path, expected_path);
    assert_eq!(second.embeddings, first.embeddings);
    assert!(logs_contain("loaded"));

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_get_or_compute_idempotent_per_backend() {
    for backend in ["json", "tensor"] {
        let (cache, provider, _dir) = create_test_cache(backend, ScriptedProvider::new(16));
        let request = EmbeddingRequest::batch(["hola", "hello"]);

        let first = cache.get_or_compute(&request).await.unwrap();
        let second = cache.get_or_compute(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.rows(), 2);
        assert_eq!(provider.calls(), 1, "backend {backend}");
    }
}

#[tokio::test]
async fn test_lookup_in_overrides_directory_and_backend() {
    let (cache, provider, dir) = create_test_cache("json", ScriptedProvider::new(4));
    let other = TempDir::new().unwrap();
    let request = EmbeddingRequest::single("hola");
    let override_config = CacheConfig::default()
        .with_data_dir(other.path())
        .with_backend("tensor");

    let lookup = cache.lookup_in(&request, &override_config).await.unwrap();

    assert_eq!(
        lookup.path,
        other.path().join(format!("{HOLA_KEY}.safetensors"))
    );
    assert!(lookup.path.is_file());
    assert!(!dir.path().join(format!("{HOLA_KEY}.json")).exists());

    let again = cache.lookup_in(&request, &override_config).await.unwrap();
    assert!(again.is_hit());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_unknown_backend_from_config() {
    let (cache, provider, _dir) = create_test_cache("parquet", ScriptedProvider::new(4));

    let result = cache.get_or_compute(&EmbeddingRequest::single("x")).await;

    assert!(matches!(result, Err(CacheError::UnknownBackend { .. })));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limits_are_retried_before_saving() {
    let (cache, provider, _dir) =
        create_test_cache("json", ScriptedProvider::new(4).rate_limited(2));
    let request = EmbeddingRequest::single("hola");

    let lookup = cache.lookup(&request).await.unwrap();

    assert_eq!(lookup.outcome, CacheOutcome::Saved);
    assert_eq!(provider.calls(), 3);

    let again = cache.lookup(&request).await.unwrap();
    assert!(again.is_hit());
    assert_eq!(provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(4).fail_with(ProviderError::Api {
        status: Some(400),
        message: "bad input".to_string(),
    }));
    let cache = EmbeddingCache::new(Arc::clone(&provider), &test_config(&dir, "json"));
    let request = EmbeddingRequest::single("hola");

    let start = tokio::time::Instant::now();
    let result = cache.get_or_compute(&request).await;

    assert!(matches!(
        result,
        Err(CacheError::Provider(ProviderError::Api { status: Some(400), .. }))
    ));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(provider.calls(), 1);

    let recovered = cache.lookup(&request).await.unwrap();
    assert_eq!(recovered.outcome, CacheOutcome::Saved);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_as_provider_error() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(4).rate_limited(5));
    let mut config = test_config(&dir, "json");
    config.retry = config.retry.with_max_retries(Some(2));
    let cache = EmbeddingCache::new(Arc::clone(&provider), &config);

    let result = cache.get_or_compute(&EmbeddingRequest::single("x")).await;

    assert!(matches!(
        result,
        Err(CacheError::Provider(ProviderError::RetriesExhausted { attempts: 3, .. }))
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_free_function_matches_facade() {
    let dir = TempDir::new().unwrap();
    let provider = ScriptedProvider::new(8);
    let request = EmbeddingRequest::single("hola");

    let first = get_or_compute(&request, &provider, dir.path(), "tensor")
        .await
        .unwrap();
    let second = get_or_compute(&request, &provider, dir.path(), "tensor")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, Embeddings::One(provider.vector_for("hola")));
    assert_eq!(provider.calls(), 1);
}

#[test]
fn test_debug_omits_provider() {
    let dir = TempDir::new().unwrap();
    let cache = EmbeddingCache::new(ScriptedProvider::new(4), &test_config(&dir, "json"));

    let rendered = format!("{cache:?}");

    assert!(rendered.contains("EmbeddingCache"));
    assert!(rendered.contains("json"));
}

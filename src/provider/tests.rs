use super::*;

#[test]
fn test_provider_kind_from_str() {
    assert_eq!("http".parse::<ProviderKind>(), Ok(ProviderKind::Http));
    assert_eq!("SDK".parse::<ProviderKind>(), Ok(ProviderKind::Native));
    assert_eq!("native".parse::<ProviderKind>(), Ok(ProviderKind::Native));
    assert!("grpc".parse::<ProviderKind>().is_err());
}

#[test]
fn test_assemble_single() {
    let request = EmbeddingRequest::single("a");
    let result = assemble(&request, vec![(0, vec![1.0, 2.0])]).unwrap();
    assert_eq!(result, Embeddings::One(vec![1.0, 2.0]));
}

#[test]
fn test_assemble_orders_batch_by_index() {
    let request = EmbeddingRequest::batch(["a", "b", "c"]);
    let items = vec![(2, vec![3.0]), (0, vec![1.0]), (1, vec![2.0])];

    let result = assemble(&request, items).unwrap();

    assert_eq!(
        result,
        Embeddings::Many(vec![vec![1.0], vec![2.0], vec![3.0]])
    );
}

#[test]
fn test_assemble_rejects_duplicate_index() {
    let request = EmbeddingRequest::batch(["a", "b"]);
    let result = assemble(&request, vec![(0, vec![1.0]), (0, vec![2.0])]);
    assert!(matches!(result, Err(ProviderError::InvalidResponse { .. })));
}

#[test]
fn test_assemble_rejects_out_of_range_index() {
    let single = assemble(&EmbeddingRequest::single("a"), vec![(3, vec![1.0])]);
    assert!(matches!(single, Err(ProviderError::InvalidResponse { .. })));

    let batch = assemble(
        &EmbeddingRequest::batch(["a", "b"]),
        vec![(1, vec![1.0]), (2, vec![2.0])],
    );
    assert!(matches!(batch, Err(ProviderError::InvalidResponse { .. })));
}

#[test]
fn test_assemble_rejects_count_mismatch() {
    let request = EmbeddingRequest::batch(["a", "b"]);
    let result = assemble(&request, vec![(0, vec![1.0])]);
    assert!(matches!(result, Err(ProviderError::InvalidResponse { .. })));
}

#[test]
fn test_error_classification() {
    let limited = ProviderError::RateLimited {
        retry_after: Some(std::time::Duration::from_secs(2)),
    };
    assert!(limited.is_rate_limited());
    assert_eq!(limited.retry_after(), Some(std::time::Duration::from_secs(2)));
    assert!(limited.to_string().contains("2000ms"));

    let api = ProviderError::Api {
        status: Some(401),
        message: "bad key".to_string(),
    };
    assert!(!api.is_rate_limited());
    assert_eq!(api.retry_after(), None);
    assert_eq!(api.to_string(), "API error (status 401): bad key");

    assert!(!ProviderError::NotConfigured.is_rate_limited());
}

#[tokio::test]
async fn test_arc_provider_delegates() {
    let provider = Arc::new(ScriptedProvider::new(8));
    let shared: Arc<dyn EmbeddingProvider> = provider.clone();

    let result = shared.embed(&EmbeddingRequest::single("a")).await.unwrap();

    assert_eq!(result.dimension(), Some(8));
    assert_eq!(shared.name(), "scripted");
    assert_eq!(provider.calls(), 1);
}

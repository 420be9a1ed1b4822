//! `embedcache` command-line entrypoint.
//!
//! ```text
//! embedcache [--data-dir DIR] [--backend TAG] [--native] TEXT...
//! ```
//!
//! One text is embedded as a single request, several as one batch. Settings
//! not given on the command line come from `EMBEDCACHE_*` variables.

use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;

use embedcache::config::Config;
use embedcache::provider::{ProviderKind, build_provider};
use embedcache::{EmbeddingCache, EmbeddingRequest, Embeddings};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Embed texts through the on-disk cache.
#[derive(Debug, Parser)]
#[command(name = "embedcache", version, about)]
struct Args {
    /// Cache directory (overrides EMBEDCACHE_DATA_DIR).
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Serialization backend tag, e.g. `json` or `tensor` (overrides EMBEDCACHE_BACKEND).
    #[arg(long, value_name = "TAG")]
    backend: Option<String>,

    /// Use the OpenAI SDK client instead of raw HTTP.
    #[arg(long)]
    native: bool,

    /// Text to embed; several texts are sent as one batch.
    #[arg(required = true, value_name = "TEXT")]
    texts: Vec<String>,
}

impl Args {
    fn provider_kind(&self) -> ProviderKind {
        if self.native {
            ProviderKind::Native
        } else {
            ProviderKind::Http
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let kind = args.provider_kind();

    let mut config = Config::from_env()?;
    if let Some(data_dir) = args.data_dir {
        config.cache.data_dir = data_dir;
    }
    if let Some(backend) = args.backend {
        config.cache.backend = backend;
    }
    config.validate()?;

    tracing::debug!(?config, kind = ?kind, "embedcache starting");

    let provider = build_provider(kind, &config.provider)?;
    let cache = EmbeddingCache::new(provider, &config);

    let request = match <[String; 1]>::try_from(args.texts) {
        Ok([text]) => EmbeddingRequest::Single(text),
        Err(texts) => EmbeddingRequest::Batch(texts),
    };

    let lookup = cache.lookup(&request).await?;

    let shape = match &lookup.embeddings {
        Embeddings::One(vector) => format!("[{}]", vector.len()),
        Embeddings::Many(rows) => format!(
            "[{}, {}]",
            rows.len(),
            lookup.embeddings.dimension().unwrap_or(0)
        ),
    };
    println!("{} {:?} {}", lookup.path.display(), lookup.outcome, shape);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("embedcache").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_single_text() {
        let parsed = args(&["hola"]).unwrap();
        assert_eq!(parsed.texts, vec!["hola"]);
        assert_eq!(parsed.provider_kind(), ProviderKind::Http);
        assert!(parsed.data_dir.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let parsed = args(&[
            "--data-dir", "/tmp/c", "--backend", "tensor", "--native", "a", "b",
        ])
        .unwrap();
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/c")));
        assert_eq!(parsed.backend.as_deref(), Some("tensor"));
        assert_eq!(parsed.provider_kind(), ProviderKind::Native);
        assert_eq!(parsed.texts, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_double_dash() {
        let parsed = args(&["--", "--native"]).unwrap();
        assert_eq!(parsed.texts, vec!["--native"]);
        assert_eq!(parsed.provider_kind(), ProviderKind::Http);
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["--data-dir"]).is_err());
        assert!(args(&["--verbose", "x"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use ps_core::{Error, RawSource};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves raw filter lists from URLs or local paths.
pub struct Fetcher {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl Fetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
        })
    }

    /// Fetch every source in order. Each result is keyed by the source string.
    pub async fn fetch_all(&self, sources: &[String]) -> Vec<ps_core::Result<RawSource>> {
        let mut out = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            out.push(self.fetch(index, source).await);
        }
        out
    }

    pub async fn fetch(&self, index: usize, source: &str) -> ps_core::Result<RawSource> {
        let bytes = if is_remote(source) {
            let bytes = self.download(source).await?;
            self.persist(index, source, &bytes).await;
            bytes
        } else {
            tokio::fs::read(source)
                .await
                .map_err(|e| Error::unavailable(source, e))?
        };

        log::info!("Fetched {} ({} bytes)", source, bytes.len());
        Ok(RawSource::new(source, bytes))
    }

    async fn download(&self, url: &str) -> ps_core::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::unavailable(url, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::unavailable(url, e))?;
        Ok(bytes.to_vec())
    }

    // Keeps the last downloaded copy on disk; failures here never fail the fetch.
    async fn persist(&self, index: usize, url: &str, bytes: &[u8]) {
        let path = self.cache_dir.join(cache_file_name(index, url));
        if let Err(e) = tokio::fs::create_dir_all(&self.cache_dir).await {
            log::warn!("Failed to create '{}': {}", self.cache_dir.display(), e);
            return;
        }
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            log::warn!("Failed to write '{}': {}", path.display(), e);
        }
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// `<index>-<last path segment>`, so lists sharing a file name don't collide.
fn cache_file_name(index: usize, url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let name = trimmed
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("filter.txt");
    let name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{:02}-{}", index, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_names() {
        assert_eq!(
            cache_file_name(0, "https://raw.githubusercontent.com/x/sections/specific.txt"),
            "00-specific.txt"
        );
        assert_eq!(cache_file_name(3, "https://example.com/"), "03-filter.txt");
        assert_eq!(cache_file_name(1, "https://example.com/list?v=2"), "01-list");
        assert_eq!(cache_file_name(12, "https://example.com/a b.txt"), "12-a_b.txt");
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/list.txt"));
        assert!(is_remote("http://example.com/list.txt"));
        assert!(!is_remote("lists/local.txt"));
    }

    #[tokio::test]
    async fn reads_local_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "$removeparam=si\n").unwrap();
        let source = path.to_string_lossy().to_string();

        let fetcher = Fetcher::new(dir.path().join("cache")).unwrap();
        let raw = fetcher.fetch(0, &source).await.unwrap();
        assert_eq!(raw.id, source);
        assert_eq!(raw.bytes, b"$removeparam=si\n");
    }

    #[tokio::test]
    async fn missing_local_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path()).unwrap();
        let results = fetcher.fetch_all(&["does/not/exist.txt".to_string()]).await;
        assert!(matches!(
            results.as_slice(),
            [Err(Error::SourceUnavailable { source_id, .. })] if source_id == "does/not/exist.txt"
        ));
    }
}

//! Concurrent retrieval of the remote assets a bundle is built from.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::error::{BundleError, Result};
use crate::models::{Asset, AssetKind, AssetMap, AssetSource};

/// Source of asset content.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
  /// Fetch a single asset, returning content of the source's kind.
  async fn fetch(&self, source: &AssetSource) -> Result<Asset>;
}

/// Fetches assets over HTTP(S).
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  /// Create a fetcher whose requests time out after `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(BundleError::HttpClient)?;
    Ok(Self { client })
  }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
  async fn fetch(&self, source: &AssetSource) -> Result<Asset> {
    let fetch_error = |err: reqwest::Error| BundleError::Fetch {
      name: source.name.clone(),
      url: source.url.clone(),
      source: err,
    };

    debug!(name = %source.name, url = %source.url, kind = %source.kind, "requesting asset");
    let response = self.client.get(&source.url).send().await.map_err(fetch_error)?;

    let status = response.status();
    if !status.is_success() {
      return Err(BundleError::Status {
        name: source.name.clone(),
        url: source.url.clone(),
        status: status.as_u16(),
      });
    }

    match source.kind {
      AssetKind::Binary => {
        let bytes = response.bytes().await.map_err(fetch_error)?;
        Ok(Asset::Binary(bytes.to_vec()))
      }
      AssetKind::Text => {
        let text = response.text().await.map_err(fetch_error)?;
        Ok(Asset::Text(text))
      }
    }
  }
}

struct Progress {
  total: usize,
  completed: AtomicUsize,
}

impl Progress {
  fn new(total: usize) -> Self {
    let progress = Self {
      total,
      completed: AtomicUsize::new(0),
    };
    progress.report(0);
    progress
  }

  fn advance(&self, name: &str, asset: &Asset) {
    let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
    if asset.is_empty() {
      warn!(name, "asset downloaded with no content");
    } else {
      debug!(name, size = asset.len(), "asset downloaded");
    }
    self.report(completed);
  }

  fn report(&self, completed: usize) {
    if let Some(percent) = percent(completed, self.total) {
      info!("{percent}%");
    }
  }
}

/// Completion percentage, rounded up. `None` when there is nothing to download.
fn percent(completed: usize, total: usize) -> Option<usize> {
  if total == 0 {
    return None;
  }
  Some((100 * completed).div_ceil(total))
}

/// Fetch every source concurrently and return the complete mapping.
///
/// The first failure aborts the whole resolution; no partial mapping is returned.
pub async fn resolve_assets<F>(fetcher: &F, sources: &[AssetSource]) -> Result<AssetMap>
where
  F: AssetFetcher + ?Sized,
{
  let progress = Progress::new(sources.len());

  let fetched = try_join_all(sources.iter().map(|source| {
    let progress = &progress;
    async move {
      let asset = fetcher.fetch(source).await?;
      if asset.kind() != source.kind {
        return Err(BundleError::UnexpectedAssetKind {
          name: source.name.clone(),
          expected: source.kind,
        });
      }
      progress.advance(&source.name, &asset);
      Ok::<_, BundleError>((source.name.clone(), asset))
    }
  }))
  .await?;

  Ok(fetched.into_iter().collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use tokio::sync::Barrier;

  struct CannedFetcher {
    assets: HashMap<String, Asset>,
  }

  #[async_trait]
  impl AssetFetcher for CannedFetcher {
    async fn fetch(&self, source: &AssetSource) -> Result<Asset> {
      self
        .assets
        .get(&source.url)
        .cloned()
        .ok_or_else(|| BundleError::Status {
          name: source.name.clone(),
          url: source.url.clone(),
          status: 404,
        })
    }
  }

  struct BarrierFetcher {
    barrier: Barrier,
  }

  #[async_trait]
  impl AssetFetcher for BarrierFetcher {
    async fn fetch(&self, source: &AssetSource) -> Result<Asset> {
      self.barrier.wait().await;
      Ok(Asset::Text(source.name.clone()))
    }
  }

  fn canned() -> CannedFetcher {
    let mut assets = HashMap::new();
    assets.insert("http://host/a.js".to_string(), Asset::Text("a".into()));
    assets.insert("http://host/a.js.mem".to_string(), Asset::Binary(vec![0, 1]));
    CannedFetcher { assets }
  }

  #[tokio::test]
  async fn resolves_all_sources_by_name() {
    let sources = vec![
      AssetSource::new("script", "http://host/a.js"),
      AssetSource::new("memory", "http://host/a.js.mem"),
    ];
    let map = resolve_assets(&canned(), &sources).await.unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["script"], Asset::Text("a".into()));
    assert_eq!(map["memory"], Asset::Binary(vec![0, 1]));
  }

  #[tokio::test]
  async fn one_failure_fails_the_whole_resolution() {
    let sources = vec![
      AssetSource::new("script", "http://host/a.js"),
      AssetSource::new("missing", "http://host/missing.json"),
      AssetSource::new("memory", "http://host/a.js.mem"),
    ];
    let err = resolve_assets(&canned(), &sources).await.unwrap_err();
    assert!(matches!(err, BundleError::Status { ref name, status: 404, .. } if name == "missing"));
  }

  #[tokio::test]
  async fn rejects_content_of_the_wrong_kind() {
    let mut fetcher = canned();
    fetcher
      .assets
      .insert("http://host/b.js.mem".to_string(), Asset::Text("oops".into()));
    let sources = vec![AssetSource::new("memory", "http://host/b.js.mem")];
    let err = resolve_assets(&fetcher, &sources).await.unwrap_err();
    assert!(matches!(
      err,
      BundleError::UnexpectedAssetKind { expected: AssetKind::Binary, .. }
    ));
  }

  #[tokio::test]
  async fn fetches_run_concurrently() {
    let sources: Vec<AssetSource> = (0..4)
      .map(|i| AssetSource::new(format!("asset{i}"), format!("http://host/{i}.js")))
      .collect();
    let fetcher = BarrierFetcher {
      barrier: Barrier::new(sources.len()),
    };

    let map = tokio::time::timeout(Duration::from_secs(5), resolve_assets(&fetcher, &sources))
      .await
      .expect("fetches were not started concurrently")
      .unwrap();
    assert_eq!(map.len(), 4);
    assert_eq!(map["asset3"], Asset::Text("asset3".into()));
  }

  #[tokio::test]
  async fn empty_source_list_resolves_to_empty_map() {
    let map = resolve_assets(&canned(), &[]).await.unwrap();
    assert!(map.is_empty());
  }

  #[test]
  fn percent_steps_through_each_completion() {
    let steps: Vec<Option<usize>> = (0..=4).map(|done| percent(done, 4)).collect();
    assert_eq!(steps, vec![Some(0), Some(25), Some(50), Some(75), Some(100)]);
  }

  #[test]
  fn percent_rounds_up() {
    let steps: Vec<Option<usize>> = (0..=3).map(|done| percent(done, 3)).collect();
    assert_eq!(steps, vec![Some(0), Some(34), Some(67), Some(100)]);
  }

  #[test]
  fn percent_is_silent_for_empty_lists() {
    assert_eq!(percent(0, 0), None);
  }

  #[test]
  fn progress_counts_each_completed_asset() {
    let progress = Progress::new(2);
    progress.advance("script", &Asset::Text("a".into()));
    progress.advance("memory", &Asset::Binary(Vec::new()));
    assert_eq!(progress.completed.load(Ordering::SeqCst), 2);
  }
}

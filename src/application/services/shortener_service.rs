//! URL shortening and resolution service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, warn};
use url::Url;

use crate::application::error::ShortenerError;
use crate::domain::entities::{NewRecord, Record};
use crate::domain::repositories::{AliasRepository, BatchRepository, RepositoryError, TxRunner};
use crate::utils::alias_generator::{ALIAS_LENGTH, generate_short};
use crate::utils::link::{create_link, validate_url};

/// Maximum number of alias candidates tried before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 6;

/// Result of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenResult {
    /// The alias stored for the URL.
    pub short_url: String,
    /// Full externally visible link (base URL joined with the alias).
    pub link: String,
    /// `true` if the URL was already shortened before this call.
    pub existed: bool,
}

/// One entry of a batch shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

impl BatchItem {
    pub fn new(correlation_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            original_url: original_url.into(),
        }
    }
}

/// One entry of a batch shorten response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultItem {
    pub correlation_id: String,
    /// Full short link for the item's URL.
    pub short_url: String,
}

/// Batch shorten output, in the same order as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub items: Vec<BatchResultItem>,
    /// `true` if at least one URL already had an alias before this call.
    pub had_existing: bool,
}

/// Service orchestrating validation, lookup-or-create and batch shortening.
///
/// The storage backend is injected as capabilities: every backend provides
/// [`AliasRepository`], batch shortening additionally needs a
/// [`BatchRepository`], and a [`TxRunner`] (when present) scopes each batch in
/// a transaction so a failed batch leaves no partial inserts behind.
pub struct ShortenerService {
    repository: Arc<dyn AliasRepository>,
    batch: Option<Arc<dyn BatchRepository>>,
    tx_runner: Option<Arc<dyn TxRunner>>,
    base_url: Url,
    alias_length: usize,
}

impl ShortenerService {
    /// Creates a service over a repository, composing links against `base_url`.
    pub fn new(repository: Arc<dyn AliasRepository>, base_url: Url) -> Self {
        Self {
            repository,
            batch: None,
            tx_runner: None,
            base_url,
            alias_length: ALIAS_LENGTH,
        }
    }

    /// Enables batch shortening without a transactional scope.
    pub fn with_batch(mut self, batch: Arc<dyn BatchRepository>) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Enables batch shortening inside backend transactions.
    pub fn with_transactions(mut self, tx_runner: Arc<dyn TxRunner>) -> Self {
        self.tx_runner = Some(tx_runner);
        self
    }

    /// Overrides the generated alias length (6 by default).
    pub fn with_alias_length(mut self, alias_length: usize) -> Self {
        self.alias_length = alias_length;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the alias for `url`, creating one if the URL is new.
    ///
    /// Re-shortening a stored URL is idempotent and reports `existed = true`.
    ///
    /// # Collision handling
    ///
    /// A fresh alias is generated for each of up to
    /// [`MAX_GENERATION_ATTEMPTS`] attempts. Alias collisions are retried. A URL
    /// collision means a concurrent caller stored the same URL first; its alias
    /// is returned as existing.
    ///
    /// # Errors
    ///
    /// - [`ShortenerError::InvalidUrl`] - empty or unparseable input
    /// - [`ShortenerError::GenerationExhausted`] - every candidate collided
    /// - [`ShortenerError::Persistence`] - durable write failed (nothing stored)
    /// - [`ShortenerError::Repository`] - any other backend failure, not retried
    pub async fn shorten(&self, url: &str) -> Result<ShortenResult, ShortenerError> {
        validate(url)?;

        match self.repository.search(url).await {
            Ok(short_url) => return self.result(short_url, true),
            Err(RepositoryError::NotFoundUrl(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let (short_url, existed) = self.insert_with_retry(url).await?;
        if !existed {
            metrics::counter!("shortener_aliases_created_total").increment(1);
            debug!(%url, %short_url, "Created short url");
        }

        self.result(short_url, existed)
    }

    /// Returns the original URL for an alias.
    ///
    /// # Errors
    ///
    /// Returns [`ShortenerError::NotFound`] if the alias is unknown.
    pub async fn resolve(&self, short_url: &str) -> Result<String, ShortenerError> {
        Ok(self.repository.get(short_url).await?)
    }

    /// Shortens many URLs at once.
    ///
    /// The request is rejected as a whole if any URL is invalid or appears
    /// twice. URLs already stored keep their alias; the rest get fresh aliases,
    /// regenerated for the items whose candidate collided, for up to
    /// [`MAX_GENERATION_ATTEMPTS`] rounds.
    ///
    /// # Errors
    ///
    /// - [`ShortenerError::InvalidUrl`] / [`ShortenerError::DuplicateInBatch`] - nothing inserted
    /// - [`ShortenerError::GenerationExhausted`] - some URLs could not be given an alias;
    ///   with a transactional backend nothing from this call is kept
    /// - [`ShortenerError::BatchUnsupported`] - backend has no batch capability
    pub async fn batch(&self, items: Vec<BatchItem>) -> Result<BatchOutcome, ShortenerError> {
        let mut order = Vec::with_capacity(items.len());
        let mut seen = HashSet::with_capacity(items.len());

        for item in &items {
            validate(&item.original_url)?;
            if !seen.insert(item.original_url.as_str()) {
                return Err(ShortenerError::DuplicateInBatch(item.original_url.clone()));
            }
            order.push(item.original_url.clone());
        }

        let resolution = if let Some(tx_runner) = &self.tx_runner {
            let tx = tx_runner.begin().await?;
            // An error here drops `tx`, which rolls back every insert made through it.
            let resolution = resolve_batch(tx.as_ref(), &order, self.alias_length).await?;
            tx.commit().await?;
            resolution
        } else if let Some(batch) = &self.batch {
            resolve_batch(batch.as_ref(), &order, self.alias_length).await?
        } else {
            return Err(ShortenerError::BatchUnsupported);
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let short_url = resolution
                .aliases
                .get(&item.original_url)
                .ok_or_else(|| ShortenerError::GenerationExhausted {
                    attempts: MAX_GENERATION_ATTEMPTS,
                    remaining: 1,
                })?;
            out.push(BatchResultItem {
                correlation_id: item.correlation_id,
                short_url: create_link(&self.base_url, short_url).map_err(ShortenerError::Link)?,
            });
        }

        info!(
            total = out.len(),
            existing = resolution.existing.len(),
            "Batch shortened"
        );

        Ok(BatchOutcome {
            items: out,
            had_existing: !resolution.existing.is_empty(),
        })
    }

    /// Inserts `url` under fresh aliases until one sticks.
    ///
    /// Returns the alias and whether it belonged to a concurrent insert of the
    /// same URL.
    async fn insert_with_retry(&self, url: &str) -> Result<(String, bool), ShortenerError> {
        let repository = &self.repository;
        let alias_length = self.alias_length;
        let strategy = FixedInterval::from_millis(0).take(MAX_GENERATION_ATTEMPTS - 1);

        let attempt = move || {
            let short_url = generate_short(alias_length);
            async move {
                match repository.add(&short_url, url).await {
                    Ok(()) => Ok((short_url, false)),
                    Err(RepositoryError::UrlAlreadyExists(existing_url)) => {
                        match repository.search(url).await {
                            Ok(existing) => Ok((existing, true)),
                            Err(RepositoryError::NotFoundUrl(_)) => {
                                Err(RepositoryError::UrlAlreadyExists(existing_url))
                            }
                            Err(e) => Err(e),
                        }
                    }
                    Err(e) => Err(e),
                }
            }
        };

        let is_collision = |e: &RepositoryError| {
            if e.is_collision() {
                metrics::counter!("shortener_alias_collisions_total").increment(1);
                debug!(error = %e, "Alias collision, retrying with a new candidate");
                true
            } else {
                false
            }
        };

        match RetryIf::spawn(strategy, attempt, is_collision).await {
            Ok(inserted) => Ok(inserted),
            Err(e) if e.is_collision() => {
                warn!(%url, "Alias generation exhausted");
                Err(ShortenerError::GenerationExhausted {
                    attempts: MAX_GENERATION_ATTEMPTS,
                    remaining: 1,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn result(&self, short_url: String, existed: bool) -> Result<ShortenResult, ShortenerError> {
        let link = create_link(&self.base_url, &short_url).map_err(ShortenerError::Link)?;
        Ok(ShortenResult {
            short_url,
            link,
            existed,
        })
    }
}

/// Aliases resolved for a batch, keyed by original URL.
#[derive(Debug, Default)]
struct BatchResolution {
    aliases: HashMap<String, String>,
    /// URLs whose alias was not created by this call.
    existing: HashSet<String>,
}

impl BatchResolution {
    fn record(&mut self, records: Vec<Record>, existing: bool) {
        for record in records {
            if existing {
                self.existing.insert(record.url.clone());
            }
            self.aliases.insert(record.url, record.short_url);
        }
    }
}

/// Looks up known URLs, then inserts the rest with regenerated aliases.
///
/// After each insert round the still-missing URLs are looked up again: a
/// candidate may have been skipped because its alias collided, or because a
/// concurrent request stored the same URL in the meantime.
async fn resolve_batch(
    repository: &dyn BatchRepository,
    urls: &[String],
    alias_length: usize,
) -> Result<BatchResolution, ShortenerError> {
    let mut resolution = BatchResolution::default();

    let found = repository.get_by_urls(urls).await?;
    let mut remaining = urls_diff(urls, &found);
    resolution.record(found, true);

    let mut attempts = 0;
    while !remaining.is_empty() && attempts < MAX_GENERATION_ATTEMPTS {
        attempts += 1;

        let candidates = remaining
            .iter()
            .map(|url| NewRecord::new(url.clone(), generate_short(alias_length)))
            .collect();

        let inserted = repository.add_many(candidates).await?;
        remaining = urls_diff(&remaining, &inserted);
        resolution.record(inserted, false);

        if remaining.is_empty() {
            break;
        }

        metrics::counter!("shortener_alias_collisions_total").increment(remaining.len() as u64);
        debug!(
            attempt = attempts,
            remaining = remaining.len(),
            "Batch candidates collided"
        );

        let appeared = repository.get_by_urls(&remaining).await?;
        remaining = urls_diff(&remaining, &appeared);
        resolution.record(appeared, true);
    }

    if !remaining.is_empty() {
        warn!(remaining = remaining.len(), "Batch alias generation exhausted");
        return Err(ShortenerError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
            remaining: remaining.len(),
        });
    }

    Ok(resolution)
}

/// Returns the URLs of `urls` not covered by `records`, preserving order.
fn urls_diff(urls: &[String], records: &[Record]) -> Vec<String> {
    let covered: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    urls.iter()
        .filter(|url| !covered.contains(url.as_str()))
        .cloned()
        .collect()
}

fn validate(url: &str) -> Result<(), ShortenerError> {
    validate_url(url).map_err(|reason| ShortenerError::InvalidUrl {
        url: url.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{
        BatchTransaction, MockAliasRepository, MockBatchRepository, MockTxRunner,
        RepositoryResult,
    };
    use crate::infrastructure::persistence::InMemoryRepository;
    use async_trait::async_trait;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn base() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    fn batch_service(batch: MockBatchRepository) -> ShortenerService {
        ShortenerService::new(Arc::new(MockAliasRepository::new()), base())
            .with_batch(Arc::new(batch))
    }

    #[derive(Default)]
    struct TxLog {
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
    }

    /// Transaction over a mocked batch repository that records how it ended.
    struct RecordingTx {
        inner: MockBatchRepository,
        committed: AtomicBool,
        log: Arc<TxLog>,
    }

    #[async_trait]
    impl BatchRepository for RecordingTx {
        async fn get_by_urls(&self, urls: &[String]) -> RepositoryResult<Vec<Record>> {
            self.inner.get_by_urls(urls).await
        }

        async fn add_many(&self, records: Vec<NewRecord>) -> RepositoryResult<Vec<Record>> {
            self.inner.add_many(records).await
        }
    }

    #[async_trait]
    impl BatchTransaction for RecordingTx {
        async fn commit(self: Box<Self>) -> RepositoryResult<()> {
            self.committed.store(true, Ordering::SeqCst);
            self.log.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Drop for RecordingTx {
        fn drop(&mut self) {
            if !self.committed.load(Ordering::SeqCst) {
                self.log.rollbacks.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn tx_service(inner: MockBatchRepository) -> (ShortenerService, Arc<TxLog>) {
        let log = Arc::new(TxLog::default());
        let tx = RecordingTx {
            inner,
            committed: AtomicBool::new(false),
            log: log.clone(),
        };

        let mut runner = MockTxRunner::new();
        runner
            .expect_begin()
            .times(1)
            .return_once(move || Ok(Box::new(tx) as Box<dyn BatchTransaction>));

        let service = ShortenerService::new(Arc::new(MockAliasRepository::new()), base())
            .with_batch(Arc::new(MockBatchRepository::new()))
            .with_transactions(Arc::new(runner));
        (service, log)
    }

    fn memory_service() -> ShortenerService {
        let repo = Arc::new(InMemoryRepository::new());
        ShortenerService::new(repo.clone(), base()).with_batch(repo)
    }

    #[tokio::test]
    async fn test_shorten_creates_alias() {
        let service = memory_service();

        let result = service.shorten("https://example.com").await.unwrap();

        assert_eq!(result.short_url.len(), 6);
        assert!(result.short_url.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(
            result.link,
            format!("http://localhost:8080/{}", result.short_url)
        );
        assert!(!result.existed);
    }

    #[tokio::test]
    async fn test_custom_alias_length() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ShortenerService::new(repo.clone(), base())
            .with_batch(repo)
            .with_alias_length(10);

        let single = service.shorten("https://example.com").await.unwrap();
        let outcome = service
            .batch(vec![BatchItem::new("1", "https://other.example.com")])
            .await
            .unwrap();

        assert_eq!(single.short_url.len(), 10);
        assert_eq!(outcome.items[0].short_url.rsplit('/').next().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_shorten_is_idempotent() {
        let service = memory_service();

        let first = service.shorten("https://example.com").await.unwrap();
        let second = service.shorten("https://example.com").await.unwrap();

        assert_eq!(first.short_url, second.short_url);
        assert!(!first.existed);
        assert!(second.existed);
    }

    #[tokio::test]
    async fn test_shorten_distinct_urls_get_distinct_aliases() {
        let service = memory_service();

        let a = service.shorten("https://a.example.com").await.unwrap();
        let b = service.shorten("https://b.example.com").await.unwrap();

        assert_ne!(a.short_url, b.short_url);
    }

    #[tokio::test]
    async fn test_shorten_then_resolve_round_trip() {
        let service = memory_service();

        let result = service.shorten("https://example.com/page?x=1").await.unwrap();
        let url = service.resolve(&result.short_url).await.unwrap();

        assert_eq!(url, "https://example.com/page?x=1");
    }

    #[tokio::test]
    async fn test_resolve_unknown_alias() {
        let service = memory_service();

        let err = service.resolve("nope00").await.unwrap_err();

        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_shorten_invalid_url_never_reaches_repository() {
        let mut repo = MockAliasRepository::new();
        repo.expect_search().times(0);
        repo.expect_add().times(0);

        let service = ShortenerService::new(Arc::new(repo), base());

        let err = service.shorten("not-a-url").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl { .. }));

        let err = service.shorten("").await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_shorten_retries_alias_collisions() {
        let mut repo = MockAliasRepository::new();
        let mut seq = Sequence::new();

        repo.expect_search()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|url| Err(RepositoryError::NotFoundUrl(url.to_string())));
        repo.expect_add()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|short, _| Err(RepositoryError::ShortAlreadyExists(short.to_string())));
        repo.expect_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let service = ShortenerService::new(Arc::new(repo), base());

        let result = service.shorten("https://example.com").await.unwrap();
        assert!(!result.existed);
        assert_eq!(result.short_url.len(), 6);
    }

    #[tokio::test]
    async fn test_shorten_exhausts_after_six_attempts() {
        let mut repo = MockAliasRepository::new();

        repo.expect_search()
            .times(1)
            .returning(|url| Err(RepositoryError::NotFoundUrl(url.to_string())));
        repo.expect_add()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|short, _| Err(RepositoryError::ShortAlreadyExists(short.to_string())));

        let service = ShortenerService::new(Arc::new(repo), base());

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted { attempts: 6, .. }
        ));
    }

    #[tokio::test]
    async fn test_shorten_does_not_retry_backend_errors() {
        let mut repo = MockAliasRepository::new();

        repo.expect_search()
            .times(1)
            .returning(|url| Err(RepositoryError::NotFoundUrl(url.to_string())));
        repo.expect_add()
            .times(1)
            .returning(|_, _| Err(RepositoryError::Backend("connection reset".into())));

        let service = ShortenerService::new(Arc::new(repo), base());

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Repository(RepositoryError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_shorten_search_failure_propagates() {
        let mut repo = MockAliasRepository::new();

        repo.expect_search()
            .times(1)
            .returning(|_| Err(RepositoryError::Timeout("search".into())));
        repo.expect_add().times(0);

        let service = ShortenerService::new(Arc::new(repo), base());

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Repository(RepositoryError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_shorten_persistence_failure_is_not_retried() {
        let mut repo = MockAliasRepository::new();

        repo.expect_search()
            .times(1)
            .returning(|url| Err(RepositoryError::NotFoundUrl(url.to_string())));
        repo.expect_add()
            .times(1)
            .returning(|_, _| Err(RepositoryError::Persistence("disk full".into())));

        let service = ShortenerService::new(Arc::new(repo), base());

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_shorten_concurrent_insert_of_same_url_returns_existing() {
        let mut repo = MockAliasRepository::new();
        let mut seq = Sequence::new();

        repo.expect_search()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|url| Err(RepositoryError::NotFoundUrl(url.to_string())));
        repo.expect_add()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, url| Err(RepositoryError::UrlAlreadyExists(url.to_string())));
        repo.expect_search()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("winner".to_string()));

        let service = ShortenerService::new(Arc::new(repo), base());

        let result = service.shorten("https://example.com").await.unwrap();
        assert_eq!(result.short_url, "winner");
        assert!(result.existed);
    }

    #[tokio::test]
    async fn test_concurrent_shorten_same_url_stores_one_record() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = Arc::new(ShortenerService::new(repo.clone(), base()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.shorten("https://same.example.com").await })
            })
            .collect();

        let mut aliases = HashSet::new();
        for handle in handles {
            aliases.insert(handle.await.unwrap().unwrap().short_url);
        }

        assert_eq!(aliases.len(), 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_batch_new_urls_keep_request_order() {
        let service = memory_service();

        let outcome = service
            .batch(vec![
                BatchItem::new("c1", "https://one.example.com"),
                BatchItem::new("c2", "https://two.example.com"),
            ])
            .await
            .unwrap();

        assert!(!outcome.had_existing);
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[0].correlation_id, "c1");
        assert_eq!(outcome.items[1].correlation_id, "c2");
        assert_ne!(outcome.items[0].short_url, outcome.items[1].short_url);
        assert!(
            outcome.items[0]
                .short_url
                .starts_with("http://localhost:8080/")
        );
    }

    #[tokio::test]
    async fn test_batch_reuses_existing_alias() {
        let service = memory_service();

        let single = service.shorten("https://one.example.com").await.unwrap();
        let outcome = service
            .batch(vec![
                BatchItem::new("a", "https://one.example.com"),
                BatchItem::new("b", "https://two.example.com"),
            ])
            .await
            .unwrap();

        assert!(outcome.had_existing);
        assert_eq!(outcome.items[0].short_url, single.link);
    }

    #[tokio::test]
    async fn test_batch_aliases_resolve_to_their_urls() {
        let service = memory_service();

        let outcome = service
            .batch(vec![
                BatchItem::new("1", "https://one.example.com"),
                BatchItem::new("2", "https://two.example.com"),
                BatchItem::new("3", "https://three.example.com"),
            ])
            .await
            .unwrap();

        for (item, url) in outcome.items.iter().zip([
            "https://one.example.com",
            "https://two.example.com",
            "https://three.example.com",
        ]) {
            let alias = item.short_url.rsplit('/').next().unwrap();
            assert_eq!(service.resolve(alias).await.unwrap(), url);
        }
    }

    #[tokio::test]
    async fn test_batch_duplicate_url_rejected_without_insert() {
        let mut batch = MockBatchRepository::new();
        batch.expect_get_by_urls().times(0);
        batch.expect_add_many().times(0);

        let service = batch_service(batch);

        let err = service
            .batch(vec![
                BatchItem::new("1", "https://dup.example.com"),
                BatchItem::new("2", "https://dup.example.com"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::DuplicateInBatch(url) if url == "https://dup.example.com"
        ));
    }

    #[tokio::test]
    async fn test_batch_invalid_url_rejects_whole_batch() {
        let mut batch = MockBatchRepository::new();
        batch.expect_get_by_urls().times(0);
        batch.expect_add_many().times(0);

        let service = batch_service(batch);

        let err = service
            .batch(vec![
                BatchItem::new("1", "https://ok.example.com"),
                BatchItem::new("2", "not-a-url"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_batch_retries_collided_candidates_only() {
        let mut batch = MockBatchRepository::new();
        let mut seq = Sequence::new();

        batch
            .expect_get_by_urls()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        // First round: only the first candidate sticks.
        batch
            .expect_add_many()
            .withf(|records| records.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|records| {
                Ok(vec![Record::new(
                    1,
                    records[0].url.clone(),
                    records[0].short_url.clone(),
                )])
            });
        batch
            .expect_get_by_urls()
            .withf(|urls| urls.len() == 1 && urls[0] == "https://two.example.com")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        batch
            .expect_add_many()
            .withf(|records| records.len() == 1 && records[0].url == "https://two.example.com")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|records| {
                Ok(vec![Record::new(
                    2,
                    records[0].url.clone(),
                    records[0].short_url.clone(),
                )])
            });

        let service = batch_service(batch);

        let outcome = service
            .batch(vec![
                BatchItem::new("1", "https://one.example.com"),
                BatchItem::new("2", "https://two.example.com"),
            ])
            .await
            .unwrap();

        assert!(!outcome.had_existing);
        assert_eq!(outcome.items.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_picks_up_concurrently_inserted_url() {
        let mut batch = MockBatchRepository::new();
        let mut seq = Sequence::new();

        batch
            .expect_get_by_urls()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        batch
            .expect_add_many()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![]));
        batch
            .expect_get_by_urls()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![Record::new(9, "https://race.example.com", "rAcE01")]));

        let service = batch_service(batch);

        let outcome = service
            .batch(vec![BatchItem::new("r", "https://race.example.com")])
            .await
            .unwrap();

        assert!(outcome.had_existing);
        assert_eq!(outcome.items[0].short_url, "http://localhost:8080/rAcE01");
    }

    #[tokio::test]
    async fn test_batch_exhausts_after_six_rounds() {
        let mut batch = MockBatchRepository::new();

        batch.expect_get_by_urls().returning(|_| Ok(vec![]));
        batch
            .expect_add_many()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|_| Ok(vec![]));

        let service = batch_service(batch);

        let err = service
            .batch(vec![BatchItem::new("1", "https://one.example.com")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted { remaining: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_batch_url_collision_propagates() {
        let mut batch = MockBatchRepository::new();

        batch.expect_get_by_urls().times(1).returning(|_| Ok(vec![]));
        batch
            .expect_add_many()
            .times(1)
            .returning(|records| Err(RepositoryError::UrlAlreadyExists(records[0].url.clone())));

        let service = batch_service(batch);

        let err = service
            .batch(vec![BatchItem::new("1", "https://one.example.com")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Repository(RepositoryError::UrlAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_commits_transaction_on_success() {
        let mut inner = MockBatchRepository::new();
        inner.expect_get_by_urls().times(1).returning(|_| Ok(vec![]));
        inner.expect_add_many().times(1).returning(|records| {
            Ok(records
                .into_iter()
                .enumerate()
                .map(|(i, r)| Record::new(i as i64 + 1, r.url, r.short_url))
                .collect())
        });

        let (service, log) = tx_service(inner);

        let outcome = service
            .batch(vec![
                BatchItem::new("1", "https://one.example.com"),
                BatchItem::new("2", "https://two.example.com"),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.items.len(), 2);
        assert!(!outcome.had_existing);
        assert_eq!(log.commits.load(Ordering::SeqCst), 1);
        assert_eq!(log.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_rolls_back_transaction_when_exhausted() {
        let mut inner = MockBatchRepository::new();
        inner.expect_get_by_urls().returning(|_| Ok(vec![]));
        inner
            .expect_add_many()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|_| Ok(vec![]));

        let (service, log) = tx_service(inner);

        let err = service
            .batch(vec![BatchItem::new("1", "https://one.example.com")])
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::GenerationExhausted { .. }));
        assert_eq!(log.commits.load(Ordering::SeqCst), 0);
        assert_eq!(log.rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_rolls_back_transaction_on_url_collision() {
        let mut inner = MockBatchRepository::new();
        inner.expect_get_by_urls().times(1).returning(|_| Ok(vec![]));
        inner
            .expect_add_many()
            .times(1)
            .returning(|records| Err(RepositoryError::UrlAlreadyExists(records[0].url.clone())));

        let (service, log) = tx_service(inner);

        let err = service
            .batch(vec![BatchItem::new("1", "https://one.example.com")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::Repository(RepositoryError::UrlAlreadyExists(_))
        ));
        assert_eq!(log.commits.load(Ordering::SeqCst), 0);
        assert_eq!(log.rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_validation_failure_opens_no_transaction() {
        let mut runner = MockTxRunner::new();
        runner.expect_begin().never();

        let service = ShortenerService::new(Arc::new(MockAliasRepository::new()), base())
            .with_transactions(Arc::new(runner));

        let err = service
            .batch(vec![
                BatchItem::new("1", "https://one.example.com"),
                BatchItem::new("2", "https://one.example.com"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::DuplicateInBatch(_)));
    }

    #[tokio::test]
    async fn test_batch_without_capability() {
        let service = ShortenerService::new(Arc::new(MockAliasRepository::new()), base());

        let err = service
            .batch(vec![BatchItem::new("1", "https://one.example.com")])
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::BatchUnsupported));
    }

    #[test]
    fn test_urls_diff_preserves_order() {
        let urls = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let records = vec![Record::new(1, "b", "x")];

        assert_eq!(urls_diff(&urls, &records), vec!["a", "c"]);
        assert_eq!(urls_diff(&urls, &[]), urls);
    }
}

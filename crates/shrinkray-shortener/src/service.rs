use crate::config::ShortenerConfig;
use crate::url::validate_url;
use async_trait::async_trait;
use shrinkray_core::{
    Shortened, Shortener, ShortenerError, Storage, StorageError, Token, UrlRecord,
};
use shrinkray_generator::Generator;
use std::future::Future;
use std::sync::Arc;

type Result<T> = std::result::Result<T, ShortenerError>;

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`Storage`] and a [`Generator`] to handle:
/// - URL validation
/// - Reusing the token of an already shortened URL
/// - Retrying generation until a free token is found
///
/// The service holds no state of its own; concurrency safety comes from the
/// storage backend rejecting conflicting saves.
#[derive(Debug)]
pub struct ShortenerService<S, G> {
    storage: Arc<S>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<S, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<S: Storage, G: Generator> ShortenerService<S, G> {
    pub fn new(storage: S, generator: G, config: ShortenerConfig) -> Self {
        Self::from_shared(Arc::new(storage), Arc::new(generator), config)
    }

    /// Creates a service over a storage the caller keeps a handle to,
    /// e.g. to close it on shutdown.
    pub fn from_shared(storage: Arc<S>, generator: Arc<G>, config: ShortenerConfig) -> Self {
        Self {
            storage,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    async fn with_deadline<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.deadline, operation)
            .await
            .map_err(|_| ShortenerError::Timeout(self.config.deadline))?
    }

    async fn find_or_create(&self, full_url: &str) -> Result<Shortened> {
        if let Some(token) = self.storage.find_token(full_url).await? {
            return Ok(Shortened {
                token,
                created: false,
            });
        }

        let mut attempts: u32 = 0;
        loop {
            if attempts > 0 {
                // a storage that never suspends would otherwise keep the
                // deadline timer from firing
                tokio::task::yield_now().await;
            }
            if let Some(max) = self.config.max_attempts {
                if attempts >= max.get() {
                    return Err(ShortenerError::TooManyCollisions(attempts));
                }
            }
            attempts += 1;

            let candidate = self.generator.generate()?;
            if self.storage.resolve(&candidate).await?.is_some() {
                continue;
            }

            match self.storage.save(full_url, &candidate).await {
                Ok(()) => {
                    return Ok(Shortened {
                        token: candidate,
                        created: true,
                    })
                }
                // taken between the check and the insert
                Err(StorageError::TokenConflict(_)) => continue,
                // another caller shortened the same URL first
                Err(StorageError::UrlConflict(url)) => {
                    return match self.storage.find_token(full_url).await? {
                        Some(token) => Ok(Shortened {
                            token,
                            created: false,
                        }),
                        None => Err(StorageError::UrlConflict(url).into()),
                    };
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn lookup(&self, token: Token) -> Result<UrlRecord> {
        self.storage
            .resolve(&token)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(token.into_string()))
    }
}

#[async_trait]
impl<S: Storage, G: Generator> Shortener for ShortenerService<S, G> {
    async fn shorten(&self, full_url: &str) -> Result<Shortened> {
        validate_url(full_url)?;
        self.with_deadline(self.find_or_create(full_url)).await
    }

    async fn resolve(&self, token: &str) -> Result<UrlRecord> {
        // a string without the token shape was never issued
        let Ok(token) = Token::parse(token) else {
            return Err(ShortenerError::NotFound(token.to_owned()));
        };
        self.with_deadline(self.lookup(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrinkray_core::storage::Result as StorageResult;
    use shrinkray_generator::{GeneratorError, RandomGenerator};
    use shrinkray_storage::InMemoryStorage;
    use std::collections::{HashSet, VecDeque};
    use std::num::NonZeroU32;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn test_service() -> ShortenerService<InMemoryStorage, RandomGenerator> {
        ShortenerService::new(
            InMemoryStorage::new(),
            RandomGenerator::new(),
            ShortenerConfig::default(),
        )
    }

    fn has_token_shape(raw: &str) -> bool {
        raw.len() == 10 && raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    /// Hands out a fixed sequence of tokens.
    struct ScriptedGenerator {
        tokens: Mutex<VecDeque<&'static str>>,
    }

    impl ScriptedGenerator {
        fn new(tokens: &[&'static str]) -> Self {
            Self {
                tokens: Mutex::new(tokens.iter().copied().collect()),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self) -> std::result::Result<Token, GeneratorError> {
            let next = self
                .tokens
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            Ok(Token::new_unchecked(next))
        }
    }

    struct BrokenGenerator;

    impl Generator for BrokenGenerator {
        fn generate(&self) -> std::result::Result<Token, GeneratorError> {
            Err(GeneratorError::Entropy("no entropy".to_string()))
        }
    }

    /// Counts calls into an in-memory storage.
    #[derive(Default)]
    struct Recording {
        inner: InMemoryStorage,
        saves: Mutex<Vec<(String, String)>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl Storage for Recording {
        async fn resolve(&self, token: &Token) -> StorageResult<Option<UrlRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(token).await
        }

        async fn find_token(&self, full_url: &str) -> StorageResult<Option<Token>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_token(full_url).await
        }

        async fn save(&self, full_url: &str, token: &Token) -> StorageResult<()> {
            self.saves
                .lock()
                .unwrap()
                .push((full_url.to_owned(), token.to_string()));
            self.inner.save(full_url, token).await
        }

        async fn close(&self) -> StorageResult<()> {
            self.inner.close().await
        }
    }

    /// Never answers.
    struct StalledStorage;

    #[async_trait]
    impl Storage for StalledStorage {
        async fn resolve(&self, _token: &Token) -> StorageResult<Option<UrlRecord>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn find_token(&self, _full_url: &str) -> StorageResult<Option<Token>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn save(&self, _full_url: &str, _token: &Token) -> StorageResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Fails every call.
    struct FailingStorage;

    #[async_trait]
    impl Storage for FailingStorage {
        async fn resolve(&self, _token: &Token) -> StorageResult<Option<UrlRecord>> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn find_token(&self, _full_url: &str) -> StorageResult<Option<Token>> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn save(&self, _full_url: &str, _token: &Token) -> StorageResult<()> {
            Err(StorageError::Query("insert failed".to_string()))
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Reports the URL as free, then loses the race on save.
    #[derive(Default)]
    struct RacingStorage {
        inner: InMemoryStorage,
        winner_saved: AtomicUsize,
    }

    #[async_trait]
    impl Storage for RacingStorage {
        async fn resolve(&self, token: &Token) -> StorageResult<Option<UrlRecord>> {
            self.inner.resolve(token).await
        }

        async fn find_token(&self, full_url: &str) -> StorageResult<Option<Token>> {
            if self.winner_saved.load(Ordering::SeqCst) == 0 {
                return Ok(None);
            }
            self.inner.find_token(full_url).await
        }

        async fn save(&self, full_url: &str, token: &Token) -> StorageResult<()> {
            if self.winner_saved.fetch_add(1, Ordering::SeqCst) == 0 {
                self.inner
                    .save(full_url, &Token::new_unchecked("winner0000"))
                    .await?;
            }
            self.inner.save(full_url, token).await
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Reports every token as free but rejects the first `conflicts` saves
    /// as if another writer took the token in between.
    struct SnatchingStorage {
        inner: Recording,
        conflicts: AtomicUsize,
    }

    impl SnatchingStorage {
        fn new(conflicts: usize) -> Self {
            Self {
                inner: Recording::default(),
                conflicts: AtomicUsize::new(conflicts),
            }
        }
    }

    #[async_trait]
    impl Storage for SnatchingStorage {
        async fn resolve(&self, _token: &Token) -> StorageResult<Option<UrlRecord>> {
            Ok(None)
        }

        async fn find_token(&self, full_url: &str) -> StorageResult<Option<Token>> {
            self.inner.find_token(full_url).await
        }

        async fn save(&self, full_url: &str, token: &Token) -> StorageResult<()> {
            let left = self.conflicts.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts.store(left - 1, Ordering::SeqCst);
                return Err(StorageError::TokenConflict(token.to_string()));
            }
            self.inner.save(full_url, token).await
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Always proposes the same token.
    struct FixedGenerator(&'static str);

    impl Generator for FixedGenerator {
        fn generate(&self) -> std::result::Result<Token, GeneratorError> {
            Ok(Token::new_unchecked(self.0))
        }
    }

    #[tokio::test]
    async fn shorten_issues_token_of_fixed_shape() {
        let service = test_service();

        let shortened = service.shorten("http://ya.ru").await.unwrap();
        assert!(shortened.created);
        assert!(has_token_shape(shortened.token.as_str()));
    }

    #[tokio::test]
    async fn shorten_is_idempotent() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(RandomGenerator::new()),
            ShortenerConfig::default(),
        );

        let first = service.shorten("https://example.com").await.unwrap();
        let second = service.shorten("https://example.com").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.token, second.token);
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_tokens() {
        let service = test_service();

        let a = service.shorten("https://a.example").await.unwrap();
        let b = service.shorten("https://b.example").await.unwrap();

        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn resolve_round_trips() {
        let service = test_service();
        let url = "https://example.com/path?query=1#frag";

        let shortened = service.shorten(url).await.unwrap();
        let record = service.resolve(shortened.token.as_str()).await.unwrap();

        assert_eq!(record.full_url, url);
        assert_eq!(record.token, shortened.token);
    }

    #[tokio::test]
    async fn ya_ru_scenario() {
        let service = test_service();

        let first = service.shorten("http://ya.ru").await.unwrap();
        assert!(has_token_shape(first.token.as_str()));

        let again = service.shorten("http://ya.ru").await.unwrap();
        assert_eq!(again.token, first.token);

        let record = service.resolve(first.token.as_str()).await.unwrap();
        assert_eq!(record.full_url, "http://ya.ru");

        let err = service.resolve("zzzzzzzzzz").await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_unknown_token_is_not_found() {
        let service = test_service();

        let err = service.resolve("abcdefghij").await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(ref t) if t == "abcdefghij"));
    }

    #[tokio::test]
    async fn resolve_malformed_token_skips_storage() {
        let storage = Arc::new(Recording::default());
        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(RandomGenerator::new()),
            ShortenerConfig::default(),
        );

        for raw in ["", "short", "has-dash!!", "favicon.ico"] {
            let err = service.resolve(raw).await.unwrap_err();
            assert!(matches!(err, ShortenerError::NotFound(_)));
        }
        assert_eq!(storage.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_storage_access() {
        let storage = Arc::new(Recording::default());
        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(RandomGenerator::new()),
            ShortenerConfig::default(),
        );

        let err = service.shorten("not a url").await.unwrap_err();

        assert!(matches!(err, ShortenerError::InvalidInput(_)));
        assert!(storage.saves.lock().unwrap().is_empty());
        assert_eq!(storage.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn collision_retries_and_saves_second_candidate() {
        let storage = Arc::new(Recording::default());
        storage
            .inner
            .save("https://taken.example", &Token::new_unchecked("takentaken"))
            .await
            .unwrap();

        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(ScriptedGenerator::new(&["takentaken", "freefree00"])),
            ShortenerConfig::default(),
        );

        let shortened = service.shorten("https://new.example").await.unwrap();

        assert_eq!(shortened.token.as_str(), "freefree00");
        assert!(shortened.created);
        let saves = storage.saves.lock().unwrap().clone();
        assert_eq!(
            saves,
            vec![("https://new.example".to_string(), "freefree00".to_string())]
        );
    }

    #[tokio::test]
    async fn retry_budget_is_enforced() {
        let storage = InMemoryStorage::new();
        storage
            .save("https://taken.example", &Token::new_unchecked("takentaken"))
            .await
            .unwrap();

        let service = ShortenerService::new(
            storage,
            ScriptedGenerator::new(&["takentaken"; 3]),
            ShortenerConfig::builder()
                .max_attempts(NonZeroU32::new(3))
                .build(),
        );

        let err = service.shorten("https://new.example").await.unwrap_err();
        assert!(matches!(err, ShortenerError::TooManyCollisions(3)));
    }

    #[tokio::test]
    async fn token_taken_before_save_is_retried() {
        let storage = Arc::new(SnatchingStorage::new(1));
        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(ScriptedGenerator::new(&["snatched00", "freefree00"])),
            ShortenerConfig::default(),
        );

        let shortened = service.shorten("https://new.example").await.unwrap();

        assert_eq!(shortened.token.as_str(), "freefree00");
        assert!(shortened.created);
        let saves = storage.inner.saves.lock().unwrap().clone();
        assert_eq!(
            saves,
            vec![("https://new.example".to_string(), "freefree00".to_string())]
        );
    }

    #[tokio::test]
    async fn save_conflicts_consume_retry_budget() {
        let service = ShortenerService::new(
            SnatchingStorage::new(usize::MAX),
            ScriptedGenerator::new(&["snatched00", "snatched01"]),
            ShortenerConfig::builder()
                .max_attempts(NonZeroU32::new(2))
                .build(),
        );

        let err = service.shorten("https://new.example").await.unwrap_err();
        assert!(matches!(err, ShortenerError::TooManyCollisions(2)));
    }

    #[tokio::test]
    async fn unbounded_retries_stop_at_deadline() {
        let storage = InMemoryStorage::new();
        storage
            .save("https://taken.example", &Token::new_unchecked("takentaken"))
            .await
            .unwrap();

        let deadline = Duration::from_millis(50);
        let service = ShortenerService::new(
            storage,
            FixedGenerator("takentaken"),
            ShortenerConfig::builder()
                .deadline(deadline)
                .max_attempts(None)
                .build(),
        );

        let err = service.shorten("https://new.example").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Timeout(d) if d == deadline));
    }

    #[tokio::test]
    async fn generator_failure_is_surfaced() {
        let service = ShortenerService::new(
            InMemoryStorage::new(),
            BrokenGenerator,
            ShortenerConfig::default(),
        );

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Entropy(_)));
    }

    #[tokio::test]
    async fn stalled_storage_times_out() {
        let deadline = Duration::from_millis(20);
        let service = ShortenerService::new(
            StalledStorage,
            RandomGenerator::new(),
            ShortenerConfig::builder().deadline(deadline).build(),
        );

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Timeout(d) if d == deadline));

        let err = service.resolve("abcdefghij").await.unwrap_err();
        assert!(matches!(err, ShortenerError::Timeout(_)));
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let service = ShortenerService::new(
            FailingStorage,
            RandomGenerator::new(),
            ShortenerConfig::default(),
        );

        let err = service.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Unavailable(_))
        ));

        let err = service.resolve("abcdefghij").await.unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn lost_race_returns_winner_token() {
        let service = ShortenerService::new(
            RacingStorage::default(),
            ScriptedGenerator::new(&["loser00000"]),
            ShortenerConfig::default(),
        );

        let shortened = service.shorten("https://example.com").await.unwrap();

        assert_eq!(shortened.token.as_str(), "winner0000");
        assert!(!shortened.created);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_shortening_of_one_url_yields_one_token() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = ShortenerService::from_shared(
            Arc::clone(&storage),
            Arc::new(RandomGenerator::new()),
            ShortenerConfig::default(),
        );

        let mut handles = vec![];
        for _ in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.shorten("https://same.example").await.unwrap()
            }));
        }

        let mut tokens = HashSet::new();
        let mut created = 0;
        for handle in handles {
            let shortened = handle.await.unwrap();
            created += usize::from(shortened.created);
            tokens.insert(shortened.token);
        }

        assert_eq!(tokens.len(), 1);
        assert_eq!(created, 1);
        assert_eq!(storage.len(), 1);
    }
}

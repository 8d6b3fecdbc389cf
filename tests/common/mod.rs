#![allow(dead_code)]

use alias_shortener::application::services::ShortenerService;
use alias_shortener::domain::repositories::{Pinger, RepositoryError, RepositoryResult};
use alias_shortener::infrastructure::persistence::InMemoryRepository;
use alias_shortener::routes::router;
use alias_shortener::state::AppState;
use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::Arc;
use url::Url;

pub const BASE_URL: &str = "http://localhost:8080/";

/// State backed by a fresh in-memory repository.
pub fn memory_state(base_url: &str) -> (AppState, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let shortener = ShortenerService::new(repo.clone(), Url::parse(base_url).unwrap())
        .with_batch(repo.clone());
    (AppState::new(Arc::new(shortener), None), repo)
}

/// Full router over a fresh in-memory repository.
pub fn test_server() -> (TestServer, Arc<InMemoryRepository>) {
    let (state, repo) = memory_state(BASE_URL);
    (TestServer::new(router(state)).unwrap(), repo)
}

/// Strips the base URL from a composed link.
pub fn alias_of(link: &str) -> &str {
    link.strip_prefix(BASE_URL).unwrap()
}

/// Pinger with a fixed answer.
pub struct StaticPinger(pub bool);

#[async_trait]
impl Pinger for StaticPinger {
    async fn ping(&self) -> RepositoryResult<()> {
        if self.0 {
            Ok(())
        } else {
            Err(RepositoryError::Timeout("ping".into()))
        }
    }
}

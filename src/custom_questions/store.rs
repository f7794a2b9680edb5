use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sqlx::{Pool, Postgres};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    common::error::ServerError,
    custom_questions::{
        db,
        models::{NewTopic, TopicResponse},
    },
    health,
};

/// Persistence seam for the custom-questions API.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Newest first, questions by `order_index`.
    async fn list(&self) -> Result<Vec<TopicResponse>, ServerError>;

    /// Stores the topic and its questions as one unit.
    async fn create(&self, topic: NewTopic) -> Result<TopicResponse, ServerError>;

    /// Deletes every topic whose title matches exactly. Unknown titles yield 0.
    async fn delete_by_title(&self, title: &str) -> Result<u64, ServerError>;

    async fn health_check(&self) -> bool;
}

pub struct PgTopicStore {
    pool: Pool<Postgres>,
}

impl PgTopicStore {
    pub async fn connect(connection_string: &str) -> Result<Self, ServerError> {
        let pool = Pool::<Postgres>::connect(connection_string).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Connected to postgres and applied migrations");

        Ok(Self { pool })
    }
}

#[async_trait]
impl TopicStore for PgTopicStore {
    async fn list(&self) -> Result<Vec<TopicResponse>, ServerError> {
        db::list_topics(&self.pool).await
    }

    async fn create(&self, topic: NewTopic) -> Result<TopicResponse, ServerError> {
        let mut tx = self.pool.begin().await?;
        let created = db::tx_create_topic(&mut tx, &topic).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn delete_by_title(&self, title: &str) -> Result<u64, ServerError> {
        Ok(db::delete_topics_by_title(&self.pool, title).await?)
    }

    async fn health_check(&self) -> bool {
        match health::db::health_check(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }
}

/// Process-local store used when no database is configured.
#[derive(Clone, Default)]
pub struct MemoryTopicStore {
    topics: Arc<DashMap<Uuid, (u64, TopicResponse)>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryTopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[async_trait]
impl TopicStore for MemoryTopicStore {
    async fn list(&self) -> Result<Vec<TopicResponse>, ServerError> {
        let mut topics: Vec<(u64, TopicResponse)> = self
            .topics
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        topics.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(topics.into_iter().map(|(_, topic)| topic).collect())
    }

    async fn create(&self, topic: NewTopic) -> Result<TopicResponse, ServerError> {
        let id = Uuid::new_v4();
        let created = TopicResponse {
            id,
            questions: topic.questions_for(id),
            title: topic.title,
            timer_seconds: topic.timer_seconds,
            created_at: Utc::now(),
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.topics.insert(id, (seq, created.clone()));

        Ok(created)
    }

    async fn delete_by_title(&self, title: &str) -> Result<u64, ServerError> {
        let mut deleted = 0;
        self.topics.retain(|_, (_, topic)| {
            let keep = topic.title != title;
            if !keep {
                deleted += 1;
            }
            keep
        });

        Ok(deleted)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_questions::models::CreateItem;

    fn new_topic(title: &str) -> NewTopic {
        NewTopic {
            title: title.into(),
            timer_seconds: 60,
            items: vec![CreateItem {
                question: "Capital of France?".into(),
                answer: "Paris".into(),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryTopicStore::new();
        store.create(new_topic("First")).await.unwrap();
        store.create(new_topic("Second")).await.unwrap();

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();

        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn delete_removes_every_exact_title_match() {
        let store = MemoryTopicStore::new();
        store.create(new_topic("History")).await.unwrap();
        store.create(new_topic("History")).await.unwrap();
        store.create(new_topic("history")).await.unwrap();

        assert_eq!(store.delete_by_title("History").await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.delete_by_title("NoSuchTitle").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_count_holds_under_concurrent_creates() {
        let store = MemoryTopicStore::new();

        let creator = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    store.create(new_topic("Capitals")).await.unwrap();
                }
            })
        };

        let deleter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut total = 0;
                for _ in 0..2_000 {
                    total += store.delete_by_title("NoSuchTitle").await.unwrap();
                }
                total
            })
        };

        creator.await.unwrap();
        assert_eq!(deleter.await.unwrap(), 0);
        assert_eq!(store.len(), 2_000);
        assert_eq!(store.delete_by_title("Capitals").await.unwrap(), 2_000);
        assert!(store.is_empty());
    }
}

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    common::error::ServerError,
    custom_questions::models::{NewTopic, Question, TopicResponse, TopicRow},
};

pub async fn list_topics(pool: &Pool<Postgres>) -> Result<Vec<TopicResponse>, ServerError> {
    let topics = sqlx::query_as::<_, TopicRow>(
        r#"
        SELECT id, title, timer_seconds, created_at
        FROM "topic"
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    if topics.is_empty() {
        return Ok(Vec::new());
    }

    let topic_ids: Vec<Uuid> = topics.iter().map(|t| t.id).collect();
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, topic_id, prompt, hint1, hint2, hint3, answer, order_index
        FROM "question"
        WHERE topic_id = ANY($1)
        ORDER BY order_index ASC
        "#,
    )
    .bind(&topic_ids)
    .fetch_all(pool)
    .await?;

    let mut by_topic: HashMap<Uuid, Vec<Question>> = HashMap::new();
    for question in questions {
        by_topic.entry(question.topic_id).or_default().push(question);
    }

    let page = topics
        .into_iter()
        .map(|row| {
            let questions = by_topic.remove(&row.id).unwrap_or_default();
            TopicResponse::from_row(row, questions)
        })
        .collect();

    Ok(page)
}

pub async fn tx_create_topic(
    tx: &mut Transaction<'_, Postgres>,
    topic: &NewTopic,
) -> Result<TopicResponse, ServerError> {
    let row = sqlx::query_as::<_, TopicRow>(
        r#"
        INSERT INTO "topic" (id, title, timer_seconds, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, timer_seconds, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&topic.title)
    .bind(topic.timer_seconds)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    let questions = topic.questions_for(row.id);

    let mut builder = QueryBuilder::<Postgres>::new(
        r#"INSERT INTO "question" (id, topic_id, prompt, hint1, hint2, hint3, answer, order_index) "#,
    );
    builder.push_values(questions.iter(), |mut b, q| {
        b.push_bind(q.id)
            .push_bind(q.topic_id)
            .push_bind(q.prompt.clone())
            .push_bind(q.hint1.clone())
            .push_bind(q.hint2.clone())
            .push_bind(q.hint3.clone())
            .push_bind(q.answer.clone())
            .push_bind(q.order_index);
    });

    let inserted = builder.build().execute(&mut **tx).await?;
    if inserted.rows_affected() != questions.len() as u64 {
        error!(
            "Inserted {} of {} questions for topic {}",
            inserted.rows_affected(),
            questions.len(),
            row.id
        );
        return Err(ServerError::Internal("Failed to persist questions".into()));
    }

    debug!("Created topic {} with {} questions", row.id, questions.len());
    Ok(TopicResponse::from_row(row, questions))
}

/// Removes every topic with exactly this title. Questions go with them
/// through the foreign key cascade.
pub async fn delete_topics_by_title(
    pool: &Pool<Postgres>,
    title: &str,
) -> Result<u64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        DELETE FROM "topic"
        WHERE title = $1
        "#,
    )
    .bind(title)
    .execute(pool)
    .await?;

    Ok(row.rows_affected())
}

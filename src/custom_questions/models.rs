use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::common::error::ServerError;

pub const MIN_TIMER_SECONDS: i32 = 10;
pub const MAX_TIMER_SECONDS: i32 = 3600;
pub const DEFAULT_TIMER_SECONDS: i32 = 300;

pub fn clamp_timer_seconds(seconds: i64) -> i32 {
    seconds.clamp(MIN_TIMER_SECONDS as i64, MAX_TIMER_SECONDS as i64) as i32
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct TopicRow {
    pub id: Uuid,
    pub title: String,
    pub timer_seconds: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub prompt: String,
    pub hint1: Option<String>,
    pub hint2: Option<String>,
    pub hint3: Option<String>,
    pub answer: String,
    pub order_index: i32,
}

/// Wire shape of a stored topic, questions ordered by `orderIndex`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub id: Uuid,
    pub title: String,
    pub timer_seconds: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl TopicResponse {
    pub fn from_row(row: TopicRow, mut questions: Vec<Question>) -> Self {
        questions.sort_by_key(|q| q.order_index);
        Self {
            id: row.id,
            title: row.title,
            timer_seconds: row.timer_seconds,
            created_at: row.created_at,
            questions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timer_seconds: Option<i64>,
    #[serde(default)]
    pub items: Vec<CreateItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CreateItem {
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint3: Option<String>,
    #[serde(default)]
    pub answer: String,
}

/// A create request that passed validation. Timer is clamped and empty
/// hints are dropped.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub title: String,
    pub timer_seconds: i32,
    pub items: Vec<CreateItem>,
}

impl CreateTopicRequest {
    /// Reads a loosely typed body. Scalars are stringified, a missing or
    /// non-array `items` becomes empty, and a `timerSeconds` that is not a
    /// number (or numeric string) falls back to the default.
    pub fn from_value(body: &Value) -> Self {
        let items = match body.get("items") {
            Some(Value::Array(items)) => items.iter().map(CreateItem::from_value).collect(),
            _ => Vec::new(),
        };

        Self {
            title: coerce_string(body.get("title")).unwrap_or_default(),
            timer_seconds: coerce_seconds(body.get("timerSeconds")),
            items,
        }
    }

    pub fn validate(self) -> Result<NewTopic, ServerError> {
        if self.title.trim().is_empty() {
            return Err(ServerError::Validation("title is required".into()));
        }

        if self.items.is_empty() {
            return Err(ServerError::Validation(
                "items must be a non-empty array".into(),
            ));
        }

        if self
            .items
            .iter()
            .any(|i| i.question.is_empty() || i.answer.is_empty())
        {
            return Err(ServerError::Validation(
                "each item requires question and answer".into(),
            ));
        }

        let timer_seconds =
            clamp_timer_seconds(self.timer_seconds.unwrap_or(DEFAULT_TIMER_SECONDS as i64));

        let items = self
            .items
            .into_iter()
            .map(|item| CreateItem {
                hint1: non_empty(item.hint1),
                hint2: non_empty(item.hint2),
                hint3: non_empty(item.hint3),
                ..item
            })
            .collect();

        Ok(NewTopic {
            title: self.title,
            timer_seconds,
            items,
        })
    }
}

impl NewTopic {
    pub fn questions_for(&self, topic_id: Uuid) -> Vec<Question> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| Question {
                id: Uuid::new_v4(),
                topic_id,
                prompt: item.question.clone(),
                hint1: item.hint1.clone(),
                hint2: item.hint2.clone(),
                hint3: item.hint3.clone(),
                answer: item.answer.clone(),
                order_index: idx as i32,
            })
            .collect()
    }
}

impl CreateItem {
    fn from_value(item: &Value) -> Self {
        Self {
            question: coerce_string(item.get("question")).unwrap_or_default(),
            hint1: coerce_string(item.get("hint1")),
            hint2: coerce_string(item.get("hint2")),
            hint3: coerce_string(item.get("hint3")),
            answer: coerce_string(item.get("answer")).unwrap_or_default(),
        }
    }
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn coerce_seconds(value: Option<&Value>) -> Option<i64> {
    let seconds = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    seconds.is_finite().then_some(seconds as i64)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTopicQuery {
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeleteTopicResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(question: &str, answer: &str) -> CreateItem {
        CreateItem {
            question: question.into(),
            answer: answer.into(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_title_is_rejected() {
        let request = CreateTopicRequest {
            title: "   ".into(),
            timer_seconds: None,
            items: vec![item("q", "a")],
        };

        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn empty_items_are_rejected() {
        let request = CreateTopicRequest {
            title: "History".into(),
            ..Default::default()
        };

        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "items must be a non-empty array");
    }

    #[test]
    fn item_without_answer_is_rejected() {
        let request = CreateTopicRequest {
            title: "History".into(),
            timer_seconds: Some(60),
            items: vec![item("q1", "a1"), item("q2", "")],
        };

        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "each item requires question and answer");
    }

    #[test]
    fn timer_defaults_and_clamps() {
        let base = CreateTopicRequest {
            title: "History".into(),
            timer_seconds: None,
            items: vec![item("q", "a")],
        };

        assert_eq!(base.clone().validate().unwrap().timer_seconds, 300);

        let low = CreateTopicRequest {
            timer_seconds: Some(1),
            ..base.clone()
        };
        assert_eq!(low.validate().unwrap().timer_seconds, 10);

        let high = CreateTopicRequest {
            timer_seconds: Some(99_999),
            ..base
        };
        assert_eq!(high.validate().unwrap().timer_seconds, 3600);
    }

    #[test]
    fn empty_hints_are_dropped_and_order_is_kept() {
        let request = CreateTopicRequest {
            title: "History".into(),
            timer_seconds: Some(60),
            items: vec![
                CreateItem {
                    hint1: Some(String::new()),
                    hint2: Some("think rome".into()),
                    ..item("q1", "a1")
                },
                item("q2", "a2"),
            ],
        };

        let topic = request.validate().unwrap();
        let topic_id = Uuid::new_v4();
        let questions = topic.questions_for(topic_id);

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].hint1, None);
        assert_eq!(questions[0].hint2.as_deref(), Some("think rome"));
        assert_eq!(questions[1].order_index, 1);
        assert!(questions.iter().all(|q| q.topic_id == topic_id));
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let request: CreateTopicRequest = serde_json::from_value(serde_json::json!({
            "title": "History",
            "timerSeconds": 60,
            "items": [{ "question": "Capital of France?", "hint1": "Eiffel", "answer": "Paris" }]
        }))
        .unwrap();

        assert_eq!(request.timer_seconds, Some(60));
        assert_eq!(request.items[0].hint1.as_deref(), Some("Eiffel"));
        assert_eq!(request.items[0].hint2, None);
    }

    #[test]
    fn loose_body_is_coerced() {
        let request = CreateTopicRequest::from_value(&serde_json::json!({
            "title": 1066,
            "timerSeconds": "90",
            "items": [{ "question": "Year of Hastings?", "hint1": null, "answer": 1066 }]
        }));

        assert_eq!(request.title, "1066");
        assert_eq!(request.timer_seconds, Some(90));
        assert_eq!(request.items[0].answer, "1066");
        assert_eq!(request.items[0].hint1, None);
    }

    #[test]
    fn non_array_items_become_empty() {
        for items in [Value::Null, serde_json::json!("q"), serde_json::json!({ "question": "q" })] {
            let request = CreateTopicRequest::from_value(&serde_json::json!({
                "title": "History",
                "timerSeconds": "soon",
                "items": items
            }));

            assert!(request.items.is_empty());
            assert_eq!(request.timer_seconds, None);
            let err = request.validate().unwrap_err();
            assert_eq!(err.to_string(), "items must be a non-empty array");
        }
    }
}

use core::fmt;

use crate::custom_questions::models::{
    CreateItem, DEFAULT_TIMER_SECONDS, TopicResponse, clamp_timer_seconds,
};

/// Every topic is played as exactly this many stages.
pub const STAGE_COUNT: usize = 4;

pub const WRONG_ANSWER_MESSAGE: &str = "The answer is not correct.";
pub const MISSING_TOPIC_NAME_MESSAGE: &str = "Please enter a topic name.";
pub const INCOMPLETE_ITEM_MESSAGE: &str = "Please fill in both the question and the answer.";
pub const EMPTY_TOPIC_MESSAGE: &str = "This topic has no questions.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardItem {
    pub question: String,
    pub hints: [String; 3],
    pub answer: String,
}

impl WizardItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Default::default()
        }
    }

    pub fn with_hints(mut self, hints: [&str; 3]) -> Self {
        self.hints = hints.map(String::from);
        self
    }

    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }

    pub fn to_create_item(&self) -> CreateItem {
        let [hint1, hint2, hint3] = self
            .hints
            .clone()
            .map(|h| if h.is_empty() { None } else { Some(h) });

        CreateItem {
            question: self.question.clone(),
            hint1,
            hint2,
            hint3,
            answer: self.answer.clone(),
        }
    }
}

/// A saved question set as the game sees it. Listed topics may carry fewer
/// than [`STAGE_COUNT`] items; they are padded when played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    pub timer_seconds: i32,
    pub items: Vec<WizardItem>,
}

impl Topic {
    pub fn padded_items(&self) -> [WizardItem; STAGE_COUNT] {
        std::array::from_fn(|i| self.items.get(i).cloned().unwrap_or_default())
    }

    pub fn clamped_timer_seconds(&self) -> i32 {
        clamp_timer_seconds(self.timer_seconds as i64)
    }
}

impl From<TopicResponse> for Topic {
    fn from(topic: TopicResponse) -> Self {
        let timer_seconds = match topic.timer_seconds {
            0 => DEFAULT_TIMER_SECONDS,
            n => n,
        };

        let items = topic
            .questions
            .into_iter()
            .map(|q| WizardItem {
                question: q.prompt,
                hints: [
                    q.hint1.unwrap_or_default(),
                    q.hint2.unwrap_or_default(),
                    q.hint3.unwrap_or_default(),
                ],
                answer: q.answer,
            })
            .collect();

        Self {
            title: topic.title,
            timer_seconds,
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Mode,
    CustomEntry,
    TopicName,
    Wizard,
    PrevTopics,
    Game,
    Bad,
    Good,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Mode => write!(f, "mode"),
            Flow::CustomEntry => write!(f, "customEntry"),
            Flow::TopicName => write!(f, "topicName"),
            Flow::Wizard => write!(f, "wizard"),
            Flow::PrevTopics => write!(f, "prevTopics"),
            Flow::Game => write!(f, "game"),
            Flow::Bad => write!(f, "bad"),
            Flow::Good => write!(f, "good"),
        }
    }
}

/// Floating panel opened from a hotspot during a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Qa,
    Hint1,
    Hint2,
    Hint3,
}

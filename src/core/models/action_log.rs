use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// The object an audit log entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "content_type", content = "object_id", rename_all = "snake_case")]
pub enum LogSubject {
    Event(i32),
    Question(i32),
    AnswerOption(i32),
    Submission(i32),
    Person(i32),
    Review(i32),
}

impl LogSubject {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::Question(_) => "question",
            Self::AnswerOption(_) => "answer_option",
            Self::Submission(_) => "submission",
            Self::Person(_) => "person",
            Self::Review(_) => "review",
        }
    }

    pub fn object_id(self) -> i32 {
        match self {
            Self::Event(id) | Self::Question(id) | Self::AnswerOption(id) | Self::Submission(id) | Self::Person(id) | Self::Review(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActionLog {
    pub id: i32,
    pub event_id: i32,
    pub person_id: Option<i32>,
    pub action_type: String,
    pub content_type: String,
    pub object_id: i32,
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub event_id: i32,
    pub person_id: Option<i32>,
    pub action_type: String,
    pub subject: LogSubject,
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

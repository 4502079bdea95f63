use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow, Default)]
pub struct Event {
    pub id: i32,
    pub slug: String,
    pub name: String,
}

impl Event {
    pub fn scope(&self) -> EventScope {
        EventScope {
            event_id: self.id,
            slug: self.slug.clone(),
        }
    }
}

/// The event every query runs against. Passed explicitly to each store call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventScope {
    pub event_id: i32,
    pub slug: String,
}

impl EventScope {
    pub fn new(event_id: i32, slug: impl Into<String>) -> Self {
        Self { event_id, slug: slug.into() }
    }

    pub fn cfp_questions_url(&self) -> String {
        format!("/orga/event/{}/cfp/questions/", self.slug)
    }
}


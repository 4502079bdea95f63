use crate::core::models::i18n::I18nText;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;

pub const LOG_PREFIX: &str = "cfp.question.option";

/// One selectable choice of a `choices` or `multiple_choice` question.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnswerOption {
    pub id: i32,
    pub question_id: i32,
    pub answer: Json<I18nText>,
    pub position: i32,
}

impl AnswerOption {
    pub fn label(&self, locale: &str) -> &str {
        self.answer.localize(locale)
    }

    pub fn order_key(&self) -> (i32, i32) {
        (self.position, self.id)
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.answer.0)
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub question_id: i32,
    pub answer: I18nText,
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Create {
    pub answer: I18nText,
    pub position: Option<i32>,
}

#[derive(Debug, Default)]
pub struct Query {
    pub question_id: Option<i32>,
    pub id_in: Option<Vec<i32>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Query {
    pub fn matches(&self, option: &AnswerOption) -> bool {
        self.question_id.map_or(true, |q| q == option.question_id) && self.id_in.as_ref().map_or(true, |ids| ids.contains(&option.id))
    }
}

#![allow(async_fn_in_trait)]

use crate::core::models::{
    action_log::Insert as ActionLogInsert,
    answer::{Answer, Insert as AnswerInsert, Query as AnswerQuery, Update as AnswerUpdate},
    common::Pagination,
    event::{Event, EventScope},
    option::{AnswerOption, Insert as OptionInsert, Query as OptionQuery},
    question::{Insert as QuestionInsert, Query as QuestionQuery, Question, Settings as QuestionSettings},
    AnswerSubject,
};
use crate::error::Error;

pub trait EventCommon {
    async fn get(&mut self, id: i32) -> Result<Event, Error>;
    async fn get_by_slug(&mut self, slug: &str) -> Result<Event, Error>;
}

pub trait QuestionCommon {
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error>;
    async fn update(&mut self, id: i32, settings: QuestionSettings) -> Result<(), Error>;
    async fn get(&mut self, scope: &EventScope, id: i32) -> Result<Question, Error>;
    async fn query(&mut self, scope: &EventScope, query: &QuestionQuery, pagination: Option<Pagination>) -> Result<Vec<Question>, Error>;
    async fn count(&mut self, scope: &EventScope, query: &QuestionQuery) -> Result<i64, Error>;
    async fn set_active(&mut self, id: i32, active: bool) -> Result<(), Error>;
    async fn set_position(&mut self, id: i32, position: i32) -> Result<(), Error>;
    /// Fails with `Error::Integrity` while options or answers reference the question.
    async fn delete(&mut self, id: i32) -> Result<(), Error>;
}

pub trait OptionCommon {
    async fn insert(&mut self, option: OptionInsert) -> Result<i32, Error>;
    async fn query(&mut self, query: OptionQuery) -> Result<Vec<AnswerOption>, Error>;
    async fn count(&mut self, query: OptionQuery) -> Result<i64, Error>;
    async fn is_belongs_to_question(&mut self, question_id: i32, ids: Vec<i32>) -> Result<bool, Error>;
    /// Fails with `Error::Integrity` while answers reference the option.
    async fn delete(&mut self, id: i32) -> Result<(), Error>;
}

pub trait AnswerCommon {
    async fn insert(&mut self, answer: AnswerInsert) -> Result<i32, Error>;
    async fn update(&mut self, id: i32, answer: AnswerUpdate) -> Result<(), Error>;
    async fn get(&mut self, id: i32) -> Result<Answer, Error>;
    async fn find(&mut self, question_id: i32, subject: AnswerSubject) -> Result<Option<Answer>, Error>;
    async fn count(&mut self, query: AnswerQuery) -> Result<i64, Error>;
    /// Attached options in attachment order.
    async fn options(&mut self, id: i32) -> Result<Vec<AnswerOption>, Error>;
    async fn attach(&mut self, id: i32, option_id: i32) -> Result<(), Error>;
    async fn detach(&mut self, id: i32, option_id: i32) -> Result<(), Error>;
    async fn delete(&mut self, id: i32) -> Result<(), Error>;
}

/// Submissions and their speakers live outside this crate; only counts are needed.
pub trait SubjectCommon {
    async fn count_submissions(&mut self, event_id: i32) -> Result<i64, Error>;
    async fn count_speakers(&mut self, event_id: i32) -> Result<i64, Error>;
}

pub trait ActionLogCommon {
    async fn insert(&mut self, log: ActionLogInsert) -> Result<i32, Error>;
}

pub trait Common: EventCommon + QuestionCommon + OptionCommon + AnswerCommon + SubjectCommon + ActionLogCommon {}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

pub trait Manager<'m, S, T>
where
    S: Store,
    T: TxStore,
{
    async fn db(&'m self) -> Result<S, Error>;
    async fn tx(&'m self) -> Result<T, Error>;
}

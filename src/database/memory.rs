//! Transactional in-memory store used by the service tests. Restrict foreign
//! keys are checked the way the Postgres schema does.

use crate::core::models::{
    action_log::{ActionLog, Insert as ActionLogInsert},
    answer::{Answer, Insert as AnswerInsert, Query as AnswerQuery, Update as AnswerUpdate},
    common::Pagination,
    event::{Event, EventScope},
    option::{AnswerOption, Insert as OptionInsert, Query as OptionQuery},
    question::{Insert as QuestionInsert, Query as QuestionQuery, Question, Settings as QuestionSettings},
    AnswerSubject,
};
use crate::core::ports::repository::{
    ActionLogCommon, AnswerCommon, Common, EventCommon, Manager, OptionCommon, QuestionCommon, Store, SubjectCommon, TxStore,
};
use crate::core::uploader::Uploader;
use crate::error::Error;
use itertools::Itertools;
use sqlx::types::Json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct Submission {
    id: i32,
    event_id: i32,
    speakers: Vec<i32>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    id: i32,
    answer_id: i32,
    option_id: i32,
}

#[derive(Debug, Clone, Default)]
struct State {
    next_id: i32,
    events: Vec<Event>,
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
    answers: Vec<Answer>,
    links: Vec<Link>,
    submissions: Vec<Submission>,
    logs: Vec<ActionLog>,
    failing_detach: Option<i32>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn question_mut(&mut self, id: i32) -> Result<&mut Question, Error> {
        self.questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| Error::NotFound(format!("question {}", id)))
    }
}

fn apply(question: &mut Question, settings: QuestionSettings) {
    let bounds = settings.bounds;
    question.variant = settings.variant;
    question.target = settings.target;
    question.question = Json(settings.question);
    question.help_text = settings.help_text.map(Json);
    question.default_answer = settings.default_answer;
    question.question_required = settings.question_required;
    question.deadline = settings.deadline;
    question.freeze_after = settings.freeze_after;
    question.position = settings.position;
    question.active = settings.active;
    question.contains_personal_data = settings.contains_personal_data;
    question.min_length = bounds.min_length;
    question.max_length = bounds.max_length;
    question.min_number = bounds.min_number;
    question.max_number = bounds.max_number;
    question.min_date = bounds.min_date;
    question.max_date = bounds.max_date;
    question.min_datetime = bounds.min_datetime;
    question.max_datetime = bounds.max_datetime;
    question.is_public = settings.is_public;
    question.is_visible_to_reviewers = settings.is_visible_to_reviewers;
    question.icon = settings.icon;
    question.tracks = settings.tracks;
    question.submission_types = settings.submission_types;
}

/// Uploader for tests that never touch files.
pub(crate) struct NoUploads;

impl Uploader for NoUploads {
    fn put(&self, _path: &str, _content: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("/media/{}", path)
    }

    fn delete(&self, _path: &str) -> Result<(), Error> {
        Ok(())
    }
}

pub(crate) struct MemoryManager {
    shared: Arc<Mutex<State>>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn add_event(&self, slug: &str) -> EventScope {
        let mut state = self.shared.lock().unwrap();
        let id = state.next_id();
        let event = Event {
            id,
            slug: slug.into(),
            name: slug.to_uppercase(),
        };
        let scope = event.scope();
        state.events.push(event);
        scope
    }

    pub fn add_submission(&self, id: i32, event_id: i32, speakers: &[i32]) {
        self.shared.lock().unwrap().submissions.push(Submission {
            id,
            event_id,
            speakers: speakers.to_vec(),
        });
    }

    /// Reverse side of the answer/option link.
    pub fn answers_of_option(&self, option_id: i32) -> Vec<i32> {
        let state = self.shared.lock().unwrap();
        state.links.iter().filter(|l| l.option_id == option_id).map(|l| l.answer_id).collect()
    }

    pub fn fail_detach_of(&self, option_id: i32) {
        self.shared.lock().unwrap().failing_detach = Some(option_id);
    }

    pub fn logs(&self) -> Vec<ActionLog> {
        self.shared.lock().unwrap().logs.clone()
    }
}

/// Works on the shared state directly, or on a private snapshot inside a transaction.
pub(crate) struct MemoryStore {
    shared: Arc<Mutex<State>>,
    tx: Option<State>,
}

impl MemoryStore {
    fn with<R>(&mut self, f: impl FnOnce(&mut State) -> R) -> R {
        match &mut self.tx {
            Some(state) => f(state),
            None => f(&mut *self.shared.lock().unwrap()),
        }
    }
}

impl EventCommon for MemoryStore {
    async fn get(&mut self, id: i32) -> Result<Event, Error> {
        self.with(|s| s.events.iter().find(|e| e.id == id).cloned().ok_or_else(|| Error::NotFound(format!("event {}", id))))
    }

    async fn get_by_slug(&mut self, slug: &str) -> Result<Event, Error> {
        self.with(|s| s.events.iter().find(|e| e.slug == slug).cloned().ok_or_else(|| Error::NotFound(format!("event {}", slug))))
    }
}

impl QuestionCommon for MemoryStore {
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error> {
        self.with(|s| {
            if !s.events.iter().any(|e| e.id == question.event_id) {
                return Err(Error::Integrity(format!("event {} does not exist", question.event_id)));
            }
            let id = s.next_id();
            let mut row = crate::core::models::question::sample(id, question.event_id);
            apply(&mut row, question.settings);
            s.questions.push(row);
            Ok(id)
        })
    }

    async fn update(&mut self, id: i32, settings: QuestionSettings) -> Result<(), Error> {
        self.with(|s| {
            apply(s.question_mut(id)?, settings);
            Ok(())
        })
    }

    async fn get(&mut self, scope: &EventScope, id: i32) -> Result<Question, Error> {
        self.with(|s| {
            s.questions
                .iter()
                .find(|q| q.id == id && q.event_id == scope.event_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("question {}", id)))
        })
    }

    async fn query(&mut self, scope: &EventScope, query: &QuestionQuery, pagination: Option<Pagination>) -> Result<Vec<Question>, Error> {
        let questions: Vec<Question> = self.with(|s| {
            s.questions
                .iter()
                .filter(|q| q.event_id == scope.event_id && query.matches(q))
                .cloned()
                .sorted_by_key(Question::order_key)
                .collect()
        });
        Ok(match pagination {
            Some(p) => p.apply(questions),
            None => questions,
        })
    }

    async fn count(&mut self, scope: &EventScope, query: &QuestionQuery) -> Result<i64, Error> {
        self.with(|s| Ok(s.questions.iter().filter(|q| q.event_id == scope.event_id && query.matches(q)).count() as i64))
    }

    async fn set_active(&mut self, id: i32, active: bool) -> Result<(), Error> {
        self.with(|s| {
            s.question_mut(id)?.active = active;
            Ok(())
        })
    }

    async fn set_position(&mut self, id: i32, position: i32) -> Result<(), Error> {
        self.with(|s| {
            s.question_mut(id)?.position = position;
            Ok(())
        })
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        self.with(|s| {
            if s.options.iter().any(|o| o.question_id == id) || s.answers.iter().any(|a| a.question_id == id) {
                return Err(Error::Integrity(format!("question {} is still referenced", id)));
            }
            s.question_mut(id)?;
            s.questions.retain(|q| q.id != id);
            Ok(())
        })
    }
}

impl OptionCommon for MemoryStore {
    async fn insert(&mut self, option: OptionInsert) -> Result<i32, Error> {
        self.with(|s| {
            if !s.questions.iter().any(|q| q.id == option.question_id) {
                return Err(Error::Integrity(format!("question {} does not exist", option.question_id)));
            }
            let id = s.next_id();
            s.options.push(AnswerOption {
                id,
                question_id: option.question_id,
                answer: Json(option.answer),
                position: option.position,
            });
            Ok(id)
        })
    }

    async fn query(&mut self, query: OptionQuery) -> Result<Vec<AnswerOption>, Error> {
        let options: Vec<AnswerOption> = self.with(|s| s.options.iter().filter(|o| query.matches(o)).cloned().sorted_by_key(AnswerOption::order_key).collect());
        Ok(match query.limit {
            Some(limit) => Pagination::new(limit, query.offset).apply(options),
            None => options,
        })
    }

    async fn count(&mut self, query: OptionQuery) -> Result<i64, Error> {
        self.with(|s| Ok(s.options.iter().filter(|o| query.matches(o)).count() as i64))
    }

    async fn is_belongs_to_question(&mut self, question_id: i32, ids: Vec<i32>) -> Result<bool, Error> {
        self.with(|s| Ok(ids.iter().all(|id| s.options.iter().any(|o| o.id == *id && o.question_id == question_id))))
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        self.with(|s| {
            if s.links.iter().any(|l| l.option_id == id) {
                return Err(Error::Integrity(format!("answer option {} is still referenced", id)));
            }
            if !s.options.iter().any(|o| o.id == id) {
                return Err(Error::NotFound(format!("answer option {}", id)));
            }
            s.options.retain(|o| o.id != id);
            Ok(())
        })
    }
}

impl AnswerCommon for MemoryStore {
    async fn insert(&mut self, answer: AnswerInsert) -> Result<i32, Error> {
        self.with(|s| {
            if !s.questions.iter().any(|q| q.id == answer.question_id) {
                return Err(Error::Integrity(format!("question {} does not exist", answer.question_id)));
            }
            let id = s.next_id();
            s.answers.push(Answer {
                id,
                question_id: answer.question_id,
                submission_id: answer.subject.submission_id(),
                person_id: answer.subject.person_id(),
                review_id: answer.subject.review_id(),
                answer: answer.answer,
                answer_file: answer.answer_file,
            });
            Ok(id)
        })
    }

    async fn update(&mut self, id: i32, update: AnswerUpdate) -> Result<(), Error> {
        self.with(|s| {
            let answer = s.answers.iter_mut().find(|a| a.id == id).ok_or_else(|| Error::NotFound(format!("answer {}", id)))?;
            answer.answer = update.answer;
            answer.answer_file = update.answer_file;
            Ok(())
        })
    }

    async fn get(&mut self, id: i32) -> Result<Answer, Error> {
        self.with(|s| s.answers.iter().find(|a| a.id == id).cloned().ok_or_else(|| Error::NotFound(format!("answer {}", id))))
    }

    async fn find(&mut self, question_id: i32, subject: AnswerSubject) -> Result<Option<Answer>, Error> {
        self.with(|s| Ok(s.answers.iter().find(|a| a.question_id == question_id && a.subject() == Some(subject)).cloned()))
    }

    async fn count(&mut self, query: AnswerQuery) -> Result<i64, Error> {
        self.with(|s| Ok(s.answers.iter().filter(|a| query.matches(a)).count() as i64))
    }

    async fn options(&mut self, id: i32) -> Result<Vec<AnswerOption>, Error> {
        self.with(|s| {
            Ok(s.links
                .iter()
                .filter(|l| l.answer_id == id)
                .sorted_by_key(|l| l.id)
                .filter_map(|l| s.options.iter().find(|o| o.id == l.option_id).cloned())
                .collect())
        })
    }

    async fn attach(&mut self, id: i32, option_id: i32) -> Result<(), Error> {
        self.with(|s| {
            if !s.options.iter().any(|o| o.id == option_id) || !s.answers.iter().any(|a| a.id == id) {
                return Err(Error::Integrity(format!("cannot link answer {} to option {}", id, option_id)));
            }
            let link = s.next_id();
            s.links.push(Link {
                id: link,
                answer_id: id,
                option_id,
            });
            Ok(())
        })
    }

    async fn detach(&mut self, id: i32, option_id: i32) -> Result<(), Error> {
        self.with(|s| {
            if s.failing_detach == Some(option_id) {
                return Err(Error::Database(sqlx::Error::Protocol(format!("detaching option {} failed", option_id))));
            }
            s.links.retain(|l| !(l.answer_id == id && l.option_id == option_id));
            Ok(())
        })
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        self.with(|s| {
            if s.links.iter().any(|l| l.answer_id == id) {
                return Err(Error::Integrity(format!("answer {} is still linked to options", id)));
            }
            if !s.answers.iter().any(|a| a.id == id) {
                return Err(Error::NotFound(format!("answer {}", id)));
            }
            s.answers.retain(|a| a.id != id);
            Ok(())
        })
    }
}

impl SubjectCommon for MemoryStore {
    async fn count_submissions(&mut self, event_id: i32) -> Result<i64, Error> {
        self.with(|s| Ok(s.submissions.iter().filter(|sub| sub.event_id == event_id).count() as i64))
    }

    async fn count_speakers(&mut self, event_id: i32) -> Result<i64, Error> {
        self.with(|s| {
            Ok(s.submissions
                .iter()
                .filter(|sub| sub.event_id == event_id)
                .flat_map(|sub| sub.speakers.iter())
                .unique()
                .count() as i64)
        })
    }
}

impl ActionLogCommon for MemoryStore {
    async fn insert(&mut self, log: ActionLogInsert) -> Result<i32, Error> {
        self.with(|s| {
            let id = s.next_id();
            s.logs.push(ActionLog {
                id,
                event_id: log.event_id,
                person_id: log.person_id,
                action_type: log.action_type,
                content_type: log.subject.content_type().into(),
                object_id: log.subject.object_id(),
                data: log.data,
                timestamp: log.timestamp,
            });
            Ok(id)
        })
    }
}

impl Common for MemoryStore {}
impl Store for MemoryStore {}

impl TxStore for MemoryStore {
    async fn commit(mut self) -> Result<(), Error> {
        if let Some(state) = self.tx.take() {
            *self.shared.lock().unwrap() = state;
        }
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), Error> {
        self.tx = None;
        Ok(())
    }
}

impl<'m> Manager<'m, MemoryStore, MemoryStore> for MemoryManager {
    async fn db(&'m self) -> Result<MemoryStore, Error> {
        Ok(MemoryStore {
            shared: self.shared.clone(),
            tx: None,
        })
    }

    async fn tx(&'m self) -> Result<MemoryStore, Error> {
        let snapshot = self.shared.lock().unwrap().clone();
        Ok(MemoryStore {
            shared: self.shared.clone(),
            tx: Some(snapshot),
        })
    }
}

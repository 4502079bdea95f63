use crate::core::models::action_log::LogSubject;
use crate::core::models::choices::{QuestionTarget, QuestionVariant};
use crate::core::models::i18n::yes_no;
use crate::core::models::option::AnswerOption;
use crate::core::models::question::Question;
use crate::core::models::upload_file::UploadedFileCreate;
use crate::core::uploader::Uploader;
use crate::error::Error;
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TRUE: &str = "True";
pub const FALSE: &str = "False";

/// A recorded response to a question. Exactly one of `submission_id`,
/// `person_id` and `review_id` is set, matching the question's target.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Answer {
    pub id: i32,
    pub question_id: i32,
    pub submission_id: Option<i32>,
    pub person_id: Option<i32>,
    pub review_id: Option<i32>,
    pub answer: String,
    pub answer_file: Option<String>,
}

/// Yes / No / not answered. Not collapsed into a plain bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BooleanAnswer {
    Yes,
    No,
    Unanswered,
}

impl BooleanAnswer {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Unanswered => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AnswerSubject {
    Submission(i32),
    Person(i32),
    Review(i32),
}

impl AnswerSubject {
    pub fn target(self) -> QuestionTarget {
        match self {
            Self::Submission(_) => QuestionTarget::Submission,
            Self::Person(_) => QuestionTarget::Speaker,
            Self::Review(_) => QuestionTarget::Reviewer,
        }
    }

    pub fn matches(self, target: QuestionTarget) -> bool {
        self.target() == target
    }

    pub fn submission_id(self) -> Option<i32> {
        match self {
            Self::Submission(id) => Some(id),
            _ => None,
        }
    }

    pub fn person_id(self) -> Option<i32> {
        match self {
            Self::Person(id) => Some(id),
            _ => None,
        }
    }

    pub fn review_id(self) -> Option<i32> {
        match self {
            Self::Review(id) => Some(id),
            _ => None,
        }
    }
}

impl From<AnswerSubject> for LogSubject {
    fn from(subject: AnswerSubject) -> Self {
        match subject {
            AnswerSubject::Submission(id) => LogSubject::Submission(id),
            AnswerSubject::Person(id) => LogSubject::Person(id),
            AnswerSubject::Review(id) => LogSubject::Review(id),
        }
    }
}

impl Answer {
    pub fn subject(&self) -> Option<AnswerSubject> {
        match (self.submission_id, self.person_id, self.review_id) {
            (Some(id), None, None) => Some(AnswerSubject::Submission(id)),
            (None, Some(id), None) => Some(AnswerSubject::Person(id)),
            (None, None, Some(id)) => Some(AnswerSubject::Review(id)),
            _ => None,
        }
    }

    pub fn boolean_answer(&self) -> BooleanAnswer {
        match self.answer.as_str() {
            TRUE => BooleanAnswer::Yes,
            FALSE => BooleanAnswer::No,
            _ => BooleanAnswer::Unanswered,
        }
    }

    /// Human readable answer. `options` are the attached options in
    /// attachment order; they are ignored for non-choice variants.
    pub fn answer_string<U>(&self, variant: QuestionVariant, options: &[AnswerOption], uploader: &U, locale: &str) -> String
    where
        U: Uploader + ?Sized,
    {
        match variant {
            QuestionVariant::Number | QuestionVariant::String | QuestionVariant::Text | QuestionVariant::Url => self.answer.clone(),
            QuestionVariant::Date | QuestionVariant::Datetime => self.answer.clone(),
            QuestionVariant::Boolean => self.boolean_answer().as_bool().map(|v| yes_no(v, locale).to_owned()).unwrap_or_default(),
            QuestionVariant::File => self.answer_file.as_deref().map(|path| uploader.url(path)).unwrap_or_default(),
            QuestionVariant::Choices | QuestionVariant::MultipleChoice => options.iter().map(|o| o.label(locale)).join(", "),
        }
    }

    pub fn is_answered<U>(&self, variant: QuestionVariant, options: &[AnswerOption], uploader: &U, locale: &str) -> bool
    where
        U: Uploader + ?Sized,
    {
        !self.answer_string(variant, options, uploader, locale).is_empty()
    }

    /// Audit log subject used when the caller does not name one.
    pub fn log_subject(&self, target: QuestionTarget) -> Option<LogSubject> {
        match target {
            QuestionTarget::Speaker => self.person_id.map(LogSubject::Person),
            QuestionTarget::Submission => self.submission_id.map(LogSubject::Submission),
            QuestionTarget::Reviewer => self.review_id.map(LogSubject::Review),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub question_id: i32,
    pub subject: AnswerSubject,
    pub answer: String,
    pub answer_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub answer: String,
    pub answer_file: Option<String>,
}

/// A submitted answer before it is validated and stored.
#[derive(Debug)]
pub struct Submit {
    pub question_id: i32,
    pub subject: AnswerSubject,
    pub answer: String,
    pub option_ids: Vec<i32>,
    pub file: Option<UploadedFileCreate>,
}

/// Answers to one question, optionally narrowed to people OR submissions.
#[derive(Debug, Default)]
pub struct Query {
    pub question_id_eq: Option<i32>,
    pub person_in: Option<Vec<i32>>,
    pub submission_in: Option<Vec<i32>>,
    pub answer_file_eq: Option<String>,
}

impl Query {
    pub fn matches(&self, answer: &Answer) -> bool {
        if self.question_id_eq.map_or(false, |q| q != answer.question_id) {
            return false;
        }
        if let Some(file) = &self.answer_file_eq {
            if answer.answer_file.as_ref() != Some(file) {
                return false;
            }
        }
        if self.person_in.is_none() && self.submission_in.is_none() {
            return true;
        }
        let by_person = match (&self.person_in, answer.person_id) {
            (Some(ids), Some(id)) => ids.contains(&id),
            _ => false,
        };
        let by_submission = match (&self.submission_in, answer.submission_id) {
            (Some(ids), Some(id)) => ids.contains(&id),
            _ => false,
        };
        by_person || by_submission
    }
}

fn bounded<T: PartialOrd + std::fmt::Display>(value: T, min: Option<T>, max: Option<T>) -> Result<(), Error> {
    if let Some(min) = min {
        if value < min {
            return Err(Error::BusinessError(format!("answer must be at least {}", min)));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(Error::BusinessError(format!("answer must be at most {}", max)));
        }
    }
    Ok(())
}

/// Checks a payload against the question's variant, bounds and required state
/// and returns the trimmed text. Only the returned text may be stored.
pub fn validate_payload(question: &Question, answer: &str, option_ids: &[i32], has_file: bool, now: DateTime<Utc>) -> Result<String, Error> {
    let value = answer.trim();
    check_value(question, value, option_ids, has_file, now)?;
    Ok(value.to_owned())
}

fn check_value(question: &Question, value: &str, option_ids: &[i32], has_file: bool, now: DateTime<Utc>) -> Result<(), Error> {
    if question.read_only(now) {
        return Err(Error::Frozen(question.id));
    }
    if !question.variant.is_choice() && !option_ids.is_empty() {
        return Err(Error::BusinessError(format!("{} questions take no options", question.variant)));
    }
    let answered = match question.variant {
        QuestionVariant::File => has_file,
        QuestionVariant::Choices | QuestionVariant::MultipleChoice => !option_ids.is_empty(),
        _ => !value.is_empty(),
    };
    if !answered {
        if question.required(now) {
            return Err(Error::BusinessError(format!("question {} requires an answer", question.id)));
        }
        return Ok(());
    }
    match question.variant {
        QuestionVariant::Number => {
            let number: f64 = value
                .parse()
                .map_err(|_| Error::BusinessError(format!("{} is not a number", value)))?;
            if !number.is_finite() {
                return Err(Error::BusinessError(format!("{} is not a finite number", value)));
            }
            bounded(number, question.min_number, question.max_number)
        }
        QuestionVariant::String | QuestionVariant::Text => {
            let length = value.chars().count() as i32;
            if question.min_length.map_or(false, |min| length < min) {
                return Err(Error::BusinessError(format!("answer is shorter than {} characters", question.min_length.unwrap_or_default())));
            }
            if question.max_length.map_or(false, |max| length > max) {
                return Err(Error::BusinessError(format!("answer is longer than {} characters", question.max_length.unwrap_or_default())));
            }
            Ok(())
        }
        QuestionVariant::Url => {
            let rest = value.strip_prefix("https://").or_else(|| value.strip_prefix("http://"));
            match rest {
                Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
                _ => Err(Error::BusinessError(format!("{} is not a valid url", value))),
            }
        }
        QuestionVariant::Date => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| Error::BusinessError(format!("{} is not a date", value)))?;
            bounded(date, question.min_date, question.max_date)
        }
        QuestionVariant::Datetime => {
            let datetime = DateTime::parse_from_rfc3339(value)
                .map_err(|_| Error::BusinessError(format!("{} is not a datetime", value)))?
                .with_timezone(&Utc);
            bounded(datetime, question.min_datetime, question.max_datetime)
        }
        QuestionVariant::Boolean => match value {
            TRUE | FALSE => Ok(()),
            _ => Err(Error::BusinessError(format!("{} is not a boolean answer", value))),
        },
        QuestionVariant::File => Ok(()),
        QuestionVariant::Choices => {
            if option_ids.len() != 1 {
                return Err(Error::BusinessError("exactly one option must be chosen".into()));
            }
            Ok(())
        }
        QuestionVariant::MultipleChoice => Ok(()),
    }
}

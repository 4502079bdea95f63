use crate::core::models::choices::{QuestionIcon, QuestionRequired, QuestionTarget, QuestionVariant};
use crate::core::models::event::EventScope;
use crate::core::models::i18n::I18nText;
use crate::core::models::option::Create as OptionCreate;
use crate::error::Error;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;

pub const LOG_PREFIX: &str = "cfp.question";

/// A configurable field asked per submission, per speaker, or of reviewers.
///
/// `question_required` and `deadline` together decide whether the field is
/// mandatory at a given time; `freeze_after` turns it read-only. The bounds
/// only apply to the variant they belong to (lengths to string and text,
/// numbers to number, and so on).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
    pub id: i32,
    pub event_id: i32,
    pub variant: QuestionVariant,
    pub target: QuestionTarget,
    pub deadline: Option<DateTime<Utc>>,
    pub freeze_after: Option<DateTime<Utc>>,
    pub question_required: QuestionRequired,
    pub question: Json<I18nText>,
    pub help_text: Option<Json<I18nText>>,
    pub default_answer: Option<String>,
    pub position: i32,
    pub active: bool,
    pub contains_personal_data: bool,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub min_number: Option<f64>,
    pub max_number: Option<f64>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub min_datetime: Option<DateTime<Utc>>,
    pub max_datetime: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub is_visible_to_reviewers: bool,
    pub icon: Option<QuestionIcon>,
    pub tracks: Vec<i32>,
    pub submission_types: Vec<i32>,
}

impl Question {
    /// A frozen question never demands an answer.
    pub fn required(&self, now: DateTime<Utc>) -> bool {
        if self.read_only(now) {
            return false;
        }
        match self.question_required {
            QuestionRequired::Required => true,
            QuestionRequired::AfterDeadline => self.deadline.map_or(false, |deadline| deadline <= now),
            QuestionRequired::Optional => false,
        }
    }

    pub fn read_only(&self, now: DateTime<Utc>) -> bool {
        self.freeze_after.map_or(false, |freeze_after| freeze_after <= now)
    }

    pub fn icon_url(&self, event: &EventScope) -> Option<String> {
        self.icon.map(|_| format!("/api/events/{}/questions/{}/icon/", event.slug, self.id))
    }

    pub fn urls(&self, event: &EventScope) -> QuestionUrls {
        let questions = event.cfp_questions_url();
        let base = format!("{}{}/", questions, self.id);
        QuestionUrls {
            edit: format!("{}edit/", base),
            delete: format!("{}delete/", base),
            toggle: format!("{}{}/toggle/", questions, self.id),
            base,
        }
    }

    /// Empty limit sets apply to every track / session type.
    pub fn applies_to(&self, track_id: Option<i32>, submission_type_id: Option<i32>) -> bool {
        let track_ok = self.tracks.is_empty() || track_id.map_or(false, |t| self.tracks.contains(&t));
        let type_ok = self.submission_types.is_empty() || submission_type_id.map_or(false, |t| self.submission_types.contains(&t));
        track_ok && type_ok
    }

    pub fn label(&self, locale: &str) -> &str {
        self.question.localize(locale)
    }

    pub fn order_key(&self) -> (i32, i32) {
        (self.position, self.id)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_length: self.min_length,
            max_length: self.max_length,
            min_number: self.min_number,
            max_number: self.max_number,
            min_date: self.min_date,
            max_date: self.max_date,
            min_datetime: self.min_datetime,
            max_datetime: self.max_datetime,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.question.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionUrls {
    pub base: String,
    pub edit: String,
    pub delete: String,
    pub toggle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub min_number: Option<f64>,
    pub max_number: Option<f64>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub min_datetime: Option<DateTime<Utc>>,
    pub max_datetime: Option<DateTime<Utc>>,
}

fn ordered<T: PartialOrd + fmt::Debug>(name: &str, min: Option<T>, max: Option<T>) -> Result<(), Error> {
    if let (Some(min), Some(max)) = (&min, &max) {
        if min > max {
            return Err(Error::BusinessError(format!("min_{} ({:?}) is greater than max_{} ({:?})", name, min, name, max)));
        }
    }
    Ok(())
}

fn only_for(name: &str, set: bool, variant: QuestionVariant, allowed: &[QuestionVariant]) -> Result<(), Error> {
    if set && !allowed.contains(&variant) {
        return Err(Error::BusinessError(format!("{} bounds do not apply to {} questions", name, variant)));
    }
    Ok(())
}

impl Bounds {
    pub fn validate(&self, variant: QuestionVariant) -> Result<(), Error> {
        if self.min_length.map_or(false, |v| v < 0) || self.max_length.map_or(false, |v| v < 0) {
            return Err(Error::BusinessError("length bounds must not be negative".into()));
        }
        ordered("length", self.min_length, self.max_length)?;
        ordered("number", self.min_number, self.max_number)?;
        ordered("date", self.min_date, self.max_date)?;
        ordered("datetime", self.min_datetime, self.max_datetime)?;
        only_for(
            "length",
            self.min_length.is_some() || self.max_length.is_some(),
            variant,
            &[QuestionVariant::String, QuestionVariant::Text],
        )?;
        only_for("number", self.min_number.is_some() || self.max_number.is_some(), variant, &[QuestionVariant::Number])?;
        only_for("date", self.min_date.is_some() || self.max_date.is_some(), variant, &[QuestionVariant::Date])?;
        only_for(
            "datetime",
            self.min_datetime.is_some() || self.max_datetime.is_some(),
            variant,
            &[QuestionVariant::Datetime],
        )?;
        Ok(())
    }
}

/// Organizer-editable settings, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub variant: QuestionVariant,
    pub target: QuestionTarget,
    pub question: I18nText,
    pub help_text: Option<I18nText>,
    pub default_answer: Option<String>,
    pub question_required: QuestionRequired,
    pub deadline: Option<DateTime<Utc>>,
    pub freeze_after: Option<DateTime<Utc>>,
    pub position: i32,
    pub active: bool,
    pub contains_personal_data: bool,
    #[serde(default)]
    pub bounds: Bounds,
    pub is_public: bool,
    pub is_visible_to_reviewers: bool,
    pub icon: Option<QuestionIcon>,
    #[serde(default)]
    pub tracks: Vec<i32>,
    #[serde(default)]
    pub submission_types: Vec<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: QuestionVariant::default(),
            target: QuestionTarget::default(),
            question: I18nText::default(),
            help_text: None,
            default_answer: None,
            question_required: QuestionRequired::default(),
            deadline: None,
            freeze_after: None,
            position: 0,
            active: true,
            contains_personal_data: true,
            bounds: Bounds::default(),
            is_public: false,
            is_visible_to_reviewers: true,
            icon: None,
            tracks: Vec::new(),
            submission_types: Vec::new(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.question.is_empty() {
            return Err(Error::BusinessError("question label must not be empty".into()));
        }
        if self.question_required == QuestionRequired::AfterDeadline && self.deadline.is_none() {
            return Err(Error::BusinessError("a deadline is required for questions required after a deadline".into()));
        }
        self.bounds.validate(self.variant)
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub event_id: i32,
    pub settings: Settings,
}

#[derive(Debug, Deserialize)]
pub struct Create {
    pub settings: Settings,
    #[serde(default)]
    pub options: Vec<OptionCreate>,
}

/// `Visible` mirrors the default listing: active, non-reviewer questions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSet {
    #[default]
    Visible,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub set: QuestionSet,
    pub target_eq: Option<QuestionTarget>,
    pub variant_eq: Option<QuestionVariant>,
    pub is_public_eq: Option<bool>,
    pub track_id: Option<i32>,
    pub submission_type_id: Option<i32>,
}

impl Query {
    pub fn all() -> Self {
        Self {
            set: QuestionSet::All,
            ..default::default()
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        if self.set == QuestionSet::Visible && (!question.active || question.target == QuestionTarget::Reviewer) {
            return false;
        }
        if self.target_eq.map_or(false, |t| t != question.target) {
            return false;
        }
        if self.variant_eq.map_or(false, |v| v != question.variant) {
            return false;
        }
        if self.is_public_eq.map_or(false, |p| p != question.is_public) {
            return false;
        }
        if let Some(track) = self.track_id {
            if !question.tracks.is_empty() && !question.tracks.contains(&track) {
                return false;
            }
        }
        if let Some(st) = self.submission_type_id {
            if !question.submission_types.is_empty() && !question.submission_types.contains(&st) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
pub(crate) fn sample(id: i32, event_id: i32) -> Question {
    Question {
        id,
        event_id,
        variant: QuestionVariant::String,
        target: QuestionTarget::Submission,
        deadline: None,
        freeze_after: None,
        question_required: QuestionRequired::Optional,
        question: Json(I18nText::from("Question")),
        help_text: None,
        default_answer: None,
        position: 0,
        active: true,
        contains_personal_data: true,
        min_length: None,
        max_length: None,
        min_number: None,
        max_number: None,
        min_date: None,
        max_date: None,
        min_datetime: None,
        max_datetime: None,
        is_public: false,
        is_visible_to_reviewers: true,
        icon: None,
        tracks: Vec::new(),
        submission_types: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn required_after_deadline_flips_at_deadline() {
        let mut q = sample(1, 1);
        q.question_required = QuestionRequired::AfterDeadline;
        q.deadline = Some(t0());
        assert!(!q.required(t0() - Duration::seconds(1)));
        assert!(q.required(t0()));
        assert!(q.required(t0() + Duration::days(3)));
    }

    #[test]
    fn frozen_question_is_never_required() {
        for required in QuestionRequired::ALL {
            let mut q = sample(1, 1);
            q.question_required = required;
            q.deadline = Some(t0() - Duration::days(1));
            q.freeze_after = Some(t0());
            assert!(q.read_only(t0()));
            assert!(!q.required(t0()));
            assert!(!q.required(t0() + Duration::hours(1)));
        }
    }

    #[test]
    fn read_only_before_freeze_is_false() {
        let mut q = sample(1, 1);
        q.question_required = QuestionRequired::Required;
        q.freeze_after = Some(t0());
        assert!(!q.read_only(t0() - Duration::minutes(1)));
        assert!(q.required(t0() - Duration::minutes(1)));
    }

    #[test]
    fn optional_is_never_required() {
        let q = sample(1, 1);
        assert!(!q.required(t0()));
    }

    #[test]
    fn urls_and_icon() {
        let scope = EventScope::new(1, "democon");
        let mut q = sample(7, 1);
        assert_eq!(q.icon_url(&scope), None);
        q.icon = Some(QuestionIcon::Github);
        assert_eq!(q.icon_url(&scope).as_deref(), Some("/api/events/democon/questions/7/icon/"));
        let urls = q.urls(&scope);
        assert_eq!(urls.base, "/orga/event/democon/cfp/questions/7/");
        assert_eq!(urls.edit, "/orga/event/democon/cfp/questions/7/edit/");
        assert_eq!(urls.delete, "/orga/event/democon/cfp/questions/7/delete/");
        assert_eq!(urls.toggle, "/orga/event/democon/cfp/questions/7/toggle/");
    }

    #[test]
    fn empty_limits_apply_to_everything() {
        let mut q = sample(1, 1);
        assert!(q.applies_to(None, None));
        assert!(q.applies_to(Some(3), Some(4)));
        q.tracks = vec![3];
        assert!(q.applies_to(Some(3), None));
        assert!(!q.applies_to(Some(2), None));
        assert!(!q.applies_to(None, None));
    }

    #[test]
    fn after_deadline_needs_deadline() {
        let settings = Settings {
            question: "Shirt size".into(),
            question_required: QuestionRequired::AfterDeadline,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        let settings = Settings { deadline: Some(t0()), ..settings };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn bounds_must_match_variant_and_order() {
        let bounds = Bounds {
            min_number: Some(5.0),
            max_number: Some(1.0),
            ..Bounds::default()
        };
        assert!(bounds.validate(QuestionVariant::Number).is_err());
        let bounds = Bounds {
            min_number: Some(1.0),
            ..Bounds::default()
        };
        assert!(bounds.validate(QuestionVariant::Number).is_ok());
        assert!(bounds.validate(QuestionVariant::Text).is_err());
        let bounds = Bounds {
            max_length: Some(200),
            ..Bounds::default()
        };
        assert!(bounds.validate(QuestionVariant::Text).is_ok());
        assert!(bounds.validate(QuestionVariant::Date).is_err());
    }

    #[test]
    fn visible_set_hides_inactive_and_reviewer_questions() {
        let mut inactive = sample(1, 1);
        inactive.active = false;
        let mut reviewer = sample(2, 1);
        reviewer.target = QuestionTarget::Reviewer;
        let plain = sample(3, 1);
        let visible = Query::default();
        assert!(!visible.matches(&inactive));
        assert!(!visible.matches(&reviewer));
        assert!(visible.matches(&plain));
        let all = Query::all();
        assert!(all.matches(&inactive) && all.matches(&reviewer));
    }
}

use crate::core::models::event::EventScope;
use crate::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    IsCfpOpen,
    IsAgendaVisible,
    OrgaCanChangeSubmissions,
    IsReviewer,
    CanChangeEventSettings,
}

impl Predicate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsCfpOpen => "is_cfp_open",
            Self::IsAgendaVisible => "is_agenda_visible",
            Self::OrgaCanChangeSubmissions => "orga_can_change_submissions",
            Self::IsReviewer => "is_reviewer",
            Self::CanChangeEventSettings => "can_change_event_settings",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user a check runs for; `None` is an anonymous visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor {
    pub user_id: Option<i32>,
}

impl Actor {
    pub fn user(id: i32) -> Self {
        Self { user_id: Some(id) }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn subject(&self) -> String {
        match self.user_id {
            Some(id) => format!("user:{}", id),
            None => "anonymous".to_owned(),
        }
    }
}

/// Answers whether a single predicate holds for an actor within an event.
pub trait PermissionOracle {
    fn holds(&self, predicate: Predicate, actor: &Actor, scope: &EventScope) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    OrgaList,
    View,
    OrgaView,
    Create,
    Update,
    Delete,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Question,
    AnswerOption,
    Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Any(&'static [Predicate]),
    All(&'static [Predicate]),
}

impl Rule {
    pub fn evaluate<O>(self, oracle: &O, actor: &Actor, scope: &EventScope) -> bool
    where
        O: PermissionOracle + ?Sized,
    {
        match self {
            Self::Any(predicates) => predicates.iter().any(|p| oracle.holds(*p, actor, scope)),
            Self::All(predicates) => predicates.iter().all(|p| oracle.holds(*p, actor, scope)),
        }
    }
}

const PUBLIC_VIEW: Rule = Rule::Any(&[
    Predicate::IsCfpOpen,
    Predicate::IsAgendaVisible,
    Predicate::OrgaCanChangeSubmissions,
    Predicate::IsReviewer,
]);
const ORGA_VIEW: Rule = Rule::Any(&[Predicate::OrgaCanChangeSubmissions]);
const CHANGE_SETTINGS: Rule = Rule::Any(&[Predicate::CanChangeEventSettings]);
const ANSWER_API: Rule = Rule::All(&[Predicate::CanChangeEventSettings, Predicate::OrgaCanChangeSubmissions]);

/// Options share the question table.
pub fn question_rule(action: Action) -> Option<Rule> {
    match action {
        Action::List | Action::View => Some(PUBLIC_VIEW),
        Action::OrgaList | Action::OrgaView => Some(ORGA_VIEW),
        Action::Create | Action::Update | Action::Delete => Some(CHANGE_SETTINGS),
        Action::Api => None,
    }
}

pub fn answer_rule(action: Action) -> Option<Rule> {
    match action {
        Action::Api => Some(ANSWER_API),
        _ => None,
    }
}

pub fn rule(resource: Resource, action: Action) -> Option<Rule> {
    match resource {
        Resource::Question | Resource::AnswerOption => question_rule(action),
        Resource::Answer => answer_rule(action),
    }
}

/// Actions without a rule are denied.
pub fn authorize<O>(oracle: &O, resource: Resource, action: Action, actor: &Actor, scope: &EventScope) -> Result<(), Error>
where
    O: PermissionOracle + ?Sized,
{
    match rule(resource, action) {
        Some(r) if r.evaluate(oracle, actor, scope) => Ok(()),
        _ => {
            log::warn!("{} denied {:?} on {:?} in {}", actor.subject(), action, resource, scope.slug);
            Err(Error::Forbidden)
        }
    }
}

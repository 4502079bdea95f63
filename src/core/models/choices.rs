use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(sqlx::Type)]
#[sqlx(type_name = "question_variant")]
#[sqlx(rename_all = "snake_case")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionVariant {
    Number,
    #[default]
    String,
    Text,
    Url,
    Date,
    Datetime,
    Boolean,
    File,
    Choices,
    MultipleChoice,
}

impl QuestionVariant {
    pub const ALL: [QuestionVariant; 10] = [
        Self::Number,
        Self::String,
        Self::Text,
        Self::Url,
        Self::Date,
        Self::Datetime,
        Self::Boolean,
        Self::File,
        Self::Choices,
        Self::MultipleChoice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Text => "text",
            Self::Url => "url",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::File => "file",
            Self::Choices => "choices",
            Self::MultipleChoice => "multiple_choice",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "Text (one-line)",
            Self::Text => "Multi-line text",
            Self::Url => "URL",
            Self::Date => "Date",
            Self::Datetime => "Date and time",
            Self::Boolean => "Yes/No",
            Self::File => "File upload",
            Self::Choices => "Choose one from a list",
            Self::MultipleChoice => "Choose multiple from a list",
        }
    }

    /// Answers rendered inline. Booleans are neither short nor long.
    pub fn is_short_answer(self) -> bool {
        matches!(
            self,
            Self::Number | Self::String | Self::Url | Self::Date | Self::Datetime | Self::File | Self::Choices | Self::MultipleChoice
        )
    }

    pub fn is_long_answer(self) -> bool {
        self == Self::Text
    }

    pub fn is_choice(self) -> bool {
        matches!(self, Self::Choices | Self::MultipleChoice)
    }
}

#[derive(sqlx::Type)]
#[sqlx(type_name = "question_target")]
#[sqlx(rename_all = "snake_case")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTarget {
    #[default]
    Submission,
    Speaker,
    Reviewer,
}

impl QuestionTarget {
    pub const ALL: [QuestionTarget; 3] = [Self::Submission, Self::Speaker, Self::Reviewer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Speaker => "speaker",
            Self::Reviewer => "reviewer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Submission => "per proposal",
            Self::Speaker => "per speaker",
            Self::Reviewer => "for reviewers",
        }
    }
}

#[derive(sqlx::Type)]
#[sqlx(type_name = "question_required")]
#[sqlx(rename_all = "snake_case")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRequired {
    #[default]
    Optional,
    Required,
    AfterDeadline,
}

impl QuestionRequired {
    pub const ALL: [QuestionRequired; 3] = [Self::Optional, Self::Required, Self::AfterDeadline];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::AfterDeadline => "after_deadline",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Optional => "always optional",
            Self::Required => "always required",
            Self::AfterDeadline => "required after a deadline",
        }
    }
}

#[derive(sqlx::Type)]
#[sqlx(type_name = "question_icon")]
#[sqlx(rename_all = "snake_case")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIcon {
    Discord,
    Github,
    Instagram,
    Linkedin,
    Mastodon,
    Twitter,
    Web,
    Youtube,
}

impl QuestionIcon {
    pub const ALL: [QuestionIcon; 8] = [
        Self::Discord,
        Self::Github,
        Self::Instagram,
        Self::Linkedin,
        Self::Mastodon,
        Self::Twitter,
        Self::Web,
        Self::Youtube,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Github => "github",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
            Self::Mastodon => "mastodon",
            Self::Twitter => "twitter",
            Self::Web => "web",
            Self::Youtube => "youtube",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Discord => "Discord",
            Self::Github => "GitHub",
            Self::Instagram => "Instagram",
            Self::Linkedin => "LinkedIn",
            Self::Mastodon => "Mastodon",
            Self::Twitter => "Twitter",
            Self::Web => "Website",
            Self::Youtube => "YouTube",
        }
    }
}

macro_rules! string_choice {
    ($ty:ident, $name:literal) => {
        impl FromStr for $ty {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| Error::BusinessError(format!("invalid {}({})", $name, s)))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_choice!(QuestionVariant, "question variant");
string_choice!(QuestionTarget, "question target");
string_choice!(QuestionRequired, "question required");
string_choice!(QuestionIcon, "question icon");

pub mod action_log;
pub mod answer;
pub mod choices;
pub mod common;
pub mod event;
pub mod i18n;
pub mod option;
pub mod question;
pub mod upload_file;

pub use action_log::{ActionLog, LogSubject};
pub use answer::{Answer, AnswerSubject, BooleanAnswer};
pub use choices::{QuestionIcon, QuestionRequired, QuestionTarget, QuestionVariant};
pub use event::{Event, EventScope};
pub use i18n::I18nText;
pub use option::AnswerOption;
pub use question::Question;

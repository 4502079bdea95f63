use crate::core::models::{
    action_log::LogSubject,
    answer::{validate_payload, Answer, BooleanAnswer, Insert as AnswerInsert, Query as AnswerQuery, Submit as AnswerSubmit, Update as AnswerUpdate},
    event::EventScope,
    question::{Question, LOG_PREFIX as QUESTION_LOG_PREFIX},
    upload_file::answer_file_path,
};
use crate::core::ports::repository::{AnswerCommon, OptionCommon, QuestionCommon, Store, TxStore};
use crate::core::services::action_log::log_action;
use crate::core::uploader::Uploader;
use crate::error::Error;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

/// Creates or replaces the subject's answer to a question.
pub async fn submit_answer<T, U>(mut store: T, uploader: &U, uid: Option<i32>, scope: &EventScope, submit: AnswerSubmit, now: DateTime<Utc>) -> Result<i32, Error>
where
    T: TxStore,
    U: Uploader + ?Sized,
{
    let question = QuestionCommon::get(&mut store, scope, submit.question_id).await?;
    if !submit.subject.matches(question.target) {
        return Err(Error::BusinessError(format!(
            "{:?} cannot answer a question asked {}",
            submit.subject,
            question.target.label()
        )));
    }
    let existing = AnswerCommon::find(&mut store, question.id, submit.subject).await?;
    let option_ids: Vec<i32> = submit.option_ids.into_iter().unique().collect();
    let has_file = submit.file.is_some() || existing.as_ref().map_or(false, |a| a.answer_file.is_some());
    let text = validate_payload(&question, &submit.answer, &option_ids, has_file, now)?;
    if !option_ids.is_empty() && !OptionCommon::is_belongs_to_question(&mut store, question.id, option_ids.clone()).await? {
        return Err(Error::BusinessError("options not belongs to exactly one question".into()));
    }
    let previous_file = existing.as_ref().and_then(|a| a.answer_file.clone());
    let upload = submit.file.map(|file| (answer_file_path(&scope.slug, &file.name, &file.content), file.content));
    let new_file = upload.as_ref().map(|(path, _)| path.clone());
    let new_file_in_use = match &new_file {
        Some(path) => file_in_use(&mut store, path).await?,
        None => false,
    };
    let answer_file = new_file.clone().or_else(|| previous_file.clone());
    let (id, action) = match existing {
        Some(answer) => {
            AnswerCommon::update(&mut store, answer.id, AnswerUpdate { answer: text, answer_file }).await?;
            for option in AnswerCommon::options(&mut store, answer.id).await? {
                AnswerCommon::detach(&mut store, answer.id, option.id).await?;
            }
            (answer.id, "update")
        }
        None => {
            let id = AnswerCommon::insert(
                &mut store,
                AnswerInsert {
                    question_id: question.id,
                    subject: submit.subject,
                    answer: text,
                    answer_file,
                },
            )
            .await?;
            (id, "create")
        }
    };
    for option_id in option_ids {
        AnswerCommon::attach(&mut store, id, option_id).await?;
    }
    let answer = AnswerCommon::get(&mut store, id).await?;
    log_answer_action(&mut store, scope, uid, &answer, &question, &format!("{}.answer.{}", QUESTION_LOG_PREFIX, action), None, None).await?;
    let mut stale_file = None;
    if let (Some(new), Some(old)) = (&new_file, previous_file) {
        if *new != old && !file_in_use(&mut store, &old).await? {
            stale_file = Some(old);
        }
    }
    if let Some((path, content)) = &upload {
        if let Err(err) = uploader.put(path, content) {
            store.rollback().await?;
            return Err(err);
        }
    }
    if let Err(err) = store.commit().await {
        if let Some(path) = new_file.as_deref().filter(|_| !new_file_in_use) {
            discard(uploader, path);
        }
        return Err(err);
    }
    if let Some(old) = stale_file {
        discard(uploader, &old);
    }
    Ok(id)
}

/// Uploads are content-addressed, so several answers may share one file.
async fn file_in_use<S>(store: &mut S, path: &str) -> Result<bool, Error>
where
    S: Store,
{
    let n = AnswerCommon::count(
        store,
        AnswerQuery {
            answer_file_eq: Some(path.to_owned()),
            ..default::default()
        },
    )
    .await?;
    Ok(n > 0)
}

fn discard<U>(uploader: &U, path: &str)
where
    U: Uploader + ?Sized,
{
    if let Err(err) = uploader.delete(path) {
        log::warn!("failed to delete upload {}: {}", path, err);
    }
}

async fn detach_and_delete<S>(store: &mut S, scope: &EventScope, answer_id: i32) -> Result<(), Error>
where
    S: Store,
{
    let answer = AnswerCommon::get(store, answer_id).await?;
    QuestionCommon::get(store, scope, answer.question_id).await?;
    for option in AnswerCommon::options(store, answer_id).await? {
        AnswerCommon::detach(store, answer_id, option.id).await?;
    }
    AnswerCommon::delete(store, answer_id).await
}

/// Detaches the answer from all its options, then deletes it. Both steps run
/// in the given transaction; on any failure nothing is changed.
pub async fn remove_answer<T>(mut store: T, scope: &EventScope, person: Option<i32>, answer_id: i32) -> Result<(), Error>
where
    T: TxStore,
{
    match detach_and_delete(&mut store, scope, answer_id).await {
        Ok(()) => {
            log::info!("answer {} removed by {:?}", answer_id, person);
            store.commit().await
        }
        Err(err) => {
            log::warn!("failed to remove answer {}: {}", answer_id, err);
            store.rollback().await?;
            Err(err)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RenderedAnswer {
    pub answer: Answer,
    pub text: String,
    pub boolean: BooleanAnswer,
    pub is_answered: bool,
}

pub async fn render_answer<S, U>(store: &mut S, uploader: &U, scope: &EventScope, answer_id: i32, locale: &str) -> Result<RenderedAnswer, Error>
where
    S: Store,
    U: Uploader + ?Sized,
{
    let answer = AnswerCommon::get(store, answer_id).await?;
    let question = QuestionCommon::get(store, scope, answer.question_id).await?;
    let options = if question.variant.is_choice() {
        AnswerCommon::options(store, answer_id).await?
    } else {
        Vec::new()
    };
    let text = answer.answer_string(question.variant, &options, uploader, locale);
    Ok(RenderedAnswer {
        boolean: answer.boolean_answer(),
        is_answered: !text.is_empty(),
        text,
        answer,
    })
}

/// Without an explicit subject the entry is filed under the answer's
/// person, submission or review, depending on the question's target.
pub async fn log_answer_action<S>(
    store: &mut S,
    scope: &EventScope,
    uid: Option<i32>,
    answer: &Answer,
    question: &Question,
    action_type: &str,
    subject: Option<LogSubject>,
    data: Option<Value>,
) -> Result<i32, Error>
where
    S: Store,
{
    let subject = subject
        .or_else(|| answer.log_subject(question.target))
        .ok_or_else(|| Error::BusinessError(format!("answer {} has no subject for {} questions", answer.id, question.target)))?;
    log_action(store, scope, uid, action_type, subject, data).await
}

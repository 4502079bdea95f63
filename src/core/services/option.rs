use crate::core::models::{
    action_log::LogSubject,
    event::EventScope,
    option::{AnswerOption, Create as OptionCreate, Insert as OptionInsert, Query as OptionQuery, LOG_PREFIX},
};
use crate::core::ports::repository::{OptionCommon, QuestionCommon, Store, TxStore};
use crate::core::services::action_log::log_action;
use crate::error::Error;

pub async fn add_options<T>(mut store: T, uid: Option<i32>, scope: &EventScope, question_id: i32, options: Vec<OptionCreate>) -> Result<Vec<i32>, Error>
where
    T: TxStore,
{
    let question = QuestionCommon::get(&mut store, scope, question_id).await?;
    if !question.variant.is_choice() {
        return Err(Error::BusinessError(format!("{} questions take no options", question.variant)));
    }
    let existing = OptionCommon::count(
        &mut store,
        OptionQuery {
            question_id: Some(question_id),
            ..default::default()
        },
    )
    .await? as i32;
    let mut ids = Vec::with_capacity(options.len());
    for (i, o) in options.into_iter().enumerate() {
        let id = OptionCommon::insert(
            &mut store,
            OptionInsert {
                question_id,
                answer: o.answer,
                position: o.position.unwrap_or(existing + i as i32),
            },
        )
        .await?;
        log_action(&mut store, scope, uid, &format!("{}.create", LOG_PREFIX), LogSubject::AnswerOption(id), None).await?;
        ids.push(id);
    }
    store.commit().await?;
    Ok(ids)
}

pub async fn options_of_question<S>(store: &mut S, scope: &EventScope, question_id: i32) -> Result<(Vec<AnswerOption>, i64), Error>
where
    S: Store,
{
    QuestionCommon::get(store, scope, question_id).await?;
    let total = OptionCommon::count(
        store,
        OptionQuery {
            question_id: Some(question_id),
            ..default::default()
        },
    )
    .await?;
    let opts = OptionCommon::query(
        store,
        OptionQuery {
            question_id: Some(question_id),
            ..default::default()
        },
    )
    .await?;
    Ok((opts, total))
}

/// Fails with `Error::Integrity` while any answer still references the option.
pub async fn delete_option<T>(mut store: T, uid: Option<i32>, scope: &EventScope, option_id: i32) -> Result<(), Error>
where
    T: TxStore,
{
    let option = OptionCommon::query(
        &mut store,
        OptionQuery {
            id_in: Some(vec![option_id]),
            ..default::default()
        },
    )
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| Error::NotFound(format!("answer option {}", option_id)))?;
    QuestionCommon::get(&mut store, scope, option.question_id).await?;
    if let Err(err) = OptionCommon::delete(&mut store, option_id).await {
        store.rollback().await?;
        return Err(err);
    }
    log_action(
        &mut store,
        scope,
        uid,
        &format!("{}.delete", LOG_PREFIX),
        LogSubject::Question(option.question_id),
        Some(serde_json::json!({ "option_id": option_id })),
    )
    .await?;
    store.commit().await?;
    Ok(())
}

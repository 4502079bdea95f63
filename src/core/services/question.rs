use crate::core::{
    models::{
        action_log::LogSubject,
        answer::Query as AnswerQuery,
        common::Pagination,
        event::EventScope,
        option::Insert as OptionInsert,
        question::{Create as QuestionCreate, Insert as QuestionInsert, Query, Question, Settings as QuestionSettings, LOG_PREFIX},
        QuestionTarget,
    },
    ports::repository::{AnswerCommon, OptionCommon, QuestionCommon, Store, SubjectCommon, TxStore},
    services::action_log::log_action,
};
use crate::error::Error;
use itertools::Itertools;

pub async fn create_question<T>(mut store: T, uid: Option<i32>, scope: &EventScope, question: QuestionCreate) -> Result<i32, Error>
where
    T: TxStore,
{
    question.settings.validate()?;
    if !question.options.is_empty() && !question.settings.variant.is_choice() {
        return Err(Error::BusinessError(format!("{} questions take no options", question.settings.variant)));
    }
    let qid = QuestionCommon::insert(
        &mut store,
        QuestionInsert {
            event_id: scope.event_id,
            settings: question.settings,
        },
    )
    .await?;
    for (i, o) in question.options.into_iter().enumerate() {
        OptionCommon::insert(
            &mut store,
            OptionInsert {
                question_id: qid,
                answer: o.answer,
                position: o.position.unwrap_or(i as i32),
            },
        )
        .await?;
    }
    log_action(&mut store, scope, uid, &format!("{}.create", LOG_PREFIX), LogSubject::Question(qid), None).await?;
    store.commit().await?;
    Ok(qid)
}

/// Once answers exist, a question keeps its target and its kind of variant
/// (choice or free text). Answers given under `is_public = false` were not
/// consented for publication, so such a question cannot be made public.
pub async fn update_question<T>(mut store: T, uid: Option<i32>, scope: &EventScope, id: i32, settings: QuestionSettings) -> Result<(), Error>
where
    T: TxStore,
{
    settings.validate()?;
    let current = QuestionCommon::get(&mut store, scope, id).await?;
    let publishes = settings.is_public && !current.is_public;
    let retargets = settings.target != current.target;
    let changes_kind = settings.variant.is_choice() != current.variant.is_choice();
    if publishes || retargets || changes_kind {
        let answers = AnswerCommon::count(
            &mut store,
            AnswerQuery {
                question_id_eq: Some(id),
                ..default::default()
            },
        )
        .await?;
        if answers > 0 {
            log::warn!("refusing to change question {} after {} answers were given", id, answers);
            let reason = if retargets {
                "cannot change the target of a question after answers have been given"
            } else if changes_kind {
                "cannot switch between choice and free-text variants after answers have been given"
            } else {
                "cannot make a question public after answers have been given"
            };
            return Err(Error::BusinessError(reason.into()));
        }
    }
    QuestionCommon::update(&mut store, id, settings).await?;
    log_action(&mut store, scope, uid, &format!("{}.update", LOG_PREFIX), LogSubject::Question(id), None).await?;
    store.commit().await?;
    Ok(())
}

/// Flips `active` and returns the new state.
pub async fn toggle_question<S>(store: &mut S, uid: Option<i32>, scope: &EventScope, id: i32) -> Result<bool, Error>
where
    S: Store,
{
    let question = QuestionCommon::get(store, scope, id).await?;
    let active = !question.active;
    QuestionCommon::set_active(store, id, active).await?;
    let action = if active { "activate" } else { "deactivate" };
    log_action(store, scope, uid, &format!("{}.{}", LOG_PREFIX, action), LogSubject::Question(id), None).await?;
    Ok(active)
}

/// Deleting never cascades: a question with options or answers stays and the
/// integrity error is returned. Deactivate it instead.
pub async fn delete_question<T>(mut store: T, uid: Option<i32>, scope: &EventScope, id: i32) -> Result<(), Error>
where
    T: TxStore,
{
    QuestionCommon::get(&mut store, scope, id).await?;
    if let Err(err) = QuestionCommon::delete(&mut store, id).await {
        store.rollback().await?;
        return Err(err);
    }
    log_action(
        &mut store,
        scope,
        uid,
        &format!("{}.delete", LOG_PREFIX),
        LogSubject::Event(scope.event_id),
        Some(serde_json::json!({ "question_id": id })),
    )
    .await?;
    store.commit().await?;
    Ok(())
}

/// Assigns positions 0..n in the order given.
pub async fn reorder_questions<T>(mut store: T, uid: Option<i32>, scope: &EventScope, ids: Vec<i32>) -> Result<(), Error>
where
    T: TxStore,
{
    if ids.iter().unique().count() != ids.len() {
        return Err(Error::BusinessError("question ids must be unique".into()));
    }
    for (position, id) in ids.iter().enumerate() {
        QuestionCommon::get(&mut store, scope, *id).await?;
        QuestionCommon::set_position(&mut store, *id, position as i32).await?;
    }
    log_action(
        &mut store,
        scope,
        uid,
        &format!("{}.reorder", LOG_PREFIX),
        LogSubject::Event(scope.event_id),
        Some(serde_json::json!({ "order": ids })),
    )
    .await?;
    store.commit().await?;
    Ok(())
}

pub async fn question_detail<S>(store: &mut S, scope: &EventScope, id: i32) -> Result<Question, Error>
where
    S: Store,
{
    QuestionCommon::get(store, scope, id).await
}

pub async fn questions_of_event<S>(store: &mut S, scope: &EventScope, query: Query, pagination: Option<Pagination>) -> Result<(Vec<Question>, i64), Error>
where
    S: Store,
{
    let total = QuestionCommon::count(store, scope, &query).await?;
    let questions = QuestionCommon::query(store, scope, &query, pagination).await?;
    log::debug!("{} of {} questions for event {}", questions.len(), total, scope.slug);
    Ok((questions, total))
}

/// How many subjects still lack an answer to `question`.
///
/// Only submission and speaker questions are counted; reviewer questions
/// return 0. Empty filters count as no filter.
pub async fn missing_answers<S>(store: &mut S, question: &Question, filter_speakers: Option<&[i32]>, filter_talks: Option<&[i32]>) -> Result<i64, Error>
where
    S: Store,
{
    let speakers = filter_speakers.filter(|s| !s.is_empty());
    let talks = filter_talks.filter(|t| !t.is_empty());
    let mut query = AnswerQuery {
        question_id_eq: Some(question.id),
        ..default::default()
    };
    if speakers.is_some() || talks.is_some() {
        query.person_in = Some(speakers.map(<[i32]>::to_vec).unwrap_or_default());
        query.submission_in = Some(talks.map(<[i32]>::to_vec).unwrap_or_default());
    }
    let total = match question.target {
        QuestionTarget::Submission => match talks {
            Some(talks) => talks.iter().unique().count() as i64,
            None => SubjectCommon::count_submissions(store, question.event_id).await?,
        },
        QuestionTarget::Speaker => match speakers {
            Some(speakers) => speakers.iter().unique().count() as i64,
            None => SubjectCommon::count_speakers(store, question.event_id).await?,
        },
        QuestionTarget::Reviewer => return Ok(0),
    };
    let answered = AnswerCommon::count(store, query).await?;
    Ok((total - answered).max(0))
}

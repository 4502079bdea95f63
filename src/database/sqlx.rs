use crate::core::models::{
    action_log::Insert as ActionLogInsert,
    answer::{Answer, Insert as AnswerInsert, Query as AnswerQuery, Update as AnswerUpdate},
    common::Pagination,
    event::{Event, EventScope},
    option::{AnswerOption, Insert as OptionInsert, Query as OptionQuery},
    question::{Insert as QuestionInsert, Query as QuestionQuery, Question, QuestionSet, Settings as QuestionSettings},
    AnswerSubject, QuestionTarget,
};
use crate::core::ports::repository::{
    ActionLogCommon, AnswerCommon, Common, EventCommon, Manager, OptionCommon, QuestionCommon, Store, SubjectCommon, TxStore,
};
use crate::error::Error;
use itertools::Itertools;
use sqlx::pool::PoolConnection;
use sqlx::types::Json;
use sqlx::{query, query_as, query_scalar, Executor, PgPool, Postgres, QueryBuilder, Transaction};

const QUESTION_SELECT: &str = "
    SELECT
        q.*,
        ARRAY(SELECT track_id FROM question_tracks WHERE question_id = q.id ORDER BY track_id) AS tracks,
        ARRAY(SELECT submission_type_id FROM question_submission_types WHERE question_id = q.id ORDER BY submission_type_id) AS submission_types
    FROM questions AS q
    WHERE q.event_id = ";

fn push_question_filter(stmt: &mut QueryBuilder<'_, Postgres>, query: &QuestionQuery) {
    if query.set == QuestionSet::Visible {
        stmt.push(" AND q.active AND q.target <> ").push_bind(QuestionTarget::Reviewer);
    }
    if let Some(target) = query.target_eq {
        stmt.push(" AND q.target = ").push_bind(target);
    }
    if let Some(variant) = query.variant_eq {
        stmt.push(" AND q.variant = ").push_bind(variant);
    }
    if let Some(is_public) = query.is_public_eq {
        stmt.push(" AND q.is_public = ").push_bind(is_public);
    }
    if let Some(track) = query.track_id {
        stmt.push(" AND (NOT EXISTS (SELECT 1 FROM question_tracks WHERE question_id = q.id) OR EXISTS (SELECT 1 FROM question_tracks WHERE question_id = q.id AND track_id = ")
            .push_bind(track)
            .push("))");
    }
    if let Some(st) = query.submission_type_id {
        stmt.push(" AND (NOT EXISTS (SELECT 1 FROM question_submission_types WHERE question_id = q.id) OR EXISTS (SELECT 1 FROM question_submission_types WHERE question_id = q.id AND submission_type_id = ")
            .push_bind(st)
            .push("))");
    }
}

fn subject_column(subject: AnswerSubject) -> (&'static str, i32) {
    match subject {
        AnswerSubject::Submission(id) => ("submission_id", id),
        AnswerSubject::Person(id) => ("person_id", id),
        AnswerSubject::Review(id) => ("review_id", id),
    }
}

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn replace_limits(&mut self, id: i32, tracks: &[i32], submission_types: &[i32]) -> Result<(), Error> {
        query("DELETE FROM question_tracks WHERE question_id = $1").bind(id).execute(&mut self.executor).await?;
        query("DELETE FROM question_submission_types WHERE question_id = $1").bind(id).execute(&mut self.executor).await?;
        for track in tracks.iter().unique() {
            query("INSERT INTO question_tracks (question_id, track_id) VALUES ($1, $2)")
                .bind(id)
                .bind(track)
                .execute(&mut self.executor)
                .await?;
        }
        for st in submission_types.iter().unique() {
            query("INSERT INTO question_submission_types (question_id, submission_type_id) VALUES ($1, $2)")
                .bind(id)
                .bind(st)
                .execute(&mut self.executor)
                .await?;
        }
        Ok(())
    }
}

impl<E> EventCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn get(&mut self, id: i32) -> Result<Event, Error> {
        let event = query_as("SELECT * FROM events WHERE id = $1").bind(id).fetch_one(&mut self.executor).await?;
        Ok(event)
    }

    async fn get_by_slug(&mut self, slug: &str) -> Result<Event, Error> {
        let event = query_as("SELECT * FROM events WHERE slug = $1").bind(slug).fetch_one(&mut self.executor).await?;
        Ok(event)
    }
}

impl<E> QuestionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, question: QuestionInsert) -> Result<i32, Error> {
        let s = question.settings;
        let id = query_scalar(
            "
        INSERT INTO questions (
            event_id, variant, target, question, help_text, default_answer, question_required, deadline, freeze_after,
            position, active, contains_personal_data, min_length, max_length, min_number, max_number, min_date, max_date,
            min_datetime, max_datetime, is_public, is_visible_to_reviewers, icon
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
        RETURNING id",
        )
        .bind(question.event_id)
        .bind(s.variant)
        .bind(s.target)
        .bind(Json(&s.question))
        .bind(s.help_text.as_ref().map(Json))
        .bind(&s.default_answer)
        .bind(s.question_required)
        .bind(s.deadline)
        .bind(s.freeze_after)
        .bind(s.position)
        .bind(s.active)
        .bind(s.contains_personal_data)
        .bind(s.bounds.min_length)
        .bind(s.bounds.max_length)
        .bind(s.bounds.min_number)
        .bind(s.bounds.max_number)
        .bind(s.bounds.min_date)
        .bind(s.bounds.max_date)
        .bind(s.bounds.min_datetime)
        .bind(s.bounds.max_datetime)
        .bind(s.is_public)
        .bind(s.is_visible_to_reviewers)
        .bind(s.icon)
        .fetch_one(&mut self.executor)
        .await?;
        self.replace_limits(id, &s.tracks, &s.submission_types).await?;
        Ok(id)
    }

    async fn update(&mut self, id: i32, s: QuestionSettings) -> Result<(), Error> {
        let res = query(
            "
        UPDATE questions SET
            variant = $1, target = $2, question = $3, help_text = $4, default_answer = $5, question_required = $6,
            deadline = $7, freeze_after = $8, position = $9, active = $10, contains_personal_data = $11,
            min_length = $12, max_length = $13, min_number = $14, max_number = $15, min_date = $16, max_date = $17,
            min_datetime = $18, max_datetime = $19, is_public = $20, is_visible_to_reviewers = $21, icon = $22
        WHERE id = $23",
        )
        .bind(s.variant)
        .bind(s.target)
        .bind(Json(&s.question))
        .bind(s.help_text.as_ref().map(Json))
        .bind(&s.default_answer)
        .bind(s.question_required)
        .bind(s.deadline)
        .bind(s.freeze_after)
        .bind(s.position)
        .bind(s.active)
        .bind(s.contains_personal_data)
        .bind(s.bounds.min_length)
        .bind(s.bounds.max_length)
        .bind(s.bounds.min_number)
        .bind(s.bounds.max_number)
        .bind(s.bounds.min_date)
        .bind(s.bounds.max_date)
        .bind(s.bounds.min_datetime)
        .bind(s.bounds.max_datetime)
        .bind(s.is_public)
        .bind(s.is_visible_to_reviewers)
        .bind(s.icon)
        .bind(id)
        .execute(&mut self.executor)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("question {}", id)));
        }
        self.replace_limits(id, &s.tracks, &s.submission_types).await
    }

    async fn get(&mut self, scope: &EventScope, id: i32) -> Result<Question, Error> {
        let mut stmt = QueryBuilder::new(QUESTION_SELECT);
        stmt.push_bind(scope.event_id).push(" AND q.id = ").push_bind(id);
        let question = stmt.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(question)
    }

    async fn query(&mut self, scope: &EventScope, query: &QuestionQuery, pagination: Option<Pagination>) -> Result<Vec<Question>, Error> {
        let mut stmt = QueryBuilder::new(QUESTION_SELECT);
        stmt.push_bind(scope.event_id);
        push_question_filter(&mut stmt, query);
        stmt.push(" ORDER BY q.position, q.id");
        if let Some(p) = pagination {
            stmt.push(" LIMIT ").push_bind(p.limit);
            stmt.push(" OFFSET ").push_bind(p.offset.unwrap_or(0));
        }
        let questions = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(questions)
    }

    async fn count(&mut self, scope: &EventScope, query: &QuestionQuery) -> Result<i64, Error> {
        let mut stmt = QueryBuilder::new("SELECT COUNT(DISTINCT q.id) FROM questions AS q WHERE q.event_id = ");
        stmt.push_bind(scope.event_id);
        push_question_filter(&mut stmt, query);
        let (n,) = stmt.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn set_active(&mut self, id: i32, active: bool) -> Result<(), Error> {
        query("UPDATE questions SET active = $1 WHERE id = $2").bind(active).bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn set_position(&mut self, id: i32, position: i32) -> Result<(), Error> {
        query("UPDATE questions SET position = $1 WHERE id = $2").bind(position).bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        query("DELETE FROM question_tracks WHERE question_id = $1").bind(id).execute(&mut self.executor).await?;
        query("DELETE FROM question_submission_types WHERE question_id = $1").bind(id).execute(&mut self.executor).await?;
        let res = query("DELETE FROM questions WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("question {}", id)));
        }
        Ok(())
    }
}

impl<E> OptionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, option: OptionInsert) -> Result<i32, Error> {
        let id = query_scalar("INSERT INTO answer_options (question_id, answer, position) VALUES ($1, $2, $3) RETURNING id")
            .bind(option.question_id)
            .bind(Json(option.answer))
            .bind(option.position)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(id)
    }

    async fn query(&mut self, query: OptionQuery) -> Result<Vec<AnswerOption>, Error> {
        let mut stmt = QueryBuilder::new("SELECT * FROM answer_options WHERE 1 = 1");
        if let Some(qid) = query.question_id {
            stmt.push(" AND question_id = ").push_bind(qid);
        }
        if let Some(ids) = query.id_in {
            stmt.push(" AND id = ANY(").push_bind(ids).push(")");
        }
        stmt.push(" ORDER BY position, id");
        if let Some(limit) = query.limit {
            stmt.push(" LIMIT ").push_bind(limit);
            stmt.push(" OFFSET ").push_bind(query.offset.unwrap_or(0));
        }
        let options = stmt.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(options)
    }

    async fn count(&mut self, query: OptionQuery) -> Result<i64, Error> {
        let mut stmt = QueryBuilder::new("SELECT COUNT(DISTINCT id) FROM answer_options WHERE 1 = 1");
        if let Some(qid) = query.question_id {
            stmt.push(" AND question_id = ").push_bind(qid);
        }
        if let Some(ids) = query.id_in {
            stmt.push(" AND id = ANY(").push_bind(ids).push(")");
        }
        let (n,) = stmt.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn is_belongs_to_question(&mut self, question_id: i32, ids: Vec<i32>) -> Result<bool, Error> {
        let expected = ids.iter().unique().count() as i64;
        let n: i64 = query_scalar("SELECT COUNT(DISTINCT id) FROM answer_options WHERE question_id = $1 AND id = ANY($2)")
            .bind(question_id)
            .bind(ids)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(n == expected)
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        let res = query("DELETE FROM answer_options WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("answer option {}", id)));
        }
        Ok(())
    }
}

impl<E> AnswerCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, answer: AnswerInsert) -> Result<i32, Error> {
        let id = query_scalar(
            "
        INSERT INTO answers (question_id, submission_id, person_id, review_id, answer, answer_file)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id",
        )
        .bind(answer.question_id)
        .bind(answer.subject.submission_id())
        .bind(answer.subject.person_id())
        .bind(answer.subject.review_id())
        .bind(answer.answer)
        .bind(answer.answer_file)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn update(&mut self, id: i32, answer: AnswerUpdate) -> Result<(), Error> {
        query("UPDATE answers SET answer = $1, answer_file = $2 WHERE id = $3")
            .bind(answer.answer)
            .bind(answer.answer_file)
            .bind(id)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn get(&mut self, id: i32) -> Result<Answer, Error> {
        let answer = query_as("SELECT * FROM answers WHERE id = $1").bind(id).fetch_one(&mut self.executor).await?;
        Ok(answer)
    }

    async fn find(&mut self, question_id: i32, subject: AnswerSubject) -> Result<Option<Answer>, Error> {
        let (column, subject_id) = subject_column(subject);
        let answer = query_as(&format!("SELECT * FROM answers WHERE question_id = $1 AND {} = $2", column))
            .bind(question_id)
            .bind(subject_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(answer)
    }

    async fn count(&mut self, query: AnswerQuery) -> Result<i64, Error> {
        let mut stmt = QueryBuilder::new("SELECT COUNT(DISTINCT id) FROM answers WHERE 1 = 1");
        if let Some(qid) = query.question_id_eq {
            stmt.push(" AND question_id = ").push_bind(qid);
        }
        if let Some(file) = query.answer_file_eq {
            stmt.push(" AND answer_file = ").push_bind(file);
        }
        match (query.person_in, query.submission_in) {
            (Some(people), Some(submissions)) => {
                stmt.push(" AND (person_id = ANY(")
                    .push_bind(people)
                    .push(") OR submission_id = ANY(")
                    .push_bind(submissions)
                    .push("))");
            }
            (Some(people), None) => {
                stmt.push(" AND person_id = ANY(").push_bind(people).push(")");
            }
            (None, Some(submissions)) => {
                stmt.push(" AND submission_id = ANY(").push_bind(submissions).push(")");
            }
            (None, None) => {}
        }
        let (n,) = stmt.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn options(&mut self, id: i32) -> Result<Vec<AnswerOption>, Error> {
        let options = query_as(
            "
        SELECT o.*
        FROM answer_option_links AS l
        JOIN answer_options AS o ON o.id = l.option_id
        WHERE l.answer_id = $1
        ORDER BY l.id",
        )
        .bind(id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(options)
    }

    async fn attach(&mut self, id: i32, option_id: i32) -> Result<(), Error> {
        query("INSERT INTO answer_option_links (answer_id, option_id) VALUES ($1, $2)")
            .bind(id)
            .bind(option_id)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn detach(&mut self, id: i32, option_id: i32) -> Result<(), Error> {
        query("DELETE FROM answer_option_links WHERE answer_id = $1 AND option_id = $2")
            .bind(id)
            .bind(option_id)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        let res = query("DELETE FROM answers WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("answer {}", id)));
        }
        Ok(())
    }
}

impl<E> SubjectCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn count_submissions(&mut self, event_id: i32) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(DISTINCT id) FROM submissions WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(n)
    }

    async fn count_speakers(&mut self, event_id: i32) -> Result<i64, Error> {
        let n = query_scalar(
            "
        SELECT COUNT(DISTINCT ss.person_id)
        FROM submission_speakers AS ss
        JOIN submissions AS s ON s.id = ss.submission_id
        WHERE s.event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(n)
    }
}

impl<E> ActionLogCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, log: ActionLogInsert) -> Result<i32, Error> {
        let id = query_scalar(
            "
        INSERT INTO action_logs (event_id, person_id, action_type, content_type, object_id, data, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id",
        )
        .bind(log.event_id)
        .bind(log.person_id)
        .bind(log.action_type)
        .bind(log.subject.content_type())
        .bind(log.subject.object_id())
        .bind(log.data)
        .bind(log.timestamp)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }
}

pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx { executor: tx })
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx { executor: conn })
    }
}

impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Common for PgSqlx<Transaction<'a, Postgres>> {}
impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Store for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStore for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

impl<'a> Manager<'a, PgSqlx<PoolConnection<Postgres>>, PgSqlx<Transaction<'a, Postgres>>> for PgSqlxManager {
    async fn db(&'a self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let d = self.acquire().await?;
        Ok(d)
    }

    async fn tx(&'a self) -> Result<PgSqlx<Transaction<'a, Postgres>>, Error> {
        let t = self.begin().await?;
        Ok(t)
    }
}

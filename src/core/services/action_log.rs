use crate::core::models::{
    action_log::{Insert as ActionLogInsert, LogSubject},
    event::EventScope,
};
use crate::core::ports::repository::{ActionLogCommon, Store};
use crate::error::Error;
use chrono::Utc;
use serde_json::Value;

pub async fn log_action<S>(store: &mut S, scope: &EventScope, person_id: Option<i32>, action_type: &str, subject: LogSubject, data: Option<Value>) -> Result<i32, Error>
where
    S: Store,
{
    log::info!("{} on {}#{} by {:?}", action_type, subject.content_type(), subject.object_id(), person_id);
    ActionLogCommon::insert(
        store,
        ActionLogInsert {
            event_id: scope.event_id,
            person_id,
            action_type: action_type.to_owned(),
            subject,
            data,
            timestamp: Utc::now(),
        },
    )
    .await
}

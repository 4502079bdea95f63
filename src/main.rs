extern crate anyhow;
extern crate cfp_questions;
extern crate chrono;
extern crate dotenv;
extern crate env_logger;
extern crate log;
extern crate sqlx;
extern crate tokio;

use cfp_questions::config::Config;
use cfp_questions::core::models::question::Query;
use cfp_questions::core::ports::repository::{EventCommon, Manager};
use cfp_questions::core::services::question::{missing_answers, questions_of_event};
use cfp_questions::database::sqlx::PgSqlxManager;
use cfp_questions::impls::uploaders::local_storage::LocalStorage;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    env_logger::init();
    let slug = dotenv::var("EVENT_SLUG")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    let uploads = LocalStorage::new(&config.upload_path, &config.media_url);
    log::debug!("answer uploads are served from {}", uploads.base_url());
    let manager = PgSqlxManager::new(pool);
    let mut db = manager.db().await?;
    let scope = EventCommon::get_by_slug(&mut db, &slug).await?.scope();
    let (questions, total) = questions_of_event(&mut db, &scope, Query::default(), None).await?;
    println!("{} ({} questions)", scope.slug, total);
    let now = Utc::now();
    for q in questions {
        let missing = missing_answers(&mut db, &q, None, None).await?;
        println!(
            "#{:<5} {:<40} {:<12} {:<8} missing: {}",
            q.id,
            q.label(&config.default_locale),
            q.variant.as_str(),
            if q.required(now) { "required" } else { "optional" },
            missing
        );
    }
    Ok(())
}

use crate::error::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const UPLOAD_PATH: &str = "UPLOAD_PATH";
pub const MEDIA_URL: &str = "MEDIA_URL";
pub const DEFAULT_LOCALE: &str = "DEFAULT_LOCALE";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub upload_path: String,
    pub media_url: String,
    pub default_locale: String,
}

impl Config {
    /// Loads `.env` (if present) and reads the settings from the environment.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        let max_connections = match dotenv::var(DATABASE_MAX_CONNECTIONS) {
            Ok(v) => v
                .parse()
                .map_err(|_| Error::BusinessError(format!("invalid {}: {}", DATABASE_MAX_CONNECTIONS, v)))?,
            Err(_) => 5,
        };
        Ok(Self {
            database_url: dotenv::var(DATABASE_URL)?,
            max_connections,
            upload_path: dotenv::var(UPLOAD_PATH)?,
            media_url: dotenv::var(MEDIA_URL).unwrap_or_else(|_| "/media/".into()),
            default_locale: dotenv::var(DEFAULT_LOCALE).unwrap_or_else(|_| "en".into()),
        })
    }
}

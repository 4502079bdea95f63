use crate::error::Error;

/// Storage for answer uploads, addressed by the relative path built with
/// `answer_file_path`.
pub trait Uploader {
    fn put(&self, path: &str, content: &[u8]) -> Result<(), Error>;
    fn url(&self, path: &str) -> String;
    fn delete(&self, path: &str) -> Result<(), Error>;
}

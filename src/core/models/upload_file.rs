use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex digits of the content hash kept in the stored file name.
const HASH_LENGTH: usize = 7;

#[derive(Debug, Deserialize)]
pub struct UploadedFileCreate {
    pub name: String,
    pub content: Vec<u8>,
}

/// `{slug}/question_uploads/{stem}_{hash}{.ext}`, hash taken from the content.
pub fn answer_file_path(event_slug: &str, filename: &str, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hex::encode(hasher.finalize());
    let name = Path::new(filename).file_name().and_then(|n| n.to_str()).unwrap_or("upload");
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
        _ => (name, String::new()),
    };
    format!("{}/question_uploads/{}_{}{}", event_slug, stem, &digest[..HASH_LENGTH], extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_scoped_by_event_and_content() {
        let path = answer_file_path("democon", "cv.pdf", b"hello");
        // sha256("hello") = 2cf24dba...
        assert_eq!(path, "democon/question_uploads/cv_2cf24db.pdf");
        assert_ne!(path, answer_file_path("democon", "cv.pdf", b"hello!"));
        assert_ne!(path, answer_file_path("othercon", "cv.pdf", b"hello"));
    }

    #[test]
    fn strips_directories_and_handles_missing_extension() {
        assert_eq!(answer_file_path("x", "../../etc/README", b"hello"), "x/question_uploads/README_2cf24db");
        assert_eq!(answer_file_path("x", ".bashrc", b"hello"), "x/question_uploads/.bashrc_2cf24db");
    }
}

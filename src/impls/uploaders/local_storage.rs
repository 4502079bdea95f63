use std::{
    fs::{create_dir_all, remove_file, write},
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::core::uploader::Uploader;
use crate::error::Error;

/// Stores uploads below `path` and serves them under `base_url`.
pub struct LocalStorage {
    path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>, base_url: &str) -> Self {
        let mut base_url = base_url.to_owned();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { path: path.into(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(path);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(Error::BusinessError(format!("invalid upload path: {}", path)));
        }
        Ok(self.path.join(relative))
    }
}

impl Uploader for LocalStorage {
    fn put(&self, path: &str, content: &[u8]) -> Result<(), Error> {
        let full = self.resolve(path)?;
        if let Some(dir) = full.parent() {
            create_dir_all(dir)?;
        }
        write(&full, content)?;
        log::debug!("stored upload {}", full.display());
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        match remove_file(self.resolve(path)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::upload_file::answer_file_path;

    #[test]
    fn put_url_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/media");
        let path = answer_file_path("democon", "slides.pdf", b"%PDF");
        storage.put(&path, b"%PDF").unwrap();
        assert_eq!(std::fs::read(dir.path().join(&path)).unwrap(), b"%PDF");
        assert_eq!(storage.url(&path), format!("/media/{}", path));
        storage.delete(&path).unwrap();
        assert!(!dir.path().join(&path).exists());
        storage.delete(&path).unwrap();
    }

    #[test]
    fn refuses_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "/media/");
        assert!(storage.put("../outside", b"x").is_err());
        assert!(storage.put("/abs", b"x").is_err());
    }
}

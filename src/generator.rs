use log::{error, info};
use std::{
    fs,
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crate::error::{Result, TemplateError};

/// Writes compiled template text to disk.
///
/// The target directory must already exist. Existing files are overwritten.
#[derive(Debug, Clone, Default)]
pub struct FileGenerator {
    dry_run: bool,
}

impl FileGenerator {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Writes `content` to `dir/file_name`, blocking until done.
    ///
    /// # Arguments
    ///
    /// * `dir` - The output directory.
    /// * `file_name` - The file name, extension included.
    /// * `content` - The compiled text.
    ///
    /// # Returns
    ///
    /// The written path (or the path that would be written in dry-run mode).
    pub fn write_sync(&self, dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
        let output_path = dir.join(file_name);
        if self.dry_run {
            info!("[DRY RUN] Would write: {:?}", output_path);
            return Ok(output_path);
        }
        fs::write(&output_path, content).map_err(|source| {
            error!(
                "Failed to write rendered content to file: {:?}",
                output_path
            );
            TemplateError::Io {
                path: output_path.clone(),
                source,
            }
        })?;
        info!("{:?}", output_path);
        Ok(output_path)
    }

    /// Writes `content` to `dir/file_name` on a new thread and reports through `on_done`.
    pub fn write<F>(&self, dir: &Path, file_name: &str, content: String, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<PathBuf>) + Send + 'static,
    {
        let generator = self.clone();
        let dir = dir.to_path_buf();
        let file_name = file_name.to_string();
        thread::spawn(move || on_done(generator.write_sync(&dir, &file_name, &content)))
    }

    /// Writes `content` to `dir/file_name` on a new thread; the handle yields the result.
    pub fn spawn_write(
        &self,
        dir: &Path,
        file_name: &str,
        content: String,
    ) -> JoinHandle<Result<PathBuf>> {
        let generator = self.clone();
        let dir = dir.to_path_buf();
        let file_name = file_name.to_string();
        thread::spawn(move || generator.write_sync(&dir, &file_name, &content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn test_write_sync() {
        let dir = tempdir().unwrap();
        let path = FileGenerator::default()
            .write_sync(dir.path(), "out.txt", "content\n")
            .unwrap();
        assert_eq!(path, dir.path().join("out.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "content\n");
    }

    #[test]
    fn test_write_sync_overwrites() {
        let dir = tempdir().unwrap();
        let generator = FileGenerator::default();
        generator.write_sync(dir.path(), "out.txt", "old").unwrap();
        generator.write_sync(dir.path(), "out.txt", "new").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "new");
    }

    #[test]
    fn test_write_sync_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = FileGenerator::default()
            .write_sync(&missing, "out.txt", "content")
            .unwrap_err();
        assert!(matches!(err, TemplateError::Io { ref path, .. } if path == &missing.join("out.txt")));
        assert!(!missing.exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let generator = FileGenerator::new(true);
        assert!(generator.is_dry_run());
        let path = generator.write_sync(dir.path(), "out.txt", "content").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_write_reports_through_callback() {
        let dir = tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let handle = FileGenerator::default().write(
            dir.path(),
            "async.txt",
            "later\n".to_string(),
            move |result| {
                tx.send(result.map_err(|e| e.to_string())).unwrap();
            },
        );
        handle.join().unwrap();
        let path = rx.recv().unwrap().unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "later\n");
    }

    #[test]
    fn test_spawn_write_joins_to_result() {
        let dir = tempdir().unwrap();
        let generator = FileGenerator::default();
        let path = generator
            .spawn_write(dir.path(), "joined.txt", "done\n".to_string())
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "done\n");

        let missing = dir.path().join("missing");
        let result = generator
            .spawn_write(&missing, "joined.txt", String::new())
            .join()
            .unwrap();
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }
}

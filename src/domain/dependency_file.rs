//! Dependency file model and content fingerprinting
//!
//! A dependency file is one tracked manifest or lock file (Gemfile,
//! Gemfile.lock, ...) identified by its repository-relative path. The
//! fingerprint is a git-blob compatible SHA1 over `"blob {len}\0" + content`,
//! used to detect drift between the state the server computed a patch
//! against and the actual local file.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One tracked manifest/lock file
///
/// A file received from the server may carry only `path` + `sha` (patch
/// target reference); `content` stays empty until refreshed from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// Repository-relative file path
    pub path: String,

    /// Git-blob compatible SHA1 of the content
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha: String,

    /// Raw file content
    #[serde(default)]
    pub content: String,
}

/// Compute the git-blob compatible SHA1 of raw content
pub fn content_sha1(content: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Compute the git-blob compatible SHA1 of a file on disk
pub fn file_sha1(path: impl AsRef<Path>) -> Result<String, FileError> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|e| FileError::read(path, e))?;
    Ok(content_sha1(&content))
}

impl DependencyFile {
    /// Create a file reference with only a path (no content, no fingerprint)
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Read a dependency file from disk, computing its fingerprint
    pub fn read(path: impl Into<String>) -> Result<Self, FileError> {
        let path = path.into();
        let content =
            fs::read_to_string(&path).map_err(|e| FileError::read(PathBuf::from(&path), e))?;
        let sha = content_sha1(content.as_bytes());
        Ok(Self { path, sha, content })
    }

    /// Verify that the on-disk content still matches the stored fingerprint
    ///
    /// Optimistic-lock check run before patching: a mismatch means the local
    /// tree diverged from the state the server computed its diff against.
    pub fn check_sha(&self) -> Result<(), FileError> {
        let sum = file_sha1(&self.path)?;
        if sum != self.sha {
            return Err(FileError::sha_mismatch(&self.path, &self.sha, sum));
        }
        Ok(())
    }

    /// Re-read content and fingerprint from disk in place
    pub fn refresh(&mut self) -> Result<(), FileError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| FileError::read(PathBuf::from(&self.path), e))?;
        self.sha = content_sha1(content.as_bytes());
        self.content = content;
        Ok(())
    }

    /// Apply a unified diff to the file on disk via the external patch tool
    ///
    /// The patch text is fed on stdin; combined output is surfaced as the
    /// error detail on non-zero exit. On success the content and fingerprint
    /// are refreshed from disk.
    pub fn patch(&mut self, patch_text: &str) -> Result<(), FileError> {
        let mut child = Command::new("patch")
            .arg(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FileError::PatchCommand { source: e })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(patch_text.as_bytes())
                .map_err(|e| FileError::PatchCommand { source: e })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| FileError::PatchCommand { source: e })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(FileError::PatchFailed {
                path: PathBuf::from(&self.path),
                output: combined,
            });
        }

        self.refresh()
    }

    /// Write the stored content back to disk at `path`
    pub fn write(&self) -> Result<(), FileError> {
        if self.path.is_empty() {
            return Err(FileError::write(
                PathBuf::new(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty file path"),
            ));
        }
        fs::write(&self.path, &self.content)
            .map_err(|e| FileError::write(PathBuf::from(&self.path), e))
    }

    /// Directory containing the file, for running ecosystem commands
    pub fn workdir(&self) -> PathBuf {
        let parent = Path::new(&self.path).parent();
        match parent {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_str(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_str().unwrap().to_string()
    }

    /// True when the external patch tool is available on this machine
    fn patch_tool_available() -> bool {
        Command::new("patch")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_content_sha1_empty_blob() {
        // Well-known git hash of the empty blob
        assert_eq!(
            content_sha1(b""),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
    }

    #[test]
    fn test_content_sha1_hello_blob() {
        // git hash-object of "hello\n"
        assert_eq!(
            content_sha1(b"hello\n"),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn test_content_sha1_differs_for_different_content() {
        assert_ne!(content_sha1(b"a"), content_sha1(b"b"));
        assert_ne!(content_sha1(b"gem \"rails\""), content_sha1(b"gem \"rack\""));
    }

    #[test]
    fn test_read_computes_fingerprint() {
        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "gem \"rails\", \"3.0.0\"\n").unwrap();

        let df = DependencyFile::read(&gemfile).unwrap();
        assert_eq!(df.content, "gem \"rails\", \"3.0.0\"\n");
        assert_eq!(df.sha, content_sha1(df.content.as_bytes()));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DependencyFile::read(path_str(&dir, "Gemfile")).unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }

    #[test]
    fn test_check_sha_matches_disk() {
        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "gem \"rack\"\n").unwrap();

        let df = DependencyFile::read(&gemfile).unwrap();
        assert!(df.check_sha().is_ok());
    }

    #[test]
    fn test_check_sha_detects_drift() {
        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "gem \"rack\"\n").unwrap();

        let df = DependencyFile::read(&gemfile).unwrap();
        fs::write(&gemfile, "gem \"rack\", \"2.0\"\n").unwrap();

        let err = df.check_sha().unwrap_err();
        assert!(matches!(err, FileError::ShaMismatch { .. }));
    }

    #[test]
    fn test_refresh_picks_up_new_content() {
        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "old\n").unwrap();

        let mut df = DependencyFile::read(&gemfile).unwrap();
        fs::write(&gemfile, "new\n").unwrap();
        df.refresh().unwrap();

        assert_eq!(df.content, "new\n");
        assert_eq!(df.sha, content_sha1(b"new\n"));
    }

    #[test]
    fn test_write_restores_content() {
        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "original\n").unwrap();

        let df = DependencyFile::read(&gemfile).unwrap();
        fs::write(&gemfile, "mutated\n").unwrap();
        df.write().unwrap();

        assert_eq!(fs::read_to_string(&gemfile).unwrap(), "original\n");
    }

    #[test]
    fn test_write_empty_path_fails() {
        let df = DependencyFile {
            path: String::new(),
            sha: String::new(),
            content: "content".to_string(),
        };
        assert!(df.write().is_err());
    }

    #[test]
    fn test_patch_applies_and_refreshes() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }

        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "gem \"rails\", \"3.0.0\"\n").unwrap();

        let mut df = DependencyFile::read(&gemfile).unwrap();
        let patch_text = format!(
            "--- {p}\n+++ {p}\n@@ -1 +1 @@\n-gem \"rails\", \"3.0.0\"\n+gem \"rails\", \"4.0.0\"\n",
            p = gemfile
        );
        df.patch(&patch_text).unwrap();

        let on_disk = fs::read_to_string(&gemfile).unwrap();
        assert_eq!(on_disk, "gem \"rails\", \"4.0.0\"\n");
        // Bookkeeping never goes stale after a patch
        assert_eq!(df.content, on_disk);
        assert_eq!(df.sha, content_sha1(on_disk.as_bytes()));
    }

    #[test]
    fn test_patch_failure_surfaces_output() {
        if !patch_tool_available() {
            eprintln!("patch tool not available, skipping");
            return;
        }

        let dir = TempDir::new().unwrap();
        let gemfile = path_str(&dir, "Gemfile");
        fs::write(&gemfile, "something else entirely\n").unwrap();

        let mut df = DependencyFile::read(&gemfile).unwrap();
        // Hunk does not apply to the actual content
        let patch_text = format!(
            "--- {p}\n+++ {p}\n@@ -1 +1 @@\n-gem \"rails\", \"3.0.0\"\n+gem \"rails\", \"4.0.0\"\n",
            p = gemfile
        );
        let result = df.patch(&patch_text);
        assert!(result.is_err());
    }

    #[test]
    fn test_workdir() {
        let df = DependencyFile::new("sub/dir/Gemfile");
        assert_eq!(df.workdir(), PathBuf::from("sub/dir"));

        let df = DependencyFile::new("Gemfile");
        assert_eq!(df.workdir(), PathBuf::from("."));
    }

    #[test]
    fn test_serde_wire_format() {
        let df = DependencyFile {
            path: "Gemfile".to_string(),
            sha: "abc123".to_string(),
            content: "gem \"rails\"\n".to_string(),
        };
        let json = serde_json::to_string(&df).unwrap();
        assert!(json.contains("\"path\":\"Gemfile\""));
        assert!(json.contains("\"sha\":\"abc123\""));

        // Server file references omit content
        let parsed: DependencyFile =
            serde_json::from_str(r#"{"path":"Gemfile","sha":"abc123"}"#).unwrap();
        assert_eq!(parsed.path, "Gemfile");
        assert_eq!(parsed.sha, "abc123");
        assert!(parsed.content.is_empty());
    }

    #[test]
    fn test_serde_omits_empty_sha() {
        let df = DependencyFile::new("Gemfile");
        let json = serde_json::to_string(&df).unwrap();
        assert!(!json.contains("sha"));
    }
}

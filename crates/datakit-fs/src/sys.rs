//! Expanded, absolute path resolution
//!
//! [`SysPath`] is the working form of a path inside datakit: user and
//! environment expansion applied, resolved against a base directory, with
//! relative views computed on demand. It has no side effects beyond the
//! explicit `ensure_dirs` and `delete` operations, both idempotent.

use std::path::{Component, Path, PathBuf};
use std::{env, fs};

use crate::{Error, Result};

/// An expanded absolute filesystem path with relative-form helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysPath {
    abs_path: PathBuf,
}

impl SysPath {
    /// Resolve a path against the process working directory.
    ///
    /// Applies `~` and `$VAR`/`${VAR}` expansion first. Unset environment
    /// variables are left verbatim.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| Error::io(path.as_ref(), e))?;
        Self::with_base(path, &cwd)
    }

    /// Resolve a path against an explicit base directory.
    pub fn with_base(path: impl AsRef<Path>, base: &Path) -> Result<Self> {
        let expanded = expand(&path.as_ref().to_string_lossy())?;
        let expanded = PathBuf::from(expanded);

        let joined = if expanded.is_absolute() {
            expanded
        } else {
            base.join(expanded)
        };

        // Canonicalize existing paths so symlinked temp dirs compare equal;
        // fall back to lexical cleanup for paths that do not exist yet.
        let abs_path = match dunce::canonicalize(&joined) {
            Ok(canonical) => canonical,
            Err(_) => lexical_clean(&joined),
        };

        Ok(Self { abs_path })
    }

    /// The expanded absolute path.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// The path relative to `start`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRelative`] when the path does not fall under
    /// `start`.
    pub fn rel_path(&self, start: &Path) -> Result<PathBuf> {
        self.abs_path
            .strip_prefix(start)
            .map(Path::to_path_buf)
            .map_err(|_| Error::NotRelative {
                path: self.abs_path.clone(),
                start: start.to_path_buf(),
            })
    }

    /// The ordered relative path segments under `start`.
    pub fn rel_parts(&self, start: &Path) -> Result<Vec<String>> {
        Ok(self
            .rel_path(start)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect())
    }

    /// The final path component.
    pub fn basename(&self) -> Option<String> {
        self.abs_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn exists(&self) -> bool {
        self.abs_path.exists()
    }

    pub fn is_dir(&self) -> bool {
        self.abs_path.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.abs_path.is_file()
    }

    /// Create the directory chain for this path. No-op when present.
    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.abs_path.exists() {
            tracing::debug!(path = %self.abs_path.display(), "Creating directory tree");
            fs::create_dir_all(&self.abs_path).map_err(|e| Error::io(&self.abs_path, e))?;
        }
        Ok(())
    }

    /// Remove the file or directory tree at this path. No-op when absent.
    pub fn delete(&self) -> Result<()> {
        if !self.abs_path.exists() {
            return Ok(());
        }
        tracing::debug!(path = %self.abs_path.display(), "Deleting");
        if self.abs_path.is_dir() {
            fs::remove_dir_all(&self.abs_path).map_err(|e| Error::io(&self.abs_path, e))
        } else if self.abs_path.is_file() {
            fs::remove_file(&self.abs_path).map_err(|e| Error::io(&self.abs_path, e))
        } else {
            Err(Error::NotDeletable {
                path: self.abs_path.clone(),
            })
        }
    }
}

/// Expand `~` and environment variables in a path string.
fn expand(input: &str) -> Result<String> {
    let tilde_expanded = if input == "~" || input.starts_with("~/") || input.starts_with(r"~\") {
        let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
        if input == "~" {
            home.to_string_lossy().into_owned()
        } else {
            format!("{}{}", home.to_string_lossy(), &input[1..])
        }
    } else {
        input.to_string()
    };

    Ok(expand_env_vars(&tilde_expanded))
}

/// Expand `$VAR` and `${VAR}` occurrences from the environment.
///
/// Unset variables are left verbatim so a literal `$` in a file name does
/// not disappear.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let rest = &input[idx + 1..];
        let (name, consumed) = if let Some(inner) = rest.strip_prefix('{') {
            match inner.find('}') {
                Some(end) => (&inner[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = rest
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                .unwrap_or(rest.len());
            (&rest[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            continue;
        }

        match env::var(name) {
            Ok(value) => {
                out.push_str(&value);
                for _ in 0..consumed {
                    chars.next();
                }
            }
            Err(_) => out.push('$'),
        }
    }

    out
}

/// Lexically remove `.` and resolve `..` components without touching the
/// filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(component.as_os_str());
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_relative_resolves_against_base() {
        let temp = TempDir::new().unwrap();
        let sys = SysPath::with_base("data/core", temp.path()).unwrap();
        assert!(sys.abs_path().is_absolute());
        assert!(sys.abs_path().ends_with("data/core"));
    }

    #[test]
    fn test_absolute_ignores_base() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("f.csv");
        std::fs::write(&target, "x").unwrap();

        let sys = SysPath::with_base(&target, Path::new("/elsewhere")).unwrap();
        assert!(sys.abs_path().ends_with("f.csv"));
        assert!(sys.is_file());
    }

    #[test]
    fn test_tilde_expansion() {
        let home = dirs::home_dir().unwrap();
        let sys = SysPath::new("~/projects").unwrap();
        assert_eq!(sys.abs_path(), home.join("projects"));
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: test-local variable name, no concurrent reader cares.
        unsafe { env::set_var("DATAKIT_TEST_DIR", "expanded") };
        let temp = TempDir::new().unwrap();
        let sys = SysPath::with_base("$DATAKIT_TEST_DIR/f.csv", temp.path()).unwrap();
        assert!(sys.abs_path().ends_with("expanded/f.csv"));

        let braced = SysPath::with_base("${DATAKIT_TEST_DIR}/g.csv", temp.path()).unwrap();
        assert!(braced.abs_path().ends_with("expanded/g.csv"));
    }

    #[test]
    fn test_unset_env_var_left_verbatim() {
        assert_eq!(expand_env_vars("$DATAKIT_UNSET_VAR/x"), "$DATAKIT_UNSET_VAR/x");
    }

    #[test]
    fn test_rel_path_and_parts() {
        let temp = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        let sys = SysPath::with_base("data/core/f.csv", &root).unwrap();

        assert_eq!(sys.rel_path(&root).unwrap(), PathBuf::from("data/core/f.csv"));
        assert_eq!(sys.rel_parts(&root).unwrap(), vec!["data", "core", "f.csv"]);
        assert_eq!(sys.basename(), Some("f.csv".to_string()));
    }

    #[test]
    fn test_rel_path_outside_start_fails() {
        let temp = TempDir::new().unwrap();
        let sys = SysPath::with_base("f.csv", temp.path()).unwrap();
        assert!(sys.rel_path(Path::new("/nonexistent/elsewhere")).is_err());
    }

    #[test]
    fn test_ensure_dirs_idempotent() {
        let temp = TempDir::new().unwrap();
        let sys = SysPath::with_base("a/b/c", temp.path()).unwrap();

        sys.ensure_dirs().unwrap();
        assert!(sys.is_dir());
        sys.ensure_dirs().unwrap();
        assert!(sys.is_dir());
    }

    #[test]
    fn test_delete_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = SysPath::with_base("nested/dir", temp.path()).unwrap();
        dir.ensure_dirs().unwrap();
        std::fs::write(dir.abs_path().join("f.csv"), "x").unwrap();

        dir.delete().unwrap();
        assert!(!dir.exists());
        dir.delete().unwrap();

        let file = SysPath::with_base("f.txt", temp.path()).unwrap();
        std::fs::write(file.abs_path(), "x").unwrap();
        file.delete().unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_lexical_clean() {
        assert_eq!(
            lexical_clean(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }
}

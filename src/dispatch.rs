use crate::builtins::Builtin;
use std::env;
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// What a command name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Builtin(Builtin),
    /// Absolute path of the executable found for the name.
    Executable(PathBuf),
    Unknown,
}

/// Classifies a command name.
///
/// Builtins always win over an executable of the same name. Otherwise the
/// directories of `search_path` are tried in order; names containing a `/`
/// are checked as paths instead. Nothing but the file system is consulted.
pub fn classify(name: &str, search_path: Option<&OsStr>) -> CommandKind {
    if let Ok(builtin) = name.parse::<Builtin>() {
        return CommandKind::Builtin(builtin);
    }
    match find_executable(name, search_path) {
        Some(path) => CommandKind::Executable(path),
        None => CommandKind::Unknown,
    }
}

/// Searches `search_path` for an executable with the given name.
///
/// Returns `Some(PathBuf)` if found and executable, otherwise `None`.
pub fn find_executable(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains('/') {
        let path = Path::new(name);
        return is_executable(path).then(|| absolute(path));
    }

    for dir in env::split_paths(search_path?) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let full_path = dir.join(name);
        if is_executable(&full_path) {
            return Some(absolute(&full_path));
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

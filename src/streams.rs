//! Standard streams of a command and the scoped redirection applier.
//!
//! Commands never touch the process-wide handles directly: they write to the
//! [`StreamSet`] they are given. [`apply`] swaps files into that set and the
//! returned [`RedirectGuard`] puts the original handles back when released or
//! dropped, whichever comes first.

use crate::error::RedirectError;
use crate::redirect::{RedirectKind, Redirection, Target};
use bytes::BytesMut;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::Stdio;
use std::rc::Rc;

/// Permissions for files created by output redirection.
const REDIRECT_FILE_MODE: u32 = 0o644;

/// Shared in-memory output, used to capture what a command writes.
#[derive(Debug, Clone, Default)]
pub struct Buffer(Rc<RefCell<BytesMut>>);

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn extend_from_slice(&self, data: &[u8]) {
        self.0.borrow_mut().extend_from_slice(data);
    }

    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Write for Buffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where a command's output goes.
#[derive(Debug)]
pub enum Output {
    Stdout,
    Stderr,
    File(File),
    Buffer(Buffer),
}

impl Output {
    /// Handle to hand to a child process. Buffers are piped and have to be
    /// filled by the caller once the child exits.
    pub fn to_stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Output::Stdout => Stdio::from(io::stdout()),
            Output::Stderr => Stdio::from(io::stderr()),
            Output::File(file) => Stdio::from(file.try_clone()?),
            Output::Buffer(_) => Stdio::piped(),
        })
    }

    /// True if both refer to the same underlying handle.
    pub fn same_as(&self, other: &Output) -> bool {
        match (self, other) {
            (Output::Stdout, Output::Stdout) | (Output::Stderr, Output::Stderr) => true,
            (Output::File(a), Output::File(b)) => a.as_raw_fd() == b.as_raw_fd(),
            (Output::Buffer(a), Output::Buffer(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Write for Output {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout => io::stdout().write(data),
            Output::Stderr => io::stderr().write(data),
            Output::File(file) => file.write(data),
            Output::Buffer(buffer) => buffer.write(data),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().flush(),
            Output::Stderr => io::stderr().flush(),
            Output::File(file) => file.flush(),
            Output::Buffer(buffer) => buffer.flush(),
        }
    }
}

/// Where a command's input comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Stdin,
    Null,
}

impl Input {
    pub fn to_stdio(self) -> Stdio {
        match self {
            Input::Stdin => Stdio::inherit(),
            Input::Null => Stdio::null(),
        }
    }
}

/// The three standard streams a command runs with.
#[derive(Debug)]
pub struct StreamSet {
    pub stdin: Input,
    pub stdout: Output,
    pub stderr: Output,
}

impl StreamSet {
    /// The process' own streams.
    pub fn inherit() -> Self {
        Self {
            stdin: Input::Stdin,
            stdout: Output::Stdout,
            stderr: Output::Stderr,
        }
    }

    /// Streams writing to fresh buffers, with no input.
    ///
    /// Returns the set along with handles to its stdout and stderr buffers.
    pub fn captured() -> (Self, Buffer, Buffer) {
        let (out, err) = (Buffer::new(), Buffer::new());
        let streams = Self {
            stdin: Input::Null,
            stdout: Output::Buffer(out.clone()),
            stderr: Output::Buffer(err.clone()),
        };
        (streams, out, err)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()
    }
}

#[derive(Debug, Default)]
struct Saved {
    stdout: Option<Output>,
    stderr: Option<Output>,
}

/// Redirected view of a [`StreamSet`]. Restores the original streams on
/// [`release`](RedirectGuard::release) or drop.
#[derive(Debug)]
pub struct RedirectGuard<'a> {
    streams: &'a mut StreamSet,
    saved: Saved,
}

impl RedirectGuard<'_> {
    /// Restores the original streams, flushing and closing redirected files.
    pub fn release(mut self) -> io::Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> io::Result<()> {
        let mut result = Ok(());
        if let Some(original) = self.saved.stdout.take() {
            let mut redirected = std::mem::replace(&mut self.streams.stdout, original);
            result = result.and(redirected.flush());
            log::debug!("restored stdout");
        }
        if let Some(original) = self.saved.stderr.take() {
            let mut redirected = std::mem::replace(&mut self.streams.stderr, original);
            result = result.and(redirected.flush());
            log::debug!("restored stderr");
        }
        result
    }
}

impl Deref for RedirectGuard<'_> {
    type Target = StreamSet;

    fn deref(&self) -> &StreamSet {
        self.streams
    }
}

impl DerefMut for RedirectGuard<'_> {
    fn deref_mut(&mut self) -> &mut StreamSet {
        self.streams
    }
}

impl Drop for RedirectGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            log::warn!("flushing redirected output failed: {e}");
        }
    }
}

/// Installs `redirections` into `streams`.
///
/// Only the first redirection is honored; the rest are logged and ignored.
/// Its target is opened before any stream is replaced, so on error `streams`
/// is exactly as it was. Only `>` and `>>` on descriptors 1 and 2 take
/// effect; other redirections are skipped with a warning.
pub fn apply<'a>(
    streams: &'a mut StreamSet,
    redirections: &[Redirection],
) -> Result<RedirectGuard<'a>, RedirectError> {
    let mut saved = Saved::default();

    if let [first, rest @ ..] = redirections {
        if !rest.is_empty() {
            log::warn!("only the first redirection is applied, ignoring {} more", rest.len());
        }
        if let Some((fd, file)) = open_redirection(first)? {
            let (slot, keep) = if fd == 1 {
                (&mut streams.stdout, &mut saved.stdout)
            } else {
                (&mut streams.stderr, &mut saved.stderr)
            };
            *keep = Some(std::mem::replace(slot, Output::File(file)));
            log::debug!("descriptor {fd} redirected");
        }
    }

    Ok(RedirectGuard { streams, saved })
}

/// Opens the file a redirection writes to, or `None` if it is skipped.
fn open_redirection(redirection: &Redirection) -> Result<Option<(u32, File)>, RedirectError> {
    let append = match redirection.kind {
        RedirectKind::Truncate => false,
        RedirectKind::Append => true,
        RedirectKind::Input | RedirectKind::HereDoc | RedirectKind::Duplicate => {
            log::warn!("redirection {redirection} is not supported, ignoring it");
            return Ok(None);
        }
    };
    let path = match &redirection.target {
        Some(Target::Path(path)) => path,
        Some(Target::Fd(_)) => {
            log::warn!("redirection {redirection} has no file target, ignoring it");
            return Ok(None);
        }
        None => {
            return Err(RedirectError::MissingTarget {
                operator: redirection.kind.operator(),
            });
        }
    };
    if !matches!(redirection.fd, 1 | 2) {
        log::warn!("redirecting descriptor {} is not supported", redirection.fd);
        return Ok(None);
    }

    let file = open_target(Path::new(path), append)?;
    Ok(Some((redirection.fd, file)))
}

/// Runs `f` with `redirections` applied, restoring the streams afterwards
/// whatever `f` returns.
pub fn with_redirections<T>(
    streams: &mut StreamSet,
    redirections: &[Redirection],
    f: impl FnOnce(&mut StreamSet) -> T,
) -> Result<T, RedirectError> {
    let mut guard = apply(streams, redirections)?;
    let result = f(&mut *guard);
    if let Err(e) = guard.release() {
        log::warn!("flushing redirected output failed: {e}");
    }
    Ok(result)
}

fn open_target(path: &Path, append: bool) -> Result<File, RedirectError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(REDIRECT_FILE_MODE)
        .open(path)
        .map_err(|source| RedirectError::Open {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScratchDir;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn truncate_redirects_stdout_into_file() {
        let dir = ScratchDir::new("truncate");
        let path = dir.path().join("out.txt");
        fs::write(&path, "old contents that should vanish\n").unwrap();

        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, path.to_str().unwrap())];
        with_redirections(&mut streams, &redirections, |s| writeln!(s.stdout, "hello"))
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn append_keeps_existing_contents() {
        let dir = ScratchDir::new("append");
        let path = dir.path().join("out.txt");
        fs::write(&path, "first\n").unwrap();

        let (mut streams, _, _) = StreamSet::captured();
        let redirections = [Redirection::append(1, path.to_str().unwrap())];
        with_redirections(&mut streams, &redirections, |s| writeln!(s.stdout, "second"))
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn created_file_is_owner_read_write() {
        let dir = ScratchDir::new("mode");
        let path = dir.path().join("new.txt");

        let (mut streams, _, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, path.to_str().unwrap())];
        apply(&mut streams, &redirections).unwrap().release().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn stderr_redirection_leaves_stdout_alone() {
        let dir = ScratchDir::new("stderr");
        let path = dir.path().join("err.txt");

        let (mut streams, out, err) = StreamSet::captured();
        let redirections = [Redirection::truncate(2, path.to_str().unwrap())];
        with_redirections(&mut streams, &redirections, |s| {
            writeln!(s.stdout, "to stdout").unwrap();
            writeln!(s.stderr, "to file").unwrap();
        })
        .unwrap();

        assert_eq!(out.contents(), "to stdout\n");
        assert_eq!(err.contents(), "");
        assert_eq!(fs::read_to_string(&path).unwrap(), "to file\n");
    }

    #[test]
    fn release_restores_the_identical_stream() {
        let dir = ScratchDir::new("identity");
        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, dir.path().join("x").to_str().unwrap())];

        let guard = apply(&mut streams, &redirections).unwrap();
        assert!(!guard.stdout.same_as(&Output::Buffer(out.clone())));
        guard.release().unwrap();

        assert!(streams.stdout.same_as(&Output::Buffer(out.clone())));
    }

    #[test]
    fn streams_restored_when_command_fails() {
        let dir = ScratchDir::new("failure");
        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, dir.path().join("x").to_str().unwrap())];

        let result: Result<(), &str> =
            with_redirections(&mut streams, &redirections, |_| Err("handler failed")).unwrap();

        assert!(result.is_err());
        assert!(streams.stdout.same_as(&Output::Buffer(out)));
    }

    #[test]
    fn streams_restored_when_command_panics() {
        let dir = ScratchDir::new("panic");
        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, dir.path().join("x").to_str().unwrap())];

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = with_redirections(&mut streams, &redirections, |_| panic!("handler panicked"));
        }));

        assert!(caught.is_err());
        assert!(streams.stdout.same_as(&Output::Buffer(out)));
    }

    #[test]
    fn open_failure_leaves_streams_untouched() {
        let dir = ScratchDir::new("open-failure");
        let bad = dir.path().join("missing-dir").join("out.txt");
        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [Redirection::truncate(1, bad.to_str().unwrap())];

        let err = apply(&mut streams, &redirections).unwrap_err();
        assert!(matches!(err, RedirectError::Open { .. }));

        writeln!(streams.stdout, "sentinel").unwrap();
        assert_eq!(out.contents(), "sentinel\n");
        assert!(!bad.exists());
    }

    #[test]
    fn only_first_redirection_is_honored() {
        let dir = ScratchDir::new("first-only");
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        let (mut streams, out, _) = StreamSet::captured();
        let redirections = [
            Redirection::truncate(1, first.to_str().unwrap()),
            Redirection::truncate(1, second.to_str().unwrap()),
        ];

        with_redirections(&mut streams, &redirections, |s| writeln!(s.stdout, "data"))
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(&first).unwrap(), "data\n");
        assert!(!second.exists());
        assert!(streams.stdout.same_as(&Output::Buffer(out)));
    }

    #[test]
    fn later_redirection_problems_are_ignored() {
        let dir = ScratchDir::new("later-ignored");
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("missing-dir").join("bad.txt");
        let (mut streams, _, _) = StreamSet::captured();
        let redirections = [
            Redirection::truncate(1, good.to_str().unwrap()),
            Redirection::truncate(2, bad.to_str().unwrap()),
            Redirection::new(RedirectKind::Truncate, 1, None),
        ];

        with_redirections(&mut streams, &redirections, |s| writeln!(s.stdout, "ok"))
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(&good).unwrap(), "ok\n");
    }

    #[test]
    fn missing_target_is_an_error() {
        let (mut streams, _, _) = StreamSet::captured();
        let redirections = [Redirection::new(RedirectKind::Truncate, 1, None)];
        let err = apply(&mut streams, &redirections).unwrap_err();
        assert_eq!(err.to_string(), "syntax error near unexpected token `newline'");
    }

    #[test]
    fn unsupported_kinds_are_skipped() {
        let (mut streams, out, err) = StreamSet::captured();
        let redirections = [
            Redirection::new(RedirectKind::Duplicate, 2, Some(Target::Fd(1))),
            Redirection::new(RedirectKind::Input, 0, Some(Target::Path("in.txt".into()))),
        ];
        with_redirections(&mut streams, &redirections, |s| writeln!(s.stdout, "kept"))
            .unwrap()
            .unwrap();

        assert_eq!(out.contents(), "kept\n");
        assert!(streams.stderr.same_as(&Output::Buffer(err)));
        assert!(!Path::new("in.txt").exists());
    }
}

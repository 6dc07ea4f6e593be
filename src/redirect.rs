//! Redirection model and the token classifier.
//!
//! Recognized shapes (optional descriptor prefix `N`, optional fused target):
//! `>`, `N>`, `>>`, `N>>`, `N>&M`. Anything else containing `>` degrades to a
//! plain `>` on stdout.

use std::fmt;

/// Character that marks a token as a redirection.
pub const REDIRECT_MARKER: char = '>';

/// Kinds of redirection known to the shell.
///
/// Only `Truncate` and `Append` are applied; the rest are recognized so they
/// can be reported and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `>`
    Truncate,
    /// `>>`
    Append,
    /// `<`
    Input,
    /// `<<`
    HereDoc,
    /// `N>&M`
    Duplicate,
}

impl RedirectKind {
    pub fn operator(&self) -> &'static str {
        match self {
            RedirectKind::Truncate => ">",
            RedirectKind::Append => ">>",
            RedirectKind::Input => "<",
            RedirectKind::HereDoc => "<<",
            RedirectKind::Duplicate => ">&",
        }
    }
}

/// What a redirection points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(String),
    Fd(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub kind: RedirectKind,
    pub fd: u32,
    /// `None` until the command builder fills it from the following token.
    pub target: Option<Target>,
}

impl Redirection {
    pub fn new(kind: RedirectKind, fd: u32, target: Option<Target>) -> Self {
        Self { kind, fd, target }
    }

    /// Shorthand for `fd> path`.
    pub fn truncate(fd: u32, path: impl Into<String>) -> Self {
        Self::new(RedirectKind::Truncate, fd, Some(Target::Path(path.into())))
    }

    /// Shorthand for `fd>> path`.
    pub fn append(fd: u32, path: impl Into<String>) -> Self {
        Self::new(RedirectKind::Append, fd, Some(Target::Path(path.into())))
    }

    pub fn is_pending(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.fd, self.kind.operator())?;
        match &self.target {
            Some(Target::Path(path)) => write!(f, " {path}"),
            Some(Target::Fd(fd)) => write!(f, "{fd}"),
            None => Ok(()),
        }
    }
}

/// Returns true if the token should be handed to [`parse`].
pub fn is_redirection(token: &str) -> bool {
    token.contains(REDIRECT_MARKER)
}

/// Classifies a redirection token.
///
/// Never fails: shapes that are not understood fall back to `>` on
/// descriptor 1, keeping whatever follows the last `>` as a fused target.
pub fn parse(token: &str) -> Redirection {
    let Some(pos) = token.find(REDIRECT_MARKER) else {
        return Redirection::new(RedirectKind::Truncate, 1, None);
    };
    let (prefix, rest) = (&token[..pos], &token[pos + 1..]);

    let fd = if prefix.is_empty() {
        Some(1)
    } else if prefix.bytes().all(|b| b.is_ascii_digit()) {
        prefix.parse::<u32>().ok()
    } else {
        None
    };

    let Some(fd) = fd else {
        return degrade(token);
    };

    let (kind, rest) = match rest.strip_prefix(REDIRECT_MARKER) {
        Some(rest) => (RedirectKind::Append, rest),
        None => (RedirectKind::Truncate, rest),
    };

    if let Some(dup) = rest.strip_prefix('&') {
        if kind == RedirectKind::Truncate
            && let Ok(to) = dup.parse::<u32>()
        {
            return Redirection::new(RedirectKind::Duplicate, fd, Some(Target::Fd(to)));
        }
        return degrade(token);
    }

    if rest.contains(REDIRECT_MARKER) {
        return degrade(token);
    }

    Redirection::new(kind, fd, fused_target(rest))
}

fn degrade(token: &str) -> Redirection {
    log::warn!("unsupported redirection {token:?}, treating it as '>'");
    let rest = token
        .rsplit(REDIRECT_MARKER)
        .next()
        .unwrap_or_default()
        .trim_start_matches('&');
    Redirection::new(RedirectKind::Truncate, 1, fused_target(rest))
}

fn fused_target(rest: &str) -> Option<Target> {
    if rest.is_empty() {
        None
    } else {
        Some(Target::Path(rest.to_string()))
    }
}

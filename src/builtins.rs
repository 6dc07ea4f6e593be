use crate::ShellStatus;
use crate::config::Config;
use crate::dispatch::{self, CommandKind};
use crate::streams::StreamSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Enumeration of all supported builtin commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Echo,
    Type,
    Pwd,
    Cd,
}

impl FromStr for Builtin {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exit" => Ok(Builtin::Exit),
            "echo" => Ok(Builtin::Echo),
            "type" => Ok(Builtin::Type),
            "pwd" => Ok(Builtin::Pwd),
            "cd" => Ok(Builtin::Cd),
            _ => Err(()),
        }
    }
}

impl Builtin {
    /// Executes the builtin command.
    ///
    /// `argv` starts with the command name. Problems are reported on the
    /// command's stderr and never returned. Returns a `ShellStatus`
    /// indicating whether the shell should continue or exit with a specific code.
    pub fn execute(
        &self,
        argv: &[String],
        streams: &mut StreamSet,
        config: &Config,
    ) -> ShellStatus {
        let args = argv.get(1..).unwrap_or_default();
        let result = match self {
            Builtin::Exit => return exit_cmd(args, streams),
            Builtin::Echo => echo_cmd(args, streams),
            Builtin::Type => type_cmd(args, streams, config),
            Builtin::Pwd => pwd_cmd(streams),
            Builtin::Cd => cd_cmd(args, streams, config),
        };
        if let Err(e) = result {
            log::warn!("{self:?}: writing output failed: {e}");
        }
        ShellStatus::Continue
    }
}

fn exit_cmd(args: &[String], streams: &mut StreamSet) -> ShellStatus {
    let Some(code) = args.first() else {
        return ShellStatus::Exit(0);
    };
    match code.parse::<i32>() {
        Ok(code) => ShellStatus::Exit(code),
        Err(_) => {
            let _ = writeln!(streams.stderr, "Invalid exit status, must be an integer");
            ShellStatus::Continue
        }
    }
}

/// Implementation of the `echo` command.
///
/// Prints the arguments to stdout, separated by spaces.
fn echo_cmd(args: &[String], streams: &mut StreamSet) -> io::Result<()> {
    writeln!(streams.stdout, "{}", args.join(" "))
}

/// Implementation of the `type` command.
///
/// Identifies whether a command is a builtin or an executable in the PATH.
fn type_cmd(args: &[String], streams: &mut StreamSet, config: &Config) -> io::Result<()> {
    for command in args {
        match dispatch::classify(command, config.search_path.as_deref()) {
            CommandKind::Builtin(_) => writeln!(streams.stdout, "{command} is a shell builtin")?,
            CommandKind::Executable(path) => {
                writeln!(streams.stdout, "{command} is {}", path.display())?
            }
            CommandKind::Unknown => writeln!(streams.stderr, "{command}: not found")?,
        }
    }
    Ok(())
}

fn pwd_cmd(streams: &mut StreamSet) -> io::Result<()> {
    match std::env::current_dir() {
        Ok(path) => writeln!(streams.stdout, "{}", path.display()),
        Err(e) => writeln!(
            streams.stderr,
            "pwd: error retrieving current directory: {e}"
        ),
    }
}

fn cd_cmd(args: &[String], streams: &mut StreamSet, config: &Config) -> io::Result<()> {
    let target = args.first().map(String::as_str).unwrap_or("~");

    let new_dir = match target.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match &config.home {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => return writeln!(streams.stderr, "cd: HOME not set"),
        },
        _ => PathBuf::from(target),
    };

    if !new_dir.exists() {
        return writeln!(streams.stderr, "cd: {target}: No such file or directory");
    }
    if let Err(e) = std::env::set_current_dir(&new_dir) {
        return writeln!(streams.stderr, "cd: {target}: {e}");
    }
    log::debug!("changed directory to {}", new_dir.display());
    Ok(())
}

use std::io::Write;

pub mod builtins;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod logging;
pub mod parser;
pub mod redirect;
pub mod streams;

#[cfg(test)]
mod testutil;

pub use builtins::Builtin;
pub use command::Command;
pub use config::Config;
pub use dispatch::{CommandKind, classify};
pub use error::{ExecError, RedirectError};
pub use parser::tokenize;
pub use redirect::{RedirectKind, Redirection, Target};
pub use streams::{Buffer, Input, Output, StreamSet};

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStatus {
    /// The shell should continue running.
    Continue,
    /// The shell should exit with the provided code.
    Exit(i32),
}

/// One interpreter: its configuration and the streams commands run with.
pub struct Shell {
    config: Config,
    streams: StreamSet,
}

impl Shell {
    pub fn new(config: Config, streams: StreamSet) -> Self {
        Self { config, streams }
    }

    pub fn streams_mut(&mut self) -> &mut StreamSet {
        &mut self.streams
    }

    /// Tokenizes, builds and executes one input line.
    pub fn run_line(&mut self, line: &str) -> ShellStatus {
        let tokens = tokenize(line);
        log::debug!("tokens: {tokens:?}");

        let command = Command::build(&tokens);
        if command.is_empty() {
            return ShellStatus::Continue;
        }
        self.execute(&command)
    }

    /// Orchestrates command execution.
    ///
    /// The command is classified, then run with its redirections applied.
    /// Streams are restored before this returns, whatever the command did.
    pub fn execute(&mut self, command: &Command) -> ShellStatus {
        let kind = classify(&command.name, self.config.search_path.as_deref());
        log::debug!("{} resolved to {kind:?}", command.name);

        let config = &self.config;
        let redirections = &command.redirections;
        let result = streams::with_redirections(&mut self.streams, redirections, |streams| {
            run_command(kind, command, streams, config)
        });

        match result {
            Ok(status) => status,
            Err(e) => {
                let _ = writeln!(self.streams.stderr, "{e}");
                ShellStatus::Continue
            }
        }
    }
}

fn run_command(
    kind: CommandKind,
    command: &Command,
    streams: &mut StreamSet,
    config: &Config,
) -> ShellStatus {
    match kind {
        CommandKind::Builtin(builtin) => builtin.execute(&command.argv(), streams, config),
        CommandKind::Executable(path) => {
            if let Err(e) = exec::run(&path, &command.name, &command.args, streams) {
                let _ = writeln!(streams.stderr, "{e}");
            }
            ShellStatus::Continue
        }
        CommandKind::Unknown => {
            let _ = writeln!(streams.stderr, "{}: command not found", command.name);
            ShellStatus::Continue
        }
    }
}

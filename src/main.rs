use anyhow::Context;
use minishell::{Config, Shell, ShellStatus, StreamSet};
use std::{
    io::{self, BufRead, Write},
    process,
};
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    if let Err(e) = minishell::logging::init(&config) {
        eprintln!("minishell: logging disabled: {e:#}");
    }

    let interactive = termion::is_tty(&io::stdin());
    let prompt = config.prompt.clone();
    let mut shell = Shell::new(config, StreamSet::inherit());

    loop {
        print!("{prompt}");
        io::stdout().flush().context("writing prompt")?;

        let line = if interactive {
            read_line_raw()?
        } else {
            read_line_buffered()?
        };
        let Some(line) = line else {
            return Ok(());
        };

        match shell.run_line(&line) {
            ShellStatus::Exit(code) => {
                let _ = shell.streams_mut().flush();
                process::exit(code)
            }
            ShellStatus::Continue => continue,
        }
    }
}

/// Reads one line from a terminal in raw mode. `None` means end of input.
fn read_line_raw() -> anyhow::Result<Option<String>> {
    // Enter raw mode to handle input character by character
    let mut stdout = io::stdout()
        .into_raw_mode()
        .context("switching terminal to raw mode")?;
    let mut buffer = String::new();

    for key in io::stdin().keys() {
        match key.context("reading input")? {
            Key::Ctrl('c') => {
                buffer.clear();
                write!(stdout, "\r\n")?;
                return Ok(Some(buffer));
            }
            Key::Ctrl('d') => {
                if buffer.is_empty() {
                    write!(stdout, "\r\n")?;
                    return Ok(None);
                }
            }
            Key::Char('\n') | Key::Char('\r') => {
                write!(stdout, "\r\n")?;
                return Ok(Some(buffer));
            }
            Key::Backspace => {
                if buffer.pop().is_some() {
                    // Move cursor back, erase char with space, move back again
                    write!(stdout, "\x08 \x08")?;
                    stdout.flush()?;
                }
            }
            Key::Char(c) => {
                buffer.push(c);
                write!(stdout, "{c}")?;
                stdout.flush()?;
            }
            _ => {}
        }
    }

    // stdin closed mid-line
    Ok((!buffer.is_empty()).then_some(buffer))
}

/// Reads one line when stdin is not a terminal. `None` means end of input.
fn read_line_buffered() -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let read = BufRead::read_line(&mut io::stdin().lock(), &mut line).context("reading input")?;
    Ok((read > 0).then_some(line))
}

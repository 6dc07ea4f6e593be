use crate::redirect::{self, Redirection, Target};

/// A single parsed input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    /// In the order they appeared on the line.
    pub redirections: Vec<Redirection>,
}

impl Command {
    /// Partitions tokens into name, arguments and redirections.
    ///
    /// A redirection token without a fused target takes the next token as its
    /// target, so `> out.txt` and `>out.txt` build the same command.
    pub fn build<S: AsRef<str>>(tokens: &[S]) -> Command {
        let mut tokens = tokens.iter().map(AsRef::as_ref);
        let Some(name) = tokens.next() else {
            return Command::default();
        };

        let mut command = Command {
            name: name.to_string(),
            ..Command::default()
        };

        while let Some(token) = tokens.next() {
            if !redirect::is_redirection(token) {
                command.args.push(token.to_string());
                continue;
            }

            let mut redirection = redirect::parse(token);
            if redirection.is_pending()
                && let Some(target) = tokens.next()
            {
                redirection.target = Some(Target::Path(target.to_string()));
            }
            command.redirections.push(redirection);
        }

        command
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Name followed by arguments, the shape builtin handlers receive.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::RedirectKind;

    #[test]
    fn empty_tokens_build_empty_command() {
        let command = Command::build::<&str>(&[]);
        assert!(command.is_empty());
        assert!(command.args.is_empty());
        assert!(command.redirections.is_empty());
    }

    #[test]
    fn separate_target_token_is_consumed() {
        let command = Command::build(&["echo", "hi", ">", "out.txt"]);
        assert_eq!(
            command,
            Command {
                name: "echo".into(),
                args: vec!["hi".into()],
                redirections: vec![Redirection::truncate(1, "out.txt")],
            }
        );
    }

    #[test]
    fn fused_target_does_not_consume_next_token() {
        let command = Command::build(&["echo", ">out.txt", "hi"]);
        assert_eq!(command.args, vec!["hi"]);
        assert_eq!(command.redirections, vec![Redirection::truncate(1, "out.txt")]);
    }

    #[test]
    fn redirection_may_appear_anywhere() {
        let command = Command::build(&["cat", "2>", "err.log", "a.txt", "1>>", "out.log", "b.txt"]);
        assert_eq!(command.args, vec!["a.txt", "b.txt"]);
        assert_eq!(
            command.redirections,
            vec![Redirection::truncate(2, "err.log"), Redirection::append(1, "out.log")]
        );
    }

    #[test]
    fn order_of_redirections_is_preserved() {
        let command = Command::build(&["ls", ">", "a", ">", "b"]);
        assert_eq!(
            command.redirections,
            vec![Redirection::truncate(1, "a"), Redirection::truncate(1, "b")]
        );
    }

    #[test]
    fn trailing_operator_stays_pending() {
        let command = Command::build(&["echo", "hi", ">"]);
        assert_eq!(command.args, vec!["hi"]);
        assert_eq!(command.redirections.len(), 1);
        assert!(command.redirections[0].is_pending());
        assert_eq!(command.redirections[0].kind, RedirectKind::Truncate);
    }

    #[test]
    fn argv_includes_name() {
        let command = Command::build(&["type", "echo"]);
        assert_eq!(command.argv(), vec!["type", "echo"]);
    }
}

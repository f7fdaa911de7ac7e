use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// REPL commands offered for completion.
pub const COMMANDS: [&str; 4] = ["/history", "/schema", "/clear", "/quit"];

/// Rustyline helper providing command completion, highlighting and hints.
#[derive(Clone, Default)]
pub struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok((0, command_candidates(&line[..pos])))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        command_hint(&line[..pos])
    }
}

impl Validator for CliHelper {}

fn command_candidates(prefix: &str) -> Vec<Pair> {
    if !prefix.starts_with('/') {
        return vec![];
    }
    COMMANDS
        .iter()
        .filter(|cmd| cmd.starts_with(prefix))
        .map(|cmd| Pair {
            display: cmd.to_string(),
            replacement: cmd.to_string(),
        })
        .collect()
}

fn command_hint(prefix: &str) -> Option<String> {
    if !prefix.starts_with('/') || prefix.contains(' ') {
        return None;
    }
    COMMANDS
        .iter()
        .find(|cmd| cmd.starts_with(prefix) && cmd.len() > prefix.len())
        .map(|cmd| cmd[prefix.len()..].to_string())
}

/// Helper that echoes `*` for every typed character.
#[derive(Default)]
pub struct PasswordHelper;

impl Helper for PasswordHelper {}

impl Completer for PasswordHelper {
    type Candidate = String;
}

impl Hinter for PasswordHelper {
    type Hint = String;
}

impl Highlighter for PasswordHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for PasswordHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_commands_by_prefix() {
        let names: Vec<String> = command_candidates("/s")
            .into_iter()
            .map(|pair| pair.replacement)
            .collect();
        assert_eq!(names, vec!["/schema"]);
        assert_eq!(command_candidates("/").len(), COMMANDS.len());
        assert!(command_candidates("how many").is_empty());
    }

    #[test]
    fn hints_the_rest_of_a_command() {
        assert_eq!(command_hint("/hi").as_deref(), Some("story"));
        assert_eq!(command_hint("/quit"), None);
        assert_eq!(command_hint("/quit now"), None);
        assert_eq!(command_hint("hello"), None);
    }
}

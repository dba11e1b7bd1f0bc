//! @acp:module "Scripted Prompter"
//! @acp:summary "Answers prompts from a queue, for tests and headless runs"
//! @acp:domain cli
//! @acp:layer handler

use std::collections::VecDeque;
use std::io;

use super::Prompter;
use crate::error::{CliError, Result};

/// One canned answer
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Select the item whose text is this, or starts with it followed by a space
    Choose(String),
    /// Multi-select the listed items
    ChooseMany(Vec<String>),
    /// Type this text
    Text(String),
    /// Accept whatever the prompt preselects or prefills
    Accept,
    /// Back out, as Ctrl-C or Esc would
    Cancel,
}

impl Answer {
    pub fn choose(item: impl Into<String>) -> Self {
        Answer::Choose(item.into())
    }

    pub fn choose_many<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::ChooseMany(items.into_iter().map(Into::into).collect())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Answer::Text(text.into())
    }
}

/// @acp:summary "Replays answers in order and records every question asked"
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I: IntoIterator<Item = Answer>>(answers: I) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Messages of all prompts shown so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<Answer> {
        self.asked.push(message.to_string());
        self.answers.pop_front().ok_or_else(|| {
            CliError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for `{message}`"),
            ))
        })
    }
}

fn mismatch(message: &str, answer: &Answer) -> CliError {
    CliError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("scripted answer {answer:?} does not fit `{message}`"),
    ))
}

fn position(items: &[String], wanted: &str) -> Option<usize> {
    items.iter().position(|item| {
        item == wanted
            || item
                .strip_prefix(wanted)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

impl Prompter for ScriptedPrompter {
    fn select(
        &mut self,
        message: &str,
        items: &[String],
        default: Option<usize>,
    ) -> Result<Option<usize>> {
        match self.next(message)? {
            Answer::Choose(wanted) => position(items, &wanted)
                .map(Some)
                .ok_or_else(|| mismatch(message, &Answer::Choose(wanted))),
            Answer::Accept if !items.is_empty() => Ok(Some(default.unwrap_or(0))),
            Answer::Cancel => Ok(None),
            other => Err(mismatch(message, &other)),
        }
    }

    fn multi_select(
        &mut self,
        message: &str,
        items: &[String],
        defaults: &[bool],
    ) -> Result<Option<Vec<usize>>> {
        match self.next(message)? {
            Answer::ChooseMany(wanted) => {
                let mut picked = Vec::with_capacity(wanted.len());
                for item in &wanted {
                    let index = position(items, item)
                        .ok_or_else(|| mismatch(message, &Answer::Choose(item.clone())))?;
                    picked.push(index);
                }
                Ok(Some(picked))
            }
            Answer::Accept => Ok(Some(
                defaults
                    .iter()
                    .enumerate()
                    .filter_map(|(index, &on)| on.then_some(index))
                    .collect(),
            )),
            Answer::Cancel => Ok(None),
            other => Err(mismatch(message, &other)),
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>> {
        match self.next(message)? {
            Answer::Text(text) => Ok(Some(text)),
            Answer::Accept => default
                .map(|default| Some(default.to_string()))
                .ok_or_else(|| mismatch(message, &Answer::Accept)),
            Answer::Cancel => Ok(None),
            other => Err(mismatch(message, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        vec!["git - git helpers".into(), "demo".into()]
    }

    #[test]
    fn test_choose_matches_label_prefix() {
        let mut prompter = ScriptedPrompter::new([Answer::choose("git"), Answer::choose("demo")]);
        assert_eq!(prompter.select("cmd", &items(), None).unwrap(), Some(0));
        assert_eq!(prompter.select("cmd", &items(), None).unwrap(), Some(1));
        assert_eq!(prompter.asked().len(), 2);
    }

    #[test]
    fn test_accept_uses_defaults() {
        let mut prompter = ScriptedPrompter::new([Answer::Accept, Answer::Accept, Answer::Accept]);
        assert_eq!(prompter.select("x", &items(), Some(1)).unwrap(), Some(1));
        assert_eq!(
            prompter.multi_select("y", &items(), &[true, false]).unwrap(),
            Some(vec![0])
        );
        assert_eq!(prompter.input("z", Some("d")).unwrap(), Some("d".to_string()));
    }

    #[test]
    fn test_cancel_and_exhaustion() {
        let mut prompter = ScriptedPrompter::new([Answer::Cancel]);
        assert_eq!(prompter.input("sure?", Some("y")).unwrap(), None);
        assert!(prompter.input("again", None).is_err());
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_unknown_item_is_an_error() {
        let mut prompter = ScriptedPrompter::new([Answer::choose("gi")]);
        assert!(prompter.select("cmd", &items(), None).is_err());
    }
}

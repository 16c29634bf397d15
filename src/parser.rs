// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Plain-text transcript parsing.
//!
//! This module segments a loosely formatted dialogue transcript into an
//! ordered list of [`Message`] records. Two strategies are tried in order:
//!
//! 1. **Labelled turns**: every line that begins with a role label followed
//!    by a colon (`Human:` or `Claude:` by default) starts a new message that
//!    runs until the next labelled line or the end of the text.
//! 2. **Paragraphs**: when no labelled line exists, the text is split on blank
//!    lines and the paragraphs are assigned alternating roles, starting with
//!    the human.
//!
//! # Example
//!
//! ```
//! use chat2html::parser::{parse_transcript, ParseOptions, Role, Strategy};
//!
//! let transcript = parse_transcript("Human: Hi\nClaude: Hello there", &ParseOptions::default()).unwrap();
//!
//! assert_eq!(transcript.strategy, Strategy::Labelled);
//! assert_eq!(transcript.messages.len(), 2);
//! assert_eq!(transcript.messages[1].role, Role::Assistant);
//! assert_eq!(transcript.messages[1].content, "Hello there");
//! ```

use serde::Serialize;
use snafu::prelude::*;
use std::borrow::Cow;

/// Error type for transcript parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Neither labelled turns nor non-empty paragraphs were found.
    #[snafu(display("could not parse any messages from the transcript"))]
    NoMessages,
}

/// The speaker of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person talking to the assistant.
    Human,
    /// The assistant answering.
    Assistant,
}

impl Role {
    /// Returns the lowercase identifier of the role (`"human"` or `"assistant"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "assistant",
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::Human => Self::Assistant,
            Self::Assistant => Self::Human,
        }
    }
}

/// A single turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Who spoke.
    pub role: Role,

    /// The raw text of the turn, trimmed of surrounding whitespace.
    ///
    /// This is not HTML-escaped; escaping happens during rendering.
    pub content: String,
}

/// Which strategy produced the messages of a [`Transcript`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Messages were introduced by role labels at the start of a line.
    Labelled,
    /// No labels were found; blank-line separated paragraphs were assigned
    /// alternating roles.
    Paragraphs,
}

/// A parsed conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    /// The messages in conversation order. Never empty.
    pub messages: Vec<Message>,

    /// How the messages were recovered.
    pub strategy: Strategy,
}

/// Role labels recognized at the start of a line.
///
/// Labels are matched case-sensitively and must be followed directly by a
/// colon on the same line. A label containing a newline never matches. When
/// a line matches both labels, the human label wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Label introducing human turns (default: `Human`).
    pub human_label: String,

    /// Label introducing assistant turns (default: `Claude`).
    pub assistant_label: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            human_label: "Human".into(),
            assistant_label: "Claude".into(),
        }
    }
}

impl ParseOptions {
    /// Returns the role and the byte length of the `label:` prefix if `line`
    /// starts with one of the labels.
    fn match_line(&self, line: &str) -> Option<(Role, usize)> {
        [
            (Role::Human, self.human_label.as_str()),
            (Role::Assistant, self.assistant_label.as_str()),
        ]
        .into_iter()
        .find(|(_, label)| {
            line.strip_prefix(*label)
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .map(|(role, label)| (role, label.len() + 1))
    }
}

/// A labelled line found by [`LabelScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LabelMatch {
    role: Role,
    /// Byte offset of the start of the labelled line.
    line_start: usize,
    /// Byte offset just past the colon.
    content_start: usize,
}

/// Walks the text line by line and yields every labelled line in order.
struct LabelScanner<'a> {
    text: &'a str,
    opts: &'a ParseOptions,
    cursor: usize,
}

impl<'a> LabelScanner<'a> {
    const fn new(text: &'a str, opts: &'a ParseOptions) -> Self {
        Self {
            text,
            opts,
            cursor: 0,
        }
    }
}

impl Iterator for LabelScanner<'_> {
    type Item = LabelMatch;

    fn next(&mut self) -> Option<LabelMatch> {
        while self.cursor < self.text.len() {
            let line_start = self.cursor;
            let rest = &self.text[line_start..];
            let line_len = rest.find('\n').unwrap_or(rest.len());
            self.cursor = (line_start + line_len + 1).min(self.text.len());

            // A label spanning lines can never match a single line.
            if let Some((role, prefix_len)) = self.opts.match_line(&rest[..line_len]) {
                return Some(LabelMatch {
                    role,
                    line_start,
                    content_start: line_start + prefix_len,
                });
            }
        }
        None
    }
}

/// Collects the labelled turns of `text`. Empty turns are kept so the message
/// count always equals the number of labelled lines.
fn parse_labelled(text: &str, opts: &ParseOptions) -> Vec<Message> {
    let mut scanner = LabelScanner::new(text, opts).peekable();
    let mut messages = Vec::new();

    while let Some(current) = scanner.next() {
        let end = scanner.peek().map_or(text.len(), |next| next.line_start);
        messages.push(Message {
            role: current.role,
            content: text[current.content_start..end].trim().to_owned(),
        });
    }

    messages
}

/// Splits `text` on blank lines and alternates roles starting with the human.
fn parse_paragraphs(text: &str) -> Vec<Message> {
    // Runs of three or more newlines leave leading newlines on the next
    // paragraph or produce empty pieces; trimming takes care of both.
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .scan(Role::Human, |role, para| {
            let message = Message {
                role: *role,
                content: para.to_owned(),
            };
            *role = role.other();
            Some(message)
        })
        .collect()
}

/// Drops a leading byte order mark and converts CRLF line endings to LF.
fn normalize_input(text: &str) -> Cow<'_, str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Parses a plain-text transcript into its messages.
///
/// Labelled turns are preferred; the paragraph heuristic is used only when no
/// line starts with a role label. The returned [`Transcript::strategy`] tells
/// which one was used.
///
/// # Errors
///
/// Returns [`ParseError::NoMessages`] if neither strategy finds anything,
/// which happens for empty or whitespace-only input.
///
/// # Example
///
/// ```
/// use chat2html::parser::{parse_transcript, ParseOptions, Role, Strategy};
///
/// let transcript = parse_transcript("Hello?\n\nHi!", &ParseOptions::default()).unwrap();
///
/// assert_eq!(transcript.strategy, Strategy::Paragraphs);
/// assert_eq!(transcript.messages[0].role, Role::Human);
/// assert_eq!(transcript.messages[1].role, Role::Assistant);
/// ```
pub fn parse_transcript(text: &str, opts: &ParseOptions) -> Result<Transcript, ParseError> {
    let text = normalize_input(text);

    let messages = parse_labelled(&text, opts);
    if !messages.is_empty() {
        return Ok(Transcript {
            messages,
            strategy: Strategy::Labelled,
        });
    }

    let messages = parse_paragraphs(&text);
    ensure!(!messages.is_empty(), NoMessagesSnafu);

    Ok(Transcript {
        messages,
        strategy: Strategy::Paragraphs,
    })
}

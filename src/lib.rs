// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert plain-text chat transcripts to self-contained HTML.
//!
//! This crate provides parsing and rendering functionality for turning a
//! loosely formatted two-party conversation (`Human:` / `Claude:` turns, or
//! just blank-line separated paragraphs) into a styled HTML page.
//!
//! # Overview
//!
//! Conversations are often saved by copying them out of a chat window into a
//! text file. This crate:
//!
//! 1. Parses the text into an ordered list of typed messages
//! 2. Renders the messages as a single HTML file with collapsible code
//!    blocks, continuation markers and a light/dark theme switch
//!
//! # Example
//!
//! ```no_run
//! use chat2html::{parser, renderer};
//!
//! let text = std::fs::read_to_string("chat.txt").unwrap();
//! let transcript = parser::parse_transcript(&text, &parser::ParseOptions::default()).unwrap();
//!
//! let opts = renderer::RenderOptions {
//!     title: "Conversation Log - chat".into(),
//!     annotation: Some("Generated from: chat.txt".into()),
//! };
//!
//! let html = renderer::render_document(&transcript.messages, &opts);
//! std::fs::write("chat.html", html).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`parser`]: transcript segmentation into messages
//! - [`renderer`]: HTML generation, code block and continuation marker extraction

#![deny(missing_docs)]

pub mod parser;
pub mod renderer;

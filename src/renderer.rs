// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML rendering for parsed transcripts.
//!
//! This module turns a list of [`Message`]s into a single self-contained HTML
//! document. Styles and scripts are inlined so the file can be opened without
//! any network access.
//!
//! # Output Format
//!
//! The rendered document includes:
//! - A header with the title and an optional "generated from" line
//! - One block per message, styled by role (`human` or `assistant`)
//! - Fenced code blocks replaced by collapsible sections, collapsed by default
//! - A `continuation-point` block after each message for every
//!   `CONTINUATION_POINT: [label]` marker it contains
//! - A light/dark theme switch whose choice is kept in the viewer's
//!   `localStorage`
//!
//! Continuation markers are collected from the message text but not removed
//! from it, so each marker shows up both inline and as its own block.
//!
//! # Example
//!
//! ```
//! use chat2html::parser::{Message, Role};
//! use chat2html::renderer::{render_document, RenderOptions};
//!
//! let messages = vec![
//!     Message { role: Role::Human, content: "Hi".into() },
//!     Message { role: Role::Assistant, content: "Hello there".into() },
//! ];
//!
//! let opts = RenderOptions {
//!     title: "Conversation Log - greeting".into(),
//!     ..Default::default()
//! };
//! let html = render_document(&messages, &opts);
//!
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! assert!(html.contains("<div class=\"human\">"));
//! assert!(html.contains("Hello there"));
//! ```

use crate::parser::{Message, Role};
use regex::Regex;
use std::fmt::Write;
use std::ops::Range;
use std::sync::OnceLock;

/// Document-level metadata for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Shown in the browser tab and as the top-level heading.
    pub title: String,

    /// A line shown under the heading, typically naming the source file and
    /// the time the document was generated.
    pub annotation: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Conversation Log".into(),
            annotation: None,
        }
    }
}

/// A fenced code block found in message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// The language tag after the opening fence. Empty if none was given.
    pub language: &'a str,

    /// The code between the fences, exactly as written.
    pub body: &'a str,
}

impl CodeBlock<'_> {
    /// Returns the language tag, or `"code"` when the block has none.
    #[must_use]
    pub const fn display_language(&self) -> &str {
        if self.language.is_empty() {
            "code"
        } else {
            self.language
        }
    }
}

/// A `CONTINUATION_POINT: [label]` marker found in message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationMarker<'a> {
    /// The text between the brackets.
    pub label: &'a str,
}

fn re_code_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9_]*)\n(.*?)```")
            .expect("re_code_block: pattern is valid and should always compile")
    })
}

fn re_continuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"CONTINUATION_POINT:\s*\[([^\]]+)\]")
            .expect("re_continuation: pattern is valid and should always compile")
    })
}

/// Yields every code block of `content` together with the byte range of the
/// whole fenced region, left to right.
fn scan_code_blocks(content: &str) -> impl Iterator<Item = (Range<usize>, CodeBlock<'_>)> {
    re_code_block().captures_iter(content).filter_map(|caps| {
        let whole = caps.get(0)?;
        let block = CodeBlock {
            language: caps.get(1).map_or("", |m| m.as_str()),
            body: caps.get(2).map_or("", |m| m.as_str()),
        };
        Some((whole.range(), block))
    })
}

/// Extracts the fenced code blocks of a message, in order.
///
/// An opening fence is three backticks, an optional language tag made of
/// ASCII letters, digits and underscores, then a newline. The block ends at
/// the next three backticks. Unterminated fences are left as plain text.
///
/// ```
/// use chat2html::renderer::code_blocks;
///
/// let blocks = code_blocks("Try:\n```python\nprint(1)\n```");
/// assert_eq!(blocks[0].language, "python");
/// assert_eq!(blocks[0].body, "print(1)\n");
/// ```
#[must_use]
pub fn code_blocks(content: &str) -> Vec<CodeBlock<'_>> {
    scan_code_blocks(content).map(|(_, block)| block).collect()
}

/// Extracts the continuation markers of a message, in order.
///
/// ```
/// use chat2html::renderer::continuation_markers;
///
/// let markers = continuation_markers("Done for now. CONTINUATION_POINT: [resume-here]");
/// assert_eq!(markers[0].label, "resume-here");
/// ```
#[must_use]
pub fn continuation_markers(content: &str) -> Vec<ContinuationMarker<'_>> {
    re_continuation()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| ContinuationMarker { label: m.as_str() })
        .collect()
}

/// Renders messages as a complete HTML document.
///
/// Every message becomes a block styled by its role. Within a message, code
/// fences become collapsible sections, the remaining text is escaped and its
/// newlines become `<br>`. Continuation markers are repeated as separate
/// blocks directly after the message they appear in.
#[must_use]
pub fn render_document(messages: &[Message], opts: &RenderOptions) -> String {
    let title = escape_html(&opts.title);
    let mut out = String::with_capacity(STYLE.len() + SCRIPT.len() + 4096);

    writeln!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n<script>{SCRIPT}</script>\n\
         </head>\n<body>"
    )
    .unwrap();
    out.push_str(THEME_SWITCH);

    writeln!(
        out,
        "<div class=\"container\">\n<div class=\"header\">\n<h1>{title}</h1>"
    )
    .unwrap();
    if let Some(annotation) = &opts.annotation {
        writeln!(
            out,
            "<div class=\"file-info\">{}</div>",
            escape_html(annotation)
        )
        .unwrap();
    }
    out.push_str("</div>\n");

    for message in messages {
        render_message(&mut out, message);
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn render_message(out: &mut String, message: &Message) {
    writeln!(
        out,
        "<div class=\"{}\">\n<strong>{}:</strong>\n<div class=\"content\">{}</div>\n</div>",
        message.role.as_str(),
        display_name(message.role),
        render_content(&message.content)
    )
    .unwrap();

    for marker in continuation_markers(&message.content) {
        writeln!(
            out,
            "<div class=\"continuation-point\">Continuation Point: [{}]</div>",
            escape_html(marker.label)
        )
        .unwrap();
    }
}

/// Returns the fixed display name of a role, independent of the label the
/// transcript used.
const fn display_name(role: Role) -> &'static str {
    match role {
        Role::Human => "You",
        Role::Assistant => "Claude",
    }
}

/// Renders the body of a message: code fences become collapsible sections,
/// everything else is escaped with newlines turned into `<br>`.
fn render_content(content: &str) -> String {
    let mut out = String::with_capacity(content.len() * 2);
    let mut cursor = 0;

    for (span, block) in scan_code_blocks(content) {
        push_text(&mut out, &content[cursor..span.start]);
        write!(
            out,
            "<div class=\"code-header\" role=\"button\" tabindex=\"0\" aria-expanded=\"false\">{}</div>",
            block.display_language()
        )
        .unwrap();
        if block.language.is_empty() {
            out.push_str("<pre class=\"code-body\"><code>");
        } else {
            write!(
                out,
                "<pre class=\"code-body\"><code class=\"language-{}\">",
                block.language
            )
            .unwrap();
        }
        out.push_str(&escape_html(block.body));
        out.push_str("</code></pre>");
        cursor = span.end;
    }
    push_text(&mut out, &content[cursor..]);

    out
}

/// Appends escaped prose, turning each newline into `<br>`.
fn push_text(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        out.push_str(&escape_html(line));
    }
}

/// Escapes the characters that are significant in HTML text and attributes.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

const THEME_SWITCH: &str = r#"<div class="theme-switch-wrapper">
<label class="theme-switch" for="theme-toggle" title="Toggle dark mode">
<input type="checkbox" id="theme-toggle">
<span class="slider"></span>
</label>
<span id="theme-icon" class="theme-icon">&#9728;&#65039;</span>
</div>
"#;

const STYLE: &str = r#"
:root {
    --primary-color: #3a86ff;
    --page-bg: #f8f9fa;
    --text-color: #343a40;
    --muted-color: #666;
    --border-color: #dee2e6;
    --human-bg: #e9f5ff;
    --assistant-bg: #f0f0f0;
    --code-bg: #f7f7f7;
    --continuation-bg: #ffe6cc;
}
:root[data-theme="dark"] {
    --page-bg: #212529;
    --text-color: #f8f9fa;
    --muted-color: #adb5bd;
    --border-color: #495057;
    --human-bg: #1a2837;
    --assistant-bg: #2a2a2a;
    --code-bg: #333;
    --continuation-bg: #3d2e15;
}
@media (prefers-color-scheme: dark) {
    :root:not([data-theme="light"]) {
        --page-bg: #212529;
        --text-color: #f8f9fa;
        --muted-color: #adb5bd;
        --border-color: #495057;
        --human-bg: #1a2837;
        --assistant-bg: #2a2a2a;
        --code-bg: #333;
        --continuation-bg: #3d2e15;
    }
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
    line-height: 1.6;
    color: var(--text-color);
    background-color: var(--page-bg);
    padding: 20px;
    transition: background-color 0.3s ease, color 0.3s ease;
}
.container { max-width: 1200px; margin: 0 auto; }
.header { margin-bottom: 20px; padding-bottom: 10px; border-bottom: 1px solid var(--border-color); }
.file-info { font-size: 0.8rem; color: var(--muted-color); margin-top: 5px; }
.human, .assistant { padding: 15px; margin-bottom: 20px; border-radius: 8px; }
.human { background-color: var(--human-bg); }
.assistant { background-color: var(--assistant-bg); }
.code-header { cursor: pointer; color: var(--primary-color); margin-top: 15px; user-select: none; }
.code-header::before { content: "\25B6  "; }
.code-header.open::before { content: "\25BC  "; }
.code-body { display: none; background-color: var(--code-bg); padding: 10px; border-radius: 5px; overflow-x: auto; margin: 10px 0; }
.code-body.open { display: block; }
code { font-family: 'Courier New', Courier, monospace; }
.continuation-point {
    background-color: var(--continuation-bg);
    padding: 10px;
    margin: 10px 0 20px;
    border-left: 4px solid #ff9800;
    font-weight: bold;
}
.theme-switch-wrapper { display: flex; align-items: center; position: absolute; top: 20px; right: 20px; }
.theme-switch { display: inline-block; height: 24px; position: relative; width: 44px; }
.theme-switch input { display: none; }
.slider { background-color: #ccc; position: absolute; inset: 0; cursor: pointer; transition: .4s; border-radius: 24px; }
.slider::before {
    background-color: #fff;
    bottom: 4px;
    content: "";
    height: 16px;
    left: 4px;
    position: absolute;
    transition: .4s;
    width: 16px;
    border-radius: 50%;
}
input:checked + .slider { background-color: var(--primary-color); }
input:checked + .slider::before { transform: translateX(20px); }
.theme-icon { margin-left: 10px; font-size: 1.2rem; }
"#;

const SCRIPT: &str = r"
(function () {
    var saved = null;
    try { saved = window.localStorage.getItem('theme'); } catch (e) {}
    var prefersDark = window.matchMedia && window.matchMedia('(prefers-color-scheme: dark)').matches;
    document.documentElement.setAttribute('data-theme', saved || (prefersDark ? 'dark' : 'light'));
})();
document.addEventListener('DOMContentLoaded', function () {
    var toggle = document.getElementById('theme-toggle');
    var icon = document.getElementById('theme-icon');
    function applyTheme(theme) {
        document.documentElement.setAttribute('data-theme', theme);
        toggle.checked = theme === 'dark';
        icon.textContent = theme === 'dark' ? '\u{1F319}' : '\u{2600}\u{FE0F}';
    }
    applyTheme(document.documentElement.getAttribute('data-theme') || 'light');
    toggle.addEventListener('change', function () {
        var theme = toggle.checked ? 'dark' : 'light';
        applyTheme(theme);
        try { window.localStorage.setItem('theme', theme); } catch (e) {}
    });
    document.querySelectorAll('.code-header').forEach(function (header) {
        function flip() {
            var open = header.classList.toggle('open');
            header.nextElementSibling.classList.toggle('open', open);
            header.setAttribute('aria-expanded', open ? 'true' : 'false');
        }
        header.addEventListener('click', flip);
        header.addEventListener('keydown', function (e) {
            if (e.key === 'Enter' || e.key === ' ') { e.preventDefault(); flip(); }
        });
    });
});
";

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, content: &str) -> Message {
        Message {
            role,
            content: content.into(),
        }
    }

    fn render(messages: &[Message]) -> String {
        render_document(messages, &RenderOptions::default())
    }

    /// Returns the rendered body of the first message block.
    fn first_body(html: &str) -> &str {
        let start = html.find("<div class=\"content\">").unwrap() + "<div class=\"content\">".len();
        let end = start + html[start..].find("</div>\n</div>").unwrap();
        &html[start..end]
    }

    #[test]
    fn renders_document_skeleton() {
        let html = render(&[message(Role::Human, "Hi")]);

        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<title>Conversation Log</title>"));
        assert!(html.contains("<h1>Conversation Log</h1>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn renders_annotation_when_given() {
        let opts = RenderOptions {
            title: "Log".into(),
            annotation: Some("Generated from: chat.txt on 2026-10-19 09:00:00".into()),
        };
        let html = render_document(&[message(Role::Human, "Hi")], &opts);

        assert!(html.contains(
            "<div class=\"file-info\">Generated from: chat.txt on 2026-10-19 09:00:00</div>"
        ));
    }

    #[test]
    fn omits_annotation_by_default() {
        let html = render(&[message(Role::Human, "Hi")]);

        assert!(!html.contains("<div class=\"file-info\">"));
    }

    #[test]
    fn escapes_title_and_annotation() {
        let opts = RenderOptions {
            title: "<b>Log</b>".into(),
            annotation: Some("a & b".into()),
        };
        let html = render_document(&[], &opts);

        assert!(html.contains("<title>&lt;b&gt;Log&lt;/b&gt;</title>"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<b>Log</b>"));
    }

    #[test]
    fn renders_roles_with_distinct_classes_and_names() {
        let html = render(&[
            message(Role::Human, "Hi"),
            message(Role::Assistant, "Hello there"),
        ]);

        let human = html.find("<div class=\"human\">\n<strong>You:</strong>").unwrap();
        let assistant = html
            .find("<div class=\"assistant\">\n<strong>Claude:</strong>")
            .unwrap();
        assert!(human < assistant);
    }

    #[test]
    fn preserves_message_order() {
        let html = render(&[
            message(Role::Human, "first"),
            message(Role::Human, "second"),
            message(Role::Assistant, "third"),
        ]);

        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        let third = html.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn converts_newlines_to_line_breaks() {
        let html = render(&[message(Role::Human, "one\ntwo\nthree\n\nfive")]);
        let body = first_body(&html);

        assert_eq!(body, "one<br>two<br>three<br><br>five");
        assert_eq!(body.matches("<br>").count(), 4);
        assert!(!body.contains('\n'));
    }

    #[test]
    fn escapes_message_text() {
        let html = render(&[message(Role::Assistant, "<script>alert('x')</script> & more")]);
        let body = first_body(&html);

        assert_eq!(
            body,
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"
        );
    }

    #[test]
    fn renders_code_block_with_language() {
        let html = render(&[message(Role::Assistant, "Run:\n```python\nprint(1)\n```\nDone")]);
        let body = first_body(&html);

        assert!(body.starts_with("Run:<br><div class=\"code-header\""));
        assert!(body.contains("aria-expanded=\"false\">python</div>"));
        assert!(body.contains(
            "<pre class=\"code-body\"><code class=\"language-python\">print(1)\n</code></pre>"
        ));
        assert!(body.ends_with("</code></pre><br>Done"));
    }

    #[test]
    fn code_block_without_language_shows_code() {
        let html = render(&[message(Role::Assistant, "```\nls -la\n```")]);
        let body = first_body(&html);

        assert!(body.contains(">code</div>"));
        assert!(body.contains("<pre class=\"code-body\"><code>ls -la\n</code></pre>"));
    }

    #[test]
    fn code_body_keeps_newlines_and_escapes_markup() {
        let html = render(&[message(
            Role::Assistant,
            "```rust\nfn main() {\n    let v: Vec<u8> = vec![];\n}\n```",
        )]);
        let body = first_body(&html);

        assert!(body.contains("fn main() {\n    let v: Vec&lt;u8&gt; = vec![];\n}\n</code>"));
        assert!(!body.contains("<br>"));
    }

    #[test]
    fn renders_several_code_blocks_in_place() {
        let html = render(&[message(
            Role::Assistant,
            "a\n```sh\necho 1\n```\nb\n```js\nlet x;\n```\nc",
        )]);
        let body = first_body(&html);

        let sh = body.find(">sh</div>").unwrap();
        let b = body.find("<br>b<br>").unwrap();
        let js = body.find(">js</div>").unwrap();
        assert!(body.starts_with("a<br>"));
        assert!(sh < b && b < js);
        assert!(body.ends_with("<br>c"));
    }

    #[test]
    fn leaves_unterminated_fence_as_text() {
        let html = render(&[message(Role::Assistant, "```python\nprint(1)")]);
        let body = first_body(&html);

        assert_eq!(body, "```python<br>print(1)");
    }

    #[test]
    fn fence_needs_newline_after_language() {
        let blocks = code_blocks("```inline code```");
        assert!(blocks.is_empty());
    }

    #[test]
    fn extracts_code_blocks() {
        let blocks = code_blocks("x\n```c++\nint a;\n```\n```\nplain\n```");

        // "c++" is not a valid tag, so the first fence does not open a block and
        // its closing fence opens the next one instead.
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "");
        assert_eq!(blocks[0].body, "");
        assert_eq!(blocks[0].display_language(), "code");
    }

    #[test]
    fn extracts_language_tags() {
        let blocks = code_blocks("```go\nfunc f() {}\n```\ntext\n```\nraw\n```");

        assert_eq!(
            blocks,
            [
                CodeBlock {
                    language: "go",
                    body: "func f() {}\n",
                },
                CodeBlock {
                    language: "",
                    body: "raw\n",
                },
            ]
        );
    }

    #[test]
    fn extracts_continuation_markers_in_order() {
        let markers = continuation_markers(
            "CONTINUATION_POINT: [one] text CONTINUATION_POINT:[two]\nCONTINUATION_POINT:   [three]",
        );
        let labels: Vec<_> = markers.iter().map(|m| m.label).collect();

        assert_eq!(labels, ["one", "two", "three"]);
    }

    #[test]
    fn ignores_empty_continuation_labels() {
        assert!(continuation_markers("CONTINUATION_POINT: []").is_empty());
        assert!(continuation_markers("CONTINUATION_POINT: resume").is_empty());
    }

    #[test]
    fn renders_continuation_block_after_message() {
        let html = render(&[
            message(Role::Assistant, "Pausing. CONTINUATION_POINT: [resume-here]"),
            message(Role::Human, "ok"),
        ]);

        let block = "<div class=\"continuation-point\">Continuation Point: [resume-here]</div>";
        assert_eq!(html.matches(block).count(), 1);

        let first_end = html.find("</div>\n</div>\n").unwrap() + "</div>\n</div>\n".len();
        assert!(html[first_end..].starts_with(block));
        assert!(html.find(block).unwrap() < html.find("<div class=\"human\">").unwrap());
    }

    #[test]
    fn keeps_continuation_marker_inline() {
        let html = render(&[message(Role::Assistant, "CONTINUATION_POINT: [resume-here]")]);
        let body = first_body(&html);

        assert_eq!(body, "CONTINUATION_POINT: [resume-here]");
    }

    #[test]
    fn renders_multiple_continuation_blocks_in_order() {
        let html = render(&[message(
            Role::Assistant,
            "CONTINUATION_POINT: [a]\nCONTINUATION_POINT: [b]",
        )]);

        let a = html.find("Continuation Point: [a]").unwrap();
        let b = html.find("Continuation Point: [b]").unwrap();
        assert!(a < b);
    }

    #[test]
    fn escapes_continuation_labels() {
        let html = render(&[message(Role::Human, "CONTINUATION_POINT: [<x>]")]);

        assert!(html.contains("Continuation Point: [&lt;x&gt;]</div>"));
    }

    #[test]
    fn ships_both_themes_without_external_resources() {
        let html = render(&[]);

        assert!(html.contains(":root[data-theme=\"dark\"]"));
        assert!(html.contains("@media (prefers-color-scheme: dark)"));
        assert!(html.contains("id=\"theme-toggle\""));
        assert!(html.contains("localStorage"));
        assert!(!html.contains("<html data-theme"));
        assert!(!html.contains("src=\"http"));
        assert!(!html.contains("href=\"http"));
    }

    #[test]
    fn renders_empty_message() {
        let html = render(&[message(Role::Human, "")]);

        assert_eq!(first_body(&html), "");
    }

    #[test]
    fn escape_html_handles_all_special_characters() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("print(1)"), "print(1)");
        assert_eq!(escape_html(""), "");
    }
}

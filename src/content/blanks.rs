//! Blank micro-syntax parser.
//!
//! Fill-in-the-blank exercises author blanks inline in rich text using
//! bracket syntax:
//!
//! - `[answer]` - a blank whose correct value is `answer`
//! - `[answer|opt1|opt2]` - with local distractor options
//! - `[answer|hint:text]` - with a hint
//!
//! Parsing walks the content tree in document order and replaces every
//! token with an indexed placeholder, so one blank's identity within an
//! exercise is its index. Answer/option comparison is case-insensitive
//! and trimmed; storage keeps the authored text untouched.
//!
//! Text that contains markdown table markup takes a second path: blank
//! tokens are first substituted with inert index markers so the table
//! structure can be split on pipes without mangling raw brackets, then
//! the markers are resolved back into blank placeholders inside cells.

use serde::{Deserialize, Serialize};

use super::Node;

/// One fill-in-the-blank slot extracted from bracket syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blank {
    /// The correct answer, stored exactly as authored.
    pub answer: String,
    /// Distractor options scoped to this blank, order-preserving,
    /// duplicates allowed.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Canonical form used for all answer comparison: trimmed, lowercased.
pub fn canonical(s: &str) -> String {
    s.trim().to_lowercase()
}

/// A rendering-ready node with blanks replaced by index placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Text(String),
    /// Placeholder for the blank at this index.
    Blank(usize),
    Element {
        tag: String,
        children: Vec<RenderNode>,
    },
    Table(Table),
}

/// A pipe-delimited table with blanks resolved inside cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<Vec<RenderNode>>,
    pub rows: Vec<Vec<Vec<RenderNode>>>,
}

/// Result of parsing an exercise's text: the blanks in document order
/// plus the rendering-ready tree.
#[derive(Debug, Clone, Default)]
pub struct ParsedBlanks {
    pub blanks: Vec<Blank>,
    pub rendered: Vec<RenderNode>,
}

// Private-use markers carrying a blank index through table splitting.
const MARKER_OPEN: char = '\u{e000}';
const MARKER_CLOSE: char = '\u{e001}';

/// Parse all blank tokens out of a content tree.
///
/// If the flattened text contains markdown table markup (at least one
/// pipe row and one separator row), the table path is used; otherwise
/// the tree is walked recursively and string leaves are split inline.
pub fn parse_blank_content(nodes: &[Node]) -> ParsedBlanks {
    let text = super::plain_text(nodes);
    let mut blanks = Vec::new();

    let rendered = if has_table_markup(&text) {
        let marked = substitute_markers(&text, &mut blanks);
        parse_table_text(&marked)
    } else {
        walk(nodes, &mut blanks)
    };

    ParsedBlanks { blanks, rendered }
}

fn walk(nodes: &[Node], blanks: &mut Vec<Blank>) -> Vec<RenderNode> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.extend(split_text(t, blanks)),
            Node::Element { tag, children } => out.push(RenderNode::Element {
                tag: tag.clone(),
                children: walk(children, blanks),
            }),
        }
    }
    out
}

/// Split one string leaf on blank tokens, appending extracted blanks.
fn split_text(text: &str, blanks: &mut Vec<Blank>) -> Vec<RenderNode> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '[' {
            if let Some(end) = find_closing_bracket(&chars, i) {
                let content: String = chars[i + 1..end].iter().collect();
                if !literal.is_empty() {
                    out.push(RenderNode::Text(std::mem::take(&mut literal)));
                }
                blanks.push(parse_token(&content));
                out.push(RenderNode::Blank(blanks.len() - 1));
                i = end + 1;
                continue;
            }
            // No matching ']': not a blank, keep the bracket literal.
        }
        literal.push(chars[i]);
        i += 1;
    }

    if !literal.is_empty() {
        out.push(RenderNode::Text(literal));
    }
    out
}

/// Find the index of the `]` matching the `[` at `start`, handling
/// nested brackets.
fn find_closing_bracket(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, &ch) in chars.iter().enumerate().skip(start) {
        if ch == '[' {
            depth += 1;
        } else if ch == ']' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split token content on `|`: first segment is the answer, a segment
/// starting with `hint:` sets the hint (first one wins), everything
/// else is a distractor option.
fn parse_token(content: &str) -> Blank {
    let mut parts = content.split('|');
    let answer = parts.next().unwrap_or("").to_string();
    let mut options = Vec::new();
    let mut hint = None;

    for part in parts {
        if let Some(rest) = part.strip_prefix("hint:") {
            if hint.is_none() {
                hint = Some(rest.to_string());
            }
        } else {
            options.push(part.to_string());
        }
    }

    Blank {
        answer,
        options,
        hint,
    }
}

// ==================== Table path ====================

/// True when the text contains at least one pipe-delimited row and at
/// least one syntactically valid table separator row.
pub fn has_table_markup(text: &str) -> bool {
    let mut has_pipe_row = false;
    let mut has_separator = false;
    for line in text.lines() {
        if is_separator_row(line) {
            has_separator = true;
        } else if line.contains('|') {
            has_pipe_row = true;
        }
    }
    has_pipe_row && has_separator
}

/// A separator row consists solely of `|`, `-`, `:` and whitespace,
/// with at least one pipe and one dash.
fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('|')
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| c == '|' || c == '-' || c == ':' || c.is_whitespace())
}

/// Replace every blank token in raw text with an inert index marker.
fn substitute_markers(text: &str, blanks: &mut Vec<Blank>) -> String {
    let mut out = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '[' {
            if let Some(end) = find_closing_bracket(&chars, i) {
                let content: String = chars[i + 1..end].iter().collect();
                blanks.push(parse_token(&content));
                out.push(MARKER_OPEN);
                out.push_str(&(blanks.len() - 1).to_string());
                out.push(MARKER_CLOSE);
                i = end + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Parse marked text into prose and table chunks.
fn parse_table_text(marked: &str) -> Vec<RenderNode> {
    let mut out = Vec::new();
    let mut table: Option<Table> = None;
    let mut header_done = false;

    for line in marked.lines() {
        if is_separator_row(line) {
            header_done = true;
            continue;
        }
        if line.contains('|') {
            let cells = split_row(line);
            let current = table.get_or_insert_with(Table::default);
            // The first row before the separator is the header; any
            // further pre-separator rows join the body.
            if header_done || !current.header.is_empty() {
                current.rows.push(cells);
            } else {
                current.header = cells;
            }
            continue;
        }
        // Non-table line: flush any open table, keep the prose.
        if let Some(t) = table.take() {
            out.push(RenderNode::Table(t));
            header_done = false;
        }
        if !line.trim().is_empty() {
            out.extend(resolve_markers(line));
            out.push(RenderNode::Text("\n".to_string()));
        }
    }
    if let Some(t) = table.take() {
        out.push(RenderNode::Table(t));
    }
    out
}

fn split_row(line: &str) -> Vec<Vec<RenderNode>> {
    line.trim()
        .trim_start_matches('|')
        .trim_end_matches('|')
        .split('|')
        .map(|cell| resolve_markers(cell.trim()))
        .collect()
}

/// Resolve inert index markers back into blank placeholders.
fn resolve_markers(text: &str) -> Vec<RenderNode> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == MARKER_OPEN {
            let mut digits = String::new();
            for d in chars.by_ref() {
                if d == MARKER_CLOSE {
                    break;
                }
                digits.push(d);
            }
            if let Ok(index) = digits.parse::<usize>() {
                if !literal.is_empty() {
                    out.push(RenderNode::Text(std::mem::take(&mut literal)));
                }
                out.push(RenderNode::Blank(index));
            }
        } else {
            literal.push(ch);
        }
    }
    if !literal.is_empty() {
        out.push(RenderNode::Text(literal));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_nodes(s: &str) -> Vec<Node> {
        vec![Node::Text(s.to_string())]
    }

    #[test]
    fn test_single_blank_with_hint() {
        let parsed = parse_blank_content(&text_nodes("Der [Mann|hint:male adult] geht."));
        assert_eq!(parsed.blanks.len(), 1);
        assert_eq!(parsed.blanks[0].answer, "Mann");
        assert_eq!(parsed.blanks[0].hint.as_deref(), Some("male adult"));
        assert!(parsed.blanks[0].options.is_empty());
        assert_eq!(
            parsed.rendered,
            vec![
                RenderNode::Text("Der ".to_string()),
                RenderNode::Blank(0),
                RenderNode::Text(" geht.".to_string()),
            ]
        );
    }

    #[test]
    fn test_options_preserve_order_and_duplicates() {
        let parsed = parse_blank_content(&text_nodes("[der|die|das|die]"));
        assert_eq!(parsed.blanks[0].answer, "der");
        assert_eq!(parsed.blanks[0].options, vec!["die", "das", "die"]);
    }

    #[test]
    fn test_first_hint_wins() {
        let parsed = parse_blank_content(&text_nodes("[a|hint:one|hint:two|b]"));
        assert_eq!(parsed.blanks[0].hint.as_deref(), Some("one"));
        assert_eq!(parsed.blanks[0].options, vec!["b"]);
    }

    #[test]
    fn test_blanks_in_document_order_across_elements() {
        let nodes = vec![
            Node::Text("Ich [bin] ".to_string()),
            Node::Element {
                tag: "em".to_string(),
                children: vec![Node::Text("sehr [froh]".to_string())],
            },
            Node::Text(" heute.".to_string()),
        ];
        let parsed = parse_blank_content(&nodes);
        assert_eq!(parsed.blanks.len(), 2);
        assert_eq!(parsed.blanks[0].answer, "bin");
        assert_eq!(parsed.blanks[1].answer, "froh");
        // "Ich [bin] " splits into text, blank, trailing space; the
        // formatting element follows.
        match &parsed.rendered[3] {
            RenderNode::Element { tag, children } => {
                assert_eq!(tag, "em");
                assert_eq!(children[1], RenderNode::Blank(1));
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_bracket_is_literal() {
        let parsed = parse_blank_content(&text_nodes("a [b ohne Ende"));
        assert!(parsed.blanks.is_empty());
        assert_eq!(
            parsed.rendered,
            vec![RenderNode::Text("a [b ohne Ende".to_string())]
        );
    }

    #[test]
    fn test_empty_answer_blank() {
        let parsed = parse_blank_content(&text_nodes("x[]y"));
        assert_eq!(parsed.blanks.len(), 1);
        assert_eq!(parsed.blanks[0].answer, "");
    }

    #[test]
    fn test_table_detection() {
        assert!(has_table_markup("| a | b |\n|---|---|\n| c | d |"));
        assert!(!has_table_markup("just | a pipe"));
        assert!(!has_table_markup("|---|---|"));
        assert!(has_table_markup("| a |\n| :--- |\n| b |"));
    }

    #[test]
    fn test_table_path_resolves_blanks_in_cells() {
        let text = "| Pronomen | Verb |\n|---|---|\n| ich | [bin] |\n| du | [bist|hint:2nd person] |";
        let parsed = parse_blank_content(&text_nodes(text));
        assert_eq!(parsed.blanks.len(), 2);
        assert_eq!(parsed.blanks[0].answer, "bin");
        assert_eq!(parsed.blanks[1].answer, "bist");
        assert_eq!(parsed.blanks[1].hint.as_deref(), Some("2nd person"));

        assert_eq!(parsed.rendered.len(), 1);
        match &parsed.rendered[0] {
            RenderNode::Table(table) => {
                assert_eq!(table.header.len(), 2);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[0][1], vec![RenderNode::Blank(0)]);
                assert_eq!(table.rows[1][0], vec![RenderNode::Text("du".to_string())]);
                assert_eq!(table.rows[1][1], vec![RenderNode::Blank(1)]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_rows_before_separator_join_body() {
        let text = "| a | b |\n| c | [d] |\n|---|---|\n| e | f |";
        let parsed = parse_blank_content(&text_nodes(text));
        match &parsed.rendered[0] {
            RenderNode::Table(table) => {
                assert_eq!(table.header[0], vec![RenderNode::Text("a".to_string())]);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[0][1], vec![RenderNode::Blank(0)]);
                assert_eq!(table.rows[1][0], vec![RenderNode::Text("e".to_string())]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_prose_around_table_survives() {
        let text = "Konjugation:\n| ich | [bin] |\n|---|---|\n| du | [bist] |\nFertig.";
        let parsed = parse_blank_content(&text_nodes(text));
        assert!(matches!(parsed.rendered[0], RenderNode::Text(_)));
        assert!(parsed
            .rendered
            .iter()
            .any(|n| matches!(n, RenderNode::Table(_))));
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("  Mann "), "mann");
        assert_eq!(canonical("GEHT"), "geht");
    }
}

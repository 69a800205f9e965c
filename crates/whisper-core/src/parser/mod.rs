//! Block segmenter.
//!
//! Turns program text into a [`Block`] tree. Indentation decides nesting:
//! a header line owns the following lines that are indented deeper than
//! itself. Parsing never fails; a line that matches no statement form
//! becomes [`StatementKind::Unknown`] and is reported when it runs.

use tracing::trace;

use crate::ast::{Block, Branch, Statement, StatementKind};

mod statement;


use statement::{branch_condition, classify, Form};

/// One meaningful source line: comments removed, blank lines dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in the original text
    pub number: usize,
    /// Count of leading spaces and tabs
    pub indent: usize,
    pub text: String,
}

/// Split source text into [`Line`]s. Comment-only and blank lines are
/// dropped so they never end a block.
pub fn preprocess(source: &str) -> Vec<Line> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let body = raw.trim_start_matches(|c: char| c == ' ' || c == '\t');
            let indent = raw.len() - body.len();
            let text = strip_comment(body).trim();
            (!text.is_empty()).then(|| Line {
                number: i + 1,
                indent,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Drop a `#` comment that is not inside a string literal
fn strip_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous = None;
    for (i, c) in text.char_indices() {
        match c {
            '"' | '\'' if previous != Some('\\') => match quote {
                None => quote = Some(c),
                Some(open) if open == c => quote = None,
                Some(_) => {}
            },
            '#' if quote.is_none() => return &text[..i],
            _ => {}
        }
        previous = Some(c);
    }
    text
}

/// Lines after `start` indented deeper than `base_indent`, and the index of
/// the first line after them.
pub fn collect_block(lines: &[Line], start: usize, base_indent: usize) -> (&[Line], usize) {
    let start = start.min(lines.len());
    let end = lines[start..]
        .iter()
        .position(|line| line.indent <= base_indent)
        .map_or(lines.len(), |offset| start + offset);
    (&lines[start..end], end)
}

/// Parse a whole program
pub fn parse_program(source: &str) -> Block {
    let lines = preprocess(source);
    parse_lines(&lines)
}

/// Parse an already segmented run of lines
pub fn parse_lines(lines: &[Line]) -> Block {
    let mut statements = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let (kind, next) = parse_statement(lines, i);
        if let Some(kind) = kind {
            trace!(line = line.number, form = kind.label(), "parsed statement");
            statements.push(Statement::new(line.number, kind));
        }
        i = next;
    }
    Block::new(statements)
}

fn parse_statement(lines: &[Line], i: usize) -> (Option<StatementKind>, usize) {
    let header = &lines[i];
    let body = || {
        let (body, next) = collect_block(lines, i + 1, header.indent);
        (parse_lines(body), next)
    };

    let (kind, next) = match classify(&header.text) {
        Form::Remark => return (None, i + 1),
        Form::Simple(kind) => (kind, i + 1),
        Form::Question { condition } => question_group(lines, i, condition),
        Form::When { condition } => when_group(lines, i, condition),
        Form::Attempt => attempt_group(lines, i),
        Form::Define { name, params } => {
            let (body, next) = body();
            (StatementKind::Define { name, params, body }, next)
        }
        Form::While { condition } => {
            let (body, next) = body();
            (StatementKind::While { condition, body }, next)
        }
        Form::ForEach { variable, iterable } => {
            let (body, next) = body();
            (
                StatementKind::ForEach {
                    variable,
                    iterable,
                    body,
                },
                next,
            )
        }
        Form::Repeat { count } => {
            let (body, next) = body();
            (StatementKind::Repeat { count, body }, next)
        }
    };
    (Some(kind), next)
}

/// `is ...?` followed by deeper `yes:` and `no:` blocks. Other deeper lines
/// are skipped.
fn question_group(lines: &[Line], start: usize, condition: String) -> (StatementKind, usize) {
    let base = lines[start].indent;
    let mut yes = Block::default();
    let mut no = Block::default();
    let mut i = start + 1;
    while i < lines.len() && lines[i].indent > base {
        let line = &lines[i];
        if line.text.starts_with("yes:") {
            let (body, next) = collect_block(lines, i + 1, line.indent);
            yes = parse_lines(body);
            i = next;
        } else if line.text.starts_with("no:") {
            let (body, next) = collect_block(lines, i + 1, line.indent);
            no = parse_lines(body);
            i = next;
        } else {
            i += 1;
        }
    }
    (StatementKind::Question { condition, yes, no }, i)
}

/// `when` followed by `or when` headers and an optional `otherwise` at the
/// same indentation
fn when_group(lines: &[Line], start: usize, condition: Option<String>) -> (StatementKind, usize) {
    let base = lines[start].indent;
    let (body, mut i) = collect_block(lines, start + 1, base);
    let mut branches = vec![Branch {
        condition,
        body: parse_lines(body),
    }];

    while i < lines.len() && lines[i].indent == base {
        let text = lines[i].text.as_str();
        if !text.ends_with(':') {
            break;
        }
        let (condition, last) = if let Some(rest) = text.strip_prefix("or when ") {
            (branch_condition(rest), false)
        } else if text.starts_with("otherwise") {
            (None, true)
        } else {
            break;
        };
        let (body, next) = collect_block(lines, i + 1, base);
        branches.push(Branch {
            condition,
            body: parse_lines(body),
        });
        i = next;
        if last {
            break;
        }
    }
    (StatementKind::When { branches }, i)
}

/// `attempt:` and the `handle:` block directly after it
fn attempt_group(lines: &[Line], start: usize) -> (StatementKind, usize) {
    let base = lines[start].indent;
    let (body, mut i) = collect_block(lines, start + 1, base);
    let body = parse_lines(body);

    let mut handler = None;
    if let Some(line) = lines.get(i) {
        if line.indent == base && line.text.starts_with("handle:") {
            let (handle, next) = collect_block(lines, i + 1, base);
            handler = Some(parse_lines(handle));
            i = next;
        }
    }
    (StatementKind::Attempt { body, handler }, i)
}

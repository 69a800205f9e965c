//! Single-line statement recognition.
//!
//! [`classify`] looks at the text of one line and decides which statement
//! form it starts. Forms that own an indented body are reported as headers;
//! the block parser collects their bodies.

use crate::ast::{Adjust, Case, StatementKind};

const BREAK_WORDS: &[&str] = &["break", "end while", "end loop", "end for", "stop"];
const CONTINUE_WORDS: &[&str] = &[
    "continue",
    "resume while",
    "resume loop",
    "resume for",
    "next",
    "skip",
];

/// Openings that turn a `hey whisper, ...` remark into a command
const CONVERSATIONAL_COMMANDS: &[&str] = &[
    "remember that",
    "let ",
    "set ",
    "so ",
    "whisper ",
    "show ",
    "tell me",
    "ask ",
    "when ",
    "if ",
    "while ",
    "do ",
    "repeat ",
    "for each",
    "call ",
    "define ",
    "make ",
    "add ",
    "remove ",
    "write ",
    "read ",
    "uppercase ",
    "lowercase ",
    "there is",
    "the ",
    "is ",
    "are ",
    "forget about",
];

const DISPLAY_PREFIXES: &[(&str, bool)] = &[
    ("whisper ", true),
    ("show ", true),
    ("tell me ", true),
    ("just say ", true),
    ("just tell ", true),
    ("announce ", false),
];

/// What a line starts
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Form {
    Simple(StatementKind),
    Question { condition: String },
    Define { name: String, params: Vec<String> },
    Attempt,
    While { condition: String },
    ForEach { variable: String, iterable: String },
    Repeat { count: String },
    When { condition: Option<String> },
    /// A conversational remark with nothing to execute
    Remark,
}

pub(super) fn classify(text: &str) -> Form {
    if BREAK_WORDS.contains(&text) {
        return Form::Simple(StatementKind::Break);
    }
    if CONTINUE_WORDS.contains(&text) {
        return Form::Simple(StatementKind::Continue);
    }

    let text = if text.starts_with("hey whisper,") || text.starts_with("whisper,") {
        let rest = text.split_once(',').map_or("", |(_, rest)| rest.trim());
        if !CONVERSATIONAL_COMMANDS.iter().any(|cmd| rest.starts_with(cmd)) {
            return Form::Remark;
        }
        rest
    } else {
        text
    };

    if let Some(kind) = storytelling(text) {
        return Form::Simple(kind);
    }

    if (text.starts_with("is ") || text.starts_with("are ")) && text.ends_with('?') {
        return Form::Question {
            condition: question_condition(text),
        };
    }

    if let Some(header) = text.strip_prefix("define ") {
        if text.ends_with(':') {
            return define_header(header);
        }
    }

    if let Some(rest) = text.strip_prefix("call ") {
        let rest = rest.trim();
        let (name, args) = match rest.split_once(" with ") {
            Some((name, args)) => (name.trim(), args.split(',').map(|a| a.trim().to_string()).collect()),
            None => (rest, Vec::new()),
        };
        return Form::Simple(StatementKind::Call {
            name: name.to_string(),
            args,
        });
    }

    if let Some(value) = text.strip_prefix("give back ") {
        return Form::Simple(StatementKind::GiveBack {
            value: value.trim().to_string(),
        });
    }

    if text.starts_with("attempt:") {
        return Form::Attempt;
    }

    if let Some(kind) = assignment(text).or_else(|| input_output(text)) {
        return Form::Simple(kind);
    }

    if let Some(header) = loop_header(text) {
        return header;
    }

    if let Some(kind) = list_statement(text) {
        return Form::Simple(kind);
    }

    if let Some(condition) = text.strip_prefix("when ") {
        if text.ends_with(':') {
            return Form::When {
                condition: branch_condition(condition),
            };
        }
    }

    Form::Simple(StatementKind::Unknown {
        text: text.to_string(),
    })
}

/// `remember that`, `forget about`, story objects and their properties
fn storytelling(text: &str) -> Option<StatementKind> {
    if let Some(rest) = text.strip_prefix("remember that ") {
        if let Some((name, value)) = rest.trim().split_once(" is ") {
            return Some(assign(name, value));
        }
    }

    if let Some(name) = text.strip_prefix("forget about ") {
        return Some(StatementKind::Forget {
            name: name.trim().to_string(),
        });
    }

    if let Some(rest) = text
        .strip_prefix("there is a ")
        .or_else(|| text.strip_prefix("there is an "))
    {
        let rest = rest.trim();
        let (name, properties) = match rest.split_once(" with ") {
            Some((name, props)) => (name.trim(), object_properties(props)),
            None => (rest, Vec::new()),
        };
        return Some(StatementKind::CreateObject {
            name: name.to_string(),
            properties,
        });
    }

    let subject = text.strip_prefix("the ")?;
    if let Some((object, rest)) = subject.split_once(" loses ") {
        let (amount, property) = match rest.trim().rsplit_once(' ') {
            Some((amount, property)) => (amount.trim(), property.trim()),
            None => (rest.trim(), "value"),
        };
        return Some(StatementKind::ChangeProperty {
            object: object.trim().to_string(),
            amount: amount.to_string(),
            property: property.to_string(),
            direction: Adjust::Decrease,
        });
    }
    if let Some((object, rest)) = subject.split_once(" gains ") {
        let rest = rest.trim();
        let object = object.trim().to_string();
        if let [source, source_property, property] = rest.split(' ').collect::<Vec<_>>()[..] {
            return Some(StatementKind::TransferProperty {
                object,
                source: source.to_string(),
                source_property: source_property.to_string(),
                property: property.to_string(),
            });
        }
        let (amount, property) = match rest.split_once(' ') {
            Some((amount, property)) => (amount.trim(), property.trim()),
            None => (rest, "value"),
        };
        return Some(StatementKind::ChangeProperty {
            object,
            amount: amount.to_string(),
            property: property.to_string(),
            direction: Adjust::Increase,
        });
    }
    None
}

/// `health 100, name "Aria"`; entries without a value are ignored
fn object_properties(text: &str) -> Vec<(String, String)> {
    text.split(',')
        .filter_map(|entry| {
            let (name, value) = entry.trim().split_once(' ')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn question_condition(text: &str) -> String {
    let condition = text.trim().trim_end_matches('?').trim();
    let condition = condition
        .strip_prefix("is ")
        .or_else(|| condition.strip_prefix("are "))
        .unwrap_or(condition);
    condition.trim().to_string()
}

fn define_header(header: &str) -> Form {
    match header.split_once(" with ") {
        Some((name, params)) => Form::Define {
            name: name.trim().to_string(),
            params: params
                .trim()
                .trim_end_matches(':')
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        },
        None => Form::Define {
            name: header.trim().trim_end_matches(':').trim().to_string(),
            params: Vec::new(),
        },
    }
}

/// Condition text of a `when`/`or when` header; empty means unconditional
pub(super) fn branch_condition(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let rest = rest.strip_suffix(':').unwrap_or(rest).trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn assign(name: &str, value: &str) -> StatementKind {
    StatementKind::Assign {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
    }
}

/// `let`, `so`, `set`, `increase` and `decrease`
fn assignment(text: &str) -> Option<StatementKind> {
    let forms: [(&str, &str); 3] = [("let ", " be "), ("so ", " is "), ("set ", " to ")];
    for (prefix, separator) in forms {
        if let Some((name, value)) = text
            .strip_prefix(prefix)
            .and_then(|rest| rest.split_once(separator))
        {
            return Some(assign(name, value));
        }
    }

    for (prefix, direction) in [("increase ", Adjust::Increase), ("decrease ", Adjust::Decrease)] {
        if let Some((name, amount)) = text
            .strip_prefix(prefix)
            .and_then(|rest| rest.split_once(" by "))
        {
            return Some(StatementKind::Adjust {
                name: name.trim().to_string(),
                amount: amount.trim().to_string(),
                direction,
            });
        }
    }
    None
}

/// `ask`, display statements, file statements and case changes
fn input_output(text: &str) -> Option<StatementKind> {
    if let Some((prompt, name)) = text
        .strip_prefix("ask ")
        .and_then(|rest| rest.split_once(" into "))
    {
        return Some(StatementKind::Ask {
            prompt: prompt
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string(),
            name: name.trim().to_string(),
        });
    }

    for &(prefix, newline) in DISPLAY_PREFIXES {
        if let Some(value) = text.strip_prefix(prefix) {
            return Some(StatementKind::Display {
                value: value.trim().to_string(),
                newline,
            });
        }
    }

    if let Some((content, path)) = text
        .strip_prefix("write ")
        .and_then(|rest| rest.split_once(" to "))
    {
        return Some(StatementKind::WriteFile {
            content: content.trim().to_string(),
            path: path.trim().to_string(),
        });
    }
    if let Some((path, name)) = text
        .strip_prefix("read ")
        .and_then(|rest| rest.split_once(" into "))
    {
        return Some(StatementKind::ReadFile {
            path: path.trim().to_string(),
            name: name.trim().to_string(),
        });
    }

    for (prefix, case) in [("uppercase ", Case::Upper), ("lowercase ", Case::Lower)] {
        if let Some((value, name)) = text
            .strip_prefix(prefix)
            .and_then(|rest| rest.split_once(" into "))
        {
            return Some(StatementKind::ChangeCase {
                value: value.trim().to_string(),
                name: name.trim().to_string(),
                case,
            });
        }
    }
    None
}

fn loop_header(text: &str) -> Option<Form> {
    if let Some(condition) = text.strip_prefix("while ") {
        if let Some(condition) = condition.strip_suffix(':') {
            return Some(Form::While {
                condition: condition.trim().to_string(),
            });
        }
    }

    if let Some(header) = text.strip_prefix("for each ") {
        if let Some((variable, iterable)) = header
            .strip_suffix(':')
            .and_then(|header| header.split_once(" in "))
        {
            return Some(Form::ForEach {
                variable: variable.trim().to_string(),
                iterable: iterable.trim().to_string(),
            });
        }
    }

    if let Some((count, _)) = text
        .strip_prefix("do ")
        .and_then(|rest| rest.split_once(" times:"))
    {
        return Some(Form::Repeat {
            count: count.trim().to_string(),
        });
    }

    if let Some(count) = text
        .strip_prefix("repeat ")
        .and_then(|rest| rest.strip_suffix(':'))
    {
        return Some(Form::Repeat {
            count: count.trim().to_string(),
        });
    }
    None
}

/// `make`, `add` and `remove`
fn list_statement(text: &str) -> Option<StatementKind> {
    if let Some((name, value)) = text
        .strip_prefix("make ")
        .and_then(|rest| rest.split_once(" with "))
    {
        return Some(assign(name, value));
    }
    if let Some((item, list)) = text
        .strip_prefix("add ")
        .and_then(|rest| rest.split_once(" to "))
    {
        return Some(StatementKind::Append {
            item: item.trim().to_string(),
            list: list.trim().to_string(),
        });
    }
    if let Some((item, list)) = text
        .strip_prefix("remove ")
        .and_then(|rest| rest.split_once(" from "))
    {
        return Some(StatementKind::Remove {
            item: item.trim().to_string(),
            list: list.trim().to_string(),
        });
    }
    None
}

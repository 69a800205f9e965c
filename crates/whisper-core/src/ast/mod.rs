// Statement tree for Whisper programs
// Produced once by the block parser and re-executed as often as needed.

use serde::{Deserialize, Serialize};

/// An ordered run of statements: a program, a loop body, a branch body or a
/// function body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// A statement together with the 1-based source line of its header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(line: usize, kind: StatementKind) -> Self {
        Self { line, kind }
    }
}

/// Direction of an `increase`/`decrease` or `gains`/`loses` adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adjust {
    Increase,
    Decrease,
}

/// Case folding applied by `uppercase`/`lowercase`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Case {
    Upper,
    Lower,
}

/// One arm of a `when` group. `condition` is `None` for `otherwise:`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub condition: Option<String>,
    pub body: Block,
}

/// Every statement form of the dialect. Expressions are kept as source text
/// and handed to the evaluator at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// remember that / so / let / set / make
    Assign { name: String, value: String },
    /// forget about NAME
    Forget { name: String },
    /// increase/decrease NAME by VALUE
    Adjust {
        name: String,
        amount: String,
        direction: Adjust,
    },
    /// there is a/an NAME with P1 V1, P2 V2
    CreateObject {
        name: String,
        properties: Vec<(String, String)>,
    },
    /// the NAME loses/gains AMOUNT PROP
    ChangeProperty {
        object: String,
        amount: String,
        property: String,
        direction: Adjust,
    },
    /// the NAME gains SOURCE SOURCE_PROP PROP
    TransferProperty {
        object: String,
        source: String,
        source_property: String,
        property: String,
    },
    /// is/are CONDITION? with optional yes:/no: blocks
    Question {
        condition: String,
        yes: Block,
        no: Block,
    },
    /// when / or when / otherwise
    When { branches: Vec<Branch> },
    /// define NAME [with params]:
    Define {
        name: String,
        params: Vec<String>,
        body: Block,
    },
    /// call NAME [with args]
    Call { name: String, args: Vec<String> },
    /// give back VALUE
    GiveBack { value: String },
    /// attempt: / handle:
    Attempt { body: Block, handler: Option<Block> },
    /// while CONDITION:
    While { condition: String, body: Block },
    /// for each NAME in ITERABLE:
    ForEach {
        variable: String,
        iterable: String,
        body: Block,
    },
    /// do COUNT times: / repeat COUNT:
    Repeat { count: String, body: Block },
    /// add ITEM to LIST
    Append { item: String, list: String },
    /// remove ITEM from LIST
    Remove { item: String, list: String },
    /// ask "PROMPT" into NAME
    Ask { prompt: String, name: String },
    /// whisper/show/tell me/just say/just tell (newline) and announce (none)
    Display { value: String, newline: bool },
    /// write CONTENT to PATH
    WriteFile { content: String, path: String },
    /// read PATH into NAME
    ReadFile { path: String, name: String },
    /// uppercase/lowercase VALUE into NAME
    ChangeCase {
        value: String,
        name: String,
        case: Case,
    },
    Break,
    Continue,
    /// Anything the parser could not classify; reported when reached.
    Unknown { text: String },
}

impl StatementKind {
    /// Short label used in trace output
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Assign { .. } => "assign",
            StatementKind::Forget { .. } => "forget",
            StatementKind::Adjust { .. } => "adjust",
            StatementKind::CreateObject { .. } => "create-object",
            StatementKind::ChangeProperty { .. } => "change-property",
            StatementKind::TransferProperty { .. } => "transfer-property",
            StatementKind::Question { .. } => "question",
            StatementKind::When { .. } => "when",
            StatementKind::Define { .. } => "define",
            StatementKind::Call { .. } => "call",
            StatementKind::GiveBack { .. } => "give-back",
            StatementKind::Attempt { .. } => "attempt",
            StatementKind::While { .. } => "while",
            StatementKind::ForEach { .. } => "for-each",
            StatementKind::Repeat { .. } => "repeat",
            StatementKind::Append { .. } => "append",
            StatementKind::Remove { .. } => "remove",
            StatementKind::Ask { .. } => "ask",
            StatementKind::Display { .. } => "display",
            StatementKind::WriteFile { .. } => "write",
            StatementKind::ReadFile { .. } => "read",
            StatementKind::ChangeCase { .. } => "change-case",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Unknown { .. } => "unknown",
        }
    }
}

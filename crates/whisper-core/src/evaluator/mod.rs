//! Expression evaluation.
//!
//! Expression text is tokenized once, identifiers are resolved against the
//! environment by rewriting the token stream (exact property references,
//! then embedded property references, then plain variables, longest names
//! first), adjacent string pieces are glued into a concatenation, and the
//! result is parsed and evaluated by the small grammar in [`grammar`].

use rand::{rngs::StdRng, SeedableRng};
use tracing::trace;

use crate::storage::Environment;

mod builtins;
pub mod errors;
pub mod grammar;
pub mod lexer;
mod ops;
pub mod value;


pub use builtins::{is_builtin, BUILTINS};
pub use errors::{ErrorKind, EvalError, EvalResult};
use grammar::Expr;
use lexer::{tokenize, Spanned, Token};
pub(crate) use ops::{add, subtract};
pub use value::{ListRef, RecordRef, Value};

/// Evaluates expression text against an environment.
///
/// Holds the random source used by `random()` and `randint()`; everything
/// else is a pure function of the text and the environment.
pub struct Evaluator {
    rng: StdRng,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Snapshot of one record-valued variable: its name and its properties in
/// insertion order.
type RecordView = (String, Vec<(String, Value)>);

impl Evaluator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn evaluate(&mut self, text: &str, env: &Environment) -> EvalResult<Value> {
        let text = text.trim();

        // A bracketed literal is taken as written when it stands on its own
        if text.starts_with('[') && text.ends_with(']') {
            if let Ok(value) = self.evaluate_unresolved(text) {
                return Ok(value);
            }
        }

        let spanned = tokenize(text)?;

        if let [Spanned {
            token: Token::Ident(name),
            ..
        }] = spanned.as_slice()
        {
            match env.lookup(name) {
                Some(value) => return Ok(value.clone()),
                None if is_builtin(name) => {}
                None => return Err(EvalError::undefined(name)),
            }
        }

        if let Some(value) = self.indexed_variable(text, &spanned, env)? {
            return Ok(value);
        }

        let records = records_longest_first(env);
        if let Some(value) = exact_property(text, &records) {
            return Ok(value);
        }

        let mut tokens: Vec<Token> = spanned.into_iter().map(|s| s.token).collect();
        substitute_properties(&mut tokens, &records)?;
        substitute_variables(&mut tokens, env)?;
        let tokens = concatenate_strings(tokens);
        trace!(expression = text, ?tokens, "resolved expression");

        let expr = grammar::parse(&tokens)?;
        self.eval_expr(&expr)
    }

    /// Parse and evaluate without touching the environment
    fn evaluate_unresolved(&mut self, text: &str) -> EvalResult<Value> {
        let tokens: Vec<Token> = tokenize(text)?.into_iter().map(|s| s.token).collect();
        let expr = grammar::parse(&tokens)?;
        self.eval_expr(&expr)
    }

    /// `name[index]` where the bracket opened after the name closes at the
    /// very end of the text.
    fn indexed_variable(
        &mut self,
        text: &str,
        tokens: &[Spanned],
        env: &Environment,
    ) -> EvalResult<Option<Value>> {
        let [Spanned {
            token: Token::Ident(name),
            ..
        }, open, .., close] = tokens
        else {
            return Ok(None);
        };
        if open.token != Token::LBracket || close.token != Token::RBracket {
            return Ok(None);
        }
        if matching_bracket(tokens, 1) != Some(tokens.len() - 1) {
            return Ok(None);
        }
        let target = env.get(name)?;
        let index = self.evaluate(&text[open.end..close.start], env)?;
        ops::index(&target, &index).map(Some)
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) if is_builtin(name) => Err(EvalError::Type {
                message: format!("built-in function '{name}' must be called"),
            }),
            Expr::Name(name) => Err(EvalError::undefined(name)),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval_expr(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::list),
            Expr::Unary(op, operand) => {
                let operand = self.eval_expr(operand)?;
                ops::unary(*op, &operand)
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval_expr(first)?;
                for (op, operand) in rest {
                    let right = self.eval_expr(operand)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Boolean(false));
                    }
                    left = right;
                }
                Ok(Value::Boolean(true))
            }
            Expr::And(left, right) => {
                let left = self.eval_expr(left)?;
                if left.is_truthy() {
                    self.eval_expr(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval_expr(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(right)
                }
            }
            Expr::Index(target, index) => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                ops::index(&target, &index)
            }
            Expr::Call(callee, args) => {
                let name = match callee.as_ref() {
                    Expr::Name(name) if is_builtin(name) => name,
                    Expr::Name(name) => return Err(EvalError::undefined(name)),
                    other => {
                        let value = self.eval_expr(other)?;
                        return Err(EvalError::Type {
                            message: format!("'{}' object is not callable", value.type_name()),
                        });
                    }
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                builtins::call(name, args, &mut self.rng)
            }
        }
    }
}

/// Index of the bracket closing the one at `open`
fn matching_bracket(tokens: &[Spanned], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, spanned) in tokens.iter().enumerate().skip(open) {
        match spanned.token {
            Token::LBracket => depth += 1,
            Token::RBracket => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn records_longest_first(env: &Environment) -> Vec<RecordView> {
    env.names_longest_first()
        .into_iter()
        .filter_map(|name| match env.lookup(name) {
            Some(Value::Record(props)) => Some((
                name.to_string(),
                props
                    .read()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )),
            _ => None,
        })
        .collect()
}

/// The whole text is `<variable> <property>` for some record variable
fn exact_property(text: &str, records: &[RecordView]) -> Option<Value> {
    records.iter().find_map(|(name, props)| {
        let rest = text.strip_prefix(name.as_str())?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let wanted = rest.trim_start();
        props
            .iter()
            .find(|(prop, _)| prop == wanted)
            .map(|(_, value)| value.clone())
    })
}

/// Token pattern for a name or `name property` phrase. Names that do not
/// tokenize to plain words and operators never match anything.
fn phrase(text: &str) -> Option<Vec<Token>> {
    let tokens: Vec<Token> = tokenize(text).ok()?.into_iter().map(|s| s.token).collect();
    if tokens.is_empty() || tokens.iter().any(Token::is_string) {
        return None;
    }
    Some(tokens)
}

fn same_token(candidate: &Token, wanted: &Token) -> bool {
    match (candidate.word(), wanted.word()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => candidate == wanted,
        _ => false,
    }
}

/// Replace every occurrence of `pattern` with a single token. String
/// literals are single tokens, so their contents are never touched.
fn replace_phrase(
    tokens: &mut Vec<Token>,
    pattern: &[Token],
    mut replacement: impl FnMut() -> EvalResult<Token>,
) -> EvalResult<()> {
    let mut i = 0;
    while i + pattern.len() <= tokens.len() {
        let window = &tokens[i..i + pattern.len()];
        if window.iter().zip(pattern).all(|(c, w)| same_token(c, w)) {
            tokens.drain(i..i + pattern.len());
            tokens.insert(i, replacement()?);
        }
        i += 1;
    }
    Ok(())
}

fn substitute_properties(tokens: &mut Vec<Token>, records: &[RecordView]) -> EvalResult<()> {
    for (name, props) in records {
        for (prop, value) in props {
            if let Some(pattern) = phrase(&format!("{name} {prop}")) {
                replace_phrase(tokens, &pattern, || Ok(Token::Value(value.detached()?)))?;
            }
        }
    }
    Ok(())
}

fn substitute_variables(tokens: &mut Vec<Token>, env: &Environment) -> EvalResult<()> {
    for name in env.names_longest_first() {
        let (Some(pattern), Some(value)) = (phrase(name), env.lookup(name)) else {
            continue;
        };
        replace_phrase(tokens, &pattern, || {
            Ok(match value {
                Value::Record(_) => Token::Value(Value::String(value.to_string())),
                Value::List(_) => Token::Value(value.detached()?),
                other => Token::Value(other.clone()),
            })
        })?;
    }
    Ok(())
}

/// Turn `"Score: " score` style text into `"Score: " + str(score)`.
///
/// Applies only when a string literal sits at the top level and the text
/// has no comparison or logical operator.
fn concatenate_strings(tokens: Vec<Token>) -> Vec<Token> {
    if tokens.iter().any(Token::is_comparison_or_logical) {
        return tokens;
    }

    let mut pieces: Vec<Vec<Token>> = Vec::new();
    let mut run = Vec::new();
    let mut depth = 0usize;
    let mut split = false;
    for token in tokens {
        match token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && token.is_string() {
            split = true;
            push_wrapped(&mut pieces, std::mem::take(&mut run));
            pieces.push(vec![token]);
        } else {
            run.push(token);
        }
    }
    if !split {
        return run;
    }
    push_wrapped(&mut pieces, run);

    let mut joined = Vec::new();
    for (i, piece) in pieces.into_iter().enumerate() {
        if i > 0 {
            joined.push(Token::Plus);
        }
        joined.extend(piece);
    }
    joined
}

fn push_wrapped(pieces: &mut Vec<Vec<Token>>, mut run: Vec<Token>) {
    if run.first() == Some(&Token::Plus) {
        run.remove(0);
    }
    if run.last() == Some(&Token::Plus) {
        run.pop();
    }
    if run.is_empty() {
        return;
    }
    let mut wrapped = Vec::with_capacity(run.len() + 3);
    wrapped.push(Token::Ident("str".to_string()));
    wrapped.push(Token::LParen);
    wrapped.extend(run);
    wrapped.push(Token::RParen);
    pieces.push(wrapped);
}

//! Statement executor.
//!
//! Walks a [`Block`] statement by statement against an explicit
//! [`Environment`]. Loop and function control is returned as a
//! [`ControlFlow`] value and inspected by the enclosing loop or call;
//! ordinary failures are [`EvalError`]s and are either absorbed by the
//! statement that owns them (`when`, questions, `while`, `attempt`) or
//! reported at the top level.

use std::{mem, sync::Arc, time::Duration};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    ast::{Adjust, Block, Branch, Case, Statement, StatementKind},
    evaluator::{add, subtract, ErrorKind, EvalError, EvalResult, Evaluator, RecordRef, Value},
    host::{Console, FileStore, LocalFiles, StdConsole},
    storage::{Environment, Function, FunctionTable, ObjectStore, ERROR_VARIABLE, LAST_RESULT},
    WhisperConfig,
};

pub mod conditions;

#[cfg(test)]
mod tests;

/// Outcome of executing a statement or a block
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Owns everything a run needs: global bindings, defined functions, story
/// objects, the expression evaluator and the host collaborators.
pub struct Interpreter {
    config: WhisperConfig,
    globals: Environment,
    functions: FunctionTable,
    objects: ObjectStore,
    evaluator: Evaluator,
    console: Box<dyn Console>,
    files: Box<dyn FileStore>,
    depth: usize,
}

impl Interpreter {
    /// Interpreter wired to the process console and the local filesystem
    pub fn new(config: WhisperConfig) -> Self {
        let console = StdConsole::new(config.input_timeout_ms.map(Duration::from_millis));
        Self::with_host(config, Box::new(console), Box::new(LocalFiles::new()))
    }

    pub fn with_host(
        config: WhisperConfig,
        console: Box<dyn Console>,
        files: Box<dyn FileStore>,
    ) -> Self {
        let evaluator = Evaluator::new(config.random_seed);
        Self {
            config,
            globals: Environment::new(),
            functions: FunctionTable::new(),
            objects: ObjectStore::new(),
            evaluator,
            console,
            files,
            depth: 0,
        }
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// Forget every variable, function and story object
    pub fn reset(&mut self) {
        self.globals.clear();
        self.functions.clear();
        self.objects.clear();
        self.depth = 0;
    }

    /// Write text to the console as-is
    pub fn print(&mut self, text: &str) -> EvalResult<()> {
        self.console.print(text)
    }

    fn report(&mut self, message: &str) -> EvalResult<()> {
        self.console.print(&format!("{message}\n"))
    }

    /// Run a program against the global environment.
    ///
    /// A failing top-level statement is reported as `Error: <message>` and
    /// the run continues with the next one. `give back` at the top level
    /// ends the run. Only a console failure while reporting is returned.
    pub fn run(&mut self, program: &Block) -> EvalResult<()> {
        let mut env = mem::take(&mut self.globals);
        let outcome = self.run_top_level(program, &mut env);
        self.globals = env;
        outcome
    }

    fn run_top_level(&mut self, program: &Block, env: &mut Environment) -> EvalResult<()> {
        for statement in &program.statements {
            match self.exec_statement(statement, env) {
                Ok(ControlFlow::Normal) => {}
                Ok(ControlFlow::Return(value)) => {
                    debug!(line = statement.line, %value, "program returned");
                    break;
                }
                Ok(ControlFlow::Break) => self.report("Error: 'break' outside loop")?,
                Ok(ControlFlow::Continue) => {
                    self.report("Error: 'continue' not properly in loop")?
                }
                Err(err) => self.report(&format!("Error: {err}"))?,
            }
        }
        Ok(())
    }

    /// Execute statements in order until one of them leaves the block
    pub fn exec_block(&mut self, block: &Block, env: &mut Environment) -> EvalResult<ControlFlow> {
        for statement in &block.statements {
            let flow = self.exec_statement(statement, env)?;
            if flow != ControlFlow::Normal {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn evaluate(&mut self, text: &str, env: &Environment) -> EvalResult<Value> {
        self.evaluator.evaluate(text, env)
    }

    pub fn exec_statement(
        &mut self,
        statement: &Statement,
        env: &mut Environment,
    ) -> EvalResult<ControlFlow> {
        debug!(line = statement.line, form = statement.kind.label(), "executing statement");

        match &statement.kind {
            StatementKind::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                env.set(name.clone(), value);
            }
            StatementKind::Forget { name } => {
                env.delete(name);
            }
            StatementKind::Adjust {
                name,
                amount,
                direction,
            } => self.adjust(name, amount, *direction, env)?,
            StatementKind::CreateObject { name, properties } => {
                self.create_object(name, properties, env)?
            }
            StatementKind::ChangeProperty {
                object,
                amount,
                property,
                direction,
            } => self.change_property(object, amount, property, *direction, env)?,
            StatementKind::TransferProperty {
                object,
                source,
                source_property,
                property,
            } => self.transfer_property(object, source, source_property, property, env)?,
            StatementKind::Question { condition, yes, no } => {
                match self.question(condition, yes, no, env) {
                    Ok(flow) => return Ok(flow),
                    Err(err) => self.report(&format!("Error: {err}"))?,
                }
            }
            StatementKind::When { branches } => return self.when(branches, env),
            StatementKind::Define { name, params, body } => {
                debug!(function = %name, params = params.len(), "defining function");
                self.functions.define(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Arc::new(body.clone()),
                });
            }
            StatementKind::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<EvalResult<Vec<_>>>()?;
                if let Some(result) = self.call(name, args, env)? {
                    env.set(LAST_RESULT, result);
                }
            }
            StatementKind::GiveBack { value } => {
                let value = self.evaluate(value, env)?;
                return Ok(ControlFlow::Return(value));
            }
            StatementKind::Attempt { body, handler } => {
                return self.attempt(body, handler.as_ref(), env)
            }
            StatementKind::While { condition, body } => return self.while_loop(condition, body, env),
            StatementKind::ForEach {
                variable,
                iterable,
                body,
            } => return self.for_each(variable, iterable, body, env),
            StatementKind::Repeat { count, body } => return self.repeat(count, body, env),
            StatementKind::Append { item, list } => {
                let item = self.evaluate(item, env)?;
                match env.lookup(list).cloned() {
                    Some(Value::List(items)) => items.write().push(item),
                    Some(other) => env.set(list.clone(), Value::list(vec![other, item])),
                    None => env.set(list.clone(), Value::list(vec![item])),
                }
            }
            StatementKind::Remove { item, list } => {
                let item = self.evaluate(item, env)?;
                if let Some(Value::List(items)) = env.lookup(list).cloned() {
                    let position = items.read().iter().position(|v| *v == item);
                    if let Some(position) = position {
                        items.write().remove(position);
                    }
                }
            }
            StatementKind::Ask { prompt, name } => {
                let answer = self.console.read_line(&format!("{prompt} "))?;
                env.set(name.clone(), parse_answer(&answer));
            }
            StatementKind::Display { value, newline } => self.display(value, *newline, env)?,
            StatementKind::WriteFile { content, path } => {
                let content = self.evaluate(content, env)?.to_string();
                let path = self.evaluate(path, env)?.to_string();
                self.files.write(&path, &content)?;
            }
            StatementKind::ReadFile { path, name } => {
                let path = self.evaluate(path, env)?.to_string();
                let contents = self.files.read(&path)?;
                env.set(name.clone(), Value::String(contents));
            }
            StatementKind::ChangeCase { value, name, case } => {
                let text = self.evaluate(value, env)?.to_string();
                let folded = match case {
                    Case::Upper => text.to_uppercase(),
                    Case::Lower => text.to_lowercase(),
                };
                env.set(name.clone(), Value::String(folded));
            }
            StatementKind::Break => return Ok(ControlFlow::Break),
            StatementKind::Continue => return Ok(ControlFlow::Continue),
            StatementKind::Unknown { text } => self.report(&format!("Unknown command: {text}"))?,
        }
        Ok(ControlFlow::Normal)
    }

    fn adjust(
        &mut self,
        name: &str,
        amount: &str,
        direction: Adjust,
        env: &mut Environment,
    ) -> EvalResult<()> {
        let amount = self.evaluate(amount, env)?;
        let updated = match (env.lookup(name), direction) {
            (Some(current), Adjust::Increase) => add(current, &amount)?,
            (Some(current), Adjust::Decrease) => subtract(current, &amount)?,
            (None, Adjust::Increase) => amount,
            (None, Adjust::Decrease) => subtract(&Value::Integer(0), &amount)?,
        };
        env.set(name, updated);
        Ok(())
    }

    fn create_object(
        &mut self,
        name: &str,
        properties: &[(String, String)],
        env: &mut Environment,
    ) -> EvalResult<()> {
        let mut record = IndexMap::with_capacity(properties.len());
        for (property, value) in properties {
            let value = self.evaluate(value, env)?;
            record.insert(property.clone(), value);
        }
        let record: RecordRef = Arc::new(RwLock::new(record));
        self.objects.declare(name, record.clone());
        env.set(name, Value::Record(record));
        Ok(())
    }

    /// `the hero loses 20 health`; nothing happens unless the object and
    /// the property both exist
    fn change_property(
        &mut self,
        object: &str,
        amount: &str,
        property: &str,
        direction: Adjust,
        env: &mut Environment,
    ) -> EvalResult<()> {
        let amount = self.evaluate(amount, env)?;
        let Some(record) = self.objects.lookup(object) else {
            return Ok(());
        };
        let Some(current) = record.read().get(property).cloned() else {
            return Ok(());
        };
        let updated = match direction {
            Adjust::Increase => add(&current, &amount)?,
            Adjust::Decrease => subtract(&current, &amount)?,
        };
        record.write().insert(property.to_string(), updated);
        env.set(object, Value::Record(record));
        Ok(())
    }

    /// `the hero gains dragon treasure gold`: adds the dragon's treasure to
    /// the hero's gold when all four names exist
    fn transfer_property(
        &mut self,
        object: &str,
        source: &str,
        source_property: &str,
        property: &str,
        env: &mut Environment,
    ) -> EvalResult<()> {
        let Some(amount) = self.objects.property(source, source_property) else {
            return Ok(());
        };
        let Some(record) = self.objects.lookup(object) else {
            return Ok(());
        };
        let Some(current) = record.read().get(property).cloned() else {
            return Ok(());
        };
        let updated = add(&current, &amount)?;
        record.write().insert(property.to_string(), updated);
        env.set(object, Value::Record(record));
        Ok(())
    }

    fn question(
        &mut self,
        condition: &str,
        yes: &Block,
        no: &Block,
        env: &mut Environment,
    ) -> EvalResult<ControlFlow> {
        let condition = conditions::rewrite(condition);
        if self.evaluate(&condition, env)?.is_truthy() {
            self.exec_block(yes, env)
        } else {
            self.exec_block(no, env)
        }
    }

    /// First branch whose condition holds runs; `otherwise` runs only when
    /// none did. A failure in a condition or a conditional branch is
    /// reported and ends the group.
    fn when(&mut self, branches: &[Branch], env: &mut Environment) -> EvalResult<ControlFlow> {
        for branch in branches {
            let Some(condition) = &branch.condition else {
                return self.exec_block(&branch.body, env);
            };
            let condition = conditions::rewrite(condition);
            let outcome = match self.evaluate(&condition, env) {
                Ok(test) if test.is_truthy() => self.exec_block(&branch.body, env).map(Some),
                Ok(_) => Ok(None),
                Err(err) => Err(err),
            };
            match outcome {
                Ok(Some(flow)) => return Ok(flow),
                Ok(None) => {}
                Err(err) => {
                    self.report(&format!("Error evaluating condition '{condition}': {err}"))?;
                    return Ok(ControlFlow::Normal);
                }
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn attempt(
        &mut self,
        body: &Block,
        handler: Option<&Block>,
        env: &mut Environment,
    ) -> EvalResult<ControlFlow> {
        match self.exec_block(body, env) {
            Ok(flow) => Ok(flow),
            Err(err) => match handler {
                Some(handler) => {
                    debug!(error = %err, "attempt failed, running handler");
                    env.set(ERROR_VARIABLE, Value::String(err.to_string()));
                    self.exec_block(handler, env)
                }
                None => {
                    self.report(&format!("Error: {err}"))?;
                    Ok(ControlFlow::Normal)
                }
            },
        }
    }

    fn while_loop(
        &mut self,
        condition: &str,
        body: &Block,
        env: &mut Environment,
    ) -> EvalResult<ControlFlow> {
        let condition = conditions::rewrite(condition);
        let limit = self.config.max_loop_iterations;
        let mut iterations = 0;
        loop {
            if iterations >= limit {
                warn!(%condition, limit, "while loop reached its iteration cap");
                break;
            }
            let step = match self.evaluate(&condition, env) {
                Ok(test) if test.is_truthy() => self.exec_block(body, env),
                Ok(_) => break,
                Err(err) => Err(err),
            };
            iterations += 1;
            match step {
                Ok(ControlFlow::Normal | ControlFlow::Continue) => {}
                Ok(ControlFlow::Break) => break,
                Ok(flow @ ControlFlow::Return(_)) => return Ok(flow),
                Err(err) => {
                    self.report(&format!("Error in while loop: {err}"))?;
                    break;
                }
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn for_each(
        &mut self,
        variable: &str,
        iterable: &str,
        body: &Block,
        env: &mut Environment,
    ) -> EvalResult<ControlFlow> {
        let items = match self.evaluate(iterable, env)? {
            Value::List(items) => items.read().clone(),
            Value::String(text) => text.chars().map(|c| Value::String(c.to_string())).collect(),
            other => vec![other],
        };
        for item in items {
            env.set(variable, item);
            match self.exec_block(body, env)? {
                ControlFlow::Normal | ControlFlow::Continue => {}
                ControlFlow::Break => break,
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn repeat(&mut self, count: &str, body: &Block, env: &mut Environment) -> EvalResult<ControlFlow> {
        let count = repetitions(&self.evaluate(count, env)?)?;
        for _ in 0..count {
            match self.exec_block(body, env)? {
                ControlFlow::Normal | ControlFlow::Continue => {}
                ControlFlow::Break => break,
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Display statements report an undefined name in place; any other
    /// failure propagates.
    fn display(&mut self, value: &str, newline: bool, env: &Environment) -> EvalResult<()> {
        match self.evaluate(value, env) {
            Ok(value) => {
                let mut text = value.to_string();
                if newline {
                    text.push('\n');
                }
                self.console.print(&text)
            }
            Err(err) if err.kind() == ErrorKind::Name => self.report(&format!("Error: {err}")),
            Err(err) => Err(err),
        }
    }

    /// Call a user-defined function with a copy of the caller's bindings.
    /// Returns the value handed to `give back`, if any.
    pub fn call(
        &mut self,
        name: &str,
        args: Vec<Value>,
        env: &Environment,
    ) -> EvalResult<Option<Value>> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::runtime(format!("Function '{name}' not defined")))?;

        if self.depth >= self.config.max_call_depth {
            warn!(function = name, depth = self.depth, "call depth limit reached");
            return Err(EvalError::runtime("maximum recursion depth exceeded"));
        }

        let mut frame = env.copy();
        for (param, arg) in function.params.iter().zip(args) {
            frame.set(param.clone(), arg);
        }

        debug!(function = name, depth = self.depth, "calling function");
        self.depth += 1;
        let flow = self.exec_block(&function.body, &mut frame);
        self.depth -= 1;

        match flow? {
            ControlFlow::Normal => Ok(None),
            ControlFlow::Return(Value::Null) => Ok(None),
            ControlFlow::Return(value) => {
                debug!(function = name, %value, "function returned");
                Ok(Some(value))
            }
            ControlFlow::Break => Err(EvalError::runtime("'break' outside loop")),
            ControlFlow::Continue => Err(EvalError::runtime("'continue' not properly in loop")),
        }
    }
}

/// Interpret an answer typed at an `ask` prompt: text with a `.` as a
/// float, otherwise as an integer, falling back to the raw text
fn parse_answer(answer: &str) -> Value {
    let trimmed = answer.trim();
    if answer.contains('.') {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    } else if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    Value::String(answer.to_string())
}

/// Number of times a `repeat`/`do ... times` body runs
fn repetitions(count: &Value) -> EvalResult<i64> {
    match count {
        Value::Integer(i) => Ok(*i),
        Value::Boolean(b) => Ok(i64::from(*b)),
        Value::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
        Value::Float(f) => Err(EvalError::bad_value(format!(
            "cannot convert float {} to integer",
            crate::evaluator::value::format_float(*f)
        ))),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            EvalError::bad_value(format!("invalid literal for int() with base 10: '{s}'"))
        }),
        other => Err(EvalError::Type {
            message: format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ),
        }),
    }
}

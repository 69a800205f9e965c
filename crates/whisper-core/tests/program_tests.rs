use pretty_assertions::assert_eq;
use tempfile::TempDir;
use whisper_core::{
    host::{CapturedConsole, LocalFiles, MemoryFiles},
    Environment, Evaluator, Value, WhisperConfig, WhisperError, WhisperRuntime,
};

fn create_runtime() -> (WhisperRuntime, CapturedConsole) {
    let console = CapturedConsole::new();
    let runtime = WhisperRuntime::with_host(
        WhisperConfig::default(),
        Box::new(console.clone()),
        Box::new(MemoryFiles::new()),
    );
    (runtime, console)
}

fn run_program(source: &str) -> (WhisperRuntime, Vec<String>) {
    let (mut runtime, console) = create_runtime();
    runtime.run_source(source).unwrap();
    (runtime, console.lines())
}

#[test]
fn test_remember_then_show() {
    let (_, output) = run_program("remember that x is 5\nshow x\n");
    assert_eq!(output, vec!["5"]);
}

#[test]
fn test_counting_while_loop() {
    let source = "\
let x be 1
while x is less than 4:
    show x
    increase x by 1
";
    let (runtime, output) = run_program(source);
    assert_eq!(output, vec!["1", "2", "3"]);
    assert_eq!(runtime.variable("x"), Some(Value::Integer(4)));
}

#[test]
fn test_function_result_is_stored() {
    let source = "\
define double with n:
    give back n * 2
call double with 5
";
    let (runtime, output) = run_program(source);
    assert!(output.is_empty());
    assert_eq!(runtime.variable("__last_result__"), Some(Value::Integer(10)));
    assert_eq!(runtime.function_names(), vec!["double".to_string()]);
}

#[test]
fn test_story_object_loses_health() {
    let source = "\
there is a hero with health 100
the hero loses 20 health
show hero health
";
    let (_, output) = run_program(source);
    assert_eq!(output, vec!["80"]);
}

#[test]
fn test_list_indexing_matches_elements() {
    let values = ["10", "'two'", "3.5", "[4]"];
    let source = format!("make items with [{}]\n", values.join(", "));
    let (mut runtime, console) = create_runtime();
    runtime.run_source(&source).unwrap();

    for (i, expected) in ["10", "two", "3.5", "[4]"].iter().enumerate() {
        runtime.run_source(&format!("show items[{i}]")).unwrap();
        assert_eq!(console.take_output(), format!("{expected}\n"));
    }

    runtime.run_source("show items[4]\nshow \"still here\"").unwrap();
    let output = console.take_output();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, vec!["Error: Index out of range or invalid: 4", "still here"]);
}

#[test]
fn test_undefined_variable_diagnostic() {
    let (_, output) = run_program("show undefinedvar\nshow \"next\"\n");
    assert_eq!(
        output,
        vec!["Error: Variable 'undefinedvar' is not defined", "next"]
    );
}

#[test]
fn test_evaluation_is_repeatable() {
    let mut env = Environment::new();
    env.set("a", Value::Integer(6));
    env.set("b", Value::Float(1.5));
    let mut evaluator = Evaluator::new(Some(3));
    let first = evaluator.evaluate("a * b + 10 // 3", &env).unwrap();
    let second = evaluator.evaluate("a * b + 10 // 3", &env).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Value::Float(12.0));
    assert_eq!(env.get("a").unwrap(), Value::Integer(6));
}

#[test]
fn test_runaway_loop_stops_at_cap() {
    let source = "\
let n be 0
while n is not -1:
    increase n by 1
show n
";
    let (_, output) = run_program(source);
    assert_eq!(output, vec!["10000"]);
}

#[test]
fn test_adventure_program() {
    let source = "\
# a tiny adventure
there is a hero with health 30, gold 0
there is a dragon with treasure 50, health 20
make inventory with [\"sword\"]
add \"shield\" to inventory

define attack with damage:
    the dragon loses damage health
    give back dragon health

let rounds be 0
while dragon health is bigger than 0:
    call attack with 7
    increase rounds by 1
    the hero loses 2 health

the hero gains dragon treasure gold
hey whisper, that was close
show \"Rounds: \" rounds
show \"Gold: \" hero gold
show hero health
for each item in inventory:
    announce item
    announce \" \"
show \"\"
";
    let (runtime, output) = run_program(source);
    assert_eq!(
        output,
        vec!["Rounds: 3", "Gold: 50", "24", "sword shield "]
    );
    assert_eq!(runtime.variable("__last_result__"), Some(Value::Integer(-1)));
}

#[test]
fn test_state_is_kept_between_sources_until_reset() {
    let (mut runtime, console) = create_runtime();
    runtime.run_source("let total be 1").unwrap();
    runtime.run_source("increase total by 2\nshow total").unwrap();
    assert_eq!(console.take_output(), "3\n");

    runtime.reset();
    assert!(runtime.variables().is_empty());
    runtime.run_source("show total").unwrap();
    assert_eq!(
        console.take_output(),
        "Error: Variable 'total' is not defined\n"
    );
}

#[test]
fn test_run_file_and_local_file_statements() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("story.whisper");
    std::fs::write(
        &script,
        "write \"saved\" to \"out.txt\"\nread \"out.txt\" into text\nshow text\n",
    )
    .unwrap();

    let console = CapturedConsole::new();
    let mut runtime = WhisperRuntime::with_host(
        WhisperConfig::default(),
        Box::new(console.clone()),
        Box::new(LocalFiles::rooted(dir.path())),
    );
    runtime.run_file(&script).unwrap();
    assert_eq!(console.output(), "saved\n");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "saved"
    );
}

#[test]
fn test_missing_source_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.whisper");
    let (mut runtime, console) = create_runtime();

    let err = runtime.run_file(&missing).unwrap_err();
    assert!(matches!(err, WhisperError::SourceNotFound(_)));
    assert_eq!(
        console.output(),
        format!("Error: File '{}' not found\n", missing.display())
    );
}

#[test]
fn test_seeded_random_is_reproducible() {
    let config = WhisperConfig {
        random_seed: Some(99),
        ..WhisperConfig::default()
    };
    let draw = || {
        let console = CapturedConsole::new();
        let mut runtime = WhisperRuntime::with_host(
            config.clone(),
            Box::new(console.clone()),
            Box::new(MemoryFiles::new()),
        );
        runtime
            .run_source("repeat 5:\n    announce randint(1, 100)\n    announce \",\"\n")
            .unwrap();
        console.output()
    };
    assert_eq!(draw(), draw());
}

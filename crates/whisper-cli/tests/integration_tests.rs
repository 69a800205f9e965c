use pretty_assertions::assert_eq;
use tempfile::TempDir;
use whisper_cli::repl::{BufferedNotifier, LineProcessResult, MultiLineCollector, Repl, ReplCommand};
use whisper_core::{
    host::{CapturedConsole, LocalFiles},
    WhisperConfig, WhisperRuntime,
};

fn create_repl(dir: &TempDir) -> (Repl, CapturedConsole) {
    let console = CapturedConsole::new();
    let runtime = WhisperRuntime::with_host(
        WhisperConfig::default(),
        Box::new(console.clone()),
        Box::new(LocalFiles::rooted(dir.path())),
    );
    (Repl::new(runtime), console)
}

#[test]
fn test_statements_share_one_session() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, console) = create_repl(&temp_dir);

    repl.execute("let x be 40").unwrap();
    repl.execute("increase x by 2").unwrap();
    repl.execute("show \"x is \" x").unwrap();
    assert_eq!(console.output(), "x is 42\n");
}

#[test]
fn test_collected_block_runs_as_one_input() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, console) = create_repl(&temp_dir);
    let mut collector = MultiLineCollector::new();

    let mut submitted = Vec::new();
    for line in ["let n be 0", "repeat 3:", "    increase n by 2", "", "show n"] {
        if let LineProcessResult::Complete(code) = collector.process_line(line) {
            submitted.push(code.clone());
            repl.execute(&code).unwrap();
        }
    }
    assert_eq!(
        submitted,
        vec!["let n be 0", "repeat 3:\n    increase n by 2", "show n"]
    );
    assert_eq!(console.output(), "6\n");
}

#[test]
fn test_vars_and_reset_commands() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, _console) = create_repl(&temp_dir);

    repl.execute("let name be \"Ada\"\nmake items with [1, 2]").unwrap();
    let vars = repl.handle_command(ReplCommand::Vars).unwrap();
    assert_eq!(vars, "  items = [1, 2]\n  name = 'Ada'");

    let message = repl.handle_command(ReplCommand::Reset).unwrap();
    assert!(message.contains("forgotten"));
    assert_eq!(
        repl.handle_command(ReplCommand::Vars).unwrap(),
        "No variables defined."
    );
}

#[test]
fn test_load_command_runs_file_in_session() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("greet.whisper");
    std::fs::write(&script, "define greet with who:\n    show \"Hello, \" who\n").unwrap();

    let (mut repl, console) = create_repl(&temp_dir);
    let command = repl
        .parse_input(&format!(".load {}", script.display()))
        .unwrap();
    let message = repl.handle_command(command).unwrap();
    assert!(message.starts_with("Loaded"));

    repl.execute("call greet with \"Ada\"").unwrap();
    assert_eq!(console.output(), "Hello, Ada\n");
}

#[test]
fn test_load_missing_file_reports_on_console() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, console) = create_repl(&temp_dir);

    let missing = temp_dir.path().join("nope.whisper");
    let message = repl
        .handle_command(ReplCommand::Load(missing.display().to_string()))
        .unwrap();
    assert_eq!(message, "");
    assert_eq!(
        console.output(),
        format!("Error: File '{}' not found\n", missing.display())
    );
}

#[test]
fn test_quit_stops_repl() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, _console) = create_repl(&temp_dir);
    assert!(repl.is_running());
    assert_eq!(repl.handle_command(ReplCommand::Quit).unwrap(), "Goodbye!");
    assert!(!repl.is_running());
}

#[test]
fn test_notifier_receives_messages() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, _console) = create_repl(&temp_dir);
    let notifier = BufferedNotifier::new();
    repl.set_notifier(Box::new(notifier.clone()));

    let help = repl.handle_command(ReplCommand::Help).unwrap();
    repl.notifier().on_output(&help);
    repl.notifier().on_output("");
    repl.notifier().on_error("Error: boom");

    assert_eq!(notifier.messages().len(), 1);
    assert!(notifier.messages()[0].contains(".load <file>"));
    assert_eq!(notifier.errors(), vec!["Error: boom"]);
}

#[test]
fn test_program_errors_do_not_fail_execute() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, console) = create_repl(&temp_dir);
    repl.execute("show 1 / 0").unwrap();
    repl.execute("frobnicate").unwrap();
    assert_eq!(
        console.lines(),
        vec!["Error: division by zero", "Unknown command: frobnicate"]
    );
}

#[test]
fn test_vars_lists_story_objects() {
    let temp_dir = TempDir::new().unwrap();
    let (mut repl, _console) = create_repl(&temp_dir);

    repl.execute("there is a hero with health 100\nthere is a dragon with health 300")
        .unwrap();
    let vars = repl.handle_command(ReplCommand::Vars).unwrap();
    let lines: Vec<&str> = vars.lines().collect();
    assert_eq!(lines[0], "  dragon = {'health': 300}");
    assert_eq!(lines[1], "  hero = {'health': 100}");
    assert_eq!(lines[2], "Story objects: hero, dragon");
}

use pretty_assertions::assert_eq;

use super::*;
use crate::{
    host::{CapturedConsole, MemoryFiles},
    parser::parse_program,
};

fn create_test_interpreter(config: WhisperConfig) -> (Interpreter, CapturedConsole, MemoryFiles) {
    let console = CapturedConsole::new();
    let files = MemoryFiles::new();
    let interpreter =
        Interpreter::with_host(config, Box::new(console.clone()), Box::new(files.clone()));
    (interpreter, console, files)
}

fn run_with(config: WhisperConfig, source: &str) -> (Interpreter, CapturedConsole) {
    let (mut interpreter, console, _) = create_test_interpreter(config);
    interpreter.run(&parse_program(source)).unwrap();
    (interpreter, console)
}

fn run(source: &str) -> (Interpreter, CapturedConsole) {
    run_with(WhisperConfig::default(), source)
}

fn output(source: &str) -> Vec<String> {
    run(source).1.lines()
}

#[test]
fn test_assignment_forms() {
    let source = "\
remember that a is 1
so b is 2
let c be 3
set d to 4
make e with [5]
show a + b + c + d
show e
";
    assert_eq!(output(source), vec!["10", "[5]"]);
}

#[test]
fn test_forget_removes_binding() {
    let source = "let x be 1\nforget about x\nforget about y\nshow x\n";
    assert_eq!(output(source), vec!["Error: Variable 'x' is not defined"]);
}

#[test]
fn test_increase_and_decrease() {
    let source = "\
let x be 5
increase x by 2
decrease x by 10
increase fresh by 4
decrease other by 3
show x
show fresh
show other
";
    assert_eq!(output(source), vec!["-3", "4", "-3"]);
}

#[test]
fn test_while_loop_counts_up() {
    let source = "\
let x be 1
while x is less than 4:
    show x
    increase x by 1
";
    assert_eq!(output(source), vec!["1", "2", "3"]);
}

#[test]
fn test_while_true_stops_at_cap() {
    let (interpreter, _) = run("let n be 0\nwhile true:\n    increase n by 1\n");
    assert_eq!(interpreter.globals().get("n").unwrap(), Value::Integer(10_000));
}

#[test]
fn test_loop_cap_is_configurable() {
    let config = WhisperConfig {
        max_loop_iterations: 7,
        ..WhisperConfig::default()
    };
    let (interpreter, _) = run_with(config, "let n be 0\nwhile 1:\n    increase n by 1\n");
    assert_eq!(interpreter.globals().get("n").unwrap(), Value::Integer(7));
}

#[test]
fn test_while_error_is_reported_and_loop_ends() {
    let source = "\
let x be 0
while x is less than 3:
    increase x by 1
    show 1 / 0
show x
";
    assert_eq!(
        output(source),
        vec!["Error in while loop: division by zero", "1"]
    );
}

#[test]
fn test_break_and_continue() {
    let source = "\
for each n in [1, 2, 3, 4, 5]:
    when n is 2:
        skip
    when n is 4:
        stop
    show n
";
    assert_eq!(output(source), vec!["1", "3"]);
}

#[test]
fn test_for_each_over_string_and_scalar() {
    let source = "\
for each c in \"ab\":
    show c
for each v in 7:
    show v
";
    assert_eq!(output(source), vec!["a", "b", "7"]);
}

#[test]
fn test_repeat_forms() {
    let source = "\
let n be 0
do 3 times:
    increase n by 1
repeat \"2\":
    increase n by 10
repeat 2.9:
    increase n by 100
show n
";
    assert_eq!(output(source), vec!["223"]);
}

#[test]
fn test_when_first_match_wins() {
    let source = "\
let x be 2
when x is 1:
    show \"one\"
or when x greater than 1:
    show \"big\"
or when x is 2:
    show \"two\"
otherwise:
    show \"other\"
";
    assert_eq!(output(source), vec!["big"]);
}

#[test]
fn test_when_otherwise_runs_when_nothing_matched() {
    let source = "\
let x be 9
when x is 1:
    show \"one\"
otherwise:
    show \"other\"
";
    assert_eq!(output(source), vec!["other"]);
}

#[test]
fn test_when_condition_error_is_reported() {
    let source = "\
when ghost is 1:
    show \"never\"
otherwise:
    show \"also never\"
show \"after\"
";
    assert_eq!(
        output(source),
        vec![
            "Error evaluating condition 'ghost == 1': Variable 'ghost' is not defined",
            "after"
        ]
    );
}

#[test]
fn test_question_group() {
    let source = "\
let x be 7
is x greater than 5?
    yes:
        show \"big\"
    no:
        show \"small\"
is x smaller than 5?
    yes:
        show \"tiny\"
";
    assert_eq!(output(source), vec!["big"]);
}

#[test]
fn test_function_call_stores_last_result() {
    let source = "\
define double with n:
    give back n * 2
call double with 5
show __last_result__
";
    let (interpreter, console) = run(source);
    assert_eq!(console.lines(), vec!["10"]);
    assert_eq!(
        interpreter.globals().get(LAST_RESULT).unwrap(),
        Value::Integer(10)
    );
    assert!(interpreter.functions().contains("double"));
}

#[test]
fn test_function_scope_is_a_copy() {
    let source = "\
let count be 1
let items be [1]
define touch:
    let count be 99
    add 2 to items
call touch
show count
show items
";
    assert_eq!(output(source), vec!["1", "[1, 2]"]);
}

#[test]
fn test_give_back_unwinds_loops() {
    let source = "\
define first_big with limit:
    for each n in [1, 5, 10]:
        when n greater than limit:
            give back n
    give back 0
call first_big with 4
show __last_result__
";
    assert_eq!(output(source), vec!["5"]);
}

#[test]
fn test_missing_arguments_stay_unbound() {
    let source = "\
define greet with who, greeting:
    show who
    show greeting
call greet with \"Ada\"
";
    assert_eq!(
        output(source),
        vec!["Ada", "Error: Variable 'greeting' is not defined"]
    );
}

#[test]
fn test_undefined_function_is_reported() {
    assert_eq!(
        output("call nothing\nshow 1\n"),
        vec!["Error: Function 'nothing' not defined", "1"]
    );
}

#[test]
fn test_recursion_guard() {
    let config = WhisperConfig {
        max_call_depth: 20,
        ..WhisperConfig::default()
    };
    let source = "\
define forever:
    call forever
call forever
show \"still running\"
";
    let (_, console) = run_with(config, source);
    assert_eq!(
        console.lines(),
        vec!["Error: maximum recursion depth exceeded", "still running"]
    );
}

#[test]
fn test_recursive_function() {
    let source = "\
define fact with n:
    when n less than 2:
        give back 1
    call fact with n - 1
    give back n * __last_result__
call fact with 5
show __last_result__
";
    assert_eq!(output(source), vec!["120"]);
}

#[test]
fn test_attempt_binds_error() {
    let source = "\
attempt:
    show 1 / 0
    show \"skipped\"
handle:
    show \"caught: \" error
show \"after\"
";
    assert_eq!(output(source), vec!["caught: division by zero", "after"]);
}

#[test]
fn test_attempt_without_handler_reports() {
    let source = "attempt:\n    let x be [1][5]\nshow \"after\"\n";
    assert_eq!(
        output(source),
        vec!["Error: Index out of range or invalid: 5", "after"]
    );
}

#[test]
fn test_attempt_passes_control_flow_through() {
    let source = "\
for each n in [1, 2, 3]:
    attempt:
        when n is 2:
            break
    show n
";
    assert_eq!(output(source), vec!["1"]);
}

#[test]
fn test_story_objects() {
    let source = "\
there is a hero with health 100, name \"Aria\"
the hero loses 20 health
the hero gains 5 health
the hero loses 3 mana
show hero health
show hero name
show hero
";
    let (interpreter, console) = run(source);
    assert_eq!(
        console.lines(),
        vec!["85", "Aria", "{'health': 85, 'name': 'Aria'}"]
    );
    assert_eq!(
        interpreter.objects().property("hero", "health"),
        Some(Value::Integer(85))
    );
}

#[test]
fn test_transfer_between_objects() {
    let source = "\
there is a hero with gold 10
there is a dragon with treasure 50
the hero gains dragon treasure gold
show hero gold
";
    assert_eq!(output(source), vec!["60"]);
}

#[test]
fn test_list_statements() {
    let source = "\
make items with [1, 2, 3]
add 4 to items
remove 2 from items
remove 9 from items
add 1 to single
let scalar be 5
add 6 to scalar
show items
show single
show scalar
";
    assert_eq!(output(source), vec!["[1, 3, 4]", "[1]", "[5, 6]"]);
}

#[test]
fn test_indexing_out_of_range_does_not_stop_run() {
    let source = "\
make items with [10, 20, 30]
show items[1]
show items[-1]
show items[3]
show \"end\"
";
    let (interpreter, console) = run(source);
    let lines = console.lines();
    assert_eq!(lines[0], "20");
    assert_eq!(lines[1], "30");
    assert!(lines[2].starts_with("Error: Index out of range"));
    assert_eq!(lines[3], "end");
    assert!(interpreter.globals().contains("items"));
}

#[test]
fn test_announce_has_no_line_break() {
    let (_, console) = run("announce \"a\"\nannounce 1\nshow \"b\"\n");
    assert_eq!(console.output(), "a1b\n");
}

#[test]
fn test_ask_parses_numbers() {
    let (mut interpreter, console, _) = create_test_interpreter(WhisperConfig::default());
    for answer in ["42", "2.5", "Ada"] {
        console.push_input(answer);
    }
    let program = parse_program("ask \"Age?\" into a\nask \"Height?\" into h\nask \"Name?\" into n\n");
    interpreter.run(&program).unwrap();
    assert_eq!(console.output(), "Age? Height? Name? ");
    assert_eq!(interpreter.globals().get("a").unwrap(), Value::Integer(42));
    assert_eq!(interpreter.globals().get("h").unwrap(), Value::Float(2.5));
    assert_eq!(interpreter.globals().get("n").unwrap(), Value::string("Ada"));
}

#[test]
fn test_ask_without_input_is_reported() {
    let (_, console) = run("ask \"Name?\" into n\nshow \"done\"\n");
    assert_eq!(
        console.lines(),
        vec!["Name? Error: EOF when reading a line", "done"]
    );
}

#[test]
fn test_file_statements() {
    let (mut interpreter, console, files) = create_test_interpreter(WhisperConfig::default());
    let program = parse_program(
        "let name be \"notes.txt\"\nwrite \"hello \" 42 to name\nread name into text\nshow text\n",
    );
    interpreter.run(&program).unwrap();
    assert_eq!(files.get("notes.txt").as_deref(), Some("hello 42"));
    assert_eq!(console.lines(), vec!["hello 42"]);
}

#[test]
fn test_change_case() {
    let source = "\
let who be \"Ada\"
uppercase who into loud
lowercase \"MiXeD\" into quiet
show loud
show quiet
";
    assert_eq!(output(source), vec!["ADA", "mixed"]);
}

#[test]
fn test_unknown_command_and_stray_break() {
    let source = "dance wildly\nbreak\nshow 1\n";
    assert_eq!(
        output(source),
        vec![
            "Unknown command: dance wildly",
            "Error: 'break' outside loop",
            "1"
        ]
    );
}

#[test]
fn test_top_level_give_back_ends_program() {
    assert_eq!(output("show 1\ngive back 2\nshow 3\n"), vec!["1"]);
}

#[test]
fn test_display_non_name_error_is_top_level_error() {
    assert_eq!(
        output("show 1 / 0\nshow 2\n"),
        vec!["Error: division by zero", "2"]
    );
}

#[test]
fn test_reset_clears_state() {
    let (mut interpreter, _) = run("let x be 1\ndefine f:\n    show 1\nthere is a hero with hp 1\n");
    assert!(!interpreter.globals().is_empty());
    interpreter.reset();
    assert!(interpreter.globals().is_empty());
    assert!(interpreter.functions().is_empty());
    assert!(interpreter.objects().is_empty());
}

#[test]
fn test_state_persists_between_runs() {
    let (mut interpreter, console, _) = create_test_interpreter(WhisperConfig::default());
    interpreter.run(&parse_program("let x be 41")).unwrap();
    interpreter.run(&parse_program("increase x by 1\nshow x")).unwrap();
    assert_eq!(console.lines(), vec!["42"]);
}

#[test]
fn test_parse_answer() {
    assert_eq!(parse_answer("7"), Value::Integer(7));
    assert_eq!(parse_answer("7.0"), Value::Float(7.0));
    assert_eq!(parse_answer("1.2.3"), Value::string("1.2.3"));
    assert_eq!(parse_answer(""), Value::string(""));
}

#[test]
fn test_self_containing_list_fails_only_its_statement() {
    let source = "\
make xs with [1]
add xs to xs
show xs
show len(xs)
show xs + [2]
attempt:
    show xs[0] < [xs]
handle:
    show \"handled: \" error
show \"after\"
";
    let lines = output(source);
    let cycle = "Error: a list or record that contains itself cannot be used here";
    assert_eq!(lines[0], "[1, [...]]");
    assert_eq!(lines[1], cycle);
    assert_eq!(lines[2], cycle);
    assert!(lines[3].starts_with("handled: "));
    assert_eq!(lines[4], "after");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_huge_repetition_fails_only_its_statement() {
    let source = "\
show [1, 2] * 9223372036854775807
show str(1) * 9223372036854775807
show [0] * 3
show \"after\"
";
    assert_eq!(
        output(source),
        vec![
            "Error: repeated sequence is too long",
            "Error: repeated sequence is too long",
            "[0, 0, 0]",
            "after",
        ]
    );
}

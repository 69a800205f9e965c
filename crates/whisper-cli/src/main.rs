use std::{io::{self, IsTerminal}, process};

use anyhow::Result;
use tracing::{debug, warn};
use whisper_cli::{
    build_cli, config_from_matches,
    repl::{LineProcessResult, MultiLineCollector, Repl},
};
use whisper_core::{init_tracing, init_tracing_with, WhisperError, WhisperRuntime};

fn main() -> Result<()> {
    // Parse command line arguments
    let matches = build_cli().get_matches();
    let mut config = config_from_matches(&matches)?;

    // Initialize logging
    if config.debug {
        init_tracing_with("whisper_core=debug,whisper=debug");
    } else {
        init_tracing();
    }

    if let Some(path) = matches.get_one::<String>("file") {
        let mut runtime = WhisperRuntime::new(config);
        return match runtime.run_file(path) {
            Ok(()) => Ok(()),
            Err(WhisperError::SourceNotFound(_)) => process::exit(1),
            Err(err) => Err(err.into()),
        };
    }

    if config.input_timeout_ms.take().is_some() {
        warn!("input timeout is ignored in the REPL");
    }

    let interactive = io::stdin().is_terminal();
    if interactive {
        println!("Whisper REPL v{}", whisper_core::VERSION);
        if config.debug {
            println!("Debug mode: enabled");
        }
        println!("Type .help for help, .quit to exit");
        println!();
    }

    let mut repl = Repl::new(WhisperRuntime::new(config));
    run_repl(&mut repl)
}

fn run_repl(repl: &mut Repl) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let mut multiline = MultiLineCollector::new();

    while repl.is_running() {
        match rl.readline(multiline.get_prompt()) {
            Ok(line) => {
                let trimmed = line.trim();

                if !multiline.is_collecting() {
                    // Handle empty input
                    if trimmed.is_empty() {
                        continue;
                    }

                    // Check if it's a REPL command
                    if trimmed.starts_with('.') {
                        rl.add_history_entry(trimmed)?;
                        match repl
                            .parse_input(trimmed)
                            .and_then(|command| repl.handle_command(command))
                        {
                            Ok(output) => repl.notifier().on_output(&output),
                            Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                        }
                        continue;
                    }
                }

                if let LineProcessResult::Complete(code) = multiline.process_line(&line) {
                    rl.add_history_entry(&code)?;
                    match repl.execute(&code) {
                        Ok(elapsed_ms) => debug!(elapsed_ms, "input executed"),
                        Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                if multiline.is_collecting() {
                    // Cancel block collection
                    println!("^C");
                    multiline.reset();
                } else {
                    println!("Use .quit to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                // Submit a block left open at end of input
                if multiline.is_collecting() {
                    if let LineProcessResult::Complete(code) = multiline.process_line("") {
                        if let Err(e) = repl.execute(&code) {
                            repl.notifier().on_error(&format!("Error: {e}"));
                        }
                    }
                }
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}

//! Command-line arguments and configuration loading

use std::fs;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use whisper_core::WhisperConfig;

/// Build the `whisper` command
pub fn build_cli() -> Command {
    Command::new("whisper")
        .version(whisper_core::VERSION)
        .about("Run Whisper programs written in plain English sentences")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Whisper program to run; starts the REPL when omitted")
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("max-call-depth")
                .long("max-call-depth")
                .value_name("N")
                .help("Deepest allowed nesting of function calls")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("max-loop-iterations")
                .long("max-loop-iterations")
                .value_name("N")
                .help("Safety cap on iterations of a single while loop")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("input-timeout-ms")
                .long("input-timeout-ms")
                .value_name("MS")
                .help("Give up waiting for `ask` input after this many milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for random() and randint()")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(ArgAction::SetTrue),
        )
}

/// Configuration from `--config` (or defaults) with command-line overrides
/// applied on top
pub fn config_from_matches(matches: &ArgMatches) -> Result<WhisperConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config file '{path}'"))?;
            WhisperConfig::from_json(&text)?
        }
        None => WhisperConfig::default(),
    };

    if let Some(depth) = matches.get_one::<usize>("max-call-depth") {
        config.max_call_depth = *depth;
    }
    if let Some(limit) = matches.get_one::<usize>("max-loop-iterations") {
        config.max_loop_iterations = *limit;
    }
    if let Some(timeout) = matches.get_one::<u64>("input-timeout-ms") {
        config.input_timeout_ms = Some(*timeout);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.random_seed = Some(*seed);
    }
    if matches.get_flag("debug") {
        config.debug = true;
    }
    Ok(config)
}

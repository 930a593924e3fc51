//! CLI entry point for tsuzuri
//!
//! Plays compiled stories in the terminal and dumps the built-in sample.

use std::fs;
use std::path::PathBuf;
use std::process;
use tsuzuri::cli::{demo, play};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let debug = args.iter().skip(2).any(|arg| arg == "--debug");
    init_logging(debug);

    let command = &args[1];
    let result = match command.as_str() {
        "play" => {
            let Some(path) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
                eprintln!("Error: Missing story file path");
                eprintln!();
                print_usage();
                process::exit(1);
            };
            run_play(PathBuf::from(path), debug)
        }
        "demo" => demo::demo_story()
            .map_err(anyhow::Error::from)
            .and_then(|story| play::run_play(story, debug)),
        "dump" => run_dump(),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

/// `RUST_LOG` wins; `--debug` alone turns on the runtime targets
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug && std::env::var("RUST_LOG").is_err() {
        builder.filter_module("tsuzuri", log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn print_usage() {
    println!("tsuzuri - Story builder and player");
    println!();
    println!("USAGE:");
    println!("    tsuzuri <command> [--debug]");
    println!();
    println!("COMMANDS:");
    println!("    play <story.json> [--debug]    Play a compiled story in the terminal");
    println!("    demo [--debug]                 Play the built-in sample story");
    println!("    dump                           Print the sample story as JSON");
    println!("    --help, -h                     Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --debug    Show runtime state (node, segment, context) on stderr");
    println!();
    println!("EXAMPLES:");
    println!("    tsuzuri dump > lighthouse.json");
    println!("    tsuzuri play lighthouse.json --debug");
}

fn run_play(file_path: PathBuf, debug: bool) -> anyhow::Result<()> {
    let bytes = fs::read(&file_path)
        .map_err(|err| anyhow::anyhow!("Failed to read file '{}': {}", file_path.display(), err))?;
    let story = tsuzuri::storage::load(&bytes)?;
    play::run_play(story, debug)
}

fn run_dump() -> anyhow::Result<()> {
    let story = demo::demo_story()?;
    let bytes = tsuzuri::storage::save(&story)?;
    println!("{}", String::from_utf8(bytes)?);
    log::info!("digest {}", story.digest()?);
    Ok(())
}

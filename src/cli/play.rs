//! CUI player mode for compiled stories
//!
//! Each segment is typed out by a tokio task at the segment's pace, followed
//! by its timeout. Pressing Enter aborts the task and prints the rest of the
//! segment at once. The runtime only hears about the segment once the reveal
//! is over, through the ticket issued for it.

use crate::runtime::debug::{DebugConfig, DebugSnapshot};
use crate::session::Session;
use crate::types::{Context, Output, Story, TextSegment};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Run the player mode
pub fn run_play(story: Story, debug: bool) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(play(story, debug))
}

enum Input {
    Line(String),
    Closed,
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Input> {
    Ok(match lines.next_line().await? {
        Some(line) => Input::Line(line.trim().to_string()),
        None => Input::Closed,
    })
}

async fn play(story: Story, debug: bool) -> anyhow::Result<()> {
    let debug_config = if debug {
        DebugConfig::verbose()
    } else {
        DebugConfig::default()
    };
    let mut session = Session::with_debug(story, Context::new(), debug_config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("=== tsuzuri Story Player ===");
    println!();
    println!("Controls:");
    println!("  Enter: skip the text being typed");
    println!("  1-9:   select choice");
    println!("  q:     quit");
    println!();

    loop {
        let output = session.output().clone();
        if debug {
            display_debug_info(&session);
        }

        if session.is_finished() {
            println!();
            println!("== THE END ==");
            return Ok(());
        }

        if output.has_actions() {
            show_choices(&output);
            match read_line(&mut lines).await? {
                Input::Closed => return Ok(()),
                Input::Line(input) if input == "q" => {
                    println!("Goodbye!");
                    return Ok(());
                }
                Input::Line(input) => match pick(&output, &input) {
                    Some(index) => {
                        println!();
                        session.select(&output.actions[index].id)?;
                    }
                    None => println!("Invalid choice. Enter 1-{}.", output.actions.len()),
                },
            }
            continue;
        }

        let Some(segment) = output.segment.clone() else {
            anyhow::bail!("story stopped at '{}' with nothing to show", session.state().node_id);
        };

        let ticket = session.ticket();
        let printed = Arc::new(AtomicUsize::new(0));
        let mut reveal = tokio::spawn(reveal_segment(segment.clone(), printed.clone()));

        tokio::select! {
            done = &mut reveal => done?,
            input = read_line(&mut lines) => {
                reveal.abort();
                let _ = (&mut reveal).await;
                let rest: String =
                    segment.text.chars().skip(printed.load(Ordering::Relaxed)).collect();
                print!("{rest}");
                io::stdout().flush()?;

                match input? {
                    Input::Closed => return Ok(()),
                    Input::Line(line) if line == "q" => {
                        println!();
                        println!("Goodbye!");
                        return Ok(());
                    }
                    Input::Line(_) => {}
                }
            }
        }

        let next = session.reveal_complete(ticket)?;
        if !next.entered.is_empty() {
            println!();
            println!();
        }
    }
}

/// Type `segment` out, then hold for its timeout
async fn reveal_segment(segment: TextSegment, printed: Arc<AtomicUsize>) {
    let pace = Duration::from_millis(segment.ms_per_char());
    for ch in segment.text.chars() {
        print!("{ch}");
        let _ = io::stdout().flush();
        printed.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(pace).await;
    }
    tokio::time::sleep(Duration::from_millis(segment.timeout)).await;
}

fn pick(output: &Output, input: &str) -> Option<usize> {
    let choice = input.parse::<usize>().ok()?;
    (1..=output.actions.len()).contains(&choice).then(|| choice - 1)
}

fn show_choices(output: &Output) {
    println!();
    println!("--- Choice ---");
    for (i, action) in output.actions.iter().enumerate() {
        println!("{}. {}", i + 1, action.label);
    }
    print!("Select: ");
    let _ = io::stdout().flush();
}

/// Display debug information (only when --debug is set)
fn display_debug_info(session: &Session) {
    let snapshot = DebugSnapshot::capture(session.story(), session.state());
    let context = serde_json::to_string(&snapshot.context).unwrap_or_else(|_| "{}".to_string());
    eprintln!(
        "[debug] node={} segment={}/{} next={} context={}",
        snapshot.node_id,
        snapshot.reveal_index + 1,
        snapshot.segments,
        snapshot.next_id.as_deref().unwrap_or("-"),
        context
    );
}

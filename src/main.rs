use std::env;
use std::fs;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use fluentmate::chat::{ChatClient, InterviewSession, Role};
use fluentmate::config::ChatConfig;
use fluentmate::interview::InterviewCoach;
use fluentmate::progress::{self, JsonFileStore, PracticeRecord, ProgressStore};
use fluentmate::speech_analysis;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(err) = run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("analyze") => analyze_command(&args[1..]),
        Some("stats") => stats_command(&args[1..]),
        Some("interview") => interview_command(&args[1..]).await,
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("FluentMate - speech practice scoring and mock interviews");
    println!();
    println!("Usage:");
    println!("  fluentmate analyze <transcript-file|-> <duration-seconds> [history.json]");
    println!("  fluentmate stats <history.json>");
    println!("  fluentmate interview [category]");
    println!();
    println!("Categories: behavioral, technical, coding, system-design, hr, mixed");
}

/// Score a finalized transcript and optionally append it to a history file.
fn analyze_command(args: &[String]) -> Result<()> {
    let [file, duration, rest @ ..] = args else {
        bail!("usage: fluentmate analyze <transcript-file|-> <duration-seconds> [history.json]");
    };

    let transcript = if file == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read transcript from stdin")?;
        buffer
    } else {
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file))?
    };

    let duration: f64 = duration
        .parse()
        .context("duration must be a number of seconds")?;

    let analysis = speech_analysis::analyze(transcript.trim(), duration);
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if let Some(history_path) = rest.first() {
        let store = JsonFileStore::new(history_path);
        store.save(PracticeRecord::from_analysis(&analysis, Utc::now()))?;
        println!("Saved session to {}", history_path);
    }

    Ok(())
}

fn stats_command(args: &[String]) -> Result<()> {
    let [history_path] = args else {
        bail!("usage: fluentmate stats <history.json>");
    };

    let store = JsonFileStore::new(history_path);
    let records = store.list()?;
    let today = Utc::now().date_naive();
    let stats = progress::user_stats(&records, today);

    println!("=== FluentMate Practice Stats ===");
    println!("Total sessions:    {}", stats.total_sessions);
    println!("Speaking time:     {} min", stats.total_speaking_minutes);
    println!("Average fluency:   {}", stats.average_fluency);
    println!("Average grammar:   {}", stats.average_grammar);
    println!("Best score:        {}", stats.best_score);
    println!("Current streak:    {} days", stats.current_streak);
    println!("Longest streak:    {} days", stats.longest_streak);

    println!("\nLast 7 days:");
    for day in progress::daily_progress(&records, 7, today) {
        println!(
            "  {}  sessions: {:<2}  fluency: {:<3}  grammar: {:<3}  wpm: {}",
            day.date, day.session_count, day.average_fluency, day.average_grammar, day.average_wpm
        );
    }

    Ok(())
}

/// Interactive mock interview against the configured chat endpoint. The
/// interviewer's reply streams to the terminal as tokens arrive.
async fn interview_command(args: &[String]) -> Result<()> {
    let category = args.first().map(String::as_str).unwrap_or("mixed");

    let config = ChatConfig::from_env();
    let session = InterviewSession::new(ChatClient::new(config));
    let coach = InterviewCoach::new(session.clone());

    let printer = spawn_stream_printer(&session);

    println!("=== FluentMate Mock Interview ===");
    println!("Category: {}", category);
    println!("Type your answers. ':end' asks for the final verdict, ':quit' leaves.");

    coach.begin_named(category).await?;

    loop {
        println!();
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        if input == ":quit" {
            break;
        }
        if input == ":end" {
            match coach.finish().await {
                Ok(Some(verdict)) => {
                    println!("\n=== Verdict ===\n{}", verdict);
                    break;
                }
                Ok(None) => break,
                Err(err) => {
                    eprintln!("Could not get a verdict: {}", err);
                    continue;
                }
            }
        }

        if let Err(err) = coach.respond(input).await {
            eprintln!("{}", err);
        }
    }

    coach.restart();
    printer.abort();
    Ok(())
}

/// Mirror conversation snapshots to stdout, printing only the unseen tail of
/// the growing assistant message so tokens appear as they stream in.
fn spawn_stream_printer(session: &InterviewSession) -> tokio::task::JoinHandle<()> {
    let mut snapshots = session.subscribe();
    tokio::spawn(async move {
        let mut seen_messages = 0usize;
        let mut printed_bytes = 0usize;

        while snapshots.changed().await.is_ok() {
            let messages = snapshots.borrow_and_update().clone();
            if messages.is_empty() {
                seen_messages = 0;
                printed_bytes = 0;
                continue;
            }

            if messages.len() != seen_messages {
                seen_messages = messages.len();
                printed_bytes = 0;
                if messages.last().map(|m| m.role) == Some(Role::Assistant) {
                    print!("\nInterviewer: ");
                    io::stdout().flush().ok();
                }
            }

            if let Some(last) = messages.last() {
                if last.role == Role::Assistant && last.content.len() > printed_bytes {
                    print!("{}", &last.content[printed_bytes..]);
                    io::stdout().flush().ok();
                    printed_bytes = last.content.len();
                }
            }
        }
    })
}

use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tracing_subscriber::EnvFilter;

use vigil_application::{ConsoleUseCase, wire};
use vigil_core::event::{EventKind, OpsEvent};
use vigil_core::investigation::{InvestigationUpdate, Liveness, ViewStep, prettify_label, step_body};
use vigil_core::weather::{WeatherKind, WeatherSnapshot};
use vigil_gateway::ConsoleConfig;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/events".to_string(),
                "/investigate".to_string(),
                "/view".to_string(),
                "/logs".to_string(),
                "/report".to_string(),
                "/weather".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn print_event(number: usize, event: &OpsEvent) {
    let heading = format!("[{}] {}", number, event.event_type);
    let heading = match event.kind() {
        EventKind::PerformanceDegradation => heading.yellow(),
        EventKind::GridAnomaly => heading.bright_cyan(),
        EventKind::SystemHealthAlert => heading.red(),
        EventKind::Other => heading.normal(),
    };
    println!("{}", heading.bold());
    println!("    {}", event.short_desc.bright_black());
}

fn print_view_step(step: &ViewStep) {
    let marker = if step.is_complete {
        "[done]".green()
    } else {
        "[....]".bright_black()
    };
    println!("{} {}", marker, step.title.bright_blue().bold());
    for line in &step.body {
        println!("       {}", line.bright_blue());
    }
}

fn print_logs(logs: &[String]) {
    if logs.is_empty() {
        println!("{}", "No logs submitted yet.".bright_black());
        return;
    }
    for log in logs {
        println!("  {}", log);
    }
}

fn print_weather(snapshot: &WeatherSnapshot) {
    let glyph = match snapshot.kind() {
        WeatherKind::Thunderstorm => "storm",
        WeatherKind::Rain => "rain",
        WeatherKind::Snow => "snow",
        WeatherKind::Fog => "fog",
        WeatherKind::Clear => "clear",
        WeatherKind::Clouds => "clouds",
    };
    println!(
        "{} {} | {} | {:.0}\u{b0}C | wind {} m/s",
        snapshot.location_name.bold(),
        format!("({glyph})").bright_black(),
        snapshot.condition_text,
        snapshot.temperature_c,
        snapshot.wind_speed
    );
}

async fn show_view(usecase: &ConsoleUseCase) {
    match usecase.investigation_view().await {
        Some(view) => {
            println!(
                "{}",
                format!("Investigation: {}", view.subject_description).bold()
            );
            for step in &view.steps {
                print_view_step(step);
            }
            let status = match view.liveness {
                Liveness::Active => "in progress".bright_yellow(),
                Liveness::Completed => "completed".bright_green(),
                Liveness::Failed => "failed".red(),
                Liveness::Superseded => "superseded".bright_black(),
            };
            println!("Status: {}", status);
        }
        None => println!(
            "{}",
            "No investigation yet. Select an event with /investigate <n>.".bright_black()
        ),
    }
}

/// The main entry point for the Vigil operator console.
///
/// Sets up a rustyline-based REPL that:
/// 1. Loads configuration and wires the backend clients and controller
/// 2. Spawns a printer task that renders investigation steps as they stream
/// 3. Provides command completion for the slash commands
/// 4. Displays colored output for events, agent reasoning, and system text
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend Initialization =====
    let config = ConsoleConfig::load()?;
    tracing::debug!(backend_url = %config.backend_url, "console configured");
    let (usecase, mut updates) = wire(&config);

    // Spawn printer task rendering investigation updates as they arrive
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                InvestigationUpdate::StepAppended(record) => {
                    println!();
                    println!("{}", prettify_label(&record.node_name).bright_blue().bold());
                    for line in step_body(&record) {
                        println!("  {}", line.bright_blue());
                    }
                }
                InvestigationUpdate::Finished(Liveness::Completed) => {
                    println!();
                    println!("{}", "Investigation complete.".bright_green());
                }
                InvestigationUpdate::Finished(Liveness::Failed) => {
                    println!();
                    println!(
                        "{}",
                        "Investigation stopped; partial results retained.".red()
                    );
                }
                InvestigationUpdate::Finished(_) => {}
            }
        }
    });

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== Vigil Operations Console ===".bright_magenta().bold());
    println!(
        "{}",
        "Commands: /events, /investigate <n>, /view, /logs, /report <text>, /weather. 'quit' to exit."
            .bright_black()
    );
    println!();

    // Initial feed load; each side degrades independently
    let (events, logs) = usecase.initial_data().await;
    if events.is_empty() {
        println!("{}", "Event feed is empty or unreachable.".bright_black());
    } else {
        println!("{}", "Live Event Stream".bold());
        for (index, event) in events.iter().enumerate() {
            print_event(index + 1, event);
        }
    }
    if !logs.is_empty() {
        println!();
        println!("{}", "Recent Logs".bold());
        print_logs(&logs);
    }
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                let (command, argument) = match trimmed.split_once(' ') {
                    Some((command, argument)) => (command, argument.trim()),
                    None => (trimmed, ""),
                };

                match command {
                    "/events" => match usecase.refresh_events().await {
                        Ok(events) if events.is_empty() => {
                            println!("{}", "No events detected.".bright_black());
                        }
                        Ok(events) => {
                            for (index, event) in events.iter().enumerate() {
                                print_event(index + 1, event);
                            }
                        }
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    },
                    "/investigate" => match argument.parse::<usize>() {
                        Ok(number) => match usecase.event_by_number(number).await {
                            Some(event) => {
                                if usecase.is_investigating().await {
                                    println!(
                                        "{}",
                                        "Superseding the investigation in flight.".yellow()
                                    );
                                }
                                println!(
                                    "{}",
                                    format!("Dispatching agent: {}", event.description).green()
                                );
                                if let Err(err) = usecase.investigate(&event).await {
                                    eprintln!("{}", format!("Error: {err}").red());
                                }
                            }
                            None => println!(
                                "{}",
                                "No such event. Run /events to list them.".bright_black()
                            ),
                        },
                        Err(_) => println!(
                            "{}",
                            "Usage: /investigate <event number>".bright_black()
                        ),
                    },
                    "/view" => show_view(&usecase).await,
                    "/logs" => match usecase.recent_logs().await {
                        Ok(logs) => print_logs(&logs),
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    },
                    "/report" => match usecase.submit_log(argument).await {
                        Ok(logs) => {
                            println!("{}", "Field report submitted.".green());
                            print_logs(&logs);
                        }
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    },
                    "/weather" => match usecase.weather().await {
                        Ok(snapshot) => print_weather(&snapshot),
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    },
                    _ => println!("{}", "Unknown command".bright_black()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Dropping the use case tears down the controller and its stream;
    // the printer ends when the update channel closes.
    drop(usecase);
    printer.abort();

    Ok(())
}

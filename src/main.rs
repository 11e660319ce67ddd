//! fitcache - a command-line client for a hosted fitness-tracking service.
//!
//! Lists categorized exercises and groups, shows the signed-in user's
//! training days, completion log, notes, and imbalance imagery, and records
//! completions. All reads go through a local stale-while-revalidate cache,
//! so previously seen data stays available when the service is unreachable.

use std::process::ExitCode;

use anyhow::{bail, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fitcache::app::{App, DataOrigin, Loaded};
use fitcache::models::{Exercise, ExerciseCategory};
use fitcache::utils::format::{
    day_name, format_date, format_optional, format_timestamp, truncate_string,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

const USAGE: &str = "\
fitcache - client for the fitness tracking service

Usage: fitcache <command> [args]

Catalog:
  groups                     List exercise groups
  group <id>                 List the exercises in one group
  exercises <category>       List exercises (warmup, mobilise, strengthen, recover)

Your data (requires login):
  days                       Show your training days
  completions                Show your completion log
  complete <day>             Record today's workout for day 1-7
  notes                      List your notes
  add-note <text>            Save a note
  delete-note <id>           Delete a note
  images                     List your imbalance images

Session and cache:
  login <user-id> <token>    Store a service-issued token
  logout                     Clear the stored session
  status                     Show session and cache status
  refresh                    Re-fetch everything, overwriting caches
  clear-cache                Clear cached data and reload from the service
";

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if matches!(command, "help" | "--help" | "-h") {
        print!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let mut app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run_command(&mut app, command, &args[2..]).await {
        eprintln!("Error: {:#}", e);
        eprintln!("If stale local data is suspected, run `fitcache clear-cache` and retry.");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run_command(app: &mut App, command: &str, args: &[String]) -> Result<()> {
    match command {
        "groups" => cmd_groups(app).await,
        "group" => match args.first().and_then(|s| s.parse::<i64>().ok()) {
            Some(group_id) => cmd_group(app, group_id).await,
            None => bail!("Expected a group id"),
        },
        "exercises" => match args.first().and_then(|s| ExerciseCategory::parse(s)) {
            Some(category) => cmd_exercises(app, category).await,
            None => bail!("Expected a category: warmup, mobilise, strengthen, or recover"),
        },
        "days" => cmd_days(app).await,
        "completions" => cmd_completions(app).await,
        "complete" => {
            let day = args
                .first()
                .and_then(|s| s.parse::<u8>().ok())
                .filter(|d| (1..=7).contains(d));
            match day {
                Some(day) => cmd_complete(app, day).await,
                None => bail!("Expected a day number between 1 and 7"),
            }
        }
        "notes" => cmd_notes(app).await,
        "add-note" => {
            if args.is_empty() {
                bail!("Expected note text");
            }
            cmd_add_note(app, &args.join(" ")).await
        }
        "delete-note" => match args.first().and_then(|s| s.parse::<i64>().ok()) {
            Some(id) => cmd_delete_note(app, id).await,
            None => bail!("Expected a note id"),
        },
        "images" => cmd_images(app).await,
        "login" => match (args.first(), args.get(1)) {
            (Some(user), Some(token)) => {
                app.login(user, token)?;
                println!("Signed in as {}.", user);
                Ok(())
            }
            _ => bail!("Expected: fitcache login <user-id> <token>"),
        },
        "logout" => {
            app.logout()?;
            println!("Signed out.");
            Ok(())
        }
        "status" => {
            cmd_status(app);
            Ok(())
        }
        "refresh" => {
            app.refresh_all().await?;
            println!("Refresh complete.");
            Ok(())
        }
        "clear-cache" => {
            app.clear_caches();
            println!("Cache cleared; data will be reloaded from the service.");
            Ok(())
        }
        other => bail!("Unknown command: {} (try `fitcache help`)", other),
    }
}

fn cmd_status(app: &App) {
    match app.session.data {
        Some(ref data) if app.session.is_valid() => {
            println!(
                "Signed in as {} ({}m until token expiry)",
                data.user_id,
                data.minutes_until_expiry()
            );
        }
        Some(_) => println!("Session expired - run `fitcache login <user-id> <token>`"),
        None => println!("Not signed in."),
    }
    println!("Service: {}", app.config.service_url());
    match app.groups_cache_age() {
        Some(age) => println!("Catalog cache: updated {}", age),
        None => println!("Catalog cache: empty"),
    }
}

/// Tell the user when they are looking at fallback data.
fn print_origin_notice<T>(loaded: &Loaded<T>) {
    if loaded.origin == DataOrigin::Stale {
        println!("(service unreachable - showing previously cached data)");
    }
}

async fn cmd_groups(app: &App) -> Result<()> {
    let loaded = app.load_groups().await?;
    print_origin_notice(&loaded);

    if loaded.data.is_empty() {
        println!("No exercise groups.");
        return Ok(());
    }

    for group in &loaded.data {
        match &group.focus {
            Some(focus) => println!("{:>4}  {:<30} {}", group.id, group.name, focus),
            None => println!("{:>4}  {}", group.id, group.name),
        }
    }

    if loaded.origin == DataOrigin::Cached {
        if let Some(age) = app.groups_cache_age() {
            println!("(cached {})", age);
        }
    }
    Ok(())
}

async fn cmd_exercises(app: &App, category: ExerciseCategory) -> Result<()> {
    let loaded = app.load_exercises(category).await?;
    print_origin_notice(&loaded);

    println!("{}", category);
    print_exercise_list(loaded.data);
    Ok(())
}

async fn cmd_group(app: &App, group_id: i64) -> Result<()> {
    let loaded = app.load_group_exercises(group_id).await?;
    print_origin_notice(&loaded);

    println!("Group {}", group_id);
    print_exercise_list(loaded.data);
    Ok(())
}

fn print_exercise_list(mut exercises: Vec<Exercise>) {
    if exercises.is_empty() {
        println!("  No exercises.");
        return;
    }

    exercises.sort_by_key(|e| e.sort_order.unwrap_or(i32::MAX));

    for exercise in &exercises {
        println!(
            "{:>4}  {:<32} {}",
            exercise.id,
            truncate_string(&exercise.name, 32),
            format_optional(&exercise.dosage, "-")
        );
        if let Some(ref description) = exercise.description {
            println!("      {}", truncate_string(description, 70));
        }
    }
}

async fn cmd_days(app: &App) -> Result<()> {
    let loaded = app.load_training_days().await?;
    print_origin_notice(&loaded);

    if loaded.data.is_empty() {
        println!("No training days assigned.");
        return Ok(());
    }

    for day in &loaded.data {
        match day.group_id {
            Some(group_id) => println!("{:<10} group {}", day_name(day.day_number), group_id),
            None => println!("{}", day_name(day.day_number)),
        }
    }
    Ok(())
}

async fn cmd_completions(app: &App) -> Result<()> {
    let loaded = app.load_completions().await?;
    print_origin_notice(&loaded);

    if loaded.data.is_empty() {
        println!("No workouts recorded.");
        return Ok(());
    }

    for completion in &loaded.data {
        let mark = if completion.completed { "done" } else { "-" };
        println!(
            "{}  {:<10} {}",
            format_date(&completion.date),
            day_name(completion.day_number),
            mark
        );
    }
    Ok(())
}

async fn cmd_complete(app: &App, day: u8) -> Result<()> {
    let completion = app.complete_today(day).await?;
    println!(
        "Recorded {} for {}.",
        day_name(completion.day_number),
        format_date(&completion.date)
    );
    Ok(())
}

async fn cmd_notes(app: &App) -> Result<()> {
    let loaded = app.load_notes().await?;
    print_origin_notice(&loaded);

    if loaded.data.is_empty() {
        println!("No notes.");
        return Ok(());
    }

    for note in &loaded.data {
        println!(
            "{:>4}  {}  {}",
            note.id,
            format_timestamp(&note.updated_at),
            truncate_string(&note.body, 60)
        );
    }
    Ok(())
}

async fn cmd_add_note(app: &App, body: &str) -> Result<()> {
    let note = app.add_note(body).await?;
    println!("Saved note {}.", note.id);
    Ok(())
}

async fn cmd_delete_note(app: &App, id: i64) -> Result<()> {
    app.delete_note(id).await?;
    println!("Deleted note {}.", id);
    Ok(())
}

async fn cmd_images(app: &App) -> Result<()> {
    let loaded = app.load_imbalance_images().await?;
    print_origin_notice(&loaded);

    if loaded.data.is_empty() {
        println!("No imbalance images.");
        return Ok(());
    }

    for image in &loaded.data {
        println!(
            "{:>4}  {}  {:<24} {}",
            image.id,
            format_timestamp(&image.uploaded_at),
            format_optional(&image.label, "-"),
            image.url
        );
    }
    Ok(())
}

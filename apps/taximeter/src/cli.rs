//! # Interactive CLI
//!
//! `taximeter ride` drives the meter from a terminal; `taximeter history`
//! prints the recorded trips.
//!
//! ```text
//! Tell us your name: Ana
//! Ready to go? (Y/N) > Y
//! Taxi is moving...
//!   1. Move   2. Stop   3. Arrive
//! > 2
//! Taxi stopped (waiting).
//! > 3
//! ----- TRIP FINISHED -----
//! Total fare is € 0.42
//! Ana, do you want to exit program? (Y/N) > Y
//! ```
//!
//! Both functions are generic over their input and output so tests can
//! script a session.

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::commands;
use crate::state::AppState;
use taxi_core::validation::validate_customer_name;
use taxi_core::{LevelId, MeterState, DEFAULT_CUSTOMER_NAME};

struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Prints `prompt` and reads one trimmed line. `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

enum Choice {
    Move,
    Stop,
    Arrive,
    Invalid,
}

impl Choice {
    fn parse(input: &str) -> Self {
        match input {
            "1" => Choice::Move,
            "2" => Choice::Stop,
            "3" => Choice::Arrive,
            _ => Choice::Invalid,
        }
    }
}

/// Runs the interactive ride loop until the user exits or input ends.
///
/// Input ending mid-trip finishes the trip as if the user had arrived.
pub async fn ride<R, W>(state: &AppState, level: LevelId, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console {
        lines: input.lines(),
        out: output,
    };

    console.say("\n----------------------------------------").await?;
    console.say("Digital Taximeter").await?;
    console.say("----------------------------------------").await?;
    console
        .say("Start a trip, switch between moving and stopped, and get the fare on arrival.")
        .await?;
    console.say("Each trip is recorded in the trip history.\n").await?;

    let name = loop {
        let Some(raw_name) = console.ask("Tell us your name: ").await? else {
            return Ok(());
        };
        if raw_name.is_empty() {
            break DEFAULT_CUSTOMER_NAME.to_string();
        }
        match validate_customer_name(&raw_name) {
            Ok(name) => break name,
            Err(e) => console.say(&format!("Sorry, {}. Try again.", e)).await?,
        }
    };
    console
        .say(&format!("\nWelcome, {}! Let's start your journey.\n", name))
        .await?;

    loop {
        let Some(answer) = console.ask("Ready to go? (Y/N) > ").await? else {
            break;
        };
        match answer.to_uppercase().as_str() {
            "Y" => {}
            "N" => {
                console.say("Bye!").await?;
                break;
            }
            _ => continue,
        }

        if let Err(e) =
            commands::start_trip(state, Some(&name), Some(i64::from(level.get())), Utc::now())
        {
            console
                .say(&format!("Could not start the trip: {}", e.message))
                .await?;
            continue;
        }
        console.say("Taxi is moving...").await?;

        loop {
            console.say("\nSelect an option:").await?;
            console.say("1. Move (Keep Moving)").await?;
            console.say("2. Stop (Wait)").await?;
            console.say("3. Arrive (Finish)").await?;

            let choice = match console.ask("> ").await? {
                Some(input) => Choice::parse(&input),
                None => Choice::Arrive,
            };
            let current = state.session.with_session(|s| s.meter.state());

            match choice {
                Choice::Move if current == MeterState::Moving => {
                    console.say("Still moving...").await?;
                }
                Choice::Move => {
                    commands::toggle_state(state, Utc::now());
                    console.say("Taxi is now moving.").await?;
                }
                Choice::Stop if current == MeterState::Stopped => {
                    console.say("Still stopped...").await?;
                }
                Choice::Stop => {
                    commands::toggle_state(state, Utc::now());
                    console.say("Taxi stopped (waiting).").await?;
                }
                Choice::Arrive => {
                    let stopped = commands::stop_trip(state, Utc::now()).await;
                    console.say("\n----- TRIP FINISHED -----").await?;
                    console
                        .say(&format!("Total fare is € {:.2}", stopped.fare))
                        .await?;
                    if !stopped.saved {
                        console.say("(The trip could not be saved to the history.)").await?;
                    }
                    break;
                }
                Choice::Invalid => {
                    console.say("Invalid option. Try 1, 2, or 3.").await?;
                }
            }
        }

        let prompt = format!("\n{}, do you want to exit program? (Y/N) > ", name);
        match console.ask(&prompt).await? {
            Some(answer) if !answer.eq_ignore_ascii_case("Y") => continue,
            _ => {
                console.say("Thank you. Goodbye!").await?;
                break;
            }
        }
    }

    Ok(())
}

/// Prints recorded trips, newest first; only the newest `limit` when given.
pub async fn print_history<W>(
    state: &AppState,
    limit: Option<u32>,
    mut output: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let trips = commands::trip_history(state, limit).await?;

    let mut text = String::new();
    if trips.is_empty() {
        text.push_str("No trips recorded yet.\n");
    } else {
        text.push_str(&format!(
            "{:<19}  {:<20} {:>10}  {}\n",
            "Date", "Customer", "Fare", "Level"
        ));
        for trip in &trips {
            text.push_str(&format!(
                "{:<19}  {:<20} {:>10}  Lv.{}\n",
                trip.date,
                trip.name,
                format!("€ {:.2}", trip.fare),
                trip.level
            ));
        }
    }

    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::path::PathBuf;
    use taxi_core::RateConfig;
    use taxi_db::{Database, DbConfig};

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/taximeter-cli-test"),
            rates_path: PathBuf::from("/tmp/taximeter-cli-test/rates.json"),
            db_path: PathBuf::from(":memory:"),
            bind_addr: "127.0.0.1".to_string(),
            http_port: 0,
        };
        AppState::new(config, RateConfig::default(), db)
    }

    async fn run_script(state: &AppState, script: &str) -> String {
        let mut output = Vec::new();
        ride(state, LevelId::DEFAULT, script.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_ride_records_trip() {
        let state = test_state().await;
        let output = run_script(&state, "Ana\nY\n2\n2\n1\n1\n7\n3\nY\n").await;

        assert!(output.contains("Welcome, Ana!"));
        assert!(output.contains("Taxi stopped (waiting)."));
        assert!(output.contains("Still stopped..."));
        assert!(output.contains("Taxi is now moving."));
        assert!(output.contains("Still moving..."));
        assert!(output.contains("Invalid option. Try 1, 2, or 3."));
        assert!(output.contains("----- TRIP FINISHED -----"));
        assert!(output.contains("Thank you. Goodbye!"));

        let history = commands::trip_history(&state, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_two_rides_then_exit() {
        let state = test_state().await;
        run_script(&state, "\nY\n3\nN\nY\n3\nY\n").await;

        let history = commands::trip_history(&state, None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|t| t.name == "Guest"));
    }

    #[tokio::test]
    async fn test_declining_records_nothing() {
        let state = test_state().await;
        let output = run_script(&state, "Ana\nmaybe\nN\n").await;

        assert!(output.contains("Bye!"));
        assert!(commands::trip_history(&state, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_finishes_running_trip() {
        let state = test_state().await;
        let output = run_script(&state, "Ana\nY\n").await;

        assert!(output.contains("----- TRIP FINISHED -----"));
        assert_eq!(commands::trip_history(&state, None).await.unwrap().len(), 1);
        assert!(!state.session.with_session(|s| s.meter.is_running()));
    }

    #[tokio::test]
    async fn test_print_history() {
        let state = test_state().await;

        let mut empty = Vec::new();
        print_history(&state, None, &mut empty).await.unwrap();
        assert_eq!(String::from_utf8(empty).unwrap(), "No trips recorded yet.\n");

        run_script(&state, "Ana\nY\n3\nY\n").await;
        run_script(&state, "Ben\nY\n3\nY\n").await;
        let mut output = Vec::new();
        print_history(&state, None, &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("Date"));
        assert!(text.contains("Ana"));
        assert!(text.contains("Lv.1"));

        let mut newest = Vec::new();
        print_history(&state, Some(1), &mut newest).await.unwrap();
        let text = String::from_utf8(newest).unwrap();
        assert!(text.contains("Ben"));
        assert!(!text.contains("Ana"));
    }

    #[tokio::test]
    async fn test_overlong_name_is_asked_again() {
        let state = test_state().await;
        let script = format!("{}\nAna\nY\n3\nY\n", "A".repeat(101));
        let output = run_script(&state, &script).await;

        assert!(output.contains("Sorry, name must be at most 100 characters. Try again."));
        assert_eq!(output.matches("Tell us your name: ").count(), 2);
        assert!(output.contains("Welcome, Ana!"));
        assert!(output.contains("----- TRIP FINISHED -----"));

        let history = commands::trip_history(&state, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Ana");
    }
}

//! Practice command - Interactive debate in the terminal
//!
//! Usage:
//! ```bash
//! podium practice --topic "AI Ethics" --stance against --preset standard --turn 5
//! ```
//!
//! Lines typed while it is your turn are submitted as arguments.
//! `/pause` stops or resumes the clock, `/finish` ends the debate early,
//! `/retry` asks again for an interrupted AI reply or for failed results,
//! and `/quit` leaves.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use podium_client::{DebateBackend, MockBackend};
use podium_core::{
    DurationPreset, Message, Notice, NoticeLevel, Phase, ScoreResult, SetupDraft, Snapshot,
    Speaker,
};
use podium_runtime::{spawn_session, Intent, RuntimeOptions, SessionHandle};

use super::{format_clock, BackendArgs};

/// Arguments for the practice command
#[derive(Args)]
pub struct PracticeArgs {
    /// Title of the session
    #[arg(long, default_value = "Practice Debate")]
    title: String,

    /// Topic name, catalog id or free text
    #[arg(long)]
    topic: String,

    /// Position the AI argues
    #[arg(long, default_value = "against")]
    stance: String,

    /// Session length: quick (20 min), standard (30 min) or extended (60 min)
    #[arg(long, default_value = "standard")]
    preset: DurationPreset,

    /// Turn length in minutes; defaults to the shortest the preset offers
    #[arg(long)]
    turn: Option<u32>,

    /// Spar against a built-in opponent without contacting the backend
    #[arg(long)]
    offline: bool,

    #[command(flatten)]
    backend: BackendArgs,
}

/// Run the practice command
pub async fn run(args: PracticeArgs) -> Result<()> {
    let turn_secs = turn_seconds(args.preset, args.turn)?;

    let config = SetupDraft::new()
        .title(&args.title)
        .topic(&args.topic)
        .preset(args.preset)
        .turn_secs(turn_secs)
        .ai_stance(&args.stance)
        .build()?;

    info!(topic = %config.topic, offline = args.offline, "Starting practice session");
    let backend: Arc<dyn DebateBackend> = if args.offline {
        Arc::new(MockBackend::sparring())
    } else {
        Arc::new(args.backend.connect()?)
    };

    println!("{}", format!("🎤 {}", config.title).bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!("  {} {}", "Topic:".dimmed(), config.topic.green());
    println!("  {} {}", "AI argues:".dimmed(), config.ai_stance.yellow());
    println!(
        "  {} {} total, {} per turn",
        "Clock:".dimmed(),
        format_clock(config.total_budget_secs),
        format_clock(config.turn_budget_secs)
    );
    println!(
        "  {} /pause  /finish  /retry  /quit",
        "Commands:".dimmed()
    );
    println!();

    let handle = spawn_session(backend, config, RuntimeOptions::default());
    present(handle).await
}

/// Turn length from `--turn` minutes, or the preset's shortest option
fn turn_seconds(preset: DurationPreset, minutes: Option<u32>) -> Result<u32> {
    match minutes {
        Some(minutes) => minutes
            .checked_mul(60)
            .with_context(|| format!("Turn length of {minutes} minutes is too long")),
        None => preset
            .turn_options()
            .first()
            .map(|option| option.seconds)
            .context("Preset offers no turn lengths"),
    }
}

/// Terminal presentation loop: render snapshots and notices, forward typed lines
async fn present(handle: SessionHandle) -> Result<()> {
    let SessionHandle {
        intents,
        mut snapshots,
        mut notices,
        task,
    } = handle;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = TranscriptView::default();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print!("{}", view.render(&snapshot));
                std::io::stdout().flush()?;
            }
            Some(notice) = notices.recv() => print_notice(&notice),
            _ = &mut ctrl_c => {
                println!();
                let _ = intents.send(Intent::Leave).await;
                break;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read input")? else {
                    stdin_open = false;
                    let _ = intents.send(Intent::Leave).await;
                    continue;
                };
                let phase = snapshots.borrow().phase;
                let Some(intent) = parse_command(&line, phase) else {
                    continue;
                };
                let leaving = intent == Intent::Leave;
                if intents.send(intent).await.is_err() || leaving {
                    break;
                }
            }
        }
    }

    drop(intents);
    match podium_runtime::join(task).await {
        Ok(last) => {
            if last.phase != Phase::Scored {
                crate::print_info(&format!(
                    "Left the debate after {} messages",
                    last.messages.len()
                ));
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Map a typed line to an intent; `/retry` depends on what failed
fn parse_command(line: &str, phase: Phase) -> Option<Intent> {
    let line = line.trim();
    match line {
        "" => None,
        "/quit" | "/exit" => Some(Intent::Leave),
        "/pause" | "/resume" => Some(Intent::ToggleRunning),
        "/retry" if phase == Phase::AiIdle => Some(Intent::RetryResponse),
        "/retry" => Some(Intent::RetryResults),
        "/finish" => Some(Intent::Finish),
        text => Some(Intent::Submit(text.to_string())),
    }
}

fn print_notice(notice: &Notice) {
    let message = if notice.retryable {
        format!("{} (try again)", notice.message)
    } else {
        notice.message.clone()
    };
    match notice.level {
        NoticeLevel::Info => crate::print_success(&message),
        NoticeLevel::Warning => crate::print_warning(&message),
        NoticeLevel::Error => crate::print_error(&message),
    }
}

/// Tracks what has already been written so each snapshot prints only what is new
#[derive(Debug, Default)]
struct TranscriptView {
    /// Messages printed in full
    finished: usize,
    /// Bytes printed of the message after `finished`
    partial: usize,
    phase: Option<Phase>,
    speaker: Option<Speaker>,
    running: bool,
}

impl TranscriptView {
    fn render(&mut self, snapshot: &Snapshot) -> String {
        let mut out = String::new();

        // An aborted start clears the transcript
        if snapshot.messages.len() < self.finished {
            self.finished = 0;
            self.partial = 0;
        }

        while let Some(message) = snapshot.messages.get(self.finished) {
            if self.partial == 0 {
                out.push_str(&header(message));
            }
            if let Some(new_text) = message.content.get(self.partial..) {
                out.push_str(new_text);
            }
            if message.streaming {
                self.partial = message.content.len();
                break;
            }
            out.push_str("\n\n");
            self.finished += 1;
            self.partial = 0;
        }

        if self.running != snapshot.running && self.phase.is_some() && !snapshot.terminal {
            let state = if snapshot.running { "resumed" } else { "paused" };
            out.push_str(&format!("{}\n", format!("⏱ Clock {state}").yellow()));
        }
        self.running = snapshot.running;

        if self.phase != Some(snapshot.phase) || self.speaker != snapshot.speaker {
            out.push_str(&phase_banner(snapshot));
        }
        self.phase = Some(snapshot.phase);
        self.speaker = snapshot.speaker;

        out
    }
}

fn header(message: &Message) -> String {
    match message.speaker {
        Speaker::Ai => format!("{} ", "AI:".bold().magenta()),
        Speaker::User => format!("{} ", "You:".bold().green()),
    }
}

fn phase_banner(snapshot: &Snapshot) -> String {
    let clock = format!(
        "{} left in turn, {} in debate",
        format_clock(snapshot.remaining_turn_secs),
        format_clock(snapshot.remaining_total_secs)
    );
    match snapshot.phase {
        Phase::Initiating => format!("{}\n", "Starting debate...".dimmed()),
        Phase::AwaitingUser => format!("{} {}\n> ", "Your turn.".bold().green(), clock.dimmed()),
        Phase::AiIdle => format!(
            "{}\n",
            "AI response interrupted. Type /retry or wait for its turn to end".yellow()
        ),
        Phase::Completing => format!("{}\n", "Debate over. Scoring...".bold().cyan()),
        Phase::ResultsFailed => format!("{}\n", "Results unavailable. Type /retry".yellow()),
        Phase::Scored => snapshot
            .scores
            .as_ref()
            .map(render_scores)
            .unwrap_or_default(),
        Phase::Idle
        | Phase::AiStreaming
        | Phase::Submitting
        | Phase::FetchingScores
        | Phase::Aborted => String::new(),
    }
}

fn render_scores(scores: &ScoreResult) -> String {
    let mut out = format!("\n{}\n", "📊 Debate Results".bold().cyan());
    out.push_str(&format!("{}\n", super::scores::score_table(scores)));
    for strength in &scores.strengths {
        out.push_str(&format!("  {} {}\n", "✓".green(), strength));
    }
    for improvement in &scores.improvements {
        out.push_str(&format!("  {} {}\n", "→".yellow(), improvement));
    }
    out.push_str(&format!("\n{}\n", "Type /quit to leave".dimmed()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(phase: Phase, messages: Vec<Message>) -> Snapshot {
        Snapshot {
            phase,
            speaker: Some(Speaker::Ai),
            running: true,
            remaining_total_secs: 1800,
            remaining_turn_secs: 300,
            messages,
            ..Snapshot::default()
        }
    }

    fn ai(content: &str, streaming: bool) -> Message {
        Message {
            speaker: Speaker::Ai,
            content: content.to_string(),
            position: 0,
            streaming,
        }
    }

    #[test]
    fn test_parse_command() {
        let phase = Phase::AwaitingUser;
        assert_eq!(parse_command("  ", phase), None);
        assert_eq!(parse_command("/pause", phase), Some(Intent::ToggleRunning));
        assert_eq!(parse_command("/quit", phase), Some(Intent::Leave));
        assert_eq!(
            parse_command(" Evidence matters ", phase),
            Some(Intent::Submit("Evidence matters".to_string()))
        );
    }

    #[test]
    fn test_retry_follows_phase() {
        assert_eq!(
            parse_command("/retry", Phase::AiIdle),
            Some(Intent::RetryResponse)
        );
        assert_eq!(
            parse_command("/retry", Phase::ResultsFailed),
            Some(Intent::RetryResults)
        );
    }

    #[test]
    fn test_turn_seconds() {
        assert_eq!(turn_seconds(DurationPreset::Standard, Some(5)).unwrap(), 300);
        assert!(turn_seconds(DurationPreset::Standard, Some(u32::MAX)).is_err());
        let shortest = DurationPreset::Quick.turn_options()[0].seconds;
        assert_eq!(turn_seconds(DurationPreset::Quick, None).unwrap(), shortest);
    }

    #[test]
    fn test_streaming_text_printed_once() {
        colored::control::set_override(false);
        let mut view = TranscriptView::default();

        let first = view.render(&snapshot(Phase::AiStreaming, vec![ai("Hello", true)]));
        assert!(first.contains("AI: Hello"));

        let second = view.render(&snapshot(
            Phase::AiStreaming,
            vec![ai("Hello world", true)],
        ));
        assert_eq!(second, " world");

        let mut done = snapshot(Phase::AwaitingUser, vec![ai("Hello world.", false)]);
        done.speaker = Some(Speaker::User);
        let third = view.render(&done);
        assert!(third.starts_with(".\n\n"));
        assert!(third.contains("Your turn."));
    }

    #[test]
    fn test_pause_is_announced() {
        colored::control::set_override(false);
        let mut view = TranscriptView::default();
        view.render(&snapshot(Phase::AwaitingUser, Vec::new()));

        let mut paused = snapshot(Phase::AwaitingUser, Vec::new());
        paused.running = false;
        assert!(view.render(&paused).contains("Clock paused"));
    }
}

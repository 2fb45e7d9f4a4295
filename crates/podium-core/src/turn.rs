//! Turn and clock bookkeeping
//!
//! Every handoff costs exactly one turn budget from the total, no matter how
//! much of the turn was actually used. Unused seconds are never banked.

use serde::{Deserialize, Serialize};

use crate::config::DebateConfig;
use crate::message::Speaker;

/// Result of a one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock paused, session over, or turn already at zero
    Idle,
    /// One second removed from the current turn
    Counted,
    /// The current speaker's turn just ran out
    Expired(Speaker),
}

/// Result of passing the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    Continued,
    /// The deduction exhausted the total budget
    Exhausted,
}

/// Clock state for the active session. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub speaker: Speaker,
    pub remaining_total_secs: u32,
    pub remaining_turn_secs: u32,
    pub running: bool,
    terminal: bool,
}

impl TurnState {
    /// Opening state: the AI speaks first with full budgets and the clock running
    pub fn start(config: &DebateConfig) -> Self {
        Self {
            speaker: Speaker::Ai,
            remaining_total_secs: config.total_budget_secs,
            remaining_turn_secs: config.turn_budget_secs.min(config.total_budget_secs),
            running: true,
            terminal: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal || self.remaining_total_secs == 0
    }

    /// Whether the timer should be scheduled at all
    pub fn is_ticking(&self) -> bool {
        self.running && !self.is_terminal()
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_ticking() || self.remaining_turn_secs == 0 {
            return TickOutcome::Idle;
        }

        self.remaining_turn_secs -= 1;
        if self.remaining_turn_secs == 0 {
            TickOutcome::Expired(self.speaker)
        } else {
            TickOutcome::Counted
        }
    }

    /// Pass the floor to `to`, deducting one full turn budget from the total
    pub fn handoff(&mut self, to: Speaker, turn_budget_secs: u32) -> HandoffOutcome {
        if self.is_terminal() {
            return HandoffOutcome::Exhausted;
        }

        self.speaker = to;
        self.remaining_total_secs = self.remaining_total_secs.saturating_sub(turn_budget_secs);

        if self.remaining_total_secs == 0 {
            self.terminate();
            return HandoffOutcome::Exhausted;
        }

        self.remaining_turn_secs = turn_budget_secs.min(self.remaining_total_secs);
        HandoffOutcome::Continued
    }

    /// True when the user holds the floor and the next handoff ends the session
    pub fn is_last_turn(&self, turn_budget_secs: u32) -> bool {
        self.speaker == Speaker::User && self.remaining_total_secs <= turn_budget_secs
    }

    /// Give the current speaker a fresh turn clock without touching the total
    pub fn restart_turn(&mut self, turn_budget_secs: u32) {
        if !self.is_terminal() {
            self.remaining_turn_secs = turn_budget_secs.min(self.remaining_total_secs);
        }
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    pub fn terminate(&mut self) {
        self.terminal = true;
        self.running = false;
        self.remaining_turn_secs = 0;
    }
}

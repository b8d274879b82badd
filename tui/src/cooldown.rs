//! Resend cooldown state machine.
//!
//! The machine is driven by explicit one-second ticks; it never reads a clock. Scheduling those
//! ticks is the job of [`crate::tick_source::TickSource`].

/// Default resend cooldown.
pub const DEFAULT_COOLDOWN_SECS: u32 = 60;

const RESEND_LABEL: &str = "Resend";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownState {
    /// Resend is available.
    Idle,
    /// Resend is disabled for `remaining` more seconds.
    Counting { remaining: u32 },
}

#[derive(Clone, Debug)]
pub struct Cooldown {
    duration_secs: u32,
    state: CooldownState,
}

impl Cooldown {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            state: CooldownState::Idle,
        }
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.state, CooldownState::Counting { .. })
    }

    pub fn resend_enabled(&self) -> bool {
        !self.is_counting()
    }

    pub fn remaining(&self) -> u32 {
        match self.state {
            CooldownState::Idle => 0,
            CooldownState::Counting { remaining } => remaining,
        }
    }

    /// (Re)enter `Counting` at the full duration. A zero duration lands directly in `Idle`.
    pub fn start(&mut self) {
        self.state = if self.duration_secs == 0 {
            CooldownState::Idle
        } else {
            CooldownState::Counting {
                remaining: self.duration_secs,
            }
        };
    }

    /// Advance by one second. The last second leaves `Counting` in the same step that takes the
    /// remaining count to zero.
    pub fn tick(&mut self) -> CooldownState {
        if let CooldownState::Counting { remaining } = self.state {
            let remaining = remaining.saturating_sub(1);
            self.state = if remaining == 0 {
                CooldownState::Idle
            } else {
                CooldownState::Counting { remaining }
            };
        }
        self.state
    }

    /// Label for the resend control.
    pub fn label(&self) -> String {
        match self.state {
            CooldownState::Idle => RESEND_LABEL.to_string(),
            CooldownState::Counting { remaining } => {
                format!("{RESEND_LABEL} ({remaining} seconds)")
            }
        }
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

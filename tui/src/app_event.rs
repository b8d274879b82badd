//! Application-level events produced off the input path.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// One second elapsed on the cooldown tick source started as `generation`.
    ///
    /// Ticks from a source that has since been cancelled carry a stale generation and are
    /// ignored by the receiver.
    CooldownTick { generation: u64 },
}

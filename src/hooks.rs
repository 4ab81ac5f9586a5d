//! Pluggable callbacks consulted by the message pool.
//!
//! [`StartDetector`] replaces the default SYN rule for opening a message,
//! [`EndDetector`] adds a completion condition checked before FIN,
//! [`Debugger`] receives diagnostics, and [`MessageHandler`] consumes
//! finished messages. Each trait is implemented for matching closures, so
//! most callers never name them. [`PoolHooks`] stores the optional ones and
//! runs them if registered.

use std::sync::Arc;

use crate::{
    message::{Direction, Message},
    packet::Packet,
};

/// Priority of a diagnostic. Lower numbers are more urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Dropped input: decode failures and resets.
    High = 4,
    /// Notable but expected conditions such as truncation.
    Medium = 5,
    /// Routine lifecycle events such as expiry.
    Low = 6,
}

impl Severity {
    /// Numeric level in the range `4..=6`.
    #[must_use]
    pub fn level(self) -> u8 { self as u8 }

    /// `log` level the diagnostic is mirrored at.
    #[must_use]
    pub fn log_level(self) -> log::Level {
        match self {
            Severity::High => log::Level::Warn,
            Severity::Medium => log::Level::Debug,
            Severity::Low => log::Level::Trace,
        }
    }
}

/// Decides whether an unmatched packet opens a new message.
pub trait StartDetector: Send + Sync + 'static {
    /// Return the direction of the new message, or `None` to drop the packet.
    fn detect_start(&self, packet: &Packet) -> Option<Direction>;
}

impl<F> StartDetector for F
where
    F: Fn(&Packet) -> Option<Direction> + Send + Sync + 'static,
{
    fn detect_start(&self, packet: &Packet) -> Option<Direction> { self(packet) }
}

/// Decides whether a message is complete after a packet was appended.
pub trait EndDetector: Send + Sync + 'static {
    /// Return `true` once `message` holds a whole application message.
    ///
    /// Runs under the pool lock after every append, so it should be cheap.
    fn detect_end(&self, message: &Message) -> bool;
}

impl<F> EndDetector for F
where
    F: Fn(&Message) -> bool + Send + Sync + 'static,
{
    fn detect_end(&self, message: &Message) -> bool { self(message) }
}

/// Receives pool diagnostics.
///
/// Invoked on the blocking pool, so implementations may block without
/// stalling packet intake.
pub trait Debugger: Send + Sync + 'static {
    /// Record one diagnostic. `message` is already formatted.
    fn debug(&self, severity: Severity, message: &str);
}

impl<F> Debugger for F
where
    F: Fn(Severity, &str) + Send + Sync + 'static,
{
    fn debug(&self, severity: Severity, message: &str) { self(severity, message) }
}

/// Consumes finished messages.
///
/// Called exactly once per message on the blocking pool, never while the
/// pool lock is held.
pub trait MessageHandler: Send + Sync + 'static {
    /// Take ownership of a completed, reset or expired message.
    fn handle(&self, message: Message);
}

impl<F> MessageHandler for F
where
    F: Fn(Message) + Send + Sync + 'static,
{
    fn handle(&self, message: Message) { self(message) }
}

/// Optional callbacks wired into a pool at construction.
#[derive(Clone, Default)]
pub struct PoolHooks {
    pub start: Option<Arc<dyn StartDetector>>,
    pub end: Option<Arc<dyn EndDetector>>,
    pub debug: Option<Arc<dyn Debugger>>,
}

impl PoolHooks {
    /// Decide whether `packet` opens a message.
    ///
    /// Without a start detector a SYN opens one: incoming for a bare SYN,
    /// outgoing for SYN-ACK. Anything else is ignored.
    pub fn start(&self, packet: &Packet) -> Option<Direction> {
        if let Some(detector) = &self.start {
            return detector.detect_start(packet);
        }
        if !packet.flags.syn {
            return None;
        }
        Some(if packet.flags.ack {
            Direction::Outgoing
        } else {
            Direction::Incoming
        })
    }

    /// Run the end detector if registered.
    pub fn end(&self, message: &Message) -> bool {
        self.end
            .as_ref()
            .is_some_and(|detector| detector.detect_end(message))
    }

    /// Forward a diagnostic to the debugger on the blocking pool.
    ///
    /// Must be called from within a tokio runtime when a debugger is set.
    pub fn debug(&self, severity: Severity, message: String) {
        if let Some(debugger) = &self.debug {
            let debugger = Arc::clone(debugger);
            tokio::task::spawn_blocking(move || debugger.debug(severity, &message));
        }
    }
}

impl std::fmt::Debug for PoolHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHooks")
            .field("start", &self.start.is_some())
            .field("end", &self.end.is_some())
            .field("debug", &self.debug.is_some())
            .finish()
    }
}

//! Panic payloads raised by message handlers.
//!
//! The dispatch watcher catches a panicking consumer so one bad message
//! cannot take other flows down with it. [`HandlerPanic`] turns the caught
//! payload into something worth logging.

use std::{any::Any, fmt};

/// A caught panic from a [`MessageHandler`](crate::hooks::MessageHandler).
///
/// ```
/// use tcpstitch::panic::HandlerPanic;
///
/// let caught: Box<dyn std::any::Any + Send> = Box::new("bad message");
/// assert_eq!(HandlerPanic::new(caught).to_string(), "bad message");
/// assert_eq!(HandlerPanic::new(Box::new(7_u8)).message(), None);
/// ```
#[must_use]
pub struct HandlerPanic(Box<dyn Any + Send>);

impl HandlerPanic {
    pub fn new(payload: Box<dyn Any + Send>) -> Self { Self(payload) }

    /// The panic message, when the payload is a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.0
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| self.0.downcast_ref::<&'static str>().copied())
    }
}

impl fmt::Display for HandlerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("non-string panic payload"))
    }
}

impl fmt::Debug for HandlerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerPanic").field(&self.message()).finish()
    }
}

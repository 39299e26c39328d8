//! Live tick feed port trait.

use crate::domain::error::TickwheelError;
use crate::domain::tick::Tick;

/// Callback invoked for every inbound tick message.
pub type TickCallback = Box<dyn Fn(Tick) + Send + Sync>;

/// A live market-data subscription.
///
/// The feed delivers ticks asynchronously through the callback until
/// `close` is called. Feed-level errors are the adapter's to report via
/// its own log sink; they must not panic through the callback.
pub trait FeedPort: Send {
    fn subscribe(&mut self, symbols: &[String], on_tick: TickCallback)
    -> Result<(), TickwheelError>;

    fn close(&mut self);
}

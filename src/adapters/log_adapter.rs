//! Log sinks: console output for interactive runs, an in-process channel
//! for anything that wants to consume the stream (tests, a future UI).

use std::sync::mpsc::{Receiver, Sender, channel};

use chrono::Local;

use crate::ports::log_port::LogSink;

/// Prints `[HH:MM:SS] [Component] message` to stdout.
pub struct ConsoleLogAdapter;

impl LogSink for ConsoleLogAdapter {
    fn log(&self, component: &str, message: &str) {
        println!("[{}] [{}] {}", Local::now().format("%H:%M:%S"), component, message);
    }
}

/// Forwards `[Component] message` lines over an mpsc channel. If the
/// receiver is gone the line is dropped; logging never fails.
pub struct ChannelLogAdapter {
    sender: Sender<String>,
}

impl ChannelLogAdapter {
    pub fn pair() -> (Self, Receiver<String>) {
        let (sender, receiver) = channel();
        (ChannelLogAdapter { sender }, receiver)
    }
}

impl LogSink for ChannelLogAdapter {
    fn log(&self, component: &str, message: &str) {
        let _ = self.sender.send(format!("[{}] {}", component, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_adapter_forwards_component_and_message() {
        let (log, rx) = ChannelLogAdapter::pair();
        log.log("Session", "Backtest started");
        assert_eq!(rx.recv().unwrap(), "[Session] Backtest started");
    }

    #[test]
    fn channel_adapter_ignores_closed_receiver() {
        let (log, rx) = ChannelLogAdapter::pair();
        drop(rx);
        log.log("Session", "nobody listening");
    }
}

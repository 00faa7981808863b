// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Event logging for the update path
//!
//! A small circular buffer of recent events, usable without an allocator
//! or a timer. Entries carry a monotonically increasing sequence number
//! instead of a timestamp; the host side can correlate them with its own
//! clock when the log is read out.
//!
//! Messages must never contain key material or signature bytes.

use core::fmt;
use heapless::String;

/// Maximum length of a log message
pub const MAX_LOG_MESSAGE_LEN: usize = 96;

/// Number of entries retained in the event log
pub const EVENT_LOG_SIZE: usize = 16;

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Unrecoverable or security-relevant failure
    Error,
    /// Recoverable anomaly
    Warn,
    /// Normal progress event
    Info,
    /// Detail useful during bring-up
    Debug,
}

impl LogLevel {
    /// Short tag used when rendering an entry
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity
    pub level: LogLevel,
    /// Monotonic sequence number, assigned by the log
    pub seq: u32,
    /// Module name
    pub module: &'static str,
    /// Formatted message
    pub message: String<MAX_LOG_MESSAGE_LEN>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:05} [{}] {}: {}",
            self.seq,
            self.level.tag(),
            self.module,
            self.message
        )
    }
}

/// Circular event log
///
/// When full, the oldest entry is overwritten.
#[derive(Debug)]
pub struct EventLog {
    entries: [Option<LogEntry>; EVENT_LOG_SIZE],
    head: usize,
    len: usize,
    next_seq: u32,
}

impl EventLog {
    /// Create an empty log
    #[must_use]
    pub const fn new() -> Self {
        const NONE: Option<LogEntry> = None;
        Self {
            entries: [NONE; EVENT_LOG_SIZE],
            head: 0,
            len: 0,
            next_seq: 0,
        }
    }

    /// Append an entry, dropping the oldest if the log is full
    pub fn push(&mut self, level: LogLevel, module: &'static str, message: &str) {
        let mut msg: String<MAX_LOG_MESSAGE_LEN> = String::new();
        // truncate on overflow rather than fail
        for ch in message.chars() {
            if msg.push(ch).is_err() {
                break;
            }
        }
        let entry = LogEntry {
            level,
            seq: self.next_seq,
            module,
            message: msg,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % EVENT_LOG_SIZE;
        if self.len < EVENT_LOG_SIZE {
            self.len += 1;
        }
    }

    /// Number of retained entries
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the log holds no entries
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        let start = (self.head + EVENT_LOG_SIZE - self.len) % EVENT_LOG_SIZE;
        (0..self.len).filter_map(move |i| self.entries[(start + i) % EVENT_LOG_SIZE].as_ref())
    }

    /// Discard all entries, keeping the sequence counter
    pub fn clear(&mut self) {
        const NONE: Option<LogEntry> = None;
        self.entries = [NONE; EVENT_LOG_SIZE];
        self.head = 0;
        self.len = 0;
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Log an error event
#[macro_export]
macro_rules! ota_log_error {
    ($log:expr, $module:expr, $($arg:tt)*) => {{
        let mut s: heapless::String<{ $crate::log::MAX_LOG_MESSAGE_LEN }> = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!($($arg)*));
        $log.push($crate::log::LogLevel::Error, $module, s.as_str());
    }};
}

/// Log a warning event
#[macro_export]
macro_rules! ota_log_warn {
    ($log:expr, $module:expr, $($arg:tt)*) => {{
        let mut s: heapless::String<{ $crate::log::MAX_LOG_MESSAGE_LEN }> = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!($($arg)*));
        $log.push($crate::log::LogLevel::Warn, $module, s.as_str());
    }};
}

/// Log an informational event
#[macro_export]
macro_rules! ota_log_info {
    ($log:expr, $module:expr, $($arg:tt)*) => {{
        let mut s: heapless::String<{ $crate::log::MAX_LOG_MESSAGE_LEN }> = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!($($arg)*));
        $log.push($crate::log::LogLevel::Info, $module, s.as_str());
    }};
}

/// Log a debug event
#[macro_export]
macro_rules! ota_log_debug {
    ($log:expr, $module:expr, $($arg:tt)*) => {{
        let mut s: heapless::String<{ $crate::log::MAX_LOG_MESSAGE_LEN }> = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut s, format_args!($($arg)*));
        $log.push($crate::log::LogLevel::Debug, $module, s.as_str());
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_order() {
        let mut log = EventLog::new();
        log.push(LogLevel::Info, "boot", "first");
        log.push(LogLevel::Warn, "boot", "second");
        let mut it = log.iter();
        assert_eq!(it.next().unwrap().message.as_str(), "first");
        assert_eq!(it.next().unwrap().message.as_str(), "second");
        assert!(it.next().is_none());
    }

    #[test]
    fn wraps_when_full() {
        let mut log = EventLog::new();
        for i in 0..EVENT_LOG_SIZE + 4 {
            ota_log_info!(log, "test", "event {}", i);
        }
        assert_eq!(log.len(), EVENT_LOG_SIZE);
        let first = log.iter().next().unwrap();
        assert_eq!(first.seq, 4);
        assert_eq!(first.message.as_str(), "event 4");
    }

    #[test]
    fn long_messages_truncate() {
        let mut log = EventLog::new();
        let raw = [b'x'; MAX_LOG_MESSAGE_LEN + 20];
        let long = core::str::from_utf8(&raw).unwrap();
        log.push(LogLevel::Debug, "test", long);
        assert_eq!(
            log.iter().next().unwrap().message.len(),
            MAX_LOG_MESSAGE_LEN
        );
    }
}

//! Server-side acceptance of chat submissions.
//!
//! Used by hosts that relay chat: new or unverified connections are ignored,
//! floods are kicked and blacklisted, oversized text is rejected, and the
//! rest is split into commands and broadcasts.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::warn;

use outpost_config::ChatConfig;

// ---------------------------------------------------------------------------
// ChatRules
// ---------------------------------------------------------------------------

/// Limits applied to chat submissions.
#[derive(Debug, Clone)]
pub struct ChatRules {
    /// Maximum message length in characters.
    pub max_message_length: usize,
    /// Messages allowed within `rate_window`.
    pub rate_limit_messages: u32,
    pub rate_window: Duration,
    /// Submissions from younger connections are dropped.
    pub min_connection_age: Duration,
    /// How long a flooding address stays blacklisted.
    pub blacklist_for: Duration,
    pub command_prefix: String,
}

impl Default for ChatRules {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for ChatRules {
    fn from(config: &ChatConfig) -> Self {
        Self {
            max_message_length: config.max_message_length,
            rate_limit_messages: config.rate_limit_messages,
            rate_window: Duration::from_millis(config.rate_limit_window_ms),
            min_connection_age: Duration::from_millis(config.min_connection_age_ms),
            blacklist_for: Duration::from_secs(config.blacklist_seconds),
            command_prefix: config.command_prefix.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RateTracker
// ---------------------------------------------------------------------------

/// Per-address sliding-window rate tracker.
#[derive(Debug, Clone)]
pub struct RateTracker {
    /// Accepted submissions within the current window.
    pub timestamps: VecDeque<Instant>,
    pub max_count: u32,
    pub window: Duration,
}

impl RateTracker {
    pub fn new(max_count: u32, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::new(),
            max_count,
            window,
        }
    }

    /// Returns `true` and records `now` if the address is within its limit.
    pub fn allow(&mut self, now: Instant) -> bool {
        while self
            .timestamps
            .front()
            .is_some_and(|t| now.duration_since(*t) > self.window)
        {
            self.timestamps.pop_front();
        }
        if self.timestamps.len() as u32 >= self.max_count {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// The connection a submission arrived on.
#[derive(Debug, Clone)]
pub struct ChatPeer<'a> {
    pub address: &'a str,
    pub connected_at: Instant,
    /// The peer finished its handshake.
    pub has_connected: bool,
}

/// Why a submission was refused without kicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRejection {
    TooLong { len: usize, max: usize },
}

/// What the host should do with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatVerdict {
    /// Relay to everyone.
    Broadcast(String),
    /// Hand to the command handler, prefix included.
    Command(String),
    /// Ignore silently.
    Dropped,
    /// The peer flooded: kick it. Its address is now blacklisted.
    Kicked,
    /// Tell the peer it broke a rule.
    Rejected(ChatRejection),
}

// ---------------------------------------------------------------------------
// ChatGate
// ---------------------------------------------------------------------------

/// Rate limiting and validation for incoming chat.
#[derive(Debug, Clone, Default)]
pub struct ChatGate {
    rules: ChatRules,
    rates: HashMap<String, RateTracker>,
    blacklist: HashMap<String, Instant>,
}

impl ChatGate {
    pub fn new(rules: ChatRules) -> Self {
        Self {
            rules,
            rates: HashMap::new(),
            blacklist: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &ChatRules {
        &self.rules
    }

    /// Judge one submission. `message` is `None` when the peer sent no text.
    ///
    /// A blacklisted address is kicked again without extending its ban.
    pub fn submit(&mut self, peer: &ChatPeer<'_>, message: Option<&str>, now: Instant) -> ChatVerdict {
        if self.is_blacklisted(peer.address, now) {
            return ChatVerdict::Kicked;
        }
        if !peer.has_connected || now.saturating_duration_since(peer.connected_at) < self.rules.min_connection_age {
            return ChatVerdict::Dropped;
        }

        let rules = &self.rules;
        let allowed = self
            .rates
            .entry(peer.address.to_string())
            .or_insert_with(|| RateTracker::new(rules.rate_limit_messages, rules.rate_window))
            .allow(now);
        if !allowed {
            warn!("Kicking {} for chat flooding", peer.address);
            self.rates.remove(peer.address);
            self.blacklist.retain(|_, until| now < *until);
            self.blacklist
                .insert(peer.address.to_string(), now + self.rules.blacklist_for);
            return ChatVerdict::Kicked;
        }

        let Some(message) = message else {
            return ChatVerdict::Dropped;
        };

        let len = message.chars().count();
        if len > self.rules.max_message_length {
            return ChatVerdict::Rejected(ChatRejection::TooLong {
                len,
                max: self.rules.max_message_length,
            });
        }

        let message = message.replace('\n', "");
        if message.starts_with(&self.rules.command_prefix) {
            ChatVerdict::Command(message)
        } else {
            ChatVerdict::Broadcast(message)
        }
    }

    /// Returns `true` while `address` is serving a flood ban.
    pub fn is_blacklisted(&mut self, address: &str, now: Instant) -> bool {
        match self.blacklist.get(address) {
            Some(until) if now < *until => true,
            Some(_) => {
                self.blacklist.remove(address);
                false
            }
            None => false,
        }
    }

    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    /// Drop rate state for a peer that left.
    pub fn forget(&mut self, address: &str) {
        self.rates.remove(address);
    }
}

//! Chat: formatting of received lines and server-side acceptance.
//!
//! [`ChatPipeline`] turns a server `sendMessage` into a display line with
//! clickable regions. [`ChatGate`] is the relay side and is only used by
//! hosts.

mod gate;
pub mod scan;

pub use gate::{ChatGate, ChatPeer, ChatRejection, ChatRules, ChatVerdict, RateTracker};

use glam::Vec2;
use rustc_hash::FxHashSet;

use crate::collab::ChatIdentity;
use scan::{find_coords, find_links, highlight_first_coord};

/// Color used for the admin chat prefix.
pub const ADMIN_COLOR: &str = "ff4747ff";

/// What clicking a region of a chat line does.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Move the camera to a world position.
    JumpTo(Vec2),
    OpenLink(String),
    /// Follow the sending entity.
    FocusSender(i32),
}

/// A clickable byte range of [`ChatMessage::text`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRegion {
    pub start: usize,
    pub end: usize,
    pub action: ClickAction,
}

/// A formatted chat line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Display text including the sender header.
    pub text: String,
    /// Team or admin marker in front of the header, if any.
    pub prefix: String,
    pub sender: Option<i32>,
    /// Unformatted body as typed by the sender, after highlighting.
    pub raw: Option<String>,
    pub regions: Vec<ClickRegion>,
}

/// The entity a chat line came from.
#[derive(Debug, Clone)]
pub struct ChatSender {
    pub id: i32,
    pub identity: ChatIdentity,
}

/// Formats received chat and remembers the last coordinate mentioned.
#[derive(Debug, Clone)]
pub struct ChatPipeline {
    tile_size: f32,
    muted: FxHashSet<i32>,
    last_position: Option<Vec2>,
}

impl ChatPipeline {
    pub fn new(tile_size: f32) -> Self {
        Self {
            tile_size,
            muted: FxHashSet::default(),
            last_position: None,
        }
    }

    /// Tile coordinates of the most recent highlighted pair.
    pub fn last_position(&self) -> Option<Vec2> {
        self.last_position
    }

    pub fn mute(&mut self, id: i32) {
        self.muted.insert(id);
    }

    pub fn unmute(&mut self, id: i32) {
        self.muted.remove(&id);
    }

    pub fn is_muted(&self, id: i32) -> bool {
        self.muted.contains(&id)
    }

    fn highlight(&mut self, text: Option<String>, latch: bool) -> Option<String> {
        let text = text?;
        match highlight_first_coord(&text) {
            Some((highlighted, tile)) => {
                if latch {
                    self.last_position = Some(tile);
                }
                Some(highlighted)
            }
            None => Some(text),
        }
    }

    /// Format one received line. Returns `None` if the sender is muted.
    pub fn receive(
        &mut self,
        message: Option<String>,
        raw: Option<String>,
        sender: Option<ChatSender>,
    ) -> Option<ChatMessage> {
        let has_raw = raw.is_some();
        let raw = self.highlight(raw, true);
        let message = self.highlight(message, !has_raw);

        if sender.as_ref().is_some_and(|s| self.muted.contains(&s.id)) {
            return None;
        }

        let mut regions = Vec::new();
        let (text, prefix, header_end) = match &sender {
            Some(sender) => {
                let name = &sender.identity.colored_name;
                let prefix = sender_prefix(message.as_deref(), &sender.identity.team_color);
                let head = format!("{prefix}[coral][[{name}[coral]]:[white] ");
                let name_start = prefix.len() + "[coral][[".len();
                regions.push(ClickRegion {
                    start: name_start,
                    end: head.len(),
                    action: ClickAction::FocusSender(sender.id),
                });
                let body = raw.as_deref().or(message.as_deref()).unwrap_or_default();
                let header_end = head.len();
                (head + body, prefix, header_end)
            }
            None => (message.unwrap_or_default(), String::new(), 0),
        };

        regions.extend(find_coords(&text).into_iter().map(|c| ClickRegion {
            start: c.start,
            end: c.end,
            action: ClickAction::JumpTo(c.world(self.tile_size)),
        }));
        regions.extend(find_links(&text, header_end).into_iter().map(|l| ClickRegion {
            start: l.start,
            end: l.end,
            action: ClickAction::OpenLink(l.url),
        }));

        Some(ChatMessage {
            text,
            prefix,
            sender: sender.map(|s| s.id),
            raw,
            regions,
        })
    }
}

fn sender_prefix(message: Option<&str>, team_color: &str) -> String {
    let Some(message) = message else {
        return String::new();
    };
    let team = format!("[#{team_color}]<T>");
    if message.starts_with(&team) {
        return format!("{team} ");
    }
    let admin = format!("[#{ADMIN_COLOR}]<A>");
    if message.starts_with(&admin) {
        return format!("{admin} ");
    }
    String::new()
}

//! Periodic outgoing state: the local player snapshot and latency probes.
//!
//! Both run off a tick-based [`Interval`] rather than wall-clock time, so a
//! slow frame delays emission instead of bunching it up.
//!
//! Client snapshot layout:
//!
//! ```text
//! sequence:i32 | unit:i32 (-1 dead) | dead:bool | x:f32 | y:f32
//! aim_x:f32 | aim_y:f32 | rotation:f32 | base_rotation:f32
//! vel_x:f32 | vel_y:f32 | mine_tile:i32 (-1 none)
//! boosting:bool | shooting:bool | typing:bool | building:bool
//! has_plans:bool [ count:u16 | { tile:i32 | breaking:bool | block:u16 | rotation:u8 } ]
//! cam_x:f32 | cam_y:f32 | cam_w:f32 | cam_h:f32
//! ```

use std::collections::VecDeque;

use bytes::Bytes;

use outpost_net::{NO_ENTITY, WireWriter};

use crate::collab::PlayerState;

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// Independent periodic timers sharing one tick counter.
///
/// The counter is `f64` so single-tick steps stay exact for the length of
/// any realistic session.
#[derive(Debug, Clone)]
pub struct Interval<const N: usize> {
    elapsed: f64,
    marks: [f64; N],
}

impl<const N: usize> Default for Interval<N> {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            marks: [0.0; N],
        }
    }
}

impl<const N: usize> Interval<N> {
    pub fn advance(&mut self, delta_ticks: f32) {
        self.elapsed += f64::from(delta_ticks);
    }

    /// Returns `true` at most once per `period` ticks for `slot`.
    pub fn get(&mut self, slot: usize, period: f32) -> bool {
        let Some(mark) = self.marks.get_mut(slot) else {
            return false;
        };
        if self.elapsed - *mark >= f64::from(period) {
            *mark = self.elapsed;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Ping
// ---------------------------------------------------------------------------

/// Exponentially weighted round-trip estimate.
#[derive(Debug, Clone)]
pub struct PingTracker {
    /// Recent samples in milliseconds.
    pub samples: VecDeque<i64>,
    pub max_samples: usize,
    /// Smoothed round trip in milliseconds.
    pub ewma: f64,
    /// Smoothing factor (default 0.125).
    pub alpha: f64,
}

impl Default for PingTracker {
    fn default() -> Self {
        Self {
            samples: VecDeque::new(),
            max_samples: 16,
            ewma: 0.0,
            alpha: 0.125,
        }
    }
}

impl PingTracker {
    /// Record the reply to a probe sent at `sent_millis`.
    pub fn record(&mut self, sent_millis: i64, now_millis: i64) {
        let rtt = (now_millis - sent_millis).max(0);
        if self.samples.is_empty() {
            self.ewma = rtt as f64;
        } else {
            self.ewma = self.alpha * rtt as f64 + (1.0 - self.alpha) * self.ewma;
        }
        self.samples.push_back(rtt);
        if self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Most recent round trip, in milliseconds.
    pub fn last(&self) -> Option<i64> {
        self.samples.back().copied()
    }

    /// Smoothed round trip, rounded to whole milliseconds.
    pub fn ping(&self) -> i64 {
        self.ewma.round() as i64
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.ewma = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

const SLOT_STATE: usize = 0;
const SLOT_PING: usize = 1;

/// What the emitter wants sent this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emission {
    /// Encoded client snapshot arguments.
    pub state: Option<Bytes>,
    /// Timestamp for a latency probe.
    pub ping: Option<i64>,
}

/// Drives the two periodic outgoing messages.
#[derive(Debug, Clone)]
pub struct ClientStateEmitter {
    interval: Interval<2>,
    sync_period: f32,
    ping_period: f32,
    pub ping: PingTracker,
}

impl ClientStateEmitter {
    pub fn new(sync_ticks: u32, ping_ticks: u32) -> Self {
        Self {
            interval: Interval::default(),
            sync_period: sync_ticks as f32,
            ping_period: ping_ticks as f32,
            ping: PingTracker::default(),
        }
    }

    /// Advance by `delta_ticks` and collect what is due. `sequence` is
    /// incremented for every snapshot produced.
    pub fn tick(
        &mut self,
        delta_ticks: f32,
        sequence: &mut i32,
        player: &PlayerState,
        now_millis: i64,
    ) -> Emission {
        self.interval.advance(delta_ticks);
        let mut out = Emission::default();

        if self.interval.get(SLOT_STATE, self.sync_period) {
            out.state = Some(encode_client_state(*sequence, player));
            *sequence = sequence.wrapping_add(1);
        }
        if self.interval.get(SLOT_PING, self.ping_period) {
            out.ping = Some(now_millis);
        }
        out
    }

    pub fn reset(&mut self) {
        self.interval.reset();
        self.ping.reset();
    }
}

/// Encode the client snapshot arguments.
pub fn encode_client_state(sequence: i32, player: &PlayerState) -> Bytes {
    let mut out = WireWriter::with_capacity(96);
    let unit = player.unit.as_ref();
    let position = unit.map_or(player.position, |u| u.position);
    let velocity = unit.map(|u| u.velocity).unwrap_or_default();

    out.write_i32(sequence)
        .write_i32(unit.map_or(NO_ENTITY, |u| u.id))
        .write_bool(unit.is_none())
        .write_f32(position.x)
        .write_f32(position.y)
        .write_f32(player.aim.x)
        .write_f32(player.aim.y)
        .write_f32(unit.map_or(0.0, |u| u.rotation))
        .write_f32(unit.and_then(|u| u.base_rotation).unwrap_or(0.0))
        .write_f32(velocity.x)
        .write_f32(velocity.y)
        .write_i32(player.mine_tile.unwrap_or(-1))
        .write_bool(player.boosting)
        .write_bool(player.shooting)
        .write_bool(player.typing)
        .write_bool(player.building);

    match &player.build_plans {
        Some(plans) => {
            let count = u16::try_from(plans.len()).unwrap_or(u16::MAX);
            out.write_bool(true).write_u16(count);
            for plan in plans.iter().take(count as usize) {
                out.write_i32(plan.tile)
                    .write_bool(plan.breaking)
                    .write_u16(plan.block)
                    .write_u8(plan.rotation);
            }
        }
        None => {
            out.write_bool(false);
        }
    }

    out.write_f32(player.camera.center.x)
        .write_f32(player.camera.center.y)
        .write_f32(player.camera.size.x)
        .write_f32(player.camera.size.y);
    out.finish()
}

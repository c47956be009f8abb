//! Input monitor: debounced sampling of the two panel indicator lines.
//!
//! Each [`Signal`] keeps the last confirmed (debounced) level and the time
//! it was confirmed.  A raw sample that disagrees with the debounced level
//! is committed only if more than the debounce interval has passed since
//! the last confirmed change, so a line toggling faster than the interval
//! produces no edges at all.
//!
//! ## Clock wraparound
//!
//! Timestamps are `u32` milliseconds and wrap after ~49.7 days.  When
//! `now < last_change_ms` the counter has wrapped; the sample is then
//! committed immediately.  Without this override a wrap would hold every
//! subsequent transition back for up to another full counter period.

/// A single raw reading of an indicator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSample {
    /// Digital read; `true` = line active.
    Digital(bool),
    /// ADC counts, compared against the configured threshold.
    Analog(u16),
}

impl RawSample {
    /// Boolean interpretation of the sample.
    pub fn is_active(self, analog_threshold: u16) -> bool {
        match self {
            Self::Digital(level) => level,
            Self::Analog(counts) => counts >= analog_threshold,
        }
    }
}

/// A confirmed transition of a debounced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    RoseActive,
    FellInactive,
}

/// The two monitored panel lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// "System armed" indicator (panel LED).
    Armed,
    /// "Siren sounding" indicator.
    Siren,
}

/// Debounced state of one indicator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    raw: RawSample,
    level: bool,
    last_change_ms: u32,
    debounce_ms: u32,
    analog_threshold: u16,
}

impl Signal {
    /// Seed the signal with its first sample.  No edge is reported for it.
    pub fn new(initial: RawSample, now_ms: u32, debounce_ms: u32, analog_threshold: u16) -> Self {
        Self {
            raw: initial,
            level: initial.is_active(analog_threshold),
            last_change_ms: now_ms,
            debounce_ms,
            analog_threshold,
        }
    }

    /// Feed one raw sample taken at `now_ms`.
    pub fn sample(&mut self, raw: RawSample, now_ms: u32) -> Option<Edge> {
        self.raw = raw;
        let active = raw.is_active(self.analog_threshold);
        if active == self.level {
            return None;
        }

        let settled = match now_ms.checked_sub(self.last_change_ms) {
            Some(elapsed) => elapsed > self.debounce_ms,
            // Counter wrapped since the last confirmed change.
            None => true,
        };
        if !settled {
            return None;
        }

        self.level = active;
        self.last_change_ms = now_ms;
        Some(if active { Edge::RoseActive } else { Edge::FellInactive })
    }

    /// Current debounced level.
    pub fn level(&self) -> bool {
        self.level
    }

    /// Most recent raw sample, debounced or not.
    pub fn raw(&self) -> RawSample {
        self.raw
    }

    pub fn last_change_ms(&self) -> u32 {
        self.last_change_ms
    }
}

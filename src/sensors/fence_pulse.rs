//! Fence pulse-timing classifier.
//!
//! A legal energizer emits one short high-voltage pulse roughly every
//! second.  Illegal injection shows up either as a constant level (DC,
//! no further edges) or as a fast toggle (AC, edges a few ms apart).
//! Sampling the conditioned pulse line and timing the gap between rising
//! edges separates the three:
//!
//! ```text
//!   legal   ─┐▁▁▁▁▁▁▁▁▁▁▁▁▁┌┐▁▁▁▁▁▁▁▁▁▁▁▁▁┌┐     gap ≈ 1000 ms
//!   AC      ┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐┌┐     gap ≈ 20 ms
//!   DC      ▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔     one edge, then none
//! ```
//!
//! The classifier is pure state: it never reads the pin or the clock
//! itself, the transmitter node feeds it `(level, now_ms)` samples.

use crate::config::{FenceConfig, FirstEdgePolicy};

/// Result of classifying one inter-edge gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Gap within `[min_gap, max_gap]` inclusive.
    Legal,
    /// Anything else, including a gap of zero.
    Illegal,
}

impl Classification {
    pub fn is_legal(self) -> bool {
        self == Self::Legal
    }
}

/// `Legal` iff `min_ms <= gap_ms <= max_ms`.
pub fn classify(gap_ms: u32, min_ms: u32, max_ms: u32) -> Classification {
    if (min_ms..=max_ms).contains(&gap_ms) {
        Classification::Legal
    } else {
        Classification::Illegal
    }
}

/// One detected rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    pub timestamp_ms: u64,
    /// Time since the previous rising edge (or since monitoring started,
    /// for the first edge).  Saturates at `u32::MAX`.
    pub gap_ms: u32,
    /// No earlier edge existed to measure against.
    pub first_edge: bool,
}

/// What the next gap is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeBaseline {
    /// No rising edge seen yet; monitoring started at `since_ms`.
    AwaitingFirstEdge { since_ms: u64 },
    LastEdgeAt(u64),
}

/// Running counters, for the node's status log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseStats {
    pub edges: u32,
    pub legal: u32,
    pub illegal: u32,
}

pub struct PulseClassifier {
    min_gap_ms: u32,
    max_gap_ms: u32,
    first_edge_policy: FirstEdgePolicy,
    last_level: bool,
    baseline: EdgeBaseline,
    stats: PulseStats,
}

impl PulseClassifier {
    /// Start monitoring at `start_ms`.  The line is assumed low at start,
    /// so a line that is already high produces an edge on the first sample.
    pub fn new(config: &FenceConfig, start_ms: u64) -> Self {
        Self {
            min_gap_ms: config.min_gap_ms,
            max_gap_ms: config.max_gap_ms,
            first_edge_policy: config.first_edge_policy,
            last_level: false,
            baseline: EdgeBaseline::AwaitingFirstEdge { since_ms: start_ms },
            stats: PulseStats::default(),
        }
    }

    /// Feed one sample of the pulse line.  Returns an event on a rising
    /// edge only; falling edges and unchanged levels return `None`.
    pub fn on_sample(&mut self, level: bool, now_ms: u64) -> Option<PulseEvent> {
        let rising = level && !self.last_level;
        self.last_level = level;
        if !rising {
            return None;
        }
        self.stats.edges = self.stats.edges.saturating_add(1);

        let (from_ms, first_edge) = match self.baseline {
            EdgeBaseline::AwaitingFirstEdge { since_ms } => (since_ms, true),
            EdgeBaseline::LastEdgeAt(t) => (t, false),
        };
        self.baseline = EdgeBaseline::LastEdgeAt(now_ms);

        if first_edge && self.first_edge_policy == FirstEdgePolicy::Suppress {
            return None;
        }

        let gap_ms = u32::try_from(now_ms.saturating_sub(from_ms)).unwrap_or(u32::MAX);
        let event = PulseEvent { timestamp_ms: now_ms, gap_ms, first_edge };
        match self.classification(&event) {
            Classification::Legal => self.stats.legal = self.stats.legal.saturating_add(1),
            Classification::Illegal => self.stats.illegal = self.stats.illegal.saturating_add(1),
        }
        Some(event)
    }

    /// Classify an event produced by this classifier.  A first edge has
    /// no real gap and is always `Illegal`.
    pub fn classification(&self, event: &PulseEvent) -> Classification {
        if event.first_edge {
            return Classification::Illegal;
        }
        classify(event.gap_ms, self.min_gap_ms, self.max_gap_ms)
    }

    /// Forget the previous edge; the next rising edge is a first edge again.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_level = false;
        self.baseline = EdgeBaseline::AwaitingFirstEdge { since_ms: now_ms };
    }

    pub fn baseline(&self) -> EdgeBaseline {
        self.baseline
    }

    pub fn stats(&self) -> PulseStats {
        self.stats
    }
}

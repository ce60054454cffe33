//! Cooperative poll loop and timers.
//!
//! Every node is one unbounded cycle: read the clock, run one poll step,
//! sleep the node's interval, repeat.  Both the clock and the sleep are
//! injected, so tests drive the exact same loop against simulated time
//! without waiting.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      PollLoop                        │
//! │                                                      │
//! │   ┌────────┐   now_ms   ┌──────────┐   interval_ms   │
//! │   │ Clock  │ ─────────▶ │ PollNode │ ──────────┐     │
//! │   └────────┘            └──────────┘           ▼     │
//! │        ▲                                  ┌─────────┐│
//! │        └──────────── next cycle ───────── │ DelayNs ││
//! │                                           └─────────┘│
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Blocking I/O inside a poll step (radio send, HTTP POST) simply delays
//! the next cycle; each such call is bounded by its own timeout.

use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::app::ports::Clock;
use crate::error::Error;

// ═══════════════════════════════════════════════════════════════
//  Poll nodes
// ═══════════════════════════════════════════════════════════════

/// One node's per-cycle work.
pub trait PollNode {
    /// Run one cycle at time `now_ms`.
    fn poll(&mut self, now_ms: u64);

    /// Sleep between cycles.
    fn interval_ms(&self) -> u32;

    /// Short name for log lines.
    fn name(&self) -> &'static str;
}

/// Drives a [`PollNode`] with an injected clock and delay.
pub struct PollLoop<C: Clock, D: DelayNs, N: PollNode> {
    clock: C,
    delay: D,
    node: N,
    cycles: u64,
}

impl<C: Clock, D: DelayNs, N: PollNode> PollLoop<C, D, N> {
    pub fn new(clock: C, delay: D, node: N) -> Self {
        Self { clock, delay, node, cycles: 0 }
    }

    /// Run one cycle: poll, then sleep.
    pub fn step(&mut self) {
        let now = self.clock.now_ms();
        self.node.poll(now);
        self.cycles = self.cycles.wrapping_add(1);
        self.delay.delay_ms(self.node.interval_ms());
    }

    /// Run exactly `n` cycles.
    pub fn run_cycles(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Device entry point.  Never returns.
    pub fn run_forever(&mut self) -> ! {
        info!(
            "Scheduler: {} loop started (interval {} ms)",
            self.node.name(),
            self.node.interval_ms()
        );
        loop {
            self.step();
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut N {
        &mut self.node
    }
}

// ═══════════════════════════════════════════════════════════════
//  Periodic timer
// ═══════════════════════════════════════════════════════════════

/// Elapsed-time timer.  Fires when at least `interval_ms` has passed
/// since the last fire (or since start), then restarts from `now`.
///
/// Polling jitter is not compensated: a fire observed late pushes the
/// next one later by the same amount.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    interval_ms: u64,
    last_ms: u64,
}

impl PeriodicTimer {
    pub fn new(interval_ms: u64, start_ms: u64) -> Self {
        Self { interval_ms, last_ms: start_ms }
    }

    /// Returns `true` at most once per interval.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Startup-fatal halt
// ═══════════════════════════════════════════════════════════════

/// Park the node after a startup failure.  The caller must have released
/// every output (relay open) before calling.  Logs the reason every
/// minute so the failure stays visible on the serial console.
pub fn halt_safe<D: DelayNs>(reason: &str, delay: &mut D) -> ! {
    error!("HALT: {} (node idle, outputs released)", reason);
    let mut seconds: u32 = 0;
    loop {
        delay.delay_ms(1000);
        seconds = seconds.wrapping_add(1);
        if seconds % 60 == 0 {
            error!("HALT: still halted: {}", reason);
        }
    }
}

/// Unwrap one startup step, or [`halt_safe`] with the failure reported
/// as a firmware [`Error`].
pub fn or_halt<T, E, D>(step: core::result::Result<T, E>, what: &str, delay: &mut D) -> T
where
    E: Into<Error>,
    D: DelayNs,
{
    match step {
        Ok(value) => value,
        Err(e) => {
            let e: Error = e.into();
            halt_safe(&format!("{}: {}", what, e), delay)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub const MAX_SEARCH_DEPTH: i32 = 64;

/// Budget handed to one search call by the front end.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub depth: i32,
    pub nodes: Option<u64>,
    /// Completion budget: no new iteration starts once it is unlikely to
    /// finish inside this bound, and the search stops when it is exceeded.
    pub soft_ms: Option<u64>,
    /// Absolute wall-clock bound; the search aborts mid-iteration.
    pub hard_ms: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: MAX_SEARCH_DEPTH,
            nodes: None,
            soft_ms: None,
            hard_ms: None,
        }
    }
}

impl SearchLimits {
    pub fn depth(depth: i32) -> Self {
        Self {
            depth: depth.clamp(1, MAX_SEARCH_DEPTH),
            ..Self::default()
        }
    }
}

/// Node counter plus limit polling. Time and the shared stop flag are only
/// consulted every 2048 nodes to keep the hot path cheap.
pub struct SearchClock {
    start: Instant,
    limits: SearchLimits,
    stop: Arc<AtomicBool>,
    pub stop_search: bool,
    pub nodes: u64,
}

const POLL_MASK: u64 = 2047;

impl SearchClock {
    pub fn new(limits: SearchLimits, stop: Arc<AtomicBool>) -> Self {
        Self {
            start: Instant::now(),
            limits,
            stop,
            stop_search: false,
            nodes: 0,
        }
    }

    #[inline(always)]
    pub fn visit_node(&mut self) {
        self.nodes += 1;
        if self.nodes & POLL_MASK == 0 {
            self.poll();
        }
    }

    fn poll(&mut self) {
        if self.stop_search {
            return;
        }
        if self.stop.load(Ordering::Acquire) {
            self.stop_search = true;
            return;
        }
        if let Some(limit) = self.limits.nodes
            && self.nodes >= limit
        {
            self.stop_search = true;
            return;
        }
        let elapsed = self.elapsed_ms();
        if let Some(hard) = self.limits.hard_ms
            && elapsed >= hard
        {
            self.stop_search = true;
            return;
        }
        if let Some(soft) = self.limits.soft_ms
            && elapsed >= soft
        {
            self.stop_search = true;
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Between iterations: is a deeper iteration worth starting? The next
    /// one is predicted to take three times the last; once 60% of the soft
    /// budget is spent and the prediction does not fit, stop here.
    pub fn should_start_iteration(&self, last_iter_ms: u64) -> bool {
        if self.stop_search {
            return false;
        }
        if let Some(soft) = self.limits.soft_ms {
            let elapsed = self.elapsed_ms();
            if elapsed >= soft {
                return false;
            }
            let predicted = last_iter_ms.max(1) * 3;
            if elapsed * 10 >= soft * 6 && predicted > soft - elapsed {
                return false;
            }
        }
        true
    }
}

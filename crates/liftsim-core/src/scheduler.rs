//! Logical-clock scheduler for periodic ticks.
//!
//! Every periodic activity (car decisions, car travel, doors, the arrival
//! generator, waiting passengers) is a [`Ticker`] with a fixed interval.
//! The engine asks for the earliest due ticker, runs it, and asks again,
//! so ticks never overlap and their order is fully determined by the
//! intervals and registration order.

/// What a ticker drives. Car tickers carry the car's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    Operate(usize),
    Motion(usize),
    Doors(usize),
    Traffic,
    Waiting,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    pub kind: TickKind,
    pub interval_ms: u64,
    pub next_due_ms: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tickers: Vec<Ticker>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker first due one interval after `now_ms`.
    pub fn register(&mut self, kind: TickKind, interval_ms: u64, now_ms: u64) {
        let interval_ms = interval_ms.max(1);
        self.tickers.push(Ticker {
            kind,
            interval_ms,
            next_due_ms: now_ms + interval_ms,
            enabled: true,
        });
    }

    /// Pop the earliest enabled ticker due at or before `until_ms` and
    /// reschedule it. Ties go to the ticker registered first. Returns the
    /// ticker's kind and the time it fired.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TickKind, u64)> {
        let mut best: Option<usize> = None;
        for (i, ticker) in self.tickers.iter().enumerate() {
            if !ticker.enabled || ticker.next_due_ms > until_ms {
                continue;
            }
            if best.map_or(true, |b| ticker.next_due_ms < self.tickers[b].next_due_ms) {
                best = Some(i);
            }
        }
        let ticker = &mut self.tickers[best?];
        let fired_at = ticker.next_due_ms;
        ticker.next_due_ms += ticker.interval_ms;
        Some((ticker.kind, fired_at))
    }

    /// Enable or disable every ticker matching `matches`. A re-enabled
    /// ticker resumes one interval after `now_ms` rather than catching up.
    pub fn set_enabled(&mut self, matches: impl Fn(TickKind) -> bool, enabled: bool, now_ms: u64) {
        for ticker in self.tickers.iter_mut().filter(|t| matches(t.kind)) {
            if enabled && !ticker.enabled {
                ticker.next_due_ms = now_ms + ticker.interval_ms;
            }
            ticker.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, kind: TickKind) -> bool {
        self.tickers.iter().any(|t| t.kind == kind && t.enabled)
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

//! Bisection bookkeeping for one size-targeted request.
//!
//! [`SearchState`] performs no I/O. The service asks it for the next
//! resolution, runs the tool, and feeds the produced candidate back through
//! [`SearchState::record`], which decides whether to keep going.

use bytes::Bytes;

/// A successfully produced output and the knob value that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub data: Bytes,
    pub resolution: u32,
}

impl Candidate {
    pub fn new(data: Bytes, resolution: u32) -> Self {
        Self { data, resolution }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// What the search should do after recording a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Keep bisecting
    Continue,
    /// The candidate landed within tolerance of the target
    WithinTolerance,
    /// The bracket is narrower than one knob unit
    RangeCollapsed,
}

/// Mutable state of a bisection over the resolution knob.
#[derive(Debug)]
pub struct SearchState {
    low: f64,
    high: f64,
    target: u64,
    tolerance: u64,
    best: Option<Candidate>,
    best_distance: u64,
    iterations: u32,
}

impl SearchState {
    /// Start a search bracketed by `[min_resolution, start_resolution]`.
    pub fn new(min_resolution: u32, start_resolution: u32, target: u64, tolerance: u64) -> Self {
        let low = f64::from(min_resolution.min(start_resolution));
        let high = f64::from(start_resolution);
        Self {
            low,
            high,
            target,
            tolerance,
            best: None,
            best_distance: u64::MAX,
            iterations: 0,
        }
    }

    /// Resolution to try next.
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Current `(low, high)` bracket.
    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    /// Number of candidates recorded so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    /// Absolute distance of the best candidate, if any.
    pub fn best_distance(&self) -> Option<u64> {
        self.best.as_ref().map(|_| self.best_distance)
    }

    /// Record the candidate produced at `mid` and advance the bracket.
    ///
    /// Ties keep the earlier candidate.
    pub fn record(&mut self, mid: f64, candidate: Candidate) -> SearchStep {
        self.iterations += 1;

        let size = candidate.size();
        let distance = size.abs_diff(self.target);

        if distance < self.best_distance {
            self.best_distance = distance;
            self.best = Some(candidate);
        }

        if distance <= self.tolerance {
            return SearchStep::WithinTolerance;
        }

        // Too big: compress harder. Under target: ease back toward quality.
        if size > self.target {
            self.high = mid.max(self.low);
        } else {
            self.low = mid.min(self.high);
        }

        if self.high - self.low < 1.0 {
            return SearchStep::RangeCollapsed;
        }

        SearchStep::Continue
    }

    /// Consume the state, yielding the closest candidate seen.
    pub fn into_best(self) -> Option<Candidate> {
        self.best
    }
}

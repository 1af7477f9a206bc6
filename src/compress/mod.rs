//! Size-targeting compression.
//!
//! This module decides how hard to compress a document. Without a target
//! size (or with a target the original already meets) the tool runs once at
//! the tier's starting resolution. Otherwise a bounded bisection over the
//! resolution knob steers the output toward the target.
//!
//! # Components
//!
//! - [`CompressionService`]: Entry point; owns the stopping and fallback policy
//! - [`SearchState`]: Per-request bisection bookkeeping, free of I/O
//! - [`QualityTier`]: Fixed mapping from tier to (resolution, preset)
//! - [`CompressionRequest`] / [`CompressionResult`]: Input and output of one run
//!
//! # Example
//!
//! ```
//! use pdf_squeezer::compress::{SearchState, SearchStep, Candidate, QualityTier, MIN_RESOLUTION};
//! use bytes::Bytes;
//!
//! let tier = QualityTier::Medium;
//! let mut state = SearchState::new(MIN_RESOLUTION, tier.start_resolution(), 1_000, 0);
//! assert_eq!(state.midpoint(), 136.0);
//!
//! // A too-large candidate pushes the upper bound down.
//! let step = state.record(136.0, Candidate::new(Bytes::from(vec![0u8; 4_000]), 136));
//! assert_eq!(step, SearchStep::Continue);
//! assert_eq!(state.bounds(), (72.0, 136.0));
//! ```

mod search;
mod service;
mod tier;

pub use search::{Candidate, SearchState, SearchStep};
pub use service::{
    megabytes_to_bytes, CompressionRequest, CompressionResult, CompressionService,
    SearchSettings, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE_BYTES, DEFAULT_TOOL_TIMEOUT,
};
pub use tier::{QualityTier, MIN_RESOLUTION};

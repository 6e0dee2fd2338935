//! Ranking evaluation of true continuations against distractors
//!
//! - `ranking`: NDCG over per-sequence negative log-likelihoods

pub mod ranking;

pub use ranking::{dcg, ndcg};

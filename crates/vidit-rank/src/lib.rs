//! Lexical clustering, gravity scoring, and greedy deduplication of news items.
//!
//! Titles are reduced to token sets ([`Tokenizer`]), compared with the Jaccard
//! index ([`jaccard`]), and fed through the [`Ranker`], which sizes topic
//! clusters, scores every item, sorts, and keeps the best representative of
//! each near-duplicate group.

pub mod ranking;
pub mod similarity;
pub mod tokenize;

pub use ranking::{elapsed_hours, gravity, DedupOutcome, Ranker, RankingConfig, SourceWeights};
pub use similarity::jaccard;
pub use tokenize::{TokenSet, Tokenizer, DEFAULT_STOP_WORDS};

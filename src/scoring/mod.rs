pub mod band;
pub mod comments;
pub mod reactions;
pub mod vote;

pub use band::{classify_band, BandTier, ScoreBand};
pub use comments::add_comment;
pub use reactions::{add_laugh, toggle_l, toggle_respect, toggle_w};
pub use vote::{VoteConfig, VoteOutcome, VoteScorer};

pub mod normalizer;
pub mod ranker;
pub mod scorer;

pub use normalizer::{normalize, Roster};
pub use ranker::{rank, rank_with, RankConfig, Suggestion, SuggestionOrigin};
pub use scorer::score;

pub mod partition;
pub mod skyline;
pub mod strategy;
pub mod topk;

pub use skyline::{most_preferred_naive, most_preferred_partitioned};
pub use strategy::{most_preferred, top_k, Strategy};
pub use topk::{top_k_naive, top_k_partitioned};

use cpref_compiler::TheoryError;

#[derive(Debug, thiserror::Error)]
pub enum RankError {
    #[error("Cannot rank with compiled comparisons: {0}")]
    Theory(#[from] TheoryError),
}

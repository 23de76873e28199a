pub mod comparison;
pub mod compile;
pub mod consistency;
pub mod graph;
pub mod limits;
pub mod normalize;
pub mod rule;
pub mod theory;

pub use comparison::Comparison;
pub use consistency::Inconsistency;
pub use limits::TheoryLimits;
pub use rule::Rule;
pub use theory::{BuildError, Theory, TheoryError};

pub mod ast;
pub mod formula;
pub mod interval;
pub mod parse;
pub mod tuple;
pub mod value;

pub use formula::Formula;
pub use interval::{Bound, Interval};
pub use tuple::Tuple;
pub use value::Value;

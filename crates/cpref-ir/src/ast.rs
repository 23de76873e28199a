use serde::{Deserialize, Serialize};

use crate::interval::{Bound, Interval, IntervalError};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
}

/// Operator between the two ends of a range condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `attribute OP value`
    Compare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    /// `low OP attribute OP high`
    Range {
        attribute: String,
        low: Value,
        low_op: RangeOp,
        high_op: RangeOp,
        high: Value,
    },
}

impl Condition {
    pub fn compare(attribute: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Condition::Compare {
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }

    pub fn range(
        low: impl Into<Value>,
        low_op: RangeOp,
        attribute: impl Into<String>,
        high_op: RangeOp,
        high: impl Into<Value>,
    ) -> Self {
        Condition::Range {
            attribute: attribute.into(),
            low: low.into(),
            low_op,
            high_op,
            high: high.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Condition::Compare { attribute, .. } | Condition::Range { attribute, .. } => attribute,
        }
    }

    pub fn to_interval(&self) -> Result<Interval, IntervalError> {
        match self {
            Condition::Compare { op, value, .. } => Ok(match op {
                CompareOp::Eq => Interval::point(value.clone()),
                CompareOp::Lt => Interval::less_than(value.clone()),
                CompareOp::Le => Interval::at_most(value.clone()),
                CompareOp::Gt => Interval::greater_than(value.clone()),
                CompareOp::Ge => Interval::at_least(value.clone()),
            }),
            Condition::Range {
                low,
                low_op,
                high_op,
                high,
                ..
            } => {
                let lower = match low_op {
                    RangeOp::Lt => Bound::Exclusive(low.clone()),
                    RangeOp::Le => Bound::Inclusive(low.clone()),
                };
                let upper = match high_op {
                    RangeOp::Lt => Bound::Exclusive(high.clone()),
                    RangeOp::Le => Bound::Inclusive(high.clone()),
                };
                Interval::new(lower, upper)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequent {
    pub preferred: Condition,
    pub not_preferred: Condition,
}

/// One rule as produced by a front-end, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAst {
    #[serde(default)]
    pub antecedent: Vec<Condition>,
    pub consequent: Consequent,
    #[serde(default)]
    pub indifferent_attributes: Vec<String>,
}

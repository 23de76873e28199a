//! Intervals over the scalar value domain.
//!
//! Each side of an interval is a tagged [`Bound`]. A point interval has
//! both sides `Inclusive` on the same value. Intervals are never empty:
//! [`Interval::new`] rejects bounds that admit no value.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Bound {
    Unbounded,
    Inclusive(Value),
    Exclusive(Value),
}

impl Bound {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Bound::Unbounded => None,
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
        }
    }

    /// Swaps inclusive and exclusive; the complementary edge at the same value.
    fn flipped(&self) -> Bound {
        match self {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Inclusive(v) => Bound::Exclusive(v.clone()),
            Bound::Exclusive(v) => Bound::Inclusive(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("empty interval: lower bound {lower} lies above upper bound {upper}")]
    Inverted { lower: Value, upper: Value },
    #[error("empty interval: half-open point at {value}")]
    HalfOpenPoint { value: Value },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Interval {
    lower: Bound,
    upper: Bound,
}

// ── Bound ordering ─────────────────────────────────────────────

/// Orders lower bounds by how much they admit: unbounded first, and at
/// equal values an inclusive edge starts earlier than an exclusive one.
fn cmp_lower(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        (Bound::Inclusive(x), Bound::Inclusive(y)) | (Bound::Exclusive(x), Bound::Exclusive(y)) => {
            x.cmp(y)
        }
        (Bound::Inclusive(x), Bound::Exclusive(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Exclusive(x), Bound::Inclusive(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

/// Orders upper bounds: unbounded last, and at equal values an exclusive
/// edge ends earlier than an inclusive one.
fn cmp_upper(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        (Bound::Inclusive(x), Bound::Inclusive(y)) | (Bound::Exclusive(x), Bound::Exclusive(y)) => {
            x.cmp(y)
        }
        (Bound::Inclusive(x), Bound::Exclusive(y)) => x.cmp(y).then(Ordering::Greater),
        (Bound::Exclusive(x), Bound::Inclusive(y)) => x.cmp(y).then(Ordering::Less),
    }
}

/// `a` starts strictly after `b`.
pub fn left_after(a: &Interval, b: &Interval) -> bool {
    cmp_lower(&a.lower, &b.lower) == Ordering::Greater
}

/// `a` ends strictly before `b`.
pub fn right_before(a: &Interval, b: &Interval) -> bool {
    cmp_upper(&a.upper, &b.upper) == Ordering::Less
}

/// The upper edge of `a` reaches the lower edge of `b`, i.e. some value
/// is admitted by both edges.
pub fn right_touches_left(a: &Interval, b: &Interval) -> bool {
    match (&a.upper, &b.lower) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
        (Bound::Inclusive(u), Bound::Inclusive(l)) => u >= l,
        (Bound::Inclusive(u), Bound::Exclusive(l))
        | (Bound::Exclusive(u), Bound::Inclusive(l))
        | (Bound::Exclusive(u), Bound::Exclusive(l)) => u > l,
    }
}

// ── Interval ───────────────────────────────────────────────────

impl Interval {
    pub fn new(lower: Bound, upper: Bound) -> Result<Self, IntervalError> {
        if let (Some(l), Some(u)) = (lower.value(), upper.value()) {
            match l.cmp(u) {
                Ordering::Greater => {
                    return Err(IntervalError::Inverted {
                        lower: l.clone(),
                        upper: u.clone(),
                    })
                }
                Ordering::Equal => {
                    if !matches!((&lower, &upper), (Bound::Inclusive(_), Bound::Inclusive(_))) {
                        return Err(IntervalError::HalfOpenPoint { value: l.clone() });
                    }
                }
                Ordering::Less => {}
            }
        }
        Ok(Interval { lower, upper })
    }

    pub fn point(value: impl Into<Value>) -> Self {
        let value = value.into();
        Interval {
            lower: Bound::Inclusive(value.clone()),
            upper: Bound::Inclusive(value),
        }
    }

    pub fn unbounded() -> Self {
        Interval {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn less_than(value: impl Into<Value>) -> Self {
        Interval {
            lower: Bound::Unbounded,
            upper: Bound::Exclusive(value.into()),
        }
    }

    pub fn at_most(value: impl Into<Value>) -> Self {
        Interval {
            lower: Bound::Unbounded,
            upper: Bound::Inclusive(value.into()),
        }
    }

    pub fn greater_than(value: impl Into<Value>) -> Self {
        Interval {
            lower: Bound::Exclusive(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn at_least(value: impl Into<Value>) -> Self {
        Interval {
            lower: Bound::Inclusive(value.into()),
            upper: Bound::Unbounded,
        }
    }

    pub fn lower(&self) -> &Bound {
        &self.lower
    }

    pub fn upper(&self) -> &Bound {
        &self.upper
    }

    pub fn is_point(&self) -> bool {
        self.as_point().is_some()
    }

    pub fn as_point(&self) -> Option<&Value> {
        match (&self.lower, &self.upper) {
            (Bound::Inclusive(l), Bound::Inclusive(u)) if l == u => Some(l),
            _ => None,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Inclusive(l) => value >= l,
            Bound::Exclusive(l) => value > l,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Inclusive(u) => value <= u,
            Bound::Exclusive(u) => value < u,
        };
        above && below
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        right_touches_left(self, other) && right_touches_left(other, self)
    }

    pub fn is_subset_of(&self, other: &Interval) -> bool {
        !left_after(other, self) && !right_before(other, self)
    }

    /// Whether a term held by a tuple or formula meets this interval: the
    /// term is this very interval, or a point inside it.
    pub fn admits(&self, term: &Interval) -> bool {
        self == term || term.as_point().is_some_and(|v| self.contains(v))
    }

    /// Renders the interval as a condition on `attribute`.
    pub fn on<'a>(&'a self, attribute: &'a str) -> Constraint<'a> {
        Constraint {
            attribute,
            interval: self,
        }
    }
}

/// Cuts `target` at the edges of `fixed`.
///
/// Returns the pieces of `target` in the order: the part shared with
/// `fixed`, the part after `fixed`, the part before `fixed`. Returns an
/// empty list when the two do not overlap or `target` already lies
/// within `fixed`.
pub fn split(fixed: &Interval, target: &Interval) -> Vec<Interval> {
    if !fixed.overlaps(target) || target.is_subset_of(fixed) {
        return Vec::new();
    }

    let lower = if left_after(fixed, target) {
        fixed.lower.clone()
    } else {
        target.lower.clone()
    };
    let upper = if right_before(fixed, target) {
        fixed.upper.clone()
    } else {
        target.upper.clone()
    };

    let mut pieces = Vec::with_capacity(3);
    pieces.extend(Interval::new(lower, upper).ok());
    if right_before(fixed, target) {
        pieces.extend(Interval::new(fixed.upper.flipped(), target.upper.clone()).ok());
    }
    if left_after(fixed, target) {
        pieces.extend(Interval::new(target.lower.clone(), fixed.lower.flipped()).ok());
    }
    pieces
}

// ── Display ────────────────────────────────────────────────────

pub struct Constraint<'a> {
    attribute: &'a str,
    interval: &'a Interval,
}

impl fmt::Display for Constraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.attribute;
        if let Some(v) = self.interval.as_point() {
            return write!(f, "{a} = {v}");
        }
        let lower = match &self.interval.lower {
            Bound::Unbounded => None,
            Bound::Inclusive(l) => Some(("<=", ">=", l)),
            Bound::Exclusive(l) => Some(("<", ">", l)),
        };
        let upper = match &self.interval.upper {
            Bound::Unbounded => None,
            Bound::Inclusive(u) => Some(("<=", u)),
            Bound::Exclusive(u) => Some(("<", u)),
        };
        match (lower, upper) {
            (None, None) => write!(f, "{a} = *"),
            (None, Some((op, u))) => write!(f, "{a} {op} {u}"),
            (Some((_, op, l)), None) => write!(f, "{a} {op} {l}"),
            (Some((lop, _, l)), Some((uop, u))) => write!(f, "{l} {lop} {a} {uop} {u}"),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Unbounded => write!(f, "(-inf")?,
            Bound::Inclusive(v) => write!(f, "[{v}")?,
            Bound::Exclusive(v) => write!(f, "({v}")?,
        }
        match &self.upper {
            Bound::Unbounded => write!(f, ", +inf)"),
            Bound::Inclusive(v) => write!(f, ", {v}]"),
            Bound::Exclusive(v) => write!(f, ", {v})"),
        }
    }
}

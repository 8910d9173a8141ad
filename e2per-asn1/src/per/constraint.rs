//! Value and size constraints
//!
//! A constraint bounds an INTEGER value (or the length of a string or list).
//! Bounds may be absent: a constraint with only a lower bound is
//! semi-constrained, one with neither bound is unconstrained. An extensible
//! constraint (`(lb..ub, ...)` in ASN.1) still accepts values outside the root
//! range; those are sent through the extension path.

use e2per_core::{CodecError, CodecResult};
use std::fmt;

/// Numeric or size constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    lower: Option<i64>,
    upper: Option<i64>,
    extensible: bool,
}

/// Where a value falls relative to a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeCheck {
    /// Inside the root range
    Root,
    /// Outside the root range of an extensible constraint
    Extension,
}

impl Constraint {
    /// `(lower..upper)`
    pub const fn range(lower: i64, upper: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            extensible: false,
        }
    }

    /// `(lower..upper, ...)`
    pub const fn extensible(lower: i64, upper: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            extensible: true,
        }
    }

    /// `(SIZE(n))` or `(n)`
    pub const fn fixed(value: i64) -> Self {
        Self::range(value, value)
    }

    /// `(lower..MAX)`
    pub const fn semi(lower: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            extensible: false,
        }
    }

    /// No constraint at all
    pub const fn unconstrained() -> Self {
        Self {
            lower: None,
            upper: None,
            extensible: false,
        }
    }

    pub fn lower(&self) -> Option<i64> {
        self.lower
    }

    pub fn upper(&self) -> Option<i64> {
        self.upper
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Both bounds present
    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Check the constraint is well formed
    pub fn validate(&self) -> CodecResult<()> {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if lower > upper => Err(CodecError::Schema(format!(
                "Constraint lower bound {} exceeds upper bound {}",
                lower, upper
            ))),
            (None, Some(_)) => Err(CodecError::Schema(
                "Constraint with an upper bound but no lower bound".to_string(),
            )),
            (None, None) if self.extensible => Err(CodecError::Schema(
                "Unconstrained type cannot carry an extension marker".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Number of values in the root range, `None` when unbounded
    pub fn range_size(&self) -> Option<u128> {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if upper >= lower => {
                Some((upper as i128 - lower as i128) as u128 + 1)
            }
            _ => None,
        }
    }

    /// Smallest `b` such that `2^b >= upper - lower + 1`
    ///
    /// Returns `None` when either bound is absent: such values need a
    /// length-prefixed encoding instead.
    pub fn minimal_bits(&self) -> Option<usize> {
        self.range_size().map(bits_for_range)
    }

    /// Check if `value` lies inside the root range
    pub fn contains(&self, value: i64) -> bool {
        self.lower.is_none_or(|lower| value >= lower) && self.upper.is_none_or(|upper| value <= upper)
    }

    /// Decide how `value` is encoded under this constraint
    ///
    /// # Errors
    /// `RangeViolation` if the value is outside a non-extensible constraint.
    pub fn check(&self, value: i64) -> CodecResult<RangeCheck> {
        if self.contains(value) {
            Ok(RangeCheck::Root)
        } else if self.extensible {
            Ok(RangeCheck::Extension)
        } else {
            Err(CodecError::RangeViolation {
                value,
                lower: self.lower.unwrap_or(i64::MIN),
                upper: self.upper.unwrap_or(i64::MAX),
            })
        }
    }

    /// Size-constraint flavour of [`Constraint::check`]
    pub fn check_size(&self, length: usize) -> CodecResult<RangeCheck> {
        let value = i64::try_from(length).unwrap_or(i64::MAX);
        self.check(value).map_err(|_| CodecError::SizeViolation {
            length,
            lower: self.lower.unwrap_or(0),
            upper: self.upper.unwrap_or(i64::MAX),
        })
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Some(lower) => write!(f, "({}..", lower)?,
            None => write!(f, "(MIN..")?,
        }
        match self.upper {
            Some(upper) => write!(f, "{}", upper)?,
            None => write!(f, "MAX")?,
        }
        if self.extensible {
            write!(f, ", ...")?;
        }
        write!(f, ")")
    }
}

/// Bits needed to address `range` distinct values
pub(crate) fn bits_for_range(range: u128) -> usize {
    if range <= 1 {
        0
    } else {
        (128 - (range - 1).leading_zeros()) as usize
    }
}

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Mul};

use crate::Error;

#[doc = r#"
An exact fraction with a power-of-two denominator.

A [`Signature`] doubles as a time signature and as a note duration or
position. Keeping durations as fractions rather than floats means positions
never drift, no matter how many are summed.

Two signatures are compared and added after rescaling both to the larger of
their denominators. Since every denominator is a power of two, the smaller
one always divides the larger one exactly.

# Example
```rust
# use melodix::prelude::*;
let half = Signature::new(1, 2)?;
let quarter = Signature::new(1, 4)?;

assert_eq!(half, Signature::new(2, 4)?);
assert!(quarter < half);
assert_eq!(half + quarter, Signature::new(3, 4)?);
# Ok::<(), melodix::Error>(())
```
"#]
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    nominator: u64,
    denominator: u64,
}

impl Signature {
    /// The zero-length signature `0/1`.
    pub const ZERO: Self = Self {
        nominator: 0,
        denominator: 1,
    };

    /// A quarter, `1/4`.
    pub const QUARTER: Self = Self {
        nominator: 1,
        denominator: 4,
    };

    /// Common time, `4/4`.
    pub const COMMON_TIME: Self = Self {
        nominator: 4,
        denominator: 4,
    };

    /// Create a new signature.
    ///
    /// # Errors
    /// [`Error::InvalidSignature`] unless the denominator is a positive
    /// power of two.
    pub fn new(nominator: u64, denominator: u64) -> Result<Self, Error> {
        if !denominator.is_power_of_two() {
            return Err(Error::InvalidSignature {
                nominator,
                denominator,
            });
        }
        Ok(Self {
            nominator,
            denominator,
        })
    }

    /// Returns the nominator.
    pub const fn nominator(&self) -> u64 {
        self.nominator
    }

    /// Returns the denominator.
    pub const fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Returns this signature rescaled to the given denominator.
    ///
    /// The target must be a power of two no smaller than the current
    /// denominator; rescaling only ever scales up.
    ///
    /// # Example
    /// ```rust
    /// # use melodix::prelude::*;
    /// assert_eq!(Signature::new(1, 2)?.to(8)?, Signature::new(4, 8)?);
    /// assert!(Signature::new(1, 8)?.to(2).is_err());
    /// # Ok::<(), melodix::Error>(())
    /// ```
    ///
    /// # Errors
    /// [`Error::InvalidSignature`] if the target is not a power of two,
    /// [`Error::InvalidDenominator`] if it is smaller than the current one.
    pub fn to(self, denominator: u64) -> Result<Self, Error> {
        if !denominator.is_power_of_two() {
            return Err(Error::InvalidSignature {
                nominator: self.nominator,
                denominator,
            });
        }
        if denominator < self.denominator {
            return Err(Error::InvalidDenominator(denominator));
        }
        Ok(self.scaled_to(denominator))
    }

    /// Construct without validation. The denominator must be a power of two.
    pub(crate) const fn from_raw(nominator: u64, denominator: u64) -> Self {
        Self {
            nominator,
            denominator,
        }
    }

    /// Rescale without validation. The target must be a power of two
    /// no smaller than the current denominator.
    pub(crate) const fn scaled_to(self, denominator: u64) -> Self {
        Self {
            nominator: denominator / self.denominator * self.nominator,
            denominator,
        }
    }

    /// Returns the reduced form, halving nominator and denominator while the
    /// nominator is even and the denominator is above one. Idempotent.
    ///
    /// # Example
    /// ```rust
    /// # use melodix::prelude::*;
    /// assert_eq!(Signature::new(2, 4)?.normalized(), Signature::new(1, 2)?);
    /// assert_eq!(Signature::new(16, 4)?.normalized(), Signature::new(4, 1)?);
    /// # Ok::<(), melodix::Error>(())
    /// ```
    pub const fn normalized(self) -> Self {
        let mut n = self.nominator;
        let mut d = self.denominator;
        while n & 1 == 0 && d > 1 {
            n >>= 1;
            d >>= 1;
        }
        Self {
            nominator: n,
            denominator: d,
        }
    }

    /// Nominators of both operands at the common (larger) denominator,
    /// self first.
    const fn to_common_denominator(self, other: Self) -> (u64, u64, u64) {
        let (n1, d1) = (self.nominator, self.denominator);
        let (n2, d2) = (other.nominator, other.denominator);

        if d1 >= d2 {
            (n1, d1 / d2 * n2, d1)
        } else {
            (d2 / d1 * n1, n2, d2)
        }
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        let (n1, n2, _) = self.to_common_denominator(*other);
        n1 == n2
    }
}

impl Eq for Signature {}

impl PartialOrd for Signature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Signature {
    fn cmp(&self, other: &Self) -> Ordering {
        let (n1, n2, _) = self.to_common_denominator(*other);
        n1.cmp(&n2)
    }
}

impl Add for Signature {
    type Output = Signature;

    fn add(self, rhs: Self) -> Self::Output {
        let (n1, n2, d) = self.to_common_denominator(rhs);
        Self {
            nominator: n1 + n2,
            denominator: d,
        }
    }
}

/// Multiplies nominators and denominators independently, without rescaling
/// to a common denominator first. Operands that are not normalized therefore
/// yield a non-normalized product.
impl Mul for Signature {
    type Output = Signature;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            nominator: self.nominator * rhs.nominator,
            denominator: self.denominator * rhs.denominator,
        }
    }
}

impl TryFrom<(u64, u64)> for Signature {
    type Error = Error;

    fn try_from((nominator, denominator): (u64, u64)) -> Result<Self, Error> {
        Self::new(nominator, denominator)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.nominator, self.denominator)
    }
}

#[test]
fn rejects_bad_denominators() {
    assert!(Signature::new(1, 0).is_err());
    assert!(Signature::new(1, 3).is_err());
    assert!(Signature::new(4, 6).is_err());
    assert!(Signature::new(0, 1).is_ok());
    assert!(Signature::new(3, 8).is_ok());
}

#[test]
fn rescales_upward_only() {
    let half = Signature::new(1, 2).unwrap();

    let rescaled = half.to(4).unwrap();
    assert_eq!(rescaled.nominator(), 2);
    assert_eq!(rescaled.denominator(), 4);

    assert_eq!(Signature::new(0, 1).unwrap().to(8).unwrap().nominator(), 0);
    assert_eq!(Signature::new(1, 1).unwrap().to(8).unwrap().nominator(), 8);

    assert!(matches!(half.to(1), Err(Error::InvalidDenominator(1))));
    assert!(matches!(half.to(6), Err(Error::InvalidSignature { .. })));
}

#[test]
fn normalization_is_idempotent() {
    for (n, d) in [(0, 1), (2, 4), (16, 4), (12, 8), (7, 16), (128, 128)] {
        let s = Signature::new(n, d).unwrap();
        assert_eq!(s.normalized(), s);
        assert_eq!(s.normalized().normalized(), s.normalized());
    }

    let n = Signature::new(16, 4).unwrap().normalized();
    assert_eq!((n.nominator(), n.denominator()), (4, 1));
}

#[test]
fn compares_at_common_denominator() {
    let a = Signature::new(1, 2).unwrap();
    let b = Signature::new(2, 4).unwrap();
    let c = Signature::new(3, 4).unwrap();

    assert_eq!(a, b);
    assert!(a < c);
    assert!(c > b);
    assert_eq!([c, a, b].iter().max().unwrap(), &c);
}

#[test]
fn adds_at_common_denominator() {
    let sum = Signature::new(1, 2).unwrap() + Signature::new(1, 8).unwrap();
    assert_eq!((sum.nominator(), sum.denominator()), (5, 8));

    let sum = Signature::ZERO + Signature::new(3, 4).unwrap();
    assert_eq!((sum.nominator(), sum.denominator()), (3, 4));
}

#[test]
fn multiplies_componentwise() {
    let product = Signature::new(2, 4).unwrap() * Signature::new(2, 2).unwrap();
    assert_eq!((product.nominator(), product.denominator()), (4, 8));
}

#[test]
fn displays_as_fraction() {
    assert_eq!(Signature::new(17, 16).unwrap().to_string(), "17/16");
}

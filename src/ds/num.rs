use std::cmp::{Eq, Ord, Ordering, PartialEq, PartialOrd};
use std::fmt;
use Number::*;

/// A JSON numerical value.
///
/// The reader classifies integer literals into the narrowest of `i32`, `i64`, and `u64`, and
/// everything else into `f64`. `Number` keeps that distinction: signed integers are stored as
/// `Int`, unsigned integers beyond `i64::MAX` as `Uint`, and decimals as `Float`. The numbers are
/// canonicalized, so `Eq` and `Ord` compare across variants.
///
/// The number line extends from negative infinity, through zero, to positive infinity. NaN is
/// above positive infinity. All zeroes are treated equally (`-0 == +0`), as well as all NaNs.
///
/// # Examples
/// ```rust
/// # use jsonmap::*;
/// let n = Number::from(100u8);
/// assert_eq!(n, Number::from(100.0f64));
/// assert_eq!(n, Number::from(100i32));
/// assert!(n > Number::from(99.99));
/// assert!(Number::from(u64::MAX) > Number::from(-1));
/// ```
#[derive(Copy, Clone, Debug)]
#[allow(missing_docs)]
pub enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

/// Converting into an integer can fail if the number is outside the integer's valid range, or
/// carries a fractional part.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct IntoIntError;

impl Number {
    /// Represent `Number` as a signed integer.
    ///
    /// # Example
    /// ```rust
    /// # use jsonmap::*;
    /// use jsonmap::ds::IntoIntError;
    ///
    /// assert_eq!(Number::from(100u64).as_i128(), Ok(100));
    /// assert_eq!(Number::from(100.0).as_i128(), Ok(100));
    /// assert_eq!(Number::from(0.5).as_i128(), Err(IntoIntError));
    /// assert_eq!(Number::from(f64::NAN).as_i128(), Err(IntoIntError));
    /// ```
    pub fn as_i128(&self) -> Result<i128, IntoIntError> {
        match *self {
            Int(x) => Ok(x as i128),
            Uint(x) => Ok(x as i128),
            Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1.7e38 {
                    Ok(x as i128)
                } else {
                    Err(IntoIntError)
                }
            }
        }
    }

    /// Represent `Number` as a `T` integer, failing if out of range.
    ///
    /// # Example
    /// ```rust
    /// # use jsonmap::*;
    /// assert_eq!(Number::from(300).to_int::<u16>(), Ok(300));
    /// assert!(Number::from(300).to_int::<u8>().is_err());
    /// ```
    pub fn to_int<T: TryFrom<i128>>(&self) -> Result<T, IntoIntError> {
        self.as_i128()?.try_into().map_err(|_| IntoIntError)
    }

    /// Represent `Number` as a floating point decimal.
    /// Does not fail, but is a lossy conversion for large integers.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Int(x) => x as f64,
            Uint(x) => x as f64,
            Float(x) => x,
        }
    }

    /// Is the number stored as a decimal.
    pub fn is_float(&self) -> bool {
        matches!(self, Float(_))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int(x) => write!(f, "{}", x),
            Uint(x) => write!(f, "{}", x),
            Float(x) => write!(f, "{}", x),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Number) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Number) -> Ordering {
        match (*self, *other) {
            (Float(lhs), Float(rhs)) => cmp_float_to_float(lhs, rhs),
            (Float(lhs), _) => cmp_float_to_int(lhs, wide(other)),
            (_, Float(rhs)) => cmp_float_to_int(rhs, wide(self)).reverse(),
            _ => wide(self).cmp(&wide(other)),
        }
    }
}

macro_rules! partial_impls {
    ( $( $t:ty ),* ) => {
	$(
	impl PartialEq<$t> for Number {
	    fn eq(&self, rhs: &$t) -> bool {
		self.eq(&Number::from(*rhs))
	    }
	}

	impl PartialOrd<$t> for Number {
	    fn partial_cmp(&self, rhs: &$t) -> Option<Ordering> {
		Some(self.cmp(&Number::from(*rhs)))
	    }
	}
	)*
    };
}

partial_impls!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Integers widened to a common container. Only valid for `Int` and `Uint`.
fn wide(n: &Number) -> i128 {
    match *n {
        Int(x) => x as i128,
        Uint(x) => x as i128,
        Float(x) => x as i128,
    }
}

/// `[ -INF | ... | C0 | ... | +INF | CNaN ]`
fn cmp_float_to_float(lhs: f64, rhs: f64) -> Ordering {
    match lhs.partial_cmp(&rhs) {
        Some(ordering) => ordering,
        None => {
            if lhs.is_nan() {
                if rhs.is_nan() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            } else {
                Ordering::Less
            }
        }
    }
}

fn cmp_float_to_int(lhs: f64, rhs: i128) -> Ordering {
    use Ordering::*;

    if lhs.is_sign_negative() && lhs.is_infinite() {
        Less
    } else if lhs.is_infinite() || lhs.is_nan() {
        Greater
    } else {
        let (floor, ceil) = (lhs.floor() as i128, lhs.ceil() as i128);

        match (floor.cmp(&rhs), ceil.cmp(&rhs)) {
            (Equal, Equal) => Equal,
            (Less, _) => Less,
            _ => Greater,
        }
    }
}

macro_rules! fr_int {
	( $variant:ident as $w:ty: $( $t:ty ),* ) => {
		$(
			impl From<$t> for Number {
				fn from(x: $t) -> Self {
					Number::$variant(x as $w)
				}
			}
		)*
	};
}

fr_int!(Int as i64: i8, i16, i32, i64, isize, u8, u16, u32);

impl From<u64> for Number {
    fn from(x: u64) -> Self {
        match i64::try_from(x) {
            Ok(x) => Int(x),
            Err(_) => Uint(x),
        }
    }
}

impl From<f32> for Number {
    fn from(x: f32) -> Self {
        // through the shortest decimal text so 0.1f32 stays 0.1
        Float(x.to_string().parse::<f64>().unwrap_or(x as f64))
    }
}

impl From<f64> for Number {
    fn from(x: f64) -> Self {
        Float(x)
    }
}

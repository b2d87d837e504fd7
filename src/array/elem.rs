//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use ndarray::ArrayD;

use super::Array;
use super::dtype::HasDType;

//--------------------------------------------------------------------------------------------------

/// A single value in the widest representation of its kind.
/// Every element converts to a `Scalar` and back, which is how dtypes are cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
	Bool(bool),
	Int(i128),
	Float(f64),
}

impl std::fmt::Display for Scalar {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(x) => write!(f, "{x}"),
		}
	}
}

pub trait Element:
	HasDType + Copy + PartialEq + PartialOrd + std::fmt::Debug + std::fmt::Display + 'static
{
	fn to_scalar(self) -> Scalar;

	/// Converts like a C cast: integers wrap, floats truncate and saturate,
	/// anything nonzero is `true`.
	fn from_scalar(value: Scalar) -> Self;

	fn wrap(data: ArrayD<Self>) -> Array;
	fn try_ref(array: &Array) -> Option<&ArrayD<Self>>;
	fn try_mut(array: &mut Array) -> Option<&mut ArrayD<Self>>;
}

/// Arithmetic with numpy semantics. Integer arithmetic wraps.
pub trait Numeric: Element {
	fn num_add(a: Self, b: Self) -> Self;
	fn num_sub(a: Self, b: Self) -> Self;
	fn num_mul(a: Self, b: Self) -> Self;

	/// Rounds towards negative infinity. Integer division by zero gives zero.
	fn num_floor_div(a: Self, b: Self) -> Self;

	/// The result has the sign of the divisor. Integer remainder by zero gives zero.
	fn num_rem(a: Self, b: Self) -> Self;

	/// `None` for an integer raised to a negative integer power.
	fn num_pow(a: Self, b: Self) -> Option<Self>;

	fn num_neg(a: Self) -> Self;

	fn num_is_negative(a: Self) -> bool;
}

pub trait Bitwise: Element {
	fn bit_and(a: Self, b: Self) -> Self;
	fn bit_or(a: Self, b: Self) -> Self;
	fn bit_xor(a: Self, b: Self) -> Self;
	fn bit_not(a: Self) -> Self;
}

/// Shift amounts outside `0..BITS` shift everything out.
pub trait Integer: Numeric + Bitwise {
	fn shift_left(a: Self, b: Self) -> Self;
	fn shift_right(a: Self, b: Self) -> Self;
}

pub trait Float: Numeric {
	fn true_div(a: Self, b: Self) -> Self;
}

//--------------------------------------------------------------------------------------------------

macro_rules! impl_element {
	($ty:ty, $variant:ident, |$v:ident| $to:expr, |$s:ident| $from:expr) => {
		impl Element for $ty {
			fn to_scalar(self) -> Scalar {
				let $v = self;
				$to
			}

			fn from_scalar($s: Scalar) -> Self {
				$from
			}

			fn wrap(data: ArrayD<Self>) -> Array {
				Array::$variant(data)
			}

			fn try_ref(array: &Array) -> Option<&ArrayD<Self>> {
				match array {
					Array::$variant(data) => Some(data),
					_ => None,
				}
			}

			fn try_mut(array: &mut Array) -> Option<&mut ArrayD<Self>> {
				match array {
					Array::$variant(data) => Some(data),
					_ => None,
				}
			}
		}
	};
}

macro_rules! impl_int_common {
	($ty:ty, $variant:ident) => {
		impl_element!($ty, $variant, |v| Scalar::Int(i128::from(v)), |s| match s {
			Scalar::Bool(b) => <$ty>::from(b),
			Scalar::Int(i) => i as $ty,
			Scalar::Float(f) => f as $ty,
		});

		impl Bitwise for $ty {
			fn bit_and(a: Self, b: Self) -> Self {
				a & b
			}

			fn bit_or(a: Self, b: Self) -> Self {
				a | b
			}

			fn bit_xor(a: Self, b: Self) -> Self {
				a ^ b
			}

			fn bit_not(a: Self) -> Self {
				!a
			}
		}
	};
}

macro_rules! wrapping_pow {
	($ty:ty, $base:expr, $exp:expr) => {{
		let mut base: $ty = $base;
		let mut exp: u64 = $exp;
		let mut acc: $ty = 1;
		while exp > 0 {
			if exp & 1 == 1 {
				acc = acc.wrapping_mul(base);
			}
			exp >>= 1;
			base = base.wrapping_mul(base);
		}
		acc
	}};
}

macro_rules! impl_signed {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl_int_common!($ty, $variant);

			impl Numeric for $ty {
				fn num_add(a: Self, b: Self) -> Self {
					a.wrapping_add(b)
				}

				fn num_sub(a: Self, b: Self) -> Self {
					a.wrapping_sub(b)
				}

				fn num_mul(a: Self, b: Self) -> Self {
					a.wrapping_mul(b)
				}

				fn num_floor_div(a: Self, b: Self) -> Self {
					if b == 0 {
						return 0;
					}
					let q = a.wrapping_div(b);
					if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q }
				}

				fn num_rem(a: Self, b: Self) -> Self {
					if b == 0 {
						return 0;
					}
					let r = a.wrapping_rem(b);
					if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
				}

				fn num_pow(a: Self, b: Self) -> Option<Self> {
					let exp = u64::try_from(b).ok()?;
					Some(wrapping_pow!($ty, a, exp))
				}

				fn num_neg(a: Self) -> Self {
					a.wrapping_neg()
				}

				fn num_is_negative(a: Self) -> bool {
					a < 0
				}
			}

			impl Integer for $ty {
				fn shift_left(a: Self, b: Self) -> Self {
					match u32::try_from(b) {
						Ok(n) if n < <$ty>::BITS => a << n,
						_ => 0,
					}
				}

				fn shift_right(a: Self, b: Self) -> Self {
					match u32::try_from(b) {
						Ok(n) if n < <$ty>::BITS => a >> n,
						_ => if a < 0 { -1 } else { 0 },
					}
				}
			}
		)*
	};
}

macro_rules! impl_unsigned {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl_int_common!($ty, $variant);

			impl Numeric for $ty {
				fn num_add(a: Self, b: Self) -> Self {
					a.wrapping_add(b)
				}

				fn num_sub(a: Self, b: Self) -> Self {
					a.wrapping_sub(b)
				}

				fn num_mul(a: Self, b: Self) -> Self {
					a.wrapping_mul(b)
				}

				fn num_floor_div(a: Self, b: Self) -> Self {
					if b == 0 { 0 } else { a / b }
				}

				fn num_rem(a: Self, b: Self) -> Self {
					if b == 0 { 0 } else { a % b }
				}

				fn num_pow(a: Self, b: Self) -> Option<Self> {
					Some(wrapping_pow!($ty, a, u64::from(b)))
				}

				fn num_neg(a: Self) -> Self {
					a.wrapping_neg()
				}

				fn num_is_negative(_: Self) -> bool {
					false
				}
			}

			impl Integer for $ty {
				fn shift_left(a: Self, b: Self) -> Self {
					match u32::try_from(b) {
						Ok(n) if n < <$ty>::BITS => a << n,
						_ => 0,
					}
				}

				fn shift_right(a: Self, b: Self) -> Self {
					match u32::try_from(b) {
						Ok(n) if n < <$ty>::BITS => a >> n,
						_ => 0,
					}
				}
			}
		)*
	};
}

macro_rules! impl_float {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl_element!($ty, $variant, |v| Scalar::Float(f64::from(v)), |s| match s {
				Scalar::Bool(b) => <$ty>::from(u8::from(b)),
				Scalar::Int(i) => i as $ty,
				Scalar::Float(f) => f as $ty,
			});

			impl Numeric for $ty {
				fn num_add(a: Self, b: Self) -> Self {
					a + b
				}

				fn num_sub(a: Self, b: Self) -> Self {
					a - b
				}

				fn num_mul(a: Self, b: Self) -> Self {
					a * b
				}

				// Same rounding as numpy's divmod: the quotient is corrected
				// so that `a == b * q + a % b` holds as closely as possible.
				fn num_floor_div(a: Self, b: Self) -> Self {
					if b == 0.0 {
						return a / b;
					}
					let m = a % b;
					let mut div = (a - m) / b;
					if m != 0.0 && ((b < 0.0) != (m < 0.0)) {
						div -= 1.0;
					}
					if div == 0.0 {
						return (0.0 as $ty).copysign(a / b);
					}
					let floor = div.floor();
					if div - floor > 0.5 { floor + 1.0 } else { floor }
				}

				fn num_rem(a: Self, b: Self) -> Self {
					let m = a % b;
					if b == 0.0 {
						return m;
					}
					if m == 0.0 {
						(0.0 as $ty).copysign(b)
					} else if (b < 0.0) != (m < 0.0) {
						m + b
					} else {
						m
					}
				}

				fn num_pow(a: Self, b: Self) -> Option<Self> {
					Some(a.powf(b))
				}

				fn num_neg(a: Self) -> Self {
					-a
				}

				fn num_is_negative(a: Self) -> bool {
					a < 0.0
				}
			}

			impl Float for $ty {
				fn true_div(a: Self, b: Self) -> Self {
					a / b
				}
			}
		)*
	};
}

impl_element!(bool, Bool, |v| Scalar::Bool(v), |s| match s {
	Scalar::Bool(b) => b,
	Scalar::Int(i) => i != 0,
	Scalar::Float(f) => f != 0.0,
});

impl Bitwise for bool {
	fn bit_and(a: Self, b: Self) -> Self {
		a & b
	}

	fn bit_or(a: Self, b: Self) -> Self {
		a | b
	}

	fn bit_xor(a: Self, b: Self) -> Self {
		a ^ b
	}

	fn bit_not(a: Self) -> Self {
		!a
	}
}

impl_signed!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);
impl_unsigned!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);
impl_float!(f32 => F32, f64 => F64);

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------

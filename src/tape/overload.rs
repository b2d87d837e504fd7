//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::ops;

use crate::array::ops::{BinaryOp, FuncOp, UnaryOp};

use super::{Tape, Term};

//--------------------------------------------------------------------------------------------------

macro_rules! impl_binary {
	($($Trait:ident::$method:ident => $op:ident),* $(,)?) => {
		$(
			impl<R: Into<Term>> ops::$Trait<R> for Tape {
				type Output = Tape;

				fn $method(self, rhs: R) -> Tape {
					self.apply_binary(rhs, BinaryOp::$op, false)
				}
			}

			impl<R: Into<Term>> ops::$Trait<R> for &Tape {
				type Output = Tape;

				fn $method(self, rhs: R) -> Tape {
					self.apply_binary(rhs, BinaryOp::$op, false)
				}
			}
		)*
	};
}

impl_binary!(
	Add::add => Add,
	Sub::sub => Sub,
	Mul::mul => Mul,
	Div::div => TrueDiv,
	Rem::rem => Rem,
	BitAnd::bitand => And,
	BitOr::bitor => Or,
	BitXor::bitxor => Xor,
	Shl::shl => Shl,
	Shr::shr => Shr,
);

// `scalar OP tape` records the scalar after the tape and marks the operator as reversed.
// Only `i64` and `f64`, so that unsuffixed literals resolve. Other scalar types go through
// `apply_binary(x, op, true)`.
macro_rules! impl_reflected {
	($($ty:ty),* $(,)?) => {
		$(
			impl_reflected!(@ $ty,
				Add::add => Add,
				Sub::sub => Sub,
				Mul::mul => Mul,
				Div::div => TrueDiv,
				Rem::rem => Rem,
				BitAnd::bitand => And,
				BitOr::bitor => Or,
				BitXor::bitxor => Xor,
				Shl::shl => Shl,
				Shr::shr => Shr,
			);
		)*
	};
	(@ $ty:ty, $($Trait:ident::$method:ident => $op:ident),* $(,)?) => {
		$(
			impl ops::$Trait<Tape> for $ty {
				type Output = Tape;

				fn $method(self, rhs: Tape) -> Tape {
					rhs.apply_binary(self, BinaryOp::$op, true)
				}
			}

			impl ops::$Trait<&Tape> for $ty {
				type Output = Tape;

				fn $method(self, rhs: &Tape) -> Tape {
					rhs.apply_binary(self, BinaryOp::$op, true)
				}
			}
		)*
	};
}

impl_reflected!(i64, f64);

impl ops::Neg for Tape {
	type Output = Tape;

	fn neg(self) -> Tape {
		self.apply_unary(UnaryOp::Neg)
	}
}

impl ops::Neg for &Tape {
	type Output = Tape;

	fn neg(self) -> Tape {
		self.apply_unary(UnaryOp::Neg)
	}
}

/// Bitwise inversion, `~` in numpy.
impl ops::Not for Tape {
	type Output = Tape;

	fn not(self) -> Tape {
		self.apply_unary(UnaryOp::Invert)
	}
}

impl ops::Not for &Tape {
	type Output = Tape;

	fn not(self) -> Tape {
		self.apply_unary(UnaryOp::Invert)
	}
}

//--------------------------------------------------------------------------------------------------

/// Operators that have no `std::ops` trait.
impl Tape {
	pub fn pow(&self, exponent: impl Into<Term>) -> Tape {
		self.apply_binary(exponent, BinaryOp::Pow, false)
	}

	/// `base ** self`
	pub fn rpow(&self, base: impl Into<Term>) -> Tape {
		self.apply_binary(base, BinaryOp::Pow, true)
	}

	pub fn floor_div(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::FloorDiv, false)
	}

	/// `other // self`
	pub fn rfloor_div(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::FloorDiv, true)
	}

	pub fn equal(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Eq, false)
	}

	pub fn not_equal(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Ne, false)
	}

	pub fn lt(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Lt, false)
	}

	pub fn le(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Le, false)
	}

	pub fn gt(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Gt, false)
	}

	pub fn ge(&self, other: impl Into<Term>) -> Tape {
		self.apply_binary(other, BinaryOp::Ge, false)
	}

	pub fn pos(&self) -> Tape {
		self.apply_unary(UnaryOp::Pos)
	}

	pub fn abs(&self) -> Tape {
		self.apply_func(FuncOp::Abs)
	}

	pub fn to_bool(&self) -> Tape {
		self.apply_func(FuncOp::Bool)
	}
}

//--------------------------------------------------------------------------------------------------

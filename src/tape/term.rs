//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use ndarray::Dimension;

use crate::array::Array;

use super::Tape;

//--------------------------------------------------------------------------------------------------

/// The right-hand side of a recorded operation: another tape or a constant.
#[derive(Clone, Debug)]
pub enum Term {
	Tape(Tape),
	Value(Array),
}

impl From<Tape> for Term {
	fn from(tape: Tape) -> Self {
		Self::Tape(tape)
	}
}

impl From<&Tape> for Term {
	fn from(tape: &Tape) -> Self {
		Self::Tape(tape.clone())
	}
}

impl From<Array> for Term {
	fn from(value: Array) -> Self {
		Self::Value(value)
	}
}

impl From<&Array> for Term {
	fn from(value: &Array) -> Self {
		Self::Value(value.clone())
	}
}

macro_rules! impl_term_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Term {
				fn from(value: $ty) -> Self {
					Self::Value(Array::from(value))
				}
			}

			impl From<Vec<$ty>> for Term {
				fn from(values: Vec<$ty>) -> Self {
					Self::Value(Array::from(values))
				}
			}

			impl<D: Dimension> From<ndarray::Array<$ty, D>> for Term {
				fn from(data: ndarray::Array<$ty, D>) -> Self {
					Self::Value(Array::from_ndarray(data))
				}
			}
		)*
	};
}

impl_term_from!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

//--------------------------------------------------------------------------------------------------

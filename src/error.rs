//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ShapeMismatchError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnsupportedDTypeError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnknownDTypeError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnknownOpError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UnknownCastingError;

/// Errors surfaced by `evaluate()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TapeError {
	/// The tape contains an operation that has no implementation, e.g. `abs()`.
	NotImplemented,

	/// Operand shapes cannot be broadcast together.
	ShapeMismatch,

	/// The operation is not defined for the operand dtypes, e.g. `<<` on floats.
	UnsupportedDType,

	/// The operation is defined for the dtypes but not for some of the values,
	/// e.g. an integer raised to a negative integer power.
	InvalidValue,

	/// The tape references a tape that was recorded in a different `Forest`.
	ForeignTape,
}

/// Reasons why a result cannot be written into an operand's buffer.
///
/// These never reach the caller. The evaluator allocates a fresh buffer instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InPlaceError {
	/// The buffer dtype differs from the dtype of the result.
	KindMismatch,

	/// The buffer shape differs from the broadcast shape of the result.
	ShapeMismatch,

	/// The buffer is shared with a value that must stay intact.
	Aliased,

	/// The operation itself would fail. The fresh path reports the real error.
	Invalid,
}

//--------------------------------------------------------------------------------------------------

impl From<ShapeMismatchError> for TapeError {
	fn from(_: ShapeMismatchError) -> Self {
		Self::ShapeMismatch
	}
}

impl From<ShapeMismatchError> for ErrPack<TapeError> {
	#[cold]
	#[inline(never)]
	fn from(_: ShapeMismatchError) -> Self {
		Self {
			code: TapeError::ShapeMismatch,
			extra: None,
		}
	}
}

impl From<UnsupportedDTypeError> for ErrPack<TapeError> {
	#[cold]
	#[inline(never)]
	fn from(_: UnsupportedDTypeError) -> Self {
		Self {
			code: TapeError::UnsupportedDType,
			extra: None,
		}
	}
}

impl From<ErrPack<TapeError>> for InPlaceError {
	fn from(err: ErrPack<TapeError>) -> Self {
		match err.code {
			TapeError::ShapeMismatch => Self::ShapeMismatch,
			TapeError::UnsupportedDType => Self::KindMismatch,
			_ => Self::Invalid,
		}
	}
}

impl From<ShapeMismatchError> for InPlaceError {
	fn from(_: ShapeMismatchError) -> Self {
		Self::ShapeMismatch
	}
}

impl std::fmt::Display for InPlaceError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let reason = match self {
			Self::KindMismatch => "buffer dtype does not match the result dtype",
			Self::ShapeMismatch => "buffer shape does not match the result shape",
			Self::Aliased => "buffer is shared",
			Self::Invalid => "operation failed",
		};
		write!(f, "{reason}")
	}
}

//--------------------------------------------------------------------------------------------------

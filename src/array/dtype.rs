//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::error::{UnknownCastingError, UnknownDTypeError};
use crate::util::cold_path;

//--------------------------------------------------------------------------------------------------

pub trait HasDType {
	const dtype: DType;
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DType {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	F32,
	F64,
}

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DTypeKind {
	Bool,
	Int,
	Uint,
	Float,
}

macro_rules! impl_has_dtype {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl HasDType for $ty {
				const dtype: DType = DType::$variant;
			}
		)*
	};
}

impl_has_dtype!(
	bool => Bool,
	i8 => I8,
	i16 => I16,
	i32 => I32,
	i64 => I64,
	u8 => U8,
	u16 => U16,
	u32 => U32,
	u64 => U64,
	f32 => F32,
	f64 => F64,
);

impl DType {
	pub const ALL: [Self; 11] = [
		Self::Bool,
		Self::I8,
		Self::I16,
		Self::I32,
		Self::I64,
		Self::U8,
		Self::U16,
		Self::U32,
		Self::U64,
		Self::F32,
		Self::F64,
	];

	pub fn kind(self) -> DTypeKind {
		match self {
			Self::Bool => DTypeKind::Bool,
			Self::I8 | Self::I16 | Self::I32 | Self::I64 => DTypeKind::Int,
			Self::U8 | Self::U16 | Self::U32 | Self::U64 => DTypeKind::Uint,
			Self::F32 | Self::F64 => DTypeKind::Float,
		}
	}

	pub fn bits(self) -> usize {
		match self {
			Self::Bool | Self::I8 | Self::U8 => 8,
			Self::I16 | Self::U16 => 16,
			Self::I32 | Self::U32 | Self::F32 => 32,
			Self::I64 | Self::U64 | Self::F64 => 64,
		}
	}

	pub fn is_float(self) -> bool {
		self.kind() == DTypeKind::Float
	}

	pub fn is_integer(self) -> bool {
		matches!(self.kind(), DTypeKind::Int | DTypeKind::Uint)
	}

	pub fn is_bool(self) -> bool {
		self == Self::Bool
	}

	/// Ordering used by value-based casting: bool < integer < float.
	/// Signed and unsigned integers share a category.
	pub fn category(self) -> u8 {
		match self.kind() {
			DTypeKind::Bool => 0,
			DTypeKind::Int | DTypeKind::Uint => 1,
			DTypeKind::Float => 2,
		}
	}

	pub fn from_kind_bits(kind: DTypeKind, bits: usize) -> Option<Self> {
		match (kind, bits) {
			(DTypeKind::Bool, 8) => Some(Self::Bool),
			(DTypeKind::Int, 8) => Some(Self::I8),
			(DTypeKind::Int, 16) => Some(Self::I16),
			(DTypeKind::Int, 32) => Some(Self::I32),
			(DTypeKind::Int, 64) => Some(Self::I64),
			(DTypeKind::Uint, 8) => Some(Self::U8),
			(DTypeKind::Uint, 16) => Some(Self::U16),
			(DTypeKind::Uint, 32) => Some(Self::U32),
			(DTypeKind::Uint, 64) => Some(Self::U64),
			(DTypeKind::Float, 32) => Some(Self::F32),
			(DTypeKind::Float, 64) => Some(Self::F64),
			_ => None,
		}
	}

	/// Smallest unsigned dtype that holds `value`.
	pub fn min_uint(value: u128) -> Self {
		if value <= u128::from(u8::MAX) {
			Self::U8
		} else if value <= u128::from(u16::MAX) {
			Self::U16
		} else if value <= u128::from(u32::MAX) {
			Self::U32
		} else {
			Self::U64
		}
	}

	/// Smallest signed dtype that holds the negative `value`.
	pub fn min_int(value: i128) -> Self {
		if value >= i128::from(i8::MIN) {
			Self::I8
		} else if value >= i128::from(i16::MIN) {
			Self::I16
		} else if value >= i128::from(i32::MIN) {
			Self::I32
		} else {
			Self::I64
		}
	}

	/// Smallest float dtype whose range covers `value`. Only the range is checked,
	/// so `0.1` fits into `f32` even though it rounds.
	pub fn min_float(value: f64) -> Self {
		if !value.is_finite() || value.abs() <= f64::from(f32::MAX) {
			Self::F32
		} else {
			Self::F64
		}
	}
}

impl std::fmt::Display for DType {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let name = match self {
			Self::Bool => "bool",
			Self::I8 => "i8",
			Self::I16 => "i16",
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::U8 => "u8",
			Self::U16 => "u16",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
		};
		write!(f, "{name}")
	}
}

impl std::str::FromStr for DType {
	type Err = UnknownDTypeError;

	fn from_str(s: &str) -> Result<Self, UnknownDTypeError> {
		match s {
			"bool" => Ok(Self::Bool),
			"i8" | "int8" => Ok(Self::I8),
			"i16" | "int16" => Ok(Self::I16),
			"i32" | "int32" => Ok(Self::I32),
			"i64" | "int64" => Ok(Self::I64),
			"u8" | "uint8" => Ok(Self::U8),
			"u16" | "uint16" => Ok(Self::U16),
			"u32" | "uint32" => Ok(Self::U32),
			"u64" | "uint64" => Ok(Self::U64),
			"f32" | "float32" => Ok(Self::F32),
			"f64" | "float64" => Ok(Self::F64),
			_ => {
				cold_path();
				Err(UnknownDTypeError)
			},
		}
	}
}

//--------------------------------------------------------------------------------------------------

/// Casting rules, with the same meaning as numpy's `casting=` argument.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Casting {
	/// Only identical dtypes.
	No,
	/// Identical dtypes. There are no byte orders, so this is the same as `No`.
	Equiv,
	/// Only casts that preserve every value.
	#[default]
	Safe,
	/// Safe casts and casts within a kind, e.g. `f64` to `f32`.
	SameKind,
	/// Anything goes.
	Unsafe,
}

impl std::str::FromStr for Casting {
	type Err = UnknownCastingError;

	fn from_str(s: &str) -> Result<Self, UnknownCastingError> {
		match s {
			"no" => Ok(Self::No),
			"equiv" => Ok(Self::Equiv),
			"safe" => Ok(Self::Safe),
			"same_kind" => Ok(Self::SameKind),
			"unsafe" => Ok(Self::Unsafe),
			_ => {
				cold_path();
				Err(UnknownCastingError)
			},
		}
	}
}

impl std::fmt::Display for Casting {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let name = match self {
			Self::No => "no",
			Self::Equiv => "equiv",
			Self::Safe => "safe",
			Self::SameKind => "same_kind",
			Self::Unsafe => "unsafe",
		};
		write!(f, "{name}")
	}
}

fn can_cast_safe(from: DType, to: DType) -> bool {
	if from == to {
		return true;
	}
	match (from.kind(), to.kind()) {
		(DTypeKind::Bool, _) => true,
		(_, DTypeKind::Bool) => false,
		(DTypeKind::Int, DTypeKind::Int) | (DTypeKind::Uint, DTypeKind::Uint) => {
			to.bits() >= from.bits()
		},
		(DTypeKind::Uint, DTypeKind::Int) => to.bits() > from.bits(),
		(DTypeKind::Int, DTypeKind::Uint) => false,
		// f32 has a 24-bit mantissa
		(DTypeKind::Int | DTypeKind::Uint, DTypeKind::Float) => {
			to.bits() == 64 || from.bits() <= 16
		},
		(DTypeKind::Float, DTypeKind::Float) => to.bits() >= from.bits(),
		(DTypeKind::Float, _) => false,
	}
}

pub fn can_cast(from: DType, to: DType, casting: Casting) -> bool {
	match casting {
		Casting::No | Casting::Equiv => from == to,
		Casting::Safe => can_cast_safe(from, to),
		Casting::SameKind => {
			can_cast_safe(from, to)
				|| (from.category() == to.category()
					&& !(from.kind() == DTypeKind::Int && to.kind() == DTypeKind::Uint))
		},
		Casting::Unsafe => true,
	}
}

/// The smallest dtype both `a` and `b` can be safely cast to.
///
/// Like numpy, mixing `u64` with a signed integer has no integer answer and gives `f64`.
pub fn promote_types(a: DType, b: DType) -> DType {
	if a == b {
		return a;
	}
	let wider = |x: DType, y: DType| if x.bits() >= y.bits() { x } else { y };
	match (a.kind(), b.kind()) {
		(DTypeKind::Bool, _) => b,
		(_, DTypeKind::Bool) => a,
		(DTypeKind::Int, DTypeKind::Int)
		| (DTypeKind::Uint, DTypeKind::Uint)
		| (DTypeKind::Float, DTypeKind::Float) => wider(a, b),
		(DTypeKind::Int, DTypeKind::Uint) | (DTypeKind::Uint, DTypeKind::Int) => {
			let (int, uint) = if a.kind() == DTypeKind::Int { (a, b) } else { (b, a) };
			if int.bits() > uint.bits() {
				int
			} else {
				DType::from_kind_bits(DTypeKind::Int, uint.bits() * 2).unwrap_or(DType::F64)
			}
		},
		(DTypeKind::Float, _) | (_, DTypeKind::Float) => {
			let (float, int) = if a.is_float() { (a, b) } else { (b, a) };
			if float == DType::F64 || int.bits() <= 16 { float } else { DType::F64 }
		},
	}
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------

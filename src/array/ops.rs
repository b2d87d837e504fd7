//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::error::{UnknownOpError, UnsupportedDTypeError};
use crate::util::cold_path;

use super::dtype::DType;

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	TrueDiv,
	FloorDiv,
	Rem,
	Pow,
	Eq,
	Ne,
	Lt,
	Le,
	Ge,
	Gt,
	Shl,
	Shr,
	And,
	Or,
	Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Neg,
	Invert,
	Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncOp {
	Abs,
	Bool,
}

/// The concrete element loop chosen for a binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loop {
	/// The operation that is actually executed. For booleans, `+` runs as `|` and `*` as `&`.
	pub op: BinaryOp,

	/// Both operands are cast to this dtype before the loop runs.
	pub dtype: DType,

	/// Dtype of the result.
	pub out: DType,
}

//--------------------------------------------------------------------------------------------------

// (op, symbol, name, has reflected form)
const BINARY_TABLE: [(BinaryOp, &str, &str, bool); 18] = [
	(BinaryOp::Add, "+", "add", true),
	(BinaryOp::Sub, "-", "sub", true),
	(BinaryOp::Mul, "*", "mul", true),
	(BinaryOp::TrueDiv, "/", "truediv", true),
	(BinaryOp::FloorDiv, "//", "floordiv", true),
	(BinaryOp::Rem, "%", "mod", true),
	(BinaryOp::Pow, "**", "pow", true),
	(BinaryOp::Eq, "==", "eq", false),
	(BinaryOp::Ne, "!=", "ne", false),
	(BinaryOp::Lt, "<", "lt", false),
	(BinaryOp::Le, "<=", "le", false),
	(BinaryOp::Ge, ">=", "ge", false),
	(BinaryOp::Gt, ">", "gt", false),
	(BinaryOp::Shl, "<<", "lshift", true),
	(BinaryOp::Shr, ">>", "rshift", true),
	(BinaryOp::And, "&", "and", true),
	(BinaryOp::Or, "|", "or", true),
	(BinaryOp::Xor, "^", "xor", true),
];

impl BinaryOp {
	pub const ALL: [Self; 18] = [
		Self::Add,
		Self::Sub,
		Self::Mul,
		Self::TrueDiv,
		Self::FloorDiv,
		Self::Rem,
		Self::Pow,
		Self::Eq,
		Self::Ne,
		Self::Lt,
		Self::Le,
		Self::Ge,
		Self::Gt,
		Self::Shl,
		Self::Shr,
		Self::And,
		Self::Or,
		Self::Xor,
	];

	fn entry(self) -> (BinaryOp, &'static str, &'static str, bool) {
		BINARY_TABLE[self as usize]
	}

	pub fn symbol(self) -> &'static str {
		self.entry().1
	}

	pub fn name(self) -> &'static str {
		self.entry().2
	}

	/// Whether a `scalar OP tape` form exists. Comparisons are mirrored instead of reflected.
	pub fn has_reflected(self) -> bool {
		self.entry().3
	}

	pub fn is_comparison(self) -> bool {
		matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Ge | Self::Gt)
	}

	/// Picks the element loop for operands promoted to `common`.
	pub fn resolve(self, common: DType) -> Result<Loop, UnsupportedDTypeError> {
		let same = |op: Self, dtype: DType| -> Result<Loop, UnsupportedDTypeError> {
			Ok(Loop { op, dtype, out: dtype })
		};
		match self {
			Self::Add if common.is_bool() => same(Self::Or, DType::Bool),
			Self::Mul if common.is_bool() => same(Self::And, DType::Bool),
			Self::Sub if common.is_bool() => {
				cold_path();
				Err(UnsupportedDTypeError)
			},
			Self::Add | Self::Sub | Self::Mul => same(self, common),
			Self::TrueDiv => same(self, if common.is_float() { common } else { DType::F64 }),
			Self::FloorDiv | Self::Rem | Self::Pow => {
				same(self, if common.is_bool() { DType::I8 } else { common })
			},
			Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Ge | Self::Gt => {
				Ok(Loop { op: self, dtype: common, out: DType::Bool })
			},
			Self::And | Self::Or | Self::Xor | Self::Shl | Self::Shr if common.is_float() => {
				cold_path();
				Err(UnsupportedDTypeError)
			},
			Self::And | Self::Or | Self::Xor => same(self, common),
			Self::Shl | Self::Shr => same(self, if common.is_bool() { DType::I8 } else { common }),
		}
	}
}

impl std::fmt::Display for BinaryOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

impl std::str::FromStr for BinaryOp {
	type Err = UnknownOpError;

	/// Accepts a symbol (`"//"`) or an operator name (`"floordiv"`).
	fn from_str(s: &str) -> Result<Self, UnknownOpError> {
		BINARY_TABLE
			.iter()
			.find(|(_, symbol, name, _)| *symbol == s || *name == s)
			.map(|(op, ..)| *op)
			.ok_or(UnknownOpError)
	}
}

//--------------------------------------------------------------------------------------------------

impl UnaryOp {
	pub const ALL: [Self; 3] = [Self::Neg, Self::Invert, Self::Pos];

	pub fn symbol(self) -> &'static str {
		match self {
			Self::Neg => "-",
			Self::Invert => "~",
			Self::Pos => "+",
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Neg => "neg",
			Self::Invert => "invert",
			Self::Pos => "pos",
		}
	}

	/// The result dtype is always the operand dtype.
	pub fn resolve(self, dtype: DType) -> Result<DType, UnsupportedDTypeError> {
		let supported = match self {
			Self::Neg | Self::Pos => !dtype.is_bool(),
			Self::Invert => !dtype.is_float(),
		};
		if supported {
			Ok(dtype)
		} else {
			cold_path();
			Err(UnsupportedDTypeError)
		}
	}
}

impl std::fmt::Display for UnaryOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

impl std::str::FromStr for UnaryOp {
	type Err = UnknownOpError;

	fn from_str(s: &str) -> Result<Self, UnknownOpError> {
		match s {
			"-" | "neg" => Ok(Self::Neg),
			"~" | "inv" | "invert" => Ok(Self::Invert),
			"+" | "pos" => Ok(Self::Pos),
			_ => {
				cold_path();
				Err(UnknownOpError)
			},
		}
	}
}

//--------------------------------------------------------------------------------------------------

impl FuncOp {
	pub fn name(self) -> &'static str {
		match self {
			Self::Abs => "abs",
			Self::Bool => "bool",
		}
	}
}

impl std::fmt::Display for FuncOp {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{}()", self.name())
	}
}

impl std::str::FromStr for FuncOp {
	type Err = UnknownOpError;

	fn from_str(s: &str) -> Result<Self, UnknownOpError> {
		match s {
			"abs" => Ok(Self::Abs),
			"bool" => Ok(Self::Bool),
			_ => {
				cold_path();
				Err(UnknownOpError)
			},
		}
	}
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------

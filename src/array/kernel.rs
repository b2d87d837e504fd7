//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use ndarray::Zip;

use crate::ErrPack;
use crate::error::{InPlaceError, ShapeMismatchError, TapeError};
use crate::shape::{broadcast_shapes, shape_to_str};
use crate::util::cold_path;

use super::elem::{Bitwise, Element, Float, Integer, Numeric, Scalar};
use super::ops::{BinaryOp, Loop, UnaryOp};
use super::{
	Array, dispatch_bitwise, dispatch_float, dispatch_integer, dispatch_numeric, map_array,
	result_type, with_dtype,
};

//--------------------------------------------------------------------------------------------------

fn arith_fn<T: Numeric>(op: BinaryOp) -> fn(T, T) -> T {
	match op {
		BinaryOp::Add => T::num_add,
		BinaryOp::Sub => T::num_sub,
		BinaryOp::Mul => T::num_mul,
		BinaryOp::FloorDiv => T::num_floor_div,
		BinaryOp::Rem => T::num_rem,
		_ => checked_pow::<T>,
	}
}

// negative integer exponents are rejected by `check_values()` before any loop runs
fn checked_pow<T: Numeric>(a: T, b: T) -> T {
	T::num_pow(a, b).unwrap_or(a)
}

fn compare_fn<T: Element>(op: BinaryOp) -> fn(T, T) -> bool {
	match op {
		BinaryOp::Eq => |a, b| a == b,
		BinaryOp::Ne => |a, b| a != b,
		BinaryOp::Lt => |a, b| a < b,
		BinaryOp::Le => |a, b| a <= b,
		BinaryOp::Ge => |a, b| a >= b,
		_ => |a, b| a > b,
	}
}

fn bitwise_fn<T: Bitwise>(op: BinaryOp) -> fn(T, T) -> T {
	match op {
		BinaryOp::And => T::bit_and,
		BinaryOp::Or => T::bit_or,
		_ => T::bit_xor,
	}
}

fn shift_fn<T: Integer>(op: BinaryOp) -> fn(T, T) -> T {
	match op {
		BinaryOp::Shl => T::shift_left,
		_ => T::shift_right,
	}
}

/// Runs `$body` with `$T` bound to the loop dtype and `$f` to the element function.
///
/// `compare` lists the dtypes for which comparison loops are instantiated. In-place
/// kernels only need `bool`, because a comparison result can only be stored in a `bool` buffer.
macro_rules! with_loop {
	(
		$lp:expr, $T:ident, $f:ident => $body:expr,
		compare [$($cv:ident: $ct:ty),* $(,)?],
		else $fallback:expr
	) => {{
		let lp: Loop = $lp;
		match lp.op {
			BinaryOp::Add
			| BinaryOp::Sub
			| BinaryOp::Mul
			| BinaryOp::FloorDiv
			| BinaryOp::Rem
			| BinaryOp::Pow => dispatch_numeric!(lp.dtype, $T => {
				let $f = arith_fn::<$T>(lp.op);
				$body
			}, else $fallback),
			BinaryOp::TrueDiv => dispatch_float!(lp.dtype, $T => {
				let $f: fn($T, $T) -> $T = <$T as Float>::true_div;
				$body
			}, else $fallback),
			BinaryOp::Eq
			| BinaryOp::Ne
			| BinaryOp::Lt
			| BinaryOp::Le
			| BinaryOp::Ge
			| BinaryOp::Gt => with_dtype!(lp.dtype, $T => {
				let $f = compare_fn::<$T>(lp.op);
				$body
			}, [$($cv: $ct),*], else $fallback),
			BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => dispatch_bitwise!(lp.dtype, $T => {
				let $f = bitwise_fn::<$T>(lp.op);
				$body
			}, else $fallback),
			BinaryOp::Shl | BinaryOp::Shr => dispatch_integer!(lp.dtype, $T => {
				let $f = shift_fn::<$T>(lp.op);
				$body
			}, else $fallback),
		}
	}};
}

//--------------------------------------------------------------------------------------------------

#[cold]
#[inline(never)]
fn unsupported_binary(op: BinaryOp, a: &Array, b: &Array) -> ErrPack<TapeError> {
	ErrPack::new(
		TapeError::UnsupportedDType,
		format!("operator `{op}` is not supported for dtypes {} and {}", a.dtype(), b.dtype()),
	)
}

#[cold]
#[inline(never)]
fn unsupported_unary(op: UnaryOp, a: &Array) -> ErrPack<TapeError> {
	ErrPack::new(
		TapeError::UnsupportedDType,
		format!("operator `{op}` is not supported for dtype {}", a.dtype()),
	)
}

#[cold]
#[inline(never)]
fn shape_mismatch(a: &Array, b: &Array) -> ErrPack<TapeError> {
	ErrPack::new(
		TapeError::ShapeMismatch,
		format!(
			"operands could not be broadcast together with shapes {} {}",
			shape_to_str(a.shape()),
			shape_to_str(b.shape())
		),
	)
}

fn resolve(op: BinaryOp, a: &Array, b: &Array) -> Result<Loop, ErrPack<TapeError>> {
	op.resolve(result_type(a, b)).map_err(|_| unsupported_binary(op, a, b))
}

/// Rejects inputs that the element loops cannot handle. Runs before anything is written.
fn check_values(lp: Loop, exponent: &Array) -> Result<(), ErrPack<TapeError>> {
	if lp.op == BinaryOp::Pow && lp.dtype.is_integer() {
		let negative = map_array!(exponent, data => {
			data.iter().any(|v| matches!(v.to_scalar(), Scalar::Int(i) if i < 0))
		});
		if negative {
			cold_path();
			return Err(ErrPack::new(
				TapeError::InvalidValue,
				"integers to negative integer powers are not allowed",
			));
		}
	}
	Ok(())
}

fn fresh<T: Element, O: Element>(
	a: &Array,
	b: &Array,
	shape: &[usize],
	f: fn(T, T) -> O,
) -> Result<Array, ErrPack<TapeError>> {
	let a = a.cast_to::<T>();
	let b = b.cast_to::<T>();
	let (Some(a), Some(b)) = (a.broadcast(shape), b.broadcast(shape)) else {
		cold_path();
		return Err(ShapeMismatchError.into());
	};
	Ok(O::wrap(Zip::from(&a).and(&b).map_collect(|&x, &y| f(x, y))))
}

/// Computes `a OP b` into a newly allocated array.
pub fn binary(op: BinaryOp, a: &Array, b: &Array) -> Result<Array, ErrPack<TapeError>> {
	let lp = resolve(op, a, b)?;
	let shape = broadcast_shapes(a.shape(), b.shape()).map_err(|_| shape_mismatch(a, b))?;
	check_values(lp, b)?;
	with_loop!(
		lp, T, f => fresh::<T, _>(a, b, &shape, f),
		compare [
			Bool: bool, I8: i8, I16: i16, I32: i32, I64: i64,
			U8: u8, U16: u16, U32: u32, U64: u64, F32: f32, F64: f64,
		],
		else Err(unsupported_binary(op, a, b))
	)
}

//--------------------------------------------------------------------------------------------------

/// Checks that the result of `a OP b` can be stored in `buffer` without any conversion.
fn in_place_loop(op: BinaryOp, a: &Array, b: &Array, buffer: &Array) -> Result<Loop, InPlaceError> {
	let lp = resolve(op, a, b)?;
	if lp.dtype != lp.out || buffer.dtype() != lp.out {
		return Err(InPlaceError::KindMismatch);
	}
	let shape = broadcast_shapes(a.shape(), b.shape())?;
	if shape.as_slice() != buffer.shape() {
		return Err(InPlaceError::ShapeMismatch);
	}
	Ok(lp)
}

fn into_left<T: Element>(a: &mut Array, b: &Array, f: fn(T, T) -> T) -> Result<(), InPlaceError> {
	let out = T::try_mut(a).ok_or(InPlaceError::KindMismatch)?;
	let b = b.cast_to::<T>();
	let b = b.broadcast(out.raw_dim()).ok_or(InPlaceError::ShapeMismatch)?;
	Zip::from(out).and(&b).for_each(|o, &y| *o = f(*o, y));
	Ok(())
}

fn into_right<T: Element>(a: &Array, b: &mut Array, f: fn(T, T) -> T) -> Result<(), InPlaceError> {
	let out = T::try_mut(b).ok_or(InPlaceError::KindMismatch)?;
	let a = a.cast_to::<T>();
	let a = a.broadcast(out.raw_dim()).ok_or(InPlaceError::ShapeMismatch)?;
	Zip::from(out).and(&a).for_each(|o, &x| *o = f(x, *o));
	Ok(())
}

/// Computes `a OP b` and stores the result in `a`.
///
/// On error, `a` is left untouched.
pub fn binary_into_left(op: BinaryOp, a: &mut Array, b: &Array) -> Result<(), InPlaceError> {
	let lp = in_place_loop(op, &*a, b, &*a)?;
	check_values(lp, b)?;
	with_loop!(
		lp, T, f => into_left::<T>(a, b, f),
		compare [Bool: bool],
		else Err(InPlaceError::KindMismatch)
	)
}

/// Computes `a OP b` and stores the result in `b`.
///
/// On error, `b` is left untouched.
pub fn binary_into_right(op: BinaryOp, a: &Array, b: &mut Array) -> Result<(), InPlaceError> {
	let lp = in_place_loop(op, a, &*b, &*b)?;
	check_values(lp, b)?;
	with_loop!(
		lp, T, f => into_right::<T>(a, b, f),
		compare [Bool: bool],
		else Err(InPlaceError::KindMismatch)
	)
}

//--------------------------------------------------------------------------------------------------

/// Computes `OP a` into a newly allocated array.
pub fn unary(op: UnaryOp, a: &Array) -> Result<Array, ErrPack<TapeError>> {
	let dtype = op.resolve(a.dtype()).map_err(|_| unsupported_unary(op, a))?;
	match op {
		UnaryOp::Neg => dispatch_numeric!(dtype, T => {
			Ok(T::wrap(a.cast_to::<T>().mapv(<T as Numeric>::num_neg)))
		}, else Err(unsupported_unary(op, a))),
		UnaryOp::Invert => dispatch_bitwise!(dtype, T => {
			Ok(T::wrap(a.cast_to::<T>().mapv(<T as Bitwise>::bit_not)))
		}, else Err(unsupported_unary(op, a))),
		UnaryOp::Pos => Ok(a.clone()),
	}
}

fn map_in_place<T: Element>(a: &mut Array, f: fn(T) -> T) -> Result<(), InPlaceError> {
	T::try_mut(a).ok_or(InPlaceError::KindMismatch)?.mapv_inplace(f);
	Ok(())
}

/// Computes `OP a` and stores the result in `a`.
pub fn unary_in_place(op: UnaryOp, a: &mut Array) -> Result<(), InPlaceError> {
	let dtype = op.resolve(a.dtype()).map_err(|_| InPlaceError::KindMismatch)?;
	match op {
		UnaryOp::Neg => dispatch_numeric!(dtype, T => {
			map_in_place::<T>(a, <T as Numeric>::num_neg)
		}, else Err(InPlaceError::KindMismatch)),
		UnaryOp::Invert => dispatch_bitwise!(dtype, T => {
			map_in_place::<T>(a, <T as Bitwise>::bit_not)
		}, else Err(InPlaceError::KindMismatch)),
		UnaryOp::Pos => Ok(()),
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::array::dtype::DType;

	#[test]
	fn test_binary_broadcast() {
		let a = Array::from(ndarray::array![[1_i64], [2]]);
		let b = Array::from(vec![10_i64, 20, 30]);
		let c = binary(BinaryOp::Add, &a, &b).unwrap();
		assert_eq!(c.shape(), &[2, 3]);
		assert_eq!(c.to_vec::<i64>(), vec![11, 21, 31, 12, 22, 32]);
	}

	#[test]
	fn test_binary_result_dtypes() {
		let a = Array::from(vec![1_i64, 2, 3]);
		let two = Array::from(2_i64);
		let div = binary(BinaryOp::TrueDiv, &a, &two).unwrap();
		assert_eq!(div.dtype(), DType::F64);
		assert_eq!(div.to_vec::<f64>(), vec![0.5, 1.0, 1.5]);
		let lt = binary(BinaryOp::Lt, &a, &two).unwrap();
		assert_eq!(lt.to_vec::<bool>(), vec![true, false, false]);
		let t = Array::from(vec![true, false]);
		let f = Array::from(vec![true, true]);
		let sum = binary(BinaryOp::Add, &t, &f).unwrap();
		assert_eq!(sum.dtype(), DType::Bool);
		assert_eq!(sum.to_vec::<bool>(), vec![true, true]);
		let small = Array::from(vec![200_u8]);
		let wrapped = binary(BinaryOp::Add, &small, &Array::from(100_i64)).unwrap();
		assert_eq!(wrapped.dtype(), DType::U8);
		assert_eq!(wrapped.to_vec::<u8>(), vec![44]);
	}

	#[test]
	fn test_binary_errors() {
		let a = Array::from(vec![1_i64, 2, 3]);
		let err = binary(BinaryOp::Pow, &a, &Array::from(-1_i64)).unwrap_err();
		assert_eq!(err.code, TapeError::InvalidValue);
		let err = binary(BinaryOp::Shl, &Array::from(vec![1.0_f64]), &a).unwrap_err();
		assert_eq!(err.code, TapeError::UnsupportedDType);
		let err = binary(BinaryOp::Add, &a, &Array::from(vec![1_i64, 2])).unwrap_err();
		assert_eq!(err.code, TapeError::ShapeMismatch);
		assert!(err.message().contains("[3] [2]"));
	}

	#[test]
	fn test_into_left() {
		let mut a = Array::from(vec![1_i64, 2, 3]);
		binary_into_left(BinaryOp::Mul, &mut a, &Array::from(3_i64)).unwrap();
		assert_eq!(a.to_vec::<i64>(), vec![3, 6, 9]);
		binary_into_left(BinaryOp::Sub, &mut a, &Array::from(vec![1_i64, 1, 1])).unwrap();
		assert_eq!(a.to_vec::<i64>(), vec![2, 5, 8]);
	}

	#[test]
	fn test_into_right() {
		let mut b = Array::from(vec![1_i64, 2, 3]);
		binary_into_right(BinaryOp::Sub, &Array::from(10_i64), &mut b).unwrap();
		assert_eq!(b.to_vec::<i64>(), vec![9, 8, 7]);
	}

	#[test]
	fn test_in_place_rejections() {
		let mut a = Array::from(vec![1_i32, 2, 3]);
		let r = binary_into_left(BinaryOp::Add, &mut a, &Array::from(0.5_f64));
		assert_eq!(r, Err(InPlaceError::KindMismatch));
		let r = binary_into_left(BinaryOp::Lt, &mut a, &Array::from(2_i64));
		assert_eq!(r, Err(InPlaceError::KindMismatch));
		let mut s = Array::from(1_i32);
		let r = binary_into_left(BinaryOp::Add, &mut s, &a);
		assert_eq!(r, Err(InPlaceError::ShapeMismatch));
		let r = binary_into_left(BinaryOp::Pow, &mut a, &Array::from(vec![1_i32, -1, 1]));
		assert_eq!(r, Err(InPlaceError::Invalid));
		assert_eq!(a.to_vec::<i32>(), vec![1, 2, 3]);
	}

	#[test]
	fn test_unary() {
		let a = Array::from(vec![1_i64, -2]);
		assert_eq!(unary(UnaryOp::Neg, &a).unwrap().to_vec::<i64>(), vec![-1, 2]);
		assert_eq!(unary(UnaryOp::Invert, &a).unwrap().to_vec::<i64>(), vec![-2, 1]);
		let b = Array::from(vec![true, false]);
		assert_eq!(unary(UnaryOp::Invert, &b).unwrap().to_vec::<bool>(), vec![false, true]);
		assert_eq!(unary(UnaryOp::Neg, &b).unwrap_err().code, TapeError::UnsupportedDType);
		let f = Array::from(vec![1.5_f64]);
		assert_eq!(unary(UnaryOp::Invert, &f).unwrap_err().code, TapeError::UnsupportedDType);

		let mut m = Array::from(vec![3_u8]);
		unary_in_place(UnaryOp::Neg, &mut m).unwrap();
		assert_eq!(m.to_vec::<u8>(), vec![253]);
	}
}

//--------------------------------------------------------------------------------------------------

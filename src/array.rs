//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::borrow::Cow;

use ndarray::{ArrayD, Dimension, IxDyn, Zip};

use crate::shape::broadcast_shapes;

pub mod dtype;
pub mod elem;
pub mod kernel;
pub mod ops;

use dtype::{DType, promote_types};
pub use elem::Element;
use elem::Scalar;

//--------------------------------------------------------------------------------------------------

/// Runs `$body` with `$T` bound to the element type of `$dtype`.
/// Dtypes missing from the list run `$fallback`.
macro_rules! with_dtype {
	($dtype:expr, $T:ident => $body:expr, [$($variant:ident: $ty:ty),* $(,)?], else $fallback:expr) => {{
		#[allow(unreachable_patterns)]
		let result = match $dtype {
			$(
				$crate::array::dtype::DType::$variant => {
					type $T = $ty;
					$body
				},
			)*
			_ => $fallback,
		};
		result
	}};
}

macro_rules! dispatch_all {
	($dtype:expr, $T:ident => $body:expr) => {
		$crate::array::with_dtype!(
			$dtype, $T => $body,
			[
				Bool: bool, I8: i8, I16: i16, I32: i32, I64: i64,
				U8: u8, U16: u16, U32: u32, U64: u64, F32: f32, F64: f64,
			],
			else unreachable!()
		)
	};
}

macro_rules! dispatch_numeric {
	($dtype:expr, $T:ident => $body:expr, else $fallback:expr) => {
		$crate::array::with_dtype!(
			$dtype, $T => $body,
			[I8: i8, I16: i16, I32: i32, I64: i64, U8: u8, U16: u16, U32: u32, U64: u64, F32: f32, F64: f64],
			else $fallback
		)
	};
}

macro_rules! dispatch_integer {
	($dtype:expr, $T:ident => $body:expr, else $fallback:expr) => {
		$crate::array::with_dtype!(
			$dtype, $T => $body,
			[I8: i8, I16: i16, I32: i32, I64: i64, U8: u8, U16: u16, U32: u32, U64: u64],
			else $fallback
		)
	};
}

macro_rules! dispatch_bitwise {
	($dtype:expr, $T:ident => $body:expr, else $fallback:expr) => {
		$crate::array::with_dtype!(
			$dtype, $T => $body,
			[Bool: bool, I8: i8, I16: i16, I32: i32, I64: i64, U8: u8, U16: u16, U32: u32, U64: u64],
			else $fallback
		)
	};
}

macro_rules! dispatch_float {
	($dtype:expr, $T:ident => $body:expr, else $fallback:expr) => {
		$crate::array::with_dtype!($dtype, $T => $body, [F32: f32, F64: f64], else $fallback)
	};
}

/// Runs `$body` with `$data` bound to the typed `ndarray` inside `$array`.
macro_rules! map_array {
	($array:expr, $data:ident => $body:expr) => {
		match $array {
			$crate::array::Array::Bool($data) => $body,
			$crate::array::Array::I8($data) => $body,
			$crate::array::Array::I16($data) => $body,
			$crate::array::Array::I32($data) => $body,
			$crate::array::Array::I64($data) => $body,
			$crate::array::Array::U8($data) => $body,
			$crate::array::Array::U16($data) => $body,
			$crate::array::Array::U32($data) => $body,
			$crate::array::Array::U64($data) => $body,
			$crate::array::Array::F32($data) => $body,
			$crate::array::Array::F64($data) => $body,
		}
	};
}

pub(crate) use {dispatch_bitwise, dispatch_float, dispatch_integer, dispatch_numeric, map_array, with_dtype};

//--------------------------------------------------------------------------------------------------

/// An n-dimensional array whose dtype is only known at runtime.
///
/// A 0-dimensional array is how scalars are represented.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
	Bool(ArrayD<bool>),
	I8(ArrayD<i8>),
	I16(ArrayD<i16>),
	I32(ArrayD<i32>),
	I64(ArrayD<i64>),
	U8(ArrayD<u8>),
	U16(ArrayD<u16>),
	U32(ArrayD<u32>),
	U64(ArrayD<u64>),
	F32(ArrayD<f32>),
	F64(ArrayD<f64>),
}

impl Array {
	pub fn scalar<T: Element>(value: T) -> Self {
		T::wrap(ArrayD::from_elem(IxDyn(&[]), value))
	}

	pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
		T::wrap(ndarray::Array1::from(values).into_dyn())
	}

	pub fn from_ndarray<T: Element, D: Dimension>(data: ndarray::Array<T, D>) -> Self {
		T::wrap(data.into_dyn())
	}

	pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
		dispatch_all!(dtype, T => T::wrap(ArrayD::from_elem(shape, T::from_scalar(Scalar::Int(0)))))
	}

	pub fn dtype(&self) -> DType {
		match self {
			Self::Bool(_) => DType::Bool,
			Self::I8(_) => DType::I8,
			Self::I16(_) => DType::I16,
			Self::I32(_) => DType::I32,
			Self::I64(_) => DType::I64,
			Self::U8(_) => DType::U8,
			Self::U16(_) => DType::U16,
			Self::U32(_) => DType::U32,
			Self::U64(_) => DType::U64,
			Self::F32(_) => DType::F32,
			Self::F64(_) => DType::F64,
		}
	}

	pub fn shape(&self) -> &[usize] {
		map_array!(self, data => data.shape())
	}

	pub fn ndim(&self) -> usize {
		map_array!(self, data => data.ndim())
	}

	pub fn len(&self) -> usize {
		map_array!(self, data => data.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
		T::try_ref(self)
	}

	/// Borrows the data if it already has dtype `T`, converts otherwise.
	pub fn cast_to<T: Element>(&self) -> Cow<'_, ArrayD<T>> {
		if let Some(data) = T::try_ref(self) {
			return Cow::Borrowed(data);
		}
		Cow::Owned(map_array!(self, data => data.mapv(|v| T::from_scalar(v.to_scalar()))))
	}

	/// Converts to `dtype` like numpy's `astype(casting='unsafe')`.
	pub fn cast(&self, dtype: DType) -> Self {
		dispatch_all!(dtype, T => T::wrap(self.cast_to::<T>().into_owned()))
	}

	/// Elements in logical (row-major) order, converted to `T`.
	pub fn to_vec<T: Element>(&self) -> Vec<T> {
		self.cast_to::<T>().iter().copied().collect()
	}

	/// The single element of a 0-dimensional array.
	pub fn scalar_value(&self) -> Option<Scalar> {
		if self.ndim() != 0 {
			return None;
		}
		map_array!(self, data => data.iter().next().map(|v| v.to_scalar()))
	}

	/// The smallest dtype that holds this value, numpy's `min_scalar_type`.
	///
	/// Arrays with at least one dimension report their own dtype.
	/// For a 0-dimensional array the value decides: non-negative integers map to the
	/// smallest unsigned dtype, negative ones to the smallest signed dtype, floats to `f32`
	/// unless they are out of its range.
	pub fn min_scalar_type(&self) -> DType {
		match self.scalar_value() {
			None => self.dtype(),
			Some(Scalar::Bool(_)) => DType::Bool,
			Some(Scalar::Int(i)) => match u128::try_from(i) {
				Ok(u) => DType::min_uint(u),
				Err(_) => DType::min_int(i),
			},
			Some(Scalar::Float(f)) => DType::min_float(f),
		}
	}

	/// Same shape and equal elements after promotion. NaNs compare equal.
	pub fn array_equal(&self, other: &Self) -> bool {
		if self.shape() != other.shape() {
			return false;
		}
		let dtype = promote_types(self.dtype(), other.dtype());
		let a = self.cast(dtype);
		let b = other.cast(dtype);
		if dtype.is_float() {
			let (a, b) = (a.cast_to::<f64>(), b.cast_to::<f64>());
			return Zip::from(&*a).and(&*b).all(|&x, &y| x == y || (x.is_nan() && y.is_nan()));
		}
		a == b
	}

	/// numpy's `allclose`: `|a - b| <= atol + rtol * |b|` for every broadcast element pair.
	pub fn allclose(&self, other: &Self, rtol: f64, atol: f64, equal_nan: bool) -> bool {
		let Ok(shape) = broadcast_shapes(self.shape(), other.shape()) else {
			return false;
		};
		let a = self.cast_to::<f64>();
		let b = other.cast_to::<f64>();
		let (Some(a), Some(b)) = (a.broadcast(&shape[..]), b.broadcast(&shape[..])) else {
			return false;
		};
		Zip::from(&a).and(&b).all(|&x, &y| {
			if x.is_nan() || y.is_nan() {
				equal_nan && x.is_nan() && y.is_nan()
			} else if x.is_infinite() || y.is_infinite() {
				x == y
			} else {
				(x - y).abs() <= atol + rtol * y.abs()
			}
		})
	}
}

/// Result dtype of a binary operation on `a` and `b`.
///
/// Follows numpy's value-based casting: when a 0-dimensional operand meets an array of the
/// same or a higher category (bool < integer < float), the scalar only contributes its
/// `min_scalar_type`. So `i32 array + 2` stays `i32`, while `i32 array + 2.5` becomes `f64`.
pub fn result_type(a: &Array, b: &Array) -> DType {
	let a_scalar = a.ndim() == 0;
	let b_scalar = b.ndim() == 0;
	if a_scalar == b_scalar {
		return promote_types(a.dtype(), b.dtype());
	}
	let (scalar, array) = if a_scalar { (a, b) } else { (b, a) };
	if scalar.dtype().category() > array.dtype().category() {
		promote_types(a.dtype(), b.dtype())
	} else {
		promote_types(array.dtype(), scalar.min_scalar_type())
	}
}

impl std::fmt::Display for Array {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		map_array!(self, data => write!(f, "{data}"))
	}
}

//--------------------------------------------------------------------------------------------------

macro_rules! impl_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Array {
				fn from(value: $ty) -> Self {
					Self::scalar(value)
				}
			}

			impl From<Vec<$ty>> for Array {
				fn from(values: Vec<$ty>) -> Self {
					Self::from_vec(values)
				}
			}

			impl From<&[$ty]> for Array {
				fn from(values: &[$ty]) -> Self {
					Self::from_vec(values.to_vec())
				}
			}

			impl<D: Dimension> From<ndarray::Array<$ty, D>> for Array {
				fn from(data: ndarray::Array<$ty, D>) -> Self {
					Self::from_ndarray(data)
				}
			}
		)*
	};
}

impl_from!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_construction() {
		let a = Array::from(vec![1_i64, 2, 3]);
		assert_eq!(a.dtype(), DType::I64);
		assert_eq!(a.shape(), &[3]);
		let s = Array::from(2.5_f64);
		assert_eq!(s.ndim(), 0);
		assert_eq!(s.scalar_value(), Some(Scalar::Float(2.5)));
		let m = Array::from(ndarray::array![[1_u8, 2], [3, 4]]);
		assert_eq!(m.shape(), &[2, 2]);
		assert_eq!(m.to_vec::<u8>(), vec![1, 2, 3, 4]);
		assert_eq!(Array::zeros(DType::F32, &[2]).to_vec::<f32>(), vec![0.0, 0.0]);
	}

	#[test]
	fn test_min_scalar_type() {
		assert_eq!(Array::from(2_i64).min_scalar_type(), DType::U8);
		assert_eq!(Array::from(300_i32).min_scalar_type(), DType::U16);
		assert_eq!(Array::from(-1_i64).min_scalar_type(), DType::I8);
		assert_eq!(Array::from(-40000_i64).min_scalar_type(), DType::I32);
		assert_eq!(Array::from(2.5_f64).min_scalar_type(), DType::F32);
		assert_eq!(Array::from(true).min_scalar_type(), DType::Bool);
		assert_eq!(Array::from(vec![1_i64]).min_scalar_type(), DType::I64);
	}

	#[test]
	fn test_result_type() {
		let ints = Array::from(vec![1_i32, 2]);
		let bytes = Array::from(vec![1_u8, 2]);
		assert_eq!(result_type(&ints, &Array::from(2_i64)), DType::I32);
		assert_eq!(result_type(&ints, &Array::from(2.5_f64)), DType::F64);
		assert_eq!(result_type(&bytes, &Array::from(-1_i64)), DType::I16);
		assert_eq!(result_type(&bytes, &Array::from(1000_i64)), DType::U16);
		assert_eq!(result_type(&ints, &bytes), DType::I32);
		assert_eq!(result_type(&Array::from(1_i32), &Array::from(1_i64)), DType::I64);
	}

	#[test]
	fn test_cast() {
		let a = Array::from(vec![1.7_f64, -2.2]);
		assert_eq!(a.cast(DType::I64).to_vec::<i64>(), vec![1, -2]);
		assert!(matches!(a.cast_to::<f64>(), Cow::Borrowed(_)));
		assert_eq!(a.cast(DType::Bool).to_vec::<bool>(), vec![true, true]);
	}

	#[test]
	fn test_equality_helpers() {
		let a = Array::from(vec![1.0_f64, f64::NAN]);
		let b = Array::from(vec![1.0_f32, f32::NAN]);
		assert!(a.array_equal(&b));
		assert!(a.allclose(&b, 1e-5, 1e-8, true));
		assert!(!a.allclose(&b, 1e-5, 1e-8, false));
		let i = Array::from(vec![1_i64, 2]);
		assert!(i.array_equal(&Array::from(vec![1_u8, 2])));
		assert!(!i.array_equal(&Array::from(vec![1_i64, 2, 3])));
		assert!(Array::from(vec![2.0_f64, 2.0]).allclose(&Array::from(2_i64), 0.0, 0.0, false));
	}
}

//--------------------------------------------------------------------------------------------------

//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use smallvec::SmallVec;

use crate::error::ShapeMismatchError;
use crate::util::cold_path;

//--------------------------------------------------------------------------------------------------

pub const INLINE_DIMS: usize = 4;

pub type ShapeVec = SmallVec<[usize; INLINE_DIMS]>;

/// Standard broadcasting: shapes are aligned at the trailing dimension,
/// missing leading dimensions count as 1 and a dimension of size 1 stretches
/// to match the other operand.
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<ShapeVec, ShapeMismatchError> {
	let len = a.len().max(b.len());
	let skip_a = len - a.len();
	let skip_b = len - b.len();
	let mut result = ShapeVec::with_capacity(len);
	for d in 0..len {
		let dim_a = if d < skip_a { 1 } else { a[d - skip_a] };
		let dim_b = if d < skip_b { 1 } else { b[d - skip_b] };
		let dim = if dim_a == dim_b || dim_b == 1 {
			dim_a
		} else if dim_a == 1 {
			dim_b
		} else {
			cold_path();
			return Err(ShapeMismatchError);
		};
		result.push(dim);
	}
	Ok(result)
}

pub fn shape_to_str(shape: &[usize]) -> String {
	let mut result = String::from("[");
	for (i, &dim) in shape.iter().enumerate() {
		if i > 0 {
			result.push_str(", ");
		}
		result.push_str(&dim.to_string());
	}
	result.push(']');
	result
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------

//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use assert_approx_eq::assert_approx_eq;

use crate::{Array, DType, ErrPack, EvalOptions, EvalStats, Forest, TapeError};

//--------------------------------------------------------------------------------------------------

fn arange(start: i64) -> Vec<i64> {
	(start..start + 4).collect()
}

#[test]
fn test_squares_and_doubles() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let a = forest.leaf(arange(0));
	let expr = &a + a.pow(2) + &a * 2;
	let (result, stats) = expr.evaluate_with(EvalOptions::default())?;
	assert_eq!(result.dtype(), DType::I64);
	assert_eq!(result.to_vec::<i64>(), vec![0, 4, 10, 18]);

	// `a**2` and `a*2` need new buffers, both additions reuse them
	assert_eq!(stats, EvalStats { in_place: 2, allocated: 2, fallbacks: 0, nested: 2 });
	assert_eq!(a.data().unwrap().to_vec::<i64>(), arange(0));
	Ok(())
}

#[test]
fn test_two_leaves() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let a = forest.leaf(arange(0));
	let b = forest.leaf(arange(1));
	let (first, stats) = (&a * 2 + &b).evaluate_with(EvalOptions::default())?;
	assert_eq!(first.to_vec::<i64>(), vec![1, 4, 7, 10]);
	assert_eq!(stats.allocated, 1);
	assert_eq!(stats.in_place, 1);

	let second = (2 * &a + &b).evaluate()?;
	let third = (&a * 2 + 1 * &b).evaluate()?;
	assert!(second.array_equal(&first));
	assert!(third.array_equal(&first));
	assert_eq!(a.data().unwrap().to_vec::<i64>(), arange(0));
	assert_eq!(b.data().unwrap().to_vec::<i64>(), arange(1));
	Ok(())
}

#[test]
fn test_reflected_constants() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let o = forest.leaf(arange(1));
	assert_eq!((1 + &o).evaluate()?.to_vec::<i64>(), vec![2, 3, 4, 5]);

	let (result, stats) = (1 + (2 * &o)).evaluate_with(EvalOptions::default())?;
	assert_eq!(result.to_vec::<i64>(), vec![3, 5, 7, 9]);
	assert_eq!(stats.allocated, 1);
	assert_eq!(stats.in_place, 1);
	Ok(())
}

#[test]
fn test_tape_used_twice() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let t = forest.leaf(arange(0));
	let (result, stats) = (&t + &t).evaluate_with(EvalOptions::default())?;
	assert_eq!(result.to_vec::<i64>(), vec![0, 2, 4, 6]);
	assert_eq!(t.data().unwrap().to_vec::<i64>(), arange(0));

	// the second operand is the leaf's own buffer and must not be written
	assert_eq!(stats.in_place, 0);
	assert_eq!(stats.allocated, 1);
	assert_eq!(stats.fallbacks, 1);

	let u = &t * 3;
	let v = &t + &u + &u;
	assert_eq!(u.refcount(), 2);
	let (result, stats) = v.evaluate_with(EvalOptions::default())?;
	assert_eq!(result.to_vec::<i64>(), vec![0, 7, 14, 21]);
	assert_eq!(stats, EvalStats { in_place: 1, allocated: 3, fallbacks: 0, nested: 2 });
	assert_eq!(u.evaluate()?.to_vec::<i64>(), vec![0, 3, 6, 9]);
	assert_eq!(t.data().unwrap().to_vec::<i64>(), arange(0));
	Ok(())
}

#[test]
fn test_integer_division_is_float() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let a = forest.leaf(vec![1_i64, 2, 3, 4]);
	let b = forest.leaf(vec![2_i32, 4, 4, 3]);
	let result = (&a / &b).evaluate()?;
	assert_eq!(result.dtype(), DType::F64);
	let values = result.to_vec::<f64>();
	for (value, expected) in values.iter().zip([0.5, 0.5, 0.75, 4.0 / 3.0]) {
		assert_approx_eq!(*value, expected);
	}
	assert!(result.allclose(&Array::from(vec![0.5, 0.5, 0.75, 1.333_333_333]), 1e-6, 0.0, false));
	Ok(())
}

//--------------------------------------------------------------------------------------------------

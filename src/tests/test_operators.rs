//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use assert_approx_eq::assert_approx_eq;

use crate::array::kernel;
use crate::tests::eager::{assert_same, input};
use crate::{Array, BinaryOp, DType, ErrPack, Forest, Tape, TapeEntry, TapeError, UnaryOp};

//--------------------------------------------------------------------------------------------------

fn check_binary(tape: &Tape, expected: Result<Array, ErrPack<TapeError>>, what: &str) {
	match (tape.evaluate(), expected) {
		(Ok(result), Ok(expected)) => assert_same(&result, &expected, what),
		(Err(err), Err(expected)) => assert_eq!(err.code, expected.code, "{what}"),
		(result, expected) => panic!("{what}: {result:?} vs {expected:?}"),
	}
}

#[test]
fn test_single_ops_with_constant() {
	let one = Array::from(1_i64);
	for op in BinaryOp::ALL {
		let forest = Forest::new();
		let a = forest.leaf(input(0));
		check_binary(
			&a.apply_binary(one.clone(), op, false),
			kernel::binary(op, &input(0), &one),
			&format!("a {op} 1"),
		);
		check_binary(
			&a.apply_binary(one.clone(), op, true),
			kernel::binary(op, &one, &input(0)),
			&format!("1 {op} a"),
		);
		assert!(a.data().unwrap().array_equal(&input(0)));
	}
}

#[test]
fn test_single_ops_between_tapes() {
	for op in BinaryOp::ALL {
		let forest = Forest::new();
		let a = forest.leaf(input(0));
		let b = forest.leaf(input(1));
		check_binary(&b.apply_binary(&a, op, false), kernel::binary(op, &input(1), &input(0)), &format!("b {op} a"));
		check_binary(&b.apply_binary(&a, op, true), kernel::binary(op, &input(0), &input(1)), &format!("a {op} b"));
	}
}

#[test]
fn test_single_ops_on_floats() {
	let a_data = Array::from(vec![0.5_f64, -1.5, 2.0, 3.25]);
	let b_data = Array::from(vec![2.0_f32, 0.5, -4.0, 1.0]);
	for op in BinaryOp::ALL {
		let forest = Forest::new();
		let a = forest.leaf(a_data.clone());
		let b = forest.leaf(b_data.clone());
		let tape = (&a * 1).apply_binary(&b, op, false);
		check_binary(&tape, kernel::binary(op, &a_data, &b_data), &format!("a*1 {op} b"));
	}
}

#[test]
fn test_overloads_record_the_right_ops() {
	let forest = Forest::new();
	let a = forest.leaf(input(0));
	let cases: Vec<(Tape, TapeEntry)> = vec![
		(&a + 1, TapeEntry::Binary(BinaryOp::Add)),
		(&a - 1, TapeEntry::Binary(BinaryOp::Sub)),
		(&a * 1, TapeEntry::Binary(BinaryOp::Mul)),
		(&a / 1, TapeEntry::Binary(BinaryOp::TrueDiv)),
		(&a % 1, TapeEntry::Binary(BinaryOp::Rem)),
		(&a & 1, TapeEntry::Binary(BinaryOp::And)),
		(&a | 1, TapeEntry::Binary(BinaryOp::Or)),
		(&a ^ 1, TapeEntry::Binary(BinaryOp::Xor)),
		(&a << 1, TapeEntry::Binary(BinaryOp::Shl)),
		(&a >> 1, TapeEntry::Binary(BinaryOp::Shr)),
		(a.pow(1), TapeEntry::Binary(BinaryOp::Pow)),
		(a.floor_div(1), TapeEntry::Binary(BinaryOp::FloorDiv)),
		(a.equal(1), TapeEntry::Binary(BinaryOp::Eq)),
		(a.not_equal(1), TapeEntry::Binary(BinaryOp::Ne)),
		(a.lt(1), TapeEntry::Binary(BinaryOp::Lt)),
		(a.le(1), TapeEntry::Binary(BinaryOp::Le)),
		(a.gt(1), TapeEntry::Binary(BinaryOp::Gt)),
		(a.ge(1), TapeEntry::Binary(BinaryOp::Ge)),
		(1 - &a, TapeEntry::BinaryReversed(BinaryOp::Sub)),
		(1.5 / &a, TapeEntry::BinaryReversed(BinaryOp::TrueDiv)),
		(3_i64 << &a, TapeEntry::BinaryReversed(BinaryOp::Shl)),
		(a.rpow(2), TapeEntry::BinaryReversed(BinaryOp::Pow)),
		(a.rfloor_div(2), TapeEntry::BinaryReversed(BinaryOp::FloorDiv)),
		(-&a, TapeEntry::Unary(UnaryOp::Neg)),
		(!&a, TapeEntry::Unary(UnaryOp::Invert)),
		(a.pos(), TapeEntry::Unary(UnaryOp::Pos)),
	];
	for (tape, expected) in cases {
		let entries = tape.entries();
		let last = entries.last().unwrap();
		assert_eq!(format!("{last:?}"), format!("{expected:?}"), "{tape}");
	}
}

#[test]
fn test_reflected_subtraction() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let t = forest.leaf(input(0));
	let result = (1 - &t).evaluate()?;
	let expected = kernel::binary(BinaryOp::Sub, &Array::from(1_i64), &t.data().unwrap())?;
	assert_same(&result, &expected, "1 - t");
	assert_eq!(result.to_vec::<i64>(), vec![0, -1, -2, -3]);

	let result = (10 - (&t * 2)).evaluate()?;
	assert_eq!(result.to_vec::<i64>(), vec![8, 6, 4, 2]);
	let result = t.rpow(2).evaluate()?;
	assert_eq!(result.to_vec::<i64>(), vec![2, 4, 8, 16]);
	let result = t.rfloor_div(7).evaluate()?;
	assert_eq!(result.to_vec::<i64>(), vec![7, 3, 2, 1]);
	Ok(())
}

#[test]
fn test_unary_ops() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let t = forest.leaf(vec![1_i64, -2, 3]);
	assert_eq!((-&t).evaluate()?.to_vec::<i64>(), vec![-1, 2, -3]);
	assert_eq!((!&t).evaluate()?.to_vec::<i64>(), vec![-2, 1, -4]);
	assert_eq!(t.pos().evaluate()?.to_vec::<i64>(), vec![1, -2, 3]);
	assert_eq!((-(&t * 2)).evaluate()?.to_vec::<i64>(), vec![-2, 4, -6]);
	assert_eq!((-(-(&t + 1))).evaluate()?.to_vec::<i64>(), vec![2, -1, 4]);
	assert!(t.data().unwrap().array_equal(&Array::from(vec![1_i64, -2, 3])));

	let flags = forest.leaf(vec![true, false]);
	assert_eq!((!&flags).evaluate()?.to_vec::<bool>(), vec![false, true]);
	assert_eq!((-&flags).evaluate().unwrap_err().code, TapeError::UnsupportedDType);
	Ok(())
}

#[test]
fn test_reflected_literals() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let t = forest.leaf(input(0));

	// unsuffixed literals resolve to the i64 and f64 impls
	let result = (1 + &t).evaluate()?;
	assert_eq!(result.dtype(), DType::I64);
	assert_eq!(result.to_vec::<i64>(), vec![2, 3, 4, 5]);
	let result = (0.5 * &t).evaluate()?;
	assert_eq!(result.dtype(), DType::F64);
	assert_eq!(result.to_vec::<f64>(), vec![0.5, 1.0, 1.5, 2.0]);
	assert_eq!((2 << (&t - 1)).evaluate()?.to_vec::<i64>(), vec![2, 4, 8, 16]);

	// other scalar types are recorded explicitly
	let small = forest.leaf(vec![1_u8, 2, 3]);
	let result = small.apply_binary(10_u8, BinaryOp::Sub, true).evaluate()?;
	assert_eq!(result.dtype(), DType::U8);
	assert_eq!(result.to_vec::<u8>(), vec![9, 8, 7]);
	Ok(())
}

#[test]
fn test_promotion() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let a = forest.leaf(vec![1_i64, 2, 3]);
	let b = forest.leaf(vec![2_i64, 2, 2]);

	let div = (&a / &b).evaluate()?;
	assert_eq!(div.dtype(), DType::F64);
	let div = div.to_vec::<f64>();
	assert_approx_eq!(div[0], 0.5);
	assert_approx_eq!(div[1], 1.0);
	assert_approx_eq!(div[2], 1.5);

	let pow = a.pow(&b).evaluate()?;
	assert_eq!(pow.dtype(), DType::I64);
	assert_eq!(pow.to_vec::<i64>(), vec![1, 4, 9]);

	let lt = a.lt(&b).evaluate()?;
	assert_eq!(lt.dtype(), DType::Bool);
	assert_eq!(lt.to_vec::<bool>(), vec![true, false, false]);

	let small = forest.leaf(vec![1_u8, 2, 3]);
	assert_eq!((&small + 1).evaluate()?.dtype(), DType::U8);
	assert_eq!((&small + 1000).evaluate()?.dtype(), DType::U16);
	assert_eq!((&small - 1).evaluate()?.dtype(), DType::U8);
	assert_eq!((&small + -1).evaluate()?.dtype(), DType::I16);
	assert_eq!((&small * 0.5).evaluate()?.dtype(), DType::F64);
	assert_eq!((&small + &a).evaluate()?.dtype(), DType::I64);

	let floats = forest.leaf(vec![1.0_f32, 2.0]);
	assert_eq!((&floats * 2).evaluate()?.dtype(), DType::F32);
	assert_eq!((&floats * 2.5).evaluate()?.dtype(), DType::F32);
	assert_eq!((&floats * 1e300).evaluate()?.dtype(), DType::F64);
	Ok(())
}

#[test]
fn test_numeric_semantics() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let a = forest.leaf(vec![7_i64, -7, 7, 5]);
	let b = forest.leaf(vec![2_i64, 2, -2, 0]);
	assert_eq!(a.floor_div(&b).evaluate()?.to_vec::<i64>(), vec![3, -4, -4, 0]);
	assert_eq!((&a % &b).evaluate()?.to_vec::<i64>(), vec![1, 1, -1, 0]);

	let big = forest.leaf(vec![i64::MAX]);
	assert_eq!((&big + 1).evaluate()?.to_vec::<i64>(), vec![i64::MIN]);

	let one = forest.leaf(vec![1_i64, 1]);
	assert_eq!((&one << 70).evaluate()?.to_vec::<i64>(), vec![0, 0]);

	let x = forest.leaf(vec![1.0_f64, -1.0, 0.0]);
	let y = (&x / 0.0).evaluate()?.to_vec::<f64>();
	assert_eq!(y[0], f64::INFINITY);
	assert_eq!(y[1], f64::NEG_INFINITY);
	assert!(y[2].is_nan());
	Ok(())
}

#[test]
fn test_broadcasting() -> Result<(), ErrPack<TapeError>> {
	let forest = Forest::new();
	let col = forest.leaf(ndarray::array![[1_i64], [2], [3]]);
	let row = forest.leaf(vec![10_i64, 20]);
	let result = (&col * 2 + &row).evaluate()?;
	assert_eq!(result.shape(), &[3, 2]);
	assert_eq!(result.to_vec::<i64>(), vec![12, 22, 14, 24, 16, 26]);
	assert_eq!((&col * 2 + &row).shape()?.as_slice(), &[3, 2]);
	Ok(())
}

//--------------------------------------------------------------------------------------------------

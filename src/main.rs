//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::process::ExitCode;

use clap::Parser;

use deforest::array::kernel::binary;
use deforest::{Array, BinaryOp, ErrPack, EvalOptions, Forest, Tape, TapeError};

//--------------------------------------------------------------------------------------------------

struct Case {
	name: &'static str,
	tape: Tape,
	expected: Array,
}

fn arange(start: i64) -> Array {
	Array::from(vec![start, start + 1, start + 2, start + 3])
}

fn s(value: i64) -> Array {
	Array::from(value)
}

fn cases() -> Result<Vec<Case>, ErrPack<TapeError>> {
	use BinaryOp::{Add, Mul, Pow, Sub};

	let mut cases = Vec::new();
	let d = arange(0);
	let e = arange(1);

	let o = Forest::new().leaf(d.clone());
	cases.push(Case {
		name: "o + o**2 + o*2",
		tape: &o + o.pow(2) + &o * 2,
		expected: binary(Add, &binary(Add, &d, &binary(Pow, &d, &s(2))?)?, &binary(Mul, &d, &s(2))?)?,
	});

	let o = Forest::new().leaf(d.clone());
	let inner = binary(Sub, &binary(Pow, &d, &s(2))?, &d)?;
	cases.push(Case {
		name: "o + (o**2 - o) + o*2",
		tape: &o + (o.pow(2) - &o) + &o * 2,
		expected: binary(Add, &binary(Add, &d, &inner)?, &binary(Mul, &d, &s(2))?)?,
	});

	let o = Forest::new().leaf(d.clone());
	cases.push(Case {
		name: "1 + o",
		tape: 1 + &o,
		expected: binary(Add, &s(1), &d)?,
	});

	let o = Forest::new().leaf(d.clone());
	let squared = binary(Pow, &binary(Sub, &d, &s(1))?, &s(2))?;
	let inner = binary(Sub, &binary(Add, &s(2), &squared)?, &d)?;
	cases.push(Case {
		name: "o + (2 + (o-1)**2 - o) + o*2",
		tape: &o + (2 + (&o - 1).pow(2) - &o) + &o * 2,
		expected: binary(Add, &binary(Add, &d, &inner)?, &binary(Mul, &d, &s(2))?)?,
	});

	let forest = Forest::new();
	let a = forest.leaf(d.clone());
	let b = forest.leaf(e.clone());
	cases.push(Case {
		name: "a + b",
		tape: &a + &b,
		expected: binary(Add, &d, &e)?,
	});
	cases.push(Case {
		name: "a*2 + b",
		tape: &a * 2 + &b,
		expected: binary(Add, &binary(Mul, &d, &s(2))?, &e)?,
	});

	Ok(cases)
}

fn run() -> Result<bool, ErrPack<TapeError>> {
	let mut ok = true;
	for case in cases()? {
		log::debug!("{}: {}", case.name, case.tape);
		let (result, stats) = case.tape.evaluate_with(EvalOptions::default())?;
		let matches = result.allclose(&case.expected, 1e-5, 1e-8, false);
		println!(
			"{:<32} {result}  in_place={} allocated={}{}",
			case.name,
			stats.in_place,
			stats.allocated,
			if matches { "" } else { "  MISMATCH" },
		);
		if !matches {
			log::error!("{}: expected {}, got {result}", case.name, case.expected);
			ok = false;
		}
	}
	Ok(ok)
}

/// Evaluates a few deforested expressions and checks them against direct kernel calls.
#[derive(Parser)]
struct Arguments {
	/// More log output, repeat for more detail
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Silence all log output
	#[arg(short, long)]
	quiet: bool,
}

fn main() -> ExitCode {
	let args = Arguments::parse();
	let verbosity = 1 + usize::from(args.verbose);
	if let Err(err) = stderrlog::new().module(module_path!()).verbosity(verbosity).quiet(args.quiet).init() {
		eprintln!("failed to initialize logging: {err}");
	}

	match run() {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(err) => {
			log::error!("evaluation failed: {err}");
			ExitCode::FAILURE
		},
	}
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------

//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::rc::Rc;

use arrayvec::ArrayVec;

use crate::ErrPack;
use crate::array::Array;
use crate::array::dtype::{Casting, can_cast};
use crate::array::kernel;
use crate::array::ops::{BinaryOp, UnaryOp};
use crate::error::{InPlaceError, TapeError};
use crate::tape::{Arena, Operand, Tape, TapeEntry, TapeId, foreign_tape, pop_or_malformed};

//--------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
	/// Casting rule an operand must satisfy before the result may be written
	/// into the buffer of the other operand.
	pub casting: Casting,

	/// When `false`, every operation allocates a new array.
	pub in_place: bool,
}

impl Default for EvalOptions {
	fn default() -> Self {
		Self { casting: Casting::Safe, in_place: true }
	}
}

impl EvalOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_casting(mut self, casting: Casting) -> Self {
		self.casting = casting;
		self
	}

	pub fn with_in_place(mut self, in_place: bool) -> Self {
		self.in_place = in_place;
		self
	}
}

/// Counters collected while evaluating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalStats {
	/// Operations whose result was written into an operand buffer.
	pub in_place: usize,

	/// Operations that allocated a new array.
	pub allocated: usize,

	/// In-place attempts that were rejected.
	pub fallbacks: usize,

	/// Nested tapes that were evaluated.
	pub nested: usize,
}

//--------------------------------------------------------------------------------------------------

enum Value {
	/// Produced by this evaluation. Can be overwritten if the item is mutable.
	Owned(Array),

	/// Leaf data or a constant. Never written to.
	Shared(Rc<Array>),
}

impl Value {
	fn get(&self) -> &Array {
		match self {
			Self::Owned(array) => array,
			Self::Shared(array) => array,
		}
	}

	fn buffer(&mut self) -> Result<&mut Array, InPlaceError> {
		match self {
			Self::Owned(array) => Ok(array),
			Self::Shared(_) => Err(InPlaceError::Aliased),
		}
	}

	fn into_array(self) -> Array {
		match self {
			Self::Owned(array) => array,
			Self::Shared(array) => Rc::unwrap_or_clone(array),
		}
	}
}

enum Slot {
	Pending(TapeId),
	Ready(Value),
}

struct StackItem {
	slot: Slot,
	mutable: bool,
}

#[derive(Clone, Copy, Debug)]
enum Side {
	Left,
	Right,
}

//--------------------------------------------------------------------------------------------------

/// Replays tapes on an operand stack and reuses operand buffers where possible.
///
/// The counters in `stats()` accumulate over all `evaluate()` calls.
pub struct Evaluator {
	options: EvalOptions,
	stats: EvalStats,
}

impl Evaluator {
	pub fn new(options: EvalOptions) -> Self {
		Self { options, stats: EvalStats::default() }
	}

	pub fn options(&self) -> EvalOptions {
		self.options
	}

	pub fn stats(&self) -> EvalStats {
		self.stats
	}

	pub fn evaluate(&mut self, tape: &Tape) -> Result<Array, ErrPack<TapeError>> {
		let arena = tape.forest().arena.borrow();
		let before = self.stats;
		let value = self.run(&arena, tape.id(), 0)?;
		log::debug!(
			"evaluated Tape#{}: in_place={}, allocated={}, fallbacks={}, nested={}",
			tape.id().raw,
			self.stats.in_place - before.in_place,
			self.stats.allocated - before.allocated,
			self.stats.fallbacks - before.fallbacks,
			self.stats.nested - before.nested,
		);
		Ok(value.into_array())
	}

	fn run(&mut self, arena: &Arena, id: TapeId, depth: usize) -> Result<Value, ErrPack<TapeError>> {
		let entries = arena.visible(id);
		let shared = arena.shared_nested(id);
		let indent = depth * 4;
		let mut stack: Vec<StackItem> = Vec::with_capacity(entries.len());
		for entry in entries {
			log::trace!("{:indent$}Tape#{}: {entry}", "", id.raw);
			let item = match entry {
				TapeEntry::Operand(Operand::Value(value)) => StackItem {
					slot: Slot::Ready(Value::Shared(value.clone())),
					mutable: false,
				},
				TapeEntry::Operand(Operand::Tape(nested)) => StackItem {
					slot: Slot::Pending(*nested),
					mutable: !shared.contains(nested.raw),
				},
				TapeEntry::Operand(Operand::Foreign) => {
					return Err(foreign_tape());
				},
				TapeEntry::Binary(op) => {
					let right = pop_or_malformed(&mut stack);
					let left = pop_or_malformed(&mut stack);
					self.binary(arena, *op, left, right, depth)?
				},
				TapeEntry::BinaryReversed(op) => {
					let left = pop_or_malformed(&mut stack);
					let right = pop_or_malformed(&mut stack);
					self.binary(arena, *op, left, right, depth)?
				},
				TapeEntry::Unary(op) => {
					let operand = pop_or_malformed(&mut stack);
					self.unary(arena, *op, operand, depth)?
				},
				TapeEntry::Func(func) => {
					return Err(ErrPack::new(
						TapeError::NotImplemented,
						format!("function `{func}` is not implemented"),
					));
				},
			};
			stack.push(item);
		}
		let result = pop_or_malformed(&mut stack);
		if !stack.is_empty() {
			crate::tape::malformed_tape();
		}
		self.resolve(arena, result.slot, depth)
	}

	fn resolve(&mut self, arena: &Arena, slot: Slot, depth: usize) -> Result<Value, ErrPack<TapeError>> {
		match slot {
			Slot::Ready(value) => Ok(value),
			Slot::Pending(nested) => {
				self.stats.nested += 1;
				self.run(arena, nested, depth + 1)
			},
		}
	}

	fn binary(
		&mut self,
		arena: &Arena,
		op: BinaryOp,
		left: StackItem,
		right: StackItem,
		depth: usize,
	) -> Result<StackItem, ErrPack<TapeError>> {
		let (left_mutable, right_mutable) = (left.mutable, right.mutable);
		let mut left = self.resolve(arena, left.slot, depth)?;
		let mut right = self.resolve(arena, right.slot, depth)?;

		if self.options.in_place {
			let casting = self.options.casting;
			let left_kind = left.get().min_scalar_type();
			let right_kind = right.get().min_scalar_type();
			let mut candidates = ArrayVec::<Side, 2>::new();
			if left_mutable && can_cast(right_kind, left_kind, casting) {
				candidates.push(Side::Left);
			}
			if right_mutable && can_cast(left_kind, right_kind, casting) {
				candidates.push(Side::Right);
			}
			for side in candidates {
				let attempt = match side {
					Side::Left => left
						.buffer()
						.and_then(|buf| kernel::binary_into_left(op, buf, right.get())),
					Side::Right => right
						.buffer()
						.and_then(|buf| kernel::binary_into_right(op, left.get(), buf)),
				};
				match attempt {
					Ok(()) => {
						self.stats.in_place += 1;
						let result = match side {
							Side::Left => left,
							Side::Right => right,
						};
						return Ok(StackItem { slot: Slot::Ready(result), mutable: true });
					},
					Err(reason) => {
						self.stats.fallbacks += 1;
						log::trace!("{:indent$}`{op}` into {side:?} operand rejected: {reason}", "", indent = depth * 4);
					},
				}
			}
		}

		let result = kernel::binary(op, left.get(), right.get())?;
		self.stats.allocated += 1;
		Ok(StackItem { slot: Slot::Ready(Value::Owned(result)), mutable: true })
	}

	fn unary(
		&mut self,
		arena: &Arena,
		op: UnaryOp,
		operand: StackItem,
		depth: usize,
	) -> Result<StackItem, ErrPack<TapeError>> {
		let mutable = operand.mutable;
		let mut value = self.resolve(arena, operand.slot, depth)?;

		if self.options.in_place && mutable {
			match value.buffer().and_then(|buf| kernel::unary_in_place(op, buf)) {
				Ok(()) => {
					self.stats.in_place += 1;
					return Ok(StackItem { slot: Slot::Ready(value), mutable: true });
				},
				Err(reason) => {
					self.stats.fallbacks += 1;
					log::trace!("{:indent$}`{op}` in place rejected: {reason}", "", indent = depth * 4);
				},
			}
		}

		let result = kernel::unary(op, value.get())?;
		self.stats.allocated += 1;
		Ok(StackItem { slot: Slot::Ready(Value::Owned(result)), mutable: true })
	}
}

//--------------------------------------------------------------------------------------------------

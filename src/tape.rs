//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::cell::RefCell;
use std::rc::Rc;

use bit_set::BitSet;
use thin_vec::{ThinVec, thin_vec};

use crate::ErrPack;
use crate::array::Array;
use crate::array::ops::{BinaryOp, FuncOp, UnaryOp};
use crate::define_index_type;
use crate::error::TapeError;
use crate::eval::{EvalOptions, EvalStats, Evaluator};
use crate::shape::{ShapeVec, broadcast_shapes, shape_to_str};
use crate::util::index_vec::IndexVec;

pub mod overload;
pub mod term;

pub use term::Term;

//--------------------------------------------------------------------------------------------------

define_index_type!(TapeId);
define_index_type!(SeqId);

#[derive(Clone, Debug)]
pub enum Operand {
	/// A constant array or scalar.
	Value(Rc<Array>),

	/// A sub-expression recorded in the same forest.
	Tape(TapeId),

	/// A tape from a different forest. Evaluation fails with `TapeError::ForeignTape`.
	Foreign,
}

/// One element of a postfix operation tape.
#[derive(Clone, Debug)]
pub enum TapeEntry {
	Operand(Operand),

	/// `left OP right`, where `right` is on the top of the stack.
	Binary(BinaryOp),

	/// `left OP right`, where `left` is on the top of the stack.
	/// Recorded by the reflected operators such as `2 - tape`.
	BinaryReversed(BinaryOp),

	Unary(UnaryOp),
	Func(FuncOp),
}

pub(crate) struct TapeNode {
	pub seq: SeqId,

	/// Number of entries of `seq` that belong to this tape.
	pub cursor: usize,

	/// How many times this tape was embedded as an operand. Never decremented.
	pub refcount: usize,

	/// Set for leaves only.
	pub data: Option<Rc<Array>>,
}

/// Storage for all tapes of a forest.
///
/// Tapes that extend each other share one sequence of entries. A tape only sees the first
/// `cursor` entries of its sequence, so appending to the sequence never changes what an
/// existing tape sees.
#[derive(Default)]
pub(crate) struct Arena {
	pub nodes: IndexVec<TapeId, TapeNode>,
	pub seqs: IndexVec<SeqId, ThinVec<TapeEntry>>,
}

impl Arena {
	pub fn visible(&self, id: TapeId) -> &[TapeEntry] {
		let node = &self.nodes[id];
		&self.seqs[node.seq][..node.cursor]
	}

	/// Nested tapes in the visible prefix of `id` that are referenced more than once.
	/// Their values must not be overwritten.
	pub fn shared_nested(&self, id: TapeId) -> BitSet {
		let mut set = BitSet::new();
		for entry in self.visible(id) {
			if let TapeEntry::Operand(Operand::Tape(nested)) = entry
				&& self.nodes[*nested].refcount != 1
			{
				set.insert(nested.raw);
			}
		}
		set
	}

	fn append<const N: usize>(&mut self, from: TapeId, entries: [TapeEntry; N]) -> TapeId {
		let TapeNode { seq, cursor, .. } = self.nodes[from];
		let seq = if self.seqs[seq].len() == cursor {
			seq
		} else {
			let prefix = self.seqs[seq][..cursor].iter().cloned().collect();
			self.seqs.push(prefix)
		};
		let entries_vec = &mut self.seqs[seq];
		entries_vec.extend(entries);
		let cursor = entries_vec.len();
		self.nodes.push(TapeNode { seq, cursor, refcount: 0, data: None })
	}

	fn shape_of(&self, id: TapeId) -> Result<ShapeVec, ErrPack<TapeError>> {
		let mut stack: Vec<ShapeVec> = Vec::new();
		for entry in self.visible(id) {
			match entry {
				TapeEntry::Operand(Operand::Value(value)) => {
					stack.push(ShapeVec::from_slice(value.shape()));
				},
				TapeEntry::Operand(Operand::Tape(nested)) => {
					stack.push(self.shape_of(*nested)?);
				},
				TapeEntry::Operand(Operand::Foreign) => {
					return Err(foreign_tape());
				},
				TapeEntry::Binary(_) | TapeEntry::BinaryReversed(_) => {
					let b = pop_or_malformed(&mut stack);
					let a = pop_or_malformed(&mut stack);
					let shape = broadcast_shapes(&a, &b).map_err(|_| {
						ErrPack::new(
							TapeError::ShapeMismatch,
							format!(
								"shapes {} and {} cannot be broadcast together",
								shape_to_str(&a),
								shape_to_str(&b)
							),
						)
					})?;
					stack.push(shape);
				},
				TapeEntry::Unary(_) | TapeEntry::Func(_) => {},
			}
		}
		let shape = pop_or_malformed(&mut stack);
		if !stack.is_empty() {
			malformed_tape();
		}
		Ok(shape)
	}
}

//--------------------------------------------------------------------------------------------------

#[cold]
#[inline(never)]
#[allow(clippy::panic)]
pub(crate) fn malformed_tape() -> ! {
	panic!("malformed tape: the operand stack does not match the operators");
}

pub(crate) fn pop_or_malformed<T>(stack: &mut Vec<T>) -> T {
	match stack.pop() {
		Some(item) => item,
		None => malformed_tape(),
	}
}

#[cold]
#[inline(never)]
pub(crate) fn foreign_tape() -> ErrPack<TapeError> {
	ErrPack::new(TapeError::ForeignTape, "the tape references a tape from a different forest")
}

//--------------------------------------------------------------------------------------------------

/// Owner of a set of tapes.
///
/// Cloning a `Forest` creates another handle to the same storage.
#[derive(Clone, Default)]
pub struct Forest {
	pub(crate) arena: Rc<RefCell<Arena>>,
}

impl Forest {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a tape that evaluates to `data`.
	pub fn leaf(&self, data: impl Into<Array>) -> Tape {
		let data = Rc::new(data.into());
		let mut arena = self.arena.borrow_mut();
		let seq = arena.seqs.push(thin_vec![TapeEntry::Operand(Operand::Value(data.clone()))]);
		let id = arena.nodes.push(TapeNode { seq, cursor: 1, refcount: 0, data: Some(data) });
		log::trace!("new leaf Tape#{}", id.raw);
		Tape { forest: self.clone(), id }
	}

	/// A handle to a tape recorded in this forest.
	pub fn tape(&self, id: TapeId) -> Option<Tape> {
		let exists = self.arena.borrow().nodes.get(id).is_some();
		exists.then(|| Tape { forest: self.clone(), id })
	}

	/// Number of tapes recorded so far.
	pub fn tape_count(&self) -> usize {
		self.arena.borrow().nodes.len()
	}

	/// Number of distinct entry sequences. Branching from the middle of a sequence adds one.
	pub fn seq_count(&self) -> usize {
		self.arena.borrow().seqs.len()
	}

	pub fn same(&self, other: &Forest) -> bool {
		Rc::ptr_eq(&self.arena, &other.arena)
	}
}

impl std::fmt::Debug for Forest {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Forest(tapes={}, seqs={})", self.tape_count(), self.seq_count())
	}
}

//--------------------------------------------------------------------------------------------------

/// A lazily evaluated array expression.
///
/// Operators only record. Nothing is computed until `evaluate()` is called.
#[derive(Clone)]
pub struct Tape {
	forest: Forest,
	id: TapeId,
}

impl Tape {
	pub fn id(&self) -> TapeId {
		self.id
	}

	pub fn forest(&self) -> &Forest {
		&self.forest
	}

	pub fn cursor(&self) -> usize {
		self.forest.arena.borrow().nodes[self.id].cursor
	}

	pub fn refcount(&self) -> usize {
		self.forest.arena.borrow().nodes[self.id].refcount
	}

	pub fn is_leaf(&self) -> bool {
		self.forest.arena.borrow().nodes[self.id].data.is_some()
	}

	/// The array a leaf was created with.
	pub fn data(&self) -> Option<Rc<Array>> {
		self.forest.arena.borrow().nodes[self.id].data.clone()
	}

	/// The entries visible to this tape, in postfix order.
	pub fn entries(&self) -> Vec<TapeEntry> {
		self.forest.arena.borrow().visible(self.id).to_vec()
	}

	/// Records `self OP other`, or `other OP self` when `reversed` is set.
	pub fn apply_binary(&self, other: impl Into<Term>, op: BinaryOp, reversed: bool) -> Tape {
		let operand = match other.into() {
			Term::Value(value) => Operand::Value(Rc::new(value)),
			Term::Tape(tape) if tape.forest.same(&self.forest) => Operand::Tape(tape.id),
			Term::Tape(tape) => {
				log::warn!("Tape#{} combined with Tape#{} from a different forest", self.id.raw, tape.id.raw);
				Operand::Foreign
			},
		};
		let mut arena = self.forest.arena.borrow_mut();
		if let Operand::Tape(nested) = operand {
			let node = &mut arena.nodes[nested];
			node.refcount = node.refcount.saturating_add(1);
		}
		let entry = if reversed { TapeEntry::BinaryReversed(op) } else { TapeEntry::Binary(op) };
		let id = arena.append(self.id, [TapeEntry::Operand(operand), entry]);
		Tape { forest: self.forest.clone(), id }
	}

	pub fn apply_unary(&self, op: UnaryOp) -> Tape {
		let id = self.forest.arena.borrow_mut().append(self.id, [TapeEntry::Unary(op)]);
		Tape { forest: self.forest.clone(), id }
	}

	pub fn apply_func(&self, func: FuncOp) -> Tape {
		let id = self.forest.arena.borrow_mut().append(self.id, [TapeEntry::Func(func)]);
		Tape { forest: self.forest.clone(), id }
	}

	/// The shape `evaluate()` would produce, computed without evaluating anything.
	pub fn shape(&self) -> Result<ShapeVec, ErrPack<TapeError>> {
		self.forest.arena.borrow().shape_of(self.id)
	}

	pub fn evaluate(&self) -> Result<Array, ErrPack<TapeError>> {
		Evaluator::new(EvalOptions::default()).evaluate(self)
	}

	pub fn evaluate_with(&self, options: EvalOptions) -> Result<(Array, EvalStats), ErrPack<TapeError>> {
		let mut evaluator = Evaluator::new(options);
		let result = evaluator.evaluate(self)?;
		Ok((result, evaluator.stats()))
	}
}

//--------------------------------------------------------------------------------------------------

impl std::fmt::Display for Operand {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Value(value) => match value.scalar_value() {
				Some(scalar) => write!(f, "{scalar}"),
				None => write!(f, "{}{}", value.dtype(), shape_to_str(value.shape())),
			},
			Self::Tape(id) => write!(f, "Tape#{}", id.raw),
			Self::Foreign => write!(f, "Tape#?"),
		}
	}
}

impl std::fmt::Display for TapeEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::Operand(operand) => write!(f, "{operand}"),
			Self::Binary(op) => write!(f, "{}", op.symbol()),
			Self::BinaryReversed(op) => write!(f, "{}'", op.symbol()),
			Self::Unary(op) => write!(f, "{}", op.symbol()),
			Self::Func(func) => write!(f, "{}", func.name()),
		}
	}
}

impl std::fmt::Display for Tape {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let arena = self.forest.arena.borrow();
		write!(f, "Tape#{}[", self.id.raw)?;
		for (i, entry) in arena.visible(self.id).iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{entry}")?;
		}
		write!(f, "]")
	}
}

impl std::fmt::Debug for Tape {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "{self}")
	}
}

//--------------------------------------------------------------------------------------------------

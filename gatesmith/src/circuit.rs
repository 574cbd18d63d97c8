// -*- mode: rust; -*-
//
// This file is part of `gatesmith`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! The circuit graph: an append-only arena of wires plus the gates that drive them.
//!
//! A [`WireId`] is a plain index into the wire arena owned by a [`Circuit`];
//! [`Bundle`]s and [`Gate`]s only ever hold indices, never ownership. Gates are
//! appended in construction order and that order is the evaluation order.
//!
//! Wires come in two flavors. Fresh wires returned by [`Circuit::add_gate`] are
//! driven exactly once. Wires allocated up front (output and temporary bundles)
//! are driven with [`Circuit::add_gate_to`]; a temporary may be driven several
//! times, and a gate always reads the value most recently driven before it.
//! Input and constant wires can never be driven.

use crate::{errors::CircuitError, util};
use itertools::Itertools;
use std::ops::{Index, Range};

/// The index of a wire in a circuit.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub(crate) usize);

impl WireId {
    /// The position of this wire in the arena of its circuit.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// The kinds of gates a circuit may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateType {
    /// `x ^ y`
    Xor,
    /// `!(x ^ y)`
    Nxor,
    /// `x & y`
    And,
    /// `x | y`
    Or,
    /// `!x`
    Inv,
    /// Moves the value of `x` onto another wire. Free in every protocol.
    Copy,
}

impl GateType {
    /// Whether the gate reads a single wire.
    #[inline]
    pub fn is_unary(self) -> bool {
        matches!(self, GateType::Inv | GateType::Copy)
    }

    /// Whether the gate is linear over GF(2), and hence free under free-XOR garbling.
    #[inline]
    pub fn is_linear(self) -> bool {
        !matches!(self, GateType::And | GateType::Or)
    }

    /// Evaluate the gate in plaintext. `y` is ignored by unary gates.
    #[inline]
    pub fn eval(self, x: bool, y: bool) -> bool {
        match self {
            GateType::Xor => x ^ y,
            GateType::Nxor => !(x ^ y),
            GateType::And => x & y,
            GateType::Or => x | y,
            GateType::Inv => !x,
            GateType::Copy => x,
        }
    }
}

/// A single gate. Unary gates store their input twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gate {
    pub(crate) ty: GateType,
    pub(crate) x: WireId,
    pub(crate) y: WireId,
    pub(crate) out: WireId,
}

impl Gate {
    /// The kind of this gate.
    pub fn gate_type(&self) -> GateType {
        self.ty
    }

    /// The wires read by this gate.
    pub fn inputs(&self) -> Vec<WireId> {
        if self.ty.is_unary() {
            vec![self.x]
        } else {
            vec![self.x, self.y]
        }
    }

    /// The wire driven by this gate.
    pub fn output(&self) -> WireId {
        self.out
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.ty.is_unary() {
            write!(f, "{:?} ( {} ) -> {}", self.ty, self.x, self.out)
        } else {
            write!(f, "{:?} ( {}, {} ) -> {}", self.ty, self.x, self.y, self.out)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WireState {
    Input,
    Constant(bool),
    Unassigned,
    Assigned,
}

/// An ordered collection of wires representing the bits of one integer,
/// least-significant bit first.
///
/// A bundle does not own its wires; it is a view over wires of some circuit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bundle(Vec<WireId>);

impl Bundle {
    /// Create a new bundle from some wires.
    pub fn new(ws: Vec<WireId>) -> Bundle {
        Bundle(ws)
    }

    /// A bundle holding a single wire.
    pub fn single(w: WireId) -> Bundle {
        Bundle(vec![w])
    }

    /// Extract the wires from this bundle.
    pub fn wires(&self) -> &[WireId] {
        &self.0
    }

    /// Get the number of wires in this bundle.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Whether the bundle holds no wires.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most significant wire, which is the sign bit of a two's-complement value.
    pub fn msb(&self) -> Result<WireId, CircuitError> {
        self.0
            .last()
            .copied()
            .ok_or(CircuitError::WidthMismatch { got: 0, needed: 1 })
    }

    /// The wires in `range`, as a new bundle.
    pub fn slice(&self, range: Range<usize>) -> Bundle {
        Bundle(self.0[range].to_vec())
    }

    /// Push a wire onto the bundle.
    pub fn push(&mut self, w: WireId) {
        self.0.push(w);
    }

    /// Append the wires of `other`.
    pub fn append(&mut self, other: &Bundle) {
        self.0.extend_from_slice(&other.0);
    }

    /// Access the underlying iterator.
    pub fn iter(&self) -> std::slice::Iter<'_, WireId> {
        self.0.iter()
    }
}

impl Index<usize> for Bundle {
    type Output = WireId;

    fn index(&self, idx: usize) -> &WireId {
        self.0.index(idx)
    }
}

impl From<Vec<WireId>> for Bundle {
    fn from(ws: Vec<WireId>) -> Bundle {
        Bundle(ws)
    }
}

impl FromIterator<WireId> for Bundle {
    fn from_iter<I: IntoIterator<Item = WireId>>(iter: I) -> Bundle {
        Bundle(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Bundle {
    type Item = &'a WireId;
    type IntoIter = std::slice::Iter<'a, WireId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The outcome of simplifying a gate that reads a constant.
enum Folded {
    Const(bool),
    Wire(WireId),
    Inverted(WireId),
}

/// Static representation of a boolean circuit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circuit {
    pub(crate) wires: Vec<WireState>,
    pub(crate) gates: Vec<Gate>,
    pub(crate) inputs: Vec<Bundle>,
    pub(crate) outputs: Vec<Bundle>,
    pub(crate) temps: Vec<Bundle>,
    const_refs: [Option<WireId>; 2],
}

impl Circuit {
    /// Make a new, empty `Circuit`.
    pub fn new() -> Circuit {
        Circuit::default()
    }

    fn alloc(&mut self, state: WireState) -> WireId {
        self.wires.push(state);
        WireId(self.wires.len() - 1)
    }

    /// Allocate a wire that no gate drives yet.
    pub fn new_wire(&mut self) -> WireId {
        self.alloc(WireState::Unassigned)
    }

    /// Allocate `width` undriven wires without registering them anywhere.
    pub fn new_bundle(&mut self, width: usize) -> Bundle {
        (0..width).map(|_| self.new_wire()).collect()
    }

    /// Allocate and register an input bundle.
    pub fn add_input_bundle(&mut self, width: usize) -> Bundle {
        let b: Bundle = (0..width).map(|_| self.alloc(WireState::Input)).collect();
        self.inputs.push(b.clone());
        b
    }

    /// Allocate and register an output bundle. Gates must drive every wire of it.
    pub fn add_output_bundle(&mut self, width: usize) -> Bundle {
        let b = self.new_bundle(width);
        self.outputs.push(b.clone());
        b
    }

    /// Allocate and register a bundle of temporaries.
    pub fn add_temp_bundle(&mut self, width: usize) -> Bundle {
        let b = self.new_bundle(width);
        self.temps.push(b.clone());
        b
    }

    /// The constant wire carrying `val`. Each circuit holds at most one wire per value.
    pub fn constant(&mut self, val: bool) -> WireId {
        match self.const_refs[val as usize] {
            Some(w) => w,
            None => {
                let w = self.alloc(WireState::Constant(val));
                self.const_refs[val as usize] = Some(w);
                w
            }
        }
    }

    /// A bundle of constant wires spelling the low `width` bits of `val` in two's complement.
    pub fn constant_bundle(&mut self, val: i128, width: usize) -> Bundle {
        util::i128_to_bits(val, width)
            .into_iter()
            .map(|b| self.constant(b))
            .collect()
    }

    /// The value of `w` if it is a constant wire.
    pub fn constant_value(&self, w: WireId) -> Option<bool> {
        match self.wires.get(w.0) {
            Some(WireState::Constant(v)) => Some(*v),
            _ => None,
        }
    }

    fn check_read(&self, w: WireId) -> Result<(), CircuitError> {
        match self.wires.get(w.0) {
            None => Err(CircuitError::UnallocatedWire(w)),
            Some(WireState::Unassigned) => Err(CircuitError::UninitializedWire(w)),
            Some(_) => Ok(()),
        }
    }

    fn check_write(&self, w: WireId) -> Result<(), CircuitError> {
        match self.wires.get(w.0) {
            None => Err(CircuitError::UnallocatedWire(w)),
            Some(WireState::Input) | Some(WireState::Constant(_)) => {
                Err(CircuitError::ReadOnlyWire(w))
            }
            Some(_) => Ok(()),
        }
    }

    fn push_gate(
        &mut self,
        ty: GateType,
        x: WireId,
        y: WireId,
        out: WireId,
    ) -> Result<(), CircuitError> {
        self.check_read(x)?;
        self.check_read(y)?;
        self.check_write(out)?;
        self.gates.push(Gate { ty, x, y, out });
        self.wires[out.0] = WireState::Assigned;
        Ok(())
    }

    fn fold(&self, x: WireId, y: WireId, ty: GateType) -> Option<Folded> {
        fn with_constant(ty: GateType, w: WireId, c: bool) -> Option<Folded> {
            match (ty, c) {
                (GateType::Xor, false) | (GateType::Nxor, true) => Some(Folded::Wire(w)),
                (GateType::Xor, true) | (GateType::Nxor, false) => Some(Folded::Inverted(w)),
                (GateType::And, true) | (GateType::Or, false) => Some(Folded::Wire(w)),
                (GateType::And, false) => Some(Folded::Const(false)),
                (GateType::Or, true) => Some(Folded::Const(true)),
                _ => None,
            }
        }
        match (self.constant_value(x), self.constant_value(y)) {
            (Some(cx), Some(cy)) => Some(Folded::Const(ty.eval(cx, cy))),
            (Some(cx), None) => with_constant(ty, y, cx),
            (None, Some(cy)) => with_constant(ty, x, cy),
            (None, None) => None,
        }
    }

    fn check_binary(ty: GateType) -> Result<(), CircuitError> {
        if ty.is_unary() {
            return Err(CircuitError::InvalidArg(format!(
                "{:?} is unary, use add_inv or add_copy_to",
                ty
            )));
        }
        Ok(())
    }

    /// Append a two-input gate driving a fresh wire, which is returned.
    ///
    /// Gates reading a constant are folded: `x & 1` returns `x` itself, `x & 0` the
    /// constant `0`, and so on, without appending anything.
    pub fn add_gate(
        &mut self,
        x: WireId,
        y: WireId,
        ty: GateType,
    ) -> Result<WireId, CircuitError> {
        Self::check_binary(ty)?;
        self.check_read(x)?;
        self.check_read(y)?;
        match self.fold(x, y, ty) {
            Some(Folded::Const(v)) => Ok(self.constant(v)),
            Some(Folded::Wire(w)) => Ok(w),
            Some(Folded::Inverted(w)) => self.add_inv(w),
            None => {
                let out = self.new_wire();
                self.push_gate(ty, x, y, out)?;
                Ok(out)
            }
        }
    }

    /// Append a two-input gate driving the already allocated wire `out`.
    ///
    /// `out` may be one of `x` and `y`, in which case the gate updates it in place.
    pub fn add_gate_to(
        &mut self,
        x: WireId,
        y: WireId,
        ty: GateType,
        out: WireId,
    ) -> Result<(), CircuitError> {
        Self::check_binary(ty)?;
        self.check_read(x)?;
        self.check_read(y)?;
        match self.fold(x, y, ty) {
            Some(Folded::Const(v)) => {
                let c = self.constant(v);
                self.push_gate(GateType::Copy, c, c, out)
            }
            Some(Folded::Wire(w)) if w == out => self.check_write(out),
            Some(Folded::Wire(w)) => self.push_gate(GateType::Copy, w, w, out),
            Some(Folded::Inverted(w)) => self.push_gate(GateType::Inv, w, w, out),
            None => self.push_gate(ty, x, y, out),
        }
    }

    /// Append an inverter driving a fresh wire.
    pub fn add_inv(&mut self, x: WireId) -> Result<WireId, CircuitError> {
        self.check_read(x)?;
        if let Some(v) = self.constant_value(x) {
            return Ok(self.constant(!v));
        }
        let out = self.new_wire();
        self.push_gate(GateType::Inv, x, x, out)?;
        Ok(out)
    }

    /// Append an inverter driving `out`.
    pub fn add_inv_to(&mut self, x: WireId, out: WireId) -> Result<(), CircuitError> {
        self.check_read(x)?;
        match self.constant_value(x) {
            Some(v) => {
                let c = self.constant(!v);
                self.push_gate(GateType::Copy, c, c, out)
            }
            None => self.push_gate(GateType::Inv, x, x, out),
        }
    }

    /// Copy the value of `x` onto `out`.
    pub fn add_copy_to(&mut self, x: WireId, out: WireId) -> Result<(), CircuitError> {
        if x == out {
            self.check_read(x)?;
            return self.check_write(out);
        }
        self.push_gate(GateType::Copy, x, x, out)
    }

    /// Returns `true` if `a` and `b` share no wire.
    pub fn are_distinct(a: &Bundle, b: &Bundle) -> bool {
        a.iter().all(|x| !b.wires().contains(x))
    }

    /// The gates, in evaluation order.
    #[inline]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// The registered input bundles.
    #[inline]
    pub fn inputs(&self) -> &[Bundle] {
        &self.inputs
    }

    /// The registered output bundles.
    #[inline]
    pub fn outputs(&self) -> &[Bundle] {
        &self.outputs
    }

    /// The registered temporary bundles.
    #[inline]
    pub fn temps(&self) -> &[Bundle] {
        &self.temps
    }

    /// Return the number of allocated wires.
    #[inline]
    pub fn num_wires(&self) -> usize {
        self.wires.len()
    }

    /// Return the number of gates.
    #[inline]
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Evaluate the circuit in plaintext, one `Vec<bool>` per input bundle,
    /// returning one `Vec<bool>` per output bundle.
    pub fn eval_plain(&self, inputs: &[Vec<bool>]) -> Result<Vec<Vec<bool>>, CircuitError> {
        if inputs.len() != self.inputs.len() {
            return Err(CircuitError::InvalidArgNum {
                got: inputs.len(),
                needed: self.inputs.len(),
            });
        }
        for w in self.outputs.iter().flat_map(Bundle::iter) {
            self.check_read(*w)?;
        }

        let mut vals = self
            .wires
            .iter()
            .map(|s| matches!(s, WireState::Constant(true)))
            .collect_vec();
        for (bundle, bits) in self.inputs.iter().zip(inputs.iter()) {
            if bundle.size() != bits.len() {
                return Err(CircuitError::WidthMismatch {
                    got: bits.len(),
                    needed: bundle.size(),
                });
            }
            for (w, &b) in bundle.iter().zip(bits.iter()) {
                vals[w.0] = b;
            }
        }
        for g in self.gates.iter() {
            vals[g.out.0] = g.ty.eval(vals[g.x.0], vals[g.y.0]);
        }
        Ok(self
            .outputs
            .iter()
            .map(|b| b.iter().map(|w| vals[w.0]).collect())
            .collect())
    }

    /// Evaluate the circuit on integer inputs, each truncated to the width of its
    /// bundle. Negative values can be passed as `x as u128`.
    pub fn eval_u128(&self, inputs: &[u128]) -> Result<Vec<u128>, CircuitError> {
        if inputs.len() != self.inputs.len() {
            return Err(CircuitError::InvalidArgNum {
                got: inputs.len(),
                needed: self.inputs.len(),
            });
        }
        let bits = inputs
            .iter()
            .zip(self.inputs.iter())
            .map(|(&x, b)| util::u128_to_bits(x, b.size()))
            .collect_vec();
        Ok(self
            .eval_plain(&bits)?
            .iter()
            .map(|bs| util::u128_from_bits(bs))
            .collect())
    }

    /// Replay `template` into this circuit.
    ///
    /// The template's input bundles are bound to `inputs` and its output bundles to
    /// `outputs`; every other template wire gets a fresh wire here. The template is
    /// only read, so a cached circuit can be instantiated any number of times.
    /// Bindings are checked before anything is added, so a failed call leaves this
    /// circuit unchanged.
    pub fn instantiate(
        &mut self,
        template: &Circuit,
        inputs: &[Bundle],
        outputs: &[Bundle],
    ) -> Result<(), CircuitError> {
        if inputs.len() != template.inputs.len() {
            return Err(CircuitError::InvalidArgNum {
                got: inputs.len(),
                needed: template.inputs.len(),
            });
        }
        if outputs.len() != template.outputs.len() {
            return Err(CircuitError::InvalidArgNum {
                got: outputs.len(),
                needed: template.outputs.len(),
            });
        }
        if inputs
            .iter()
            .cartesian_product(outputs.iter())
            .any(|(i, o)| !Circuit::are_distinct(i, o))
        {
            return Err(CircuitError::AliasedBundles);
        }
        // every output wire is driven exactly once
        if !outputs.iter().flat_map(|o| o.iter()).all_unique() {
            return Err(CircuitError::AliasedBundles);
        }

        let bindings = template
            .inputs
            .iter()
            .zip(inputs.iter())
            .chain(template.outputs.iter().zip(outputs.iter()));
        for (t, h) in bindings.clone() {
            if t.size() != h.size() {
                return Err(CircuitError::WidthMismatch {
                    got: h.size(),
                    needed: t.size(),
                });
            }
        }
        for &w in inputs.iter().flat_map(|b| b.iter()) {
            self.check_read(w)?;
        }
        for &w in outputs.iter().flat_map(|b| b.iter()) {
            self.check_write(w)?;
        }

        // all bindings are valid past this point
        let mut map: Vec<Option<WireId>> = vec![None; template.num_wires()];
        for (t, h) in bindings {
            for (tw, hw) in t.iter().zip(h.iter()) {
                map[tw.0] = Some(*hw);
            }
        }

        for (i, state) in template.wires.iter().enumerate() {
            if map[i].is_none() {
                map[i] = Some(match state {
                    WireState::Constant(v) => self.constant(*v),
                    _ => self.new_wire(),
                });
            }
        }
        let map = map.into_iter().flatten().collect_vec();

        for g in template.gates.iter() {
            self.push_gate(g.ty, map[g.x.0], map[g.y.0], map[g.out.0])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::RngExt;
    use rand::thread_rng;

    #[test]
    fn wires_are_numbered_in_allocation_order() {
        let mut c = Circuit::new();
        let a = c.add_input_bundle(2);
        let w = c.new_wire();
        let t = c.add_temp_bundle(3);
        assert_eq!(a.wires(), &[WireId(0), WireId(1)]);
        assert_eq!(w, WireId(2));
        assert_eq!(t.wires(), &[WireId(3), WireId(4), WireId(5)]);
        assert_eq!(c.num_wires(), 6);
        assert_eq!(c.temps().len(), 1);
    }

    #[test]
    fn reading_undriven_wire_fails() {
        let mut c = Circuit::new();
        let a = c.add_input_bundle(1);
        let w = c.new_wire();
        assert_eq!(
            c.add_gate(a[0], w, GateType::And),
            Err(CircuitError::UninitializedWire(w))
        );
        assert_eq!(
            c.add_gate(a[0], WireId(17), GateType::Xor),
            Err(CircuitError::UnallocatedWire(WireId(17)))
        );
        assert_eq!(c.num_gates(), 0);
    }

    #[test]
    fn driving_inputs_fails() {
        let mut c = Circuit::new();
        let a = c.add_input_bundle(2);
        assert_eq!(
            c.add_gate_to(a[0], a[1], GateType::Xor, a[1]),
            Err(CircuitError::ReadOnlyWire(a[1]))
        );
        let one = c.constant(true);
        assert_eq!(
            c.add_inv_to(a[0], one),
            Err(CircuitError::ReadOnlyWire(one))
        );
        assert!(c.add_gate(a[0], a[1], GateType::Inv).is_err());
    }

    #[test]
    fn constants_fold() {
        let mut c = Circuit::new();
        let a = c.add_input_bundle(1);
        let zero = c.constant(false);
        let one = c.constant(true);
        assert_eq!(c.constant(true), one);
        assert_eq!(c.add_gate(a[0], zero, GateType::Xor).unwrap(), a[0]);
        assert_eq!(c.add_gate(a[0], one, GateType::And).unwrap(), a[0]);
        assert_eq!(c.add_gate(zero, a[0], GateType::And).unwrap(), zero);
        assert_eq!(c.add_gate(a[0], one, GateType::Or).unwrap(), one);
        assert_eq!(c.add_gate(one, zero, GateType::Nxor).unwrap(), zero);
        assert_eq!(c.num_gates(), 0);
        let na = c.add_gate(a[0], one, GateType::Xor).unwrap();
        assert_eq!(c.num_gates(), 1);
        assert_eq!(c.gates()[0].gate_type(), GateType::Inv);
        assert_eq!(c.gates()[0].inputs(), vec![a[0]]);
        assert_eq!(c.gates()[0].output(), na);
    }

    #[test]
    fn temporaries_are_registers() {
        // t = a ^ b; t = t & c; out = t | a
        let mut c = Circuit::new();
        let a = c.add_input_bundle(1)[0];
        let b = c.add_input_bundle(1)[0];
        let d = c.add_input_bundle(1)[0];
        let out = c.add_output_bundle(1);
        let t = c.add_temp_bundle(1)[0];
        c.add_gate_to(a, b, GateType::Xor, t).unwrap();
        c.add_gate_to(t, d, GateType::And, t).unwrap();
        c.add_gate_to(t, a, GateType::Or, out[0]).unwrap();
        for x in 0..8u128 {
            let (xa, xb, xd) = (x & 1, (x >> 1) & 1, (x >> 2) & 1);
            let res = c.eval_u128(&[xa, xb, xd]).unwrap();
            assert_eq!(res, vec![((xa ^ xb) & xd) | xa], "x={}", x);
        }
    }

    #[test]
    fn undriven_output_is_reported() {
        let mut c = Circuit::new();
        c.add_input_bundle(1);
        let out = c.add_output_bundle(1);
        assert_eq!(
            c.eval_plain(&[vec![true]]),
            Err(CircuitError::UninitializedWire(out[0]))
        );
        assert!(c.eval_plain(&[]).is_err());
        assert!(c.eval_plain(&[vec![true, false]]).is_err());
    }

    #[test]
    fn instantiate_replays_template() {
        // template: out = (a & b) ^ c, using a temporary
        let mut t = Circuit::new();
        let a = t.add_input_bundle(1)[0];
        let b = t.add_input_bundle(1)[0];
        let d = t.add_input_bundle(1)[0];
        let out = t.add_output_bundle(1);
        let tmp = t.add_temp_bundle(1)[0];
        t.add_gate_to(a, b, GateType::And, tmp).unwrap();
        t.add_gate_to(tmp, d, GateType::Xor, out[0]).unwrap();
        let snapshot = t.clone();

        let mut rng = thread_rng();
        let mut host = Circuit::new();
        let xs = host.add_input_bundle(4);
        let ys: Bundle = (0..4).map(|_| host.new_wire()).collect();
        for i in 0..4 {
            host.add_inv_to(xs[i], ys[i]).unwrap();
        }
        let first = host.add_output_bundle(1);
        let second = host.add_output_bundle(1);
        host.instantiate(
            &t,
            &[xs.slice(0..1), xs.slice(1..2), ys.slice(2..3)],
            &[first],
        )
        .unwrap();
        host.instantiate(
            &t,
            &[ys.slice(0..1), xs.slice(3..4), xs.slice(2..3)],
            &[second],
        )
        .unwrap();
        assert_eq!(t, snapshot);

        for _ in 0..16 {
            let x = rng.gen_u128() % 16;
            let bit = |i: usize| (x >> i) & 1;
            let res = host.eval_u128(&[x]).unwrap();
            assert_eq!(res[0], (bit(0) & bit(1)) ^ (1 - bit(2)));
            assert_eq!(res[1], ((1 - bit(0)) & bit(3)) ^ bit(2));
        }
    }

    #[test]
    fn instantiate_rejects_aliasing() {
        let mut t = Circuit::new();
        let a = t.add_input_bundle(1)[0];
        let out = t.add_output_bundle(1);
        t.add_inv_to(a, out[0]).unwrap();

        let mut host = Circuit::new();
        let w = host.new_wire();
        let x = host.add_input_bundle(1);
        host.add_copy_to(x[0], w).unwrap();
        assert_eq!(
            host.instantiate(&t, &[Bundle::single(w)], &[Bundle::single(w)]),
            Err(CircuitError::AliasedBundles)
        );
        assert!(host.instantiate(&t, &[x.clone()], &[]).is_err());

        // two outputs bound to the same host wire
        let mut t = Circuit::new();
        let a = t.add_input_bundle(1)[0];
        let o1 = t.add_output_bundle(1);
        let o2 = t.add_output_bundle(1);
        t.add_inv_to(a, o1[0]).unwrap();
        t.add_copy_to(a, o2[0]).unwrap();
        let mut host = Circuit::new();
        let x = host.add_input_bundle(1);
        let o = host.add_output_bundle(1);
        assert_eq!(
            host.instantiate(&t, &[x.clone()], &[o.clone(), o.clone()]),
            Err(CircuitError::AliasedBundles)
        );
        assert_eq!(host.num_gates(), 0);
        let other = host.add_output_bundle(1);
        host.instantiate(&t, &[x], &[o, other]).unwrap();
        assert_eq!(host.eval_u128(&[1]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn failed_instantiate_leaves_host_untouched() {
        let mut t = Circuit::new();
        let a = t.add_input_bundle(2);
        let out = t.add_output_bundle(1);
        let mid = t.add_gate(a[0], a[1], GateType::And).unwrap();
        t.add_inv_to(mid, out[0]).unwrap();

        let mut host = Circuit::new();
        let x = host.add_input_bundle(1);
        let undriven = host.new_wire();
        let o = host.add_output_bundle(1);
        let (gates, wires) = (host.num_gates(), host.num_wires());
        assert_eq!(
            host.instantiate(&t, &[Bundle::new(vec![x[0], undriven])], &[o.clone()]),
            Err(CircuitError::UninitializedWire(undriven))
        );
        assert_eq!((host.num_gates(), host.num_wires()), (gates, wires));

        // writing into a host input
        let y = host.add_input_bundle(2);
        let (gates, wires) = (host.num_gates(), host.num_wires());
        assert_eq!(
            host.instantiate(&t, &[y], &[x.clone()]),
            Err(CircuitError::ReadOnlyWire(x[0]))
        );
        assert_eq!((host.num_gates(), host.num_wires()), (gates, wires));
    }

    #[test]
    fn bundle_helpers() {
        let b = Bundle::new((0..5).map(WireId).collect());
        assert_eq!(b.msb().unwrap(), WireId(4));
        assert_eq!(b.slice(1..3).wires(), &[WireId(1), WireId(2)]);
        assert!(Bundle::default().msb().is_err());
        assert!(Circuit::are_distinct(&b.slice(0..2), &b.slice(2..5)));
        assert!(!Circuit::are_distinct(&b.slice(0..3), &b.slice(2..5)));
    }
}

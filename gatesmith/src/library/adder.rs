//! Adders and subtractors.
//!
//! Two constructions compute the same function. The ripple-carry adder spends
//! one AND per bit and keeps its carry in a temporary, so its depth grows
//! linearly. The parallel-prefix adder combines (generate, propagate) pairs in a
//! Kogge-Stone network on fresh wires, trading gates for logarithmic depth.

use super::{
    check_distinct, check_nonempty, check_temps, check_width, extend, AdderType, IntType,
    Optimized,
};
use crate::{
    circuit::{Bundle, Circuit, GateType, WireId},
    errors::CircuitError,
};

/// Where the sum bits of an adder land.
#[derive(Clone, Copy)]
enum Sink<'a> {
    /// Every bit of the bundle.
    Full(&'a Bundle),
    /// Only bit `idx` of the sum, written to `out`.
    Bit { idx: usize, out: WireId },
}

impl Sink<'_> {
    fn width(&self) -> usize {
        match self {
            Sink::Full(b) => b.size(),
            Sink::Bit { idx, .. } => idx + 1,
        }
    }

    fn target(&self, i: usize) -> Option<WireId> {
        match *self {
            Sink::Full(b) => Some(b[i]),
            Sink::Bit { idx, out } => (i == idx).then_some(out),
        }
    }

    fn bundle(&self) -> Bundle {
        match *self {
            Sink::Full(b) => b.clone(),
            Sink::Bit { out, .. } => Bundle::single(out),
        }
    }
}

fn check_operands(a1: &Bundle, a2: &Bundle, sink: Sink) -> Result<(), CircuitError> {
    check_nonempty(&[a1, a2])?;
    let out = sink.bundle();
    check_nonempty(&[&out])?;
    check_distinct(&[&out], &[a1, a2])
}

/// Add or subtract `a1` and `a2` with a ripple-carry chain, writing the low
/// `out.size()` bits of the result into `out`.
///
/// Operands are extended to the output width according to `it`. `temps` must
/// hold at least two wires, disjoint from everything else; they are overwritten.
pub fn ripple_adder_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    temps: &Bundle,
    it: IntType,
    at: AdderType,
) -> Result<(), CircuitError> {
    check_operands(a1, a2, Sink::Full(out))?;
    ripple(cd, a1, a2, Sink::Full(out), temps, it, at)
}

fn ripple(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    sink: Sink,
    temps: &Bundle,
    it: IntType,
    at: AdderType,
) -> Result<(), CircuitError> {
    check_temps(temps, 2)?;
    check_distinct(&[temps], &[a1, a2, &sink.bundle()])?;
    let width = sink.width();
    let mut x = extend(cd, a1, width, it)?.wires().to_vec();
    let mut y = extend(cd, a2, width, it)?.wires().to_vec();
    let (carry, t) = (temps[0], temps[1]);

    // Subtraction is x + !y + 1: the initial carry is 1, so bit 0 is x0 ^ !y0 ^ 1.
    if let Some(o) = sink.target(0) {
        cd.add_gate_to(x[0], y[0], GateType::Xor, o)?;
    }
    if width > 1 {
        match at {
            AdderType::Addition => cd.add_gate_to(x[0], y[0], GateType::And, carry)?,
            AdderType::Subtraction => {
                cd.add_inv_to(y[0], t)?;
                cd.add_gate_to(x[0], t, GateType::Or, carry)?;
            }
        }
    }

    let half = match at {
        AdderType::Addition => GateType::Xor,
        AdderType::Subtraction => GateType::Nxor,
    };
    for i in 1..width {
        let last = i + 1 == width;
        if at == AdderType::Addition
            && cd.constant_value(x[i]).is_some()
            && cd.constant_value(y[i]).is_none()
        {
            std::mem::swap(&mut x[i], &mut y[i]);
        }

        // The effective addend bit is known: a half adder or its complement suffices.
        if let Some(v) = cd.constant_value(y[i]) {
            let one = v != (at == AdderType::Subtraction);
            let (sum, next) = if one {
                (GateType::Nxor, GateType::Or)
            } else {
                (GateType::Xor, GateType::And)
            };
            if let Some(o) = sink.target(i) {
                cd.add_gate_to(x[i], carry, sum, o)?;
            }
            if !last {
                cd.add_gate_to(x[i], carry, next, carry)?;
            }
            continue;
        }

        cd.add_gate_to(x[i], y[i], half, t)?;
        if let Some(o) = sink.target(i) {
            cd.add_gate_to(t, carry, GateType::Xor, o)?;
        }
        if !last {
            // carry = maj(x, y', carry) with a single AND
            cd.add_gate_to(x[i], carry, GateType::Xor, carry)?;
            cd.add_gate_to(carry, t, GateType::And, carry)?;
            cd.add_gate_to(carry, x[i], GateType::Xor, carry)?;
        }
    }
    Ok(())
}

/// Add or subtract `a1` and `a2` with a Kogge-Stone parallel-prefix network,
/// writing the low `out.size()` bits of the result into `out`.
///
/// All intermediate values live on fresh wires, so no temporaries are needed.
pub fn parallel_prefix_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
    at: AdderType,
) -> Result<(), CircuitError> {
    check_operands(a1, a2, Sink::Full(out))?;
    prefix(cd, a1, a2, Sink::Full(out), it, at)
}

fn prefix(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    sink: Sink,
    it: IntType,
    at: AdderType,
) -> Result<(), CircuitError> {
    let width = sink.width();
    let x = extend(cd, a1, width, it)?;
    let mut y = extend(cd, a2, width, it)?;
    if at == AdderType::Subtraction {
        y = y
            .iter()
            .map(|&w| cd.add_inv(w))
            .collect::<Result<Bundle, _>>()?;
    }

    let p = (0..width)
        .map(|i| cd.add_gate(x[i], y[i], GateType::Xor))
        .collect::<Result<Vec<_>, _>>()?;
    // the carry into bit i + 1 only needs generate bits below the top
    let mut g = (0..width - 1)
        .map(|i| cd.add_gate(x[i], y[i], GateType::And))
        .collect::<Result<Vec<_>, _>>()?;
    if at == AdderType::Subtraction && width > 1 {
        // the incoming carry of 1 makes bit 0 generate whenever it propagates
        g[0] = cd.add_gate(x[0], y[0], GateType::Or)?;
    }

    if let Some(o) = sink.target(0) {
        match at {
            AdderType::Addition => cd.add_copy_to(p[0], o)?,
            AdderType::Subtraction => cd.add_inv_to(p[0], o)?,
        }
    }
    match sink {
        Sink::Full(out) => {
            let carries = kogge_stone(cd, &g, &p[..width - 1])?;
            for i in 1..width {
                cd.add_gate_to(p[i], carries[i - 1], GateType::Xor, out[i])?;
            }
        }
        Sink::Bit { idx, out } if idx > 0 => {
            let carry = group_generate(cd, &g[..idx], &p[..idx])?;
            cd.add_gate_to(p[idx], carry, GateType::Xor, out)?;
        }
        Sink::Bit { .. } => (),
    }
    Ok(())
}

/// Prefix-combine `(g, p)` so that entry `i` of the result is the carry out of bit `i`.
fn kogge_stone(
    cd: &mut Circuit,
    g: &[WireId],
    p: &[WireId],
) -> Result<Vec<WireId>, CircuitError> {
    let n = g.len();
    let mut g = g.to_vec();
    let mut p = p.to_vec();
    let mut d = 1;
    while d < n {
        // descending, so `i - d` still holds the previous level
        for i in (d..n).rev() {
            let t = cd.add_gate(p[i], g[i - d], GateType::And)?;
            g[i] = cd.add_gate(g[i], t, GateType::Xor)?;
            if i >= 2 * d {
                p[i] = cd.add_gate(p[i], p[i - d], GateType::And)?;
            }
        }
        d *= 2;
    }
    Ok(g)
}

/// The carry out of the whole span, combined as a balanced tree.
fn group_generate(cd: &mut Circuit, g: &[WireId], p: &[WireId]) -> Result<WireId, CircuitError> {
    let mut nodes = g.iter().copied().zip(p.iter().copied()).collect::<Vec<_>>();
    while nodes.len() > 1 {
        let mut next = Vec::with_capacity((nodes.len() + 1) / 2);
        for (k, pair) in nodes.chunks(2).enumerate() {
            if let [(gl, pl), (gh, ph)] = *pair {
                let t = cd.add_gate(ph, gl, GateType::And)?;
                let g = cd.add_gate(gh, t, GateType::Xor)?;
                // the lowest span's propagate is never read
                let p = if k == 0 {
                    pl
                } else {
                    cd.add_gate(ph, pl, GateType::And)?
                };
                next.push((g, p));
            } else {
                next.push(pair[0]);
            }
        }
        nodes = next;
    }
    nodes
        .first()
        .map(|n| n.0)
        .ok_or(CircuitError::WidthMismatch { got: 0, needed: 1 })
}

/// `sum = a1 + a2`, truncated to `sum.size()` bits.
///
/// `Optimized::Size` uses [`ripple_adder_build`] and needs two temporaries;
/// `Optimized::Depth` uses [`parallel_prefix_build`] and ignores `temps`.
pub fn add_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    sum: &Bundle,
    temps: &Bundle,
    it: IntType,
    op: Optimized,
) -> Result<(), CircuitError> {
    match op {
        Optimized::Size => ripple_adder_build(cd, a1, a2, sum, temps, it, AdderType::Addition),
        Optimized::Depth => parallel_prefix_build(cd, a1, a2, sum, it, AdderType::Addition),
    }
}

/// `diff = a1 - a2`, truncated to `diff.size()` bits.
pub fn subtract_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    diff: &Bundle,
    temps: &Bundle,
    it: IntType,
    op: Optimized,
) -> Result<(), CircuitError> {
    match op {
        Optimized::Size => ripple_adder_build(cd, a1, a2, diff, temps, it, AdderType::Subtraction),
        Optimized::Depth => parallel_prefix_build(cd, a1, a2, diff, it, AdderType::Subtraction),
    }
}

/// Compute only bit `bit_idx` of `a1 + a2` or `a1 - a2` into the single wire of `bit`.
///
/// Operands are extended to `bit_idx + 1` bits, so with `bit_idx` equal to the
/// operand width this yields the sign of the untruncated result.
pub fn extract_bit_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    bit: &Bundle,
    temps: &Bundle,
    bit_idx: usize,
    it: IntType,
    at: AdderType,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_width(bit, 1)?;
    let sink = Sink::Bit {
        idx: bit_idx,
        out: bit[0],
    };
    check_operands(a1, a2, sink)?;
    match op {
        Optimized::Size => ripple(cd, a1, a2, sink, temps, it, at),
        Optimized::Depth => prefix(cd, a1, a2, sink, it, at),
    }
}

//! Bitwise operations, the multiplexer and plain copies.

use super::{check_distinct, check_nonempty, check_temps, check_width, extend, IntType};
use crate::{
    circuit::{Bundle, Circuit, GateType, WireId},
    errors::CircuitError,
};

/// `out = !a1`, with `a1` sign-extended or truncated to the width of `out`.
pub fn bitwise_invert_build(cd: &mut Circuit, a1: &Bundle, out: &Bundle) -> Result<(), CircuitError> {
    check_nonempty(&[a1])?;
    check_distinct(&[out], &[a1])?;
    let x = extend(cd, a1, out.size(), IntType::TwosComplement)?;
    for (&xi, &oi) in x.iter().zip(out.iter()) {
        cd.add_inv_to(xi, oi)?;
    }
    Ok(())
}

fn bitwise(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
    ty: GateType,
) -> Result<(), CircuitError> {
    check_nonempty(&[a1, a2])?;
    check_distinct(&[out], &[a1, a2])?;
    let x = extend(cd, a1, out.size(), it)?;
    let y = extend(cd, a2, out.size(), it)?;
    for i in 0..out.size() {
        cd.add_gate_to(x[i], y[i], ty, out[i])?;
    }
    Ok(())
}

/// `out = a1 & a2`, operands extended or truncated to the width of `out`.
pub fn bitwise_and_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
) -> Result<(), CircuitError> {
    bitwise(cd, a1, a2, out, it, GateType::And)
}

/// `out = a1 | a2`.
pub fn bitwise_or_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
) -> Result<(), CircuitError> {
    bitwise(cd, a1, a2, out, it, GateType::Or)
}

/// `out = a1 ^ a2`.
pub fn bitwise_xor_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
) -> Result<(), CircuitError> {
    bitwise(cd, a1, a2, out, it, GateType::Xor)
}

/// `out = if choice { if_true } else { if_false }`, one AND per bit.
///
/// `choice` holds exactly one wire and the other three bundles share a width.
/// `temps` needs one wire.
pub fn multiplex_build(
    cd: &mut Circuit,
    if_true: &Bundle,
    if_false: &Bundle,
    choice: &Bundle,
    out: &Bundle,
    temps: &Bundle,
) -> Result<(), CircuitError> {
    check_width(choice, 1)?;
    check_width(if_false, if_true.size())?;
    check_width(out, if_true.size())?;
    check_temps(temps, 1)?;
    check_distinct(&[out], &[if_true, if_false, choice])?;
    check_distinct(&[temps], &[if_true, if_false, choice, out])?;
    let tmp = temps[0];
    for i in 0..out.size() {
        cd.add_gate_to(if_true[i], if_false[i], GateType::Xor, tmp)?;
        cd.add_gate_to(tmp, choice[0], GateType::And, tmp)?;
        cd.add_gate_to(tmp, if_false[i], GateType::Xor, out[i])?;
    }
    Ok(())
}

/// [`multiplex_build`] onto fresh wires. Constant inputs fold away, so choosing
/// between a bundle and zero costs exactly one AND per bit.
pub(crate) fn multiplex(
    cd: &mut Circuit,
    if_true: &Bundle,
    if_false: &Bundle,
    choice: WireId,
) -> Result<Bundle, CircuitError> {
    check_width(if_false, if_true.size())?;
    if_true
        .iter()
        .zip(if_false.iter())
        .map(|(&t, &f)| {
            let d = cd.add_gate(t, f, GateType::Xor)?;
            let d = cd.add_gate(d, choice, GateType::And)?;
            cd.add_gate(d, f, GateType::Xor)
        })
        .collect()
}

/// Copy `src` into `out`, extending or truncating it according to `it`.
pub(crate) fn copy_build(
    cd: &mut Circuit,
    src: &Bundle,
    out: &Bundle,
    it: IntType,
) -> Result<(), CircuitError> {
    let x = extend(cd, src, out.size(), it)?;
    for (&xi, &oi) in x.iter().zip(out.iter()) {
        cd.add_copy_to(xi, oi)?;
    }
    Ok(())
}

/// OR together all of `wires` in a balanced tree.
pub(crate) fn or_tree(cd: &mut Circuit, wires: &[WireId]) -> Result<WireId, CircuitError> {
    if wires.is_empty() {
        return Err(CircuitError::WidthMismatch { got: 0, needed: 1 });
    }
    let mut level = wires.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match *pair {
                [x, y] => cd.add_gate(x, y, GateType::Or),
                _ => Ok(pair[0]),
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(level[0])
}

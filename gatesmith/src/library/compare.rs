//! Equality and ordering.

use super::{
    bitwise::or_tree, check_distinct, check_nonempty, check_width, extract_bit_build, AdderType,
    IntType, Optimized,
};
use crate::{
    circuit::{Bundle, Circuit, GateType, WireId},
    errors::CircuitError,
};

/// `out = (a1 == 0)`.
pub fn is_zero_build(cd: &mut Circuit, a1: &Bundle, out: &Bundle) -> Result<(), CircuitError> {
    check_width(out, 1)?;
    check_distinct(&[out], &[a1])?;
    let any = or_tree(cd, a1.wires())?;
    cd.add_inv_to(any, out[0])
}

fn differences(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
) -> Result<Vec<WireId>, CircuitError> {
    check_width(out, 1)?;
    check_width(a2, a1.size())?;
    check_distinct(&[out], &[a1, a2])?;
    a1.iter()
        .zip(a2.iter())
        .map(|(&x, &y)| cd.add_gate(x, y, GateType::Xor))
        .collect()
}

/// `out = (a1 == a2)` for bundles of equal width.
pub fn eq_build(cd: &mut Circuit, a1: &Bundle, a2: &Bundle, out: &Bundle) -> Result<(), CircuitError> {
    let diffs = differences(cd, a1, a2, out)?;
    let any = or_tree(cd, &diffs)?;
    cd.add_inv_to(any, out[0])
}

/// `out = (a1 != a2)` for bundles of equal width.
pub fn neq_build(cd: &mut Circuit, a1: &Bundle, a2: &Bundle, out: &Bundle) -> Result<(), CircuitError> {
    let diffs = differences(cd, a1, a2, out)?;
    let any = or_tree(cd, &diffs)?;
    cd.add_copy_to(any, out[0])
}

/// `out = (a1 < a2)`: the sign of `a1 - a2` taken one bit wider than the wider
/// operand, so the subtraction cannot overflow.
pub fn less_than_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_width(out, 1)?;
    check_nonempty(&[a1, a2])?;
    let temps = match op {
        Optimized::Size => cd.add_temp_bundle(2),
        Optimized::Depth => Bundle::default(),
    };
    let idx = a1.size().max(a2.size());
    extract_bit_build(cd, a1, a2, out, &temps, idx, it, AdderType::Subtraction, op)
}

/// `out = (a1 >= a2)`, the complement of [`less_than_build`].
pub fn greater_than_eq_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    out: &Bundle,
    it: IntType,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_width(out, 1)?;
    let lt = cd.new_bundle(1);
    less_than_build(cd, a1, a2, &lt, it, op)?;
    cd.add_inv_to(lt[0], out[0])
}

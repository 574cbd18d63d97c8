//! Restoring long division.

use super::{
    bitwise::{copy_build, multiplex_build},
    check_distinct, check_nonempty,
    sign::{add_sign_build, remove_sign_build},
    subtract_build, IntType, Optimized,
};
use crate::{
    circuit::{Bundle, Circuit, GateType},
    errors::CircuitError,
};
use std::iter;

/// Divide `a1` by `a2`, writing the quotient into `quot` and the remainder into `rem`.
///
/// Signed division truncates toward zero and the remainder takes the sign of the
/// dividend, so `a1 == quot * a2 + rem` always holds. Dividing by zero yields an
/// unspecified result rather than an error: the circuit cannot branch on data.
pub fn div_rem_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    quot: &Bundle,
    rem: &Bundle,
    it: IntType,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_nonempty(&[a1, a2, quot, rem])?;
    check_distinct(&[quot, rem], &[a1, a2])?;
    check_distinct(&[quot], &[rem])?;
    match it {
        IntType::Unsigned => unsigned_div_rem(cd, a1, a2, quot, rem, op),
        IntType::TwosComplement => {
            let temps = cd.add_temp_bundle(temp_width(op));
            let ma = cd.new_bundle(a1.size());
            remove_sign_build(cd, a1, &ma, &temps, op)?;
            let mb = cd.new_bundle(a2.size());
            remove_sign_build(cd, a2, &mb, &temps, op)?;

            let mq = cd.new_bundle(a1.size());
            let mr = cd.new_bundle(a2.size());
            unsigned_div_rem(cd, &ma, &mb, &mq, &mr, op)?;

            let quot_sign = cd.add_gate(a1.msb()?, a2.msb()?, GateType::Xor)?;
            add_sign_build(cd, &mq, &Bundle::single(quot_sign), quot, &temps, op)?;
            add_sign_build(cd, &mr, &Bundle::single(a1.msb()?), rem, &temps, op)
        }
    }
}

/// The ripple subtractor needs two temps; the multiplexer needs one in either mode.
fn temp_width(op: Optimized) -> usize {
    match op {
        Optimized::Size => 2,
        Optimized::Depth => 1,
    }
}

/// One trial subtraction per dividend bit, most significant first.
fn unsigned_div_rem(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    quot: &Bundle,
    rem: &Bundle,
    op: Optimized,
) -> Result<(), CircuitError> {
    let n = a2.size();
    let temps = cd.add_temp_bundle(temp_width(op));
    let zero = cd.constant(false);
    let mut remainder = Bundle::new(vec![zero; n]);
    let mut q = vec![zero; a1.size()];

    for i in (0..a1.size()).rev() {
        let shifted: Bundle = iter::once(a1[i]).chain(remainder.iter().copied()).collect();
        // two extra bits so the top one is the borrow
        let diff = cd.new_bundle(n + 2);
        subtract_build(cd, &shifted, a2, &diff, &temps, IntType::Unsigned, op)?;
        let borrow = diff[n + 1];
        q[i] = cd.add_inv(borrow)?;

        // keep the shifted remainder when the subtraction went negative
        let next = cd.new_bundle(n);
        multiplex_build(
            cd,
            &shifted.slice(0..n),
            &diff.slice(0..n),
            &Bundle::single(borrow),
            &next,
            &temps,
        )?;
        remainder = next;
    }

    copy_build(cd, &Bundle::new(q), quot, IntType::Unsigned)?;
    copy_build(cd, &remainder, rem, IntType::Unsigned)
}

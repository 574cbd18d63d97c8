//! Shift-and-add multiplication.

use super::{
    add_build,
    bitwise::{copy_build, multiplex},
    check_distinct, check_nonempty, extend,
    sign::{add_sign_build, remove_sign_build},
    IntType, Optimized,
};
use crate::{
    circuit::{Bundle, Circuit, GateType},
    errors::CircuitError,
};

/// A shifted partial sum: the value is `bits << shift`.
type Term = (usize, Bundle);

/// `prod = a1 * a2`, truncated to `prod.size()` bits.
///
/// Each bit of `a2` selects `a1` or zero, shifted into place. `Optimized::Size`
/// accumulates the partial products one after another with ripple adders;
/// `Optimized::Depth` sums them pairwise in a balanced tree of parallel-prefix
/// adders. Signed operands are multiplied as magnitudes and the sign is
/// reapplied at the end.
pub fn mult_build(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    prod: &Bundle,
    op: Optimized,
    it: IntType,
) -> Result<(), CircuitError> {
    check_nonempty(&[a1, a2, prod])?;
    check_distinct(&[prod], &[a1, a2])?;
    match it {
        IntType::Unsigned => unsigned_mult(cd, a1, a2, prod, op),
        IntType::TwosComplement => {
            let temps = cd.add_temp_bundle(2);
            let ma = cd.new_bundle(a1.size());
            remove_sign_build(cd, a1, &ma, &temps, op)?;
            let mb = cd.new_bundle(a2.size());
            remove_sign_build(cd, a2, &mb, &temps, op)?;
            let magnitude = cd.new_bundle(prod.size());
            unsigned_mult(cd, &ma, &mb, &magnitude, op)?;
            let sign = cd.add_gate(a1.msb()?, a2.msb()?, GateType::Xor)?;
            add_sign_build(cd, &magnitude, &Bundle::single(sign), prod, &temps, op)
        }
    }
}

fn unsigned_mult(
    cd: &mut Circuit,
    a1: &Bundle,
    a2: &Bundle,
    prod: &Bundle,
    op: Optimized,
) -> Result<(), CircuitError> {
    let width = prod.size();
    let temps = match op {
        Optimized::Size => cd.add_temp_bundle(2),
        Optimized::Depth => Bundle::default(),
    };

    let mut terms: Vec<Term> = Vec::new();
    for (shift, &bit) in a2.iter().enumerate().take(width) {
        let shifted = a1.slice(0..a1.size().min(width - shift));
        let zero = cd.constant_bundle(0, shifted.size());
        terms.push((shift, multiplex(cd, &shifted, &zero, bit)?));
    }

    let total = match op {
        Optimized::Size => {
            let mut terms = terms.into_iter();
            let mut acc = terms
                .next()
                .ok_or(CircuitError::WidthMismatch { got: 0, needed: 1 })?;
            for t in terms {
                acc = accumulate(cd, acc, t, width, &temps, op)?;
            }
            acc
        }
        Optimized::Depth => {
            while terms.len() > 1 {
                let mut next = Vec::with_capacity((terms.len() + 1) / 2);
                let mut level = terms.into_iter();
                while let Some(lo) = level.next() {
                    match level.next() {
                        Some(hi) => next.push(accumulate(cd, lo, hi, width, &temps, op)?),
                        None => next.push(lo),
                    }
                }
                terms = next;
            }
            terms
                .pop()
                .ok_or(CircuitError::WidthMismatch { got: 0, needed: 1 })?
        }
    };
    debug_assert_eq!(total.0, 0);
    copy_build(cd, &total.1, prod, IntType::Unsigned)
}

/// Add two terms, `lo` shifted no further than `hi`. Bits of `lo` below `hi`'s
/// shift pass through untouched, and the sum is cut off at `width`.
fn accumulate(
    cd: &mut Circuit,
    lo: Term,
    hi: Term,
    width: usize,
    temps: &Bundle,
    op: Optimized,
) -> Result<Term, CircuitError> {
    let (lo_shift, a) = lo;
    let (hi_shift, b) = hi;
    let gap = hi_shift - lo_shift;
    let mut bits = extend(cd, &a, gap, IntType::Unsigned)?;
    let sum = cd.new_bundle(width - hi_shift);
    if !sum.is_empty() {
        let upper = if a.size() > gap {
            a.slice(gap..a.size())
        } else {
            cd.constant_bundle(0, 1)
        };
        add_build(cd, &upper, &b, &sum, temps, IntType::Unsigned, op)?;
    }
    bits.append(&sum);
    Ok((lo_shift, bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{mask, sign_extend, RngExt};
    use proptest::prelude::*;
    use rand::thread_rng;

    const NITERS: usize = 32;

    fn multiplier(wa: usize, wb: usize, wc: usize, it: IntType, op: Optimized) -> Circuit {
        let mut cd = Circuit::new();
        let a = cd.add_input_bundle(wa);
        let b = cd.add_input_bundle(wb);
        let c = cd.add_output_bundle(wc);
        mult_build(&mut cd, &a, &b, &c, op, it).unwrap();
        cd
    }

    #[test]
    fn thirteen_times_eleven() {
        for op in [Optimized::Size, Optimized::Depth] {
            let cd = multiplier(8, 8, 8, IntType::Unsigned, op);
            assert_eq!(cd.eval_u128(&[13, 11]).unwrap(), vec![143]);
        }
    }

    #[test]
    fn random_products() {
        let mut rng = thread_rng();
        for _ in 0..NITERS {
            let wa = rng.gen_usize() % 9 + 1;
            let wb = rng.gen_usize() % 9 + 1;
            let wc = rng.gen_usize() % 18 + 1;
            for op in [Optimized::Size, Optimized::Depth] {
                let unsigned = multiplier(wa, wb, wc, IntType::Unsigned, op);
                let signed = multiplier(wa, wb, wc, IntType::TwosComplement, op);
                for _ in 0..8 {
                    let (x, y) = (rng.gen_bits(wa), rng.gen_bits(wb));
                    assert_eq!(
                        unsigned.eval_u128(&[x, y]).unwrap(),
                        vec![mask(x * y, wc)],
                        "{} * {} at {} bits",
                        x,
                        y,
                        wc
                    );
                    let (sx, sy) = (sign_extend(x, wa), sign_extend(y, wb));
                    assert_eq!(
                        signed.eval_u128(&[x, y]).unwrap(),
                        vec![mask((sx * sy) as u128, wc)],
                        "{} * {} at {} bits",
                        sx,
                        sy,
                        wc
                    );
                }
            }
        }
    }

    #[test]
    fn depth_mode_is_shallower() {
        let size = multiplier(32, 32, 32, IntType::Unsigned, Optimized::Size);
        let depth = multiplier(32, 32, 32, IntType::Unsigned, Optimized::Depth);
        assert!(depth.stats().depth() < size.stats().depth());
    }

    proptest! {
        #[test]
        fn modes_agree(x in 0u128..1 << 12, y in 0u128..1 << 12) {
            let size = multiplier(12, 12, 24, IntType::TwosComplement, Optimized::Size);
            let depth = multiplier(12, 12, 24, IntType::TwosComplement, Optimized::Depth);
            prop_assert_eq!(size.eval_u128(&[x, y]).unwrap(), depth.eval_u128(&[x, y]).unwrap());
        }
    }
}

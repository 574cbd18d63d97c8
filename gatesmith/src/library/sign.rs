//! Conversions between two's-complement values and sign/magnitude pairs.

use super::{
    add_build,
    bitwise::{copy_build, multiplex_build},
    check_distinct, check_nonempty, check_width, extend, IntType, Optimized,
};
use crate::{
    circuit::{Bundle, Circuit},
    errors::CircuitError,
};

/// `out = -a1` in two's complement, computed as `!a1 + 1` at the width of `out`.
///
/// `a1` is sign-extended first. `temps` is handed to the adder.
pub fn negate_build(
    cd: &mut Circuit,
    a1: &Bundle,
    out: &Bundle,
    temps: &Bundle,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_nonempty(&[a1, out])?;
    let x = extend(cd, a1, out.size(), IntType::TwosComplement)?;
    let inverted = x
        .iter()
        .map(|&w| cd.add_inv(w))
        .collect::<Result<Bundle, _>>()?;
    let one = Bundle::single(cd.constant(true));
    add_build(cd, &inverted, &one, out, temps, IntType::Unsigned, op)
}

/// Write the absolute value of the signed `a1` into `out`, zero-extended.
///
/// The most negative value maps to itself, which is correct when read as unsigned.
pub fn remove_sign_build(
    cd: &mut Circuit,
    a1: &Bundle,
    out: &Bundle,
    temps: &Bundle,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_nonempty(&[a1, out])?;
    check_distinct(&[out], &[a1, temps])?;
    let sign = Bundle::single(a1.msb()?);
    let negated = cd.new_bundle(a1.size());
    negate_build(cd, a1, &negated, temps, op)?;
    if out.size() == a1.size() {
        return multiplex_build(cd, &negated, a1, &sign, out, temps);
    }
    let magnitude = cd.new_bundle(a1.size());
    multiplex_build(cd, &negated, a1, &sign, &magnitude, temps)?;
    copy_build(cd, &magnitude, out, IntType::Unsigned)
}

/// Treat `a1` as an unsigned magnitude and negate it when the single wire of
/// `sign` is set, writing the result into `out`.
pub fn add_sign_build(
    cd: &mut Circuit,
    a1: &Bundle,
    sign: &Bundle,
    out: &Bundle,
    temps: &Bundle,
    op: Optimized,
) -> Result<(), CircuitError> {
    check_width(sign, 1)?;
    check_nonempty(&[a1, out])?;
    let magnitude = extend(cd, a1, out.size(), IntType::Unsigned)?;
    let negated = cd.new_bundle(out.size());
    negate_build(cd, &magnitude, &negated, temps, op)?;
    multiplex_build(cd, &negated, &magnitude, sign, out, temps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{mask, sign_extend, RngExt};
    use rand::thread_rng;

    const NITERS: usize = 128;

    #[test]
    fn negate_twice_is_identity() {
        let mut rng = thread_rng();
        for op in [Optimized::Size, Optimized::Depth] {
            let mut cd = Circuit::new();
            let a = cd.add_input_bundle(12);
            let once = cd.add_output_bundle(12);
            let twice = cd.add_output_bundle(12);
            let temps = cd.add_temp_bundle(2);
            negate_build(&mut cd, &a, &once, &temps, op).unwrap();
            negate_build(&mut cd, &once, &twice, &temps, op).unwrap();
            for _ in 0..NITERS {
                let x = rng.gen_bits(12);
                let res = cd.eval_u128(&[x]).unwrap();
                assert_eq!(res[0], mask(-sign_extend(x, 12) as u128, 12));
                assert_eq!(res[1], x);
            }
        }
    }

    #[test]
    fn negate_widens() {
        let mut cd = Circuit::new();
        let a = cd.add_input_bundle(4);
        let out = cd.add_output_bundle(8);
        let temps = cd.add_temp_bundle(2);
        negate_build(&mut cd, &a, &out, &temps, Optimized::Size).unwrap();
        // -(-8) = 8 needs the wider output
        assert_eq!(cd.eval_u128(&[0b1000]).unwrap(), vec![8]);
        assert_eq!(cd.eval_u128(&[3]).unwrap(), vec![mask(-3i128 as u128, 8)]);
    }

    #[test]
    fn sign_roundtrip() {
        let mut rng = thread_rng();
        for op in [Optimized::Size, Optimized::Depth] {
            let mut cd = Circuit::new();
            let a = cd.add_input_bundle(10);
            let magnitude = cd.add_output_bundle(12);
            let restored = cd.add_output_bundle(10);
            let temps = cd.add_temp_bundle(2);
            remove_sign_build(&mut cd, &a, &magnitude, &temps, op).unwrap();
            let sign = Bundle::single(a.msb().unwrap());
            add_sign_build(&mut cd, &magnitude, &sign, &restored, &temps, op).unwrap();
            for _ in 0..NITERS {
                let x = rng.gen_bits(10);
                let res = cd.eval_u128(&[x]).unwrap();
                assert_eq!(res[0], sign_extend(x, 10).unsigned_abs());
                assert_eq!(res[1], x);
            }
        }
    }

    #[test]
    fn magnitude_and_sign_survive_add_then_remove() {
        let mut rng = thread_rng();
        let mut cd = Circuit::new();
        let magnitude = cd.add_input_bundle(8);
        let sign = cd.add_input_bundle(1);
        let signed = cd.add_output_bundle(8);
        let restored = cd.add_output_bundle(8);
        let temps = cd.add_temp_bundle(2);
        add_sign_build(&mut cd, &magnitude, &sign, &signed, &temps, Optimized::Depth).unwrap();
        remove_sign_build(&mut cd, &signed, &restored, &temps, Optimized::Depth).unwrap();
        for _ in 0..NITERS {
            // below 2^7 so the magnitude is representable with either sign
            let m = rng.gen_bits(7);
            let s = if m == 0 { 0 } else { rng.gen_bits(1) };
            let res = cd.eval_u128(&[m, s]).unwrap();
            assert_eq!(res[1], m);
            assert_eq!((res[0] >> 7) & 1, s);
        }
    }

    #[test]
    fn remove_sign_rejects_aliased_output() {
        for out_width in [6, 8] {
            let mut cd = Circuit::new();
            let a = cd.add_input_bundle(6);
            let out = cd.add_output_bundle(out_width - 6);
            let temps = cd.add_temp_bundle(2);
            let overlapping: Bundle = a.iter().chain(out.iter()).copied().collect();
            assert_eq!(
                remove_sign_build(&mut cd, &a, &overlapping, &temps, Optimized::Size),
                Err(CircuitError::AliasedBundles)
            );
            let into_temps: Bundle = temps.iter().chain(out.iter()).copied().collect();
            assert_eq!(
                remove_sign_build(&mut cd, &a, &into_temps.slice(0..1), &temps, Optimized::Size),
                Err(CircuitError::AliasedBundles)
            );
        }
    }

    #[test]
    fn add_sign_needs_one_sign_wire() {
        let mut cd = Circuit::new();
        let a = cd.add_input_bundle(4);
        let s = cd.add_input_bundle(2);
        let out = cd.add_output_bundle(4);
        let temps = cd.add_temp_bundle(2);
        assert_eq!(
            add_sign_build(&mut cd, &a, &s, &out, &temps, Optimized::Size),
            Err(CircuitError::WidthMismatch { got: 2, needed: 1 })
        );
    }
}

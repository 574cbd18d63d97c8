//! AES-128 building blocks over bit bundles.
//!
//! A 128-bit state holds byte `j` on bits `8j..8j + 8`, least-significant bit
//! first, with bytes in column-major order: byte `r + 4c` is row `r` of column
//! `c`. This matches the byte order of the plaintext and key as usually written.

use super::{check_distinct, check_width};
use crate::{
    circuit::{Bundle, Circuit, GateType, WireId},
    errors::CircuitError,
};

/// The AES substitution table.
pub const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// Expand a 128-bit key into the eleven round keys the circuit consumes.
pub fn expand_key_128(key: &[u8; 16]) -> [u8; 176] {
    let mut out = [0u8; 176];
    out[..16].copy_from_slice(key);
    for i in 4..44 {
        let mut word = [out[4 * i - 4], out[4 * i - 3], out[4 * i - 2], out[4 * i - 1]];
        if i % 4 == 0 {
            word.rotate_left(1);
            for b in word.iter_mut() {
                *b = SBOX[*b as usize];
            }
            word[0] ^= RCON[i / 4 - 1];
        }
        for k in 0..4 {
            out[4 * i + k] = out[4 * (i - 4) + k] ^ word[k];
        }
    }
    out
}

fn xor(cd: &mut Circuit, x: WireId, y: WireId) -> Result<WireId, CircuitError> {
    cd.add_gate(x, y, GateType::Xor)
}

fn and(cd: &mut Circuit, x: WireId, y: WireId) -> Result<WireId, CircuitError> {
    cd.add_gate(x, y, GateType::And)
}

/// Substitute one byte: 34 ANDs, depth 16.
///
/// This is the Boyar-Peralta network. It names input bits from the most
/// significant down, so `u[k]` is bit `7 - k` of the byte.
pub fn aes_sbox_build(cd: &mut Circuit, input: &Bundle, out: &Bundle) -> Result<(), CircuitError> {
    check_width(input, 8)?;
    check_width(out, 8)?;
    check_distinct(&[out], &[input])?;
    let u: [WireId; 8] = std::array::from_fn(|k| input[7 - k]);

    let t1 = xor(cd, u[0], u[3])?;
    let t2 = xor(cd, u[0], u[5])?;
    let t3 = xor(cd, u[0], u[6])?;
    let t4 = xor(cd, u[3], u[5])?;
    let t5 = xor(cd, u[4], u[6])?;
    let t6 = xor(cd, t1, t5)?;
    let t7 = xor(cd, u[1], u[2])?;
    let t8 = xor(cd, u[7], t6)?;
    let t9 = xor(cd, u[7], t7)?;
    let t10 = xor(cd, t6, t7)?;
    let t11 = xor(cd, u[1], u[5])?;
    let t12 = xor(cd, u[2], u[5])?;
    let t13 = xor(cd, t3, t4)?;
    let t14 = xor(cd, t6, t11)?;
    let t15 = xor(cd, t5, t11)?;
    let t16 = xor(cd, t5, t12)?;
    let t17 = xor(cd, t9, t16)?;
    let t18 = xor(cd, u[3], u[7])?;
    let t19 = xor(cd, t7, t18)?;
    let t20 = xor(cd, t1, t19)?;
    let t21 = xor(cd, u[6], u[7])?;
    let t22 = xor(cd, t7, t21)?;
    let t23 = xor(cd, t2, t22)?;
    let t24 = xor(cd, t2, t10)?;
    let t25 = xor(cd, t20, t17)?;
    let t26 = xor(cd, t3, t16)?;
    let t27 = xor(cd, t1, t12)?;
    let m1 = and(cd, t13, t6)?;
    let m2 = and(cd, t23, t8)?;
    let m3 = xor(cd, t14, m1)?;
    let m4 = and(cd, t19, u[7])?;
    let m5 = xor(cd, m4, m1)?;
    let m6 = and(cd, t3, t16)?;
    let m7 = and(cd, t22, t9)?;
    let m8 = xor(cd, t26, m6)?;
    let m9 = and(cd, t20, t17)?;
    let m10 = xor(cd, m9, m6)?;
    let m11 = and(cd, t1, t15)?;
    let m12 = and(cd, t4, t27)?;
    let m13 = xor(cd, m12, m11)?;
    let m14 = and(cd, t2, t10)?;
    let m15 = xor(cd, m14, m11)?;
    let m16 = xor(cd, m3, m2)?;
    let m17 = xor(cd, m5, t24)?;
    let m18 = xor(cd, m8, m7)?;
    let m19 = xor(cd, m10, m15)?;
    let m20 = xor(cd, m16, m13)?;
    let m21 = xor(cd, m17, m15)?;
    let m22 = xor(cd, m18, m13)?;
    let m23 = xor(cd, m19, t25)?;
    let m24 = xor(cd, m22, m23)?;
    let m25 = and(cd, m22, m20)?;
    let m26 = xor(cd, m21, m25)?;
    let m27 = xor(cd, m20, m21)?;
    let m28 = xor(cd, m23, m25)?;
    let m29 = and(cd, m28, m27)?;
    let m30 = and(cd, m26, m24)?;
    let m31 = and(cd, m20, m23)?;
    let m32 = and(cd, m27, m31)?;
    let m33 = xor(cd, m27, m25)?;
    let m34 = and(cd, m21, m22)?;
    let m35 = and(cd, m24, m34)?;
    let m36 = xor(cd, m24, m25)?;
    let m37 = xor(cd, m21, m29)?;
    let m38 = xor(cd, m32, m33)?;
    let m39 = xor(cd, m23, m30)?;
    let m40 = xor(cd, m35, m36)?;
    let m41 = xor(cd, m38, m40)?;
    let m42 = xor(cd, m37, m39)?;
    let m43 = xor(cd, m37, m38)?;
    let m44 = xor(cd, m39, m40)?;
    let m45 = xor(cd, m42, m41)?;
    let m46 = and(cd, m44, t6)?;
    let m47 = and(cd, m40, t8)?;
    let m48 = and(cd, m39, u[7])?;
    let m49 = and(cd, m43, t16)?;
    let m50 = and(cd, m38, t9)?;
    let m51 = and(cd, m37, t17)?;
    let m52 = and(cd, m42, t15)?;
    let m53 = and(cd, m45, t27)?;
    let m54 = and(cd, m41, t10)?;
    let m55 = and(cd, m44, t13)?;
    let m56 = and(cd, m40, t23)?;
    let m57 = and(cd, m39, t19)?;
    let m58 = and(cd, m43, t3)?;
    let m59 = and(cd, m38, t22)?;
    let m60 = and(cd, m37, t20)?;
    let m61 = and(cd, m42, t1)?;
    let m62 = and(cd, m45, t4)?;
    let m63 = and(cd, m41, t2)?;
    let l0 = xor(cd, m61, m62)?;
    let l1 = xor(cd, m50, m56)?;
    let l2 = xor(cd, m46, m48)?;
    let l3 = xor(cd, m47, m55)?;
    let l4 = xor(cd, m54, m58)?;
    let l5 = xor(cd, m49, m61)?;
    let l6 = xor(cd, m62, l5)?;
    let l7 = xor(cd, m46, l3)?;
    let l8 = xor(cd, m51, m59)?;
    let l9 = xor(cd, m52, m53)?;
    let l10 = xor(cd, m53, l4)?;
    let l11 = xor(cd, m60, l2)?;
    let l12 = xor(cd, m48, m51)?;
    let l13 = xor(cd, m50, l0)?;
    let l14 = xor(cd, m52, m61)?;
    let l15 = xor(cd, m55, l1)?;
    let l16 = xor(cd, m56, l0)?;
    let l17 = xor(cd, m57, l1)?;
    let l18 = xor(cd, m58, l8)?;
    let l19 = xor(cd, m63, l4)?;
    let l20 = xor(cd, l0, l1)?;
    let l21 = xor(cd, l1, l7)?;
    let l22 = xor(cd, l3, l12)?;
    let l23 = xor(cd, l18, l2)?;
    let l24 = xor(cd, l15, l9)?;
    let l25 = xor(cd, l6, l10)?;
    let l26 = xor(cd, l7, l9)?;
    let l27 = xor(cd, l8, l10)?;
    let l28 = xor(cd, l11, l14)?;
    let l29 = xor(cd, l11, l17)?;
    cd.add_gate_to(l6, l24, GateType::Xor, out[7])?;
    cd.add_gate_to(l16, l26, GateType::Nxor, out[6])?;
    cd.add_gate_to(l19, l28, GateType::Nxor, out[5])?;
    cd.add_gate_to(l6, l21, GateType::Xor, out[4])?;
    cd.add_gate_to(l20, l22, GateType::Xor, out[3])?;
    cd.add_gate_to(l25, l29, GateType::Xor, out[2])?;
    cd.add_gate_to(l13, l27, GateType::Nxor, out[1])?;
    cd.add_gate_to(l6, l23, GateType::Nxor, out[0])?;
    Ok(())
}

/// Rotate row `r` of the state left by `r` bytes. Only wires move, so this adds no gates.
pub fn aes_shift_rows(state: &Bundle) -> Result<Bundle, CircuitError> {
    check_width(state, 128)?;
    Ok((0..16)
        .flat_map(|j| {
            let (r, c) = (j % 4, j / 4);
            let src = r + 4 * ((c + r) % 4);
            state.wires()[8 * src..8 * src + 8].iter().copied()
        })
        .collect())
}

fn byte(state: &Bundle, j: usize) -> &[WireId] {
    &state.wires()[8 * j..8 * j + 8]
}

/// Multiply a byte by `x` in GF(2^8).
fn xtime(cd: &mut Circuit, b: &[WireId]) -> Result<[WireId; 8], CircuitError> {
    Ok([
        b[7],
        xor(cd, b[0], b[7])?,
        b[1],
        xor(cd, b[2], b[7])?,
        xor(cd, b[3], b[7])?,
        b[4],
        b[5],
        b[6],
    ])
}

/// Mix each column of `state` into `out`, using only XORs.
pub fn aes_mix_columns_build(
    cd: &mut Circuit,
    state: &Bundle,
    out: &Bundle,
) -> Result<(), CircuitError> {
    check_width(state, 128)?;
    check_width(out, 128)?;
    check_distinct(&[out], &[state])?;
    for c in 0..4 {
        let a = [0, 1, 2, 3].map(|r| byte(state, 4 * c + r));
        // u[r] = a[r] ^ a[r + 1]; the column parity is u[0] ^ u[2]
        let mut u = Vec::with_capacity(4);
        for r in 0..4 {
            let pair = (0..8)
                .map(|k| xor(cd, a[r][k], a[(r + 1) % 4][k]))
                .collect::<Result<Vec<_>, _>>()?;
            u.push(pair);
        }
        let parity = (0..8)
            .map(|k| xor(cd, u[0][k], u[2][k]))
            .collect::<Result<Vec<_>, _>>()?;
        for r in 0..4 {
            let doubled = xtime(cd, &u[r])?;
            for k in 0..8 {
                let v = xor(cd, a[r][k], parity[k])?;
                cd.add_gate_to(v, doubled[k], GateType::Xor, out[8 * (4 * c + r) + k])?;
            }
        }
    }
    Ok(())
}

fn add_round_key(
    cd: &mut Circuit,
    state: &Bundle,
    round_key: &Bundle,
) -> Result<Bundle, CircuitError> {
    state
        .iter()
        .zip(round_key.iter())
        .map(|(&s, &k)| xor(cd, s, k))
        .collect()
}

/// Encrypt `message` under a pre-expanded key, writing the result into `ciphertext`.
///
/// `expanded_key` holds `rounds + 1` round keys of 128 bits each, the first being
/// the cipher key itself; ten rounds give AES-128. The final round skips
/// MixColumns.
pub fn aes_expanded_build(
    cd: &mut Circuit,
    message: &Bundle,
    expanded_key: &Bundle,
    ciphertext: &Bundle,
) -> Result<(), CircuitError> {
    check_width(message, 128)?;
    check_width(ciphertext, 128)?;
    if expanded_key.size() < 256 || expanded_key.size() % 128 != 0 {
        return Err(CircuitError::InvalidArg(format!(
            "expanded key of {} bits is not a whole number of round keys past the first",
            expanded_key.size()
        )));
    }
    check_distinct(&[ciphertext], &[message, expanded_key])?;
    let rounds = expanded_key.size() / 128 - 1;
    let round_key = |r: usize| expanded_key.slice(128 * r..128 * (r + 1));

    let mut state = add_round_key(cd, message, &round_key(0))?;
    for round in 1..=rounds {
        let substituted = cd.new_bundle(128);
        for j in 0..16 {
            aes_sbox_build(
                cd,
                &state.slice(8 * j..8 * j + 8),
                &substituted.slice(8 * j..8 * j + 8),
            )?;
        }
        let shifted = aes_shift_rows(&substituted)?;
        if round == rounds {
            let key = round_key(round);
            for k in 0..128 {
                cd.add_gate_to(shifted[k], key[k], GateType::Xor, ciphertext[k])?;
            }
        } else {
            let mixed = cd.new_bundle(128);
            aes_mix_columns_build(cd, &shifted, &mixed)?;
            state = add_round_key(cd, &mixed, &round_key(round))?;
        }
    }
    Ok(())
}

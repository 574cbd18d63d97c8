//! Tools useful for interacting with `gatesmith`.
//!
//! Note: all number representations in this library are little-endian.

////////////////////////////////////////////////////////////////////////////////
// bit conversions

/// Get the bits of a u128 encoded in 2's complement using `nbits` bits.
/// Bits beyond position 127 are zero.
pub fn u128_to_bits(x: u128, nbits: usize) -> Vec<bool> {
    (0..nbits)
        .map(|i| i < 128 && (x >> i) & 1 == 1)
        .collect()
}

/// Convert into a u128 from the "bits" as bools. Bits beyond position 127 are ignored.
pub fn u128_from_bits(bs: &[bool]) -> u128 {
    bs.iter()
        .take(128)
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | ((b as u128) << i))
}

/// Get the low `nbits` bits of `x` in two's complement. Positions beyond 127
/// repeat the sign bit.
pub fn i128_to_bits(x: i128, nbits: usize) -> Vec<bool> {
    (0..nbits).map(|i| (x >> i.min(127)) & 1 == 1).collect()
}

/// Interpret `bs` as a two's-complement integer, sign-extending from its top bit.
pub fn i128_from_bits(bs: &[bool]) -> i128 {
    match bs.len() {
        0 => 0,
        n if n >= 128 => u128_from_bits(bs) as i128,
        n => sign_extend(u128_from_bits(bs), n),
    }
}

/// Sign-extend the low `nbits` bits of `x` to a full `i128`.
pub fn sign_extend(x: u128, nbits: usize) -> i128 {
    if nbits == 0 || nbits >= 128 {
        return x as i128;
    }
    let shift = 128 - nbits;
    ((x << shift) as i128) >> shift
}

/// Keep the low `nbits` bits of `x`.
pub fn mask(x: u128, nbits: usize) -> u128 {
    if nbits >= 128 {
        x
    } else {
        x & ((1 << nbits) - 1)
    }
}

/// Unpack bytes into bits, byte `j` landing on bits `8j..8j + 8` least-significant first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|b| (0..8).map(move |i| (b >> i) & 1 == 1))
        .collect()
}

/// Pack bits into bytes, the inverse of [`bytes_to_bits`]. A short final chunk is zero-padded.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|c| {
            c.iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << i))
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////
// random generation

/// Extra Rng functionality, useful for `gatesmith`.
pub trait RngExt: rand::Rng + Sized {
    /// Randomly generate a `bool`.
    fn gen_bool(&mut self) -> bool {
        self.gen()
    }
    /// Randomly generate a `u64`.
    fn gen_u64(&mut self) -> u64 {
        self.gen()
    }
    /// Randomly generate a `usize`.
    fn gen_usize(&mut self) -> usize {
        self.gen()
    }
    /// Randomly generate a `u128`.
    fn gen_u128(&mut self) -> u128 {
        self.gen()
    }
    /// Randomly generate a `nbits`-bit unsigned value.
    fn gen_bits(&mut self, nbits: usize) -> u128 {
        mask(self.gen(), nbits)
    }
    /// Randomly generate `n` bytes.
    fn gen_bytes(&mut self, n: usize) -> Vec<u8> {
        (0..n).map(|_| self.gen()).collect()
    }
}

impl<R: rand::Rng + Sized> RngExt for R {}

////////////////////////////////////////////////////////////////////////////////
// tests

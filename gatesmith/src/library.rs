//! A library of integer and AES circuits.
//!
//! The `*_build` functions append gates for one operation into a caller's circuit,
//! reading and writing bundles the caller allocated. [`Library`] wraps them into
//! standalone circuits with registered input and output bundles, built once per
//! shape and shared afterwards.

mod adder;
mod aes;
mod bitwise;
mod compare;
mod div;
mod mult;
mod sign;

pub use adder::{
    add_build, extract_bit_build, parallel_prefix_build, ripple_adder_build, subtract_build,
};
pub use aes::{
    aes_expanded_build, aes_mix_columns_build, aes_sbox_build, aes_shift_rows, expand_key_128,
    SBOX,
};
pub use bitwise::{
    bitwise_and_build, bitwise_invert_build, bitwise_or_build, bitwise_xor_build,
    multiplex_build,
};
pub use compare::{eq_build, greater_than_eq_build, is_zero_build, less_than_build, neq_build};
pub use div::div_rem_build;
pub use mult::mult_build;
pub use sign::{add_sign_build, negate_build, remove_sign_build};

use crate::{
    circuit::{Bundle, Circuit},
    errors::CircuitError,
};
use log::{debug, trace};
use moka::sync::Cache;
use std::sync::Arc;

/// What a construction should minimize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Optimized {
    /// Fewest gates. Ripple-carry adders, sequential partial-product accumulation.
    Size,
    /// Shortest critical path. Parallel-prefix adders, tree accumulation.
    Depth,
}

impl std::fmt::Display for Optimized {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Optimized::Size => "Optimized::Size".fmt(f),
            Optimized::Depth => "Optimized::Depth".fmt(f),
        }
    }
}

/// How a bundle's bits are read as an integer. Decides whether narrow operands are
/// sign-extended or zero-extended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntType {
    /// Two's complement; the top bit carries the sign.
    TwosComplement,
    /// Plain binary.
    Unsigned,
}

impl std::fmt::Display for IntType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IntType::TwosComplement => "IntType::TwosComplement".fmt(f),
            IntType::Unsigned => "IntType::Unsigned".fmt(f),
        }
    }
}

/// Which way an adder runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdderType {
    /// `a + b`
    Addition,
    /// `a - b`
    Subtraction,
}

impl std::fmt::Display for AdderType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AdderType::Addition => "AdderType::Addition".fmt(f),
            AdderType::Subtraction => "AdderType::Subtraction".fmt(f),
        }
    }
}

/// Resize `a` to `width` bits, padding with copies of the sign bit or with the
/// constant `0`, or dropping the high bits. No gates are added.
pub(crate) fn extend(
    cd: &mut Circuit,
    a: &Bundle,
    width: usize,
    it: IntType,
) -> Result<Bundle, CircuitError> {
    if width <= a.size() {
        return Ok(a.slice(0..width));
    }
    let pad = match it {
        IntType::TwosComplement => a.msb()?,
        IntType::Unsigned => cd.constant(false),
    };
    Ok((0..width)
        .map(|i| if i < a.size() { a[i] } else { pad })
        .collect())
}

pub(crate) fn check_nonempty(bundles: &[&Bundle]) -> Result<(), CircuitError> {
    match bundles.iter().find(|b| b.is_empty()) {
        Some(_) => Err(CircuitError::WidthMismatch { got: 0, needed: 1 }),
        None => Ok(()),
    }
}

pub(crate) fn check_width(b: &Bundle, needed: usize) -> Result<(), CircuitError> {
    if b.size() != needed {
        return Err(CircuitError::WidthMismatch {
            got: b.size(),
            needed,
        });
    }
    Ok(())
}

pub(crate) fn check_temps(temps: &Bundle, needed: usize) -> Result<(), CircuitError> {
    if temps.size() < needed {
        return Err(CircuitError::NotEnoughTemps {
            got: temps.size(),
            needed,
        });
    }
    Ok(())
}

/// Every bundle in `written` must share no wire with any bundle in `others`.
pub(crate) fn check_distinct(written: &[&Bundle], others: &[&Bundle]) -> Result<(), CircuitError> {
    for w in written {
        if others.iter().any(|o| !Circuit::are_distinct(w, o)) {
            return Err(CircuitError::AliasedBundles);
        }
    }
    Ok(())
}

/// Temporaries needed by the size-optimized adders; depth-optimized ones need none.
fn adder_temps(cd: &mut Circuit, op: Optimized) -> Bundle {
    match op {
        Optimized::Size => cd.add_temp_bundle(2),
        Optimized::Depth => Bundle::default(),
    }
}

/// The operations the [`Library`] can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    AddMsb,
    /// Addition of a constant, which is part of the circuit shape.
    AddConst(i64),
    Subtract,
    SubMsb,
    SubtractConst(i64),
    Mult,
    Div,
    Eq,
    Neq,
    LessThan,
    GreaterThanEq,
    Multiplex,
    RemoveSign,
    AddSign,
    Negate,
    IsZero,
    BitInvert,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    AesExpanded,
}

/// Identifies one cached circuit: the operation, up to three widths, the
/// optimization mode and the integer interpretation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    op: Operation,
    sizes: [usize; 3],
    optimized: Optimized,
    int_type: IntType,
}

impl ShapeKey {
    fn new(op: Operation, sizes: [usize; 3], optimized: Optimized, int_type: IntType) -> Self {
        ShapeKey {
            op,
            sizes,
            optimized,
            int_type,
        }
    }
}

impl std::fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:?}{:?} {} {}",
            self.op, self.sizes, self.optimized, self.int_type
        )
    }
}

/// A memoizing factory of circuits.
///
/// Each distinct shape is built at most once; later requests return the same
/// shared [`Circuit`]. Lookups may come from several threads at once, and
/// concurrent requests for a missing shape wait for a single build. Cached
/// circuits are never mutated: compose them into a larger circuit with
/// [`Circuit::instantiate`].
pub struct Library {
    cache: Cache<ShapeKey, Arc<Circuit>>,
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for Library {
    fn default() -> Self {
        Library::new()
    }
}

impl Library {
    /// Create an empty library.
    pub fn new() -> Library {
        Library {
            cache: Cache::builder().build(),
        }
    }

    /// Whether a circuit of this shape has been built.
    pub fn contains(&self, key: &ShapeKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Fetch the circuit for `key`, running `build` on an empty circuit if it is
    /// not cached yet. Failed builds are not cached.
    fn get_or_build<F>(&self, key: ShapeKey, build: F) -> Result<Arc<Circuit>, CircuitError>
    where
        F: FnOnce(&mut Circuit) -> Result<(), CircuitError>,
    {
        if let Some(cd) = self.cache.get(&key) {
            trace!("library hit: {}", key);
            return Ok(cd);
        }
        self.cache
            .try_get_with(key, || -> Result<Arc<Circuit>, CircuitError> {
                let mut cd = Circuit::new();
                build(&mut cd)?;
                debug!(
                    "library built {}: {} gates, {} wires",
                    key,
                    cd.num_gates(),
                    cd.num_wires()
                );
                Ok(Arc::new(cd))
            })
            .map_err(|e| (*e).clone())
    }

    fn adder(
        &self,
        key: ShapeKey,
        at: AdderType,
        b_const: Option<i64>,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, c_size] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = match b_const {
                Some(v) => cd.constant_bundle(v as i128, b_size),
                None => cd.add_input_bundle(b_size),
            };
            let c = cd.add_output_bundle(c_size);
            let temps = adder_temps(cd, key.optimized);
            match at {
                AdderType::Addition => add_build(cd, &a, &b, &c, &temps, key.int_type, key.optimized),
                AdderType::Subtraction => {
                    subtract_build(cd, &a, &b, &c, &temps, key.int_type, key.optimized)
                }
            }
        })
    }

    fn msb(&self, key: ShapeKey, at: AdderType) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, _] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = cd.add_input_bundle(b_size);
            let out = cd.add_output_bundle(1);
            let temps = adder_temps(cd, key.optimized);
            let idx = a_size.max(b_size).saturating_sub(1);
            extract_bit_build(
                cd,
                &a,
                &b,
                &out,
                &temps,
                idx,
                key.int_type,
                at,
                key.optimized,
            )
        })
    }

    /// Signed `a + b` truncated to `c_size` bits.
    pub fn int_int_add(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Add,
            [a_size, b_size, c_size],
            op,
            IntType::TwosComplement,
        );
        self.adder(key, AdderType::Addition, None)
    }

    /// Sign bit of the signed sum of two `a_size`-bit integers.
    pub fn int_int_add_msb(&self, a_size: usize, op: Optimized) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::AddMsb,
            [a_size, a_size, 1],
            op,
            IntType::TwosComplement,
        );
        self.msb(key, AdderType::Addition)
    }

    /// Unsigned `a + b` truncated to `c_size` bits.
    pub fn uint_uint_add(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Add,
            [a_size, b_size, c_size],
            op,
            IntType::Unsigned,
        );
        self.adder(key, AdderType::Addition, None)
    }

    /// Signed `a + b_val`, the constant held in `b_size` bits.
    pub fn int_int_const_add(
        &self,
        a_size: usize,
        b_size: usize,
        b_val: i64,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::AddConst(b_val),
            [a_size, b_size, c_size],
            op,
            IntType::TwosComplement,
        );
        self.adder(key, AdderType::Addition, Some(b_val))
    }

    /// Signed `a - b` truncated to `c_size` bits.
    pub fn int_int_subtract(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Subtract,
            [a_size, b_size, c_size],
            op,
            IntType::TwosComplement,
        );
        self.adder(key, AdderType::Subtraction, None)
    }

    /// Sign bit of `a - b`, both operands signed and the difference taken at the
    /// wider operand's width.
    pub fn int_int_sub_msb(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::SubMsb,
            [a_size, b_size, 1],
            op,
            IntType::TwosComplement,
        );
        self.msb(key, AdderType::Subtraction)
    }

    /// Unsigned `a - b` modulo `2^c_size`.
    pub fn uint_uint_subtract(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Subtract,
            [a_size, b_size, c_size],
            op,
            IntType::Unsigned,
        );
        self.adder(key, AdderType::Subtraction, None)
    }

    /// Top bit of the unsigned difference `a - b` at the wider operand's width.
    pub fn uint_uint_sub_msb(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(Operation::SubMsb, [a_size, b_size, 1], op, IntType::Unsigned);
        self.msb(key, AdderType::Subtraction)
    }

    /// Signed `a - b_val`.
    pub fn int_int_const_subtract(
        &self,
        a_size: usize,
        b_size: usize,
        b_val: i64,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::SubtractConst(b_val),
            [a_size, b_size, c_size],
            op,
            IntType::TwosComplement,
        );
        self.adder(key, AdderType::Subtraction, Some(b_val))
    }

    fn mult(&self, key: ShapeKey) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, c_size] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = cd.add_input_bundle(b_size);
            let c = cd.add_output_bundle(c_size);
            mult_build(cd, &a, &b, &c, key.optimized, key.int_type)
        })
    }

    /// Signed `a * b` truncated to `c_size` bits.
    pub fn int_int_mult(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.mult(ShapeKey::new(
            Operation::Mult,
            [a_size, b_size, c_size],
            op,
            IntType::TwosComplement,
        ))
    }

    /// Unsigned `a * b` truncated to `c_size` bits.
    pub fn uint_uint_mult(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.mult(ShapeKey::new(
            Operation::Mult,
            [a_size, b_size, c_size],
            op,
            IntType::Unsigned,
        ))
    }

    fn div(&self, key: ShapeKey) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, c_size] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = cd.add_input_bundle(b_size);
            let quot = cd.add_output_bundle(c_size);
            let rem = cd.add_output_bundle(c_size);
            div_rem_build(cd, &a, &b, &quot, &rem, key.int_type, key.optimized)
        })
    }

    /// Signed truncating division. The circuit has two outputs, the quotient and
    /// the remainder, each `c_size` bits wide. The remainder takes the sign of `a`.
    pub fn int_int_div(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.div(ShapeKey::new(
            Operation::Div,
            [a_size, b_size, c_size],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// Unsigned division with quotient and remainder outputs.
    pub fn uint_uint_div(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.div(ShapeKey::new(
            Operation::Div,
            [a_size, b_size, c_size],
            Optimized::Size,
            IntType::Unsigned,
        ))
    }

    fn comparison(&self, key: ShapeKey) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, _] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = cd.add_input_bundle(b_size);
            let out = cd.add_output_bundle(1);
            match key.op {
                Operation::Eq => eq_build(cd, &a, &b, &out),
                Operation::Neq => neq_build(cd, &a, &b, &out),
                Operation::LessThan => {
                    less_than_build(cd, &a, &b, &out, key.int_type, key.optimized)
                }
                _ => greater_than_eq_build(cd, &a, &b, &out, key.int_type, key.optimized),
            }
        })
    }

    /// `a == b` for two `a_size`-bit integers.
    pub fn int_eq(&self, a_size: usize) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::Eq,
            [a_size, a_size, 1],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// `a != b` for two `a_size`-bit integers.
    pub fn int_neq(&self, a_size: usize) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::Neq,
            [a_size, a_size, 1],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// Signed `a < b`.
    pub fn int_int_lt(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::LessThan,
            [a_size, b_size, 1],
            op,
            IntType::TwosComplement,
        ))
    }

    /// Signed `a >= b`.
    pub fn int_int_gteq(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::GreaterThanEq,
            [a_size, b_size, 1],
            op,
            IntType::TwosComplement,
        ))
    }

    /// Unsigned `a < b`.
    pub fn uint_uint_lt(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::LessThan,
            [a_size, b_size, 1],
            op,
            IntType::Unsigned,
        ))
    }

    /// Unsigned `a >= b`.
    pub fn uint_uint_gteq(
        &self,
        a_size: usize,
        b_size: usize,
        op: Optimized,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.comparison(ShapeKey::new(
            Operation::GreaterThanEq,
            [a_size, b_size, 1],
            op,
            IntType::Unsigned,
        ))
    }

    /// Selects between two `a_size`-bit inputs. Inputs are `if_true`, `if_false`
    /// and a one-bit `choice`.
    pub fn int_int_multiplex(&self, a_size: usize) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Multiplex,
            [a_size, a_size, 1],
            Optimized::Size,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let t = cd.add_input_bundle(a_size);
            let f = cd.add_input_bundle(a_size);
            let choice = cd.add_input_bundle(1);
            let out = cd.add_output_bundle(a_size);
            let temps = cd.add_temp_bundle(1);
            multiplex_build(cd, &t, &f, &choice, &out, &temps)
        })
    }

    /// Splits a signed integer into its magnitude and its sign bit, the two outputs.
    pub fn int_remove_sign(&self, a_size: usize, op: Optimized) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::RemoveSign,
            [a_size, a_size, 1],
            op,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let magnitude = cd.add_output_bundle(a_size);
            let sign = cd.add_output_bundle(1);
            let temps = cd.add_temp_bundle(2);
            remove_sign_build(cd, &a, &magnitude, &temps, op)?;
            cd.add_copy_to(a.msb()?, sign[0])
        })
    }

    /// Inverse of [`Library::int_remove_sign`]: inputs are a magnitude and a sign bit.
    pub fn int_add_sign(&self, a_size: usize, op: Optimized) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::AddSign,
            [a_size, 1, a_size],
            op,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let magnitude = cd.add_input_bundle(a_size);
            let sign = cd.add_input_bundle(1);
            let out = cd.add_output_bundle(a_size);
            let temps = cd.add_temp_bundle(2);
            add_sign_build(cd, &magnitude, &sign, &out, &temps, op)
        })
    }

    /// Two's-complement negation.
    pub fn int_negate(&self, a_size: usize, op: Optimized) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::Negate,
            [a_size, 0, a_size],
            op,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let out = cd.add_output_bundle(a_size);
            let temps = cd.add_temp_bundle(2);
            negate_build(cd, &a, &out, &temps, op)
        })
    }

    /// Whether every bit is zero.
    pub fn int_is_zero(&self, a_size: usize) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::IsZero,
            [a_size, 0, 1],
            Optimized::Size,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let out = cd.add_output_bundle(1);
            is_zero_build(cd, &a, &out)
        })
    }

    /// Bitwise complement.
    pub fn int_bit_invert(&self, a_size: usize) -> Result<Arc<Circuit>, CircuitError> {
        let key = ShapeKey::new(
            Operation::BitInvert,
            [a_size, 0, a_size],
            Optimized::Size,
            IntType::TwosComplement,
        );
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let out = cd.add_output_bundle(a_size);
            bitwise_invert_build(cd, &a, &out)
        })
    }

    fn bitwise(&self, key: ShapeKey) -> Result<Arc<Circuit>, CircuitError> {
        let [a_size, b_size, c_size] = key.sizes;
        self.get_or_build(key, |cd| {
            let a = cd.add_input_bundle(a_size);
            let b = cd.add_input_bundle(b_size);
            let out = cd.add_output_bundle(c_size);
            match key.op {
                Operation::BitwiseAnd => bitwise_and_build(cd, &a, &b, &out, key.int_type),
                Operation::BitwiseOr => bitwise_or_build(cd, &a, &b, &out, key.int_type),
                _ => bitwise_xor_build(cd, &a, &b, &out, key.int_type),
            }
        })
    }

    /// Bitwise `a & b`, narrower operands sign-extended.
    pub fn int_int_bitwise_and(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.bitwise(ShapeKey::new(
            Operation::BitwiseAnd,
            [a_size, b_size, c_size],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// Bitwise `a | b`, narrower operands sign-extended.
    pub fn int_int_bitwise_or(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.bitwise(ShapeKey::new(
            Operation::BitwiseOr,
            [a_size, b_size, c_size],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// Bitwise `a ^ b`, narrower operands sign-extended.
    pub fn int_int_bitwise_xor(
        &self,
        a_size: usize,
        b_size: usize,
        c_size: usize,
    ) -> Result<Arc<Circuit>, CircuitError> {
        self.bitwise(ShapeKey::new(
            Operation::BitwiseXor,
            [a_size, b_size, c_size],
            Optimized::Size,
            IntType::TwosComplement,
        ))
    }

    /// AES with `rounds` rounds on a pre-expanded key. Inputs are the 128-bit
    /// message and the `128 * (rounds + 1)`-bit expanded key; the output is the
    /// 128-bit ciphertext.
    pub fn aes_expanded(&self, rounds: usize) -> Result<Arc<Circuit>, CircuitError> {
        let key_size = rounds
            .checked_add(1)
            .and_then(|n| n.checked_mul(128))
            .ok_or_else(|| CircuitError::InvalidArg(format!("{} AES rounds", rounds)))?;
        let key = ShapeKey::new(
            Operation::AesExpanded,
            [128, key_size, 128],
            Optimized::Depth,
            IntType::Unsigned,
        );
        self.get_or_build(key, |cd| {
            let message = cd.add_input_bundle(128);
            let expanded_key = cd.add_input_bundle(key_size);
            let ciphertext = cd.add_output_bundle(128);
            aes_expanded_build(cd, &message, &expanded_key, &ciphertext)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{mask, sign_extend, RngExt};
    use rand::thread_rng;
    use std::thread;

    const NITERS: usize = 64;

    #[test]
    fn repeated_requests_share_one_circuit() {
        let lib = Library::new();
        let a = lib.int_int_add(8, 8, 8, Optimized::Size).unwrap();
        let b = lib.int_int_add(8, 8, 8, Optimized::Size).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = lib.int_int_add(8, 8, 8, Optimized::Depth).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        let d = lib.uint_uint_add(8, 8, 8, Optimized::Size).unwrap();
        assert!(!Arc::ptr_eq(&a, &d));
        assert!(lib.contains(&ShapeKey::new(
            Operation::Add,
            [8, 8, 8],
            Optimized::Size,
            IntType::TwosComplement
        )));
    }

    #[test]
    fn constants_are_part_of_the_shape() {
        let lib = Library::new();
        let three = lib.int_int_const_add(8, 8, 3, 8, Optimized::Size).unwrap();
        let five = lib.int_int_const_add(8, 8, 5, 8, Optimized::Size).unwrap();
        assert!(!Arc::ptr_eq(&three, &five));
        assert_eq!(three.inputs().len(), 1);
        assert_eq!(three.eval_u128(&[10]).unwrap(), vec![13]);
        assert_eq!(five.eval_u128(&[10]).unwrap(), vec![15]);
        let sub = lib.int_int_const_subtract(8, 8, 7, 8, Optimized::Depth).unwrap();
        assert_eq!(sub.eval_u128(&[3]).unwrap(), vec![mask(-4i128 as u128, 8)]);
    }

    #[test]
    fn concurrent_requests_share_one_circuit() {
        let lib = Arc::new(Library::new());
        let handles = (0..8)
            .map(|_| {
                let lib = lib.clone();
                thread::spawn(move || lib.int_int_mult(16, 16, 16, Optimized::Depth).unwrap())
            })
            .collect::<Vec<_>>();
        let circuits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        for c in circuits.iter() {
            assert!(Arc::ptr_eq(c, &circuits[0]));
        }
    }

    #[test]
    fn failed_builds_report_errors() {
        let lib = Library::new();
        assert!(lib.int_eq(0).is_err());
        assert!(lib.aes_expanded(0).is_err());
        assert!(matches!(
            lib.aes_expanded(usize::MAX),
            Err(CircuitError::InvalidArg(_))
        ));
        assert!(matches!(
            lib.aes_expanded(usize::MAX / 64),
            Err(CircuitError::InvalidArg(_))
        ));
        assert!(lib.int_int_add(0, 4, 4, Optimized::Size).is_err());
    }

    #[test]
    fn cached_circuits_compose() {
        // (a + b) + c through two instantiations of one cached adder
        let lib = Library::new();
        let adder = lib.uint_uint_add(8, 8, 8, Optimized::Size).unwrap();
        let snapshot = (*adder).clone();

        let mut cd = Circuit::new();
        let a = cd.add_input_bundle(8);
        let b = cd.add_input_bundle(8);
        let c = cd.add_input_bundle(8);
        let ab = cd.new_bundle(8);
        let out = cd.add_output_bundle(8);
        cd.instantiate(&adder, &[a, b], &[ab.clone()]).unwrap();
        cd.instantiate(&adder, &[ab, c], &[out]).unwrap();
        assert_eq!(*adder, snapshot);

        let mut rng = thread_rng();
        for _ in 0..NITERS {
            let (x, y, z) = (rng.gen_bits(8), rng.gen_bits(8), rng.gen_bits(8));
            assert_eq!(cd.eval_u128(&[x, y, z]).unwrap(), vec![(x + y + z) % 256]);
        }
    }

    #[test]
    fn library_arithmetic() {
        let lib = Library::new();
        let mut rng = thread_rng();
        for op in [Optimized::Size, Optimized::Depth] {
            let add = lib.int_int_add(6, 4, 8, op).unwrap();
            let sub = lib.int_int_subtract(6, 4, 8, op).unwrap();
            let usub = lib.uint_uint_subtract(6, 4, 8, op).unwrap();
            let mult = lib.int_int_mult(6, 4, 10, op).unwrap();
            let umult = lib.uint_uint_mult(6, 4, 10, op).unwrap();
            let add_msb = lib.int_int_add_msb(6, op).unwrap();
            let sub_msb = lib.int_int_sub_msb(6, 4, op).unwrap();
            let usub_msb = lib.uint_uint_sub_msb(6, 4, op).unwrap();
            for _ in 0..NITERS {
                let (x, y) = (rng.gen_bits(6), rng.gen_bits(4));
                let (sx, sy) = (sign_extend(x, 6), sign_extend(y, 4));
                let wrap = |v: i128, n| mask(v as u128, n);
                assert_eq!(add.eval_u128(&[x, y]).unwrap(), vec![wrap(sx + sy, 8)]);
                assert_eq!(sub.eval_u128(&[x, y]).unwrap(), vec![wrap(sx - sy, 8)]);
                assert_eq!(
                    usub.eval_u128(&[x, y]).unwrap(),
                    vec![wrap(x as i128 - y as i128, 8)]
                );
                assert_eq!(mult.eval_u128(&[x, y]).unwrap(), vec![wrap(sx * sy, 10)]);
                assert_eq!(umult.eval_u128(&[x, y]).unwrap(), vec![x * y]);
                let y6 = rng.gen_bits(6);
                assert_eq!(
                    add_msb.eval_u128(&[x, y6]).unwrap(),
                    vec![(wrap(sx + sign_extend(y6, 6), 6) >> 5) & 1]
                );
                assert_eq!(
                    sub_msb.eval_u128(&[x, y]).unwrap(),
                    vec![(wrap(sx - sy, 6) >> 5) & 1]
                );
                assert_eq!(
                    usub_msb.eval_u128(&[x, y]).unwrap(),
                    vec![(wrap(x as i128 - y as i128, 6) >> 5) & 1]
                );
            }
        }
    }

    #[test]
    fn library_division() {
        let lib = Library::new();
        let div = lib.int_int_div(8, 8, 8).unwrap();
        let udiv = lib.uint_uint_div(8, 5, 8).unwrap();
        assert_eq!(div.outputs().len(), 2);
        assert_eq!(div.eval_u128(&[17, 5]).unwrap(), vec![3, 2]);
        assert_eq!(
            div.eval_u128(&[mask(-17i128 as u128, 8), 5]).unwrap(),
            vec![mask(-3i128 as u128, 8), mask(-2i128 as u128, 8)]
        );
        assert_eq!(udiv.eval_u128(&[200, 7]).unwrap(), vec![28, 4]);
    }

    #[test]
    fn library_comparisons() {
        let lib = Library::new();
        let mut rng = thread_rng();
        let eq = lib.int_eq(5).unwrap();
        let neq = lib.int_neq(5).unwrap();
        let lt = lib.int_int_lt(5, 3, Optimized::Depth).unwrap();
        let gteq = lib.int_int_gteq(5, 3, Optimized::Size).unwrap();
        let ult = lib.uint_uint_lt(5, 3, Optimized::Size).unwrap();
        let ugteq = lib.uint_uint_gteq(5, 3, Optimized::Depth).unwrap();
        let zero = lib.int_is_zero(5).unwrap();
        for _ in 0..NITERS {
            let (x, y) = (rng.gen_bits(5), rng.gen_bits(3));
            let (sx, sy) = (sign_extend(x, 5), sign_extend(y, 3));
            assert_eq!(eq.eval_u128(&[x, x]).unwrap(), vec![1]);
            assert_eq!(eq.eval_u128(&[x, y]).unwrap(), vec![(x == y) as u128]);
            assert_eq!(neq.eval_u128(&[x, y]).unwrap(), vec![(x != y) as u128]);
            assert_eq!(lt.eval_u128(&[x, y]).unwrap(), vec![(sx < sy) as u128]);
            assert_eq!(gteq.eval_u128(&[x, y]).unwrap(), vec![(sx >= sy) as u128]);
            assert_eq!(ult.eval_u128(&[x, y]).unwrap(), vec![(x < y) as u128]);
            assert_eq!(ugteq.eval_u128(&[x, y]).unwrap(), vec![(x >= y) as u128]);
            assert_eq!(zero.eval_u128(&[x]).unwrap(), vec![(x == 0) as u128]);
        }
    }

    #[test]
    fn library_sign_and_bitwise() {
        let lib = Library::new();
        let mut rng = thread_rng();
        let remove = lib.int_remove_sign(6, Optimized::Size).unwrap();
        let add = lib.int_add_sign(6, Optimized::Depth).unwrap();
        let neg = lib.int_negate(6, Optimized::Size).unwrap();
        let inv = lib.int_bit_invert(6).unwrap();
        let and = lib.int_int_bitwise_and(6, 3, 6).unwrap();
        let or = lib.int_int_bitwise_or(6, 3, 6).unwrap();
        let xor = lib.int_int_bitwise_xor(6, 3, 6).unwrap();
        let mux = lib.int_int_multiplex(6).unwrap();
        for _ in 0..NITERS {
            let (x, y) = (rng.gen_bits(6), rng.gen_bits(3));
            let sx = sign_extend(x, 6);
            let ey = mask(sign_extend(y, 3) as u128, 6);
            let parts = remove.eval_u128(&[x]).unwrap();
            assert_eq!(parts[0], mask(sx.unsigned_abs(), 6));
            assert_eq!(parts[1], (sx < 0) as u128);
            assert_eq!(add.eval_u128(&parts).unwrap(), vec![x]);
            assert_eq!(neg.eval_u128(&[x]).unwrap(), vec![mask(-sx as u128, 6)]);
            assert_eq!(inv.eval_u128(&[x]).unwrap(), vec![mask(!x, 6)]);
            assert_eq!(and.eval_u128(&[x, y]).unwrap(), vec![x & ey]);
            assert_eq!(or.eval_u128(&[x, y]).unwrap(), vec![x | ey]);
            assert_eq!(xor.eval_u128(&[x, y]).unwrap(), vec![x ^ ey]);
            assert_eq!(mux.eval_u128(&[x, ey, 1]).unwrap(), vec![x]);
            assert_eq!(mux.eval_u128(&[x, ey, 0]).unwrap(), vec![ey]);
        }
    }
}

// -*- mode: rust; -*-
//
// This file is part of `gatesmith`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

//! `gatesmith` builds boolean circuits for fixed-width integer arithmetic and
//! AES, gate by gate, for use in secure computation.
//!
//! Circuits are built into a [`Circuit`] arena by the `*_build` functions, or
//! fetched ready-made from a memoizing [`Library`]. Each operation comes in a
//! gate-count-optimized and a depth-optimized variant, selected by [`Optimized`].

#![deny(clippy::all)]
#![allow(
    clippy::new_without_default,
    clippy::too_many_arguments,
    clippy::many_single_char_names,
    clippy::needless_range_loop
)]

pub mod circuit;
pub mod errors;
pub mod informer;
pub mod library;
pub mod util;

pub use crate::{
    circuit::{Bundle, Circuit, Gate, GateType, WireId},
    errors::CircuitError,
    informer::CircuitStats,
    library::*,
};

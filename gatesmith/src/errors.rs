//! Errors that may be output by this library.

use crate::circuit::WireId;
use std::fmt::{self, Display, Formatter};

/// Errors that may occur while building or evaluating a circuit. These are
/// API-usage errors: a builder was handed bundles that violate its contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CircuitError {
    /// A gate referenced a wire that was never allocated in this circuit.
    UnallocatedWire(WireId),
    /// A gate read a wire that was allocated but never driven.
    UninitializedWire(WireId),
    /// A gate tried to drive an input or constant wire.
    ReadOnlyWire(WireId),
    /// Two bundles that must be disjoint share a wire.
    AliasedBundles,
    /// A bundle has the wrong width and no extension rule applies.
    WidthMismatch {
        /// Received width.
        got: usize,
        /// Expected width.
        needed: usize,
    },
    /// Not enough temporary wires were supplied.
    NotEnoughTemps {
        /// Received number of temporaries.
        got: usize,
        /// Required number of temporaries.
        needed: usize,
    },
    /// Wrong number of input bundles handed to the evaluator or to `instantiate`.
    InvalidArgNum {
        /// Received number of bundles.
        got: usize,
        /// Expected number of bundles.
        needed: usize,
    },
    /// Invalid argument.
    InvalidArg(String),
}

impl Display for CircuitError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CircuitError::UnallocatedWire(w) => write!(f, "wire {} was never allocated", w),
            CircuitError::UninitializedWire(w) => write!(
                f,
                "wire {} is read before any gate drives it. is the circuit topologically sorted?",
                w
            ),
            CircuitError::ReadOnlyWire(w) => {
                write!(f, "wire {} is an input or constant and cannot be driven", w)
            }
            CircuitError::AliasedBundles => "bundles must not share wires".fmt(f),
            CircuitError::WidthMismatch { got, needed } => {
                write!(f, "invalid bundle width: needed {} but got {}", needed, got)
            }
            CircuitError::NotEnoughTemps { got, needed } => write!(
                f,
                "not enough temporary wires: needed {} but got {}",
                needed, got
            ),
            CircuitError::InvalidArgNum { got, needed } => write!(
                f,
                "invalid number of bundles: needed {} but got {}",
                needed, got
            ),
            CircuitError::InvalidArg(s) => write!(f, "invalid argument: {}", s),
        }
    }
}

impl std::error::Error for CircuitError {}

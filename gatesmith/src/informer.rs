//! Gate counts and depth of a built circuit.

use crate::circuit::{Bundle, Circuit, GateType, WireState};
use std::cmp::max;

/// Carries information about a circuit: how many gates of each kind it has and
/// how deep it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CircuitStats {
    ninputs: usize,
    noutputs: usize,
    nwires: usize,
    nxor: usize,
    nnxor: usize,
    nand: usize,
    nor: usize,
    ninv: usize,
    ncopy: usize,
    depth: usize,
    nonlinear_depth: usize,
}

impl std::fmt::Display for CircuitStats {
    /// Print information about the circuit.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "circuit info:")?;
        writeln!(f, "  inputs:             {:16}", self.ninputs)?;
        writeln!(f, "  outputs:            {:16}", self.noutputs)?;
        writeln!(f, "  wires:              {:16}", self.nwires)?;
        writeln!(f, "  xor:                {:16}", self.nxor)?;
        writeln!(f, "  nxor:               {:16}", self.nnxor)?;
        writeln!(f, "  and:                {:16}", self.nand)?;
        writeln!(f, "  or:                 {:16}", self.nor)?;
        writeln!(f, "  inv:                {:16}", self.ninv)?;
        writeln!(f, "  copy:               {:16}", self.ncopy)?;
        writeln!(f, "  total gates:        {:16}", self.num_gates())?;
        writeln!(f, "  nonlinear gates:    {:16}", self.num_nonlinear())?;
        writeln!(f, "  depth:              {:16}", self.depth)?;
        writeln!(f, "  nonlinear depth:    {:16}", self.nonlinear_depth)?;
        Ok(())
    }
}

impl CircuitStats {
    /// Collect statistics for `circuit`.
    ///
    /// Copy gates add no depth. Depth is measured at the output wires, or over
    /// every gate when the circuit has no outputs.
    pub fn new(circuit: &Circuit) -> CircuitStats {
        let mut stats = CircuitStats {
            ninputs: circuit.inputs().iter().map(Bundle::size).sum(),
            noutputs: circuit.outputs().iter().map(Bundle::size).sum(),
            nwires: circuit.num_wires(),
            ..Default::default()
        };

        let mut depth = vec![0usize; circuit.num_wires()];
        let mut nl_depth = vec![0usize; circuit.num_wires()];
        let mut max_depth = 0;
        let mut max_nl_depth = 0;
        for g in circuit.gates() {
            match g.ty {
                GateType::Xor => stats.nxor += 1,
                GateType::Nxor => stats.nnxor += 1,
                GateType::And => stats.nand += 1,
                GateType::Or => stats.nor += 1,
                GateType::Inv => stats.ninv += 1,
                GateType::Copy => stats.ncopy += 1,
            }
            let d = max(depth[g.x.0], depth[g.y.0]) + (g.ty != GateType::Copy) as usize;
            let nl = max(nl_depth[g.x.0], nl_depth[g.y.0]) + (!g.ty.is_linear()) as usize;
            depth[g.out.0] = d;
            nl_depth[g.out.0] = nl;
            max_depth = max(max_depth, d);
            max_nl_depth = max(max_nl_depth, nl);
        }

        if circuit.outputs().is_empty() {
            stats.depth = max_depth;
            stats.nonlinear_depth = max_nl_depth;
        } else {
            let outs = circuit.outputs().iter().flat_map(Bundle::iter);
            for w in outs {
                if circuit.wires[w.0] == WireState::Assigned {
                    stats.depth = max(stats.depth, depth[w.0]);
                    stats.nonlinear_depth = max(stats.nonlinear_depth, nl_depth[w.0]);
                }
            }
        }
        stats
    }

    /// Number of input wires.
    pub fn num_inputs(&self) -> usize {
        self.ninputs
    }

    /// Number of output wires.
    pub fn num_outputs(&self) -> usize {
        self.noutputs
    }

    /// Number of gates of kind `ty`.
    pub fn count(&self, ty: GateType) -> usize {
        match ty {
            GateType::Xor => self.nxor,
            GateType::Nxor => self.nnxor,
            GateType::And => self.nand,
            GateType::Or => self.nor,
            GateType::Inv => self.ninv,
            GateType::Copy => self.ncopy,
        }
    }

    /// Total number of gates.
    pub fn num_gates(&self) -> usize {
        self.nxor + self.nnxor + self.nand + self.nor + self.ninv + self.ncopy
    }

    /// Number of AND and OR gates, the only gates with a cost under free-XOR garbling.
    pub fn num_nonlinear(&self) -> usize {
        self.nand + self.nor
    }

    /// Length of the longest chain of gates ending at an output.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Largest number of AND and OR gates along any path to an output.
    pub fn nonlinear_depth(&self) -> usize {
        self.nonlinear_depth
    }
}

impl Circuit {
    /// Gate counts and depth of this circuit.
    pub fn stats(&self) -> CircuitStats {
        CircuitStats::new(self)
    }
}

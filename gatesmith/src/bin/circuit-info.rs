//! Build one circuit from the library and print its statistics.
//!
//! ```text
//! circuit-info mult --a-size 32 --depth
//! circuit-info aes --rounds 10
//! ```

use clap::{Parser, ValueEnum};
use eyre::Result;
use gatesmith::{Circuit, Library, Optimized};
use log::info;
use std::{env, sync::Arc, time::Instant};

/// Operations that can be built.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum Op {
    Add,
    AddMsb,
    Sub,
    SubMsb,
    Mult,
    Div,
    Eq,
    Neq,
    Lt,
    Gteq,
    IsZero,
    Negate,
    RemoveSign,
    AddSign,
    Multiplex,
    And,
    Or,
    Xor,
    Invert,
    Aes,
}

/// Cli.
#[derive(Parser)]
#[clap(name = "circuit-info")]
#[clap(author = "swanky authors <swanky@galois.com>")]
#[clap(version = "0.1")]
struct Cli {
    /// Operation to build
    #[clap(value_enum)]
    op: Op,

    /// Width of the first operand
    #[clap(short, long, default_value_t = 32)]
    a_size: usize,

    /// Width of the second operand, defaults to the first
    #[clap(short, long)]
    b_size: Option<usize>,

    /// Width of the result, defaults to the first operand
    #[clap(short, long)]
    c_size: Option<usize>,

    /// Read operands as unsigned integers
    #[clap(long)]
    unsigned: bool,

    /// Minimize depth instead of gate count
    #[clap(long)]
    depth: bool,

    /// Number of AES rounds
    #[clap(long, default_value_t = 10)]
    rounds: usize,

    /// Print every gate
    #[clap(long)]
    gates: bool,
}

fn build(lib: &Library, cli: &Cli) -> Result<Arc<Circuit>> {
    let a = cli.a_size;
    let b = cli.b_size.unwrap_or(a);
    let c = cli.c_size.unwrap_or(a);
    let op = if cli.depth {
        Optimized::Depth
    } else {
        Optimized::Size
    };
    let u = cli.unsigned;
    let circuit = match cli.op {
        Op::Add if u => lib.uint_uint_add(a, b, c, op)?,
        Op::Add => lib.int_int_add(a, b, c, op)?,
        Op::AddMsb => lib.int_int_add_msb(a, op)?,
        Op::Sub if u => lib.uint_uint_subtract(a, b, c, op)?,
        Op::Sub => lib.int_int_subtract(a, b, c, op)?,
        Op::SubMsb if u => lib.uint_uint_sub_msb(a, b, op)?,
        Op::SubMsb => lib.int_int_sub_msb(a, b, op)?,
        Op::Mult if u => lib.uint_uint_mult(a, b, c, op)?,
        Op::Mult => lib.int_int_mult(a, b, c, op)?,
        Op::Div if u => lib.uint_uint_div(a, b, c)?,
        Op::Div => lib.int_int_div(a, b, c)?,
        Op::Eq => lib.int_eq(a)?,
        Op::Neq => lib.int_neq(a)?,
        Op::Lt if u => lib.uint_uint_lt(a, b, op)?,
        Op::Lt => lib.int_int_lt(a, b, op)?,
        Op::Gteq if u => lib.uint_uint_gteq(a, b, op)?,
        Op::Gteq => lib.int_int_gteq(a, b, op)?,
        Op::IsZero => lib.int_is_zero(a)?,
        Op::Negate => lib.int_negate(a, op)?,
        Op::RemoveSign => lib.int_remove_sign(a, op)?,
        Op::AddSign => lib.int_add_sign(a, op)?,
        Op::Multiplex => lib.int_int_multiplex(a)?,
        Op::And => lib.int_int_bitwise_and(a, b, c)?,
        Op::Or => lib.int_int_bitwise_or(a, b, c)?,
        Op::Xor => lib.int_int_bitwise_xor(a, b, c)?,
        Op::Invert => lib.int_bit_invert(a)?,
        Op::Aes => lib.aes_expanded(cli.rounds)?,
    };
    Ok(circuit)
}

fn main() -> Result<()> {
    // if log-level `RUST_LOG` not already set, then set to info
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init_timed();

    let cli = Cli::parse();
    let lib = Library::new();
    let start = Instant::now();
    let circuit = build(&lib, &cli)?;
    info!("built {:?} in {:?}", cli.op, start.elapsed());

    if cli.gates {
        for g in circuit.gates() {
            println!("{}", g);
        }
    }
    print!("{}", circuit.stats());
    Ok(())
}

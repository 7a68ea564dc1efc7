// input.rs
use rlua::{Lua, Table, Value};
use std::fs;

use crate::build::BuildOptions;
use crate::error::{HamiltonianError, Result};
use crate::operator::FermionOperator;
use crate::C64;

// Storage for output options.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub verbose: bool,
    // Path of the JSON summary to write, if any.
    pub json: Option<String>,
}

/// Storage for Input file parameters.
#[derive(Debug, Clone)]
pub struct Input {
    pub options: BuildOptions,
    pub operator: FermionOperator,
    pub write: WriteOptions,
}

/// Read input parameters from lua file and assign to Input object.
/// # Arguments
///     `path`: str, file path to input file.
pub fn load_input(path: &str) -> Result<Input> {
    let src = fs::read_to_string(path)?;
    load_input_str(&src)
}

/// Read input parameters from lua source. Expected globals:
///     hamiltonian = { norb = 0, conserve_number = true, e_0 = {re, im},
///                     terms = { {"0^ 0", re, im}, ... } }
///     write = { verbose = false, json = "summary.json" }   (optional)
/// # Arguments
///     `src`: str, lua source.
pub fn load_input_str(src: &str) -> Result<Input> {
    let lua = Lua::new();
    lua.load(src).exec()?;
    let globals = lua.globals();

    // Hamiltonian table.
    let ham_tbl: Table = match globals.get::<_, Value>("hamiltonian")? {
        Value::Table(t) => t,
        other => return Err(HamiltonianError::UnrecognisedInput(format!("hamiltonian = {}", other.type_name()))),
    };
    let norb: usize = ham_tbl.get::<_, Option<usize>>("norb")?.unwrap_or(0);
    let conserve_number: bool = ham_tbl.get::<_, Option<bool>>("conserve_number")?.unwrap_or(true);
    let e_0 = read_complex(ham_tbl.get("e_0")?)?;
    let options = BuildOptions {norb, conserve_number, e_0};

    // Each term is {"operator string", re} or {"operator string", re, im}.
    let terms_tbl: Table = match ham_tbl.get::<_, Value>("terms")? {
        Value::Table(t) => t,
        other => return Err(HamiltonianError::UnrecognisedInput(format!("hamiltonian.terms = {}", other.type_name()))),
    };
    let mut operator = FermionOperator::zero();
    for entry in terms_tbl.sequence_values::<Table>() {
        let t = entry?;
        let term: String = t.get(1)?;
        let re: f64 = t.get(2)?;
        let im: f64 = t.get::<_, Option<f64>>(3)?.unwrap_or(0.0);
        operator += FermionOperator::parse(&term, C64::new(re, im))?;
    }

    // Write table, every entry optional.
    let write = match globals.get::<_, Option<Table>>("write")? {
        Some(w) => WriteOptions {
            verbose: w.get::<_, Option<bool>>("verbose")?.unwrap_or(false),
            json: w.get::<_, Option<String>>("json")?,
        },
        None => WriteOptions::default(),
    };

    Ok(Input {options, operator, write})
}

// Energy offsets may be given as nil, a real number or a {re, im} table.
fn read_complex(v: Value) -> Result<C64> {
    match v {
        Value::Nil => Ok(C64::new(0.0, 0.0)),
        Value::Integer(i) => Ok(C64::new(i as f64, 0.0)),
        Value::Number(x) => Ok(C64::new(x, 0.0)),
        Value::Table(t) => {
            let re: f64 = t.get(1)?;
            let im: f64 = t.get::<_, Option<f64>>(2)?.unwrap_or(0.0);
            Ok(C64::new(re, im))
        }
        other => Err(HamiltonianError::UnrecognisedInput(format!("e_0 = {}", other.type_name()))),
    }
}

// main.rs
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

use hamil_rs::build::{build_hamiltonian, HamiltonianInput};
use hamil_rs::input::load_input;
use hamil_rs::utils::{print_array2, print_nonzero};

fn main() {
    env_logger::init();
    let t_total = Instant::now();
    let input_path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("Usage: hamil-rs <input.lua>");
            std::process::exit(1);
        }
    };

    let input = match load_input(&input_path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input_path, e);
            std::process::exit(1);
        }
    };
    println!("Read operator with {} terms from {}", input.operator.len(), input_path);

    let t_build = Instant::now();
    let hamil = match build_hamiltonian(HamiltonianInput::Operator(input.operator), &input.options) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Failed to build Hamiltonian: {}", e);
            std::process::exit(1);
        }
    };
    let d_build = t_build.elapsed();

    println!("{}", "=".repeat(100));
    println!("Representation: {}", hamil.kind());
    println!("Rank: {}, dim: {}, norb: {}", hamil.rank(), hamil.dim(), hamil.norb());
    println!("Conserve number: {}", hamil.conserve_number());
    println!("E_0: {}", hamil.e_0());
    println!("{}", "=".repeat(100));

    if input.write.verbose {
        match hamil.spin_orbital_matrix() {
            Some(mat) => {
                println!("Spin-orbital one-body matrix:");
                print_array2(&mat);
            }
            None => {
                for (k, t) in hamil.tensors().iter().enumerate() {
                    println!("Rank {} tensor non-zero elements:", 2 * (k + 1));
                    print_nonzero(t);
                }
            }
        }
    }

    if let Some(path) = &input.write.json {
        println!("Writing summary to {}...", path);
        let written = File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|f| serde_json::to_writer_pretty(BufWriter::new(f), &hamil.summary()).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Failed to write {}: {}", path, e);
            std::process::exit(1);
        }
    }

    println!("Build time: {:?}", d_build);
    println!("Total wall time: {:?}", t_total.elapsed());
}

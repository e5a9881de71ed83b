//! Send an array to Python, transform it there and fetch it back.
//!
//! Needs a `python3` with numpy on PATH (or set NPYBRIDGE_PYTHON):
//!   cargo run --example loopback

use std::path::PathBuf;

use npybridge::format::NdArray;
use npybridge::session::{spawn, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let program = std::env::var_os("NPYBRIDGE_PYTHON")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("python3"));
    let config = SessionConfig {
        program,
        ..SessionConfig::default()
    };

    let mut python = spawn(&config, |line: &str| eprintln!("python> {line}"))?;
    eprintln!("Interpreter pid {}", python.id());

    let samples = NdArray::from_vec(vec![2, 3], vec![0.5f64, 1.0, 1.5, 2.0, 2.5, 3.0])?;
    python.send("samples", &samples)?;
    python.write_line("scaled = (samples * 2).astype(np.float32)")?;
    python.write_line("print(scaled.sum())")?;

    let scaled = python.get("scaled")?;
    println!(
        "{} {:?}: {:?}",
        scaled.element_type(),
        scaled.shape(),
        scaled.to_vec::<f32>()?
    );

    let status = python.close()?;
    eprintln!("Interpreter exited with {status}");
    Ok(())
}

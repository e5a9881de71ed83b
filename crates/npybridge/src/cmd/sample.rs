use std::io::BufRead;

use npybridge_format::{ElementType, NdArray};
use npybridge_session::{spawn, ProcessSession, SessionConfig};
use tracing::info;

use crate::cmd::{check_identifier, SampleArgs};
use crate::exit::{format_error, io_error, session_error, CliError, CliResult, FAILURE, SUCCESS};

pub fn run(args: SampleArgs) -> CliResult<i32> {
    if let Some(module) = &args.calc_module {
        check_identifier(module)?;
    }

    let config = SessionConfig {
        program: args.python.clone(),
        script: args.script.clone(),
        inherit_stderr: args.show_stderr,
        ..SessionConfig::default()
    };
    let mut python = spawn(&config, |text: &str| println!("{text}"))
        .map_err(|err| session_error("sample", err))?;
    info!(pid = python.id(), "interpreter ready");

    let grid = NdArray::from_vec(vec![3, 4], (0..12).collect::<Vec<i32>>())
        .map_err(|err| format_error("sample", err))?;
    python
        .send("x", &grid)
        .map_err(|err| session_error("send x", err))?;

    let mut commands: Vec<String> = ["x", "x = x + 10", "x", "y = x"]
        .into_iter()
        .map(String::from)
        .collect();
    if let Some(module) = &args.calc_module {
        commands.push(format!("import {module}"));
        commands.push(format!("x = {module}.calc(x)"));
        commands.push("x".to_string());
    }
    for command in &commands {
        python
            .write_line(command)
            .map_err(|err| session_error(command, err))?;
    }

    for name in ["x", "y"] {
        let array = python
            .get(name)
            .map_err(|err| session_error(&format!("get {name}"), err))?;
        for (index, value) in element_strings(&array)?.iter().enumerate() {
            println!("{index} : {value}");
        }
    }

    if !args.no_interactive {
        forward_stdin(&mut python)?;
    }

    let status = python
        .close()
        .map_err(|err| session_error("close interpreter", err))?;
    if status.success() {
        Ok(SUCCESS)
    } else {
        Ok(status.code().unwrap_or(FAILURE))
    }
}

/// Hand stdin to the interpreter line by line until either side ends.
fn forward_stdin(python: &mut ProcessSession) -> CliResult<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| io_error("read stdin", err))?;
        if python
            .has_exited()
            .map_err(|err| session_error("interpreter status", err))?
        {
            break;
        }
        python
            .write_line(&line)
            .map_err(|err| session_error("forward stdin", err))?;
    }
    Ok(())
}

/// Render each element in row-major order.
fn element_strings(array: &NdArray) -> CliResult<Vec<String>> {
    fn render<T: npybridge_format::Element + ToString>(array: &NdArray) -> CliResult<Vec<String>> {
        array
            .to_vec::<T>()
            .map(|values| values.iter().map(ToString::to_string).collect())
            .map_err(|err| format_error("render array", err))
    }

    match array.element_type() {
        ElementType::Bool => render::<bool>(array),
        ElementType::Int8 => render::<i8>(array),
        ElementType::Int16 => render::<i16>(array),
        ElementType::Int32 => render::<i32>(array),
        ElementType::Int64 => render::<i64>(array),
        ElementType::UInt8 => render::<u8>(array),
        ElementType::UInt16 => render::<u16>(array),
        ElementType::UInt32 => render::<u32>(array),
        ElementType::UInt64 => render::<u64>(array),
        ElementType::Float32 => render::<f32>(array),
        ElementType::Float64 => render::<f64>(array),
        ElementType::ByteString(_) => Err(CliError::new(
            FAILURE,
            "byte-string arrays cannot be printed element-wise",
        )),
    }
}

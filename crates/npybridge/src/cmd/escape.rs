use std::io::Write;

use npybridge_format::decode;
use npybridge_session::{escape_literal, Session, TransferChannel};

use crate::cmd::{check_identifier, EscapeArgs};
use crate::exit::{format_error, io_error, session_error, CliResult, SUCCESS};

pub fn run(args: EscapeArgs) -> CliResult<i32> {
    let context = format!("escape {}", args.path.display());
    let bytes = std::fs::read(&args.path).map_err(|err| io_error(&context, err))?;

    let Some(name) = args.name else {
        // Validate the header only; string arrays are still printable.
        npybridge_format::read_header(&mut bytes.as_slice())
            .map_err(|err| format_error(&context, err))?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", escape_literal(&bytes)).map_err(|err| io_error("stdout", err))?;
        return Ok(SUCCESS);
    };

    check_identifier(&name)?;
    let array = decode(&bytes).map_err(|err| format_error(&context, err))?;
    let mut session = Session::new(std::io::stdout().lock(), TransferChannel::new())
        .with_bytes_prefix(!args.no_bytes_prefix);
    session
        .send(&name, &array)
        .map_err(|err| session_error(&context, err))?;
    Ok(SUCCESS)
}

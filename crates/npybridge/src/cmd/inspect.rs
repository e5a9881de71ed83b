use std::fs::File;
use std::io::BufReader;

use npybridge_format::read_header;

use crate::cmd::InspectArgs;
use crate::exit::{format_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_header_summary, HeaderSummary, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let context = format!("inspect {}", args.path.display());
    let file = File::open(&args.path).map_err(|err| io_error(&context, err))?;
    let file_len = file
        .metadata()
        .map_err(|err| io_error(&context, err))?
        .len();

    let header =
        read_header(&mut BufReader::new(file)).map_err(|err| format_error(&context, err))?;
    let payload_bytes = header
        .payload_len()
        .map_err(|err| format_error(&context, err))?;

    let mut summary = HeaderSummary::new(&args.path, &header, payload_bytes);
    summary.available_bytes = Some(file_len.saturating_sub(header.header_len as u64));
    print_header_summary(&summary, format);

    if summary.is_complete() {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

use npybridge_format::{decode, write_npy};
use npybridge_session::{LineDemultiplexer, Routed, TransferChannel};
use tracing::{info, warn};

use crate::cmd::DemuxArgs;
use crate::exit::{format_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_demux_summary, DemuxSummary, OutputFormat};

pub fn run(args: DemuxArgs, format: OutputFormat) -> CliResult<i32> {
    std::fs::create_dir_all(&args.out_dir)
        .map_err(|err| io_error(&format!("create {}", args.out_dir.display()), err))?;

    let mut reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("open {}", path.display()), err))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(std::io::stdin().lock()),
    };

    let summary = split_transcript(&mut reader, &args.out_dir)?;
    print_demux_summary(&summary, format);

    if summary.failed == 0 {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

/// Route every transcript line; frames are taken off the channel as soon as
/// they are produced, so the single slot never blocks this thread.
fn split_transcript(reader: &mut dyn BufRead, out_dir: &Path) -> CliResult<DemuxSummary> {
    let channel = TransferChannel::new();
    let mut demux = LineDemultiplexer::new(channel.clone(), |text: &str| {
        let mut out = std::io::stdout().lock();
        if let Err(err) = writeln!(out, "{text}") {
            warn!(%err, "dropping transcript line");
        }
    });

    let mut summary = DemuxSummary {
        text_lines: 0,
        frames: 0,
        written: Vec::new(),
        failed: 0,
    };
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("read transcript", err)),
        }

        if demux.feed_line(&line) == Routed::Text {
            summary.text_lines += 1;
            continue;
        }

        let index = summary.frames;
        summary.frames += 1;
        let frame = channel.consume();
        let array = match decode(&frame) {
            Ok(array) => array,
            Err(err) => {
                warn!(frame = index, %err, "skipping undecodable frame");
                summary.failed += 1;
                continue;
            }
        };

        let path = out_dir.join(format!("frame-{index}.npy"));
        write_npy(&path, &array)
            .map_err(|err| format_error(&format!("write {}", path.display()), err))?;
        info!(
            frame = index,
            path = %path.display(),
            shape = ?array.shape(),
            element = %array.element_type(),
            "wrote frame"
        );
        summary.written.push(path.display().to_string());
    }

    Ok(summary)
}

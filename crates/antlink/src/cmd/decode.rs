use std::fs;

use antlink_frame::FrameDecoder;
use tracing::{debug, info, warn};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => return Err(CliError::usage("one of --hex or --file is required")),
    };

    let mut decoder = FrameDecoder::new();
    let mut decoded = 0usize;
    let mut rejected = 0usize;
    for result in decoder.feed(&bytes) {
        match result {
            Ok(message) => {
                decoded += 1;
                print_message(&message, format);
            }
            Err(err) => {
                rejected += 1;
                debug!(error = %err, "skipping corrupt frame");
            }
        }
    }

    if !decoder.is_idle() {
        warn!(bytes = decoder.pending_len(), "input ends inside a frame");
    }
    info!(input = bytes.len(), decoded, rejected, "decode finished");

    if decoded == 0 && rejected > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no valid frames ({rejected} rejected)"),
        ));
    }
    Ok(SUCCESS)
}

use antlink_frame::Message;

use crate::cmd::{parse_hex, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.payload)?;
    let frame = Message::new(args.id, payload)
        .encode()
        .map_err(|err| frame_error("encode failed", err))?;
    print_frames(&[(args.id, frame.to_vec())], format);
    Ok(SUCCESS)
}

use antlink_session::burst_packets;

use crate::cmd::{parse_hex, BurstArgs};
use crate::exit::{frame_error, session_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: BurstArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_hex(&args.data)?;
    let packets =
        burst_packets(args.channel, &data).map_err(|err| session_error("invalid burst", err))?;

    let mut frames = Vec::with_capacity(packets.len());
    for packet in &packets {
        let frame = packet
            .encode()
            .map_err(|err| frame_error("encode failed", err))?;
        frames.push((packet.id, frame.to_vec()));
    }
    print_frames(&frames, format);
    Ok(SUCCESS)
}

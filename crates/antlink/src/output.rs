use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use antlink_frame::{code_name, message_name, ChannelResponse, Message};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageOutput {
    pub id: u8,
    pub name: &'static str,
    pub payload_size: usize,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseOutput>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseOutput {
    pub channel: u8,
    pub message_id: u8,
    pub code: u8,
    pub code_name: &'static str,
}

impl MessageOutput {
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id,
            name: message_name(message.id),
            payload_size: message.payload.len(),
            payload: hex::encode(&message.payload),
            response: ChannelResponse::parse(message).map(|r| ResponseOutput {
                channel: r.channel,
                message_id: r.message_id,
                code: r.code,
                code_name: code_name(r.code),
            }),
            timestamp: now_unix_seconds(),
        }
    }
}

/// An encoded frame, as printed by `encode` and `burst`.
#[derive(Debug, Serialize)]
pub struct FrameOutput {
    pub id: u8,
    pub name: &'static str,
    pub frame: String,
}

impl FrameOutput {
    pub fn new(id: u8, frame: &[u8]) -> Self {
        Self {
            id,
            name: message_name(id),
            frame: hex::encode(frame),
        }
    }
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let out = MessageOutput::from_message(message);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    format!("0x{:02X}", out.id),
                    out.name.to_string(),
                    out.payload_size.to_string(),
                    out.payload.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match &out.response {
            Some(resp) => println!(
                "id=0x{:02X} ({}) channel={} message=0x{:02X} code={}",
                out.id, out.name, resp.channel, resp.message_id, resp.code_name
            ),
            None => println!(
                "id=0x{:02X} ({}) size={} payload={}",
                out.id, out.name, out.payload_size, out.payload
            ),
        },
        OutputFormat::Raw => {
            if let Ok(frame) = message.encode() {
                print_raw(&frame);
            }
        }
    }
}

pub fn print_frames(frames: &[(u8, Vec<u8>)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (id, frame) in frames {
                print_json(&FrameOutput::new(*id, frame));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "ID", "NAME", "FRAME"]);
            for (index, (id, frame)) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    format!("0x{id:02X}"),
                    message_name(*id).to_string(),
                    hex::encode(frame),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (id, frame) in frames {
                println!("{} {}", message_name(*id), hex::encode(frame));
            }
        }
        OutputFormat::Raw => {
            for (_, frame) in frames {
                print_raw(frame);
            }
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

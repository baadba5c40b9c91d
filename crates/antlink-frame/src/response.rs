use crate::codec::Message;
use crate::ids;

/// A parsed channel response or RF event (message id 0x40).
///
/// When `message_id` is 0x01 the message is an RF event on the channel;
/// otherwise it is the device's reply to the command with that id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelResponse {
    pub channel: u8,
    pub message_id: u8,
    pub code: u8,
}

impl ChannelResponse {
    /// Parse a channel event message. Returns `None` for any other id or a short payload.
    pub fn parse(message: &Message) -> Option<Self> {
        if message.id != ids::CHANNEL_EVENT {
            return None;
        }
        match message.payload.as_ref() {
            [channel, message_id, code, ..] => Some(Self {
                channel: *channel,
                message_id: *message_id,
                code: *code,
            }),
            _ => None,
        }
    }

    /// True for an unsolicited RF event rather than a command response.
    pub fn is_event(&self) -> bool {
        self.message_id == 0x01
    }

    /// True for a command response reporting success.
    pub fn is_ok(&self) -> bool {
        !self.is_event() && self.code == ids::RESPONSE_NO_ERROR
    }
}

/// Returns a human-readable name for a channel event or response code.
pub fn code_name(code: u8) -> &'static str {
    match code {
        ids::RESPONSE_NO_ERROR => "RESPONSE_NO_ERROR",
        ids::EVENT_RX_SEARCH_TIMEOUT => "EVENT_RX_SEARCH_TIMEOUT",
        ids::EVENT_RX_FAIL => "EVENT_RX_FAIL",
        ids::EVENT_TX => "EVENT_TX",
        ids::EVENT_TRANSFER_RX_FAILED => "EVENT_TRANSFER_RX_FAILED",
        ids::EVENT_TRANSFER_TX_COMPLETED => "EVENT_TRANSFER_TX_COMPLETED",
        ids::EVENT_TRANSFER_TX_FAILED => "EVENT_TRANSFER_TX_FAILED",
        ids::EVENT_CHANNEL_CLOSED => "EVENT_CHANNEL_CLOSED",
        ids::EVENT_RX_FAIL_GO_TO_SEARCH => "EVENT_RX_FAIL_GO_TO_SEARCH",
        ids::EVENT_CHANNEL_COLLISION => "EVENT_CHANNEL_COLLISION",
        ids::EVENT_TRANSFER_TX_START => "EVENT_TRANSFER_TX_START",
        ids::CHANNEL_IN_WRONG_STATE => "CHANNEL_IN_WRONG_STATE",
        ids::CHANNEL_NOT_OPENED => "CHANNEL_NOT_OPENED",
        ids::CHANNEL_ID_NOT_SET => "CHANNEL_ID_NOT_SET",
        ids::TRANSFER_IN_PROGRESS => "TRANSFER_IN_PROGRESS",
        ids::INVALID_MESSAGE => "INVALID_MESSAGE",
        _ => "UNKNOWN",
    }
}

//! Message ids and field constants of the ANT serial protocol.
//!
//! Config and control ids are sent by the host; event, status and data ids
//! arrive from the device. Data ids (0x4E to 0x50) travel both ways.

/// Channel response / RF event.
pub const CHANNEL_EVENT: u8 = 0x40;
/// Release a channel assignment.
pub const UNASSIGN_CHANNEL: u8 = 0x41;
/// Assign a channel type and network to a channel.
pub const ASSIGN_CHANNEL: u8 = 0x42;
/// Channel message period.
pub const CHANNEL_PERIOD: u8 = 0x43;
/// High priority search timeout.
pub const CHANNEL_SEARCH_TIMEOUT: u8 = 0x44;
/// RF frequency offset from 2400 MHz.
pub const CHANNEL_RADIO_FREQ: u8 = 0x45;
/// Network key.
pub const NETWORK_KEY: u8 = 0x46;
/// Device-wide transmit power.
pub const RADIO_TX_POWER: u8 = 0x47;
/// Search waveform.
pub const SEARCH_WAVEFORM: u8 = 0x49;
/// System reset.
pub const SYSTEM_RESET: u8 = 0x4A;
/// Open a channel.
pub const OPEN_CHANNEL: u8 = 0x4B;
/// Close a channel.
pub const CLOSE_CHANNEL: u8 = 0x4C;
/// Ask the device to send a given message.
pub const REQUEST: u8 = 0x4D;
/// Broadcast data.
pub const BROADCAST_DATA: u8 = 0x4E;
/// Acknowledged data.
pub const ACKNOWLEDGED_DATA: u8 = 0x4F;
/// Burst data packet.
pub const BURST_DATA: u8 = 0x50;
/// Channel id (device number, device type, transmission type).
pub const CHANNEL_ID: u8 = 0x51;
/// Channel status (response to a request).
pub const CHANNEL_STATUS: u8 = 0x52;
/// Capabilities (response to a request).
pub const CAPABILITIES: u8 = 0x54;
/// Add a device to the inclusion/exclusion list.
pub const ID_LIST_ADD: u8 = 0x59;
/// Configure the inclusion/exclusion list.
pub const ID_LIST_CONFIG: u8 = 0x5A;
/// Continuous scan mode.
pub const OPEN_RX_SCAN: u8 = 0x5B;
/// Per-channel transmit power.
pub const CHANNEL_RADIO_TX_POWER: u8 = 0x60;
/// Device serial number (response to a request).
pub const SERIAL_NUMBER: u8 = 0x61;
/// Low priority search timeout.
pub const LOW_PRIORITY_SEARCH_TIMEOUT: u8 = 0x63;
/// ANT version string (response to a request).
pub const VERSION: u8 = 0x3E;
/// Sent by the device after power-up or reset.
pub const STARTUP: u8 = 0x6F;

/// Bidirectional slave (receive) channel.
pub const CHANNEL_TYPE_SLAVE: u8 = 0x00;
/// Bidirectional master (transmit) channel.
pub const CHANNEL_TYPE_MASTER: u8 = 0x10;
/// Shared bidirectional slave channel.
pub const CHANNEL_TYPE_SHARED_SLAVE: u8 = 0x20;
/// Shared bidirectional master channel.
pub const CHANNEL_TYPE_SHARED_MASTER: u8 = 0x30;
/// Receive-only slave channel.
pub const CHANNEL_TYPE_SLAVE_RECEIVE_ONLY: u8 = 0x40;
/// Transmit-only master channel.
pub const CHANNEL_TYPE_MASTER_TRANSMIT_ONLY: u8 = 0x50;

/// Extended assignment: background scanning.
pub const EXT_BACKGROUND_SCANNING: u8 = 0x01;
/// Extended assignment: frequency agility.
pub const EXT_FREQUENCY_AGILITY: u8 = 0x04;
/// Extended assignment: fast channel initiation.
pub const EXT_FAST_CHANNEL_INIT: u8 = 0x10;
/// Extended assignment: asynchronous transmission.
pub const EXT_ASYNC_TX: u8 = 0x20;

/// Valid bits of a transmit power level.
pub const RADIO_TX_POWER_LVL_MASK: u8 = 0x03;

/// Standard search waveform.
pub const SEARCH_WAVEFORM_STANDARD: u16 = 316;
/// Fast search waveform.
pub const SEARCH_WAVEFORM_FAST: u16 = 97;

/// Channel numbers occupy the low five bits of a burst channel-sequence byte.
pub const CHANNEL_NUMBER_MASK: u8 = 0x1F;
/// Shift of the sequence field within a burst channel-sequence byte.
pub const BURST_SEQUENCE_SHIFT: u8 = 5;
/// Sequence flag marking the last packet of a burst.
pub const BURST_LAST_PACKET: u8 = 0b100;
/// Data bytes carried by one broadcast, acknowledged or burst packet.
pub const DATA_PAYLOAD_SIZE: usize = 8;

/// Channel event code: success response to a command.
pub const RESPONSE_NO_ERROR: u8 = 0x00;
/// Channel event code: search timed out.
pub const EVENT_RX_SEARCH_TIMEOUT: u8 = 0x01;
/// Channel event code: expected message not received.
pub const EVENT_RX_FAIL: u8 = 0x02;
/// Channel event code: broadcast sent.
pub const EVENT_TX: u8 = 0x03;
/// Channel event code: burst receive failed.
pub const EVENT_TRANSFER_RX_FAILED: u8 = 0x04;
/// Channel event code: acknowledged/burst transfer completed.
pub const EVENT_TRANSFER_TX_COMPLETED: u8 = 0x05;
/// Channel event code: acknowledged/burst transfer failed.
pub const EVENT_TRANSFER_TX_FAILED: u8 = 0x06;
/// Channel event code: channel closed.
pub const EVENT_CHANNEL_CLOSED: u8 = 0x07;
/// Channel event code: channel dropped back to search.
pub const EVENT_RX_FAIL_GO_TO_SEARCH: u8 = 0x08;
/// Channel event code: channel collision.
pub const EVENT_CHANNEL_COLLISION: u8 = 0x09;
/// Channel event code: burst transfer started.
pub const EVENT_TRANSFER_TX_START: u8 = 0x0A;
/// Response code: command invalid in the channel's state.
pub const CHANNEL_IN_WRONG_STATE: u8 = 0x15;
/// Response code: channel not opened.
pub const CHANNEL_NOT_OPENED: u8 = 0x16;
/// Response code: channel id not set.
pub const CHANNEL_ID_NOT_SET: u8 = 0x18;
/// Response code: transfer already in progress.
pub const TRANSFER_IN_PROGRESS: u8 = 0x1F;
/// Response code: malformed message.
pub const INVALID_MESSAGE: u8 = 0x28;

/// Returns a human-readable name for a message id.
pub fn message_name(id: u8) -> &'static str {
    match id {
        CHANNEL_EVENT => "CHANNEL_EVENT",
        UNASSIGN_CHANNEL => "UNASSIGN_CHANNEL",
        ASSIGN_CHANNEL => "ASSIGN_CHANNEL",
        CHANNEL_PERIOD => "CHANNEL_PERIOD",
        CHANNEL_SEARCH_TIMEOUT => "CHANNEL_SEARCH_TIMEOUT",
        CHANNEL_RADIO_FREQ => "CHANNEL_RADIO_FREQ",
        NETWORK_KEY => "NETWORK_KEY",
        RADIO_TX_POWER => "RADIO_TX_POWER",
        SEARCH_WAVEFORM => "SEARCH_WAVEFORM",
        SYSTEM_RESET => "SYSTEM_RESET",
        OPEN_CHANNEL => "OPEN_CHANNEL",
        CLOSE_CHANNEL => "CLOSE_CHANNEL",
        REQUEST => "REQUEST",
        BROADCAST_DATA => "BROADCAST_DATA",
        ACKNOWLEDGED_DATA => "ACKNOWLEDGED_DATA",
        BURST_DATA => "BURST_DATA",
        CHANNEL_ID => "CHANNEL_ID",
        CHANNEL_STATUS => "CHANNEL_STATUS",
        CAPABILITIES => "CAPABILITIES",
        ID_LIST_ADD => "ID_LIST_ADD",
        ID_LIST_CONFIG => "ID_LIST_CONFIG",
        OPEN_RX_SCAN => "OPEN_RX_SCAN",
        CHANNEL_RADIO_TX_POWER => "CHANNEL_RADIO_TX_POWER",
        SERIAL_NUMBER => "SERIAL_NUMBER",
        LOW_PRIORITY_SEARCH_TIMEOUT => "LOW_PRIORITY_SEARCH_TIMEOUT",
        VERSION => "VERSION",
        STARTUP => "STARTUP",
        _ => "UNKNOWN",
    }
}

/// Returns true for ids that carry 8-byte channel data.
pub fn is_data_message(id: u8) -> bool {
    matches!(id, BROADCAST_DATA | ACKNOWLEDGED_DATA | BURST_DATA)
}

//! Outbound command builders.
//!
//! Each free function builds one protocol message and validates its
//! arguments against the wire format. The same-named methods on
//! [`Outbound`] build and enqueue in one step: configuration and control
//! commands go on the queued lane, acknowledged and burst data on the
//! timeslot lane.

use antlink_frame::ids::{
    self, BURST_LAST_PACKET, BURST_SEQUENCE_SHIFT, CHANNEL_NUMBER_MASK, DATA_PAYLOAD_SIZE,
    RADIO_TX_POWER_LVL_MASK, SEARCH_WAVEFORM_FAST, SEARCH_WAVEFORM_STANDARD,
};
use antlink_frame::Message;

use crate::error::{Result, SessionError};
use crate::session::Outbound;

/// Length of a network key.
pub const NETWORK_KEY_SIZE: usize = 8;

/// Release `channel` so it can be assigned again.
pub fn unassign_channel(channel: u8) -> Message {
    Message::new(ids::UNASSIGN_CHANNEL, vec![channel])
}

/// Assign `channel` a type and a network number.
pub fn assign_channel(channel: u8, channel_type: u8, network: u8) -> Message {
    Message::new(ids::ASSIGN_CHANNEL, vec![channel, channel_type, network])
}

/// Assignment carrying extended flags (`ids::EXT_*`).
pub fn assign_channel_ext(channel: u8, channel_type: u8, network: u8, ext_flags: u8) -> Message {
    Message::new(
        ids::ASSIGN_CHANNEL,
        vec![channel, channel_type, network, ext_flags],
    )
}

/// Set the device number, device type and transmission type of `channel`.
pub fn set_channel_id(
    channel: u8,
    device_number: u16,
    device_type: u8,
    transmission_type: u8,
) -> Message {
    let [lo, hi] = device_number.to_le_bytes();
    Message::new(
        ids::CHANNEL_ID,
        vec![channel, lo, hi, device_type, transmission_type],
    )
}

/// Message period in 1/32768 s units.
pub fn set_channel_period(channel: u8, period: u16) -> Message {
    let [lo, hi] = period.to_le_bytes();
    Message::new(ids::CHANNEL_PERIOD, vec![channel, lo, hi])
}

/// Search timeout in 2.5 s units.
pub fn set_channel_search_timeout(channel: u8, timeout: u8) -> Message {
    Message::new(ids::CHANNEL_SEARCH_TIMEOUT, vec![channel, timeout])
}

/// RF frequency as an offset from 2400 MHz.
pub fn set_channel_rf_freq(channel: u8, freq: u8) -> Message {
    Message::new(ids::CHANNEL_RADIO_FREQ, vec![channel, freq])
}

/// Load an 8 byte network key into slot `network`.
pub fn set_network_key(network: u8, key: &[u8]) -> Result<Message> {
    if key.len() != NETWORK_KEY_SIZE {
        return Err(SessionError::invalid(format!(
            "network key must be {NETWORK_KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    let mut payload = Vec::with_capacity(1 + NETWORK_KEY_SIZE);
    payload.push(network);
    payload.extend_from_slice(key);
    Ok(Message::new(ids::NETWORK_KEY, payload))
}

/// Transmit power for every channel. Only the low two bits are used.
pub fn set_transmit_power(power: u8) -> Message {
    Message::new(ids::RADIO_TX_POWER, vec![0, power & RADIO_TX_POWER_LVL_MASK])
}

/// Search waveform; only the standard (316) and fast (97) values are accepted.
pub fn set_search_waveform(channel: u8, waveform: u16) -> Result<Message> {
    if waveform != SEARCH_WAVEFORM_STANDARD && waveform != SEARCH_WAVEFORM_FAST {
        return Err(SessionError::invalid(format!(
            "search waveform must be {SEARCH_WAVEFORM_FAST} or {SEARCH_WAVEFORM_STANDARD}, got {waveform}"
        )));
    }
    let [lo, hi] = waveform.to_le_bytes();
    Ok(Message::new(ids::SEARCH_WAVEFORM, vec![channel, lo, hi]))
}

/// Reset the device.
pub fn reset_system() -> Message {
    Message::new(ids::SYSTEM_RESET, vec![0])
}

/// Open `channel` for transmit or receive.
pub fn open_channel(channel: u8) -> Message {
    Message::new(ids::OPEN_CHANNEL, vec![channel])
}

/// Close `channel`.
pub fn close_channel(channel: u8) -> Message {
    Message::new(ids::CLOSE_CHANNEL, vec![channel])
}

/// Ask the device to send the message with id `message_id`.
pub fn request_message(channel: u8, message_id: u8) -> Message {
    Message::new(ids::REQUEST, vec![channel, message_id])
}

/// Broadcast 8 bytes on `channel`.
pub fn broadcast_data(channel: u8, data: &[u8]) -> Result<Message> {
    data_message(ids::BROADCAST_DATA, channel, data)
}

/// Send 8 bytes on `channel` and ask the peer to acknowledge them.
pub fn acknowledged_data(channel: u8, data: &[u8]) -> Result<Message> {
    data_message(ids::ACKNOWLEDGED_DATA, channel, data)
}

/// One burst packet. `channel_seq` already carries the sequence bits.
pub fn burst_transfer_packet(channel_seq: u8, data: &[u8]) -> Result<Message> {
    data_message(ids::BURST_DATA, channel_seq, data)
}

/// Sequence field of packet `index` in a burst of `count` packets.
///
/// The first packet carries 0, later packets cycle 1, 2, 3, and the last
/// packet also carries [`BURST_LAST_PACKET`]. A lone packet is both first and
/// last, so it carries just the last-packet flag.
pub fn burst_sequence(index: usize, count: usize) -> u8 {
    let mut sequence = if index == 0 {
        0
    } else {
        ((index - 1) % 3) as u8 + 1
    };
    if index + 1 == count {
        sequence |= BURST_LAST_PACKET;
    }
    sequence
}

/// Split `data` into sequenced burst packets for `channel`.
pub fn burst_packets(channel: u8, data: &[u8]) -> Result<Vec<Message>> {
    if channel > CHANNEL_NUMBER_MASK {
        return Err(SessionError::invalid(format!(
            "burst channel {channel} does not fit in 5 bits"
        )));
    }
    if data.is_empty() || data.len() % DATA_PAYLOAD_SIZE != 0 {
        return Err(SessionError::invalid(format!(
            "burst data must be a non-empty multiple of {DATA_PAYLOAD_SIZE} bytes, got {}",
            data.len()
        )));
    }

    let count = data.len() / DATA_PAYLOAD_SIZE;
    data.chunks_exact(DATA_PAYLOAD_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let channel_seq = channel | (burst_sequence(index, count) << BURST_SEQUENCE_SHIFT);
            burst_transfer_packet(channel_seq, chunk)
        })
        .collect()
}

/// Add a device to the inclusion/exclusion list of `channel` at `list_index`.
pub fn add_channel_id(
    channel: u8,
    device_number: u16,
    device_type: u8,
    transmission_type: u8,
    list_index: u8,
) -> Message {
    let [lo, hi] = device_number.to_le_bytes();
    Message::new(
        ids::ID_LIST_ADD,
        vec![channel, lo, hi, device_type, transmission_type, list_index],
    )
}

/// Configure the inclusion/exclusion list filled by [`add_channel_id`].
pub fn config_list(channel: u8, list_size: u8, exclude: bool) -> Message {
    Message::new(
        ids::ID_LIST_CONFIG,
        vec![channel, list_size, u8::from(exclude)],
    )
}

/// Continuous scan on channel 0.
pub fn open_rx_scan_mode() -> Message {
    Message::new(ids::OPEN_RX_SCAN, vec![0, 1])
}

/// Per-channel transmit power.
pub fn set_channel_transmit_power(channel: u8, power: u8) -> Message {
    Message::new(
        ids::CHANNEL_RADIO_TX_POWER,
        vec![channel, power & RADIO_TX_POWER_LVL_MASK],
    )
}

/// Low priority search timeout in 2.5 s units.
pub fn set_low_priority_search_timeout(channel: u8, timeout: u8) -> Message {
    Message::new(ids::LOW_PRIORITY_SEARCH_TIMEOUT, vec![channel, timeout])
}

fn data_message(id: u8, lead: u8, data: &[u8]) -> Result<Message> {
    if data.len() != DATA_PAYLOAD_SIZE {
        return Err(SessionError::invalid(format!(
            "data length should be {DATA_PAYLOAD_SIZE}, got {}",
            data.len()
        )));
    }
    let mut payload = Vec::with_capacity(1 + DATA_PAYLOAD_SIZE);
    payload.push(lead);
    payload.extend_from_slice(data);
    Ok(Message::new(id, payload))
}

/// Build-and-enqueue counterparts of the builders above.
impl Outbound {
    pub fn unassign_channel(&self, channel: u8) -> Result<()> {
        self.write_queued(unassign_channel(channel))
    }

    pub fn assign_channel(&self, channel: u8, channel_type: u8, network: u8) -> Result<()> {
        self.write_queued(assign_channel(channel, channel_type, network))
    }

    pub fn assign_channel_ext(
        &self,
        channel: u8,
        channel_type: u8,
        network: u8,
        ext_flags: u8,
    ) -> Result<()> {
        self.write_queued(assign_channel_ext(channel, channel_type, network, ext_flags))
    }

    pub fn set_channel_id(
        &self,
        channel: u8,
        device_number: u16,
        device_type: u8,
        transmission_type: u8,
    ) -> Result<()> {
        self.write_queued(set_channel_id(
            channel,
            device_number,
            device_type,
            transmission_type,
        ))
    }

    pub fn set_channel_period(&self, channel: u8, period: u16) -> Result<()> {
        self.write_queued(set_channel_period(channel, period))
    }

    pub fn set_channel_search_timeout(&self, channel: u8, timeout: u8) -> Result<()> {
        self.write_queued(set_channel_search_timeout(channel, timeout))
    }

    pub fn set_channel_rf_freq(&self, channel: u8, freq: u8) -> Result<()> {
        self.write_queued(set_channel_rf_freq(channel, freq))
    }

    pub fn set_network_key(&self, network: u8, key: &[u8]) -> Result<()> {
        self.write_queued(set_network_key(network, key)?)
    }

    pub fn set_transmit_power(&self, power: u8) -> Result<()> {
        self.write_queued(set_transmit_power(power))
    }

    pub fn set_search_waveform(&self, channel: u8, waveform: u16) -> Result<()> {
        self.write_queued(set_search_waveform(channel, waveform)?)
    }

    pub fn reset_system(&self) -> Result<()> {
        self.write_queued(reset_system())
    }

    pub fn open_channel(&self, channel: u8) -> Result<()> {
        self.write_queued(open_channel(channel))
    }

    pub fn close_channel(&self, channel: u8) -> Result<()> {
        self.write_queued(close_channel(channel))
    }

    pub fn request_message(&self, channel: u8, message_id: u8) -> Result<()> {
        self.write_queued(request_message(channel, message_id))
    }

    /// Enqueue an arbitrary message on the queued lane.
    pub fn write_message(&self, id: u8, payload: &[u8]) -> Result<()> {
        self.write_queued(Message::new(id, payload.to_vec()))
    }

    pub fn send_broadcast_data(&self, channel: u8, data: &[u8]) -> Result<()> {
        self.write_queued(broadcast_data(channel, data)?)
    }

    pub fn send_acknowledged_data(&self, channel: u8, data: &[u8]) -> Result<()> {
        self.write_in_timeslot(acknowledged_data(channel, data)?)
    }

    pub fn send_burst_transfer_packet(&self, channel_seq: u8, data: &[u8]) -> Result<()> {
        self.write_in_timeslot(burst_transfer_packet(channel_seq, data)?)
    }

    /// Send `data` as a burst. Every packet is validated before the first
    /// one is enqueued; packets are then enqueued in order without waiting
    /// for the device to acknowledge any of them.
    pub fn send_burst_transfer(&self, channel: u8, data: &[u8]) -> Result<()> {
        for packet in burst_packets(channel, data)? {
            self.write_in_timeslot(packet)?;
        }
        Ok(())
    }

    pub fn add_channel_id(
        &self,
        channel: u8,
        device_number: u16,
        device_type: u8,
        transmission_type: u8,
        list_index: u8,
    ) -> Result<()> {
        self.write_queued(add_channel_id(
            channel,
            device_number,
            device_type,
            transmission_type,
            list_index,
        ))
    }

    pub fn config_list(&self, channel: u8, list_size: u8, exclude: bool) -> Result<()> {
        self.write_queued(config_list(channel, list_size, exclude))
    }

    pub fn open_rx_scan_mode(&self) -> Result<()> {
        self.write_queued(open_rx_scan_mode())
    }

    pub fn set_channel_transmit_power(&self, channel: u8, power: u8) -> Result<()> {
        self.write_queued(set_channel_transmit_power(channel, power))
    }

    pub fn set_low_priority_search_timeout(&self, channel: u8, timeout: u8) -> Result<()> {
        self.write_queued(set_low_priority_search_timeout(channel, timeout))
    }
}

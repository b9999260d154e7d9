//! Replays the single-beat timeout scenario and prints its trace and a stable fingerprint.

use decoder_core::{
    AddressBeat, CycleInputs, DataPathMode, DecoderConfig, TraceEvent, TraceLog, UpstreamRequest,
    WriteChannelDecoder,
};
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const CYCLES: u64 = 8;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn event_tag(event: &TraceEvent) -> (u8, u64) {
    match *event {
        TraceEvent::Reset { cycle } => (0x10, cycle),
        TraceEvent::AddressMatched { cycle, .. } => (0x11, cycle),
        TraceEvent::AddressRejected { cycle, .. } => (0x12, cycle),
        TraceEvent::AddressForwarded { cycle, .. } => (0x13, cycle),
        TraceEvent::DataForwarded { cycle, .. } => (0x14, cycle),
        TraceEvent::ResponseReturned { cycle, .. } => (0x15, cycle),
        TraceEvent::TimeoutFired { cycle } => (0x16, cycle),
        TraceEvent::Disconnected { cycle, .. } => (0x17, cycle),
    }
}

fn main() {
    let config = DecoderConfig {
        address_width: 32,
        bus_width: 4,
        data_path: DataPathMode::Buffered,
        timeout_beats: 4,
        base_address: 0x1000,
        region_mask: 0xFF00,
    };
    let mut decoder = WriteChannelDecoder::new(config).expect("scenario config is valid");
    let mut log = TraceLog::new();
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;

    for cycle in 0..CYCLES {
        let inputs = if cycle == 0 {
            CycleInputs {
                upstream: UpstreamRequest {
                    awvalid: true,
                    aw: AddressBeat::new(0x1050, 0),
                    ..UpstreamRequest::default()
                },
                ..CycleInputs::default()
            }
        } else {
            CycleInputs::default()
        };
        let out = decoder.tick_with_trace(&inputs, &mut log);
        println!(
            "cycle {cycle}: connected={} timeout={} idle_beats={}",
            u8::from(out.connected),
            u8::from(out.timeout),
            decoder.idle_beats()
        );
        hash_bytes(&mut hash, &[u8::from(out.connected), u8::from(out.timeout)]);
    }

    for event in log.events() {
        println!("{event:?}");
        let (tag, cycle) = event_tag(event);
        hash_bytes(&mut hash, &[tag]);
        hash_bytes(&mut hash, &cycle.to_le_bytes());
    }
    println!("{hash:016x}");
}

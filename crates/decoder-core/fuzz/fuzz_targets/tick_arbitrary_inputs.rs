#![no_main]

use decoder_core::{
    AddressBeat, CycleInputs, DataBeat, DataPathMode, DecoderConfig, DownstreamResponse,
    UpstreamRequest, WriteChannelDecoder, WriteResponse,
};
use libfuzzer_sys::fuzz_target;

fn cycle_inputs(chunk: &[u8]) -> CycleInputs {
    let flags = chunk[0];
    let bit = |n: u8| flags & (1 << n) != 0;
    CycleInputs {
        reset: chunk[1] == 0xFF,
        upstream: UpstreamRequest {
            awvalid: bit(0),
            aw: AddressBeat::new(u64::from(u16::from_be_bytes([chunk[2], chunk[3]])), chunk[1]),
            wvalid: bit(1),
            w: DataBeat::new(u64::from(chunk[3]), chunk[2]),
            bready: bit(2),
        },
        downstream: DownstreamResponse {
            awready: bit(3),
            wready: bit(4),
            bvalid: bit(5),
            bresp: WriteResponse::from_bits(flags >> 6).unwrap_or_default(),
        },
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let config = DecoderConfig {
        address_width: 16,
        bus_width: 1 << (data[0] & 0b11),
        data_path: if data[0] & 0b100 == 0 {
            DataPathMode::Buffered
        } else {
            DataPathMode::Unbuffered
        },
        timeout_beats: u32::from(data[1] & 0x0F),
        base_address: 0x1000,
        region_mask: 0xF000,
    };
    let Ok(mut decoder) = WriteChannelDecoder::new(config) else {
        return;
    };

    let mut previous_timeout = false;
    for chunk in data[2..].chunks_exact(4) {
        let inputs = cycle_inputs(chunk);
        let out = decoder.tick(&inputs);
        if previous_timeout {
            assert!(!out.timeout);
            assert!(!out.connected);
        }
        if out.upstream.awready {
            assert!(out.connected);
        }
        previous_timeout = out.timeout;
    }

    let snapshot = decoder.snapshot();
    let mut replica = WriteChannelDecoder::new(config).expect("config already validated");
    replica.restore(&snapshot).expect("same data path");
    assert_eq!(replica.snapshot(), snapshot);
});

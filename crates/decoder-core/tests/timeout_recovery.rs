//! Watchdog timing and recovery coverage against the full decoder.

#![allow(clippy::pedantic, clippy::nursery, clippy::too_many_lines)]

use decoder_core::{
    AddressBeat, CycleInputs, CycleOutputs, DataBeat, DataPathMode, DataPathSnapshot,
    DecoderConfig, DownstreamResponse, ReleaseCause, TraceEvent, TraceLog, UpstreamRequest,
    WatchdogPhase, WriteChannelDecoder, WriteResponse,
};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn decoder(mode: DataPathMode, timeout_beats: u32) -> WriteChannelDecoder {
    WriteChannelDecoder::new(DecoderConfig {
        address_width: 32,
        bus_width: 4,
        data_path: mode,
        timeout_beats,
        base_address: 0x1000,
        region_mask: 0xFF00,
    })
    .expect("scenario config is valid")
}

fn present_address(addr: u64) -> CycleInputs {
    CycleInputs {
        upstream: UpstreamRequest {
            awvalid: true,
            aw: AddressBeat::new(addr, 0b010),
            ..UpstreamRequest::default()
        },
        ..CycleInputs::default()
    }
}

fn run_idle(dec: &mut WriteChannelDecoder, cycles: usize) -> Vec<CycleOutputs> {
    (0..cycles).map(|_| dec.tick(&CycleInputs::default())).collect()
}

#[test]
fn scenario_single_beat_address_then_silence() {
    let mut dec = decoder(DataPathMode::Buffered, 4);

    // Cycle 0: matching address presented for one beat.
    let cycle0 = dec.tick(&present_address(0x1050));
    assert!(!cycle0.connected);

    // Cycles 1..=6.
    let outputs = run_idle(&mut dec, 6);
    for out in &outputs[0..4] {
        assert!(out.connected);
        assert!(!out.timeout);
    }
    let cycle5 = outputs[4];
    assert!(cycle5.timeout, "pulse is visible on cycle 5");
    assert!(cycle5.connected);

    let cycle6 = outputs[5];
    assert!(!cycle6.timeout);
    assert!(!cycle6.connected, "connection is dropped the cycle after the pulse");
    assert_eq!(dec.stats().timeouts, 1);
    assert_eq!(dec.stats().last_timeout_cycle, Some(5));
}

#[test]
fn stalled_buffered_write_is_flushed_and_released() {
    let mut dec = decoder(DataPathMode::Buffered, 4);
    let mut log = TraceLog::new();

    let mut request = CycleInputs {
        upstream: UpstreamRequest {
            awvalid: true,
            aw: AddressBeat::new(0x1050, 0),
            wvalid: true,
            w: DataBeat::new(0xDEAD_BEEF, 0xF),
            bready: true,
        },
        ..CycleInputs::default()
    };

    // Cycle 0: match. Cycle 1: both beats accepted into the buffers.
    dec.tick_with_trace(&request, &mut log);
    let accepted = dec.tick_with_trace(&request, &mut log);
    assert!(accepted.upstream.awready);
    assert!(accepted.upstream.wready);

    // Requester waits for a response that never comes.
    request.upstream.awvalid = false;
    request.upstream.wvalid = false;
    let mut timeout_cycle = None;
    for _ in 0..8 {
        let out = dec.tick_with_trace(&request, &mut log);
        if out.timeout {
            assert!(!out.downstream.awvalid, "flush masks held address");
            assert!(!out.downstream.wvalid, "flush masks held data");
            timeout_cycle = Some(dec.cycle() - 1);
        }
    }

    assert_eq!(timeout_cycle, Some(6));
    assert!(!dec.connected());
    assert!(dec.held_address().is_none());
    assert_eq!(dec.watchdog_phase(), WatchdogPhase::Idle);
    assert!(log.events().contains(&TraceEvent::Disconnected {
        cycle: 6,
        cause: ReleaseCause::Timeout,
    }));
}

#[rstest]
#[case(2, WriteResponse::SlvErr)]
#[case(3, WriteResponse::SlvErr)]
#[case(6, WriteResponse::Okay)]
fn held_response_is_dropped_by_the_pulse(#[case] beats: u32, #[case] resp: WriteResponse) {
    let mut dec = decoder(DataPathMode::Buffered, beats);
    dec.tick(&present_address(0x1050));
    assert!(dec.connected());

    // Responder answers once while the requester is not ready for it.
    dec.tick(&CycleInputs {
        downstream: DownstreamResponse {
            bvalid: true,
            bresp: resp,
            ..DownstreamResponse::default()
        },
        ..CycleInputs::default()
    });
    assert!(matches!(
        dec.snapshot().data_path,
        DataPathSnapshot::Buffered { response: Some(held), .. } if held == resp
    ));

    let mut pulse_seen = false;
    for _ in 0..beats + 4 {
        let out = dec.tick(&CycleInputs::default());
        if out.timeout {
            assert!(!out.upstream.bvalid, "flush masks held response");
            pulse_seen = true;
            break;
        }
        assert!(out.upstream.bvalid);
        assert_eq!(out.upstream.bresp, resp);
    }
    assert!(pulse_seen);
    assert!(matches!(
        dec.snapshot().data_path,
        DataPathSnapshot::Buffered { response: None, .. }
    ));

    let next = dec.tick(&CycleInputs::default());
    assert!(!next.connected);
    assert!(!next.upstream.bvalid);
    assert_eq!(dec.stats().responses_returned, 0);
}

#[rstest]
#[case(DataPathMode::Buffered, 1)]
#[case(DataPathMode::Buffered, 7)]
#[case(DataPathMode::Unbuffered, 1)]
#[case(DataPathMode::Unbuffered, 7)]
fn pulse_arrives_exactly_n_plus_one_cycles_after_connection(
    #[case] mode: DataPathMode,
    #[case] beats: u32,
) {
    let mut dec = decoder(mode, beats);
    dec.tick(&present_address(0x10F0));

    let outputs = run_idle(&mut dec, beats as usize + 3);
    let pulses: Vec<usize> = outputs
        .iter()
        .enumerate()
        .filter(|(_, out)| out.timeout)
        .map(|(index, _)| index + 1)
        .collect();
    assert_eq!(pulses, vec![beats as usize + 1]);
    assert!(!outputs[beats as usize + 1].connected);
}

#[rstest]
#[case(DataPathMode::Buffered)]
#[case(DataPathMode::Unbuffered)]
fn disabled_watchdog_holds_connection_forever(#[case] mode: DataPathMode) {
    let mut dec = decoder(mode, 0);
    dec.tick(&present_address(0x1050));
    for out in run_idle(&mut dec, 10_000) {
        assert!(out.connected);
        assert!(!out.timeout);
    }
    assert_eq!(dec.idle_beats(), 0);
}

#[test]
fn activity_on_any_channel_restarts_the_count() {
    let mut dec = decoder(DataPathMode::Buffered, 4);
    dec.tick(&present_address(0x1050));
    run_idle(&mut dec, 3);
    assert_eq!(dec.idle_beats(), 3);

    dec.tick(&CycleInputs {
        downstream: DownstreamResponse {
            bvalid: true,
            ..DownstreamResponse::default()
        },
        ..CycleInputs::default()
    });
    assert_eq!(dec.idle_beats(), 0);

    let outputs = run_idle(&mut dec, 5);
    assert!(!outputs[..4].iter().any(|out| out.timeout));
    assert!(outputs[4].timeout);
}

#[test]
fn recovered_decoder_admits_the_next_transaction() {
    let mut dec = decoder(DataPathMode::Buffered, 2);
    dec.tick(&present_address(0x1050));
    run_idle(&mut dec, 4);
    assert!(!dec.connected());

    dec.tick(&present_address(0x1060));
    assert!(dec.connected());
    assert_eq!(dec.stats().admitted, 2);
}

#[test]
fn completed_response_releases_without_timeout() {
    let mut dec = decoder(DataPathMode::Unbuffered, 4);
    dec.tick(&present_address(0x1050));

    let out = dec.tick(&CycleInputs {
        upstream: UpstreamRequest {
            bready: true,
            ..UpstreamRequest::default()
        },
        downstream: DownstreamResponse {
            bvalid: true,
            bresp: WriteResponse::Okay,
            ..DownstreamResponse::default()
        },
        ..CycleInputs::default()
    });
    assert!(out.upstream.bvalid);
    assert!(!dec.connected());
    assert_eq!(dec.stats().responses_returned, 1);
    assert_eq!(dec.stats().timeouts, 0);
}

#[test]
fn reset_during_countdown_cancels_the_pulse() {
    let mut dec = decoder(DataPathMode::Buffered, 4);
    dec.tick(&present_address(0x1050));
    run_idle(&mut dec, 3);

    dec.tick(&CycleInputs {
        reset: true,
        ..CycleInputs::default()
    });
    for out in run_idle(&mut dec, 10) {
        assert!(!out.timeout);
        assert!(!out.connected);
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Receiver-side tests: round trip, cardinality lock and the plot window

use rangelink_serialization::{
    CardinalityPolicy, DecodeError, DecodeOutcome, DecodedFrame, FrameEncoder, PlotWindow,
    StreamDecoder,
};
use rangelink_smoothing::FilterConfig;

fn frame(outcome: Result<DecodeOutcome, DecodeError>) -> DecodedFrame {
    match outcome {
        Ok(DecodeOutcome::Frame(frame)) => frame,
        other => panic!("expected a data frame, got {:?}", other),
    }
}

#[test]
fn test_encode_decode_round_trip() {
    let encoder = FrameEncoder::new(4).unwrap();
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);

    let readings = [Some(123), None, Some(456), Some(0)];
    let wire = encoder.encode(&readings).unwrap();
    let decoded = frame(decoder.decode(wire.as_bytes()));

    assert_eq!(decoded.raw, vec![123, 0, 456, 0]);
    assert_eq!(decoded.faults, vec![false, true, false, false]);
    assert_eq!(decoder.device_count(), Some(4));
}

#[test]
fn test_first_frame_locks_cardinality() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
    assert_eq!(decoder.device_count(), None);

    frame(decoder.decode(b"10 20 30 "));
    assert_eq!(decoder.device_count(), Some(3));
    assert_eq!(decoder.stats().locks, 1);
}

#[test]
fn test_reject_policy_drops_shrinking_and_growing_frames() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
    frame(decoder.decode(b"10 20 30 "));

    assert_eq!(
        decoder.decode(b"10 20 "),
        Err(DecodeError::CardinalityMismatch {
            expected: 3,
            actual: 2
        })
    );
    assert_eq!(
        decoder.decode(b"10 20 30 40 "),
        Err(DecodeError::CardinalityMismatch {
            expected: 3,
            actual: 4
        })
    );

    // State unchanged: the next correct frame is accepted in sequence
    let next = frame(decoder.decode(b"11 21 31 "));
    assert_eq!(next.sequence, 1);
    assert_eq!(decoder.device_count(), Some(3));
    assert_eq!(decoder.stats().frames_accepted, 2);
    assert_eq!(decoder.stats().frames_rejected, 2);
}

#[test]
fn test_resize_policy_truncates_and_pads() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Resize, None);
    frame(decoder.decode(b"10 20 30 "));

    let short = frame(decoder.decode(b"10 "));
    assert_eq!(short.raw, vec![10, 0, 0]);
    assert_eq!(short.faults, vec![false, true, true]);

    let long = frame(decoder.decode(b"1 2 3 4 5 "));
    assert_eq!(long.raw, vec![1, 2, 3]);
    assert_eq!(long.faults, vec![false, false, false]);
    assert_eq!(decoder.stats().frames_rejected, 0);
}

#[test]
fn test_malformed_tokens_become_zero_faults() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
    let decoded = frame(decoder.decode(b"5 ?? 7 "));

    assert_eq!(decoded.raw, vec![5, 0, 7]);
    assert_eq!(decoded.faults, vec![false, true, false]);
    assert_eq!(decoder.stats().malformed_tokens, 1);
}

#[test]
fn test_discovery_frame_relocks_and_resets_filters() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, Some(FilterConfig::default()));

    assert_eq!(
        decoder.decode(b"# 2 ").unwrap(),
        DecodeOutcome::Locked {
            device_count: 2,
            relocked: false
        }
    );
    for _ in 0..50 {
        frame(decoder.decode(b"500 500 "));
    }
    // Settled filters sleep through a one millimetre wobble
    let settled = frame(decoder.decode(b"501 501 "));
    assert_eq!(settled.filtered, vec![500, 500]);

    assert_eq!(
        decoder.decode(b"# 3 ").unwrap(),
        DecodeOutcome::Locked {
            device_count: 3,
            relocked: true
        }
    );
    assert_eq!(decoder.device_count(), Some(3));

    // Fresh filters are awake and follow the input
    let fresh = frame(decoder.decode(b"501 501 501 "));
    assert_eq!(fresh.filtered, vec![501, 501, 501]);
}

#[test]
fn test_faults_do_not_disturb_the_filter() {
    let mut with_faults =
        StreamDecoder::new(CardinalityPolicy::Reject, Some(FilterConfig::default()));
    let mut clean = StreamDecoder::new(CardinalityPolicy::Reject, Some(FilterConfig::default()));

    for cycle in 0..20 {
        let a = if cycle % 3 == 0 { "X " } else { "300 " };
        let decoded = frame(with_faults.decode(a.as_bytes()));
        if cycle % 3 == 0 {
            assert_eq!(decoded.filtered, vec![0]);
        } else {
            frame(clean.decode(b"300 "));
        }
    }

    let a = frame(with_faults.decode(b"300 "));
    let b = frame(clean.decode(b"300 "));
    assert_eq!(a.filtered, b.filtered);
}

#[test]
fn test_plot_window_resets_at_width() {
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
    let mut window = PlotWindow::new(100, 2);

    for _ in 0..100 {
        window.push(&frame(decoder.decode(b"1 2 ")));
    }
    assert_eq!(window.len(), 100);
    assert_eq!(window.raw(1).map(<[i64]>::len), Some(100));
    assert_eq!(window.wraps(), 0);

    window.push(&frame(decoder.decode(b"3 4 ")));
    assert_eq!(window.len(), 1);
    assert_eq!(window.xs(), &[0]);
    assert_eq!(window.raw(0), Some(&[3][..]));
    assert_eq!(window.filtered(1), Some(&[4][..]));
    assert_eq!(window.wraps(), 1);
}

#[test]
fn test_plot_window_follows_relock() {
    let mut window = PlotWindow::new(10, 2);
    let mut decoder = StreamDecoder::new(CardinalityPolicy::Reject, None);
    window.push(&frame(decoder.decode(b"1 2 ")));

    decoder.decode(b"# 3 ").unwrap();
    window.push(&frame(decoder.decode(b"1 2 3 ")));
    assert_eq!(window.series_count(), 3);
    assert_eq!(window.len(), 1);
}

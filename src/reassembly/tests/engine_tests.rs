//! Tests for fragment ingestion, broken-frame policy and stream isolation.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rstest::rstest;

use super::support::{CollectingSink, limits, setup, split};
use crate::{
    fragment::{ContentType, Fragment, FragmentHeader, FragmentIndex},
    ident::{IdentifierPool, StreamId},
    reassembly::{DropReason, Frame, IngestOutcome, Reassembler, StreamState},
};

fn feed(reassembler: &mut Reassembler, fragments: Vec<Fragment>) -> Vec<IngestOutcome> {
    fragments
        .into_iter()
        .map(|fragment| reassembler.ingest(fragment))
        .collect()
}

#[test]
fn two_fragment_frame_is_delivered_once() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 256));
    let first = FragmentHeader::new(1, FragmentIndex::zero(), 0).with_pts(1000);
    let second = FragmentHeader::new(1, FragmentIndex::new(1), 100).last();

    assert_eq!(
        reassembler.ingest(Fragment::new(stream, first, vec![7_u8; 100])),
        IngestOutcome::Pending
    );
    assert_eq!(
        reassembler.ingest(Fragment::new(stream, second, vec![9_u8; 50])),
        IngestOutcome::Emitted { broken: false }
    );

    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.size(), 150);
    assert_eq!(frame.pts(), Some(1000));
    assert!(!frame.is_broken());
    assert_eq!(frame.source(), stream);
    assert_eq!(&frame.payload()[..100], &[7_u8; 100][..]);
    assert_eq!(&frame.payload()[100..], &[9_u8; 50][..]);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(64)]
#[case(500)]
fn in_order_fragments_reassemble_identically(#[case] chunk: usize) {
    let (mut reassembler, sink, stream) = setup(limits(4096, 512));
    let payload: Vec<u8> = (0..500_u32).map(|i| (i % 251) as u8).collect();

    let outcomes = feed(&mut reassembler, split(stream, 3, &payload, chunk, 42));

    assert_eq!(outcomes.last(), Some(&IngestOutcome::Emitted { broken: false }));
    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload(), payload.as_slice());
    assert!(!frames[0].is_broken());
    assert_eq!(frames[0].frame_number(), 3);
}

#[test]
fn early_last_fragment_emits_broken_frame_once() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let payload: Vec<u8> = (0..40).collect();
    let mut fragments = split(stream, 5, &payload, 10, 0);
    // Deliver the final fragment ahead of the third.
    fragments.swap(2, 3);

    let outcomes = feed(&mut reassembler, fragments);

    assert_eq!(
        outcomes,
        vec![
            IngestOutcome::Pending,
            IngestOutcome::Pending,
            IngestOutcome::Emitted { broken: true },
            IngestOutcome::Dropped(DropReason::LateFragment),
        ]
    );
    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert!(frame.is_broken());
    assert_eq!(frame.size(), 40);
    assert_eq!(&frame.payload()[..20], &payload[..20]);
    assert_eq!(&frame.payload()[20..30], &[0_u8; 10][..]);
    assert_eq!(&frame.payload()[30..], &payload[30..]);
}

#[test]
fn declared_total_completes_frame_without_last_flag() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let first = FragmentHeader::new(2, FragmentIndex::zero(), 0).with_total_size(12);
    let second = FragmentHeader::new(2, FragmentIndex::new(1), 6);

    reassembler.ingest(Fragment::new(stream, first, vec![1_u8; 6]));
    let outcome = reassembler.ingest(Fragment::new(stream, second, vec![2_u8; 6]));

    assert_eq!(outcome, IngestOutcome::Emitted { broken: false });
    assert_eq!(sink.frames()[0].size(), 12);
}

#[test]
fn last_fragment_short_of_declared_total_is_broken() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let header = FragmentHeader::new(2, FragmentIndex::zero(), 0)
        .with_total_size(20)
        .last();

    let outcome = reassembler.ingest(Fragment::new(stream, header, vec![1_u8; 8]));

    assert_eq!(outcome, IngestOutcome::Emitted { broken: true });
    assert_eq!(sink.frames()[0].size(), 8);
}

#[test]
fn oversized_declaration_emits_broken_frame_without_buffering() {
    let (mut reassembler, sink, stream) = setup(limits(64, 32));
    let header = FragmentHeader::new(9, FragmentIndex::zero(), 0)
        .with_total_size(1_000_000)
        .with_pts(77);
    let tail = FragmentHeader::new(9, FragmentIndex::new(1), 16).last();

    let first = reassembler.ingest(Fragment::new(stream, header, vec![0_u8; 16]));
    let second = reassembler.ingest(Fragment::new(stream, tail, vec![0_u8; 16]));

    assert_eq!(first, IngestOutcome::Emitted { broken: true });
    assert_eq!(second, IngestOutcome::Dropped(DropReason::LateFragment));
    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_broken());
    assert_eq!(frames[0].size(), 0);
    assert_eq!(frames[0].pts(), Some(77));
}

#[test]
fn accumulation_past_limit_emits_what_was_buffered() {
    let (mut reassembler, sink, stream) = setup(limits(24, 16));
    let fragments = split(stream, 4, &[5_u8; 40], 10, 0);

    let outcomes = feed(&mut reassembler, fragments);

    assert_eq!(outcomes[0], IngestOutcome::Pending);
    assert_eq!(outcomes[1], IngestOutcome::Pending);
    assert_eq!(outcomes[2], IngestOutcome::Emitted { broken: true });
    assert_eq!(outcomes[3], IngestOutcome::Dropped(DropReason::LateFragment));
    let frames = sink.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload(), &[5_u8; 20][..]);
}

#[test]
fn oversized_fragment_payload_is_rejected() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 8));
    let header = FragmentHeader::new(1, FragmentIndex::zero(), 0).last();

    let outcome = reassembler.ingest(Fragment::new(stream, header, vec![0_u8; 9]));

    assert_eq!(outcome, IngestOutcome::Emitted { broken: true });
    assert_eq!(sink.frames()[0].size(), 0);
}

#[test]
fn new_frame_number_flushes_incomplete_frame_as_broken() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let stale = FragmentHeader::new(10, FragmentIndex::zero(), 0).with_pts(1);
    let fresh = FragmentHeader::new(11, FragmentIndex::zero(), 0)
        .with_pts(2)
        .last();

    reassembler.ingest(Fragment::new(stream, stale, vec![1_u8; 4]));
    let outcome = reassembler.ingest(Fragment::new(stream, fresh, vec![2_u8; 4]));

    assert_eq!(outcome, IngestOutcome::Emitted { broken: false });
    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].is_broken());
    assert_eq!(frames[0].frame_number(), 10);
    assert_eq!(frames[0].pts(), Some(1));
    assert!(!frames[1].is_broken());
    assert_eq!(frames[1].pts(), Some(2));
}

#[test]
fn straggler_from_older_frame_leaves_current_frame_intact() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let at = |frame_number, index: u16| {
        FragmentHeader::new(frame_number, FragmentIndex::new(index), u32::from(index) * 10)
    };

    let outcomes = feed(
        &mut reassembler,
        vec![
            Fragment::new(stream, at(5, 0), vec![5_u8; 10]),
            Fragment::new(stream, at(6, 0), vec![6_u8; 10]),
            Fragment::new(stream, at(4, 1), vec![4_u8; 10]),
            Fragment::new(stream, at(6, 1), vec![6_u8; 10]),
            Fragment::new(stream, at(6, 2).last(), vec![6_u8; 10]),
        ],
    );

    assert_eq!(outcomes[2], IngestOutcome::Dropped(DropReason::LateFragment));
    assert_eq!(outcomes[4], IngestOutcome::Emitted { broken: false });
    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].frame_number(), 5);
    assert!(frames[0].is_broken());
    assert_eq!(frames[1].frame_number(), 6);
    assert!(!frames[1].is_broken());
    assert_eq!(frames[1].payload(), &[6_u8; 30][..]);
    assert!(
        reassembler
            .table()
            .get(stream)
            .is_some_and(|state| state.in_progress().is_none())
    );
}

#[test]
fn repeated_frame_number_opens_a_new_frame() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let whole = FragmentHeader::new(0, FragmentIndex::zero(), 0).last();

    let outcomes = feed(
        &mut reassembler,
        vec![
            Fragment::new(stream, whole, vec![1_u8; 3]),
            Fragment::new(stream, whole, vec![2_u8; 3]),
        ],
    );

    assert_eq!(outcomes, vec![IngestOutcome::Emitted { broken: false }; 2]);
    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].payload(), &[2_u8; 3][..]);
}

#[test]
fn frame_number_wraparound_supersedes_in_order() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let before_wrap = FragmentHeader::new(u16::MAX, FragmentIndex::zero(), 0);
    let after_wrap = FragmentHeader::new(0, FragmentIndex::zero(), 0).last();

    reassembler.ingest(Fragment::new(stream, before_wrap, vec![1_u8; 4]));
    let outcome = reassembler.ingest(Fragment::new(stream, after_wrap, vec![2_u8; 4]));

    assert_eq!(outcome, IngestOutcome::Emitted { broken: false });
    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].frame_number(), u16::MAX);
    assert!(frames[0].is_broken());
    assert_eq!(frames[1].frame_number(), 0);
}

#[test]
fn fragments_for_unallocated_streams_are_dropped() {
    let (mut reassembler, sink, _stream) = setup(limits(1024, 64));
    let stranger = StreamId::new(200).expect("valid identifier");
    let header = FragmentHeader::new(1, FragmentIndex::zero(), 0).last();

    let outcome = reassembler.ingest(Fragment::new(stranger, header, vec![1_u8]));

    assert_eq!(outcome, IngestOutcome::Dropped(DropReason::UnknownStream));
    assert!(sink.frames().is_empty());
    assert_eq!(reassembler.stream_count(), 0);
}

#[test]
fn first_seen_metadata_is_kept() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let first = FragmentHeader::new(1, FragmentIndex::zero(), 0)
        .with_content(ContentType::new(0x1b))
        .with_pts(500);
    let second = FragmentHeader::new(1, FragmentIndex::new(1), 2)
        .with_content(ContentType::new(0x24))
        .with_pts(900)
        .last();

    reassembler.ingest(Fragment::new(stream, first, vec![1_u8, 2]));
    reassembler.ingest(Fragment::new(stream, second, vec![3_u8]));

    let frame = &sink.frames()[0];
    assert_eq!(frame.pts(), Some(500));
    assert_eq!(frame.content(), ContentType::new(0x1b));
}

#[test]
fn interleaved_streams_do_not_contaminate_each_other() {
    let pool = Arc::new(IdentifierPool::new());
    let a = pool.allocate().expect("allocate a");
    let b = pool.allocate().expect("allocate b");
    let sink = CollectingSink::default();
    let mut reassembler =
        Reassembler::new(pool, limits(1024, 64), Arc::new(sink.clone()));

    let frag_a = split(a, 1, &[0xaa; 30], 10, 100);
    let frag_b = split(b, 1, &[0xbb; 30], 10, 200);
    for (x, y) in frag_a.into_iter().zip(frag_b) {
        reassembler.ingest(x);
        reassembler.ingest(y);
    }

    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    for frame in frames {
        let (byte, pts) = if frame.source() == a { (0xaa, 100) } else { (0xbb, 200) };
        assert!(!frame.is_broken());
        assert!(frame.payload().iter().all(|b| *b == byte));
        assert_eq!(frame.pts(), Some(pts));
    }
}

#[test]
fn remove_discards_incomplete_frame() {
    let (mut reassembler, sink, stream) = setup(limits(1024, 64));
    let header = FragmentHeader::new(1, FragmentIndex::zero(), 0);
    reassembler.ingest(Fragment::new(stream, header, vec![1_u8; 4]));
    assert_eq!(
        reassembler.table().get(stream).map(StreamState::buffered_len),
        Some(4)
    );

    assert!(reassembler.remove(stream));
    assert!(!reassembler.remove(stream));
    assert_eq!(reassembler.stream_count(), 0);
    assert!(reassembler.table().get(stream).is_none());
    assert!(sink.frames().is_empty());
}

#[test]
fn panicking_sink_does_not_stop_later_frames() {
    let pool = Arc::new(IdentifierPool::new());
    let stream = pool.allocate().expect("allocate");
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let sink = move |frame: Frame| {
        assert_ne!(frame.frame_number(), 1, "consumer rejects frame one");
        counter.fetch_add(1, Ordering::SeqCst);
    };
    let mut reassembler = Reassembler::new(pool, limits(64, 64), Arc::new(sink));

    for frame_number in 1..=3 {
        let header = FragmentHeader::new(frame_number, FragmentIndex::zero(), 0).last();
        reassembler.ingest(Fragment::new(stream, header, vec![0_u8; 4]));
    }

    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

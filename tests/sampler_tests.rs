//! Selection properties over many generated frame-type layouts

use screencomp_cli::sampler::{is_joint_b_frame, select, SampleRequest};
use screencomp_cli::{CompError, FrameSource, FrameType, FrameTypeTable};

/// Deterministic frame-type layout; roughly half the frames are B
fn generated(name: &str, frames: usize, seed: u64) -> FrameTypeTable {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let types = (0..frames)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            match (state >> 33) % 6 {
                0 => FrameType::I,
                1 | 2 => FrameType::P,
                _ => FrameType::B,
            }
        })
        .collect();
    FrameTypeTable::new(name, types)
}

fn as_sources(tables: &[FrameTypeTable]) -> Vec<&dyn FrameSource> {
    tables.iter().map(|t| t as &dyn FrameSource).collect()
}

#[test]
fn test_selection_properties_hold_for_generated_layouts() {
    for seed in 0..50u64 {
        let tables = vec![
            generated("a", 2000, seed),
            generated("b", 2000, seed + 1000),
            generated("c", 2000, seed + 2000),
        ];
        let sources = as_sources(&tables);
        let (start, tail, count) = (100 + seed, 150, 1 + (seed as usize % 20));
        let end = 2000 - tail;

        let request = SampleRequest::new(sources.clone(), start, tail, count);
        let selection = select(&request).unwrap();

        assert!(selection.len() <= count);
        for frame in selection.frames() {
            assert!(*frame >= start && *frame < end, "seed {}: {} out of range", seed, frame);
            assert!(is_joint_b_frame(&sources, *frame));
        }
        assert!(
            selection.frames().windows(2).all(|w| w[0] <= w[1]),
            "seed {}: selection not ordered",
            seed
        );
    }
}

#[test]
fn test_long_source_with_default_style_trim() {
    let tables = vec![
        FrameTypeTable::uniform("remux", FrameType::B, 150_000),
        FrameTypeTable::uniform("encode", FrameType::B, 150_000),
    ];
    let request = SampleRequest::new(as_sources(&tables), 4000, 4000, 15);
    let selection = select(&request).unwrap();

    // step = (146000 - 4000) / 15 = 9466
    let expected: Vec<u64> = (0..15).map(|i| 4000 + i * 9466).collect();
    assert_eq!(selection.frames(), expected.as_slice());
}

#[test]
fn test_malformed_requests_are_fatal() {
    let tables = vec![FrameTypeTable::uniform("a", FrameType::B, 100)];

    for (start, tail, count) in [(0, 0, 0), (50, 50, 1), (99, 0, 2), (0, 200, 1)] {
        let request = SampleRequest::new(as_sources(&tables), start, tail, count);
        assert!(
            matches!(select(&request), Err(CompError::InvalidSampleRequest { .. })),
            "({}, {}, {}) should be rejected",
            start,
            tail,
            count
        );
    }
}

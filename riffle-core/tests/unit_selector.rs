//! Unit tests for yielder selection
//!
//! Tests pattern splitting, seed derivation, strategy dispatch and the
//! configuration errors the selector must raise.

use riffle_core::record::write_record_file;
use riffle_core::yielder::{derive_source_seed, BasicYielderOptions, SEED_MODULUS};
use riffle_core::{
    construct_yielder, plan_yielder, InputConfig, YielderError, YielderKind, YielderPlan,
};
use std::path::Path;

fn input(pattern: &str, weights: &[f32], seed: i64) -> InputConfig {
    InputConfig::new(pattern)
        .with_weights(weights.to_vec())
        .with_seed(seed)
        .with_buffer(128, 4)
}

fn options(pattern: &str, seed: i64, source_id: usize) -> BasicYielderOptions {
    BasicYielderOptions {
        file_pattern: pattern.into(),
        seed,
        bufsize: 128,
        parallelism: 4,
        source_id,
    }
}

/// Write `a.rio` and `b.rio` with a few records each
fn write_sources(dir: &Path) -> (String, String) {
    let a = dir.join("a.rio");
    let b = dir.join("b.rio");
    write_record_file(&a, (0..8).map(|i| format!("a-{}", i))).unwrap();
    write_record_file(&b, (0..8).map(|i| format!("b-{}", i))).unwrap();
    (a.display().to_string(), b.display().to_string())
}

#[test]
fn test_single_pattern_without_weights() {
    let plan = plan_yielder(&input("a.rio", &[], 0)).unwrap();
    assert_eq!(plan, YielderPlan::Basic(options("a.rio", 0, 0)));
}

#[test]
fn test_weighted_mix_derives_consecutive_seeds() {
    let plan = plan_yielder(&input("a.rio,b.rio", &[0.3, 0.7], 5)).unwrap();

    assert_eq!(
        plan,
        YielderPlan::WeightedMix {
            seed: 5,
            options: vec![options("a.rio", 5, 0), options("b.rio", 6, 1)],
            weights: vec![0.3, 0.7],
        }
    );
}

#[test]
fn test_chaining_with_random_seed() {
    let plan = plan_yielder(&input("a.rio,b.rio", &[0.5, 0.5], 0).chaining(true)).unwrap();

    assert_eq!(
        plan,
        YielderPlan::Chain(vec![options("a.rio", 0, 0), options("b.rio", 0, 1)])
    );
}

#[test]
fn test_weight_count_mismatch() {
    let err = plan_yielder(&input("a.rio,b.rio", &[1.0], 0)).unwrap_err();
    assert!(matches!(err, YielderError::Configuration { .. }));

    let err = plan_yielder(&input("a.rio,b.rio,c.rio", &[1.0, 1.0], 0).chaining(true)).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_mismatch_fails_before_touching_files() {
    // Patterns do not exist; the configuration error must win
    let err = construct_yielder("missing-a.rio,missing-b.rio", &[1.0], 1, 16, 1, false, false)
        .err()
        .unwrap();
    assert!(err.is_fatal());
}

#[test]
fn test_weights_are_passed_unnormalized_in_order() {
    let plan = plan_yielder(&input("x,y,z", &[3.0, 0.0, 1.5], 11)).unwrap();
    match plan {
        YielderPlan::WeightedMix { weights, options, .. } => {
            assert_eq!(weights, vec![3.0, 0.0, 1.5]);
            let patterns: Vec<_> = options.iter().map(|o| o.file_pattern.as_str()).collect();
            assert_eq!(patterns, vec!["x", "y", "z"]);
        }
        other => panic!("expected weighted mix, got {:?}", other),
    }
}

#[test]
fn test_strict_order_single_source() {
    let plan = plan_yielder(&input("tfrecord:/data/a-*.rio", &[], 7).sequential(true)).unwrap();
    assert_eq!(
        plan,
        YielderPlan::Sequential {
            file_pattern: "tfrecord:/data/a-*.rio".into()
        }
    );

    // One weighted source is still a single source
    let plan = plan_yielder(&input("a.rio", &[1.0], 7).sequential(true)).unwrap();
    assert_eq!(plan.kind(), YielderKind::Sequential);
}

#[test]
fn test_strict_order_rejects_multiple_sources() {
    for chaining in [false, true] {
        let err = plan_yielder(
            &input("a.rio,b.rio", &[0.5, 0.5], 7)
                .sequential(true)
                .chaining(chaining),
        )
        .unwrap_err();
        assert!(err.is_fatal());
    }
}

#[test]
fn test_strict_order_keeps_legacy_comma_pattern_whole() {
    let plan = plan_yielder(&input("a.rio,b.rio", &[], 7).sequential(true)).unwrap();
    assert_eq!(
        plan,
        YielderPlan::Sequential {
            file_pattern: "a.rio,b.rio".into()
        }
    );
}

#[test]
fn test_seed_property_over_range() {
    for base in [1i64, 2, 301, 65_536, SEED_MODULUS - 3, SEED_MODULUS + 9] {
        let weights = vec![1.0; 5];
        let pattern = vec!["p"; 5].join(",");
        let plan = plan_yielder(&input(&pattern, &weights, base)).unwrap();

        for (i, opts) in plan.source_options().iter().enumerate() {
            let mut expected = (base + i as i64) % SEED_MODULUS;
            if expected == 0 {
                expected = 1;
            }
            assert_eq!(opts.seed, expected, "base {} source {}", base, i);
            assert_eq!(opts.seed, derive_source_seed(base, i));
            assert_eq!(opts.source_id, i);
        }
    }
}

#[test]
fn test_construct_each_strategy_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = write_sources(dir.path());
    let both = format!("{},{}", a, b);

    let basic = construct_yielder(&a, &[], 0, 4, 2, false, false).unwrap();
    assert_eq!(basic.kind(), YielderKind::Basic);
    basic.close();

    let sequential = construct_yielder(&a, &[], 0, 4, 2, true, false).unwrap();
    assert_eq!(sequential.kind(), YielderKind::Sequential);

    let chain = construct_yielder(&both, &[0.5, 0.5], 3, 4, 2, false, true).unwrap();
    assert_eq!(chain.kind(), YielderKind::Chain);
    chain.close();

    let mix = construct_yielder(&both, &[0.3, 0.7], 5, 4, 2, false, false).unwrap();
    assert_eq!(mix.kind(), YielderKind::WeightedMix);
    mix.close();

    // Legacy path unions both files into one source
    let legacy = construct_yielder(&both, &[], 5, 4, 2, false, false).unwrap();
    assert_eq!(legacy.kind(), YielderKind::Basic);
    legacy.close();
}

#[test]
fn test_collaborator_errors_propagate_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _) = write_sources(dir.path());
    let missing = dir.path().join("nothing-*.rio").display().to_string();

    let err = construct_yielder(&missing, &[], 1, 4, 1, false, false).err().unwrap();
    assert!(matches!(err, YielderError::NoFilesMatched { .. }));
    assert!(!err.is_fatal());

    let err = construct_yielder(&a, &[], 1, 0, 1, false, false).err().unwrap();
    assert!(matches!(err, YielderError::InvalidOptions { .. }));

    let err = construct_yielder(&a, &[], 1, 4, -2, false, false).err().unwrap();
    assert!(matches!(err, YielderError::InvalidOptions { .. }));

    let both = format!("{},{}", a, missing);
    let err = construct_yielder(&both, &[1.0, 1.0], 1, 4, 1, false, true).err().unwrap();
    assert!(matches!(err, YielderError::NoFilesMatched { .. }));

    let err = construct_yielder(&format!("{},{}", a, a), &[0.0, 0.0], 1, 4, 1, false, false)
        .err()
        .unwrap();
    assert!(matches!(err, YielderError::InvalidWeights { .. }));
}

fn write_text(dir: &Path, name: &str, prefix: &str) -> String {
    let path = dir.join(name);
    let lines: Vec<String> = (0..6).map(|i| format!("{}-{}", prefix, i)).collect();
    std::fs::write(&path, lines.join("\n")).unwrap();
    path.display().to_string()
}

fn payload_prefix(record: &riffle_core::Record) -> u8 {
    record.data[0]
}

#[test]
fn test_prefixed_weighted_sources_keep_their_format() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_text(dir.path(), "a.txt", "a");
    let b = write_text(dir.path(), "b.txt", "b");
    let pattern = format!("text:{},{}", a, b);

    let plan = plan_yielder(&input(&pattern, &[0.5, 0.5], 3)).unwrap();
    let patterns: Vec<_> = plan
        .source_options()
        .iter()
        .map(|o| o.file_pattern.clone())
        .collect();
    assert_eq!(patterns, vec![format!("text:{}", a), format!("text:{}", b)]);

    // Only the second source is drawn; it must read as text
    let mix = construct_yielder(&pattern, &[0.0, 1.0], 3, 4, 1, false, false).unwrap();
    for _ in 0..20 {
        let record = mix.yield_record().unwrap();
        assert_eq!(record.source_id, 1);
        assert!(record.data.starts_with(b"b-"), "{:?}", record.data);
    }
    mix.close();

    let chain = construct_yielder(&pattern, &[0.5, 0.5], 3, 4, 1, false, true).unwrap();
    for _ in 0..6 {
        assert_eq!(payload_prefix(&chain.yield_record().unwrap()), b'a');
    }
    for _ in 0..6 {
        assert_eq!(payload_prefix(&chain.yield_record().unwrap()), b'b');
    }
    chain.close();
}

#[test]
fn test_built_mix_reads_sources_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["a", "b", "c"];
    let paths: Vec<String> = names
        .iter()
        .map(|n| {
            let path = dir.path().join(format!("{}.rio", n));
            write_record_file(&path, (0..12).map(|i| format!("{}-{}", n, i))).unwrap();
            path.display().to_string()
        })
        .collect();
    let pattern = paths.join(",");

    let draw = |seed: i64| -> Vec<(usize, Vec<u8>)> {
        let mix = construct_yielder(&pattern, &[1.0, 1.0, 1.0], seed, 4, 1, false, false).unwrap();
        let out = (0..300)
            .map(|_| {
                let record = mix.yield_record().unwrap();
                (record.source_id, record.data.to_vec())
            })
            .collect();
        mix.close();
        out
    };

    let first = draw(5);
    for (source_id, data) in &first {
        assert_eq!(data[0], names[*source_id].as_bytes()[0]);
    }
    let mut seen: Vec<usize> = first.iter().map(|(id, _)| *id).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, vec![0, 1, 2]);

    // Derived seeds reach the built children
    assert_eq!(first, draw(5));
    assert_ne!(first, draw(9));
}

#[test]
fn test_built_chain_reads_sources_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = write_sources(dir.path());
    // Declared b first: b is source 0
    let chain = construct_yielder(&format!("{},{}", b, a), &[1.0, 1.0], 1, 4, 2, false, true).unwrap();
    for _ in 0..8 {
        let record = chain.yield_record().unwrap();
        assert_eq!((record.source_id, payload_prefix(&record)), (0, b'b'));
    }
    for _ in 0..8 {
        let record = chain.yield_record().unwrap();
        assert_eq!((record.source_id, payload_prefix(&record)), (1, b'a'));
    }
    chain.close();
}

#[test]
fn test_negative_base_seed_is_reduced_not_truncated() {
    let plan = plan_yielder(&input("a.rio,b.rio", &[1.0, 1.0], -5)).unwrap();
    let seeds: Vec<i64> = plan.source_options().iter().map(|o| o.seed).collect();
    assert_eq!(seeds, vec![SEED_MODULUS - 5, SEED_MODULUS - 4]);
    match plan {
        YielderPlan::WeightedMix { seed, .. } => assert_eq!(seed, -5),
        other => panic!("expected weighted mix, got {:?}", other),
    }
}

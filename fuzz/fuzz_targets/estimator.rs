#![no_main]

use cardinality_bench::HyperLogLog;
use libfuzzer_sys::fuzz_target;
use wyhash::{wyhash, WyHash};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let precision = 4 + (data[0] as u32) % 17;
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut single = HyperLogLog::<WyHash>::new(precision);
    let mut sparse = HyperLogLog::<WyHash>::new_sparse(precision);
    let mut dense = HyperLogLog::<WyHash>::new(precision);

    for chunk in first_half.chunks(4) {
        sparse.insert(chunk);
        single.insert(chunk);
        assert!(sparse.estimate() > 0.0);
        assert!(sparse.size_of() > 0);
    }
    for chunk in second_half.chunks(4) {
        dense.insert(chunk);
        single.insert(chunk);
        assert!(dense.estimate() > 0.0);
    }

    sparse.merge(&dense);
    assert!(!sparse.is_sparse());
    let (merged, expected) = (sparse.estimate(), single.estimate());
    assert!((merged - expected).abs() <= 1e-4 * expected.max(1.0));
});

//! Stress tests with fill-pattern corruption detection.
//!
//! Allocate through the public facade, fill with a pattern derived from
//! address and size, pass between threads, and verify before freeing. Any
//! corruption (use-after-free, double-free, overlapping allocations) shows
//! up as a pattern mismatch.

/// Fill a buffer with a deterministic pattern derived from its address and size.
fn fill_pattern(ptr: *mut u8, size: usize) {
    let seed = ptr as usize ^ size;
    for i in 0..size {
        unsafe {
            *ptr.add(i) = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        }
    }
}

/// Verify the fill pattern. Returns true if intact.
fn check_pattern(ptr: *mut u8, size: usize) -> bool {
    let seed = ptr as usize ^ size;
    for i in 0..size {
        let expected = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        if unsafe { *ptr.add(i) } != expected {
            return false;
        }
    }
    true
}

#[test]
fn stress_fill_pattern_single_thread() {
    let sizes: &[usize] = &[8, 16, 32, 64, 128, 256, 512, 1024, 4096, 8192];
    let rounds = 50;

    let mut live: Vec<(*mut u8, usize)> = Vec::new();

    for round in 0..rounds {
        for &size in sizes {
            let ptr = ralloc::alloc(size);
            assert!(!ptr.is_null(), "alloc failed for size {size}");
            fill_pattern(ptr, size);
            live.push((ptr, size));
        }

        for &(ptr, size) in &live {
            assert!(
                check_pattern(ptr, size),
                "corruption detected at round {round}, size {size}"
            );
        }

        let drain_count = live.len() / 2;
        for _ in 0..drain_count {
            let idx = (round * 7 + 3) % live.len();
            let (ptr, size) = live.swap_remove(idx);
            assert!(
                check_pattern(ptr, size),
                "corruption before free at round {round}"
            );
            assert!(ralloc::free(ptr).is_ok());
        }
    }

    for (ptr, size) in live {
        assert!(check_pattern(ptr, size));
        assert!(ralloc::free(ptr).is_ok());
    }
}

#[test]
fn stress_fill_pattern_cross_thread() {
    use std::sync::mpsc;

    let npairs = 4;
    let ops = 100;
    let sizes: &[usize] = &[16, 64, 256, 1024];

    let mut producers = Vec::new();
    let mut consumers = Vec::new();

    for pair_id in 0..npairs {
        let (tx, rx) = mpsc::channel::<(usize, usize)>();

        producers.push(std::thread::spawn(move || {
            for i in 0..ops {
                let size = sizes[(pair_id + i) % sizes.len()];
                let ptr = ralloc::alloc(size);
                assert!(!ptr.is_null());
                fill_pattern(ptr, size);
                tx.send((ptr as usize, size)).unwrap();
            }
        }));

        consumers.push(std::thread::spawn(move || {
            let mut count = 0usize;
            for (addr, size) in rx {
                let ptr = addr as *mut u8;
                assert!(
                    check_pattern(ptr, size),
                    "cross-thread corruption at pair {pair_id}, item {count}"
                );
                assert!(ralloc::free(ptr).is_ok());
                count += 1;
            }
            count
        }));
    }

    for h in producers {
        h.join().unwrap();
    }

    let total: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, npairs * ops);
}

#[test]
fn stress_many_threads_concurrent() {
    let nthreads = 8;
    let ops_per_thread = 200;

    let handles: Vec<_> = (0..nthreads)
        .map(|tid| {
            std::thread::spawn(move || {
                let mut live: Vec<(*mut u8, usize)> = Vec::with_capacity(64);

                for i in 0..ops_per_thread {
                    let size = [8, 32, 64, 128, 512, 2048][(tid + i) % 6];
                    let ptr = ralloc::alloc(size);
                    assert!(!ptr.is_null());
                    fill_pattern(ptr, size);
                    live.push((ptr, size));

                    if live.len() > 32 {
                        for _ in 0..16 {
                            let (ptr, size) = live.pop().unwrap();
                            assert!(
                                check_pattern(ptr, size),
                                "thread {tid} corruption at op {i}"
                            );
                            assert!(ralloc::free(ptr).is_ok());
                        }
                    }
                }

                for (ptr, size) in live {
                    assert!(check_pattern(ptr, size));
                    assert!(ralloc::free(ptr).is_ok());
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

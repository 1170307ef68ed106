use std::time::Instant;

fn main() {
    env_logger::Builder::from_default_env().init();

    println!("ralloc demo");
    println!("===========\n");

    ralloc::init(true).unwrap();

    let p = ralloc::alloc(1024);
    assert!(!p.is_null());
    unsafe { p.write_bytes(0x42, 1024) };
    let (allocated, free, peak) = ralloc::heap_stats().unwrap();
    println!("after one 1024-byte alloc: allocated={allocated} free={free} peak={peak}");
    ralloc::free(p).unwrap();

    println!("\nthree allocations, then freed out of order:");
    let p1 = ralloc::alloc(100);
    let p2 = ralloc::alloc(200);
    let p3 = ralloc::alloc(512);
    println!("  p1={p1:?} p2={p2:?} p3={p3:?}");
    assert!(ralloc::verify().is_ok());
    ralloc::free(p2).unwrap();
    ralloc::free(p1).unwrap();
    ralloc::free(p3).unwrap();
    assert!(ralloc::verify().is_ok());

    println!("\nlarge allocation (forces a heap extension):");
    let big = ralloc::alloc(1024 * 1024);
    assert!(!big.is_null());
    unsafe { big.write_bytes(0, 1024 * 1024) };
    println!("  1 MiB allocation at {big:?}");
    ralloc::free(big).unwrap();

    println!("\nmulti-threaded workload (8 threads, 20k alloc/free pairs each):");
    let start = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                let mut live = Vec::new();
                for i in 0u64..20_000 {
                    let ptr = ralloc::alloc(64);
                    live.push(ptr);
                    if live.len() > 100 {
                        for p in live.drain(..50) {
                            ralloc::free(p).unwrap();
                        }
                    }
                    let _ = i;
                }
                for p in live {
                    ralloc::free(p).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let elapsed = start.elapsed();
    println!("  completed in {elapsed:?}");

    assert!(ralloc::verify().is_ok());
    let (allocated, _, _) = ralloc::heap_stats().unwrap();
    println!("\nfinal allocated bytes: {allocated}");
    assert!(ralloc::leak_check());

    ralloc::dump();
    ralloc::cleanup().unwrap();
    println!("\nDone.");
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mpqueue::{MpmcRing, MpscLinked};
use std::sync::Arc;
use std::thread;

const MSG_PER_PRODUCER: u64 = 1_000_000;

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_ring");

    for &pairs in &[1usize, 2, 4] {
        let total = MSG_PER_PRODUCER * pairs as u64;
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{pairs}P_{pairs}C")),
            &pairs,
            |b, &pairs| {
                b.iter(|| {
                    let ring = Arc::new(MpmcRing::<u64>::with_capacity(65_536).unwrap());

                    let producers: Vec<_> = (0..pairs)
                        .map(|_| {
                            let ring = Arc::clone(&ring);
                            thread::spawn(move || {
                                for i in 0..MSG_PER_PRODUCER {
                                    while ring.offer(i).is_err() {
                                        std::hint::spin_loop();
                                    }
                                }
                            })
                        })
                        .collect();

                    let consumers: Vec<_> = (0..pairs)
                        .map(|_| {
                            let ring = Arc::clone(&ring);
                            thread::spawn(move || {
                                let mut received = 0u64;
                                while received < MSG_PER_PRODUCER {
                                    if let Some(e) = ring.poll() {
                                        black_box(e);
                                        received += 1;
                                    } else {
                                        std::hint::spin_loop();
                                    }
                                }
                            })
                        })
                        .collect();

                    for handle in producers {
                        handle.join().unwrap();
                    }
                    for handle in consumers {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_mpmc_relaxed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_ring_relaxed");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));

    group.bench_function("1P_1C", |b| {
        b.iter(|| {
            let ring = Arc::new(MpmcRing::<u64>::with_capacity(65_536).unwrap());

            let producer = {
                let ring = Arc::clone(&ring);
                thread::spawn(move || {
                    for i in 0..MSG_PER_PRODUCER {
                        while ring.relaxed_offer(i).is_err() {
                            std::hint::spin_loop();
                        }
                    }
                })
            };

            let mut received = 0u64;
            while received < MSG_PER_PRODUCER {
                received += ring.drain_up_to(4096, |e| {
                    black_box(e);
                }) as u64;
            }

            producer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_mpsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_linked");

    for &producers in &[1usize, 2, 4] {
        let total = MSG_PER_PRODUCER * producers as u64;
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{producers}P_1C")),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let queue = Arc::new(MpscLinked::<u64>::new());

                    let handles: Vec<_> = (0..producers)
                        .map(|_| {
                            let queue = Arc::clone(&queue);
                            thread::spawn(move || {
                                for i in 0..MSG_PER_PRODUCER {
                                    queue.offer(i).unwrap();
                                }
                            })
                        })
                        .collect();

                    let mut received = 0u64;
                    while received < total {
                        received += queue.drain_up_to(4096, |e| {
                            black_box(e);
                        }) as u64;
                        if received < total {
                            std::hint::spin_loop();
                        }
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mpmc, bench_mpmc_relaxed, bench_mpsc);
criterion_main!(benches);

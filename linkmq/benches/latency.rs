//! Latency benchmarks: in-process round-trip time
//!
//! Measures a full Client send, Server receive, Server send, Client receive
//! cycle through the public `linkmq::inproc` API.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linkmq::inproc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

const MESSAGE_SIZES: &[usize] = &[64, 256, 4096];

fn inproc_req_rep_latency(c: &mut Criterion) {
    linkmq::dev_tracing::init_tracing();

    let mut group = c.benchmark_group("latency/inproc/req_rep");
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_millis(500));

    for &size in MESSAGE_SIZES {
        let endpoint = format!("inproc://bench-echo-{}", size);
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let server_endpoint = endpoint.clone();
        let server_stop = Arc::clone(&stop);
        let server = thread::spawn(move || {
            let mut server = inproc::server(server_endpoint);
            server.init_conn().unwrap();
            ready_tx.send(()).unwrap();

            let mut buf = vec![0u8; size];
            while !server_stop.load(Ordering::Relaxed) {
                let n = server.receive(&mut buf, 10).unwrap();
                if n > 0 {
                    server.send(&buf[..n], -1).unwrap();
                }
            }
            server.kill_conn().unwrap();
        });

        ready_rx.recv().unwrap();
        let mut client = inproc::client(endpoint);
        client.init_conn().unwrap();

        let payload = vec![0u8; size];
        let mut reply = vec![0u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::new("round_trip", format!("{}B", size)),
            &size,
            |b, _| {
                b.iter(|| {
                    client.send(black_box(&payload), -1).unwrap();
                    let n = client.receive(&mut reply, -1).unwrap();
                    black_box(n);
                });
            },
        );

        client.kill_conn().unwrap();
        stop.store(true, Ordering::Relaxed);
        server.join().unwrap();
    }

    group.finish();
}

fn inproc_connection_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency/inproc/setup");

    // Keeps the shared context alive so only socket setup is measured
    let mut anchor = inproc::publisher("inproc://bench-anchor");
    anchor.init_conn().unwrap();

    group.bench_function("init_kill", |b| {
        b.iter(|| {
            let mut server = inproc::server("inproc://bench-setup");
            server.init_conn().unwrap();
            server.kill_conn().unwrap();
        });
    });

    group.finish();
    anchor.kill_conn().unwrap();
}

criterion_group!(benches, inproc_req_rep_latency, inproc_connection_setup);
criterion_main!(benches);

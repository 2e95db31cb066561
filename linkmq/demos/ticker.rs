//! One publisher broadcasting to several subscriber threads.
//!
//! Run with: `cargo run --example ticker`

use linkmq::inproc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const ENDPOINT: &str = "inproc://ticker";
const SUBSCRIBERS: usize = 4;
const RUN_FOR: Duration = Duration::from_secs(1);

fn main() -> linkmq::Result<()> {
    linkmq::dev_tracing::init_tracing();

    let mut publisher = inproc::publisher(ENDPOINT);
    publisher.init_conn()?;

    let running = Arc::new(AtomicBool::new(true));
    let connected = Arc::new(Barrier::new(SUBSCRIBERS + 1));
    let received: Arc<Vec<AtomicU64>> =
        Arc::new((0..SUBSCRIBERS).map(|_| AtomicU64::new(0)).collect());

    let handles: Vec<_> = (0..SUBSCRIBERS)
        .map(|id| {
            let running = Arc::clone(&running);
            let connected = Arc::clone(&connected);
            let received = Arc::clone(&received);
            thread::spawn(move || -> linkmq::Result<()> {
                let mut subscriber = inproc::subscriber(ENDPOINT);
                subscriber.init_conn()?;
                connected.wait();

                let mut buf = [0u8; 64];
                while running.load(Ordering::Relaxed) {
                    // Wake up periodically to notice shutdown
                    if subscriber.receive(&mut buf, 100)? > 0 {
                        received[id].fetch_add(1, Ordering::Relaxed);
                    }
                }
                subscriber.kill_conn()
            })
        })
        .collect();

    connected.wait();

    let mut published = 0u64;
    let start = Instant::now();
    while start.elapsed() < RUN_FOR {
        if publisher.send(b"Hello Subscriber", 1000)? > 0 {
            published += 1;
        }
        thread::sleep(Duration::from_millis(1));
    }

    // Let subscribers drain before stopping them
    thread::sleep(Duration::from_millis(200));
    running.store(false, Ordering::Relaxed);
    for handle in handles {
        handle.join().expect("subscriber thread panicked")?;
    }
    publisher.kill_conn()?;

    println!("[Publisher] Sent {} messages", published);
    for (id, count) in received.iter().enumerate() {
        println!("[Subscriber {}] Received {}", id, count.load(Ordering::Relaxed));
    }
    Ok(())
}

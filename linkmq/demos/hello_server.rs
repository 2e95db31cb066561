//! Request-reply between two threads over the in-process backend.
//!
//! Run with: `RUST_LOG=debug cargo run --example hello_server`

use linkmq::inproc;
use std::sync::mpsc;
use std::thread;

const ENDPOINT: &str = "inproc://hello";
const ROUNDS: usize = 5;

fn main() -> linkmq::Result<()> {
    linkmq::dev_tracing::init_tracing();

    let (ready_tx, ready_rx) = mpsc::channel();
    let server = thread::spawn(move || -> linkmq::Result<()> {
        let mut server = inproc::server(ENDPOINT);
        server.init_conn()?;
        let _ = ready_tx.send(());

        let mut buf = [0u8; 256];
        for _ in 0..ROUNDS {
            let n = server.receive(&mut buf, -1)?;
            println!("[Server] Received: {}", String::from_utf8_lossy(&buf[..n]));
            server.send(b"Hello client", -1)?;
        }
        server.kill_conn()
    });

    // Client must connect after the server binds
    let _ = ready_rx.recv();
    let mut client = inproc::client(ENDPOINT);
    client.init_conn()?;

    let mut buf = [0u8; 256];
    for i in 0..ROUNDS {
        client.send(format!("Hello server #{}", i).as_bytes(), -1)?;
        let n = client.receive(&mut buf, -1)?;
        println!("[Client] Received: {}", String::from_utf8_lossy(&buf[..n]));
    }

    client.kill_conn()?;
    server.join().expect("server thread panicked")
}

//! Echo server and client over TCP using libzmq.
//!
//! Run with: `cargo run --example tcp_echo --features zmq`

use linkmq::zmq;
use std::thread;

const ROUNDS: usize = 3;

fn main() -> linkmq::Result<()> {
    linkmq::dev_tracing::init_tracing();

    let mut server = zmq::server("tcp://*:5555");
    server.init_conn()?;

    let server_thread = thread::spawn(move || -> linkmq::Result<()> {
        let mut buf = [0u8; 1024];
        for _ in 0..ROUNDS {
            let n = server.receive(&mut buf, -1)?;
            if n > buf.len() {
                println!("[Server] Message truncated from {} bytes", n);
            }
            let n = n.min(buf.len());
            server.send(&buf[..n], -1)?;
        }
        server.kill_conn()
    });

    let mut client = zmq::client("tcp://localhost:5555");
    client.init_conn()?;

    let mut buf = [0u8; 1024];
    for i in 0..ROUNDS {
        let message = format!("echo #{}", i);
        client.send(message.as_bytes(), -1)?;
        let n = client.receive(&mut buf, 2000)?;
        println!("[Client] Received: {}", String::from_utf8_lossy(&buf[..n.min(buf.len())]));
    }

    client.kill_conn()?;
    server_thread.join().expect("server thread panicked")
}

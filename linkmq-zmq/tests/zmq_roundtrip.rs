use linkmq_core::connection::Connection;
use linkmq_core::context::SharedContext;
use linkmq_core::error::errno;
use linkmq_zmq::ZmqTransport;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn shared() -> Arc<SharedContext<ZmqTransport>> {
    Arc::new(SharedContext::new(ZmqTransport::new()))
}

fn tcp_endpoint() -> String {
    let port = portpicker::pick_unused_port().expect("No ports free");
    format!("tcp://127.0.0.1:{}", port)
}

#[test]
fn test_tcp_request_reply() {
    let shared = shared();
    let endpoint = tcp_endpoint();

    let mut server = Connection::server(endpoint.clone(), Arc::clone(&shared));
    server.init_conn().unwrap();

    let server_thread = thread::spawn(move || {
        let mut buf = [0u8; 64];
        let n = server.receive(&mut buf, 5000).unwrap();
        assert_eq!(&buf[..n], b"Hello server");
        assert_eq!(server.send(b"Hello client", -1).unwrap(), 12);
        server.kill_conn().unwrap();
    });

    let mut client = Connection::client(endpoint.clone(), Arc::clone(&shared));
    client.init_conn().unwrap();
    assert_eq!(client.send(b"Hello server", -1).unwrap(), 12);

    let mut buf = [0u8; 64];
    let n = client.receive(&mut buf, 5000).unwrap();
    assert_eq!(&buf[..n], b"Hello client");

    server_thread.join().unwrap();
    client.kill_conn().unwrap();
    assert!(!shared.is_live());
}

#[test]
fn test_inproc_round_trip_on_shared_context() {
    let shared = shared();

    let mut server = Connection::server("inproc://zmq-echo", Arc::clone(&shared));
    server.init_conn().unwrap();
    let mut client = Connection::client("inproc://zmq-echo", Arc::clone(&shared));
    client.init_conn().unwrap();

    client.send(b"ping", -1).unwrap();
    let mut buf = [0u8; 16];
    let n = server.receive(&mut buf, 1000).unwrap();
    assert_eq!(&buf[..n], b"ping");

    server.send(b"pong", -1).unwrap();
    let n = client.receive(&mut buf, 1000).unwrap();
    assert_eq!(&buf[..n], b"pong");

    client.kill_conn().unwrap();
    server.kill_conn().unwrap();
}

#[test]
fn test_truncated_message_reports_full_length() {
    let shared = shared();
    let endpoint = tcp_endpoint();

    let mut server = Connection::server(endpoint.clone(), Arc::clone(&shared));
    server.init_conn().unwrap();
    let mut client = Connection::client(endpoint.clone(), Arc::clone(&shared));
    client.init_conn().unwrap();

    let message = vec![42u8; 100];
    client.send(&message, -1).unwrap();

    let mut small = [0u8; 10];
    assert_eq!(server.receive(&mut small, 5000).unwrap(), 100);
    assert_eq!(small, [42u8; 10]);

    client.kill_conn().unwrap();
    server.kill_conn().unwrap();
}

#[test]
fn test_receive_timeouts() {
    let shared = shared();
    let endpoint = tcp_endpoint();
    let mut server = Connection::server(endpoint.clone(), Arc::clone(&shared));
    server.init_conn().unwrap();

    let mut buf = [0u8; 8];
    let start = Instant::now();
    assert_eq!(server.receive(&mut buf, 0).unwrap(), 0);
    assert!(start.elapsed() < Duration::from_millis(10));

    let start = Instant::now();
    assert_eq!(server.receive(&mut buf, 50).unwrap(), 0);
    assert!(start.elapsed() >= Duration::from_millis(45));

    server.kill_conn().unwrap();
}

#[test]
fn test_publisher_reaches_subscriber() {
    let shared = shared();
    let endpoint = tcp_endpoint();

    let mut publisher = Connection::publisher(endpoint.clone(), Arc::clone(&shared));
    publisher.init_conn().unwrap();
    let mut subscriber = Connection::subscriber(endpoint.clone(), Arc::clone(&shared));
    subscriber.init_conn().unwrap();

    // Late joiners miss messages; keep publishing until one lands
    let mut buf = [0u8; 32];
    let deadline = Instant::now() + Duration::from_secs(5);
    let received = loop {
        assert!(Instant::now() < deadline, "subscriber never received");
        publisher.send(b"status update", 0).unwrap();
        let n = subscriber.receive(&mut buf, 100).unwrap();
        if n > 0 {
            break n;
        }
    };
    assert_eq!(&buf[..received], b"status update");

    subscriber.kill_conn().unwrap();
    publisher.kill_conn().unwrap();
}

#[test]
fn test_address_in_use() {
    let shared = shared();
    let endpoint = tcp_endpoint();

    let mut first = Connection::server(endpoint.clone(), Arc::clone(&shared));
    first.init_conn().unwrap();
    let mut second = Connection::publisher(endpoint.clone(), Arc::clone(&shared));
    let err = second.init_conn().unwrap_err();
    assert_eq!(err.transport_code(), Some(errno::EADDRINUSE));
    assert_eq!(shared.open_connections(), 1);

    first.kill_conn().unwrap();
}

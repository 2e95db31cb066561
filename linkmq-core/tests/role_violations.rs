mod common;

use common::FakeTransport;
use linkmq_core::connection::Connection;
use linkmq_core::context::SharedContext;
use linkmq_core::error::{LinkError, Operation};
use linkmq_core::role::ConnectionRole;
use std::sync::Arc;

const TIMEOUTS: [i32; 4] = [-1, 0, 1, 250];

fn shared() -> Arc<SharedContext<FakeTransport>> {
    Arc::new(SharedContext::new(FakeTransport::new()))
}

#[test]
fn test_publisher_receive_is_rejected_in_every_state() {
    let shared = shared();
    let counters = Arc::clone(&shared.transport().counters);
    let mut publisher = Connection::publisher("tcp://*:5556", Arc::clone(&shared));
    let mut buf = [0u8; 32];

    let mut check = |publisher: &mut Connection<FakeTransport>| {
        for timeout in TIMEOUTS {
            let err = publisher.receive(&mut buf, timeout).unwrap_err();
            assert!(matches!(
                err,
                LinkError::RoleViolation {
                    op: Operation::Receive,
                    role: ConnectionRole::Publisher
                }
            ));
            assert!(err.is_caller_bug());
        }
    };

    check(&mut publisher);
    publisher.init_conn().unwrap();
    check(&mut publisher);
    publisher.kill_conn().unwrap();
    check(&mut publisher);

    assert_eq!(counters.data_calls(), 0);
}

#[test]
fn test_subscriber_send_is_rejected_in_every_state() {
    let shared = shared();
    let counters = Arc::clone(&shared.transport().counters);
    let mut subscriber = Connection::subscriber("tcp://localhost:5556", Arc::clone(&shared));

    let check = |subscriber: &mut Connection<FakeTransport>| {
        for timeout in TIMEOUTS {
            let err = subscriber.send(b"not allowed", timeout).unwrap_err();
            assert!(matches!(
                err,
                LinkError::RoleViolation {
                    op: Operation::Send,
                    role: ConnectionRole::Subscriber
                }
            ));
        }
    };

    check(&mut subscriber);
    subscriber.init_conn().unwrap();
    check(&mut subscriber);
    subscriber.kill_conn().unwrap();
    check(&mut subscriber);

    assert_eq!(counters.data_calls(), 0);
}

#[test]
fn test_role_violation_message_names_role_and_operation() {
    let mut publisher = Connection::publisher("tcp://*:5556", shared());
    let mut buf = [0u8; 1];
    let err = publisher.receive(&mut buf, 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Publisher::receive() - a Publisher cannot receive data"
    );

    let mut subscriber = Connection::subscriber("tcp://localhost:5556", shared());
    let err = subscriber.send(b"x", 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Subscriber::send() - a Subscriber cannot send data"
    );
}

#[test]
fn test_permitted_operations_reach_the_transport() {
    let shared = shared();
    let counters = Arc::clone(&shared.transport().counters);

    let mut server = Connection::server("tcp://*:5555", Arc::clone(&shared));
    let mut client = Connection::client("tcp://localhost:5555", Arc::clone(&shared));
    server.init_conn().unwrap();
    client.init_conn().unwrap();

    let mut buf = [0u8; 32];
    assert_eq!(client.send(b"ping", 0).unwrap(), 4);
    assert_eq!(server.receive(&mut buf, 0).unwrap(), b"fake message".len());
    assert_eq!(&buf[..12], b"fake message");

    // One poll and one transfer per call
    assert_eq!(counters.data_calls(), 4);

    client.kill_conn().unwrap();
    server.kill_conn().unwrap();
}

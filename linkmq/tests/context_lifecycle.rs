use linkmq::inproc;

// Single test: the process-wide context is observed directly, so nothing
// else in this binary may open connections.
#[test]
fn test_global_context_follows_open_connections() {
    let shared = inproc::shared_context();
    assert!(!shared.is_live());

    let mut server = inproc::server("inproc://lifecycle");
    let mut client = inproc::client("inproc://lifecycle");
    server.init_conn().unwrap();
    client.init_conn().unwrap();
    assert!(shared.is_live());
    assert_eq!(shared.open_connections(), 2);

    client.kill_conn().unwrap();
    assert!(shared.is_live());
    server.kill_conn().unwrap();
    assert!(!shared.is_live());
    assert_eq!(shared.open_connections(), 0);

    // A new connection brings the context back
    let mut publisher = inproc::publisher("inproc://lifecycle");
    publisher.init_conn().unwrap();
    assert!(shared.is_live());
    publisher.kill_conn().unwrap();
    assert!(!shared.is_live());
}

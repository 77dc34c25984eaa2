//! Unit tests for transport selection and teardown.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;

use rstest::{fixture, rstest};

use conductor_config::{PropertyError, PropertyStore};

use super::*;
use crate::service::{PersistenceContext, TaskService};
use crate::tests::support::RecordingTransportProvider;

#[fixture]
fn service() -> Arc<TaskService> {
    Arc::new(TaskService::new(PersistenceContext::new("org.jbpm.task"), None))
}

fn jms_store() -> PropertyStore {
    PropertyStore::from_pairs([
        ("active.config", "jms"),
        ("JMSTaskServer.connectionFactory", "ConnectionFactory"),
        ("JMSTaskServer.transacted", "TRUE"),
        ("JMSTaskServer.queueName", "tasksQueue"),
        ("JMSTaskServer.responseQueueName", "tasksResponseQueue"),
        ("jndi.binding.ConnectionFactory", "tcp://localhost:5445"),
    ])
}

#[rstest]
#[case("mina", TransportKind::Mina)]
#[case("HornetQ", TransportKind::HornetQ)]
#[case("JMS", TransportKind::Jms)]
fn transport_kinds_parse_case_insensitively(#[case] input: &str, #[case] expected: TransportKind) {
    assert_eq!(input.parse::<TransportKind>().expect("known kind"), expected);
}

#[rstest]
fn socket_transports_default_to_localhost() {
    let store = PropertyStore::new();

    let mina = TransportSettings::from_properties(TransportKind::Mina, &store).expect("mina");
    let hornetq =
        TransportSettings::from_properties(TransportKind::HornetQ, &store).expect("hornetq");

    assert_eq!(mina, TransportSettings::Mina(Endpoint::new("localhost", 9123)));
    assert_eq!(
        hornetq,
        TransportSettings::HornetQ(Endpoint::new("localhost", 5153))
    );
}

#[rstest]
#[case("notanumber")]
#[case("70000")]
#[case("-1")]
fn invalid_ports_are_fatal(#[case] port: &str) {
    let store = PropertyStore::from_pairs([("hornetq.port", port)]);

    let error = TransportSettings::from_properties(TransportKind::HornetQ, &store)
        .expect_err("invalid port");

    assert!(matches!(
        error,
        TransportError::InvalidPort {
            key: "hornetq.port",
            ..
        }
    ));
}

#[rstest]
fn jms_settings_read_every_key() {
    let settings =
        TransportSettings::from_properties(TransportKind::Jms, &jms_store()).expect("jms");

    let TransportSettings::Jms(jms) = settings else {
        panic!("expected jms settings");
    };
    assert_eq!(jms.connection_factory, "ConnectionFactory");
    assert!(jms.transacted);
    assert_eq!(jms.acknowledge_mode, "");
    assert_eq!(jms.queue_name, "tasksQueue");
    assert_eq!(jms.response_queue_name, "tasksResponseQueue");
    assert_eq!(
        jms.bindings.get("ConnectionFactory").map(String::as_str),
        Some("tcp://localhost:5445")
    );
}

#[rstest]
#[case("true", true)]
#[case("yes", false)]
#[case("1", false)]
fn jms_transacted_flag_only_accepts_true(#[case] value: &str, #[case] expected: bool) {
    let store = jms_store().with_property("JMSTaskServer.transacted", value);

    let settings = JmsSettings::from_properties(&store).expect("jms");

    assert_eq!(settings.transacted, expected);
}

#[rstest]
#[case("JMSTaskServer.connectionFactory")]
#[case("JMSTaskServer.transacted")]
#[case("JMSTaskServer.queueName")]
#[case("JMSTaskServer.responseQueueName")]
fn jms_required_keys_are_enforced(#[case] key: &str) {
    let store = jms_store().with_property(key, "");

    let error = JmsSettings::from_properties(&store).expect_err("missing key");

    let property = match error {
        TransportError::Property(property) => property,
        other => panic!("expected a property error, got {other:?}"),
    };
    assert!(matches!(property, PropertyError::MissingConfiguration { .. }));
    assert_eq!(property.missing_key(), Some(key));
}

#[rstest]
fn selector_starts_exactly_one_default_transport(service: Arc<TaskService>) {
    let provider = RecordingTransportProvider::default();
    let selector = TransportSelector::new(provider.clone());

    let handle = selector
        .select(&PropertyStore::new(), &service)
        .expect("select")
        .into_handle()
        .expect("started transport");

    assert_eq!(handle.kind(), TransportKind::HornetQ);
    assert_eq!(
        provider.built(),
        vec![TransportSettings::HornetQ(Endpoint::new("localhost", 5153))]
    );
    handle.shutdown().expect("shutdown");
    assert_eq!(provider.server(0).stop_calls(), 1);
}

#[rstest]
fn selector_skips_unrecognised_values(service: Arc<TaskService>) {
    let provider = RecordingTransportProvider::default();
    let selector = TransportSelector::new(provider.clone());
    let store = PropertyStore::from_pairs([("active.config", "bogus")]);

    let selection = selector.select(&store, &service).expect("select");

    assert!(matches!(
        &selection,
        TransportSelection::Skipped { value } if value == "bogus"
    ));
    assert!(selection.into_handle().is_none());
    assert!(provider.built().is_empty());
}

#[rstest]
fn selector_builds_nothing_when_port_is_invalid(service: Arc<TaskService>) {
    let provider = RecordingTransportProvider::default();
    let selector = TransportSelector::new(provider.clone());
    let store = PropertyStore::from_pairs([("active.config", "mina"), ("mina.port", "x")]);

    let error = selector.select(&store, &service).expect_err("invalid port");

    assert!(matches!(error, TransportError::InvalidPort { .. }));
    assert!(provider.built().is_empty());
}

#[rstest]
fn shutdown_joins_the_worker_even_when_stop_fails(service: Arc<TaskService>) {
    let provider = RecordingTransportProvider::failing_stop();
    let selector = TransportSelector::new(provider.clone());
    let store = PropertyStore::from_pairs([("active.config", "mina")]);

    let handle = selector
        .select(&store, &service)
        .expect("select")
        .into_handle()
        .expect("started transport");
    let error = handle.shutdown().expect_err("stop fails");

    assert!(matches!(error, TransportError::Stop { .. }));
    let server = provider.server(0);
    assert_eq!(server.stop_calls(), 1);
    assert!(server.serve_returned(), "worker should observe cancellation");
}

#[rstest]
fn default_provider_serves_status_over_tcp(service: Arc<TaskService>) {
    let selector = TransportSelector::new(DefaultTransportProvider);
    let store = PropertyStore::from_pairs([
        ("active.config", "mina"),
        ("mina.host", "127.0.0.1"),
        ("mina.port", "0"),
    ]);

    let handle = selector
        .select(&store, &service)
        .expect("select")
        .into_handle()
        .expect("started transport");
    let addr = handle.local_addr().expect("bound address");

    let mut client = TcpStream::connect(addr).expect("connect client");
    client.write_all(b"{}\n").expect("write request");
    let mut response = String::new();
    BufReader::new(&mut client)
        .read_line(&mut response)
        .expect("read response");
    assert!(response.contains("\"transport\":\"mina\""));

    handle.shutdown().expect("shutdown");
}

#[rstest]
fn default_provider_fails_jms_without_binding(service: Arc<TaskService>) {
    let selector = TransportSelector::new(DefaultTransportProvider);
    let store = PropertyStore::from_pairs([
        ("active.config", "jms"),
        ("JMSTaskServer.connectionFactory", "Missing"),
        ("JMSTaskServer.transacted", "false"),
        ("JMSTaskServer.queueName", "tasksQueue"),
        ("JMSTaskServer.responseQueueName", "tasksResponseQueue"),
    ]);

    let error = selector.select(&store, &service).expect_err("naming failure");

    assert!(matches!(
        error,
        TransportError::Startup {
            kind: TransportKind::Jms,
            ..
        }
    ));
}

#[rstest]
fn default_provider_starts_queue_server(service: Arc<TaskService>) {
    let selector = TransportSelector::new(DefaultTransportProvider);

    let handle = selector
        .select(&jms_store(), &service)
        .expect("select")
        .into_handle()
        .expect("started transport");

    assert_eq!(handle.kind(), TransportKind::Jms);
    assert!(handle.local_addr().is_none());
    handle.shutdown().expect("shutdown");
}

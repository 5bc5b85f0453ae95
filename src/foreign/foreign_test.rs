use super::*;
use crate::test_utils::SimGraph;
use crate::Error;

#[test]
fn addr_displays_as_hex() {
    assert_eq!(ForeignAddr(0x1a00).to_string(), "0x1a00");
    assert!(ForeignAddr::NULL.is_null());
}

#[test]
fn handle_is_null_without_wrapper_or_address() {
    assert!(!ForeignHandle::new(0x1000).is_null());
    assert!(ForeignHandle::new(0).is_null());
    assert!(ForeignHandle::detached(0x1000).is_null());
}

#[test]
fn typed_reads_check_value_shape() {
    let graph = SimGraph::new();
    let obj = graph.alloc("Thing");
    graph.set(obj, "level", 12i64);
    graph.set(obj, "name", "Amuro");
    graph.set(obj, "none", ForeignValue::Null);

    assert_eq!(graph.read_int(obj, "level").unwrap(), 12);
    assert_eq!(graph.read_text(obj, "name").unwrap(), "Amuro");
    assert_eq!(graph.read_text(obj, "none").unwrap(), "");
    assert!(graph.read_list(obj, "none").unwrap().is_empty());

    match graph.read_bool(obj, "level") {
        Err(ForeignError::UnexpectedValue { field, expected }) => {
            assert_eq!(field, "level");
            assert_eq!(expected, "a boolean");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn read_object_treats_null_as_null_handle() {
    let graph = SimGraph::new();
    let obj = graph.alloc("Thing");
    graph.set(obj, "empty", ForeignValue::Null);
    graph.set(obj, "detached", ForeignHandle::detached(0x2000));

    assert!(matches!(graph.read_object(obj, "empty"), Err(ForeignError::NullHandle)));
    assert!(matches!(graph.read_object(obj, "detached"), Err(ForeignError::NullHandle)));
}

#[test]
fn navigate_follows_path_and_aborts_on_broken_hop() {
    let graph = SimGraph::new();
    let root = graph.alloc("Manager");
    let middle = graph.alloc("Handler");
    let leaf = graph.alloc("State");
    graph.set(root, "handler", middle);
    graph.set(middle, "state", leaf);

    assert_eq!(graph.navigate(root, &["handler", "state"]).unwrap(), leaf);
    assert_eq!(graph.navigate(root, &[]).unwrap(), root);

    graph.free(middle);
    let err = graph.navigate(root, &["handler", "state"]).unwrap_err();
    assert!(err.is_transient());

    assert!(matches!(
        graph.navigate(root, &["missing"]),
        Err(ForeignError::Unreadable { .. })
    ));
}

#[test]
fn classify_is_a_quiet_try_cast() {
    let graph = SimGraph::new();
    let state = graph.alloc("TacticalPartState");

    assert_eq!(graph.classify(state, "TacticalPartState"), Classified::Typed(state));
    assert_eq!(graph.classify(state, "MenuState"), Classified::NotApplicable);
    assert_eq!(graph.classify(ForeignHandle::new(0), "TacticalPartState").typed(), None);

    graph.free(state);
    assert_eq!(graph.classify(state, "TacticalPartState"), Classified::NotApplicable);
}

#[test]
fn only_vanishing_handles_are_transient() {
    assert!(ForeignError::NullHandle.is_transient());
    assert!(ForeignError::Disposed { addr: ForeignAddr(1) }.is_transient());
    assert!(ForeignError::TypeMismatch {
        expected: "A".into(),
        found: "B".into()
    }
    .is_transient());
    assert!(!ForeignError::Unreadable { field: "x".into() }.is_transient());
    assert!(!ForeignError::DiscoveryFailed("scan".into()).is_transient());

    let wrapped: Error = ForeignError::NullHandle.into();
    assert!(wrapped.is_transient());
    let config: Error = config::ConfigError::NotFound("poll".into()).into();
    assert!(!config.is_transient());
}

use crate::support::*;
use fluentconf::store::MemoryStore;

fn system_for(workers: Option<u32>) -> String {
    let store = MemoryStore::new();
    let mut a = agent();
    a.workers = workers;
    store.add_agent(a);
    rendered(&store).system
}

#[test]
fn single_worker_states_count_without_buffer_root() {
    for workers in [None, Some(0), Some(1)] {
        let system = system_for(workers);
        assert!(system.contains("\tworkers 1\n"), "{:?}: {}", workers, system);
        assert!(!system.contains("root_dir"));
        assert!(system.contains("\trpc_endpoint 127.0.0.1:24444\n"));
    }
}

#[test]
fn multiple_workers_set_count_and_buffer_root() {
    let system = system_for(Some(4));
    assert!(system.contains("\tworkers 4\n"));
    assert!(system.contains("\troot_dir /buffers\n"));
}

#[test]
fn worker_count_is_reported() {
    let store = MemoryStore::new();
    let mut a = agent();
    a.workers = Some(3);
    store.add_agent(a);
    let (report, _) = compile(&store);
    assert_eq!(report.agent(&agent_ref()).unwrap().workers, 3);
}

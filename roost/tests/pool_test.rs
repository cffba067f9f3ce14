// Integration tests for the thread pool and the pattern actors running on it.

use std::collections::HashMap;
use std::sync::Arc;

use roost::pattern::{Outbox, PipeActor, RouteeHandler, RouterActor};
use roost::thread::{ActorThreadPool, DispatchContext, QueueMode, ThreadConfig};
use roost_api::cell::Cell;
use roost_api::message::ActorMessage;
use uuid::Uuid;

mod test_helpers;
use test_helpers::{msg, registry_with, small_config, wait_until, DEFAULT_WAIT};

fn pool_config(pool_size: usize) -> ThreadConfig {
    ThreadConfig {
        pool_size,
        ..small_config(QueueMode::Unbounded)
    }
}

#[test]
fn test_destination_stays_on_one_worker() {
    let (registry, ids, log) = registry_with(8);
    let pool = ActorThreadPool::start(&pool_config(4), DispatchContext::new(registry)).unwrap();

    for round in 0..25 {
        for id in &ids {
            pool.send(msg(round, *id)).unwrap();
        }
    }
    assert!(wait_until(DEFAULT_WAIT, || pool.count() == 200));
    pool.shutdown().unwrap();

    let mut threads: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut last_tag: HashMap<Uuid, i32> = HashMap::new();
    for delivery in log.lock().unwrap().iter() {
        let thread = threads.entry(delivery.cell).or_insert_with(|| delivery.thread.clone());
        assert_eq!(*thread, delivery.thread);
        // Per-producer FIFO on the server tier
        let previous = last_tag.insert(delivery.cell, delivery.tag);
        assert!(previous.is_none_or(|tag| tag < delivery.tag));
    }
    for id in &ids {
        assert_eq!(threads[id].as_deref(), Some(pool.worker_for(id).name()));
    }
}

#[test]
fn test_all_send_variants_route_by_destination() {
    let (registry, ids, log) = registry_with(2);
    let pool = ActorThreadPool::start(&pool_config(2), DispatchContext::new(registry)).unwrap();

    pool.send(msg(1, ids[0])).unwrap();
    pool.send_outer(msg(2, ids[1])).unwrap();
    pool.send_directive(msg(3, ids[0])).unwrap();
    pool.send_priority(msg(4, ids[1])).unwrap();

    assert!(wait_until(DEFAULT_WAIT, || pool.count() == 4));
    let mut tags: Vec<(Uuid, i32)> = log.lock().unwrap().iter().map(|d| (d.cell, d.tag)).collect();
    tags.sort_by_key(|(_, tag)| *tag);
    assert_eq!(tags, vec![(ids[0], 1), (ids[1], 2), (ids[0], 3), (ids[1], 4)]);
    pool.shutdown().unwrap();
}

#[test]
fn test_router_and_pipe_forward_through_pool() {
    let (registry, ids, log) = registry_with(2);
    let (evens, odds) = (ids[0], ids[1]);
    let pool = Arc::new(ActorThreadPool::start(&pool_config(2), DispatchContext::new(registry.clone())).unwrap());
    let outbox: Arc<dyn Outbox> = pool.clone();

    let router = RouterActor::new(
        Uuid::new_v4(),
        outbox.clone(),
        vec![
            RouteeHandler::new(|m| m.tag % 2 == 0, evens),
            RouteeHandler::new(|m| m.tag % 2 == 1, odds),
        ],
    );
    let router_id = router.id();
    registry.register(Arc::new(router));

    let pipe = PipeActor::new(Uuid::new_v4(), router_id, outbox, |m| {
        Ok(ActorMessage::new(m.value_as_i32()?, m.tag + 1, None, None))
    });
    let pipe_id = pipe.id();
    registry.register(Arc::new(pipe));

    for tag in 0..4 {
        pool.send(ActorMessage::new(tag * 10, tag, None, Some(pipe_id))).unwrap();
    }

    assert!(wait_until(DEFAULT_WAIT, || log.lock().unwrap().len() == 4));
    let mut routed: Vec<(Uuid, i32)> = log.lock().unwrap().iter().map(|d| (d.cell, d.tag)).collect();
    routed.sort_by_key(|(_, tag)| *tag);
    assert_eq!(routed, vec![(odds, 1), (evens, 2), (odds, 3), (evens, 4)]);

    pool.shutdown().unwrap();
    // Break the registry -> router -> pool cycle
    registry.remove(&router_id);
    registry.remove(&pipe_id);
}

#[test]
fn test_processing_time_toggle() {
    let (registry, ids, _log) = registry_with(1);
    let lookup = registry.clone();
    let pool = ActorThreadPool::start(&pool_config(1), DispatchContext::new(registry)).unwrap();

    pool.send(msg(1, ids[0])).unwrap();
    assert!(wait_until(DEFAULT_WAIT, || pool.count() == 1));
    pool.set_processing_time_enabled(true);
    pool.send(msg(2, ids[0])).unwrap();
    assert!(wait_until(DEFAULT_WAIT, || pool.count() == 2));
    pool.shutdown().unwrap();

    let cell = roost_api::cell::CellRegistry::lookup(lookup.as_ref(), &ids[0]).unwrap();
    assert_eq!(cell.stats().timed_count(), 1);
    assert_eq!(cell.stats().request_rate(), 2);
}

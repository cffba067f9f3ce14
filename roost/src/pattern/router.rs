use std::sync::{Arc, Mutex};

use tracing::warn;
use uuid::Uuid;

use roost_api::cell::{Cell, CellStats};
use roost_api::matcher::ActorMessageMatcher;
use roost_api::message::ActorMessage;
use roost_api::types::ActorResult;

use super::Outbox;

/// Routes every message accepted by `predicate` to `routee`.
pub struct RouteeHandler {
    pub predicate: Box<dyn Fn(&ActorMessage) -> bool + Send + Sync>,
    pub routee: Uuid,
}

impl RouteeHandler {
    pub fn new<P>(predicate: P, routee: Uuid) -> Self
    where
        P: Fn(&ActorMessage) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            routee,
        }
    }
}

/// Forwards each message to every routee whose predicate accepts it.
///
/// Routees receive a duplicate re-addressed to them, so a message carrying
/// a non-duplicable payload fails the dispatch with `IllegalPayload`.
pub struct RouterActor {
    id: Uuid,
    stats: CellStats,
    matcher: ActorMessageMatcher,
    selected: Arc<Mutex<Vec<Uuid>>>,
    outbox: Arc<dyn Outbox>,
}

impl RouterActor {
    pub fn new(id: Uuid, outbox: Arc<dyn Outbox>, handlers: Vec<RouteeHandler>) -> Self {
        let mut router = Self {
            id,
            stats: CellStats::new(),
            matcher: ActorMessageMatcher::new(),
            selected: Arc::new(Mutex::new(Vec::new())),
            outbox,
        };
        router.matcher.match_else(move |msg| {
            warn!(router = %id, tag = msg.tag, source = ?msg.source, "unhandled message");
        });
        for handler in handlers {
            router.add(handler);
        }
        router
    }

    pub fn add(&mut self, handler: RouteeHandler) -> &mut Self {
        let selected = Arc::clone(&self.selected);
        let RouteeHandler { predicate, routee } = handler;
        self.matcher.match_if(predicate, move |_| {
            selected.lock().unwrap_or_else(|e| e.into_inner()).push(routee);
        });
        self
    }

    pub fn routee_count(&self) -> usize {
        self.matcher.rule_count()
    }
}

impl Cell for RouterActor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn receive(&self, message: ActorMessage) -> ActorResult<()> {
        self.matcher.apply(&message);
        let routees = std::mem::take(&mut *self.selected.lock().unwrap_or_else(|e| e.into_inner()));
        for routee in routees {
            self.outbox.send(message.duplicate_to(routee)?)?;
        }
        Ok(())
    }

    fn stats(&self) -> &CellStats {
        &self.stats
    }
}

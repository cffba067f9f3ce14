//! # Message Matcher
//!
//! Rule-based dispatch for actor receive behavior. A matcher holds three
//! ordered rule lists:
//!
//! - `matches`: (predicate, action) pairs. Every rule whose predicate holds
//!   fires, in registration order. Evaluation never stops at the first hit.
//! - `matches_else`: actions run only when no `matches` rule fired.
//! - `matches_any`: actions run for every message.
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::matcher::ActorMessageMatcher;
//! use roost_api::message::ActorMessage;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//!
//! let mut matcher = ActorMessageMatcher::new();
//! matcher
//!     .match_tag(1, move |_| { counter.fetch_add(1, Ordering::SeqCst); })
//!     .match_else(|msg| println!("unhandled: {msg}"));
//!
//! assert!(matcher.apply(&ActorMessage::new((), 1, None, None)));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

use crate::message::ActorMessage;

/// Predicate evaluated against an incoming message.
pub type MessagePredicate = Box<dyn Fn(&ActorMessage) -> bool + Send + Sync>;

/// Action run for a matching message.
pub type MessageAction = Box<dyn Fn(&ActorMessage) + Send + Sync>;

struct Rule {
    predicate: MessagePredicate,
    action: MessageAction,
}

/// Ordered predicate/action rules with else and always-run lists.
#[derive(Default)]
pub struct ActorMessageMatcher {
    matches: Vec<Rule>,
    matches_else: Vec<MessageAction>,
    matches_any: Vec<MessageAction>,
}

impl ActorMessageMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push<P, A>(&mut self, predicate: P, action: A) -> &mut Self
    where
        P: Fn(&ActorMessage) -> bool + Send + Sync + 'static,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.matches.push(Rule {
            predicate: Box::new(predicate),
            action: Box::new(action),
        });
        self
    }

    /// Fires when the message was sent by `source`.
    pub fn match_source<A>(&mut self, source: Uuid, action: A) -> &mut Self
    where
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.push(move |msg| msg.source == Some(source), action)
    }

    /// Fires when the message was sent by any of `sources`.
    pub fn match_sources<I, A>(&mut self, sources: I, action: A) -> &mut Self
    where
        I: IntoIterator<Item = Uuid>,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let sources: HashSet<Uuid> = sources.into_iter().collect();
        self.push(move |msg| msg.source.is_some_and(|s| sources.contains(&s)), action)
    }

    pub fn match_tag<A>(&mut self, tag: i32, action: A) -> &mut Self
    where
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.push(move |msg| msg.tag == tag, action)
    }

    pub fn match_tags<I, A>(&mut self, tags: I, action: A) -> &mut Self
    where
        I: IntoIterator<Item = i32>,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let tags: HashSet<i32> = tags.into_iter().collect();
        self.push(move |msg| tags.contains(&msg.tag), action)
    }

    pub fn match_source_tag<A>(&mut self, source: Uuid, tag: i32, action: A) -> &mut Self
    where
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.push(move |msg| msg.source == Some(source) && msg.tag == tag, action)
    }

    pub fn match_sources_tag<I, A>(&mut self, sources: I, tag: i32, action: A) -> &mut Self
    where
        I: IntoIterator<Item = Uuid>,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let sources: HashSet<Uuid> = sources.into_iter().collect();
        self.push(
            move |msg| msg.tag == tag && msg.source.is_some_and(|s| sources.contains(&s)),
            action,
        )
    }

    pub fn match_source_tags<I, A>(&mut self, source: Uuid, tags: I, action: A) -> &mut Self
    where
        I: IntoIterator<Item = i32>,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let tags: HashSet<i32> = tags.into_iter().collect();
        self.push(move |msg| msg.source == Some(source) && tags.contains(&msg.tag), action)
    }

    pub fn match_sources_tags<S, T, A>(&mut self, sources: S, tags: T, action: A) -> &mut Self
    where
        S: IntoIterator<Item = Uuid>,
        T: IntoIterator<Item = i32>,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let sources: HashSet<Uuid> = sources.into_iter().collect();
        let tags: HashSet<i32> = tags.into_iter().collect();
        self.push(
            move |msg| tags.contains(&msg.tag) && msg.source.is_some_and(|s| sources.contains(&s)),
            action,
        )
    }

    /// Fires when the payload's concrete type is exactly `T`.
    ///
    /// Text payloads match `str`. An empty payload matches nothing.
    pub fn match_type<T, A>(&mut self, action: A) -> &mut Self
    where
        T: ?Sized + 'static,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let expected = TypeId::of::<T>();
        self.push(move |msg| msg.value.value_type_id() == Some(expected), action)
    }

    /// Fires when the payload type is exactly `T` and `predicate` holds.
    pub fn match_type_if<T, P, A>(&mut self, predicate: P, action: A) -> &mut Self
    where
        T: ?Sized + 'static,
        P: Fn(&ActorMessage) -> bool + Send + Sync + 'static,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        let expected = TypeId::of::<T>();
        self.push(
            move |msg| msg.value.value_type_id() == Some(expected) && predicate(msg),
            action,
        )
    }

    pub fn match_if<P, A>(&mut self, predicate: P, action: A) -> &mut Self
    where
        P: Fn(&ActorMessage) -> bool + Send + Sync + 'static,
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.push(predicate, action)
    }

    /// Runs when no `match_*` rule fired.
    pub fn match_else<A>(&mut self, action: A) -> &mut Self
    where
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.matches_else.push(Box::new(action));
        self
    }

    /// Runs for every message after the other rules.
    pub fn match_any<A>(&mut self, action: A) -> &mut Self
    where
        A: Fn(&ActorMessage) + Send + Sync + 'static,
    {
        self.matches_any.push(Box::new(action));
        self
    }

    /// Evaluates all rules against `message`.
    ///
    /// Returns true if any rule fired, including else and any rules.
    pub fn apply(&self, message: &ActorMessage) -> bool {
        let mut matched = false;
        for rule in &self.matches {
            if (rule.predicate)(message) {
                (rule.action)(message);
                matched = true;
            }
        }

        let mut fired = matched;
        if !matched {
            for action in &self.matches_else {
                action(message);
                fired = true;
            }
        }

        for action in &self.matches_any {
            action(message);
            fired = true;
        }
        fired
    }

    pub fn rule_count(&self) -> usize {
        self.matches.len()
    }
}

impl fmt::Debug for ActorMessageMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorMessageMatcher")
            .field("matches", &self.matches.len())
            .field("matches_else", &self.matches_else.len())
            .field("matches_any", &self.matches_any.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> impl Fn(&ActorMessage) + Send + Sync + 'static {
        let log = log.clone();
        move |_| log.lock().unwrap().push(name)
    }

    fn tagged(tag: i32) -> ActorMessage {
        ActorMessage::new((), tag, None, None)
    }

    #[test]
    fn test_tag_rules_fire_exclusively() {
        let log: Log = Arc::default();
        let mut matcher = ActorMessageMatcher::new();
        matcher
            .match_tag(1, recorder(&log, "one"))
            .match_tag(2, recorder(&log, "two"));

        assert!(matcher.apply(&tagged(1)));
        assert_eq!(*log.lock().unwrap(), vec!["one"]);
        log.lock().unwrap().clear();

        assert!(matcher.apply(&tagged(2)));
        assert_eq!(*log.lock().unwrap(), vec!["two"]);
        log.lock().unwrap().clear();

        assert!(!matcher.apply(&tagged(3)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_else_and_any_rules() {
        let log: Log = Arc::default();
        let mut matcher = ActorMessageMatcher::new();
        matcher
            .match_tag(1, recorder(&log, "one"))
            .match_else(recorder(&log, "else"))
            .match_any(recorder(&log, "any"));

        matcher.apply(&tagged(1));
        assert_eq!(*log.lock().unwrap(), vec!["one", "any"]);
        log.lock().unwrap().clear();

        assert!(matcher.apply(&tagged(9)));
        assert_eq!(*log.lock().unwrap(), vec!["else", "any"]);
    }

    #[test]
    fn test_multiple_rules_fire_in_order() {
        let log: Log = Arc::default();
        let source = Uuid::new_v4();
        let mut matcher = ActorMessageMatcher::new();
        matcher
            .match_source(source, recorder(&log, "source"))
            .match_tags([4, 5], recorder(&log, "tags"))
            .match_source_tag(source, 4, recorder(&log, "both"))
            .match_else(recorder(&log, "else"));

        matcher.apply(&ActorMessage::new((), 4, Some(source), None));
        assert_eq!(*log.lock().unwrap(), vec!["source", "tags", "both"]);
    }

    #[test]
    fn test_source_set_combinations() {
        let log: Log = Arc::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut matcher = ActorMessageMatcher::new();
        matcher
            .match_sources([a, b], recorder(&log, "sources"))
            .match_sources_tag([a], 7, recorder(&log, "sources_tag"))
            .match_source_tags(b, [7, 8], recorder(&log, "source_tags"))
            .match_sources_tags([a, b], [8], recorder(&log, "sources_tags"));

        matcher.apply(&ActorMessage::new((), 7, Some(a), None));
        assert_eq!(*log.lock().unwrap(), vec!["sources", "sources_tag"]);
        log.lock().unwrap().clear();

        matcher.apply(&ActorMessage::new((), 8, Some(b), None));
        assert_eq!(*log.lock().unwrap(), vec!["sources", "source_tags", "sources_tags"]);
        log.lock().unwrap().clear();

        assert!(!matcher.apply(&ActorMessage::new((), 8, None, None)));
    }

    #[test]
    fn test_type_rules() {
        let log: Log = Arc::default();
        let mut matcher = ActorMessageMatcher::new();
        matcher
            .match_type::<str, _>(recorder(&log, "text"))
            .match_type::<Vec<u32>, _>(recorder(&log, "vec"))
            .match_type_if::<i32, _, _>(|msg| msg.value_as_i32().is_ok_and(|v| v > 10), recorder(&log, "big"));

        matcher.apply(&ActorMessage::new("hi", 0, None, None));
        matcher.apply(&ActorMessage::new(Payload::duplicable(vec![1_u32]), 0, None, None));
        matcher.apply(&ActorMessage::new(5_i32, 0, None, None));
        matcher.apply(&ActorMessage::new(50_i32, 0, None, None));
        assert_eq!(*log.lock().unwrap(), vec!["text", "vec", "big"]);
    }

    #[test]
    fn test_match_if_predicate() {
        let log: Log = Arc::default();
        let mut matcher = ActorMessageMatcher::new();
        matcher.match_if(|msg| msg.protocol.as_deref() == Some("ping"), recorder(&log, "ping"));

        assert!(matcher.apply(&tagged(0).with_protocol("ping")));
        assert!(!matcher.apply(&tagged(0).with_protocol("pong")));
        assert_eq!(matcher.rule_count(), 1);
    }
}

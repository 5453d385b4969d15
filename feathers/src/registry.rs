//! Hook registration sets.
//!
//! A [`Hooks`] value is one phase's registrations: hooks for every verb
//! (`all`) plus per-verb lists. The effective chain for a verb is always the
//! `all` hooks followed by that verb's hooks.
//!
//! Each service keeps three sets (before, after, error) in [`ServiceHooks`].
//! Registration appends by read-copy-update; a call snapshots all three sets
//! when it starts, so hooks registered during a call apply from the next
//! call on.

use crate::hook::{DynHook, Hook};
use arc_swap::ArcSwap;
use feathers_core::Verb;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased hook.
pub type SharedHook = Arc<dyn DynHook>;

/// One phase's hook registrations.
///
/// # Example
///
/// ```rust,ignore
/// let before = Hooks::new()
///     .all(LoggingHook::new())
///     .create(ValidateHook)
///     .patch(ValidateHook);
///
/// app.service("messages").hooks(Some(before), None, None);
/// ```
#[derive(Clone, Default)]
pub struct Hooks {
    all: Vec<SharedHook>,
    find: Vec<SharedHook>,
    get: Vec<SharedHook>,
    create: Vec<SharedHook>,
    update: Vec<SharedHook>,
    patch: Vec<SharedHook>,
    remove: Vec<SharedHook>,
}

impl Hooks {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every verb.
    pub fn all(mut self, hook: impl Hook) -> Self {
        self.all.push(Arc::new(hook));
        self
    }

    /// Run `hook` on `find`.
    pub fn find(self, hook: impl Hook) -> Self {
        self.verb(Verb::Find, hook)
    }

    /// Run `hook` on `get`.
    pub fn get(self, hook: impl Hook) -> Self {
        self.verb(Verb::Get, hook)
    }

    /// Run `hook` on `create`.
    pub fn create(self, hook: impl Hook) -> Self {
        self.verb(Verb::Create, hook)
    }

    /// Run `hook` on `update`.
    pub fn update(self, hook: impl Hook) -> Self {
        self.verb(Verb::Update, hook)
    }

    /// Run `hook` on `patch`.
    pub fn patch(self, hook: impl Hook) -> Self {
        self.verb(Verb::Patch, hook)
    }

    /// Run `hook` on `remove`.
    pub fn remove(self, hook: impl Hook) -> Self {
        self.verb(Verb::Remove, hook)
    }

    /// Run `hook` on `verb`.
    pub fn verb(mut self, verb: Verb, hook: impl Hook) -> Self {
        self.list_mut(verb).push(Arc::new(hook));
        self
    }

    /// Run an already shared hook on `verb`, or on every verb for `None`.
    pub fn shared(mut self, verb: Option<Verb>, hook: SharedHook) -> Self {
        match verb {
            Some(verb) => self.list_mut(verb).push(hook),
            None => self.all.push(hook),
        }
        self
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && Verb::ALL.iter().all(|verb| self.list(*verb).is_empty())
    }

    /// Number of registered hooks across all lists.
    pub fn len(&self) -> usize {
        self.all.len() + Verb::ALL.iter().map(|verb| self.list(*verb).len()).sum::<usize>()
    }

    /// `self` with every list of `other` appended.
    pub fn merged(&self, other: &Hooks) -> Hooks {
        let mut merged = self.clone();
        merged.all.extend(other.all.iter().cloned());
        for verb in Verb::ALL {
            merged.list_mut(verb).extend(other.list(verb).iter().cloned());
        }
        merged
    }

    /// The effective chain for `verb`: `all` first, then the verb's own.
    pub fn for_verb(&self, verb: Verb) -> Vec<SharedHook> {
        self.all.iter().chain(self.list(verb)).cloned().collect()
    }

    fn list(&self, verb: Verb) -> &Vec<SharedHook> {
        match verb {
            Verb::Find => &self.find,
            Verb::Get => &self.get,
            Verb::Create => &self.create,
            Verb::Update => &self.update,
            Verb::Patch => &self.patch,
            Verb::Remove => &self.remove,
        }
    }

    fn list_mut(&mut self, verb: Verb) -> &mut Vec<SharedHook> {
        match verb {
            Verb::Find => &mut self.find,
            Verb::Get => &mut self.get,
            Verb::Create => &mut self.create,
            Verb::Update => &mut self.update,
            Verb::Patch => &mut self.patch,
            Verb::Remove => &mut self.remove,
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("all", &self.all.len())
            .field("find", &self.find.len())
            .field("get", &self.get.len())
            .field("create", &self.create.len())
            .field("update", &self.update.len())
            .field("patch", &self.patch.len())
            .field("remove", &self.remove.len())
            .finish()
    }
}

/// The three registration sets of one service.
#[derive(Default)]
pub(crate) struct ServiceHooks {
    before: ArcSwap<Hooks>,
    after: ArcSwap<Hooks>,
    error: ArcSwap<Hooks>,
}

/// Hooks in effect for one call.
pub(crate) struct HookSnapshot {
    pub(crate) before: Arc<Hooks>,
    pub(crate) after: Arc<Hooks>,
    pub(crate) error: Arc<Hooks>,
}

impl ServiceHooks {
    /// Append each supplied set to its phase.
    pub(crate) fn register(&self, before: Option<Hooks>, after: Option<Hooks>, error: Option<Hooks>) {
        for (slot, hooks) in [
            (&self.before, before),
            (&self.after, after),
            (&self.error, error),
        ] {
            if let Some(hooks) = hooks {
                slot.rcu(|current| Arc::new(current.merged(&hooks)));
            }
        }
    }

    pub(crate) fn snapshot(&self) -> HookSnapshot {
        HookSnapshot {
            before: self.before.load_full(),
            after: self.after.load_full(),
            error: self.error.load_full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HookContext;
    use feathers_core::FeathersError;

    struct Noop;

    impl Hook for Noop {
        async fn run(&self, context: HookContext) -> Result<HookContext, FeathersError> {
            Ok(context)
        }
    }

    #[test]
    fn test_for_verb_puts_all_first() {
        let verb_hook: SharedHook = Arc::new(Noop);
        let all_hook: SharedHook = Arc::new(Noop);
        let hooks = Hooks::new()
            .shared(Some(Verb::Find), verb_hook.clone())
            .shared(None, all_hook.clone());

        let chain = hooks.for_verb(Verb::Find);
        assert_eq!(chain.len(), 2);
        assert!(Arc::ptr_eq(&chain[0], &all_hook));
        assert!(Arc::ptr_eq(&chain[1], &verb_hook));
        assert_eq!(hooks.for_verb(Verb::Get).len(), 1);
    }

    #[test]
    fn test_register_appends() {
        let hooks = ServiceHooks::default();
        hooks.register(Some(Hooks::new().find(Noop)), None, None);
        hooks.register(Some(Hooks::new().find(Noop).all(Noop)), None, Some(Hooks::new().all(Noop)));

        let snapshot = hooks.snapshot();
        assert_eq!(snapshot.before.len(), 3);
        assert_eq!(snapshot.before.for_verb(Verb::Find).len(), 3);
        assert!(snapshot.after.is_empty());
        assert_eq!(snapshot.error.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_registration() {
        let hooks = ServiceHooks::default();
        hooks.register(Some(Hooks::new().all(Noop)), None, None);
        let snapshot = hooks.snapshot();

        hooks.register(Some(Hooks::new().all(Noop)), None, None);

        assert_eq!(snapshot.before.len(), 1);
        assert_eq!(hooks.snapshot().before.len(), 2);
    }
}

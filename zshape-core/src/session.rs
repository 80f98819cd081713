//! Reference tracking for tree-structured codecs.
//!
//! A [`ReferenceSession`] lives for one top-level read or write. Writers ask it whether an object
//! was already emitted (write `$id` and the payload the first time, `$ref` afterwards); readers
//! register every `$id` they meet and resolve `$ref`s against it.

use std::{any::TypeId, collections::HashMap, sync::Arc};

use crate::{Error, Result};

/// Identity of a tracked object: its address and the kind of object living there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    address: usize,
    kind: TypeId,
}

impl ObjectKey {
    /// Key from a raw address and kind.
    pub fn new(address: usize, kind: TypeId) -> Self {
        Self { address, kind }
    }

    /// Key of the value behind `object`.
    pub fn of<T: 'static>(object: &T) -> Self {
        Self::new(object as *const T as usize, TypeId::of::<T>())
    }

    /// Key of the value shared by `object` and all its clones.
    pub fn of_arc<T: 'static>(object: &Arc<T>) -> Self {
        Self::new(Arc::as_ptr(object) as usize, TypeId::of::<T>())
    }

    /// The address.
    pub fn address(&self) -> usize {
        self.address
    }
}

/// Lifecycle of a [`ReferenceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet tracking.
    Idle,
    /// Tracking references.
    Tracking,
    /// Done; all bookkeeping dropped.
    Closed,
}

/// Outcome of [`ReferenceSession::visit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// First visit: write the payload under this `$id`.
    First(String),
    /// Already written: write a `$ref` to this id.
    Repeat(String),
}

/// Outcome of [`ReferenceSession::resolve`].
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// The registered object.
    Ready(&'a T),
    /// The id was reserved but its object is still being built.
    Pending,
}

#[derive(Debug)]
enum Slot<T> {
    Pending,
    Ready(T),
}

/// Bidirectional `id ↔ object` bookkeeping for one serialization or deserialization.
#[derive(Debug)]
pub struct ReferenceSession<T> {
    state: SessionState,
    last_id: u64,
    ids: HashMap<ObjectKey, String>,
    objects: HashMap<String, Slot<T>>,
}

impl<T> ReferenceSession<T> {
    /// An idle session.
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_id: 0,
            ids: HashMap::new(),
            objects: HashMap::new(),
        }
    }

    /// A session that is already tracking.
    pub fn tracking() -> Self {
        let mut session = Self::new();
        session.state = SessionState::Tracking;

        session
    }

    /// Start tracking. Starting a tracking session is a no-op.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => {
                debug!("Reference session started");
                self.state = SessionState::Tracking;
                Ok(())
            }
            SessionState::Tracking => Ok(()),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Stop tracking and drop all bookkeeping.
    pub fn close(&mut self) {
        if self.state == SessionState::Tracking {
            debug!("Reference session closed after {} ids", self.objects.len());
        }
        self.state = SessionState::Closed;
        self.ids.clear();
        self.objects.clear();
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Writer side: look up or assign the id of `key`.
    ///
    /// The first visit assigns the next id and keeps `object` alive for the rest of the session.
    pub fn visit(&mut self, key: ObjectKey, object: T) -> Result<Visit> {
        self.ensure_tracking()?;
        if let Some(id) = self.ids.get(&key) {
            trace!("Repeat visit of `{}`", id);
            return Ok(Visit::Repeat(id.clone()));
        }

        self.last_id += 1;
        let id = self.last_id.to_string();
        self.ids.insert(key, id.clone());
        self.objects.insert(id.clone(), Slot::Ready(object));
        trace!("Assigned id `{}`", id);

        Ok(Visit::First(id))
    }

    /// Writer side: the id already assigned to `key`.
    pub fn id_of(&self, key: &ObjectKey) -> Option<&str> {
        self.ids.get(key).map(String::as_str)
    }

    /// Reader side: register `id` before its object is built.
    pub fn reserve(&mut self, id: &str) -> Result<()> {
        self.ensure_tracking()?;
        if self.objects.contains_key(id) {
            return Err(Error::DuplicateReferenceId { id: id.into() });
        }
        self.objects.insert(id.into(), Slot::Pending);

        Ok(())
    }

    /// Reader side: attach the built object to a reserved `id`.
    pub fn complete(&mut self, id: &str, object: T) -> Result<()> {
        self.ensure_tracking()?;
        match self.objects.get_mut(id) {
            Some(slot @ Slot::Pending) => {
                *slot = Slot::Ready(object);
                Ok(())
            }
            Some(Slot::Ready(_)) => Err(Error::DuplicateReferenceId { id: id.into() }),
            None => Err(Error::UnresolvedReference { id: id.into() }),
        }
    }

    /// Reader side: reserve and complete `id` at once.
    pub fn register(&mut self, id: &str, object: T) -> Result<()> {
        self.reserve(id)?;
        self.complete(id, object)
    }

    /// Reader side: the object registered under `id`.
    pub fn resolve(&self, id: &str) -> Result<Lookup<'_, T>> {
        self.ensure_tracking()?;
        match self.objects.get(id) {
            Some(Slot::Ready(object)) => Ok(Lookup::Ready(object)),
            Some(Slot::Pending) => Ok(Lookup::Pending),
            None => Err(Error::UnresolvedReference { id: id.into() }),
        }
    }

    /// Number of ids seen.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no ids were seen.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn ensure_tracking(&self) -> Result<()> {
        match self.state {
            SessionState::Tracking => Ok(()),
            _ => Err(Error::SessionClosed),
        }
    }
}

impl<T> Default for ReferenceSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hands a [`ReferenceSession`] to a converter.
///
/// A root adapter mints a brand-new session for every top-level call. An adapter over an existing
/// session reuses it, so nested converters share ids with their caller.
#[derive(Debug)]
pub struct SessionAdapter<'s, T> {
    shared: Option<&'s mut ReferenceSession<T>>,
}

impl<T> SessionAdapter<'static, T> {
    /// An adapter creating a new session per call.
    pub fn root() -> Self {
        Self { shared: None }
    }
}

impl<'s, T> SessionAdapter<'s, T> {
    /// An adapter reusing `session`.
    pub fn reusing(session: &'s mut ReferenceSession<T>) -> Self {
        Self {
            shared: Some(session),
        }
    }

    /// Whether this adapter creates its own sessions.
    pub fn is_root(&self) -> bool {
        self.shared.is_none()
    }

    /// Run `f` with the adapter's session.
    pub fn with_session<R>(
        &mut self,
        f: impl FnOnce(&mut ReferenceSession<T>) -> Result<R>,
    ) -> Result<R> {
        match &mut self.shared {
            Some(session) => f(&mut **session),
            None => {
                let mut session = ReferenceSession::tracking();
                let result = f(&mut session);
                session.close();

                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_assigns_monotonic_ids() {
        let mut session = ReferenceSession::new();
        session.start().unwrap();
        let a = Arc::new(1);
        let b = Arc::new(1);

        assert_eq!(
            session.visit(ObjectKey::of_arc(&a), a.clone()).unwrap(),
            Visit::First("1".into())
        );
        assert_eq!(
            session.visit(ObjectKey::of_arc(&b), b.clone()).unwrap(),
            Visit::First("2".into())
        );
        // Identity, not equality.
        assert_eq!(
            session.visit(ObjectKey::of_arc(&a.clone()), a).unwrap(),
            Visit::Repeat("1".into())
        );
    }

    #[test]
    fn reader_reserves_before_completing() {
        let mut session = ReferenceSession::tracking();
        session.reserve("1").unwrap();
        assert_eq!(session.resolve("1").unwrap(), Lookup::Pending);

        session.complete("1", "root").unwrap();
        assert_eq!(session.resolve("1").unwrap(), Lookup::Ready(&"root"));

        assert_eq!(
            session.register("1", "again").unwrap_err(),
            Error::DuplicateReferenceId { id: "1".into() }
        );
        assert_eq!(
            session.resolve("7").unwrap_err(),
            Error::UnresolvedReference { id: "7".into() }
        );
    }

    #[test]
    fn use_outside_tracking_fails() {
        let mut session = ReferenceSession::<()>::new();
        assert_eq!(session.reserve("1").unwrap_err(), Error::SessionClosed);

        session.start().unwrap();
        session.register("1", ()).unwrap();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.resolve("1").unwrap_err(), Error::SessionClosed);
        assert_eq!(session.start().unwrap_err(), Error::SessionClosed);
    }

    #[test]
    fn root_adapter_mints_sessions() {
        let mut root = SessionAdapter::<u8>::root();
        for _ in 0..2 {
            let id = root
                .with_session(|s| s.visit(ObjectKey::new(1, TypeId::of::<u8>()), 0))
                .unwrap();
            assert_eq!(id, Visit::First("1".into()));
        }

        let mut session = ReferenceSession::tracking();
        let mut reusing = SessionAdapter::reusing(&mut session);
        assert!(!reusing.is_root());
        for expected in [Visit::First("1".into()), Visit::Repeat("1".into())] {
            let visit = reusing
                .with_session(|s| s.visit(ObjectKey::new(1, TypeId::of::<u8>()), 0))
                .unwrap();
            assert_eq!(visit, expected);
        }
        assert_eq!(session.len(), 1);
    }
}

//! Observable entity cache
//!
//! Holds the last server-confirmed list of entities. Readers either take a
//! snapshot or subscribe to a `watch` channel that fires whenever the list
//! changes. Writers only ever put confirmed data in.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::finance::OrdenDePago;
use crate::domain::project::Project;
use crate::domain::timebox::Timebox;
use crate::error::Result;

/// Entities the store can key by id
pub trait Keyed {
    fn key(&self) -> Option<&str>;
}

impl Keyed for Timebox {
    fn key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

impl Keyed for Project {
    fn key(&self) -> Option<&str> {
        Some(self.id.as_str()).filter(|id| !id.is_empty())
    }
}

impl Keyed for OrdenDePago {
    fn key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug)]
struct State<T> {
    items: Arc<Vec<T>>,
    valid: bool,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            valid: self.valid,
        }
    }
}

/// Cache of one entity type
#[derive(Debug)]
pub struct EntityStore<T> {
    name: &'static str,
    tx: watch::Sender<State<T>>,
}

impl<T> EntityStore<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    /// An empty store that loads on first read
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(State {
            items: Arc::new(Vec::new()),
            valid: false,
        });
        Self { name, tx }
    }

    /// Receive the entity list every time it changes
    pub fn subscribe(&self) -> EntityReceiver<T> {
        EntityReceiver {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.tx.borrow().items)
    }

    pub fn is_valid(&self) -> bool {
        self.tx.borrow().valid
    }

    /// Mark stale; the next [`read`](Self::read) reloads
    pub fn invalidate(&self) {
        self.tx.send_modify(|state| state.valid = false);
        debug!(store = self.name, "Invalidated");
    }

    /// Replace everything with a freshly loaded list
    pub fn replace_all(&self, items: Vec<T>) {
        let count = items.len();
        self.tx.send_replace(State {
            items: Arc::new(items),
            valid: true,
        });
        debug!(store = self.name, count, "Replaced");
    }

    /// Insert or replace one confirmed entity
    pub fn upsert(&self, item: T) {
        self.tx.send_modify(|state| {
            let mut items = state.items.as_ref().clone();
            let pos = item
                .key()
                .and_then(|key| items.iter().position(|i| i.key() == Some(key)));
            match pos {
                Some(pos) => items[pos] = item,
                None => items.push(item),
            }
            state.items = Arc::new(items);
        });
    }

    /// Drop one entity after the backend confirmed its deletion
    pub fn remove(&self, key: &str) {
        self.tx.send_modify(|state| {
            let items: Vec<T> = state
                .items
                .iter()
                .filter(|i| i.key() != Some(key))
                .cloned()
                .collect();
            state.items = Arc::new(items);
        });
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.tx
            .borrow()
            .items
            .iter()
            .find(|i| i.key() == Some(key))
            .cloned()
    }

    /// The cached list, loading it first when stale
    pub async fn read<F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if self.is_valid() {
            return Ok(self.snapshot());
        }
        self.refresh(load).await
    }

    /// Reload unconditionally; on failure the cache is left untouched
    pub async fn refresh<F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let items = load().await?;
        self.replace_all(items);
        Ok(self.snapshot())
    }
}

/// Subscription handle returned by [`EntityStore::subscribe`]
pub struct EntityReceiver<T> {
    rx: watch::Receiver<State<T>>,
}

impl<T> EntityReceiver<T> {
    /// Wait for the next change; `None` once the store is dropped
    pub async fn changed(&mut self) -> Option<Arc<Vec<T>>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update().items))
    }

    pub fn current(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.rx.borrow().items)
    }
}

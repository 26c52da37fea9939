//! Shared test helpers for collection tests.

#![allow(dead_code)]

use async_trait::async_trait;
use layerstack_collection::{
    CollectionError, CollectionResult, IndexedCollection, ItemCodec, ModuleId, OverrideCollection,
    Record,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A map layer, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

pub fn layer(name: &str, url: &str) -> Arc<Layer> {
    Arc::new(Layer {
        name: name.to_owned(),
        url: url.to_owned(),
    })
}

/// An item keyed by a numeric `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub v: String,
}

pub fn entry(id: i64, v: &str) -> Arc<Entry> {
    Arc::new(Entry { id, v: v.to_owned() })
}

/// Installs a test log subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The "current module" the collections ask for, switchable by the test.
#[derive(Clone, Default)]
pub struct ActiveModule(Rc<RefCell<ModuleId>>);

impl ActiveModule {
    pub fn new(id: &str) -> Self {
        Self(Rc::new(RefCell::new(ModuleId::new(id))))
    }

    pub fn set(&self, id: &str) {
        *self.0.borrow_mut() = ModuleId::new(id);
    }

    pub fn provider(&self) -> impl Fn() -> ModuleId + 'static {
        let current = Rc::clone(&self.0);
        move || current.borrow().clone()
    }
}

/// Ordered log of collection events.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Records `added:<url>`, `removed:<url>@<index>` and
/// `replaced:<old url>-><new url>` events of a layer collection.
pub fn observe_layers(collection: &mut OverrideCollection<Layer>) -> EventLog {
    let log: EventLog = Rc::default();

    let sink = Rc::clone(&log);
    collection
        .added()
        .add_listener(move |item: &Arc<Layer>| sink.borrow_mut().push(format!("added:{}", item.url)));
    let sink = Rc::clone(&log);
    collection.removed().add_listener(move |event| {
        sink.borrow_mut()
            .push(format!("removed:{}@{}", event.item.url, event.index))
    });
    let sink = Rc::clone(&log);
    collection.replaced().add_listener(move |event| {
        sink.borrow_mut()
            .push(format!("replaced:{}->{}", event.old.url, event.new.url))
    });

    log
}

/// Urls of the live layers, in order.
pub fn urls(collection: &OverrideCollection<Layer>) -> Vec<String> {
    collection.to_vec().iter().map(|l| l.url.clone()).collect()
}

/// A layer codec that records destroyed layers and can be told to fail.
#[derive(Clone, Default)]
pub struct TrackingCodec {
    pub destroyed: Arc<Mutex<Vec<String>>>,
    /// Urls whose destroy hook fails.
    pub failing_destroy: Vec<String>,
    /// Urls rejected by validation.
    pub invalid: Vec<String>,
    /// Urls whose records cannot be deserialized.
    pub undecodable: Vec<String>,
}

impl TrackingCodec {
    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemCodec<Layer> for TrackingCodec {
    fn serialize(&self, item: &Layer) -> CollectionResult<Record> {
        Ok(serde_json::to_value(item)?)
    }

    fn deserialize(&self, record: Record) -> CollectionResult<Layer> {
        let layer: Layer = serde_json::from_value(record)?;
        if self.undecodable.contains(&layer.url) {
            return Err(CollectionError::Codec(format!("cannot decode {}", layer.url)));
        }
        Ok(layer)
    }

    async fn resolve(&self, record: Record) -> CollectionResult<Layer> {
        // Later records resolve first, so input order has to be restored.
        let delay = record
            .get("delay")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.deserialize(record)
    }

    fn validate(&self, item: &Layer) -> CollectionResult<()> {
        if self.invalid.contains(&item.url) {
            return Err(CollectionError::InvalidItem(item.url.clone()));
        }
        Ok(())
    }

    fn destroy(&self, item: &Layer) -> CollectionResult<()> {
        self.destroyed.lock().unwrap().push(item.url.clone());
        if self.failing_destroy.contains(&item.url) {
            return Err(CollectionError::Destroy(item.url.clone()));
        }
        Ok(())
    }
}

/// An indexed layer overlay using [`TrackingCodec`].
pub fn layer_overlay(
    active: &ActiveModule,
    codec: TrackingCodec,
) -> OverrideCollection<Layer, IndexedCollection<Layer>> {
    OverrideCollection::new(IndexedCollection::default(), active.provider(), codec).unwrap()
}

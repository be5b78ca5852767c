//! Browser implementations of storage and transport.

use std::rc::Rc;

use async_trait::async_trait;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Storage, StorageEvent, Url};

use crate::catalog::Transport;
use crate::error::{CatalogError, StorageError};
use crate::storage::{ChangeListener, DurableStorage, StorageChange, Subscription};

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn window() -> Result<web_sys::Window, String> {
    web_sys::window().ok_or_else(|| "no window".to_string())
}

/// `window.localStorage`; other tabs' writes arrive as `storage` events
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let storage = window()
            .map_err(StorageError::Unavailable)?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_message(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(LocalStorage { storage })
    }
}

impl DurableStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(js_message(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: js_message(&e),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: js_message(&e),
            })
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let Ok(window) = window() else {
            return Subscription::detached();
        };

        let callback = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
            // key is null when another context calls localStorage.clear()
            if let Some(key) = event.key() {
                listener(&StorageChange {
                    key,
                    new_value: event.new_value(),
                });
            }
        });

        if let Err(e) =
            window.add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
        {
            warn!("Failed to listen for storage events: {}", js_message(&e));
            return Subscription::detached();
        }

        Subscription::new(move || {
            let _ = window
                .remove_event_listener_with_callback("storage", callback.as_ref().unchecked_ref());
            drop(callback);
        })
    }
}

/// `fetch`-based transport
pub struct FetchTransport {
    base_url: String,
}

impl FetchTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        FetchTransport {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, CatalogError> {
        let url = Url::new(&format!("{}/{}", self.base_url, endpoint))
            .map_err(|e| CatalogError::Transport(js_message(&e)))?;
        let params = url.search_params();
        for (key, value) in query {
            params.append(key, value);
        }

        let window = window().map_err(CatalogError::Transport)?;
        let response = JsFuture::from(window.fetch_with_str(&url.href()))
            .await
            .map_err(|e| CatalogError::Transport(js_message(&e)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|e| CatalogError::Transport(js_message(&e)))?;

        if !response.ok() {
            return Err(CatalogError::Status(response.status()));
        }

        let text = response
            .text()
            .map_err(|e| CatalogError::Transport(js_message(&e)))?;
        JsFuture::from(text)
            .await
            .map_err(|e| CatalogError::Transport(js_message(&e)))?
            .as_string()
            .ok_or_else(|| CatalogError::Transport("response body is not text".to_string()))
    }
}

/// Shared handle for APIs that want `Rc<dyn DurableStorage>`
pub fn local_storage() -> Result<Rc<dyn DurableStorage>, StorageError> {
    Ok(Rc::new(LocalStorage::open()?))
}

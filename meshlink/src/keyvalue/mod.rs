//! `KeyValue` and `Admin` services: typed contracts, clients, server
//! adapters and an in-memory store.

pub mod client;
pub mod service;
pub mod store;
pub mod types;

pub use client::{AdminClient, KeyValueClient};
pub use service::{admin_service, key_value_service, Admin, KeyValue};
pub use store::{MemoryStore, ADMIN_USER, USER_HEADER};
pub use types::{
    ClearAll, ClearAllException, Get, GetArgs, GetException, HealthCheck, InvalidKey,
    KeyNotFound, NotAuthorized, Set, SetArgs, SetException, ADMIN_SERVICE, KEY_VALUE_SERVICE,
};

//! Document database access

mod client;
pub mod codec;
mod rest;
mod types;

pub use client::{CollectionRef, DocumentRef, Firestore, Query};
pub use rest::FirestoreRestClient;
pub use types::{Document, DocumentSnapshot, DocumentStore, FirestoreError, QuerySnapshot, Result};

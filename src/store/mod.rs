// SPDX-License-Identifier: MIT

//! Remote document store layer: tagged-value codec and REST client.

pub mod codec;
pub mod firestore;

pub use firestore::{Document, FirestoreClient, StoreError};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

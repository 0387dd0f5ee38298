// SPDX-License-Identifier: MIT

//! Data model: game categories and the per-user remote record.

pub mod category;
pub mod record;

pub use category::GameCategory;
pub use record::{
    GameRecord, MetricValue, ProfileRecord, SessionEntry, UserProfile, UserRecord, MAX_SESSIONS,
};

// SPDX-License-Identifier: MIT

//! Authentication layer: credential storage, identity endpoints, and the
//! sign-in state machine.

pub mod authenticator;
pub mod identity;
pub mod token_store;

pub use authenticator::{AuthPhase, Authenticator};
pub use identity::{IdentityClient, IdentityError};
pub use token_store::{CredentialSet, TokenStore};

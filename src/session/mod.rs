//! Client-side session handling: the API client and the controller that
//! keeps an access token fresh ahead of expiry.

mod client;
mod controller;

pub use client::{AuthClient, ClientError};
pub use controller::{
    MemoryTokenCache, SessionController, SessionState, TokenCache,
};

//! # repomirror-client
//!
//! Blocking HTTP implementation of [`repomirror_core::RepoInstanceClient`].

pub mod http;

pub use http::HttpInstanceClient;

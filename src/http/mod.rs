//! HTTP JSON API over the protein service

pub mod handler;
pub mod server;

pub use handler::{SearchRequest, SharedService};
pub use server::{router, HttpServer};

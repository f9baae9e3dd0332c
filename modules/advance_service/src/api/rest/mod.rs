//! REST API layer

pub mod caller;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mapper;
pub mod openapi;
pub mod routes;

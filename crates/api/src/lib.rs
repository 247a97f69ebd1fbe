//! HTTP API for the pricing service: routing, DTO mapping, service wiring.

pub mod app;

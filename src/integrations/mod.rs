//! Web framework integrations.
//!
//! The render pipeline is transport-agnostic: [`RenderService`](crate::RenderService)
//! takes an [`Envelope`](crate::request::Envelope) and returns a
//! [`GatewayResponse`](crate::service::GatewayResponse). Integrations adapt a
//! framework's request and response types to those two.
//!
//! # Available Integrations
//!
//! | Framework | Feature Flag | Module |
//! |-----------|--------------|--------|
//! | Axum | `axum-integration` | `axum` |
//!
//! The function binary (`lambda` feature) is the other transport; it passes
//! raw invocation events straight to
//! [`RenderService::handle_event`](crate::RenderService::handle_event).

#[cfg(feature = "axum-integration")]
pub mod axum;

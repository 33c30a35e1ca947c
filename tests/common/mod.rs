//! Common test utilities and fixtures for the secapi-core test suite.
//!
//! Shared key material, known-answer vectors and session builders used by
//! the integration, stress and property-based tests.

pub mod fixtures;

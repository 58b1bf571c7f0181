//! Concrete resource types.
//!
//! Each module declares one resource's attribute table and identifier, a
//! typed client trait for its endpoints, and a binding adapting that client to
//! [`ResourceApi`](crate::client::ResourceApi).

pub mod call_recording;

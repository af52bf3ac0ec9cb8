//! HTTP surface for the push-notification job worker.

pub mod app;

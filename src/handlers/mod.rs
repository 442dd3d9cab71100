//! HTTP handlers

pub mod cafes;

//! Circles - Invitation-based membership for bounded private groups
//!
//! This crate implements the invitation-code lifecycle: members sponsor new
//! members through single-use codes drawn from a finite per-member budget,
//! and circles may cap their total active membership.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

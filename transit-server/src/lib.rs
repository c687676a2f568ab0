//! Multi-operator rail network server.
//!
//! Finds journeys across lines and operators, prices them against an
//! authored fare matrix, and issues single-use tickets with signed QR
//! payloads that gates validate and consume exactly once.

pub mod cache;
pub mod clock;
pub mod domain;
pub mod fares;
pub mod network;
pub mod planner;
pub mod service;
pub mod snapshot;
pub mod tickets;
pub mod web;

#![no_std]

// Shared logic for the transit alert controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing abstractions the other crates can adopt.

pub mod actuator;
pub mod alerts;
pub mod config;
pub mod controller;
pub mod protocol;
pub mod sequencer;
pub mod telemetry;
pub mod time;

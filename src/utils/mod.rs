// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Utility modules
//!
//! Common utilities for the merlin CLI.

pub mod colors;

pub use colors::*;

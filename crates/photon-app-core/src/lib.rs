// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for photon tools (config stores, prefs).
//! Keeps the CLI thin; nothing here touches the file format itself.

pub mod config;
pub mod fs;
pub mod memory;
pub mod prefs;

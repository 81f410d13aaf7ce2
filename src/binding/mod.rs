// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Interface bindings: associating live listeners with security realms.
//!
//! A binding owns the swap/revert protocol for one management interface.
//! Realms live in a shared [`RealmRegistry`]; a binding references them
//! by name at bind time and holds the activated realm for the handshake
//! path to snapshot.

mod interface;
mod registry;

pub use interface::{ActiveRealm, BindingDescription, InterfaceBinding};
pub use registry::RealmRegistry;

// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Administrative provisioning of realms and interface bindings.

mod service;

pub use service::RealmProvisioningService;

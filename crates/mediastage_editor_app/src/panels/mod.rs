// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor panel implementations.

mod inspector;

pub use inspector::InspectorPanel;

// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All functions accept `&Database` and go through the
//! single-writer connection.

pub mod campaigns;
pub mod events;
pub mod messages;
pub mod prefs;

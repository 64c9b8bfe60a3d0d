// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Request/response types for the Stratus gateway API

mod auth;
mod catalog;
mod instance;
mod limits;
mod portforward;

pub use auth::*;
pub use catalog::*;
pub use instance::*;
pub use limits::*;
pub use portforward::*;

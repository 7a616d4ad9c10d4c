// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! Inbound HTTP surface (§4.9, §6): the Alchemy webhook ingester, the
//! paginated per-author status API, and a liveness/store health probe.

mod health;
mod router;
mod signature;
mod state;
mod status;
mod webhook;

pub use router::build_router;
pub use state::AppState;

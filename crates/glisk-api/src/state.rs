// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use glisk_store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub webhook_secret: String,
    pub contract_address: String,
    pub default_author_wallet: String,
}

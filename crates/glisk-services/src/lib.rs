// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! HTTP clients for the two external services in the generation
//! pipeline: text-to-image generation and content-addressed pinning,
//! plus the metadata record builder and shared error classification.

mod error;
mod image_client;
mod ipfs_client;
mod metadata;
mod prompt;

pub use error::ServiceError;
pub use image_client::ImageClient;
pub use ipfs_client::PinningClient;
pub use metadata::build_metadata;
pub use prompt::validate_prompt;

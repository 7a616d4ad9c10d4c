// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

//! The three stage workers (image generation, content upload, reveal)
//! and the supervisor that hosts them with auto-restart.

mod image_worker;
mod reveal_worker;
mod supervisor;
mod upload_worker;

pub use image_worker::ImageGenerationWorker;
pub use reveal_worker::RevealWorker;
pub use supervisor::Supervisor;
pub use upload_worker::ContentUploadWorker;

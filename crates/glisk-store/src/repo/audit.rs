// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use glisk_types::schema::{image_generation_jobs, ipfs_upload_records};
use glisk_types::{NewImageGenerationJob, NewIpfsUploadRecord};

use crate::error::StoreError;

pub struct AuditRepo;

impl AuditRepo {
    pub fn record_image_job(
        conn: &mut PgConnection,
        job: &NewImageGenerationJob,
    ) -> Result<(), StoreError> {
        diesel::insert_into(image_generation_jobs::table)
            .values(job)
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }

    pub fn record_upload(
        conn: &mut PgConnection,
        record: &NewIpfsUploadRecord,
    ) -> Result<(), StoreError> {
        diesel::insert_into(ipfs_upload_records::table)
            .values(record)
            .execute(conn)
            .map(|_| ())
            .map_err(StoreError::from)
    }
}

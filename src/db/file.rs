use anyhow::{anyhow, ensure, Context as _, Result};
use crc::{Crc, CRC_32_BZIP2};
use std::path::Path;

use super::{crypto::DbCipher, database::DatabaseV1, Database};

fn crc() -> Crc<u32> {
    Crc::<u32>::new(&CRC_32_BZIP2)
}

/// Returns Ok(None) if the db file doesn't exist yet
pub async fn load(path: &Path, cipher: &DbCipher) -> Result<Option<DatabaseV1>> {
    log::info!("Loading database...");
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }

    let content_ciphertext = tokio::fs::read(path).await?;
    let content_compressed = cipher.decrypt(&content_ciphertext)?;
    let content_plaintext =
        zstd::decode_all(content_compressed.as_slice()).context("Failed to decompress database")?;
    let crc = crc();
    let (parsed, remaining): (Database, &[u8]) =
        postcard::take_from_bytes_crc32(&content_plaintext, crc.digest())
            .context("Failed to deserialize database")?;
    ensure!(remaining.is_empty(), "Database file had extra bytes");
    let Database::V1(database) = parsed;

    log::info!("Loading database...done");
    Ok(Some(database))
}

pub async fn save(db: DatabaseV1, path: &Path, cipher: &DbCipher) -> Result<()> {
    log::info!("Saving database...");

    let crc = crc();
    let content_plaintext = postcard::to_stdvec_crc32(&Database::V1(db), crc.digest())?;
    let content_compressed =
        zstd::bulk::compress(&content_plaintext, zstd::DEFAULT_COMPRESSION_LEVEL)?;
    let content_ciphertext = cipher.encrypt(&content_compressed)?;

    // Write to a temporary file first so a failed write doesn't destroy the existing database
    let filename = path
        .file_name()
        .ok_or_else(|| anyhow!("Path has no filename"))?
        .to_str()
        .ok_or_else(|| anyhow!("Filename isn't valid utf-8"))?;
    let tmppath = path.with_file_name(format!("{filename}.tmp"));
    tokio::fs::write(&tmppath, content_ciphertext).await?;
    tokio::fs::rename(&tmppath, path).await?;

    log::info!("Saving database...done");
    Ok(())
}

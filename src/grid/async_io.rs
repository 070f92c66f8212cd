// src/grid/async_io.rs
use crate::config::IpwConfig;
use crate::error::{IpwError, Result};
use crate::grid::{check_before_read, interval_from_name, Grid};
use crate::types::FileType;
use bytes::Bytes;
use std::path::Path;
use tokio::task;

impl Grid {
    /// Read and parse the image at `path` without blocking the runtime.
    ///
    /// The file is read with `tokio::fs`; header parsing runs on the blocking
    /// pool. Pixel decoding stays lazy as with [`Grid::open`].
    pub async fn open_async(
        path: impl AsRef<Path>,
        file_type: FileType,
        config: &IpwConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_before_read(&path, file_type, config)?;

        let bytes = Bytes::from(tokio::fs::read(&path).await?);
        let parse_config = config.clone();
        let mut grid = task::spawn_blocking(move || Grid::from_bytes(bytes, file_type, &parse_config))
            .await
            .map_err(|e| IpwError::TaskFailed(e.to_string()))??;

        grid.interval = interval_from_name(&path, config);
        Ok(grid)
    }

    /// Serialize on the blocking pool and write to `path` with `tokio::fs`
    pub async fn write_to_async(&self, path: impl AsRef<Path>) -> Result<()> {
        let grid = self.clone();
        let bytes = task::spawn_blocking(move || grid.write())
            .await
            .map_err(|e| IpwError::TaskFailed(e.to_string()))??;

        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}

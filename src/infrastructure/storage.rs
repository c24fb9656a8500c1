// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::product::Store;
use crate::utils::url_utils::snapshot_key;

/// 调试快照的本地存储
///
/// 文件布局为 `<base>/<store>/<sha256(url) 前16位>.html`，
/// 可以直接交给快照会话离线回放
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 页面快照的完整路径
    pub fn path_for(&self, store: Store, url: &str) -> PathBuf {
        self.base_path
            .join(store.id())
            .join(format!("{}.html", snapshot_key(url)))
    }

    /// 保存页面HTML，返回写入的路径
    pub async fn save(&self, store: Store, url: &str, html: &str) -> std::io::Result<PathBuf> {
        let full_path = self.path_for(store, url);

        // 确保目录存在
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(html.as_bytes()).await?;
        file.flush().await?;

        Ok(full_path)
    }
}

//! 产物存储 - 基础设施层
//!
//! 持有磁盘目录布局，只暴露"查询 / 认领 / 发布"能力：
//! - 产物一旦发布就不再覆盖
//! - 发布通过临时文件 + 不覆盖的原子改名完成，读者看不到半个文件
//! - 并发 worker 通过锁文件上的独占文件锁认领同一个产物，只有一个能拿到；
//!   进程退出时锁由操作系统释放，遗留的锁文件不会挡住下一次运行

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{ArtifactKind, PaperId};

/// 产物存储
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    papers_dir: PathBuf,
    summaries_dir: PathBuf,
    tables_dir: PathBuf,
}

impl ArtifactStore {
    /// 按配置创建
    pub fn new(config: &Config) -> Self {
        Self::with_dirs(
            config.papers_dir.clone(),
            config.summaries_dir.clone(),
            config.tables_dir.clone(),
        )
    }

    /// 使用自定义目录创建
    pub fn with_dirs(
        papers_dir: impl Into<PathBuf>,
        summaries_dir: impl Into<PathBuf>,
        tables_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            papers_dir: papers_dir.into(),
            summaries_dir: summaries_dir.into(),
            tables_dir: tables_dir.into(),
        }
    }

    /// 产物所在目录
    pub fn dir(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Pdf => &self.papers_dir,
            ArtifactKind::Summary => &self.summaries_dir,
            ArtifactKind::Table => &self.tables_dir,
        }
    }

    /// 产物完整路径
    pub fn path(&self, kind: ArtifactKind, id: &PaperId) -> PathBuf {
        self.dir(kind).join(kind.file_name(id))
    }

    pub fn exists(&self, kind: ArtifactKind, id: &PaperId) -> bool {
        self.path(kind, id).is_file()
    }

    /// 创建产物目录（不存在时）
    pub fn ensure_dir(&self, kind: ArtifactKind) -> io::Result<()> {
        fs::create_dir_all(self.dir(kind))
    }

    /// 认领一个产物
    ///
    /// 返回 `None` 表示产物已存在或另一个 worker 正在生成。
    /// 认领在 [`ArtifactClaim`] 被 drop 时释放。
    pub fn claim(&self, kind: ArtifactKind, id: &PaperId) -> io::Result<Option<ArtifactClaim>> {
        if self.exists(kind, id) {
            return Ok(None);
        }
        self.ensure_dir(kind)?;

        let lock_path = self.lock_path(kind, id);
        let Some(claim) = try_lock(&lock_path)? else {
            debug!("{} 已被其他 worker 认领", lock_path.display());
            return Ok(None);
        };

        // 上一个持有者可能在检查之后刚刚发布完成
        if self.exists(kind, id) {
            return Ok(None);
        }
        Ok(Some(claim))
    }

    /// 在产物目录中创建临时文件，用于流式写入
    pub fn staging(&self, kind: ArtifactKind) -> io::Result<NamedTempFile> {
        self.ensure_dir(kind)?;
        tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(self.dir(kind))
    }

    /// 把临时文件发布为正式产物
    ///
    /// 目标已存在时不覆盖，返回 `false`。
    pub fn commit(
        &self,
        staged: NamedTempFile,
        kind: ArtifactKind,
        id: &PaperId,
    ) -> io::Result<bool> {
        let target = self.path(kind, id);
        match staged.persist_noclobber(&target) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} 已存在，放弃本次写入", target.display());
                Ok(false)
            }
            Err(e) => Err(e.error),
        }
    }

    /// 写入完整内容并发布
    pub fn publish_bytes(
        &self,
        kind: ArtifactKind,
        id: &PaperId,
        bytes: &[u8],
    ) -> io::Result<bool> {
        let mut staged = self.staging(kind)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        self.commit(staged, kind, id)
    }

    /// 把外部文件（如浏览器下载结果）移入产物目录并删除原文件
    pub fn publish_file(
        &self,
        kind: ArtifactKind,
        id: &PaperId,
        source: &Path,
    ) -> io::Result<bool> {
        let mut staged = self.staging(kind)?;
        let mut input = fs::File::open(source)?;
        io::copy(&mut input, staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        let published = self.commit(staged, kind, id)?;
        fs::remove_file(source)?;
        Ok(published)
    }

    /// 列出所有已下载的 PDF，按论文 ID 排序
    pub fn list_pdfs(&self) -> io::Result<Vec<(PaperId, PathBuf)>> {
        let dir = self.dir(ArtifactKind::Pdf);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pdfs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_pdf = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf || !path.is_file() {
                continue;
            }
            if let Some(id) = PaperId::from_pdf_path(&path) {
                pdfs.push((id, path));
            }
        }
        pdfs.sort();
        Ok(pdfs)
    }

    fn lock_path(&self, kind: ArtifactKind, id: &PaperId) -> PathBuf {
        self.dir(kind).join(format!(".{}.lock", kind.file_name(id)))
    }
}

/// 产物认领凭证
///
/// 持有锁文件上的独占锁，drop 时删除锁文件并解锁。
#[derive(Debug)]
pub struct ArtifactClaim {
    lock_path: PathBuf,
    _file: fs::File,
}

impl Drop for ArtifactClaim {
    fn drop(&mut self) {
        // 先删文件再随 `_file` 一起解锁
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!("无法释放锁文件 {}: {}", self.lock_path.display(), e);
        }
    }
}

/// 对锁文件加独占锁，已被其他持有者锁住时返回 `None`
fn try_lock(lock_path: &Path) -> io::Result<Option<ArtifactClaim>> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    match file.try_lock_exclusive() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
        Err(e) => return Err(e),
    }

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(Some(ArtifactClaim {
        lock_path: lock_path.to_path_buf(),
        _file: file,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::with_dirs(dir.join("papers"), dir.join("summaries"), dir.join("tables"))
    }

    fn id(raw: &str) -> PaperId {
        PaperId::new(raw).unwrap()
    }

    #[test]
    fn test_claim_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let first = store.claim(ArtifactKind::Summary, &id("1")).unwrap();
        assert!(first.is_some());
        assert!(store.claim(ArtifactKind::Summary, &id("1")).unwrap().is_none());

        drop(first);
        assert!(store.claim(ArtifactKind::Summary, &id("1")).unwrap().is_some());
    }

    #[test]
    fn test_orphan_lock_file_does_not_block_claim() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dir(ArtifactKind::Summary).unwrap();
        let lock = store.lock_path(ArtifactKind::Summary, &id("5"));
        fs::write(&lock, "99999\n").unwrap();

        let claim = store.claim(ArtifactKind::Summary, &id("5")).unwrap();
        assert!(claim.is_some());
        assert_eq!(
            fs::read_to_string(&lock).unwrap().trim(),
            std::process::id().to_string()
        );

        drop(claim);
        assert!(!lock.exists());
    }

    #[test]
    fn test_claim_refused_when_artifact_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.publish_bytes(ArtifactKind::Summary, &id("2"), b"done").unwrap());

        assert!(store.claim(ArtifactKind::Summary, &id("2")).unwrap().is_none());
    }

    #[test]
    fn test_publish_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.publish_bytes(ArtifactKind::Summary, &id("3"), b"first").unwrap());
        assert!(!store.publish_bytes(ArtifactKind::Summary, &id("3"), b"second").unwrap());

        let content = fs::read_to_string(store.path(ArtifactKind::Summary, &id("3"))).unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_publish_file_moves_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let source = dir.path().join("download.pdf");
        fs::write(&source, b"%PDF-1.5").unwrap();

        assert!(store.publish_file(ArtifactKind::Pdf, &id("4"), &source).unwrap());
        assert!(!source.exists());
        assert!(store.exists(ArtifactKind::Pdf, &id("4")));
    }

    #[test]
    fn test_list_pdfs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dir(ArtifactKind::Pdf).unwrap();
        let papers = store.dir(ArtifactKind::Pdf).to_path_buf();
        fs::write(papers.join("200.pdf"), b"x").unwrap();
        fs::write(papers.join("100.pdf"), b"x").unwrap();
        fs::write(papers.join("notes.txt"), b"x").unwrap();

        let ids: Vec<String> = store
            .list_pdfs()
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["100", "200"]);
    }

    #[test]
    fn test_list_pdfs_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("nowhere"));
        assert!(store.list_pdfs().unwrap().is_empty());
    }
}

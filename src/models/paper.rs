//! 论文标识与产物命名

use std::fmt::{self, Display};
use std::path::Path;

use url::Url;

use crate::error::FetchError;

/// 论文 ID
///
/// 由来源 URL 的最后一段路径得到，是 PDF、摘要、结果表三类产物的连接键。
/// 只包含 `[A-Za-z0-9._-]`，可以直接作为文件名。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaperId(String);

impl PaperId {
    /// 从来源 URL 解析论文 ID
    ///
    /// `https://pubmed.ncbi.nlm.nih.gov/12345/` 和 `.../12345` 都得到 `12345`，
    /// `.../files/12345.pdf` 也得到 `12345`。
    pub fn from_url(source_url: &str) -> Result<Self, FetchError> {
        let invalid = || FetchError::InvalidUrl {
            url: source_url.to_string(),
        };

        let parsed = Url::parse(source_url.trim()).map_err(|_| invalid())?;
        let segment = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(invalid)?;

        let segment = strip_pdf_suffix(segment);
        Self::new(segment).ok_or_else(invalid)
    }

    /// 从 PDF 路径解析论文 ID（取文件名主干）
    pub fn from_pdf_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(Self::new)
    }

    /// 构造论文 ID，非法字符替换为 `_`
    ///
    /// 空串或只由 `.` 组成时返回 `None`。
    pub fn new(raw: &str) -> Option<Self> {
        let sanitized: String = raw
            .trim()
            .chars()
            .map(|c| if is_safe_char(c) { c } else { '_' })
            .collect();

        if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
            None
        } else {
            Some(Self(sanitized))
        }
    }

    /// 严格校验外部传入的 ID，不做替换
    pub fn parse_strict(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(is_safe_char) {
            return None;
        }
        Self::new(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PaperId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn strip_pdf_suffix(segment: &str) -> &str {
    let len = segment.len();
    if len > 4 && segment[len - 4..].eq_ignore_ascii_case(".pdf") {
        &segment[..len - 4]
    } else {
        segment
    }
}

/// 产物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// `<id>.pdf`
    Pdf,
    /// `<id>_summary.txt`
    Summary,
    /// `<id>_results_table.csv`
    Table,
}

impl ArtifactKind {
    /// 产物文件名
    pub fn file_name(self, id: &PaperId) -> String {
        match self {
            ArtifactKind::Pdf => format!("{}.pdf", id),
            ArtifactKind::Summary => format!("{}_summary.txt", id),
            ArtifactKind::Table => format!("{}_results_table.csv", id),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "PDF",
            ArtifactKind::Summary => "摘要",
            ArtifactKind::Table => "结果表",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_id_from_trailing_slash_url() {
        let id = PaperId::from_url("https://pubmed.ncbi.nlm.nih.gov/12345/").unwrap();
        assert_eq!(id.as_str(), "12345");
    }

    #[test]
    fn test_id_from_url_without_trailing_slash() {
        let id = PaperId::from_url("https://example.org/12345").unwrap();
        assert_eq!(id.as_str(), "12345");
    }

    #[test]
    fn test_id_from_direct_pdf_url() {
        let id = PaperId::from_url("https://example.org/files/PMC777.PDF").unwrap();
        assert_eq!(id.as_str(), "PMC777");
    }

    #[test]
    fn test_id_ignores_query_string() {
        let id = PaperId::from_url("https://example.org/abc/98765/?from=search").unwrap();
        assert_eq!(id.as_str(), "98765");
    }

    #[test]
    fn test_id_rejects_url_without_path() {
        assert!(PaperId::from_url("https://example.org/").is_err());
        assert!(PaperId::from_url("not a url").is_err());
    }

    #[test]
    fn test_id_is_filesystem_safe() {
        let id = PaperId::new("a b/c:d").unwrap();
        assert_eq!(id.as_str(), "a_b_c_d");
        assert!(PaperId::new("..").is_none());
        assert!(PaperId::new("   ").is_none());
    }

    #[test]
    fn test_strict_parse_rejects_traversal() {
        assert!(PaperId::parse_strict("../etc").is_none());
        assert!(PaperId::parse_strict("..").is_none());
        assert_eq!(PaperId::parse_strict("12345").unwrap().as_str(), "12345");
    }

    #[test]
    fn test_id_from_pdf_path() {
        let id = PaperId::from_pdf_path(&PathBuf::from("data/papers/12345.pdf")).unwrap();
        assert_eq!(id.as_str(), "12345");
    }

    #[test]
    fn test_artifact_file_names() {
        let id = PaperId::new("12345").unwrap();
        assert_eq!(ArtifactKind::Pdf.file_name(&id), "12345.pdf");
        assert_eq!(ArtifactKind::Summary.file_name(&id), "12345_summary.txt");
        assert_eq!(ArtifactKind::Table.file_name(&id), "12345_results_table.csv");
    }
}

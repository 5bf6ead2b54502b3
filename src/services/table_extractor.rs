//! 结果表提取服务 - 业务能力层
//!
//! 在页面文本中用空白分隔规则识别候选表格，按关键词挑出"结果表"。
//! 识别规则：
//! - 按"连续 2 个以上空格或制表符"切分后至少得到 2 个单元格的行是表格行
//! - 至少 2 行连续的表格行组成一张候选表
//! - 任一单元格（小写后）包含结果类关键词的候选表是结果表
//! - 结果表中行数最多者胜出，行数相同时取先出现的

use std::fs::File;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use super::text_extractor::extract_page_texts;
use crate::error::{Result, TableError};

/// 二维表格（行 × 单元格）
pub type ResultsTable = Vec<Vec<String>>;

/// 结果表关键词
pub const RESULT_KEYWORDS: [&str; 6] = [
    "results", "outcome", "findings", "analysis", "efficacy", "impact",
];

/// 候选表最少行数
pub const MIN_TABLE_ROWS: usize = 2;

/// 单元格分隔：2 个以上空白且包含空格/制表符，或任意制表符
const CELL_SEPARATOR: &str = r"[ \t]*\t[ \t]*| {2,}";

/// 候选表格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTable {
    /// 所在页码
    pub page: u32,
    pub rows: ResultsTable,
}

/// 单元格是否包含结果类关键词
pub fn is_results_table(rows: &[Vec<String>]) -> bool {
    rows.iter().flatten().any(|cell| {
        let cell = cell.to_lowercase();
        RESULT_KEYWORDS.iter().any(|keyword| cell.contains(keyword))
    })
}

/// 在候选表中选出结果表
///
/// 没有任何候选表被标记为结果表时返回 `None`，不回退到其他候选表。
pub fn select_results_table(candidates: &[CandidateTable]) -> Option<&CandidateTable> {
    let mut best: Option<&CandidateTable> = None;
    for candidate in candidates.iter().filter(|c| is_results_table(&c.rows)) {
        match best {
            Some(current) if current.rows.len() >= candidate.rows.len() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// 以无表头 CSV 写出表格，保持行列顺序
pub fn write_csv<W: std::io::Write>(writer: W, table: &[Vec<String>]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    for row in table {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 读取无表头 CSV
pub fn read_csv(path: &Path) -> Result<ResultsTable> {
    if !path.is_file() {
        return Err(TableError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut table = Vec::new();
    for record in reader.records() {
        table.push(record?.iter().map(str::to_string).collect());
    }
    Ok(table)
}

/// 结果表提取服务
#[derive(Debug, Clone)]
pub struct TableExtractor {
    cell_separator: Regex,
}

impl TableExtractor {
    /// 创建新的结果表提取服务
    pub fn new() -> Result<Self> {
        let cell_separator = Regex::new(CELL_SEPARATOR).map_err(TableError::Pattern)?;
        Ok(Self { cell_separator })
    }

    /// 把一行切成单元格（去掉首尾空白和空单元格）
    pub fn split_cells(&self, line: &str) -> Vec<String> {
        self.cell_separator
            .split(line.trim())
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// 在一页文本中识别候选表格
    pub fn detect_tables(&self, page: u32, text: &str) -> Vec<CandidateTable> {
        let mut tables = Vec::new();
        let mut run: ResultsTable = Vec::new();

        for line in text.lines() {
            let cells = self.split_cells(line);
            if cells.len() >= 2 {
                run.push(cells);
                continue;
            }
            if run.len() >= MIN_TABLE_ROWS {
                tables.push(CandidateTable {
                    page,
                    rows: std::mem::take(&mut run),
                });
            } else {
                run.clear();
            }
        }
        if run.len() >= MIN_TABLE_ROWS {
            tables.push(CandidateTable { page, rows: run });
        }

        tables
    }

    /// 收集所有页面的候选表格，保持出现顺序
    pub fn collect_candidates(&self, pages: &[(u32, String)]) -> Vec<CandidateTable> {
        pages
            .iter()
            .flat_map(|(page, text)| self.detect_tables(*page, text))
            .collect()
    }

    /// 从 PDF 中提取最可能的结果表
    ///
    /// # 返回
    /// 没有被标记为结果表的候选时返回 `Ok(None)`
    pub fn extract_results_table(&self, pdf_path: &Path) -> Result<Option<ResultsTable>> {
        let pages = extract_page_texts(pdf_path).map_err(|source| TableError::Pdf {
            path: pdf_path.to_path_buf(),
            source,
        })?;

        let candidates = self.collect_candidates(&pages);
        debug!("{}: {} 个候选表格", pdf_path.display(), candidates.len());

        Ok(select_results_table(&candidates).map(|table| table.rows.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> TableExtractor {
        TableExtractor::new().unwrap()
    }

    fn table(page: u32, rows: &[&[&str]]) -> CandidateTable {
        CandidateTable {
            page,
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_split_cells_on_wide_gaps_and_tabs() {
        let ex = extractor();
        assert_eq!(ex.split_cells("Group A   12   0.03"), vec!["Group A", "12", "0.03"]);
        assert_eq!(ex.split_cells("x\ty \t z"), vec!["x", "y", "z"]);
        assert_eq!(ex.split_cells("single spaced sentence"), vec!["single spaced sentence"]);
    }

    #[test]
    fn test_detect_contiguous_runs() {
        let text = "Intro paragraph here.\n\
                    Arm   N   Rate\n\
                    Drug   40   0.61\n\
                    Placebo   41   0.22\n\
                    A sentence in between.\n\
                    Lone   row\n\
                    End.";
        let tables = extractor().detect_tables(3, text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 3);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[0].rows[1], vec!["Drug", "40", "0.61"]);
    }

    #[test]
    fn test_table_at_end_of_page_is_kept() {
        let tables = extractor().detect_tables(1, "Heading\nA   1\nB   2");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn test_group_rows_without_keywords_are_not_results() {
        let tables = extractor().detect_tables(1, "Group A   12   0.03\nGroup A   12   0.03");
        assert_eq!(tables.len(), 1);
        assert!(!is_results_table(&tables[0].rows));
        assert!(select_results_table(&tables).is_none());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_substring() {
        let t = table(1, &[&["Primary OUTCOMES", "n"], &["a", "b"]]);
        assert!(is_results_table(&t.rows));
        let t = table(1, &[&["Subgroup Analysis", "n"], &["a", "b"]]);
        assert!(is_results_table(&t.rows));
    }

    #[test]
    fn test_selects_largest_flagged_table() {
        let candidates = vec![
            table(1, &[&["Results", "1"], &["a", "b"]]),
            table(1, &[&["no", "keywords"], &["a", "b"], &["c", "d"], &["e", "f"]]),
            table(2, &[&["Efficacy", "1"], &["a", "b"], &["c", "d"]]),
        ];
        let best = select_results_table(&candidates).unwrap();
        assert_eq!(best.rows[0][0], "Efficacy");
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let candidates = vec![
            table(1, &[&["Impact", "1"], &["a", "b"]]),
            table(2, &[&["Findings", "2"], &["c", "d"]]),
        ];
        let best = select_results_table(&candidates).unwrap();
        assert_eq!(best.page, 1);
        assert_eq!(best.rows[0][0], "Impact");
    }

    #[test]
    fn test_csv_round_trip_preserves_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("12345_results_table.csv");
        let written: ResultsTable = vec![
            vec!["Outcome".into(), "HR, 95% CI".into(), "p".into()],
            vec!["Death".into(), "0.8 \"adj\"".into()],
            vec!["".into(), "x".into(), "y".into()],
        ];

        write_csv(File::create(&path).unwrap(), &written).unwrap();
        assert_eq!(read_csv(&path).unwrap(), written);
    }

    #[test]
    fn test_read_missing_csv() {
        let err = read_csv(Path::new("/nope/1_results_table.csv")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Table(TableError::NotFound { .. })
        ));
    }
}

//! 集成测试共用的工具：合成 PDF、测试用摘要模型、临时目录配置

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use pubmed_analyzer::{Config, SummarizationModel, SummaryRequest};

/// 生成一个只含文本的 PDF，每个字符串占一行
pub fn write_text_pdf(path: &Path, pages: &[Vec<&str>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 800 - 14 * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10i64.into()]));
            operations.push(Operation::new("Td", vec![40i64.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// 一段足够长的正文（每行 10 个词）
pub fn prose_lines(lines: usize) -> Vec<String> {
    (0..lines)
        .map(|i| format!("line{} the trial enrolled adults with stable disease and followed", i))
        .collect()
}

/// 摘要为"S<块序号>"的测试模型，记录调用次数
#[derive(Default)]
pub struct CountingModel {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SummarizationModel for CountingModel {
    fn name(&self) -> &str {
        "counting"
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> pubmed_analyzer::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(request.text.split_whitespace().count() <= 500);
        Ok(format!("S{}", n))
    }
}

/// 所有目录都在 `root` 下的配置
pub fn temp_config(root: &Path) -> Config {
    Config {
        urls_file: root.join("input_urls.txt"),
        papers_dir: root.join("papers"),
        summaries_dir: root.join("summaries"),
        tables_dir: root.join("tables"),
        logs_dir: root.join("logs"),
        downloads_dir: root.join("downloads"),
        ..Config::default()
    }
}

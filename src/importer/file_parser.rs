// ==========================================
// 品质保证监控看板 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv, 必须含表头) / JSON (.json)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 原始记录：字段名 → 值（保持列顺序）
pub type RawRecord = Map<String, Value>;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为原始记录列表
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意 reader 解析（上传内容、文件均可）
    ///
    /// - 表头原样保留（远程模型按列名取特征），仅去掉 UTF-8 BOM
    /// - 单元格值去除首尾空白
    /// - 空行与全空白行跳过
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, h)| {
                if idx == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = RawRecord::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), Value::String(value.trim().to_string()));
                }
            }

            // 跳过完全空白的行
            let all_blank = row_map
                .values()
                .all(|v| v.as_str().map(str::is_empty).unwrap_or(false));
            if all_blank {
                continue;
            }

            records.push(row_map);
        }

        tracing::debug!("CSV 解析完成: {} 行", records.len());
        Ok(records)
    }

    /// 从字符串解析
    pub fn parse_str(&self, content: &str) -> ImportResult<Vec<RawRecord>> {
        self.parse_reader(content.as_bytes())
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawRecord>> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        self.parse_reader(file)
    }
}

// ==========================================
// JSON 读取
// ==========================================
pub struct JsonReader;

impl JsonReader {
    pub fn parse_str(&self, content: &str) -> ImportResult<Value> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn read_file(&self, file_path: &Path) -> ImportResult<Value> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let content = std::fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================

/// 解析结果
#[derive(Debug, Clone)]
pub enum ParsedFile {
    Csv(Vec<RawRecord>),
    Json(Value),
}

pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ParsedFile> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_records(path).map(ParsedFile::Csv),
            "json" => JsonReader.read_file(path).map(ParsedFile::Json),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

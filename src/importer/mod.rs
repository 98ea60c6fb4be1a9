// ==========================================
// 品质保证监控看板 - 导入层
// ==========================================
// 职责: 上传文件解析、字段别名、记录归一化
// 支持: CSV, JSON（数组 / data / rows / 树模型 dump）
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod normalizer;
pub mod tree_model;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldAlias;
pub use file_parser::{CsvParser, FileParser, JsonReader, ParsedFile, RawRecord, UniversalFileParser};
pub use normalizer::{ArrayShape, NormalizedPayload, RecordNormalizer};

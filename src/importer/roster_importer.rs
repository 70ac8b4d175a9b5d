// ==========================================
// 礼物交换抽签系统 - 名单导入器
// ==========================================
// 流程: 文件解析 → 表头识别 → 行级校验 → 去重 → 事务落库
// 表头规则: 第一条非空行命名了全部必填列（first_name / email / family_unit|group）
//           才视为表头并按列名映射；否则整份文件按固定列序
//           first_name,last_name,email,family_unit 读取，第一行即数据
// ==========================================

use crate::domain::{GroupTag, NewParticipant};
use crate::importer::error::ImportError;
use crate::importer::file_parser::{parser_for, RawRow};
use crate::repository::ParticipantRepository;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

// ==========================================
// 列映射
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub first_name: usize,
    pub last_name: Option<usize>,
    pub email: usize,
    pub group: usize,
}

impl ColumnMap {
    /// 无表头时的固定列序
    pub const FIXED: ColumnMap = ColumnMap {
        first_name: 0,
        last_name: Some(1),
        email: 2,
        group: 3,
    };

    /// 尝试把一行识别为表头
    pub fn from_header(cells: &[String]) -> Option<ColumnMap> {
        let names: Vec<String> = cells.iter().map(|c| c.trim().to_lowercase()).collect();
        let find = |candidates: &[&str]| names.iter().position(|n| candidates.contains(&n.as_str()));

        Some(ColumnMap {
            first_name: find(&["first_name"])?,
            last_name: find(&["last_name"]),
            email: find(&["email"])?,
            group: find(&["family_unit", "group"])?,
        })
    }
}

// ==========================================
// 行级结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    Inserted,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    MissingRequiredField,
    InvalidEmail,
    InvalidGroup,
    DuplicateEmail,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::MissingRequiredField => "缺少必填字段 (first_name / email / family_unit)",
            SkipReason::InvalidEmail => "邮箱格式无效",
            SkipReason::InvalidGroup => "family_unit 必须为整数",
            SkipReason::DuplicateEmail => "邮箱已存在，跳过",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub line: usize,
    pub name: String,
    pub email: String,
    pub status: RowStatus,
}

// ==========================================
// 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub header_detected: bool,
    pub processed: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub rows: Vec<RowOutcome>,
}

// ==========================================
// 邮箱格式校验
// ==========================================
fn email_pattern() -> Option<&'static Regex> {
    static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(email))
}

// ==========================================
// RosterImporter - 名单导入器
// ==========================================
pub struct RosterImporter {
    repo: Arc<ParticipantRepository>,
}

impl RosterImporter {
    pub fn new(repo: Arc<ParticipantRepository>) -> Self {
        Self { repo }
    }

    /// 从文件导入（.csv / .xlsx）
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary, ImportError> {
        let path = path.as_ref();
        let parser = parser_for(path)?;
        let rows = parser.parse_rows(path)?;

        info!(file = %path.display(), rows = rows.len(), "名单文件已解析");
        self.import_rows(rows)
    }

    /// 导入已解析的原始行
    ///
    /// # 红线
    /// - 行级问题只跳过该行，不中断整批
    /// - 合法行在同一事务内落库
    pub fn import_rows(&self, rows: Vec<RawRow>) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();
        let mut known_emails = self.repo.existing_emails()?;

        let mut iter = rows.into_iter().peekable();
        let columns = match iter.peek().and_then(|(_, cells)| ColumnMap::from_header(cells)) {
            Some(map) => {
                iter.next();
                summary.header_detected = true;
                map
            }
            None => ColumnMap::FIXED,
        };

        let mut pending: Vec<NewParticipant> = Vec::new();

        for (line, cells) in iter {
            summary.processed += 1;

            let cell = |idx: usize| cells.get(idx).map(|s| s.trim().to_string()).unwrap_or_default();
            let first_name = cell(columns.first_name);
            let last_name = columns.last_name.map(cell).unwrap_or_default();
            let email = cell(columns.email);
            let group_raw = cell(columns.group);
            let name = format!("{} {}", first_name, last_name).trim().to_string();

            let verdict = validate_row(&first_name, &email, &group_raw, &known_emails);
            match verdict {
                Ok(group) => {
                    known_emails.insert(email.to_lowercase());
                    summary.rows.push(RowOutcome {
                        line,
                        name,
                        email: email.clone(),
                        status: RowStatus::Inserted,
                    });
                    pending.push(NewParticipant {
                        first_name,
                        last_name,
                        email,
                        group,
                    });
                }
                Err(reason) => {
                    warn!(line, email = %email, reason = reason.describe(), "名单行已跳过");
                    summary.skipped += 1;
                    summary.rows.push(RowOutcome {
                        line,
                        name,
                        email,
                        status: RowStatus::Skipped(reason),
                    });
                }
            }
        }

        self.repo.batch_insert(&pending)?;
        summary.inserted = pending.len();

        info!(
            processed = summary.processed,
            inserted = summary.inserted,
            skipped = summary.skipped,
            header_detected = summary.header_detected,
            "名单导入完成"
        );

        Ok(summary)
    }
}

/// 单行校验，通过时返回分组
fn validate_row(
    first_name: &str,
    email: &str,
    group_raw: &str,
    known_emails: &HashSet<String>,
) -> Result<GroupTag, SkipReason> {
    if first_name.is_empty() || email.is_empty() || group_raw.is_empty() {
        return Err(SkipReason::MissingRequiredField);
    }
    if !is_valid_email(email) {
        return Err(SkipReason::InvalidEmail);
    }
    if !group_raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(SkipReason::InvalidGroup);
    }
    let group = group_raw
        .parse::<i64>()
        .map_err(|_| SkipReason::InvalidGroup)?;
    if known_emails.contains(&email.to_lowercase()) {
        return Err(SkipReason::DuplicateEmail);
    }
    Ok(GroupTag(group))
}

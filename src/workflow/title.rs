//! 弹窗文本解析

use crate::models::UNKNOWN_ASSIGNMENT;

const TITLE_PREFIX: &str = "for ";
const POSSESSIVE_DELIMITER: &str = "'s ";
const COMPLETED_DATE_PREFIX: &str = "Completed date: ";

/// 把弹窗标题拆成 (学生名, 作业名)
///
/// 标题形如 `for Alice's Caesar Cipher`；没有 `'s ` 分隔符时整段作为学生名，
/// 作业名取 `Unknown assignment name`。
pub fn split_modal_title(raw: &str) -> (String, String) {
    let title = raw.trim();
    let title = title.strip_prefix(TITLE_PREFIX).unwrap_or(title);

    match title.split_once(POSSESSIVE_DELIMITER) {
        Some((student, assignment)) => (student.trim().to_string(), assignment.trim().to_string()),
        None => (title.trim().to_string(), UNKNOWN_ASSIGNMENT.to_string()),
    }
}

/// 去掉完成日期标签前缀，其余文本原样保留
pub fn strip_completed_date(raw: &str) -> String {
    let text = raw.trim();
    text.strip_prefix(COMPLETED_DATE_PREFIX)
        .unwrap_or(text)
        .trim()
        .to_string()
}

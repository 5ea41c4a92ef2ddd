use serde::{Deserialize, Serialize};

/// 弹窗标题缺少 "'s " 分隔符时使用的作业名
pub const UNKNOWN_ASSIGNMENT: &str = "Unknown assignment name";
/// 弹窗中没有 "Open Project" 链接时使用的项目地址
pub const NO_PROJECT_URL: &str = "No project URL";
/// 没有审阅人认领该学生时使用的颜色
pub const DEFAULT_COLOR: &str = "default_color";

/// 一条已完成的待批改记录
///
/// 字段名与历史快照文件 / 看板保持一致（`name`、`regrade`、`color`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "name")]
    pub student_name: String,
    #[serde(default = "unknown_assignment")]
    pub assignment_name: String,
    #[serde(default)]
    pub completed_date: String,
    #[serde(default = "no_project_url")]
    pub project_url: String,
    #[serde(rename = "regrade", default)]
    pub is_regrade: bool,
    #[serde(rename = "color", default = "default_color")]
    pub color_tag: String,
}

impl Record {
    /// 构建一条未着色的记录
    pub fn new(
        student_name: impl Into<String>,
        assignment_name: impl Into<String>,
        completed_date: impl Into<String>,
        project_url: Option<String>,
        is_regrade: bool,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            assignment_name: assignment_name.into(),
            completed_date: completed_date.into(),
            project_url: project_url.unwrap_or_else(no_project_url),
            is_regrade,
            color_tag: default_color(),
        }
    }

    /// 返回替换了颜色标签的副本
    pub fn with_color(mut self, color_tag: impl Into<String>) -> Self {
        self.color_tag = color_tag.into();
        self
    }

    pub fn has_project_url(&self) -> bool {
        self.project_url != NO_PROJECT_URL
    }
}

fn unknown_assignment() -> String {
    UNKNOWN_ASSIGNMENT.to_string()
}

fn no_project_url() -> String {
    NO_PROJECT_URL.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_project_url_uses_sentinel() {
        let record = Record::new("Alice", "Loops", "Oct 3rd 2024", None, false);
        assert_eq!(record.project_url, NO_PROJECT_URL);
        assert!(!record.has_project_url());
        assert_eq!(record.color_tag, DEFAULT_COLOR);
    }

    #[test]
    fn test_reads_legacy_snapshot_fields() {
        let json = r#"{
            "name": "Bob",
            "assignment_name": "Loops",
            "completed_date": "Oct 3rd 2024, 10:00",
            "project_url": "https://example.test/p/1",
            "regrade": true,
            "color": "red"
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.student_name, "Bob");
        assert!(record.is_regrade);
        assert_eq!(record.color_tag, "red");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "Bob");
        assert_eq!(value["regrade"], true);
    }

    #[test]
    fn test_absent_assignment_defaults_to_sentinel() {
        let record: Record = serde_json::from_str(r#"{"name": "Carol"}"#).unwrap();
        assert_eq!(record.assignment_name, UNKNOWN_ASSIGNMENT);
        assert_eq!(record.color_tag, DEFAULT_COLOR);
    }
}

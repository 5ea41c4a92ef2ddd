use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 审阅人的颜色方案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub mandatory: String,
    pub optional: String,
}

/// 审阅人
///
/// 同一个学生可以出现在零个或多个审阅人名下，名单本身不保证划分。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,
    #[serde(default)]
    pub students: HashSet<String>,
    #[serde(rename = "color")]
    pub color_scheme: ColorScheme,
}

impl Reviewer {
    pub fn owns(&self, student_name: &str) -> bool {
        self.students.contains(student_name)
    }
}

/// 审阅人名单（每次对账都重新读取）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    pub reviewers: Vec<Reviewer>,
}

impl Roster {
    pub fn new(reviewers: Vec<Reviewer>) -> Self {
        Self { reviewers }
    }

    /// 按名字查找审阅人（不区分大小写，取名单中第一个）
    pub fn find_reviewer(&self, name: &str) -> Option<&Reviewer> {
        let wanted = name.to_lowercase();
        self.reviewers.iter().find(|r| r.name.to_lowercase() == wanted)
    }

    /// 认领该学生的第一个审阅人（名单顺序即优先级）
    pub fn owner_of(&self, student_name: &str) -> Option<&Reviewer> {
        self.reviewers.iter().find(|r| r.owns(student_name))
    }

    /// 所有被认领的学生
    pub fn assigned_students(&self) -> HashSet<&str> {
        self.reviewers
            .iter()
            .flat_map(|r| r.students.iter().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty()
    }
}

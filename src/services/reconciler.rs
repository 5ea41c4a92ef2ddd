//! 对账服务 - 业务能力层
//!
//! 把所有快照与审阅人名单做连接，回答"谁该批改什么"和"哪些没人认领"。
//! 每次调用都重新读取快照和名单，不做缓存。

use std::collections::HashSet;

use phf::phf_set;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Record, Roster, RosterProvider, DEFAULT_COLOR};
use crate::services::snapshot_store::SnapshotStore;

/// 查询"未分配"记录时使用的伪审阅人名
pub const UNASSIGNED_REVIEWER: &str = "notassigned";

/// 测试账号，不计入未分配记录
pub const TEST_ACCOUNT: &str = "tester tester";

/// 使用审阅人 `optional` 颜色的选做作业
static OPTIONAL_ASSIGNMENTS: phf::Set<&'static str> = phf_set! {
    "Nested Looping",
    "Aggregate The Log File",
    "21 Sticks",
    "Caesar Cipher",
    "Break The Caesar Cipher",
    "Break The Substitution Cipher",
};

pub fn is_optional_assignment(assignment_name: &str) -> bool {
    OPTIONAL_ASSIGNMENTS.contains(assignment_name)
}

/// 计算记录的颜色标签
///
/// 取名单中第一个认领该学生的审阅人；选做作业用 `optional`，其余用 `mandatory`；
/// 无人认领时为 `default_color`。
pub fn color_for(roster: &Roster, student_name: &str, assignment_name: &str) -> String {
    match roster.owner_of(student_name) {
        Some(reviewer) if is_optional_assignment(assignment_name) => reviewer.color_scheme.optional.clone(),
        Some(reviewer) => reviewer.color_scheme.mandatory.clone(),
        None => DEFAULT_COLOR.to_string(),
    }
}

fn colorize(roster: &Roster, record: Record) -> Record {
    let color = color_for(roster, &record.student_name, &record.assignment_name);
    record.with_color(color)
}

fn is_unassigned(assigned: &HashSet<&str>, student_name: &str) -> bool {
    student_name != TEST_ACCOUNT && !assigned.contains(student_name)
}

/// 对账服务
pub struct Reconciler<R: RosterProvider> {
    store: SnapshotStore,
    roster: R,
}

impl<R: RosterProvider> Reconciler<R> {
    pub fn new(store: SnapshotStore, roster: R) -> Self {
        Self { store, roster }
    }

    /// 所有快照的记录（先按快照、再按记录顺序）
    pub async fn all_records(&self) -> AppResult<Vec<Record>> {
        let roster = self.roster.load().await?;
        let records = self.load_records().await?;
        Ok(records.into_iter().map(|r| colorize(&roster, r)).collect())
    }

    /// 某个审阅人名下学生的记录
    ///
    /// 名字不区分大小写；`notassigned` 等同于 [`Reconciler::records_unassigned`]。
    pub async fn records_for(&self, reviewer_name: &str) -> AppResult<Vec<Record>> {
        if reviewer_name.to_lowercase() == UNASSIGNED_REVIEWER {
            return self.records_unassigned().await;
        }

        let roster = self.roster.load().await?;
        let reviewer = roster
            .find_reviewer(reviewer_name)
            .ok_or_else(|| AppError::reviewer_not_found(reviewer_name))?;

        let records: Vec<Record> = self
            .load_records()
            .await?
            .into_iter()
            .filter(|r| reviewer.owns(&r.student_name))
            .map(|r| colorize(&roster, r))
            .collect();

        debug!("审阅人 {} 名下 {} 条记录", reviewer.name, records.len());
        Ok(records)
    }

    /// 不属于任何审阅人的记录（测试账号除外）
    pub async fn records_unassigned(&self) -> AppResult<Vec<Record>> {
        let roster = self.roster.load().await?;
        let assigned = roster.assigned_students();

        let records: Vec<Record> = self
            .load_records()
            .await?
            .into_iter()
            .filter(|r| is_unassigned(&assigned, &r.student_name))
            .map(|r| colorize(&roster, r))
            .collect();

        debug!("未分配记录 {} 条", records.len());
        Ok(records)
    }

    /// 是否存在至少一条未分配记录，找到第一条即返回
    pub async fn has_unassigned_alert(&self) -> AppResult<bool> {
        let roster = self.roster.load().await?;
        let assigned = roster.assigned_students();

        for key in self.store.keys().await? {
            let Some(snapshot) = self.store.get(&key).await? else {
                continue;
            };
            if snapshot
                .records
                .iter()
                .any(|r| is_unassigned(&assigned, &r.student_name))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn load_records(&self) -> AppResult<Vec<Record>> {
        let snapshots = self.store.get_all().await?;
        Ok(snapshots.into_iter().flat_map(|s| s.records).collect())
    }
}

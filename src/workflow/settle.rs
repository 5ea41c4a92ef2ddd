//! 等待页面稳定的策略
//!
//! 目标页面在打开/关闭弹窗后没有"渲染完成"事件可供监听，
//! 因此每次等待都有一个固定的最长预算。`Fixed` 直接睡满预算；
//! `Poll` 在预算内轮询，直到观察到的元素数量在静默窗口内不再变化才提前返回。

use std::str::FromStr;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::infrastructure::{Locator, PageActuator};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 默认静默窗口：观察结果至少保持这么久不变才算稳定
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleMode {
    Fixed,
    Poll,
}

impl FromStr for SettleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(SettleMode::Fixed),
            "poll" => Ok(SettleMode::Poll),
            other => Err(format!("未知的等待策略: {}", other)),
        }
    }
}

/// 提前结束等待的条件
#[derive(Debug, Clone, Copy)]
pub enum SettleCondition<'a> {
    /// `ready` 中任一定位器出现，且 `ready` 与 `watch` 的匹配数量在静默窗口内保持不变
    Rendered {
        ready: &'a [Locator],
        watch: &'a [Locator],
    },
    /// 定位器消失
    Absent(&'a Locator),
}

/// 有上限的等待
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub mode: SettleMode,
    pub budget: Duration,
    pub quiet: Duration,
}

impl SettlePolicy {
    pub fn new(mode: SettleMode, budget: Duration) -> Self {
        Self {
            mode,
            budget,
            quiet: DEFAULT_QUIET_WINDOW,
        }
    }

    pub fn with_quiet(mut self, quiet: Duration) -> Self {
        self.quiet = quiet;
        self
    }

    /// 等待页面稳定，返回条件是否在预算内被观察到
    ///
    /// 不会失败：预算耗尽只意味着继续往下走，由后续的元素等待决定成败。
    /// 两种模式的最长等待时间相同，都是 `budget`。
    pub async fn settle<A: PageActuator>(&self, actuator: &A, condition: SettleCondition<'_>) -> bool {
        match self.mode {
            SettleMode::Fixed => {
                sleep(self.budget).await;
                true
            }
            SettleMode::Poll => self.poll(actuator, condition).await,
        }
    }

    async fn poll<A: PageActuator>(&self, actuator: &A, condition: SettleCondition<'_>) -> bool {
        let deadline = Instant::now() + self.budget;
        let mut last: Option<Vec<usize>> = None;
        let mut unchanged_since = Instant::now();

        loop {
            let counts = observe(actuator, condition).await;
            let now = Instant::now();

            match condition {
                SettleCondition::Absent(_) => {
                    if counts.first() == Some(&0) {
                        return true;
                    }
                }
                SettleCondition::Rendered { ready, .. } => {
                    let is_ready = counts[..ready.len()].iter().any(|c| *c > 0);
                    if last.as_ref() != Some(&counts) {
                        last = Some(counts);
                        unchanged_since = now;
                    } else if is_ready && now.duration_since(unchanged_since) >= self.quiet {
                        return true;
                    }
                }
            }

            if now >= deadline {
                debug!("页面未稳定，预算 {:?} 已用完", self.budget);
                return false;
            }
            sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

/// 条件涉及的每个定位器当前的匹配数量；查询出错按 0 计
async fn observe<A: PageActuator>(actuator: &A, condition: SettleCondition<'_>) -> Vec<usize> {
    let locators: Vec<&Locator> = match condition {
        SettleCondition::Rendered { ready, watch } => ready.iter().chain(watch.iter()).collect(),
        SettleCondition::Absent(locator) => vec![locator],
    };

    let mut counts = Vec::with_capacity(locators.len());
    for locator in locators {
        counts.push(actuator.find_all(locator).await.map(|found| found.len()).unwrap_or(0));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{ActuatorResult, PageElement};
    use async_trait::async_trait;

    /// 按时间表逐个"渲染"元素的页面：每个定位器对应若干出现时刻（相对创建时间）
    struct TimedPage {
        created: Instant,
        schedule: Vec<(Locator, Vec<Duration>)>,
        vanish_at: Option<Duration>,
    }

    struct Nothing;

    #[async_trait]
    impl PageElement for Nothing {
        async fn text(&self) -> ActuatorResult<String> {
            Ok(String::new())
        }
        async fn attribute(&self, _name: &str) -> ActuatorResult<Option<String>> {
            Ok(None)
        }
        async fn click(&self) -> ActuatorResult<()> {
            Ok(())
        }
        async fn send_keys(&self, _text: &str) -> ActuatorResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl PageActuator for TimedPage {
        type Element = Nothing;

        async fn navigate(&self, _url: &str) -> ActuatorResult<()> {
            Ok(())
        }
        async fn await_present(&self, _locator: &Locator, _timeout: Duration) -> ActuatorResult<Nothing> {
            Ok(Nothing)
        }
        async fn await_clickable(&self, _locator: &Locator, _timeout: Duration) -> ActuatorResult<Nothing> {
            Ok(Nothing)
        }
        async fn find_all(&self, locator: &Locator) -> ActuatorResult<Vec<Nothing>> {
            let elapsed = self.created.elapsed();
            if self.vanish_at.is_some_and(|at| elapsed >= at) {
                return Ok(Vec::new());
            }
            let count = self
                .schedule
                .iter()
                .filter(|(l, _)| l == locator)
                .flat_map(|(_, times)| times.iter())
                .filter(|t| **t <= elapsed)
                .count();
            Ok((0..count).map(|_| Nothing).collect())
        }
        async fn teardown(self) {}
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn trigger() -> Locator {
        Locator::xpath("//span[@title='Open grading dialog']")
    }

    fn legend() -> Locator {
        Locator::xpath("//legend")
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("fixed".parse::<SettleMode>(), Ok(SettleMode::Fixed));
        assert_eq!(" POLL ".parse::<SettleMode>(), Ok(SettleMode::Poll));
        assert!("adaptive".parse::<SettleMode>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_for_progressive_list_to_finish() {
        let page = TimedPage {
            created: Instant::now(),
            schedule: vec![(trigger(), vec![ms(0), ms(100), ms(200), ms(300)])],
            vanish_at: None,
        };
        let policy = SettlePolicy::new(SettleMode::Poll, ms(2000)).with_quiet(ms(300));
        let ready = [trigger()];

        let started = Instant::now();
        let settled = policy
            .settle(&page, SettleCondition::Rendered { ready: &ready, watch: &[] })
            .await;

        assert!(settled);
        assert!(started.elapsed() >= ms(600), "过早返回: {:?}", started.elapsed());
        assert!(started.elapsed() < ms(2000));
        assert_eq!(page.find_all(&trigger()).await.unwrap().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_waits_for_late_watched_element() {
        let title = Locator::xpath("//div[@class='gradingModal-title'][1]");
        let page = TimedPage {
            created: Instant::now(),
            schedule: vec![(title.clone(), vec![ms(0)]), (legend(), vec![ms(150)])],
            vanish_at: None,
        };
        let policy = SettlePolicy::new(SettleMode::Poll, ms(1000)).with_quiet(ms(250));
        let ready = [title];
        let watch = [legend()];

        let settled = policy
            .settle(&page, SettleCondition::Rendered { ready: &ready, watch: &watch })
            .await;

        assert!(settled);
        assert_eq!(page.find_all(&legend()).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_is_capped_by_budget() {
        let page = TimedPage {
            created: Instant::now(),
            schedule: Vec::new(),
            vanish_at: None,
        };
        let policy = SettlePolicy::new(SettleMode::Poll, ms(700));
        let ready = [trigger()];

        let started = Instant::now();
        let settled = policy
            .settle(&page, SettleCondition::Rendered { ready: &ready, watch: &[] })
            .await;

        assert!(!settled);
        assert!(started.elapsed() >= ms(700));
        assert!(started.elapsed() < ms(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_early_once_stable() {
        let page = TimedPage {
            created: Instant::now(),
            schedule: vec![(trigger(), vec![ms(0)])],
            vanish_at: None,
        };
        let policy = SettlePolicy::new(SettleMode::Poll, ms(5000)).with_quiet(ms(200));
        let ready = [trigger()];

        let started = Instant::now();
        assert!(
            policy
                .settle(&page, SettleCondition::Rendered { ready: &ready, watch: &[] })
                .await
        );
        assert!(started.elapsed() < ms(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_absent_returns_when_element_disappears() {
        let page = TimedPage {
            created: Instant::now(),
            schedule: vec![(legend(), vec![ms(0)])],
            vanish_at: Some(ms(250)),
        };
        let policy = SettlePolicy::new(SettleMode::Poll, ms(1000));
        let locator = legend();

        let started = Instant::now();
        assert!(policy.settle(&page, SettleCondition::Absent(&locator)).await);
        assert!(started.elapsed() >= ms(250));
        assert!(started.elapsed() < ms(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_sleeps_full_budget() {
        let page = TimedPage {
            created: Instant::now(),
            schedule: vec![(trigger(), vec![ms(0)])],
            vanish_at: None,
        };
        let policy = SettlePolicy::new(SettleMode::Fixed, ms(400));
        let ready = [trigger()];

        let started = Instant::now();
        policy
            .settle(&page, SettleCondition::Rendered { ready: &ready, watch: &[] })
            .await;
        assert!(started.elapsed() >= ms(400));
    }
}

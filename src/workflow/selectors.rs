//! 目标页面的定位器表

use crate::infrastructure::Locator;

/// 提取流程用到的全部定位器
#[derive(Debug, Clone)]
pub struct Selectors {
    pub username_input: Locator,
    pub password_input: Locator,
    pub login_button: Locator,
    pub queue_container: Locator,
    pub empty_queue_marker: Locator,
    pub grading_trigger: Locator,
    pub modal_title: Locator,
    pub regrade_marker: Locator,
    pub completed_date: Locator,
    pub project_link: Locator,
    pub close_button: Locator,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username_input: Locator::xpath("(//input[@placeholder='Email or Username'])[1]"),
            password_input: Locator::xpath("(//input[@placeholder='Password'])[1]"),
            login_button: Locator::xpath("//button[@class='btn btn--primary btn--large']"),
            queue_container: Locator::xpath("//div[@class='assignmentSmallList']"),
            empty_queue_marker: Locator::xpath("//span[@class='gradingQueue-emptyMessage']"),
            grading_trigger: Locator::xpath("//span[@title='Open grading dialog']"),
            modal_title: Locator::xpath("//div[@class='gradingModal-title'][1]"),
            regrade_marker: Locator::xpath("(//legend[normalize-space()='Regrade Request'])[1]"),
            completed_date: Locator::xpath("//div[@class='gradingModal-completedDate'][1]"),
            project_link: Locator::xpath("//a[contains(text(), 'Open Project')]"),
            close_button: Locator::xpath("(//i[normalize-space()='close'])[1]"),
        }
    }
}

/// "Open Project" 链接上存放项目地址的属性
pub const PROJECT_LINK_ATTRIBUTE: &str = "href";

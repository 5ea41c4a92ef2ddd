//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（浏览器会话），只暴露能力

pub mod actuator;
pub mod chromium;

pub use actuator::{
    ActuatorError, ActuatorResult, Locator, PageActuator, PageElement, SessionLauncher,
};
pub use chromium::{ChromiumActuator, ChromiumElement, ChromiumLauncher};

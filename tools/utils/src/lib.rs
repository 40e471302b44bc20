//! 实验脚本依赖的通用组件.

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod loader;

/// 解析日志级别. 无法解析时使用 `Info`.
fn level_from(s: Option<&str>) -> LevelFilter {
    s.and_then(|s| s.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// 以 `Info` 级别安装 `simple_logger`. 若环境变量 `$RUST_LOG` 可解析为日志级别, 以其为准.
///
/// 已安装过 logger 时什么也不做.
pub fn init_logger() {
    let level = level_from(std::env::var("RUST_LOG").ok().as_deref());
    SimpleLogger::new().with_level(level).init().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from() {
        assert_eq!(level_from(None), LevelFilter::Info);
        assert_eq!(level_from(Some("debug")), LevelFilter::Debug);
        assert_eq!(level_from(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(level_from(Some("loud")), LevelFilter::Info);
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger();
        init_logger();
    }
}

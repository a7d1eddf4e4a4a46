//! # 阿童木遥控台
//!
//! 演示注入引擎如何把普通对象、系统服务、视图和资源注入到界面中。

mod app;
mod screens;
mod services;
mod views;

use anyhow::Context;
use clap::Parser;
use infrastructure_composition::{InjectionSettings, LoggingConfig};
use screens::{ConsoleAction, FightForcesOfEvil, MasterConsole, Outcome};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "astroboy-console")]
#[command(about = "阿童木遥控台 - 注入引擎演示")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/console.toml")]
    config: String,

    /// 日志级别（覆盖配置文件）
    #[arg(long)]
    log_level: Option<String>,

    /// 主界面使用的内容视图（console 或 hello）
    #[arg(long, default_value = "console")]
    screen: String,

    /// 操作员名称
    #[arg(long)]
    operator: Option<String>,

    /// 忽略白名单，完整扫描
    #[arg(long)]
    unrestricted: bool,

    /// 让阿童木说的话
    #[arg(long)]
    say: Option<String>,

    /// 最后按下自毁按钮
    #[arg(long)]
    self_destruct: bool,

    /// 同时打开的战斗界面数量
    #[arg(long, default_value_t = 3)]
    fights: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = InjectionSettings::load(Some(Path::new(&args.config)))?;
    if let Some(level) = &args.log_level {
        settings.logging.level.clone_from(level);
    }
    if args.unrestricted {
        settings.scanner.restricted = false;
    }
    let logging = LoggingConfig::from_settings(&settings.logging)?;

    let runtime = Arc::new(
        app::builder(settings, args.operator.as_deref())
            .with_logging(logging)
            .build()?,
    );
    info!("启动阿童木遥控台, 扫描模式 {}", runtime.injector().scanner().mode());

    let console = match runtime.activate(MasterConsole::new(&args.screen)) {
        Ok(console) => console,
        Err(e) => {
            for failure in e.failures() {
                error!("{}", failure);
            }
            return Err(e).context(format!("内容视图 {} 缺少遥控台需要的按钮", args.screen));
        }
    };
    info!(ready = console.screen().is_ready(), "{}", console.screen().title());
    if let Some(words) = &args.say {
        console.type_text(words);
    }

    let mut actions = vec![
        ConsoleAction::SayText,
        ConsoleAction::BrushTeeth,
        ConsoleAction::FightEvil,
    ];
    if args.self_destruct {
        actions.push(ConsoleAction::SelfDestruct);
    }
    let mut fights = 0;
    for action in actions {
        match console.handle(action) {
            Outcome::Reply(reply) => info!("{:?} -> {}", action, reply),
            Outcome::OpenFight => fights = args.fights,
        }
    }

    // 每个战斗界面使用自己的子作用域
    let handles: Vec<_> = (0..fights)
        .map(|index| {
            let runtime = Arc::clone(&runtime);
            tokio::task::spawn_blocking(move || {
                let scope = runtime.child_scope(format!("fight-{index}"));
                runtime
                    .activate_in(FightForcesOfEvil::default(), &scope)
                    .map(|screen| screen.shout())
            })
        })
        .collect();
    for handle in handles {
        let shout = handle.await??;
        info!("战斗界面: {}", shout);
    }

    let stats = runtime.stats();
    info!(
        commands = console.remote_control().commands(),
        "主遥控台共发出指令"
    );
    info!(
        resolutions = stats.resolutions,
        productions = stats.productions,
        singleton_hits = stats.singleton_hits,
        implicit = stats.implicit_resolutions,
        failures = stats.failures,
        "遥控台关闭"
    );
    Ok(())
}

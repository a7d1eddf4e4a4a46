//! 遥控台界面
//!
//! `MasterConsole` 是主界面，嵌入 `ConsoleScreen` 作为所有界面共有的部分；
//! `FightForcesOfEvil` 是按下“打击邪恶势力”后打开的界面。

use crate::services::Vibrator;
use crate::views::{Button, Label, TextField};
use di_abstractions::{Injected, ViewRoot};
use injection_macros::Injectable;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// 阿童木遥控器
#[derive(Debug, Default)]
pub struct AstroboyRemoteControl {
    commands: AtomicUsize,
}

impl AstroboyRemoteControl {
    /// 让阿童木说话
    pub fn say(&self, words: &str) -> String {
        self.command(format!("阿童木: {words}"))
    }

    /// 让阿童木刷牙
    pub fn brush_teeth(&self) -> String {
        self.command("阿童木刷好了牙".to_string())
    }

    /// 让阿童木自毁
    pub fn self_destruct(&self) -> String {
        self.command("阿童木: 再见, 残酷的世界!".to_string())
    }

    /// 已发出的指令数
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::Relaxed)
    }

    fn command(&self, reply: String) -> String {
        self.commands.fetch_add(1, Ordering::Relaxed);
        info!("{}", reply);
        reply
    }
}

/// 所有界面共有的部分
#[derive(Debug, Default, Injectable)]
pub struct ConsoleScreen {
    #[inject_resource(id = 1)]
    app_name: Injected<String>,
    #[inject_extra(name = "operator", optional)]
    operator: Injected<String>,
    ready: bool,
}

impl ConsoleScreen {
    /// 标题栏文字
    pub fn title(&self) -> String {
        let app_name = self.app_name.get().map_or("阿童木", |name| name.as_str());
        match self.operator.get() {
            Some(operator) => format!("{app_name} - {operator}"),
            None => app_name.to_string(),
        }
    }

    /// 是否完成注入
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// 遥控台操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    /// 提交输入框里的话
    SayText,
    /// 刷牙
    BrushTeeth,
    /// 自毁
    SelfDestruct,
    /// 打开打击邪恶势力界面
    FightEvil,
}

/// 操作结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 阿童木的回应
    Reply(String),
    /// 需要打开打击邪恶势力界面
    OpenFight,
}

/// 主遥控台
#[derive(Debug, Default, Injectable)]
#[injectable(view_root = "content_view", on_injected = "on_ready")]
pub struct MasterConsole {
    #[inject(default)]
    remote_control: Injected<AstroboyRemoteControl>,
    #[inject]
    vibrator: Injected<Vibrator>,
    #[inject_view(id = 1)]
    self_destruct: Injected<Button>,
    #[inject_view(id = 2)]
    say_text: Injected<TextField>,
    #[inject_view(id = 3)]
    brush_teeth: Injected<Button>,
    #[inject_view(tag = "fightevil")]
    fight_evil: Injected<Button>,
    #[inject_base]
    screen: ConsoleScreen,
    content: Option<ViewRoot>,
}

impl MasterConsole {
    /// 以指定内容视图创建
    pub fn new(content: &str) -> Self {
        Self {
            content: Some(ViewRoot::new(content)),
            ..Self::default()
        }
    }

    fn content_view(&self) -> Option<ViewRoot> {
        self.content.clone()
    }

    fn on_ready(&mut self) {
        self.screen.ready = true;
        info!("遥控台就绪: {}", self.screen.title());
    }

    /// 共有部分
    pub fn screen(&self) -> &ConsoleScreen {
        &self.screen
    }

    /// 遥控器
    pub fn remote_control(&self) -> &AstroboyRemoteControl {
        &self.remote_control
    }

    /// 在输入框里打字
    pub fn type_text(&self, text: &str) {
        self.say_text.type_text(text);
    }

    /// 按钮文字
    pub fn buttons(&self) -> [&str; 3] {
        [
            &self.self_destruct.text,
            &self.brush_teeth.text,
            &self.fight_evil.text,
        ]
    }

    /// 执行操作
    pub fn handle(&self, action: ConsoleAction) -> Outcome {
        match action {
            ConsoleAction::SayText => self.on_say_text_submitted(),
            ConsoleAction::BrushTeeth => Outcome::Reply(self.remote_control.brush_teeth()),
            ConsoleAction::SelfDestruct => self.on_self_destruct(),
            ConsoleAction::FightEvil => Outcome::OpenFight,
        }
    }

    /// 提交输入框：原样转给阿童木，然后清空
    fn on_say_text_submitted(&self) -> Outcome {
        let words = TextField::take(&self.say_text);
        Outcome::Reply(self.remote_control.say(&words))
    }

    fn on_self_destruct(&self) -> Outcome {
        self.vibrator.vibrate(2000);
        Outcome::Reply(self.remote_control.self_destruct())
    }
}

/// 打击邪恶势力界面
#[derive(Debug, Default, Injectable)]
#[injectable(view_root = "content_view")]
pub struct FightForcesOfEvil {
    #[inject(default)]
    remote_control: Injected<AstroboyRemoteControl>,
    #[inject]
    vibrator: Injected<Vibrator>,
    #[inject_view(tag = "expletive")]
    expletive: Injected<Label>,
}

impl FightForcesOfEvil {
    fn content_view(&self) -> Option<ViewRoot> {
        Some(ViewRoot::new("fight"))
    }

    /// 喊出口号
    pub fn shout(&self) -> String {
        self.vibrator.vibrate(250);
        self.remote_control.say(&self.expletive.0)
    }
}

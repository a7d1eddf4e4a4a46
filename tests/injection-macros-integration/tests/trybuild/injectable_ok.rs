use di_abstractions::{Injected, InjectionTarget, ViewRoot};
use injection_macros::Injectable;

#[derive(Default)]
struct Beeper;

#[derive(Default, Injectable)]
struct Panel {
    #[inject(default)]
    beeper: Injected<Beeper>,
}

#[derive(Default, Injectable)]
#[injectable(view_root = "root", on_injected = "ready")]
struct Screen {
    #[inject_view(id = 7)]
    title: Injected<String>,
    #[inject_extra(name = "user", optional)]
    user: Injected<String>,
    #[inject_base]
    panel: Panel,
}

impl Screen {
    fn root(&self) -> Option<ViewRoot> {
        Some(ViewRoot::new("screen"))
    }

    fn ready(&mut self) {}
}

#[derive(Injectable)]
struct Empty;

fn main() {
    assert_eq!(Screen::manifest().sections().len(), 2);
    assert_eq!(Screen::manifest().len(), 3);
    assert!(Empty::manifest().is_empty());
    let screen = Screen::default();
    assert!(screen.view_root().is_some());
}

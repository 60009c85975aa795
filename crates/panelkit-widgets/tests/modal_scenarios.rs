//! End-to-end flows through the public modal API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use panelkit_core::{
    ClickEvent, Element, ElementId, ElementKind, Event, FocusHost, FocusRegistry, KeyCode,
    KeyEvent, ManualClock, Overflow, ScrollLock,
};
use panelkit_widgets::modal::{
    BoundaryState, CloseDecision, CloseTrigger, Dependency, FallbackAction, FocusRegion,
    MODAL_HIT_BACKDROP, ModalConfig, ModalShell, PanelName, PreventReason,
    ReadinessError, ReadinessTracker, RenderError, RenderFailureBoundary, ShellAction,
};

type Prevented = Rc<RefCell<Vec<(CloseTrigger, PreventReason)>>>;

fn prevented_log() -> (impl Fn(CloseTrigger, PreventReason) + 'static, Prevented) {
    let log: Prevented = Rc::default();
    let sink = Rc::clone(&log);
    (
        move |trigger: CloseTrigger, reason: PreventReason| {
            sink.borrow_mut().push((trigger, reason));
        },
        log,
    )
}

fn close_counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = Rc::clone(&count);
    (count, move || inner.set(inner.get() + 1))
}

fn text(panel: &PanelName) -> Result<String, RenderError> {
    Ok(format!("{panel} body"))
}

fn escape() -> Event {
    Event::Key(KeyEvent::new(KeyCode::Escape))
}

#[test]
fn missing_required_identifier_blocks_readiness() {
    let tracker = ReadinessTracker::builder()
        .require("projectId", None::<&str>)
        .build();
    let snapshot = tracker.snapshot();

    assert!(!snapshot.is_ready);
    assert!(snapshot.has_error);
    let error = snapshot.first_error.expect("error reported");
    assert!(matches!(&error, ReadinessError::MissingIdentifier { name } if name == "projectId"));
    assert!(error.to_string().contains("projectId"));

    tracker.set_required_id("projectId", Some("p-1"));
    assert!(tracker.is_ready());
}

#[test]
fn one_pending_query_keeps_modal_loading() {
    let budget = Dependency::new("budget");
    let contacts = Dependency::new("contacts");
    contacts.succeed();
    let tracker = ReadinessTracker::builder()
        .critical(budget.clone())
        .critical(contacts)
        .build();

    let snapshot = tracker.snapshot();
    assert!(snapshot.is_loading);
    assert!(!snapshot.is_ready);
    assert!(!snapshot.has_error);

    budget.succeed();
    assert!(tracker.is_ready());
}

#[test]
fn declined_unsaved_confirmation_on_escape() {
    let clock = Rc::new(ManualClock::new());
    let (closed, on_close) = close_counter();
    let (on_prevented, prevented) = prevented_log();
    let mut shell = ModalShell::builder(text)
        .clock(clock.clone())
        .has_unsaved_changes(true)
        .confirm_with(|_: &str| false)
        .on_close_prevented(on_prevented)
        .on_close(on_close)
        .build();

    assert_eq!(
        shell.handle_event(&escape()),
        ShellAction::CloseAttempted(CloseDecision::Denied(
            PreventReason::UnsavedChangesDeclined
        ))
    );
    clock.advance(Duration::from_secs(5));
    shell.tick();

    assert_eq!(closed.get(), 0);
    assert_eq!(
        *prevented.borrow(),
        vec![(CloseTrigger::Escape, PreventReason::UnsavedChangesDeclined)]
    );
    assert_eq!(
        PreventReason::UnsavedChangesDeclined.to_string(),
        "unsaved changes confirmation cancelled"
    );
}

#[test]
fn backdrop_runs_same_guard_as_close_button() {
    let clock = Rc::new(ManualClock::new());
    let (on_prevented, prevented) = prevented_log();
    let allow = Rc::new(Cell::new(false));
    let gate = Rc::clone(&allow);
    let (closed, on_close) = close_counter();
    let mut shell = ModalShell::builder(text)
        .config(ModalConfig::default().prevent_backdrop_close(false))
        .clock(clock.clone())
        .can_close(move || gate.get())
        .on_close_prevented(on_prevented)
        .on_close(on_close)
        .build();

    let backdrop = Event::Click(ClickEvent::left(MODAL_HIT_BACKDROP));
    assert_eq!(
        shell.handle_event(&backdrop),
        ShellAction::CloseAttempted(CloseDecision::Denied(PreventReason::CustomValidation))
    );
    assert_eq!(
        shell.request_close(),
        CloseDecision::Denied(PreventReason::CustomValidation)
    );
    assert_eq!(
        *prevented.borrow(),
        vec![
            (CloseTrigger::Backdrop, PreventReason::CustomValidation),
            (CloseTrigger::Button, PreventReason::CustomValidation),
        ]
    );

    allow.set(true);
    assert_eq!(
        shell.handle_event(&backdrop),
        ShellAction::CloseAttempted(CloseDecision::Approved)
    );
    clock.advance(Duration::from_millis(250));
    shell.tick();
    assert_eq!(closed.get(), 1);
}

#[test]
fn retry_budget_exhausts_on_third_failure() {
    let clock = Rc::new(ManualClock::new());
    let renders = Rc::new(Cell::new(0));
    let attempts = Rc::clone(&renders);
    let (closed, on_close) = close_counter();
    let shell = ModalShell::builder(move |_: &PanelName| {
        attempts.set(attempts.get() + 1);
        Err::<String, _>(RenderError::new("cannot read property of undefined"))
    })
    .clock(clock.clone())
    .on_close(on_close)
    .build();
    let mut boundary = RenderFailureBoundary::new(shell)
        .with_config(&ModalConfig::default().max_retries(3))
        .with_clock(clock.clone());

    let first = boundary.render();
    let fallback = first.fallback().expect("fallback after first failure");
    assert!(fallback.offers(FallbackAction::Retry));
    assert_eq!(
        FallbackAction::Retry.label(boundary.strings()),
        "Reintentar"
    );

    assert!(boundary.activate(FallbackAction::Retry));
    assert!(boundary.render().fallback().unwrap().offers(FallbackAction::Retry));
    assert!(boundary.activate(FallbackAction::Retry));

    let third = boundary.render();
    let fallback = third.fallback().unwrap();
    assert!(!fallback.offers(FallbackAction::Retry));
    assert!(fallback.offers(FallbackAction::ForceClose));
    assert_eq!(boundary.state(), BoundaryState::Exhausted);
    assert_eq!(renders.get(), 3);

    assert!(boundary.activate(FallbackAction::ForceClose));
    assert!(boundary.target().is_closed());
    assert_eq!(closed.get(), 1);
}

#[test]
fn panicking_content_is_contained() {
    let clock = Rc::new(ManualClock::new());
    let shell = ModalShell::builder(|panel: &PanelName| -> Result<String, RenderError> {
        panic!("no renderer for {panel}")
    })
    .clock(clock.clone())
    .build();
    let mut boundary = RenderFailureBoundary::new(shell)
        .with_config(&ModalConfig::default().show_error_details(true))
        .with_clock(clock);

    let view = boundary.render();
    let fallback = view.fallback().expect("panic converted to fallback");
    assert!(fallback.detail.as_deref().unwrap_or_default().contains("no renderer for view"));
}

#[test]
fn repeated_denials_never_close() {
    let clock = Rc::new(ManualClock::new());
    let (closed, on_close) = close_counter();
    let mut shell = ModalShell::builder(text)
        .clock(clock.clone())
        .can_close(|| false)
        .on_close(on_close)
        .build();

    for _ in 0..10 {
        assert!(!shell.request_close().is_approved());
        assert_eq!(
            shell.handle_event(&escape()),
            ShellAction::CloseAttempted(CloseDecision::Denied(PreventReason::CustomValidation))
        );
        clock.advance(Duration::from_secs(1));
        shell.tick();
    }
    assert!(!shell.is_closing());
    assert_eq!(closed.get(), 0);
}

#[test]
fn approved_close_fires_exactly_once() {
    let clock = Rc::new(ManualClock::new());
    let (closed, on_close) = close_counter();
    let mut shell = ModalShell::builder(text)
        .clock(clock.clone())
        .on_close(on_close)
        .build();

    assert_eq!(shell.request_close(), CloseDecision::Approved);
    assert_eq!(shell.request_close(), CloseDecision::AlreadyClosing);
    shell.handle_event(&escape());
    for _ in 0..5 {
        clock.advance(Duration::from_millis(100));
        shell.tick();
    }
    shell.dismiss();
    assert_eq!(closed.get(), 1);
}

#[test]
fn focus_returns_to_opener_after_close() {
    let clock = Rc::new(ManualClock::new());
    let host = FocusRegistry::new();
    let opener = ElementId::new(1);
    host.attach_all([1, 10, 11].map(ElementId::new));
    host.focus(opener);

    let region = FocusRegion::from_elements(vec![
        Element::new(ElementId::new(10), ElementKind::TextInput),
        Element::new(ElementId::new(11), ElementKind::Button),
    ]);
    let surface = Rc::new(Cell::new(Overflow::Auto));
    let mut shell = ModalShell::builder(text)
        .config(ModalConfig::default().auto_focus_first_input(true))
        .clock(clock.clone())
        .focus(Rc::new(host.clone()), region.clone())
        .scroll_lock(ScrollLock::new(Rc::clone(&surface)))
        .build();

    shell.view().unwrap();
    assert_eq!(shell.after_render(), Some(ElementId::new(10)));

    region.push(Element::new(ElementId::new(12), ElementKind::Button));
    host.attach(ElementId::new(12));
    host.focus(ElementId::new(12));
    assert!(shell.handle_event(&Event::Key(KeyEvent::new(KeyCode::Tab))).is_handled());
    assert_eq!(host.active_element(), Some(ElementId::new(10)));

    shell.request_close();
    clock.advance(Duration::from_millis(250));
    shell.tick();
    assert_eq!(host.active_element(), Some(opener));
    assert_eq!(surface.get(), Overflow::Auto);
}

#[test]
fn missing_opener_is_not_an_error() {
    let clock = Rc::new(ManualClock::new());
    let host = FocusRegistry::new();
    host.attach_all([1, 10].map(ElementId::new));
    host.focus(ElementId::new(1));
    let region =
        FocusRegion::from_elements(vec![Element::new(ElementId::new(10), ElementKind::TextInput)]);
    let mut shell = ModalShell::builder(text)
        .config(ModalConfig::default().enable_animations(false))
        .clock(clock)
        .focus(Rc::new(host.clone()), region)
        .initial_focus_target(ElementId::new(10))
        .build();
    shell.after_render();

    host.detach(ElementId::new(1));
    shell.request_close();
    assert!(shell.is_closed());
    assert_eq!(host.active_element(), Some(ElementId::new(10)));
}

mod text_area;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{prelude::*, widgets::*};
use std::time::{Duration, Instant};

use crate::document_path::{DocumentPath, PostLayout};
use crate::log_capture::LogBuffer;
use crate::page::Page;
use crate::session::{Confirmation, Controller, Effect, Event, StatusKind};
use crate::state::AppState;
use text_area::{EditorWidget, TextArea};

// ── Public config ─────────────────────────────────────────────────────────────

pub struct TuiConfig {
    pub state: AppState,
    pub page: Page,
    pub log_buffer: LogBuffer,
}

const TICK_MS: u64 = 250;
const STATUS_SECS: u64 = 5;

// ── View state ────────────────────────────────────────────────────────────────

/// Which controls the page currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affordance {
    Checking,
    Login,
    EditControls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Text,
    Message,
}

/// Something drawn on top of everything else that takes all input.
#[derive(Debug, PartialEq)]
enum Overlay {
    Confirm(Confirmation),
    Credential { input: String },
    Notice(String),
}

struct App {
    page: Page,
    layout: PostLayout,
    affordance: Affordance,
    /// Modal title while the editor is showing.
    modal: Option<String>,
    editor: TextArea,
    /// False from `OpenModal` until the file content arrives.
    editor_ready: bool,
    commit_message: String,
    focus: Focus,
    save_enabled: bool,
    status: Option<(String, StatusKind, Instant)>,
    overlay: Option<Overlay>,
    reload_pending: bool,
    log_buffer: LogBuffer,
    log_scroll: u16, // lines scrolled up from tail (0 = follow tail)
}

impl App {
    fn new(page: Page, layout: PostLayout, log_buffer: LogBuffer) -> Self {
        Self {
            page,
            layout,
            affordance: Affordance::Checking,
            modal: None,
            editor: TextArea::default(),
            editor_ready: false,
            commit_message: String::new(),
            focus: Focus::Text,
            save_enabled: true,
            status: None,
            overlay: None,
            reload_pending: false,
            log_buffer,
            log_scroll: 0,
        }
    }

    fn clear_expired_status(&mut self) {
        if let Some((_, _, t)) = self.status {
            if t.elapsed() > Duration::from_secs(STATUS_SECS) {
                self.status = None;
            }
        }
    }

    /// Render the effects the controller hands back.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ShowLogin => self.affordance = Affordance::Login,
                Effect::ShowEditControls => self.affordance = Affordance::EditControls,
                Effect::PromptCredential => {
                    self.overlay = Some(Overlay::Credential {
                        input: String::new(),
                    })
                }
                Effect::ReloadPage => self.reload_pending = true,
                Effect::Notify(text) => self.overlay = Some(Overlay::Notice(text)),
                Effect::OpenModal => {
                    self.modal = Some(String::new());
                    self.focus = Focus::Text;
                    self.editor_ready = false;
                }
                Effect::CloseModal => self.modal = None,
                Effect::SetModalTitle(title) => self.modal = Some(title),
                Effect::SetEditorContent(text) => {
                    self.editor.set_value(&text);
                    self.editor_ready = true;
                }
                Effect::ClearEditor => self.editor.set_value(""),
                Effect::SetSaveEnabled(enabled) => {
                    self.save_enabled = enabled;
                    self.editor_ready |= enabled;
                }
                Effect::Status { text, kind } => {
                    self.status = Some((text, kind, Instant::now()));
                }
                Effect::Confirm(c) => self.overlay = Some(Overlay::Confirm(c)),
                other => tracing::debug!("Unhandled effect in view: {:?}", other),
            }
        }
    }
}

// ── Actions returned by key handlers ─────────────────────────────────────────

#[derive(Debug)]
enum Action {
    None,
    Dispatch(Event),
    Reload,
    Quit,
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub async fn run(config: TuiConfig) -> Result<()> {
    let AppState {
        credentials,
        repository,
        settings,
    } = config.state;
    let mut app = App::new(config.page, settings.layout.clone(), config.log_buffer);
    let mut controller = Controller::new(settings, repository, credentials);

    // Setup terminal.
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Spawn a dedicated thread for blocking crossterm event reads.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<TermEvent>();
    std::thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(50)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(evt) => {
                        if event_tx.send(evt).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });

    dispatch(&mut app, &mut controller, Event::PageLoaded);
    let mut tick = tokio::time::interval(Duration::from_millis(TICK_MS));

    let result: Result<()> = 'main: loop {
        if app.reload_pending {
            app.reload_pending = false;
            reload(&mut app, &mut controller).await;
        }

        if let Err(e) = terminal.draw(|f| render(f, &mut app)) {
            break 'main Err(e.into());
        }

        tokio::select! {
            Some(event) = event_rx.recv() => {
                let TermEvent::Key(key) = event else { continue 'main };
                if key.kind != KeyEventKind::Press {
                    continue 'main;
                }
                match handle_key(&mut app, key) {
                    Action::None => {}
                    Action::Dispatch(event) => dispatch(&mut app, &mut controller, event),
                    Action::Reload => app.reload_pending = true,
                    Action::Quit => break 'main Ok(()),
                }
            }
            Some(event) = controller.next_event() => {
                dispatch(&mut app, &mut controller, event);
            }
            _ = tick.tick() => {
                app.clear_expired_status();
            }
        }
    };

    // Always restore the terminal.
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    result
}

fn dispatch(app: &mut App, controller: &mut Controller, event: Event) {
    app.apply(controller.dispatch(event));
    tracing::trace!(state = ?controller.state(), "Session state");
}

/// Re-read the page and start over from the identity probe.
async fn reload(app: &mut App, controller: &mut Controller) {
    let source = app.page.source.clone();
    match Page::load(source).await {
        Ok(page) => {
            tracing::info!(page = %page.source, "Page reloaded");
            app.page = page;
            app.affordance = Affordance::Checking;
            app.modal = None;
            app.overlay = None;
            app.editor.set_value("");
            dispatch(app, controller, Event::PageLoaded);
        }
        Err(e) => {
            tracing::error!("Reload failed: {}", e);
            app.overlay = Some(Overlay::Notice(format!("Reload failed: {e}")));
        }
    }
}

// ── Key handling ─────────────────────────────────────────────────────────────

fn handle_key(app: &mut App, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return Action::Quit;
    }

    if app.overlay.is_some() {
        return handle_overlay_key(app, key.code);
    }
    if app.modal.is_some() {
        return handle_modal_key(app, key);
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('l') if app.affordance == Affordance::Login => {
            Action::Dispatch(Event::LoginRequested)
        }
        KeyCode::Char('e') if app.affordance == Affordance::EditControls => {
            Action::Dispatch(Event::OpenRequested(app.page.metadata.clone()))
        }
        KeyCode::Char('o') if app.affordance == Affordance::EditControls => {
            Action::Dispatch(Event::LogoutRequested)
        }
        KeyCode::PageUp => {
            app.log_scroll = app
                .log_scroll
                .saturating_add(10)
                .min(crate::log_capture::MAX_LOG_LINES as u16);
            Action::None
        }
        KeyCode::PageDown => {
            app.log_scroll = app.log_scroll.saturating_sub(10);
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_overlay_key(app: &mut App, key: KeyCode) -> Action {
    let Some(overlay) = app.overlay.as_mut() else {
        return Action::None;
    };

    match overlay {
        Overlay::Confirm(confirmation) => {
            let confirmation = *confirmation;
            let accepted = match key {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
                _ => return Action::None,
            };
            app.overlay = None;
            Action::Dispatch(Event::Answered {
                confirmation,
                accepted,
            })
        }
        Overlay::Credential { input } => match key {
            KeyCode::Char(c) => {
                input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                input.pop();
                Action::None
            }
            KeyCode::Enter => {
                let value = std::mem::take(input);
                app.overlay = None;
                Action::Dispatch(Event::CredentialEntered(Some(value)))
            }
            KeyCode::Esc => {
                app.overlay = None;
                Action::Dispatch(Event::CredentialEntered(None))
            }
            _ => Action::None,
        },
        Overlay::Notice(_) => {
            app.overlay = None;
            Action::None
        }
    }
}

fn handle_modal_key(app: &mut App, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Action::Dispatch(Event::CloseRequested {
            content: app.editor.value(),
        }),
        KeyCode::Char('s') if ctrl => {
            if !app.save_enabled {
                return Action::None;
            }
            Action::Dispatch(Event::SaveRequested {
                content: app.editor.value(),
                message: app.commit_message.clone(),
            })
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Text => Focus::Message,
                Focus::Message => Focus::Text,
            };
            Action::None
        }
        _ => {
            match app.focus {
                Focus::Text if app.editor_ready => {
                    app.editor.handle_key(key);
                }
                Focus::Text => {}
                Focus::Message if !ctrl => match key.code {
                    KeyCode::Char(c) => app.commit_message.push(c),
                    KeyCode::Backspace => {
                        app.commit_message.pop();
                    }
                    _ => {}
                },
                Focus::Message => {}
            }
            Action::None
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Outer layout: title (3) | body (fill) | status bar (3)
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    render_title(frame, outer[0], app);
    render_page(frame, outer[1], app);
    render_key_bar(frame, outer[2], app);

    if app.modal.is_some() {
        render_modal(frame, centered(area, 90, 85), app);
    }
    if let Some(overlay) = &app.overlay {
        render_overlay(frame, centered(area, 60, 30), overlay);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let title = Paragraph::new(format!("Inline Editor  │  {}", app.page.source))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(title, area);
}

fn render_page(frame: &mut Frame, area: Rect, app: &App) {
    // Split body: post info (top) | logs (rest)
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);

    let meta = &app.page.metadata;
    let dim = Style::default().fg(Color::DarkGray);
    let path = match DocumentPath::derive(meta, &app.layout) {
        Ok(p) => Span::raw(p.to_string()),
        Err(e) => Span::styled(e.to_string(), Style::default().fg(Color::Red)),
    };
    let controls = match app.affordance {
        Affordance::Checking => Span::styled("Checking GitHub token…", dim),
        Affordance::Login => Span::styled(
            "[l] Admin Login",
            Style::default().fg(Color::Yellow),
        ),
        Affordance::EditControls => Span::styled(
            "[e] Edit Post   [o] Logout",
            Style::default().fg(Color::Green),
        ),
    };

    let info_text = vec![
        Line::from(vec![
            Span::styled(" Title: ", dim),
            Span::raw(meta.title.as_deref().unwrap_or("-")),
        ]),
        Line::from(vec![
            Span::styled(" Date:  ", dim),
            Span::raw(meta.date.as_deref().unwrap_or("-")),
        ]),
        Line::from(vec![Span::styled(" File:  ", dim), path]),
        Line::from(""),
        Line::from(vec![Span::raw(" "), controls]),
    ];
    let info =
        Paragraph::new(info_text).block(Block::default().borders(Borders::ALL).title(" Post "));
    frame.render_widget(info, rows[0]);

    render_logs_panel(frame, rows[1], app);
}

fn render_logs_panel(frame: &mut Frame, area: Rect, app: &App) {
    // Snapshot the ring buffer under a brief lock.
    let entries: Vec<crate::log_capture::LogEntry> = app
        .log_buffer
        .lock()
        .map(|buf| buf.iter().cloned().collect())
        .unwrap_or_default();

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = entries.len().saturating_sub(inner_height) as u16;
    let scroll_up = app.log_scroll.min(max_scroll);
    let display_row = max_scroll.saturating_sub(scroll_up);

    let lines: Vec<Line> = entries
        .iter()
        .map(|entry| Line::from(Span::styled(entry.line.clone(), log_level_style(entry.level))))
        .collect();

    let title = if scroll_up > 0 {
        format!(" Logs  ↑{scroll_up}  PgDn to follow ")
    } else {
        " Logs  [tail]  PgUp to scroll ".to_string()
    };

    let logs = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((display_row, 0));

    frame.render_widget(logs, area);
}

fn log_level_style(level: tracing::Level) -> Style {
    match level {
        tracing::Level::ERROR => Style::default().fg(Color::Red),
        tracing::Level::WARN => Style::default().fg(Color::Yellow),
        tracing::Level::INFO => Style::default().fg(Color::White),
        tracing::Level::DEBUG | tracing::Level::TRACE => Style::default().fg(Color::DarkGray),
    }
}

fn render_modal(frame: &mut Frame, area: Rect, app: &mut App) {
    frame.render_widget(Clear, area);
    let title = app.modal.as_deref().unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Edit Post: {title} "))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // editor
            Constraint::Length(3), // commit message
            Constraint::Length(1), // actions
            Constraint::Length(1), // status
        ])
        .split(inner);

    let focused = |f: Focus| {
        if app.focus == f {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let editor_block = Block::default()
        .borders(Borders::ALL)
        .title("Content")
        .border_style(focused(Focus::Text));
    let text_focused = app.focus == Focus::Text && app.overlay.is_none();
    app.editor.render(frame, rows[0], editor_block, text_focused);

    let message = if app.commit_message.is_empty() && app.focus != Focus::Message {
        Span::styled(" Update post via inline editor", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(format!(" {}", app.commit_message))
    };
    let message_field = Paragraph::new(message).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Commit message")
            .border_style(focused(Focus::Message)),
    );
    frame.render_widget(message_field, rows[1]);

    let save = if app.save_enabled {
        Span::styled("[Ctrl+S] Save Changes", Style::default().fg(Color::Green))
    } else {
        Span::styled("Saving...", Style::default().fg(Color::DarkGray))
    };
    let actions = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        save,
        Span::styled(
            "   [Esc] Cancel   [Tab] switch field",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(actions, rows[2]);

    if let Some((text, kind, _)) = &app.status {
        let style = match kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Success => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {text}"), style)),
            rows[3],
        );
    }
}

fn render_overlay(frame: &mut Frame, area: Rect, overlay: &Overlay) {
    let (title, body, hint) = match overlay {
        Overlay::Confirm(c) => (" Confirm ", c.prompt().to_string(), " y / Enter = yes   n / Esc = no"),
        Overlay::Credential { input } => (
            " Admin Login ",
            format!(
                "Enter GitHub Personal Access Token (with repo scope):\n\n {}",
                "*".repeat(input.chars().count())
            ),
            " Enter to confirm   Esc to cancel",
        ),
        Overlay::Notice(text) => (" Notice ", text.clone(), " Any key to dismiss"),
    };

    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), rows[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        rows[1],
    );
}

fn render_key_bar(frame: &mut Frame, area: Rect, app: &App) {
    let text = if app.modal.is_some() {
        " Ctrl+S save  │  Tab switch field  │  Esc cancel  │  Ctrl+C quit"
    } else {
        " e edit  │  l login  │  o logout  │  r reload  │  q quit"
    };
    let bar = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(bar, area);
}

/// A rect of `pct_x` by `pct_y` percent of `area`, centred.
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Min(0),
        ])
        .split(rows[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_path::PageMetadata;
    use crate::page::PageSource;
    use std::{
        collections::VecDeque,
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    fn app() -> App {
        let page = Page {
            source: PageSource::Local(PathBuf::from("post.html")),
            metadata: PageMetadata {
                date: Some("Jan 5, 2024".into()),
                title: Some("Hello".into()),
            },
        };
        App::new(
            page,
            PostLayout::default(),
            Arc::new(Mutex::new(VecDeque::new())),
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn edit_key_needs_edit_controls() {
        let mut app = app();
        assert!(matches!(handle_key(&mut app, press(KeyCode::Char('e'))), Action::None));

        app.apply(vec![Effect::ShowEditControls]);
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char('e'))),
            Action::Dispatch(Event::OpenRequested(m)) if m.title.as_deref() == Some("Hello")
        ));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char('l'))),
            Action::None
        ));
    }

    #[test]
    fn modal_effects_drive_the_view() {
        let mut app = app();
        app.apply(vec![
            Effect::OpenModal,
            Effect::SetModalTitle("My Post".into()),
            Effect::SetEditorContent("line one\nline two".into()),
            Effect::SetSaveEnabled(false),
            Effect::Status {
                text: "Committing changes to GitHub...".into(),
                kind: StatusKind::Info,
            },
        ]);
        assert_eq!(app.modal.as_deref(), Some("My Post"));
        assert_eq!(app.editor.value(), "line one\nline two");
        assert!(!app.save_enabled);
        assert!(app.status.is_some());

        app.apply(vec![Effect::ClearEditor, Effect::CloseModal]);
        assert!(app.modal.is_none());
        assert_eq!(app.editor.value(), "");
    }

    #[test]
    fn save_sends_editor_text_and_message() {
        let mut app = app();
        app.apply(vec![Effect::OpenModal, Effect::SetEditorContent("body".into())]);
        handle_key(&mut app, press(KeyCode::Tab));
        for c in "fix typo".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }

        match handle_key(&mut app, ctrl('s')) {
            Action::Dispatch(Event::SaveRequested { content, message }) => {
                assert_eq!(content, "body");
                assert_eq!(message, "fix typo");
            }
            other => panic!("unexpected {other:?}"),
        }

        // Disabled while a save is in flight.
        app.apply(vec![Effect::SetSaveEnabled(false)]);
        assert!(matches!(handle_key(&mut app, ctrl('s')), Action::None));
    }

    #[test]
    fn escape_in_modal_requests_close_with_content() {
        let mut app = app();
        app.apply(vec![Effect::OpenModal, Effect::SetEditorContent("draft".into())]);
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Esc)),
            Action::Dispatch(Event::CloseRequested { content }) if content == "draft"
        ));
    }

    #[test]
    fn confirm_overlay_answers() {
        let mut app = app();
        app.apply(vec![Effect::Confirm(Confirmation::DiscardChanges)]);
        // Unrelated keys are swallowed.
        assert!(matches!(handle_key(&mut app, press(KeyCode::Char('q'))), Action::None));
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Char('n'))),
            Action::Dispatch(Event::Answered {
                confirmation: Confirmation::DiscardChanges,
                accepted: false
            })
        ));
        assert!(app.overlay.is_none());
    }

    #[test]
    fn credential_prompt_collects_input() {
        let mut app = app();
        app.apply(vec![Effect::PromptCredential]);
        for c in "ghp_x".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Enter)),
            Action::Dispatch(Event::CredentialEntered(Some(v))) if v == "ghp_x"
        ));

        app.apply(vec![Effect::PromptCredential]);
        assert!(matches!(
            handle_key(&mut app, press(KeyCode::Esc)),
            Action::Dispatch(Event::CredentialEntered(None))
        ));
    }

    #[test]
    fn typing_before_content_arrives_is_dropped() {
        let mut app = app();
        app.apply(vec![Effect::OpenModal, Effect::SetModalTitle("p".into())]);
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.editor.value(), "");

        app.apply(vec![Effect::SetEditorContent("loaded".into())]);
        handle_key(&mut app, press(KeyCode::Char('x')));
        assert_eq!(app.editor.value(), "xloaded");

        // A new session starts locked again.
        app.apply(vec![Effect::ClearEditor, Effect::CloseModal, Effect::OpenModal]);
        handle_key(&mut app, press(KeyCode::Char('y')));
        assert_eq!(app.editor.value(), "");
    }

    #[test]
    fn reload_effect_is_deferred_to_the_loop() {
        let mut app = app();
        app.apply(vec![Effect::ReloadPage]);
        assert!(app.reload_pending);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut app = app();
        app.apply(vec![Effect::OpenModal, Effect::Notify("x".into())]);
        assert!(matches!(handle_key(&mut app, ctrl('c')), Action::Quit));
    }
}

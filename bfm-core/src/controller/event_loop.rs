//! ``src/controller/event_loop.rs``
//! ============================================================================
//! # Event loop
//!
//! Single task that owns the [`SessionManager`] and multiplexes three
//! sources with `tokio::select!`:
//! - terminal input, dispatched through the [`Keymap`]
//! - staleness ticks from the [`StalenessMonitor`](crate::controller::monitor::StalenessMonitor)
//! - completion reports from the [`Launcher`]
//!
//! Every command runs to completion before the next source is polled, so
//! session state is only ever touched from here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use compact_str::CompactString;
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::{Terminal, backend::Backend};
use smallvec::SmallVec;
use tokio::sync::mpsc::{self, Receiver, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::controller::actions::Command;
use crate::controller::collaborators::{LaunchPurpose, LaunchReport, Launcher};
use crate::controller::keymap::Keymap;
use crate::controller::prompt::TuiPrompt;
use crate::error::AppError;
use crate::model::session::{Session, SessionId};
use crate::model::session_manager::{Lifecycle, SessionManager};
use crate::model::ui_state::{Notification, ViewState};
use crate::view::snapshots::UiSnapshot;
use crate::view::ui::UIRenderer;

const INPUT_CHANNEL_CAPACITY: usize = 64;

/// Forward crossterm events into a channel until cancelled or the terminal
/// stream ends.
pub fn spawn_input_reader(cancel: CancellationToken) -> Receiver<Event> {
    let (event_tx, event_rx) = mpsc::channel::<Event>(INPUT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut event_stream: EventStream = EventStream::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,

                next = event_stream.next() => match next {
                    Some(Ok(event)) => {
                        trace!("Terminal event received: {:?}", event);
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Terminal input error: {e}");
                        break;
                    }
                    None => break,
                },
            }
        }

        debug!("Input reader stopped");
    });

    event_rx
}

pub struct EventLoop {
    manager: SessionManager,
    keymap: Keymap,
    launcher: Arc<dyn Launcher>,
    reports: UnboundedReceiver<LaunchReport>,
    renderer: UIRenderer,
    views: HashMap<SessionId, ViewState>,
    active: Option<SessionId>,
    notification: Option<Notification>,
    time_format: String,
}

impl EventLoop {
    pub fn new(
        manager: SessionManager,
        keymap: Keymap,
        launcher: Arc<dyn Launcher>,
        reports: UnboundedReceiver<LaunchReport>,
        time_format: String,
    ) -> Self {
        let mut event_loop: Self = Self {
            active: manager.ids().first().copied(),
            manager,
            keymap,
            launcher,
            reports,
            renderer: UIRenderer::new(),
            views: HashMap::new(),
            notification: None,
            time_format,
        };
        event_loop.sync_views();
        event_loop
    }

    #[must_use]
    pub const fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Run until the last session closes, input ends or `cancel` fires.
    pub async fn run<B: Backend + Send>(
        &mut self,
        terminal: &mut Terminal<B>,
        mut events: Receiver<Event>,
        mut ticks: Receiver<()>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        info!(sessions = self.manager.len(), "Event loop started");

        while !self.manager.is_empty() {
            self.draw(terminal)?;

            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                event = events.recv() => match event {
                    None => {
                        info!("Input closed");
                        break;
                    }
                    Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key, terminal, &mut events).await == Lifecycle::Shutdown {
                            break;
                        }
                    }
                    // Resize only needs the redraw at the top of the loop.
                    Some(_) => {}
                },

                Some(()) = ticks.recv() => self.refresh_stale().await,

                Some(report) = self.reports.recv() => self.on_report(report).await,
            }
        }

        info!(frames = self.renderer.stats().frames, "Event loop terminated cleanly");
        Ok(())
    }

    fn snapshot(&self) -> UiSnapshot {
        UiSnapshot::capture(
            &self.manager,
            self.active,
            &self.views,
            &self.time_format,
            self.notification.as_ref(),
        )
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let snap: UiSnapshot = self.snapshot();
        terminal
            .draw(|frame| self.renderer.render(frame, &snap))
            .context("Failed to draw terminal")?;
        Ok(())
    }

    async fn handle_key<B: Backend + Send>(
        &mut self,
        key: KeyEvent,
        terminal: &mut Terminal<B>,
        events: &mut Receiver<Event>,
    ) -> Lifecycle {
        self.notification = None;

        let commands: SmallVec<[Command; 2]> = self
            .keymap
            .dispatch_event(&key)
            .into_iter()
            .cloned()
            .collect();

        for command in commands {
            let label: &'static str = command.label();

            match self.execute(command, terminal, events).await {
                Ok(Lifecycle::Shutdown) => return Lifecycle::Shutdown,
                Ok(Lifecycle::Running) => {}
                Err(e) => {
                    warn!(command = label, "{e}");
                    self.notification = Some(Notification::error(e.to_string()));
                }
            }

            self.sync_views();
        }

        Lifecycle::Running
    }

    fn session(&self, id: SessionId) -> Result<&Session, AppError> {
        self.manager.session(id).ok_or(AppError::UnknownSession(id))
    }

    async fn execute<B: Backend + Send>(
        &mut self,
        command: Command,
        terminal: &mut Terminal<B>,
        events: &mut Receiver<Event>,
    ) -> Result<Lifecycle, AppError> {
        let Some(id) = self.active else {
            return Ok(Lifecycle::Shutdown);
        };
        debug!(command = command.label(), session = %id, "Executing command");

        match command {
            Command::MoveCursor { motion } => {
                let page: usize = self.renderer.page_rows();
                if let (Some(session), Some(view)) =
                    (self.manager.session(id), self.views.get_mut(&id))
                {
                    view.move_cursor(motion, session, page);
                }
            }

            Command::NewSession => {
                let path: PathBuf = self.session(id)?.current_path().to_path_buf();
                let opened: SessionId = self.manager.open_session(&path, &path).await?;
                self.active = Some(opened);
            }

            Command::CloseSession => return Ok(self.close(id)),

            Command::CycleSession => {
                let ids: Vec<SessionId> = self.manager.ids();
                self.active = ids
                    .iter()
                    .copied()
                    .find(|other| *other > id)
                    .or_else(|| ids.first().copied());
            }

            Command::Quit => {
                for open in self.manager.ids() {
                    self.manager.close_session(open);
                }
                self.views.clear();
                self.active = None;
                return Ok(Lifecycle::Shutdown);
            }

            Command::ToggleDotfiles => {
                self.manager.toggle_dotfiles(id).await?;
            }

            Command::SetPath { path } => {
                self.manager.navigate_to(id, Path::new(&path)).await?;
            }

            Command::PromptPath => {
                let backdrop: UiSnapshot = self.snapshot();
                let mut prompt = TuiPrompt::new(terminal, &mut self.renderer, events, backdrop);
                self.manager.navigate(id, None, &mut prompt).await?;
            }

            Command::Reload => {
                self.manager.reload(id).await?;
            }

            Command::Bookmark { index } => {
                self.manager.bookmark_jump(id, index).await?;
            }

            Command::MakeDirectory { mode } => {
                let backdrop: UiSnapshot = self.snapshot();
                let mut prompt = TuiPrompt::new(terminal, &mut self.renderer, events, backdrop);
                self.manager.make_directory(id, mode, &mut prompt).await?;
            }

            Command::Remove => {
                let names: Vec<CompactString> = match (self.manager.session(id), self.views.get(&id)) {
                    (Some(session), Some(view)) => view.targets(session),
                    _ => Vec::new(),
                };
                if names.is_empty() {
                    return Ok(Lifecycle::Running);
                }

                let result = self
                    .manager
                    .remove_selected(id, &names, self.launcher.as_ref())
                    .await;
                if let Some(view) = self.views.get_mut(&id) {
                    view.marked.clear();
                }
                result?;
            }

            Command::Activate => {
                let name: Option<CompactString> = match (self.manager.session(id), self.views.get(&id)) {
                    (Some(session), Some(view)) => view.selected(session).map(|e| e.name.clone()),
                    _ => None,
                };
                if let Some(name) = name {
                    self.manager
                        .exec_selected(id, &name, self.launcher.as_ref())
                        .await?;
                }
            }

            Command::ToggleMark => {
                if let (Some(session), Some(view)) =
                    (self.manager.session(id), self.views.get_mut(&id))
                {
                    view.toggle_mark(session);
                }
            }

            Command::DirExec { argv } => {
                self.manager
                    .exec_external(id, &argv, self.launcher.as_ref())?;
            }
        }

        Ok(Lifecycle::Running)
    }

    /// Close `id` and show the next session, if any.
    fn close(&mut self, id: SessionId) -> Lifecycle {
        let lifecycle: Lifecycle = self.manager.close_session(id);
        self.views.remove(&id);

        if self.active == Some(id) {
            let ids: Vec<SessionId> = self.manager.ids();
            self.active = ids
                .iter()
                .copied()
                .find(|other| *other > id)
                .or_else(|| ids.last().copied());
        }

        lifecycle
    }

    async fn refresh_stale(&mut self) {
        for (id, result) in self.manager.refresh_stale().await {
            if let Err(e) = result {
                warn!(session = %id, "Staleness check failed: {e}");
                self.notification = Some(Notification::warning(e.to_string()));
            }
        }
        self.sync_views();
    }

    async fn on_report(&mut self, report: LaunchReport) {
        let LaunchReport { request, result } = report;

        match result {
            Ok(()) => debug!(purpose = %request.purpose, "`{}` succeeded", request.command_line()),
            Err(e) => {
                self.notification = Some(Notification::error(format!("{}: {e}", request.purpose)));
            }
        }

        // The core reloaded right after launching; look again now that the
        // removal has actually happened.
        if request.purpose == LaunchPurpose::Remove {
            match self.manager.refresh_if_stale(request.session).await {
                Ok(_) | Err(AppError::UnknownSession(_)) => {}
                Err(e) => {
                    warn!(session = %request.session, "{e}");
                    self.notification = Some(Notification::warning(e.to_string()));
                }
            }
            self.sync_views();
        }
    }

    /// One view per open session, reconciled with its latest listing.
    fn sync_views(&mut self) {
        self.views.retain(|id, _| self.manager.session(*id).is_some());

        for session in self.manager.sessions() {
            self.views
                .entry(session.id())
                .and_modify(|view| view.reconcile(session))
                .or_insert_with(|| ViewState::for_session(session));
        }

        if self.active.is_none_or(|id| self.manager.session(id).is_none()) {
            self.active = self.manager.ids().first().copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandTemplates;
    use crate::controller::collaborators::LaunchRequest;
    use crate::controller::collaborators::testing::RecordingLauncher;
    use crate::model::session_manager::ManagerSettings;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedSender;

    struct Harness {
        event_loop: EventLoop,
        launcher: Arc<RecordingLauncher>,
        report_tx: UnboundedSender<LaunchReport>,
        root: PathBuf,
        _tmp: TempDir,
    }

    async fn harness() -> anyhow::Result<Harness> {
        let tmp = TempDir::new()?;
        let root = std::fs::canonicalize(tmp.path())?;
        std::fs::create_dir(root.join("sub"))?;
        std::fs::write(root.join("a.txt"), b"0123456789")?;

        let mut manager = SessionManager::new(ManagerSettings::default());
        manager.open_session(&root, Path::new("/")).await?;

        let launcher = Arc::new(RecordingLauncher::default());
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let event_loop = EventLoop::new(
            manager,
            Keymap::defaults(&CommandTemplates::default()),
            launcher.clone(),
            report_rx,
            "%Y".to_string(),
        );

        Ok(Harness {
            event_loop,
            launcher,
            report_tx,
            root,
            _tmp: tmp,
        })
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn typed(text: &str) -> Vec<Event> {
        text.chars()
            .map(|c| press(KeyCode::Char(c), KeyModifiers::NONE))
            .collect()
    }

    async fn run_keys(event_loop: &mut EventLoop, keys: Vec<Event>) -> anyhow::Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(100, 24))?;
        let (event_tx, event_rx) = mpsc::channel(keys.len() + 1);
        for key in keys {
            event_tx.send(key).await?;
        }
        drop(event_tx);

        let (_tick_tx, tick_rx) = mpsc::channel(1);
        event_loop
            .run(&mut terminal, event_rx, tick_rx, CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn marked_entries_are_removed() -> anyhow::Result<()> {
        let mut h = harness().await?;

        run_keys(
            &mut h.event_loop,
            vec![
                press(KeyCode::Down, KeyModifiers::NONE),
                press(KeyCode::Char(' '), KeyModifiers::NONE),
                press(KeyCode::Delete, KeyModifiers::NONE),
            ],
        )
        .await?;

        let requests: Vec<LaunchRequest> = h.launcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].purpose, LaunchPurpose::Remove);
        assert_eq!(requests[0].target, h.root.join("a.txt"));
        assert!(h.event_loop.views.values().all(|v| v.marked.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn prompt_creates_directory() -> anyhow::Result<()> {
        let mut h = harness().await?;

        let mut keys = vec![press(KeyCode::F(7), KeyModifiers::NONE)];
        keys.extend(typed("fresh"));
        keys.push(press(KeyCode::Enter, KeyModifiers::NONE));
        run_keys(&mut h.event_loop, keys).await?;

        assert!(h.root.join("fresh").is_dir());
        let session = h.event_loop.manager().sessions().next();
        assert!(session.and_then(|s| s.entry("fresh")).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn sessions_open_cycle_and_close() -> anyhow::Result<()> {
        let mut h = harness().await?;
        let ctrl = KeyModifiers::CONTROL;

        run_keys(
            &mut h.event_loop,
            vec![
                press(KeyCode::Char('n'), ctrl),
                press(KeyCode::Enter, KeyModifiers::NONE),
            ],
        )
        .await?;
        assert_eq!(h.event_loop.manager().len(), 2);

        let ids = h.event_loop.manager().ids();
        assert_eq!(h.event_loop.active, Some(ids[1]));
        // Enter on `sub/` moved only the second session.
        let paths: Vec<PathBuf> = h
            .event_loop
            .manager()
            .sessions()
            .map(|s| s.current_path().to_path_buf())
            .collect();
        assert_eq!(paths, [h.root.clone(), h.root.join("sub")]);

        run_keys(
            &mut h.event_loop,
            vec![
                press(KeyCode::Tab, KeyModifiers::NONE),
                press(KeyCode::Char('w'), ctrl),
                press(KeyCode::Char('w'), ctrl),
                press(KeyCode::Char('x'), KeyModifiers::NONE),
            ],
        )
        .await?;
        assert!(h.event_loop.manager().is_empty());
        assert!(h.event_loop.views.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_report_becomes_notification() -> anyhow::Result<()> {
        let mut h = harness().await?;
        let id = h.event_loop.manager().ids()[0];

        h.event_loop
            .on_report(LaunchReport {
                request: LaunchRequest {
                    session: id,
                    purpose: LaunchPurpose::Remove,
                    argv: vec!["rm".into()],
                    target: h.root.join("a.txt"),
                    workdir: h.root.clone(),
                },
                result: Err(AppError::ExternalCmd {
                    cmd: "rm".into(),
                    code: Some(1),
                    stderr: "denied".into(),
                }),
            })
            .await;

        let note = h.event_loop.notification.clone();
        assert!(note.is_some_and(|n| n.message.contains("denied")));

        // The sender side stays usable while the loop is alive.
        assert!(!h.report_tx.is_closed());
        Ok(())
    }

    #[tokio::test]
    async fn bad_path_reports_error_and_keeps_running() -> anyhow::Result<()> {
        let mut h = harness().await?;

        let mut keys = vec![press(KeyCode::Char('l'), KeyModifiers::CONTROL)];
        keys.push(press(KeyCode::Char('u'), KeyModifiers::CONTROL));
        keys.extend(typed("sub/../sub/nowhere"));
        keys.push(press(KeyCode::Enter, KeyModifiers::NONE));
        run_keys(&mut h.event_loop, keys).await?;

        let session = h.event_loop.manager().sessions().next();
        assert_eq!(
            session.map(Session::current_path),
            Some(h.root.join("sub").as_path())
        );
        assert!(h.event_loop.notification.is_none());
        Ok(())
    }
}

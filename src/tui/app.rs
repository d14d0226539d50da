//! Main TUI application state and logic
//!
//! The app owns the state holder and the view tree. Key presses become view
//! events; handlers answer with intents; local intents are applied here and
//! remote ones run on tokio tasks whose results come back over `async_rx`.
//! The screen is re-rendered when the state holder reports a change that
//! touches it.

use std::cell::RefCell;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::Terminal;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::{ApiClient, DraftAssembler, GenerateHandler, StreamCallbacks};
use crate::controllers::{self, CharacterController, Done, ProjectController, Refresh, Scope};
use crate::core::config::{AiModel, Config};
use crate::core::emitter::Listener;
use crate::core::models::{ProjectBundle, ProjectSummary};
use crate::core::state::{ProjectState, StateChange, STATE_CHANGED};
use crate::error::{LoomError, Result};
use crate::tui::event::{
    drag_gesture, is_back_key, is_force_quit_key, is_quit_key, typed_char, AppEvent, EventHandler,
};
use crate::tui::ui;
use crate::view::dnd::{self, ITEM_ID_ATTR};
use crate::view::intent::{Intent, Modal, Tab};
use crate::view::listeners::{EventKind, ListenerTracker, UiEvent};
use crate::view::node::{Node, Tag};
use crate::view::render::manuscript::{refresh_counts, ManuscriptView, CONTENT_FIELD};
use crate::view::render::modals::GENERATION_OUTPUT;
use crate::view::render::worldview::add_rule_field;
use crate::view::render::{
    render_characters, render_manuscript, render_modal, render_project_list, render_scenario,
    render_workspace, render_worldview, LiveValidation, RenderCtx,
};
use crate::view::toast::ToastQueue;
use crate::view::validation::{apply_result, hide_field_message, ValidationOutcome};

/// Container the current screen renders into
pub const SCREEN_ID: &str = "screen";
/// Container the open modal renders into
pub const MODAL_LAYER_ID: &str = "modal-layer";

/// Message type for async operation results
#[derive(Debug)]
pub enum AsyncMessage {
    /// Project list loaded
    ProjectsLoaded(Vec<ProjectSummary>),
    /// Project list load failed
    ProjectsError(LoomError),
    /// A project and everything shown for it loaded
    BundleLoaded {
        bundle: Box<ProjectBundle>,
        /// Background refresh; keeps the current focus and modal
        silent: bool,
    },
    /// Loading a project failed
    BundleError {
        project_id: String,
        error: LoomError,
        silent: bool,
        /// Unlock button to re-enable
        trigger: Option<String>,
    },
    /// A controller call returned
    Finished {
        /// Button disabled while the call ran
        trigger: Option<String>,
        /// The call persisted a drop the view already shows
        dropped: bool,
        result: Result<Done>,
    },
    /// One line of streamed character output
    GenerationChunk(String),
}

/// Current screen in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    ProjectList,
    Workspace,
}

/// Error popup for failures that need acknowledgement
#[derive(Debug, Clone)]
pub struct ErrorPopup {
    /// Title of the error popup (e.g., "Save failed")
    pub title: String,
    /// The full error message to display
    pub message: String,
}

/// Main TUI application
pub struct App {
    /// Whether the app is running
    pub running: bool,
    /// Current screen
    pub current_screen: Screen,
    /// Active workspace tab
    pub tab: Tab,
    /// Last snapshot from the server
    pub state: ProjectState,
    /// The whole view: screen container plus modal layer
    pub root: Node,
    /// Id of the focused node
    pub focus: Option<String>,
    /// Open modal, rendered into the modal layer
    pub modal: Option<Modal>,
    /// Block open in the manuscript editor
    pub selected_block: Option<String>,
    /// Model used for AI calls
    pub model: AiModel,
    pub toasts: ToastQueue,
    pub error_popup: Option<ErrorPopup>,
    /// Whether to show the help overlay
    pub show_help: bool,
    /// Requests in flight
    pub pending: usize,
    /// Tick counter for spinner animation
    pub tick_counter: u64,

    tracker: ListenerTracker,
    live: LiveValidation,
    validation_rx: mpsc::Receiver<ValidationOutcome>,
    async_tx: mpsc::Sender<AsyncMessage>,
    async_rx: mpsc::Receiver<AsyncMessage>,
    client: ApiClient,
    config: Config,
    config_path: PathBuf,
    /// Project requested by the user; stale loads for other ids are ignored
    opening: Option<String>,
    last_refresh: Instant,
    /// State changes published since the view was last synced
    unseen: Rc<RefCell<Vec<StateChange>>>,
}

impl App {
    pub fn new(config: Config, config_path: PathBuf, client: ApiClient) -> Self {
        let (async_tx, async_rx) = mpsc::channel(32);
        let (validation_tx, validation_rx) = mpsc::channel(32);
        let live = LiveValidation::new(validation_tx, config.debounce());

        let root = Node::div()
            .with_id("app")
            .with_child(Node::div().with_id(SCREEN_ID))
            .with_child(Node::div().with_id(MODAL_LAYER_ID));

        let state = ProjectState::new();
        let unseen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&unseen);
        let on_change: Listener<StateChange> = Rc::new(move |change: &StateChange| {
            sink.borrow_mut().push(*change);
            Ok(())
        });
        state.events().on(STATE_CHANGED, on_change);

        Self {
            running: true,
            current_screen: Screen::ProjectList,
            tab: Tab::default(),
            state,
            root,
            focus: None,
            modal: None,
            selected_block: None,
            model: config.ai_model,
            toasts: ToastQueue::default(),
            error_popup: None,
            show_help: false,
            pending: 0,
            tick_counter: 0,
            tracker: ListenerTracker::new(),
            live,
            validation_rx,
            async_tx,
            async_rx,
            client,
            config,
            config_path,
            opening: None,
            last_refresh: Instant::now(),
            unseen,
        }
    }

    /// Setup terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().map_err(|e| LoomError::Terminal(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .map_err(|e| LoomError::Terminal(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(|e| LoomError::Terminal(e.to_string()))?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode().map_err(|e| LoomError::Terminal(e.to_string()))?;
        execute!(
            terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen
        )
        .map_err(|e| LoomError::Terminal(e.to_string()))?;
        terminal
            .show_cursor()
            .map_err(|e| LoomError::Terminal(e.to_string()))?;
        Ok(())
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;
        let mut events = EventHandler::new(Duration::from_millis(250));

        self.render_screen();
        self.fetch_projects();

        while self.running {
            terminal
                .draw(|frame| ui::render(frame, self))
                .map_err(|e| LoomError::Terminal(e.to_string()))?;

            self.drain_messages();

            if let Some(event) = events.next().await {
                match event {
                    AppEvent::Key(key) => self.handle_key_event(key),
                    AppEvent::Paste(text) => self.edit_focused(|value| value.push_str(&text)),
                    AppEvent::Resize(_, _) => {
                        // Terminal resize is handled automatically by ratatui
                    }
                    AppEvent::Tick => {
                        self.tick_counter = self.tick_counter.wrapping_add(1);
                        self.toasts.prune();
                        self.maybe_refresh();
                    }
                }
            }
        }

        Self::restore_terminal(&mut terminal)?;
        Ok(())
    }

    /// Apply every finished background result (non-blocking)
    pub fn drain_messages(&mut self) {
        while let Ok(outcome) = self.validation_rx.try_recv() {
            apply_result(&mut self.root, &outcome.field_id, &outcome.result);
        }
        while let Ok(msg) = self.async_rx.try_recv() {
            self.handle_async_message(msg);
        }
        self.sync_view();
    }

    /// Re-render the screen if a state change since the last sync shows on it
    fn sync_view(&mut self) {
        let changes: Vec<StateChange> = self.unseen.borrow_mut().drain(..).collect();
        let affected = changes.iter().any(|change| match (self.current_screen, change) {
            (_, StateChange::Cleared) => true,
            (Screen::ProjectList, StateChange::Projects) => true,
            (Screen::Workspace, StateChange::Project) => true,
            (Screen::Workspace, StateChange::Scenarios) => {
                matches!(self.tab, Tab::Scenario | Tab::Manuscript)
            }
            (Screen::Workspace, StateChange::Manuscript) => self.tab == Tab::Manuscript,
            _ => false,
        });
        if affected {
            self.render_screen();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Async results
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_async_message(&mut self, msg: AsyncMessage) {
        match msg {
            AsyncMessage::ProjectsLoaded(projects) => {
                self.end_request(None);
                if let Err(e) = self.state.set_projects(projects) {
                    tracing::error!("State listener failed: {}", e);
                }
                self.sync_view();
            }
            AsyncMessage::ProjectsError(error) => {
                self.end_request(None);
                self.report("Could not load projects", &error);
            }
            AsyncMessage::BundleLoaded { bundle, silent } => {
                self.end_request(None);
                self.show_project(*bundle, silent);
            }
            AsyncMessage::BundleError {
                project_id,
                error,
                silent,
                trigger,
            } => {
                self.end_request(trigger.as_deref());
                let unlocking = matches!(self.modal, Some(Modal::UnlockProject { .. }));
                if error.is_auth_failure() && !unlocking {
                    let name = self.project_name(&project_id);
                    self.open_modal(Modal::UnlockProject { project_id, name });
                } else if silent {
                    tracing::warn!("Background refresh of {} failed: {}", project_id, error);
                } else {
                    self.report("Could not open project", &error);
                }
            }
            AsyncMessage::Finished {
                trigger,
                dropped,
                result,
            } => {
                self.end_request(trigger.as_deref());
                match result {
                    Ok(done) => self.apply_done(done),
                    Err(error) => {
                        // The view shows an order the server refused; go back
                        // to the last snapshot
                        if dropped && self.current_screen == Screen::Workspace {
                            self.render_screen();
                        }
                        self.report("Request failed", &error);
                    }
                }
            }
            AsyncMessage::GenerationChunk(line) => {
                if let Some(output) = self.root.find_by_id_mut(GENERATION_OUTPUT) {
                    output.text.push_str(&line);
                    output.text.push('\n');
                }
            }
        }
    }

    /// Put a loaded project on screen
    pub fn show_project(&mut self, bundle: ProjectBundle, silent: bool) {
        let project_id = bundle.project.id.clone();
        let expected = self.opening.as_deref() == Some(project_id.as_str())
            || self.state.current_id() == Some(project_id.as_str());
        if !expected {
            tracing::debug!("Ignoring stale load of {}", project_id);
            return;
        }

        self.last_refresh = Instant::now();
        self.opening = None;
        self.current_screen = Screen::Workspace;
        if let Err(e) = self.state.apply_bundle(bundle) {
            tracing::error!("State listener failed: {}", e);
        }
        if let Some(block_id) = &self.selected_block {
            if !self.state.manuscript().iter().any(|b| &b.id == block_id) {
                self.selected_block = None;
            }
        }

        if !silent {
            if matches!(self.modal, Some(Modal::UnlockProject { .. })) {
                self.close_modal();
            }
            self.focus = None;
        }
        self.sync_view();
    }

    fn apply_done(&mut self, done: Done) {
        tracing::debug!("Done: {}", done.message);
        self.toasts.success(done.message);
        if self.modal.is_some() && !done.keep_modal {
            self.close_modal();
        }

        let first = done.fills.first().map(|f| f.field_id.clone());
        for fill in done.fills {
            if let Some(field) = self.root.find_by_id_mut(&fill.field_id) {
                field.value = fill.value;
            }
            hide_field_message(&mut self.root, &fill.field_id);
        }
        if let Some(field_id) = first {
            self.set_focus(Some(field_id));
        }

        match done.refresh {
            Refresh::Nothing => {}
            Refresh::Projects => self.fetch_projects(),
            Refresh::Project => self.reload_project(false),
        }
    }

    /// Log a failure and surface it
    ///
    /// Input problems and 4xx answers go to a toast; anything else opens the
    /// alert popup.
    fn report(&mut self, title: &str, error: &LoomError) {
        tracing::error!("{}: {}", title, error);
        match error {
            LoomError::InvalidInput(_) | LoomError::Api { status: 400..=499, .. } => {
                self.toasts.error(error.to_string())
            }
            _ => {
                self.error_popup = Some(ErrorPopup {
                    title: title.to_string(),
                    message: error.to_string(),
                })
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    fn begin_request(&mut self, trigger: Option<&str>) {
        self.pending += 1;
        if let Some(id) = trigger {
            self.root.set_disabled(id, true);
        }
    }

    fn end_request(&mut self, trigger: Option<&str>) {
        self.pending = self.pending.saturating_sub(1);
        if let Some(id) = trigger {
            self.root.set_disabled(id, false);
        }
    }

    /// Project context for controller calls
    pub fn scope(&self) -> Scope {
        match self.state.current() {
            Some(project) => Scope::from_project(project, self.model),
            None => Scope::new("", self.model),
        }
    }

    fn project_name(&self, project_id: &str) -> String {
        self.state
            .projects()
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| project_id.to_string())
    }

    /// Spawn a task to fetch the project list
    pub fn fetch_projects(&mut self) {
        self.begin_request(None);
        let client = self.client.clone();
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            let msg = match ProjectController::new(&client).list().await {
                Ok(projects) => AsyncMessage::ProjectsLoaded(projects),
                Err(e) => AsyncMessage::ProjectsError(e),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn open_project(&mut self, project_id: String, protected: bool) {
        self.opening = Some(project_id.clone());
        self.begin_request(None);
        let client = self.client.clone();
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            let msg = match ProjectController::new(&client)
                .open(&project_id, protected)
                .await
            {
                Ok(bundle) => AsyncMessage::BundleLoaded {
                    bundle: Box::new(bundle),
                    silent: false,
                },
                Err(error) => AsyncMessage::BundleError {
                    project_id,
                    error,
                    silent: false,
                    trigger: None,
                },
            };
            let _ = tx.send(msg).await;
        });
    }

    fn unlock_project(&mut self, project_id: String, password: String, trigger: Option<String>) {
        self.opening = Some(project_id.clone());
        self.begin_request(trigger.as_deref());
        let client = self.client.clone();
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            let msg = match ProjectController::new(&client)
                .unlock(&project_id, &password)
                .await
            {
                Ok(bundle) => AsyncMessage::BundleLoaded {
                    bundle: Box::new(bundle),
                    silent: false,
                },
                Err(error) => AsyncMessage::BundleError {
                    project_id,
                    error,
                    silent: false,
                    trigger,
                },
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Re-read the open project
    fn reload_project(&mut self, silent: bool) {
        let Some(project_id) = self.state.current_id().map(str::to_string) else {
            return;
        };
        self.begin_request(None);
        let client = self.client.clone();
        let tx = self.async_tx.clone();
        self.last_refresh = Instant::now();

        tokio::spawn(async move {
            let msg = match ProjectController::new(&client).load_bundle(&project_id).await {
                Ok(bundle) => AsyncMessage::BundleLoaded {
                    bundle: Box::new(bundle),
                    silent,
                },
                Err(error) => AsyncMessage::BundleError {
                    project_id,
                    error,
                    silent,
                    trigger: None,
                },
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Periodic refresh, skipped while the user is typing or in a dialog
    fn maybe_refresh(&mut self) {
        if self.current_screen != Screen::Workspace
            || self.pending > 0
            || self.modal.is_some()
            || self.editing()
        {
            return;
        }
        if self.last_refresh.elapsed() >= self.config.refresh_interval() {
            tracing::debug!("Periodic refresh");
            self.reload_project(true);
        }
    }

    /// Run a remote intent through its controller
    fn run_controller(&mut self, intent: Intent, trigger: Option<String>) {
        let scope = self.scope();
        let client = self.client.clone();
        let tx = self.async_tx.clone();
        let dropped = intent.is_drop();
        self.begin_request(trigger.as_deref());

        tokio::spawn(async move {
            let result = controllers::run(&client, &scope, intent).await;
            let _ = tx
                .send(AsyncMessage::Finished {
                    trigger,
                    dropped,
                    result,
                })
                .await;
        });
    }

    /// Stream a character into the generation modal, then save it
    fn generate_character(&mut self, keywords: String, trigger: Option<String>) {
        let scope = self.scope();
        let request = match CharacterController::new(&self.client, &scope).generation_request(&keywords)
        {
            Ok(request) => request,
            Err(e) => return self.report("Generation failed", &e),
        };
        if let Some(output) = self.root.find_by_id_mut(GENERATION_OUTPUT) {
            output.text.clear();
        }

        let client = self.client.clone();
        let tx = self.async_tx.clone();
        self.begin_request(trigger.as_deref());

        tokio::spawn(async move {
            let mut assembler = DraftAssembler::new();
            let mut failure: Option<LoomError> = None;
            {
                let chunk_tx = tx.clone();
                let mut handler = StreamCallbacks {
                    on_chunk: |chunk: Value| {
                        let line = assembler.push(&chunk);
                        if chunk_tx.try_send(AsyncMessage::GenerationChunk(line)).is_err() {
                            tracing::debug!("Generation preview line dropped");
                        }
                    },
                    on_complete: || tracing::debug!("Character stream complete"),
                    on_error: |e: LoomError| failure = Some(e),
                };
                GenerateHandler::new(&client)
                    .character_stream(&scope.project_id, &request, &mut handler)
                    .await;
            }

            let result = match failure {
                Some(e) => Err(e),
                None => match assembler.finish() {
                    Ok(draft) => {
                        CharacterController::new(&client, &scope)
                            .save_generated(&draft)
                            .await
                    }
                    Err(e) => Err(e),
                },
            };
            let _ = tx
                .send(AsyncMessage::Finished {
                    trigger,
                    dropped: false,
                    result,
                })
                .await;
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Intents
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_intent(&mut self, intent: Intent, trigger: Option<String>) {
        match intent {
            Intent::OpenProject {
                project_id,
                protected,
            } => self.open_project(project_id, protected),
            Intent::BackToProjects => self.back_to_projects(),
            Intent::SwitchTab(tab) => {
                self.tab = tab;
                self.focus = None;
                self.render_screen();
            }
            Intent::OpenModal(modal) => self.open_modal(modal),
            Intent::CloseModal => self.close_modal(),
            Intent::Refresh => match self.current_screen {
                Screen::ProjectList => self.fetch_projects(),
                Screen::Workspace => self.reload_project(false),
            },
            Intent::CycleModel => self.cycle_model(),
            Intent::AddRuleField => {
                if let Some(id) = add_rule_field(&mut self.root) {
                    self.set_focus(Some(id));
                }
            }
            Intent::FieldValidated { field_id, result } => {
                apply_result(&mut self.root, &field_id, &result)
            }
            Intent::SelectBlock { block_id } => {
                self.selected_block = Some(block_id);
                self.render_screen();
            }
            Intent::UnlockProject {
                project_id,
                password,
            } => self.unlock_project(project_id, password, trigger),
            Intent::GenerateCharacter { keywords } => self.generate_character(keywords, trigger),
            other => self.run_controller(other, trigger),
        }
    }

    fn back_to_projects(&mut self) {
        self.opening = None;
        self.selected_block = None;
        self.modal = None;
        self.render_modal();
        self.current_screen = Screen::ProjectList;
        self.focus = None;
        if let Err(e) = self.state.clear_project() {
            tracing::error!("State listener failed: {}", e);
        }
        self.sync_view();
        self.fetch_projects();
    }

    fn cycle_model(&mut self) {
        self.model = self.model.next();
        self.config.set_ai_model(self.model);
        // Re-read the file so run-time URL overrides are not persisted
        let saved = Config::load_from(&self.config_path).and_then(|mut stored| {
            stored.set_ai_model(self.model);
            stored.save_to(&self.config_path)
        });
        if let Err(e) = saved {
            tracing::warn!("Could not save model choice: {}", e);
        }
        if let Some(button) = self.root.find_by_id_mut("btn-model") {
            button.text = format!("Model: {}", self.model.display_name());
        }
        self.toasts
            .info(format!("AI model: {}", self.model.display_name()));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering into the tree
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the current screen from state
    pub fn render_screen(&mut self) {
        if let Some(screen) = self.root.find_by_id_mut(SCREEN_ID) {
            let mut ctx = RenderCtx::new(&mut self.tracker, &self.live);
            match self.current_screen {
                Screen::ProjectList => render_project_list(&mut ctx, screen, self.state.projects()),
                Screen::Workspace => {
                    if let Some(project) = self.state.current() {
                        let container_id =
                            render_workspace(&mut ctx, screen, &project.name, self.tab, self.model);
                        if let Some(container) = screen.find_by_id_mut(container_id) {
                            match self.tab {
                                Tab::Characters => render_characters(&mut ctx, container, project),
                                Tab::Worldview => render_worldview(&mut ctx, container, project),
                                Tab::Scenario => {
                                    render_scenario(&mut ctx, container, self.state.scenario())
                                }
                                Tab::Manuscript => render_manuscript(
                                    &mut ctx,
                                    container,
                                    &ManuscriptView {
                                        blocks: self.state.manuscript(),
                                        selected: self.selected_block.as_deref(),
                                        project,
                                        scenario: self.state.scenario(),
                                    },
                                ),
                            }
                        }
                    }
                }
            }
        }
        self.ensure_focus();
    }

    fn render_modal(&mut self) {
        if let Some(layer) = self.root.find_by_id_mut(MODAL_LAYER_ID) {
            let mut ctx = RenderCtx::new(&mut self.tracker, &self.live);
            match &self.modal {
                Some(modal) => render_modal(&mut ctx, layer, modal, &self.state),
                None => ctx.replace(layer, |_| Vec::new()),
            }
        }
    }

    pub fn open_modal(&mut self, modal: Modal) {
        self.modal = Some(modal);
        self.render_modal();
        self.focus = None;
        self.ensure_focus();
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.render_modal();
        self.focus = None;
        self.ensure_focus();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Focus
    // ─────────────────────────────────────────────────────────────────────────

    /// Focusable ids of the active layer
    fn focus_scope(&self) -> Vec<String> {
        let layer = if self.modal.is_some() {
            MODAL_LAYER_ID
        } else {
            SCREEN_ID
        };
        self.root
            .find_by_id(layer)
            .map(|n| n.focusable_ids())
            .unwrap_or_default()
    }

    /// Keep focus on something that still exists
    fn ensure_focus(&mut self) {
        let ids = self.focus_scope();
        let valid = self
            .focus
            .as_ref()
            .is_some_and(|f| ids.iter().any(|id| id == f));
        if !valid {
            self.focus = ids.into_iter().next();
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let ids = self.focus_scope();
        if ids.is_empty() {
            self.set_focus(None);
            return;
        }
        let next = match self
            .focus
            .as_ref()
            .and_then(|f| ids.iter().position(|id| id == f))
        {
            Some(pos) => (pos as isize + delta).rem_euclid(ids.len() as isize) as usize,
            None => 0,
        };
        self.set_focus(Some(ids[next].clone()));
    }

    /// Move focus, dispatching `blur` on the field being left
    fn set_focus(&mut self, next: Option<String>) {
        if self.focus == next {
            return;
        }
        if let Some(prev) = self.focus.take() {
            let left = self
                .root
                .find_by_id(&prev)
                .filter(|n| n.tag.is_editable())
                .map(|n| n.value.clone());
            if let Some(value) = left {
                self.dispatch(UiEvent::new(EventKind::Blur, prev).with_value(value));
            }
        }
        self.focus = next;
    }

    fn focused(&self) -> Option<&Node> {
        self.focus.as_deref().and_then(|id| self.root.find_by_id(id))
    }

    /// Whether keys currently go into a text field
    pub fn editing(&self) -> bool {
        self.focused()
            .is_some_and(|n| n.tag.is_editable() && !n.disabled)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Route `event` through the tree and act on the resulting intents
    pub fn dispatch(&mut self, event: UiEvent) {
        let intents = self.tracker.dispatch(&self.root, &event);
        let trigger = (event.kind == EventKind::Click).then(|| event.target_id.clone());
        for intent in intents {
            self.handle_intent(intent, trigger.clone());
        }
    }

    /// Change the focused field's value and dispatch `input`
    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(id) = self.focus.clone() else {
            return;
        };
        let value = match self.root.find_by_id_mut(&id) {
            Some(node) if node.tag.is_editable() && !node.disabled => {
                edit(&mut node.value);
                node.value.clone()
            }
            _ => return,
        };
        if id == CONTENT_FIELD {
            refresh_counts(&mut self.root);
        }
        self.dispatch(UiEvent::new(EventKind::Input, id).with_value(value));
    }

    /// Move the focused sortable item, then drop it on the receiving list
    fn drag_focused(&mut self, delta: isize, across: bool) {
        let Some(node_id) = self.focus.clone() else {
            return;
        };
        let Some(item_id) = self
            .root
            .find_by_id(&node_id)
            .and_then(|n| n.attr(ITEM_ID_ATTR))
            .map(str::to_string)
        else {
            return;
        };

        let target = if across {
            dnd::move_item_across(&mut self.root, &node_id, delta)
        } else {
            dnd::shift_item(&mut self.root, &node_id, delta)
        };
        match target {
            Some(list_id) => {
                self.dispatch(UiEvent::new(EventKind::Drop, list_id).with_value(item_id))
            }
            None => self.toasts.info("Can't move any further"),
        }
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // If help is shown, any key dismisses it
        if self.show_help {
            self.show_help = false;
            return;
        }

        // If error popup is shown, only allow dismissal keys
        if self.error_popup.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.error_popup = None;
            }
            return;
        }

        if is_force_quit_key(&key) {
            self.quit();
            return;
        }

        if self.editing() && self.handle_edit_key(key) {
            return;
        }

        if let Some((delta, across)) = drag_gesture(&key) {
            self.drag_focused(delta, across);
            return;
        }

        if is_back_key(&key) || is_quit_key(&key) {
            self.go_back(is_quit_key(&key));
            return;
        }

        match key.code {
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => self.move_focus(-1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.focus.clone() {
                    self.dispatch(UiEvent::click(id));
                }
            }
            KeyCode::Char('r') => self.handle_intent(Intent::Refresh, None),
            KeyCode::Char('m') => self.cycle_model(),
            KeyCode::Char('n') if self.modal.is_none() => match self.current_screen {
                Screen::ProjectList => self.open_modal(Modal::CreateProject),
                Screen::Workspace => {}
            },
            KeyCode::Char(c) if self.modal.is_none() && self.current_screen == Screen::Workspace => {
                if let Some(tab) = Tab::from_digit(c) {
                    self.handle_intent(Intent::SwitchTab(tab), None);
                }
            }
            _ => {}
        }
    }

    /// Keys typed into a focused field; false lets navigation keys through
    fn handle_edit_key(&mut self, key: KeyEvent) -> bool {
        let multiline = self.focused().is_some_and(|n| n.tag == Tag::TextArea);

        if let Some(c) = typed_char(&key) {
            self.edit_focused(|value| value.push(c));
            return true;
        }
        match key.code {
            KeyCode::Backspace => {
                self.edit_focused(|value| {
                    value.pop();
                });
                true
            }
            KeyCode::Enter if multiline => {
                self.edit_focused(|value| value.push('\n'));
                true
            }
            KeyCode::Enter => {
                if let Some(id) = self.focus.clone() {
                    let value = self.root.value_of(&id).to_string();
                    self.dispatch(UiEvent::new(EventKind::Change, id).with_value(value));
                }
                self.move_focus(1);
                true
            }
            _ => false,
        }
    }

    /// Esc / q: close the dialog, leave the project, or quit
    fn go_back(&mut self, quit_at_top: bool) {
        if self.modal.is_some() {
            self.close_modal();
        } else if self.current_screen == Screen::Workspace {
            self.back_to_projects();
        } else if quit_at_top {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}

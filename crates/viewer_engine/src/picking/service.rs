//! Cross-thread picking service
//!
//! Three parties share the selection state:
//!
//! - the UI thread forwards pointer and key events, which arm pick requests
//!   and end interactive selections;
//! - the render thread, the only one that draws, renders the identifier (or
//!   plane) pass for an armed request and publishes it to the mailbox;
//! - the poller, a permanent job on the worker pool, consumes published
//!   frames on a fixed tick and applies them to the selection.
//!
//! Script-style callers block in `start_selection*` on a condition variable
//! until the UI thread (or the poller, for plane picks) releases them.
//!
//! Lock order is selection state first, scene graph second.

use crate::config::ViewerConfig;
use crate::foundation::math::Point3;
use crate::foundation::workers::WorkerPool;
use crate::input::{Gesture, KeyEvent, Modifiers, NamedKey, PointerEvent, PointerEventKind, PointerTracker};
use crate::picking::cancel::CondvarWaker;
use crate::picking::{
    BoxAction, CancelToken, GroundPlane, InstanceMap, Mailbox, PickColor, PickingError, PickingIndex,
    PixelRect, PlanePicker, SelectionMode, SelectionSession,
};
use crate::render::{GeometryKind, RenderError};
use crate::scene::{NodeId, SceneGraph};
use crossbeam::channel::{self, Receiver, Sender};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Poller plus at least one worker for blocking callers
const MIN_POOL_SIZE: usize = 2;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// What the render thread should draw for the next pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickRequest {
    /// Single pixel pick; `mode` overrides the persistent mode for this pick
    Point {
        /// Column
        x: u32,
        /// Row
        y: u32,
        /// Mode triggered by a modifier key, if any
        mode: Option<SelectionMode>,
    },
    /// Box drag; only `rect` is rendered
    Region {
        /// Dragged rectangle
        rect: PixelRect,
        /// Add or remove the covered objects
        action: BoxAction,
    },
    /// Ground plane pick for a waiting `start_selection_on_plane`
    Plane {
        /// Column
        x: u32,
        /// Row
        y: u32,
        /// Snap the result to the plane grid
        snap: bool,
    },
}

/// Rendered pass handed from the render thread to the poller
#[derive(Debug)]
pub struct PickFrame {
    /// Request the pass was rendered for
    pub request: PickRequest,
    /// Read-back pixels
    pub map: InstanceMap,
}

/// Signal asking the windowing layer to schedule a normal redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequest;

/// Render-thread capability used by the service
pub trait PickRenderer {
    /// Draw the identifier pass, restricted to `region` when given
    fn render_identifiers(&mut self, scene: &SceneGraph, region: Option<PixelRect>) -> Result<InstanceMap, RenderError>;

    /// Draw the barycentric colour pass of `plane`
    fn render_plane(&mut self, plane: &GroundPlane) -> Result<InstanceMap, RenderError>;
}

#[derive(Debug)]
struct SelectionState {
    index: PickingIndex<NodeId>,
    session: SelectionSession,
    armed: Option<PickRequest>,
    interaction_active: bool,
}

#[derive(Debug)]
struct Shared {
    state: Arc<(Mutex<SelectionState>, Condvar)>,
    scene: Arc<RwLock<SceneGraph>>,
    mailbox: Mailbox<PickFrame>,
    redraw_tx: Sender<RedrawRequest>,
    plane: GroundPlane,
    stopped: AtomicBool,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, SelectionState> {
        self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_scene(&self) -> RwLockReadGuard<'_, SceneGraph> {
        self.scene.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_scene(&self) -> RwLockWriteGuard<'_, SceneGraph> {
        self.scene.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.state.1.notify_all();
    }

    fn request_redraw(&self) {
        // Nobody listening is fine: the viewer may be headless
        let _ = self.redraw_tx.send(RedrawRequest);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Decode the pending frame, if any; returns whether one was consumed
    fn service_pending_frame(&self) -> bool {
        let Some(frame) = self.mailbox.take() else {
            return false;
        };

        let mut guard = self.lock_state();
        let state = &mut *guard;
        match frame.request {
            PickRequest::Point { x, y, mode } => {
                let mut scene = self.write_scene();
                if let Some(mode) = mode {
                    state.session.begin_transient(mode);
                }
                state.session.select_one(&state.index, &mut scene, x, y, &frame.map);
                if mode.is_some() {
                    state.session.end_transient();
                }
            }
            PickRequest::Region { action, .. } => {
                let mut scene = self.write_scene();
                state.session.select_region(&state.index, &mut scene, &frame.map, action);
            }
            PickRequest::Plane { x, y, snap } => {
                if state.session.wait_plane.is_some() {
                    let point = self.plane.pick_plane(x, y, &frame.map, snap);
                    log::debug!("plane pick at ({x}, {y}) resolved to {point:?}");
                    state.session.plane_point = point;
                    state.session.wait_plane = None;
                }
            }
        }
        drop(guard);

        self.notify();
        self.request_redraw();
        true
    }
}

fn poll_loop(shared: Arc<Shared>, interval: Duration, shutdown: Receiver<()>, done: Sender<()>) {
    log::info!("picking poller started ({} ms interval)", interval.as_millis());
    let ticker = channel::tick(interval);
    loop {
        crossbeam::select! {
            recv(ticker) -> _ => {
                shared.service_pending_frame();
            }
            recv(shutdown) -> _ => break,
        }
    }
    log::info!("picking poller stopped");
    let _ = done.send(());
}

/// Owner of the picking poller
///
/// Dereferences to a [`PickingHandle`]; clone handles out with
/// [`PickingService::handle`] to use them from other threads. Dropping the
/// service stops the poller and releases blocked callers with
/// [`PickingError::ServiceStopped`].
#[derive(Debug)]
pub struct PickingService {
    handle: PickingHandle,
    pool: Arc<WorkerPool>,
    shutdown_tx: Option<Sender<()>>,
    poller_done: Receiver<()>,
    redraw_rx: Receiver<RedrawRequest>,
}

impl PickingService {
    /// Start the service, spawning the poller on `pool`
    pub fn new(config: &ViewerConfig, scene: Arc<RwLock<SceneGraph>>, pool: Arc<WorkerPool>) -> Result<Self, PickingError> {
        if pool.size() < MIN_POOL_SIZE {
            return Err(PickingError::PoolTooSmall {
                required: MIN_POOL_SIZE,
                actual: pool.size(),
            });
        }

        let picking = &config.picking;
        let pointer = PointerTracker::default().with_drag_threshold(picking.drag_threshold_px);
        let state = SelectionState {
            index: PickingIndex::new(picking.seed, picking.registry_warn_threshold),
            session: SelectionSession::new(pointer),
            armed: None,
            interaction_active: false,
        };

        let (redraw_tx, redraw_rx) = channel::unbounded();
        let shared = Arc::new(Shared {
            state: Arc::new((Mutex::new(state), Condvar::new())),
            scene,
            mailbox: Mailbox::new(),
            redraw_tx,
            plane: config.plane,
            stopped: AtomicBool::new(false),
        });

        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        let (done_tx, poller_done) = channel::bounded(1);
        let poller_shared = Arc::clone(&shared);
        let interval = picking.poll_interval();
        pool.execute(move || poll_loop(poller_shared, interval, shutdown_rx, done_tx))?;

        log::info!("picking service started");
        Ok(Self {
            handle: PickingHandle { shared },
            pool,
            shutdown_tx: Some(shutdown_tx),
            poller_done,
            redraw_rx,
        })
    }

    /// Cloneable handle for other threads
    pub fn handle(&self) -> PickingHandle {
        self.handle.clone()
    }

    /// Redraw requests raised after picks are armed or applied
    pub fn redraw_requests(&self) -> Receiver<RedrawRequest> {
        self.redraw_rx.clone()
    }

    /// Run a script-style job on the worker pool
    ///
    /// The job gets its own handle, so it may block in `start_selection*`.
    /// Its return value arrives on the returned channel.
    pub fn run_script<F, R>(&self, script: F) -> Result<Receiver<R>, PickingError>
    where
        F: FnOnce(PickingHandle) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let handle = self.handle();
        self.pool.execute(move || {
            let _ = tx.send(script(handle));
        })?;
        Ok(rx)
    }
}

impl Deref for PickingService {
    type Target = PickingHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for PickingService {
    fn drop(&mut self) {
        let shared = &self.handle.shared;
        shared.stopped.store(true, Ordering::SeqCst);
        drop(shared.lock_state());
        shared.notify();

        // Disconnecting the shutdown channel ends the poller loop
        self.shutdown_tx.take();
        if self.poller_done.recv_timeout(SHUTDOWN_TIMEOUT).is_err() {
            log::warn!("picking poller did not stop within {:?}", SHUTDOWN_TIMEOUT);
        }
        log::info!("picking service stopped");
    }
}

/// Thread-safe access to the picking service
#[derive(Debug, Clone)]
pub struct PickingHandle {
    shared: Arc<Shared>,
}

impl PickingHandle {
    /// Scene graph shared with the service
    pub fn scene(&self) -> Arc<RwLock<SceneGraph>> {
        Arc::clone(&self.shared.scene)
    }

    /// Give `id` an identifier colour so it can be picked
    pub fn register(&self, id: NodeId) -> Result<PickColor, PickingError> {
        let mut state = self.shared.lock_state();
        let mut scene = self.shared.write_scene();
        scene.node(id)?;
        let color = state.index.register(id)?;
        scene.set_pick_color(id, Some(color))?;
        Ok(color)
    }

    /// Register every node with geometry in the subtree rooted at `root`
    pub fn register_subtree(&self, root: NodeId) -> Result<Vec<(NodeId, PickColor)>, PickingError> {
        let mut state = self.shared.lock_state();
        let mut scene = self.shared.write_scene();

        let mut registered = Vec::new();
        for id in scene.subtree(root)? {
            if scene.node(id)?.geometry().is_none() {
                continue;
            }
            let color = state.index.register(id)?;
            scene.set_pick_color(id, Some(color))?;
            registered.push((id, color));
        }
        log::debug!("registered {} pickable node(s) under {:?}", registered.len(), root);
        Ok(registered)
    }

    /// Release the colour of `id`
    pub fn unregister(&self, id: NodeId) -> Option<PickColor> {
        let mut state = self.shared.lock_state();
        let color = state.index.unregister_object(id)?;
        let mut scene = self.shared.write_scene();
        // The node may already be gone
        let _ = scene.set_pick_color(id, None);
        Some(color)
    }

    /// Colour assigned to `id`
    pub fn color_of(&self, id: NodeId) -> Option<PickColor> {
        self.shared.lock_state().index.color_of(id)
    }

    /// Destroy a subtree, releasing its colours and selection entries
    pub fn destroy_node(&self, id: NodeId) -> Result<Vec<NodeId>, PickingError> {
        let mut state = self.shared.lock_state();
        let mut scene = self.shared.write_scene();
        let removed = scene.destroy(id)?;
        for node in &removed {
            state.index.unregister_object(*node);
        }
        state.session.forget(&removed);
        Ok(removed)
    }

    /// Currently selected nodes
    pub fn selected(&self) -> Vec<NodeId> {
        self.shared.lock_state().session.selected().to_vec()
    }

    /// Persistent selection mode
    pub fn mode(&self) -> SelectionMode {
        self.shared.lock_state().session.mode()
    }

    /// Set the persistent selection mode
    pub fn set_mode(&self, mode: SelectionMode) {
        self.shared.lock_state().session.set_mode(mode);
    }

    /// Deselect everything
    pub fn clear_selection(&self) {
        let mut state = self.shared.lock_state();
        let mut scene = self.shared.write_scene();
        state.session.clear(&mut scene);
    }

    /// Window size changed
    pub fn resize(&self, width: u32, height: u32) {
        self.shared.lock_state().session.pointer.set_viewport(width, height);
    }

    /// Whether a blocking selection is waiting for the user
    pub fn is_waiting(&self) -> bool {
        self.shared.lock_state().session.is_waiting()
    }

    /// Feed a pointer event from the UI thread
    ///
    /// A release arms a pick: a plane pick while one is awaited, otherwise a
    /// box pick for a Ctrl/Shift drag or a point pick for a click. Plain
    /// drags past the threshold do not pick.
    pub fn handle_pointer(&self, event: &PointerEvent) {
        let mut state = self.shared.lock_state();
        let wait_plane = state.session.wait_plane;
        let pointer = &mut state.session.pointer;

        let request = match event.kind {
            PointerEventKind::Move => {
                pointer.move_to(event.x, event.y);
                None
            }
            PointerEventKind::Press => {
                pointer.press(event.x, event.y);
                None
            }
            PointerEventKind::Release => {
                let gesture = pointer.release(event.x, event.y);
                let (x, y) = gesture.end();
                match (wait_plane, gesture) {
                    (Some(snap), _) => Some(PickRequest::Plane { x, y, snap }),
                    (None, Gesture::Drag { rect, .. }) => {
                        box_action(event.modifiers).map(|action| PickRequest::Region { rect, action })
                    }
                    (None, Gesture::Click { .. }) => Some(PickRequest::Point {
                        x,
                        y,
                        mode: click_mode(event.modifiers),
                    }),
                }
            }
        };

        if let Some(request) = request {
            log::debug!("armed {request:?}");
            state.armed = Some(request);
            drop(state);
            self.shared.request_redraw();
        }
    }

    /// Feed a key event from the UI thread; Enter ends a blocking selection
    pub fn handle_key(&self, event: &KeyEvent) {
        if event.key != NamedKey::Enter || !event.pressed {
            return;
        }

        let mut state = self.shared.lock_state();
        if !state.session.is_waiting() {
            return;
        }
        state.session.wait_selection = false;
        state.session.wait_plane = None;
        drop(state);

        log::debug!("interactive selection finished by Enter");
        self.shared.notify();
    }

    /// Render-thread hook, called once per frame
    ///
    /// Renders and publishes the armed request. Does nothing while the
    /// previous frame is still unread, leaving the request armed. Returns
    /// whether a frame was published.
    pub fn render_frame<R: PickRenderer + ?Sized>(&self, renderer: &mut R) -> bool {
        if self.shared.is_stopped() || self.shared.mailbox.is_pending() {
            return false;
        }

        let Some(request) = self.shared.lock_state().armed.take() else {
            return false;
        };

        let rendered = {
            let scene = self.shared.read_scene();
            match request {
                PickRequest::Point { .. } => renderer.render_identifiers(&scene, None),
                PickRequest::Region { rect, .. } => renderer.render_identifiers(&scene, Some(rect)),
                PickRequest::Plane { .. } => renderer.render_plane(&self.shared.plane),
            }
        };

        match rendered {
            Ok(map) => {
                self.shared.mailbox.publish(PickFrame { request, map });
                true
            }
            Err(err) => {
                log::error!("picking pass failed: {err}");
                false
            }
        }
    }

    /// Token for the cancellable blocking calls
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::new(Arc::new(CondvarWaker {
            state: Arc::clone(&self.shared.state),
        }))
    }

    /// Block until the user finishes selecting with Enter
    ///
    /// The selection is cleared first; `mode` and the `allowed` kinds apply
    /// for the duration of the call, after which the previous mode and
    /// filter come back. An empty `allowed` accepts every kind.
    pub fn start_selection(&self, allowed: &[GeometryKind], mode: SelectionMode) -> Result<Vec<NodeId>, PickingError> {
        self.run_selection(allowed, mode, None)
    }

    /// [`Self::start_selection`] that returns `Cancelled` once `token` fires
    pub fn start_selection_cancellable(
        &self,
        allowed: &[GeometryKind],
        mode: SelectionMode,
        token: &CancelToken,
    ) -> Result<Vec<NodeId>, PickingError> {
        self.run_selection(allowed, mode, Some(token))
    }

    /// Block until the user clicks the ground plane (or presses Enter)
    ///
    /// Returns `None` for clicks outside the plane and for Enter.
    pub fn start_selection_on_plane(&self, snap: bool) -> Result<Option<Point3>, PickingError> {
        self.run_plane_selection(snap, None)
    }

    /// [`Self::start_selection_on_plane`] that returns `Cancelled` once
    /// `token` fires
    pub fn start_selection_on_plane_cancellable(&self, snap: bool, token: &CancelToken) -> Result<Option<Point3>, PickingError> {
        self.run_plane_selection(snap, Some(token))
    }

    fn run_selection(
        &self,
        allowed: &[GeometryKind],
        mode: SelectionMode,
        token: Option<&CancelToken>,
    ) -> Result<Vec<NodeId>, PickingError> {
        let mut state = self.begin_interaction()?;
        let previous_mode = state.session.mode();
        let previous_allowed = state.session.allowed().to_vec();
        {
            let mut scene = self.shared.write_scene();
            state.session.clear(&mut scene);
        }
        state.session.set_mode(mode);
        state.session.set_allowed(allowed.to_vec());
        state.session.wait_selection = true;
        log::info!("waiting for interactive selection ({mode:?}, allowed {allowed:?})");

        let (mut state, outcome) = self.wait_while(state, |s| s.session.wait_selection, token);
        state.session.wait_selection = false;
        state.session.set_mode(previous_mode);
        state.session.set_allowed(previous_allowed);
        state.interaction_active = false;

        outcome?;
        Ok(state.session.selected().to_vec())
    }

    fn run_plane_selection(&self, snap: bool, token: Option<&CancelToken>) -> Result<Option<Point3>, PickingError> {
        let mut state = self.begin_interaction()?;
        state.session.plane_point = None;
        state.session.wait_plane = Some(snap);
        log::info!("waiting for ground plane pick (snap: {snap})");

        let (mut state, outcome) = self.wait_while(state, |s| s.session.wait_plane.is_some(), token);
        state.session.wait_plane = None;
        state.interaction_active = false;
        let point = state.session.plane_point.take();

        outcome?;
        Ok(point)
    }

    fn begin_interaction(&self) -> Result<MutexGuard<'_, SelectionState>, PickingError> {
        let mut state = self.shared.lock_state();
        if self.shared.is_stopped() {
            return Err(PickingError::ServiceStopped);
        }
        if state.interaction_active {
            return Err(PickingError::InteractionInProgress);
        }
        state.interaction_active = true;
        Ok(state)
    }

    fn wait_while<'a>(
        &'a self,
        mut state: MutexGuard<'a, SelectionState>,
        pending: impl Fn(&SelectionState) -> bool,
        token: Option<&CancelToken>,
    ) -> (MutexGuard<'a, SelectionState>, Result<(), PickingError>) {
        let condvar = &self.shared.state.1;
        loop {
            if !pending(&*state) {
                return (state, Ok(()));
            }
            if token.is_some_and(CancelToken::is_cancelled) {
                log::info!("interactive selection cancelled");
                return (state, Err(PickingError::Cancelled));
            }
            if self.shared.is_stopped() {
                return (state, Err(PickingError::ServiceStopped));
            }
            state = condvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn click_mode(modifiers: Modifiers) -> Option<SelectionMode> {
    if modifiers.contains(Modifiers::CTRL) {
        Some(SelectionMode::Multi)
    } else if modifiers.contains(Modifiers::SHIFT) {
        Some(SelectionMode::Deselect)
    } else {
        None
    }
}

fn box_action(modifiers: Modifiers) -> Option<BoxAction> {
    if modifiers.contains(Modifiers::CTRL) {
        Some(BoxAction::Add)
    } else if modifiers.contains(Modifiers::SHIFT) {
        Some(BoxAction::Remove)
    } else {
        None
    }
}

/// Widget lifecycle and cross-window handshake state machine
use log::{debug, info, warn};

use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::input::{Normalizer, Viewport};
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::rotation::{RotationState, Smoother};
use crate::scene::{LoadTicket, RotationTarget, SceneApp, SceneHandle};

/// Where the widget is in its handshake with the parent page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    AwaitingScene,
    Loading { ticket: LoadTicket },
    Ready,
    Unmounted,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingScene => "awaitingScene",
            Self::Loading { .. } => "loading",
            Self::Ready => "ready",
            Self::Unmounted => "unmounted",
        }
    }
}

/// Side effects the host environment must carry out, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send to the parent window
    Post(OutboundMessage),
    /// Start loading a scene; report back through [`Controller::scene_loaded`]
    LoadScene { url: String, ticket: LoadTicket },
    /// Release the engine instance, loaded or still loading
    DiscardScene,
    /// Begin calling [`Controller::tick`] once per frame
    StartFrames,
    /// Cancel the pending frame callback
    StopFrames,
}

/// Owns everything one mounted widget instance needs.
///
/// `M` is the engine's object handle; `S` is the listener subscription,
/// held from mount to unmount and released by dropping it.
pub struct Controller<M, S> {
    config: WidgetConfig,
    smoother: Smoother,
    normalizer: Normalizer,
    phase: Phase,
    rotation: RotationState,
    scene: Option<SceneHandle<M>>,
    requested_url: Option<String>,
    last_ticket: Option<LoadTicket>,
    subscription: Option<S>,
    frames_running: bool,
}

impl<M: RotationTarget, S> Controller<M, S> {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            smoother: config.smoother(),
            normalizer: config.normalizer(),
            config,
            phase: Phase::Uninitialized,
            rotation: RotationState::zero(),
            scene: None,
            requested_url: None,
            last_ticket: None,
            subscription: None,
            frames_running: false,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    /// URL of the live scene, if any
    pub fn scene_url(&self) -> Option<&str> {
        self.scene.as_ref().map(SceneHandle::url)
    }

    pub fn is_mounted(&self) -> bool {
        !matches!(self.phase, Phase::Uninitialized | Phase::Unmounted)
    }

    pub fn frames_running(&self) -> bool {
        self.frames_running
    }

    /// Attach listeners and announce ourselves. Only the first call has any
    /// effect; a widget is never remounted.
    pub fn mount(&mut self, subscribe: impl FnOnce() -> S) -> Vec<Command> {
        if self.phase != Phase::Uninitialized {
            warn!("mount ignored in phase {:?}", self.phase);
            return Vec::new();
        }

        self.subscription = Some(subscribe());
        self.phase = Phase::AwaitingScene;
        info!("widget mounted");

        let mut commands = vec![Command::Post(OutboundMessage::IframeInit {
            status: Some("initializing".to_string()),
        })];
        if let Some(url) = self.config.scene_url.clone() {
            commands.extend(self.change_scene(&url));
        }
        commands
    }

    pub fn handle_message(&mut self, message: InboundMessage) -> Vec<Command> {
        if !self.is_mounted() {
            debug!("message ignored in phase {:?}", self.phase);
            return Vec::new();
        }
        match message {
            InboundMessage::MouseMove {
                normalized_x,
                normalized_y,
            } => {
                if let Err(e) = self.update_target(normalized_x, normalized_y) {
                    debug!("mouse move ignored: {e}");
                }
                Vec::new()
            }
            InboundMessage::ChangeScene { url } => self.change_scene(&url),
        }
    }

    /// Local pointer movement in client coordinates
    pub fn pointer_moved(&mut self, client_x: f64, client_y: f64, viewport: Viewport) {
        if !self.is_mounted() {
            return;
        }
        let Some((x, y)) = viewport.normalize(client_x, client_y) else {
            debug!("pointer ignored, degenerate viewport {viewport:?}");
            return;
        };
        // Expected before the first scene is ready
        let _ = self.update_target(x, y);
    }

    /// Point the target rotation at a normalized position
    pub fn update_target(&mut self, normalized_x: f64, normalized_y: f64) -> Result<()> {
        if self.scene.is_none() {
            return Err(WidgetError::NoActiveScene);
        }
        self.rotation
            .set_target(self.normalizer.target(normalized_x, normalized_y));
        Ok(())
    }

    /// Tear down the current scene and request `url`. A blank URL is ignored.
    pub fn change_scene(&mut self, url: &str) -> Vec<Command> {
        if !self.is_mounted() {
            debug!("scene change ignored in phase {:?}", self.phase);
            return Vec::new();
        }
        let url = url.trim();
        if url.is_empty() {
            debug!("scene change ignored, empty url");
            return Vec::new();
        }

        let mut commands = self.teardown();
        self.rotation.reset();

        let ticket = self.last_ticket.map_or_else(LoadTicket::first, LoadTicket::next);
        self.last_ticket = Some(ticket);
        self.requested_url = Some(url.to_string());
        self.phase = Phase::Loading { ticket };
        info!("loading scene {url} (ticket {})", ticket.id());

        commands.push(Command::LoadScene {
            url: url.to_string(),
            ticket,
        });
        commands
    }

    /// The engine finished loading the scene requested with `ticket`.
    ///
    /// Stale tickets are dropped. A scene without the target object leaves
    /// the widget in `Loading` until the next scene change.
    pub fn scene_loaded<A>(&mut self, ticket: LoadTicket, app: &A, now_ms: f64) -> Vec<Command>
    where
        A: SceneApp<Object = M> + ?Sized,
    {
        if self.phase != (Phase::Loading { ticket }) {
            debug!("stale scene load (ticket {}) dropped", ticket.id());
            return Vec::new();
        }
        let url = self.requested_url.clone().unwrap_or_default();

        let handle = match SceneHandle::locate(app, &url, &self.config.object_name) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("{e} in {url}, waiting for another scene");
                return Vec::new();
            }
        };

        self.scene = Some(handle);
        self.phase = Phase::Ready;
        self.frames_running = true;
        info!("scene ready: {url}");

        let mut commands = vec![
            Command::StartFrames,
            Command::Post(OutboundMessage::WheelIframeReady {
                model_name: Some(self.config.object_name.clone()),
                timestamp: Some(now_ms),
            }),
        ];
        if self.config.announce_app_initialized {
            commands.push(Command::Post(OutboundMessage::AppInitialized {
                status: "ready".to_string(),
                scene: url,
            }));
        }
        commands
    }

    /// One animation frame
    pub fn tick(&mut self) {
        let model = self.scene.as_mut().map(SceneHandle::model_mut);
        self.smoother.tick(&mut self.rotation, model);
    }

    /// Stop everything and release the listeners. Terminal.
    pub fn unmount(&mut self) -> Vec<Command> {
        if self.phase == Phase::Unmounted {
            return Vec::new();
        }
        let commands = self.teardown();
        self.rotation.reset();
        self.requested_url = None;
        self.subscription = None;
        self.phase = Phase::Unmounted;
        info!("widget unmounted");
        commands
    }

    fn teardown(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.frames_running {
            self.frames_running = false;
            commands.push(Command::StopFrames);
        }
        let had_scene = self.scene.take().is_some();
        if had_scene || matches!(self.phase, Phase::Loading { .. }) {
            commands.push(Command::DiscardScene);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::{Angles, Axis};
    use approx::assert_relative_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Fields = Rc<RefCell<[f64; 3]>>;

    struct Model(Fields);

    impl RotationTarget for Model {
        fn set_rotation(&mut self, axis: Axis, radians: f64) {
            let index = match axis {
                Axis::X => 0,
                Axis::Y => 1,
                Axis::Z => 2,
            };
            self.0.borrow_mut()[index] = radians;
        }
    }

    /// A loaded scene that may or may not contain the named object
    struct App {
        name: &'static str,
        fields: Fields,
    }

    impl App {
        fn with(name: &'static str) -> Self {
            Self {
                name,
                fields: Rc::new(RefCell::new([0.0; 3])),
            }
        }
    }

    impl SceneApp for App {
        type Object = Model;

        fn find_object_by_name(&self, name: &str) -> Option<Model> {
            (name == self.name).then(|| Model(self.fields.clone()))
        }
    }

    #[derive(Default)]
    struct Listeners {
        attached: Cell<u32>,
        detached: Cell<u32>,
    }

    struct Subscription(Rc<Listeners>);

    impl Drop for Subscription {
        fn drop(&mut self) {
            self.0.detached.set(self.0.detached.get() + 1);
        }
    }

    fn subscribe(listeners: &Rc<Listeners>) -> impl FnOnce() -> Subscription {
        let listeners = listeners.clone();
        move || {
            listeners.attached.set(listeners.attached.get() + 1);
            Subscription(listeners)
        }
    }

    fn controller() -> (Controller<Model, Subscription>, Rc<Listeners>) {
        let listeners = Rc::new(Listeners::default());
        let mut controller = Controller::new(WidgetConfig::default());
        controller.mount(subscribe(&listeners));
        (controller, listeners)
    }

    fn ticket_of(commands: &[Command]) -> LoadTicket {
        commands
            .iter()
            .find_map(|c| match c {
                Command::LoadScene { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("no load command")
    }

    fn posted(commands: &[Command]) -> Vec<&'static str> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Post(message) => Some(message.kind()),
                _ => None,
            })
            .collect()
    }

    fn change(url: &str) -> InboundMessage {
        InboundMessage::ChangeScene {
            url: url.to_string(),
        }
    }

    fn mouse(x: f64, y: f64) -> InboundMessage {
        InboundMessage::MouseMove {
            normalized_x: x,
            normalized_y: y,
        }
    }

    /// Mounted, with `app` loaded as the live scene
    fn ready(app: &App) -> (Controller<Model, Subscription>, Rc<Listeners>) {
        let (mut controller, listeners) = controller();
        let commands = controller.handle_message(change("https://a/scene"));
        controller.scene_loaded(ticket_of(&commands), app, 0.0);
        assert_eq!(controller.phase(), Phase::Ready);
        (controller, listeners)
    }

    #[test]
    fn test_mount_announces_init() {
        let listeners = Rc::new(Listeners::default());
        let mut controller: Controller<Model, Subscription> = Controller::new(WidgetConfig::default());
        assert_eq!(controller.phase(), Phase::Uninitialized);

        let commands = controller.mount(subscribe(&listeners));
        assert_eq!(
            commands,
            vec![Command::Post(OutboundMessage::IframeInit {
                status: Some("initializing".to_string())
            })]
        );
        assert_eq!(controller.phase(), Phase::AwaitingScene);
        assert_eq!(listeners.attached.get(), 1);

        assert!(controller.mount(subscribe(&listeners)).is_empty());
        assert_eq!(listeners.attached.get(), 1);
    }

    #[test]
    fn test_mount_with_configured_scene_starts_loading() {
        let config = WidgetConfig {
            scene_url: Some("https://prod.spline.design/a/scene.splinecode".to_string()),
            ..WidgetConfig::default()
        };
        let mut controller: Controller<Model, ()> = Controller::new(config);
        let commands = controller.mount(|| ());
        assert_eq!(posted(&commands), vec!["IFRAME_INIT"]);
        assert_eq!(
            commands[1],
            Command::LoadScene {
                url: "https://prod.spline.design/a/scene.splinecode".to_string(),
                ticket: LoadTicket::first()
            }
        );
        assert!(matches!(controller.phase(), Phase::Loading { .. }));
    }

    #[test]
    fn test_full_handshake() {
        let app = App::with("Group");
        let (mut controller, _listeners) = controller();

        let commands = controller.handle_message(change("https://a/scene"));
        let ticket = ticket_of(&commands);
        assert_eq!(controller.phase(), Phase::Loading { ticket });

        let commands = controller.scene_loaded(ticket, &app, 1234.0);
        assert_eq!(
            commands,
            vec![
                Command::StartFrames,
                Command::Post(OutboundMessage::WheelIframeReady {
                    model_name: Some("Group".to_string()),
                    timestamp: Some(1234.0)
                }),
                Command::Post(OutboundMessage::AppInitialized {
                    status: "ready".to_string(),
                    scene: "https://a/scene".to_string()
                }),
            ]
        );
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.scene_url(), Some("https://a/scene"));
        assert!(controller.frames_running());

        controller.handle_message(mouse(0.75, 0.5));
        let target = controller.rotation().target();
        assert_relative_eq!(target.pitch, 0.0);
        assert_relative_eq!(target.yaw, -10.0);

        for _ in 0..10 {
            controller.tick();
        }
        assert_relative_eq!(controller.rotation().remaining(), 10.0 * 0.9f64.powi(10), epsilon = 1e-9);
        for _ in 0..34 {
            controller.tick();
        }
        assert!(controller.rotation().converged(0.1));

        let fields = *app.fields.borrow();
        let yaw = controller.rotation().current().yaw;
        assert_relative_eq!(fields[2], yaw.to_radians(), epsilon = 1e-12);
        assert_eq!(fields[1], 0.0);
    }

    #[test]
    fn test_app_initialized_can_be_disabled() {
        let config = WidgetConfig {
            announce_app_initialized: false,
            ..WidgetConfig::default()
        };
        let mut controller: Controller<Model, ()> = Controller::new(config);
        controller.mount(|| ());
        let commands = controller.change_scene("https://a/scene");
        let commands = controller.scene_loaded(ticket_of(&commands), &App::with("Group"), 0.0);
        assert_eq!(posted(&commands), vec!["WHEEL_IFRAME_READY"]);
    }

    #[test]
    fn test_mouse_move_before_scene_is_a_no_op() {
        let (mut controller, _listeners) = controller();
        assert!(controller.handle_message(mouse(0.9, 0.1)).is_empty());
        controller.pointer_moved(10.0, 10.0, Viewport::new(100.0, 100.0));
        controller.tick();
        assert_eq!(*controller.rotation(), RotationState::zero());
        assert_eq!(controller.update_target(0.9, 0.1), Err(WidgetError::NoActiveScene));
    }

    #[test]
    fn test_local_pointer_matches_parent_messages() {
        let app = App::with("Group");
        let (mut local, _a) = ready(&app);
        let (mut remote, _b) = ready(&app);

        local.pointer_moved(600.0, 150.0, Viewport::new(800.0, 600.0));
        remote.handle_message(mouse(0.75, 0.25));
        assert_eq!(local.rotation().target(), remote.rotation().target());
        assert_eq!(local.rotation().target(), Angles::new(-10.0, -10.0));
    }

    #[test]
    fn test_change_scene_resets_rotation_and_stops_frames() {
        let app = App::with("Group");
        let (mut controller, _listeners) = ready(&app);
        controller.handle_message(mouse(1.0, 1.0));
        controller.tick();
        assert_ne!(*controller.rotation(), RotationState::zero());

        let commands = controller.handle_message(change("https://b/scene"));
        assert_eq!(commands[0], Command::StopFrames);
        assert_eq!(commands[1], Command::DiscardScene);
        assert!(matches!(commands[2], Command::LoadScene { ref url, .. } if url == "https://b/scene"));
        assert_eq!(*controller.rotation(), RotationState::zero());
        assert_eq!(controller.scene_url(), None);
        assert!(!controller.frames_running());
    }

    #[test]
    fn test_blank_scene_url_is_ignored() {
        let app = App::with("Group");
        let (mut controller, _listeners) = ready(&app);
        controller.handle_message(mouse(1.0, 0.0));

        assert!(controller.handle_message(change("  ")).is_empty());
        assert!(controller.handle_message(change("")).is_empty());
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.scene_url(), Some("https://a/scene"));
        assert_relative_eq!(controller.rotation().target().yaw, -20.0);
    }

    #[test]
    fn test_scene_url_is_trimmed() {
        let (mut controller, _listeners) = controller();
        let commands = controller.handle_message(change("  https://a/scene\n"));
        assert!(matches!(commands[0], Command::LoadScene { ref url, .. } if url == "https://a/scene"));
    }

    #[test]
    fn test_missing_target_stays_loading_until_next_scene() {
        let (mut controller, _listeners) = controller();
        let commands = controller.handle_message(change("https://a/scene"));
        let ticket = ticket_of(&commands);

        assert!(controller.scene_loaded(ticket, &App::with("Wheel"), 0.0).is_empty());
        assert_eq!(controller.phase(), Phase::Loading { ticket });
        controller.handle_message(mouse(0.0, 0.0));
        assert_eq!(controller.rotation().target(), Angles::zero());

        let commands = controller.handle_message(change("https://b/scene"));
        assert_eq!(commands[0], Command::DiscardScene);
        let commands = controller.scene_loaded(ticket_of(&commands), &App::with("Group"), 0.0);
        assert_eq!(posted(&commands), vec!["WHEEL_IFRAME_READY", "APP_INITIALIZED"]);
        assert_eq!(controller.scene_url(), Some("https://b/scene"));
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let (mut controller, _listeners) = controller();
        let first = ticket_of(&controller.handle_message(change("https://a/scene")));
        let second = ticket_of(&controller.handle_message(change("https://b/scene")));
        assert_ne!(first, second);

        assert!(controller.scene_loaded(first, &App::with("Group"), 0.0).is_empty());
        assert_eq!(controller.phase(), Phase::Loading { ticket: second });

        controller.scene_loaded(second, &App::with("Group"), 0.0);
        assert_eq!(controller.scene_url(), Some("https://b/scene"));
    }

    #[test]
    fn test_listeners_survive_scene_swaps_and_detach_once() {
        let app = App::with("Group");
        let (mut controller, listeners) = ready(&app);
        for url in ["https://b/scene", "https://c/scene"] {
            let commands = controller.change_scene(url);
            controller.scene_loaded(ticket_of(&commands), &app, 0.0);
        }
        assert_eq!(listeners.attached.get(), 1);
        assert_eq!(listeners.detached.get(), 0);

        let commands = controller.unmount();
        assert_eq!(commands, vec![Command::StopFrames, Command::DiscardScene]);
        assert_eq!(listeners.detached.get(), 1);
        assert_eq!(controller.phase(), Phase::Unmounted);

        assert!(controller.unmount().is_empty());
        assert_eq!(listeners.detached.get(), 1);
    }

    #[test]
    fn test_unmounted_is_terminal() {
        let app = App::with("Group");
        let (mut controller, listeners) = ready(&app);
        controller.unmount();

        assert!(controller.handle_message(change("https://b/scene")).is_empty());
        assert!(controller.mount(subscribe(&listeners)).is_empty());
        controller.handle_message(mouse(1.0, 1.0));
        controller.tick();
        assert_eq!(*controller.rotation(), RotationState::zero());
        assert_eq!(listeners.attached.get(), 1);
    }

    #[test]
    fn test_unmount_while_loading_discards_pending_scene() {
        let (mut controller, _listeners) = controller();
        let ticket = ticket_of(&controller.handle_message(change("https://a/scene")));
        assert_eq!(controller.unmount(), vec![Command::DiscardScene]);
        assert!(controller.scene_loaded(ticket, &App::with("Group"), 0.0).is_empty());
    }
}

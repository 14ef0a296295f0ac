/// wheelframe Web - the rotating scene widget, compiled to WASM
///
/// Binds the core controller to the browser: window listeners, the
/// animation frame loop, the Spline runtime and `postMessage` to the
/// embedding page.

use gloo::events::EventListener;
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, MessageEvent, MouseEvent, Window};
use wheelframe_core::{Command, Controller, LoadTicket, Viewport, WidgetConfig};

mod bridge;
mod frame;
mod spline;

use frame::FrameLoop;
use spline::{Application, SceneObject};

/// Window listeners held for the mounted lifetime; dropping detaches them
struct Subscription {
    _pointer: EventListener,
    _message: EventListener,
}

impl Subscription {
    fn attach(window: &Window, inner: Weak<Inner>) -> Self {
        let pointer_inner = inner.clone();
        let pointer = EventListener::new(window, "mousemove", move |event| {
            let (Some(inner), Some(event)) = (pointer_inner.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            let viewport = inner.viewport();
            inner.controller.borrow_mut().pointer_moved(
                f64::from(event.client_x()),
                f64::from(event.client_y()),
                viewport,
            );
        });

        let message = EventListener::new(window, "message", move |event| {
            let (Some(inner), Some(event)) = (inner.upgrade(), event.dyn_ref::<MessageEvent>()) else {
                return;
            };
            match bridge::read_message(event) {
                Ok(Some(message)) => {
                    let commands = inner.controller.borrow_mut().handle_message(message);
                    if let Err(e) = dispatch(&inner, commands) {
                        warn!("failed to handle message: {e:?}");
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("ignored message: {e}"),
            }
        });

        Self {
            _pointer: pointer,
            _message: message,
        }
    }
}

struct Inner {
    window: Window,
    canvas: HtmlCanvasElement,
    controller: RefCell<Controller<SceneObject, Subscription>>,
    scene: RefCell<Option<Application>>,
    frames: FrameLoop,
}

impl Inner {
    fn viewport(&self) -> Viewport {
        let size = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport::new(size(self.window.inner_width()), size(self.window.inner_height()))
    }
}

/// Carry out the controller's commands in order
fn dispatch(inner: &Rc<Inner>, commands: Vec<Command>) -> Result<(), JsValue> {
    for command in commands {
        match command {
            Command::Post(message) => {
                let origin = inner.controller.borrow().config().target_origin.clone();
                bridge::post_to_parent(&inner.window, &message, &origin)?;
            }
            Command::LoadScene { url, ticket } => load_scene(inner, url, ticket),
            Command::DiscardScene => {
                if let Some(app) = inner.scene.borrow_mut().take() {
                    app.dispose();
                }
            }
            Command::StartFrames => {
                let weak = Rc::downgrade(inner);
                inner.frames.start(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.controller.borrow_mut().tick();
                    }
                });
            }
            Command::StopFrames => inner.frames.stop(),
        }
    }
    Ok(())
}

fn load_scene(inner: &Rc<Inner>, url: String, ticket: LoadTicket) {
    let app = Application::new(&inner.canvas);
    *inner.scene.borrow_mut() = Some(app.clone());

    let weak = Rc::downgrade(inner);
    wasm_bindgen_futures::spawn_local(async move {
        let loaded = JsFuture::from(app.load(&url)).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        // A scene that fails to load leaves the widget waiting for the next one
        if let Err(e) = loaded {
            warn!("scene {url} failed to load: {e:?}");
            return;
        }
        let now = js_sys::Date::now();
        let commands = inner.controller.borrow_mut().scene_loaded(ticket, &app, now);
        if let Err(e) = dispatch(&inner, commands) {
            warn!("failed to announce scene {url}: {e:?}");
        }
    });
}

/// The widget as seen from JavaScript
#[wasm_bindgen]
pub struct WheelWidget {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl WheelWidget {
    /// Create a widget drawing into `canvas`. `config` is optional JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<WheelWidget, JsValue> {
        let config = WidgetConfig::from_json(config.as_deref().unwrap_or_default())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::set_max_level(config.log_level().to_level_filter());

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        Ok(WheelWidget {
            inner: Rc::new(Inner {
                window,
                canvas,
                controller: RefCell::new(Controller::new(config)),
                scene: RefCell::new(None),
                frames: FrameLoop::new(),
            }),
        })
    }

    /// Attach listeners and send `IFRAME_INIT`
    pub fn mount(&self) -> Result<(), JsValue> {
        let inner = &self.inner;
        let weak = Rc::downgrade(inner);
        let commands = inner
            .controller
            .borrow_mut()
            .mount(|| Subscription::attach(&inner.window, weak));
        dispatch(inner, commands)
    }

    /// Stop the frame loop, release the scene and detach listeners
    pub fn unmount(&self) -> Result<(), JsValue> {
        let commands = self.inner.controller.borrow_mut().unmount();
        dispatch(&self.inner, commands)
    }

    /// Same as a `CHANGE_SCENE` message from the parent
    #[wasm_bindgen(js_name = changeScene)]
    pub fn change_scene(&self, url: &str) -> Result<(), JsValue> {
        let commands = self.inner.controller.borrow_mut().change_scene(url);
        dispatch(&self.inner, commands)
    }

    pub fn phase(&self) -> String {
        self.inner.controller.borrow().phase().name().to_string()
    }

    /// Current `[pitch, yaw]` in degrees
    pub fn rotation(&self) -> Vec<f64> {
        let current = self.inner.controller.borrow().rotation().current();
        vec![current.pitch, current.yaw]
    }
}

impl Drop for WheelWidget {
    fn drop(&mut self) {
        let _ = self.unmount();
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // Per-widget level is applied with log::set_max_level
    if console_log::init_with_level(log::Level::Trace).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Cancellable per-frame callback on top of `requestAnimationFrame`
use gloo::render::{request_animation_frame, AnimationFrame};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Pending = Rc<RefCell<Option<AnimationFrame>>>;

/// Calls a closure once per display refresh until stopped.
///
/// Dropping the pending [`AnimationFrame`] cancels it, so `stop` takes
/// effect before the next frame even if one is already queued.
#[derive(Default)]
pub struct FrameLoop {
    running: Rc<Cell<bool>>,
    pending: Pending,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Start calling `on_frame`. Does nothing if already running.
    pub fn start(&self, on_frame: impl Fn() + 'static) {
        if self.running.replace(true) {
            return;
        }
        schedule(self.running.clone(), self.pending.clone(), Rc::new(on_frame));
    }

    pub fn stop(&self) {
        self.running.set(false);
        self.pending.borrow_mut().take();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn schedule(running: Rc<Cell<bool>>, pending: Pending, on_frame: Rc<dyn Fn()>) {
    let slot = pending.clone();
    let handle = request_animation_frame(move |_timestamp| {
        slot.borrow_mut().take();
        if !running.get() {
            return;
        }
        on_frame();
        // on_frame may have stopped the loop
        if running.get() {
            schedule(running, slot, on_frame);
        }
    });
    *pending.borrow_mut() = Some(handle);
}

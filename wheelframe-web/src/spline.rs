/// Bindings to the Spline runtime
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;
use wheelframe_core::{Axis, RotationTarget, SceneApp};

#[wasm_bindgen(module = "@splinetool/runtime")]
extern "C" {
    /// One Spline runtime drawing into one canvas
    #[derive(Debug, Clone)]
    pub type Application;

    #[wasm_bindgen(constructor)]
    pub fn new(canvas: &HtmlCanvasElement) -> Application;

    /// Resolves once the scene is parsed and on screen
    #[wasm_bindgen(method)]
    pub fn load(this: &Application, scene: &str) -> js_sys::Promise;

    #[wasm_bindgen(method, js_name = findObjectByName)]
    fn find_by_name(this: &Application, name: &str) -> Option<SceneObject>;

    #[wasm_bindgen(method)]
    pub fn dispose(this: &Application);
}

#[wasm_bindgen]
extern "C" {
    /// A node of a loaded scene
    #[derive(Debug, Clone)]
    pub type SceneObject;

    #[wasm_bindgen(method, getter)]
    fn rotation(this: &SceneObject) -> Option<Rotation>;

    /// Euler angles of a node, in radians
    pub type Rotation;

    #[wasm_bindgen(method, setter)]
    fn set_x(this: &Rotation, value: f64);

    #[wasm_bindgen(method, setter)]
    fn set_y(this: &Rotation, value: f64);

    #[wasm_bindgen(method, setter)]
    fn set_z(this: &Rotation, value: f64);
}

impl RotationTarget for SceneObject {
    fn set_rotation(&mut self, axis: Axis, radians: f64) {
        let Some(rotation) = self.rotation() else {
            return;
        };
        match axis {
            Axis::X => rotation.set_x(radians),
            Axis::Y => rotation.set_y(radians),
            Axis::Z => rotation.set_z(radians),
        }
    }
}

impl SceneApp for Application {
    type Object = SceneObject;

    fn find_object_by_name(&self, name: &str) -> Option<SceneObject> {
        self.find_by_name(name)
    }
}

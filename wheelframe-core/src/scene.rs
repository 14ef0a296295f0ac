/// Contract with the external 3D engine
use crate::error::{Result, WidgetError};
use crate::rotation::Axis;

/// The only part of an engine object the widget touches: its rotation fields.
pub trait RotationTarget {
    /// Overwrite one rotation field, in radians
    fn set_rotation(&mut self, axis: Axis, radians: f64);
}

/// A fully loaded engine instance
pub trait SceneApp {
    type Object: RotationTarget;

    fn find_object_by_name(&self, name: &str) -> Option<Self::Object>;
}

/// Identifies one scene load request.
///
/// Completions carrying an older ticket belong to a scene that has since
/// been swapped out and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// The live scene: where it came from and the object being rotated
#[derive(Debug)]
pub struct SceneHandle<M> {
    url: String,
    object_name: String,
    model: M,
}

impl<M: RotationTarget> SceneHandle<M> {
    /// Look up `object_name` in a loaded scene
    pub fn locate<A>(app: &A, url: &str, object_name: &str) -> Result<Self>
    where
        A: SceneApp<Object = M> + ?Sized,
    {
        let model = app
            .find_object_by_name(object_name)
            .ok_or_else(|| WidgetError::MissingTarget {
                name: object_name.to_string(),
            })?;
        Ok(Self {
            url: url.to_string(),
            object_name: object_name.to_string(),
            model,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

mod effects;
mod projection;
mod renderer;

pub use effects::{
    BloomSettings, ChromaticAberrationSettings, EffectsConfig, NoiseSettings, VignetteSettings,
};
pub use projection::{project, Camera, ProjectedPoint, Viewport};
pub use renderer::{Canvas, Renderer};

pub mod fetch;
pub mod publish;
pub mod render;

pub use fetch::FetchStage;
pub use publish::{PublishStage, Publisher};
pub use render::{power_label, RenderStage, RenderedImage};

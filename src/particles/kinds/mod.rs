//! Built-in particle specialisations

pub mod body_part;
pub mod debris;
pub mod soft_sprite;

pub use body_part::{BodyPart, BodyPartData};
pub use debris::{BlockDebris, DebrisData};
pub use soft_sprite::{SoftSprite, SpriteData};

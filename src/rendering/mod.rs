pub mod color_lut;

pub use color_lut::{ColorLUT, ColormapId};

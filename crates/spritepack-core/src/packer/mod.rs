pub mod maxrects;

pub use maxrects::MaxRectsPacker;

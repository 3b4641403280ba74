pub mod null;
pub mod slack;

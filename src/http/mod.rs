pub mod call;
pub mod meta;
pub mod params;

pub use call::{ApplicationCall, TestResponse};
pub use meta::RequestMetadata;
pub use params::Params;

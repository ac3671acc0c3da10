pub mod admin;
pub mod channel;
pub mod search;
pub mod video;

pub use admin::*;
pub use channel::*;
pub use search::*;
pub use video::*;

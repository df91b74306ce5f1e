pub extern crate serde;
pub extern crate serde_json;

mod checkpoint;
mod cursor;
mod error;
pub mod history;
pub mod message;
mod presence;
mod registry;
mod relay;
mod room;
mod types;

pub use checkpoint::*;
pub use cursor::*;
pub use error::*;
pub use presence::*;
pub use registry::*;
pub use relay::*;
pub use room::*;
pub use types::*;

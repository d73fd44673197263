pub mod document;
pub mod session;
pub mod health;
pub mod sync_policy;
pub mod error;

pub use document::*;
pub use session::*;
pub use health::*;
pub use sync_policy::*;
pub use error::*;

mod cascade;
mod driver;
mod loader;
mod session;

pub use cascade::{resolve, resolve_within, validators};
pub use driver::{PageDriver, PageSession};
pub use loader::IncrementalPageLoader;
pub use session::BrowserSession;

pub mod backend;
pub mod screenshot;
pub mod session;
pub mod webdriver;

pub use backend::WebDriverSession;
pub use screenshot::capture_screenshot;
pub use session::{SessionBuilder, SessionError};

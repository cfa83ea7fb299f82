pub mod controller;
pub mod listeners;
pub mod session;

pub use controller::AppController;
pub use listeners::{Listeners, Subscription};
pub use session::SessionController;

pub mod notifications;
pub mod stream;

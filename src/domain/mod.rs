pub mod badge;
pub mod membership;
pub mod notification;
pub mod preferences;
pub mod push;

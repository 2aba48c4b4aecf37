pub mod auth;
pub mod dispatch;
pub mod export;
pub mod refresh;
pub mod results;
pub mod shared;
pub mod status;
pub mod submit;
pub mod tasks;
pub mod watch;

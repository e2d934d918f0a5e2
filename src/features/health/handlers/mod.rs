pub mod health_handler;

pub use health_handler::{__path_health_check, __path_root, health_check, root};

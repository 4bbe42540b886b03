pub mod logging;
pub mod syntax;

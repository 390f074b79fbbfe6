pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod directory;
pub mod roster;
pub mod runtime;
pub mod state;
pub mod transport;

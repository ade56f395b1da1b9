mod command;
mod handler;
mod listen;

pub use handler::CommandHandler;
pub use listen::listen;

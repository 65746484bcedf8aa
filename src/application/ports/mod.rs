//! Application ports (hexagonal architecture boundaries)

pub mod outbound;

pub use outbound::{
    Callback, CallbackSender, CommandResult, CommandResultType, DisplayText, Emitter, OcppCall,
};

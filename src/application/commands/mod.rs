//! OCPI commands towards charge stations

pub mod call_maker;
pub mod callback;
pub mod dispatcher;
pub mod model;
pub mod pending;
pub mod v16;
pub mod v201;

pub use call_maker::{CallMaker, CallMakers, RemoteStart};
pub use callback::{AwaitingResult, ResultNotifier};
pub use dispatcher::{CommandDispatcher, DispatchTimeouts};
pub use model::{
    CommandOrigin, CommandResponse, CommandResponseType, CommandType, StartSession, StopSession,
};
pub use pending::{PendingCommands, SharedPendingCommands};

mod session_emitter;

pub use session_emitter::SessionEmitter;

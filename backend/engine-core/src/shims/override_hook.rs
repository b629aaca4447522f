use crate::server::RequestServer;
use crate::session::EngineSession;
use crate::shims::ListenHook;

use std::sync::Arc;

use log::debug;

/// Implemented by frameworks whose "start listening" step can be replaced.
pub trait ListenOverride {
    fn replace_listen(&mut self, hook: ListenHook);
}

/// Route every listen call of `framework` through `session`.
///
/// Port text is interpreted like any other `listen()` port, so a named pipe
/// path given as the port selects a pipe frontend. Path-based listening is
/// rejected with a `Config` error from the hook.
pub fn install_listen_override<F>(
    framework: &mut F,
    session: &EngineSession,
    server: Arc<dyn RequestServer>,
) where
    F: ListenOverride + ?Sized,
{
    debug!("Session {}: installing listen override", session.id());
    framework.replace_listen(session.listen_hook(server));
}

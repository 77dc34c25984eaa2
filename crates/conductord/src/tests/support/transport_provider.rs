//! Transport provider double that records builds instead of binding sockets.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::service::TaskService;
use crate::transport::{
    ShutdownToken, TaskServer, TransportError, TransportKind, TransportProvider,
    TransportSettings,
};

/// Server that idles on its token and counts stop requests.
#[derive(Debug)]
pub struct RecordingServer {
    settings: TransportSettings,
    fail_stop: bool,
    stop_calls: AtomicUsize,
    serve_returned: AtomicBool,
}

impl RecordingServer {
    /// Number of times `stop` was called.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Returns `true` once the serve loop has exited.
    pub fn serve_returned(&self) -> bool {
        self.serve_returned.load(Ordering::SeqCst)
    }
}

impl TaskServer for RecordingServer {
    fn kind(&self) -> TransportKind {
        self.settings.kind()
    }

    fn describe(&self) -> String {
        self.settings
            .endpoint()
            .map_or_else(|| String::from("recording queue"), ToString::to_string)
    }

    fn serve(&self, token: &ShutdownToken) -> Result<(), TransportError> {
        while !token.is_cancelled() {
            thread::sleep(Duration::from_millis(5));
        }
        self.serve_returned.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), TransportError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(TransportError::Stop {
                kind: self.settings.kind(),
                message: String::from("intentional test failure"),
            });
        }
        Ok(())
    }
}

/// Provider capturing every server it builds.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransportProvider {
    fail_stop: bool,
    servers: Arc<Mutex<Vec<Arc<RecordingServer>>>>,
}

impl RecordingTransportProvider {
    /// Provider whose servers refuse to stop.
    #[must_use]
    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    /// Settings of every server built so far.
    pub fn built(&self) -> Vec<TransportSettings> {
        self.lock()
            .iter()
            .map(|server| server.settings.clone())
            .collect()
    }

    /// The server built at `index`.
    pub fn server(&self, index: usize) -> Arc<RecordingServer> {
        Arc::clone(self.lock().get(index).expect("server was built"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<RecordingServer>>> {
        self.servers.lock().expect("provider mutex poisoned")
    }
}

impl TransportProvider for RecordingTransportProvider {
    fn build(
        &self,
        settings: &TransportSettings,
        _service: Arc<TaskService>,
    ) -> Result<Arc<dyn TaskServer>, TransportError> {
        let server = Arc::new(RecordingServer {
            settings: settings.clone(),
            fail_stop: self.fail_stop,
            stop_calls: AtomicUsize::new(0),
            serve_returned: AtomicBool::new(false),
        });
        self.lock().push(Arc::clone(&server));
        Ok(server as Arc<dyn TaskServer>)
    }
}

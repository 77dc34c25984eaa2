//! BDD test world: property store, collaborators and bootstrap outcome for step functions.

use std::cell::RefCell;
use std::sync::Arc;

use tempfile::TempDir;

use conductor_config::PropertyStore;

use crate::bootstrap::{BootstrapError, HumanTaskService};
use crate::callback::{CallbackRegistry, DefaultUserGroupCallback, UserGroupCallback};
use crate::transport::{DefaultTransportProvider, TransportError, TransportProvider};

use super::reporter::RecordingHealthReporter;
use super::transport_provider::RecordingTransportProvider;

type Service = HumanTaskService<Arc<dyn TransportProvider>>;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    dir: TempDir,
    properties: PropertyStore,
    pub reporter: Arc<RecordingHealthReporter>,
    pub recorder: RecordingTransportProvider,
    provider: Arc<dyn TransportProvider>,
    pub callbacks: Arc<CallbackRegistry>,
    pub existing_callback: Option<Arc<dyn UserGroupCallback>>,
    service: Option<Service>,
    init_results: Vec<Result<(), BootstrapError>>,
    destroy_result: Option<Result<(), TransportError>>,
}

impl TestWorld {
    /// Builds a world with an empty store and a recording provider.
    #[must_use]
    pub fn new() -> Self {
        let recorder = RecordingTransportProvider::default();
        Self {
            dir: TempDir::new().expect("temp dir"),
            properties: PropertyStore::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            provider: Arc::new(recorder.clone()),
            recorder,
            callbacks: Arc::new(CallbackRegistry::new()),
            existing_callback: None,
            service: None,
            init_results: Vec::new(),
            destroy_result: None,
        }
    }

    /// Sets a property before the service is built.
    pub fn set_property(&mut self, key: &str, value: &str) {
        self.properties = self.properties.clone().with_property(key, value);
    }

    /// Writes `contents` to `name` in the scenario directory and returns its path.
    pub fn write_file(&self, name: &str, contents: &str) -> String {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write scenario file");
        path.to_str().expect("utf8 path").to_owned()
    }

    /// Builds servers with the production provider instead of the recorder.
    pub fn use_default_provider(&mut self) {
        self.provider = Arc::new(DefaultTransportProvider);
    }

    /// Registers the built-in callback before the service starts.
    pub fn preregister_callback(&mut self) {
        let callback: Arc<dyn UserGroupCallback> = Arc::new(DefaultUserGroupCallback);
        assert!(self.callbacks.register_if_absent(Arc::clone(&callback)));
        self.existing_callback = Some(callback);
    }

    /// Runs `init()`, building the service on first use.
    pub fn init(&mut self) {
        let result = self.ensure_service().init();
        self.init_results.push(result);
    }

    /// Runs `destroy()`, building the service when `init()` never ran.
    pub fn destroy(&mut self) {
        let result = self.ensure_service().destroy();
        self.destroy_result = Some(result);
    }

    fn ensure_service(&mut self) -> &mut Service {
        if self.service.is_none() {
            let service = HumanTaskService::new(self.properties.clone())
                .with_provider(Arc::clone(&self.provider))
                .with_reporter(self.reporter.clone())
                .with_callback_registry(Arc::clone(&self.callbacks));
            self.service = Some(service);
        }
        self.service.as_mut().expect("service was built")
    }

    /// The bootstrap under test.
    pub fn service(&self) -> &Service {
        self.service.as_ref().expect("service was built")
    }

    /// Outcome of the most recent `init()`.
    pub fn last_init(&self) -> &Result<(), BootstrapError> {
        self.init_results.last().expect("init was called")
    }

    /// Outcome of `destroy()`.
    pub fn destroy_result(&self) -> Option<&Result<(), TransportError>> {
        self.destroy_result.as_ref()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(service) = self.service.as_mut() {
            let _ = service.destroy();
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

use crate::probe::Probe;
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use vigil_core::ProbeError;

/// Boxed future returned by an async probe body
pub type ProbeFuture<T> = BoxFuture<'static, Result<T, ProbeError>>;

type SyncBody<T> = Arc<dyn Fn() -> Result<T, ProbeError> + Send + Sync>;
type AsyncBody<T> = Arc<dyn Fn() -> ProbeFuture<T> + Send + Sync>;

/// Call shape of a probe method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodShape {
    /// Synchronous, returns nothing
    Unit,
    /// Synchronous, returns a diagnostic string
    Diagnostic,
    /// Asynchronous, yields nothing
    UnitAsync,
    /// Asynchronous, yields a diagnostic string
    DiagnosticAsync,
}

impl MethodShape {
    pub fn is_async(&self) -> bool {
        matches!(self, MethodShape::UnitAsync | MethodShape::DiagnosticAsync)
    }
}

impl std::fmt::Display for MethodShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodShape::Unit => write!(f, "unit"),
            MethodShape::Diagnostic => write!(f, "diagnostic"),
            MethodShape::UnitAsync => write!(f, "unit-async"),
            MethodShape::DiagnosticAsync => write!(f, "diagnostic-async"),
        }
    }
}

/// The callable behind a probe method, one variant per shape
#[derive(Clone)]
pub(crate) enum MethodBody {
    Unit(SyncBody<()>),
    Diagnostic(SyncBody<String>),
    UnitAsync(AsyncBody<()>),
    DiagnosticAsync(AsyncBody<String>),
}

/// One invocable check, bound to a single probe instance
///
/// Cheap to clone; may be invoked any number of times.
#[derive(Clone)]
pub struct ProbeMethod {
    probe_name: Arc<str>,
    name: String,
    body: MethodBody,
}

impl ProbeMethod {
    pub fn probe_name(&self) -> &str {
        &self.probe_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `probe_name::method_name`
    pub fn id(&self) -> String {
        format!("{}::{}", self.probe_name, self.name)
    }

    pub fn shape(&self) -> MethodShape {
        match self.body {
            MethodBody::Unit(_) => MethodShape::Unit,
            MethodBody::Diagnostic(_) => MethodShape::Diagnostic,
            MethodBody::UnitAsync(_) => MethodShape::UnitAsync,
            MethodBody::DiagnosticAsync(_) => MethodShape::DiagnosticAsync,
        }
    }

    pub(crate) fn body(&self) -> &MethodBody {
        &self.body
    }
}

impl std::fmt::Debug for ProbeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeMethod")
            .field("probe_name", &self.probe_name)
            .field("name", &self.name)
            .field("shape", &self.shape())
            .finish()
    }
}

/// Builder that binds methods of every shape to one probe instance
///
/// ```ignore
/// fn methods(self: Arc<Self>) -> Vec<ProbeMethod> {
///     ProbeMethods::new(self)
///         .diagnostic("homepage_latency", |probe| probe.measure())
///         .unit_async("images_succeed", |probe| async move {
///             probe.client.get("/images").should_succeed_async().await?;
///             Ok(())
///         })
///         .build()
/// }
/// ```
pub struct ProbeMethods<P> {
    probe: Arc<P>,
    probe_name: Arc<str>,
    methods: Vec<ProbeMethod>,
}

impl<P: Probe> ProbeMethods<P> {
    pub fn new(probe: Arc<P>) -> Self {
        let probe_name = Arc::from(probe.name());
        Self {
            probe,
            probe_name,
            methods: Vec::new(),
        }
    }

    fn push(mut self, name: impl Into<String>, body: MethodBody) -> Self {
        self.methods.push(ProbeMethod {
            probe_name: self.probe_name.clone(),
            name: name.into(),
            body,
        });
        self
    }

    /// Add a synchronous method that returns nothing
    pub fn unit<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&P) -> Result<(), ProbeError> + Send + Sync + 'static,
    {
        let probe = self.probe.clone();
        self.push(name, MethodBody::Unit(Arc::new(move || body(probe.as_ref()))))
    }

    /// Add a synchronous method that returns a diagnostic string
    pub fn diagnostic<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&P) -> Result<String, ProbeError> + Send + Sync + 'static,
    {
        let probe = self.probe.clone();
        self.push(name, MethodBody::Diagnostic(Arc::new(move || body(probe.as_ref()))))
    }

    /// Add an asynchronous method that yields nothing
    pub fn unit_async<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
    {
        let probe = self.probe.clone();
        self.push(
            name,
            MethodBody::UnitAsync(Arc::new(move || -> ProbeFuture<()> {
                Box::pin(body(probe.clone()))
            })),
        )
    }

    /// Add an asynchronous method that yields a diagnostic string
    pub fn diagnostic_async<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Arc<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ProbeError>> + Send + 'static,
    {
        let probe = self.probe.clone();
        self.push(
            name,
            MethodBody::DiagnosticAsync(Arc::new(move || -> ProbeFuture<String> {
                Box::pin(body(probe.clone()))
            })),
        )
    }

    pub fn build(self) -> Vec<ProbeMethod> {
        self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl Probe for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn methods(self: Arc<Self>) -> Vec<ProbeMethod> {
            ProbeMethods::new(self)
                .unit("unit", |_| Ok(()))
                .diagnostic("diagnostic", |_| Ok("1".to_string()))
                .unit_async("unit_async", |_| async { Ok(()) })
                .diagnostic_async("diagnostic_async", |_| async { Ok("2".to_string()) })
                .build()
        }
    }

    #[test]
    fn test_builder_records_shapes_in_order() {
        let methods = Arc::new(Counter).methods();
        let shapes: Vec<MethodShape> = methods.iter().map(|m| m.shape()).collect();
        assert_eq!(
            shapes,
            vec![
                MethodShape::Unit,
                MethodShape::Diagnostic,
                MethodShape::UnitAsync,
                MethodShape::DiagnosticAsync,
            ]
        );
        assert!(methods.iter().all(|m| m.probe_name() == "counter"));
        assert_eq!(methods[2].id(), "counter::unit_async");
    }

    #[test]
    fn test_shape_is_async() {
        assert!(!MethodShape::Unit.is_async());
        assert!(!MethodShape::Diagnostic.is_async());
        assert!(MethodShape::UnitAsync.is_async());
        assert!(MethodShape::DiagnosticAsync.is_async());
    }

    #[test]
    fn test_debug_omits_body() {
        let methods = Arc::new(Counter).methods();
        let rendered = format!("{:?}", methods[1]);
        assert!(rendered.contains("diagnostic"));
        assert!(rendered.contains("counter"));
    }
}

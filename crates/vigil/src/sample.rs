use std::sync::Arc;
use std::time::Instant;
use vigil_core::{PendingResponseAssertions, ProbeError, ResponseAssertions};
use vigil_runtime::{
    AppliesToApplication, HasTags, HttpProbeClient, Probe, ProbeMethod, ProbeMethods,
};

/// Live-site probes for the Bing web front end
///
/// Exercises every method shape against the client's base URL.
pub struct BingProbes {
    client: HttpProbeClient,
}

impl BingProbes {
    pub fn new(client: HttpProbeClient) -> Self {
        Self { client }
    }

    fn homepage_response_time(&self) -> Result<String, ProbeError> {
        let start = Instant::now();
        let response = tokio::runtime::Handle::current().block_on(self.client.get("/"))?;
        response.should_succeed()?;
        Ok(format!("{} milliseconds", start.elapsed().as_millis()))
    }

    fn base_url_is_https(&self) -> Result<(), ProbeError> {
        if self.client.base_url().starts_with("https://") {
            Ok(())
        } else {
            Err(ProbeError::logic(
                "configuration",
                format!("live-site probes need an https base URL, got {}", self.client.base_url()),
            ))
        }
    }
}

impl Probe for BingProbes {
    fn name(&self) -> &str {
        "bing"
    }

    fn methods(self: Arc<Self>) -> Vec<ProbeMethod> {
        ProbeMethods::new(self)
            .unit("base_url_is_https", BingProbes::base_url_is_https)
            .diagnostic("homepage_response_time", BingProbes::homepage_response_time)
            .diagnostic_async("images_should_succeed", |probe| async move {
                let response = probe.client.get("/images").should_succeed_async().await?;
                let summary = serde_json::json!({
                    "status": response.status(),
                    "content_type": response.header("content-type"),
                    "content_length": response.body().len(),
                });
                Ok(summary.to_string())
            })
            .unit_async("rewards_should_succeed", |probe| async move {
                probe
                    .client
                    .get("/rewards/dashboard")
                    .should_succeed_async()
                    .await?;
                Ok(())
            })
            .unit_async("maps_should_succeed", |probe| async move {
                probe.client.get("/mapspreview").should_succeed_async().await?;
                Ok(())
            })
            .build()
    }

    fn as_applicability(&self) -> Option<&dyn AppliesToApplication> {
        Some(self)
    }

    fn as_tagged(&self) -> Option<&dyn HasTags> {
        Some(self)
    }
}

impl AppliesToApplication for BingProbes {
    fn applies_to(&self, application: &str) -> bool {
        application == "bing"
    }
}

impl HasTags for BingProbes {
    fn tags(&self) -> Vec<&str> {
        vec!["LiveSite", "NonSideEffecting"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_runtime::{applies_to, tags_of, HttpProbeClientConfig, MethodShape};

    fn probes(base_url: &str) -> Arc<BingProbes> {
        let client = HttpProbeClient::new(&HttpProbeClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap();
        Arc::new(BingProbes::new(client))
    }

    #[test]
    fn test_capabilities() {
        let bing = probes("https://www.bing.com");
        let probe: &dyn Probe = &*bing;
        assert!(applies_to(probe, "bing"));
        assert!(!applies_to(probe, "contoso"));

        let tags = tags_of(probe);
        assert!(tags.contains("LiveSite"));
        assert!(tags.contains("NonSideEffecting"));
    }

    #[test]
    fn test_every_shape_is_present() {
        let methods = probes("https://www.bing.com").methods();
        for shape in [
            MethodShape::Unit,
            MethodShape::Diagnostic,
            MethodShape::UnitAsync,
            MethodShape::DiagnosticAsync,
        ] {
            assert!(methods.iter().any(|m| m.shape() == shape), "{}", shape);
        }
    }

    #[test]
    fn test_base_url_check() {
        assert!(probes("https://www.bing.com").base_url_is_https().is_ok());
        assert!(matches!(
            probes("http://www.bing.com").base_url_is_https(),
            Err(ProbeError::Logic { .. })
        ));
    }
}

//! Tool dispatch boundary.
//!
//! Runs one handler call under a per-capability deadline and turns every
//! failure (handler error, timeout, panic, missing registration) into a
//! user-facing string tagged with the capability. Nothing past this point
//! sees an `Err` from a collaborator. Failures are never retried.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use switchboard_core::config::DispatchConfig;
use switchboard_core::Capability;
use switchboard_tools::{DocumentDigest, FallbackNotice, ToolArgs, ToolError, ToolRegistry};

/// Normalised result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub capability: Capability,
    /// Always present: the tool's reply or the tagged error text.
    pub text: String,
    pub succeeded: bool,
    pub fallback: Option<FallbackNotice>,
    #[serde(skip)]
    pub digest: Option<DocumentDigest>,
}

impl DispatchOutcome {
    fn failed(capability: Capability, error: &ToolError) -> Self {
        Self {
            capability,
            text: error_text(capability, error),
            succeeded: false,
            fallback: None,
            digest: None,
        }
    }
}

/// User-facing text for a failed call.
pub fn error_text(capability: Capability, error: &ToolError) -> String {
    format!("{} error: {}", capability.label(), error)
}

/// Shared, stateless dispatcher over a [`ToolRegistry`].
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
    budgets: DispatchConfig,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry, budgets: DispatchConfig) -> Self {
        Self { registry, budgets }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Deadline for one call of `capability`.
    pub fn budget(&self, capability: Capability) -> Duration {
        let secs = match capability {
            Capability::Calculator | Capability::Time | Capability::UnitConverter => {
                self.budgets.local_timeout_secs
            }
            Capability::Weather | Capability::NewsSearch => self.budgets.lookup_timeout_secs,
            Capability::Email | Capability::PdfAnalysis => self.budgets.io_timeout_secs,
            Capability::Conversation => self.budgets.llm_timeout_secs,
            Capability::Ocr => self.budgets.vision_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    /// Run the handler registered for `args` and normalise its outcome.
    pub async fn dispatch(&self, args: ToolArgs) -> DispatchOutcome {
        let capability = args.capability();
        let Some(handler) = self.registry.get(capability) else {
            let err = ToolError::Unregistered(capability);
            warn!(capability = %capability, "no handler registered");
            return DispatchOutcome::failed(capability, &err);
        };

        debug!(capability = %capability, call = %handler.describe(&args), "dispatching");
        let budget = self.budget(capability);
        let started = Instant::now();

        let mut task = tokio::spawn(async move { handler.execute(&args).await });
        let result = match tokio::time::timeout(budget, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ToolError::Panicked(join_error.to_string())),
            Err(_) => {
                task.abort();
                Err(ToolError::Timeout(budget.as_secs()))
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                if let Some(notice) = &output.fallback {
                    warn!(
                        capability = %capability,
                        fallback = ?notice.kind,
                        reason = %notice.reason,
                        "tool degraded to fallback"
                    );
                }
                info!(capability = %capability, elapsed_ms, outcome = "ok", "dispatch finished");
                DispatchOutcome {
                    capability,
                    text: output.text,
                    succeeded: true,
                    fallback: output.fallback,
                    digest: output.digest,
                }
            }
            Err(e) => {
                warn!(capability = %capability, elapsed_ms, error = %e, "tool call failed");
                info!(capability = %capability, elapsed_ms, outcome = "error", "dispatch finished");
                DispatchOutcome::failed(capability, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use switchboard_services::{MockWeatherService, WeatherError};
    use switchboard_tools::handler::weather::WeatherHandler;
    use switchboard_tools::{ToolHandler, ToolOutput};

    struct SlowHandler;

    #[async_trait]
    impl ToolHandler for SlowHandler {
        fn capability(&self) -> Capability {
            Capability::Time
        }

        async fn execute(&self, _args: &ToolArgs) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ToolOutput::text("too late"))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl ToolHandler for PanickingHandler {
        fn capability(&self) -> Capability {
            Capability::Calculator
        }

        async fn execute(&self, _args: &ToolArgs) -> Result<ToolOutput, ToolError> {
            panic!("handler bug")
        }
    }

    fn dispatcher_with(registry: ToolRegistry) -> ToolDispatcher {
        ToolDispatcher::new(registry, DispatchConfig::default())
    }

    fn registry_with(handler: impl ToolHandler + 'static) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(handler));
        registry
    }

    #[test]
    fn test_budgets_by_capability() {
        let d = dispatcher_with(ToolRegistry::new());
        assert_eq!(d.budget(Capability::Calculator), Duration::from_secs(5));
        assert_eq!(d.budget(Capability::Weather), Duration::from_secs(20));
        assert_eq!(d.budget(Capability::Email), Duration::from_secs(90));
        assert_eq!(d.budget(Capability::Conversation), Duration::from_secs(60));
        assert_eq!(d.budget(Capability::Ocr), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_success() {
        let outcome = dispatcher_with(registry_with(
            switchboard_tools::handler::calculator::CalculatorHandler,
        ))
        .dispatch(ToolArgs::Calculator {
            expression: "15 * 20".into(),
        })
        .await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.capability, Capability::Calculator);
        assert!(outcome.text.contains("300"));
    }

    #[tokio::test]
    async fn test_handler_error_becomes_tagged_text() {
        let weather = Arc::new(MockWeatherService::failing(WeatherError::Timeout));
        let outcome = dispatcher_with(registry_with(WeatherHandler::new(weather)))
            .dispatch(ToolArgs::Weather {
                location: "Paris".into(),
            })
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.text, "Weather error: Weather service timed out");
    }

    #[tokio::test]
    async fn test_calculator_rejects_letters() {
        let outcome = dispatcher_with(registry_with(
            switchboard_tools::handler::calculator::CalculatorHandler,
        ))
        .dispatch(ToolArgs::Calculator {
            expression: "2 + abs(3)".into(),
        })
        .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.text, "Calculator error: Only basic math operations allowed");
    }

    #[tokio::test]
    async fn test_unregistered() {
        let outcome = dispatcher_with(ToolRegistry::new())
            .dispatch(ToolArgs::Time {
                location: "local".into(),
            })
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.text, "Time error: Tool not registered: time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let outcome = dispatcher_with(registry_with(SlowHandler))
            .dispatch(ToolArgs::Time {
                location: "local".into(),
            })
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.text, "Time error: Timed out after 5 seconds");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let outcome = dispatcher_with(registry_with(PanickingHandler))
            .dispatch(ToolArgs::Calculator {
                expression: "1+1".into(),
            })
            .await;
        assert!(!outcome.succeeded);
        assert!(outcome.text.starts_with("Calculator error: Tool crashed:"));
    }
}

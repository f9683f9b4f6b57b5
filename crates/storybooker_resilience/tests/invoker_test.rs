use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use storybooker_error::{CapabilityKind, FailureClass, ProviderError, ProviderErrorKind};
use storybooker_interface::ProviderCandidate;
use storybooker_resilience::{
    AttemptOutcome, Invoker, KeywordClassifier, RetryPolicy, RetryPolicyBuilder, attempt_order,
};

enum Step {
    Ok(&'static str),
    Fail(ProviderErrorKind),
    Hang(Duration),
}

#[derive(Clone)]
struct Scripted {
    name: &'static str,
    script: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicUsize>,
    transport_class: Option<FailureClass>,
}

impl Scripted {
    fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self {
            name,
            script: Arc::new(Mutex::new(steps.into())),
            calls: Arc::new(AtomicUsize::new(0)),
            transport_class: None,
        }
    }

    fn classifying_transport_as(mut self, class: FailureClass) -> Self {
        self.transport_class = Some(class);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn call(self) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Ok(text)) => Ok(text.to_string()),
            Some(Step::Fail(kind)) => Err(ProviderError::new(kind)),
            Some(Step::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Ok("too late".to_string())
            }
            None => Ok(format!("{} default", self.name)),
        }
    }
}

impl ProviderCandidate for Scripted {
    fn provider_name(&self) -> &str {
        self.name
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::TextGeneration
    }

    fn classify_failure(&self, err: &ProviderError) -> Option<FailureClass> {
        match err.kind {
            ProviderErrorKind::Transport(_) => self.transport_class,
            _ => None,
        }
    }
}

fn http(status_code: u16, message: &str) -> Step {
    Step::Fail(ProviderErrorKind::Http {
        status_code,
        message: message.to_string(),
    })
}

fn invoker(retry_budget: u32) -> Invoker {
    let policy = RetryPolicyBuilder::default()
        .retry_budget(retry_budget)
        .initial_backoff_ms(2u64)
        .max_backoff_ms(10u64)
        .jitter(false)
        .build()
        .unwrap();
    Invoker::new(policy, Arc::new(KeywordClassifier::default()))
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_first_success_short_circuits() {
    let a = Scripted::new("a", vec![Step::Ok("from a")]);
    let b = Scripted::new("b", vec![Step::Ok("from b")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[a.clone(), b.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "from a");
    assert_eq!(report.served_by.as_deref(), Some("a"));
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 0);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(*report.diagnostics[0].outcome(), AttemptOutcome::Success);
}

#[tokio::test]
async fn test_fatal_auth_on_first_candidate_falls_through() {
    let a = Scripted::new("a", vec![http(401, "invalid api key")]);
    let b = Scripted::new("b", vec![Step::Ok("from b")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[a.clone(), b.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "from b");
    assert_eq!(a.calls(), 1, "fatal auth is never retried");
    assert_eq!(b.calls(), 1);
    assert_eq!(
        *report.diagnostics[0].outcome(),
        AttemptOutcome::Failed(FailureClass::FatalAuth)
    );
}

#[tokio::test]
async fn test_transient_retried_on_same_candidate() {
    let a = Scripted::new("a", vec![http(503, "busy"), http(502, "busy"), Step::Ok("third time")]);
    let b = Scripted::new("b", vec![Step::Ok("from b")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[a.clone(), b.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "third time");
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 0);
    assert_eq!(*report.diagnostics[2].attempt(), 3);
}

#[tokio::test]
async fn test_transient_budget_exhausted_moves_on() {
    let a = Scripted::new("a", vec![http(500, "x"), http(500, "x"), http(500, "x"), Step::Ok("never")]);
    let b = Scripted::new("b", vec![Step::Ok("from b")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[a.clone(), b.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "from b");
    assert_eq!(a.calls(), 3, "one attempt plus two retries");
}

#[tokio::test]
async fn test_rate_limited_and_unsupported_are_not_retried() {
    let a = Scripted::new("a", vec![http(429, "slow down")]);
    let b = Scripted::new("b", vec![Step::Fail(ProviderErrorKind::ModelNotFound("m".into()))]);
    let c = Scripted::new("c", vec![Step::Ok("from c")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[a.clone(), b.clone(), c.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "from c");
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_exhaustion_aggregates_last_failure_per_candidate() {
    let a = Scripted::new("a", vec![http(429, "too many requests")]);
    let b = Scripted::new("b", vec![http(401, "Incorrect API key provided")]);
    let report = invoker(0)
        .invoke(
            CapabilityKind::ImageGeneration,
            &[a, b],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    let err = report.outcome.unwrap_err();
    assert_eq!(err.capability, CapabilityKind::ImageGeneration);
    assert_eq!(err.failures.len(), 2);
    assert_eq!(err.failures[0].class, FailureClass::RateLimited);
    let auth = err.fatal_auth().expect("last failure is fatal auth");
    assert_eq!(auth.candidate, "b");
    assert!(auth.message.contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_latency_bounded_by_timeouts() {
    let per_attempt = Duration::from_millis(50);
    let a = Scripted::new("a", vec![Step::Hang(Duration::from_secs(10))]);
    let b = Scripted::new("b", vec![Step::Hang(Duration::from_secs(10))]);
    let invoker = invoker(1);
    let bound = invoker.latency_bound(2, per_attempt);

    let started = Instant::now();
    let report = invoker
        .invoke(
            CapabilityKind::TextGeneration,
            &[a, b],
            per_attempt,
            |c: Scripted| c.call(),
        )
        .await;
    let elapsed = started.elapsed();

    let err = report.outcome.unwrap_err();
    assert!(err.all(FailureClass::Timeout));
    assert_eq!(bound, Duration::from_millis(200));
    assert!(
        elapsed < bound + Duration::from_millis(150),
        "took {:?}, bound {:?}",
        elapsed,
        bound
    );
}

#[tokio::test]
async fn test_slow_transient_retries_stay_within_candidate_budget() {
    let per_attempt = Duration::from_millis(40);
    let a = Scripted::new(
        "a",
        vec![
            Step::Fail(ProviderErrorKind::Unavailable("warming up".into())),
            Step::Hang(Duration::from_secs(10)),
            Step::Hang(Duration::from_secs(10)),
        ],
    );
    let invoker = invoker(2);
    let started = Instant::now();
    let report = invoker
        .invoke(
            CapabilityKind::TextGeneration,
            std::slice::from_ref(&a),
            per_attempt,
            |c: Scripted| c.call(),
        )
        .await;

    assert!(report.outcome.is_err());
    assert!(started.elapsed() < invoker.latency_bound(1, per_attempt) + Duration::from_millis(100));
}

#[test]
fn test_attempt_order_preferred_first() {
    let fixed = vec![
        Scripted::new("groq", vec![]),
        Scripted::new("openai", vec![]),
        Scripted::new("mock", vec![]),
    ];

    let names = |order: Vec<Scripted>| order.iter().map(|c| c.name).collect::<Vec<_>>();
    assert_eq!(names(attempt_order(Some("openai"), &fixed)), vec!["openai", "groq", "mock"]);
    assert_eq!(names(attempt_order(Some("GROQ"), &fixed)), vec!["groq", "openai", "mock"]);
    assert_eq!(names(attempt_order(Some("bard"), &fixed)), vec!["groq", "openai", "mock"]);
    assert_eq!(names(attempt_order(None, &fixed)), vec!["groq", "openai", "mock"]);
}

#[test]
fn test_default_policy_bound() {
    let policy = RetryPolicy::default();
    assert_eq!(
        policy.candidate_budget(Duration::from_secs(120)),
        Duration::from_secs(360)
    );
    assert_eq!(RetryPolicy::no_retry().candidate_budget(Duration::from_secs(1)), Duration::from_secs(1));
}

#[tokio::test]
async fn test_candidate_classification_overrides_shared_rules() {
    let refused = || Step::Fail(ProviderErrorKind::Transport("connection refused".into()));
    let local = Scripted::new("local", vec![refused(), refused(), refused()])
        .classifying_transport_as(FailureClass::Unsupported);
    let hosted = Scripted::new("hosted", vec![refused(), Step::Ok("from hosted")]);
    let report = invoker(2)
        .invoke(
            CapabilityKind::TextGeneration,
            &[local.clone(), hosted.clone()],
            TIMEOUT,
            |c: Scripted| c.call(),
        )
        .await;

    assert_eq!(report.outcome.unwrap(), "from hosted");
    assert_eq!(local.calls(), 1, "unsupported is never retried");
    assert_eq!(hosted.calls(), 2, "transient is retried by the shared rules");
}

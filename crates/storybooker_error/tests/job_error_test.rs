use storybooker_error::{
    CandidateFailure, CapabilityKind, FailureClass, InvocationError, JobError, JobErrorKind,
};

fn failure(candidate: &str, class: FailureClass, message: &str) -> CandidateFailure {
    CandidateFailure {
        candidate: candidate.to_string(),
        class,
        message: message.to_string(),
        attempts: 1,
    }
}

#[test]
fn test_last_fatal_auth_is_configuration_with_verbatim_text() {
    let err = InvocationError::new(
        CapabilityKind::TextGeneration,
        vec![
            failure("groq", FailureClass::RateLimited, "quota exceeded"),
            failure("openai", FailureClass::FatalAuth, "Incorrect API key provided: sk-xx"),
        ],
    );

    let job = JobError::from_invocation(&err);
    assert_eq!(job.kind, JobErrorKind::Configuration);
    assert_eq!(job.diagnostic, "Incorrect API key provided: sk-xx");
    assert!(job.message.contains("openai"));
}

#[test]
fn test_all_timeouts_is_timeout() {
    let err = InvocationError::new(
        CapabilityKind::ImageGeneration,
        vec![
            failure("pollinations", FailureClass::Timeout, "deadline exceeded"),
            failure("openai", FailureClass::Timeout, "deadline exceeded"),
        ],
    );

    assert_eq!(JobError::from_invocation(&err).kind, JobErrorKind::Timeout);
}

#[test]
fn test_mixed_failures_are_capacity() {
    let err = InvocationError::new(
        CapabilityKind::TextGeneration,
        vec![
            failure("groq", FailureClass::FatalAuth, "missing key"),
            failure("openai", FailureClass::Timeout, "deadline exceeded"),
            failure("local", FailureClass::Transient, "HTTP 503"),
        ],
    );

    let job = JobError::from_invocation(&err);
    assert_eq!(job.kind, JobErrorKind::Capacity);
    assert!(job.diagnostic.contains("groq [fatal_auth"));
    assert!(job.diagnostic.contains("local [transient"));
}

#[test]
fn test_unsupported_everywhere_is_configuration() {
    let err = InvocationError::new(
        CapabilityKind::TextGeneration,
        vec![failure("local", FailureClass::Unsupported, "model 'llama9' not found")],
    );

    assert_eq!(JobError::from_invocation(&err).kind, JobErrorKind::Configuration);
}

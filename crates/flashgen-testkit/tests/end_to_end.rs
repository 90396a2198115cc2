//! Full lifecycle through the blocking facade, with the stub binary
//! launched as the companion.

use std::time::Duration;

use flashgen_core::{AnswerVerdict, CompanionConfig, PromptRequest, ServiceState};
use flashgen_runtime::{
    CompanionService, StopOutcome, is_port_listening, is_process_alive, listening_pids,
};
use flashgen_testkit::{STUB_SENTENCE, free_port};

const STUB_BIN: &str = env!("CARGO_BIN_EXE_stub-companion");

fn stub_config(port: u16) -> CompanionConfig {
    CompanionConfig::default()
        .with_port(port)
        .with_command(STUB_BIN, format!("127.0.0.1:{port}"))
        .with_health_budget(50, 100)
        .with_request_timeout_secs(10)
}

#[test]
#[cfg(unix)]
fn launch_request_stop() {
    let port = free_port().unwrap();
    assert!(!is_port_listening(port));

    let service = CompanionService::start(stub_config(port)).unwrap();
    assert_eq!(service.state().unwrap(), ServiceState::Running);

    let pid = service.owned_pid().unwrap().expect("stub should be owned");
    assert!(listening_pids(port).contains(&pid));

    assert_eq!(
        service.request_exercise_blocking("run", "to run"),
        Ok(STUB_SENTENCE.to_string())
    );

    assert_eq!(
        service.stop().unwrap(),
        StopOutcome::Stopped { pids: vec![pid] }
    );
    assert!(!is_port_listening(port));
    assert!(!is_process_alive(pid));
    assert_eq!(service.state().unwrap(), ServiceState::NotRunning);

    // Nothing left to stop
    assert_eq!(service.stop().unwrap(), StopOutcome::NoProcessFound);
}

#[test]
#[cfg(unix)]
fn practice_round_and_shutdown() {
    let port = free_port().unwrap();
    let service = CompanionService::start(stub_config(port)).unwrap();

    let exercise = service
        .generate_exercise(PromptRequest::new("run", "to run"))
        .unwrap();
    assert!(exercise.has_blank());
    assert_eq!(exercise.check_answer("  RUN "), AnswerVerdict::Correct);
    assert_eq!(exercise.check_answer("walk"), AnswerVerdict::Incorrect);

    // The stub prints its banner on stdout; the supervisor keeps it
    std::thread::sleep(Duration::from_millis(100));
    assert!(
        service
            .recent_output(50)
            .iter()
            .any(|l| l.line.contains("Running on http://"))
    );

    assert!(service.shutdown().unwrap().is_stopped());
    assert!(!is_port_listening(port));
}

#[test]
#[cfg(unix)]
fn requests_after_stop_degrade_cleanly() {
    let port = free_port().unwrap();
    let service = CompanionService::start(stub_config(port)).unwrap();
    assert!(service.stop().unwrap().is_stopped());

    let err = service.request_exercise_blocking("run", "to run").unwrap_err();
    assert_eq!(err.user_message(), "exercise generation unavailable");
}

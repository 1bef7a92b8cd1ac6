#![cfg(unix)]

use std::io::Write;
use std::time::Duration;

use ptydrive::{
    CommandSpec, DriverError, Process, ProcessState, Script, ScriptWriter, Transcript,
};

#[tokio::test]
async fn valid_command_starts_and_exits() {
    let spec = CommandSpec::new("sh").args(["-c", "printf ready"]);
    let mut process = Process::new(spec);
    let transcript = Transcript::new();

    process.start(transcript.writer()).unwrap();
    assert_eq!(process.state(), ProcessState::Running);

    let status = process.wait().await.unwrap();
    assert!(status.success());
    assert_eq!(process.state(), ProcessState::Exited);
    assert!(transcript.contains("ready"));
}

#[tokio::test]
async fn shell_script_echoes_and_exits() {
    // Interactive shell with a minimal startup profile, driven entirely
    // by the script writer.
    let mut rc = tempfile::NamedTempFile::new().unwrap();
    writeln!(rc, "PS1=''").unwrap();

    let spec = CommandSpec::new("sh")
        .env("ENV", rc.path().to_string_lossy())
        .env("PS1", "");
    let mut process = Process::new(spec);
    let input = process.take_input().unwrap();
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let feeder = ScriptWriter::spawn(input, Script::from_lines(["echo hello", "exit"]));

    let status = process.wait().await.unwrap();
    assert!(status.success(), "shell should exit cleanly: {status:?}");
    feeder.await.unwrap();

    assert!(
        transcript.wait_for("hello", Duration::from_secs(5)).await,
        "transcript should contain the echoed line, got: {}",
        transcript.snapshot()
    );
}

#[tokio::test]
async fn lines_appear_in_order() {
    let mut process = Process::new(CommandSpec::new("cat"));
    let input = process.take_input().unwrap();
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let _feeder = ScriptWriter::spawn(input, Script::from_lines(["alpha", "bravo", "charlie"]));

    assert!(
        transcript
            .wait_for("charlie", Duration::from_secs(5))
            .await,
        "cat should have echoed the last line, got: {}",
        transcript.snapshot()
    );

    // Chunk boundaries are unspecified; only relative order is promised.
    let text = transcript.snapshot();
    let alpha = text.find("alpha").unwrap();
    let bravo = text.find("bravo").unwrap();
    let charlie = text.find("charlie").unwrap();
    assert!(alpha < bravo && bravo < charlie, "out of order: {text}");

    // Closing the input channel is not a quit signal for cat on a
    // terminal, so stop it explicitly.
    process.kill();
    let status = process.wait().await.unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn exit_code_is_reported() {
    let mut process = Process::new(CommandSpec::new("sh").args(["-c", "exit 123"]));
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let status = process.wait().await.unwrap();
    assert_eq!(status.exit_code(), 123);
    assert!(!status.success());
}

#[tokio::test]
async fn output_loop_ends_while_input_still_open() {
    // The child exits immediately; the input relay loop is still blocked
    // awaiting script input. wait() must return regardless and the input
    // loop must end once the writer is dropped.
    let mut process = Process::new(CommandSpec::new("sh").args(["-c", "exit 123"]));
    let input = process.take_input().unwrap();
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let status = tokio::time::timeout(Duration::from_secs(10), process.wait())
        .await
        .expect("wait must not hang on an open input channel")
        .unwrap();
    assert_eq!(status.exit_code(), 123);

    drop(input);
}

#[tokio::test]
async fn wait_is_idempotent() {
    let mut process = Process::new(CommandSpec::new("sh").args(["-c", "exit 5"]));
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let first = process.wait().await.unwrap();
    assert_eq!(first.exit_code(), 5);

    // The second call returns the cached status without blocking.
    let second = tokio::time::timeout(Duration::from_millis(100), process.wait())
        .await
        .expect("second wait must not block")
        .unwrap();
    assert_eq!(second.exit_code(), first.exit_code());
    assert_eq!(second.success(), first.success());
}

#[tokio::test]
async fn missing_executable_fails_start() {
    let mut process = Process::new(CommandSpec::new("/definitely/not/a/real/executable"));
    let transcript = Transcript::new();

    let err = process.start(transcript.writer()).unwrap_err();
    assert!(matches!(err, DriverError::Spawn { .. }), "got: {err}");
    assert_eq!(process.state(), ProcessState::Created);

    // No relay loops were started; wait is a usage error, not a hang.
    assert!(matches!(
        process.wait().await,
        Err(DriverError::NotStarted)
    ));
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let mut process = Process::new(CommandSpec::new("cat"));
    let _input = process.take_input().unwrap();
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let err = process.start(transcript.writer()).unwrap_err();
    assert!(matches!(err, DriverError::AlreadyStarted));

    process.kill();
    let status = process.wait().await.unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn script_into_unstarted_process_is_harmless() {
    let mut process = Process::new(CommandSpec::new("cat"));
    let input = process.take_input().unwrap();
    let feeder = ScriptWriter::spawn(input, Script::from_lines(["never delivered"]));

    // Receiver gone before any relay loop ever existed.
    drop(process);

    feeder.await.expect("feeding a closed channel must not panic");
}

#[tokio::test]
async fn shutdown_handle_aborts_hung_child() {
    // cat with no input hangs forever; the cancellation handle converts
    // that into a bounded, observable termination.
    let mut process = Process::new(CommandSpec::new("cat"));
    let _input = process.take_input().unwrap();
    let transcript = Transcript::new();
    process.start(transcript.writer()).unwrap();

    let handle = process.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.signal();
    });

    let status = tokio::time::timeout(Duration::from_secs(10), process.wait())
        .await
        .expect("wait should return after cancellation")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn take_input_is_single_use() {
    let mut process = Process::new(CommandSpec::new("cat"));
    assert!(process.take_input().is_some());
    assert!(process.take_input().is_none());
}

#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use predbridge_channel::{Channel, ChannelConfig, ChannelError, ChannelListener};
use predbridge_protocol::{
    decode_response, encode_message, CommandKind, Message, ParameterKind, PredictionContextKind,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/pbcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("bridge never bound {}", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn spawn_listening_bridge(sock_path: &Path) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_predbridge"))
        .arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg(sock_path)
        .arg("--listen")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve should start");
    wait_for_socket(sock_path, Duration::from_secs(3));
    child
}

fn send(sock_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_predbridge"))
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(sock_path)
        .args(args)
        .output()
        .expect("send should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each reply should be one json line"))
        .collect()
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<i32> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("child status should be readable") {
            return status.code();
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            panic!("bridge did not exit in time");
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn listening_bridge_learns_and_predicts_within_one_session() {
    let dir = unique_temp_dir("predict");
    let sock_path = dir.join("bridge.sock");
    let mut bridge = spawn_listening_bridge(&sock_path);

    let output = send(
        &sock_path,
        &[
            "--set",
            "SUGGESTIONS=2",
            "--message",
            r#"{"MessageType":"LEARN_WORDS","PredictionType":"NONE","Data":"hello help helium hello"}"#,
            "--command",
            "NEXT_WORD_PREDICTION",
            "--context",
            "NORMAL",
            "--data",
            "he",
        ],
    );
    assert!(output.status.success(), "{output:?}");

    let replies = json_lines(&output);
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["command"], "SET_PARAM");
    assert_eq!(replies[1]["status"], "SUCCESS");
    let candidates = replies[2]["candidates"].as_array().expect("candidate list");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["Text"], "hello");
    assert_eq!(candidates[0]["Score"], 0.5);

    let output = send(&sock_path, &["--quit"]);
    assert!(output.status.success());
    assert_eq!(wait_for_exit(&mut bridge, Duration::from_secs(5)), Some(0));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_request_sets_exit_code_and_bridge_keeps_serving() {
    let dir = unique_temp_dir("notready");
    let sock_path = dir.join("bridge.sock");
    let mut bridge = spawn_listening_bridge(&sock_path);

    let output = send(
        &sock_path,
        &[
            "--command",
            "NEXT_WORD_PREDICTION",
            "--context",
            "SHORTHAND",
            "--data",
            "brb",
            "--message",
            "{\"MessageType\":\"SET_PARAM\",\"Data\":{\"Parameter\":\"FONT_SIZE\",\"Value\":3}}",
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    let replies = json_lines(&output);
    assert_eq!(replies.len(), 2);
    assert!(replies[0]["error"]
        .as_str()
        .unwrap()
        .contains("FONT_SIZE"));
    assert!(replies[1]["error"]
        .as_str()
        .unwrap()
        .contains("not initialized"));

    let output = send(&sock_path, &["--quit"]);
    assert!(output.status.success());
    assert_eq!(wait_for_exit(&mut bridge, Duration::from_secs(5)), Some(0));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_without_bridge_returns_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = send(&dir.join("absent.sock"), &["--quit"]);
    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

fn receive_blocking(channel: &mut dyn Channel) -> String {
    let start = Instant::now();
    loop {
        match channel.receive() {
            Ok(text) => return text,
            Err(ChannelError::Timeout(_)) if start.elapsed() < Duration::from_secs(5) => continue,
            Err(err) => panic!("host receive failed: {err}"),
        }
    }
}

fn accept_bridge(listener: &ChannelListener) -> Box<dyn Channel> {
    let start = Instant::now();
    loop {
        if let Some(channel) = listener.poll_accept().expect("poll should not fail") {
            return channel;
        }
        if start.elapsed() >= Duration::from_secs(5) {
            panic!("bridge never connected");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn exchange(channel: &mut dyn Channel, message: Message) -> predbridge_protocol::Response {
    channel.send(&encode_message(&message).unwrap()).unwrap();
    decode_response(&receive_blocking(channel)).unwrap()
}

fn drive_host_session(channel: &mut dyn Channel) {

    let ack = exchange(
        channel,
        Message::set_param(ParameterKind::Suggestions, serde_json::json!(10)),
    );
    assert!(ack.is_success());

    let ack = exchange(
        channel,
        Message::new(
            CommandKind::LearnSentences,
            PredictionContextKind::Sentence,
            "See you tomorrow. See you soon!",
        ),
    );
    assert!(ack.is_success());

    let reply = exchange(
        channel,
        Message::new(
            CommandKind::NextSentencePrediction,
            PredictionContextKind::Sentence,
            "see you",
        ),
    );
    let texts: Vec<String> = reply
        .candidates()
        .unwrap()
        .into_iter()
        .map(|candidate| candidate.text)
        .collect();
    assert_eq!(texts, ["See you soon!", "See you tomorrow."]);

    let bye = exchange(channel, Message::force_quit());
    assert_eq!(bye.command, Some(CommandKind::ForceQuit));
}

fn spawn_connecting_bridge(transport: &str, endpoint: &str) -> Child {
    Command::new(env!("CARGO_BIN_EXE_predbridge"))
        .arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg(endpoint)
        .arg("--transport")
        .arg(transport)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("serve should start")
}

#[test]
fn bridge_connects_to_pipe_host_and_quits_on_request() {
    let dir = unique_temp_dir("pipehost");
    let path = dir.join("host.sock").display().to_string();
    let listener = ChannelListener::bind(ChannelConfig::pipe(path.clone())).unwrap();

    let mut bridge = spawn_connecting_bridge("pipe", &path);
    let mut channel = accept_bridge(&listener);
    drive_host_session(channel.as_mut());

    assert_eq!(wait_for_exit(&mut bridge, Duration::from_secs(5)), Some(0));
    drop(listener);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn bridge_connects_to_socket_host_and_quits_on_request() {
    let listener = ChannelListener::bind(ChannelConfig::socket("127.0.0.1:0")).unwrap();
    let endpoint = listener.local_endpoint();

    let mut bridge = spawn_connecting_bridge("socket", &endpoint);
    let mut channel = accept_bridge(&listener);
    drive_host_session(channel.as_mut());

    assert_eq!(wait_for_exit(&mut bridge, Duration::from_secs(5)), Some(0));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_predbridge"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("predbridge {}", env!("CARGO_PKG_VERSION"))
    );
}

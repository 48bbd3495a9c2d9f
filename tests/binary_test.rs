#![cfg(unix)]

use rask_logd::domain::SESSION_BANNER;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

struct Logger {
    child: Child,
    port: u16,
    stderr: Receiver<String>,
}

impl Logger {
    fn spawn(sink: &str) -> Self {
        let port = free_port();
        let mut child = Command::new(env!("CARGO_BIN_EXE_logger"))
            .arg(sink)
            .arg(port.to_string())
            .env("LOGD_LOG_FORMAT", "text")
            .env("RUST_LOG", "debug")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let stderr = child.stderr.take().unwrap();
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let logger = Self {
            child,
            port,
            stderr: rx,
        };
        logger.wait_for_diagnostic("Listening for log connections");
        logger
    }

    fn wait_for_diagnostic(&self, needle: &str) {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.stderr.recv_timeout(remaining) {
                Ok(line) if line.contains(needle) => return,
                Ok(_) => {}
                Err(_) => panic!("daemon never logged {needle:?}"),
            }
        }
    }

    fn send(&self, payload: &[u8]) {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).unwrap();
        stream.write_all(payload).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
    }

    fn terminate(&self) {
        let status = Command::new("kill")
            .arg("-TERM")
            .arg(self.child.id().to_string())
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn wait(mut self) -> (ExitStatus, String) {
        let deadline = Instant::now() + WAIT;
        let status = loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                break status;
            }
            if Instant::now() >= deadline {
                self.child.kill().unwrap();
                panic!("daemon did not exit");
            }
            thread::sleep(Duration::from_millis(20));
        };
        let mut stdout = String::new();
        self.child
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut stdout)
            .unwrap();
        (status, stdout)
    }
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn sigterm_drains_console_sink_and_exits_cleanly() {
    let logger = Logger::spawn("stdout");

    logger.send(b"1:hello world");
    logger.wait_for_diagnostic("Received log entry");
    logger.send(b"1:from c client\0ignored");
    logger.wait_for_diagnostic("Received log entry");
    logger.terminate();

    let (status, stdout) = logger.wait();
    assert!(status.success(), "exit status {status:?}");

    let banner_end = stdout.find("New Log").unwrap();
    let after_banner = &stdout[banner_end..];
    assert!(after_banner.contains(
        "\x1b[0;36mInfo: hello world\x1b[0m\n\x1b[0;36mInfo: from c client\x1b[0m\n"
    ));
    assert!(!stdout.contains("ignored"));
}

#[test]
fn malformed_message_is_fatal_and_file_keeps_earlier_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("daemon.log");
    let logger = Logger::spawn(path.to_str().unwrap());

    logger.send(b"3:disk full");
    logger.wait_for_diagnostic("Received log entry");
    logger.send(b"garbage");

    let (status, stdout) = logger.wait();
    assert!(!status.success());
    assert_eq!(status.code(), Some(1));
    assert!(stdout.is_empty());

    let contents = read(&path);
    assert_eq!(contents, format!("{SESSION_BANNER}Error: disk full\n"));
    assert!(!contents.contains('\x1b'));
}

#[test]
fn out_of_range_port_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_logger"))
        .args(["stdout", "70000"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

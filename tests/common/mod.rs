use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Runs the `audience` binary in an isolated temp directory.
pub struct ConsoleTest {
    pub temp_dir: TempDir,
    api_url: Option<String>,
}

impl ConsoleTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        ConsoleTest {
            temp_dir,
            api_url: None,
        }
    }

    /// Point every command at `url` through `AUDIENCE_API_URL`.
    pub fn with_api(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_audience"));
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("AUDIENCE_ROOT")
            .env_remove("AUDIENCE_API_URL")
            .env_remove("AUDIENCE_API_TOKEN")
            .env("AUDIENCE_LOG", "off")
            .env("NO_COLOR", "1");
        if let Some(url) = &self.api_url {
            command.env("AUDIENCE_API_URL", url);
        }
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute audience command")
    }

    /// Run with `input` piped to stdin.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn audience command");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
        child
            .wait_with_output()
            .expect("Failed to wait for audience command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_success(args, &output);
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".audience");
        fs::create_dir_all(&dir).expect("Failed to create .audience directory");
        fs::write(dir.join("config.yaml"), content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> Option<String> {
        fs::read_to_string(self.temp_dir.path().join(".audience").join("config.yaml")).ok()
    }
}

pub fn assert_success(args: &[&str], output: &Output) {
    if !output.status.success() {
        panic!(
            "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

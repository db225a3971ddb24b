use crate::display::ResolutionRecord;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Flag that makes the resolution tool list every supported mode.
pub const LIST_MODES_ARG: &str = "/L";
/// Banner and version lines the tool prints before the mode list.
const BANNER_LINES: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput>;
}

pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let output = cmd.output().await?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs the resolution tool once with `args`.
///
/// Returns `Ok(None)` when the tool cannot be used at all (missing executable
/// or no answer within `timeout`) so the caller can fall back. Anything the
/// tool writes to stderr is a hard error.
async fn run_resolution_tool(
    runner: &dyn CommandRunner,
    tool: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<Option<CommandOutput>> {
    let output = match tokio::time::timeout(timeout, runner.run(tool, args)).await {
        Err(_) => {
            warn!(
                "Resolution tool did not answer within {:?}, treating it as unavailable",
                timeout
            );
            return Ok(None);
        }
        Ok(Err(AppError::Io(e))) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Resolution tool not found at {}, treating it as unavailable",
                tool.display()
            );
            return Ok(None);
        }
        Ok(Err(AppError::Io(e))) => {
            return Err(AppError::ProcessSpawnFailed(format!(
                "{}: {}",
                tool.display(),
                e
            )))
        }
        Ok(result) => result?,
    };

    if !output.stderr.trim().is_empty() {
        return Err(AppError::ResolutionTool(output.stderr.trim().to_string()));
    }

    Ok(Some(output))
}

/// Asks the resolution tool for every supported display mode.
///
/// `Ok(None)` means enumeration is unavailable on this host.
pub async fn enumerate_resolutions(
    runner: &dyn CommandRunner,
    tool: &Path,
    timeout: Duration,
) -> Result<Option<Vec<ResolutionRecord>>> {
    info!(
        "Enumerating display modes with {} {}",
        tool.display(),
        LIST_MODES_ARG
    );

    let Some(output) = run_resolution_tool(runner, tool, &[LIST_MODES_ARG], timeout).await? else {
        return Ok(None);
    };

    let modes = parse_mode_list(&output.stdout)?;
    info!("Resolution tool reported {} display modes", modes.len());
    Ok(Some(modes))
}

/// Asks the resolution tool for the mode the primary display is in right now.
///
/// Without arguments the tool prints the same banner followed by a single mode line.
pub async fn query_current_resolution(
    runner: &dyn CommandRunner,
    tool: &Path,
    timeout: Duration,
) -> Result<Option<ResolutionRecord>> {
    let Some(output) = run_resolution_tool(runner, tool, &[], timeout).await? else {
        return Ok(None);
    };

    parse_mode_list(&output.stdout)?
        .into_iter()
        .next()
        .map(Some)
        .ok_or_else(|| {
            AppError::ParseError("resolution tool did not report the current mode".to_string())
        })
}

/// Parses the tool's mode list: two banner lines, then one `WxH, ...` line per mode.
/// Refresh rate and color depth after the first comma are discarded.
pub fn parse_mode_list(stdout: &str) -> Result<Vec<ResolutionRecord>> {
    let mut modes = Vec::new();

    for line in stdout.lines().skip(BANNER_LINES) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let token = line.split(',').next().unwrap_or(line);
        let mode = token.parse::<ResolutionRecord>().map_err(|_| {
            AppError::ParseError(format!("unexpected resolution tool line '{}'", line))
        })?;
        debug!("Display mode: {}", mode);
        modes.push(mode);
    }

    Ok(modes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const QRES_OUTPUT: &str = "QRes v1.1 Copyright (C) Anders Kjersem.\r\n\
        \r\n\
        640x480, 32 bits @ 60 Hz.\r\n\
        1920x1080, 32 bits @ 60 Hz.\r\n\
        1920x1080, 32 bits @ 144 Hz.\r\n\
        \r\n\
        3440x1440, 32 bits @ 100 Hz.\r\n";

    struct FakeRunner {
        output: CommandOutput,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, _program: &Path, args: &[&str]) -> Result<CommandOutput> {
            assert_eq!(args, &[LIST_MODES_ARG]);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.output.clone())
        }
    }

    struct MissingToolRunner;

    #[async_trait]
    impl CommandRunner for MissingToolRunner {
        async fn run(&self, _program: &Path, _args: &[&str]) -> Result<CommandOutput> {
            Err(AppError::Io(std::io::Error::new(ErrorKind::NotFound, "no such file")))
        }
    }

    #[test]
    fn test_parse_mode_list_skips_banner_and_blank_lines() {
        let modes = parse_mode_list(QRES_OUTPUT).unwrap();
        assert_eq!(
            modes,
            vec![
                ResolutionRecord { width: 640, height: 480 },
                ResolutionRecord { width: 1920, height: 1080 },
                ResolutionRecord { width: 1920, height: 1080 },
                ResolutionRecord { width: 3440, height: 1440 },
            ]
        );
    }

    #[test]
    fn test_parse_mode_list_rejects_malformed_token() {
        let out = "banner\nversion\n1920x1080, 32 bits\nwhatever, 32 bits\n";
        assert!(matches!(parse_mode_list(out), Err(AppError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_enumerate_returns_modes() {
        let runner = FakeRunner {
            output: CommandOutput {
                stdout: QRES_OUTPUT.to_string(),
                stderr: String::new(),
            },
            delay: None,
        };
        let modes = enumerate_resolutions(&runner, &PathBuf::from("QRes.exe"), Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(modes.len(), 4);
    }

    #[tokio::test]
    async fn test_enumerate_fails_on_stderr() {
        let runner = FakeRunner {
            output: CommandOutput {
                stdout: QRES_OUTPUT.to_string(),
                stderr: "Error: unable to query display driver".to_string(),
            },
            delay: None,
        };
        let err = enumerate_resolutions(&runner, &PathBuf::from("QRes.exe"), Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            AppError::ResolutionTool(message) => assert!(message.contains("display driver")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_enumerate_timeout_is_unsupported() {
        let runner = FakeRunner {
            output: CommandOutput::default(),
            delay: Some(Duration::from_secs(5)),
        };
        let modes = enumerate_resolutions(
            &runner,
            &PathBuf::from("QRes.exe"),
            Duration::from_millis(20),
        )
        .await
        .unwrap();
        assert!(modes.is_none());
    }

    struct CurrentModeRunner;

    #[async_trait]
    impl CommandRunner for CurrentModeRunner {
        async fn run(&self, _program: &Path, args: &[&str]) -> Result<CommandOutput> {
            assert!(args.is_empty());
            Ok(CommandOutput {
                stdout: "QRes v1.1 Copyright (C) Anders Kjersem.\r\n\r\n3440x1440, 32 bits @ 100 Hz.\r\n"
                    .to_string(),
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_query_current_reads_single_mode_line() {
        let current = query_current_resolution(
            &CurrentModeRunner,
            &PathBuf::from("QRes.exe"),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(current, Some(ResolutionRecord { width: 3440, height: 1440 }));
    }

    #[tokio::test]
    async fn test_query_current_without_mode_line_fails() {
        let runner = FakeRunnerAnyArgs("QRes v1.1\n\n".to_string());
        assert!(matches!(
            query_current_resolution(&runner, &PathBuf::from("QRes.exe"), Duration::from_secs(1))
                .await,
            Err(AppError::ParseError(_))
        ));
    }

    struct FakeRunnerAnyArgs(String);

    #[async_trait]
    impl CommandRunner for FakeRunnerAnyArgs {
        async fn run(&self, _program: &Path, _args: &[&str]) -> Result<CommandOutput> {
            Ok(CommandOutput {
                stdout: self.0.clone(),
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_enumerate_missing_tool_is_unsupported() {
        let modes = enumerate_resolutions(
            &MissingToolRunner,
            &PathBuf::from("QRes.exe"),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert!(modes.is_none());
    }
}

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

/// Application and window/tab title currently in front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmostWindow {
    pub application: String,
    pub title: String,
}

/// Source of foreground-window observations. Calls may block; the driver
/// runs them on the blocking pool under a timeout.
pub trait FrontmostSampler: Send + Sync + 'static {
    fn sample(&self) -> Result<FrontmostWindow>;
}

const CHROMIUM_FAMILY: &[&str] = &["chrome", "edge", "brave", "vivaldi", "opera", "arc"];

const FRONT_APP_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to name of first process whose frontmost is true
end tell
return frontApp
"#;

const SAFARI_TAB_SCRIPT: &str = r#"
tell application "Safari"
    try
        if (count of windows) > 0 then
            return name of current tab of front window
        else
            return ""
        end if
    on error
        return ""
    end try
end tell
"#;

const POLL_STEP: Duration = Duration::from_millis(20);

/// Queries macOS through `osascript`: the frontmost process, then the active
/// browser tab for Safari and Chromium-family browsers, falling back to the
/// front window title.
///
/// A whole sample shares one deadline. A script still running when it passes
/// is killed, so a hung System Events never leaves a process behind.
#[derive(Debug, Clone)]
pub struct AppleScriptSampler {
    timeout: Duration,
}

impl AppleScriptSampler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl FrontmostSampler for AppleScriptSampler {
    fn sample(&self) -> Result<FrontmostWindow> {
        let deadline = Instant::now() + self.timeout;

        let application = run_osascript(FRONT_APP_SCRIPT, deadline)
            .context("get frontmost app failed")?
            .trim()
            .to_string();
        let lower = application.to_lowercase();

        let tab_title = if lower == "safari" {
            run_osascript(SAFARI_TAB_SCRIPT, deadline).ok()
        } else if is_chromium_browser(&lower) {
            run_osascript(&chromium_tab_script(&application), deadline).ok()
        } else {
            None
        };

        let title = match tab_title {
            Some(title) => title,
            // Window title is best effort; an app without windows has no title.
            None => {
                run_osascript(&window_title_script(&application), deadline).unwrap_or_default()
            }
        };

        Ok(FrontmostWindow {
            application,
            title: title.trim().to_string(),
        })
    }
}

pub fn is_chromium_browser(app_lower: &str) -> bool {
    CHROMIUM_FAMILY.iter().any(|name| app_lower.contains(name))
}

fn chromium_tab_script(app: &str) -> String {
    format!(
        r#"
tell application "{app}"
    try
        if (count of windows) > 0 then
            return title of active tab of front window
        else
            return ""
        end if
    on error
        return ""
    end try
end tell
"#,
        app = escape_applescript(app)
    )
}

fn window_title_script(app: &str) -> String {
    format!(
        r#"
tell application "System Events"
    tell process "{app}"
        try
            return name of front window
        on error
            try
                return value of attribute "AXTitle" of front window
            on error
                return ""
            end try
        end try
    end tell
end tell
"#,
        app = escape_applescript(app)
    )
}

pub fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn run_osascript(script: &str, deadline: Instant) -> Result<String> {
    let mut command = Command::new("osascript");
    command.arg("-e").arg(script);
    run_until(command, deadline)
}

/// Run `command` to completion and return its stdout, killing and reaping it
/// if it is still running at `deadline`.
fn run_until(mut command: Command, deadline: Instant) -> Result<String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to launch osascript")?;

    let status = loop {
        match child.try_wait().context("failed to poll osascript")? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                bail!("osascript timed out and was killed");
            }
            None => std::thread::sleep(POLL_STEP),
        }
    };

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout)
            .context("failed to read osascript output")?;
    }
    if !status.success() {
        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        bail!("osascript exited with {}: {}", status, stderr.trim());
    }
    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_chromium_browsers() {
        assert!(is_chromium_browser("google chrome"));
        assert!(is_chromium_browser("microsoft edge"));
        assert!(is_chromium_browser("arc"));
        assert!(!is_chromium_browser("safari"));
        assert!(!is_chromium_browser("finder"));
    }

    #[test]
    fn escapes_quotes_in_app_names() {
        assert_eq!(escape_applescript(r#"My "App""#), r#"My \"App\""#);
        assert!(window_title_script(r#"A"B"#).contains(r#"tell process "A\"B""#));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[cfg(unix)]
    #[test]
    fn returns_stdout_of_a_finished_command() {
        let deadline = Instant::now() + Duration::from_secs(5);
        assert_eq!(run_until(shell("printf 'Finder'"), deadline).unwrap(), "Finder");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_reports_stderr() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let err = run_until(shell("echo 'not allowed' >&2; exit 3"), deadline).unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[cfg(unix)]
    #[test]
    fn hung_command_is_killed_at_the_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let started = Instant::now();
        let err = run_until(shell(&script), started + Duration::from_millis(100)).unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_millis(900));

        // A surviving child would create the marker after its sleep.
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }
}

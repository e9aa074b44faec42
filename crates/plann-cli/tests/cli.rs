//! CLI end-to-end tests.
//!
//! Every test runs the built binary against its own config and calendar
//! files in a temporary directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use chrono::{Duration, SecondsFormat, Utc};
use plann_core::{CalendarObject, DateOrTime};
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[timezone]\nimplicit = \"UTC\"\nstore = \"UTC\"\n",
        )
        .unwrap();
        Self { dir }
    }

    fn with_calendar(objects: serde_json::Value) -> Self {
        let sandbox = Self::new();
        std::fs::write(sandbox.calendar(), objects.to_string()).unwrap();
        sandbox
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn calendar(&self) -> PathBuf {
        self.dir.path().join("calendar.json")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_plann"));
        command
            .arg("--config")
            .arg(self.config())
            .arg("--calendar")
            .arg(self.calendar())
            .args(args)
            .env_remove("RUST_LOG");
        command
    }

    /// Run a command and return (exit code, stdout, stderr).
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let output = self.command(args).output().expect("failed to run plann");
        split_output(output)
    }

    /// Like `run`, answering prompts with `input`.
    fn run_with_input(&self, args: &[&str], input: &str) -> (i32, String, String) {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start plann");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        split_output(child.wait_with_output().unwrap())
    }

    fn objects(&self) -> Vec<CalendarObject> {
        read_objects(&self.calendar())
    }

    fn task(&self, uid: &str) -> Option<plann_core::CalendarTask> {
        self.objects()
            .iter()
            .find(|o| o.uid() == uid)
            .and_then(CalendarObject::as_task)
            .cloned()
    }
}

fn split_output(output: Output) -> (i32, String, String) {
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn read_objects(path: &Path) -> Vec<CalendarObject> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn rfc3339(ts: chrono::DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn time_parse_and_add() {
    let sandbox = Sandbox::new();

    let (code, stdout, _) = sandbox.run(&["time", "parse", "2025-03-01"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2025-03-01");

    let (code, stdout, _) = sandbox.run(&["time", "parse", "2025-03-01 10:00"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2025-03-01T10:00:00+00:00");

    let (code, stdout, _) = sandbox.run(&["time", "add", "--base", "2025-03-01 10:00", "1d2h"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2025-03-02T12:00:00+00:00");

    let (code, stdout, _) = sandbox.run(&["time", "add", "1h30m"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5400s");
}

#[test]
fn time_add_rejects_garbage() {
    let sandbox = Sandbox::new();
    let (code, _, stderr) = sandbox.run(&["time", "add", "soon"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "stderr: {stderr}");
}

#[test]
fn config_set_get_and_list() {
    let sandbox = Sandbox::new();

    let (code, stdout, _) = sandbox.run(&["config", "set", "planning.hours_per_day", "6"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (code, stdout, _) = sandbox.run(&["config", "get", "planning.hours_per_day"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim().parse::<f64>().unwrap(), 6.0);

    let (code, stdout, _) = sandbox.run(&["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("planning.lookahead = 60d"));
    assert!(stdout.contains("timezone.implicit = UTC"));
}

#[test]
fn config_rejects_bad_values_and_keys() {
    let sandbox = Sandbox::new();

    let (code, _, _) = sandbox.run(&["config", "set", "planning.hours_per_day", "30"]);
    assert_eq!(code, 1);
    let (code, _, _) = sandbox.run(&["config", "get", "planning.nonsense"]);
    assert_eq!(code, 1);

    let (_, stdout, _) = sandbox.run(&["config", "get", "planning.hours_per_day"]);
    assert_eq!(stdout.trim().parse::<f64>().unwrap(), 4.0);
}

#[test]
fn list_on_empty_calendar() {
    let sandbox = Sandbox::new();
    let (code, stdout, _) = sandbox.run(&["list"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "No objects found.");
    assert!(!sandbox.calendar().exists());
}

#[test]
fn panic_check_reports_late_task() {
    let due = rfc3339(Utc::now() - Duration::hours(1));
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "late-1", "summary": "overdue report",
         "due": due, "duration": 7200, "priority": 1},
        {"type": "task", "uid": "later-1", "summary": "far away",
         "due": "2099-01-01T00:00:00Z", "duration": 3600, "priority": 5}
    ]));

    let (code, stdout, stderr) = sandbox.run(&["panic", "check", "--json"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let output: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(output["panic"], true);
    let late = output["late"].as_array().unwrap();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0]["uid"], "late-1");

    let (code, stdout, _) = sandbox.run(&["panic", "check", "--no-print-timeline"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("THESE TASKS WILL NEED TO BE PROCRASTINATED:"));
    assert!(stdout.contains("overdue report"));
}

#[test]
fn panic_check_calm_calendar() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "summary": "someday",
         "due": "2099-01-01T00:00:00Z", "duration": 3600}
    ]));
    let (code, stdout, _) = sandbox.run(&["panic", "check", "--no-print-timeline"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No need to panic :-)"));
}

#[test]
fn postpone_moves_due_in_snapshot() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "summary": "file taxes",
         "due": "2090-01-01T10:00:00Z"},
        {"type": "task", "uid": "t2", "summary": "untouched",
         "due": "2090-01-01T10:00:00Z"}
    ]));

    let (code, stdout, stderr) = sandbox.run(&["postpone", "--delay", "2d", "t1"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("postponed t1"));

    let objects = read_objects(&sandbox.calendar());
    let due_of = |uid: &str| {
        objects
            .iter()
            .find(|o| o.uid() == uid)
            .and_then(CalendarObject::as_task)
            .and_then(|t| t.due)
    };
    let expected: DateOrTime = "2090-01-03T10:00:00Z".parse().unwrap();
    let untouched: DateOrTime = "2090-01-01T10:00:00Z".parse().unwrap();
    assert_eq!(due_of("t1"), Some(expected));
    assert_eq!(due_of("t2"), Some(untouched));
}

#[test]
fn postpone_falls_back_to_configured_delay() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "due": "2090-01-01T10:00:00Z"}
    ]));
    let (code, _, _) = sandbox.run(&["config", "set", "postpone.default_delay", "3d"]);
    assert_eq!(code, 0);

    let (code, stdout, stderr) = sandbox.run(&["postpone", "t1"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("postponed t1"));
    let expected: DateOrTime = "2090-01-04T10:00:00Z".parse().unwrap();
    assert_eq!(sandbox.task("t1").and_then(|t| t.due), Some(expected));
}

#[test]
fn postpone_unknown_task_changes_nothing() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "due": "2090-01-01T10:00:00Z"}
    ]));
    let before = std::fs::read_to_string(sandbox.calendar()).unwrap();

    let (code, stdout, _) = sandbox.run(&["postpone", "--delay", "1d", "missing"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("nothing postponed"));
    assert_eq!(std::fs::read_to_string(sandbox.calendar()).unwrap(), before);
}

#[test]
fn postpone_non_interactive_answers_no() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "p", "summary": "move house", "due": "2090-01-01T10:00:00Z",
         "relations": [{"reltype": "CHILD", "uid": "c"}]},
        {"type": "task", "uid": "c", "summary": "pack boxes", "due": "2095-01-01T10:00:00Z",
         "relations": [{"reltype": "PARENT", "uid": "p"}]}
    ]));

    let (code, stdout, stderr) = sandbox.run(&[
        "postpone",
        "p",
        "--delay",
        "1d",
        "--with-children",
        "ask",
        "--non-interactive",
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Postpone the children too? [y/N]: n"));
    assert!(stdout.contains("postponed p"));
    assert!(!stdout.contains("postponed c"));
    let untouched: DateOrTime = "2095-01-01T10:00:00Z".parse().unwrap();
    assert_eq!(sandbox.task("c").and_then(|t| t.due), Some(untouched));
}

#[test]
fn relations_check_flags_missing_back_link() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "child", "relations": [{"reltype": "PARENT", "uid": "parent"}]},
        {"type": "task", "uid": "parent"}
    ]));
    let (code, _, stderr) = sandbox.run(&["relations", "check"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("1 inconsistent relation(s)"), "stderr: {stderr}");
}

#[test]
fn relations_check_accepts_consistent_links() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "child", "relations": [{"reltype": "PARENT", "uid": "parent"}]},
        {"type": "task", "uid": "parent", "relations": [{"reltype": "CHILD", "uid": "child"}]}
    ]));
    let (code, stdout, _) = sandbox.run(&["relations", "check"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "relations are consistent");
}

#[test]
fn completions_for_bash() {
    let sandbox = Sandbox::new();
    let (code, stdout, _) = sandbox.run(&["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("plann"));
}

#[test]
fn add_complete_edit_and_delete_a_task() {
    let sandbox = Sandbox::new();

    let (code, stdout, stderr) = sandbox.run(&[
        "add", "todo", "buy", "milk", "--set-due", "2090-02-01 12:00", "--set-priority", "3",
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let uid = stdout.trim().strip_prefix("uid=").unwrap().to_string();
    let task = sandbox.task(&uid).unwrap();
    assert_eq!(task.label(), "buy milk");
    assert_eq!(task.priority, Some(3));
    let due: DateOrTime = "2090-02-01T12:00:00Z".parse().unwrap();
    assert_eq!(task.due, Some(due));

    let (code, _, _) = sandbox.run(&["complete", &uid]);
    assert_eq!(code, 0);
    assert_eq!(sandbox.task(&uid).unwrap().status.as_str(), "COMPLETED");
    let (_, stdout, _) = sandbox.run(&["list"]);
    assert_eq!(stdout.trim(), "No objects found.");

    let (code, _, stderr) = sandbox.run(&[
        "edit", &uid, "--uncomplete", "--add-category", "home", "--shift", "1d",
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let task = sandbox.task(&uid).unwrap();
    assert_eq!(task.status.as_str(), "NEEDS-ACTION");
    assert_eq!(task.categories, vec!["home"]);
    let shifted: DateOrTime = "2090-02-02T12:00:00Z".parse().unwrap();
    assert_eq!(task.due, Some(shifted));

    let (code, _, _) = sandbox.run(&["delete", &uid]);
    assert_eq!(code, 0);
    assert!(sandbox.objects().is_empty());
}

#[test]
fn add_refuses_an_empty_summary() {
    let sandbox = Sandbox::new();
    let (code, _, stderr) = sandbox.run(&["add", "todo"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no summary"), "stderr: {stderr}");
    assert!(!sandbox.calendar().exists());
}

#[test]
fn edit_requires_a_change_and_a_known_uid() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "summary": "stay"}
    ]));
    let before = std::fs::read_to_string(sandbox.calendar()).unwrap();

    let (code, _, _) = sandbox.run(&["edit", "t1"]);
    assert_eq!(code, 1);
    let (code, _, stderr) = sandbox.run(&["edit", "t1", "missing", "--set-summary", "gone"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("missing"), "stderr: {stderr}");
    let (code, _, _) = sandbox.run(&["edit", "t1", "--set-priority", "12"]);
    assert_eq!(code, 1);
    assert_eq!(std::fs::read_to_string(sandbox.calendar()).unwrap(), before);
}

#[test]
fn add_event_with_parent_links_back() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "prep", "summary": "prepare release"}
    ]));
    let (code, stdout, stderr) = sandbox.run(&[
        "add", "event", "release party", "2090-11-30 19:00+2h", "--parent", "prep",
    ]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let uid = stdout.trim().strip_prefix("uid=").unwrap().to_string();

    let objects = sandbox.objects();
    let event = objects.iter().find(|o| o.uid() == uid).unwrap();
    match event {
        CalendarObject::Event(event) => {
            let start: DateOrTime = "2090-11-30T19:00:00Z".parse().unwrap();
            let end: DateOrTime = "2090-11-30T21:00:00Z".parse().unwrap();
            assert_eq!(event.dtstart, Some(start));
            assert_eq!(event.dtend, Some(end));
        }
        CalendarObject::Task(_) => panic!("expected an event"),
    }
    let (code, _, _) = sandbox.run(&["relations", "check"]);
    assert_eq!(code, 0);

    let (code, _, _) = sandbox.run(&["add", "event", "open ended", "2090-11-30"]);
    assert_eq!(code, 1);
}

#[test]
fn delete_several_needs_confirmation() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "a"},
        {"type": "task", "uid": "b"},
        {"type": "task", "uid": "c"}
    ]));

    let (code, _, stderr) = sandbox.run(&["delete", "a", "b"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not going to delete 2 items"), "stderr: {stderr}");
    assert_eq!(sandbox.objects().len(), 3);

    let (code, _, _) = sandbox.run(&["delete", "--multi-delete", "a", "b"]);
    assert_eq!(code, 0);
    let left: Vec<String> = sandbox.objects().iter().map(|o| o.uid().to_string()).collect();
    assert_eq!(left, vec!["c"]);
}

#[test]
fn agenda_lists_events_before_tasks() {
    let soon = Utc::now() + Duration::days(1);
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "someday-task", "summary": "someday"},
        {"type": "event", "uid": "soon-event", "summary": "meeting",
         "dtstart": rfc3339(soon), "dtend": rfc3339(soon + Duration::hours(1))},
        {"type": "event", "uid": "far-event", "summary": "far",
         "dtstart": "2099-01-01T10:00:00Z", "dtend": "2099-01-01T11:00:00Z"}
    ]));

    let (code, stdout, stderr) = sandbox.run(&["agenda"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let event = stdout.find("soon-event").unwrap();
    let separator = stdout.find("======").unwrap();
    let task = stdout.find("someday-task").unwrap();
    assert!(event < separator && separator < task, "stdout: {stdout}");
    assert!(!stdout.contains("far-event"));
}

#[test]
fn sum_hours_adds_estimates_and_event_lengths() {
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "t1", "due": "2090-01-01T10:00:00Z", "duration": 7200},
        {"type": "event", "uid": "e1",
         "dtstart": "2090-01-02T10:00:00Z", "dtend": "2090-01-02T11:30:00Z"}
    ]));
    let (code, stdout, _) = sandbox.run(&["sum-hours"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3.50 hours in 2 object(s)");

    let (_, stdout, _) = sandbox.run(&["sum-hours", "--event"]);
    assert_eq!(stdout.trim(), "1.50 hours in 1 object(s)");
}

#[test]
fn check_due_lists_and_completes_from_the_prompt() {
    let overdue = rfc3339(Utc::now() - Duration::hours(2));
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "late", "summary": "overdue report", "due": overdue},
        {"type": "task", "uid": "later", "summary": "far away", "due": "2099-01-01T00:00:00Z"}
    ]));

    let (code, stdout, _) = sandbox.run(&["check-due", "--non-interactive"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("overdue report"));
    assert!(!stdout.contains("far away"));

    let (code, _, stderr) = sandbox.run_with_input(&["check-due"], "complete\n");
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(sandbox.task("late").unwrap().status.as_str(), "COMPLETED");
    assert_eq!(sandbox.task("later").unwrap().status.as_str(), "NEEDS-ACTION");
}

#[test]
fn split_huge_tasks_lists_big_estimates() {
    let due = rfc3339(Utc::now() + Duration::days(3));
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "big", "summary": "rewrite parser", "due": due, "duration": 28800},
        {"type": "task", "uid": "small", "summary": "fix typo", "due": due, "duration": 600}
    ]));
    let (code, stdout, _) = sandbox.run(&["split-huge-tasks", "--non-interactive"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("rewrite parser: estimate is 8.0h, which is too big."));
    assert!(!stdout.contains("fix typo"));
}

#[test]
fn split_huge_tasks_forks_out_subtasks() {
    let due = rfc3339(Utc::now() + Duration::days(3));
    let sandbox = Sandbox::with_calendar(serde_json::json!([
        {"type": "task", "uid": "big", "summary": "rewrite parser", "due": due, "duration": 28800}
    ]));
    // fork: yes, first subtask takes the default name, one more, stop,
    // remaining estimate 2h, keep the summary, no postponement
    let input = "y\n\nwrite tests\n\n2h\n\n\n";
    let (code, _, stderr) = sandbox.run_with_input(&["split-huge-tasks"], input);
    assert_eq!(code, 0, "stderr: {stderr}");

    let objects = sandbox.objects();
    assert_eq!(objects.len(), 3);
    let parent = sandbox.task("big").unwrap();
    assert_eq!(parent.duration, Some(Duration::hours(2)));
    assert_eq!(parent.label(), "rewrite parser");
    assert_eq!(parent.relations.len(), 2);
    assert!(objects.iter().any(|o| o.label() == "Plan how to do rewrite parser"));
    assert!(objects.iter().any(|o| o.label() == "write tests"));
    let (code, _, _) = sandbox.run(&["relations", "check"]);
    assert_eq!(code, 0);
}

#[test]
fn named_timezone_in_config() {
    let sandbox = Sandbox::new();
    let (code, _, _) = sandbox.run(&["config", "set", "timezone.implicit", "Europe/Helsinki"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = sandbox.run(&["time", "parse", "2025-07-01 12:00"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2025-07-01T12:00:00+03:00");
    let (_, stdout, _) = sandbox.run(&["time", "parse", "2025-01-01 12:00"]);
    assert_eq!(stdout.trim(), "2025-01-01T12:00:00+02:00");
}

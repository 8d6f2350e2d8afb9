//! CLI subprocess integration tests.
//!
//! These tests invoke the `stagehand` binary and verify exit codes, the
//! staged tree and JSON output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn stagehand_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stagehand"));
    cmd.env_remove("STAGEHAND_INSTALL_CONFIG");
    cmd.env_remove("STAGEHAND_LOG");
    cmd
}

struct Layout {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("build/CMakeCache.txt"), "").unwrap();
        Self { _dir: dir, root }
    }

    fn build(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Returns (source_dir, output_dir) for `Samples/<category>/<name>`.
    fn unit(&self, category: &str, name: &str) -> (PathBuf, PathBuf) {
        let source = self.root.join("Samples").join(category).join(name);
        let output = self.build().join("Samples").join(category).join(name);
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&output).unwrap();
        (source, output)
    }

    fn dest(&self, os: &str, configuration: &str) -> PathBuf {
        self.build().join("bin/x86_64").join(os).join(configuration)
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn stage(source: &Path, output: &Path) -> Command {
    let mut cmd = stagehand_bin();
    cmd.arg("stage")
        .arg(source)
        .arg(output)
        .args(["--arch", "x86_64", "--os", "linux"]);
    cmd
}

#[test]
fn cli_version() {
    let output = stagehand_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("stagehand"));
}

#[test]
fn cli_help_lists_commands() {
    let output = stagehand_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["stage", "stage-plan", "describe", "classify", "completions"] {
        assert!(stdout.contains(cmd), "help must mention {cmd}");
    }
}

#[test]
fn cli_stage_installs_into_flat_destination() {
    let layout = Layout::new();
    let (source, output) = layout.unit("0_Intro", "vectorAdd");
    write(&output.join("vectorAdd"), "#!/bin/sh\n");
    write(&output.join("CMakeFiles/vectorAdd.dir/main.o"), "obj");
    write(&source.join("data/input.raw"), "raw");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(output.join("vectorAdd"), fs::Permissions::from_mode(0o755)).unwrap();
    }

    let out = stage(&source, &output).output().unwrap();
    assert!(
        out.status.success(),
        "stage failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let dest = layout.dest("linux", "release");
    assert!(dest.join("vectorAdd").is_file());
    assert!(dest.join("input.raw").is_file());
    assert!(!dest.join("main.o").exists());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Installing:"), "status lines expected: {stderr}");
}

#[test]
fn cli_stage_json_report() {
    let layout = Layout::new();
    let (source, output) = layout.unit("0_Intro", "clock");
    write(&output.join("kernel.fatbin"), "fatbin");
    write(&output.join("notes.md"), "md");

    let out = stage(&source, &output)
        .args(["--json", "--name", "clock"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["unit"], "clock");
    assert_eq!(report["installed"].as_array().unwrap().len(), 1);
    assert_eq!(report["installed"][0]["kind"], "data_file");
    assert_eq!(report["skipped"], 1);
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn cli_stage_missing_output_dir_fails() {
    let layout = Layout::new();
    let (source, _) = layout.unit("0_Intro", "ghost");
    let out = stage(&source, &layout.build().join("nope")).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn cli_stage_unknown_os_is_plan_error() {
    let layout = Layout::new();
    let (source, output) = layout.unit("0_Intro", "x");
    let out = stagehand_bin()
        .arg("stage")
        .arg(&source)
        .arg(&output)
        .args(["--os", "plan9"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("target error"));
}

#[test]
fn cli_multi_config_uses_install_config() {
    let layout = Layout::new();
    let (source, output) = layout.unit("0_Intro", "simple");
    write(&output.join("simple.fatbin"), "fatbin");

    let out = stage(&source, &output)
        .arg("--multi-config")
        .env("STAGEHAND_INSTALL_CONFIG", "Debug")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(layout.dest("linux", "debug").join("simple.fatbin").is_file());

    let out = stage(&source, &output)
        .args(["--multi-config", "--install-config", "RelWithDebInfo"])
        .env("STAGEHAND_INSTALL_CONFIG", "Debug")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(layout.dest("linux", "relwithdebinfo").join("simple.fatbin").is_file());
}

#[test]
fn cli_stage_plan_stages_every_unit() {
    let layout = Layout::new();
    let (_, a_out) = layout.unit("1_Utilities", "a");
    let (_, b_out) = layout.unit("1_Utilities", "b");
    write(&a_out.join("a"), "a");
    write(&b_out.join("b"), "b");
    let plan = layout.root.join("stagehand.toml");
    fs::write(
        &plan,
        r#"
[target]
architecture = "x86_64"
os = "linux"
configuration = "Release"

[install]
build_dir = "build"

[[unit]]
name = "a"
source_dir = "Samples/1_Utilities/a"
output_dir = "build/Samples/1_Utilities/a"

[[unit]]
name = "b"
source_dir = "Samples/1_Utilities/b"
output_dir = "build/Samples/1_Utilities/b"
"#,
    )
    .unwrap();

    let out = stagehand_bin()
        .arg("--json")
        .arg("stage-plan")
        .arg(&plan)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stage-plan failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let reports: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(reports.as_array().unwrap().len(), 2);
    let dest = layout.dest("linux", "release");
    assert!(dest.join("a").is_file());
    assert!(dest.join("b").is_file());
}

#[test]
fn cli_stage_plan_without_units_is_plan_error() {
    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("stagehand.toml");
    fs::write(&plan, "plan_version = 1\n").unwrap();
    let out = stagehand_bin().arg("stage-plan").arg(&plan).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn cli_stage_plan_rejects_unknown_fields() {
    let dir = tempfile::tempdir().unwrap();
    let plan = dir.path().join("stagehand.toml");
    fs::write(&plan, "plan_version = 1\nbogus = true\n").unwrap();
    let out = stagehand_bin().arg("stage-plan").arg(&plan).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn cli_describe_json() {
    let layout = Layout::new();
    let out = stagehand_bin()
        .args(["--json", "describe", "--arch", "X86_64", "--os", "windows"])
        .args(["--configuration", "Debug", "--build-dir"])
        .arg(layout.build().join("Samples"))
        .output()
        .unwrap();
    assert!(out.status.success());
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(info["architecture"], "x86_64");
    assert_eq!(info["os"], "windows");
    assert_eq!(info["configuration"], "debug");
    assert_eq!(info["deferred"], false);
    let destination = PathBuf::from(info["destination"].as_str().unwrap());
    assert_eq!(destination, layout.build().join("bin/x86_64/windows/debug"));
}

#[test]
fn cli_classify_reports_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let dll = dir.path().join("cudart.dll");
    let header = dir.path().join("helper.h");
    fs::write(&dll, "dll").unwrap();
    fs::write(&header, "h").unwrap();

    let out = stagehand_bin()
        .args(["--json", "classify", "--os", "windows"])
        .arg(&dll)
        .arg(&header)
        .output()
        .unwrap();
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0]["kind"], "shared-library");
    assert_eq!(rows[1]["kind"], "skip");
    assert_eq!(rows[1]["excluded"], "source_text");
}

#[test]
fn cli_classify_ignores_ancestor_directory_names() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("Testing").join("tool.dir");
    fs::create_dir_all(&nested).unwrap();
    let ptx = nested.join("kernel.ptx");
    fs::write(&ptx, "ptx").unwrap();

    let out = stagehand_bin()
        .args(["--json", "classify", "--os", "linux"])
        .arg(&ptx)
        .output()
        .unwrap();
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0]["kind"], "data");
    assert!(rows[0]["excluded"].is_null());
}

#[cfg(unix)]
#[test]
fn cli_stage_partial_failure_exits_three() {
    let layout = Layout::new();
    let (source, output) = layout.unit("0_Intro", "blocked");
    write(&output.join("kernel.fatbin"), "fatbin");
    write(&output.join("other.ptx"), "ptx");
    let dest = layout.dest("linux", "release");
    fs::create_dir_all(dest.join("kernel.fatbin").join("occupied")).unwrap();

    let out = stage(&source, &output).output().unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(dest.join("other.ptx").is_file());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to stage"), "{stderr}");
}

#[test]
fn cli_completions_bash() {
    let output = stagehand_bin()
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("stagehand"));
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("man");
    let output = stagehand_bin().arg("man-pages").arg(&out_dir).output().unwrap();
    assert!(output.status.success());
    assert!(out_dir.join("stagehand.1").is_file());
    assert!(out_dir.join("stagehand-stage.1").is_file());
}

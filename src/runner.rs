use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{error, info, warn};

use crate::config::Toolchain;
use crate::error::IdeError;
use crate::language::Language;

/// One process invocation: a program and its argument vector, no shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

impl Step {
    fn new(program: &str, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunPlan {
    pub(crate) language: Language,
    pub(crate) steps: Vec<Step>,
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parent directory of the source file, `.` for a bare file name.
fn source_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Builds the command chain for the saved file. The path check comes first:
/// without a saved file nothing else is looked at.
pub(crate) fn build_plan(
    language_name: &str,
    path: Option<&Path>,
    tools: &Toolchain,
) -> Result<RunPlan, IdeError> {
    let Some(path) = path else {
        return Err(IdeError::SaveBeforeRun);
    };
    let language = Language::parse(language_name)
        .ok_or_else(|| IdeError::UnsupportedLanguage(language_name.to_string()))?;
    let file = path_arg(path);
    let steps = match language {
        Language::Python => vec![Step::new(&tools.python, [file])],
        Language::JavaScript => vec![Step::new(&tools.node, [file])],
        Language::C => {
            let binary = path_arg(&source_dir(path).join(&tools.c_output));
            vec![
                Step::new(&tools.cc, [file, "-o".to_string(), binary.clone()]),
                Step::new(&binary, Vec::new()),
            ]
        }
        Language::Java => {
            let class = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let classpath = path_arg(&source_dir(path));
            vec![
                Step::new(&tools.javac, [file]),
                Step::new(&tools.java, ["-cp".to_string(), classpath, class]),
            ]
        }
    };
    Ok(RunPlan { language, steps })
}

/// Captured result of one finished step.
#[derive(Debug, Clone, Default)]
pub(crate) struct StepOutput {
    pub(crate) code: Option<i32>,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
}

impl StepOutput {
    pub(crate) fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub(crate) trait CommandExecutor {
    /// Runs `step` to completion. `Err` means the process never started.
    fn execute(&mut self, step: &Step) -> io::Result<StepOutput>;
}

/// Spawns real processes, blocking until each exits.
pub(crate) struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&mut self, step: &Step) -> io::Result<StepOutput> {
        let output = Command::new(&step.program)
            .args(&step.args)
            .stdin(Stdio::null())
            .output()?;
        Ok(StepOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// What the output pane shows after a run.
#[derive(Debug, Default)]
pub(crate) struct RunOutput {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
    pub(crate) summary: String,
    pub(crate) executed: usize,
    pub(crate) error: Option<IdeError>,
}

/// Runs the steps in order and stops at the first one that exits non-zero
/// or fails to launch.
pub(crate) fn execute(plan: &RunPlan, executor: &mut dyn CommandExecutor) -> RunOutput {
    let mut out = RunOutput::default();
    let total = plan.steps.len();
    for (i, step) in plan.steps.iter().enumerate() {
        info!(step = %step, "running step {}/{}", i + 1, total);
        let result = match executor.execute(step) {
            Ok(result) => result,
            Err(source) => {
                error!(program = %step.program, %source, "failed to launch");
                out.summary = format!("{}: failed to launch step {}", plan.language, i + 1);
                out.error = Some(IdeError::Launch {
                    program: step.program.clone(),
                    source,
                });
                return out;
            }
        };
        out.executed += 1;
        out.stdout.push_str(&String::from_utf8_lossy(&result.stdout));
        out.stderr.push_str(&String::from_utf8_lossy(&result.stderr));
        if !result.success() {
            let code = result
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            warn!(program = %step.program, %code, "step exited unsuccessfully");
            out.summary = if i + 1 < total {
                format!("{}: aborted at step {} (exit {code})", plan.language, i + 1)
            } else {
                format!("{}: exit {code}", plan.language)
            };
            return out;
        }
    }
    out.summary = format!("{}: exit 0", plan.language);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Records every step and replays scripted results.
    #[derive(Default)]
    struct FakeExecutor {
        calls: Vec<Step>,
        results: VecDeque<io::Result<StepOutput>>,
    }

    impl FakeExecutor {
        fn with(results: Vec<io::Result<StepOutput>>) -> Self {
            Self {
                calls: Vec::new(),
                results: results.into(),
            }
        }
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&mut self, step: &Step) -> io::Result<StepOutput> {
            self.calls.push(step.clone());
            self.results
                .pop_front()
                .unwrap_or_else(|| Ok(StepOutput { code: Some(0), ..StepOutput::default() }))
        }
    }

    fn finished(code: i32, stdout: &str, stderr: &str) -> io::Result<StepOutput> {
        Ok(StepOutput {
            code: Some(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }

    #[test]
    fn run_without_path_asks_to_save_first() {
        let err = build_plan("Python", None, &Toolchain::default()).expect_err("no path");
        assert!(matches!(err, IdeError::SaveBeforeRun));
        assert_eq!(err.to_string(), "Save your code before running.");
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = build_plan("Cobol", Some(Path::new("/tmp/a.cob")), &Toolchain::default())
            .expect_err("unsupported");
        assert!(matches!(err, IdeError::UnsupportedLanguage(ref n) if n == "Cobol"));
    }

    #[test]
    fn python_and_javascript_are_single_steps() {
        let tools = Toolchain::default();
        let plan = build_plan("Python", Some(Path::new("/w/a.py")), &tools).expect("plan");
        assert_eq!(plan.steps, vec![Step::new("python", ["/w/a.py".to_string()])]);
        let plan = build_plan("JavaScript", Some(Path::new("/w/a.js")), &tools).expect("plan");
        assert_eq!(plan.steps, vec![Step::new("node", ["/w/a.js".to_string()])]);
    }

    #[test]
    fn java_class_and_classpath_come_from_path() {
        let plan = build_plan(
            "Java",
            Some(Path::new("/tmp/Hello.java")),
            &Toolchain::default(),
        )
        .expect("plan");
        assert_eq!(plan.steps[0].to_string(), "javac /tmp/Hello.java");
        assert_eq!(plan.steps[1].to_string(), "java -cp /tmp Hello");
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        let plan =
            build_plan("Java", Some(Path::new("Main.java")), &Toolchain::default()).expect("plan");
        assert_eq!(plan.steps[1].args, vec!["-cp", ".", "Main"]);
        let plan = build_plan("C", Some(Path::new("m.c")), &Toolchain::default()).expect("plan");
        assert_eq!(plan.steps[1].program, "./output");
    }

    #[test]
    fn c_binary_lands_next_to_source() {
        let plan =
            build_plan("C", Some(Path::new("/src/prog.c")), &Toolchain::default()).expect("plan");
        assert_eq!(plan.steps[0].to_string(), "gcc /src/prog.c -o /src/output");
        assert_eq!(plan.steps[1].program, "/src/output");
    }

    #[test]
    fn compile_failure_never_runs_binary() {
        let plan =
            build_plan("C", Some(Path::new("/src/bad.c")), &Toolchain::default()).expect("plan");
        let mut exec = FakeExecutor::with(vec![finished(1, "", "bad.c:1: error: expected ';'\n")]);
        let out = execute(&plan, &mut exec);
        assert_eq!(exec.calls.len(), 1);
        assert_eq!(exec.calls[0].program, "gcc");
        assert_eq!(out.stderr, "bad.c:1: error: expected ';'\n");
        assert!(out.error.is_none());
        assert_eq!(out.summary, "C: aborted at step 1 (exit 1)");
    }

    #[test]
    fn successful_chain_collects_all_output_stderr_first() {
        let plan =
            build_plan("Java", Some(Path::new("/tmp/Hello.java")), &Toolchain::default())
                .expect("plan");
        let mut exec = FakeExecutor::with(vec![
            finished(0, "", "Note: deprecated API\n"),
            finished(0, "Hello\n", ""),
        ]);
        let out = execute(&plan, &mut exec);
        assert_eq!(exec.calls.len(), 2);
        assert_eq!(out.executed, 2);
        assert_eq!(out.stderr, "Note: deprecated API\n");
        assert_eq!(out.stdout, "Hello\n");
        assert_eq!(out.summary, "Java: exit 0");
    }

    #[test]
    fn nonzero_exit_of_last_step_is_not_an_error() {
        let plan =
            build_plan("Python", Some(Path::new("/w/a.py")), &Toolchain::default()).expect("plan");
        let mut exec = FakeExecutor::with(vec![finished(2, "partial\n", "Traceback\n")]);
        let out = execute(&plan, &mut exec);
        assert!(out.error.is_none());
        assert_eq!(out.stderr, "Traceback\n");
        assert_eq!(out.stdout, "partial\n");
        assert_eq!(out.summary, "Python: exit 2");
    }

    #[test]
    fn launch_failure_reports_program_and_keeps_earlier_output() {
        let plan =
            build_plan("C", Some(Path::new("/src/ok.c")), &Toolchain::default()).expect("plan");
        let mut exec = FakeExecutor::with(vec![
            finished(0, "", "warning: unused\n"),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        ]);
        let out = execute(&plan, &mut exec);
        assert_eq!(out.executed, 1);
        assert_eq!(out.stderr, "warning: unused\n");
        let err = out.error.expect("launch error");
        assert_eq!(err.dialog_title(), "Execution Error");
        assert_eq!(err.to_string(), "failed to launch `/src/output`: denied");
    }

    #[test]
    fn lossy_decoding_keeps_going() {
        let plan =
            build_plan("Python", Some(Path::new("/w/a.py")), &Toolchain::default()).expect("plan");
        let mut exec = FakeExecutor::with(vec![Ok(StepOutput {
            code: Some(0),
            stdout: vec![b'o', b'k', 0xff],
            stderr: Vec::new(),
        })]);
        let out = execute(&plan, &mut exec);
        assert!(out.stdout.starts_with("ok"));
    }
}

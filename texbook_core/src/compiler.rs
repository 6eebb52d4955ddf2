use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;

use crate::BuildConfig;
use crate::TexbookError;
use crate::TexbookResult;

/// Default limit for a single compiler pass.
pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of turning a `.tex` file into a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileReport {
	pub success: bool,
	/// Exit code of the last pass that ran, `-1` when killed by a signal.
	pub exit_code: i32,
	/// Error lines picked out of the compiler output.
	pub diagnostics: Vec<String>,
	/// Where the PDF is written when compilation succeeds.
	pub artifact: PathBuf,
}

/// Something that compiles a LaTeX source file.
pub trait DocumentCompiler {
	/// Name of the program, used in error messages.
	fn program(&self) -> &str;

	/// Whether the compiler can be started at all.
	fn is_available(&self) -> bool;

	fn compile(&self, source: &Path) -> TexbookResult<CompileReport>;
}

/// Runs `xelatex` (or a compatible program) a fixed number of times so cross
/// references and the table of contents settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XelatexCompiler {
	program: String,
	passes: u32,
	timeout: Duration,
	output_dir: Option<PathBuf>,
}

impl Default for XelatexCompiler {
	fn default() -> Self {
		Self::new("xelatex", 2)
	}
}

impl XelatexCompiler {
	pub fn new(program: impl Into<String>, passes: u32) -> Self {
		Self {
			program: program.into(),
			passes: passes.max(1),
			timeout: DEFAULT_PASS_TIMEOUT,
			output_dir: None,
		}
	}

	pub fn from_config(build: &BuildConfig) -> Self {
		Self::new(build.compiler.clone(), build.passes)
			.with_timeout(Duration::from_secs(build.timeout_seconds))
	}

	/// Write auxiliary files and the PDF to `dir` instead of next to the
	/// source.
	#[must_use]
	pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.output_dir = Some(dir.into());
		self
	}

	/// Kill a pass that runs longer than `timeout`.
	#[must_use]
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn passes(&self) -> u32 {
		self.passes
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	fn artifact_path(&self, source: &Path) -> PathBuf {
		let dir = self
			.output_dir
			.clone()
			.or_else(|| source.parent().map(Path::to_path_buf))
			.unwrap_or_default();
		let mut name = source.file_stem().unwrap_or_default().to_os_string();
		name.push(".pdf");

		dir.join(name)
	}

	/// Run one pass, killing the process once the timeout has passed.
	fn run_pass(&self, command: &mut Command) -> TexbookResult<Output> {
		let mut child = command
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| {
				if e.kind() == ErrorKind::NotFound {
					TexbookError::CompilerNotFound {
						program: self.program.clone(),
					}
				} else {
					TexbookError::Io(e)
				}
			})?;

		// Drain both pipes while waiting so a chatty compiler can't block on a
		// full pipe buffer.
		let stdout = child.stdout.take().map(read_in_background);
		let stderr = child.stderr.take().map(read_in_background);
		let deadline = Instant::now() + self.timeout;

		let status = loop {
			if let Some(status) = child.try_wait()? {
				break status;
			}

			if Instant::now() >= deadline {
				tracing::warn!(program = %self.program, timeout = ?self.timeout, "killing compiler");
				child.kill().ok();
				child.wait().ok();

				return Err(TexbookError::CompileTimeout {
					program: self.program.clone(),
					seconds: self.timeout.as_secs(),
				});
			}

			std::thread::sleep(POLL_INTERVAL);
		};

		Ok(Output {
			status,
			stdout: join_reader(stdout),
			stderr: join_reader(stderr),
		})
	}
}

fn read_in_background<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
	std::thread::spawn(move || {
		let mut buffer = Vec::new();
		reader.read_to_end(&mut buffer).ok();
		buffer
	})
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
	handle
		.and_then(|handle| handle.join().ok())
		.unwrap_or_default()
}

impl DocumentCompiler for XelatexCompiler {
	fn program(&self) -> &str {
		&self.program
	}

	/// Probe the program with `--version`.
	fn is_available(&self) -> bool {
		Command::new(&self.program)
			.arg("--version")
			.stdin(Stdio::null())
			.output()
			.is_ok_and(|output| output.status.success())
	}

	/// Run every pass, stopping at the first one that fails.
	fn compile(&self, source: &Path) -> TexbookResult<CompileReport> {
		let working_dir = source
			.parent()
			.filter(|dir| !dir.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		let file_name = source.file_name().unwrap_or(source.as_os_str());
		let mut exit_code = 0;

		for pass in 1..=self.passes {
			tracing::info!(pass, passes = self.passes, program = %self.program, "compiling");

			let mut command = Command::new(&self.program);
			command
				.arg("-interaction=nonstopmode")
				.arg("-halt-on-error");
			if let Some(dir) = &self.output_dir {
				// The compiler runs inside `working_dir`, so relative paths would
				// resolve against the wrong directory.
				let dir = std::path::absolute(dir)?;
				command.arg(format!("-output-directory={}", dir.display()));
			}
			command.arg(file_name).current_dir(working_dir);

			let output = self.run_pass(&mut command)?;

			exit_code = output.status.code().unwrap_or(-1);
			if !output.status.success() {
				let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
				log.push_str(&String::from_utf8_lossy(&output.stderr));
				tracing::warn!(pass, exit_code, "compilation failed");

				return Ok(CompileReport {
					success: false,
					exit_code,
					diagnostics: extract_diagnostics(&log),
					artifact: self.artifact_path(source),
				});
			}
		}

		Ok(CompileReport {
			success: true,
			exit_code,
			diagnostics: Vec::new(),
			artifact: self.artifact_path(source),
		})
	}
}

/// Pick the error lines out of a TeX log.
///
/// A line is kept when it starts with `!` or mentions `error` or `failed`. A
/// `l.<number>` line right after it is kept too since it points at the
/// offending source line.
pub fn extract_diagnostics(log: &str) -> Vec<String> {
	let lines: Vec<&str> = log.lines().collect();
	let mut diagnostics = Vec::new();
	let mut index = 0;

	while index < lines.len() {
		let line = lines[index].trim_end();
		let lower = line.to_lowercase();

		if line.starts_with('!') || lower.contains("error") || lower.contains("failed") {
			diagnostics.push(line.to_string());

			if let Some(next) = lines.get(index + 1) {
				if next.starts_with("l.") {
					diagnostics.push(next.trim_end().to_string());
					index += 1;
				}
			}
		}

		index += 1;
	}

	diagnostics
}

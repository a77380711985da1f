use clap::Parser;
use serde::Serialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};
use thiserror::Error;
use std::io::Write;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_COMPILER: &str = "gcc";
const DEFAULT_X11_PREFIXES: [&str; 3] = ["/opt/X11", "/usr", "/usr/X11R6"];
const X11_LIBS: [&str; 5] = ["-lX11", "-lXt", "-lXaw", "-lXmu", "-lm"];
const X11_INSTALL_HINTS: &str = "Please install:\n  - macOS: Install XQuartz from https://www.xquartz.org/\n  - Debian/Ubuntu: sudo apt-get install libx11-dev libxt-dev libxaw7-dev libxmu-dev\n  - RHEL/CentOS: sudo yum install libX11-devel libXt-devel libXaw-devel libXmu-devel";

#[derive(Parser, Debug)]
#[command(
    name = "pltview-build",
    version,
    about = "Compile the native pltview viewer into the package directory"
)]
struct Cli {
    #[arg(long, default_value = "pltview.c")]
    source: PathBuf,
    /// Relative paths are taken from the source file's directory.
    #[arg(long, default_value = "pltview_pkg/pltview_bin")]
    output: PathBuf,
    /// Compiler to use; falls back to $CC, then gcc.
    #[arg(long)]
    compiler: Option<String>,
    /// Install prefix holding include/X11 and lib. Repeat to search several.
    #[arg(long = "x11-prefix")]
    x11_prefixes: Vec<PathBuf>,
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum BuildError {
    #[error("X11 development libraries not found!\n{}", X11_INSTALL_HINTS)]
    X11Missing,
    #[error("{0} not found. Please install a C compiler.")]
    ToolchainMissing(String),
    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("failed to build native viewer: compiler exited with status {status}")]
    CompileFailed { status: i32, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    fn code(&self) -> &'static str {
        match self {
            Self::X11Missing => "x11_missing",
            Self::ToolchainMissing(_) => "toolchain_missing",
            Self::SourceMissing(_) => "source_missing",
            Self::CompileFailed { .. } => "compile_failed",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonResult<T: Serialize> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_stderr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct X11Layout {
    include: PathBuf,
    lib: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
struct BuildReport {
    compiler: PathBuf,
    x11_include: PathBuf,
    x11_lib: PathBuf,
    source: PathBuf,
    output: PathBuf,
    command: Vec<String>,
    dry_run: bool,
}

#[derive(Debug, Clone)]
struct CommandOutput {
    status_code: i32,
    stderr: Vec<u8>,
}

impl CommandOutput {
    fn success(&self) -> bool {
        self.status_code == 0
    }
}

trait CompilerRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: &Path,
        capture_output: bool,
    ) -> Result<CommandOutput, io::Error>;
}

struct RealCompilerRunner;

impl CompilerRunner for RealCompilerRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cwd: &Path,
        capture_output: bool,
    ) -> Result<CommandOutput, io::Error> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(cwd);
        if capture_output {
            let output = cmd.stdin(Stdio::null()).output()?;
            let status_code = output
                .status
                .code()
                .unwrap_or(if output.status.success() { 0 } else { 1 });
            Ok(CommandOutput {
                status_code,
                stderr: output.stderr,
            })
        } else {
            let status = cmd.status()?;
            let status_code = status
                .code()
                .unwrap_or(if status.success() { 0 } else { 1 });
            Ok(CommandOutput {
                status_code,
                stderr: Vec::new(),
            })
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("PLTVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let runner = RealCompilerRunner;

    let result = handle_build(&cli, &runner);
    let outcome = match result {
        Ok(report) => {
            if cli.json {
                print_json(&JsonResult {
                    ok: true,
                    result: Some(report),
                    error: None,
                    error_code: None,
                    raw_stderr: None,
                })
            } else {
                Ok(())
            }
        }
        Err(err) => {
            if cli.json {
                let raw_stderr = match &err {
                    BuildError::CompileFailed { stderr, .. } if !stderr.is_empty() => {
                        Some(stderr.clone())
                    }
                    _ => None,
                };
                let envelope = JsonResult::<BuildReport> {
                    ok: false,
                    result: None,
                    error: Some(err.to_string()),
                    error_code: Some(err.code()),
                    raw_stderr,
                };
                if let Err(write_err) = print_json(&envelope) {
                    warn!(
                        error = %write_err,
                        build_error = %err,
                        "failed to write json error envelope"
                    );
                }
            } else {
                eprintln!("{err}");
            }
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(payload: &T) -> Result<(), BuildError> {
    write_json(&mut io::stdout().lock(), payload)
}

fn write_json<W: Write, T: Serialize>(out: &mut W, payload: &T) -> Result<(), BuildError> {
    writeln!(out, "{}", serde_json::to_string_pretty(payload)?)?;
    out.flush()?;
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(env::current_dir()?.join(path))
}

fn x11_layout_for_prefix(prefix: &Path) -> Option<X11Layout> {
    let include = prefix.join("include");
    if !include.join("X11").is_dir() {
        return None;
    }
    Some(X11Layout {
        include,
        lib: prefix.join("lib"),
    })
}

fn detect_x11(prefixes: &[PathBuf]) -> Result<X11Layout, BuildError> {
    for prefix in prefixes {
        debug!(prefix = %prefix.display(), "checking X11 prefix");
        if let Some(layout) = x11_layout_for_prefix(prefix) {
            return Ok(layout);
        }
    }
    Err(BuildError::X11Missing)
}

fn default_x11_prefixes() -> Vec<PathBuf> {
    DEFAULT_X11_PREFIXES.iter().map(PathBuf::from).collect()
}

fn compiler_name(flag: Option<&str>, cc_env: Option<String>) -> String {
    if let Some(name) = flag {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }
    match cc_env {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_COMPILER.to_string(),
    }
}

fn locate_compiler(name: &str) -> Result<PathBuf, BuildError> {
    which::which(name).map_err(|_| BuildError::ToolchainMissing(name.to_string()))
}

fn compile_args(source: &Path, output: &Path, x11: &X11Layout) -> Vec<String> {
    let mut args = vec![
        "-O3".to_string(),
        "-Wall".to_string(),
        "-march=native".to_string(),
        format!("-I{}", x11.include.display()),
        "-o".to_string(),
        output.display().to_string(),
        source.display().to_string(),
    ];
    args.extend(X11_LIBS.iter().map(|lib| lib.to_string()));
    args.push(format!("-L{}", x11.lib.display()));
    args
}

fn render_command(program: &Path, args: &[String]) -> String {
    fn shell_quote(part: &str) -> String {
        if !part.is_empty()
            && part
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || "-_./=:+".contains(ch))
        {
            return part.to_string();
        }
        format!("'{}'", part.replace('\'', "'\\''"))
    }
    std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .map(|part| shell_quote(&part))
        .collect::<Vec<_>>()
        .join(" ")
}

fn handle_build<R: CompilerRunner>(cli: &Cli, runner: &R) -> Result<BuildReport, BuildError> {
    let source = absolute(&cli.source)?;
    // a relative output lands beside the source, where the compiler runs
    let output = match source.parent() {
        Some(dir) if cli.output.is_relative() => dir.join(&cli.output),
        _ => absolute(&cli.output)?,
    };
    if !source.is_file() {
        return Err(BuildError::SourceMissing(source));
    }

    let prefixes = if cli.x11_prefixes.is_empty() {
        default_x11_prefixes()
    } else {
        cli.x11_prefixes.clone()
    };
    let x11 = detect_x11(&prefixes)?;
    let compiler = locate_compiler(&compiler_name(
        cli.compiler.as_deref(),
        env::var("CC").ok(),
    ))?;
    let args = compile_args(&source, &output, &x11);
    let rendered = render_command(&compiler, &args);

    if !cli.json {
        println!("{}", "=".repeat(60));
        println!("Building pltview (native viewer)...");
        println!("{}", "=".repeat(60));
        println!("Using X11 from: {}", x11.include.display());
        println!("Running: {rendered}");
    }

    let report = BuildReport {
        compiler: compiler.clone(),
        x11_include: x11.include.clone(),
        x11_lib: x11.lib.clone(),
        source: source.clone(),
        output: output.clone(),
        command: args.clone(),
        dry_run: cli.dry_run,
    };
    if cli.dry_run {
        info!(command = %rendered, "dry run; compiler not invoked");
        return Ok(report);
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let cwd = source.parent().unwrap_or_else(|| Path::new("."));
    let result = runner
        .run(&compiler, &args, cwd, cli.json)
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                BuildError::ToolchainMissing(compiler.display().to_string())
            }
            _ => BuildError::Io(err),
        })?;
    if !result.success() {
        return Err(BuildError::CompileFailed {
            status: result.status_code,
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }

    if !cli.json {
        println!("pltview built successfully: {}", output.display());
        println!("{}", "=".repeat(60));
    }
    info!(output = %output.display(), "native viewer built");
    Ok(report)
}

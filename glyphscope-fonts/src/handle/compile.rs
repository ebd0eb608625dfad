//! Boundary to the external font source compiler.
//!
//! Textual font sources cannot be opened directly; an external compiler
//! turns them into binary font data. This crate only consumes the
//! compiler's output tuple and stays agnostic about what runs underneath:
//! a process pool, a test stub, an in-process compiler.

use std::path::Path;
use std::process::Stdio;

/// Output tuple of one compilation run.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Compiled binary font data; empty means compilation failed.
    pub font_data: Vec<u8>,
    /// Informational output stream, logged by the loader.
    pub stdout: String,
    /// Error/diagnostic stream, logged by the loader. A compiler may warn
    /// here and still produce usable font data.
    pub stderr: String,
}

/// Compiles a textual font source into binary font data.
///
/// Invoked asynchronously so the thread owning the font handle is not
/// blocked while compilation proceeds out-of-process. Implementations
/// report compiler diagnostics through [`CompileOutput`], not through the
/// error type; `Err` is reserved for failing to run the compiler at all.
pub trait SourceCompiler {
    fn compile(
        &self,
        source: &Path,
    ) -> impl std::future::Future<Output = std::io::Result<CompileOutput>>;
}

/// Reference [`SourceCompiler`]: runs an external executable as
/// `program [args..] <source>`, expecting the compiled font bytes on its
/// standard output and diagnostics on its standard error.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Appends a fixed argument placed before the source path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl SourceCompiler for CommandCompiler {
    async fn compile(&self, source: &Path) -> std::io::Result<CompileOutput> {
        log::debug!("running font compiler: {} {:?} {}", self.program, self.args, source.display());
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .stdin(Stdio::null())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let font_data = if output.status.success() { output.stdout } else { Vec::new() };
        Ok(CompileOutput { font_data, stdout: String::new(), stderr })
    }
}

//! Descripción estructurada de una invocación externa.
//!
//! Una `Invocation` es una lista ordenada de comandos conectados
//! stdout -> stdin, un plan explícito para el stdout final y las rutas que el
//! tool debe dejar creadas. No interviene ningún shell.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Align,
    IndexAlignment,
    CallPartition,
    MergeCalls,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        ToolKind::Align => "align",
                        ToolKind::IndexAlignment => "index_alignment",
                        ToolKind::CallPartition => "call_partition",
                        ToolKind::MergeCalls => "merge_calls",
                    })
    }
}

/// Programa + argumentos, sin interpretar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(),
               args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_word(&self.program))?;
        for a in &self.args {
            write!(f, " {}", display_word(a))?;
        }
        Ok(())
    }
}

// Sólo para logs: cita palabras con espacios o caracteres especiales.
fn display_word(word: &str) -> String {
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+".contains(c)) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Destino del stdout del último comando.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StdoutPlan {
    Inherit,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub tool: ToolKind,
    pub stages: Vec<CommandLine>,
    pub stdout: StdoutPlan,
    /// Archivos que deben existir tras una ejecución exitosa.
    pub outputs: Vec<PathBuf>,
}

impl Invocation {
    pub fn single(tool: ToolKind, command: CommandLine) -> Self {
        Self { tool,
               stages: vec![command],
               stdout: StdoutPlan::Inherit,
               outputs: Vec::new() }
    }

    pub fn pipeline(tool: ToolKind, stages: Vec<CommandLine>) -> Self {
        Self { tool,
               stages,
               stdout: StdoutPlan::Inherit,
               outputs: Vec::new() }
    }

    pub fn with_outputs<I: IntoIterator<Item = PathBuf>>(mut self, outputs: I) -> Self {
        self.outputs.extend(outputs);
        self
    }

    pub fn with_stdout(mut self, plan: StdoutPlan) -> Self {
        self.stdout = plan;
        self
    }

    /// Declarados que no existen en disco.
    pub fn missing_outputs(&self) -> Vec<&Path> {
        self.outputs.iter().filter(|p| !p.is_file()).map(PathBuf::as_path).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{stage}")?;
        }
        if let StdoutPlan::File(path) = &self.stdout {
            write!(f, " > {}", display_word(&path.to_string_lossy()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_only_when_needed() {
        let inv = Invocation::pipeline(ToolKind::Align,
                                       vec![CommandLine::new("bwa").args(["mem", "-R", "@RG\\tID:x"]),
                                            CommandLine::new("samblaster")]).with_stdout(StdoutPlan::File(PathBuf::from("/tmp/o.sam")));
        assert_eq!(inv.to_string(), "bwa mem -R '@RG\\tID:x' | samblaster > /tmp/o.sam");
    }

    #[test]
    fn missing_outputs_lists_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a");
        std::fs::write(&present, b"").unwrap();
        let absent = dir.path().join("b");
        let inv = Invocation::single(ToolKind::IndexAlignment, CommandLine::new("true")).with_outputs([present,
                                                                                                       absent.clone()]);
        assert_eq!(inv.missing_outputs(), vec![absent.as_path()]);
    }
}

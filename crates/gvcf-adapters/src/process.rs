//! Ejecución de invocaciones como procesos del sistema operativo.
//!
//! Las etapas se conectan stdout -> stdin con pipes; el stdout final va a un
//! archivo o se hereda. La invocación es exitosa sólo si todas las etapas
//! terminan con status cero.
use std::fs::File;
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, info};

use gvcf_core::tool::StdoutPlan;
use gvcf_core::{Invocation, PipelineError, ToolInvoker};

#[derive(Debug, Default)]
pub struct ProcessInvoker {
    invocations: usize,
}

impl ProcessInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocaciones ejecutadas (exitosas o no).
    pub fn invocations(&self) -> usize {
        self.invocations
    }
}

fn abort_all(children: &mut [(String, Child)]) {
    for (program, child) in children.iter_mut() {
        debug!("Killing `{program}`");
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl ToolInvoker for ProcessInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), PipelineError> {
        self.invocations += 1;
        let tool = invocation.tool.to_string();
        info!("Running {invocation}");
        let Some(last) = invocation.stages.len().checked_sub(1) else {
            return Err(PipelineError::tool(tool, "invocation without commands"));
        };

        let mut children: Vec<(String, Child)> = Vec::with_capacity(invocation.stages.len());
        let mut upstream: Option<ChildStdout> = None;
        for (i, stage) in invocation.stages.iter().enumerate() {
            let mut cmd = Command::new(&stage.program);
            cmd.args(&stage.args);
            if let Some(out) = upstream.take() {
                cmd.stdin(Stdio::from(out));
            }
            if i < last {
                cmd.stdout(Stdio::piped());
            } else if let StdoutPlan::File(path) = &invocation.stdout {
                match File::create(path) {
                    Ok(file) => {
                        cmd.stdout(Stdio::from(file));
                    }
                    Err(e) => {
                        abort_all(&mut children);
                        return Err(PipelineError::tool(tool, format!("cannot create {}: {e}", path.display())));
                    }
                }
            }
            match cmd.spawn() {
                Ok(mut child) => {
                    upstream = child.stdout.take();
                    children.push((stage.program.clone(), child));
                }
                Err(e) => {
                    abort_all(&mut children);
                    return Err(PipelineError::tool(tool, format!("cannot spawn `{}`: {e}", stage.program)));
                }
            }
        }

        let mut failures = Vec::new();
        for (program, mut child) in children {
            match child.wait() {
                Ok(status) if status.success() => debug!("`{program}` finished"),
                Ok(status) => failures.push(format!("`{program}` exited with {status}")),
                Err(e) => failures.push(format!("`{program}` could not be awaited: {e}")),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::tool(tool, failures.join("; ")))
        }
    }
}

//! External rendering processes.
//!
//! The dispatcher talks to each rendering process through a pair of byte
//! streams. [`ProcessSpawner`] hides where those streams come from: the
//! production [`PlantUmlSpawner`] starts `plantuml -pipe`, tests hand out
//! in-memory pipes.
//!
//! In pipe mode PlantUML reads diagrams from stdin and writes one image per
//! diagram to stdout, each followed by a delimiter line.
//! [`DelimitedOutput`] cuts that stream back into images.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

use crate::consts::PIPE_DELIMITER;
use crate::format::RenderFormat;

/// Streams connected to one rendering process.
pub struct ProcessPipes {
    /// Diagram markup goes here.
    pub input: Box<dyn AsyncWrite + Send + Unpin>,
    /// Rendered images come out here, separated by [`PIPE_DELIMITER`] lines.
    pub output: Box<dyn AsyncRead + Send + Unpin>,
    /// OS process handle, if the pipes belong to a real child process.
    pub process: Option<Child>,
}

impl std::fmt::Debug for ProcessPipes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPipes")
            .field("process", &self.process.as_ref().and_then(Child::id))
            .finish_non_exhaustive()
    }
}

/// Starts rendering processes for a [`RenderDispatcher`](crate::RenderDispatcher).
pub trait ProcessSpawner: Send + Sync {
    /// Start the process backing pool slot `slot`.
    ///
    /// Called from within a tokio runtime.
    fn spawn(&self, slot: usize, format: RenderFormat) -> io::Result<ProcessPipes>;
}

/// Spawns `plantuml` in pipe mode.
#[derive(Debug, Clone)]
pub struct PlantUmlSpawner {
    program: String,
    args: Vec<String>,
}

impl Default for PlantUmlSpawner {
    fn default() -> Self {
        Self::new("plantuml")
    }
}

impl PlantUmlSpawner {
    /// Use `program` as the PlantUML launcher (e.g. `plantuml` or `java`).
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the pipe-mode flags
    /// (e.g. `["-jar", "plantuml.jar"]` when the program is `java`).
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, format: RenderFormat) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(["-pipe", format.plantuml_flag(), "-pipeNoStderr"])
            .args(["-pipedelimitor", PIPE_DELIMITER])
            .args(["-charset", "UTF-8"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }
}

impl ProcessSpawner for PlantUmlSpawner {
    fn spawn(&self, slot: usize, format: RenderFormat) -> io::Result<ProcessPipes> {
        let mut child = self.command(format).spawn()?;
        let input = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("render process stdin not captured"))?;
        let output = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("render process stdout not captured"))?;

        tracing::debug!(slot, pid = ?child.id(), program = %self.program, "spawned render process");

        Ok(ProcessPipes {
            input: Box::new(input),
            output: Box::new(output),
            process: Some(child),
        })
    }
}

/// Splits a rendering process's output stream into individual images.
///
/// Bytes are fed as they arrive; every complete image found so far is
/// returned. The line break written after each delimiter is dropped.
#[derive(Debug)]
pub struct DelimitedOutput {
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known not to start a delimiter.
    scanned: usize,
    skip_line_break: bool,
}

impl Default for DelimitedOutput {
    fn default() -> Self {
        Self::new(PIPE_DELIMITER)
    }
}

impl DelimitedOutput {
    #[must_use]
    pub fn new(delimiter: &str) -> Self {
        Self {
            delimiter: delimiter.as_bytes().to_vec(),
            buffer: Vec::new(),
            scanned: 0,
            skip_line_break: false,
        }
    }

    /// Append `data` and return the images completed by it.
    pub fn feed(&mut self, mut data: &[u8]) -> Vec<Vec<u8>> {
        if self.skip_line_break {
            data = self.strip_line_break(data);
        }
        self.buffer.extend_from_slice(data);

        let mut images = Vec::new();
        while let Some(position) = self.find_delimiter() {
            let image: Vec<u8> = self.buffer.drain(..position).collect();
            self.buffer.drain(..self.delimiter.len());
            self.scanned = 0;
            images.push(image);

            self.skip_line_break = true;
            let rest = std::mem::take(&mut self.buffer);
            let stripped = self.strip_line_break(&rest).to_vec();
            self.buffer = stripped;
        }
        images
    }

    /// Bytes received after the last complete image.
    #[must_use]
    pub fn remainder(&self) -> &[u8] {
        &self.buffer
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        let len = self.delimiter.len();
        if self.buffer.len() < len {
            return None;
        }
        let found = self.buffer[self.scanned..]
            .windows(len)
            .position(|window| window == self.delimiter.as_slice())
            .map(|offset| self.scanned + offset);
        if found.is_none() {
            self.scanned = self.buffer.len() + 1 - len;
        }
        found
    }

    /// Drop a `\n` or `\r\n` right after a delimiter, possibly split across reads.
    fn strip_line_break<'d>(&mut self, data: &'d [u8]) -> &'d [u8] {
        match data {
            [] => data,
            [b'\r', b'\n', rest @ ..] => {
                self.skip_line_break = false;
                rest
            }
            [b'\r'] => &data[1..],
            [b'\n', rest @ ..] => {
                self.skip_line_break = false;
                rest
            }
            _ => {
                self.skip_line_break = false;
                data
            }
        }
    }
}

/// In-memory stand-in for `plantuml -pipe`, shared by the crate's tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    use super::{ProcessPipes, ProcessSpawner};
    use crate::consts::PIPE_DELIMITER;
    use crate::format::RenderFormat;

    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) enum Behaviour {
        /// Answer every diagram.
        #[default]
        Answer,
        /// Answer this many diagrams, then exit.
        ExitAfter(usize),
        /// Read diagrams but never answer.
        Hang,
    }

    /// Answers every diagram with `<svg slot=S>BODY</svg>`, where BODY is the
    /// first line after `@startuml`.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSpawner {
        spawned: AtomicUsize,
        behaviour: Behaviour,
    }

    impl FakeSpawner {
        pub(crate) fn new(behaviour: Behaviour) -> Self {
            Self {
                spawned: AtomicUsize::new(0),
                behaviour,
            }
        }

        pub(crate) fn spawned(&self) -> usize {
            self.spawned.load(Ordering::SeqCst)
        }
    }

    impl ProcessSpawner for FakeSpawner {
        fn spawn(&self, slot: usize, _format: RenderFormat) -> io::Result<ProcessPipes> {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            let (input, process_stdin) = tokio::io::duplex(4096);
            let (process_stdout, output) = tokio::io::duplex(4096);
            tokio::spawn(run(slot, process_stdin, process_stdout, self.behaviour));
            Ok(ProcessPipes {
                input: Box::new(input),
                output: Box::new(output),
                process: None,
            })
        }
    }

    /// Expected image for a diagram whose first line is `body`.
    pub(crate) fn svg(slot: usize, body: &str) -> Vec<u8> {
        format!("<svg slot={slot}>{body}</svg>\n").into_bytes()
    }

    async fn run(
        slot: usize,
        stdin: DuplexStream,
        mut stdout: DuplexStream,
        behaviour: Behaviour,
    ) -> io::Result<()> {
        let mut lines = BufReader::new(stdin).lines();
        let mut body: Option<String> = None;
        let mut answered = 0;
        while let Some(line) = lines.next_line().await? {
            if line == "@enduml" {
                match behaviour {
                    Behaviour::Hang => continue,
                    Behaviour::ExitAfter(limit) if answered == limit => return Ok(()),
                    _ => {}
                }
                let mut reply = svg(slot, &body.take().unwrap_or_default());
                reply.extend_from_slice(format!("{PIPE_DELIMITER}\n").as_bytes());
                stdout.write_all(&reply).await?;
                answered += 1;
            } else if line != "@startuml" && body.is_none() {
                body = Some(line);
            }
        }
        Ok(())
    }
}

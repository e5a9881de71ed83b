use std::io::BufReader;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use npybridge_format::NdArray;
use tracing::{debug, info, warn};

use crate::channel::TransferChannel;
use crate::config::SessionConfig;
use crate::demux::LineDemultiplexer;
use crate::error::{Result, SessionError};
use crate::session::Session;

const READER_THREAD_NAME: &str = "npybridge-reader";

/// A [`Session`] bound to a spawned interpreter process.
///
/// A dedicated reader thread runs a [`LineDemultiplexer`] over the child's
/// stdout for the whole lifetime of the process.
pub struct ProcessSession {
    session: Option<Session<ChildStdin>>,
    child: Child,
    reader: Option<JoinHandle<std::io::Result<u64>>>,
}

/// Start the interpreter described by `config`.
///
/// Every non-frame output line is passed to `on_text` on the reader thread.
pub fn spawn<F>(config: &SessionConfig, on_text: F) -> Result<ProcessSession>
where
    F: FnMut(&str) + Send + 'static,
{
    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(if config.inherit_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
    if let Some(script) = &config.script {
        command.arg(script);
    }

    let mut child = command.spawn().map_err(|source| SessionError::Spawn {
        program: config.program.display().to_string(),
        source,
    })?;
    info!(program = %config.program.display(), pid = child.id(), "interpreter started");

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(SessionError::Closed);
    };

    let channel = TransferChannel::new();
    let mut demux = LineDemultiplexer::new(channel.clone(), on_text);
    let reader = thread::Builder::new()
        .name(READER_THREAD_NAME.to_string())
        .spawn(move || demux.run(BufReader::new(stdout)))?;

    let mut process = ProcessSession {
        session: Some(Session::new(stdin, channel).with_bytes_prefix(config.bytes_prefix)),
        child,
        reader: Some(reader),
    };
    for line in &config.preamble {
        process.write_line(line)?;
    }
    Ok(process)
}

impl ProcessSession {
    fn session(&mut self) -> Result<&mut Session<ChildStdin>> {
        self.session.as_mut().ok_or(SessionError::Closed)
    }

    /// Forward one command line verbatim.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.session()?.write_line(line)
    }

    /// Bind `array` to `name` inside the interpreter.
    pub fn send(&mut self, name: &str, array: &NdArray) -> Result<()> {
        self.session()?.send(name, array)
    }

    /// Fetch the array bound to `name`, blocking until it arrives.
    pub fn get(&mut self, name: &str) -> Result<NdArray> {
        self.session()?.get(name)
    }

    /// OS process id of the interpreter.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Whether the interpreter has terminated.
    pub fn has_exited(&mut self) -> Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    /// Close the interpreter's input, wait for it to exit and join the reader.
    ///
    /// One unread frame may be left in the channel. If the interpreter prints
    /// a second frame while the first is still unread, the reader thread stays
    /// blocked handing it off and this call never returns. Callers must
    /// [`get`](Self::get) every frame they ask for before closing.
    pub fn close(mut self) -> Result<ExitStatus> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<ExitStatus> {
        // Dropping stdin sends EOF, which ends the interactive prompt.
        drop(self.session.take());
        let status = self.child.wait()?;

        if let Some(reader) = self.reader.take() {
            match reader.join() {
                Ok(Ok(frames)) => debug!(frames, "reader thread finished"),
                Ok(Err(err)) => warn!(%err, "reader thread stopped on I/O error"),
                Err(_) => warn!("reader thread panicked"),
            }
        }

        info!(%status, "interpreter exited");
        Ok(status)
    }
}

/// Dropping performs [`ProcessSession::close`] and ignores the result, so it
/// hangs under the same condition: more than one unread frame.
impl Drop for ProcessSession {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(err) = self.shutdown() {
                warn!(%err, "interpreter shutdown failed");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::demux::tests::python_bytes_repr;

    fn shell_config(script: &str) -> SessionConfig {
        SessionConfig {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            preamble: Vec::new(),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn text_output_reaches_callback() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let config = shell_config("while read line; do echo \"echo:$line\"; done");

        let mut process = spawn(&config, move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        })
        .unwrap();
        process.write_line("one").unwrap();
        process.write_line("two").unwrap();

        let status = process.close().unwrap();
        assert!(status.success());
        assert_eq!(*lines.lock().unwrap(), vec!["echo:one", "echo:two"]);
    }

    #[test]
    fn get_receives_frame_printed_by_child() {
        let array = NdArray::from_vec(vec![2, 3], vec![7u8, 8, 9, 10, 11, 12]).unwrap();
        let frame = npybridge_format::encode(&array).unwrap();
        let transcript = std::env::temp_dir().join(format!(
            "npybridge-process-frame-{}.txt",
            std::process::id()
        ));
        std::fs::write(
            &transcript,
            format!("some text\n{}\n", python_bytes_repr(&frame)),
        )
        .unwrap();

        // Answer the three get commands by printing the captured reply.
        let script = format!(
            "read a; read b; read c; cat '{}'; cat >/dev/null",
            transcript.display()
        );
        let mut process = spawn(&shell_config(&script), |_| {}).unwrap();

        assert_eq!(process.get("x").unwrap(), array);
        assert!(process.close().unwrap().success());
        let _ = std::fs::remove_file(&transcript);
    }

    #[test]
    fn close_returns_with_one_unread_frame() {
        let frame = npybridge_format::encode(&NdArray::scalar(3u16)).unwrap();
        let transcript = std::env::temp_dir().join(format!(
            "npybridge-process-unread-{}.txt",
            std::process::id()
        ));
        std::fs::write(&transcript, format!("{}\n", python_bytes_repr(&frame))).unwrap();

        let script = format!("cat '{}'; cat >/dev/null", transcript.display());
        let process = spawn(&shell_config(&script), |_| {}).unwrap();

        assert!(process.close().unwrap().success());
        let _ = std::fs::remove_file(&transcript);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let config = SessionConfig {
            program: PathBuf::from("/nonexistent/npybridge-interpreter"),
            ..SessionConfig::default()
        };
        let err = spawn(&config, |_| {}).err().unwrap();
        assert!(matches!(err, SessionError::Spawn { .. }));
    }

    #[test]
    fn has_exited_tracks_child() {
        let mut process = spawn(&shell_config("exit 0"), |_| {}).unwrap();
        let status = process.child.wait().unwrap();
        assert!(status.success());
        assert!(process.has_exited().unwrap());
    }
}

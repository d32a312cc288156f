use crate::domain::ports::Prompter;
use std::io::{self, BufRead, Write};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Asks on stdout and reads a single line from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for StdinPrompter {
    fn ask(&self, question: &str) -> io::Result<String> {
        off_runtime(|| {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{} ", question.trim_end())?;
            stdout.flush()?;

            read_answer(&mut io::stdin().lock())
        })
    }
}

/// Runs a blocking read without pinning a worker of a multi-threaded runtime.
fn off_runtime<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn read_answer(input: &mut impl BufRead) -> io::Result<String> {
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }

    Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_one_line() {
        let mut input = Cursor::new("github\r\nacme\n");

        assert_eq!(read_answer(&mut input).unwrap(), "github");
        assert_eq!(read_answer(&mut input).unwrap(), "acme");
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut input = Cursor::new("");

        let err = read_answer(&mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_blocking_read_outside_runtime() {
        assert_eq!(off_runtime(|| 7), 7);
    }

    #[tokio::test]
    async fn test_blocking_read_on_current_thread_runtime() {
        assert_eq!(off_runtime(|| "yes"), "yes");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_read_on_multi_thread_runtime() {
        let (tx, rx) = std::sync::mpsc::channel();
        tokio::spawn(async move {
            tx.send("audited").unwrap();
        });

        let received = off_runtime(|| rx.recv_timeout(std::time::Duration::from_secs(5)));

        assert_eq!(received.unwrap(), "audited");
    }
}

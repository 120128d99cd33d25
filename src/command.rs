use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use crate::logging::COMMAND_NAMESPACE;
use crate::session::{SharedWidgetSession, WidgetSession};
use crate::ui::render::bit_string;
use log::{debug, error, info, warn};

/// Listens for one-line commands, one per connection:
///
/// - `tap` cycles the theme, like touching the widget
/// - `theme <Name>` selects a theme by name
/// - `resync` re-reads the wall clock
/// - `status` reports the current value and theme
///
/// Runs on its own thread; the session lock serializes it with ticks.
pub fn start_command_listener(addr: String, session: SharedWidgetSession) {
    thread::spawn(move || {
        let listener = match TcpListener::bind(&addr) {
            Ok(listener) => listener,
            Err(e) => {
                error!(target: COMMAND_NAMESPACE, "Failed to bind command listener on {}: {}", addr, e);
                return;
            }
        };
        info!(target: COMMAND_NAMESPACE, "Command listener on {}", addr);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => handle_connection(stream, &session),
                Err(e) => warn!(target: COMMAND_NAMESPACE, "Failed to accept connection: {}", e),
            }
        }
    });
}

fn handle_connection(mut stream: TcpStream, session: &SharedWidgetSession) {
    let reader = match stream.try_clone() {
        Ok(read_half) => BufReader::new(read_half),
        Err(e) => {
            warn!(target: COMMAND_NAMESPACE, "Failed to clone stream: {}", e);
            return;
        }
    };
    if let Some(Ok(line)) = reader.lines().next() {
        let response = {
            let mut session = session.blocking_lock();
            execute_command(&line, &mut session)
        };
        debug!(target: COMMAND_NAMESPACE, "{:?} -> {:?}", line.trim(), response.trim_end());
        send_reply(&mut stream, &response);
    }
}

/// Returns false when the client went away before the reply was written.
fn send_reply<W: Write>(writer: &mut W, response: &str) -> bool {
    match writer.write_all(response.as_bytes()).and_then(|_| writer.flush()) {
        Ok(()) => true,
        Err(e) => {
            warn!(target: COMMAND_NAMESPACE, "Failed to send reply: {}", e);
            false
        }
    }
}

/// Applies one command line to the session and returns the reply line.
pub fn execute_command(line: &str, session: &mut WidgetSession) -> String {
    let tokens: Vec<_> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["tap"] => {
            let theme = session.on_touch();
            format!("OK theme={}\n", theme.name)
        }
        ["theme", name] => match session.select_theme(name) {
            Some(theme) => format!("OK theme={}\n", theme.name),
            None => format!("ERR unknown theme: {}\n", name),
        },
        ["resync"] => {
            let value = session.resync();
            format!("OK value={}\n", value)
        }
        ["status"] => {
            let status = session.status();
            format!(
                "OK value={} bits={} theme={} since_resync={}\n",
                status.value,
                bit_string(status.value),
                status.theme,
                status.ticks_since_resync
            )
        }
        [] => "ERR empty command\n".to_string(),
        _ => "ERR unknown command\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::sink::MemorySink;
    use std::io;

    fn session() -> WidgetSession {
        WidgetSession::new(
            &Config::default(),
            Box::new(FixedClock::at(43_199)),
            Box::new(MemorySink::with_surfaces(&[1])),
        )
        .unwrap()
    }

    #[test]
    fn tap_cycles_theme() {
        let mut session = session();
        assert_eq!(execute_command("tap", &mut session), "OK theme=LightTransparent\n");
        assert_eq!(execute_command("  tap \r\n", &mut session), "OK theme=Gray\n");
    }

    #[test]
    fn theme_by_name() {
        let mut session = session();
        assert_eq!(execute_command("theme Red", &mut session), "OK theme=Red\n");
        assert_eq!(execute_command("theme Mauve", &mut session), "ERR unknown theme: Mauve\n");
    }

    #[test]
    fn status_after_resync() {
        let mut session = session();
        assert_eq!(execute_command("resync", &mut session), "OK value=32767\n");
        assert_eq!(
            execute_command("status", &mut session),
            "OK value=32767 bits=0111111111111111 theme=Light since_resync=0\n"
        );
    }

    #[test]
    fn rejects_garbage() {
        let mut session = session();
        assert_eq!(execute_command("", &mut session), "ERR empty command\n");
        assert_eq!(execute_command("tap twice", &mut session), "ERR unknown command\n");
    }

    struct HungUp;

    impl Write for HungUp {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reply_to_closed_client_is_reported() {
        let mut sent = Vec::new();
        assert!(send_reply(&mut sent, "OK theme=Gray\n"));
        assert_eq!(sent, b"OK theme=Gray\n");

        assert!(!send_reply(&mut HungUp, "OK theme=Gray\n"));
    }
}

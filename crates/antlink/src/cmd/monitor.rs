use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use antlink_session::{Session, SessionConfig, SessionError};
use antlink_transport::Transport;
use tracing::info;

use crate::cmd::{parse_duration, parse_hex, MonitorArgs};
use crate::exit::{io_error, session_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(unix)]
pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    use antlink_transport::{SerialConfig, SerialPort};

    let port = SerialPort::with_config(
        &args.device,
        SerialConfig {
            baud_rate: args.baud,
            ..SerialConfig::default()
        },
    );
    monitor(port, &args, format)
}

#[cfg(not(unix))]
pub fn run(_args: MonitorArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(CliError::usage(
        "monitor requires the serial transport, which is only available on Unix",
    ))
}

fn monitor<T: Transport + 'static>(
    transport: T,
    args: &MonitorArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    let deadline = args
        .duration
        .as_deref()
        .map(parse_duration)
        .transpose()?
        .map(|d| Instant::now() + d);
    let network_key = args.network_key.as_deref().map(parse_hex).transpose()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut session = Session::new(transport).with_config(config);
    session
        .start()
        .map_err(|err| session_error("start failed", err))?;
    info!(device = %args.device.display(), "monitoring");

    let result = pump_messages(&session, args, network_key.as_deref(), deadline, &running, format);
    let stopped = session.stop();
    let printed = result?;
    stopped.map_err(|err| session_error("session ended with error", err))?;
    info!(printed, "monitor finished");
    Ok(SUCCESS)
}

fn pump_messages<T: Transport + 'static>(
    session: &Session<T>,
    args: &MonitorArgs,
    network_key: Option<&[u8]>,
    deadline: Option<Instant>,
    running: &AtomicBool,
    format: OutputFormat,
) -> CliResult<usize> {
    let outbound = session
        .outbound()
        .map_err(|err| session_error("session not running", err))?;
    if args.reset {
        outbound
            .reset_system()
            .map_err(|err| session_error("reset failed", err))?;
    }
    if let Some(key) = network_key {
        outbound
            .set_network_key(args.network, key)
            .map_err(|err| session_error("set network key failed", err))?;
    }

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        match session.recv_timeout(POLL_INTERVAL) {
            Ok(Some(message)) => {
                print_message(&message, format);
                printed += 1;
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Ok(None) => {}
            // The pump died; stop() reports why.
            Err(SessionError::Disconnected) => break,
            Err(err) => return Err(session_error("receive failed", err)),
        }
    }
    Ok(printed)
}

fn load_config(path: &Path) -> CliResult<SessionConfig> {
    let text = fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("invalid config {}: {err}", path.display()),
        )
    })
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

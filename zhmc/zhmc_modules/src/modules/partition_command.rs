//! The `zhmc_partition_command` module: run a command on the operating
//! system console of a partition.
//!
//! The OS messages of the partition are received by a background thread
//! while the command is sent. The output starts at the message that echoes
//! the command and ends when no messages arrived for a while.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use zhmc_core::{Error, HmcClient, Operation, OsMessageReceiver, Properties, Result};

use crate::lookup::{find_cpc, find_partition};
use crate::module::ModuleOutput;
use crate::params::parse_params;

/// How long the message thread may take to get ready.
const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Collection ends after this long without new messages.
const NO_MORE_MESSAGES_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll interval of the message thread, bounding how long it takes to stop.
const RECEIVE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartitionCommandParams {
    cpc_name: String,
    name: String,
    command: String,
    #[serde(default)]
    is_priority: bool,
}

/// Run the module.
///
/// Sending a command always counts as a change. In check mode, no command
/// is sent and the output is empty.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: PartitionCommandParams = parse_params(params)?;
    let output = if check_mode {
        Vec::new()
    } else {
        perform_command(client, &params, NO_MORE_MESSAGES_TIMEOUT)?
    };
    Ok(ModuleOutput::new(
        true,
        Value::Array(output.into_iter().map(Value::String).collect()),
    ))
}

/// Forward the OS messages from the receiver to `messages` until `stop` is
/// set or the channel is closed.
fn forward_messages(
    mut receiver: Box<dyn OsMessageReceiver>,
    messages: Sender<String>,
    ready: Sender<()>,
    stop: Arc<AtomicBool>,
) {
    debug!("Message thread: Receiving messages");
    let _ = ready.send(());
    while !stop.load(Ordering::SeqCst) {
        match receiver.receive(RECEIVE_POLL) {
            Ok(Some(texts)) => {
                for text in texts {
                    let text = text.trim_end_matches('\n').to_string();
                    debug!("Message thread: Got message: {:?}", text);
                    if messages.send(text).is_err() {
                        receiver.close();
                        return;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Message thread: Unexpected end of message channel: {}", e);
                return;
            }
        }
    }
    debug!("Message thread: Stop requested");
    receiver.close();
}

/// Keep the messages starting at the first one that contains the command,
/// compared case-insensitively.
fn command_output(command: &str, messages: impl IntoIterator<Item = String>) -> Vec<String> {
    let command_upper = command.to_uppercase();
    messages
        .into_iter()
        .skip_while(|msg| !msg.to_uppercase().contains(&command_upper))
        .collect()
}

/// Send the command once the message thread is ready, and collect the
/// messages until none arrive for `quiet_time`.
fn collect_output(
    client: &dyn HmcClient,
    partition_uri: &str,
    params: &PartitionCommandParams,
    ready: &Receiver<()>,
    messages: &Receiver<String>,
    quiet_time: Duration,
) -> Result<Vec<String>> {
    debug!(
        "Waiting for message thread readiness (timeout: {} s)",
        READINESS_TIMEOUT.as_secs()
    );
    if ready.recv_timeout(READINESS_TIMEOUT).is_err() {
        return Err(Error::unexpected("The message thread did not get ready"));
    }

    debug!("Executing command: {:?}", params.command);
    client.invoke(
        partition_uri,
        &Operation::SendOsCommand {
            command: params.command.clone(),
            is_priority: params.is_priority,
        },
    )?;

    debug!("Processing received messages");
    let mut received = Vec::new();
    loop {
        match messages.recv_timeout(quiet_time) {
            Ok(msg) => received.push(msg),
            Err(RecvTimeoutError::Timeout) => {
                debug!("Found no more messages for {:?}", quiet_time);
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(command_output(&params.command, received))
}

fn perform_command(
    client: &dyn HmcClient,
    params: &PartitionCommandParams,
    quiet_time: Duration,
) -> Result<Vec<String>> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = find_partition(client, &cpc, &params.name)?;

    debug!("Opening message channel to partition '{}'", partition.name());
    let receiver = client.open_os_message_channel(&partition.uri)?;

    let (msg_tx, msg_rx) = unbounded();
    let (ready_tx, ready_rx) = bounded(1);
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    debug!("Starting message thread");
    let handle = thread::Builder::new()
        .name("os-messages".to_string())
        .spawn(move || forward_messages(receiver, msg_tx, ready_tx, thread_stop))?;

    let result = collect_output(client, &partition.uri, params, &ready_rx, &msg_rx, quiet_time);

    debug!("Closing message channel");
    stop.store(true, Ordering::SeqCst);
    if handle.join().is_err() {
        warn!("Message thread panicked");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zhmc_core::ResourceClass;
    use zhmc_session::FakedHmc;

    fn setup(responses: &[&str]) -> FakedHmc {
        let hmc = FakedHmc::new();
        let cpc = hmc
            .add_cpc(json!({"name": "CPC1"}).as_object().unwrap().clone())
            .unwrap();
        let part = hmc
            .add(
                ResourceClass::Partition,
                Some(&cpc),
                json!({"name": "p1", "status": "active"})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .unwrap();
        hmc.set_os_command_response(&part, responses.iter().map(|s| s.to_string()).collect());
        hmc
    }

    fn params(command: &str) -> PartitionCommandParams {
        PartitionCommandParams {
            cpc_name: "CPC1".into(),
            name: "p1".into(),
            command: command.into(),
            is_priority: false,
        }
    }

    #[test]
    fn test_command_output_starts_at_echo() {
        let messages = vec![
            "earlier message".to_string(),
            "$ uname -a".to_string(),
            "Linux p1 6.1.0".to_string(),
        ];
        assert_eq!(
            command_output("UNAME -A", messages),
            vec!["$ uname -a".to_string(), "Linux p1 6.1.0".to_string()]
        );
        assert!(command_output("ls", vec!["nothing".to_string()]).is_empty());
    }

    #[test]
    fn test_perform_command() {
        let hmc = setup(&["Linux p1 6.1.0\n", "$"]);
        let output =
            perform_command(&hmc, &params("uname -a"), Duration::from_millis(300)).unwrap();
        assert_eq!(
            output,
            vec!["uname -a".to_string(), "Linux p1 6.1.0".to_string(), "$".to_string()]
        );
        assert_eq!(hmc.mutations().len(), 1);
    }

    #[test]
    fn test_check_mode_sends_nothing() {
        let hmc = setup(&["ok"]);
        let input = json!({"cpc_name": "CPC1", "name": "p1", "command": "ls"});
        let output = run(&hmc, input.as_object().unwrap(), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result, json!([]));
        assert!(hmc.mutations().is_empty());
    }

    #[test]
    fn test_unknown_partition() {
        let hmc = setup(&[]);
        let mut p = params("ls");
        p.name = "p2".into();
        let err = perform_command(&hmc, &p, Duration::from_millis(100)).unwrap_err();
        assert!(err.is_not_found());
    }
}

// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::info;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::status::{DiagnosticLevel, SharedSystemStatus};
use feed_client::{Client, ClientConfig, ConnectionConfig, StatusEvent};

/// Commands the UI can send to the feed task.
#[derive(Debug)]
enum Command {
    RequestStatus,
    SetAddress(String),
}

/// Owns the process-wide feed client on a background thread.
///
/// There is exactly one supervisor per app, created on startup and injected
/// into the dashboard. The client lives for the life of the process; shutdown
/// happens implicitly when the app exits.
#[derive(Debug)]
pub struct FeedSupervisor {
    command_tx: mpsc::UnboundedSender<Command>,
    cancel_token: CancellationToken,
}

impl FeedSupervisor {
    /// Spawn the feed client against `address` and start mirroring its state
    /// into `status`. `ctx` is poked for a repaint whenever state changes.
    pub fn spawn(address: String, status: SharedSystemStatus, ctx: egui::Context) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        status.lock().unwrap().feed_address = address.clone();

        info!("Starting platform feed connection to {}", address);

        let task_cancel = cancel_token.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(run_feed(address, status, command_rx, task_cancel, ctx));
        });

        Self {
            command_tx,
            cancel_token,
        }
    }

    /// Ask the backend for a fresh status snapshot.
    pub fn request_status(&self) {
        let _ = self.command_tx.send(Command::RequestStatus);
    }

    /// Hot-reload the feed server address.
    #[allow(dead_code)]
    pub fn set_address(&self, address: String) {
        let _ = self.command_tx.send(Command::SetAddress(address));
    }

    /// Stop the feed client.
    #[allow(dead_code)]
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for FeedSupervisor {
    fn drop(&mut self) {
        info!("Shutting down feed supervisor");
        self.cancel_token.cancel();
    }
}

async fn run_feed(
    address: String,
    status: SharedSystemStatus,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    cancel_token: CancellationToken,
    ctx: egui::Context,
) {
    let mut client = Client::spawn(ClientConfig {
        connection: ConnectionConfig {
            address,
            ..Default::default()
        },
        ..Default::default()
    });

    let mut events = client.subscribe();
    let mut last_state = client.connection_state();

    loop {
        tokio::select! {
            alive = client.process_next() => {
                if !alive {
                    break;
                }

                {
                    let mut status = status.lock().unwrap();
                    status.increment_event_count();

                    // Mirror connection state transitions into diagnostics
                    let state = client.connection_state();
                    if state != last_state {
                        status.set_feed_state(state.clone());
                        last_state = state;
                    }

                    // Drain tracker events for diagnostics and snapshots
                    while let Ok(event) = events.try_recv() {
                        match event {
                            StatusEvent::FeedConnected(message) => {
                                status.add_diagnostic(DiagnosticLevel::Info, message);
                            }
                            StatusEvent::ServiceChanged { service, connected } => {
                                status.record_service_change(&service, connected);
                            }
                            StatusEvent::SnapshotUpdated => {
                                status.apply_snapshot(
                                    client.services(),
                                    client.last_timestamp(),
                                    client.uptime(),
                                );
                            }
                            StatusEvent::ProgressUpdated(_) => {}
                        }
                    }

                    status.loading = client.loading();
                }

                ctx.request_repaint();
            }

            command = command_rx.recv() => {
                match command {
                    Some(Command::RequestStatus) => client.request_status(),
                    Some(Command::SetAddress(address)) => {
                        status.lock().unwrap().feed_address = address.clone();
                        client.set_address(address);
                    }
                    None => break,
                }
            }

            () = cancel_token.cancelled() => {
                info!("Feed supervisor cancelled");
                client.shutdown();
                break;
            }
        }
    }
}

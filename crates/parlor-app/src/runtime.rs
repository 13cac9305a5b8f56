//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Protocol bridge
//! - [`Driver`]: Platform-specific I/O and view

use crate::{App, AppAction, AppEvent, Bridge, ConnectionState, Driver};

/// Upper bound on frames drained from the driver per cycle so input stays
/// responsive under a flood of server traffic.
const MAX_FRAMES_PER_CYCLE: usize = 64;

/// Generic runtime that orchestrates App, Bridge, and Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    app: App,
    bridge: Bridge,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver and app.
    pub fn new(driver: D, app: App) -> Self {
        Self { driver, app, bridge: Bridge::new() }
    }

    /// Run the main event loop.
    ///
    /// 1. Polls for input events from the driver
    /// 2. Receives frames from the server
    /// 3. Processes actions and events between App and Bridge
    /// 4. Sends outgoing frames through the driver
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;

        loop {
            let should_quit = self.step().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Render once and connect to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;
        self.connect().await
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let actions = self.driver.poll_event(&mut self.app).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        if self.driver.is_connected() {
            for _ in 0..MAX_FRAMES_PER_CYCLE {
                let Some(frame) = self.driver.recv_frame().await else {
                    break;
                };
                let events = self.bridge.handle_frame(&frame);
                if self.process_events(events).await? {
                    return Ok(true);
                }
            }
        } else if self.app.connection_state() != &ConnectionState::Disconnected {
            tracing::info!("connection lost");
            if self.process_events(vec![AppEvent::Disconnected]).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),
                    AppAction::Connect { server_addr: _ } => {
                        self.connect().await?;
                    },
                    AppAction::View(command) => command.apply(&mut self.driver),
                    AppAction::Send(outbound) => {
                        let events = self.bridge.process_outbound(outbound);
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                        self.send_outgoing_frames().await?;
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    async fn process_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Connect to the server and send Hello.
    ///
    /// Connection failures end up in the status line rather than aborting.
    async fn connect(&mut self) -> Result<(), D::Error> {
        let server_addr = self.app.server_addr().to_owned();
        if let Err(e) = self.driver.connect(&server_addr).await {
            tracing::warn!(%server_addr, error = %e, "connect failed");
            let mut actions = self.app.handle(AppEvent::Disconnected);
            actions.extend(self.app.handle(AppEvent::Error { message: e.to_string() }));
            self.process_actions_sync(actions);
            return Ok(());
        }

        let actions = self.app.handle(AppEvent::Connecting);
        self.process_actions_sync(actions);

        for event in self.bridge.hello(self.app.display_name().map(str::to_owned)) {
            let actions = self.app.handle(event);
            self.process_actions_sync(actions);
        }
        self.send_outgoing_frames().await
    }

    /// Process actions synchronously (for use in sync contexts).
    fn process_actions_sync(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render => {
                    if let Err(e) = self.driver.render(&self.app) {
                        tracing::warn!("Failed to render: {:?}", e);
                    }
                },
                AppAction::View(command) => command.apply(&mut self.driver),
                AppAction::Quit => {},

                // Protocol actions shouldn't happen in sync contexts
                AppAction::Connect { .. } | AppAction::Send(_) => {
                    tracing::warn!("Unexpected protocol action in sync context: {:?}", action);
                },
            }
        }
    }

    /// Send all pending outgoing frames to the server.
    async fn send_outgoing_frames(&mut self) -> Result<(), D::Error> {
        let frames = self.bridge.take_outgoing();
        for frame in frames {
            self.driver.send_frame(frame).await?;
        }
        Ok(())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

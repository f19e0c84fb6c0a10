// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Receiving session: datagrams in, decoded frames and plot series out

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rangelink_serialization::{
    DecodeError, DecodeOutcome, DecodedFrame, DecoderStats, PlotWindow, StreamDecoder,
};
use rangelink_transports::{DatagramReceiver, TransportError};
use tracing::{debug, info, warn};

use crate::error::SessionResult;

/// What one received datagram did
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverEvent {
    /// Sensor count (re)locked; the plot window was reset
    Locked { device_count: usize },
    Frame(DecodedFrame),
    /// Datagram dropped by the decoder
    Dropped(DecodeError),
}

/// Pulls datagrams from a transport and feeds the decoder and plot window
pub struct ReceiverSession<R: DatagramReceiver> {
    receiver: R,
    decoder: StreamDecoder,
    window: PlotWindow,
    running: Arc<AtomicBool>,
}

impl<R: DatagramReceiver> ReceiverSession<R> {
    pub fn new(receiver: R, decoder: StreamDecoder, window_width: usize) -> Self {
        Self {
            receiver,
            decoder,
            window: PlotWindow::new(window_width, 0),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag that keeps [`ReceiverSession::run`] going; store `false` to stop
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    pub fn window(&self) -> &PlotWindow {
        &self.window
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Handle one datagram
    ///
    /// `Ok(None)` when nothing arrived before the read timeout.
    pub fn poll(&mut self) -> SessionResult<Option<ReceiverEvent>> {
        let datagram = match self.receiver.receive() {
            Ok(datagram) => datagram,
            Err(e) if e.is_timeout() => return Ok(None),
            Err(TransportError::MessageTooLarge { size, max_size }) => {
                warn!("Ignoring {} byte datagram (max {})", size, max_size);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(self.handle(&datagram)))
    }

    /// Decode a datagram that arrived by other means
    pub fn handle(&mut self, datagram: &[u8]) -> ReceiverEvent {
        match self.decoder.decode(datagram) {
            Ok(DecodeOutcome::Locked { device_count, .. }) => {
                self.window.reset(device_count);
                ReceiverEvent::Locked { device_count }
            }
            Ok(DecodeOutcome::Frame(frame)) => {
                self.window.push(&frame);
                ReceiverEvent::Frame(frame)
            }
            Err(e) => {
                debug!("Dropped datagram {:?}: {}", String::from_utf8_lossy(datagram), e);
                ReceiverEvent::Dropped(e)
            }
        }
    }

    /// Receive until the running flag clears or the sender side closes
    ///
    /// `on_event` sees every event together with the current plot window.
    pub fn run<F>(&mut self, mut on_event: F) -> SessionResult<DecoderStats>
    where
        F: FnMut(&ReceiverEvent, &PlotWindow),
    {
        info!("📡 Waiting for frames");
        while self.running.load(Ordering::SeqCst) {
            match self.poll() {
                Ok(Some(event)) => on_event(&event, &self.window),
                Ok(None) => {}
                Err(crate::SessionError::Transport(TransportError::ChannelClosed)) => {
                    debug!("Sender closed the channel");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let stats = self.decoder.stats();
        info!(
            "Receiver stopped: {} frame(s) accepted, {} rejected, {} malformed token(s)",
            stats.frames_accepted, stats.frames_rejected, stats.malformed_tokens
        );
        Ok(stats)
    }
}

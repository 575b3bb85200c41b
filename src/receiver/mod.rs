// Receiver session
//
// Request/response exchanges with a u-blox receiver over any byte stream.
// Each request is retried on silence; a NAK is final.

mod dynamic_model;
mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod serial;

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

pub use dynamic_model::DynamicModel;
pub use error::{ReceiverError, Result};

use crate::config::constants::{DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use crate::ubx::messages::{
    message_name, Ack, CfgCfg, DeviceMask, MonVer, Nav5, ProtocolVersion, SectionMask, CLASS_CFG,
    CLASS_MON, ID_CFG_NAV5, ID_MON_VER,
};
use crate::ubx::{Frame, FrameDecoder};

const READ_CHUNK: usize = 256;

/// Timing policy for request/response exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverOptions {
    /// How long to wait for an answer to each attempt
    pub timeout: Duration,
    /// Extra attempts after the first one goes unanswered
    pub retries: u32,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retries: DEFAULT_RETRIES,
        }
    }
}

/// A UBX session over a serial port (or anything else that reads and writes)
pub struct Receiver<S> {
    stream: S,
    decoder: FrameDecoder,
    pending: VecDeque<Frame>,
    options: ReceiverOptions,
    /// Requests sent during the most recent exchange
    attempts_sent: u32,
    /// ACKs owed for CFG poll attempts that were never answered in time
    late_acks: Vec<(u8, u8)>,
}

impl<S> Receiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, options: ReceiverOptions) -> Self {
        Self {
            stream,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            options,
            attempts_sent: 0,
            late_acks: Vec::new(),
        }
    }

    /// Write one frame to the receiver
    pub async fn send(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode()?;
        trace!(frame = %frame, bytes = ?bytes, "tx");
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Poll a message and return the receiver's answer
    pub async fn poll(&mut self, class: u8, id: u8) -> Result<Frame> {
        let request = Frame::poll(class, id);
        let frame = self
            .exchange(&request, |frame| {
                if frame.is(class, id) && !frame.payload.is_empty() {
                    return Some(Ok(frame.clone()));
                }
                match Ack::decode(frame) {
                    Some(ack) if !ack.acknowledged && ack.matches(class, id) => {
                        Some(Err(ReceiverError::Nak { class, id }))
                    }
                    _ => None,
                }
            })
            .await?;

        // CFG polls are followed by an ACK-ACK; consume it so it cannot be
        // mistaken for the acknowledgement of the next request. Attempts that
        // timed out may still be answered later, each with its own ACK.
        if class == CLASS_CFG {
            let answered = u32::from(self.consume_ack(class, id).await?);
            let owed = self.attempts_sent.saturating_sub(answered);
            self.late_acks
                .extend(std::iter::repeat((class, id)).take(owed as usize));
        }

        Ok(frame)
    }

    /// Send a CFG message and wait for it to be acknowledged
    pub async fn configure(&mut self, frame: &Frame) -> Result<()> {
        let (class, id) = (frame.class, frame.id);
        self.exchange(frame, |reply| {
            let ack = Ack::decode(reply)?;
            if !ack.matches(class, id) {
                return None;
            }
            if ack.acknowledged {
                Some(Ok(()))
            } else {
                Some(Err(ReceiverError::Nak { class, id }))
            }
        })
        .await
    }

    /// Current navigation engine settings (CFG-NAV5)
    pub async fn navigation_settings(&mut self) -> Result<Nav5> {
        let frame = self.poll(CLASS_CFG, ID_CFG_NAV5).await?;
        Ok(Nav5::decode(&frame.payload)?)
    }

    /// Current dynamic platform model
    pub async fn dynamic_model(&mut self) -> Result<DynamicModel> {
        let nav5 = self.navigation_settings().await?;
        DynamicModel::try_from(nav5.dyn_model).map_err(ReceiverError::UnknownModel)
    }

    /// Change the dynamic platform model, leaving other CFG-NAV5 fields alone
    pub async fn set_dynamic_model(&mut self, model: DynamicModel) -> Result<()> {
        info!(model = %model, code = model.code(), "Setting dynamic platform model");
        self.configure(&Nav5::dynamic_model_only(model).to_frame())
            .await
    }

    /// Persist the current configuration to non-volatile storage
    pub async fn save_configuration(
        &mut self,
        sections: SectionMask,
        devices: DeviceMask,
    ) -> Result<()> {
        info!(
            sections = %format!("{:#010x}", sections.0),
            devices = %format!("{:#04x}", devices.0),
            "Saving receiver configuration"
        );
        self.configure(&CfgCfg::save(sections, devices).to_frame())
            .await
    }

    /// Receiver software/hardware version (MON-VER)
    pub async fn version(&mut self) -> Result<MonVer> {
        let frame = self.poll(CLASS_MON, ID_MON_VER).await?;
        Ok(MonVer::decode(&frame.payload)?)
    }

    /// Refuse models the receiver's firmware does not know about
    ///
    /// Returns the receiver's protocol version when it had to be queried. A
    /// receiver that does not answer MON-VER is given the benefit of the doubt.
    pub async fn ensure_supported(
        &mut self,
        model: DynamicModel,
    ) -> Result<Option<ProtocolVersion>> {
        let Some(required) = model.min_protocol_version() else {
            return Ok(None);
        };

        let version = match self.version().await {
            Ok(version) => version,
            Err(e @ (ReceiverError::Io(_) | ReceiverError::Closed)) => return Err(e),
            Err(e) => {
                warn!(error = %e, model = %model, "Could not read receiver version; continuing");
                return Ok(None);
            }
        };

        let Some(actual) = version.protocol_version() else {
            warn!(software = %version.software, "Receiver does not report PROTVER; continuing");
            return Ok(None);
        };

        if !model.is_supported_by(actual) {
            return Err(ReceiverError::UnsupportedModel {
                model,
                required,
                actual,
            });
        }

        debug!(protocol = %actual, model = %model, "Model supported by receiver");
        Ok(Some(actual))
    }

    /// Send `request` and feed replies to `matcher` until it decides
    ///
    /// `matcher` returns `None` for frames that are not the answer.
    async fn exchange<T, F>(&mut self, request: &Frame, mut matcher: F) -> Result<T>
    where
        F: FnMut(&Frame) -> Option<Result<T>>,
    {
        let name = message_name(request.class, request.id);
        let attempts = self.options.retries + 1;

        self.drain_late_acks().await?;

        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "Discarding stale frames");
            self.pending.clear();
        }

        self.attempts_sent = 0;
        for attempt in 1..=attempts {
            debug!(message = %name, attempt, attempts, "Sending request");
            self.send(request).await?;
            self.attempts_sent = attempt;

            let deadline = Instant::now() + self.options.timeout;
            while let Some(frame) = self.next_frame(deadline).await? {
                if let Some(result) = matcher(&frame) {
                    return result;
                }
                debug!(frame = %frame, "Ignoring unrelated frame");
            }

            warn!(
                message = %name,
                attempt,
                attempts,
                skipped_bytes = self.decoder.skipped(),
                "No response from receiver"
            );
        }

        Err(ReceiverError::Timeout {
            class: request.class,
            id: request.id,
            attempts,
        })
    }

    /// Wait for the ACK that trails a CFG poll; `false` if none arrived
    async fn consume_ack(&mut self, class: u8, id: u8) -> Result<bool> {
        let deadline = Instant::now() + self.options.timeout;
        while let Some(frame) = self.next_frame(deadline).await? {
            if Ack::decode(&frame).is_some_and(|ack| ack.matches(class, id)) {
                return Ok(true);
            }
            debug!(frame = %frame, "Ignoring unrelated frame");
        }
        debug!(message = %message_name(class, id), "Poll answered without ACK");
        Ok(false)
    }

    /// Swallow replies to earlier poll attempts that arrived late
    ///
    /// Waits at most one timeout for the owed ACKs; every frame read in the
    /// meantime belongs to an earlier exchange and is dropped.
    async fn drain_late_acks(&mut self) -> Result<()> {
        if self.late_acks.is_empty() {
            return Ok(());
        }

        let deadline = Instant::now() + self.options.timeout;
        while !self.late_acks.is_empty() {
            let Some(frame) = self.next_frame(deadline).await? else {
                debug!(count = self.late_acks.len(), "Late ACKs never arrived");
                break;
            };
            if let Some(ack) = Ack::decode(&frame) {
                if let Some(pos) = self
                    .late_acks
                    .iter()
                    .position(|&(class, id)| ack.matches(class, id))
                {
                    self.late_acks.swap_remove(pos);
                    debug!(frame = %frame, "Dropped late ACK");
                    continue;
                }
            }
            debug!(frame = %frame, "Dropped late reply");
        }

        self.late_acks.clear();
        Ok(())
    }

    /// Next decoded frame, or `None` once `deadline` passes
    async fn next_frame(&mut self, deadline: Instant) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                trace!(frame = %frame, "rx");
                return Ok(Some(frame));
            }

            let mut buf = [0u8; READ_CHUNK];
            let read = match tokio::time::timeout_at(deadline, self.stream.read(&mut buf)).await {
                Err(_) => return Ok(None),
                Ok(result) => result?,
            };
            if read == 0 {
                return Err(ReceiverError::Closed);
            }

            for result in self.decoder.feed_all(&buf[..read]) {
                match result {
                    Ok(frame) => self.pending.push_back(frame),
                    Err(e) => warn!(error = %e, "Discarding corrupt frame"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockReceiver;
    use super::*;
    use crate::ubx::messages::ID_CFG_CFG;
    use tokio::io::DuplexStream;

    fn options() -> ReceiverOptions {
        ReceiverOptions {
            timeout: Duration::from_millis(500),
            retries: 2,
        }
    }

    fn ack(acknowledged: bool, class: u8, id: u8) -> Frame {
        Ack {
            acknowledged,
            class,
            id,
        }
        .to_frame()
    }

    /// Receiver that answers the n-th request after `delay` with `frames`
    ///
    /// Requests are handled one at a time, so a delayed answer also delays
    /// everything queued behind it. Requests past the end of the script go
    /// unanswered.
    fn scripted(script: Vec<(Duration, Vec<Frame>)>) -> DuplexStream {
        let (client, mut server) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            let mut decoder = FrameDecoder::new();
            let mut queue = VecDeque::new();
            let mut script = script.into_iter();
            let mut buf = [0u8; 256];

            loop {
                let Some(_request) = queue.pop_front() else {
                    let n = match server.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    queue.extend(decoder.feed_all(&buf[..n]).into_iter().flatten());
                    continue;
                };

                let Some((delay, frames)) = script.next() else {
                    continue;
                };
                tokio::time::sleep(delay).await;
                let mut out = Vec::new();
                for frame in frames {
                    out.extend(frame.encode().unwrap());
                }
                if server.write_all(&out).await.is_err() {
                    return;
                }
            }
        });
        client
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_dynamic_model() {
        let mock = MockReceiver::new().with_model(DynamicModel::Pedestrian);
        let (stream, handle) = mock.spawn();
        let mut receiver = Receiver::new(stream, options());

        assert_eq!(
            receiver.dynamic_model().await.unwrap(),
            DynamicModel::Pedestrian
        );
        assert_eq!(handle.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_dynamic_model() {
        let (stream, handle) = MockReceiver::new().spawn();
        let mut receiver = Receiver::new(stream, options());

        receiver
            .set_dynamic_model(DynamicModel::Automotive)
            .await
            .unwrap();

        assert_eq!(handle.model_code(), 4);
        assert_eq!(
            receiver.dynamic_model().await.unwrap(),
            DynamicModel::Automotive
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_preserves_other_settings() {
        let (stream, handle) = MockReceiver::new().spawn();
        let before = handle.nav5();
        let mut receiver = Receiver::new(stream, options());

        receiver.set_dynamic_model(DynamicModel::Sea).await.unwrap();

        // Only the dynModel bit is set in the outgoing mask
        let request = &handle.requests()[0];
        assert_eq!(&request.payload[0..2], &[0x01, 0x00]);

        let after = handle.nav5();
        assert_eq!(after.dyn_model, 5);
        assert_eq!(after.fix_mode, before.fix_mode);
        assert_eq!(after.min_elev, before.min_elev);
        assert_eq!(after.p_dop, before.p_dop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_amid_nmea_noise() {
        let (stream, _handle) = MockReceiver::new()
            .with_model(DynamicModel::Stationary)
            .with_nmea_noise()
            .spawn();
        let mut receiver = Receiver::new(stream, options());

        assert_eq!(
            receiver.dynamic_model().await.unwrap(),
            DynamicModel::Stationary
        );
        receiver.set_dynamic_model(DynamicModel::Bike).await.unwrap();
        assert_eq!(receiver.dynamic_model().await.unwrap(), DynamicModel::Bike);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nak_is_not_retried() {
        let (stream, handle) = MockReceiver::new()
            .with_nak(CLASS_CFG, ID_CFG_NAV5)
            .spawn();
        let mut receiver = Receiver::new(stream, options());

        let err = receiver
            .set_dynamic_model(DynamicModel::Wrist)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReceiverError::Nak {
                class: CLASS_CFG,
                id: ID_CFG_NAV5
            }
        ));
        assert_eq!(handle.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_dropped_request() {
        let (stream, handle) = MockReceiver::new().dropping_first(1).spawn();
        let mut receiver = Receiver::new(stream, options());

        receiver
            .set_dynamic_model(DynamicModel::Airborne2g)
            .await
            .unwrap();

        assert_eq!(handle.requests().len(), 2);
        assert_eq!(handle.model_code(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_all_attempts() {
        let (stream, handle) = MockReceiver::new().silent().spawn();
        let mut receiver = Receiver::new(stream, options());

        let err = receiver.dynamic_model().await.unwrap_err();

        assert!(matches!(
            err,
            ReceiverError::Timeout {
                class: CLASS_CFG,
                id: ID_CFG_NAV5,
                attempts: 3
            }
        ));
        assert_eq!(handle.requests().len(), 3);
        assert_eq!(err.to_string(), "no response to CFG-NAV5 after 3 attempt(s)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream() {
        let (stream, handle) = MockReceiver::new().spawn();
        handle.shutdown().await;
        let mut receiver = Receiver::new(stream, options());

        let err = receiver.dynamic_model().await.unwrap_err();
        assert!(matches!(err, ReceiverError::Closed | ReceiverError::Io(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_model_code() {
        let (stream, _handle) = MockReceiver::new().with_model_code(1).spawn();
        let mut receiver = Receiver::new(stream, options());

        let err = receiver.dynamic_model().await.unwrap_err();
        assert!(matches!(err, ReceiverError::UnknownModel(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_configuration() {
        let (stream, handle) = MockReceiver::new().spawn();
        let mut receiver = Receiver::new(stream, options());

        receiver
            .save_configuration(SectionMask::ALL, DeviceMask::ALL)
            .await
            .unwrap();

        let requests = handle.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is(CLASS_CFG, ID_CFG_CFG));
        assert_eq!(handle.saves(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_version() {
        let (stream, _handle) = MockReceiver::new().spawn();
        let mut receiver = Receiver::new(stream, options());

        let version = receiver.version().await.unwrap();
        assert_eq!(version.protocol_version(), Some(ProtocolVersion::new(18, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_supported_rejects_old_firmware() {
        let (stream, _handle) = MockReceiver::new().spawn();
        let mut receiver = Receiver::new(stream, options());

        let err = receiver
            .ensure_supported(DynamicModel::Bike)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReceiverError::UnsupportedModel {
                model: DynamicModel::Bike,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "bike requires protocol version 19.20 or newer, receiver has 18.00"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_supported_skips_query_for_classic_models() {
        let (stream, handle) = MockReceiver::new().spawn();
        let mut receiver = Receiver::new(stream, options());

        assert_eq!(
            receiver
                .ensure_supported(DynamicModel::Automotive)
                .await
                .unwrap(),
            None
        );
        assert!(handle.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_supported_tolerates_missing_version() {
        let (stream, _handle) = MockReceiver::new()
            .with_poll_nak(CLASS_MON, ID_MON_VER)
            .spawn();
        let mut receiver = Receiver::new(stream, options());

        assert_eq!(
            receiver.ensure_supported(DynamicModel::Wrist).await.unwrap(),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ack_is_not_reused() {
        // The ACK that trails a CFG-NAV5 poll must not satisfy the set that
        // follows: a receiver that NAKs the set has to surface as Nak.
        let (stream, _handle) = MockReceiver::new()
            .with_nak(CLASS_CFG, ID_CFG_NAV5)
            .spawn();
        let mut receiver = Receiver::new(stream, options());

        receiver.dynamic_model().await.unwrap();
        let err = receiver
            .set_dynamic_model(DynamicModel::Sea)
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiverError::Nak { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_poll_answer_does_not_ack_next_set() {
        // First poll is answered after its timeout, the retry shortly after;
        // the set that follows is rejected.
        let nav5 = Nav5::default().to_frame();
        let stream = scripted(vec![
            (
                Duration::from_millis(600),
                vec![nav5.clone(), ack(true, CLASS_CFG, ID_CFG_NAV5)],
            ),
            (
                Duration::from_millis(50),
                vec![nav5, ack(true, CLASS_CFG, ID_CFG_NAV5)],
            ),
            (Duration::ZERO, vec![ack(false, CLASS_CFG, ID_CFG_NAV5)]),
        ]);
        let mut receiver = Receiver::new(stream, options());

        assert_eq!(
            receiver.dynamic_model().await.unwrap(),
            DynamicModel::Portable
        );
        let err = receiver
            .set_dynamic_model(DynamicModel::Sea)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReceiverError::Nak {
                class: CLASS_CFG,
                id: ID_CFG_NAV5
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_late_ack_does_not_block_next_request() {
        // Poll retried once, the first attempt is never answered at all
        let nav5 = Nav5::default().to_frame();
        let stream = scripted(vec![
            (Duration::ZERO, vec![]),
            (
                Duration::ZERO,
                vec![nav5, ack(true, CLASS_CFG, ID_CFG_NAV5)],
            ),
            (Duration::ZERO, vec![ack(true, CLASS_CFG, ID_CFG_NAV5)]),
        ]);
        let mut receiver = Receiver::new(stream, options());

        let started = Instant::now();
        receiver.dynamic_model().await.unwrap();
        receiver
            .set_dynamic_model(DynamicModel::Sea)
            .await
            .unwrap();
        // One timeout for the unanswered attempt, at most one more draining
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_duplicate_ack_is_discarded() {
        // Both ACKs of the first set arrive in one read; the second must not
        // answer the next set, which the receiver rejects.
        let stream = scripted(vec![
            (
                Duration::ZERO,
                vec![
                    ack(true, CLASS_CFG, ID_CFG_NAV5),
                    ack(true, CLASS_CFG, ID_CFG_NAV5),
                ],
            ),
            (Duration::ZERO, vec![ack(false, CLASS_CFG, ID_CFG_NAV5)]),
        ]);
        let mut receiver = Receiver::new(stream, options());

        receiver
            .set_dynamic_model(DynamicModel::Automotive)
            .await
            .unwrap();
        assert_eq!(receiver.pending.len(), 1);

        let err = receiver
            .set_dynamic_model(DynamicModel::Sea)
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiverError::Nak { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_acks_are_skipped() {
        let (stream, _handle) = MockReceiver::new()
            .with_stray_ack(CLASS_CFG, 0x01)
            .spawn();
        let mut receiver = Receiver::new(stream, options());

        receiver
            .set_dynamic_model(DynamicModel::Pedestrian)
            .await
            .unwrap();
    }
}

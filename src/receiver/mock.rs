// Simulated u-blox receiver for tests
//
// Runs on one end of an in-memory duplex and answers CFG-NAV5, CFG-CFG and
// MON-VER the way a NEO-M8N does.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use super::DynamicModel;
use crate::ubx::messages::{
    Ack, Nav5, Nav5Mask, MonVer, CLASS_CFG, CLASS_MON, ID_CFG_CFG, ID_CFG_NAV5, ID_MON_VER,
};
use crate::ubx::{Frame, FrameDecoder};

const NMEA_NOISE: &[u8] =
    b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

#[derive(Default)]
struct State {
    nav5: Nav5,
    requests: Vec<Frame>,
    saves: usize,
}

pub(crate) struct MockReceiver {
    nav5: Nav5,
    version: MonVer,
    nak: Vec<(u8, u8)>,
    poll_nak: Vec<(u8, u8)>,
    stray_ack: Option<(u8, u8)>,
    drop_first: usize,
    silent: bool,
    noise: bool,
    apply_sets: bool,
}

pub(crate) struct MockHandle {
    state: Arc<Mutex<State>>,
    task: JoinHandle<()>,
}

impl MockReceiver {
    /// NEO-M8N on factory settings (portable, PROTVER 18.00)
    pub fn new() -> Self {
        Self {
            nav5: Nav5 {
                mask: Nav5Mask(0xFFFF),
                dyn_model: DynamicModel::Portable.code(),
                fix_mode: 3,
                fixed_alt_var: 10_000,
                min_elev: 5,
                p_dop: 250,
                t_dop: 250,
                p_acc: 100,
                t_acc: 350,
                dgnss_timeout: 60,
                ..Nav5::default()
            },
            version: MonVer {
                software: "ROM CORE 3.01 (107888)".to_string(),
                hardware: "00080000".to_string(),
                extensions: vec![
                    "FWVER=SPG 3.01".to_string(),
                    "PROTVER=18.00".to_string(),
                    "MOD=NEO-M8N-0".to_string(),
                ],
            },
            nak: Vec::new(),
            poll_nak: Vec::new(),
            stray_ack: None,
            drop_first: 0,
            silent: false,
            noise: false,
            apply_sets: true,
        }
    }

    pub fn with_model(self, model: DynamicModel) -> Self {
        self.with_model_code(model.code())
    }

    pub fn with_model_code(mut self, code: u8) -> Self {
        self.nav5.dyn_model = code;
        self
    }

    pub fn with_protocol_version(mut self, protver: &str) -> Self {
        self.version.extensions = vec![format!("PROTVER={}", protver)];
        self
    }

    /// NAK configuration writes of this message
    pub fn with_nak(mut self, class: u8, id: u8) -> Self {
        self.nak.push((class, id));
        self
    }

    /// NAK polls of this message
    pub fn with_poll_nak(mut self, class: u8, id: u8) -> Self {
        self.poll_nak.push((class, id));
        self
    }

    /// Precede every reply with an ACK for some other message
    pub fn with_stray_ack(mut self, class: u8, id: u8) -> Self {
        self.stray_ack = Some((class, id));
        self
    }

    pub fn with_nmea_noise(mut self) -> Self {
        self.noise = true;
        self
    }

    /// Ignore the first `n` requests entirely
    pub fn dropping_first(mut self, n: usize) -> Self {
        self.drop_first = n;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Acknowledge CFG-NAV5 writes without applying them
    pub fn ignoring_sets(mut self) -> Self {
        self.apply_sets = false;
        self
    }

    pub fn spawn(self) -> (DuplexStream, MockHandle) {
        let (client, server) = tokio::io::duplex(4096);
        let state = Arc::new(Mutex::new(State {
            nav5: self.nav5,
            ..State::default()
        }));
        let task = tokio::spawn(self.run(server, Arc::clone(&state)));
        (client, MockHandle { state, task })
    }

    async fn run(mut self, mut stream: DuplexStream, state: Arc<Mutex<State>>) {
        let mut decoder = FrameDecoder::new();
        let mut buf = [0u8; 256];

        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };

            for result in decoder.feed_all(&buf[..n]) {
                let Ok(request) = result else { continue };
                let replies = self.handle(&request, &state);

                let mut out = Vec::new();
                for reply in replies {
                    if self.noise {
                        out.extend_from_slice(NMEA_NOISE);
                    }
                    if let Some((class, id)) = self.stray_ack {
                        let stray = Ack {
                            acknowledged: true,
                            class,
                            id,
                        };
                        out.extend(stray.to_frame().encode().unwrap_or_default());
                    }
                    out.extend(reply.encode().unwrap_or_default());
                }
                if !out.is_empty() && stream.write_all(&out).await.is_err() {
                    return;
                }
            }
        }
    }

    fn handle(&mut self, request: &Frame, state: &Arc<Mutex<State>>) -> Vec<Frame> {
        let mut state = state.lock().unwrap();
        state.requests.push(request.clone());

        if self.drop_first > 0 {
            self.drop_first -= 1;
            return Vec::new();
        }
        if self.silent {
            return Vec::new();
        }

        let key = (request.class, request.id);
        let is_poll = request.payload.is_empty();
        let ack = |acknowledged| {
            Ack {
                acknowledged,
                class: request.class,
                id: request.id,
            }
            .to_frame()
        };

        if is_poll && self.poll_nak.contains(&key) {
            return vec![ack(false)];
        }
        if !is_poll && self.nak.contains(&key) {
            return vec![ack(false)];
        }

        match key {
            (CLASS_CFG, ID_CFG_NAV5) if is_poll => vec![state.nav5.to_frame(), ack(true)],
            (CLASS_CFG, ID_CFG_NAV5) => match Nav5::decode(&request.payload) {
                Ok(update) => {
                    if self.apply_sets && update.mask.contains(Nav5Mask::DYN) {
                        state.nav5.dyn_model = update.dyn_model;
                    }
                    vec![ack(true)]
                }
                Err(_) => vec![ack(false)],
            },
            (CLASS_CFG, ID_CFG_CFG) if !is_poll => {
                state.saves += 1;
                vec![ack(true)]
            }
            (CLASS_MON, ID_MON_VER) if is_poll => {
                vec![Frame::new(CLASS_MON, ID_MON_VER, self.version.encode())]
            }
            _ => vec![ack(false)],
        }
    }
}

impl MockHandle {
    /// Every frame the receiver has seen, in order
    pub fn requests(&self) -> Vec<Frame> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn nav5(&self) -> Nav5 {
        self.state.lock().unwrap().nav5
    }

    pub fn model_code(&self) -> u8 {
        self.nav5().dyn_model
    }

    /// Number of CFG-CFG requests acknowledged
    pub fn saves(&self) -> usize {
        self.state.lock().unwrap().saves
    }

    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
